//! git-autosync: keep a git repository synchronized with its upstream.
//!
//! Runs named pipeline operations (check, commit, pull, push, sync)
//! against a repository, or watches it and syncs periodically.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use git_autosync::indicators::IndicatorRegistry;
use git_autosync::pipeline::{ops, SyncContext};
use git_autosync::services::{GitCli, VersionControl};
use git_autosync::{app::AutoSync, SharedStepManager, SyncConfig};

#[derive(Parser)]
#[command(name = "git-autosync", about = "Keep a git repository in sync with its upstream")]
struct Cli {
    /// Repository to operate on (defaults to the current directory)
    #[arg(long, global = true)]
    repo: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check repository status and update indicators
    Check,
    /// Commit all pending changes
    Commit,
    /// Pull from upstream
    Pull,
    /// Pull from upstream with rebase
    PullRebase,
    /// Push to upstream
    Push,
    /// Commit pending changes, then push
    CommitAndPush,
    /// Commit when dirty, pull with rebase, push when ahead
    Sync,
    /// Show recent history
    Log,
    /// Discard uncommitted working-tree changes
    Checkout,
    /// Compare local HEAD with the upstream head
    IsSynced,
    /// Periodically check status and optionally sync
    Watch,
}

/// Initialize logging with RUST_LOG environment variable support
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Fail the process when the pipeline did not succeed
async fn finish(manager: SharedStepManager) -> Result<()> {
    let locked = manager.lock().await;
    if locked.success() {
        Ok(())
    } else {
        anyhow::bail!("{} pipeline failed", locked.operation())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let repo = match cli.repo {
        Some(path) => path,
        None => std::env::current_dir()?,
    };

    tracing::info!("Starting git-autosync in {:?}", repo);

    let config = SyncConfig::load(Some(&repo))?;
    let git: Arc<dyn VersionControl> = Arc::new(GitCli::new(repo)?);
    let indicators = Arc::new(IndicatorRegistry::new());
    indicators.install_log_sink();
    let ctx = Arc::new(SyncContext::new(git, indicators, config));

    match cli.command {
        Command::Check => {
            let manager = ops::check(&ctx).await?;
            if let Some(list) = manager.lock().await.commit_list() {
                println!("Changes detected:\n{}", list);
            } else {
                println!("No changes detected.");
            }
            finish(manager).await?;
        }
        Command::Commit => finish(ops::commit(&ctx).await?).await?,
        Command::Pull => finish(ops::pull(&ctx).await?).await?,
        Command::PullRebase => finish(ops::pull_rebase(&ctx).await?).await?,
        Command::Push => finish(ops::push(&ctx).await?).await?,
        Command::CommitAndPush => finish(ops::commit_and_push(&ctx).await?).await?,
        Command::Sync => finish(ops::sync(&ctx).await?).await?,
        Command::Log => {
            let output = ctx.git.log(&["--pretty=format:%h %s", "-n", "20"]).await?;
            println!("{}", output.stdout);
        }
        Command::Checkout => {
            let output = ctx.git.checkout().await?;
            if !output.ok() {
                anyhow::bail!("checkout failed with exit code {}", output.exit_code);
            }
        }
        Command::IsSynced => {
            let synced = ops::is_repo_up_to_date(&ctx).await?;
            if synced {
                println!("Repository is up to date with its upstream.");
            } else {
                println!("Repository is NOT in sync with its upstream.");
            }
        }
        Command::Watch => {
            let auto_sync = AutoSync::new(Arc::clone(&ctx));
            tokio::select! {
                result = auto_sync.run() => result?,
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received Ctrl+C, shutting down gracefully");
                }
            }
        }
    }

    Ok(())
}
