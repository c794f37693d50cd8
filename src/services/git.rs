//! Git client exposing the primitive version-control operations.
//!
//! The pipeline interprets repository state, not exit codes: a failed
//! git invocation is reported through `CommandOutput`, while failure
//! to run git at all is a `GitError`.

use crate::error::{GitError, GitResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Result of one git invocation
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
}

impl CommandOutput {
    /// Whether the invocation exited successfully
    pub fn ok(&self) -> bool {
        self.exit_code == 0
    }

    /// Output for an operation gated off by its `should_*` flag
    fn skipped() -> Self {
        Self {
            exit_code: 0,
            stdout: String::new(),
        }
    }
}

/// Primitive version-control operations.
///
/// Empty `status` stdout is the defined signal for "no changes". The
/// `should_*` flags gate execution: a false flag yields a successful
/// no-op output.
#[async_trait]
pub trait VersionControl: Send + Sync {
    async fn status(&self, include_untracked: bool) -> GitResult<CommandOutput>;
    async fn commit(&self, should_commit: bool, message: &str) -> GitResult<CommandOutput>;
    async fn pull(&self, should_pull: bool) -> GitResult<CommandOutput>;
    async fn pull_rebase(&self, should_pull_rebase: bool) -> GitResult<CommandOutput>;
    async fn push(&self, should_push: bool) -> GitResult<CommandOutput>;
    async fn checkout(&self) -> GitResult<CommandOutput>;
    async fn log(&self, args: &[&str]) -> GitResult<CommandOutput>;
    async fn fetch(&self) -> GitResult<CommandOutput>;
    async fn rev_parse(&self, reference: &str) -> GitResult<CommandOutput>;
}

/// `VersionControl` backed by the `git` binary
pub struct GitCli {
    repo_path: PathBuf,
}

impl GitCli {
    /// Create a client for a repository
    pub fn new(repo_path: PathBuf) -> GitResult<Self> {
        let git_dir = repo_path.join(".git");
        if !git_dir.exists() {
            return Err(GitError::NotARepository(repo_path));
        }
        Ok(Self { repo_path })
    }

    /// The repository path
    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    async fn exec(&self, args: &[&str]) -> GitResult<CommandOutput> {
        tracing::debug!("git {}", args.join(" "));
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_path)
            .output()
            .await
            .map_err(|e| {
                GitError::Operation(format!("Failed to run git {}: {}", args.join(" "), e))
            })?;

        let exit_code = output.status.code().unwrap_or(-1);
        if exit_code != 0 {
            tracing::debug!(
                exit_code,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "git {} failed",
                args.join(" ")
            );
        }

        Ok(CommandOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        })
    }
}

#[async_trait]
impl VersionControl for GitCli {
    async fn status(&self, include_untracked: bool) -> GitResult<CommandOutput> {
        if include_untracked {
            self.exec(&["status", "--porcelain"]).await
        } else {
            self.exec(&["status", "--porcelain", "--untracked-files=no"])
                .await
        }
    }

    async fn commit(&self, should_commit: bool, message: &str) -> GitResult<CommandOutput> {
        if !should_commit {
            return Ok(CommandOutput::skipped());
        }
        let add = self.exec(&["add", "-A"]).await?;
        if !add.ok() {
            return Ok(add);
        }
        self.exec(&["commit", "-m", message]).await
    }

    async fn pull(&self, should_pull: bool) -> GitResult<CommandOutput> {
        if !should_pull {
            return Ok(CommandOutput::skipped());
        }
        self.exec(&["pull"]).await
    }

    async fn pull_rebase(&self, should_pull_rebase: bool) -> GitResult<CommandOutput> {
        if !should_pull_rebase {
            return Ok(CommandOutput::skipped());
        }
        self.exec(&["pull", "--rebase"]).await
    }

    async fn push(&self, should_push: bool) -> GitResult<CommandOutput> {
        if !should_push {
            return Ok(CommandOutput::skipped());
        }
        self.exec(&["push"]).await
    }

    async fn checkout(&self) -> GitResult<CommandOutput> {
        self.exec(&["checkout", "."]).await
    }

    async fn log(&self, args: &[&str]) -> GitResult<CommandOutput> {
        let mut full = vec!["log"];
        full.extend_from_slice(args);
        self.exec(&full).await
    }

    async fn fetch(&self) -> GitResult<CommandOutput> {
        self.exec(&["fetch"]).await
    }

    async fn rev_parse(&self, reference: &str) -> GitResult<CommandOutput> {
        self.exec(&["rev-parse", reference]).await
    }
}

/// Build a commit message from the configured template, with a
/// timestamp appended
pub fn commit_message(template: &str) -> String {
    format!("{} {}", template, unix_timestamp())
}

/// Generate a simple timestamp without a chrono dependency
fn unix_timestamp() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();

    format!("{}", duration.as_secs())
}
