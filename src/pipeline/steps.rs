//! The concrete pipeline steps.
//!
//! Each step is a thin adapter from git results into `StatusState`
//! fields and indicator updates, run through
//! `StepManager::execute_step`. Mutating steps define success as
//! "post-operation state shows no outstanding work of that kind":
//! they re-derive the relevant state from the repository after the
//! primitive operation instead of trusting its exit code.

use crate::config::SyncConfig;
use crate::domain::{CommitStatus, ExceptionStatus, PullStatus, PushStatus, StatusState};
use crate::error::Result;
use crate::indicators::IndicatorRegistry;
use crate::pipeline::manager::SharedStepManager;
use crate::services::sched;
use crate::services::{commit_message, VersionControl};
use futures::FutureExt;
use std::sync::Arc;

/// Collaborators shared by every step in a pipeline run
pub struct SyncContext {
    pub git: Arc<dyn VersionControl>,
    pub indicators: Arc<IndicatorRegistry>,
    pub config: SyncConfig,
}

impl SyncContext {
    pub fn new(
        git: Arc<dyn VersionControl>,
        indicators: Arc<IndicatorRegistry>,
        config: SyncConfig,
    ) -> Self {
        Self {
            git,
            indicators,
            config,
        }
    }
}

/// Re-derive `need_commit`/`commit_list` from the working tree and
/// update the commit indicator. Empty status output means no changes.
async fn refresh_commit_state(ctx: &SyncContext, state: &mut StatusState) -> Result<()> {
    let status = ctx.git.status(false).await?;
    if status.stdout.is_empty() {
        tracing::debug!("No changes");
        state.need_commit = Some(false);
        state.commit_list = None;
        ctx.indicators.set_commit_status(CommitStatus::Clean).await?;
    } else {
        tracing::debug!("Need commit:\n{}", status.stdout.trim_end());
        state.need_commit = Some(true);
        state.commit_list = Some(status.stdout.trim_end().to_string());
        ctx.indicators.set_commit_status(CommitStatus::Dirty).await?;
    }
    Ok(())
}

/// Re-derive `need_pull_rebase`/`need_push` from the ahead/behind
/// comparison against upstream and update the pull/push indicators.
/// A branch with no upstream reports neither as needed.
async fn refresh_remote_state(ctx: &SyncContext, state: &mut StatusState) -> Result<()> {
    ctx.git.fetch().await?;

    let behind = ctx.git.log(&["--oneline", "HEAD..@{u}"]).await?;
    let need_pull = behind.ok() && !behind.stdout.trim().is_empty();
    state.need_pull_rebase = Some(need_pull);
    if need_pull {
        ctx.indicators.set_pull_status(PullStatus::Needed).await?;
    } else {
        ctx.indicators.set_pull_status(PullStatus::NotNeeded).await?;
    }

    let ahead = ctx.git.log(&["--oneline", "@{u}..HEAD"]).await?;
    let need_push = ahead.ok() && !ahead.stdout.trim().is_empty();
    state.need_push = Some(need_push);
    if need_push {
        ctx.indicators.set_push_status(PushStatus::Needed).await?;
    } else {
        ctx.indicators.set_push_status(PushStatus::NotNeeded).await?;
    }

    Ok(())
}

/// Derive the full status snapshot. A successful check always reports
/// step success, whether or not the repository is clean.
pub async fn step_check_status(manager: &SharedStepManager, ctx: &Arc<SyncContext>) -> Result<()> {
    let ctx = Arc::clone(ctx);
    manager
        .lock()
        .await
        .execute_step("checkStatus", move |state: &mut StatusState| {
            async move {
                refresh_commit_state(&ctx, state).await?;
                tokio::time::sleep(ctx.config.timing.status_gap()).await;
                refresh_remote_state(&ctx, state).await?;
                Ok(true)
            }
            .boxed()
        })
        .await;
    Ok(())
}

/// Commit pending changes; success means nothing is left to commit
pub async fn step_commit(manager: &SharedStepManager, ctx: &Arc<SyncContext>) -> Result<()> {
    ctx.indicators.set_commit_in_progress(true).await?;
    let step_ctx = Arc::clone(ctx);
    manager
        .lock()
        .await
        .execute_step("commit", move |state: &mut StatusState| {
            async move {
                let message = commit_message(&step_ctx.config.git.commit_message);
                let output = step_ctx.git.commit(true, &message).await?;
                tracing::debug!("commit exited with {}", output.exit_code);
                refresh_commit_state(&step_ctx, state).await?;
                Ok(state.need_commit == Some(false))
            }
            .boxed()
        })
        .await;
    ctx.indicators.set_commit_in_progress(false).await?;
    Ok(())
}

/// Plain pull; success means the branch is no longer behind upstream
pub async fn step_pull(manager: &SharedStepManager, ctx: &Arc<SyncContext>) -> Result<()> {
    ctx.indicators.set_pull_in_progress(true).await?;
    let step_ctx = Arc::clone(ctx);
    manager
        .lock()
        .await
        .execute_step("pull", move |state: &mut StatusState| {
            async move {
                let output = step_ctx.git.pull(true).await?;
                tracing::debug!("pull exited with {}", output.exit_code);
                refresh_remote_state(&step_ctx, state).await?;
                Ok(state.need_pull_rebase == Some(false))
            }
            .boxed()
        })
        .await;
    ctx.indicators.set_pull_in_progress(false).await?;
    Ok(())
}

/// Pull with rebase; success means the branch is no longer behind
/// upstream
pub async fn step_pull_rebase(manager: &SharedStepManager, ctx: &Arc<SyncContext>) -> Result<()> {
    ctx.indicators.set_pull_in_progress(true).await?;
    let step_ctx = Arc::clone(ctx);
    manager
        .lock()
        .await
        .execute_step("pullRebase", move |state: &mut StatusState| {
            async move {
                let output = step_ctx.git.pull_rebase(true).await?;
                tracing::debug!("pull --rebase exited with {}", output.exit_code);
                refresh_remote_state(&step_ctx, state).await?;
                Ok(state.need_pull_rebase == Some(false))
            }
            .boxed()
        })
        .await;
    ctx.indicators.set_pull_in_progress(false).await?;
    Ok(())
}

/// Push; success means the branch is no longer ahead of upstream
pub async fn step_push(manager: &SharedStepManager, ctx: &Arc<SyncContext>) -> Result<()> {
    ctx.indicators.set_push_in_progress(true).await?;
    let step_ctx = Arc::clone(ctx);
    manager
        .lock()
        .await
        .execute_step("push", move |state: &mut StatusState| {
            async move {
                let output = step_ctx.git.push(true).await?;
                tracing::debug!("push exited with {}", output.exit_code);
                refresh_remote_state(&step_ctx, state).await?;
                Ok(state.need_push == Some(false))
            }
            .boxed()
        })
        .await;
    ctx.indicators.set_push_in_progress(false).await?;
    Ok(())
}

/// Recovery step for a failed run.
///
/// Clears every in-progress flag, forces the transient status
/// indicators to their non-failing values so the presentation never
/// shows a stuck state, raises the exception indicator, and schedules
/// a status re-check on the same manager after the configured
/// cooldown. The retry is fire-and-forget and cannot be cancelled.
pub async fn step_exception(manager: &SharedStepManager, ctx: &Arc<SyncContext>) -> Result<()> {
    if manager.lock().await.success() {
        return Ok(());
    }

    ctx.indicators.set_commit_in_progress(false).await?;
    ctx.indicators.set_pull_in_progress(false).await?;
    ctx.indicators.set_push_in_progress(false).await?;
    ctx.indicators.set_commit_status(CommitStatus::Clean).await?;
    ctx.indicators.set_pull_status(PullStatus::NotNeeded).await?;
    ctx.indicators.set_push_status(PushStatus::NotNeeded).await?;
    ctx.indicators
        .set_exception_status(ExceptionStatus::Error)
        .await?;

    let retry_manager = Arc::clone(manager);
    let retry_ctx = Arc::clone(ctx);
    sched::run_after(ctx.config.timing.retry_delay(), async move {
        tracing::info!("Retrying status check after pipeline failure");
        step_check_status(&retry_manager, &retry_ctx).await
    });

    Ok(())
}

/// Terminal step: log the end of the pipeline
pub async fn step_stop(manager: &SharedStepManager) {
    manager.lock().await.stop();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::manager::StepManager;
    use crate::pipeline::testing::{failure, output, settle, test_context};
    use std::sync::Mutex;

    #[tokio::test(start_paused = true)]
    async fn test_check_status_with_clean_tree() {
        let (git, ctx) = test_context();
        let manager = StepManager::shared("test");

        step_check_status(&manager, &ctx).await.unwrap();

        let locked = manager.lock().await;
        assert!(locked.success());
        assert_eq!(locked.need_commit(), Some(false));
        assert_eq!(locked.commit_list(), None);
        assert_eq!(locked.need_pull_rebase(), Some(false));
        assert_eq!(locked.need_push(), Some(false));
        assert_eq!(ctx.indicators.commit_status(), Some(CommitStatus::Clean));
        assert_eq!(ctx.indicators.pull_status(), Some(PullStatus::NotNeeded));
        assert_eq!(ctx.indicators.push_status(), Some(PushStatus::NotNeeded));
        assert!(git.calls().contains(&"fetch".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_status_with_dirty_tree() {
        let (git, ctx) = test_context();
        git.script("status", output("M file.txt\n"));
        let manager = StepManager::shared("test");

        step_check_status(&manager, &ctx).await.unwrap();

        let locked = manager.lock().await;
        assert!(locked.success());
        assert_eq!(locked.need_commit(), Some(true));
        assert_eq!(locked.commit_list(), Some("M file.txt".to_string()));
        assert_eq!(ctx.indicators.commit_status(), Some(CommitStatus::Dirty));
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_status_detects_pull_and_push_needed() {
        let (git, ctx) = test_context();
        git.script("log HEAD..@{u}", output("abc123 upstream commit\n"));
        git.script("log @{u}..HEAD", output("def456 local commit\n"));
        let manager = StepManager::shared("test");

        step_check_status(&manager, &ctx).await.unwrap();

        let locked = manager.lock().await;
        assert_eq!(locked.need_pull_rebase(), Some(true));
        assert_eq!(locked.need_push(), Some(true));
        assert_eq!(ctx.indicators.pull_status(), Some(PullStatus::Needed));
        assert_eq!(ctx.indicators.push_status(), Some(PushStatus::Needed));
    }

    #[tokio::test(start_paused = true)]
    async fn test_commit_succeeds_when_tree_becomes_clean() {
        let (_git, ctx) = test_context();
        let manager = StepManager::shared("test");

        // Re-derived status after the commit is empty: success
        step_commit(&manager, &ctx).await.unwrap();

        assert!(manager.lock().await.success());
        assert_eq!(ctx.indicators.commit_in_progress(), Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn test_commit_toggles_in_progress_flag() {
        let (_git, ctx) = test_context();
        let transitions = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&transitions);
        ctx.indicators
            .commit_in_progress_cell()
            .register(move |new, old| {
                let log = Arc::clone(&log);
                async move {
                    log.lock().unwrap().push((new, old));
                    Ok(())
                }
                .boxed()
            });
        let manager = StepManager::shared("test");

        step_commit(&manager, &ctx).await.unwrap();

        assert_eq!(
            *transitions.lock().unwrap(),
            vec![(Some(true), Some(false)), (Some(false), Some(true))]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_commit_fails_when_tree_stays_dirty() {
        let (git, ctx) = test_context();
        // Status re-derived after the commit still shows changes
        git.script("status", output("M stuck.txt\n"));
        let manager = StepManager::shared("test");

        step_commit(&manager, &ctx).await.unwrap();

        assert!(!manager.lock().await.success());
        // Cleared even though the step failed
        assert_eq!(ctx.indicators.commit_in_progress(), Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn test_commit_error_is_absorbed_and_flag_cleared() {
        let (git, ctx) = test_context();
        git.script("commit", failure("index locked"));
        let manager = StepManager::shared("test");

        step_commit(&manager, &ctx).await.unwrap();

        assert!(!manager.lock().await.success());
        assert_eq!(ctx.indicators.commit_in_progress(), Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pull_rebase_success_tracks_remote_state() {
        let (git, ctx) = test_context();
        let manager = StepManager::shared("test");

        step_pull_rebase(&manager, &ctx).await.unwrap();
        assert!(manager.lock().await.success());

        // Still behind after the pull: failure
        git.script("log HEAD..@{u}", output("abc123 still behind\n"));
        step_pull_rebase(&manager, &ctx).await.unwrap();
        assert!(!manager.lock().await.success());
        assert_eq!(ctx.indicators.pull_in_progress(), Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn test_push_success_tracks_remote_state() {
        let (git, ctx) = test_context();
        let manager = StepManager::shared("test");

        step_push(&manager, &ctx).await.unwrap();
        assert!(manager.lock().await.success());
        assert!(git.calls().contains(&"push".to_string()));

        git.script("log @{u}..HEAD", output("def456 still ahead\n"));
        step_push(&manager, &ctx).await.unwrap();
        assert!(!manager.lock().await.success());
        assert_eq!(ctx.indicators.push_in_progress(), Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exception_is_a_no_op_on_success() {
        let (_git, ctx) = test_context();
        let manager = StepManager::shared("test");

        step_exception(&manager, &ctx).await.unwrap();

        assert_eq!(ctx.indicators.exception_status(), None);
        assert_eq!(ctx.indicators.commit_status(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exception_resets_indicators_and_schedules_recheck() {
        let (git, ctx) = test_context();
        let manager = StepManager::shared("test");
        ctx.indicators.set_commit_in_progress(true).await.unwrap();
        ctx.indicators.set_pull_in_progress(true).await.unwrap();
        manager
            .lock()
            .await
            .execute_step("boom", |_state| {
                async { Err(crate::error::AppError::pipeline("boom")) }.boxed()
            })
            .await;

        step_exception(&manager, &ctx).await.unwrap();

        assert_eq!(ctx.indicators.commit_in_progress(), Some(false));
        assert_eq!(ctx.indicators.pull_in_progress(), Some(false));
        assert_eq!(ctx.indicators.push_in_progress(), Some(false));
        assert_eq!(ctx.indicators.commit_status(), Some(CommitStatus::Clean));
        assert_eq!(ctx.indicators.pull_status(), Some(PullStatus::NotNeeded));
        assert_eq!(ctx.indicators.push_status(), Some(PushStatus::NotNeeded));
        assert_eq!(
            ctx.indicators.exception_status(),
            Some(ExceptionStatus::Error)
        );

        // The re-check runs after the cooldown, not before
        let before = git.count_calls("status");
        settle().await;
        tokio::time::advance(std::time::Duration::from_secs(14)).await;
        settle().await;
        assert_eq!(git.count_calls("status"), before);

        tokio::time::advance(std::time::Duration::from_secs(2)).await;
        settle().await;
        assert!(git.count_calls("status") > before);

        // Let the re-check's sub-check gap elapse so it completes
        tokio::time::advance(std::time::Duration::from_millis(200)).await;
        settle().await;
        assert_eq!(manager.lock().await.need_commit(), Some(false));
    }
}
