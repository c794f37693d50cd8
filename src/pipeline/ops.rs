//! Composite pipelines: fixed, hand-assembled step sequences.
//!
//! Each operation chains steps with guard predicates on the manager's
//! `success` flag and `StatusState` — the only branching the pipelines
//! have. The exception and stop steps always run, whatever the guards
//! skipped. Every operation returns its manager so callers can inspect
//! the final state.

use crate::error::Result;
use crate::pipeline::manager::{SharedStepManager, StepManager};
use crate::pipeline::steps::{self, SyncContext};
use std::sync::Arc;

/// Full synchronization: commit when dirty, pull with rebase, push
/// when ahead, then re-derive status.
pub async fn sync(ctx: &Arc<SyncContext>) -> Result<SharedStepManager> {
    let manager = StepManager::shared("sync");

    steps::step_check_status(&manager, ctx).await?;

    let (ok, dirty) = {
        let locked = manager.lock().await;
        (locked.success(), locked.need_commit() == Some(true))
    };
    if ok && dirty {
        steps::step_commit(&manager, ctx).await?;
    }

    if manager.lock().await.success() {
        steps::step_pull_rebase(&manager, ctx).await?;
    }

    let (ok, push_needed) = {
        let locked = manager.lock().await;
        (locked.success(), locked.need_push() == Some(true))
    };
    if ok && push_needed {
        steps::step_push(&manager, ctx).await?;
    }

    steps::step_exception(&manager, ctx).await?;
    if manager.lock().await.success() {
        steps::step_check_status(&manager, ctx).await?;
    }
    steps::step_stop(&manager).await;

    Ok(manager)
}

/// Commit pending changes, then push if the commit went through
pub async fn commit_and_push(ctx: &Arc<SyncContext>) -> Result<SharedStepManager> {
    let manager = StepManager::shared("commitAndPush");

    steps::step_check_status(&manager, ctx).await?;

    let (ok, dirty) = {
        let locked = manager.lock().await;
        (locked.success(), locked.need_commit() == Some(true))
    };
    if ok && dirty {
        steps::step_commit(&manager, ctx).await?;
        if manager.lock().await.success() {
            steps::step_push(&manager, ctx).await?;
        }
    }

    steps::step_exception(&manager, ctx).await?;
    if manager.lock().await.success() {
        steps::step_check_status(&manager, ctx).await?;
    }
    steps::step_stop(&manager).await;

    Ok(manager)
}

/// Status check only
pub async fn check(ctx: &Arc<SyncContext>) -> Result<SharedStepManager> {
    let manager = StepManager::shared("check");

    steps::step_check_status(&manager, ctx).await?;
    steps::step_exception(&manager, ctx).await?;
    steps::step_stop(&manager).await;

    Ok(manager)
}

/// Single commit operation
pub async fn commit(ctx: &Arc<SyncContext>) -> Result<SharedStepManager> {
    let manager = StepManager::shared("commit");

    steps::step_commit(&manager, ctx).await?;
    steps::step_exception(&manager, ctx).await?;
    if manager.lock().await.success() {
        steps::step_check_status(&manager, ctx).await?;
    }
    steps::step_stop(&manager).await;

    Ok(manager)
}

/// Single plain-pull operation
pub async fn pull(ctx: &Arc<SyncContext>) -> Result<SharedStepManager> {
    let manager = StepManager::shared("pull");

    steps::step_pull(&manager, ctx).await?;
    steps::step_exception(&manager, ctx).await?;
    if manager.lock().await.success() {
        steps::step_check_status(&manager, ctx).await?;
    }
    steps::step_stop(&manager).await;

    Ok(manager)
}

/// Single pull-with-rebase operation
pub async fn pull_rebase(ctx: &Arc<SyncContext>) -> Result<SharedStepManager> {
    let manager = StepManager::shared("pullRebase");

    steps::step_pull_rebase(&manager, ctx).await?;
    steps::step_exception(&manager, ctx).await?;
    if manager.lock().await.success() {
        steps::step_check_status(&manager, ctx).await?;
    }
    steps::step_stop(&manager).await;

    Ok(manager)
}

/// Single push operation
pub async fn push(ctx: &Arc<SyncContext>) -> Result<SharedStepManager> {
    let manager = StepManager::shared("push");

    steps::step_push(&manager, ctx).await?;
    steps::step_exception(&manager, ctx).await?;
    if manager.lock().await.success() {
        steps::step_check_status(&manager, ctx).await?;
    }
    steps::step_stop(&manager).await;

    Ok(manager)
}

/// Whether local HEAD matches the upstream head after a fetch
pub async fn is_repo_up_to_date(ctx: &Arc<SyncContext>) -> Result<bool> {
    ctx.git.fetch().await?;
    let local = ctx.git.rev_parse("HEAD").await?;
    let remote = ctx.git.rev_parse("@{u}").await?;
    Ok(local.ok() && remote.ok() && local.stdout.trim() == remote.stdout.trim())
}

/// Warn when the repository has drifted from its upstream.
///
/// Skipped while any operation is in progress; returns `None` when
/// skipped.
pub async fn check_synced(ctx: &Arc<SyncContext>) -> Result<Option<bool>> {
    if ctx.indicators.any_in_progress() {
        tracing::debug!("Operation in progress, skipping sync check");
        return Ok(None);
    }

    let synced = is_repo_up_to_date(ctx).await?;
    if !synced {
        tracing::warn!("The local repository is not synchronized with its upstream");
    }
    Ok(Some(synced))
}
