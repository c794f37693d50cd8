//! Indicator registry: the named observable values a presentation
//! layer may read.
//!
//! The registry is an explicitly constructed context object — the
//! production wiring creates one process-lifetime instance and hands
//! an `Arc` to whoever needs it; tests build isolated registries.
//! Setting an indicator is the only way the pipeline communicates
//! outward.

use crate::domain::{
    CommitStatus, ExceptionStatus, HookableValue, PullStatus, PushStatus,
};
use crate::error::Result;
use futures::FutureExt;
use std::fmt;

/// Named status values and in-progress flags for one process
pub struct IndicatorRegistry {
    commit_status: HookableValue<CommitStatus>,
    pull_status: HookableValue<PullStatus>,
    push_status: HookableValue<PushStatus>,
    exception_status: HookableValue<ExceptionStatus>,
    commit_in_progress: HookableValue<bool>,
    pull_in_progress: HookableValue<bool>,
    push_in_progress: HookableValue<bool>,
    exception_in_progress: HookableValue<bool>,
}

impl IndicatorRegistry {
    pub fn new() -> Self {
        Self {
            commit_status: HookableValue::new("commit_status", None),
            pull_status: HookableValue::new("pull_status", None),
            push_status: HookableValue::new("push_status", None),
            exception_status: HookableValue::new("exception_status", None),
            commit_in_progress: HookableValue::new("commit_in_progress", Some(false)),
            pull_in_progress: HookableValue::new("pull_in_progress", Some(false)),
            push_in_progress: HookableValue::new("push_in_progress", Some(false)),
            exception_in_progress: HookableValue::new("exception_in_progress", Some(false)),
        }
    }

    pub async fn set_commit_status(&self, status: CommitStatus) -> Result<()> {
        self.commit_status.set(status).await
    }

    pub fn commit_status(&self) -> Option<CommitStatus> {
        self.commit_status.get_value()
    }

    pub async fn set_pull_status(&self, status: PullStatus) -> Result<()> {
        self.pull_status.set(status).await
    }

    pub fn pull_status(&self) -> Option<PullStatus> {
        self.pull_status.get_value()
    }

    pub async fn set_push_status(&self, status: PushStatus) -> Result<()> {
        self.push_status.set(status).await
    }

    pub fn push_status(&self) -> Option<PushStatus> {
        self.push_status.get_value()
    }

    pub async fn set_exception_status(&self, status: ExceptionStatus) -> Result<()> {
        self.exception_status.set(status).await
    }

    pub fn exception_status(&self) -> Option<ExceptionStatus> {
        self.exception_status.get_value()
    }

    pub async fn set_commit_in_progress(&self, in_progress: bool) -> Result<()> {
        self.commit_in_progress.set(in_progress).await
    }

    pub fn commit_in_progress(&self) -> Option<bool> {
        self.commit_in_progress.get_value()
    }

    pub async fn set_pull_in_progress(&self, in_progress: bool) -> Result<()> {
        self.pull_in_progress.set(in_progress).await
    }

    pub fn pull_in_progress(&self) -> Option<bool> {
        self.pull_in_progress.get_value()
    }

    pub async fn set_push_in_progress(&self, in_progress: bool) -> Result<()> {
        self.push_in_progress.set(in_progress).await
    }

    pub fn push_in_progress(&self) -> Option<bool> {
        self.push_in_progress.get_value()
    }

    pub async fn set_exception_in_progress(&self, in_progress: bool) -> Result<()> {
        self.exception_in_progress.set(in_progress).await
    }

    pub fn exception_in_progress(&self) -> Option<bool> {
        self.exception_in_progress.get_value()
    }

    /// True while any commit/pull/push operation is actively executing
    pub fn any_in_progress(&self) -> bool {
        self.commit_in_progress() == Some(true)
            || self.pull_in_progress() == Some(true)
            || self.push_in_progress() == Some(true)
    }

    /// Cell accessors, for sinks that subscribe to changes
    pub fn commit_status_cell(&self) -> &HookableValue<CommitStatus> {
        &self.commit_status
    }

    pub fn pull_status_cell(&self) -> &HookableValue<PullStatus> {
        &self.pull_status
    }

    pub fn push_status_cell(&self) -> &HookableValue<PushStatus> {
        &self.push_status
    }

    pub fn exception_status_cell(&self) -> &HookableValue<ExceptionStatus> {
        &self.exception_status
    }

    pub fn commit_in_progress_cell(&self) -> &HookableValue<bool> {
        &self.commit_in_progress
    }

    pub fn pull_in_progress_cell(&self) -> &HookableValue<bool> {
        &self.pull_in_progress
    }

    pub fn push_in_progress_cell(&self) -> &HookableValue<bool> {
        &self.push_in_progress
    }

    pub fn exception_in_progress_cell(&self) -> &HookableValue<bool> {
        &self.exception_in_progress
    }

    /// Wire a tracing observer to every cell, logging each transition.
    /// Called once at startup; registrations are kept for the process
    /// lifetime.
    pub fn install_log_sink(&self) {
        self.commit_status.register(|new, old| {
            async move {
                tracing::info!("[commit_status] changed from {} to {}", opt(&old), opt(&new));
                Ok(())
            }
            .boxed()
        });
        self.pull_status.register(|new, old| {
            async move {
                tracing::info!("[pull_status] changed from {} to {}", opt(&old), opt(&new));
                Ok(())
            }
            .boxed()
        });
        self.push_status.register(|new, old| {
            async move {
                tracing::info!("[push_status] changed from {} to {}", opt(&old), opt(&new));
                Ok(())
            }
            .boxed()
        });
        self.exception_status.register(|new, old| {
            async move {
                tracing::info!(
                    "[exception_status] changed from {} to {}",
                    opt(&old),
                    opt(&new)
                );
                Ok(())
            }
            .boxed()
        });
        self.commit_in_progress.register(|new, old| {
            async move {
                tracing::debug!(
                    "[commit_in_progress] changed from {} to {}",
                    opt(&old),
                    opt(&new)
                );
                Ok(())
            }
            .boxed()
        });
        self.pull_in_progress.register(|new, old| {
            async move {
                tracing::debug!(
                    "[pull_in_progress] changed from {} to {}",
                    opt(&old),
                    opt(&new)
                );
                Ok(())
            }
            .boxed()
        });
        self.push_in_progress.register(|new, old| {
            async move {
                tracing::debug!(
                    "[push_in_progress] changed from {} to {}",
                    opt(&old),
                    opt(&new)
                );
                Ok(())
            }
            .boxed()
        });
        self.exception_in_progress.register(|new, old| {
            async move {
                tracing::debug!(
                    "[exception_in_progress] changed from {} to {}",
                    opt(&old),
                    opt(&new)
                );
                Ok(())
            }
            .boxed()
        });
    }
}

impl Default for IndicatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn opt<T: fmt::Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "none".to_string(),
    }
}
