//! StepManager: runs named pipeline steps and records their outcome.

use crate::domain::StatusState;
use crate::error::Result;
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Boxed future returned by a step body; resolves to the step's
/// success flag
pub type StepFuture<'a> = BoxFuture<'a, Result<bool>>;

/// Handle shared between a composite pipeline and the delayed retry
/// scheduled by the exception step
pub type SharedStepManager = Arc<Mutex<StepManager>>;

/// Owns one pipeline run: its name, overall success, the last step
/// executed, and the run's `StatusState`.
///
/// A failing step never crashes the run: `execute_step` absorbs step
/// errors into `success = false` so later conditional steps can check
/// a clean signal. The manager only reports status; callers must gate
/// each subsequent step on `success` themselves.
pub struct StepManager {
    operation: String,
    success: bool,
    last_step: Option<String>,
    status_state: StatusState,
}

impl StepManager {
    /// Create a manager for a named operation
    pub fn new(operation: impl Into<String>) -> Self {
        let operation = operation.into();
        tracing::info!("New step manager created: {}", operation);
        Self {
            operation,
            success: true,
            last_step: None,
            status_state: StatusState::new(),
        }
    }

    /// Create a shared manager for a named operation
    pub fn shared(operation: impl Into<String>) -> SharedStepManager {
        Arc::new(Mutex::new(Self::new(operation)))
    }

    /// Run one named step against the owned `StatusState`.
    ///
    /// `Ok(flag)` records the flag as the run's success; an error is
    /// logged and recorded as `success = false`, never re-thrown.
    pub async fn execute_step<F>(&mut self, step_name: &str, step_fn: F)
    where
        F: for<'a> FnOnce(&'a mut StatusState) -> StepFuture<'a>,
    {
        self.last_step = Some(step_name.to_string());
        tracing::info!("  [{}] Executing step: {}", self.operation, step_name);
        match step_fn(&mut self.status_state).await {
            Ok(result) => {
                tracing::info!(
                    "    [{}] End step: {} : result = {}",
                    self.operation,
                    step_name,
                    result
                );
                self.success = result;
            }
            Err(error) => {
                tracing::error!(
                    "    [{}] Error executing step {}: {}",
                    self.operation,
                    step_name,
                    error
                );
                self.success = false;
            }
        }
    }

    /// Terminal marker: logs pipeline end. Not enforced by a guard;
    /// callers do not execute further steps afterwards.
    pub fn stop(&self) {
        tracing::info!(
            "  [{}] Stopping after step: {}",
            self.operation,
            self.last_step.as_deref().unwrap_or("<none>")
        );
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn last_step(&self) -> Option<&str> {
        self.last_step.as_deref()
    }

    pub fn need_commit(&self) -> Option<bool> {
        self.status_state.need_commit
    }

    pub fn need_pull_rebase(&self) -> Option<bool> {
        self.status_state.need_pull_rebase
    }

    pub fn need_push(&self) -> Option<bool> {
        self.status_state.need_push
    }

    pub fn commit_list(&self) -> Option<String> {
        self.status_state.commit_list.clone()
    }
}
