//! The step orchestration engine.
//!
//! This module contains:
//! - StepManager: runs named steps and records per-run outcome
//! - Step functions: the concrete check/commit/pull/push/exception
//!   steps
//! - Composite operations: fixed step sequences such as "sync"

mod manager;
pub mod ops;
pub mod steps;

pub use manager::{SharedStepManager, StepFuture, StepManager};
pub use steps::SyncContext;

#[cfg(test)]
pub(crate) mod testing;
