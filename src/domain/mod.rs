//! Domain types for git-autosync.
//!
//! This module contains:
//! - HookableValue: an observable cell with async change hooks
//! - StatusState: per-run snapshot of what the repository needs
//! - Indicator value enums (commit/pull/push/exception)

mod hook;
mod status;

pub use hook::{HookCallback, HookRegistration, HookableValue};
pub use status::{CommitStatus, ExceptionStatus, PullStatus, PushStatus, StatusState};
