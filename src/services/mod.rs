//! Infrastructure services for git-autosync.
//!
//! This module contains:
//! - GitCli: version-control operations via the git binary
//! - sched: background spawning, delayed execution, and debouncing

mod git;
pub mod sched;

pub use git::{commit_message, CommandOutput, GitCli, VersionControl};
