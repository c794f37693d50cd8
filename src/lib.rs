//! git-autosync: background git synchronization.
//!
//! This crate coordinates version-control operations (status check,
//! commit, pull/rebase, push, and composite "sync") as sequences of
//! named, observable pipeline steps with indicator state for external
//! observers and a delayed retry loop on failure.

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod indicators;
pub mod pipeline;
pub mod services;

pub use config::SyncConfig;
pub use error::{AppError, Result};
pub use indicators::IndicatorRegistry;
pub use pipeline::{SharedStepManager, StepManager, SyncContext};
