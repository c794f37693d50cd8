//! Per-run repository status snapshot and indicator values.

use std::fmt;

/// What the repository needs, as last observed by a pipeline run.
///
/// Each field is `None` only before the step that owns it has run at
/// least once in the run; steps never reset a field back to `None`.
#[derive(Debug, Clone, Default)]
pub struct StatusState {
    /// Working tree has uncommitted changes
    pub need_commit: Option<bool>,
    /// Local branch is behind its upstream
    pub need_pull_rebase: Option<bool>,
    /// Local branch is ahead of its upstream
    pub need_push: Option<bool>,
    /// Human-readable listing of pending changes, when dirty
    pub commit_list: Option<String>,
}

impl StatusState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Working-tree commit indicator value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStatus {
    Dirty,
    Clean,
}

impl fmt::Display for CommitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dirty => write!(f, "dirty"),
            Self::Clean => write!(f, "clean"),
        }
    }
}

/// Pull indicator value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullStatus {
    Needed,
    NotNeeded,
}

impl fmt::Display for PullStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Needed => write!(f, "needed"),
            Self::NotNeeded => write!(f, "not-needed"),
        }
    }
}

/// Push indicator value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushStatus {
    Needed,
    NotNeeded,
}

impl fmt::Display for PushStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Needed => write!(f, "needed"),
            Self::NotNeeded => write!(f, "not-needed"),
        }
    }
}

/// Exception indicator value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionStatus {
    Error,
    NoError,
}

impl fmt::Display for ExceptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::NoError => write!(f, "no-error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_state_starts_unknown() {
        let state = StatusState::new();
        assert_eq!(state.need_commit, None);
        assert_eq!(state.need_pull_rebase, None);
        assert_eq!(state.need_push, None);
        assert_eq!(state.commit_list, None);
    }

    #[test]
    fn test_indicator_wire_strings() {
        assert_eq!(CommitStatus::Dirty.to_string(), "dirty");
        assert_eq!(CommitStatus::Clean.to_string(), "clean");
        assert_eq!(PullStatus::Needed.to_string(), "needed");
        assert_eq!(PushStatus::NotNeeded.to_string(), "not-needed");
        assert_eq!(ExceptionStatus::Error.to_string(), "error");
        assert_eq!(ExceptionStatus::NoError.to_string(), "no-error");
    }
}
