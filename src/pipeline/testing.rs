//! Scripted git client for pipeline tests.

use crate::config::SyncConfig;
use crate::error::{GitError, GitResult};
use crate::indicators::IndicatorRegistry;
use crate::pipeline::steps::SyncContext;
use crate::services::{CommandOutput, VersionControl};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// One scripted outcome for a git operation
pub enum Scripted {
    Output(CommandOutput),
    Fail(String),
}

/// Successful invocation with the given stdout
pub fn output(stdout: &str) -> Scripted {
    Scripted::Output(CommandOutput {
        exit_code: 0,
        stdout: stdout.to_string(),
    })
}

/// Invocation that fails with a `GitError`
pub fn failure(message: &str) -> Scripted {
    Scripted::Fail(message.to_string())
}

/// `VersionControl` whose responses are scripted per operation key.
///
/// Keys are the operation name, with the range appended for `log`
/// (e.g. "log HEAD..@{u}"). Unscripted calls succeed with empty
/// output, so the default mock behaves like a clean, up-to-date repo.
pub struct MockGit {
    script: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<String>>,
}

impl MockGit {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Queue an outcome for the next call with this key
    pub fn script(&self, key: &str, outcome: Scripted) {
        self.script
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .push_back(outcome);
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_calls(&self, key: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == key).count()
    }

    fn take(&self, key: &str) -> GitResult<CommandOutput> {
        self.calls.lock().unwrap().push(key.to_string());
        let scripted = self
            .script
            .lock()
            .unwrap()
            .get_mut(key)
            .and_then(|queue| queue.pop_front());
        match scripted {
            Some(Scripted::Output(output)) => Ok(output),
            Some(Scripted::Fail(message)) => Err(GitError::Operation(message)),
            None => Ok(CommandOutput {
                exit_code: 0,
                stdout: String::new(),
            }),
        }
    }
}

#[async_trait]
impl VersionControl for MockGit {
    async fn status(&self, _include_untracked: bool) -> GitResult<CommandOutput> {
        self.take("status")
    }

    async fn commit(&self, _should_commit: bool, _message: &str) -> GitResult<CommandOutput> {
        self.take("commit")
    }

    async fn pull(&self, _should_pull: bool) -> GitResult<CommandOutput> {
        self.take("pull")
    }

    async fn pull_rebase(&self, _should_pull_rebase: bool) -> GitResult<CommandOutput> {
        self.take("pull_rebase")
    }

    async fn push(&self, _should_push: bool) -> GitResult<CommandOutput> {
        self.take("push")
    }

    async fn checkout(&self) -> GitResult<CommandOutput> {
        self.take("checkout")
    }

    async fn log(&self, args: &[&str]) -> GitResult<CommandOutput> {
        let range = args.last().copied().unwrap_or("");
        self.take(&format!("log {}", range))
    }

    async fn fetch(&self) -> GitResult<CommandOutput> {
        self.take("fetch")
    }

    async fn rev_parse(&self, reference: &str) -> GitResult<CommandOutput> {
        self.take(&format!("rev_parse {}", reference))
    }
}

/// Mock client plus a context wired to a fresh indicator registry
pub fn test_context() -> (Arc<MockGit>, Arc<SyncContext>) {
    let git = MockGit::new();
    let ctx = Arc::new(SyncContext::new(
        Arc::clone(&git) as Arc<dyn VersionControl>,
        Arc::new(IndicatorRegistry::new()),
        SyncConfig::load_defaults(),
    ));
    (git, ctx)
}

/// Yield enough times for spawned tasks to make progress
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
