//! Configuration management for git-autosync.
//!
//! Supports layered configuration: defaults → repository → user → env

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub git: GitSettings,
    #[serde(default)]
    pub timing: TimingSettings,
    #[serde(default)]
    pub watch: WatchSettings,
}

impl SyncConfig {
    /// Load configuration with hierarchy: defaults → repository → user → env
    pub fn load(repo_root: Option<&PathBuf>) -> Result<Self, ConfigError> {
        use config::{Config, Environment, File};

        let mut builder = Config::builder();

        // 1. Start with defaults
        builder = builder.add_source(
            config::File::from_str(
                include_str!("../default_config.toml"),
                config::FileFormat::Toml,
            )
            .required(false),
        );

        // 2. Repository-specific config (.git-autosync.toml in repo root)
        if let Some(root) = repo_root {
            let repo_config = root.join(".git-autosync.toml");
            if repo_config.exists() {
                builder = builder.add_source(File::from(repo_config).required(false));
            }
        }

        // 3. User config (~/.config/git-autosync/config.toml)
        if let Some(config_dir) =
            directories::ProjectDirs::from("com", "git-autosync", "git-autosync")
        {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                builder = builder.add_source(File::from(user_config).required(false));
            }
        }

        // 4. Environment variables (GIT_AUTOSYNC_*)
        builder = builder.add_source(
            Environment::with_prefix("GIT_AUTOSYNC")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration with default settings only
    pub fn load_defaults() -> Self {
        Self::default()
    }
}

/// Git-related settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitSettings {
    /// Commit message template; a timestamp is appended
    #[serde(default = "default_commit_message")]
    pub commit_message: String,
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            commit_message: default_commit_message(),
        }
    }
}

fn default_commit_message() -> String {
    "[git-autosync]".to_string()
}

/// Timing of retries, sub-checks, and debouncing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingSettings {
    /// Cooldown before the post-failure status re-check
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    /// Micro-delay between the working-tree and upstream sub-checks
    #[serde(default = "default_status_gap_ms")]
    pub status_gap_ms: u64,
    /// Window for collapsing bursts of externally triggered checks
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl TimingSettings {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn status_gap(&self) -> Duration {
        Duration::from_millis(self.status_gap_ms)
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            retry_delay_secs: default_retry_delay_secs(),
            status_gap_ms: default_status_gap_ms(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

fn default_retry_delay_secs() -> u64 {
    15
}

fn default_status_gap_ms() -> u64 {
    100
}

fn default_debounce_ms() -> u64 {
    2000
}

/// Watch-mode settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchSettings {
    /// Seconds between periodic checks
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Run the full sync pipeline on each tick instead of a check
    #[serde(default = "default_auto_sync")]
    pub auto_sync: bool,
    /// Warn at startup when local HEAD differs from upstream
    #[serde(default = "default_check_synced")]
    pub check_synced: bool,
}

impl WatchSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            auto_sync: default_auto_sync(),
            check_synced: default_check_synced(),
        }
    }
}

fn default_interval_secs() -> u64 {
    60
}

fn default_auto_sync() -> bool {
    false
}

fn default_check_synced() -> bool {
    true
}
