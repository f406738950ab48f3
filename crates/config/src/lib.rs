//! Configuration loading and validation for CapForge.
//!
//! Loads configuration from `~/.capforge/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The root configuration structure.
///
/// Maps directly to `~/.capforge/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root directory for per-target worker directories.
    #[serde(default = "default_workers_dir")]
    pub workers_dir: PathBuf,

    /// Command template launching a worker; `{file}` is replaced with the
    /// generated source file name.
    #[serde(default = "default_worker_command")]
    pub worker_command: Vec<String>,

    /// Lifecycle orchestration settings.
    #[serde(default)]
    pub runtime: RuntimeSection,

    /// Capability bridge settings.
    #[serde(default)]
    pub bridge: BridgeSection,
}

fn default_workers_dir() -> PathBuf {
    PathBuf::from("workers")
}
fn default_worker_command() -> Vec<String> {
    vec!["uv".into(), "run".into(), "{file}".into()]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeSection {
    /// Seconds to watch a fresh spawn for an immediate crash.
    #[serde(default = "default_crash_window_secs")]
    pub crash_window_secs: u64,

    /// Packages installed into every worker environment before the user's
    /// own packages.
    #[serde(default = "default_bootstrap_packages")]
    pub bootstrap_packages: Vec<String>,
}

fn default_crash_window_secs() -> u64 {
    5
}
fn default_bootstrap_packages() -> Vec<String> {
    vec!["mcp".into()]
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            crash_window_secs: default_crash_window_secs(),
            bootstrap_packages: default_bootstrap_packages(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeSection {
    /// Per-session deadline in seconds, covering the handshake and each
    /// request.
    #[serde(default = "default_session_timeout_secs")]
    pub session_timeout_secs: u64,
}

fn default_session_timeout_secs() -> u64 {
    30
}

impl Default for BridgeSection {
    fn default() -> Self {
        Self { session_timeout_secs: default_session_timeout_secs() }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workers_dir: default_workers_dir(),
            worker_command: default_worker_command(),
            runtime: RuntimeSection::default(),
            bridge: BridgeSection::default(),
        }
    }
}

impl AppConfig {
    /// Load from the default location with environment overrides applied.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if let Ok(dir) = std::env::var("CAPFORGE_WORKERS_DIR") {
            config.workers_dir = PathBuf::from(dir);
        }
        if let Ok(secs) = std::env::var("CAPFORGE_CRASH_WINDOW_SECS") {
            config.runtime.crash_window_secs = secs.parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "CAPFORGE_CRASH_WINDOW_SECS is not a number: {secs}"
                ))
            })?;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".capforge")
    }

    pub fn crash_window(&self) -> Duration {
        Duration::from_secs(self.runtime.crash_window_secs)
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.bridge.session_timeout_secs)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_command.is_empty() {
            return Err(ConfigError::ValidationError(
                "worker_command must not be empty".into(),
            ));
        }
        if !self.worker_command.iter().any(|part| part.contains("{file}")) {
            return Err(ConfigError::ValidationError(
                "worker_command must contain a {file} placeholder".into(),
            ));
        }
        if self.runtime.crash_window_secs == 0 {
            return Err(ConfigError::ValidationError(
                "runtime.crash_window_secs must be at least 1".into(),
            ));
        }
        if self.bridge.session_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "bridge.session_timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
