use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::security::validator::{validate_branch_name, validate_remote_name};

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "SAFEGIT_CONFIG";

const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024; // 10 MiB

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    DirectoryNotFound,

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

/// Organizational policy for git operations.
///
/// Resolved once at startup and only ever read afterwards; every operation
/// borrows it.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct GitOpsConfig {
    pub allow_force_push: bool,
    pub allow_main_commit: bool,
    pub default_remote: String,
    pub commit_prefix: String,
    pub protected_branches: BTreeSet<String>,
}

impl Default for GitOpsConfig {
    fn default() -> Self {
        Self {
            allow_force_push: false,
            allow_main_commit: false,
            default_remote: "origin".to_string(),
            commit_prefix: String::new(),
            protected_branches: ["main", "master"].iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl GitOpsConfig {
    pub fn is_protected(&self, branch: &str) -> bool {
        self.protected_branches.contains(branch)
    }
}

/// Bounds applied to every subprocess
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct RunnerConfig {
    pub timeout_ms: u64,
    pub max_output_bytes: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

impl RunnerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    #[serde(flatten)]
    pub git_ops: GitOpsConfig,
    pub runner: RunnerConfig,
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        let home = std::env::var("HOME").map_err(|_| ConfigError::DirectoryNotFound)?;
        Ok(PathBuf::from(home).join(".config").join("safegit"))
    }

    /// Get the config file path, honouring `SAFEGIT_CONFIG`
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            if !path.is_empty() {
                return Ok(PathBuf::from(path));
            }
        }
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from the default location.
    ///
    /// A missing file is not an error: every field has a default.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration. Unknown keys are ignored.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<(), ConfigError> {
        validate_remote_name(&self.git_ops.default_remote).map_err(|e| {
            ConfigError::InvalidValue(format!("defaultRemote: {}", e.reason))
        })?;

        for branch in &self.git_ops.protected_branches {
            validate_branch_name(branch).map_err(|e| {
                ConfigError::InvalidValue(format!("protectedBranches '{}': {}", branch, e.reason))
            })?;
        }

        if self.git_ops.commit_prefix.contains('\0') {
            return Err(ConfigError::InvalidValue(
                "commitPrefix must not contain NUL bytes".to_string(),
            ));
        }

        if self.runner.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "timeoutMs must be greater than 0".to_string(),
            ));
        }

        if self.runner.max_output_bytes == 0 {
            return Err(ConfigError::InvalidValue(
                "maxOutputBytes must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
