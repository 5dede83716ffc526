use std::io;
use thiserror::Error;

use crate::config::settings::ConfigError;
use crate::security::policy::PolicyViolation;
use crate::security::validator::ValidationError;

/// The working tree or host is not fit for the requested operation
#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("Not a git repository: {0}")]
    NotARepository(String),

    #[error("Required executable '{0}' was not found")]
    ExecutableNotFound(String),

    #[error("HEAD is detached; {0}")]
    DetachedHead(String),
}

/// A subprocess ran and failed, timed out, or never started
///
/// `stderr` is the executable's own diagnostic text, unmodified.
#[derive(Debug, Error)]
#[error("Command '{command}' failed with exit code {exit_code}: {}", .stderr.trim())]
pub struct ProcessError {
    pub command: String,
    pub exit_code: i32,
    pub stderr: String,
    pub timed_out: bool,
}

/// Errors that can occur during git operations
#[derive(Debug, Error)]
pub enum GitOpsError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Policy(#[from] PolicyViolation),

    #[error(transparent)]
    Environment(#[from] EnvironmentError),

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl GitOpsError {
    /// Stable label for the error category
    pub fn kind(&self) -> &'static str {
        match self {
            GitOpsError::Validation(_) => "validation",
            GitOpsError::Policy(_) => "policy",
            GitOpsError::Environment(_) => "environment",
            GitOpsError::Process(_) => "process",
            GitOpsError::Io(_) => "io",
        }
    }

    /// Whether the error was raised before any mutating process was started
    pub fn is_pre_execution(&self) -> bool {
        matches!(
            self,
            GitOpsError::Validation(_) | GitOpsError::Policy(_) | GitOpsError::Environment(_)
        )
    }
}

/// Top-level error for the binary
///
/// Wraps configuration problems and operation failures so `main` has a single
/// error type to report.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    GitOps(#[from] GitOpsError),

    #[error("Malformed request: {0}")]
    Request(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config",
            AppError::GitOps(e) => e.kind(),
            AppError::Request(_) => "request",
            AppError::Io(_) => "io",
        }
    }
}

/// Result type for git operations
pub type Result<T> = std::result::Result<T, GitOpsError>;

/// Result type for application-level operations
pub type AppResult<T> = std::result::Result<T, AppError>;
