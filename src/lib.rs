pub mod audit;
pub mod config;
pub mod error;
pub mod git;
pub mod ops;
pub mod security;

// Re-export commonly used types for convenience
pub use config::{Config, GitOpsConfig, RunnerConfig};
pub use error::{AppError, EnvironmentError, GitOpsError, ProcessError, Result};
pub use git::{CommandRequest, ProcessResult, ProcessRunner, Repository, SystemRunner};
pub use ops::{GitOps, Operation, OperationOutput};
pub use security::{GitSubcommand, HostSubcommand, PolicyEngine, PolicyViolation, ValidationError};
