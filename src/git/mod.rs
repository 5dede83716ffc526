pub mod command;
pub mod output;
pub mod payload;
pub mod repository;
pub mod runner;

// Re-export commonly used types
pub use command::{CommandRequest, DEFAULT_TIMEOUT, Program, Subcommand};
pub use output::{mark_binary_files, truncate_lines};
pub use payload::{TempPayload, prefixed_message};
pub use repository::Repository;
pub use runner::{ProcessResult, ProcessRunner, SystemRunner};
