use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024; // 10MB

/// Append-only record of executed commands and rejected requests
#[derive(Debug, Clone)]
pub struct AuditLogger {
    log_path: PathBuf,
}

impl AuditLogger {
    /// Create a new AuditLogger with the default log path
    pub fn new() -> std::io::Result<Self> {
        Self::with_path(Self::default_log_path()?)
    }

    /// Create an AuditLogger with a custom log path
    pub fn with_path<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let log_path = path.as_ref().to_path_buf();

        // Ensure directory exists
        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)?;
        }

        Ok(Self { log_path })
    }

    /// Get the default log path: ~/.config/safegit/audit.log
    fn default_log_path() -> std::io::Result<PathBuf> {
        let home = std::env::var("HOME").map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "HOME environment variable not set",
            )
        })?;

        Ok(PathBuf::from(home)
            .join(".config")
            .join("safegit")
            .join("audit.log"))
    }

    /// Log a command execution
    pub fn log_command(
        &self,
        command: &str,
        repo_path: &Path,
        exit_code: i32,
    ) -> std::io::Result<()> {
        self.append(&format!(
            "[{}] [exit:{}] {}",
            repo_path.display(),
            exit_code,
            escape(command)
        ))
    }

    /// Log a request that never reached a subprocess
    ///
    /// `category` is the error kind (`validation`, `policy`, `environment`).
    pub fn log_rejection(
        &self,
        operation: &str,
        category: &str,
        reason: &str,
        repo_path: &Path,
    ) -> std::io::Result<()> {
        self.append(&format!(
            "[{}] [REJECTED:{}] operation=\"{}\" reason=\"{}\"",
            repo_path.display(),
            category,
            escape(operation),
            escape(reason)
        ))
    }

    fn append(&self, entry: &str) -> std::io::Result<()> {
        // Check and rotate log if needed
        self.rotate_if_needed()?;

        let timestamp = Utc::now().to_rfc3339();
        let user = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
        let line = format!("[{}] [{}] {}\n", timestamp, user, entry);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;

        file.write_all(line.as_bytes())?;
        file.flush()?;

        Ok(())
    }

    /// Rotate log file if it exceeds MAX_LOG_SIZE
    fn rotate_if_needed(&self) -> std::io::Result<()> {
        if !self.log_path.exists() {
            return Ok(());
        }

        let metadata = fs::metadata(&self.log_path)?;
        if metadata.len() > MAX_LOG_SIZE {
            // Rotate: audit.log -> audit.log.1
            let backup_path = self.log_path.with_extension("log.1");
            fs::rename(&self.log_path, backup_path)?;
        }

        Ok(())
    }

    /// Get the path to the log file
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}

/// Keep one entry per line whatever the caller sent
fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\n', "\\n").replace('\r', "\\r")
}
