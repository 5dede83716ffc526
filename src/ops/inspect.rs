use crate::error::Result;
use crate::git::output::{
    MAX_BLAME_LINES, MAX_DIFF_LINES, MAX_LOG_LINES, mark_binary_files, truncate_lines,
};
use crate::git::runner::ProcessRunner;
use crate::security::GitSubcommand;
use crate::security::validator::ValidationError;

use super::requests::{BlameRequest, DiffRequest, LogRequest, ShowRequest, StatusRequest};
use super::{GitOps, OperationOutput};

impl<'a, R: ProcessRunner> GitOps<'a, R> {
    pub async fn status(&self, request: &StatusRequest) -> Result<OperationOutput> {
        let repo = self.open().await?;
        let command = repo
            .request(GitSubcommand::Status)
            .args(["--short", "--branch"])
            .paths(&request.paths);

        Ok(self.execute(&repo, command).await?.into())
    }

    pub async fn diff(&self, request: &DiffRequest) -> Result<OperationOutput> {
        if request.to.is_some() && request.from.is_none() {
            return Err(ValidationError::new("diff", "'to' requires 'from'").into());
        }

        let repo = self.open().await?;
        let mut command = repo.request(GitSubcommand::Diff).args(["--no-ext-diff", "--no-textconv"]);
        if request.staged {
            command = command.arg("--cached");
        }
        if request.stat {
            command = command.arg("--stat");
        }
        if let Some(from) = &request.from {
            command = command.arg(from.as_str());
        }
        if let Some(to) = &request.to {
            command = command.arg(to.as_str());
        }
        let command = command.pathspec(&request.paths);

        let result = self.execute(&repo, command).await?;
        Ok(OperationOutput {
            stdout: truncate_lines(&mark_binary_files(&result.stdout), MAX_DIFF_LINES, "diff"),
            stderr: result.stderr,
        })
    }

    pub async fn log(&self, request: &LogRequest) -> Result<OperationOutput> {
        let filters = request.filter_flags()?;

        let repo = self.open().await?;
        let mut command = repo
            .request(GitSubcommand::Log)
            .arg(format!("--max-count={}", request.effective_max_count()));
        if request.oneline {
            command = command.arg("--oneline");
        }
        command = command.args(filters);
        if let Some(reference) = &request.reference {
            command = command.arg(reference.as_str());
        }
        let command = command.pathspec(&request.paths);

        let result = self.execute(&repo, command).await?;
        Ok(OperationOutput {
            stdout: truncate_lines(&result.stdout, MAX_LOG_LINES, "log"),
            stderr: result.stderr,
        })
    }

    pub async fn blame(&self, request: &BlameRequest) -> Result<OperationOutput> {
        let range = request.line_range()?;

        let repo = self.open().await?;
        let mut command = repo.request(GitSubcommand::Blame);
        if let Some(range) = range {
            command = command.args(["-L".to_string(), range]);
        }
        if let Some(rev) = &request.rev {
            command = command.arg(rev.as_str());
        }
        let command = command.paths(std::slice::from_ref(&request.path));

        let result = self.execute(&repo, command).await?;
        Ok(OperationOutput {
            stdout: truncate_lines(&result.stdout, MAX_BLAME_LINES, "blame"),
            stderr: result.stderr,
        })
    }

    pub async fn show(&self, request: &ShowRequest) -> Result<OperationOutput> {
        let repo = self.open().await?;
        let mut command = repo
            .request(GitSubcommand::Show)
            .args(["--no-ext-diff", "--no-textconv"]);
        if request.stat {
            command = command.arg("--stat");
        }
        let reference = request
            .reference
            .as_ref()
            .map(|r| r.as_str())
            .unwrap_or("HEAD");
        // Trailing separator keeps the ref from being read as a path
        let command = command.args([reference, "--"]);

        let result = self.execute(&repo, command).await?;
        Ok(OperationOutput {
            stdout: truncate_lines(&mark_binary_files(&result.stdout), MAX_DIFF_LINES, "show"),
            stderr: result.stderr,
        })
    }
}
