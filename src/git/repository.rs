use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{EnvironmentError, GitOpsError, ProcessError, Result};
use crate::git::command::{CommandRequest, Program};
use crate::git::runner::{ProcessResult, ProcessRunner};
use crate::security::GitSubcommand;
use crate::security::validator::BranchName;

/// A working tree that passed the environment preconditions.
///
/// Holding a `Repository` means `git` was found on the host and the directory
/// is inside a work tree. Mutating operations are only attempted through one.
#[derive(Debug)]
pub struct Repository<'r, R: ProcessRunner> {
    path: PathBuf,
    runner: &'r R,
    timeout: Duration,
}

impl<'r, R: ProcessRunner> Repository<'r, R> {
    /// Check the preconditions for operating on `path`
    pub async fn open(path: impl AsRef<Path>, runner: &'r R, timeout: Duration) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        runner.locate(Program::Git)?;

        if !path.is_dir() {
            return Err(EnvironmentError::NotARepository(path.display().to_string()).into());
        }

        let repo = Self {
            path,
            runner,
            timeout,
        };

        let result = repo
            .run(repo.request(GitSubcommand::RevParse).arg("--is-inside-work-tree"))
            .await;
        if !result.success() || result.stdout.trim() != "true" {
            return Err(EnvironmentError::NotARepository(repo.path.display().to_string()).into());
        }

        Ok(repo)
    }

    /// Get the repository path
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn runner(&self) -> &'r R {
        self.runner
    }

    /// Start a request rooted at this repository with its timeout
    pub fn request(&self, subcommand: GitSubcommand) -> CommandRequest {
        CommandRequest::new(subcommand, &self.path).timeout(self.timeout)
    }

    pub async fn run(&self, request: CommandRequest) -> ProcessResult {
        self.runner.run(&request).await
    }

    /// Get the current branch name; `None` on a detached HEAD
    pub async fn current_branch(&self) -> Result<Option<BranchName>> {
        let request = self
            .request(GitSubcommand::SymbolicRef)
            .args(["--quiet", "--short", "HEAD"]);
        let result = self.runner.run(&request).await;

        // symbolic-ref exits 1 without output when HEAD is detached
        if result.exit_code == 1 && !result.timed_out && result.stderr.trim().is_empty() {
            return Ok(None);
        }
        let result = check_result(&request, result)?;

        let name = result.stdout.trim();
        if name.is_empty() {
            return Ok(None);
        }
        // Names git itself reports may still fall outside our stricter rules.
        Ok(Some(BranchName::parse(name)?))
    }

    /// The current branch, or an error naming what needed it
    pub async fn require_current_branch(&self, purpose: &str) -> Result<BranchName> {
        self.current_branch()
            .await?
            .ok_or_else(|| EnvironmentError::DetachedHead(purpose.to_string()).into())
    }
}

/// Map a finished process to `Ok` on exit code 0, else a [`ProcessError`]
pub fn check_result(request: &CommandRequest, result: ProcessResult) -> Result<ProcessResult> {
    if result.success() {
        return Ok(result);
    }

    Err(GitOpsError::Process(ProcessError {
        command: request.display_line(),
        exit_code: result.exit_code,
        stderr: result.stderr,
        timed_out: result.timed_out,
    }))
}
