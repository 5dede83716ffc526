//! High-level git operations built on the validator, policy engine and runner.
//!
//! Every operation follows the same order: validate request fields, apply
//! policy, check environment preconditions, build the argument vector, run,
//! then govern the output. Validation and policy failures never start a
//! process unless the policy needs to know the current branch.

mod change;
mod inspect;
mod remote;
pub mod requests;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::audit::AuditLogger;
use crate::config::{GitOpsConfig, RunnerConfig};
use crate::error::{GitOpsError, Result};
use crate::git::command::CommandRequest;
use crate::git::repository::{Repository, check_result};
use crate::git::runner::{ProcessResult, ProcessRunner};
use crate::security::policy::PolicyEngine;
use crate::security::validator::RemoteName;

pub use requests::{
    AddRequest, BlameRequest, BranchAction, BranchRequest, CommitRequest, DiffRequest,
    FetchRequest, LogRequest, PrCreateRequest, PullRequest, PushRequest, ShowRequest,
    StashAction, StashRequest, StatusRequest, SwitchRequest,
};

/// Output of a successful operation, after truncation and binary marking
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OperationOutput {
    pub stdout: String,
    pub stderr: String,
}

/// A single operation request as received from the tool surface
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum Operation {
    Status(StatusRequest),
    Diff(DiffRequest),
    Log(LogRequest),
    Blame(BlameRequest),
    Show(ShowRequest),
    Stash(StashRequest),
    Add(AddRequest),
    Commit(CommitRequest),
    Branch(BranchRequest),
    Switch(SwitchRequest),
    Push(PushRequest),
    Pull(PullRequest),
    Fetch(FetchRequest),
    PrCreate(PrCreateRequest),
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Status(_) => "status",
            Operation::Diff(_) => "diff",
            Operation::Log(_) => "log",
            Operation::Blame(_) => "blame",
            Operation::Show(_) => "show",
            Operation::Stash(_) => "stash",
            Operation::Add(_) => "add",
            Operation::Commit(_) => "commit",
            Operation::Branch(_) => "branch",
            Operation::Switch(_) => "switch",
            Operation::Push(_) => "push",
            Operation::Pull(_) => "pull",
            Operation::Fetch(_) => "fetch",
            Operation::PrCreate(_) => "pr_create",
        }
    }
}

/// Entry point for running operations against one working directory.
///
/// Borrows the process-wide configuration; holds no mutable state, so any
/// number of operations may run concurrently through the same value.
pub struct GitOps<'a, R: ProcessRunner> {
    config: &'a GitOpsConfig,
    runner: &'a R,
    working_dir: PathBuf,
    timeout: Duration,
    audit: Option<&'a AuditLogger>,
}

impl<'a, R: ProcessRunner> GitOps<'a, R> {
    pub fn new(config: &'a GitOpsConfig, runner: &'a R, working_dir: impl AsRef<Path>) -> Self {
        Self {
            config,
            runner,
            working_dir: working_dir.as_ref().to_path_buf(),
            timeout: RunnerConfig::default().timeout(),
            audit: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_audit(mut self, audit: &'a AuditLogger) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Run any operation, recording rejections in the audit log
    pub async fn dispatch(&self, operation: &Operation) -> Result<OperationOutput> {
        let result = match operation {
            Operation::Status(req) => self.status(req).await,
            Operation::Diff(req) => self.diff(req).await,
            Operation::Log(req) => self.log(req).await,
            Operation::Blame(req) => self.blame(req).await,
            Operation::Show(req) => self.show(req).await,
            Operation::Stash(req) => self.stash(req).await,
            Operation::Add(req) => self.add(req).await,
            Operation::Commit(req) => self.commit(req).await,
            Operation::Branch(req) => self.branch(req).await,
            Operation::Switch(req) => self.switch(req).await,
            Operation::Push(req) => self.push(req).await,
            Operation::Pull(req) => self.pull(req).await,
            Operation::Fetch(req) => self.fetch(req).await,
            Operation::PrCreate(req) => self.pr_create(req).await,
        };

        if let Err(e) = &result {
            if e.is_pre_execution() {
                self.audit_rejection(operation.name(), e);
            }
        }

        result
    }

    fn policy(&self) -> PolicyEngine<'a> {
        PolicyEngine::new(self.config)
    }

    async fn open(&self) -> Result<Repository<'a, R>> {
        Repository::open(&self.working_dir, self.runner, self.timeout).await
    }

    /// Requested remote, or the configured default
    fn remote_or_default(&self, remote: Option<&RemoteName>) -> Result<RemoteName> {
        match remote {
            Some(remote) => Ok(remote.clone()),
            None => Ok(RemoteName::parse(self.config.default_remote.as_str())?),
        }
    }

    /// Run a request, audit it, and fail on a non-zero exit
    async fn execute(
        &self,
        repo: &Repository<'a, R>,
        request: CommandRequest,
    ) -> Result<ProcessResult> {
        let mut result = repo.runner().run(&request).await;

        if let Some(audit) = self.audit {
            let logged = audit.log_command(&request.display_line(), repo.path(), result.exit_code);
            if let Err(e) = logged {
                tracing::warn!(error = %e, "failed to write audit log");
            }
        }

        if result.truncated {
            if !result.stderr.is_empty() && !result.stderr.ends_with('\n') {
                result.stderr.push('\n');
            }
            result.stderr.push_str("… output exceeded the size ceiling and was cut");
        }

        check_result(&request, result)
    }

    fn audit_rejection(&self, operation: &str, error: &GitOpsError) {
        if let Some(audit) = self.audit {
            let reason = error.to_string();
            let logged = audit.log_rejection(operation, error.kind(), &reason, &self.working_dir);
            if let Err(e) = logged {
                tracing::warn!(error = %e, "failed to write audit log");
            }
        }
    }
}

impl From<ProcessResult> for OperationOutput {
    fn from(result: ProcessResult) -> Self {
        Self {
            stdout: result.stdout,
            stderr: result.stderr,
        }
    }
}
