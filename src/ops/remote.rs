use crate::error::Result;
use crate::git::command::{CommandRequest, Program};
use crate::git::payload::TempPayload;
use crate::git::runner::ProcessRunner;
use crate::security::policy::PolicyAction;
use crate::security::validator::{BranchName, ValidationError};
use crate::security::{GitSubcommand, HostSubcommand};

use super::requests::{FetchRequest, PrCreateRequest, PullRequest, PushRequest};
use super::{GitOps, OperationOutput};

impl<'a, R: ProcessRunner> GitOps<'a, R> {
    /// Push a branch, defaulting to the current one.
    ///
    /// The target is reduced to a short branch name before the policy sees
    /// it, and the push uses an explicit `refs/heads/<b>:refs/heads/<b>`
    /// refspec so the checked name is the ref that gets updated. With an
    /// explicit branch the policy runs before the repository is touched;
    /// `HEAD` or no branch means the current branch has to be read first.
    pub async fn push(&self, request: &PushRequest) -> Result<OperationOutput> {
        let remote = self.remote_or_default(request.remote.as_ref())?;

        let named = match &request.branch {
            Some(branch) => short_branch_name(branch)?,
            None => None,
        };
        let (opened, branch) = match named {
            Some(branch) => (None, branch),
            None => {
                let repo = self.open().await?;
                let branch = repo
                    .require_current_branch("push needs an explicit branch")
                    .await?;
                (Some(repo), branch)
            }
        };

        let mut args = Vec::new();
        if request.set_upstream {
            args.push("--set-upstream".to_string());
        }
        if request.force {
            args.push("--force".to_string());
        }
        args.push(remote.to_string());
        args.push(format!("refs/heads/{0}:refs/heads/{0}", branch));

        let rewritten = self
            .policy()
            .evaluate(&PolicyAction::Push {
                branch: &branch,
                force: request.force,
                args: &args,
            })
            .into_result()?;
        let args = rewritten.unwrap_or(args);

        let repo = match opened {
            Some(repo) => repo,
            None => self.open().await?,
        };
        let command = repo.request(GitSubcommand::Push).args(args);

        Ok(self.execute(&repo, command).await?.into())
    }

    pub async fn pull(&self, request: &PullRequest) -> Result<OperationOutput> {
        if request.rebase && request.ff_only {
            return Err(
                ValidationError::new("pull", "'rebase' and 'ff_only' cannot be combined").into(),
            );
        }
        let remote = self.remote_or_default(request.remote.as_ref())?;

        let repo = self.open().await?;
        let mut command = repo.request(GitSubcommand::Pull);
        if request.rebase {
            command = command.arg("--rebase");
        }
        if request.ff_only {
            command = command.arg("--ff-only");
        }
        command = command.arg(remote.as_str());
        if let Some(reference) = &request.reference {
            command = command.arg(reference.as_str());
        }

        Ok(self.execute(&repo, command).await?.into())
    }

    pub async fn fetch(&self, request: &FetchRequest) -> Result<OperationOutput> {
        let remote = self.remote_or_default(request.remote.as_ref())?;

        let repo = self.open().await?;
        let mut command = repo.request(GitSubcommand::Fetch);
        if request.prune {
            command = command.arg("--prune");
        }
        let command = command.arg(remote.as_str());

        Ok(self.execute(&repo, command).await?.into())
    }

    /// Open a pull request through the hosting CLI; the body goes by file
    pub async fn pr_create(&self, request: &PrCreateRequest) -> Result<OperationOutput> {
        request.validate()?;
        self.runner.locate(Program::Host)?;

        let repo = self.open().await?;
        let payload = TempPayload::create(request.body.as_deref().unwrap_or(""))?;

        let mut command = CommandRequest::new(HostSubcommand::PrCreate, repo.path())
            .timeout(self.timeout)
            .arg(format!("--title={}", request.title))
            .args(["--body-file".to_string(), payload.arg()]);
        if let Some(base) = &request.base {
            command = command.args(["--base", base.as_str()]);
        }
        if let Some(head) = &request.head {
            command = command.args(["--head", head.as_str()]);
        }
        if let Some(labels) = request.label_value() {
            command = command.arg("--label").arg(labels);
        }
        if request.draft {
            command = command.arg("--draft");
        }

        let result = self.execute(&repo, command).await;
        payload.close();

        Ok(result?.into())
    }
}

/// The local branch a push target names, or `None` for `HEAD`.
///
/// `refs/heads/x` and `heads/x` resolve to `x` in git, so they are reduced
/// before any protected-branch comparison. Other ref namespaces are refused.
fn short_branch_name(branch: &BranchName) -> Result<Option<BranchName>> {
    let name = branch.as_str();
    if name == "HEAD" {
        return Ok(None);
    }

    let short = name
        .strip_prefix("refs/heads/")
        .or_else(|| name.strip_prefix("heads/"))
        .unwrap_or(name);
    if short == "HEAD" || short.starts_with("refs/") || short.starts_with("heads/") {
        return Err(ValidationError::new(
            "push branch",
            format!("'{}' does not name a local branch", name),
        )
        .into());
    }

    Ok(Some(BranchName::parse(short)?))
}
