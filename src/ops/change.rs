use crate::error::Result;
use crate::git::payload::{TempPayload, prefixed_message};
use crate::git::runner::ProcessRunner;
use crate::security::GitSubcommand;
use crate::security::policy::PolicyAction;
use crate::security::validator::ValidationError;

use super::requests::{
    AddRequest, BranchAction, BranchRequest, CommitRequest, StashAction, StashRequest,
    SwitchRequest,
};
use super::{GitOps, OperationOutput};

impl<'a, R: ProcessRunner> GitOps<'a, R> {
    pub async fn add(&self, request: &AddRequest) -> Result<OperationOutput> {
        if request.paths.is_empty() {
            return Err(ValidationError::new("paths", "at least one path is required").into());
        }

        let repo = self.open().await?;
        let command = repo.request(GitSubcommand::Add).paths(&request.paths);

        Ok(self.execute(&repo, command).await?.into())
    }

    /// Commit with the message passed by file reference, never as an argument
    pub async fn commit(&self, request: &CommitRequest) -> Result<OperationOutput> {
        request.validate()?;

        let repo = self.open().await?;
        let current = repo.current_branch().await?;
        self.policy()
            .evaluate(&PolicyAction::Commit {
                current_branch: current.as_ref(),
            })
            .into_result()?;

        let message = prefixed_message(&self.config.commit_prefix, &request.message);
        let payload = TempPayload::create(&message)?;

        let mut command = repo.request(GitSubcommand::Commit);
        if request.all {
            command = command.arg("--all");
        }
        let command = command
            .args(["--file".to_string(), payload.arg()])
            .paths(&request.paths);

        let result = self.execute(&repo, command).await;
        payload.close();

        Ok(result?.into())
    }

    pub async fn stash(&self, request: &StashRequest) -> Result<OperationOutput> {
        let message = request.validated_message()?;
        if message.is_some() && request.action != StashAction::Push {
            return Err(ValidationError::new("stash message", "only valid for push").into());
        }

        let repo = self.open().await?;
        let command = match request.action {
            StashAction::List => repo.request(GitSubcommand::Stash).arg("list"),
            StashAction::Push => {
                let mut command = repo.request(GitSubcommand::Stash).arg("push");
                if request.include_untracked {
                    command = command.arg("--include-untracked");
                }
                if let Some(message) = message {
                    command = command.arg(format!("--message={}", message));
                }
                command
            }
            StashAction::Pop | StashAction::Apply | StashAction::Drop => {
                let verb = match request.action {
                    StashAction::Pop => "pop",
                    StashAction::Apply => "apply",
                    _ => "drop",
                };
                let mut command = repo.request(GitSubcommand::Stash).arg(verb);
                if let Some(index) = request.index {
                    command = command.arg(format!("stash@{{{}}}", index));
                }
                command
            }
        };

        Ok(self.execute(&repo, command).await?.into())
    }

    pub async fn branch(&self, request: &BranchRequest) -> Result<OperationOutput> {
        let command_args: Vec<String> = match request.action {
            BranchAction::List => vec!["--list".to_string()],
            BranchAction::Create => {
                let name = request.required_name()?;
                let mut args = vec![name.to_string()];
                if let Some(start) = &request.start_point {
                    args.push(start.to_string());
                }
                args
            }
            BranchAction::Delete => {
                let name = request.required_name()?;
                self.policy()
                    .evaluate(&PolicyAction::DeleteBranch {
                        branch: name,
                        force: request.force,
                    })
                    .into_result()?;
                let flag = if request.force { "-D" } else { "-d" };
                vec![flag.to_string(), name.to_string()]
            }
        };

        let repo = self.open().await?;
        let command = repo.request(GitSubcommand::Branch).args(command_args);

        Ok(self.execute(&repo, command).await?.into())
    }

    pub async fn switch(&self, request: &SwitchRequest) -> Result<OperationOutput> {
        if request.start_point.is_some() && !request.create {
            return Err(
                ValidationError::new("start_point", "only valid when creating a branch").into(),
            );
        }

        let repo = self.open().await?;
        let mut command = repo.request(GitSubcommand::Switch);
        if request.create {
            command = command.arg("--create");
        }
        command = command.arg(request.branch.as_str());
        if let Some(start) = &request.start_point {
            command = command.arg(start.as_str());
        }

        Ok(self.execute(&repo, command).await?.into())
    }
}
