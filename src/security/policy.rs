//! Configuration-driven rules applied to validated requests.
//!
//! Gates run in a fixed order: protected branch, force push, main commit.
//! The engine only looks at branch identity and the kind of operation, never
//! at file contents or diff output.

use std::fmt;
use thiserror::Error;

use crate::config::GitOpsConfig;
use crate::security::validator::BranchName;

/// Flag substituted for any unconditional force flag
pub const FORCE_WITH_LEASE: &str = "--force-with-lease";

/// The rule that denied a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyRule {
    ProtectedBranch,
    ForcePush,
    MainCommit,
}

impl PolicyRule {
    /// How an operator can lift the rule, if at all
    pub fn override_hint(self) -> &'static str {
        match self {
            PolicyRule::ProtectedBranch => "not overridable",
            PolicyRule::ForcePush => "set allowForcePush = true to override",
            PolicyRule::MainCommit => "set allowMainCommit = true to override",
        }
    }
}

impl fmt::Display for PolicyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PolicyRule::ProtectedBranch => "protected-branch",
            PolicyRule::ForcePush => "force-push",
            PolicyRule::MainCommit => "main-commit",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("policy violation ({rule}): {reason} ({})", .rule.override_hint())]
pub struct PolicyViolation {
    pub rule: PolicyRule,
    pub reason: String,
}

/// An operation as the policy engine sees it
#[derive(Debug, Clone, Copy)]
pub enum PolicyAction<'a> {
    /// Commit onto the currently checked-out branch (`None` when detached)
    Commit { current_branch: Option<&'a BranchName> },
    /// Push `branch`; `args` is the argument vector as assembled so far
    Push {
        branch: &'a BranchName,
        force: bool,
        args: &'a [String],
    },
    DeleteBranch { branch: &'a BranchName, force: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    /// Proceed, replacing the argument vector when `rewritten_args` is set
    Allow { rewritten_args: Option<Vec<String>> },
    Deny(PolicyViolation),
}

impl PolicyDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, PolicyDecision::Allow { .. })
    }

    pub fn into_result(self) -> Result<Option<Vec<String>>, PolicyViolation> {
        match self {
            PolicyDecision::Allow { rewritten_args } => Ok(rewritten_args),
            PolicyDecision::Deny(violation) => Err(violation),
        }
    }

    fn allow() -> Self {
        PolicyDecision::Allow {
            rewritten_args: None,
        }
    }

    fn deny(rule: PolicyRule, reason: String) -> Self {
        PolicyDecision::Deny(PolicyViolation { rule, reason })
    }
}

/// Applies [`GitOpsConfig`] rules; borrows the config, never mutates it
#[derive(Debug, Clone, Copy)]
pub struct PolicyEngine<'a> {
    config: &'a GitOpsConfig,
}

impl<'a> PolicyEngine<'a> {
    pub fn new(config: &'a GitOpsConfig) -> Self {
        Self { config }
    }

    pub fn evaluate(&self, action: &PolicyAction<'_>) -> PolicyDecision {
        let decision = match *action {
            PolicyAction::Commit { current_branch } => self.check_commit(current_branch),
            PolicyAction::Push {
                branch,
                force,
                args,
            } => self.check_push(branch, force, args),
            PolicyAction::DeleteBranch { branch, force } => self.check_delete(branch, force),
        };

        if let PolicyDecision::Deny(violation) = &decision {
            tracing::warn!(rule = %violation.rule, reason = %violation.reason, "policy denied request");
        }

        decision
    }

    fn check_push(&self, branch: &BranchName, force: bool, args: &[String]) -> PolicyDecision {
        if !force {
            return PolicyDecision::allow();
        }

        if self.config.is_protected(branch.as_str()) {
            return PolicyDecision::deny(
                PolicyRule::ProtectedBranch,
                format!("force-push to protected branch '{}' is not allowed", branch),
            );
        }

        if !self.config.allow_force_push {
            return PolicyDecision::deny(
                PolicyRule::ForcePush,
                format!("force-push of '{}' is disabled by allowForcePush", branch),
            );
        }

        PolicyDecision::Allow {
            rewritten_args: Some(rewrite_force_flags(args)),
        }
    }

    fn check_delete(&self, branch: &BranchName, force: bool) -> PolicyDecision {
        if self.config.is_protected(branch.as_str()) {
            return PolicyDecision::deny(
                PolicyRule::ProtectedBranch,
                format!("deleting protected branch '{}' is not allowed", branch),
            );
        }

        if force && !self.config.allow_force_push {
            return PolicyDecision::deny(
                PolicyRule::ForcePush,
                format!(
                    "force-deleting '{}' is disabled by allowForcePush; unforced deletion of merged branches is still possible",
                    branch
                ),
            );
        }

        PolicyDecision::allow()
    }

    fn check_commit(&self, current_branch: Option<&BranchName>) -> PolicyDecision {
        match current_branch {
            Some(branch)
                if self.config.is_protected(branch.as_str()) && !self.config.allow_main_commit =>
            {
                PolicyDecision::deny(
                    PolicyRule::MainCommit,
                    format!(
                        "committing directly to protected branch '{}' is disabled by allowMainCommit",
                        branch
                    ),
                )
            }
            _ => PolicyDecision::allow(),
        }
    }
}

/// Replace unconditional force flags with the lease-based form.
///
/// Existing lease flags are kept and never duplicated.
pub fn rewrite_force_flags(args: &[String]) -> Vec<String> {
    let mut rewritten: Vec<String> = Vec::with_capacity(args.len());
    let mut has_lease = false;

    for arg in args {
        let is_force = arg == "--force" || arg == "-f";
        let is_lease = arg == FORCE_WITH_LEASE || arg.starts_with("--force-with-lease=");

        if is_force || is_lease {
            if !has_lease {
                has_lease = true;
                if is_lease {
                    rewritten.push(arg.clone());
                } else {
                    rewritten.push(FORCE_WITH_LEASE.to_string());
                }
            }
            continue;
        }

        rewritten.push(arg.clone());
    }

    rewritten
}
