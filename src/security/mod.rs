pub mod policy;
pub mod validator;

use std::fmt;
use std::str::FromStr;

pub use policy::{PolicyAction, PolicyDecision, PolicyEngine, PolicyRule, PolicyViolation};
pub use validator::{
    BranchName, GitRef, Label, LogFilter, RemoteName, RepoPath, ValidationError,
    ValidationOutcome, validate_branch_name, validate_file_path, validate_label,
    validate_log_filter, validate_ref, validate_remote_name,
};

/// Allowlist of permitted git subcommands
///
/// A subcommand that is not a variant here cannot be handed to the process
/// runner at all. Adding a new variant requires careful security review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GitSubcommand {
    // Read operations
    Status,
    Diff,
    Log,
    Blame,
    Show,
    RevParse,
    SymbolicRef,
    // Write operations
    Branch,
    Add,
    Commit,
    Stash,
    Checkout,
    Switch,
    Merge,
    Rebase,
    Tag,
    // Remote operations
    Push,
    Pull,
    Fetch,
    Remote,
    // Configuration (repo-level only)
    Config,
}

impl GitSubcommand {
    pub const ALL: [GitSubcommand; 21] = [
        GitSubcommand::Status,
        GitSubcommand::Diff,
        GitSubcommand::Log,
        GitSubcommand::Blame,
        GitSubcommand::Show,
        GitSubcommand::RevParse,
        GitSubcommand::SymbolicRef,
        GitSubcommand::Branch,
        GitSubcommand::Add,
        GitSubcommand::Commit,
        GitSubcommand::Stash,
        GitSubcommand::Checkout,
        GitSubcommand::Switch,
        GitSubcommand::Merge,
        GitSubcommand::Rebase,
        GitSubcommand::Tag,
        GitSubcommand::Push,
        GitSubcommand::Pull,
        GitSubcommand::Fetch,
        GitSubcommand::Remote,
        GitSubcommand::Config,
    ];

    /// The literal subcommand as git expects it
    pub fn as_str(self) -> &'static str {
        match self {
            GitSubcommand::Status => "status",
            GitSubcommand::Diff => "diff",
            GitSubcommand::Log => "log",
            GitSubcommand::Blame => "blame",
            GitSubcommand::Show => "show",
            GitSubcommand::RevParse => "rev-parse",
            GitSubcommand::SymbolicRef => "symbolic-ref",
            GitSubcommand::Branch => "branch",
            GitSubcommand::Add => "add",
            GitSubcommand::Commit => "commit",
            GitSubcommand::Stash => "stash",
            GitSubcommand::Checkout => "checkout",
            GitSubcommand::Switch => "switch",
            GitSubcommand::Merge => "merge",
            GitSubcommand::Rebase => "rebase",
            GitSubcommand::Tag => "tag",
            GitSubcommand::Push => "push",
            GitSubcommand::Pull => "pull",
            GitSubcommand::Fetch => "fetch",
            GitSubcommand::Remote => "remote",
            GitSubcommand::Config => "config",
        }
    }
}

impl fmt::Display for GitSubcommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GitSubcommand {
    type Err = ValidationError;

    /// Resolve a subcommand string against the allowlist
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GitSubcommand::ALL
            .into_iter()
            .find(|sub| sub.as_str() == s)
            .ok_or_else(|| {
                ValidationError::new("subcommand", format!("'{}' is not in the allowlist", s))
            })
    }
}

/// Allowlist of permitted PR-host (`gh`) subcommands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostSubcommand {
    PrCreate,
}

impl HostSubcommand {
    /// Leading argv words for this subcommand
    pub fn words(self) -> &'static [&'static str] {
        match self {
            HostSubcommand::PrCreate => &["pr", "create"],
        }
    }
}

impl fmt::Display for HostSubcommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.words().join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_accepts_allowlisted() {
        assert_eq!("status".parse::<GitSubcommand>().unwrap(), GitSubcommand::Status);
        assert_eq!(
            "symbolic-ref".parse::<GitSubcommand>().unwrap(),
            GitSubcommand::SymbolicRef
        );
    }

    #[test]
    fn test_from_str_rejects_unknown() {
        for s in ["rm", "filter-branch", "clean", "reset", "", "--exec", "STATUS"] {
            let err = s.parse::<GitSubcommand>().unwrap_err();
            assert!(err.reason.contains("allowlist"), "{}", s);
        }
    }

    #[test]
    fn test_host_subcommand_words() {
        assert_eq!(HostSubcommand::PrCreate.words(), &["pr", "create"]);
        assert_eq!(HostSubcommand::PrCreate.to_string(), "pr create");
    }
}
