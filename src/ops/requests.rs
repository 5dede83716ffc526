//! Typed requests, one per operation.
//!
//! Token fields use the validated newtypes, so a request that deserializes is
//! already syntactically safe. Free-text fields are checked by the `validate`
//! helpers before any process is started.

use serde::Deserialize;

use crate::security::validator::{
    BranchName, GitRef, Label, LogFilter, RemoteName, RepoPath, ValidationError,
};

/// Default number of commits returned by `log`
pub const DEFAULT_LOG_COUNT: usize = 20;
/// Upper bound on `log` commit count
pub const MAX_LOG_COUNT: usize = 1000;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusRequest {
    #[serde(default)]
    pub paths: Vec<RepoPath>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiffRequest {
    /// Compare the index against HEAD instead of the work tree against the index
    #[serde(default)]
    pub staged: bool,
    #[serde(default)]
    pub stat: bool,
    pub from: Option<GitRef>,
    pub to: Option<GitRef>,
    #[serde(default)]
    pub paths: Vec<RepoPath>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogRequest {
    pub max_count: Option<usize>,
    #[serde(default)]
    pub oneline: bool,
    pub author: Option<String>,
    pub since: Option<String>,
    pub grep: Option<String>,
    #[serde(rename = "ref")]
    pub reference: Option<GitRef>,
    #[serde(default)]
    pub paths: Vec<RepoPath>,
}

impl LogRequest {
    /// Validate the free-text filters and render them as `--field=value` flags
    pub fn filter_flags(&self) -> Result<Vec<String>, ValidationError> {
        let mut flags = Vec::new();
        for (field, value) in [
            ("author", &self.author),
            ("since", &self.since),
            ("grep", &self.grep),
        ] {
            if let Some(value) = value {
                let filter = LogFilter::parse(value.as_str(), field)?;
                flags.push(format!("--{}={}", field, filter.as_str()));
            }
        }
        Ok(flags)
    }

    pub fn effective_max_count(&self) -> usize {
        self.max_count
            .unwrap_or(DEFAULT_LOG_COUNT)
            .clamp(1, MAX_LOG_COUNT)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlameRequest {
    pub path: RepoPath,
    pub start_line: Option<u32>,
    pub end_line: Option<u32>,
    pub rev: Option<GitRef>,
}

impl BlameRequest {
    pub fn new(path: RepoPath) -> Self {
        Self {
            path,
            start_line: None,
            end_line: None,
            rev: None,
        }
    }

    /// The `-L` range value, if a range was requested
    pub fn line_range(&self) -> Result<Option<String>, ValidationError> {
        match (self.start_line, self.end_line) {
            (None, None) => Ok(None),
            (None, Some(_)) => Err(ValidationError::new(
                "line range",
                "end_line requires start_line",
            )),
            (Some(0), _) => Err(ValidationError::new("line range", "lines start at 1")),
            (Some(start), None) => Ok(Some(format!("{},", start))),
            (Some(start), Some(end)) if end < start => Err(ValidationError::new(
                "line range",
                format!("end_line {} is before start_line {}", end, start),
            )),
            (Some(start), Some(end)) => Ok(Some(format!("{},{}", start, end))),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShowRequest {
    #[serde(rename = "ref")]
    pub reference: Option<GitRef>,
    #[serde(default)]
    pub stat: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StashAction {
    Push,
    Pop,
    Apply,
    Drop,
    #[default]
    List,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StashRequest {
    #[serde(default)]
    pub action: StashAction,
    pub message: Option<String>,
    pub index: Option<u32>,
    #[serde(default)]
    pub include_untracked: bool,
}

impl StashRequest {
    /// Validate the optional one-line stash message
    pub fn validated_message(&self) -> Result<Option<&str>, ValidationError> {
        let Some(message) = self.message.as_deref() else {
            return Ok(None);
        };
        if message.trim().is_empty() {
            return Err(ValidationError::new("stash message", "must not be empty"));
        }
        if message.contains(['\n', '\r', '\0']) {
            return Err(ValidationError::new(
                "stash message",
                "must be a single line",
            ));
        }
        Ok(Some(message))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddRequest {
    #[serde(default)]
    pub paths: Vec<RepoPath>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommitRequest {
    pub message: String,
    /// Stage modified tracked files first (`--all`)
    #[serde(default)]
    pub all: bool,
    /// Commit only these paths
    #[serde(default)]
    pub paths: Vec<RepoPath>,
}

impl CommitRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.message.trim().is_empty() {
            return Err(ValidationError::new("commit message", "must not be empty"));
        }
        if self.message.contains('\0') {
            return Err(ValidationError::new(
                "commit message",
                "must not contain NUL bytes",
            ));
        }
        if self.all && !self.paths.is_empty() {
            return Err(ValidationError::new(
                "commit",
                "'all' and 'paths' cannot be combined",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchAction {
    #[default]
    List,
    Create,
    Delete,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BranchRequest {
    #[serde(default)]
    pub action: BranchAction,
    pub name: Option<BranchName>,
    pub start_point: Option<GitRef>,
    /// For delete: remove even if unmerged (`-D`)
    #[serde(default)]
    pub force: bool,
}

impl BranchRequest {
    pub fn required_name(&self) -> Result<&BranchName, ValidationError> {
        self.name
            .as_ref()
            .ok_or_else(|| ValidationError::new("branch name", "is required for this action"))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwitchRequest {
    pub branch: BranchName,
    #[serde(default)]
    pub create: bool,
    pub start_point: Option<GitRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PushRequest {
    pub remote: Option<RemoteName>,
    /// Defaults to the current branch
    pub branch: Option<BranchName>,
    #[serde(default)]
    pub force: bool,
    #[serde(default)]
    pub set_upstream: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PullRequest {
    pub remote: Option<RemoteName>,
    #[serde(rename = "ref")]
    pub reference: Option<GitRef>,
    #[serde(default)]
    pub rebase: bool,
    #[serde(default)]
    pub ff_only: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FetchRequest {
    pub remote: Option<RemoteName>,
    #[serde(default)]
    pub prune: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrCreateRequest {
    pub title: String,
    pub body: Option<String>,
    pub base: Option<GitRef>,
    pub head: Option<BranchName>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub draft: bool,
}

impl PrCreateRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::new("PR title", "must not be empty"));
        }
        if self.title.contains(['\n', '\r', '\0']) {
            return Err(ValidationError::new("PR title", "must be a single line"));
        }
        if let Some(body) = &self.body {
            if body.contains('\0') {
                return Err(ValidationError::new("PR body", "must not contain NUL bytes"));
            }
        }
        Ok(())
    }

    /// Labels joined into the single `--label` value
    pub fn label_value(&self) -> Option<String> {
        if self.labels.is_empty() {
            return None;
        }
        Some(
            self.labels
                .iter()
                .map(Label::as_str)
                .collect::<Vec<_>>()
                .join(","),
        )
    }
}
