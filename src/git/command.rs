use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::security::validator::RepoPath;
use crate::security::{GitSubcommand, HostSubcommand};

/// Default per-invocation deadline
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// External executables the runner may start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Program {
    Git,
    /// The PR-hosting CLI (`gh`)
    Host,
}

impl Program {
    pub fn executable(self) -> &'static str {
        match self {
            Program::Git => "git",
            Program::Host => "gh",
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.executable())
    }
}

/// An allowlisted subcommand of one of the [`Program`]s
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subcommand {
    Git(GitSubcommand),
    Host(HostSubcommand),
}

impl Subcommand {
    pub fn program(self) -> Program {
        match self {
            Subcommand::Git(_) => Program::Git,
            Subcommand::Host(_) => Program::Host,
        }
    }
}

impl From<GitSubcommand> for Subcommand {
    fn from(sub: GitSubcommand) -> Self {
        Subcommand::Git(sub)
    }
}

impl From<HostSubcommand> for Subcommand {
    fn from(sub: HostSubcommand) -> Self {
        Subcommand::Host(sub)
    }
}

impl fmt::Display for Subcommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subcommand::Git(sub) => write!(f, "{}", sub),
            Subcommand::Host(sub) => write!(f, "{}", sub),
        }
    }
}

/// A fully-built invocation, ready for a [`ProcessRunner`](super::runner::ProcessRunner).
///
/// Arguments are either literal flags chosen by this crate or tokens that
/// already passed a validator. Paths go after a `--` separator via
/// [`CommandRequest::paths`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub subcommand: Subcommand,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub timeout: Duration,
}

impl CommandRequest {
    pub fn new(subcommand: impl Into<Subcommand>, working_dir: impl AsRef<Path>) -> Self {
        Self {
            subcommand: subcommand.into(),
            args: Vec::new(),
            working_dir: working_dir.as_ref().to_path_buf(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append `--` followed by `paths`; nothing is appended for an empty list
    pub fn paths(mut self, paths: &[RepoPath]) -> Self {
        if !paths.is_empty() {
            self.args.push("--".to_string());
            self.args
                .extend(paths.iter().map(|p| p.as_str().to_string()));
        }
        self
    }

    /// Append `--` followed by `paths`, even when there are none.
    ///
    /// Commands that take revisions use this so a revision that also names a
    /// file in the work tree is never read as a path.
    pub fn pathspec(mut self, paths: &[RepoPath]) -> Self {
        self.args.push("--".to_string());
        self.args
            .extend(paths.iter().map(|p| p.as_str().to_string()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> Program {
        self.subcommand.program()
    }

    /// The argument vector handed to the executable, excluding its own name
    pub fn argv(&self) -> Vec<String> {
        let mut argv: Vec<String> = match self.subcommand {
            Subcommand::Git(sub) => vec!["--no-pager".to_string(), sub.as_str().to_string()],
            Subcommand::Host(sub) => sub.words().iter().map(|w| w.to_string()).collect(),
        };
        argv.extend(self.args.iter().cloned());
        argv
    }

    /// Human-readable command line for logs and error messages
    pub fn display_line(&self) -> String {
        let mut line = format!("{} {}", self.program(), self.subcommand);
        for arg in &self.args {
            line.push(' ');
            if arg.is_empty() || arg.chars().any(char::is_whitespace) {
                line.push_str(&format!("{:?}", arg));
            } else {
                line.push_str(arg);
            }
        }
        line
    }
}
