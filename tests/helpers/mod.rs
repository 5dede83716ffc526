#![allow(dead_code)]

use async_trait::async_trait;
use safegit::error::EnvironmentError;
use safegit::git::{CommandRequest, Program, ProcessResult, ProcessRunner, Subcommand};
use safegit::security::GitSubcommand;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;
use tempfile::TempDir;

/// Helper to create a test git repository on `main`
pub fn create_test_repo() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let repo_path = temp_dir.path().to_path_buf();

    git(&repo_path, &["init", "--initial-branch=main"]);
    git(&repo_path, &["config", "user.name", "Test User"]);
    git(&repo_path, &["config", "user.email", "test@example.com"]);
    git(&repo_path, &["config", "commit.gpgsign", "false"]);

    (temp_dir, repo_path)
}

/// Helper to create a commit
pub fn create_commit(repo_path: &Path, file: &str, content: &str, message: &str) {
    let file_path = repo_path.join(file);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    fs::write(&file_path, content).expect("Failed to write file");

    git(repo_path, &["add", file]);
    git(repo_path, &["commit", "-m", message]);
}

/// Run git directly for fixture setup, panicking on failure
pub fn git(repo_path: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo_path)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Bare repository to act as `origin`, wired to `repo_path`
pub fn add_bare_remote(repo_path: &Path) -> TempDir {
    let remote = TempDir::new().unwrap();
    git(remote.path(), &["init", "--bare", "--initial-branch=main"]);
    let url = remote.path().to_string_lossy().into_owned();
    git(repo_path, &["remote", "add", "origin", &url]);
    remote
}

/// A payload file seen by the runner while the command was running
#[derive(Debug, Clone)]
pub struct CapturedPayload {
    pub path: PathBuf,
    pub contents: String,
}

/// Fake runner that records every request instead of spawning processes.
///
/// Answers the repository preconditions (`rev-parse`, `symbolic-ref`) like a
/// work tree on `current_branch`, and reads any `--file`/`--body-file`
/// payload while it still exists.
pub struct RecordingRunner {
    current_branch: Option<String>,
    exit_code: i32,
    stdout: String,
    stderr: String,
    missing: HashSet<Program>,
    requests: Mutex<Vec<CommandRequest>>,
    payloads: Mutex<Vec<CapturedPayload>>,
}

impl RecordingRunner {
    pub fn on_branch(branch: &str) -> Self {
        Self {
            current_branch: Some(branch.to_string()),
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
            missing: HashSet::new(),
            requests: Mutex::new(Vec::new()),
            payloads: Mutex::new(Vec::new()),
        }
    }

    pub fn detached() -> Self {
        Self {
            current_branch: None,
            ..Self::on_branch("unused")
        }
    }

    /// Operation commands exit with `code` and `stderr`
    pub fn failing(mut self, code: i32, stderr: &str) -> Self {
        self.exit_code = code;
        self.stderr = stderr.to_string();
        self
    }

    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self
    }

    pub fn without(mut self, program: Program) -> Self {
        self.missing.insert(program);
        self
    }

    pub fn requests(&self) -> Vec<CommandRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests other than the repository precondition checks
    pub fn operation_requests(&self) -> Vec<CommandRequest> {
        self.requests()
            .into_iter()
            .filter(|r| !is_precondition(r))
            .collect()
    }

    pub fn payloads(&self) -> Vec<CapturedPayload> {
        self.payloads.lock().unwrap().clone()
    }
}

fn is_precondition(request: &CommandRequest) -> bool {
    matches!(
        request.subcommand,
        Subcommand::Git(GitSubcommand::RevParse) | Subcommand::Git(GitSubcommand::SymbolicRef)
    )
}

#[async_trait]
impl ProcessRunner for RecordingRunner {
    async fn run(&self, request: &CommandRequest) -> ProcessResult {
        self.requests.lock().unwrap().push(request.clone());

        match request.subcommand {
            Subcommand::Git(GitSubcommand::RevParse) => {
                return ProcessResult {
                    stdout: "true\n".to_string(),
                    ..ProcessResult::default()
                };
            }
            Subcommand::Git(GitSubcommand::SymbolicRef) => {
                return match &self.current_branch {
                    Some(branch) => ProcessResult {
                        stdout: format!("{}\n", branch),
                        ..ProcessResult::default()
                    },
                    None => ProcessResult {
                        exit_code: 1,
                        ..ProcessResult::default()
                    },
                };
            }
            _ => {}
        }

        let mut args = request.args.iter();
        while let Some(arg) = args.next() {
            if arg == "--file" || arg == "--body-file" {
                if let Some(path) = args.next() {
                    let path = PathBuf::from(path);
                    let contents = fs::read_to_string(&path).unwrap_or_default();
                    self.payloads
                        .lock()
                        .unwrap()
                        .push(CapturedPayload { path, contents });
                }
            }
        }

        ProcessResult {
            stdout: self.stdout.clone(),
            stderr: self.stderr.clone(),
            exit_code: self.exit_code,
            ..ProcessResult::default()
        }
    }

    fn locate(&self, program: Program) -> Result<PathBuf, EnvironmentError> {
        if self.missing.contains(&program) {
            return Err(EnvironmentError::ExecutableNotFound(program.to_string()));
        }
        Ok(PathBuf::from("/usr/bin").join(program.executable()))
    }
}
