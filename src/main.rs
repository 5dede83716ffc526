use safegit::audit::AuditLogger;
use safegit::error::{AppError, AppResult};
use safegit::ops::{GitOps, Operation, OperationOutput};
use safegit::{Config, SystemRunner};
use serde_json::json;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "SAFEGIT_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// `--repo <dir>` is the only flag; anything else is a usage error
fn parse_repo_arg() -> Result<PathBuf, String> {
    let mut args = std::env::args().skip(1);
    let mut repo = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--repo" => {
                let dir = args.next().ok_or("--repo requires a directory")?;
                repo = Some(PathBuf::from(dir));
            }
            other => return Err(format!("unexpected argument '{}'", other)),
        }
    }

    match repo {
        Some(dir) => Ok(dir),
        None => std::env::current_dir().map_err(|e| format!("cannot read current directory: {}", e)),
    }
}

async fn run(repo: PathBuf) -> AppResult<OperationOutput> {
    let config = Config::load()?;

    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    let operation: Operation = serde_json::from_str(&input)?;

    let runner = SystemRunner::new(&config.runner);
    let audit = match AuditLogger::new() {
        Ok(audit) => Some(audit),
        Err(e) => {
            tracing::warn!(error = %e, "audit log unavailable");
            None
        }
    };

    let mut ops = GitOps::new(&config.git_ops, &runner, &repo).with_timeout(config.runner.timeout());
    if let Some(audit) = &audit {
        ops = ops.with_audit(audit);
    }

    tracing::debug!(operation = operation.name(), repo = %repo.display(), "dispatching");
    Ok(ops.dispatch(&operation).await?)
}

#[tokio::main]
async fn main() {
    init_tracing();

    let repo = match parse_repo_arg() {
        Ok(repo) => repo,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("usage: safegit [--repo <dir>] < request.json");
            std::process::exit(2);
        }
    };

    let (response, code) = match run(repo).await {
        Ok(output) => (
            json!({ "ok": true, "stdout": output.stdout, "stderr": output.stderr }),
            0,
        ),
        Err(e) => (error_response(&e), 1),
    };

    println!("{}", response);
    std::process::exit(code);
}

fn error_response(error: &AppError) -> serde_json::Value {
    json!({ "ok": false, "kind": error.kind(), "error": error.to_string() })
}
