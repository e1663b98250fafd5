//! Batch command implementation
//!
//! Run many queries against one loaded program. Commands are read from
//! stdin as JSON lines; with `--parallel` they run concurrently on the
//! blocking pool against the same program snapshot.

use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::app::App;
use crate::cli::commands::{complete, find, hover};
use crate::services::engine::Engine;

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Execute commands in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Stop on first error
    #[arg(long)]
    pub fail_fast: bool,
}

/// A single batch command
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum BatchCommand {
    Complete {
        location: String,
        #[serde(default)]
        limit: Option<usize>,
    },
    Hover {
        location: String,
    },
    FindDef {
        location: String,
    },
    FindRefs {
        location: String,
        #[serde(default)]
        limit: Option<usize>,
    },
    FindSymbol {
        pattern: String,
        #[serde(default)]
        kind: Option<String>,
    },
}

/// Result of a batch command execution
#[derive(Debug, Serialize)]
struct BatchResult {
    /// Index of the command in the batch
    index: usize,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl BatchResult {
    fn from_outcome(index: usize, outcome: Result<serde_json::Value>) -> Self {
        match outcome {
            Ok(data) => Self {
                index,
                success: true,
                result: Some(data),
                error: None,
            },
            Err(e) => Self {
                index,
                success: false,
                result: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Full batch response
#[derive(Debug, Serialize)]
struct BatchResponse {
    total: usize,
    successes: usize,
    failures: usize,
    results: Vec<BatchResult>,
}

/// Parse JSON lines, reporting unparseable lines as failed entries
fn parse_commands(lines: impl Iterator<Item = String>) -> Vec<Result<BatchCommand>> {
    lines
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str(&line).map_err(|e| anyhow::anyhow!("Invalid command: {}", e))
        })
        .collect()
}

fn execute_single_command(
    cmd: &BatchCommand,
    engine: &Engine,
    root: &Path,
) -> Result<serde_json::Value> {
    let value = match cmd {
        BatchCommand::Complete { location, limit } => {
            serde_json::to_value(complete::run(engine, root, location, *limit)?)?
        }
        BatchCommand::Hover { location } => serde_json::to_value(hover::run(engine, root, location)?)?,
        BatchCommand::FindDef { location } => {
            serde_json::to_value(find::definition(engine, root, location)?)?
        }
        BatchCommand::FindRefs { location, limit } => {
            serde_json::to_value(find::references(engine, root, location, *limit)?)?
        }
        BatchCommand::FindSymbol { pattern, kind } => {
            serde_json::to_value(find::symbols(engine, pattern, kind.as_deref(), usize::MAX)?)?
        }
    };
    Ok(value)
}

async fn run_parallel(
    commands: Vec<Result<BatchCommand>>,
    engine: Arc<Engine>,
    root: PathBuf,
) -> Vec<BatchResult> {
    let tasks = commands.into_iter().enumerate().map(|(index, cmd)| {
        let engine = Arc::clone(&engine);
        let root = root.clone();
        async move {
            let outcome = match cmd {
                Ok(cmd) => tokio::task::spawn_blocking(move || {
                    execute_single_command(&cmd, &engine, &root)
                })
                .await
                .unwrap_or_else(|e| Err(anyhow::anyhow!("Query task failed: {}", e))),
                Err(e) => Err(e),
            };
            BatchResult::from_outcome(index, outcome)
        }
    });

    futures::future::join_all(tasks).await
}

fn run_sequential(
    commands: Vec<Result<BatchCommand>>,
    engine: &Engine,
    root: &Path,
    fail_fast: bool,
) -> Vec<BatchResult> {
    let mut results = Vec::with_capacity(commands.len());
    for (index, cmd) in commands.into_iter().enumerate() {
        let outcome = cmd.and_then(|cmd| execute_single_command(&cmd, engine, root));
        let failed = outcome.is_err();
        results.push(BatchResult::from_outcome(index, outcome));
        if failed && fail_fast {
            break;
        }
    }
    results
}

fn summarize(mut results: Vec<BatchResult>, fail_fast: bool) -> BatchResponse {
    if fail_fast && let Some(first) = results.iter().position(|r| !r.success) {
        results.truncate(first + 1);
    }
    let successes = results.iter().filter(|r| r.success).count();
    BatchResponse {
        total: results.len(),
        successes,
        failures: results.len() - successes,
        results,
    }
}

pub async fn execute(args: BatchArgs, app: &App) -> Result<()> {
    let ctx = &app.output;

    let stdin = io::stdin();
    let commands = parse_commands(stdin.lock().lines().map_while(Result::ok));

    if commands.is_empty() {
        ctx.print_success_flat(serde_json::json!({
            "total": 0,
            "message": "No commands provided. Send JSON commands via stdin, one per line."
        }));
        return Ok(());
    }

    let engine = app.engine().await?;
    let results = if args.parallel {
        run_parallel(commands, engine, app.root().to_path_buf()).await
    } else {
        run_sequential(commands, &engine, app.root(), args.fail_fast)
    };

    ctx.print_success_flat(summarize(results, args.fail_fast));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Arc<Engine> {
        let engine = Engine::new().unwrap();
        engine
            .add_file("a.js", "function foo() { return 1; }\nfoo();")
            .unwrap();
        Arc::new(engine)
    }

    fn lines(input: &[&str]) -> Vec<Result<BatchCommand>> {
        parse_commands(input.iter().map(|l| l.to_string()))
    }

    #[test]
    fn test_parse_commands() {
        let commands = lines(&[
            r#"{"command": "hover", "location": "a.js:2:1"}"#,
            "",
            r#"{"command": "find_symbol", "pattern": "foo"}"#,
            "not json",
        ]);
        assert_eq!(commands.len(), 3);
        assert!(matches!(commands[0], Ok(BatchCommand::Hover { .. })));
        assert!(matches!(commands[1], Ok(BatchCommand::FindSymbol { .. })));
        assert!(commands[2].is_err());
    }

    #[test]
    fn test_sequential_fail_fast() {
        let commands = lines(&[
            r#"{"command": "find_def", "location": "a.js:2:1"}"#,
            r#"{"command": "hover", "location": "missing.js:1:1"}"#,
            r#"{"command": "hover", "location": "a.js:2:1"}"#,
        ]);
        let results = run_sequential(commands, &engine(), Path::new("/p"), true);
        let response = summarize(results, true);

        assert_eq!(response.total, 2);
        assert_eq!(response.successes, 1);
        assert_eq!(response.results[0].result.as_ref().unwrap()["count"], 1);
        assert!(response.results[1].error.is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_parallel_matches_sequential() {
        let input = [
            r#"{"command": "complete", "location": "a.js:2:1", "limit": 3}"#,
            r#"{"command": "find_refs", "location": "a.js:1:10"}"#,
            r#"{"command": "hover", "location": "a.js:2:2"}"#,
        ];
        let engine = engine();

        let sequential = run_sequential(lines(&input), &engine, Path::new("/p"), false);
        let parallel = run_parallel(lines(&input), Arc::clone(&engine), PathBuf::from("/p")).await;

        let seq: Vec<_> = sequential.iter().map(|r| r.result.clone()).collect();
        let par: Vec<_> = parallel.iter().map(|r| r.result.clone()).collect();
        assert_eq!(seq, par);
        assert_eq!(par[1].as_ref().unwrap()["count"], 2);
        assert_eq!(par[2].as_ref().unwrap()["content"], "foo: () => any");
    }
}
