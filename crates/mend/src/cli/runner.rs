//! Wires settings, gateway and generator into one orchestrator run, then
//! renders the outcome.

use std::io::Read as _;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use mend_engine::{Generator, RetryOrchestrator, TurnOutcome, UserRequest};
use mend_file_ops::FileGateway;
use mend_settings::MendSettings;

use super::args::Args;
use super::replay::ReplayGenerator;

/// Execute one instruction and return the process exit code.
pub async fn run(args: Args) -> Result<i32> {
    let settings = mend_settings::load_or_default()?;
    init_tracing(&args, &settings);

    let workspace = args.resolve_workspace()?;
    let gateway = FileGateway::new(&workspace)
        .with_context(|| format!("cannot open workspace {}", workspace.display()))?;
    tracing::debug!("[cli] workspace {}", workspace.display());

    let generator = build_generator(&args)?;
    let max_rounds = args.max_rounds.unwrap_or(settings.engine.max_rounds);
    let orchestrator = RetryOrchestrator::new(generator, gateway, max_rounds);

    let request = UserRequest {
        instruction: args.execute.clone(),
        target_path: args.file.clone(),
    };

    match orchestrator.run(&request).await {
        Ok(outcome) => Ok(render(&outcome, args.json)),
        Err(fatal) => {
            if args.json {
                println!(
                    "{}",
                    serde_json::json!({ "status": "fatal", "error": fatal.to_string() })
                );
            } else {
                eprintln!("Fatal: {}", fatal);
            }
            Ok(1)
        }
    }
}

fn build_generator(args: &Args) -> Result<Arc<dyn Generator>> {
    let Some(path) = &args.response_file else {
        // A live provider plugs in behind the Generator trait; the binary
        // itself only ships the replay seam.
        anyhow::bail!("no generator configured: pass --response-file");
    };
    let raw = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read response from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read response file {}", path.display()))?
    };
    Ok(Arc::new(ReplayGenerator::from_raw(&raw)))
}

fn render(outcome: &TurnOutcome, json: bool) -> i32 {
    match outcome {
        TurnOutcome::Success {
            results,
            blocks_applied,
            validation_rounds,
        } => {
            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "status": "success",
                        "blocks_applied": blocks_applied,
                        "validation_rounds": validation_rounds,
                        "files": results,
                    })
                );
            } else {
                for result in results {
                    println!("--- {} ---", result.path);
                    print!("{}", result.diff);
                }
                println!(
                    "Applied {} block(s) to {} file(s) after {} correction round(s).",
                    blocks_applied,
                    results.len(),
                    validation_rounds
                );
            }
            0
        }
        TurnOutcome::NoOpConversational { response } => {
            if json {
                println!(
                    "{}",
                    serde_json::json!({ "status": "no_op", "response": response })
                );
            } else {
                println!("{}", response);
            }
            0
        }
        TurnOutcome::Failure {
            error,
            raw_response,
            rounds_used,
        } => {
            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "status": "failure",
                        "error": error.to_string(),
                        "rounds_used": rounds_used,
                        "raw_response": raw_response,
                    })
                );
            } else {
                eprintln!("Gave up after {} round(s): {}", rounds_used, error);
                eprintln!("Last response was:\n{}", raw_response);
            }
            1
        }
    }
}

/// Filter precedence: RUST_LOG env, then --verbose, then the settings
/// file, then "info". Logs go to stderr so stdout stays parseable.
fn init_tracing(args: &Args, settings: &MendSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if args.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new(settings.log_filter.as_deref().unwrap_or("info"))
        }
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
