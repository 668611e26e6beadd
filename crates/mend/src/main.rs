//! Mend - validated file edits from LLM output
//!
//! Takes one instruction, asks a generator for SEARCH/REPLACE blocks (or a
//! unified diff), validates every directive against the workspace, and
//! writes only fully-valid batches. Failed rounds feed the exact error
//! back for up to a fixed number of correction rounds.
//!
//! # Examples
//!
//! ```bash
//! # Patch one file from a canned response (deterministic replay)
//! mend --file src/add.py -e "comment the return" --response-file fix.txt
//!
//! # Machine-readable result
//! mend --file src/add.py -e "comment the return" --response-file fix.txt --json
//! ```

use clap::Parser;

use mend::cli::{run, Args};

fn main() {
    let args = Args::parse();

    let runtime = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    runtime.block_on(async move {
        match run(args).await {
            Ok(exit_code) => std::process::exit(exit_code),
            Err(e) => {
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
        }
    });
}
