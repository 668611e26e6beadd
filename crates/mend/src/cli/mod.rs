//! Headless CLI: argument parsing, generator wiring, output.

mod args;
mod replay;
mod runner;

pub use args::Args;
pub use replay::ReplayGenerator;
pub use runner::run;
