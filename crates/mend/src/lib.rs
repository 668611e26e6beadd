//! Library surface of the `mend` binary.
//!
//! # Architecture
//!
//! This is a **Layer 5 (Binary)** crate:
//! - Depends on: mend-engine, mend-settings, mend-file-ops, mend-core
//! - Used by: nobody (top of the stack)

pub mod cli;
