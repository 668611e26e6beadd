//! Workspace-scoped file access: the gateway between the patch engine and
//! the real filesystem.
//!
//! Every path is canonicalized and checked for containment inside the
//! workspace root before any read or write. Containment uses resolved
//! paths, not string prefixes, so `../` traversal and symlink escapes are
//! both caught.
//!
//! # Architecture
//!
//! This is a **Layer 2 (Infrastructure)** crate:
//! - Depends on: mend-core (error conversion)
//! - Used by: mend-blocks, mend-engine

mod error;
mod gateway;

pub use error::GatewayError;
pub use gateway::FileGateway;
