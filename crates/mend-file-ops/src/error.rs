//! Typed errors for gateway operations.

use thiserror::Error;

use mend_core::PatchError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("file not found: {path}")]
    NotFound { path: String },

    #[error("path is a directory, not a file: {path}")]
    IsDirectory { path: String },

    #[error("file already exists: {path}")]
    AlreadyExists { path: String },

    #[error("path '{path}' is outside the workspace root")]
    OutsideRoot { path: String },

    #[error("permission denied: {path}")]
    PermissionDenied { path: String },

    #[error("file is not valid UTF-8: {path}")]
    NotUtf8 { path: String },

    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl GatewayError {
    pub fn path(&self) -> &str {
        match self {
            GatewayError::NotFound { path }
            | GatewayError::IsDirectory { path }
            | GatewayError::AlreadyExists { path }
            | GatewayError::OutsideRoot { path }
            | GatewayError::PermissionDenied { path }
            | GatewayError::NotUtf8 { path }
            | GatewayError::Io { path, .. } => path,
        }
    }
}

impl From<GatewayError> for PatchError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::AlreadyExists { path } => PatchError::FileExists { path },
            GatewayError::OutsideRoot { path } => PatchError::OutsideRoot { path },
            GatewayError::PermissionDenied { path } => PatchError::Permission { path },
            // Missing files and bad encodings read as "the search text is
            // not where the generator thinks it is" -- still a batch-level
            // parse problem rather than a distinct user-facing class.
            other => PatchError::Parse(other.to_string()),
        }
    }
}
