//! The file gateway: scoped read/create/write with atomic persistence.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::GatewayError;

/// Scoped access to text files under a single workspace root.
///
/// New content is always computed fully in memory by the caller; writes go
/// through a temp file + rename in the target directory, so a partially
/// written file is never observable.
#[derive(Debug, Clone)]
pub struct FileGateway {
    root: PathBuf,
}

impl FileGateway {
    /// Create a gateway rooted at `root`. The root must exist.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, GatewayError> {
        let root = root.as_ref();
        let canonical = root.canonicalize().map_err(|e| io_error(root, e))?;
        Ok(Self { root: canonical })
    }

    /// The canonicalized workspace root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether `path` names an existing file inside the workspace.
    pub fn exists(&self, path: &str) -> bool {
        match self.resolve(path) {
            Ok(resolved) => resolved.is_file(),
            Err(_) => false,
        }
    }

    /// Read a UTF-8 text file.
    pub fn read(&self, path: &str) -> Result<String, GatewayError> {
        let resolved = self.resolve(path)?;
        if !resolved.exists() {
            return Err(GatewayError::NotFound { path: path.to_string() });
        }
        if resolved.is_dir() {
            return Err(GatewayError::IsDirectory { path: path.to_string() });
        }
        let bytes = fs::read(&resolved).map_err(|e| classify(path, e))?;
        String::from_utf8(bytes).map_err(|_| GatewayError::NotUtf8 { path: path.to_string() })
    }

    /// Create a new file. Fails if the path already exists; creates parent
    /// directories as needed.
    pub fn create(&self, path: &str, content: &str) -> Result<(), GatewayError> {
        let resolved = self.resolve(path)?;
        if resolved.exists() {
            return Err(GatewayError::AlreadyExists { path: path.to_string() });
        }
        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent).map_err(|e| classify(path, e))?;
        }
        tracing::debug!("[gateway] creating {}", path);
        self.write_atomic(&resolved, path, content)
    }

    /// Replace the content of an existing file atomically.
    pub fn write(&self, path: &str, content: &str) -> Result<(), GatewayError> {
        let resolved = self.resolve(path)?;
        if resolved.is_dir() {
            return Err(GatewayError::IsDirectory { path: path.to_string() });
        }
        tracing::debug!("[gateway] writing {} ({} bytes)", path, content.len());
        self.write_atomic(&resolved, path, content)
    }

    fn write_atomic(&self, resolved: &Path, path: &str, content: &str) -> Result<(), GatewayError> {
        let dir = resolved.parent().unwrap_or(&self.root);
        let tmp = dir.join(format!(
            ".{}.mend-tmp",
            resolved
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "file".to_string())
        ));
        fs::write(&tmp, content).map_err(|e| classify(path, e))?;
        fs::rename(&tmp, resolved).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            classify(path, e)
        })
    }

    /// Resolve `path` against the workspace root and enforce containment.
    ///
    /// For paths that do not exist yet, the deepest existing ancestor is
    /// canonicalized and checked instead, then the non-existent tail is
    /// appended back. String-prefix comparison on the raw input would miss
    /// both `..` segments and symlink escapes.
    fn resolve(&self, path_str: &str) -> Result<PathBuf, GatewayError> {
        let path = Path::new(path_str);
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };

        let canonical = if joined.exists() {
            joined.canonicalize().map_err(|e| io_error(path, e))?
        } else {
            let mut ancestor = joined.as_path();
            let mut tail: Vec<std::ffi::OsString> = Vec::new();
            while !ancestor.exists() {
                if let Some(name) = ancestor.file_name() {
                    tail.push(name.to_os_string());
                }
                match ancestor.parent() {
                    Some(parent) if !parent.as_os_str().is_empty() => ancestor = parent,
                    _ => {
                        return Err(GatewayError::OutsideRoot {
                            path: path_str.to_string(),
                        })
                    }
                }
            }
            let mut rebuilt = ancestor.canonicalize().map_err(|e| io_error(path, e))?;
            for part in tail.into_iter().rev() {
                rebuilt.push(part);
            }
            rebuilt
        };

        if !canonical.starts_with(&self.root) {
            return Err(GatewayError::OutsideRoot {
                path: path_str.to_string(),
            });
        }
        Ok(canonical)
    }
}

fn classify(path: &str, err: std::io::Error) -> GatewayError {
    match err.kind() {
        ErrorKind::NotFound => GatewayError::NotFound { path: path.to_string() },
        ErrorKind::PermissionDenied => GatewayError::PermissionDenied { path: path.to_string() },
        _ => GatewayError::Io {
            path: path.to_string(),
            source: err,
        },
    }
}

fn io_error(path: &Path, err: std::io::Error) -> GatewayError {
    classify(&path.display().to_string(), err)
}
