//! Filesystem port for clone directories.

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Result type for filesystem operations.
pub type FilesystemResult<T> = Result<T, FilesystemError>;

/// Directory operations the orchestrator performs on clones.
#[async_trait]
pub trait WorkspaceFilesystem: Send + Sync {
    /// Returns whether anything exists at the path.
    async fn exists(&self, path: &Utf8Path) -> FilesystemResult<bool>;

    /// Renames a directory.
    async fn rename(&self, from: &Utf8Path, to: &Utf8Path) -> FilesystemResult<()>;

    /// Removes a directory and everything beneath it.
    async fn remove_all(&self, path: &Utf8Path) -> FilesystemResult<()>;

    /// Reads a UTF-8 file, returning `None` when it does not exist.
    async fn read_optional(&self, path: &Utf8Path) -> FilesystemResult<Option<String>>;
}

/// Errors returned by filesystem adapters.
#[derive(Debug, Clone, Error)]
pub enum FilesystemError {
    /// The path lies outside the directory the adapter may touch.
    #[error("{0} is outside the clones root")]
    OutsideRoot(Utf8PathBuf),

    /// The path does not exist.
    #[error("{0} does not exist")]
    NotFound(Utf8PathBuf),

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path being operated on.
        path: Utf8PathBuf,
        /// Underlying error.
        source: Arc<std::io::Error>,
    },
}

impl FilesystemError {
    /// Wraps an I/O error for a path.
    pub fn io(path: impl Into<Utf8PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source: Arc::new(err),
        }
    }
}
