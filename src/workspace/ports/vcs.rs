//! Version-control port for reading and preparing working directories.

use crate::workspace::domain::{BranchName, RepositoryStatus};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Result type for version-control port operations.
pub type VcsResult<T> = Result<T, VcsError>;

/// Request payload for cloning a single branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneRequest {
    /// Remote to clone from.
    pub remote_url: String,
    /// Branch to check out.
    pub branch: BranchName,
    /// Directory to clone into; must not exist yet.
    pub destination: Utf8PathBuf,
}

/// Version-control contract.
#[async_trait]
pub trait VersionControlPort: Send + Sync {
    /// Reads the remote, branch, dirty flag and upstream divergence of a
    /// directory.
    async fn status(&self, dir: &Utf8Path) -> VcsResult<RepositoryStatus>;

    /// Clones a branch into a new directory.
    async fn clone_branch(&self, request: &CloneRequest) -> VcsResult<()>;

    /// Creates and checks out a new branch.
    async fn create_branch(&self, dir: &Utf8Path, branch: &BranchName) -> VcsResult<()>;

    /// Records a commit with no changes.
    async fn commit_empty(&self, dir: &Utf8Path, message: &str) -> VcsResult<()>;

    /// Pushes a branch and sets it as the upstream.
    async fn push_upstream(&self, dir: &Utf8Path, branch: &BranchName) -> VcsResult<()>;
}

/// Errors returned by version-control adapters.
#[derive(Debug, Clone, Error)]
pub enum VcsError {
    /// The directory is not managed by version control.
    #[error("{0} is not a version-controlled directory")]
    NotARepository(Utf8PathBuf),

    /// A version-control command ran but reported failure.
    #[error("{operation} failed: {message}")]
    CommandFailed {
        /// Operation that failed.
        operation: &'static str,
        /// Diagnostic output.
        message: String,
    },

    /// The tool could not be run.
    #[error("version control runtime error: {0}")]
    Runtime(Arc<dyn std::error::Error + Send + Sync>),
}

impl VcsError {
    /// Wraps a runtime error from the version-control adapter.
    pub fn runtime(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Runtime(Arc::new(err))
    }
}
