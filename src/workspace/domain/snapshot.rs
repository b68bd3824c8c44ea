//! Version-control snapshots of a working directory.

use super::{BranchName, RepositoryFullName, WorkspaceDomainError, parse_remote_repository};
use serde::{Deserialize, Serialize};

/// Raw repository status as reported by the version-control port.
///
/// Nothing here is validated; [`RepositorySnapshot::from_status`] turns it
/// into a domain value or fails explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryStatus {
    /// URL of the `origin` remote.
    pub remote_url: String,
    /// Currently checked-out branch.
    pub branch: String,
    /// Whether the working tree has uncommitted changes.
    pub dirty: bool,
    /// Commits on the local branch not yet on its upstream.
    pub ahead: u32,
    /// Commits on the upstream not yet on the local branch.
    pub behind: u32,
}

impl RepositoryStatus {
    /// Creates a clean status with no divergence from upstream.
    #[must_use]
    pub fn clean(remote_url: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            remote_url: remote_url.into(),
            branch: branch.into(),
            dirty: false,
            ahead: 0,
            behind: 0,
        }
    }
}

/// Validated repository state of a workspace directory.
///
/// Recomputed on every discovery pass and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySnapshot {
    remote_url: String,
    repository: RepositoryFullName,
    branch: BranchName,
    dirty: bool,
    ahead: u32,
    behind: u32,
}

impl RepositorySnapshot {
    /// Validates a raw status into a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceDomainError::UnrecognisedRemoteUrl`] when the
    /// remote URL cannot be parsed into `owner/repo`, or
    /// [`WorkspaceDomainError::InvalidBranchName`] when the branch is not a
    /// valid ref name (for example a detached `HEAD` reported as empty).
    pub fn from_status(status: RepositoryStatus) -> Result<Self, WorkspaceDomainError> {
        let repository = parse_remote_repository(&status.remote_url)?;
        let branch = BranchName::new(status.branch)?;
        Ok(Self {
            remote_url: status.remote_url,
            repository,
            branch,
            dirty: status.dirty,
            ahead: status.ahead,
            behind: status.behind,
        })
    }

    /// Returns the remote URL.
    #[must_use]
    pub fn remote_url(&self) -> &str {
        &self.remote_url
    }

    /// Returns the `owner/repo` identifier parsed from the remote URL.
    #[must_use]
    pub const fn repository(&self) -> &RepositoryFullName {
        &self.repository
    }

    /// Returns the checked-out branch.
    #[must_use]
    pub const fn branch(&self) -> &BranchName {
        &self.branch
    }

    /// Returns whether the working tree has uncommitted changes.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns the number of unpushed commits.
    #[must_use]
    pub const fn ahead(&self) -> u32 {
        self.ahead
    }

    /// Returns the number of upstream commits not yet pulled.
    #[must_use]
    pub const fn behind(&self) -> u32 {
        self.behind
    }
}
