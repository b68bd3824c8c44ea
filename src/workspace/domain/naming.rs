//! Naming rules for orchestrated sessions and clone directories.
//!
//! Clone directories are always `pr-{number}` under the clones root. They
//! are never derived from branch names, which may contain slashes.

use super::{ReviewRequestNumber, SessionName, WorkspaceDomainError};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};

/// Prefix of every clone directory owned by a review request.
const CLONE_DIR_PREFIX: &str = "pr-";

/// Prefix of clone directories whose review request does not exist yet.
const PENDING_CLONE_DIR_PREFIX: &str = "pending-";

/// Derives session names and clone paths from review request numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceNaming {
    session_prefix: String,
    clones_root: Utf8PathBuf,
}

impl WorkspaceNaming {
    /// Creates naming rules for a session prefix and clones root.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceDomainError::InvalidSessionName`] when the prefix
    /// would produce invalid session names.
    pub fn new(
        prefix: impl Into<String>,
        clones_root: impl Into<Utf8PathBuf>,
    ) -> Result<Self, WorkspaceDomainError> {
        let session_prefix: String = prefix.into();
        SessionName::new(format!("{session_prefix}1"))?;
        Ok(Self {
            session_prefix,
            clones_root: clones_root.into(),
        })
    }

    /// Returns the clones root directory.
    #[must_use]
    pub fn clones_root(&self) -> &Utf8Path {
        &self.clones_root
    }

    /// Returns the session name for a review request.
    #[must_use]
    pub fn session_name(&self, number: ReviewRequestNumber) -> SessionName {
        // The prefix was validated with a numeric suffix in `new`.
        SessionName::from_validated(format!("{}{number}", self.session_prefix))
    }

    /// Returns the clone directory for a review request.
    #[must_use]
    pub fn clone_dir(&self, number: ReviewRequestNumber) -> Utf8PathBuf {
        self.clones_root.join(format!("{CLONE_DIR_PREFIX}{number}"))
    }

    /// Returns a temporary clone directory for work that has no review
    /// request yet.
    ///
    /// `sequence` disambiguates workflows started within the same
    /// millisecond.
    #[must_use]
    pub fn pending_clone_dir(&self, now: DateTime<Utc>, sequence: u64) -> Utf8PathBuf {
        self.clones_root.join(format!(
            "{PENDING_CLONE_DIR_PREFIX}{}-{sequence}",
            now.timestamp_millis()
        ))
    }
}
