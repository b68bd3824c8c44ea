//! Workspace session value objects.

use super::SessionName;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named terminal-multiplexer session rooted at a working directory.
///
/// Sessions are owned by the multiplexer; this type is a read-only snapshot
/// of what the session port reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSession {
    name: SessionName,
    working_dir: Utf8PathBuf,
    created_at: DateTime<Utc>,
    attached: bool,
}

impl WorkspaceSession {
    /// Creates a session snapshot.
    #[must_use]
    pub const fn new(
        name: SessionName,
        working_dir: Utf8PathBuf,
        created_at: DateTime<Utc>,
        attached: bool,
    ) -> Self {
        Self {
            name,
            working_dir,
            created_at,
            attached,
        }
    }

    /// Returns the session name.
    #[must_use]
    pub const fn name(&self) -> &SessionName {
        &self.name
    }

    /// Returns the session working directory.
    #[must_use]
    pub fn working_dir(&self) -> &Utf8Path {
        &self.working_dir
    }

    /// Returns when the session was created.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns whether a client is attached to the session.
    #[must_use]
    pub const fn is_attached(&self) -> bool {
        self.attached
    }
}

/// Request payload for creating a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    /// Session name.
    pub name: SessionName,
    /// Directory the session starts in.
    pub working_dir: Utf8PathBuf,
    /// Whether the caller's terminal attaches to the new session.
    pub attached: bool,
}

impl NewSession {
    /// Creates a request for a detached session.
    #[must_use]
    pub const fn detached(name: SessionName, working_dir: Utf8PathBuf) -> Self {
        Self {
            name,
            working_dir,
            attached: false,
        }
    }
}
