//! Workspace-session port over the terminal multiplexer.

use crate::workspace::domain::{NewSession, SessionName, WorkspaceSession};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for session port operations.
pub type SessionPortResult<T> = Result<T, SessionPortError>;

/// Control contract for named multiplexer sessions.
#[async_trait]
pub trait WorkspaceSessionPort: Send + Sync {
    /// Lists every session, regardless of name.
    async fn list(&self) -> SessionPortResult<Vec<WorkspaceSession>>;

    /// Finds a session by name.
    ///
    /// Returns `None` when no session has the name.
    async fn get(&self, name: &SessionName) -> SessionPortResult<Option<WorkspaceSession>>;

    /// Creates a session rooted at the requested working directory.
    async fn create(&self, request: &NewSession) -> SessionPortResult<WorkspaceSession>;

    /// Destroys a session.
    async fn destroy(&self, name: &SessionName) -> SessionPortResult<()>;

    /// Types raw input into the session followed by a newline.
    async fn send_input(&self, name: &SessionName, input: &str) -> SessionPortResult<()>;
}

/// Errors returned by session port adapters.
#[derive(Debug, Clone, Error)]
pub enum SessionPortError {
    /// A session with the same name already exists.
    #[error("session {0} already exists")]
    AlreadyExists(SessionName),

    /// No session has the given name.
    #[error("session {0} not found")]
    NotFound(SessionName),

    /// The multiplexer failed.
    #[error("session runtime error: {0}")]
    Runtime(Arc<dyn std::error::Error + Send + Sync>),
}

impl SessionPortError {
    /// Wraps a runtime error from the session adapter.
    pub fn runtime(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Runtime(Arc::new(err))
    }
}
