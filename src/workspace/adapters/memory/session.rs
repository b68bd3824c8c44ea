//! In-memory multiplexer session host.

use crate::workspace::{
    domain::{NewSession, SessionName, WorkspaceSession},
    ports::{SessionPortError, SessionPortResult, WorkspaceSessionPort},
};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, RwLock};

/// Input typed into a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentInput {
    /// Session that received the input.
    pub session: SessionName,
    /// Raw input line.
    pub input: String,
}

/// In-memory session host.
///
/// Sessions are listed in creation order, which keeps discovery output
/// deterministic in tests.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionHost {
    state: Arc<RwLock<SessionHostState>>,
}

#[derive(Debug, Default)]
struct SessionHostState {
    sessions: Vec<WorkspaceSession>,
    inputs: Vec<SentInput>,
    create_failure: Option<String>,
}

fn lock_error(err: &impl std::fmt::Display) -> SessionPortError {
    SessionPortError::runtime(std::io::Error::other(err.to_string()))
}

impl InMemorySessionHost {
    /// Creates an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an existing session, replacing any session with the same name.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn insert(&self, session: WorkspaceSession) -> SessionPortResult<()> {
        let mut state = self.state.write().map_err(|err| lock_error(&err))?;
        state
            .sessions
            .retain(|existing| existing.name() != session.name());
        state.sessions.push(session);
        Ok(())
    }

    /// Makes later session creation fail with a runtime error.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn fail_creation(&self, message: impl Into<String>) -> SessionPortResult<()> {
        self.state
            .write()
            .map_err(|err| lock_error(&err))?
            .create_failure = Some(message.into());
        Ok(())
    }

    /// Returns every input typed so far, in order.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn sent_inputs(&self) -> SessionPortResult<Vec<SentInput>> {
        Ok(self
            .state
            .read()
            .map_err(|err| lock_error(&err))?
            .inputs
            .clone())
    }
}

#[async_trait]
impl WorkspaceSessionPort for InMemorySessionHost {
    async fn list(&self) -> SessionPortResult<Vec<WorkspaceSession>> {
        Ok(self
            .state
            .read()
            .map_err(|err| lock_error(&err))?
            .sessions
            .clone())
    }

    async fn get(&self, name: &SessionName) -> SessionPortResult<Option<WorkspaceSession>> {
        let state = self.state.read().map_err(|err| lock_error(&err))?;
        Ok(state
            .sessions
            .iter()
            .find(|session| session.name() == name)
            .cloned())
    }

    async fn create(&self, request: &NewSession) -> SessionPortResult<WorkspaceSession> {
        let mut state = self.state.write().map_err(|err| lock_error(&err))?;
        if let Some(message) = &state.create_failure {
            return Err(SessionPortError::runtime(std::io::Error::other(
                message.clone(),
            )));
        }
        if state
            .sessions
            .iter()
            .any(|session| session.name() == &request.name)
        {
            return Err(SessionPortError::AlreadyExists(request.name.clone()));
        }
        let session = WorkspaceSession::new(
            request.name.clone(),
            request.working_dir.clone(),
            Utc::now(),
            request.attached,
        );
        state.sessions.push(session.clone());
        Ok(session)
    }

    async fn destroy(&self, name: &SessionName) -> SessionPortResult<()> {
        let mut state = self.state.write().map_err(|err| lock_error(&err))?;
        let before = state.sessions.len();
        state.sessions.retain(|session| session.name() != name);
        if state.sessions.len() == before {
            return Err(SessionPortError::NotFound(name.clone()));
        }
        Ok(())
    }

    async fn send_input(&self, name: &SessionName, input: &str) -> SessionPortResult<()> {
        let mut state = self.state.write().map_err(|err| lock_error(&err))?;
        if !state.sessions.iter().any(|session| session.name() == name) {
            return Err(SessionPortError::NotFound(name.clone()));
        }
        state.inputs.push(SentInput {
            session: name.clone(),
            input: input.to_owned(),
        });
        Ok(())
    }
}
