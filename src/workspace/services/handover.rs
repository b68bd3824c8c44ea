//! Context handover into a freshly created workspace session.
//!
//! The handover renders one multi-line message describing the work, quotes
//! it as a single shell argument and types the assistant launch command
//! with that argument into the session. Delivery is a single injection with
//! no acknowledgement.

use crate::workspace::{
    domain::{BranchName, ReviewRequestNumber, SessionName},
    ports::{SessionPortError, WorkspaceSessionPort},
};
use minijinja::Environment;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

const HANDOVER_TEMPLATE: &str = "\
{% if continuing %}Continue the existing work on review request #{{ number }}.\
{% else %}Start work on review request #{{ number }}.{% endif %}
Working branch: {{ source_branch }}
Base branch: {{ target_branch }}

Task:
{{ task }}
{% if guidelines %}
Project guidelines:
{{ guidelines }}
{% endif %}";

/// Whether the session starts new work or resumes existing work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoverMode {
    /// The review request was just created for this task.
    NewWork,
    /// The review request already existed.
    ContinueExisting,
}

/// Facts handed to the assistant when a session starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoverContext {
    /// Review request being worked on.
    pub number: ReviewRequestNumber,
    /// Branch carrying the work.
    pub source_branch: BranchName,
    /// Branch the work merges into.
    pub target_branch: BranchName,
    /// Original task description.
    pub task: String,
    /// Project guidelines read from the clone, if any.
    pub guidelines: Option<String>,
    /// New or resumed work.
    pub mode: HandoverMode,
}

#[derive(Serialize)]
struct TemplateContext<'a> {
    continuing: bool,
    number: u64,
    source_branch: &'a str,
    target_branch: &'a str,
    task: &'a str,
    guidelines: Option<&'a str>,
}

/// Errors returned by the handover.
#[derive(Debug, Clone, Error)]
pub enum HandoverError {
    /// The message template failed to render.
    #[error("failed to render handover message: {0}")]
    Template(String),

    /// The session rejected the input.
    #[error(transparent)]
    Session(#[from] SessionPortError),
}

/// Result type for handover operations.
pub type HandoverResult<T> = Result<T, HandoverError>;

/// Escapes a value for safe inclusion in a POSIX shell command.
///
/// Uses single-quote wrapping and the standard `'\''` sequence for embedded
/// quotes, so the result is always exactly one shell word.
#[must_use]
pub fn shell_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('\'');
    for ch in value.chars() {
        if ch == '\'' {
            escaped.push_str("'\\''");
        } else {
            escaped.push(ch);
        }
    }
    escaped.push('\'');
    escaped
}

/// Builds and delivers the handover message.
pub struct HandoverService<S>
where
    S: WorkspaceSessionPort,
{
    sessions: Arc<S>,
    launch_command: String,
}

impl<S> HandoverService<S>
where
    S: WorkspaceSessionPort,
{
    /// Creates a handover that starts the assistant with `launch_command`.
    #[must_use]
    pub fn new(sessions: Arc<S>, launch_command: impl Into<String>) -> Self {
        Self {
            sessions,
            launch_command: launch_command.into(),
        }
    }

    /// Renders the handover message.
    ///
    /// # Errors
    ///
    /// Returns [`HandoverError::Template`] when rendering fails.
    pub fn message(&self, context: &HandoverContext) -> HandoverResult<String> {
        let template_context = TemplateContext {
            continuing: context.mode == HandoverMode::ContinueExisting,
            number: context.number.value(),
            source_branch: context.source_branch.as_str(),
            target_branch: context.target_branch.as_str(),
            task: &context.task,
            guidelines: context
                .guidelines
                .as_deref()
                .map(str::trim)
                .filter(|text| !text.is_empty()),
        };
        Environment::new()
            .render_str(HANDOVER_TEMPLATE, template_context)
            .map_err(|err| HandoverError::Template(err.to_string()))
    }

    /// Returns the full command line typed into the session.
    ///
    /// # Errors
    ///
    /// Returns [`HandoverError::Template`] when rendering fails.
    pub fn launch_line(&self, context: &HandoverContext) -> HandoverResult<String> {
        let message = self.message(context)?;
        Ok(format!("{} {}", self.launch_command, shell_escape(&message)))
    }

    /// Launches the assistant in `session` with the handover message.
    ///
    /// # Errors
    ///
    /// Returns [`HandoverError`] when rendering fails or the session
    /// rejects the input.
    pub async fn initialize(
        &self,
        session: &SessionName,
        context: &HandoverContext,
    ) -> HandoverResult<()> {
        let line = self.launch_line(context)?;
        self.sessions.send_input(session, &line).await?;
        info!(
            session = %session,
            number = context.number.value(),
            "handed context to assistant"
        );
        Ok(())
    }
}
