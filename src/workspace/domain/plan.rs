//! Work plans: the branch, title and body a task description turns into.

use super::{BranchName, WorkspaceDomainError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest slug embedded in a fallback branch name.
const MAX_SLUG_LENGTH: usize = 40;

/// Longest clause embedded in a fallback title.
const MAX_TITLE_CLAUSE_LENGTH: usize = 64;

/// Characters that end the first clause of a task description.
const CLAUSE_TERMINATORS: [char; 6] = ['.', '!', '?', '\n', ';', ','];

/// Free-text description of a unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskDescription(String);

impl TaskDescription {
    /// Creates a validated task description.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceDomainError::EmptyTaskDescription`] when the value
    /// is empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, WorkspaceDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(WorkspaceDomainError::EmptyTaskDescription);
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the description text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the first non-empty clause of the description.
    #[must_use]
    pub fn first_clause(&self) -> &str {
        self.0
            .split(CLAUSE_TERMINATORS)
            .map(str::trim)
            .find(|clause| !clause.is_empty())
            .unwrap_or(&self.0)
    }
}

/// Errors returned while parsing an assistant response into a plan.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlanParseError {
    /// The response contains no `{ ... }` object.
    #[error("assistant response contains no JSON object")]
    NoJsonObject,

    /// The extracted object is not valid JSON.
    #[error("assistant response is not valid JSON: {0}")]
    InvalidJson(String),

    /// A required field is missing or blank.
    #[error("assistant response is missing field '{0}'")]
    MissingField(&'static str),

    /// The proposed branch name is not a valid ref name.
    #[error("assistant proposed an invalid branch name: {0}")]
    InvalidBranch(#[source] WorkspaceDomainError),
}

#[derive(Debug, Deserialize)]
struct RawPlan {
    #[serde(default)]
    branch: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    body: Option<String>,
}

/// Branch name, title and body for a new review request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkPlan {
    branch: BranchName,
    title: String,
    body: String,
}

impl WorkPlan {
    /// Creates a plan from validated parts.
    #[must_use]
    pub fn new(branch: BranchName, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            branch,
            title: title.into(),
            body: body.into(),
        }
    }

    /// Parses an assistant response of the form
    /// `{"branch": "...", "title": "...", "body": "..."}`.
    ///
    /// Prose or code fences around the object are ignored; the outermost
    /// braces delimit the JSON payload. A missing body becomes empty.
    ///
    /// # Errors
    ///
    /// Returns a [`PlanParseError`] describing why the response was
    /// rejected.
    pub fn parse_response(response: &str) -> Result<Self, PlanParseError> {
        let start = response.find('{').ok_or(PlanParseError::NoJsonObject)?;
        let end = response.rfind('}').ok_or(PlanParseError::NoJsonObject)?;
        let payload = response
            .get(start..=end)
            .ok_or(PlanParseError::NoJsonObject)?;

        let raw: RawPlan = serde_json::from_str(payload)
            .map_err(|err| PlanParseError::InvalidJson(err.to_string()))?;

        let branch_text = non_blank(raw.branch).ok_or(PlanParseError::MissingField("branch"))?;
        let title = non_blank(raw.title).ok_or(PlanParseError::MissingField("title"))?;
        let branch = BranchName::new(branch_text).map_err(PlanParseError::InvalidBranch)?;

        Ok(Self::new(branch, title, raw.body.unwrap_or_default().trim()))
    }

    /// Builds a deterministic plan without the assistant.
    ///
    /// The branch is `feat/{slug}-{unix seconds}` and the title is
    /// `feat: {first clause}`. This never fails.
    #[must_use]
    pub fn fallback(task: &TaskDescription, now: DateTime<Utc>) -> Self {
        let clause = task.first_clause();
        let slug = slugify(clause);
        let timestamp = now.timestamp();
        let branch = if slug.is_empty() {
            BranchName::from_sanitised(format!("feat/task-{timestamp}"))
        } else {
            BranchName::from_sanitised(format!("feat/{slug}-{timestamp}"))
        };
        let summary: String = clause.chars().take(MAX_TITLE_CLAUSE_LENGTH).collect();
        Self::new(branch, format!("feat: {summary}"), task.as_str())
    }

    /// Returns the branch name.
    #[must_use]
    pub const fn branch(&self) -> &BranchName {
        &self.branch
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

/// Lowercase ASCII slug with single hyphens between words.
fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let truncated: String = slug.chars().take(MAX_SLUG_LENGTH).collect();
    truncated.trim_matches('-').to_owned()
}
