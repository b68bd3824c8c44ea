//! Review-request snapshots as returned by the review system.

use super::{
    BranchName, ParseReviewStateError, RepositoryFullName, ReviewRequestNumber, ReviewerLogin,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Review request lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewState {
    /// The request is open for review.
    Open,
    /// The request was closed without merging.
    Closed,
    /// The request was merged.
    Merged,
}

impl ReviewState {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
            Self::Merged => "MERGED",
        }
    }
}

impl TryFrom<&str> for ReviewState {
    type Error = ParseReviewStateError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "OPEN" => Ok(Self::Open),
            "CLOSED" => Ok(Self::Closed),
            "MERGED" => Ok(Self::Merged),
            _ => Err(ParseReviewStateError(value.to_owned())),
        }
    }
}

impl fmt::Display for ReviewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable snapshot of a review request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRequest {
    number: ReviewRequestNumber,
    title: String,
    body: String,
    source_branch: BranchName,
    target_branch: BranchName,
    repository: RepositoryFullName,
    state: ReviewState,
    url: String,
    author: ReviewerLogin,
    draft: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for constructing a [`ReviewRequest`] snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRequestData {
    /// Number assigned by the review system.
    pub number: ReviewRequestNumber,
    /// Request title.
    pub title: String,
    /// Request description.
    pub body: String,
    /// Branch carrying the changes.
    pub source_branch: BranchName,
    /// Branch the changes merge into.
    pub target_branch: BranchName,
    /// Owning repository.
    pub repository: RepositoryFullName,
    /// Lifecycle state.
    pub state: ReviewState,
    /// Web URL of the request.
    pub url: String,
    /// Author login.
    pub author: ReviewerLogin,
    /// Whether the request is a draft.
    pub draft: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl ReviewRequest {
    /// Builds a snapshot from its parts.
    #[must_use]
    pub fn new(data: ReviewRequestData) -> Self {
        Self {
            number: data.number,
            title: data.title,
            body: data.body,
            source_branch: data.source_branch,
            target_branch: data.target_branch,
            repository: data.repository,
            state: data.state,
            url: data.url,
            author: data.author,
            draft: data.draft,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the review request number.
    #[must_use]
    pub const fn number(&self) -> ReviewRequestNumber {
        self.number
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns the branch carrying the changes.
    #[must_use]
    pub const fn source_branch(&self) -> &BranchName {
        &self.source_branch
    }

    /// Returns the branch the changes merge into.
    #[must_use]
    pub const fn target_branch(&self) -> &BranchName {
        &self.target_branch
    }

    /// Returns the owning repository.
    #[must_use]
    pub const fn repository(&self) -> &RepositoryFullName {
        &self.repository
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ReviewState {
        self.state
    }

    /// Returns the web URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the author login.
    #[must_use]
    pub const fn author(&self) -> &ReviewerLogin {
        &self.author
    }

    /// Returns whether the request is a draft.
    #[must_use]
    pub const fn is_draft(&self) -> bool {
        self.draft
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns a copy with the given state and update timestamp.
    #[must_use]
    pub fn with_state(&self, state: ReviewState, at: DateTime<Utc>) -> Self {
        let mut updated = self.clone();
        updated.state = state;
        updated.updated_at = at;
        updated
    }

    /// Returns a copy with the update applied.
    #[must_use]
    pub fn with_update(&self, update: &ReviewRequestUpdate, at: DateTime<Utc>) -> Self {
        let mut updated = self.clone();
        if let Some(title) = &update.title {
            title.clone_into(&mut updated.title);
        }
        if let Some(body) = &update.body {
            body.clone_into(&mut updated.body);
        }
        if let Some(draft) = update.draft {
            updated.draft = draft;
        }
        updated.updated_at = at;
        updated
    }
}

/// Request payload for opening a review request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReviewRequest {
    /// Request title.
    pub title: String,
    /// Request description.
    pub body: String,
    /// Branch carrying the changes.
    pub source_branch: BranchName,
    /// Branch the changes merge into.
    pub target_branch: BranchName,
    /// Whether to open the request as a draft.
    pub draft: bool,
}

/// Partial update applied to an existing review request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewRequestUpdate {
    /// Replacement title.
    pub title: Option<String>,
    /// Replacement description.
    pub body: Option<String>,
    /// Replacement draft flag.
    pub draft: Option<bool>,
}

impl ReviewRequestUpdate {
    /// Sets the replacement title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the replacement description.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the replacement draft flag.
    #[must_use]
    pub const fn with_draft(mut self, draft: bool) -> Self {
        self.draft = Some(draft);
        self
    }
}
