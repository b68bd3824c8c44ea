//! Identifier and validated scalar types for the workspace domain.

use super::WorkspaceDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Positive review request number assigned by the review system.
///
/// # Examples
///
///     use atelier::workspace::domain::ReviewRequestNumber;
///
///     let number = ReviewRequestNumber::new(42).expect("valid");
///     assert_eq!(number.value(), 42);
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewRequestNumber(u64);

impl ReviewRequestNumber {
    /// Creates a validated review request number.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceDomainError::InvalidReviewRequestNumber`] when the
    /// value is zero.
    pub const fn new(value: u64) -> Result<Self, WorkspaceDomainError> {
        if value == 0 {
            return Err(WorkspaceDomainError::InvalidReviewRequestNumber(value));
        }
        Ok(Self(value))
    }

    /// Returns the underlying numeric value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ReviewRequestNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalized repository identifier in `owner/repo` format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepositoryFullName(String);

impl RepositoryFullName {
    /// Creates a validated repository name.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceDomainError::InvalidRepository`] if the value does
    /// not contain exactly one slash-delimited owner and repository segment.
    pub fn new(value: impl Into<String>) -> Result<Self, WorkspaceDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        let mut segments = normalized.split('/');
        let owner = segments.next().unwrap_or_default();
        let repo = segments.next().unwrap_or_default();
        let has_more_segments = segments.next().is_some();
        let is_valid = !owner.is_empty()
            && !repo.is_empty()
            && !has_more_segments
            && !normalized.chars().any(char::is_whitespace);

        if !is_valid {
            return Err(WorkspaceDomainError::InvalidRepository(raw));
        }

        Ok(Self(normalized.to_owned()))
    }

    /// Returns the repository name as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for RepositoryFullName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for RepositoryFullName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of a workspace session in the terminal multiplexer.
///
/// Names must be non-empty and must not contain `:` or `.`, which the
/// multiplexer uses as target separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionName(String);

impl SessionName {
    /// Creates a validated session name.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceDomainError::InvalidSessionName`] when the value is
    /// empty or contains a reserved character.
    pub fn new(value: impl Into<String>) -> Result<Self, WorkspaceDomainError> {
        let raw = value.into();
        let is_invalid = raw.trim().is_empty()
            || raw
                .chars()
                .any(|ch| ch == ':' || ch == '.' || ch.is_whitespace());
        if is_invalid {
            return Err(WorkspaceDomainError::InvalidSessionName(raw));
        }
        Ok(Self(raw))
    }

    /// Wraps a name whose shape was already validated.
    pub(crate) const fn from_validated(name: String) -> Self {
        Self(name)
    }

    /// Returns the session name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SessionName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for SessionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Login of a review-system user, used to key per-user listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewerLogin(String);

impl ReviewerLogin {
    /// Creates a validated reviewer login.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceDomainError::EmptyReviewerLogin`] when the value is
    /// empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, WorkspaceDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(WorkspaceDomainError::EmptyReviewerLogin);
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the login as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReviewerLogin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
