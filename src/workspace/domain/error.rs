//! Error types for workspace domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing domain workspace values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkspaceDomainError {
    /// The review request number is not a positive integer.
    #[error("invalid review request number {0}, expected a positive integer")]
    InvalidReviewRequestNumber(u64),

    /// The repository name does not follow `owner/repo` format.
    #[error("invalid repository name '{0}', expected owner/repo")]
    InvalidRepository(String),

    /// The remote URL does not match a recognised hosting pattern.
    #[error("unrecognised remote URL '{0}'")]
    UnrecognisedRemoteUrl(String),

    /// The branch name is empty or contains forbidden characters.
    #[error("invalid branch name '{0}'")]
    InvalidBranchName(String),

    /// The session name is empty or contains characters the multiplexer
    /// reserves.
    #[error("invalid session name '{0}'")]
    InvalidSessionName(String),

    /// The reviewer login is empty after trimming.
    #[error("reviewer login must not be empty")]
    EmptyReviewerLogin,

    /// The task description is empty after trimming.
    #[error("task description must not be empty")]
    EmptyTaskDescription,

    /// A review request was paired with a workspace that has no repository.
    #[error("review request #{0} cannot be matched without a repository snapshot")]
    RequestWithoutRepository(u64),

    /// A review request was paired with a snapshot it does not belong to.
    #[error("review request #{number} targets {request_key}, snapshot is {snapshot_key}")]
    RequestSnapshotMismatch {
        /// Review request number.
        number: u64,
        /// `owner/repo:branch` of the request.
        request_key: String,
        /// `owner/repo:branch` of the snapshot.
        snapshot_key: String,
    },
}

/// Error returned while parsing review states from external payloads.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown review request state: {0}")]
pub struct ParseReviewStateError(pub String);
