//! Review-system port for listing and mutating review requests.

use crate::workspace::domain::{
    NewReviewRequest, RepositoryFullName, ReviewRequest, ReviewRequestNumber, ReviewRequestUpdate,
    ReviewerLogin,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for review-system operations.
pub type ReviewSystemResult<T> = Result<T, ReviewSystemError>;

/// Review-system contract keyed by repository.
#[async_trait]
pub trait ReviewSystemPort: Send + Sync {
    /// Lists open review requests of a repository in the order the review
    /// system returns them.
    async fn list_open(
        &self,
        repository: &RepositoryFullName,
    ) -> ReviewSystemResult<Vec<ReviewRequest>>;

    /// Lists open review requests authored by a user across repositories.
    async fn list_authored(&self, author: &ReviewerLogin)
    -> ReviewSystemResult<Vec<ReviewRequest>>;

    /// Finds a review request by number.
    ///
    /// Returns `None` when the repository has no such request.
    async fn find(
        &self,
        repository: &RepositoryFullName,
        number: ReviewRequestNumber,
    ) -> ReviewSystemResult<Option<ReviewRequest>>;

    /// Opens a review request; the review system assigns its number.
    async fn create(
        &self,
        repository: &RepositoryFullName,
        request: &NewReviewRequest,
    ) -> ReviewSystemResult<ReviewRequest>;

    /// Applies a partial update to a review request.
    async fn update(
        &self,
        repository: &RepositoryFullName,
        number: ReviewRequestNumber,
        update: &ReviewRequestUpdate,
    ) -> ReviewSystemResult<ReviewRequest>;

    /// Closes a review request without merging it.
    async fn close(
        &self,
        repository: &RepositoryFullName,
        number: ReviewRequestNumber,
    ) -> ReviewSystemResult<()>;
}

/// Errors returned by review-system adapters.
#[derive(Debug, Clone, Error)]
pub enum ReviewSystemError {
    /// The repository has no such review request.
    #[error("review request {repository}#{number} not found")]
    NotFound {
        /// Repository searched.
        repository: RepositoryFullName,
        /// Requested number.
        number: ReviewRequestNumber,
    },

    /// The review system rejected the request payload.
    #[error("review system rejected the request: {0}")]
    Rejected(String),

    /// The review system could not be reached or answered with an error.
    #[error("review system runtime error: {0}")]
    Runtime(Arc<dyn std::error::Error + Send + Sync>),
}

impl ReviewSystemError {
    /// Wraps a runtime error from the review-system adapter.
    pub fn runtime(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Runtime(Arc::new(err))
    }
}
