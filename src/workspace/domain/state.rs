//! Derived workspace state produced by one discovery pass.

use super::{RepositorySnapshot, ReviewRequest, WorkspaceDomainError, WorkspaceSession};
use serde::Serialize;

/// A session joined with its repository snapshot and matching review request.
///
/// Never stored beyond the discovery pass that produced it. A review request
/// is only ever present alongside a snapshot whose repository and branch it
/// matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkspaceState {
    session: WorkspaceSession,
    repository: Option<RepositorySnapshot>,
    review_request: Option<ReviewRequest>,
    has_valid_repo: bool,
    has_matched_request: bool,
    is_active: bool,
}

impl WorkspaceState {
    /// Joins a session with its optional snapshot and review request.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceDomainError::RequestWithoutRepository`] when a
    /// request is supplied without a snapshot, or
    /// [`WorkspaceDomainError::RequestSnapshotMismatch`] when the request's
    /// repository or source branch differs from the snapshot's.
    pub fn assemble(
        session: WorkspaceSession,
        repository: Option<RepositorySnapshot>,
        review_request: Option<ReviewRequest>,
    ) -> Result<Self, WorkspaceDomainError> {
        if let Some(request) = &review_request {
            let snapshot = repository.as_ref().ok_or(
                WorkspaceDomainError::RequestWithoutRepository(request.number().value()),
            )?;
            let matches = request.repository() == snapshot.repository()
                && request.source_branch() == snapshot.branch();
            if !matches {
                return Err(WorkspaceDomainError::RequestSnapshotMismatch {
                    number: request.number().value(),
                    request_key: format!("{}:{}", request.repository(), request.source_branch()),
                    snapshot_key: format!("{}:{}", snapshot.repository(), snapshot.branch()),
                });
            }
        }

        let is_active = session.is_attached();
        Ok(Self {
            has_valid_repo: repository.is_some(),
            has_matched_request: review_request.is_some(),
            is_active,
            session,
            repository,
            review_request,
        })
    }

    /// Returns the underlying session.
    #[must_use]
    pub const fn session(&self) -> &WorkspaceSession {
        &self.session
    }

    /// Returns the repository snapshot, if the directory is under version
    /// control with a recognised remote.
    #[must_use]
    pub const fn repository(&self) -> Option<&RepositorySnapshot> {
        self.repository.as_ref()
    }

    /// Returns the matched review request, if any.
    #[must_use]
    pub const fn review_request(&self) -> Option<&ReviewRequest> {
        self.review_request.as_ref()
    }

    /// Returns whether a repository snapshot was read.
    #[must_use]
    pub const fn has_valid_repo(&self) -> bool {
        self.has_valid_repo
    }

    /// Returns whether a review request matched the snapshot.
    #[must_use]
    pub const fn has_matched_request(&self) -> bool {
        self.has_matched_request
    }

    /// Returns whether a client is attached to the session.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.is_active
    }
}
