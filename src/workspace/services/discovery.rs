//! Discovery of in-progress work by joining sessions, repositories and
//! review requests.
//!
//! A discovery pass lists every session, reads each session's repository,
//! then fetches open review requests once per distinct repository and joins
//! them locally by exact branch name. Review-system traffic therefore grows
//! with the number of repositories, not the number of sessions.

use super::cache::{CacheError, CacheRefresher, CacheResult};
use crate::workspace::{
    domain::{
        BranchName, RepositoryFullName, RepositorySnapshot, ReviewRequest, SessionName,
        WorkspaceSession, WorkspaceState,
    },
    ports::{
        ReviewSystemPort, SessionPortError, VcsError, VersionControlPort, WorkspaceSessionPort,
    },
};
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Service-level errors for discovery.
///
/// Only the session listing itself is fatal; every per-session and
/// per-repository failure is absorbed into the returned states.
#[derive(Debug, Clone, Error)]
pub enum DiscoveryError {
    /// Sessions could not be listed.
    #[error("failed to list sessions: {0}")]
    Sessions(#[from] SessionPortError),
}

/// Result type for discovery operations.
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

/// Cache key for the full workspace listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AllWorkspaces;

/// Open review requests of one discovery pass, indexed by repository and
/// source branch.
#[derive(Debug, Default)]
struct RequestIndex {
    by_repository: HashMap<RepositoryFullName, HashMap<BranchName, ReviewRequest>>,
}

impl RequestIndex {
    /// Indexes a repository's listing; the first request seen for a branch
    /// wins.
    fn insert_listing(&mut self, repository: RepositoryFullName, requests: Vec<ReviewRequest>) {
        let branches = self.by_repository.entry(repository).or_default();
        for request in requests {
            branches
                .entry(request.source_branch().clone())
                .or_insert(request);
        }
    }

    fn lookup(&self, snapshot: &RepositorySnapshot) -> Option<ReviewRequest> {
        self.by_repository
            .get(snapshot.repository())
            .and_then(|branches| branches.get(snapshot.branch()))
            .cloned()
    }
}

/// Derives workspace states from the session, version-control and review
/// ports.
pub struct DiscoveryService<S, V, R>
where
    S: WorkspaceSessionPort,
    V: VersionControlPort,
    R: ReviewSystemPort,
{
    sessions: Arc<S>,
    vcs: Arc<V>,
    reviews: Arc<R>,
}

impl<S, V, R> Clone for DiscoveryService<S, V, R>
where
    S: WorkspaceSessionPort,
    V: VersionControlPort,
    R: ReviewSystemPort,
{
    fn clone(&self) -> Self {
        Self {
            sessions: Arc::clone(&self.sessions),
            vcs: Arc::clone(&self.vcs),
            reviews: Arc::clone(&self.reviews),
        }
    }
}

impl<S, V, R> DiscoveryService<S, V, R>
where
    S: WorkspaceSessionPort,
    V: VersionControlPort,
    R: ReviewSystemPort,
{
    /// Creates a discovery service.
    #[must_use]
    pub const fn new(sessions: Arc<S>, vcs: Arc<V>, reviews: Arc<R>) -> Self {
        Self {
            sessions,
            vcs,
            reviews,
        }
    }

    /// Derives the state of every session.
    ///
    /// Sessions whose directory is not a usable repository are reported
    /// without a snapshot. Sessions whose repository listing failed are
    /// reported without a request.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Sessions`] when the session list cannot be
    /// read.
    pub async fn discover(&self) -> DiscoveryResult<Vec<WorkspaceState>> {
        let sessions = self.sessions.list().await?;
        let states = self.derive(sessions).await;
        debug!(count = states.len(), "discovery pass complete");
        Ok(states)
    }

    /// Derives the state of one session.
    ///
    /// Returns `None` when no session has the name.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Sessions`] when the session cannot be read.
    pub async fn discover_one(
        &self,
        name: &SessionName,
    ) -> DiscoveryResult<Option<WorkspaceState>> {
        let Some(session) = self.sessions.get(name).await? else {
            return Ok(None);
        };
        Ok(self.derive(vec![session]).await.into_iter().next())
    }

    async fn derive(&self, sessions: Vec<WorkspaceSession>) -> Vec<WorkspaceState> {
        let snapshots = join_all(sessions.iter().map(|session| self.snapshot_for(session))).await;
        let repositories: BTreeSet<RepositoryFullName> = snapshots
            .iter()
            .flatten()
            .map(|snapshot| snapshot.repository().clone())
            .collect();
        let index = self.fetch_index(repositories).await;

        sessions
            .into_iter()
            .zip(snapshots)
            .filter_map(|(session, snapshot)| {
                let request = snapshot.as_ref().and_then(|found| index.lookup(found));
                let name = session.name().clone();
                WorkspaceState::assemble(session, snapshot, request)
                    .inspect_err(|err| {
                        warn!(session = %name, error = %err, "dropping session from discovery");
                    })
                    .ok()
            })
            .collect()
    }

    async fn snapshot_for(&self, session: &WorkspaceSession) -> Option<RepositorySnapshot> {
        let status = match self.vcs.status(session.working_dir()).await {
            Ok(status) => status,
            Err(err @ VcsError::NotARepository(_)) => {
                debug!(
                    session = %session.name(),
                    dir = %session.working_dir(),
                    error = %err,
                    "session is outside version control"
                );
                return None;
            }
            Err(err) => {
                warn!(
                    session = %session.name(),
                    dir = %session.working_dir(),
                    error = %err,
                    "repository status failed"
                );
                return None;
            }
        };
        RepositorySnapshot::from_status(status)
            .inspect_err(|err| {
                warn!(session = %session.name(), error = %err, "unusable repository state");
            })
            .ok()
    }

    async fn fetch_index(&self, repositories: BTreeSet<RepositoryFullName>) -> RequestIndex {
        let listings = join_all(repositories.into_iter().map(|repository| async move {
            let listing = self.reviews.list_open(&repository).await;
            (repository, listing)
        }))
        .await;

        let mut index = RequestIndex::default();
        for (repository, listing) in listings {
            match listing {
                Ok(requests) => index.insert_listing(repository, requests),
                Err(err) => warn!(
                    repository = %repository,
                    error = %err,
                    "failed to list review requests; sessions stay unmatched"
                ),
            }
        }
        index
    }
}

#[async_trait]
impl<S, V, R> CacheRefresher<AllWorkspaces, Vec<WorkspaceState>> for DiscoveryService<S, V, R>
where
    S: WorkspaceSessionPort,
    V: VersionControlPort,
    R: ReviewSystemPort,
{
    async fn refresh(&self, _key: &AllWorkspaces) -> CacheResult<Vec<WorkspaceState>> {
        self.discover().await.map_err(CacheError::refresh)
    }
}
