//! Cached read models for callers polling workspace state.

use super::{
    cache::{CacheError, CacheRefresher, CacheResult, RevalidatingCache},
    discovery::{AllWorkspaces, DiscoveryService},
};
use crate::workspace::{
    domain::{ReviewRequest, ReviewerLogin, SessionName, WorkspaceState},
    ports::{ReviewSystemPort, VersionControlPort, WorkspaceSessionPort},
};
use async_trait::async_trait;
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;

/// Refreshes a reviewer's open review requests.
pub struct ReviewListingRefresher<R> {
    reviews: Arc<R>,
}

impl<R> ReviewListingRefresher<R>
where
    R: ReviewSystemPort,
{
    /// Creates a refresher over a review system.
    #[must_use]
    pub const fn new(reviews: Arc<R>) -> Self {
        Self { reviews }
    }
}

#[async_trait]
impl<R> CacheRefresher<ReviewerLogin, Vec<ReviewRequest>> for ReviewListingRefresher<R>
where
    R: ReviewSystemPort,
{
    async fn refresh(&self, key: &ReviewerLogin) -> CacheResult<Vec<ReviewRequest>> {
        self.reviews
            .list_authored(key)
            .await
            .map_err(CacheError::refresh)
    }
}

/// Cache over the full workspace listing.
pub type WorkspaceCache<S, V, R, C> =
    RevalidatingCache<AllWorkspaces, Vec<WorkspaceState>, DiscoveryService<S, V, R>, C>;

/// Cache over per-reviewer review request listings.
pub type ReviewListingCache<R, C> =
    RevalidatingCache<ReviewerLogin, Vec<ReviewRequest>, ReviewListingRefresher<R>, C>;

/// Freshness windows of the two catalog caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogTtls {
    /// Time a workspace listing stays fresh after its last use.
    pub workspaces: Duration,
    /// Time a reviewer's listing stays fresh after its last use.
    pub review_listings: Duration,
}

/// Workspace and review-request read models behind revalidating caches.
///
/// The workspace listing uses a short freshness window under a single
/// global key; review listings use a long window keyed by reviewer.
pub struct WorkspaceCatalog<S, V, R, C>
where
    S: WorkspaceSessionPort + 'static,
    V: VersionControlPort + 'static,
    R: ReviewSystemPort + 'static,
    C: Clock + Send + Sync + 'static,
{
    workspaces: WorkspaceCache<S, V, R, C>,
    listings: ReviewListingCache<R, C>,
}

impl<S, V, R, C> Clone for WorkspaceCatalog<S, V, R, C>
where
    S: WorkspaceSessionPort + 'static,
    V: VersionControlPort + 'static,
    R: ReviewSystemPort + 'static,
    C: Clock + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            workspaces: self.workspaces.clone(),
            listings: self.listings.clone(),
        }
    }
}

impl<S, V, R, C> WorkspaceCatalog<S, V, R, C>
where
    S: WorkspaceSessionPort + 'static,
    V: VersionControlPort + 'static,
    R: ReviewSystemPort + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a catalog over a discovery service and review system.
    #[must_use]
    pub fn new(
        discovery: DiscoveryService<S, V, R>,
        reviews: Arc<R>,
        clock: Arc<C>,
        ttls: CatalogTtls,
    ) -> Self {
        Self {
            workspaces: RevalidatingCache::new(
                Arc::new(discovery),
                Arc::clone(&clock),
                ttls.workspaces,
            ),
            listings: RevalidatingCache::new(
                Arc::new(ReviewListingRefresher::new(reviews)),
                clock,
                ttls.review_listings,
            ),
        }
    }

    /// Returns the current workspace states.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when no listing is cached and discovery fails.
    pub async fn workspaces(&self) -> CacheResult<Arc<Vec<WorkspaceState>>> {
        self.workspaces.get(&AllWorkspaces).await
    }

    /// Returns the cached state of one session.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when no listing is cached and discovery fails.
    pub async fn workspace(&self, name: &SessionName) -> CacheResult<Option<WorkspaceState>> {
        let states = self.workspaces.get(&AllWorkspaces).await?;
        Ok(states
            .iter()
            .find(|state| state.session().name() == name)
            .cloned())
    }

    /// Forces a discovery pass.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when discovery fails.
    pub async fn refresh_workspaces(&self) -> CacheResult<Arc<Vec<WorkspaceState>>> {
        self.workspaces.refresh(&AllWorkspaces).await
    }

    /// Drops the cached workspace listing and waits for a new one.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when discovery fails.
    pub async fn invalidate_workspaces(&self) -> CacheResult<Arc<Vec<WorkspaceState>>> {
        self.workspaces.invalidate(&AllWorkspaces).await
    }

    /// Drops the cached listing of `user` and waits for a new one.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the review system fails.
    pub async fn invalidate_review_requests(
        &self,
        user: &ReviewerLogin,
    ) -> CacheResult<Arc<Vec<ReviewRequest>>> {
        self.listings.invalidate(user).await
    }

    /// Returns the open review requests authored by `user`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when no listing is cached and the review
    /// system fails.
    pub async fn my_review_requests(
        &self,
        user: &ReviewerLogin,
    ) -> CacheResult<Arc<Vec<ReviewRequest>>> {
        self.listings.get(user).await
    }

    /// Returns the workspace cache, for subscribing to its events.
    #[must_use]
    pub const fn workspace_cache(&self) -> &WorkspaceCache<S, V, R, C> {
        &self.workspaces
    }

    /// Returns the review listing cache, for subscribing to its events.
    #[must_use]
    pub const fn review_listing_cache(&self) -> &ReviewListingCache<R, C> {
        &self.listings
    }
}
