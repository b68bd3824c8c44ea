//! Simulated writes against a real review system.
//!
//! Reads go to the wrapped review system; creates, updates and closes are
//! recorded only in a [`SimulatedReviewStore`]. Later reads through the same
//! [`SimulatedReviewSystem`] reflect those writes, so a workflow run in
//! simulated mode observes its own effects without touching the review
//! system. Simulated writes are timestamped by the injected clock.

use crate::workspace::{
    domain::{
        NewReviewRequest, RepositoryFullName, ReviewRequest, ReviewRequestData,
        ReviewRequestNumber, ReviewRequestUpdate, ReviewState, ReviewerLogin,
    },
    ports::{ReviewSystemError, ReviewSystemPort, ReviewSystemResult},
};
use async_trait::async_trait;
use mockable::Clock;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

/// Repository-scoped store for review requests written in simulated mode.
///
/// Created requests receive numbers counting up from a configured base so
/// they are easy to tell apart from numbers the review system assigns.
/// Clones share the same underlying store.
#[derive(Debug, Clone)]
pub struct SimulatedReviewStore {
    state: Arc<RwLock<StoreState>>,
}

#[derive(Debug)]
struct StoreState {
    next_number: u64,
    created: HashMap<RepositoryFullName, Vec<ReviewRequest>>,
    overrides: HashMap<(RepositoryFullName, ReviewRequestNumber), ReviewRequest>,
}

impl StoreState {
    fn created_mut(
        &mut self,
        repository: &RepositoryFullName,
        number: ReviewRequestNumber,
    ) -> Option<&mut ReviewRequest> {
        self.created
            .get_mut(repository)
            .and_then(|requests| requests.iter_mut().find(|r| r.number() == number))
    }

    fn created(
        &self,
        repository: &RepositoryFullName,
        number: ReviewRequestNumber,
    ) -> Option<&ReviewRequest> {
        self.created
            .get(repository)
            .and_then(|requests| requests.iter().find(|r| r.number() == number))
    }

    /// Replaces a real request with its simulated override, if any.
    fn overlay(&self, request: ReviewRequest) -> ReviewRequest {
        self.overrides
            .get(&(request.repository().clone(), request.number()))
            .cloned()
            .unwrap_or(request)
    }
}

impl SimulatedReviewStore {
    /// Creates an empty store whose first created request receives `base`.
    ///
    /// A base of zero is treated as one, since review request numbers are
    /// positive.
    #[must_use]
    pub fn new(base: u64) -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreState {
                next_number: base.max(1),
                created: HashMap::new(),
                overrides: HashMap::new(),
            })),
        }
    }

    fn read(&self) -> ReviewSystemResult<RwLockReadGuard<'_, StoreState>> {
        self.state
            .read()
            .map_err(|err| ReviewSystemError::runtime(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> ReviewSystemResult<RwLockWriteGuard<'_, StoreState>> {
        self.state
            .write()
            .map_err(|err| ReviewSystemError::runtime(std::io::Error::other(err.to_string())))
    }

    /// Returns every request created in simulated mode for a repository, in
    /// creation order.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn created_requests(
        &self,
        repository: &RepositoryFullName,
    ) -> ReviewSystemResult<Vec<ReviewRequest>> {
        Ok(self
            .read()?
            .created
            .get(repository)
            .cloned()
            .unwrap_or_default())
    }
}

/// Review system that reads through to `R` and keeps writes in memory.
#[derive(Debug, Clone)]
pub struct SimulatedReviewSystem<R, C> {
    inner: R,
    store: SimulatedReviewStore,
    author: ReviewerLogin,
    clock: Arc<C>,
}

impl<R, C> SimulatedReviewSystem<R, C>
where
    R: ReviewSystemPort,
    C: Clock + Send + Sync,
{
    /// Wraps a review system, recording writes in `store` as `author` at the
    /// times `clock` reports.
    #[must_use]
    pub const fn new(
        inner: R,
        store: SimulatedReviewStore,
        author: ReviewerLogin,
        clock: Arc<C>,
    ) -> Self {
        Self {
            inner,
            store,
            author,
            clock,
        }
    }

    /// Returns the store holding simulated writes.
    #[must_use]
    pub const fn store(&self) -> &SimulatedReviewStore {
        &self.store
    }

    async fn current(
        &self,
        repository: &RepositoryFullName,
        number: ReviewRequestNumber,
    ) -> ReviewSystemResult<ReviewRequest> {
        if let Some(request) = self.store.read()?.created(repository, number) {
            return Ok(request.clone());
        }
        let found = self.inner.find(repository, number).await?;
        let state = self.store.read()?;
        found
            .map(|request| state.overlay(request))
            .ok_or_else(|| ReviewSystemError::NotFound {
                repository: repository.clone(),
                number,
            })
    }

    /// Stores the new version of a request, in the created list when it was
    /// created in simulated mode and as an override otherwise.
    fn record(&self, request: ReviewRequest) -> ReviewSystemResult<()> {
        let mut state = self.store.write()?;
        if let Some(existing) = state.created_mut(request.repository(), request.number()) {
            *existing = request;
            return Ok(());
        }
        state
            .overrides
            .insert((request.repository().clone(), request.number()), request);
        Ok(())
    }
}

#[async_trait]
impl<R, C> ReviewSystemPort for SimulatedReviewSystem<R, C>
where
    R: ReviewSystemPort,
    C: Clock + Send + Sync,
{
    async fn list_open(
        &self,
        repository: &RepositoryFullName,
    ) -> ReviewSystemResult<Vec<ReviewRequest>> {
        let real = self.inner.list_open(repository).await?;
        let state = self.store.read()?;
        let simulated = state.created.get(repository).into_iter().flatten().cloned();
        Ok(real
            .into_iter()
            .map(|request| state.overlay(request))
            .chain(simulated)
            .filter(|request| request.state() == ReviewState::Open)
            .collect())
    }

    async fn list_authored(
        &self,
        author: &ReviewerLogin,
    ) -> ReviewSystemResult<Vec<ReviewRequest>> {
        let real = self.inner.list_authored(author).await?;
        let state = self.store.read()?;
        let simulated = state.created.values().flatten().cloned();
        Ok(real
            .into_iter()
            .map(|request| state.overlay(request))
            .chain(simulated)
            .filter(|request| request.author() == author && request.state() == ReviewState::Open)
            .collect())
    }

    async fn find(
        &self,
        repository: &RepositoryFullName,
        number: ReviewRequestNumber,
    ) -> ReviewSystemResult<Option<ReviewRequest>> {
        match self.current(repository, number).await {
            Ok(request) => Ok(Some(request)),
            Err(ReviewSystemError::NotFound { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn create(
        &self,
        repository: &RepositoryFullName,
        request: &NewReviewRequest,
    ) -> ReviewSystemResult<ReviewRequest> {
        let mut state = self.store.write()?;
        let number =
            ReviewRequestNumber::new(state.next_number).map_err(ReviewSystemError::runtime)?;
        let now = self.clock.utc();
        let created = ReviewRequest::new(ReviewRequestData {
            number,
            title: request.title.clone(),
            body: request.body.clone(),
            source_branch: request.source_branch.clone(),
            target_branch: request.target_branch.clone(),
            repository: repository.clone(),
            state: ReviewState::Open,
            url: format!("simulated://{repository}/pull/{number}"),
            author: self.author.clone(),
            draft: request.draft,
            created_at: now,
            updated_at: now,
        });
        state.next_number = state.next_number.saturating_add(1);
        state
            .created
            .entry(repository.clone())
            .or_default()
            .push(created.clone());
        info!(
            repository = %repository,
            number = number.value(),
            "recorded simulated review request"
        );
        Ok(created)
    }

    async fn update(
        &self,
        repository: &RepositoryFullName,
        number: ReviewRequestNumber,
        update: &ReviewRequestUpdate,
    ) -> ReviewSystemResult<ReviewRequest> {
        let updated = self
            .current(repository, number)
            .await?
            .with_update(update, self.clock.utc());
        self.record(updated.clone())?;
        Ok(updated)
    }

    async fn close(
        &self,
        repository: &RepositoryFullName,
        number: ReviewRequestNumber,
    ) -> ReviewSystemResult<()> {
        let closed = self
            .current(repository, number)
            .await?
            .with_state(ReviewState::Closed, self.clock.utc());
        self.record(closed)?;
        info!(
            repository = %repository,
            number = number.value(),
            "recorded simulated close"
        );
        Ok(())
    }
}

/// Review system used by the services: either the real one or the real
/// one behind simulated writes.
#[derive(Debug, Clone)]
pub enum ReviewGateway<R, C> {
    /// Reads and writes go to the review system.
    Live(R),
    /// Reads go to the review system; writes stay in memory.
    Simulated(SimulatedReviewSystem<R, C>),
}

impl<R, C> ReviewGateway<R, C>
where
    R: ReviewSystemPort,
    C: Clock + Send + Sync,
{
    /// Passes every call through to `inner`.
    #[must_use]
    pub const fn live(inner: R) -> Self {
        Self::Live(inner)
    }

    /// Keeps writes in `store`, authored by `author` and timestamped by
    /// `clock`.
    #[must_use]
    pub const fn simulated(
        inner: R,
        store: SimulatedReviewStore,
        author: ReviewerLogin,
        clock: Arc<C>,
    ) -> Self {
        Self::Simulated(SimulatedReviewSystem::new(inner, store, author, clock))
    }

    /// Returns whether writes are simulated.
    #[must_use]
    pub const fn is_simulated(&self) -> bool {
        matches!(self, Self::Simulated(_))
    }

    fn port(&self) -> &dyn ReviewSystemPort {
        match self {
            Self::Live(inner) => inner,
            Self::Simulated(simulated) => simulated,
        }
    }
}

#[async_trait]
impl<R, C> ReviewSystemPort for ReviewGateway<R, C>
where
    R: ReviewSystemPort,
    C: Clock + Send + Sync,
{
    async fn list_open(
        &self,
        repository: &RepositoryFullName,
    ) -> ReviewSystemResult<Vec<ReviewRequest>> {
        self.port().list_open(repository).await
    }

    async fn list_authored(
        &self,
        author: &ReviewerLogin,
    ) -> ReviewSystemResult<Vec<ReviewRequest>> {
        self.port().list_authored(author).await
    }

    async fn find(
        &self,
        repository: &RepositoryFullName,
        number: ReviewRequestNumber,
    ) -> ReviewSystemResult<Option<ReviewRequest>> {
        self.port().find(repository, number).await
    }

    async fn create(
        &self,
        repository: &RepositoryFullName,
        request: &NewReviewRequest,
    ) -> ReviewSystemResult<ReviewRequest> {
        self.port().create(repository, request).await
    }

    async fn update(
        &self,
        repository: &RepositoryFullName,
        number: ReviewRequestNumber,
        update: &ReviewRequestUpdate,
    ) -> ReviewSystemResult<ReviewRequest> {
        self.port().update(repository, number, update).await
    }

    async fn close(
        &self,
        repository: &RepositoryFullName,
        number: ReviewRequestNumber,
    ) -> ReviewSystemResult<()> {
        self.port().close(repository, number).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::adapters::memory::InMemoryReviewSystem;
    use crate::workspace::domain::BranchName;
    use crate::workspace::tests::support::{ManualClock, epoch};
    use rstest::{fixture, rstest};
    use std::time::Duration;

    type TestSystem = SimulatedReviewSystem<InMemoryReviewSystem, ManualClock>;

    fn repo() -> RepositoryFullName {
        RepositoryFullName::new("acme/widgets").expect("valid repository")
    }

    fn author() -> ReviewerLogin {
        ReviewerLogin::new("octo").expect("valid login")
    }

    fn new_request(branch: &str) -> NewReviewRequest {
        NewReviewRequest {
            title: "feat: widgets".to_owned(),
            body: "More widgets".to_owned(),
            source_branch: BranchName::new(branch).expect("valid branch"),
            target_branch: BranchName::new("main").expect("valid branch"),
            draft: true,
        }
    }

    #[fixture]
    fn real() -> InMemoryReviewSystem {
        InMemoryReviewSystem::new(author())
    }

    fn simulated(real: InMemoryReviewSystem, clock: &Arc<ManualClock>) -> TestSystem {
        SimulatedReviewSystem::new(
            real,
            SimulatedReviewStore::new(90000),
            author(),
            Arc::clone(clock),
        )
    }

    #[rstest]
    #[tokio::test]
    async fn created_requests_count_up_from_the_base(real: InMemoryReviewSystem) {
        let system = simulated(real, &Arc::default());

        let first = system
            .create(&repo(), &new_request("feat/a"))
            .await
            .expect("first create");
        let second = system
            .create(&repo(), &new_request("feat/b"))
            .await
            .expect("second create");

        assert_eq!(first.number().value(), 90000);
        assert_eq!(second.number().value(), 90001);
        assert!(first.is_draft());
    }

    #[rstest]
    #[tokio::test]
    async fn writes_never_reach_the_wrapped_system(real: InMemoryReviewSystem) {
        let system = simulated(real.clone(), &Arc::default());

        system
            .create(&repo(), &new_request("feat/a"))
            .await
            .expect("create");

        assert!(real.list_open(&repo()).await.expect("real listing").is_empty());
        let listed = system.list_open(&repo()).await.expect("simulated listing");
        assert_eq!(listed.len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn closing_a_real_request_hides_it_from_later_listings(real: InMemoryReviewSystem) {
        let existing = real
            .create(&repo(), &new_request("feat/real"))
            .await
            .expect("seed real request");
        let system = simulated(real.clone(), &Arc::default());

        system
            .close(&repo(), existing.number())
            .await
            .expect("simulated close");

        assert!(system.list_open(&repo()).await.expect("listing").is_empty());
        let still_open = real.find(&repo(), existing.number()).await.expect("find");
        assert_eq!(
            still_open.map(|request| request.state()),
            Some(ReviewState::Open)
        );
    }

    #[rstest]
    #[tokio::test]
    async fn updates_apply_to_simulated_requests(real: InMemoryReviewSystem) {
        let system = simulated(real, &Arc::default());
        let created = system
            .create(&repo(), &new_request("feat/a"))
            .await
            .expect("create");

        let updated = system
            .update(
                &repo(),
                created.number(),
                &ReviewRequestUpdate::default()
                    .with_title("feat: better widgets")
                    .with_draft(false),
            )
            .await
            .expect("update");

        assert_eq!(updated.title(), "feat: better widgets");
        assert!(!updated.is_draft());
        let stored = system
            .store()
            .created_requests(&repo())
            .expect("store listing");
        assert_eq!(stored, vec![updated]);
    }

    #[rstest]
    #[tokio::test]
    async fn closing_an_unknown_request_is_not_found(real: InMemoryReviewSystem) {
        let system = simulated(real, &Arc::default());
        let number = ReviewRequestNumber::new(7).expect("valid number");

        let result = system.close(&repo(), number).await;

        assert!(matches!(result, Err(ReviewSystemError::NotFound { .. })));
    }

    #[rstest]
    #[tokio::test]
    async fn simulated_writes_use_the_injected_clock(real: InMemoryReviewSystem) {
        let clock = Arc::new(ManualClock::default());
        let system = simulated(real, &clock);

        let created = system
            .create(&repo(), &new_request("feat/a"))
            .await
            .expect("create");
        assert_eq!(created.created_at(), epoch());
        assert_eq!(created.updated_at(), epoch());

        clock.advance(Duration::from_secs(90));
        system
            .close(&repo(), created.number())
            .await
            .expect("close");

        let closed = system
            .find(&repo(), created.number())
            .await
            .expect("find")
            .expect("closed request is still stored");
        assert_eq!(closed.state(), ReviewState::Closed);
        assert_eq!(closed.created_at(), epoch());
        assert_eq!(closed.updated_at(), clock.utc());
    }
}
