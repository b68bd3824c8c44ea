//! In-memory review system.

use crate::workspace::{
    domain::{
        NewReviewRequest, RepositoryFullName, ReviewRequest, ReviewRequestData,
        ReviewRequestNumber, ReviewRequestUpdate, ReviewState, ReviewerLogin,
    },
    ports::{ReviewSystemError, ReviewSystemPort, ReviewSystemResult},
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, RwLock};

/// In-memory review system keyed by repository.
///
/// Requests are returned in insertion order. Every `list_open` call is
/// counted per repository so tests can assert on bulk fetching.
#[derive(Debug, Clone)]
pub struct InMemoryReviewSystem {
    author: ReviewerLogin,
    state: Arc<RwLock<ReviewSystemState>>,
}

#[derive(Debug, Default)]
struct ReviewSystemState {
    requests: BTreeMap<RepositoryFullName, Vec<ReviewRequest>>,
    last_number: u64,
    list_open_calls: HashMap<RepositoryFullName, usize>,
    failing_repositories: HashSet<RepositoryFullName>,
    write_failure: Option<String>,
}

impl ReviewSystemState {
    fn find_mut(
        &mut self,
        repository: &RepositoryFullName,
        number: ReviewRequestNumber,
    ) -> ReviewSystemResult<&mut ReviewRequest> {
        self.requests
            .get_mut(repository)
            .and_then(|requests| {
                requests
                    .iter_mut()
                    .find(|request| request.number() == number)
            })
            .ok_or_else(|| ReviewSystemError::NotFound {
                repository: repository.clone(),
                number,
            })
    }

    fn check_writable(&self) -> ReviewSystemResult<()> {
        match &self.write_failure {
            Some(message) => Err(ReviewSystemError::Rejected(message.clone())),
            None => Ok(()),
        }
    }
}

fn lock_error(err: &impl std::fmt::Display) -> ReviewSystemError {
    ReviewSystemError::runtime(std::io::Error::other(err.to_string()))
}

impl InMemoryReviewSystem {
    /// Creates an empty review system whose created requests are authored
    /// by `author`.
    #[must_use]
    pub fn new(author: ReviewerLogin) -> Self {
        Self {
            author,
            state: Arc::default(),
        }
    }

    /// Seeds an existing request.
    ///
    /// Numbers assigned by later `create` calls continue after the highest
    /// seeded number.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn insert(&self, request: ReviewRequest) -> ReviewSystemResult<()> {
        let mut state = self.state.write().map_err(|err| lock_error(&err))?;
        state.last_number = state.last_number.max(request.number().value());
        state
            .requests
            .entry(request.repository().clone())
            .or_default()
            .push(request);
        Ok(())
    }

    /// Makes listing for a repository fail.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn fail_listing_for(&self, repository: RepositoryFullName) -> ReviewSystemResult<()> {
        self.state
            .write()
            .map_err(|err| lock_error(&err))?
            .failing_repositories
            .insert(repository);
        Ok(())
    }

    /// Makes later create, update and close calls fail.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn fail_writes(&self, message: impl Into<String>) -> ReviewSystemResult<()> {
        self.state
            .write()
            .map_err(|err| lock_error(&err))?
            .write_failure = Some(message.into());
        Ok(())
    }

    /// Returns how often `list_open` was called for a repository.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn list_open_calls(&self, repository: &RepositoryFullName) -> ReviewSystemResult<usize> {
        let state = self.state.read().map_err(|err| lock_error(&err))?;
        Ok(state
            .list_open_calls
            .get(repository)
            .copied()
            .unwrap_or_default())
    }

    /// Returns how often `list_open` was called across all repositories.
    ///
    /// # Errors
    ///
    /// Returns runtime errors when lock acquisition fails.
    pub fn total_list_open_calls(&self) -> ReviewSystemResult<usize> {
        let state = self.state.read().map_err(|err| lock_error(&err))?;
        Ok(state.list_open_calls.values().sum())
    }
}

#[async_trait]
impl ReviewSystemPort for InMemoryReviewSystem {
    async fn list_open(
        &self,
        repository: &RepositoryFullName,
    ) -> ReviewSystemResult<Vec<ReviewRequest>> {
        let mut state = self.state.write().map_err(|err| lock_error(&err))?;
        *state
            .list_open_calls
            .entry(repository.clone())
            .or_default() += 1;
        if state.failing_repositories.contains(repository) {
            return Err(ReviewSystemError::runtime(std::io::Error::other(format!(
                "listing {repository} failed"
            ))));
        }
        Ok(state
            .requests
            .get(repository)
            .map(|requests| {
                requests
                    .iter()
                    .filter(|request| request.state() == ReviewState::Open)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list_authored(
        &self,
        author: &ReviewerLogin,
    ) -> ReviewSystemResult<Vec<ReviewRequest>> {
        let state = self.state.read().map_err(|err| lock_error(&err))?;
        Ok(state
            .requests
            .values()
            .flatten()
            .filter(|request| request.author() == author && request.state() == ReviewState::Open)
            .cloned()
            .collect())
    }

    async fn find(
        &self,
        repository: &RepositoryFullName,
        number: ReviewRequestNumber,
    ) -> ReviewSystemResult<Option<ReviewRequest>> {
        let state = self.state.read().map_err(|err| lock_error(&err))?;
        Ok(state.requests.get(repository).and_then(|requests| {
            requests
                .iter()
                .find(|request| request.number() == number)
                .cloned()
        }))
    }

    async fn create(
        &self,
        repository: &RepositoryFullName,
        request: &NewReviewRequest,
    ) -> ReviewSystemResult<ReviewRequest> {
        let mut state = self.state.write().map_err(|err| lock_error(&err))?;
        state.check_writable()?;
        let next = state.last_number.saturating_add(1);
        let number = ReviewRequestNumber::new(next).map_err(ReviewSystemError::runtime)?;
        let now = Utc::now();
        let created = ReviewRequest::new(ReviewRequestData {
            number,
            title: request.title.clone(),
            body: request.body.clone(),
            source_branch: request.source_branch.clone(),
            target_branch: request.target_branch.clone(),
            repository: repository.clone(),
            state: ReviewState::Open,
            url: format!("https://reviews.invalid/{repository}/pull/{number}"),
            author: self.author.clone(),
            draft: request.draft,
            created_at: now,
            updated_at: now,
        });
        state.last_number = next;
        state
            .requests
            .entry(repository.clone())
            .or_default()
            .push(created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        repository: &RepositoryFullName,
        number: ReviewRequestNumber,
        update: &ReviewRequestUpdate,
    ) -> ReviewSystemResult<ReviewRequest> {
        let mut state = self.state.write().map_err(|err| lock_error(&err))?;
        state.check_writable()?;
        let request = state.find_mut(repository, number)?;
        *request = request.with_update(update, Utc::now());
        Ok(request.clone())
    }

    async fn close(
        &self,
        repository: &RepositoryFullName,
        number: ReviewRequestNumber,
    ) -> ReviewSystemResult<()> {
        let mut state = self.state.write().map_err(|err| lock_error(&err))?;
        state.check_writable()?;
        let request = state.find_mut(repository, number)?;
        *request = request.with_state(ReviewState::Closed, Utc::now());
        Ok(())
    }
}
