//! Stale-while-revalidate cache with per-key refresh de-duplication.
//!
//! Each key holds at most one payload and at most one in-flight refresh.
//! Fresh payloads are served directly and have their expiry slid forward.
//! Stale payloads are served immediately while a background refresh runs.
//! Missing payloads block on a refresh. Every caller that arrives while a
//! refresh is running joins that refresh rather than starting another.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use mockable::Clock;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

/// Capacity of the cache event channel before slow subscribers lag.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors surfaced by [`RevalidatingCache`].
///
/// Cloneable so one refresh outcome can be handed to every joined caller.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// The refresher failed.
    #[error("cache refresh failed: {0}")]
    Refresh(Arc<dyn std::error::Error + Send + Sync>),

    /// The refresh task stopped before producing a value.
    #[error("cache refresh task aborted: {0}")]
    Aborted(String),

    /// The cache state lock was poisoned by a panicking holder.
    #[error("cache state lock poisoned")]
    Poisoned,
}

impl CacheError {
    /// Wraps a refresher error.
    pub fn refresh(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Refresh(Arc::new(err))
    }
}

/// Produces a fresh payload for a cache key.
#[async_trait]
pub trait CacheRefresher<K, T>: Send + Sync
where
    K: Send + Sync,
{
    /// Computes the current payload for `key`.
    async fn refresh(&self, key: &K) -> CacheResult<T>;
}

/// Observable cache lifecycle events.
#[derive(Debug, Clone)]
pub enum CacheEvent<K> {
    /// A refresh started for the key.
    RefreshStarted(K),
    /// A refresh stored a new payload.
    Refreshed(K),
    /// A refresh failed.
    RefreshFailed {
        /// Key being refreshed.
        key: K,
        /// Whether a previous payload remains available.
        served_stale: bool,
        /// Failure reported by the refresher.
        error: CacheError,
    },
    /// The key's payload was dropped.
    Invalidated(K),
}

type SharedRefresh<T> = Shared<BoxFuture<'static, CacheResult<Arc<T>>>>;

#[derive(Debug)]
struct CacheEntry<T> {
    payload: Arc<T>,
    stored_at: DateTime<Utc>,
    last_interaction: DateTime<Utc>,
}

struct CacheSlot<T> {
    entry: Option<CacheEntry<T>>,
    in_flight: Option<SharedRefresh<T>>,
}

impl<T> Default for CacheSlot<T> {
    fn default() -> Self {
        Self {
            entry: None,
            in_flight: None,
        }
    }
}

enum Lookup<T> {
    Fresh(Arc<T>),
    Stale(Arc<T>),
    Join {
        refresh: SharedRefresh<T>,
        stale: Option<Arc<T>>,
    },
}

struct CacheInner<K, T, R, C> {
    refresher: Arc<R>,
    clock: Arc<C>,
    ttl: TimeDelta,
    slots: Mutex<HashMap<K, CacheSlot<T>>>,
    events: broadcast::Sender<CacheEvent<K>>,
}

/// Per-key stale-while-revalidate cache.
///
/// Expiry slides: every fresh hit moves the entry's last interaction to
/// now, so a key in continuous use stays fresh.
pub struct RevalidatingCache<K, T, R, C> {
    inner: Arc<CacheInner<K, T, R, C>>,
}

impl<K, T, R, C> Clone for RevalidatingCache<K, T, R, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, T, R, C> CacheInner<K, T, R, C>
where
    K: Clone + Eq + Hash + std::fmt::Debug + Send + Sync + 'static,
    T: Send + Sync + 'static,
    R: CacheRefresher<K, T> + 'static,
    C: Clock + Send + Sync + 'static,
{
    fn lock(&self) -> CacheResult<MutexGuard<'_, HashMap<K, CacheSlot<T>>>> {
        self.slots.lock().map_err(|_| CacheError::Poisoned)
    }

    fn emit(&self, event: CacheEvent<K>) {
        if self.events.send(event).is_err() {
            trace!("cache event dropped without subscribers");
        }
    }

    fn is_fresh(&self, entry: &CacheEntry<T>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(entry.last_interaction) < self.ttl
    }

    /// Returns the key's running refresh, starting one if none is running.
    ///
    /// Must be called with the slot lock held so at most one refresh per key
    /// is ever started.
    fn ensure_refresh(self: &Arc<Self>, slot: &mut CacheSlot<T>, key: &K) -> SharedRefresh<T> {
        if let Some(running) = &slot.in_flight {
            return running.clone();
        }
        debug!(key = ?key, "starting cache refresh");
        self.emit(CacheEvent::RefreshStarted(key.clone()));
        let task = tokio::spawn(Arc::clone(self).run_refresh(key.clone()));
        let inner = Arc::clone(self);
        let owned_key = key.clone();
        let refresh = async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(err) => inner.complete(&owned_key, Err(CacheError::Aborted(err.to_string()))),
            }
        }
        .boxed()
        .shared();
        slot.in_flight = Some(refresh.clone());
        refresh
    }

    async fn run_refresh(self: Arc<Self>, key: K) -> CacheResult<Arc<T>> {
        let outcome = self.refresher.refresh(&key).await;
        self.complete(&key, outcome)
    }

    /// Clears the in-flight marker and swaps in the refreshed payload.
    ///
    /// A failed refresh leaves any previous payload in place.
    fn complete(&self, key: &K, outcome: CacheResult<T>) -> CacheResult<Arc<T>> {
        let now = self.clock.utc();
        let mut slots = self.lock()?;
        let slot = slots.entry(key.clone()).or_default();
        slot.in_flight = None;
        match outcome {
            Ok(value) => {
                let payload = Arc::new(value);
                slot.entry = Some(CacheEntry {
                    payload: Arc::clone(&payload),
                    stored_at: now,
                    last_interaction: now,
                });
                drop(slots);
                self.emit(CacheEvent::Refreshed(key.clone()));
                Ok(payload)
            }
            Err(error) => {
                let served_stale = slot.entry.is_some();
                drop(slots);
                warn!(key = ?key, served_stale, error = %error, "cache refresh failed");
                self.emit(CacheEvent::RefreshFailed {
                    key: key.clone(),
                    served_stale,
                    error: error.clone(),
                });
                Err(error)
            }
        }
    }
}

impl<K, T, R, C> RevalidatingCache<K, T, R, C>
where
    K: Clone + Eq + Hash + std::fmt::Debug + Send + Sync + 'static,
    T: Send + Sync + 'static,
    R: CacheRefresher<K, T> + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates an empty cache whose entries stay fresh for `ttl` after the
    /// last interaction.
    #[must_use]
    pub fn new(refresher: Arc<R>, clock: Arc<C>, ttl: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(CacheInner {
                refresher,
                clock,
                ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
                slots: Mutex::new(HashMap::new()),
                events,
            }),
        }
    }

    /// Subscribes to cache lifecycle events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent<K>> {
        self.inner.events.subscribe()
    }

    /// Returns the payload for `key`.
    ///
    /// Fresh payloads return immediately. Stale payloads return immediately
    /// and trigger a background refresh. When a refresh is already running
    /// the call joins it, falling back to the stale payload if it fails.
    /// Missing payloads block on a refresh.
    ///
    /// # Errors
    ///
    /// Returns the refresh error when no payload is available, or
    /// [`CacheError::Poisoned`] when the state lock is poisoned.
    pub async fn get(&self, key: &K) -> CacheResult<Arc<T>> {
        let now = self.inner.clock.utc();
        let lookup = {
            let mut slots = self.inner.lock()?;
            let slot = slots.entry(key.clone()).or_default();
            self.lookup(slot, key, now)
        };
        match lookup {
            Lookup::Fresh(payload) | Lookup::Stale(payload) => Ok(payload),
            Lookup::Join { refresh, stale } => match (refresh.await, stale) {
                (Ok(payload), _) => Ok(payload),
                (Err(_), Some(stale)) => Ok(stale),
                (Err(err), None) => Err(err),
            },
        }
    }

    fn lookup(&self, slot: &mut CacheSlot<T>, key: &K, now: DateTime<Utc>) -> Lookup<T> {
        if let Some(entry) = slot.entry.as_mut() {
            if self.inner.is_fresh(entry, now) {
                entry.last_interaction = now;
                return Lookup::Fresh(Arc::clone(&entry.payload));
            }
        }
        let stale = slot
            .entry
            .as_ref()
            .map(|entry| Arc::clone(&entry.payload));
        if let Some(refresh) = slot.in_flight.clone() {
            return Lookup::Join { refresh, stale };
        }
        let refresh = self.inner.ensure_refresh(slot, key);
        match stale {
            Some(payload) => {
                debug!(key = ?key, "serving stale payload while refreshing");
                Lookup::Stale(payload)
            }
            None => Lookup::Join {
                refresh,
                stale: None,
            },
        }
    }

    /// Forces a refresh and waits for it, joining one already running.
    ///
    /// # Errors
    ///
    /// Returns the refresh error, or [`CacheError::Poisoned`] when the state
    /// lock is poisoned.
    pub async fn refresh(&self, key: &K) -> CacheResult<Arc<T>> {
        let refresh = {
            let mut slots = self.inner.lock()?;
            let slot = slots.entry(key.clone()).or_default();
            self.inner.ensure_refresh(slot, key)
        };
        refresh.await
    }

    /// Drops the payload for `key` and waits for a fresh one.
    ///
    /// # Errors
    ///
    /// Returns the refresh error, or [`CacheError::Poisoned`] when the state
    /// lock is poisoned.
    pub async fn invalidate(&self, key: &K) -> CacheResult<Arc<T>> {
        let refresh = {
            let mut slots = self.inner.lock()?;
            let slot = slots.entry(key.clone()).or_default();
            slot.entry = None;
            self.inner.emit(CacheEvent::Invalidated(key.clone()));
            self.inner.ensure_refresh(slot, key)
        };
        refresh.await
    }

    /// Returns the cached payload without refreshing or sliding its expiry.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Poisoned`] when the state lock is poisoned.
    pub fn peek(&self, key: &K) -> CacheResult<Option<Arc<T>>> {
        let slots = self.inner.lock()?;
        Ok(slots
            .get(key)
            .and_then(|slot| slot.entry.as_ref())
            .map(|entry| Arc::clone(&entry.payload)))
    }

    /// Returns when the payload for `key` was stored.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Poisoned`] when the state lock is poisoned.
    pub fn stored_at(&self, key: &K) -> CacheResult<Option<DateTime<Utc>>> {
        let slots = self.inner.lock()?;
        Ok(slots
            .get(key)
            .and_then(|slot| slot.entry.as_ref())
            .map(|entry| entry.stored_at))
    }
}
