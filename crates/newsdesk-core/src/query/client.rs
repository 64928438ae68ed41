//! Shared query cache with stale-while-revalidate and in-flight de-duplication.
//!
//! Every key has at most one fetch running at a time. Callers arriving while a
//! fetch is running join it instead of starting another one, and every fetch runs
//! on its own spawned task so it completes even if all callers went away.
//!
//! # Staleness
//!
//! An entry is fresh while `age <= stale_time`. A fresh entry is served without
//! fetching. A stale entry is served immediately and one background refetch is
//! started; when it succeeds the entry is replaced, when it fails the stale data
//! is kept.

use super::key::QueryKey;
use super::observer::QueryObserver;
use super::state::{QueryError, QueryState};
use crate::cancel::CancellationToken;
use crate::config::QueryConfig;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use mini_moka::sync::{Cache, ConcurrentCacheExt};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Configuration for a [`QueryClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryClientConfig {
    /// How long a fetched result counts as fresh.
    pub stale_time: Duration,
    /// How long an entry may go unread before it is dropped.
    ///
    /// Measured on the wall clock, not tokio's clock, so pausing or advancing
    /// tokio time does not collect entries.
    pub gc_time: Duration,
    /// Upper bound on cached entries; beyond it the least useful are evicted.
    pub max_entries: u64,
}

impl Default for QueryClientConfig {
    fn default() -> Self {
        Self {
            stale_time: QueryConfig::STALE_TIME,
            gc_time: QueryConfig::GC_TIME,
            max_entries: QueryConfig::MAX_ENTRIES,
        }
    }
}

impl QueryClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    pub fn with_gc_time(mut self, gc_time: Duration) -> Self {
        self.gc_time = gc_time;
        self
    }

    pub fn with_max_entries(mut self, max_entries: u64) -> Self {
        self.max_entries = max_entries;
        self
    }
}

type FetchOutcome = Result<Value, QueryError>;
type InFlight = Shared<BoxFuture<'static, FetchOutcome>>;

#[derive(Debug, Clone)]
struct CachedQuery {
    data: Value,
    updated_at: Instant,
    invalidated: bool,
}

/// Result of looking a key up, with any fetch it had to join or start.
enum Lookup {
    Fresh(Value),
    Stale(Value, InFlight),
    Missing(InFlight),
}

struct ClientInner {
    config: QueryClientConfig,
    entries: Cache<QueryKey, CachedQuery>,
    in_flight: Mutex<HashMap<QueryKey, InFlight>>,
    fetches: AtomicU64,
}

impl ClientInner {
    fn lock_in_flight(&self) -> MutexGuard<'_, HashMap<QueryKey, InFlight>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_stale(&self, entry: &CachedQuery) -> bool {
        entry.invalidated || entry.updated_at.elapsed() > self.config.stale_time
    }

    fn complete(&self, key: &QueryKey, outcome: &FetchOutcome) {
        let mut in_flight = self.lock_in_flight();
        match outcome {
            Ok(data) => {
                self.entries.insert(
                    key.clone(),
                    CachedQuery {
                        data: data.clone(),
                        updated_at: Instant::now(),
                        invalidated: false,
                    },
                );
            }
            Err(err) => warn!("Query {} failed: {}", key, err),
        }
        in_flight.remove(key);
    }
}

/// Handle to a query cache. Clones share the same cache.
#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<ClientInner>,
}

impl fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryClient")
            .field("config", &self.inner.config)
            .field("fetches", &self.fetch_count())
            .finish()
    }
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new(QueryClientConfig::default())
    }
}

impl QueryClient {
    pub fn new(config: QueryClientConfig) -> Self {
        let entries = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_idle(config.gc_time)
            .build();

        Self {
            inner: Arc::new(ClientInner {
                config,
                entries,
                in_flight: Mutex::new(HashMap::new()),
                fetches: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &QueryClientConfig {
        &self.inner.config
    }

    /// Whether two handles refer to the same cache.
    pub fn ptr_eq(a: &QueryClient, b: &QueryClient) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// Number of fetches started since the client was created.
    pub fn fetch_count(&self) -> u64 {
        self.inner.fetches.load(Ordering::SeqCst)
    }

    /// Whether a fetch for `key` is currently running.
    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.inner.lock_in_flight().contains_key(key)
    }

    /// Fetch through the cache.
    ///
    /// Returns cached data when present (fresh or stale), otherwise waits for the
    /// single in-flight fetch of `key`. `fetcher` is only called when this call is
    /// the one that starts a fetch.
    pub async fn fetch_query<F, Fut>(&self, key: QueryKey, fetcher: F) -> QueryState<Value>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Value, QueryError>> + Send + 'static,
    {
        match self.lookup(&key, fetcher) {
            Lookup::Fresh(data) => {
                debug!("Query {} served from cache", key);
                QueryState::Success {
                    data,
                    is_stale: false,
                }
            }
            Lookup::Stale(data, _refetch) => {
                debug!("Query {} is stale; refetching in background", key);
                QueryState::Success {
                    data,
                    is_stale: true,
                }
            }
            Lookup::Missing(fetch) => match fetch.await {
                Ok(data) => QueryState::Success {
                    data,
                    is_stale: false,
                },
                Err(err) => QueryState::Error(err),
            },
        }
    }

    /// [`fetch_query`](Self::fetch_query) with the data deserialized into `T`.
    pub async fn fetch_typed<T, F, Fut>(&self, key: QueryKey, fetcher: F) -> QueryState<T>
    where
        T: DeserializeOwned,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Value, QueryError>> + Send + 'static,
    {
        self.fetch_query(key, fetcher).await.decode()
    }

    /// Mount an observer on `key`.
    ///
    /// The observer starts with the cached data or `Loading` and receives the
    /// outcome of any fetch this triggers. Dropping the observer discards that
    /// outcome; the fetch still completes and fills the cache.
    pub fn observe<F, Fut>(&self, key: QueryKey, fetcher: F) -> QueryObserver
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Value, QueryError>> + Send + 'static,
    {
        let (initial, pending, had_data) = match self.lookup(&key, fetcher) {
            Lookup::Fresh(data) => (
                QueryState::Success {
                    data,
                    is_stale: false,
                },
                None,
                true,
            ),
            Lookup::Stale(data, fetch) => (
                QueryState::Success {
                    data,
                    is_stale: true,
                },
                Some(fetch),
                true,
            ),
            Lookup::Missing(fetch) => (QueryState::Loading, Some(fetch), false),
        };

        let (tx, rx) = watch::channel(initial);
        let token = CancellationToken::new();

        if let Some(fetch) = pending {
            let token = token.clone();
            let task_key = key.clone();
            tokio::spawn(async move {
                let outcome = fetch.await;
                if token.check().is_err() {
                    debug!("Observer of {} unmounted; discarding result", task_key);
                    return;
                }
                let state = match outcome {
                    Ok(data) => QueryState::Success {
                        data,
                        is_stale: false,
                    },
                    // Keep showing the stale data.
                    Err(_) if had_data => return,
                    Err(err) => QueryState::Error(err),
                };
                let _ = tx.send(state);
            });
        }

        QueryObserver::new(key, rx, token)
    }

    /// Number of cached entries, after pending evictions have run.
    pub fn entry_count(&self) -> u64 {
        self.inner.entries.sync();
        self.inner.entries.entry_count()
    }

    pub fn get_query_data(&self, key: &QueryKey) -> Option<Value> {
        self.inner.entries.get(key).map(|entry| entry.data)
    }

    /// Store data for `key` as if it had just been fetched.
    pub fn set_query_data(&self, key: QueryKey, data: Value) {
        let _in_flight = self.inner.lock_in_flight();
        self.inner.entries.insert(
            key,
            CachedQuery {
                data,
                updated_at: Instant::now(),
                invalidated: false,
            },
        );
    }

    /// Mark `key` stale so the next read refetches. Returns false if not cached.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        let _in_flight = self.inner.lock_in_flight();
        match self.inner.entries.get(key) {
            Some(mut entry) => {
                entry.invalidated = true;
                self.inner.entries.insert(key.clone(), entry);
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, key: &QueryKey) {
        let _in_flight = self.inner.lock_in_flight();
        self.inner.entries.invalidate(key);
    }

    pub fn clear(&self) {
        let _in_flight = self.inner.lock_in_flight();
        self.inner.entries.invalidate_all();
    }

    fn lookup<F, Fut>(&self, key: &QueryKey, fetcher: F) -> Lookup
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Value, QueryError>> + Send + 'static,
    {
        let mut in_flight = self.inner.lock_in_flight();
        match self.inner.entries.get(key) {
            Some(entry) if !self.inner.is_stale(&entry) => Lookup::Fresh(entry.data),
            Some(entry) => {
                let fetch = self.join_or_start(&mut in_flight, key, fetcher);
                Lookup::Stale(entry.data, fetch)
            }
            None => Lookup::Missing(self.join_or_start(&mut in_flight, key, fetcher)),
        }
    }

    fn join_or_start<F, Fut>(
        &self,
        in_flight: &mut HashMap<QueryKey, InFlight>,
        key: &QueryKey,
        fetcher: F,
    ) -> InFlight
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Value, QueryError>> + Send + 'static,
    {
        if let Some(fetch) = in_flight.get(key) {
            debug!("Joining in-flight fetch of {}", key);
            return fetch.clone();
        }

        let weak: Weak<ClientInner> = Arc::downgrade(&self.inner);
        let task_key = key.clone();
        let fetch = async move {
            let outcome = AssertUnwindSafe(async move { fetcher().await })
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(QueryError::new("Query fetcher panicked")));
            if let Some(inner) = weak.upgrade() {
                inner.complete(&task_key, &outcome);
            }
            outcome
        }
        .boxed()
        .shared();

        in_flight.insert(key.clone(), fetch.clone());
        self.inner.fetches.fetch_add(1, Ordering::SeqCst);
        debug!("Started fetch of {}", key);

        // Drive the fetch independently of whoever awaits it.
        tokio::spawn(fetch.clone());
        fetch
    }
}
