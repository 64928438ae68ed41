//! Mounted query subscriptions.

use super::key::QueryKey;
use super::state::QueryState;
use crate::cancel::CancellationToken;
use serde_json::Value;
use tokio::sync::watch;

/// A consumer's view of one query.
///
/// Created by [`QueryClient::observe`](super::QueryClient::observe). Dropping the
/// observer unmounts it: a fetch still running for it finishes and fills the
/// cache, but its outcome is no longer delivered.
#[derive(Debug)]
pub struct QueryObserver {
    key: QueryKey,
    rx: watch::Receiver<QueryState<Value>>,
    token: CancellationToken,
}

impl QueryObserver {
    pub(crate) fn new(
        key: QueryKey,
        rx: watch::Receiver<QueryState<Value>>,
        token: CancellationToken,
    ) -> Self {
        Self { key, rx, token }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Current state.
    pub fn state(&self) -> QueryState<Value> {
        self.rx.borrow().clone()
    }

    /// Wait for the next update. `None` once no further update will arrive.
    pub async fn changed(&mut self) -> Option<QueryState<Value>> {
        match self.rx.changed().await {
            Ok(()) => Some(self.rx.borrow_and_update().clone()),
            Err(_) => None,
        }
    }

    /// Wait until the fetch serving this observer (if any) has finished and
    /// return the final state.
    pub async fn settled(&mut self) -> QueryState<Value> {
        while self.rx.changed().await.is_ok() {}
        self.state()
    }

    /// Unmount explicitly. Equivalent to dropping the observer.
    pub fn unmount(self) {}
}

impl Drop for QueryObserver {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::super::{QueryClient, QueryError};
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_observer_goes_from_loading_to_success() {
        let client = QueryClient::default();
        let mut observer = client.observe(QueryKey::from_parts(["feed"]), || async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(json!(["headline"]))
        });

        assert!(observer.state().is_loading());
        let state = observer.settled().await;
        assert_eq!(
            state,
            QueryState::Success {
                data: json!(["headline"]),
                is_stale: false
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_observer_reports_error() {
        let client = QueryClient::default();
        let mut observer = client.observe(QueryKey::from_parts(["feed"]), || async {
            Err(QueryError::new("boom"))
        });

        assert_eq!(
            observer.changed().await,
            Some(QueryState::Error(QueryError::new("boom")))
        );
        assert_eq!(observer.changed().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cached_data_is_initial_state_without_fetch() {
        let client = QueryClient::default();
        let key = QueryKey::from_parts(["feed"]);
        client.set_query_data(key.clone(), json!(7));

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut observer = client.observe(key, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(json!(8))
        });

        assert_eq!(observer.state().data(), Some(&json!(7)));
        assert_eq!(observer.settled().await.data(), Some(&json!(7)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmounted_observer_discards_result_but_cache_fills() {
        let client = QueryClient::default();
        let key = QueryKey::from_parts(["feed"]);

        let observer = client.observe(key.clone(), || async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok(json!("late"))
        });
        let token = observer.token.clone();
        observer.unmount();
        assert!(token.is_cancelled());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(client.get_query_data(&key), Some(json!("late")));
        assert!(!client.is_fetching(&key));
    }

    #[tokio::test(start_paused = true)]
    async fn test_observers_share_fetch_with_fetch_query() {
        let client = QueryClient::default();
        let key = QueryKey::from_parts(["feed"]);
        let calls = Arc::new(AtomicUsize::new(0));

        let make_fetcher = |calls: Arc<AtomicUsize>| {
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(json!("shared"))
            }
        };

        let mut first = client.observe(key.clone(), make_fetcher(calls.clone()));
        let mut second = client.observe(key.clone(), make_fetcher(calls.clone()));
        let direct = client.fetch_query(key, make_fetcher(calls.clone())).await;

        assert_eq!(direct.data(), Some(&json!("shared")));
        assert_eq!(first.settled().await.data(), Some(&json!("shared")));
        assert_eq!(second.settled().await.data(), Some(&json!("shared")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
