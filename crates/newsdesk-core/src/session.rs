//! Client session: one query cache wired to one RPC endpoint.

use crate::query::{
    QueryClient, QueryClientConfig, QueryError, QueryKey, QueryObserver, QueryProvider, QueryState,
};
use crate::rpc::RpcClient;
use crate::Result;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Everything a client needs to fetch through the server.
///
/// Queries go through the session's cache, so repeated and concurrent reads of
/// the same procedure and input share results. Mutations bypass the cache.
#[derive(Debug)]
pub struct ClientSession {
    provider: QueryProvider,
    rpc: Arc<RpcClient>,
}

impl ClientSession {
    pub fn new(rpc: RpcClient, config: QueryClientConfig) -> Self {
        Self {
            provider: QueryProvider::new(config),
            rpc: Arc::new(rpc),
        }
    }

    pub fn query_client(&self) -> &QueryClient {
        self.provider.client()
    }

    /// Mount an observer on a query procedure.
    pub fn use_query(&self, path: &str, input: Value) -> QueryObserver {
        let key = QueryKey::procedure(path, &input);
        self.query_client().observe(key, self.fetcher(path, input))
    }

    /// Fetch a query procedure through the cache and decode its data.
    pub async fn query<T: DeserializeOwned>(&self, path: &str, input: Value) -> QueryState<T> {
        let key = QueryKey::procedure(path, &input);
        self.query_client()
            .fetch_typed(key, self.fetcher(path, input))
            .await
    }

    /// Call a mutation procedure.
    pub async fn mutate(&self, path: &str, input: Value) -> Result<Value> {
        self.rpc.mutation(path, &input).await
    }

    fn fetcher(
        &self,
        path: &str,
        input: Value,
    ) -> impl FnOnce() -> BoxFuture<'static, std::result::Result<Value, QueryError>> {
        let rpc = self.rpc.clone();
        let path = path.to_string();
        move || async move { rpc.query(&path, &input).await.map_err(QueryError::from) }.boxed()
    }
}
