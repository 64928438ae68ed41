//! Per-session owner of the query cache.

use super::client::{QueryClient, QueryClientConfig};
use std::sync::OnceLock;
use tracing::debug;

/// Lazily creates one [`QueryClient`] and hands out that same instance for as
/// long as the provider lives.
///
/// Create one provider per session and pass it to whatever needs to fetch;
/// separate providers never share cached data.
#[derive(Debug, Default)]
pub struct QueryProvider {
    config: QueryClientConfig,
    client: OnceLock<QueryClient>,
}

impl QueryProvider {
    pub fn new(config: QueryClientConfig) -> Self {
        Self {
            config,
            client: OnceLock::new(),
        }
    }

    /// The session's query client, created on first use.
    pub fn client(&self) -> &QueryClient {
        self.client.get_or_init(|| {
            debug!(
                "Creating query client (stale time {:?})",
                self.config.stale_time
            );
            QueryClient::new(self.config.clone())
        })
    }

    pub fn is_initialized(&self) -> bool {
        self.client.get().is_some()
    }
}
