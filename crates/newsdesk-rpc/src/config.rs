//! Server configuration.

use newsdesk_core::config::BridgeConfig;
use newsdesk_core::{NewsdeskError, QueryClientConfig, Result};

/// Which page the root route (`/`) renders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum HomeVariant {
    /// Searchable news feed.
    #[default]
    News,
    /// Static landing page.
    Landing,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    /// 0 lets the OS pick a port.
    pub port: u16,
    /// Path prefix of the RPC bridge.
    pub endpoint: String,
    /// Cache settings for server-rendered pages.
    pub query: QueryClientConfig,
    pub home: HomeVariant,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            endpoint: BridgeConfig::DEFAULT_ENDPOINT.to_string(),
            query: QueryClientConfig::default(),
            home: HomeVariant::default(),
        }
    }
}

impl ServerConfig {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_home(mut self, home: HomeVariant) -> Self {
        self.home = home;
        self
    }

    pub fn with_query(mut self, query: QueryClientConfig) -> Self {
        self.query = query;
        self
    }

    /// Check the endpoint is an absolute, non-root path.
    pub fn validate(&self) -> Result<()> {
        let trimmed = self.endpoint.trim_end_matches('/');
        if !self.endpoint.starts_with('/') || trimmed.is_empty() {
            return Err(NewsdeskError::Config {
                message: format!(
                    "RPC endpoint must be an absolute path below /, got {:?}",
                    self.endpoint
                ),
            });
        }
        if trimmed.contains('*') || trimmed.contains(':') {
            return Err(NewsdeskError::Config {
                message: format!("RPC endpoint may not contain route wildcards: {}", self.endpoint),
            });
        }
        Ok(())
    }

    /// Endpoint without a trailing slash.
    pub fn endpoint_prefix(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }
}
