//! Centralized configuration for Newsdesk.
//!
//! Constants for the query cache, the RPC bridge, the HTTP fetch layer and the
//! page shell chrome.

use std::time::Duration;

/// Application-level configuration.
pub struct AppConfig;

impl AppConfig {
    pub const APP_NAME: &'static str = "Newsdesk";
    pub const USER_AGENT: &'static str = "Newsdesk/0.1";
}

/// Query cache defaults.
pub struct QueryConfig;

impl QueryConfig {
    /// Entries younger than this are served without refetching.
    pub const STALE_TIME: Duration = Duration::from_millis(5000);
    /// Entries not read for this long are dropped from the cache.
    pub const GC_TIME: Duration = Duration::from_secs(300);
    pub const MAX_ENTRIES: u64 = 1000;
}

/// Server request bridge settings.
pub struct BridgeConfig;

impl BridgeConfig {
    pub const DEFAULT_ENDPOINT: &'static str = "/api/rpc";
    pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024; // 2MB
    pub const MAX_BATCH_SIZE: usize = 32;
}

/// Network-related configuration for the client fetch layer.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
}

/// Page shell chrome dimensions.
pub struct ShellConfig;

impl ShellConfig {
    pub const SIDEBAR_WIDTH_PX: u32 = 50;
    pub const SIDEBAR_WIDTH_LG_PX: u32 = 70;
    pub const SEARCH_PLACEHOLDER: &'static str = "Search news";
}
