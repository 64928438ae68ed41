//! Newsdesk Core - data fetching, procedure routing and page composition.
//!
//! This crate has no HTTP server of its own. It provides:
//!
//! - [`query`]: the per-session query cache (stale-while-revalidate, de-duplicated
//!   fetches, observers that can unmount)
//! - [`rpc`]: a procedure router, the HTTP wire protocol it speaks, and a client
//! - [`shell`]: the page shell that threads search state into page content
//! - [`session`]: a client session tying a query cache to an RPC endpoint
//!
//! The `newsdesk-rpc` crate mounts the router behind an HTTP endpoint.
//!
//! # Example
//!
//! ```rust,ignore
//! use newsdesk_core::{ClientSession, QueryClientConfig, RpcClient};
//!
//! let session = ClientSession::new(RpcClient::new("http://127.0.0.1:3000")?, QueryClientConfig::default());
//! let mut feed = session.use_query("news.list", serde_json::Value::Null);
//! let state = feed.settled().await;
//! ```

pub mod cancel;
pub mod config;
pub mod error;
pub mod models;
pub mod query;
pub mod rpc;
pub mod session;
pub mod shell;

// Re-export commonly used types
pub use cancel::{CancellationToken, CancelledError};
pub use error::{NewsdeskError, Result};
pub use query::{
    QueryClient, QueryClientConfig, QueryError, QueryKey, QueryObserver, QueryProvider, QueryState,
};
pub use rpc::{
    fetch_request_handler, ContextFactory, EmptyContext, FetchHandlerOptions, ProcedureKind,
    ProcedureRouter, RpcClient, RpcError, RpcErrorCode,
};
pub use session::ClientSession;
pub use shell::{ContentProps, Node, PageShell, ShellContent};
