//! Newsdesk RPC - HTTP server for the Newsdesk procedures and pages.
//!
//! Mounts the procedure router from `newsdesk-core` behind an HTTP endpoint
//! (default `/api/rpc`) and server-renders the root page.

pub mod app_router;
pub mod bridge;
pub mod config;
pub mod routes;
pub mod server;

pub use bridge::RpcBridge;
pub use config::{HomeVariant, ServerConfig};
pub use server::{build_app, start_server, AppState};
