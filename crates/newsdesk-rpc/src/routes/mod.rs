//! Route registration.
//!
//! - [`index`] - the root page
//! - [`api::rpc`] - the RPC bridge under the configured endpoint

pub mod api;
pub mod index;

use crate::server::{handle_health, AppState};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;

/// Mount every route.
pub fn register(state: Arc<AppState>) -> Router {
    let pages = Router::new()
        .route("/", get(index::home))
        .route("/health", get(handle_health))
        .with_state(state.clone());

    pages.merge(api::rpc::routes(&state))
}
