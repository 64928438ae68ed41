//! `{endpoint}/*` server route.

use crate::bridge::RpcBridge;
use crate::server::AppState;
use axum::Router;
use newsdesk_core::{EmptyContext, FetchHandlerOptions};

pub fn routes(state: &AppState) -> Router {
    let options: FetchHandlerOptions<EmptyContext> =
        FetchHandlerOptions::new(state.config.endpoint_prefix(), state.router.clone());
    RpcBridge::new(options).into_router()
}
