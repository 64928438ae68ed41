//! Procedure router and its HTTP wire protocol.
//!
//! - [`router`] - procedure registry and in-process caller
//! - [`handler`] - HTTP request to procedure call adapter
//! - [`envelope`] - JSON response envelopes
//! - [`client`] - HTTP client speaking the same protocol

pub mod client;
pub mod envelope;
pub mod error;
pub mod handler;
pub mod router;

pub use client::RpcClient;
pub use envelope::ResponseEnvelope;
pub use error::{RpcError, RpcErrorCode};
pub use handler::{
    default_context, fetch_request_handler, single_response, ContextFactory, FetchHandlerOptions,
};
pub use router::{EmptyContext, ProcedureKind, ProcedureRouter};
