//! Client data-fetch context.
//!
//! - [`QueryProvider`] - one lazily created cache per session
//! - [`QueryClient`] - the cache: de-duplicated fetches, stale-while-revalidate
//! - [`QueryObserver`] - a mounted consumer of one key
//! - [`QueryState`] - loading / error / success

mod client;
mod key;
mod observer;
mod provider;
mod state;

pub use client::{QueryClient, QueryClientConfig};
pub use key::QueryKey;
pub use observer::QueryObserver;
pub use provider::QueryProvider;
pub use state::{QueryError, QueryState};
