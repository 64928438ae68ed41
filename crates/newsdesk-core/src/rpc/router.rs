//! Named procedure registry.
//!
//! Procedures are registered with a dotted path (`news.list`) and a kind. Inputs
//! and outputs are serde types; the router erases them to JSON so one table can
//! hold every procedure.

use super::error::{RpcError, RpcErrorCode};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{error, warn};

/// How a procedure may be reached over HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcedureKind {
    /// Read-only; called with GET.
    Query,
    /// Side-effecting; called with POST.
    Mutation,
}

impl ProcedureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcedureKind::Query => "query",
            ProcedureKind::Mutation => "mutation",
        }
    }

    /// Kind expected for an HTTP method, if the method is supported at all.
    pub fn for_method(method: &http::Method) -> Option<Self> {
        match *method {
            http::Method::GET => Some(ProcedureKind::Query),
            http::Method::POST => Some(ProcedureKind::Mutation),
            _ => None,
        }
    }
}

impl fmt::Display for ProcedureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Context handed to procedures when no request-scoped data is injected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmptyContext;

type ProcedureFn<C> = Arc<dyn Fn(C, Value) -> BoxFuture<'static, Result<Value, RpcError>> + Send + Sync>;

struct Procedure<C> {
    kind: ProcedureKind,
    handler: ProcedureFn<C>,
}

impl<C> Clone for Procedure<C> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            handler: self.handler.clone(),
        }
    }
}

/// Registry mapping procedure paths to handlers.
///
/// # Example
///
/// ```rust,ignore
/// let router = ProcedureRouter::<EmptyContext>::new()
///     .query("echo", |_ctx, input: serde_json::Value| async move { Ok(input) })
///     .merge("news", news_router());
/// ```
pub struct ProcedureRouter<C = EmptyContext> {
    procedures: BTreeMap<String, Procedure<C>>,
}

impl<C> Default for ProcedureRouter<C> {
    fn default() -> Self {
        Self {
            procedures: BTreeMap::new(),
        }
    }
}

impl<C> fmt::Debug for ProcedureRouter<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcedureRouter")
            .field("procedures", &self.procedures.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<C> ProcedureRouter<C>
where
    C: Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a query procedure.
    pub fn query<I, O, F, Fut>(self, path: &str, handler: F) -> Self
    where
        I: DeserializeOwned + Send + 'static,
        O: Serialize + Send + 'static,
        F: Fn(C, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, RpcError>> + Send + 'static,
    {
        self.register(path, ProcedureKind::Query, handler)
    }

    /// Register a mutation procedure.
    pub fn mutation<I, O, F, Fut>(self, path: &str, handler: F) -> Self
    where
        I: DeserializeOwned + Send + 'static,
        O: Serialize + Send + 'static,
        F: Fn(C, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, RpcError>> + Send + 'static,
    {
        self.register(path, ProcedureKind::Mutation, handler)
    }

    /// Nest another router's procedures under `prefix`.
    ///
    /// An empty prefix merges the paths unchanged.
    pub fn merge(mut self, prefix: &str, other: ProcedureRouter<C>) -> Self {
        for (path, procedure) in other.procedures {
            let full_path = if prefix.is_empty() {
                path
            } else {
                format!("{}.{}", prefix, path)
            };
            self.insert(full_path, procedure);
        }
        self
    }

    fn register<I, O, F, Fut>(mut self, path: &str, kind: ProcedureKind, handler: F) -> Self
    where
        I: DeserializeOwned + Send + 'static,
        O: Serialize + Send + 'static,
        F: Fn(C, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, RpcError>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let erased: ProcedureFn<C> = Arc::new(move |ctx: C, input: Value| {
            let handler = handler.clone();
            async move {
                let input: I = serde_json::from_value(input)
                    .map_err(|e| RpcError::bad_request(format!("Invalid input: {}", e)))?;
                let output = handler(ctx, input).await?;
                serde_json::to_value(output)
                    .map_err(|e| RpcError::internal(format!("Failed to serialize output: {}", e)))
            }
            .boxed()
        });
        self.insert(
            path.to_string(),
            Procedure {
                kind,
                handler: erased,
            },
        );
        self
    }

    fn insert(&mut self, path: String, procedure: Procedure<C>) {
        if self.procedures.insert(path.clone(), procedure).is_some() {
            warn!("Procedure {} registered twice; keeping the later handler", path);
        }
    }
}

impl<C> ProcedureRouter<C> {
    /// Kind of the procedure at `path`, if one is registered.
    pub fn kind_of(&self, path: &str) -> Option<ProcedureKind> {
        self.procedures.get(path).map(|p| p.kind)
    }

    /// All registered paths with their kinds, sorted by path.
    pub fn procedures(&self) -> impl Iterator<Item = (&str, ProcedureKind)> {
        self.procedures.iter().map(|(path, p)| (path.as_str(), p.kind))
    }

    pub fn len(&self) -> usize {
        self.procedures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }

    /// Invoke a procedure in process, bypassing HTTP.
    ///
    /// Works for either kind. A panicking handler is reported as
    /// `INTERNAL_SERVER_ERROR` instead of unwinding into the caller.
    pub async fn call(&self, ctx: C, path: &str, input: Value) -> Result<Value, RpcError> {
        let procedure = self
            .procedures
            .get(path)
            .ok_or_else(|| RpcError::not_found(format!("No procedure on path \"{}\"", path)))?;
        Self::invoke(procedure, ctx, path, input).await
    }

    /// Invoke a procedure as reached through HTTP with the given kind.
    pub(crate) async fn dispatch(
        &self,
        ctx: C,
        kind: ProcedureKind,
        path: &str,
        input: Value,
    ) -> Result<Value, RpcError> {
        let procedure = self.procedures.get(path).ok_or_else(|| {
            RpcError::not_found(format!("No \"{}\"-procedure on path \"{}\"", kind, path))
        })?;

        if procedure.kind != kind {
            let method = match kind {
                ProcedureKind::Query => "GET",
                ProcedureKind::Mutation => "POST",
            };
            return Err(RpcError::new(
                RpcErrorCode::MethodNotSupported,
                format!(
                    "Unsupported {}-request to {} procedure at path \"{}\"",
                    method, procedure.kind, path
                ),
            ));
        }

        Self::invoke(procedure, ctx, path, input).await
    }

    async fn invoke(
        procedure: &Procedure<C>,
        ctx: C,
        path: &str,
        input: Value,
    ) -> Result<Value, RpcError> {
        let fut = (procedure.handler)(ctx, input);
        match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(result) => result,
            Err(_) => {
                error!("Procedure {} panicked", path);
                Err(RpcError::internal(format!("Procedure \"{}\" panicked", path)))
            }
        }
    }
}
