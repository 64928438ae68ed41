//! HTTP adapter for [`ProcedureRouter`].
//!
//! Turns a buffered `http::Request` addressed to `{endpoint}/{path}` into a
//! procedure call and encodes the outcome as an `http::Response`. Every outcome,
//! including malformed requests, is a response; nothing here returns an error.

use super::envelope::ResponseEnvelope;
use super::error::{RpcError, RpcErrorCode};
use super::router::{ProcedureKind, ProcedureRouter};
use crate::config::BridgeConfig;
use bytes::Bytes;
use futures::future::join_all;
use http::header::CONTENT_TYPE;
use http::request::Parts;
use http::{Request, Response, StatusCode};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Builds the per-request context handed to procedures.
pub type ContextFactory<C> = Arc<dyn Fn(&Parts) -> C + Send + Sync>;

/// Context factory that ignores the request and returns `C::default()`.
pub fn default_context<C: Default + 'static>() -> ContextFactory<C> {
    Arc::new(|_parts: &Parts| C::default())
}

/// Everything [`fetch_request_handler`] needs besides the request itself.
pub struct FetchHandlerOptions<C> {
    /// Path prefix the procedure path is relative to, e.g. `/api/rpc`.
    pub endpoint: String,
    pub router: Arc<ProcedureRouter<C>>,
    pub create_context: ContextFactory<C>,
}

impl<C> Clone for FetchHandlerOptions<C> {
    fn clone(&self) -> Self {
        Self {
            endpoint: self.endpoint.clone(),
            router: self.router.clone(),
            create_context: self.create_context.clone(),
        }
    }
}

impl<C: Default + 'static> FetchHandlerOptions<C> {
    /// Options using an empty per-request context.
    pub fn new(endpoint: impl Into<String>, router: Arc<ProcedureRouter<C>>) -> Self {
        Self {
            endpoint: endpoint.into(),
            router,
            create_context: default_context(),
        }
    }
}

impl<C> FetchHandlerOptions<C> {
    pub fn with_context_factory(mut self, factory: ContextFactory<C>) -> Self {
        self.create_context = factory;
        self
    }
}

/// Resolve, execute and encode the call(s) addressed by `request`.
pub async fn fetch_request_handler<C>(
    request: Request<Bytes>,
    options: &FetchHandlerOptions<C>,
) -> Response<Bytes>
where
    C: Clone + Send + 'static,
{
    let (parts, body) = request.into_parts();

    let Some(kind) = ProcedureKind::for_method(&parts.method) else {
        let err = RpcError::new(
            RpcErrorCode::MethodNotSupported,
            format!("Unsupported HTTP method {}", parts.method),
        );
        return single_response(&ResponseEnvelope::error(&err, None));
    };

    let call = match parse_call(&parts, &body, &options.endpoint) {
        Ok(call) => call,
        Err((err, path)) => {
            debug!("Rejected RPC request to {}: {}", parts.uri, err);
            return single_response(&ResponseEnvelope::error(&err, path.as_deref()));
        }
    };

    let ctx = (options.create_context)(&parts);

    match call {
        ParsedCall::Single { path, input } => {
            debug!("RPC {} {}", kind, path);
            let result = options.router.dispatch(ctx, kind, &path, input).await;
            log_failure(&path, &result);
            single_response(&ResponseEnvelope::from_result(&result, &path))
        }
        ParsedCall::Batch { calls } => {
            debug!("RPC {} batch of {}", kind, calls.len());
            let outcomes = join_all(calls.into_iter().map(|(path, input)| {
                let ctx = ctx.clone();
                async move {
                    let result = options.router.dispatch(ctx, kind, &path, input).await;
                    log_failure(&path, &result);
                    ResponseEnvelope::from_result(&result, &path)
                }
            }))
            .await;
            batch_response(&outcomes)
        }
    }
}

enum ParsedCall {
    Single { path: String, input: Value },
    Batch { calls: Vec<(String, Value)> },
}

type ParseFailure = (RpcError, Option<String>);

fn parse_call(parts: &Parts, body: &Bytes, endpoint: &str) -> Result<ParsedCall, ParseFailure> {
    let raw_path = strip_endpoint(parts.uri.path(), endpoint).ok_or_else(|| {
        (
            RpcError::not_found(format!("Request path {} is outside {}", parts.uri.path(), endpoint)),
            None,
        )
    })?;
    let path = urlencoding::decode(raw_path)
        .map_err(|e| (RpcError::bad_request(format!("Invalid procedure path: {}", e)), None))?
        .into_owned();

    let params: HashMap<String, String> = parts
        .uri
        .query()
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default();
    let is_batch = matches!(params.get("batch").map(String::as_str), Some("1" | "true"));

    let raw_input = if parts.method == http::Method::GET {
        params.get("input").map(|s| s.as_bytes().to_vec())
    } else if body.is_empty() {
        None
    } else {
        Some(body.to_vec())
    };

    let input = match raw_input {
        Some(bytes) => Some(serde_json::from_slice::<Value>(&bytes).map_err(|e| {
            (
                RpcError::new(RpcErrorCode::ParseError, format!("Malformed input JSON: {}", e)),
                Some(path.clone()),
            )
        })?),
        None => None,
    };

    if !is_batch {
        return Ok(ParsedCall::Single {
            path,
            input: input.unwrap_or(Value::Null),
        });
    }

    let paths: Vec<&str> = path.split(',').collect();
    if paths.len() > BridgeConfig::MAX_BATCH_SIZE {
        return Err((
            RpcError::new(
                RpcErrorCode::PayloadTooLarge,
                format!(
                    "Batch of {} calls exceeds maximum {}",
                    paths.len(),
                    BridgeConfig::MAX_BATCH_SIZE
                ),
            ),
            None,
        ));
    }

    let mut inputs = match input {
        None | Some(Value::Null) => serde_json::Map::new(),
        Some(Value::Object(map)) => map,
        Some(_) => {
            return Err((
                RpcError::bad_request("Batch input must be an object keyed by call index"),
                None,
            ))
        }
    };

    let calls = paths
        .into_iter()
        .enumerate()
        .map(|(index, path)| {
            let input = inputs.remove(&index.to_string()).unwrap_or(Value::Null);
            (path.to_string(), input)
        })
        .collect();

    Ok(ParsedCall::Batch { calls })
}

/// Procedure path relative to `endpoint`, without the separating slash.
fn strip_endpoint<'a>(path: &'a str, endpoint: &str) -> Option<&'a str> {
    let endpoint = endpoint.trim_end_matches('/');
    let rest = path.strip_prefix(endpoint)?;
    if rest.is_empty() {
        Some(rest)
    } else {
        rest.strip_prefix('/')
    }
}

fn log_failure(path: &str, result: &Result<Value, RpcError>) {
    if let Err(err) = result {
        if err.code.is_client_error() {
            debug!("RPC {} -> {}", path, err);
        } else {
            error!("RPC error for {}: {}", path, err);
        }
    }
}

/// Encode a single envelope with its own HTTP status.
pub fn single_response(envelope: &ResponseEnvelope) -> Response<Bytes> {
    json_response(envelope.http_status(), envelope)
}

fn batch_response(envelopes: &[ResponseEnvelope]) -> Response<Bytes> {
    let mut statuses = envelopes.iter().map(ResponseEnvelope::http_status);
    let first = statuses.next().unwrap_or(StatusCode::OK);
    let status = if statuses.all(|s| s == first) {
        first
    } else {
        StatusCode::MULTI_STATUS
    };
    json_response(status, &envelopes)
}

fn json_response<T: serde::Serialize + ?Sized>(status: StatusCode, payload: &T) -> Response<Bytes> {
    let (status, body) = match serde_json::to_vec(payload) {
        Ok(body) => (status, body),
        Err(e) => {
            warn!("Failed to encode RPC response: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                br#"{"error":{"message":"Failed to encode response","code":-32603,"data":{"code":"INTERNAL_SERVER_ERROR","httpStatus":500}}}"#.to_vec(),
            )
        }
    };

    let mut response = Response::new(Bytes::from(body));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        http::HeaderValue::from_static("application/json"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::router::EmptyContext;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn options() -> FetchHandlerOptions<EmptyContext> {
        let router = ProcedureRouter::new()
            .query("echo", |_ctx, input: Value| async move { Ok::<_, RpcError>(input) })
            .mutation("bump", |_ctx, n: i64| async move { Ok::<_, RpcError>(n + 1) });
        FetchHandlerOptions::new("/api/rpc", Arc::new(router))
    }

    fn get(uri: &str) -> Request<Bytes> {
        Request::get(uri).body(Bytes::new()).unwrap()
    }

    fn post(uri: &str, body: &str) -> Request<Bytes> {
        Request::post(uri).body(Bytes::from(body.to_string())).unwrap()
    }

    fn body_json(response: &Response<Bytes>) -> Value {
        serde_json::from_slice(response.body()).unwrap()
    }

    fn encoded(input: &Value) -> String {
        urlencoding::encode(&input.to_string()).into_owned()
    }

    #[tokio::test]
    async fn test_get_query_with_input() {
        let uri = format!("/api/rpc/echo?input={}", encoded(&json!({"word": "hi"})));
        let response = fetch_request_handler(get(&uri), &options()).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[CONTENT_TYPE],
            "application/json"
        );
        assert_eq!(body_json(&response), json!({"result": {"data": {"word": "hi"}}}));
    }

    #[tokio::test]
    async fn test_get_without_input_passes_null() {
        let response = fetch_request_handler(get("/api/rpc/echo"), &options()).await;
        assert_eq!(body_json(&response), json!({"result": {"data": null}}));
    }

    #[tokio::test]
    async fn test_post_mutation_reads_body() {
        let response = fetch_request_handler(post("/api/rpc/bump", "41"), &options()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(&response), json!({"result": {"data": 42}}));
    }

    #[tokio::test]
    async fn test_unknown_procedure_is_404() {
        let response = fetch_request_handler(get("/api/rpc/doesNotExist"), &options()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(&response);
        assert_eq!(body["error"]["data"]["code"], json!("NOT_FOUND"));
        assert_eq!(body["error"]["data"]["path"], json!("doesNotExist"));
    }

    #[tokio::test]
    async fn test_verb_mismatch_is_405() {
        let response = fetch_request_handler(post("/api/rpc/echo", "1"), &options()).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

        let response = fetch_request_handler(get("/api/rpc/bump"), &options()).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_unsupported_http_method_is_405() {
        let request = Request::delete("/api/rpc/echo").body(Bytes::new()).unwrap();
        let response = fetch_request_handler(request, &options()).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_malformed_json_is_parse_error() {
        let response = fetch_request_handler(post("/api/rpc/bump", "{not json"), &options()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(&response)["error"]["code"], json!(-32700));

        let response = fetch_request_handler(get("/api/rpc/echo?input=%7B"), &options()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_input_is_bad_request() {
        let response = fetch_request_handler(post("/api/rpc/bump", "\"x\""), &options()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(&response)["error"]["data"]["code"], json!("BAD_REQUEST"));
    }

    #[tokio::test]
    async fn test_batch_get_returns_array_in_order() {
        let inputs = json!({"0": "first", "1": {"n": 2}});
        let uri = format!("/api/rpc/echo,echo?batch=1&input={}", encoded(&inputs));
        let response = fetch_request_handler(get(&uri), &options()).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(&response),
            json!([
                {"result": {"data": "first"}},
                {"result": {"data": {"n": 2}}}
            ])
        );
    }

    #[tokio::test]
    async fn test_batch_with_mixed_outcomes_is_multi_status() {
        let response =
            fetch_request_handler(get("/api/rpc/echo,missing?batch=1"), &options()).await;
        assert_eq!(response.status(), StatusCode::MULTI_STATUS);

        let body = body_json(&response);
        assert_eq!(body[0], json!({"result": {"data": null}}));
        assert_eq!(body[1]["error"]["data"]["code"], json!("NOT_FOUND"));
    }

    #[tokio::test]
    async fn test_oversized_batch_is_rejected() {
        let at_limit = vec!["echo"; BridgeConfig::MAX_BATCH_SIZE].join(",");
        let response =
            fetch_request_handler(get(&format!("/api/rpc/{}?batch=1", at_limit)), &options()).await;
        assert_eq!(response.status(), StatusCode::OK);

        let over_limit = vec!["echo"; BridgeConfig::MAX_BATCH_SIZE + 1].join(",");
        let response =
            fetch_request_handler(get(&format!("/api/rpc/{}?batch=1", over_limit)), &options())
                .await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            body_json(&response)["error"]["data"]["code"],
            json!("PAYLOAD_TOO_LARGE")
        );
    }

    #[tokio::test]
    async fn test_percent_encoded_path_is_decoded() {
        let router = ProcedureRouter::<EmptyContext>::new()
            .query("news.list", |_ctx, _: ()| async { Ok::<_, RpcError>(Vec::<u8>::new()) });
        let options = FetchHandlerOptions::new("/api/rpc/", Arc::new(router));

        let response = fetch_request_handler(get("/api/rpc/news%2Elist"), &options).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_context_factory_called_once_per_request() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let factory: ContextFactory<EmptyContext> = Arc::new(move |_parts: &Parts| {
            counter.fetch_add(1, Ordering::SeqCst);
            EmptyContext
        });
        let options = options().with_context_factory(factory);

        fetch_request_handler(get("/api/rpc/echo,echo?batch=1"), &options).await;
        fetch_request_handler(get("/api/rpc/echo"), &options).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_strip_endpoint() {
        assert_eq!(strip_endpoint("/api/rpc/echo", "/api/rpc"), Some("echo"));
        assert_eq!(strip_endpoint("/api/rpc/echo", "/api/rpc/"), Some("echo"));
        assert_eq!(strip_endpoint("/api/rpcx", "/api/rpc"), None);
        assert_eq!(strip_endpoint("/other/echo", "/api/rpc"), None);
    }
}
