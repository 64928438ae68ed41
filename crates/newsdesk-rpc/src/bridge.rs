//! HTTP bridge from axum to the procedure router.
//!
//! Every GET and POST under the configured endpoint is buffered and handed to
//! [`fetch_request_handler`] unchanged; its response is returned as is.
//!
//! axum routes HEAD through the GET handler, so HEAD reaches the router and is
//! answered with its 405 `METHOD_NOT_SUPPORTED` envelope.

use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::header::CONTENT_LENGTH;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use http_body_util::LengthLimitError;
use newsdesk_core::config::BridgeConfig;
use newsdesk_core::rpc::{single_response, ResponseEnvelope};
use newsdesk_core::{fetch_request_handler, FetchHandlerOptions, RpcError, RpcErrorCode};
use std::error::Error as StdError;
use std::sync::Arc;
use tracing::{debug, info_span, warn, Instrument};
use uuid::Uuid;

/// Mounts one procedure router at one endpoint.
pub struct RpcBridge<C> {
    options: FetchHandlerOptions<C>,
    max_body_bytes: usize,
}

impl<C> RpcBridge<C>
where
    C: Clone + Send + Sync + 'static,
{
    pub fn new(options: FetchHandlerOptions<C>) -> Self {
        Self {
            options,
            max_body_bytes: BridgeConfig::MAX_BODY_BYTES,
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.options.endpoint
    }

    /// Routes for `{endpoint}/{path}` accepting GET and POST.
    pub fn into_router(self) -> Router {
        let route = format!("{}/*path", self.options.endpoint.trim_end_matches('/'));
        Router::new()
            .route(&route, get(forward::<C>).post(forward::<C>))
            .with_state(Arc::new(self))
    }
}

/// Forward one HTTP request to the procedure router.
async fn forward<C>(State(bridge): State<Arc<RpcBridge<C>>>, request: Request) -> Response
where
    C: Clone + Send + Sync + 'static,
{
    let request_id = Uuid::new_v4();
    let span = info_span!(
        "rpc_request",
        %request_id,
        method = %request.method(),
        path = %request.uri().path()
    );

    async move {
        let (parts, body) = request.into_parts();

        let declared_len = parts
            .headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok());
        if declared_len.is_some_and(|len| len > bridge.max_body_bytes) {
            warn!("Request body exceeds {} bytes", bridge.max_body_bytes);
            return rejection(RpcErrorCode::PayloadTooLarge, "Request body is too large");
        }

        let body: Bytes = match axum::body::to_bytes(body, bridge.max_body_bytes).await {
            Ok(body) => body,
            Err(e) if is_length_limit(&e) => {
                warn!("Request body exceeds {} bytes", bridge.max_body_bytes);
                return rejection(RpcErrorCode::PayloadTooLarge, "Request body is too large");
            }
            Err(e) => {
                warn!("Failed to read request body: {}", e);
                return rejection(
                    RpcErrorCode::BadRequest,
                    format!("Failed to read request body: {}", e),
                );
            }
        };

        let response =
            fetch_request_handler(axum::http::Request::from_parts(parts, body), &bridge.options)
                .await;
        debug!("RPC response status {}", response.status());
        response.map(Body::from)
    }
    .instrument(span)
    .await
}

/// Whether a body read failed on the size limit rather than the stream.
fn is_length_limit(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<LengthLimitError>() {
            return true;
        }
        current = e.source();
    }
    false
}

fn rejection(code: RpcErrorCode, message: impl Into<String>) -> Response {
    let err = RpcError::new(code, message);
    single_response(&ResponseEnvelope::error(&err, None)).map(Body::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, Request as HttpRequest, StatusCode};
    use newsdesk_core::{EmptyContext, ProcedureRouter};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn bridge() -> RpcBridge<EmptyContext> {
        let router = ProcedureRouter::<EmptyContext>::new()
            .query("echo", |_ctx, input: Value| async move { Ok::<_, RpcError>(input) })
            .mutation("store", |_ctx, input: Value| async move {
                Ok::<_, RpcError>(json!({ "stored": input }))
            });
        RpcBridge::new(FetchHandlerOptions::new("/api/rpc", Arc::new(router)))
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_matches_direct_handler_output() {
        let bridge = bridge();
        let options = bridge.options.clone();
        let app = bridge.into_router();
        let uri = "/api/rpc/echo?input=%7B%22a%22%3A1%7D";

        let via_http = app
            .oneshot(HttpRequest::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let direct = fetch_request_handler(
            HttpRequest::get(uri).body(Bytes::new()).unwrap(),
            &options,
        )
        .await;

        assert_eq!(via_http.status(), direct.status());
        assert_eq!(
            via_http.headers().get("content-type"),
            direct.headers().get("content-type")
        );
        let direct_body: Value = serde_json::from_slice(direct.body()).unwrap();
        assert_eq!(body_json(via_http).await, direct_body);
    }

    #[tokio::test]
    async fn test_post_reaches_mutation() {
        let response = bridge()
            .into_router()
            .oneshot(
                HttpRequest::builder()
                    .method(Method::POST)
                    .uri("/api/rpc/store")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"x":2}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"result": {"data": {"stored": {"x": 2}}}})
        );
    }

    #[tokio::test]
    async fn test_other_methods_are_not_routed() {
        let response = bridge()
            .into_router()
            .oneshot(
                HttpRequest::builder()
                    .method(Method::DELETE)
                    .uri("/api/rpc/echo")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let response = bridge()
            .with_max_body_bytes(8)
            .into_router()
            .oneshot(
                HttpRequest::builder()
                    .method(Method::POST)
                    .uri("/api/rpc/store")
                    .header("content-length", "32")
                    .body(Body::from(vec![b' '; 32]))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let body = body_json(response).await;
        assert_eq!(body["error"]["data"]["code"], "PAYLOAD_TOO_LARGE");
    }

    #[tokio::test]
    async fn test_oversized_body_without_length_header_is_rejected() {
        let response = bridge()
            .with_max_body_bytes(8)
            .into_router()
            .oneshot(
                HttpRequest::builder()
                    .method(Method::POST)
                    .uri("/api/rpc/store")
                    .body(Body::from(vec![b' '; 32]))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let body = body_json(response).await;
        assert_eq!(body["error"]["data"]["code"], "PAYLOAD_TOO_LARGE");
    }

    #[tokio::test]
    async fn test_head_is_answered_by_the_router() {
        let response = bridge()
            .into_router()
            .oneshot(
                HttpRequest::builder()
                    .method(Method::HEAD)
                    .uri("/api/rpc/echo")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
