//! Procedure error codes and the error type raised by procedures.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error codes understood by the router and its clients.
///
/// Each code has a JSON-RPC 2.0 numeric code and an HTTP status:
///
/// | code | JSON-RPC | HTTP |
/// |---|---|---|
/// | `PARSE_ERROR` | -32700 | 400 |
/// | `BAD_REQUEST` | -32600 | 400 |
/// | `INTERNAL_SERVER_ERROR` | -32603 | 500 |
/// | `UNAUTHORIZED` | -32001 | 401 |
/// | `FORBIDDEN` | -32003 | 403 |
/// | `NOT_FOUND` | -32004 | 404 |
/// | `METHOD_NOT_SUPPORTED` | -32005 | 405 |
/// | `TIMEOUT` | -32008 | 408 |
/// | `CONFLICT` | -32009 | 409 |
/// | `PRECONDITION_FAILED` | -32012 | 412 |
/// | `PAYLOAD_TOO_LARGE` | -32013 | 413 |
/// | `UNPROCESSABLE_CONTENT` | -32022 | 422 |
/// | `TOO_MANY_REQUESTS` | -32029 | 429 |
/// | `CLIENT_CLOSED_REQUEST` | -32099 | 499 |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RpcErrorCode {
    ParseError,
    BadRequest,
    InternalServerError,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotSupported,
    Timeout,
    Conflict,
    PreconditionFailed,
    PayloadTooLarge,
    UnprocessableContent,
    TooManyRequests,
    ClientClosedRequest,
}

impl RpcErrorCode {
    const ALL: [RpcErrorCode; 14] = [
        RpcErrorCode::ParseError,
        RpcErrorCode::BadRequest,
        RpcErrorCode::InternalServerError,
        RpcErrorCode::Unauthorized,
        RpcErrorCode::Forbidden,
        RpcErrorCode::NotFound,
        RpcErrorCode::MethodNotSupported,
        RpcErrorCode::Timeout,
        RpcErrorCode::Conflict,
        RpcErrorCode::PreconditionFailed,
        RpcErrorCode::PayloadTooLarge,
        RpcErrorCode::UnprocessableContent,
        RpcErrorCode::TooManyRequests,
        RpcErrorCode::ClientClosedRequest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RpcErrorCode::ParseError => "PARSE_ERROR",
            RpcErrorCode::BadRequest => "BAD_REQUEST",
            RpcErrorCode::InternalServerError => "INTERNAL_SERVER_ERROR",
            RpcErrorCode::Unauthorized => "UNAUTHORIZED",
            RpcErrorCode::Forbidden => "FORBIDDEN",
            RpcErrorCode::NotFound => "NOT_FOUND",
            RpcErrorCode::MethodNotSupported => "METHOD_NOT_SUPPORTED",
            RpcErrorCode::Timeout => "TIMEOUT",
            RpcErrorCode::Conflict => "CONFLICT",
            RpcErrorCode::PreconditionFailed => "PRECONDITION_FAILED",
            RpcErrorCode::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            RpcErrorCode::UnprocessableContent => "UNPROCESSABLE_CONTENT",
            RpcErrorCode::TooManyRequests => "TOO_MANY_REQUESTS",
            RpcErrorCode::ClientClosedRequest => "CLIENT_CLOSED_REQUEST",
        }
    }

    /// JSON-RPC 2.0 numeric code.
    pub fn json_rpc_code(&self) -> i32 {
        match self {
            RpcErrorCode::ParseError => -32700,
            RpcErrorCode::BadRequest => -32600,
            RpcErrorCode::InternalServerError => -32603,
            RpcErrorCode::Unauthorized => -32001,
            RpcErrorCode::Forbidden => -32003,
            RpcErrorCode::NotFound => -32004,
            RpcErrorCode::MethodNotSupported => -32005,
            RpcErrorCode::Timeout => -32008,
            RpcErrorCode::Conflict => -32009,
            RpcErrorCode::PreconditionFailed => -32012,
            RpcErrorCode::PayloadTooLarge => -32013,
            RpcErrorCode::UnprocessableContent => -32022,
            RpcErrorCode::TooManyRequests => -32029,
            RpcErrorCode::ClientClosedRequest => -32099,
        }
    }

    pub fn from_json_rpc_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.json_rpc_code() == code)
    }

    pub fn http_status(&self) -> http::StatusCode {
        let status = match self {
            RpcErrorCode::ParseError | RpcErrorCode::BadRequest => 400,
            RpcErrorCode::InternalServerError => 500,
            RpcErrorCode::Unauthorized => 401,
            RpcErrorCode::Forbidden => 403,
            RpcErrorCode::NotFound => 404,
            RpcErrorCode::MethodNotSupported => 405,
            RpcErrorCode::Timeout => 408,
            RpcErrorCode::Conflict => 409,
            RpcErrorCode::PreconditionFailed => 412,
            RpcErrorCode::PayloadTooLarge => 413,
            RpcErrorCode::UnprocessableContent => 422,
            RpcErrorCode::TooManyRequests => 429,
            RpcErrorCode::ClientClosedRequest => 499,
        };
        http::StatusCode::from_u16(status).unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn is_client_error(&self) -> bool {
        self.http_status().is_client_error()
    }
}

impl std::fmt::Display for RpcErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised by a procedure or by the router while resolving a call.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{code}: {message}")]
pub struct RpcError {
    pub code: RpcErrorCode,
    pub message: String,
}

impl RpcError {
    pub fn new(code: RpcErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::BadRequest, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::NotFound, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::InternalServerError, message)
    }
}
