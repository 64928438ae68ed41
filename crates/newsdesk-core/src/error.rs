//! Error types for Newsdesk.
//!
//! `NewsdeskError` covers failures of the library itself (transport, decoding,
//! configuration). Failures raised by procedures travel as [`RpcError`] and are
//! wrapped here when they cross into library code.

use crate::rpc::{RpcError, RpcErrorCode};
use thiserror::Error;

/// Main error type for the Newsdesk library.
#[derive(Debug, Error)]
pub enum NewsdeskError {
    // Network errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("Request timeout after {0:?}")]
    Timeout(std::time::Duration),

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Procedure errors reported by a router
    #[error("Procedure {path} failed ({code}): {message}")]
    Rpc {
        path: String,
        code: RpcErrorCode,
        message: String,
    },

    #[error("Malformed response from {url}: {message}")]
    InvalidResponse { url: String, message: String },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for Newsdesk operations.
pub type Result<T> = std::result::Result<T, NewsdeskError>;

impl From<serde_json::Error> for NewsdeskError {
    fn from(err: serde_json::Error) -> Self {
        NewsdeskError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<reqwest::Error> for NewsdeskError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NewsdeskError::Timeout(crate::config::NetworkConfig::REQUEST_TIMEOUT)
        } else {
            NewsdeskError::Network {
                message: err.to_string(),
                source: Some(err),
            }
        }
    }
}

impl NewsdeskError {
    /// Wrap a procedure error with the path it was raised for.
    pub fn rpc(path: impl Into<String>, err: RpcError) -> Self {
        NewsdeskError::Rpc {
            path: path.into(),
            code: err.code,
            message: err.message,
        }
    }

    /// Map to the router error code a client should see for this failure.
    pub fn to_rpc_error_code(&self) -> RpcErrorCode {
        match self {
            NewsdeskError::Rpc { code, .. } => *code,
            NewsdeskError::Timeout(_) => RpcErrorCode::Timeout,
            NewsdeskError::Json { .. } => RpcErrorCode::ParseError,
            NewsdeskError::Config { .. } => RpcErrorCode::PreconditionFailed,
            _ => RpcErrorCode::InternalServerError,
        }
    }

    /// Check if this error is a transient transport failure.
    pub fn is_retryable(&self) -> bool {
        match self {
            NewsdeskError::Network { .. } | NewsdeskError::Timeout(_) => true,
            NewsdeskError::Rpc { code, .. } => matches!(
                code,
                RpcErrorCode::Timeout | RpcErrorCode::TooManyRequests
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NewsdeskError::rpc(
            "news.byId",
            RpcError::new(RpcErrorCode::NotFound, "No news item with id 9"),
        );
        assert_eq!(
            err.to_string(),
            "Procedure news.byId failed (NOT_FOUND): No news item with id 9"
        );
    }

    #[test]
    fn test_rpc_error_codes() {
        assert_eq!(
            NewsdeskError::Timeout(std::time::Duration::from_secs(1)).to_rpc_error_code(),
            RpcErrorCode::Timeout
        );
        assert_eq!(
            NewsdeskError::Other("boom".into()).to_rpc_error_code(),
            RpcErrorCode::InternalServerError
        );
    }

    #[test]
    fn test_retryable_errors() {
        assert!(NewsdeskError::Timeout(std::time::Duration::from_secs(5)).is_retryable());
        assert!(NewsdeskError::rpc("x", RpcError::new(RpcErrorCode::TooManyRequests, "slow down"))
            .is_retryable());
        assert!(!NewsdeskError::rpc("x", RpcError::new(RpcErrorCode::NotFound, "gone"))
            .is_retryable());
    }
}
