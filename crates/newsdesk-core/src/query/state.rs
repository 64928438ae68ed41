//! Query outcomes as seen by consumers.

use crate::error::NewsdeskError;
use crate::rpc::{RpcError, RpcErrorCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Failure of a fetch, shared by every consumer of the same key.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct QueryError {
    pub message: String,
    /// Router error code when the failure came from a procedure.
    pub code: Option<RpcErrorCode>,
}

impl QueryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }
}

impl From<RpcError> for QueryError {
    fn from(err: RpcError) -> Self {
        Self {
            message: err.message,
            code: Some(err.code),
        }
    }
}

impl From<NewsdeskError> for QueryError {
    fn from(err: NewsdeskError) -> Self {
        let code = match &err {
            NewsdeskError::Rpc { code, .. } => Some(*code),
            _ => None,
        };
        Self {
            message: err.to_string(),
            code,
        }
    }
}

/// Tri-state result of a query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState<T> {
    /// No data yet and a fetch is running.
    Loading,
    /// No data and the last fetch failed.
    Error(QueryError),
    /// Data is available. `is_stale` is set when it is older than the staleness
    /// window and a refetch was started.
    Success { data: T, is_stale: bool },
}

impl<T> QueryState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, QueryState::Loading)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            QueryState::Success { data, .. } => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&QueryError> {
        match self {
            QueryState::Error(err) => Some(err),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryState<U> {
        match self {
            QueryState::Loading => QueryState::Loading,
            QueryState::Error(err) => QueryState::Error(err),
            QueryState::Success { data, is_stale } => QueryState::Success {
                data: f(data),
                is_stale,
            },
        }
    }
}

impl QueryState<Value> {
    /// Deserialize the data; a decode failure turns into `Error`.
    pub fn decode<T: DeserializeOwned>(self) -> QueryState<T> {
        match self {
            QueryState::Loading => QueryState::Loading,
            QueryState::Error(err) => QueryState::Error(err),
            QueryState::Success { data, is_stale } => match serde_json::from_value(data) {
                Ok(data) => QueryState::Success { data, is_stale },
                Err(e) => QueryState::Error(QueryError::new(format!(
                    "Failed to decode query data: {}",
                    e
                ))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_success_and_failure() {
        let state = QueryState::Success {
            data: json!([1, 2, 3]),
            is_stale: false,
        };
        assert_eq!(state.clone().decode::<Vec<u8>>().data(), Some(&vec![1, 2, 3]));
        assert!(state.decode::<String>().error().is_some());
    }

    #[test]
    fn test_query_error_keeps_rpc_code() {
        let err = QueryError::from(RpcError::not_found("gone"));
        assert_eq!(err.code, Some(RpcErrorCode::NotFound));
        assert_eq!(err.to_string(), "gone");
    }
}
