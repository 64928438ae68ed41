//! Response envelopes written by the router and read by [`RpcClient`].
//!
//! ```text
//! success: {"result":{"data":<output>}}
//! error:   {"error":{"message":"..","code":-32004,
//!                    "data":{"code":"NOT_FOUND","httpStatus":404,"path":"x"}}}
//! ```
//!
//! [`RpcClient`]: super::RpcClient

use super::error::{RpcError, RpcErrorCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultData {
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorData {
    pub code: RpcErrorCode,
    pub http_status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorShape {
    pub message: String,
    pub code: i32,
    pub data: ErrorData,
}

/// One call's outcome on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseEnvelope {
    Success { result: ResultData },
    Error { error: ErrorShape },
}

impl ResponseEnvelope {
    pub fn success(data: Value) -> Self {
        ResponseEnvelope::Success {
            result: ResultData { data },
        }
    }

    pub fn error(err: &RpcError, path: Option<&str>) -> Self {
        ResponseEnvelope::Error {
            error: ErrorShape {
                message: err.message.clone(),
                code: err.code.json_rpc_code(),
                data: ErrorData {
                    code: err.code,
                    http_status: err.code.http_status().as_u16(),
                    path: path.map(str::to_string),
                },
            },
        }
    }

    pub fn from_result(result: &Result<Value, RpcError>, path: &str) -> Self {
        match result {
            Ok(data) => Self::success(data.clone()),
            Err(err) => Self::error(err, Some(path)),
        }
    }

    /// HTTP status this envelope is sent with.
    pub fn http_status(&self) -> http::StatusCode {
        match self {
            ResponseEnvelope::Success { .. } => http::StatusCode::OK,
            ResponseEnvelope::Error { error } => error.data.code.http_status(),
        }
    }

    pub fn into_result(self) -> Result<Value, RpcError> {
        match self {
            ResponseEnvelope::Success { result } => Ok(result.data),
            ResponseEnvelope::Error { error } => Err(RpcError::new(error.data.code, error.message)),
        }
    }
}
