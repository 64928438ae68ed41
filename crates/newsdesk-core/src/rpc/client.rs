//! HTTP client for calling procedures through a server's RPC endpoint.

use super::envelope::ResponseEnvelope;
use crate::config::{AppConfig, BridgeConfig, NetworkConfig};
use crate::error::{NewsdeskError, Result};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

/// Issues queries (GET) and mutations (POST) against `{base_url}{endpoint}`.
#[derive(Debug, Clone)]
pub struct RpcClient {
    client: Client,
    base_url: String,
    endpoint: String,
}

impl RpcClient {
    /// Create a client for the default endpoint (`/api/rpc`).
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_endpoint(base_url, BridgeConfig::DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(base_url: impl Into<String>, endpoint: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(NetworkConfig::REQUEST_TIMEOUT)
            .connect_timeout(NetworkConfig::CONNECT_TIMEOUT)
            .user_agent(AppConfig::USER_AGENT)
            .build()
            .map_err(|e| NewsdeskError::Network {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(e),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        format!(
            "{}{}/{}",
            self.base_url,
            self.endpoint,
            urlencoding::encode(path)
        )
    }

    /// Call a query procedure.
    pub async fn query(&self, path: &str, input: &Value) -> Result<Value> {
        let mut url = self.url_for(path);
        if !input.is_null() {
            url.push_str("?input=");
            url.push_str(&urlencoding::encode(&input.to_string()));
        }
        debug!("RPC query {}", path);

        let response = self.client.get(&url).send().await?;
        Self::decode(path, &url, response).await
    }

    /// Call a mutation procedure.
    pub async fn mutation(&self, path: &str, input: &Value) -> Result<Value> {
        let url = self.url_for(path);
        debug!("RPC mutation {}", path);

        let response = self.client.post(&url).json(input).send().await?;
        Self::decode(path, &url, response).await
    }

    async fn decode(path: &str, url: &str, response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let body = response.bytes().await?;
        let envelope: ResponseEnvelope =
            serde_json::from_slice(&body).map_err(|e| NewsdeskError::InvalidResponse {
                url: url.to_string(),
                message: format!("HTTP {} with undecodable body: {}", status, e),
            })?;

        envelope
            .into_result()
            .map_err(|err| NewsdeskError::rpc(path, err))
    }
}
