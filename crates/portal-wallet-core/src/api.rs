//! Backend API client
//!
//! The SDK's remote collaborator: chain-scoped JSON-RPC execution plus the
//! REST calls that persist share state. Plain request/response mapping, no
//! retry logic; retry policy belongs to the caller.

use crate::chain::ChainRef;
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Which share set a status update refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareKind {
    Signing,
    Backup,
}

impl ShareKind {
    /// Path segment for the share-status endpoint
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareKind::Signing => "signing",
            ShareKind::Backup => "backup",
        }
    }
}

/// Durable-storage state reported to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShareStatus {
    /// Signing share persisted in the client keystore
    StoredClient,
    /// Backup share durably stored with the caller's custodian
    StoredClientBackupShare,
}

/// Token/native balance entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetBalance {
    /// Symbol of the token/native currency
    pub symbol: String,
    /// Raw balance value (smallest unit)
    pub raw: String,
    /// Number of decimals
    pub decimals: u8,
    /// Token contract/mint, absent for the native asset
    #[serde(default)]
    pub contract: Option<String>,
}

/// A historical transaction for an address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Transaction hash/signature
    pub hash: String,
    /// Chain the transaction executed on
    pub chain: ChainRef,
    /// Sender address
    pub from: String,
    /// Recipient address
    pub to: String,
    /// Transferred value (smallest unit)
    pub value: String,
    /// Block timestamp
    pub timestamp: DateTime<Utc>,
}

/// Opaque capability over the remote wallet backend
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Execute a chain-scoped RPC method
    async fn execute(&self, chain: &ChainRef, method: &str, params: Vec<Value>) -> Result<Value>;

    /// Report share durability state to the backend
    async fn update_share_status(
        &self,
        kind: ShareKind,
        ids: &[String],
        status: ShareStatus,
    ) -> Result<()>;

    /// Fetch asset balances for an address
    async fn get_balances(&self, chain: &ChainRef, address: &str) -> Result<Vec<AssetBalance>>;

    /// Fetch transaction history for an address
    async fn get_transactions(
        &self,
        chain: &ChainRef,
        address: &str,
    ) -> Result<Vec<TransactionRecord>>;
}

/// API client configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Backend REST base URL
    pub api_url: String,
    /// RPC gateway base URL (optional, derived from api_url if not set)
    pub rpc_url: Option<String>,
    /// Bearer token for client authentication
    pub bearer_token: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl ApiConfig {
    /// Create a new config
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            rpc_url: None,
            bearer_token: None,
            timeout_secs: 30,
        }
    }

    /// Set a dedicated RPC gateway URL
    pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = Some(url.into());
        self
    }

    /// Set the client bearer token
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Get the RPC gateway URL
    pub fn get_rpc_url(&self) -> &str {
        self.rpc_url.as_deref().unwrap_or(&self.api_url)
    }
}

/// API response structure
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn into_result(self) -> Result<T> {
        if self.success {
            self.data
                .ok_or_else(|| Error::Api("No data in response".to_string()))
        } else {
            Err(Error::Api(
                self.error.unwrap_or_else(|| "Unknown error".to_string()),
            ))
        }
    }
}

/// HTTP implementation of [`RemoteClient`]
pub struct HttpRemoteClient {
    config: ApiConfig,
    client: reqwest::Client,
}

impl HttpRemoteClient {
    /// Create a new client
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response: ApiResponse<T> = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?
            .json()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        response.into_result()
    }
}

#[async_trait]
impl RemoteClient for HttpRemoteClient {
    async fn execute(&self, chain: &ChainRef, method: &str, params: Vec<Value>) -> Result<Value> {
        let url = format!("{}/v1/chains/{}/rpc", self.config.get_rpc_url(), chain);

        let request_body = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1,
        });

        debug!(chain = %chain, method, "dispatching rpc request");

        let response_body: Value = self
            .authorize(self.client.post(&url))
            .json(&request_body)
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?
            .json()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        if let Some(error) = response_body.get("error") {
            return Err(Error::Api(format!("RPC error: {}", error)));
        }

        response_body
            .get("result")
            .cloned()
            .ok_or_else(|| Error::Api("Missing result in RPC response".into()))
    }

    async fn update_share_status(
        &self,
        kind: ShareKind,
        ids: &[String],
        status: ShareStatus,
    ) -> Result<()> {
        let url = format!(
            "{}/v1/shares/{}/status",
            self.config.api_url,
            kind.as_str()
        );

        let response: ApiResponse<Value> = self
            .authorize(self.client.patch(&url))
            .json(&serde_json::json!({
                "share_ids": ids,
                "status": status,
            }))
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?
            .json()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        response.into_result().map(|_| ())
    }

    async fn get_balances(&self, chain: &ChainRef, address: &str) -> Result<Vec<AssetBalance>> {
        let url = format!(
            "{}/v1/chains/{}/balances?address={}",
            self.config.api_url, chain, address
        );
        self.get_json(&url).await
    }

    async fn get_transactions(
        &self,
        chain: &ChainRef,
        address: &str,
    ) -> Result<Vec<TransactionRecord>> {
        let url = format!(
            "{}/v1/chains/{}/transactions?address={}",
            self.config.api_url, chain, address
        );
        self.get_json(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_config_builder() {
        let config = ApiConfig::new("https://api.example.com")
            .with_bearer_token("token")
            .with_timeout_secs(10);

        assert_eq!(config.api_url, "https://api.example.com");
        assert_eq!(config.bearer_token.as_deref(), Some("token"));
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn test_rpc_url_defaults_to_api_url() {
        let config = ApiConfig::new("https://api.example.com");
        assert_eq!(config.get_rpc_url(), "https://api.example.com");

        let config = config.with_rpc_url("https://rpc.example.com");
        assert_eq!(config.get_rpc_url(), "https://rpc.example.com");
    }

    #[test]
    fn test_share_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&ShareStatus::StoredClientBackupShare).unwrap(),
            "\"STORED_CLIENT_BACKUP_SHARE\""
        );
    }

    #[test]
    fn test_api_response_into_result() {
        let ok: ApiResponse<u32> = ApiResponse {
            success: true,
            data: Some(7),
            error: None,
        };
        assert_eq!(ok.into_result().unwrap(), 7);

        let err: ApiResponse<u32> = ApiResponse {
            success: false,
            data: None,
            error: Some("denied".into()),
        };
        assert!(matches!(err.into_result(), Err(Error::Api(msg)) if msg == "denied"));
    }
}
