use alloy_sol_types::{Revert, SolError};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::{Value, json};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;

/// JSON-RPC error object, kept exactly as the node returned it
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

impl RemoteError {
    /// Revert reason from `message` ("execution reverted: ...") or from
    /// `Error(string)` encoded revert data
    pub fn revert_reason(&self) -> Option<String> {
        if let Some(reason) = self.message.strip_prefix("execution reverted:") {
            return Some(reason.trim().to_string());
        }

        let data = self.data.as_ref()?.as_str()?;
        let bytes = hex::decode(data.trim_start_matches("0x")).ok()?;
        Revert::abi_decode(&bytes, true).ok().map(|revert| revert.reason)
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("RPC transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("RPC endpoint returned status {status}: {body}")]
    Http { status: u16, body: String },

    #[error("{0}")]
    Remote(RemoteError),

    #[error("malformed RPC response: {0}")]
    Malformed(String),
}

/// Seam between the contract client and the chain node
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError>;
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RemoteError>,
}

pub struct HttpTransport {
    url: String,
    http_client: HttpClient,
    next_id: AtomicU64,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>) -> Result<Self, RpcError> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            url: url.into(),
            http_client,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        tracing::debug!(method, id, "sending JSON-RPC request");

        let response = self.http_client
            .post(&self.url)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RpcError::Http { status, body });
        }

        let envelope: JsonRpcResponse = response.json().await?;

        if let Some(error) = envelope.error {
            return Err(RpcError::Remote(error));
        }

        // `null` is a legitimate result (e.g. a receipt that does not exist yet)
        Ok(envelope.result.unwrap_or(Value::Null))
    }
}

/// Parses a `0x`-prefixed hex quantity
pub fn parse_quantity(value: &Value) -> Result<u64, RpcError> {
    let text = value
        .as_str()
        .ok_or_else(|| RpcError::Malformed(format!("expected hex quantity, got {}", value)))?;

    u64::from_str_radix(text.trim_start_matches("0x"), 16)
        .map_err(|_| RpcError::Malformed(format!("invalid hex quantity: {}", text)))
}

/// Decodes `0x`-prefixed hex data
pub fn parse_bytes(value: &Value) -> Result<Vec<u8>, RpcError> {
    let text = value
        .as_str()
        .ok_or_else(|| RpcError::Malformed(format!("expected hex data, got {}", value)))?;

    hex::decode(text.trim_start_matches("0x"))
        .map_err(|err| RpcError::Malformed(format!("invalid hex data: {}", err)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revert_reason_from_message() {
        let error = RemoteError {
            code: 3,
            message: "execution reverted: Shipment does not exist".to_string(),
            data: None,
        };
        assert_eq!(error.revert_reason().as_deref(), Some("Shipment does not exist"));
    }

    #[test]
    fn revert_reason_from_encoded_data() {
        let encoded = Revert { reason: "Only carrier".to_string() }.abi_encode();
        let error = RemoteError {
            code: -32000,
            message: "execution reverted".to_string(),
            data: Some(Value::String(format!("0x{}", hex::encode(encoded)))),
        };
        assert_eq!(error.revert_reason().as_deref(), Some("Only carrier"));
    }

    #[test]
    fn quantities_and_bytes() {
        assert_eq!(parse_quantity(&json!("0x3e9")).ok(), Some(1001));
        assert!(parse_quantity(&json!(12)).is_err());
        assert_eq!(parse_bytes(&json!("0x0a0b")).ok(), Some(vec![10, 11]));
        assert!(parse_bytes(&json!("0xzz")).is_err());
    }
}
