use alloy_primitives::{Address, TxHash, U256};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::rpc::{RpcError, RpcTransport};

/// Unsigned transaction handed to the wallet for signing and broadcast
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub from: String,
    pub to: String,
    pub data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
}

impl TransactionRequest {
    pub fn new(from: Address, to: Address, calldata: &[u8]) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            data: format!("0x{}", hex::encode(calldata)),
            value: None,
            chain_id: None,
        }
    }

    pub fn with_value(mut self, value: Option<U256>) -> Self {
        self.value = value
            .filter(|amount| !amount.is_zero())
            .map(|amount| format!("0x{:x}", amount));
        self
    }

    pub fn with_chain_id(mut self, chain_id: Option<u64>) -> Self {
        self.chain_id = chain_id.map(|id| format!("0x{:x}", id));
        self
    }
}

#[async_trait::async_trait]
pub trait TxSubmitter: Send + Sync {
    async fn submit(&self, tx: &TransactionRequest) -> Result<TxHash, RpcError>;
}

/// Delegates signing to the wallet behind `eth_sendTransaction`
pub struct WalletSubmitter {
    transport: Arc<dyn RpcTransport>,
}

impl WalletSubmitter {
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait::async_trait]
impl TxSubmitter for WalletSubmitter {
    async fn submit(&self, tx: &TransactionRequest) -> Result<TxHash, RpcError> {
        let params = json!([tx]);
        let response = self.transport.request("eth_sendTransaction", params).await?;

        parse_tx_hash(&response)
    }
}

pub fn parse_tx_hash(value: &Value) -> Result<TxHash, RpcError> {
    let text = value
        .as_str()
        .ok_or_else(|| RpcError::Malformed("Expected tx hash string in response".to_string()))?;

    text.parse::<TxHash>()
        .map_err(|err| RpcError::Malformed(format!("invalid tx hash {}: {}", text, err)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_value_is_omitted() {
        let tx = TransactionRequest::new(Address::ZERO, Address::ZERO, &[0xab])
            .with_value(Some(U256::ZERO));
        assert_eq!(tx.value, None);
        assert_eq!(tx.data, "0xab");

        let json = serde_json::to_value(&tx).unwrap();
        assert!(json.get("value").is_none());
        assert!(json.get("chainId").is_none());
    }

    #[test]
    fn value_and_chain_id_are_hex_quantities() {
        let tx = TransactionRequest::new(Address::ZERO, Address::ZERO, &[])
            .with_value(Some(U256::from(255u64)))
            .with_chain_id(Some(1001));
        assert_eq!(tx.value.as_deref(), Some("0xff"));
        assert_eq!(tx.chain_id.as_deref(), Some("0x3e9"));
    }

    #[test]
    fn rejects_non_hash_response() {
        assert!(parse_tx_hash(&json!(42)).is_err());
        assert!(parse_tx_hash(&json!("0x1234")).is_err());
        let hash = format!("0x{}", "11".repeat(32));
        assert!(parse_tx_hash(&json!(hash)).is_ok());
    }
}
