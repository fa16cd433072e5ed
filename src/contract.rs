use alloy_primitives::{Address, TxHash, U256};
use alloy_sol_types::SolCall;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::abi::ILogistics;
use crate::config::Config;
use crate::models::{CarrierStats, EscrowInfo, Shipment, ShipmentEvent, ShipmentStatus, StatusChange};
use crate::rpc::{HttpTransport, RpcError, RpcTransport, parse_bytes, parse_quantity};
use crate::submitter::{TransactionRequest, TxSubmitter, WalletSubmitter};

#[derive(Debug, Error)]
pub enum ContractError {
    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error("failed to decode {function} result: {source}")]
    Decode {
        function: &'static str,
        #[source]
        source: alloy_sol_types::Error,
    },

    #[error("SENDER_ADDRESS is not configured; connect a wallet account to submit transactions")]
    MissingSender,

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("transaction {0} was reverted")]
    Reverted(TxHash),

    #[error("transaction {hash} was not confirmed within {waited:?}")]
    ConfirmationTimeout { hash: TxHash, waited: Duration },
}

impl ContractError {
    /// The contract reports unknown shipment codes by reverting
    pub fn is_missing_record(&self) -> bool {
        let ContractError::Rpc(RpcError::Remote(remote)) = self else {
            return false;
        };

        // Only a revert speaks for the contract; other node errors pass through
        let Some(reason) = remote.revert_reason() else {
            return false;
        };

        let reason = reason.to_ascii_lowercase();
        reason.contains("not exist") || reason.contains("not found")
    }
}

/// Receipt subset needed to settle a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub success: bool,
}

impl TxReceipt {
    fn from_json(tx_hash: TxHash, value: &Value) -> Result<Self, RpcError> {
        let status = value
            .get("status")
            .ok_or_else(|| RpcError::Malformed("receipt without status".to_string()))?;

        let block_number = match value.get("blockNumber") {
            Some(Value::Null) | None => None,
            Some(number) => Some(parse_quantity(number)?),
        };

        Ok(Self {
            tx_hash,
            block_number,
            success: parse_quantity(status)? == 1,
        })
    }
}

pub struct LogisticsClient {
    /// `Err` carries the configured text when it is not a valid address
    address: Result<Address, String>,
    sender: Option<Address>,
    chain_id: Option<u64>,
    poll_interval: Duration,
    receipt_timeout: Duration,
    transport: Arc<dyn RpcTransport>,
    submitter: Box<dyn TxSubmitter>,
}

impl LogisticsClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let transport: Arc<dyn RpcTransport> = Arc::new(HttpTransport::new(config.rpc_url.clone())?);

        let signer: Arc<dyn RpcTransport> = if config.signer_url == config.rpc_url {
            transport.clone()
        } else {
            Arc::new(HttpTransport::new(config.signer_url.clone())?)
        };

        Self::with_parts(config, transport, Box::new(WalletSubmitter::new(signer)))
    }

    pub fn with_parts(
        config: &Config,
        transport: Arc<dyn RpcTransport>,
        submitter: Box<dyn TxSubmitter>,
    ) -> anyhow::Result<Self> {
        let address = config.contract_address().map_err(|err| {
            tracing::warn!(address = %config.contract_address, error = %err, "contract calls will fail until the address is fixed");
            config.contract_address.clone()
        });

        Ok(Self {
            address,
            sender: config.sender_address,
            chain_id: config.chain_id,
            poll_interval: config.receipt_poll_interval,
            receipt_timeout: config.receipt_timeout,
            transport,
            submitter,
        })
    }

    /// `None` when the configured address is malformed
    pub fn address(&self) -> Option<Address> {
        self.address.as_ref().ok().copied()
    }

    fn target(&self) -> Result<Address, ContractError> {
        self.address
            .clone()
            .map_err(ContractError::InvalidAddress)
    }

    async fn call<C: SolCall>(&self, call: &C) -> Result<C::Return, ContractError> {
        let address = self.target()?;
        let params = json!([
            {
                "to": address.to_string(),
                "data": format!("0x{}", hex::encode(call.abi_encode())),
            },
            "latest",
        ]);

        let response = self.transport.request("eth_call", params).await?;
        let bytes = parse_bytes(&response)?;

        C::abi_decode_returns(&bytes, true).map_err(|source| ContractError::Decode {
            function: C::SIGNATURE,
            source,
        })
    }

    pub async fn get_shipment(&self, code: &str) -> Result<Option<Shipment>, ContractError> {
        let call = ILogistics::getShipmentCall {
            shipmentCode: code.to_string(),
        };

        match self.call(&call).await {
            // An unset mapping slot decodes as an empty record
            Ok(ret) if ret._0.shipmentCode.is_empty() => Ok(None),
            Ok(ret) => Ok(Some(Shipment::from(ret._0))),
            Err(err) if err.is_missing_record() => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub async fn get_shipment_events(&self, code: &str) -> Result<Vec<ShipmentEvent>, ContractError> {
        let call = ILogistics::getShipmentEventsCall {
            shipmentCode: code.to_string(),
        };

        match self.call(&call).await {
            Ok(ret) => Ok(ret._0.into_iter().map(ShipmentEvent::from).collect()),
            Err(err) if err.is_missing_record() => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    pub async fn get_status_history(&self, code: &str) -> Result<Vec<StatusChange>, ContractError> {
        let call = ILogistics::getStatusHistoryCall {
            shipmentCode: code.to_string(),
        };

        match self.call(&call).await {
            Ok(ret) => Ok(ret._0.into_iter().map(StatusChange::from).collect()),
            Err(err) if err.is_missing_record() => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    pub async fn get_escrow(&self, code: &str) -> Result<EscrowInfo, ContractError> {
        let call = ILogistics::isEscrowReleasedCall {
            shipmentCode: code.to_string(),
        };
        let ret = self.call(&call).await?;

        Ok(EscrowInfo {
            released: ret.released,
            refunded: ret.refunded,
            deposit_amount: ret.depositAmount,
        })
    }

    /// Average rating scaled by 100
    pub async fn get_carrier_average_rating(&self, carrier: Address) -> Result<u64, ContractError> {
        let ret = self.call(&ILogistics::getCarrierAverageRatingCall { carrier }).await?;
        Ok(ret._0.saturating_to::<u64>())
    }

    pub async fn get_carrier_stats(&self, carrier: Address) -> Result<CarrierStats, ContractError> {
        let ret = self.call(&ILogistics::carrierStatsCall { carrier }).await?;

        Ok(CarrierStats {
            total_rating: ret.totalRating.saturating_to::<u64>(),
            rating_count: ret.ratingCount.saturating_to::<u64>(),
        })
    }

    pub async fn chain_id(&self) -> Result<u64, ContractError> {
        let response = self.transport.request("eth_chainId", json!([])).await?;
        Ok(parse_quantity(&response)?)
    }

    pub fn create_shipment_call(
        code: &str,
        product_name: &str,
        origin: &str,
        destination: &str,
        carrier: Address,
        deadline: Option<u64>,
    ) -> ILogistics::createShipmentCall {
        ILogistics::createShipmentCall {
            shipmentCode: code.to_string(),
            productName: product_name.to_string(),
            origin: origin.to_string(),
            destination: destination.to_string(),
            carrier,
            deadline: U256::from(deadline.unwrap_or_default()),
        }
    }

    pub fn add_event_call(code: &str, location: &str, event_type: &str) -> ILogistics::addShipmentEventCall {
        ILogistics::addShipmentEventCall {
            shipmentCode: code.to_string(),
            location: location.to_string(),
            eventType: event_type.to_string(),
        }
    }

    pub fn update_status_call(code: &str, status: ShipmentStatus, note: &str) -> ILogistics::updateShipmentStatusCall {
        ILogistics::updateShipmentStatusCall {
            shipmentCode: code.to_string(),
            newStatus: status.as_u8(),
            note: note.to_string(),
        }
    }

    pub fn rate_carrier_call(code: &str, rating: u8, feedback: &str) -> ILogistics::rateCarrierCall {
        ILogistics::rateCarrierCall {
            shipmentCode: code.to_string(),
            rating,
            feedback: feedback.to_string(),
        }
    }

    /// Hands the encoded call to the wallet and returns the broadcast hash
    pub async fn send<C: SolCall>(&self, call: &C, value: Option<U256>) -> Result<TxHash, ContractError> {
        let address = self.target()?;
        let sender = self.sender.ok_or(ContractError::MissingSender)?;

        let tx = TransactionRequest::new(sender, address, &call.abi_encode())
            .with_value(value)
            .with_chain_id(self.chain_id);

        tracing::info!(function = C::SIGNATURE, from = %sender, "submitting transaction");

        Ok(self.submitter.submit(&tx).await?)
    }

    pub async fn transaction_receipt(&self, hash: TxHash) -> Result<Option<TxReceipt>, ContractError> {
        let response = self.transport
            .request("eth_getTransactionReceipt", json!([hash.to_string()]))
            .await?;

        if response.is_null() {
            return Ok(None);
        }

        Ok(Some(TxReceipt::from_json(hash, &response)?))
    }

    /// Polls for the receipt until it appears or the configured timeout passes
    pub async fn wait_for_receipt(&self, hash: TxHash) -> Result<TxReceipt, ContractError> {
        let started = tokio::time::Instant::now();

        loop {
            if let Some(receipt) = self.transaction_receipt(hash).await? {
                return Ok(receipt);
            }

            let waited = started.elapsed();
            if waited >= self.receipt_timeout {
                return Err(ContractError::ConfirmationTimeout { hash, waited });
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::RemoteError;

    fn remote(message: &str) -> ContractError {
        ContractError::Rpc(RpcError::Remote(RemoteError {
            code: 3,
            message: message.to_string(),
            data: None,
        }))
    }

    #[test]
    fn missing_record_detection() {
        assert!(remote("execution reverted: Shipment does not exist").is_missing_record());
        assert!(remote("execution reverted: shipment not found").is_missing_record());
        assert!(!remote("execution reverted: Only creator").is_missing_record());
        assert!(!ContractError::MissingSender.is_missing_record());
    }

    #[test]
    fn node_errors_are_not_missing_records() {
        let unsupported = ContractError::Rpc(RpcError::Remote(RemoteError {
            code: -32601,
            message: "the method eth_call does not exist/is not available".to_string(),
            data: None,
        }));
        assert!(!unsupported.is_missing_record());
        assert!(!remote("header not found").is_missing_record());
    }

    #[test]
    fn receipt_parsing() {
        let hash = TxHash::repeat_byte(0x11);
        let receipt = TxReceipt::from_json(hash, &json!({ "status": "0x1", "blockNumber": "0x10" })).unwrap();
        assert!(receipt.success);
        assert_eq!(receipt.block_number, Some(16));

        let reverted = TxReceipt::from_json(hash, &json!({ "status": "0x0", "blockNumber": null })).unwrap();
        assert!(!reverted.success);
        assert_eq!(reverted.block_number, None);

        assert!(TxReceipt::from_json(hash, &json!({})).is_err());
    }

    #[test]
    fn missing_deadline_encodes_as_zero() {
        let call = LogisticsClient::create_shipment_call("SH", "Tea", "A", "B", Address::ZERO, None);
        assert_eq!(call.deadline, U256::ZERO);
    }
}
