use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;

use crate::config::is_address;
use crate::contract::{ContractError, LogisticsClient};
use crate::lifecycle::{self, TxState, WriteHandle};
use crate::models::{CarrierProfile, CarrierStats, EscrowInfo, Shipment, ShipmentEvent, ShipmentStatus, StatusChange};

/// Outcome of a read wrapper
#[derive(Debug, Clone)]
pub enum QueryState<T> {
    /// Input was empty, nothing was requested
    Disabled,
    Loading,
    Ready(T),
    Failed(Arc<ContractError>),
}

impl<T> QueryState<T> {
    fn settle(result: Result<T, ContractError>) -> Self {
        match result {
            Ok(value) => QueryState::Ready(value),
            Err(err) => QueryState::Failed(Arc::new(err)),
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, QueryState::Disabled)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, QueryState::Loading)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, QueryState::Failed(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            QueryState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&Arc<ContractError>> {
        match self {
            QueryState::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryState<U> {
        match self {
            QueryState::Disabled => QueryState::Disabled,
            QueryState::Loading => QueryState::Loading,
            QueryState::Ready(value) => QueryState::Ready(f(value)),
            QueryState::Failed(err) => QueryState::Failed(err),
        }
    }
}

type Fetch<T> = fn(Hooks, String) -> BoxFuture<'static, QueryState<T>>;

/// A read bound to its key; `refetch` repeats it
pub struct ReadQuery<T> {
    hooks: Hooks,
    key: String,
    fetch: Fetch<T>,
    state: QueryState<T>,
}

impl<T> ReadQuery<T> {
    fn new(hooks: Hooks, key: &str, fetch: Fetch<T>) -> Self {
        let key = key.trim().to_string();
        let state = if key.is_empty() { QueryState::Disabled } else { QueryState::Loading };
        Self { hooks, key, fetch, state }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn state(&self) -> &QueryState<T> {
        &self.state
    }

    pub async fn refetch(&mut self) -> &QueryState<T> {
        if !self.key.is_empty() {
            self.state = QueryState::Loading;
            self.state = (self.fetch)(self.hooks.clone(), self.key.clone()).await;
        }
        &self.state
    }
}

/// Arguments of `createShipment`, already validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShipment {
    pub code: String,
    pub product_name: String,
    pub origin: String,
    pub destination: String,
    pub carrier: Address,
    /// Unix seconds
    pub deadline: Option<u64>,
    /// Wei attached as escrow
    pub deposit: Option<U256>,
}

/// Read and write wrappers bound to the configured contract
#[derive(Clone)]
pub struct Hooks {
    client: Arc<LogisticsClient>,
}

impl Hooks {
    pub fn new(client: Arc<LogisticsClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &LogisticsClient {
        &self.client
    }

    pub async fn get_shipment(&self, code: &str) -> QueryState<Option<Shipment>> {
        let code = code.trim();
        if code.is_empty() {
            return QueryState::Disabled;
        }
        QueryState::settle(self.client.get_shipment(code).await)
    }

    pub async fn get_shipment_events(&self, code: &str) -> QueryState<Vec<ShipmentEvent>> {
        let code = code.trim();
        if code.is_empty() {
            return QueryState::Disabled;
        }
        QueryState::settle(self.client.get_shipment_events(code).await)
    }

    pub async fn get_status_history(&self, code: &str) -> QueryState<Vec<StatusChange>> {
        let code = code.trim();
        if code.is_empty() {
            return QueryState::Disabled;
        }
        QueryState::settle(self.client.get_status_history(code).await)
    }

    pub async fn get_escrow(&self, code: &str) -> QueryState<EscrowInfo> {
        let code = code.trim();
        if code.is_empty() {
            return QueryState::Disabled;
        }
        QueryState::settle(self.client.get_escrow(code).await)
    }

    /// Average rating x100
    pub async fn get_carrier_average_rating(&self, address: &str) -> QueryState<u64> {
        match parse_carrier(address) {
            None => QueryState::Disabled,
            Some(Err(err)) => QueryState::Failed(Arc::new(err)),
            Some(Ok(carrier)) => QueryState::settle(self.client.get_carrier_average_rating(carrier).await),
        }
    }

    pub async fn get_carrier_stats(&self, address: &str) -> QueryState<CarrierStats> {
        match parse_carrier(address) {
            None => QueryState::Disabled,
            Some(Err(err)) => QueryState::Failed(Arc::new(err)),
            Some(Ok(carrier)) => QueryState::settle(self.client.get_carrier_stats(carrier).await),
        }
    }

    /// Average and stats fetched together
    pub async fn get_carrier_profile(&self, address: &str) -> QueryState<CarrierProfile> {
        let carrier = match parse_carrier(address) {
            None => return QueryState::Disabled,
            Some(Err(err)) => return QueryState::Failed(Arc::new(err)),
            Some(Ok(carrier)) => carrier,
        };

        let (average, stats) = futures::join!(
            self.client.get_carrier_average_rating(carrier),
            self.client.get_carrier_stats(carrier),
        );

        match (average, stats) {
            (Ok(average_times100), Ok(stats)) => QueryState::Ready(CarrierProfile {
                address: carrier,
                average_times100,
                stats,
            }),
            (Err(err), _) | (_, Err(err)) => QueryState::Failed(Arc::new(err)),
        }
    }

    pub fn shipment_query(&self, code: &str) -> ReadQuery<Option<Shipment>> {
        ReadQuery::new(self.clone(), code, |hooks, key| async move { hooks.get_shipment(&key).await }.boxed())
    }

    pub fn events_query(&self, code: &str) -> ReadQuery<Vec<ShipmentEvent>> {
        ReadQuery::new(self.clone(), code, |hooks, key| async move { hooks.get_shipment_events(&key).await }.boxed())
    }

    pub fn history_query(&self, code: &str) -> ReadQuery<Vec<StatusChange>> {
        ReadQuery::new(self.clone(), code, |hooks, key| async move { hooks.get_status_history(&key).await }.boxed())
    }

    pub fn escrow_query(&self, code: &str) -> ReadQuery<EscrowInfo> {
        ReadQuery::new(self.clone(), code, |hooks, key| async move { hooks.get_escrow(&key).await }.boxed())
    }

    pub fn carrier_profile_query(&self, address: &str) -> ReadQuery<CarrierProfile> {
        ReadQuery::new(self.clone(), address, |hooks, key| async move { hooks.get_carrier_profile(&key).await }.boxed())
    }

    pub fn create_shipment(&self, shipment: &NewShipment) -> WriteHandle {
        let call = LogisticsClient::create_shipment_call(
            &shipment.code,
            &shipment.product_name,
            &shipment.origin,
            &shipment.destination,
            shipment.carrier,
            shipment.deadline,
        );
        self.spawn_write(call, shipment.deposit)
    }

    pub fn add_shipment_event(&self, code: &str, location: &str, event_type: &str) -> WriteHandle {
        self.spawn_write(LogisticsClient::add_event_call(code, location, event_type), None)
    }

    pub fn update_shipment_status(&self, code: &str, status: ShipmentStatus, note: Option<&str>) -> WriteHandle {
        let call = LogisticsClient::update_status_call(code, status, note.unwrap_or_default());
        self.spawn_write(call, None)
    }

    pub fn rate_carrier(&self, code: &str, rating: u8, feedback: &str) -> WriteHandle {
        self.spawn_write(LogisticsClient::rate_carrier_call(code, rating, feedback), None)
    }

    fn spawn_write<C>(&self, call: C, value: Option<U256>) -> WriteHandle
    where
        C: SolCall + Send + Sync + 'static,
    {
        let (sender, handle) = lifecycle::channel();
        let client = self.client.clone();

        tokio::spawn(async move {
            let hash = match client.send(&call, value).await {
                Ok(hash) => hash,
                Err(err) => {
                    tracing::warn!(function = C::SIGNATURE, error = %err, "transaction submission failed");
                    sender.publish(TxState::Failed(Arc::new(err)));
                    return;
                }
            };

            sender.publish(TxState::Confirming(hash));

            let state = match client.wait_for_receipt(hash).await {
                Ok(receipt) if receipt.success => TxState::Confirmed(receipt),
                Ok(_) => TxState::Failed(Arc::new(ContractError::Reverted(hash))),
                Err(err) => TxState::Failed(Arc::new(err)),
            };

            tracing::info!(function = C::SIGNATURE, tx = %hash, phase = ?state.phase(), "transaction settled");
            sender.publish(state);
        });

        handle
    }
}

fn parse_carrier(address: &str) -> Option<Result<Address, ContractError>> {
    let address = address.trim();
    if address.is_empty() {
        return None;
    }
    if !is_address(address) {
        return Some(Err(ContractError::InvalidAddress(address.to_string())));
    }
    Some(
        address
            .parse::<Address>()
            .map_err(|_| ContractError::InvalidAddress(address.to_string())),
    )
}
