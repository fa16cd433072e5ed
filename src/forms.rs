//! Form input validation and submission handling.
//!
//! Every form validates into a typed value or a set of per-field messages.
//! [`FormController`] submits the validated value through the hooks and turns
//! the transaction lifecycle into notifications, resetting the form after each
//! confirmed transaction.

use alloy_primitives::{Address, TxHash, U256, utils::parse_ether};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::config::is_address;
use crate::hooks::{Hooks, NewShipment};
use crate::lifecycle::{TxState, WriteHandle};
use crate::models::ShipmentStatus;
use crate::notify::{Notification, Notifier};

pub const EXAMPLE_CARRIER: &str = "0x2a2cB2F081b651D05B8302f599B102710E8355F5";
pub const MIN_FEEDBACK_CHARS: usize = 10;

/// Field name -> message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(field, message)| format!("{}: {}", field, message)).collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for FieldErrors {}

fn required(errors: &mut FieldErrors, field: &'static str, value: &str, message: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, message);
    }
    value.to_string()
}

/// `YYYY-MM-DD` (midnight UTC) or RFC 3339, strictly after `now`
pub fn parse_deadline(input: &str, now: DateTime<Utc>) -> Option<u64> {
    let input = input.trim();

    let timestamp = match NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        Ok(date) => date.and_hms_opt(0, 0, 0)?.and_utc().timestamp(),
        Err(_) => DateTime::parse_from_rfc3339(input).ok()?.timestamp(),
    };

    if timestamp <= now.timestamp() {
        return None;
    }
    u64::try_from(timestamp).ok()
}

/// Positive decimal amount in ether units, converted to wei
pub fn parse_deposit(input: &str) -> Option<U256> {
    let input = input.trim();
    let amount = input.parse::<f64>().ok()?;
    if !amount.is_finite() || amount <= 0.0 {
        return None;
    }
    parse_ether(input).ok().filter(|wei| !wei.is_zero())
}

pub trait Form: Default + Clone + Send {
    type Valid: Send;

    fn validate(&self, now: DateTime<Utc>) -> Result<Self::Valid, FieldErrors>;

    fn submit(hooks: &Hooks, valid: &Self::Valid) -> WriteHandle;

    fn submitting_message(valid: &Self::Valid) -> String;

    fn success_message() -> &'static str;

    fn error_prefix() -> &'static str;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateShipmentForm {
    pub shipment_code: String,
    pub product_name: String,
    pub origin: String,
    pub destination: String,
    pub carrier: String,
    /// Empty means no deadline
    pub deadline: String,
    /// Empty means no escrow deposit
    pub deposit_amount: String,
}

impl CreateShipmentForm {
    /// Sample input with a unique-looking code and a deadline a week out
    pub fn quick_fill_example(now: DateTime<Utc>, seed: u32) -> Self {
        let deadline = (now + Duration::days(7)).format("%Y-%m-%d").to_string();
        Self {
            shipment_code: format!("SHIP{:04}", seed % 10_000),
            product_name: "Electronics".to_string(),
            origin: "Ho Chi Minh City".to_string(),
            destination: "Tokyo".to_string(),
            carrier: EXAMPLE_CARRIER.to_string(),
            deadline,
            deposit_amount: "0.2".to_string(),
        }
    }
}

impl Form for CreateShipmentForm {
    type Valid = NewShipment;

    fn validate(&self, now: DateTime<Utc>) -> Result<NewShipment, FieldErrors> {
        let mut errors = FieldErrors::default();

        let code = required(&mut errors, "shipment_code", &self.shipment_code, "Shipment code is required");
        let product_name = required(&mut errors, "product_name", &self.product_name, "Product name is required");
        let origin = required(&mut errors, "origin", &self.origin, "Origin is required");
        let destination = required(&mut errors, "destination", &self.destination, "Destination is required");

        let carrier = self.carrier.trim();
        let carrier = if is_address(carrier) { carrier.parse::<Address>().ok() } else { None };
        if carrier.is_none() {
            errors.add("carrier", "Invalid wallet address");
        }

        let deadline = if self.deadline.trim().is_empty() {
            None
        } else {
            let parsed = parse_deadline(&self.deadline, now);
            if parsed.is_none() {
                errors.add("deadline", "Deadline must be a valid future date");
            }
            parsed
        };

        let deposit = if self.deposit_amount.trim().is_empty() {
            None
        } else {
            let parsed = parse_deposit(&self.deposit_amount);
            if parsed.is_none() {
                errors.add("deposit_amount", "Invalid deposit amount");
            }
            parsed
        };

        errors.into_result(|| NewShipment {
            code,
            product_name,
            origin,
            destination,
            carrier: carrier.unwrap_or_default(),
            deadline,
            deposit,
        })
    }

    fn submit(hooks: &Hooks, valid: &NewShipment) -> WriteHandle {
        hooks.create_shipment(valid)
    }

    fn submitting_message(valid: &NewShipment) -> String {
        if valid.deposit.is_some() {
            format!("Creating shipment {} with escrow deposit...", valid.code)
        } else {
            format!("Creating shipment {}...", valid.code)
        }
    }

    fn success_message() -> &'static str {
        "Shipment created successfully!"
    }

    fn error_prefix() -> &'static str {
        "An error occurred: "
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddEventForm {
    pub shipment_code: String,
    pub location: String,
    pub event_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub code: String,
    pub location: String,
    pub event_type: String,
}

impl Form for AddEventForm {
    type Valid = NewEvent;

    fn validate(&self, _now: DateTime<Utc>) -> Result<NewEvent, FieldErrors> {
        let mut errors = FieldErrors::default();
        let code = required(&mut errors, "shipment_code", &self.shipment_code, "Shipment code is required");
        let location = required(&mut errors, "location", &self.location, "Location is required");
        let event_type = required(&mut errors, "event_type", &self.event_type, "Event type is required");

        errors.into_result(|| NewEvent { code, location, event_type })
    }

    fn submit(hooks: &Hooks, valid: &NewEvent) -> WriteHandle {
        hooks.add_shipment_event(&valid.code, &valid.location, &valid.event_type)
    }

    fn submitting_message(valid: &NewEvent) -> String {
        format!("Adding event to {}...", valid.code)
    }

    fn success_message() -> &'static str {
        "Event added successfully!"
    }

    fn error_prefix() -> &'static str {
        "Failed to add event: "
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateStatusForm {
    pub shipment_code: String,
    /// Numeric encoding or status name
    pub new_status: String,
    pub note: String,
}

impl Default for UpdateStatusForm {
    fn default() -> Self {
        Self {
            shipment_code: String::new(),
            new_status: "0".to_string(),
            note: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub code: String,
    pub status: ShipmentStatus,
    pub note: Option<String>,
}

impl Form for UpdateStatusForm {
    type Valid = StatusUpdate;

    fn validate(&self, _now: DateTime<Utc>) -> Result<StatusUpdate, FieldErrors> {
        let mut errors = FieldErrors::default();
        let code = required(&mut errors, "shipment_code", &self.shipment_code, "Shipment code is required");

        let status = self.new_status.parse::<ShipmentStatus>().ok();
        if status.is_none() {
            errors.add("new_status", "Status must be one of Pending, InTransit, Delivered, Canceled");
        }

        // Note is forwarded unchanged
        let note = (!self.note.is_empty()).then(|| self.note.clone());

        errors.into_result(|| StatusUpdate {
            code,
            status: status.unwrap_or(ShipmentStatus::Pending),
            note,
        })
    }

    fn submit(hooks: &Hooks, valid: &StatusUpdate) -> WriteHandle {
        hooks.update_shipment_status(&valid.code, valid.status, valid.note.as_deref())
    }

    fn submitting_message(valid: &StatusUpdate) -> String {
        format!("Updating {} to {}...", valid.code, valid.status)
    }

    fn success_message() -> &'static str {
        "Status updated successfully!"
    }

    fn error_prefix() -> &'static str {
        "Failed to update status: "
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateCarrierForm {
    pub shipment_code: String,
    pub rating: u8,
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarrierRating {
    pub code: String,
    pub rating: u8,
    pub feedback: String,
}

impl Form for RateCarrierForm {
    type Valid = CarrierRating;

    fn validate(&self, _now: DateTime<Utc>) -> Result<CarrierRating, FieldErrors> {
        let mut errors = FieldErrors::default();
        let code = required(&mut errors, "shipment_code", &self.shipment_code, "Shipment code is required");

        if self.rating < 1 {
            errors.add("rating", "Rating must be at least 1");
        } else if self.rating > 5 {
            errors.add("rating", "Rating cannot exceed 5");
        }

        let feedback = self.feedback.trim().to_string();
        if feedback.chars().count() < MIN_FEEDBACK_CHARS {
            errors.add("feedback", "Feedback must be at least 10 characters");
        }

        errors.into_result(|| CarrierRating { code, rating: self.rating, feedback })
    }

    fn submit(hooks: &Hooks, valid: &CarrierRating) -> WriteHandle {
        hooks.rate_carrier(&valid.code, valid.rating, &valid.feedback)
    }

    fn submitting_message(_valid: &CarrierRating) -> String {
        "Submitting carrier rating...".to_string()
    }

    fn success_message() -> &'static str {
        "Rating submitted successfully!"
    }

    fn error_prefix() -> &'static str {
        "Error submitting rating: "
    }
}

pub struct FormController<F: Form, N: Notifier> {
    form: F,
    notifier: N,
    errors: FieldErrors,
    confirmed: HashSet<TxHash>,
    confirming_reported: bool,
    failure_reported: bool,
}

impl<F: Form, N: Notifier> FormController<F, N> {
    pub fn new(notifier: N) -> Self {
        Self::with_form(F::default(), notifier)
    }

    pub fn with_form(form: F, notifier: N) -> Self {
        Self {
            form,
            notifier,
            errors: FieldErrors::default(),
            confirmed: HashSet::new(),
            confirming_reported: false,
            failure_reported: false,
        }
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut F {
        &mut self.form
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Validates and submits; nothing is sent when validation fails
    pub fn submit(&mut self, hooks: &Hooks, now: DateTime<Utc>) -> Result<WriteHandle, FieldErrors> {
        let valid = match self.form.validate(now) {
            Ok(valid) => valid,
            Err(errors) => {
                self.errors = errors.clone();
                return Err(errors);
            }
        };

        self.errors = FieldErrors::default();
        self.confirming_reported = false;
        self.failure_reported = false;

        let handle = F::submit(hooks, &valid);
        self.notifier.notify(Notification::info(F::submitting_message(&valid)));
        Ok(handle)
    }

    pub fn observe(&mut self, state: &TxState) {
        match state {
            TxState::Pending => {}
            TxState::Confirming(hash) => {
                if !self.confirming_reported {
                    self.confirming_reported = true;
                    self.notifier.notify(Notification::info(format!("Confirming on blockchain... ({})", hash)));
                }
            }
            TxState::Confirmed(receipt) => {
                if self.confirmed.insert(receipt.tx_hash) {
                    self.form = F::default();
                    self.notifier.notify(Notification::success(F::success_message()));
                }
            }
            TxState::Failed(error) => {
                if !self.failure_reported {
                    self.failure_reported = true;
                    self.notifier.notify(Notification::error(format!("{}{}", F::error_prefix(), error)));
                }
            }
        }
    }

    /// Follows the handle to its terminal state
    pub async fn drive(&mut self, handle: &WriteHandle) -> TxState {
        let mut rx = handle.subscribe();
        loop {
            let state = rx.borrow_and_update().clone();
            self.observe(&state);
            if state.is_settled() {
                return state;
            }
            if rx.changed().await.is_err() {
                let state = rx.borrow().clone();
                self.observe(&state);
                return state;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn valid_create() -> CreateShipmentForm {
        CreateShipmentForm {
            shipment_code: "SH-2025-001".to_string(),
            product_name: "Consumer Electronics".to_string(),
            origin: "Ho Chi Minh City, Vietnam".to_string(),
            destination: "Tokyo, Japan".to_string(),
            carrier: EXAMPLE_CARRIER.to_string(),
            deadline: "2025-06-08".to_string(),
            deposit_amount: "0.2".to_string(),
        }
    }

    #[test]
    fn create_form_accepts_valid_input() {
        let shipment = valid_create().validate(now()).unwrap();
        assert_eq!(shipment.code, "SH-2025-001");
        assert_eq!(shipment.deadline, Some(1_749_340_800));
        assert_eq!(shipment.deposit, Some(U256::from(200_000_000_000_000_000u64)));
    }

    #[test]
    fn create_form_reports_every_field() {
        let errors = CreateShipmentForm::default().validate(now()).unwrap_err();
        assert_eq!(errors.get("shipment_code"), Some("Shipment code is required"));
        assert_eq!(errors.get("product_name"), Some("Product name is required"));
        assert_eq!(errors.get("carrier"), Some("Invalid wallet address"));
        // Optional fields stay silent when blank
        assert_eq!(errors.get("deadline"), None);
        assert_eq!(errors.get("deposit_amount"), None);
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn create_form_rejects_past_deadline_and_bad_deposit() {
        let mut form = valid_create();
        form.deadline = "2025-06-01".to_string();
        form.deposit_amount = "-1".to_string();
        let errors = form.validate(now()).unwrap_err();
        assert_eq!(errors.get("deadline"), Some("Deadline must be a valid future date"));
        assert_eq!(errors.get("deposit_amount"), Some("Invalid deposit amount"));

        form.deadline = "tomorrow".to_string();
        form.deposit_amount = "0".to_string();
        let errors = form.validate(now()).unwrap_err();
        assert!(errors.get("deadline").is_some());
        assert!(errors.get("deposit_amount").is_some());
    }

    #[test]
    fn deadline_accepts_rfc3339() {
        assert_eq!(parse_deadline("2025-06-01T12:00:01Z", now()), Some(1_748_779_201));
        assert_eq!(parse_deadline("2025-06-01T12:00:00Z", now()), None);
    }

    #[test]
    fn carrier_must_be_forty_hex_digits() {
        let mut form = valid_create();
        form.carrier = "0x2a2cB2F081b651D05B8302f599B102710E8355F".to_string();
        assert_eq!(form.validate(now()).unwrap_err().get("carrier"), Some("Invalid wallet address"));
    }

    #[test]
    fn status_form_parses_names() {
        let form = UpdateStatusForm {
            shipment_code: "SH-1".to_string(),
            new_status: "delivered".to_string(),
            note: "  signed by recipient ".to_string(),
        };
        let update = form.validate(now()).unwrap();
        assert_eq!(update.status, ShipmentStatus::Delivered);
        assert_eq!(update.note.as_deref(), Some("  signed by recipient "));

        let bad = UpdateStatusForm { new_status: "7".to_string(), ..form };
        assert!(bad.validate(now()).unwrap_err().get("new_status").is_some());
    }

    #[test]
    fn rating_form_bounds() {
        let mut form = RateCarrierForm {
            shipment_code: "SH-1".to_string(),
            rating: 0,
            feedback: "short".to_string(),
        };
        let errors = form.validate(now()).unwrap_err();
        assert_eq!(errors.get("rating"), Some("Rating must be at least 1"));
        assert_eq!(errors.get("feedback"), Some("Feedback must be at least 10 characters"));

        form.rating = 6;
        assert_eq!(form.validate(now()).unwrap_err().get("rating"), Some("Rating cannot exceed 5"));

        form.rating = 5;
        form.feedback = "Fast and careful".to_string();
        assert_eq!(form.validate(now()).unwrap().rating, 5);
    }

    #[test]
    fn event_form_requires_all_fields() {
        let errors = AddEventForm::default().validate(now()).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn example_is_valid() {
        let form = CreateShipmentForm::quick_fill_example(now(), 123_456);
        assert_eq!(form.shipment_code, "SHIP3456");
        assert!(form.validate(now()).is_ok());
    }
}
