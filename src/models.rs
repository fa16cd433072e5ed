use alloy_primitives::{Address, U256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::abi::ILogistics;

/// Shipment status as stored by the contract (`uint8`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShipmentStatus {
    Pending,
    InTransit,
    Delivered,
    Canceled,
    /// Any discriminant the contract may add later
    Unknown(u8),
}

impl ShipmentStatus {
    pub const ALL: [ShipmentStatus; 4] = [
        ShipmentStatus::Pending,
        ShipmentStatus::InTransit,
        ShipmentStatus::Delivered,
        ShipmentStatus::Canceled,
    ];

    pub fn as_u8(self) -> u8 {
        match self {
            ShipmentStatus::Pending => 0,
            ShipmentStatus::InTransit => 1,
            ShipmentStatus::Delivered => 2,
            ShipmentStatus::Canceled => 3,
            ShipmentStatus::Unknown(raw) => raw,
        }
    }

    pub fn is_known(self) -> bool {
        !matches!(self, ShipmentStatus::Unknown(_))
    }
}

impl From<u8> for ShipmentStatus {
    fn from(raw: u8) -> Self {
        match raw {
            0 => ShipmentStatus::Pending,
            1 => ShipmentStatus::InTransit,
            2 => ShipmentStatus::Delivered,
            3 => ShipmentStatus::Canceled,
            other => ShipmentStatus::Unknown(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized shipment status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for ShipmentStatus {
    type Err = ParseStatusError;

    /// Accepts the numeric encoding or a status name (`in-transit`, `InTransit`, ...)
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalized: String = input
            .trim()
            .chars()
            .filter(|ch| !matches!(ch, ' ' | '-' | '_'))
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "0" | "pending" | "created" => Ok(ShipmentStatus::Pending),
            "1" | "intransit" => Ok(ShipmentStatus::InTransit),
            "2" | "delivered" => Ok(ShipmentStatus::Delivered),
            "3" | "canceled" | "cancelled" => Ok(ShipmentStatus::Canceled),
            _ => Err(ParseStatusError(input.trim().to_string())),
        }
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShipmentStatus::Pending => f.write_str("Pending"),
            ShipmentStatus::InTransit => f.write_str("InTransit"),
            ShipmentStatus::Delivered => f.write_str("Delivered"),
            ShipmentStatus::Canceled => f.write_str("Canceled"),
            ShipmentStatus::Unknown(raw) => write!(f, "Unknown({})", raw),
        }
    }
}

/// On-chain shipment record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shipment {
    pub shipment_code: String,
    pub product_name: String,
    pub origin: String,
    pub destination: String,
    pub current_status: ShipmentStatus,
    pub creator: Address,
    pub carrier: Address,
    pub created_at: u64,
    pub deadline: Option<u64>,
    pub deposit_amount: U256,
    pub released: bool,
    pub refunded: bool,
    pub is_rated: bool,
    pub rating: u8,
    pub feedback: String,
}

impl Shipment {
    pub fn escrow(&self) -> EscrowInfo {
        EscrowInfo {
            released: self.released,
            refunded: self.refunded,
            deposit_amount: self.deposit_amount,
        }
    }
}

impl From<ILogistics::Shipment> for Shipment {
    fn from(raw: ILogistics::Shipment) -> Self {
        let deadline = raw.deadline.saturating_to::<u64>();
        Self {
            shipment_code: raw.shipmentCode,
            product_name: raw.productName,
            origin: raw.origin,
            destination: raw.destination,
            current_status: ShipmentStatus::from(raw.currentStatus),
            creator: raw.creator,
            carrier: raw.carrier,
            created_at: raw.createdAt.saturating_to::<u64>(),
            deadline: (deadline != 0).then_some(deadline),
            deposit_amount: raw.depositAmount,
            released: raw.isReleased,
            refunded: raw.isRefunded,
            is_rated: raw.isRated,
            rating: raw.rating,
            feedback: raw.feedback,
        }
    }
}

/// Append-only tracking event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentEvent {
    pub location: String,
    pub event_type: String,
    pub timestamp: u64,
    pub updated_by: Address,
}

impl From<ILogistics::ShipmentEvent> for ShipmentEvent {
    fn from(raw: ILogistics::ShipmentEvent) -> Self {
        Self {
            location: raw.location,
            event_type: raw.eventType,
            timestamp: raw.timestamp.saturating_to::<u64>(),
            updated_by: raw.updatedBy,
        }
    }
}

/// Status audit trail entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub old_status: ShipmentStatus,
    pub new_status: ShipmentStatus,
    pub timestamp: u64,
    pub changed_by: Address,
    pub note: String,
}

impl From<ILogistics::StatusChange> for StatusChange {
    fn from(raw: ILogistics::StatusChange) -> Self {
        Self {
            old_status: ShipmentStatus::from(raw.oldStatus),
            new_status: ShipmentStatus::from(raw.newStatus),
            timestamp: raw.timestamp.saturating_to::<u64>(),
            changed_by: raw.changedBy,
            note: raw.note,
        }
    }
}

/// Escrow flags; `released` and `refunded` are terminal once set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EscrowInfo {
    pub released: bool,
    pub refunded: bool,
    pub deposit_amount: U256,
}

impl EscrowInfo {
    pub fn has_deposit(&self) -> bool {
        !self.deposit_amount.is_zero()
    }
}

/// Aggregate rating points per carrier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CarrierStats {
    pub total_rating: u64,
    pub rating_count: u64,
}

impl CarrierStats {
    pub fn average(&self) -> Option<f64> {
        if self.rating_count == 0 {
            return None;
        }
        Some(self.total_rating as f64 / self.rating_count as f64)
    }
}

/// Carrier lookup result combining the contract's average (x100) and raw stats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarrierProfile {
    pub address: Address,
    pub average_times100: u64,
    pub stats: CarrierStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_u8() {
        for status in ShipmentStatus::ALL {
            assert_eq!(ShipmentStatus::from(status.as_u8()), status);
        }
        assert_eq!(ShipmentStatus::from(9), ShipmentStatus::Unknown(9));
        assert!(!ShipmentStatus::from(9).is_known());
    }

    #[test]
    fn status_parses_names_and_digits() {
        assert_eq!("1".parse::<ShipmentStatus>(), Ok(ShipmentStatus::InTransit));
        assert_eq!("in-transit".parse::<ShipmentStatus>(), Ok(ShipmentStatus::InTransit));
        assert_eq!("Created".parse::<ShipmentStatus>(), Ok(ShipmentStatus::Pending));
        assert_eq!("cancelled".parse::<ShipmentStatus>(), Ok(ShipmentStatus::Canceled));
        assert_eq!("lost".parse::<ShipmentStatus>(), Err(ParseStatusError("lost".to_string())));
        assert_eq!(
            " 9 ".parse::<ShipmentStatus>().unwrap_err().to_string(),
            "unrecognized shipment status: 9"
        );
    }

    #[test]
    fn zero_deadline_means_none() {
        let raw = ILogistics::Shipment {
            shipmentCode: "SH-1".to_string(),
            productName: "Tea".to_string(),
            origin: "Da Lat".to_string(),
            destination: "Osaka".to_string(),
            currentStatus: 1,
            creator: Address::ZERO,
            carrier: Address::ZERO,
            createdAt: U256::from(1_700_000_000u64),
            deadline: U256::ZERO,
            depositAmount: U256::from(5u64),
            isReleased: false,
            isRefunded: false,
            isRated: false,
            rating: 0,
            feedback: String::new(),
        };

        let shipment = Shipment::from(raw);
        assert_eq!(shipment.deadline, None);
        assert_eq!(shipment.current_status, ShipmentStatus::InTransit);
        assert!(shipment.escrow().has_deposit());
    }

    #[test]
    fn carrier_average_is_derived() {
        let stats = CarrierStats { total_rating: 9, rating_count: 2 };
        assert_eq!(stats.average(), Some(4.5));
        assert_eq!(CarrierStats::default().average(), None);
    }
}
