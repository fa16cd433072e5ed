//! Display projections of on-chain records.
//!
//! All functions here are total and deterministic.

use alloy_primitives::{Address, U256, utils::format_ether};
use chrono::{DateTime, Utc};
use std::fmt;

use crate::models::{EscrowInfo, ShipmentStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Blue,
    Yellow,
    Green,
    Red,
    Gray,
}

impl Tone {
    /// ANSI foreground escape for terminal output
    pub fn ansi(self) -> &'static str {
        match self {
            Tone::Blue => "\x1b[34m",
            Tone::Yellow => "\x1b[33m",
            Tone::Green => "\x1b[32m",
            Tone::Red => "\x1b[31m",
            Tone::Gray => "\x1b[90m",
        }
    }

    pub fn paint(self, text: &str) -> String {
        format!("{}{}\x1b[0m", self.ansi(), text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Package,
    Truck,
    MapPin,
    CheckCircle,
    XCircle,
    Alert,
    Clock,
    Shield,
    Wallet,
}

impl Icon {
    pub fn glyph(self) -> &'static str {
        match self {
            Icon::Package => "📦",
            Icon::Truck => "🚚",
            Icon::MapPin => "📍",
            Icon::CheckCircle => "✅",
            Icon::XCircle => "❌",
            Icon::Alert => "⚠️",
            Icon::Clock => "⏳",
            Icon::Shield => "🛡️",
            Icon::Wallet => "👛",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusDisplay {
    pub label: &'static str,
    pub tone: Tone,
    pub icon: Icon,
}

pub fn status_display(status: ShipmentStatus) -> StatusDisplay {
    match status {
        ShipmentStatus::Pending => StatusDisplay { label: "Pending", tone: Tone::Blue, icon: Icon::Package },
        ShipmentStatus::InTransit => StatusDisplay { label: "In Transit", tone: Tone::Yellow, icon: Icon::Truck },
        ShipmentStatus::Delivered => StatusDisplay { label: "Delivered", tone: Tone::Green, icon: Icon::CheckCircle },
        ShipmentStatus::Canceled => StatusDisplay { label: "Canceled", tone: Tone::Red, icon: Icon::XCircle },
        ShipmentStatus::Unknown(_) => StatusDisplay { label: "Unknown", tone: Tone::Gray, icon: Icon::Alert },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscrowDisplay {
    pub label: &'static str,
    pub description: &'static str,
    pub tone: Tone,
    pub icon: Icon,
}

/// Released and refunded are terminal flags, so they win over the current status
pub fn escrow_display(escrow: &EscrowInfo, status: ShipmentStatus) -> EscrowDisplay {
    if escrow.released {
        return EscrowDisplay {
            label: "Released",
            description: "Funds have been released to the carrier",
            tone: Tone::Green,
            icon: Icon::CheckCircle,
        };
    }

    if escrow.refunded {
        return EscrowDisplay {
            label: "Refunded",
            description: "Funds have been refunded to the creator",
            tone: Tone::Red,
            icon: Icon::XCircle,
        };
    }

    match status {
        ShipmentStatus::Canceled => EscrowDisplay {
            label: "Pending Refund",
            description: "Refund will be processed automatically",
            tone: Tone::Yellow,
            icon: Icon::Clock,
        },
        ShipmentStatus::Delivered => EscrowDisplay {
            label: "Pending Release",
            description: "Release to carrier will be processed automatically",
            tone: Tone::Blue,
            icon: Icon::Clock,
        },
        _ => EscrowDisplay {
            label: "Held in Escrow",
            description: "Funds are safely held in smart contract",
            tone: Tone::Blue,
            icon: Icon::Shield,
        },
    }
}

/// The contract stores averages multiplied by 100
pub fn rating_from_times100(times100: u64) -> f64 {
    times100 as f64 / 100.0
}

pub fn format_rating(times100: u64) -> String {
    format!("{}.{:02}", times100 / 100, times100 % 100)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Star {
    Full,
    Half,
    Empty,
}

impl Star {
    pub fn glyph(self) -> char {
        match self {
            Star::Full => '★',
            Star::Half => '⯪',
            Star::Empty => '☆',
        }
    }
}

/// Always five glyphs
pub fn render_stars(rating: f64) -> [Star; 5] {
    let rating = if rating.is_nan() { 0.0 } else { rating.clamp(0.0, 5.0) };
    let full = rating.floor() as usize;
    let has_half = rating % 1.0 >= 0.5;

    let mut stars = [Star::Empty; 5];
    for (index, star) in stars.iter_mut().enumerate() {
        if index < full {
            *star = Star::Full;
        } else if index == full && has_half {
            *star = Star::Half;
        }
    }
    stars
}

pub fn stars_text(rating: f64) -> String {
    render_stars(rating).iter().map(|star| star.glyph()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    Excellent,
    Good,
    Average,
    NeedsImprovement,
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Badge::Excellent => "Excellent Carrier",
            Badge::Good => "Good Carrier",
            Badge::Average => "Average Carrier",
            Badge::NeedsImprovement => "Needs Improvement",
        })
    }
}

pub fn rating_badge(rating: f64) -> Option<Badge> {
    if rating.is_nan() || rating <= 0.0 {
        return None;
    }

    Some(if rating >= 4.5 {
        Badge::Excellent
    } else if rating >= 4.0 {
        Badge::Good
    } else if rating >= 3.0 {
        Badge::Average
    } else {
        Badge::NeedsImprovement
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Percent(u8),
    Canceled,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Progress::Percent(value) => write!(f, "{}%", value),
            Progress::Canceled => f.write_str("Canceled"),
        }
    }
}

pub fn progress(status: ShipmentStatus) -> Progress {
    match status {
        ShipmentStatus::Pending | ShipmentStatus::Unknown(_) => Progress::Percent(0),
        ShipmentStatus::InTransit => Progress::Percent(50),
        ShipmentStatus::Delivered => Progress::Percent(100),
        ShipmentStatus::Canceled => Progress::Canceled,
    }
}

/// Text bar for percentage progress, e.g. `[#####-----]`
pub fn progress_bar(progress: Progress, width: usize) -> String {
    match progress {
        Progress::Percent(value) => {
            let filled = width * usize::from(value.min(100)) / 100;
            format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
        }
        Progress::Canceled => format!("[{}]", "x".repeat(width)),
    }
}

/// Icon for a free-text event type; first matching keyword wins
pub fn event_icon(event_type: &str) -> Icon {
    let kind = event_type.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|word| kind.contains(word));

    if has(&["picked", "pickup"]) {
        Icon::Package
    } else if has(&["transit"]) {
        Icon::Truck
    } else if has(&["arrived", "hub", "warehouse"]) {
        Icon::MapPin
    } else if has(&["out", "delivery"]) {
        Icon::Truck
    } else if has(&["complete", "delivered"]) {
        Icon::CheckCircle
    } else if has(&["fail", "return"]) {
        Icon::XCircle
    } else {
        Icon::Alert
    }
}

pub fn short_address(address: &Address) -> String {
    let full = address.to_string();
    format!("{}…{}", &full[..6], &full[full.len() - 4..])
}

pub fn format_deposit(amount: U256) -> String {
    let text = format_ether(amount);
    // Trim trailing zeros but keep one decimal
    match text.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                format!("{}.0", whole)
            } else {
                format!("{}.{}", whole, fraction)
            }
        }
        None => format!("{}.0", text),
    }
}

pub fn format_timestamp(seconds: u64) -> String {
    if seconds == 0 {
        return "—".to_string();
    }

    i64::try_from(seconds)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|time| time.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "—".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_status_has_a_label_and_icon() {
        for status in ShipmentStatus::ALL {
            let display = status_display(status);
            assert!(!display.label.is_empty());
            assert_ne!(display.icon, Icon::Alert);
        }

        let unknown = status_display(ShipmentStatus::Unknown(42));
        assert_eq!(unknown.label, "Unknown");
        assert_eq!(unknown.tone, Tone::Gray);
    }

    #[test]
    fn released_wins_over_everything() {
        let escrow = EscrowInfo { released: true, refunded: true, deposit_amount: U256::from(1u64) };
        assert_eq!(escrow_display(&escrow, ShipmentStatus::Delivered).label, "Released");
        assert_eq!(escrow_display(&escrow, ShipmentStatus::Canceled).label, "Released");
    }

    #[test]
    fn escrow_decision_order() {
        let held = EscrowInfo { released: false, refunded: false, deposit_amount: U256::from(1u64) };
        let refunded = EscrowInfo { refunded: true, ..held };

        assert_eq!(escrow_display(&refunded, ShipmentStatus::Delivered).label, "Refunded");
        assert_eq!(escrow_display(&held, ShipmentStatus::Canceled).label, "Pending Refund");
        assert_eq!(escrow_display(&held, ShipmentStatus::Delivered).label, "Pending Release");
        assert_eq!(escrow_display(&held, ShipmentStatus::InTransit).label, "Held in Escrow");
        assert_eq!(escrow_display(&held, ShipmentStatus::Pending).label, "Held in Escrow");
    }

    #[test]
    fn stars_for_fractional_rating() {
        assert_eq!(render_stars(3.7), [Star::Full, Star::Full, Star::Full, Star::Half, Star::Empty]);
        assert_eq!(render_stars(0.0), [Star::Empty; 5]);
        assert_eq!(render_stars(5.0), [Star::Full; 5]);
        assert_eq!(render_stars(4.49), [Star::Full, Star::Full, Star::Full, Star::Full, Star::Empty]);
        assert_eq!(render_stars(f64::NAN), [Star::Empty; 5]);
        assert_eq!(render_stars(9.0), [Star::Full; 5]);
        assert_eq!(stars_text(2.5).chars().count(), 5);
    }

    #[test]
    fn badge_thresholds() {
        assert_eq!(rating_badge(4.5), Some(Badge::Excellent));
        assert_eq!(rating_badge(4.49999), Some(Badge::Good));
        assert_eq!(rating_badge(4.0), Some(Badge::Good));
        assert_eq!(rating_badge(3.999), Some(Badge::Average));
        assert_eq!(rating_badge(3.0), Some(Badge::Average));
        assert_eq!(rating_badge(2.999), Some(Badge::NeedsImprovement));
        assert_eq!(rating_badge(0.01), Some(Badge::NeedsImprovement));
        assert_eq!(rating_badge(0.0), None);
        assert_eq!(rating_badge(f64::NAN), None);
    }

    #[test]
    fn progress_mapping() {
        assert_eq!(progress(ShipmentStatus::Pending).to_string(), "0%");
        assert_eq!(progress(ShipmentStatus::InTransit).to_string(), "50%");
        assert_eq!(progress(ShipmentStatus::Delivered).to_string(), "100%");
        assert_eq!(progress(ShipmentStatus::Canceled).to_string(), "Canceled");
        assert_eq!(progress_bar(Progress::Percent(50), 10), "[#####-----]");
    }

    #[test]
    fn rating_times_100_formats_with_two_decimals() {
        assert_eq!(format_rating(437), "4.37");
        assert_eq!(format_rating(0), "0.00");
        assert_eq!(format_rating(500), "5.00");
        assert_eq!(format_rating(405), "4.05");
        assert!((rating_from_times100(437) - 4.37).abs() < 1e-9);
    }

    #[test]
    fn event_icons_by_keyword() {
        assert_eq!(event_icon("Picked up"), Icon::Package);
        assert_eq!(event_icon("IN TRANSIT"), Icon::Truck);
        assert_eq!(event_icon("Arrived at hub"), Icon::MapPin);
        assert_eq!(event_icon("Delivered"), Icon::CheckCircle);
        assert_eq!(event_icon("Failed attempt"), Icon::XCircle);
        assert_eq!(event_icon("Customs"), Icon::Alert);
    }

    #[test]
    fn deposits_and_times() {
        assert_eq!(format_deposit(U256::from(200_000_000_000_000_000u64)), "0.2");
        assert_eq!(format_deposit(U256::ZERO), "0.0");
        assert_eq!(format_timestamp(0), "—");
        assert_eq!(format_timestamp(1_700_000_000), "2023-11-14 22:13:20 UTC");
    }

    #[test]
    fn short_address_keeps_both_ends() {
        let address: Address = "0x2a2cB2F081b651D05B8302f599B102710E8355F5".parse().unwrap();
        let short = short_address(&address);
        assert!(short.starts_with("0x2a2c"));
        assert!(short.ends_with("55F5"));
    }
}
