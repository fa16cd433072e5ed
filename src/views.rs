use crate::config::{Config, ValidationReport};
use crate::hooks::QueryState;
use crate::models::{CarrierProfile, EscrowInfo, Shipment, ShipmentEvent, ShipmentStatus, StatusChange};
use crate::projection::{
    escrow_display, event_icon, format_deposit, format_rating, format_timestamp, progress, progress_bar,
    rating_badge, rating_from_times100, short_address, stars_text, status_display, Icon,
};
use crate::query::TrackView;

const RULE: &str = "================================";

/// Appends one formatted line to `out`
macro_rules! push_line {
    ($out:expr, $($arg:tt)*) => {{
        $out.push_str(&format!($($arg)*));
        $out.push('\n');
    }};
}

pub fn render_status_badge(status: ShipmentStatus) -> String {
    let display = status_display(status);
    display.tone.paint(&format!("{} {}", display.icon.glyph(), display.label))
}

pub fn render_shipment(shipment: &Shipment) -> String {
    let mut out = String::new();
    let progress = progress(shipment.current_status);

    push_line!(out, "📦 Shipment: {}", shipment.shipment_code);
    push_line!(out, "   Status:      {}", render_status_badge(shipment.current_status));
    push_line!(out, "   Progress:    {} {}", progress_bar(progress, 20), progress);
    push_line!(out, "   Product:     {}", shipment.product_name);
    push_line!(out, "   Route:       {} → {}", shipment.origin, shipment.destination);
    push_line!(out, "   Creator:     {}", shipment.creator);
    push_line!(out, "   Carrier:     {}", shipment.carrier);
    push_line!(out, "   Created at:  {}", format_timestamp(shipment.created_at));
    if let Some(deadline) = shipment.deadline {
        push_line!(out, "   Deadline:    {}", format_timestamp(deadline));
    }
    if shipment.is_rated {
        push_line!(out, "   Rating:      {} ({}/5) {}", stars_text(f64::from(shipment.rating)), shipment.rating, shipment.feedback);
    }
    out
}

/// Chronological timeline, oldest first
pub fn render_timeline(events: &[ShipmentEvent]) -> String {
    if events.is_empty() {
        return "   No events recorded for this shipment yet\n".to_string();
    }

    let mut out = String::new();
    for (index, event) in events.iter().enumerate() {
        push_line!(
            out,
            "   {:>2}. {} {} @ {}",
            index + 1,
            event_icon(&event.event_type).glyph(),
            event.event_type,
            event.location,
        );
        push_line!(
            out,
            "       {} by {}",
            format_timestamp(event.timestamp),
            short_address(&event.updated_by),
        );
        if index + 1 < events.len() {
            out.push_str("       │\n");
        }
    }
    out
}

pub fn render_history(history: &[StatusChange]) -> String {
    let mut out = String::new();
    for change in history {
        out.push_str(&format!(
            "   {} {} → {} by {}",
            format_timestamp(change.timestamp),
            status_display(change.old_status).label,
            status_display(change.new_status).label,
            short_address(&change.changed_by),
        ));
        if !change.note.is_empty() {
            out.push_str(&format!(" — {}", change.note));
        }
        out.push('\n');
    }
    out
}

pub fn render_escrow(escrow: &EscrowInfo, status: ShipmentStatus) -> String {
    if !escrow.has_deposit() {
        return format!("{} No Escrow: this shipment has no escrow deposit\n", Icon::Wallet.glyph());
    }

    let display = escrow_display(escrow, status);
    let mut out = String::new();
    push_line!(out, "{} Escrow Status: {}", Icon::Wallet.glyph(), display.tone.paint(&format!("{} {}", display.icon.glyph(), display.label)));
    push_line!(out, "   Deposit:     {} KAIA", format_deposit(escrow.deposit_amount));
    push_line!(out, "   {}", display.description);
    out
}

fn render_section<T>(title: &str, state: &QueryState<T>, render: impl Fn(&T) -> String) -> String {
    let body = match state {
        QueryState::Ready(value) => render(value),
        QueryState::Loading => "   Loading...\n".to_string(),
        QueryState::Disabled => String::new(),
        QueryState::Failed(err) => format!("   ⚠️  Could not load {}: {}\n", title.to_lowercase(), err),
    };
    format!("{}\n{}", title, body)
}

pub fn render_track_view(view: &TrackView) -> String {
    match view {
        TrackView::Idle => "Enter a shipment code to track it\n".to_string(),
        TrackView::Loading(code) => format!("⏳ Looking up shipment {}...\n", code),
        TrackView::NotFound(code) => format!("🔍 No shipment found with code: {}\n", code),
        TrackView::Error { code, message } => format!("❌ Failed to load shipment {}: {}\n", code, message),
        TrackView::Found(tracked) => {
            let status = tracked.shipment.current_status;
            let mut out = render_shipment(&tracked.shipment);
            out.push_str(RULE);
            out.push('\n');
            out.push_str(&render_section("Shipment History", &tracked.events, |events| render_timeline(events)));
            let has_history = tracked.history.data().is_some_and(|history| !history.is_empty());
            if has_history || tracked.history.is_error() {
                out.push_str(&render_section("Status Changes", &tracked.history, |history| render_history(history)));
            }
            out.push_str(RULE);
            out.push('\n');
            match &tracked.escrow {
                QueryState::Ready(escrow) => out.push_str(&render_escrow(escrow, status)),
                // The record carries the same flags when the dedicated read fails
                _ => out.push_str(&render_escrow(&tracked.shipment.escrow(), status)),
            }
            out
        }
    }
}

pub fn render_carrier_profile(profile: &CarrierProfile) -> String {
    let rating = rating_from_times100(profile.average_times100);
    let mut out = String::new();

    push_line!(out, "🚚 Carrier: {}", profile.address);
    push_line!(out, "   Average rating: {} {}", format_rating(profile.average_times100), stars_text(rating));
    push_line!(out, "   Based on {} reviews", profile.stats.rating_count);
    if let Some(badge) = rating_badge(rating) {
        push_line!(out, "   🏅 {}", badge);
    }
    push_line!(out, "   Total rating points: {}", profile.stats.total_rating);
    push_line!(out, "   Completed {} rated shipments", profile.stats.rating_count);
    out
}

pub fn render_validation(report: &ValidationReport) -> String {
    let mut out = String::new();
    if report.is_valid() && report.warnings.is_empty() {
        out.push_str("✅ Environment validation passed\n");
        return out;
    }
    for error in &report.errors {
        push_line!(out, "❌ {}", error);
    }
    for warning in &report.warnings {
        push_line!(out, "⚠️  {}", warning);
    }
    out
}

/// Resolved configuration, as shown on the setup page
pub fn render_config(config: &Config) -> String {
    let mut out = String::new();
    let marker = if config.is_placeholder_contract() { "⚠️  placeholder" } else { "✅" };
    let chain_id = config
        .chain_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "invalid".to_string());

    push_line!(out, "{} — {}", config.app_name, config.app_description);
    push_line!(out, "{}", RULE);
    push_line!(out, "Contract address:   {} {}", config.contract_address, marker);
    push_line!(out, "Explorer:           {}", config.explorer_address_url(&config.contract_address));
    push_line!(out, "RPC URL:            {}", config.rpc_url);
    push_line!(out, "Signer URL:         {}", config.signer_url);
    push_line!(out, "Chain ID:           {}", chain_id);
    push_line!(out, "WalletConnect ID:   {}", config.walletconnect_project_id);
    push_line!(
        out,
        "Sender account:     {}",
        config.sender_address.map(|address| address.to_string()).unwrap_or_else(|| "not configured".to_string())
    );
    push_line!(out, "Faucet:             {}", config.faucet_url);
    push_line!(out, "Watch schedule:     {}", config.watch_schedule);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, U256};
    use crate::models::CarrierStats;

    fn shipment(status: ShipmentStatus) -> Shipment {
        Shipment {
            shipment_code: "SH-2025-001".to_string(),
            product_name: "Coffee".to_string(),
            origin: "Buon Ma Thuot".to_string(),
            destination: "Busan".to_string(),
            current_status: status,
            creator: Address::repeat_byte(1),
            carrier: Address::repeat_byte(2),
            created_at: 1_700_000_000,
            deadline: None,
            deposit_amount: U256::from(10u64).pow(U256::from(18u64)),
            released: false,
            refunded: false,
            is_rated: false,
            rating: 0,
            feedback: String::new(),
        }
    }

    #[test]
    fn not_found_names_the_code() {
        let text = render_track_view(&TrackView::NotFound("SH-404".to_string()));
        assert!(text.contains("No shipment found"));
        assert!(text.contains("SH-404"));
    }

    #[test]
    fn timeline_keeps_insertion_order() {
        let events = vec![
            ShipmentEvent { location: "Saigon".into(), event_type: "Picked up".into(), timestamp: 1, updated_by: Address::ZERO },
            ShipmentEvent { location: "Tokyo".into(), event_type: "Delivered".into(), timestamp: 2, updated_by: Address::ZERO },
        ];
        let text = render_timeline(&events);
        let first = text.find("Saigon").unwrap();
        let second = text.find("Tokyo").unwrap();
        assert!(first < second);
        assert!(render_timeline(&[]).contains("No events"));
    }

    #[test]
    fn zero_deposit_has_no_escrow() {
        let text = render_escrow(&EscrowInfo::default(), ShipmentStatus::Delivered);
        assert!(text.contains("No Escrow"));

        let text = render_escrow(&shipment(ShipmentStatus::Delivered).escrow(), ShipmentStatus::Delivered);
        assert!(text.contains("Pending Release"));
        assert!(text.contains("1.0 KAIA"));
    }

    #[test]
    fn shipment_shows_progress() {
        let text = render_shipment(&shipment(ShipmentStatus::Canceled));
        assert!(text.contains("Canceled"));
        assert!(!text.contains("0%"));
    }

    #[test]
    fn carrier_profile_with_badge() {
        let profile = CarrierProfile {
            address: Address::repeat_byte(3),
            average_times100: 437,
            stats: CarrierStats { total_rating: 35, rating_count: 8 },
        };
        let text = render_carrier_profile(&profile);
        assert!(text.contains("4.37"));
        assert!(text.contains("Good Carrier"));
        assert!(text.contains("Based on 8 reviews"));
    }
}
