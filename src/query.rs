//! Latest-input tracking for lookups.
//!
//! Each search takes a [`Ticket`]; a result is applied only if its ticket is
//! still the newest one, so a slow response for an old code can never
//! overwrite the view of a newer search.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::hooks::{Hooks, QueryState};
use crate::models::{EscrowInfo, Shipment, ShipmentEvent, StatusChange};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub id: u64,
    pub key: String,
}

#[derive(Debug, Default)]
pub struct LatestRequest {
    latest: AtomicU64,
}

impl LatestRequest {
    pub fn begin(&self, key: &str) -> Ticket {
        let id = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        Ticket { id, key: key.to_string() }
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.id
    }
}

/// Everything the tracking page shows for one shipment
#[derive(Debug, Clone)]
pub struct TrackedShipment {
    pub shipment: Shipment,
    pub events: QueryState<Vec<ShipmentEvent>>,
    pub history: QueryState<Vec<StatusChange>>,
    pub escrow: QueryState<EscrowInfo>,
}

#[derive(Debug, Clone)]
pub enum TrackView {
    Idle,
    Loading(String),
    NotFound(String),
    Error { code: String, message: String },
    Found(Box<TrackedShipment>),
}

impl TrackView {
    pub fn is_not_found(&self) -> bool {
        matches!(self, TrackView::NotFound(_))
    }
}

/// Tracking lookup state shared by concurrent searches
pub struct TrackSession {
    hooks: Hooks,
    requests: LatestRequest,
    view: Mutex<TrackView>,
}

impl TrackSession {
    pub fn new(hooks: Hooks) -> Self {
        Self {
            hooks,
            requests: LatestRequest::default(),
            view: Mutex::new(TrackView::Idle),
        }
    }

    pub fn view(&self) -> TrackView {
        self.view
            .lock()
            .map(|view| view.clone())
            .unwrap_or(TrackView::Idle)
    }

    fn set_view(&self, view: TrackView) {
        if let Ok(mut current) = self.view.lock() {
            *current = view;
        }
    }

    /// Runs a lookup; returns `None` when a newer search superseded this one
    pub async fn search(&self, code: &str) -> Option<TrackView> {
        let code = code.trim();
        if code.is_empty() {
            return Some(self.view());
        }

        let ticket = self.requests.begin(code);
        self.set_view(TrackView::Loading(code.to_string()));

        let (shipment, events, history, escrow) = futures::join!(
            self.hooks.get_shipment(code),
            self.hooks.get_shipment_events(code),
            self.hooks.get_status_history(code),
            self.hooks.get_escrow(code),
        );

        if !self.requests.is_current(&ticket) {
            tracing::debug!(code = %ticket.key, "discarding superseded lookup");
            return None;
        }

        let view = match shipment {
            QueryState::Ready(Some(shipment)) => TrackView::Found(Box::new(TrackedShipment {
                shipment,
                events,
                history,
                escrow,
            })),
            QueryState::Ready(None) => TrackView::NotFound(code.to_string()),
            QueryState::Failed(err) => TrackView::Error {
                code: code.to_string(),
                message: err.to_string(),
            },
            QueryState::Disabled | QueryState::Loading => TrackView::Idle,
        };

        self.set_view(view.clone());
        Some(view)
    }

    /// Re-runs the lookup for the code currently on screen
    pub async fn refresh(&self) -> Option<TrackView> {
        let code = match self.view() {
            TrackView::Loading(code) | TrackView::NotFound(code) => code,
            TrackView::Error { code, .. } => code,
            TrackView::Found(tracked) => tracked.shipment.shipment_code.clone(),
            TrackView::Idle => return Some(TrackView::Idle),
        };
        self.search(&code).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_newest_ticket_is_current() {
        let requests = LatestRequest::default();
        let first = requests.begin("SH-1");
        assert!(requests.is_current(&first));

        let second = requests.begin("SH-2");
        assert!(!requests.is_current(&first));
        assert!(requests.is_current(&second));

        // Same key again still supersedes
        let third = requests.begin("SH-2");
        assert!(!requests.is_current(&second));
        assert!(requests.is_current(&third));
    }
}
