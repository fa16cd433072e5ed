use std::collections::HashMap;
use std::sync::Mutex;

use crate::hooks::{Hooks, QueryState};
use crate::models::ShipmentStatus;
use crate::projection::{progress, status_display};

/// Status change noticed between two polls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTransition {
    pub code: String,
    pub from: Option<ShipmentStatus>,
    pub to: ShipmentStatus,
}

pub struct DataFetcher {
    hooks: Hooks,
    codes: Vec<String>,
    last_seen: Mutex<HashMap<String, ShipmentStatus>>,
}

impl DataFetcher {
    pub fn new(hooks: Hooks, codes: Vec<String>) -> Self {
        let codes = codes
            .into_iter()
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty())
            .collect();

        Self {
            hooks,
            codes,
            last_seen: Mutex::new(HashMap::new()),
        }
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    /// Polls every watched shipment once; a failed read never aborts the others
    pub async fn run(&self) -> anyhow::Result<Vec<StatusTransition>> {
        let lookups = futures::future::join_all(
            self.codes.iter().map(|code| async move { (code, self.hooks.get_shipment(code).await) }),
        )
        .await;

        let mut transitions = Vec::new();
        let mut last_seen = self.last_seen
            .lock()
            .map_err(|_| anyhow::anyhow!("watcher state lock poisoned"))?;

        for (code, lookup) in lookups {
            let shipment = match lookup {
                QueryState::Ready(Some(shipment)) => shipment,
                QueryState::Ready(None) => {
                    println!("🔍 {}: not found", code);
                    continue;
                }
                QueryState::Failed(err) => {
                    tracing::warn!(code = %code, error = %err, "failed to read shipment");
                    println!("❌ {}: {}", code, err);
                    continue;
                }
                QueryState::Disabled | QueryState::Loading => continue,
            };

            let status = shipment.current_status;
            let display = status_display(status);
            println!("📦 Shipment: {}", code);
            println!("🚚 Carrier: {}", shipment.carrier);
            println!("📍 Status: {} {} ({})", display.icon.glyph(), display.label, progress(status));

            let previous = last_seen.insert(code.clone(), status);
            if previous != Some(status) {
                if let Some(from) = previous {
                    println!(
                        "🔔 Status changed: {} -> {}",
                        status_display(from).label,
                        display.label,
                    );
                }
                transitions.push(StatusTransition {
                    code: code.clone(),
                    from: previous,
                    to: status,
                });
            } else {
                println!("ℹ️  No change since last poll");
            }

            println!("================================");
        }

        Ok(transitions)
    }
}
