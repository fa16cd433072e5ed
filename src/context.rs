use anyhow::Result;
use std::sync::Arc;

use crate::config::{Config, ValidationReport, validate_environment};
use crate::contract::LogisticsClient;
use crate::hooks::Hooks;

/// Process-wide state built once at startup and shared by reference
pub struct AppContext {
    pub config: Config,
    pub validation: ValidationReport,
    pub hooks: Hooks,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Arc<Self>> {
        let client = LogisticsClient::new(&config)?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: Config, client: LogisticsClient) -> Arc<Self> {
        let validation = validate_environment(&config);
        Arc::new(Self {
            config,
            validation,
            hooks: Hooks::new(Arc::new(client)),
        })
    }
}
