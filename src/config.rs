use alloy_primitives::Address;
use anyhow::{Context, Result, anyhow};
use once_cell::sync::Lazy;
use regex::Regex;
use std::env;
use std::time::Duration;

pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x5c872245116f8ec780dea1156f35bd43b4084871";
pub const PLACEHOLDER_CONTRACT_ADDRESS: &str = "0x1234567890123456789012345678901234567890";
pub const DEFAULT_WALLETCONNECT_PROJECT_ID: &str = "455a9939d641d79b258424737e7f9205";
pub const DEFAULT_RPC_URL: &str = "https://rpc.ankr.com/klaytn_testnet";
pub const DEFAULT_EXPLORER_URL: &str = "https://kairos.kaiascope.com";
pub const DEFAULT_FAUCET_URL: &str = "https://kairos.wallet.klaytn.foundation/faucet";
pub const DEFAULT_APP_NAME: &str = "Freireli Logistics";
pub const DEFAULT_APP_DESCRIPTION: &str = "Blockchain-backed logistics tracking";
pub const DEFAULT_WATCH_SCHEDULE: &str = "0 */5 * * * *";
pub const KAIROS_CHAIN_ID: u64 = 1001;

static ADDRESS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0x[a-fA-F0-9]{40}$").expect("address pattern is valid"));

/// `0x` followed by exactly 40 hex digits
pub fn is_address(value: &str) -> bool {
    ADDRESS_PATTERN.is_match(value)
}

/// Application configuration resolved once at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub contract_address: String,
    pub contract_address_set: bool,
    pub walletconnect_project_id: String,
    pub walletconnect_project_id_set: bool,
    pub rpc_url: String,
    pub rpc_url_set: bool,
    pub signer_url: String,
    /// `None` when `KAIROS_CHAIN_ID` could not be parsed
    pub chain_id: Option<u64>,
    pub explorer_url: String,
    pub app_name: String,
    pub app_description: String,
    pub faucet_url: String,
    pub sender_address: Option<Address>,
    pub receipt_poll_interval: Duration,
    pub receipt_timeout: Duration,
    pub watch_schedule: String,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// # Environment Variables
    /// - `LOGISTICS_CONTRACT_ADDRESS`: Required - Deployed logistics contract (validated, default kept for demos)
    /// - `WALLETCONNECT_PROJECT_ID`: Optional - Wallet-connect project id
    /// - `KAIROS_RPC_URL`: Optional - JSON-RPC endpoint (default: public Kairos RPC)
    /// - `KAIROS_CHAIN_ID`: Optional - Expected chain id (default: 1001)
    /// - `KAIROS_EXPLORER_URL`: Optional - Block explorer base URL
    /// - `APP_NAME` / `APP_DESCRIPTION`: Optional - Branding shown by `setup`
    /// - `FAUCET_URL`: Optional - Testnet faucet link
    /// - `SIGNER_URL`: Optional - Wallet RPC accepting `eth_sendTransaction` (default: `KAIROS_RPC_URL`)
    /// - `SENDER_ADDRESS`: Optional - Wallet account used for writes
    /// - `RECEIPT_POLL_INTERVAL_MS`: Optional - Receipt polling interval (default: 2000)
    /// - `RECEIPT_TIMEOUT_SECS`: Optional - Confirmation timeout (default: 180)
    /// - `WATCH_SCHEDULE`: Optional - Cron expression for `watch` (default: "0 */5 * * * *")
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset
        let read = |key: &str| lookup(key).map(|value| value.trim().to_string()).filter(|value| !value.is_empty());

        let contract_address_env = read("LOGISTICS_CONTRACT_ADDRESS");
        let walletconnect_env = read("WALLETCONNECT_PROJECT_ID");
        let rpc_url_env = read("KAIROS_RPC_URL");

        let rpc_url = rpc_url_env.clone().unwrap_or_else(|| DEFAULT_RPC_URL.to_string());
        let signer_url = read("SIGNER_URL").unwrap_or_else(|| rpc_url.clone());

        let chain_id = match read("KAIROS_CHAIN_ID") {
            Some(raw) => raw.parse::<u64>().ok(),
            None => Some(KAIROS_CHAIN_ID),
        };

        let sender_address = read("SENDER_ADDRESS")
            .map(|raw| {
                if !is_address(&raw) {
                    return Err(anyhow!("SENDER_ADDRESS is not a valid address: {}", raw));
                }
                raw.parse::<Address>()
                    .with_context(|| format!("SENDER_ADDRESS is not a valid address: {}", raw))
            })
            .transpose()?;

        let receipt_poll_interval = match read("RECEIPT_POLL_INTERVAL_MS") {
            Some(raw) => Duration::from_millis(
                raw.parse::<u64>()
                    .with_context(|| format!("RECEIPT_POLL_INTERVAL_MS must be a number of milliseconds, got {}", raw))?,
            ),
            None => Duration::from_millis(2000),
        };

        let receipt_timeout = match read("RECEIPT_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(
                raw.parse::<u64>()
                    .with_context(|| format!("RECEIPT_TIMEOUT_SECS must be a number of seconds, got {}", raw))?,
            ),
            None => Duration::from_secs(180),
        };

        Ok(Config {
            contract_address_set: contract_address_env.is_some(),
            contract_address: contract_address_env.unwrap_or_else(|| DEFAULT_CONTRACT_ADDRESS.to_string()),
            walletconnect_project_id_set: walletconnect_env.is_some(),
            walletconnect_project_id: walletconnect_env.unwrap_or_else(|| DEFAULT_WALLETCONNECT_PROJECT_ID.to_string()),
            rpc_url_set: rpc_url_env.is_some(),
            rpc_url,
            signer_url,
            chain_id,
            explorer_url: read("KAIROS_EXPLORER_URL").unwrap_or_else(|| DEFAULT_EXPLORER_URL.to_string()),
            app_name: read("APP_NAME").unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
            app_description: read("APP_DESCRIPTION").unwrap_or_else(|| DEFAULT_APP_DESCRIPTION.to_string()),
            faucet_url: read("FAUCET_URL").unwrap_or_else(|| DEFAULT_FAUCET_URL.to_string()),
            sender_address,
            receipt_poll_interval,
            receipt_timeout,
            watch_schedule: read("WATCH_SCHEDULE").unwrap_or_else(|| DEFAULT_WATCH_SCHEDULE.to_string()),
        })
    }

    /// Parsed contract address; fails only when the configured value is malformed
    pub fn contract_address(&self) -> Result<Address> {
        if !is_address(&self.contract_address) {
            return Err(anyhow!("Invalid contract address: {}", self.contract_address));
        }
        self.contract_address
            .parse::<Address>()
            .with_context(|| format!("Invalid contract address: {}", self.contract_address))
    }

    pub fn is_placeholder_contract(&self) -> bool {
        self.contract_address.eq_ignore_ascii_case(PLACEHOLDER_CONTRACT_ADDRESS)
    }

    pub fn explorer_address_url(&self, address: &str) -> String {
        format!("{}/account/{}", self.explorer_url.trim_end_matches('/'), address)
    }

    pub fn explorer_tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_url.trim_end_matches('/'), tx_hash)
    }
}

/// Advisory result of [`validate_environment`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Writes the report to the log; never aborts
    pub fn log(&self) {
        if !self.is_valid() {
            tracing::error!("environment validation failed");
            for error in &self.errors {
                tracing::error!("  - {}", error);
            }
        }

        if !self.warnings.is_empty() {
            tracing::warn!("environment warnings");
            for warning in &self.warnings {
                tracing::warn!("  - {}", warning);
            }
        }

        if self.is_valid() && self.warnings.is_empty() {
            tracing::info!("environment validation passed");
        }
    }
}

pub fn validate_environment(config: &Config) -> ValidationReport {
    let mut report = ValidationReport::default();

    if !config.contract_address_set {
        report.errors.push("LOGISTICS_CONTRACT_ADDRESS is required".to_string());
    } else if config.is_placeholder_contract() {
        report.warnings.push(
            "Contract address appears to be the default placeholder. Please update with your deployed contract address."
                .to_string(),
        );
    }

    if !config.walletconnect_project_id_set {
        report.warnings.push("WALLETCONNECT_PROJECT_ID is not set. Using default value.".to_string());
    }

    if !config.rpc_url_set {
        report.warnings.push("KAIROS_RPC_URL is not set. Using default value.".to_string());
    }

    if !is_address(&config.contract_address) {
        report.errors.push(
            "Invalid contract address format. Must be a valid Ethereum address (0x followed by 40 hex characters)."
                .to_string(),
        );
    }

    if config.chain_id != Some(KAIROS_CHAIN_ID) {
        report.warnings.push(format!("Chain ID should be {} for Kairos testnet.", KAIROS_CHAIN_ID));
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
    }

    const COMPLETE: &[(&str, &str)] = &[
        ("LOGISTICS_CONTRACT_ADDRESS", "0x5c872245116f8ec780dea1156f35bd43b4084871"),
        ("WALLETCONNECT_PROJECT_ID", "project"),
        ("KAIROS_RPC_URL", "http://localhost:8545"),
    ];

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]);
        assert_eq!(config.contract_address, DEFAULT_CONTRACT_ADDRESS);
        assert!(!config.contract_address_set);
        assert_eq!(config.rpc_url, DEFAULT_RPC_URL);
        assert_eq!(config.signer_url, DEFAULT_RPC_URL);
        assert_eq!(config.chain_id, Some(KAIROS_CHAIN_ID));
        assert_eq!(config.watch_schedule, DEFAULT_WATCH_SCHEDULE);
        assert_eq!(config.receipt_poll_interval, Duration::from_millis(2000));
        assert!(config.sender_address.is_none());
    }

    #[test]
    fn complete_environment_is_clean() {
        let report = validate_environment(&config_from(COMPLETE));
        assert!(report.is_valid());
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    }

    #[test]
    fn unset_contract_address_is_an_error() {
        let report = validate_environment(&config_from(&[]));
        assert!(!report.is_valid());
        assert!(report.errors.iter().any(|e| e.contains("LOGISTICS_CONTRACT_ADDRESS is required")));
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn placeholder_contract_address_is_a_warning() {
        let mut pairs = COMPLETE.to_vec();
        pairs[0] = ("LOGISTICS_CONTRACT_ADDRESS", PLACEHOLDER_CONTRACT_ADDRESS);
        let report = validate_environment(&config_from(&pairs));
        assert!(report.is_valid());
        assert!(report.warnings.iter().any(|w| w.contains("placeholder")));
    }

    #[test]
    fn malformed_contract_address_is_an_error() {
        for bad in ["0x1234", "5c872245116f8ec780dea1156f35bd43b4084871", "0xZZ872245116f8ec780dea1156f35bd43b4084871"] {
            let mut pairs = COMPLETE.to_vec();
            pairs[0] = ("LOGISTICS_CONTRACT_ADDRESS", bad);
            let config = config_from(&pairs);
            let report = validate_environment(&config);
            assert!(!report.is_valid(), "{} should be rejected", bad);
            assert!(report.errors.iter().any(|e| e.contains("Invalid contract address format")));
            assert!(config.contract_address().is_err());
        }
    }

    #[test]
    fn unexpected_chain_id_is_a_warning() {
        let mut pairs = COMPLETE.to_vec();
        pairs.push(("KAIROS_CHAIN_ID", "8217"));
        let report = validate_environment(&config_from(&pairs));
        assert!(report.is_valid());
        assert_eq!(report.warnings, vec!["Chain ID should be 1001 for Kairos testnet.".to_string()]);

        let mut pairs = COMPLETE.to_vec();
        pairs.push(("KAIROS_CHAIN_ID", "kairos"));
        let config = config_from(&pairs);
        assert_eq!(config.chain_id, None);
        assert_eq!(validate_environment(&config).warnings.len(), 1);
    }

    #[test]
    fn signer_url_and_sender() {
        let mut pairs = COMPLETE.to_vec();
        pairs.push(("SIGNER_URL", "http://localhost:8550"));
        pairs.push(("SENDER_ADDRESS", "0x2a2cB2F081b651D05B8302f599B102710E8355F5"));
        let config = config_from(&pairs);
        assert_eq!(config.signer_url, "http://localhost:8550");
        assert!(config.sender_address.is_some());
    }

    #[test]
    fn unparseable_numbers_fail_loading() {
        let vars: HashMap<&str, &str> = HashMap::from([("RECEIPT_TIMEOUT_SECS", "soon")]);
        assert!(Config::from_lookup(|key| vars.get(key).map(|v| v.to_string())).is_err());

        let vars: HashMap<&str, &str> = HashMap::from([("SENDER_ADDRESS", "0xabc")]);
        assert!(Config::from_lookup(|key| vars.get(key).map(|v| v.to_string())).is_err());
    }
}
