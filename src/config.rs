use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::services::ContractError;
use crate::infrastructure::contracts::config::{chain_config, LOCAL_CHAIN_ID};
use crate::infrastructure::contracts::types::{ChainConfig, ContractVersion, GasSettings};

/// File the deployment script writes and the client reads by default
pub const DEFAULT_FUNDME_ARTIFACT: &str = "FundMe.json";

/// Application configuration, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub chain: ChainConfig,
    pub private_key: Option<String>,
    pub election_address: Option<String>,
    pub fundme_artifact: PathBuf,
    /// Used with the bundled ABI when no deployment artifact is present
    pub fundme_address: Option<String>,
    pub fundme_version: ContractVersion,
    pub price_poll_interval: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ContractError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ContractError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let rpc_url = var("RPC_URL").unwrap_or_else(|| "http://localhost:8545".to_string());
        let chain_id = parse_var(var("CHAIN_ID"), "CHAIN_ID", LOCAL_CHAIN_ID)?;
        let gas_settings = GasSettings {
            funding_gas_limit: parse_var(var("FUNDING_GAS_LIMIT"), "FUNDING_GAS_LIMIT", 1_000_000)?,
            confirmations: parse_var(var("TX_CONFIRMATIONS"), "TX_CONFIRMATIONS", 1)?,
        };
        let fundme_version = match var("FUNDME_CONTRACT_VERSION") {
            Some(v) => v.parse::<ContractVersion>().map_err(ContractError::Config)?,
            None => ContractVersion::default(),
        };
        let poll_ms: u64 = parse_var(var("PRICE_POLL_INTERVAL_MS"), "PRICE_POLL_INTERVAL_MS", 2000)?;
        if poll_ms == 0 {
            return Err(ContractError::Config("PRICE_POLL_INTERVAL_MS must be greater than zero".to_string()));
        }

        Ok(Self {
            chain: chain_config(chain_id, &rpc_url, gas_settings),
            private_key: var("PRIVATE_KEY"),
            election_address: var("ELECTION_CONTRACT_ADDRESS"),
            fundme_artifact: var("FUNDME_ARTIFACT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FUNDME_ARTIFACT)),
            fundme_address: var("FUNDME_CONTRACT_ADDRESS"),
            fundme_version,
            price_poll_interval: Duration::from_millis(poll_ms),
        })
    }
}

fn parse_var<T: std::str::FromStr>(value: Option<String>, key: &str, default: T) -> Result<T, ContractError> {
    match value {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| ContractError::Config(format!("Invalid {}: {}", key, raw))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_target_local_node() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.chain.chain_id, 31337);
        assert_eq!(config.chain.rpc_url, "http://localhost:8545");
        assert_eq!(config.chain.gas_settings.funding_gas_limit, 1_000_000);
        assert_eq!(config.fundme_artifact, PathBuf::from("FundMe.json"));
        assert_eq!(config.fundme_version, ContractVersion::V2);
        assert_eq!(config.price_poll_interval, Duration::from_secs(2));
        assert!(config.private_key.is_none());
    }

    #[test]
    fn test_values_from_environment() {
        let config = AppConfig::from_lookup(lookup(&[
            ("RPC_URL", "https://rpc.sepolia.org"),
            ("CHAIN_ID", "11155111"),
            ("PRIVATE_KEY", "  "),
            ("ELECTION_CONTRACT_ADDRESS", "0x5FbDB2315678afecb367f032d93F642f64180aa3"),
            ("FUNDME_CONTRACT_VERSION", "v1"),
            ("FUNDING_GAS_LIMIT", "250000"),
            ("PRICE_POLL_INTERVAL_MS", "500"),
        ]))
        .unwrap();

        assert_eq!(config.chain.name, "Sepolia");
        assert_eq!(config.chain.gas_settings.funding_gas_limit, 250_000);
        assert_eq!(config.fundme_version, ContractVersion::V1);
        assert_eq!(config.price_poll_interval, Duration::from_millis(500));
        // Blank values count as unset
        assert!(config.private_key.is_none());
        assert!(config.election_address.is_some());
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        let err = AppConfig::from_lookup(lookup(&[("CHAIN_ID", "local")])).unwrap_err();
        assert!(matches!(err, ContractError::Config(_)));

        let err = AppConfig::from_lookup(lookup(&[("FUNDME_CONTRACT_VERSION", "v9")])).unwrap_err();
        assert!(matches!(err, ContractError::Config(_)));

        let err = AppConfig::from_lookup(lookup(&[("PRICE_POLL_INTERVAL_MS", "0")])).unwrap_err();
        assert!(matches!(err, ContractError::Config(_)));
    }
}
