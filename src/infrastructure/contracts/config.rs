use crate::infrastructure::contracts::types::{ChainConfig, GasSettings, NativeCurrency};

pub const LOCAL_CHAIN_ID: u64 = 31337;
pub const SEPOLIA_CHAIN_ID: u64 = 11155111;

/// Build the chain configuration for `chain_id`, using presets for the
/// chains the contracts are deployed on and a generic entry otherwise.
pub fn chain_config(chain_id: u64, rpc_url: &str, gas_settings: GasSettings) -> ChainConfig {
    match chain_id {
        LOCAL_CHAIN_ID => get_local_config(rpc_url, gas_settings),
        SEPOLIA_CHAIN_ID => get_sepolia_config(rpc_url, gas_settings),
        _ => ChainConfig {
            chain_id,
            name: format!("Chain {}", chain_id),
            rpc_url: rpc_url.to_string(),
            explorer_url: None,
            native_currency: ether(),
            gas_settings,
        },
    }
}

/// Local Hardhat/Anvil development node
fn get_local_config(rpc_url: &str, gas_settings: GasSettings) -> ChainConfig {
    ChainConfig {
        chain_id: LOCAL_CHAIN_ID,
        name: "Local Development".to_string(),
        rpc_url: rpc_url.to_string(),
        explorer_url: None,
        native_currency: ether(),
        gas_settings,
    }
}

/// Sepolia testnet configuration
fn get_sepolia_config(rpc_url: &str, gas_settings: GasSettings) -> ChainConfig {
    ChainConfig {
        chain_id: SEPOLIA_CHAIN_ID,
        name: "Sepolia".to_string(),
        rpc_url: rpc_url.to_string(),
        explorer_url: Some("https://sepolia.etherscan.io".to_string()),
        native_currency: ether(),
        gas_settings,
    }
}

fn ether() -> NativeCurrency {
    NativeCurrency {
        name: "Ether".to_string(),
        symbol: "ETH".to_string(),
        decimals: 18,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_preset() {
        let config = chain_config(31337, "http://localhost:8545", GasSettings::default());
        assert_eq!(config.name, "Local Development");
        assert_eq!(config.native_currency.decimals, 18);
        assert_eq!(config.gas_settings.funding_gas_limit, 1_000_000);
    }

    #[test]
    fn test_sepolia_preset_has_explorer() {
        let config = chain_config(SEPOLIA_CHAIN_ID, "https://rpc.sepolia.org", GasSettings::default());
        assert_eq!(config.explorer_url.as_deref(), Some("https://sepolia.etherscan.io"));
        assert_eq!(config.native_currency.symbol, "ETH");
    }

    #[test]
    fn test_unknown_chain_gets_generic_entry() {
        let config = chain_config(5, "http://node:8545", GasSettings::default());
        assert_eq!(config.name, "Chain 5");
        assert_eq!(config.rpc_url, "http://node:8545");
        assert!(config.explorer_url.is_none());
    }
}
