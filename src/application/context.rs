use std::sync::Arc;

use tracing::info;

use crate::config::AppConfig;
use crate::domain::services::{parse_address, ContractError, ElectionApi, FundingApi};
use crate::infrastructure::contracts::artifacts::resolve_fundme_target;
use crate::infrastructure::contracts::election_client::ElectionClient;
use crate::infrastructure::contracts::fundme_client::FundMeClient;
use crate::infrastructure::contracts::session::WalletSession;

/// Clients built once at start-up around a single wallet session
pub struct AppContext {
    session: Arc<WalletSession>,
    election: Option<Arc<ElectionClient>>,
    fundme: Option<Arc<FundMeClient>>,
}

impl AppContext {
    pub async fn from_config(config: &AppConfig) -> Result<Self, ContractError> {
        let session = Arc::new(WalletSession::connect(config.chain.clone(), config.private_key.as_deref()).await?);
        Self::with_session(session, config)
    }

    /// Build the clients a configuration describes. Contracts that are not
    /// configured are left out; asking for them later fails with a config error.
    pub fn with_session(session: Arc<WalletSession>, config: &AppConfig) -> Result<Self, ContractError> {
        let election = match config.election_address.as_deref() {
            Some(address) => {
                let client = ElectionClient::new(session.clone(), parse_address(address)?)?;
                info!("Election contract at {:?}", client.address());
                Some(Arc::new(client))
            }
            None => None,
        };

        let fundme = match resolve_fundme_target(&config.fundme_artifact, config.fundme_address.as_deref()) {
            Ok(target) => {
                let client = match target.abi {
                    Some(abi) => FundMeClient::with_abi(
                        session.clone(),
                        target.address,
                        abi,
                        config.fundme_version,
                        config.price_poll_interval,
                    )?,
                    None => FundMeClient::new(
                        session.clone(),
                        target.address,
                        config.fundme_version,
                        config.price_poll_interval,
                    )?,
                };
                Some(Arc::new(client))
            }
            Err(ContractError::Config(reason)) => {
                info!("FundMe client unavailable: {}", reason);
                None
            }
            Err(e) => return Err(e),
        };

        Ok(Self { session, election, fundme })
    }

    pub fn session(&self) -> &Arc<WalletSession> {
        &self.session
    }

    pub fn election(&self) -> Result<Arc<dyn ElectionApi>, ContractError> {
        self.election
            .clone()
            .map(|client| client as Arc<dyn ElectionApi>)
            .ok_or_else(|| ContractError::Config("ELECTION_CONTRACT_ADDRESS is not set".to_string()))
    }

    pub fn funding(&self) -> Result<Arc<dyn FundingApi>, ContractError> {
        self.fundme
            .clone()
            .map(|client| client as Arc<dyn FundingApi>)
            .ok_or_else(|| {
                ContractError::Config("FundMe contract not configured: deploy it or set FUNDME_CONTRACT_ADDRESS".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn config(pairs: &[(&str, String)]) -> AppConfig {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        AppConfig::from_lookup(|key| map.get(key).cloned()).unwrap()
    }

    fn session(config: &AppConfig) -> Arc<WalletSession> {
        Arc::new(WalletSession::read_only(config.chain.clone()).unwrap())
    }

    #[test]
    fn test_unconfigured_contracts_are_config_errors() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("FundMe.json").display().to_string();
        let config = config(&[("FUNDME_ARTIFACT", missing)]);

        let context = AppContext::with_session(session(&config), &config).unwrap();
        assert!(matches!(context.election(), Err(ContractError::Config(_))));
        assert!(matches!(context.funding(), Err(ContractError::Config(_))));
    }

    #[test]
    fn test_configured_addresses_build_clients() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("FundMe.json").display().to_string();
        let config = config(&[
            ("FUNDME_ARTIFACT", missing),
            ("ELECTION_CONTRACT_ADDRESS", "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string()),
            ("FUNDME_CONTRACT_ADDRESS", "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512".to_string()),
            ("FUNDME_CONTRACT_VERSION", "v1".to_string()),
        ]);

        let context = AppContext::with_session(session(&config), &config).unwrap();
        assert!(context.election().is_ok());
        assert!(context.funding().is_ok());
        assert!(!context.session().has_signer());
    }

    #[test]
    fn test_bad_election_address_fails() {
        let config = config(&[("ELECTION_CONTRACT_ADDRESS", "0x123".to_string())]);
        let result = AppContext::with_session(session(&config), &config);
        assert!(matches!(result, Err(ContractError::InvalidAddress(_))));
    }
}
