use std::sync::Arc;

use ethers::{
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::Address,
};
use tracing::{error, info};

use crate::domain::services::ContractError;
use crate::infrastructure::contracts::types::ChainConfig;

/// Signing client used for every state-changing call
pub type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Wallet session shared by the contract clients.
///
/// Built once at start-up and injected into each client. The read-only
/// provider is always available; the signer only when a wallet key was
/// supplied.
#[derive(Debug)]
pub struct WalletSession {
    chain: ChainConfig,
    provider: Arc<Provider<Http>>,
    signer: Option<Arc<SignerClient>>,
}

impl WalletSession {
    /// Session without a wallet. Reads work; writes fail with a connection error.
    pub fn read_only(chain: ChainConfig) -> Result<Self, ContractError> {
        let provider = create_provider(&chain.rpc_url)?;
        Ok(Self {
            chain,
            provider: Arc::new(provider),
            signer: None,
        })
    }

    /// Connect to the node and, when a key is given, unlock the wallet.
    ///
    /// The wallet key is checked before the node is contacted; the node's
    /// chain id must match the configured chain.
    pub async fn connect(chain: ChainConfig, private_key: Option<&str>) -> Result<Self, ContractError> {
        let provider = create_provider(&chain.rpc_url)?;

        let Some(private_key) = private_key else {
            info!("No wallet configured, session is read-only");
            return Ok(Self {
                chain,
                provider: Arc::new(provider),
                signer: None,
            });
        };

        let wallet = private_key.trim().parse::<LocalWallet>().map_err(|e| {
            error!("Error parsing wallet key: {}", e);
            ContractError::Connection("Could not fetch signer. Please check the wallet key.".to_string())
        })?;

        let node_chain_id = provider.get_chainid().await.map_err(|e| {
            error!("Error querying chain id from {}: {}", chain.rpc_url, e);
            ContractError::Connection(format!("Could not reach node at {}", chain.rpc_url))
        })?;
        if node_chain_id.as_u64() != chain.chain_id {
            return Err(ContractError::Connection(format!(
                "Chain ID mismatch: node reports {}, configured {}",
                node_chain_id, chain.chain_id
            )));
        }

        let wallet = wallet.with_chain_id(chain.chain_id);
        info!("Wallet {:?} connected to {} ({})", wallet.address(), chain.name, chain.chain_id);
        let signer = SignerMiddleware::new(provider.clone(), wallet);

        Ok(Self {
            chain,
            provider: Arc::new(provider),
            signer: Some(Arc::new(signer)),
        })
    }

    pub fn chain(&self) -> &ChainConfig {
        &self.chain
    }

    /// Read-only provider, independent of the wallet
    pub fn provider(&self) -> Arc<Provider<Http>> {
        self.provider.clone()
    }

    pub fn signer(&self) -> Result<Arc<SignerClient>, ContractError> {
        self.signer.clone().ok_or_else(|| {
            ContractError::Connection("No wallet available. Configure PRIVATE_KEY to send transactions.".to_string())
        })
    }

    pub fn signer_address(&self) -> Option<Address> {
        self.signer.as_ref().map(|signer| signer.address())
    }

    pub fn has_signer(&self) -> bool {
        self.signer.is_some()
    }
}

fn create_provider(rpc_url: &str) -> Result<Provider<Http>, ContractError> {
    Provider::<Http>::try_from(rpc_url)
        .map_err(|e| ContractError::Connection(format!("Invalid RPC URL {}: {}", rpc_url, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::contracts::config::chain_config;
    use crate::infrastructure::contracts::types::GasSettings;

    fn local_chain(rpc_url: &str) -> ChainConfig {
        chain_config(31337, rpc_url, GasSettings::default())
    }

    #[test]
    fn test_read_only_session_has_no_signer() {
        let session = WalletSession::read_only(local_chain("http://localhost:8545")).unwrap();
        assert!(!session.has_signer());
        assert!(session.signer_address().is_none());
        assert!(matches!(session.signer(), Err(ContractError::Connection(_))));
    }

    #[test]
    fn test_invalid_rpc_url_is_a_connection_error() {
        let err = WalletSession::read_only(local_chain("not a url")).unwrap_err();
        assert!(matches!(err, ContractError::Connection(_)));
    }

    #[tokio::test]
    async fn test_malformed_key_is_rejected_before_contacting_node() {
        let err = WalletSession::connect(local_chain("http://localhost:1"), Some("not-a-key"))
            .await
            .unwrap_err();
        assert!(matches!(err, ContractError::Connection(_)));
    }

    #[tokio::test]
    async fn test_connect_without_key_is_read_only() {
        let session = WalletSession::connect(local_chain("http://localhost:1"), None).await.unwrap();
        assert!(!session.has_signer());
    }
}
