use std::fs;
use std::path::Path;
use std::sync::Arc;

use ethers::{
    abi::{Abi, Tokenize},
    contract::ContractFactory,
    types::{Address, Bytes, I256},
};
use serde_json::Value;
use tracing::{error, info};

use crate::domain::services::ContractError;
use crate::infrastructure::contracts::artifacts::DeploymentArtifact;
use crate::infrastructure::contracts::session::{SignerClient, WalletSession};

/// Decimals of the mock ETH/USD feed
pub const MOCK_FEED_DECIMALS: u8 = 8;
/// Initial mock answer: 2000 USD with 8 decimals
pub const MOCK_FEED_INITIAL_ANSWER: i64 = 200_000_000_000;

// ============ COMPILED ARTIFACTS ============

/// ABI and creation bytecode of a compiled contract
#[derive(Debug, Clone)]
pub struct CompiledArtifact {
    pub abi: Abi,
    pub bytecode: Bytes,
}

impl CompiledArtifact {
    /// Read a Hardhat (`"bytecode": "0x.."`) or Foundry
    /// (`"bytecode": {"object": "0x.."}`) build artifact.
    pub fn load(path: &Path) -> Result<Self, ContractError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ContractError::Deployment(format!("Failed to read artifact {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
            .map_err(|e| ContractError::Deployment(format!("Invalid artifact {}: {}", path.display(), e)))
    }

    pub fn from_json(content: &str) -> Result<Self, String> {
        let json: Value = serde_json::from_str(content).map_err(|e| e.to_string())?;

        let abi_json = json.get("abi").cloned().ok_or("missing abi")?;
        let abi: Abi = serde_json::from_value(abi_json).map_err(|e| format!("bad abi: {}", e))?;

        let bytecode_hex = match json.get("bytecode") {
            Some(Value::String(hex)) => hex.as_str(),
            Some(Value::Object(object)) => object
                .get("object")
                .and_then(Value::as_str)
                .ok_or("missing bytecode.object")?,
            _ => return Err("missing bytecode".to_string()),
        };
        let bytes = hex::decode(bytecode_hex.trim_start_matches("0x")).map_err(|e| format!("bad bytecode: {}", e))?;
        if bytes.is_empty() {
            return Err("empty bytecode (abstract contract or interface?)".to_string());
        }

        Ok(Self { abi, bytecode: Bytes::from(bytes) })
    }

    /// Number of constructor arguments
    pub fn constructor_inputs(&self) -> usize {
        self.abi.constructor().map(|c| c.inputs.len()).unwrap_or(0)
    }
}

// ============ DEPLOYMENT ============

/// Price feed handed to the FundMe constructor
#[derive(Debug, Clone)]
pub enum PriceFeed {
    /// Feed already deployed at this address
    Existing(Address),
    /// Deploy `MockV3Aggregator(decimals, initial_answer)` first
    Mock {
        artifact: CompiledArtifact,
        decimals: u8,
        initial_answer: I256,
    },
}

impl PriceFeed {
    pub fn mock(artifact: CompiledArtifact) -> Self {
        PriceFeed::Mock {
            artifact,
            decimals: MOCK_FEED_DECIMALS,
            initial_answer: I256::from(MOCK_FEED_INITIAL_ANSWER),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeploymentResult {
    pub fundme_address: Address,
    pub price_feed_address: Option<Address>,
    pub artifact: DeploymentArtifact,
}

/// Deploy FundMe (and, if requested, a mock price feed) and write the
/// deployment file to `output`.
pub async fn deploy_fundme(
    session: &WalletSession,
    fundme: &CompiledArtifact,
    price_feed: Option<PriceFeed>,
    output: &Path,
) -> Result<DeploymentResult, ContractError> {
    let signer = session.signer()?;
    let signer_address = session
        .signer_address()
        .ok_or_else(|| ContractError::Connection("Could not fetch signer".to_string()))?;

    let price_feed_address = match price_feed {
        None => None,
        Some(PriceFeed::Existing(address)) => Some(address),
        Some(PriceFeed::Mock { artifact, decimals, initial_answer }) => {
            info!("Deploying MockV3Aggregator({}, {})", decimals, initial_answer);
            Some(deploy(&signer, &artifact, (decimals, initial_answer), "MockV3Aggregator").await?)
        }
    };

    let fundme_address = match (fundme.constructor_inputs(), price_feed_address) {
        (0, _) => deploy(&signer, fundme, (), "FundMe").await?,
        (1, Some(feed)) => deploy(&signer, fundme, feed, "FundMe").await?,
        (1, None) => {
            return Err(ContractError::Deployment(
                "FundMe constructor requires a price feed address".to_string(),
            ))
        }
        (n, _) => {
            return Err(ContractError::Deployment(format!(
                "Unsupported FundMe constructor with {} arguments",
                n
            )))
        }
    };
    info!("FundMe contract deployed to: {:?}", fundme_address);

    let artifact = DeploymentArtifact::new(fundme_address, signer_address, &fundme.abi)?;
    artifact.write_pretty(output)?;

    Ok(DeploymentResult {
        fundme_address,
        price_feed_address,
        artifact,
    })
}

async fn deploy<T: Tokenize>(
    signer: &Arc<SignerClient>,
    artifact: &CompiledArtifact,
    constructor_args: T,
    name: &str,
) -> Result<Address, ContractError> {
    let factory = ContractFactory::new(artifact.abi.clone(), artifact.bytecode.clone(), signer.clone());
    let deployer = factory.deploy(constructor_args).map_err(|e| {
        error!("Error preparing {} deployment: {}", name, e);
        ContractError::Deployment(format!("{}: {}", name, e))
    })?;
    let contract = deployer.send().await.map_err(|e| {
        error!("Error deploying {}: {}", name, e);
        ContractError::Deployment(format!("{}: {}", name, e))
    })?;
    info!("{} deployed to {:?}", name, contract.address());
    Ok(contract.address())
}
