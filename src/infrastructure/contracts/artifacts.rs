use std::fs;
use std::path::Path;

use ethers::abi::Abi;
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::services::{parse_address, ContractError};

// ============ DEPLOYMENT ARTIFACT ============

/// File written by the deployment script and read by the funding client:
/// `{"contract": {"address", "signerAddress", "abi"}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentArtifact {
    pub contract: DeployedContract,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployedContract {
    pub address: String,
    pub signer_address: String,
    pub abi: serde_json::Value,
}

impl DeploymentArtifact {
    pub fn new(address: Address, signer_address: Address, abi: &Abi) -> Result<Self, ContractError> {
        let abi = serde_json::to_value(abi)
            .map_err(|e| ContractError::AbiError(format!("Failed to serialize ABI: {}", e)))?;
        Ok(Self {
            contract: DeployedContract {
                address: format!("{:?}", address),
                signer_address: format!("{:?}", signer_address),
                abi,
            },
        })
    }

    pub fn load(path: &Path) -> Result<Self, ContractError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ContractError::Config(format!("Failed to read deployment file {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            ContractError::Config(format!("Failed to parse deployment file {}: {}", path.display(), e))
        })
    }

    /// Write the artifact as pretty-printed JSON, replacing any existing file
    pub fn write_pretty(&self, path: &Path) -> Result<(), ContractError> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ContractError::Deployment(format!("Failed to serialize deployment: {}", e)))?;
        fs::write(path, content)
            .map_err(|e| ContractError::Deployment(format!("Failed to write {}: {}", path.display(), e)))?;
        info!("Deployment written to {}", path.display());
        Ok(())
    }

    pub fn address(&self) -> Result<Address, ContractError> {
        parse_address(&self.contract.address)
    }

    pub fn abi(&self) -> Result<Abi, ContractError> {
        serde_json::from_value(self.contract.abi.clone())
            .map_err(|e| ContractError::AbiError(format!("Invalid ABI in deployment file: {}", e)))
    }
}

// ============ FUNDME TARGET RESOLUTION ============

/// Where the funding client points and which ABI it uses. `abi` is `None`
/// when the bundled ABI for the configured version applies.
#[derive(Debug, Clone)]
pub struct FundMeTarget {
    pub address: Address,
    pub abi: Option<Abi>,
}

/// Resolve the FundMe contract from the deployment artifact, falling back
/// to an explicitly configured address with the bundled ABI.
pub fn resolve_fundme_target(artifact_path: &Path, fallback_address: Option<&str>) -> Result<FundMeTarget, ContractError> {
    if artifact_path.exists() {
        let artifact = DeploymentArtifact::load(artifact_path)?;
        let target = FundMeTarget {
            address: artifact.address()?,
            abi: Some(artifact.abi()?),
        };
        info!("FundMe contract {:?} loaded from {}", target.address, artifact_path.display());
        return Ok(target);
    }

    debug!("No deployment file at {}", artifact_path.display());
    match fallback_address {
        Some(address) => Ok(FundMeTarget {
            address: parse_address(address)?,
            abi: None,
        }),
        None => Err(ContractError::Config(format!(
            "FundMe contract not found: {} is missing and FUNDME_CONTRACT_ADDRESS is not set",
            artifact_path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::contracts::abis::load_fundme_abi;
    use crate::infrastructure::contracts::types::ContractVersion;
    use tempfile::tempdir;

    #[test]
    fn test_artifact_layout_and_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("FundMe.json");
        let abi = load_fundme_abi(ContractVersion::V2).unwrap();
        let address = Address::repeat_byte(0xaa);

        DeploymentArtifact::new(address, Address::repeat_byte(0xbb), &abi)
            .unwrap()
            .write_pretty(&path)
            .unwrap();

        let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(raw["contract"]["address"].is_string());
        assert!(raw["contract"]["signerAddress"].is_string());
        assert!(raw["contract"]["abi"].is_array());

        let loaded = DeploymentArtifact::load(&path).unwrap();
        assert_eq!(loaded.address().unwrap(), address);
        assert!(loaded.abi().unwrap().function("updatePrice").is_ok());
    }

    #[test]
    fn test_resolve_prefers_artifact() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("FundMe.json");
        let abi = load_fundme_abi(ContractVersion::V1).unwrap();
        DeploymentArtifact::new(Address::repeat_byte(0x01), Address::repeat_byte(0x02), &abi)
            .unwrap()
            .write_pretty(&path)
            .unwrap();

        let fallback = format!("{:?}", Address::repeat_byte(0x03));
        let target = resolve_fundme_target(&path, Some(&fallback)).unwrap();
        assert_eq!(target.address, Address::repeat_byte(0x01));
        assert!(target.abi.is_some());
    }

    #[test]
    fn test_resolve_falls_back_to_configured_address() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.json");

        let fallback = format!("{:?}", Address::repeat_byte(0x03));
        let target = resolve_fundme_target(&path, Some(&fallback)).unwrap();
        assert_eq!(target.address, Address::repeat_byte(0x03));
        assert!(target.abi.is_none());

        assert!(matches!(resolve_fundme_target(&path, None), Err(ContractError::Config(_))));
    }

    #[test]
    fn test_malformed_artifact_is_a_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("FundMe.json");
        fs::write(&path, "{\"contract\": 42}").unwrap();
        assert!(matches!(DeploymentArtifact::load(&path), Err(ContractError::Config(_))));
    }
}
