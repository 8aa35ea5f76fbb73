use std::fmt;
use std::str::FromStr;

use ethers::types::H256;
use serde::{Deserialize, Serialize};

// ============ CONTRACT CONFIGURATION TYPES ============

/// Chain-specific configuration
#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub name: String,
    pub rpc_url: String,
    pub explorer_url: Option<String>,
    pub native_currency: NativeCurrency,
    pub gas_settings: GasSettings,
}

/// Native currency information
#[derive(Debug, Clone)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Gas settings for value-bearing writes
#[derive(Debug, Clone)]
pub struct GasSettings {
    /// Fixed gas limit attached to funding transactions
    pub funding_gas_limit: u64,
    /// Confirmations to wait for before a write resolves
    pub confirmations: usize,
}

impl Default for GasSettings {
    fn default() -> Self {
        Self {
            funding_gas_limit: 1_000_000,
            confirmations: 1,
        }
    }
}

// ============ CONTRACT VERSIONS ============

/// Revision of the FundMe contract interface the client targets.
///
/// `V1` exposes funding only. `V2` adds `dollarAmount` to candidate
/// snapshots, `updatePrice()` and the price events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContractVersion {
    V1,
    #[default]
    V2,
}

impl ContractVersion {
    pub fn supports_price_updates(&self) -> bool {
        matches!(self, ContractVersion::V2)
    }

    /// Number of fields in the contract's Candidate struct
    pub fn candidate_fields(&self) -> usize {
        match self {
            ContractVersion::V1 => 3,
            ContractVersion::V2 => 4,
        }
    }

    pub fn required_functions(&self) -> &'static [&'static str] {
        match self {
            ContractVersion::V1 => &["fundCandidate", "getFundingForCandidate", "getCandidates"],
            ContractVersion::V2 => &["fundCandidate", "getFundingForCandidate", "getCandidates", "updatePrice"],
        }
    }

    pub fn required_events(&self) -> &'static [&'static str] {
        match self {
            ContractVersion::V1 => &["CandidateFunded"],
            ContractVersion::V2 => &["CandidateFunded", "PriceUpdated", "PriceUpdateFailed"],
        }
    }
}

impl fmt::Display for ContractVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractVersion::V1 => write!(f, "v1"),
            ContractVersion::V2 => write!(f, "v2"),
        }
    }
}

impl FromStr for ContractVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" | "1" => Ok(ContractVersion::V1),
            "v2" | "2" => Ok(ContractVersion::V2),
            other => Err(format!("unknown FundMe contract version '{}'", other)),
        }
    }
}

// ============ TRANSACTION STATE ============

/// Lifecycle of a submitted write: Idle -> Submitted -> Confirmed | Failed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TransactionStatus {
    #[default]
    Idle,
    Submitted { transaction_hash: H256 },
    Confirmed { transaction_hash: H256, block_number: u64 },
    Failed { reason: String },
}

impl TransactionStatus {
    pub fn submitted(self, transaction_hash: H256) -> Self {
        match self {
            TransactionStatus::Idle => TransactionStatus::Submitted { transaction_hash },
            other => other,
        }
    }

    pub fn confirmed(self, block_number: u64) -> Self {
        match self {
            TransactionStatus::Submitted { transaction_hash } => {
                TransactionStatus::Confirmed { transaction_hash, block_number }
            }
            other => other,
        }
    }

    /// Failure is reachable from any non-terminal state; a rejected
    /// submission never leaves Idle.
    pub fn failed(self, reason: impl Into<String>) -> Self {
        if self.is_terminal() {
            return self;
        }
        TransactionStatus::Failed { reason: reason.into() }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Confirmed { .. } | TransactionStatus::Failed { .. })
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Idle => write!(f, "idle"),
            TransactionStatus::Submitted { transaction_hash } => write!(f, "submitted (0x{:x})", transaction_hash),
            TransactionStatus::Confirmed { transaction_hash, block_number } => {
                write!(f, "confirmed in block {} (0x{:x})", block_number, transaction_hash)
            }
            TransactionStatus::Failed { reason } => write!(f, "failed: {}", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_happy_path() {
        let hash = H256::repeat_byte(0xab);
        let status = TransactionStatus::default().submitted(hash);
        assert_eq!(status, TransactionStatus::Submitted { transaction_hash: hash });
        assert!(!status.is_terminal());

        let status = status.confirmed(12);
        assert_eq!(status, TransactionStatus::Confirmed { transaction_hash: hash, block_number: 12 });
        assert!(status.is_terminal());
    }

    #[test]
    fn test_transaction_failure_paths() {
        let rejected = TransactionStatus::Idle.failed("user rejected");
        assert_eq!(rejected, TransactionStatus::Failed { reason: "user rejected".to_string() });

        let reverted = TransactionStatus::Idle.submitted(H256::zero()).failed("reverted");
        assert!(matches!(reverted, TransactionStatus::Failed { .. }));
    }

    #[test]
    fn test_terminal_states_do_not_move() {
        let confirmed = TransactionStatus::Idle.submitted(H256::zero()).confirmed(1);
        assert_eq!(confirmed.clone().failed("late"), confirmed);

        // Confirming without a submission is not a valid transition
        assert_eq!(TransactionStatus::Idle.confirmed(5), TransactionStatus::Idle);
    }

    #[test]
    fn test_contract_version_parsing() {
        assert_eq!("v1".parse::<ContractVersion>().unwrap(), ContractVersion::V1);
        assert_eq!(" V2 ".parse::<ContractVersion>().unwrap(), ContractVersion::V2);
        assert_eq!("2".parse::<ContractVersion>().unwrap(), ContractVersion::V2);
        assert!("v3".parse::<ContractVersion>().is_err());
        assert_eq!(ContractVersion::default().to_string(), "v2");
    }

    #[test]
    fn test_contract_version_capabilities() {
        assert!(!ContractVersion::V1.supports_price_updates());
        assert!(ContractVersion::V2.supports_price_updates());
        assert!(!ContractVersion::V1.required_functions().contains(&"updatePrice"));
        assert_eq!(ContractVersion::V2.candidate_fields(), 4);
    }
}
