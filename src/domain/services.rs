use std::sync::Arc;

use async_trait::async_trait;
use ethers::types::Address;
use thiserror::Error;

use crate::domain::models::{
    AddCandidateRequest, AddVoterRequest, Candidate, CreateElectionRequest,
    FundCandidateRequest, FundCandidateResponse, FundedCandidate, PriceEvent,
    TransactionSummary, Voter, Winner,
};
use crate::infrastructure::contracts::utils::UnitsError;
use crate::infrastructure::workers::price_listener::PriceSubscription;

// ============ CONTRACT ERROR TYPES ============

#[derive(Debug, Error)]
pub enum ContractError {
    /// No signer available, key rejected, or the node is unreachable
    #[error("Connection error: {0}")]
    Connection(String),
    /// A write was reverted or could not be submitted
    #[error("{message} ({reason})")]
    Operation { message: String, reason: String },
    /// A read query failed
    #[error("{message} ({reason})")]
    Fetch { message: String, reason: String },
    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] UnitsError),
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("{operation} is not supported by FundMe contract {version}")]
    Unsupported { operation: String, version: String },
    #[error("ABI error: {0}")]
    AbiError(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Deployment error: {0}")]
    Deployment(String),
}

impl ContractError {
    pub fn operation(message: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Operation { message: message.into(), reason: reason.into() }
    }

    pub fn fetch(message: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch { message: message.into(), reason: reason.into() }
    }

    /// The fixed, user-facing part of the error
    pub fn user_message(&self) -> String {
        match self {
            Self::Operation { message, .. } | Self::Fetch { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<ethers::contract::AbiError> for ContractError {
    fn from(err: ethers::contract::AbiError) -> Self {
        ContractError::AbiError(err.to_string())
    }
}

impl From<ethers::abi::Error> for ContractError {
    fn from(err: ethers::abi::Error) -> Self {
        ContractError::AbiError(err.to_string())
    }
}

/// Parses a hex address, mapping failures to `InvalidAddress`
pub fn parse_address(address: &str) -> Result<Address, ContractError> {
    address
        .trim()
        .parse::<Address>()
        .map_err(|e| ContractError::InvalidAddress(format!("{}: {}", address, e)))
}

// ============ CLIENT SERVICES ============

/// Callback invoked once per price event for the lifetime of a subscription
pub type PriceCallback = Arc<dyn Fn(PriceEvent) + Send + Sync>;

/// Election contract operations.
///
/// Writes resolve after on-chain confirmation. A read issued while a write
/// is still pending is not guaranteed to observe it; callers refresh after
/// the write resolves.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ElectionApi: Send + Sync {
    async fn create_election(&self, request: CreateElectionRequest) -> Result<TransactionSummary, ContractError>;
    async fn add_candidate(&self, request: AddCandidateRequest) -> Result<TransactionSummary, ContractError>;
    async fn add_voter(&self, request: AddVoterRequest) -> Result<TransactionSummary, ContractError>;
    async fn get_candidates(&self) -> Result<Vec<Candidate>, ContractError>;
    async fn get_voters(&self) -> Result<Vec<Voter>, ContractError>;
    async fn get_election_name(&self) -> Result<String, ContractError>;
    async fn has_election_started(&self) -> Result<bool, ContractError>;
    async fn start_election(&self) -> Result<TransactionSummary, ContractError>;
    async fn end_election(&self) -> Result<TransactionSummary, ContractError>;
    async fn has_election_finalized(&self) -> Result<bool, ContractError>;
    async fn get_winner(&self) -> Result<Winner, ContractError>;
}

/// FundMe contract operations, with the same refresh contract as
/// [`ElectionApi`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FundingApi: Send + Sync {
    async fn fund_candidate(&self, request: FundCandidateRequest) -> Result<FundCandidateResponse, ContractError>;
    async fn get_funding_for_candidate(&self, candidate_address: String) -> Result<String, ContractError>;
    async fn get_candidates(&self) -> Result<Vec<FundedCandidate>, ContractError>;
    async fn get_funded_candidates(&self) -> Result<Vec<FundedCandidate>, ContractError>;
    async fn update_price(&self) -> Result<TransactionSummary, ContractError>;
    async fn listen_to_price_updates(&self, callback: PriceCallback) -> Result<PriceSubscription, ContractError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_error_keeps_reason() {
        let err = ContractError::operation("Failed to start election", "execution reverted: no election");
        assert!(matches!(err, ContractError::Operation { .. }));
        assert_eq!(err.user_message(), "Failed to start election");
        assert!(err.to_string().contains("no election"));
    }

    #[test]
    fn test_units_error_converts_to_invalid_amount() {
        let err: ContractError = UnitsError::NonPositive.into();
        assert!(matches!(err, ContractError::InvalidAmount(UnitsError::NonPositive)));
    }

    #[test]
    fn test_parse_address() {
        let address = parse_address("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266").unwrap();
        assert_eq!(format!("{:?}", address), "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266");
        assert!(matches!(parse_address("invalid_address"), Err(ContractError::InvalidAddress(_))));
        assert!(matches!(parse_address(""), Err(ContractError::InvalidAddress(_))));
    }
}
