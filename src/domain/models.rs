use ethers::types::{Address, H256, U256};
use serde::{Deserialize, Serialize};

use crate::infrastructure::contracts::types::TransactionStatus;

// ============ ELECTION MODELS ============

/// Candidate as registered in the election contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub address: Address,
    pub name: String,
    pub party: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    pub address: Address,
    pub name: String,
    pub age: u64,
}

/// Winner of a finalized election. The contract returns an empty name
/// until the election has been finalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Winner {
    pub address: Address,
    pub name: String,
    pub party: String,
}

impl Winner {
    pub fn is_decided(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

/// Election state assembled from independent reads; the fields are not
/// read atomically and may disagree transiently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ElectionSnapshot {
    pub name: Option<String>,
    pub has_started: bool,
    pub has_finalized: bool,
    pub winner: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateElectionRequest {
    pub name: String,
    /// Unix timestamp in seconds
    pub start_time: u64,
    /// Unix timestamp in seconds
    pub end_time: u64,
}

#[derive(Debug, Clone)]
pub struct AddCandidateRequest {
    pub address: String,
    pub name: String,
    pub party: String,
}

#[derive(Debug, Clone)]
pub struct AddVoterRequest {
    pub address: String,
    pub name: String,
    pub age: u64,
}

// ============ FUNDING MODELS ============

/// Funding snapshot of a candidate as held by the FundMe contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FundedCandidate {
    pub address: Address,
    pub name: String,
    pub funding_wei: U256,
    /// Funding formatted as an ETH decimal string
    pub funding_eth: String,
    /// USD value as reported by the contract; absent on contracts without it
    pub dollar_amount: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FundCandidateRequest {
    pub candidate_address: String,
    pub name: String,
    /// Decimal ETH amount, e.g. "0.1"
    pub eth_amount: String,
}

#[derive(Debug, Clone)]
pub struct FundCandidateResponse {
    pub candidate: Address,
    pub amount_wei: U256,
    pub amount_eth: String,
    pub transaction: TransactionSummary,
}

/// ETH to USD quote pushed by a PriceUpdated event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceQuote {
    pub eth_usd: String,
    pub block_number: Option<u64>,
    pub transaction_hash: Option<H256>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceEvent {
    Updated(PriceQuote),
    UpdateFailed {
        reason: String,
        block_number: Option<u64>,
    },
}

// ============ TRANSACTION MODELS ============

/// Outcome of a confirmed write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSummary {
    pub transaction_hash: H256,
    pub block_number: u64,
    pub status: TransactionStatus,
}
