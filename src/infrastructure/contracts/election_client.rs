use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDateTime, TimeZone, Utc};
use ethers::{
    abi::Abi,
    contract::Contract,
    providers::{Http, Provider},
    types::{Address, U256},
};
use tracing::info;

use crate::domain::models::{
    AddCandidateRequest, AddVoterRequest, Candidate, CreateElectionRequest, TransactionSummary, Voter, Winner,
};
use crate::domain::services::{parse_address, ContractError, ElectionApi};
use crate::infrastructure::contracts::abis;
use crate::infrastructure::contracts::session::{SignerClient, WalletSession};
use crate::infrastructure::contracts::transactions::{fetch_error, send_and_confirm};

type RawCandidate = (Address, String, String);
type RawVoter = (Address, String, U256);

/// Client for the election contract.
///
/// Reads go through the session's read-only provider and are never cached.
/// Writes are signed by the session wallet and resolve once mined.
pub struct ElectionClient {
    session: Arc<WalletSession>,
    address: Address,
    abi: Abi,
    reader: Contract<Provider<Http>>,
}

impl ElectionClient {
    pub fn new(session: Arc<WalletSession>, address: Address) -> Result<Self, ContractError> {
        let abi = abis::load_election_abi()?;
        Self::with_abi(session, address, abi)
    }

    pub fn with_abi(session: Arc<WalletSession>, address: Address, abi: Abi) -> Result<Self, ContractError> {
        abis::validate_election_abi(&abi)?;
        let reader = Contract::new(address, abi.clone(), session.provider());

        Ok(Self {
            session,
            address,
            abi,
            reader,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    fn writer(&self) -> Result<Contract<SignerClient>, ContractError> {
        let signer = self.session.signer()?;
        Ok(Contract::new(self.address, self.abi.clone(), signer))
    }

    fn confirmations(&self) -> usize {
        self.session.chain().gas_settings.confirmations
    }

    // ============ ELECTION LIFECYCLE ============

    pub async fn create_election(&self, request: CreateElectionRequest) -> Result<TransactionSummary, ContractError> {
        if request.name.trim().is_empty() {
            return Err(ContractError::InvalidInput("Election name cannot be empty".to_string()));
        }
        if request.end_time <= request.start_time {
            return Err(ContractError::InvalidInput("Election end must be after its start".to_string()));
        }

        info!("Creating election '{}' ({} - {})", request.name, request.start_time, request.end_time);
        let call = self.writer()?.method::<_, ()>(
            "createElection",
            (request.name, U256::from(request.start_time), U256::from(request.end_time)),
        )?;
        let (summary, _) = send_and_confirm(call, "Failed to create election", self.confirmations()).await?;
        Ok(summary)
    }

    pub async fn start_election(&self) -> Result<TransactionSummary, ContractError> {
        let call = self.writer()?.method::<_, ()>("startElection", ())?;
        let (summary, _) = send_and_confirm(call, "Failed to start election", self.confirmations()).await?;
        info!("Election started in block {}", summary.block_number);
        Ok(summary)
    }

    pub async fn end_election(&self) -> Result<TransactionSummary, ContractError> {
        let call = self.writer()?.method::<_, ()>("endElection", ())?;
        let (summary, _) = send_and_confirm(call, "Failed to end election", self.confirmations()).await?;
        info!("Election finalized in block {}", summary.block_number);
        Ok(summary)
    }

    pub async fn get_election_name(&self) -> Result<String, ContractError> {
        self.reader
            .method::<_, String>("getElectionName", ())?
            .call()
            .await
            .map_err(|e| fetch_error("Failed to fetch election name", e))
    }

    pub async fn has_election_started(&self) -> Result<bool, ContractError> {
        self.reader
            .method::<_, bool>("hasElectionStarted", ())?
            .call()
            .await
            .map_err(|e| fetch_error("Failed to fetch election start state", e))
    }

    pub async fn has_election_finalized(&self) -> Result<bool, ContractError> {
        self.reader
            .method::<_, bool>("hasElectionFinalized", ())?
            .call()
            .await
            .map_err(|e| fetch_error("Failed to fetch election finalized state", e))
    }

    pub async fn get_winner(&self) -> Result<Winner, ContractError> {
        let (address, name, party) = self
            .reader
            .method::<_, RawCandidate>("getWinner", ())?
            .call()
            .await
            .map_err(|e| fetch_error("Failed to fetch election winner", e))?;
        Ok(Winner { address, name, party })
    }

    // ============ REGISTRY ============

    pub async fn add_candidate(&self, request: AddCandidateRequest) -> Result<TransactionSummary, ContractError> {
        let candidate = parse_address(&request.address)?;
        if request.name.trim().is_empty() {
            return Err(ContractError::InvalidInput("Candidate name cannot be empty".to_string()));
        }

        let call = self
            .writer()?
            .method::<_, ()>("addCandidate", (candidate, request.name.clone(), request.party))?;
        let (summary, _) = send_and_confirm(call, "Failed to add candidate", self.confirmations()).await?;
        info!("Candidate {} ({:?}) registered", request.name, candidate);
        Ok(summary)
    }

    pub async fn add_voter(&self, request: AddVoterRequest) -> Result<TransactionSummary, ContractError> {
        let voter = parse_address(&request.address)?;
        if request.name.trim().is_empty() {
            return Err(ContractError::InvalidInput("Voter name cannot be empty".to_string()));
        }

        let call = self
            .writer()?
            .method::<_, ()>("addVoter", (voter, request.name.clone(), U256::from(request.age)))?;
        let (summary, _) = send_and_confirm(call, "Failed to add voter", self.confirmations()).await?;
        info!("Voter {} ({:?}) registered", request.name, voter);
        Ok(summary)
    }

    pub async fn get_candidates(&self) -> Result<Vec<Candidate>, ContractError> {
        let raw = self
            .reader
            .method::<_, Vec<RawCandidate>>("getCandidates", ())?
            .call()
            .await
            .map_err(|e| fetch_error("Failed to fetch candidates", e))?;
        Ok(raw.into_iter().map(candidate_from_raw).collect())
    }

    pub async fn get_voters(&self) -> Result<Vec<Voter>, ContractError> {
        let raw = self
            .reader
            .method::<_, Vec<RawVoter>>("getVoters", ())?
            .call()
            .await
            .map_err(|e| fetch_error("Failed to fetch voters", e))?;
        Ok(raw.into_iter().map(voter_from_raw).collect())
    }
}

#[async_trait]
impl ElectionApi for ElectionClient {
    async fn create_election(&self, request: CreateElectionRequest) -> Result<TransactionSummary, ContractError> {
        ElectionClient::create_election(self, request).await
    }

    async fn add_candidate(&self, request: AddCandidateRequest) -> Result<TransactionSummary, ContractError> {
        ElectionClient::add_candidate(self, request).await
    }

    async fn add_voter(&self, request: AddVoterRequest) -> Result<TransactionSummary, ContractError> {
        ElectionClient::add_voter(self, request).await
    }

    async fn get_candidates(&self) -> Result<Vec<Candidate>, ContractError> {
        ElectionClient::get_candidates(self).await
    }

    async fn get_voters(&self) -> Result<Vec<Voter>, ContractError> {
        ElectionClient::get_voters(self).await
    }

    async fn get_election_name(&self) -> Result<String, ContractError> {
        ElectionClient::get_election_name(self).await
    }

    async fn has_election_started(&self) -> Result<bool, ContractError> {
        ElectionClient::has_election_started(self).await
    }

    async fn start_election(&self) -> Result<TransactionSummary, ContractError> {
        ElectionClient::start_election(self).await
    }

    async fn end_election(&self) -> Result<TransactionSummary, ContractError> {
        ElectionClient::end_election(self).await
    }

    async fn has_election_finalized(&self) -> Result<bool, ContractError> {
        ElectionClient::has_election_finalized(self).await
    }

    async fn get_winner(&self) -> Result<Winner, ContractError> {
        ElectionClient::get_winner(self).await
    }
}

fn candidate_from_raw((address, name, party): RawCandidate) -> Candidate {
    Candidate { address, name, party }
}

fn voter_from_raw((address, name, age): RawVoter) -> Voter {
    // Ages beyond u64 are not meaningful; clamp rather than fail the whole list
    let age = if age > U256::from(u64::MAX) { u64::MAX } else { age.as_u64() };
    Voter { address, name, age }
}

/// Parse an election start/end time.
///
/// Accepts unix seconds, RFC 3339, or the `datetime-local` form
/// `YYYY-MM-DDTHH:MM[:SS]`, which is read as UTC.
pub fn parse_election_time(input: &str) -> Result<u64, ContractError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ContractError::InvalidInput("Election time cannot be empty".to_string()));
    }
    if let Ok(seconds) = input.parse::<u64>() {
        return Ok(seconds);
    }
    if let Ok(datetime) = chrono::DateTime::parse_from_rfc3339(input) {
        return non_negative(datetime.timestamp(), input);
    }
    for format in ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return non_negative(Utc.from_utc_datetime(&naive).timestamp(), input);
        }
    }
    Err(ContractError::InvalidInput(format!("Unrecognised election time: {}", input)))
}

fn non_negative(timestamp: i64, input: &str) -> Result<u64, ContractError> {
    u64::try_from(timestamp)
        .map_err(|_| ContractError::InvalidInput(format!("Election time before 1970: {}", input)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::contracts::config::chain_config;
    use crate::infrastructure::contracts::types::GasSettings;

    fn read_only_client() -> ElectionClient {
        let chain = chain_config(31337, "http://localhost:8545", GasSettings::default());
        let session = Arc::new(WalletSession::read_only(chain).unwrap());
        ElectionClient::new(session, Address::repeat_byte(0x11)).unwrap()
    }

    #[test]
    fn test_parse_election_time_formats() {
        assert_eq!(parse_election_time("1714557600").unwrap(), 1_714_557_600);
        assert_eq!(parse_election_time("2024-05-01T10:00").unwrap(), 1_714_557_600);
        assert_eq!(parse_election_time("2024-05-01T10:00:30").unwrap(), 1_714_557_630);
        assert_eq!(parse_election_time("2024-05-01T12:00:00+02:00").unwrap(), 1_714_557_600);
    }

    #[test]
    fn test_parse_election_time_rejects_garbage() {
        assert!(matches!(parse_election_time(""), Err(ContractError::InvalidInput(_))));
        assert!(matches!(parse_election_time("tomorrow"), Err(ContractError::InvalidInput(_))));
        assert!(matches!(parse_election_time("1960-01-01T00:00"), Err(ContractError::InvalidInput(_))));
    }

    #[test]
    fn test_raw_conversions() {
        let address = Address::repeat_byte(0x22);
        let candidate = candidate_from_raw((address, "Ada".to_string(), "Blue".to_string()));
        assert_eq!(candidate.party, "Blue");

        let voter = voter_from_raw((address, "Bob".to_string(), U256::from(42u64)));
        assert_eq!(voter.age, 42);
        let voter = voter_from_raw((address, "Old".to_string(), U256::MAX));
        assert_eq!(voter.age, u64::MAX);
    }

    #[tokio::test]
    async fn test_writes_without_wallet_fail_with_connection_error() {
        let client = read_only_client();
        assert!(matches!(client.start_election().await, Err(ContractError::Connection(_))));
        assert!(matches!(client.end_election().await, Err(ContractError::Connection(_))));
    }

    #[tokio::test]
    async fn test_inputs_are_validated_before_submission() {
        let client = read_only_client();

        let err = client
            .create_election(CreateElectionRequest { name: "General".to_string(), start_time: 10, end_time: 10 })
            .await
            .unwrap_err();
        assert!(matches!(err, ContractError::InvalidInput(_)));

        let err = client
            .add_candidate(AddCandidateRequest {
                address: "0x123".to_string(),
                name: "Ada".to_string(),
                party: "Blue".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ContractError::InvalidAddress(_)));

        let err = client
            .add_voter(AddVoterRequest { address: format!("{:?}", Address::repeat_byte(1)), name: " ".to_string(), age: 30 })
            .await
            .unwrap_err();
        assert!(matches!(err, ContractError::InvalidInput(_)));
    }
}
