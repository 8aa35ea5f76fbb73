use ethers::abi::{Abi, ParamType};

use crate::domain::services::ContractError;
use crate::infrastructure::contracts::types::ContractVersion;

const ELECTION_ABI: &str = include_str!("../../../../abis/election_abi.json");
const FUNDME_V1_ABI: &str = include_str!("../../../../abis/fundme_v1_abi.json");
const FUNDME_V2_ABI: &str = include_str!("../../../../abis/fundme_v2_abi.json");

const ELECTION_FUNCTIONS: &[&str] = &[
    "createElection",
    "addCandidate",
    "addVoter",
    "getCandidates",
    "getVoters",
    "getElectionName",
    "hasElectionStarted",
    "startElection",
    "endElection",
    "hasElectionFinalized",
    "getWinner",
];

pub fn load_election_abi() -> Result<Abi, ContractError> {
    parse_abi("election_abi.json", ELECTION_ABI)
}

/// Bundled FundMe ABI for the given interface version
pub fn load_fundme_abi(version: ContractVersion) -> Result<Abi, ContractError> {
    match version {
        ContractVersion::V1 => parse_abi("fundme_v1_abi.json", FUNDME_V1_ABI),
        ContractVersion::V2 => parse_abi("fundme_v2_abi.json", FUNDME_V2_ABI),
    }
}

fn parse_abi(name: &str, content: &str) -> Result<Abi, ContractError> {
    serde_json::from_str(content)
        .map_err(|e| ContractError::AbiError(format!("Failed to parse ABI {}: {}", name, e)))
}

/// Check that an election ABI exposes every function the client calls
pub fn validate_election_abi(abi: &Abi) -> Result<(), ContractError> {
    for function in ELECTION_FUNCTIONS {
        if abi.function(function).is_err() {
            return Err(ContractError::AbiError(format!("election ABI is missing function {}", function)));
        }
    }
    Ok(())
}

/// Check that a FundMe ABI matches the interface version the client was
/// configured for, including the shape of the Candidate struct.
pub fn validate_fundme_abi(abi: &Abi, version: ContractVersion) -> Result<(), ContractError> {
    for function in version.required_functions() {
        if abi.function(function).is_err() {
            return Err(ContractError::AbiError(format!(
                "FundMe ABI is missing function {} required by {}",
                function, version
            )));
        }
    }
    for event in version.required_events() {
        if abi.event(event).is_err() {
            return Err(ContractError::AbiError(format!(
                "FundMe ABI is missing event {} required by {}",
                event, version
            )));
        }
    }

    let get_candidates = abi.function("getCandidates")?;
    let fields = match get_candidates.outputs.first().map(|output| &output.kind) {
        Some(ParamType::Array(inner)) => match inner.as_ref() {
            ParamType::Tuple(components) => components.len(),
            _ => 0,
        },
        _ => 0,
    };
    if fields != version.candidate_fields() {
        return Err(ContractError::AbiError(format!(
            "getCandidates returns {} candidate fields, {} expects {}",
            fields,
            version,
            version.candidate_fields()
        )));
    }

    Ok(())
}
