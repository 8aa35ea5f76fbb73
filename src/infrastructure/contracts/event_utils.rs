use ethers::abi::{self, ParamType, Token};
use ethers::types::{Address, Log, H256, U256};
use sha3::{Digest, Keccak256};

use crate::domain::models::{PriceEvent, PriceQuote};
use crate::domain::services::ContractError;

/// Keccak256 of an event signature, i.e. the log's first topic
pub fn event_topic(event_signature: &str) -> H256 {
    let mut hasher = Keccak256::new();
    hasher.update(event_signature.as_bytes());
    H256::from_slice(&hasher.finalize())
}

/// Event signatures of the FundMe contract
pub mod event_signatures {
    use super::*;

    pub const CANDIDATE_FUNDED: &str = "CandidateFunded(address,uint256)";
    pub const PRICE_UPDATED: &str = "PriceUpdated(string)";
    pub const PRICE_UPDATE_FAILED: &str = "PriceUpdateFailed(string)";

    pub fn candidate_funded() -> H256 {
        event_topic(CANDIDATE_FUNDED)
    }

    pub fn price_updated() -> H256 {
        event_topic(PRICE_UPDATED)
    }

    pub fn price_update_failed() -> H256 {
        event_topic(PRICE_UPDATE_FAILED)
    }

    pub fn all_signatures() -> Vec<(H256, &'static str)> {
        vec![
            (candidate_funded(), CANDIDATE_FUNDED),
            (price_updated(), PRICE_UPDATED),
            (price_update_failed(), PRICE_UPDATE_FAILED),
        ]
    }
}

/// Maps log topics back to the FundMe event they belong to
pub struct EventMatcher {
    known_signatures: Vec<(H256, &'static str)>,
}

impl EventMatcher {
    pub fn new() -> Self {
        Self { known_signatures: event_signatures::all_signatures() }
    }

    pub fn match_topic(&self, topic: &H256) -> Option<&'static str> {
        self.known_signatures
            .iter()
            .find(|(sig, _)| sig == topic)
            .map(|(_, name)| *name)
    }

    pub fn match_log(&self, log: &Log) -> Option<&'static str> {
        log.topics.first().and_then(|topic| self.match_topic(topic))
    }
}

impl Default for EventMatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a PriceUpdated / PriceUpdateFailed log. Returns `None` for logs
/// of any other event.
pub fn decode_price_event(log: &Log) -> Result<Option<PriceEvent>, ContractError> {
    let topic = match log.topics.first() {
        Some(topic) => *topic,
        None => return Ok(None),
    };
    let block_number = log.block_number.map(|n| n.as_u64());

    if topic == event_signatures::price_updated() {
        let eth_usd = decode_single_string(log, event_signatures::PRICE_UPDATED)?;
        return Ok(Some(PriceEvent::Updated(PriceQuote {
            eth_usd,
            block_number,
            transaction_hash: log.transaction_hash,
        })));
    }

    if topic == event_signatures::price_update_failed() {
        let reason = decode_single_string(log, event_signatures::PRICE_UPDATE_FAILED)?;
        return Ok(Some(PriceEvent::UpdateFailed { reason, block_number }));
    }

    Ok(None)
}

/// Decode a CandidateFunded log into (candidate, amount in wei)
pub fn decode_candidate_funded(log: &Log) -> Result<Option<(Address, U256)>, ContractError> {
    if log.topics.first() != Some(&event_signatures::candidate_funded()) {
        return Ok(None);
    }
    if log.topics.len() < 2 {
        return Err(ContractError::AbiError("CandidateFunded event has insufficient topics".to_string()));
    }

    // Indexed address is left-padded to 32 bytes
    let candidate = Address::from_slice(&log.topics[1].as_bytes()[12..]);
    let tokens = abi::decode(&[ParamType::Uint(256)], &log.data)?;
    let amount = tokens
        .into_iter()
        .next()
        .and_then(Token::into_uint)
        .ok_or_else(|| ContractError::AbiError("CandidateFunded event has no amount".to_string()))?;

    Ok(Some((candidate, amount)))
}

fn decode_single_string(log: &Log, event: &str) -> Result<String, ContractError> {
    abi::decode(&[ParamType::String], &log.data)?
        .into_iter()
        .next()
        .and_then(Token::into_string)
        .ok_or_else(|| ContractError::AbiError(format!("{} event has no string payload", event)))
}
