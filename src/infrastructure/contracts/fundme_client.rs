use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ethers::{
    abi::Abi,
    contract::Contract,
    providers::{Http, Middleware, Provider},
    types::{Address, BlockNumber, TransactionReceipt, U256},
};
use tracing::{error, info, warn};

use crate::domain::models::{FundCandidateRequest, FundCandidateResponse, FundedCandidate, TransactionSummary};
use crate::domain::services::{parse_address, ContractError, FundingApi, PriceCallback};
use crate::infrastructure::contracts::abis;
use crate::infrastructure::contracts::event_utils::decode_candidate_funded;
use crate::infrastructure::contracts::session::{SignerClient, WalletSession};
use crate::infrastructure::contracts::transactions::{fetch_error, send_and_confirm};
use crate::infrastructure::contracts::types::ContractVersion;
use crate::infrastructure::contracts::utils::{format_eth, parse_eth_amount};
use crate::infrastructure::workers::price_listener::{ContractLogSource, PriceListener, PriceSubscription};

type RawCandidateV1 = (Address, String, U256);
type RawCandidateV2 = (Address, String, U256, String);

/// Client for the FundMe contract.
///
/// The configured [`ContractVersion`] decides how candidate snapshots are
/// decoded and whether price operations are available.
pub struct FundMeClient {
    session: Arc<WalletSession>,
    address: Address,
    abi: Abi,
    version: ContractVersion,
    reader: Contract<Provider<Http>>,
    price_poll_interval: Duration,
}

impl FundMeClient {
    /// Client using the bundled ABI for `version`
    pub fn new(
        session: Arc<WalletSession>,
        address: Address,
        version: ContractVersion,
        price_poll_interval: Duration,
    ) -> Result<Self, ContractError> {
        let abi = abis::load_fundme_abi(version)?;
        Self::with_abi(session, address, abi, version, price_poll_interval)
    }

    pub fn with_abi(
        session: Arc<WalletSession>,
        address: Address,
        abi: Abi,
        version: ContractVersion,
        price_poll_interval: Duration,
    ) -> Result<Self, ContractError> {
        abis::validate_fundme_abi(&abi, version)?;
        let reader = Contract::new(address, abi.clone(), session.provider());
        info!("FundMe client for {:?} using interface {}", address, version);

        Ok(Self {
            session,
            address,
            abi,
            version,
            reader,
            price_poll_interval,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn version(&self) -> ContractVersion {
        self.version
    }

    fn writer(&self) -> Result<Contract<SignerClient>, ContractError> {
        let signer = self.session.signer()?;
        Ok(Contract::new(self.address, self.abi.clone(), signer))
    }

    fn require_price_support(&self, operation: &str) -> Result<(), ContractError> {
        if self.version.supports_price_updates() {
            Ok(())
        } else {
            Err(ContractError::Unsupported {
                operation: operation.to_string(),
                version: self.version.to_string(),
            })
        }
    }

    // ============ FUNDING ============

    /// Fund a candidate with a decimal ETH amount.
    ///
    /// The amount is converted to wei exactly and rejected before submission
    /// when malformed or not positive.
    pub async fn fund_candidate(&self, request: FundCandidateRequest) -> Result<FundCandidateResponse, ContractError> {
        let candidate = parse_address(&request.candidate_address)?;
        let amount_wei = parse_eth_amount(&request.eth_amount)?;
        let writer = self.writer()?;
        let sender = self
            .session
            .signer_address()
            .ok_or_else(|| ContractError::Connection("Could not fetch signer".to_string()))?;

        let nonce = self
            .session
            .provider()
            .get_transaction_count(sender, Some(BlockNumber::Pending.into()))
            .await
            .map_err(|e| {
                error!("Error fetching nonce for {:?}: {}", sender, e);
                ContractError::operation("Failed to fund candidate", e.to_string())
            })?;

        let gas_limit = self.session.chain().gas_settings.funding_gas_limit;
        info!(
            "Funding candidate {} ({:?}) with {} ETH, nonce {}",
            request.name, candidate, request.eth_amount, nonce
        );

        let call = writer
            .method::<_, ()>("fundCandidate", (candidate, request.name.clone()))?
            .value(amount_wei)
            .gas(gas_limit)
            .nonce(nonce);
        let confirmations = self.session.chain().gas_settings.confirmations;
        let (transaction, receipt) = send_and_confirm(call, "Failed to fund candidate", confirmations).await?;

        let confirmed_wei = self.funded_amount_from_receipt(&receipt, candidate).unwrap_or_else(|| {
            warn!("No CandidateFunded event in {:?}, using submitted amount", transaction.transaction_hash);
            amount_wei
        });

        Ok(FundCandidateResponse {
            candidate,
            amount_wei: confirmed_wei,
            amount_eth: format_eth(confirmed_wei),
            transaction,
        })
    }

    /// Amount from the CandidateFunded event this contract emitted for `candidate`
    fn funded_amount_from_receipt(&self, receipt: &TransactionReceipt, candidate: Address) -> Option<U256> {
        receipt
            .logs
            .iter()
            .filter(|log| log.address == self.address)
            .find_map(|log| match decode_candidate_funded(log) {
                Ok(Some((funded, amount))) if funded == candidate => Some(amount),
                Ok(_) => None,
                Err(e) => {
                    warn!("Undecodable CandidateFunded event: {}", e);
                    None
                }
            })
    }

    pub async fn get_funding_for_candidate(&self, candidate_address: &str) -> Result<String, ContractError> {
        let candidate = parse_address(candidate_address)?;
        let wei = self
            .reader
            .method::<_, U256>("getFundingForCandidate", candidate)?
            .call()
            .await
            .map_err(|e| fetch_error("Failed to fetch funding for candidate", e))?;
        Ok(format_eth(wei))
    }

    /// Every candidate known to the contract, funded or not
    pub async fn get_candidates(&self) -> Result<Vec<FundedCandidate>, ContractError> {
        let message = "Failed to fetch candidates";
        let candidates = match self.version {
            ContractVersion::V1 => self
                .reader
                .method::<_, Vec<RawCandidateV1>>("getCandidates", ())?
                .call()
                .await
                .map_err(|e| fetch_error(message, e))?
                .into_iter()
                .map(|(address, name, funding)| funded_candidate(address, name, funding, None))
                .collect(),
            ContractVersion::V2 => self
                .reader
                .method::<_, Vec<RawCandidateV2>>("getCandidates", ())?
                .call()
                .await
                .map_err(|e| fetch_error(message, e))?
                .into_iter()
                .map(|(address, name, funding, dollars)| funded_candidate(address, name, funding, Some(dollars)))
                .collect(),
        };
        Ok(candidates)
    }

    pub async fn get_funded_candidates(&self) -> Result<Vec<FundedCandidate>, ContractError> {
        let candidates = self.get_candidates().await?;
        Ok(only_funded(candidates))
    }

    // ============ PRICE FEED ============

    pub async fn update_price(&self) -> Result<TransactionSummary, ContractError> {
        self.require_price_support("updatePrice")?;
        let call = self.writer()?.method::<_, ()>("updatePrice", ())?;
        let confirmations = self.session.chain().gas_settings.confirmations;
        let (summary, _) = send_and_confirm(call, "Failed to update price", confirmations).await?;
        info!("Price update requested in block {}", summary.block_number);
        Ok(summary)
    }

    /// Subscribe to PriceUpdated / PriceUpdateFailed events emitted from now on
    pub async fn listen_to_price_updates(&self, callback: PriceCallback) -> Result<PriceSubscription, ContractError> {
        self.require_price_support("Price events")?;
        let source = Arc::new(ContractLogSource::new(self.session.provider(), self.address));
        PriceListener::new(source, self.price_poll_interval)
            .subscribe(callback)
            .await
    }
}

#[async_trait]
impl FundingApi for FundMeClient {
    async fn fund_candidate(&self, request: FundCandidateRequest) -> Result<FundCandidateResponse, ContractError> {
        FundMeClient::fund_candidate(self, request).await
    }

    async fn get_funding_for_candidate(&self, candidate_address: String) -> Result<String, ContractError> {
        FundMeClient::get_funding_for_candidate(self, &candidate_address).await
    }

    async fn get_candidates(&self) -> Result<Vec<FundedCandidate>, ContractError> {
        FundMeClient::get_candidates(self).await
    }

    async fn get_funded_candidates(&self) -> Result<Vec<FundedCandidate>, ContractError> {
        FundMeClient::get_funded_candidates(self).await
    }

    async fn update_price(&self) -> Result<TransactionSummary, ContractError> {
        FundMeClient::update_price(self).await
    }

    async fn listen_to_price_updates(&self, callback: PriceCallback) -> Result<PriceSubscription, ContractError> {
        FundMeClient::listen_to_price_updates(self, callback).await
    }
}

fn funded_candidate(address: Address, name: String, funding_wei: U256, dollar_amount: Option<String>) -> FundedCandidate {
    FundedCandidate {
        address,
        name,
        funding_eth: format_eth(funding_wei),
        funding_wei,
        dollar_amount,
    }
}

fn only_funded(candidates: Vec<FundedCandidate>) -> Vec<FundedCandidate> {
    candidates.into_iter().filter(|c| !c.funding_wei.is_zero()).collect()
}
