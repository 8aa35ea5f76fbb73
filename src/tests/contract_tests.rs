use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use ethers::providers::Middleware;
use ethers::types::{Address, I256, U256};
use tokio::sync::mpsc;

use crate::application::AppContext;
use crate::config::AppConfig;
use crate::domain::models::{FundCandidateRequest, PriceEvent};
use crate::domain::services::{ContractError, ElectionApi, FundingApi, PriceCallback};
use crate::infrastructure::contracts::deployer::{
    deploy_fundme, CompiledArtifact, PriceFeed, MOCK_FEED_DECIMALS, MOCK_FEED_INITIAL_ANSWER,
};
use crate::infrastructure::contracts::fundme_client::FundMeClient;
use crate::infrastructure::contracts::session::WalletSession;
use crate::infrastructure::contracts::types::ContractVersion;
use crate::infrastructure::contracts::utils::{format_price, parse_eth_amount, UnitsError};

/// Test configuration and setup
pub struct TestConfig {
    pub app: AppConfig,
}

impl TestConfig {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();
        let app = AppConfig::from_env()?;
        if app.private_key.is_none() {
            return Err("PRIVATE_KEY must be set".into());
        }
        Ok(Self { app })
    }

    pub async fn context(&self) -> Result<AppContext, Box<dyn std::error::Error>> {
        Ok(AppContext::from_config(&self.app).await?)
    }

    /// Build artifact path from the environment, e.g. `out/FundMe.sol/FundMe.json`
    fn artifact_path(key: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
        std::env::var(key)
            .map(PathBuf::from)
            .map_err(|_| format!("{} must point to a compiled artifact", key).into())
    }
}

/// Test wallet and network connection
pub async fn test_connection() -> Result<(), Box<dyn std::error::Error>> {
    println!("Testing wallet and network connection...");

    let config = TestConfig::from_env()?;
    let context = config.context().await?;
    let session = context.session();

    let wallet_address = session.signer_address().ok_or("no wallet in session")?;
    println!("   Wallet: {:?}", wallet_address);

    let balance = session.provider().get_balance(wallet_address, None).await?;
    let chain = session.chain();
    println!(
        "   Balance: {} {}",
        ethers::utils::format_units(balance, chain.native_currency.decimals as u32)?,
        chain.native_currency.symbol
    );

    println!("   Network: {} (Chain ID: {})", chain.name, chain.chain_id);
    if let Some(explorer) = &chain.explorer_url {
        println!("   Explorer: {}", explorer);
    }

    println!("Connection test completed successfully!");
    Ok(())
}

/// startElection on a contract without an election must revert
pub async fn test_start_before_create_fails() -> Result<(), Box<dyn std::error::Error>> {
    println!("Testing start before create...");

    let context = TestConfig::from_env()?.context().await?;
    let election = context.election()?;

    if !election.get_election_name().await?.trim().is_empty() {
        println!("   Election already created, skipping (needs a fresh deployment)");
        return Ok(());
    }

    match election.start_election().await {
        Err(ContractError::Operation { message, reason }) => {
            println!("   Start rejected as expected: {} ({})", message, reason);
        }
        Err(other) => return Err(format!("expected an operation error, got {}", other).into()),
        Ok(summary) => return Err(format!("start succeeded in block {}", summary.block_number).into()),
    }

    println!("Start before create test completed successfully!");
    Ok(())
}

/// endElection finalizes the election; a second call must revert
pub async fn test_end_election_finalizes() -> Result<(), Box<dyn std::error::Error>> {
    println!("Testing election finalization...");

    let context = TestConfig::from_env()?.context().await?;
    let election = context.election()?;

    if !election.has_election_started().await? {
        println!("   Election not started, skipping");
        return Ok(());
    }

    if !election.has_election_finalized().await? {
        let summary = election.end_election().await?;
        println!("   Election ended in block {}", summary.block_number);
    }
    assert!(election.has_election_finalized().await?, "election should be finalized");

    let winner = election.get_winner().await?;
    println!("   Winner: {:?}", winner.name);

    match election.end_election().await {
        Err(ContractError::Operation { reason, .. }) => println!("   Second end rejected: {}", reason),
        Err(other) => return Err(format!("expected an operation error, got {}", other).into()),
        Ok(_) => return Err("second endElection succeeded".into()),
    }

    println!("Finalization test completed successfully!");
    Ok(())
}

/// Funding a candidate never decreases, and grows by at least the amount sent
pub async fn test_funding_is_monotonic() -> Result<(), Box<dyn std::error::Error>> {
    println!("Testing funding monotonicity...");

    let context = TestConfig::from_env()?.context().await?;
    let election = context.election()?;
    let funding = context.funding()?;

    let candidates = election.get_candidates().await?;
    let candidate = candidates.first().ok_or("election has no candidates")?;
    let address = format!("{:?}", candidate.address);

    let before = parse_eth_amount_or_zero(&funding.get_funding_for_candidate(address.clone()).await?)?;
    let response = funding
        .fund_candidate(FundCandidateRequest {
            candidate_address: address.clone(),
            name: candidate.name.clone(),
            eth_amount: "0.01".to_string(),
        })
        .await?;
    println!("   Funded {} ETH in {:?}", response.amount_eth, response.transaction.transaction_hash);

    let after = parse_eth_amount_or_zero(&funding.get_funding_for_candidate(address).await?)?;
    assert!(after >= before + parse_eth_amount("0.01")?, "funding did not grow by the amount sent");

    let funded = funding.get_funded_candidates().await?;
    assert!(funded.iter().any(|c| c.address == candidate.address));

    println!("Funding monotonicity test completed successfully!");
    Ok(())
}

/// Deploy FundMe against a mock feed (8 decimals, 200000000000), check the
/// pushed price and a funding round trip.
pub async fn test_mock_feed_scenario() -> Result<(), Box<dyn std::error::Error>> {
    println!("Testing FundMe with mock price feed...");

    let config = TestConfig::from_env()?;
    let fundme_artifact = CompiledArtifact::load(&TestConfig::artifact_path("FUNDME_BUILD_ARTIFACT")?)?;
    let mock_artifact = CompiledArtifact::load(&TestConfig::artifact_path("MOCK_AGGREGATOR_ARTIFACT")?)?;

    let session = Arc::new(WalletSession::connect(config.app.chain.clone(), config.app.private_key.as_deref()).await?);
    let output = std::env::temp_dir().join(format!("FundMe-{}.json", uuid::Uuid::new_v4()));
    let deployment = deploy_fundme(&session, &fundme_artifact, Some(PriceFeed::mock(mock_artifact)), &output).await?;
    println!("   FundMe: {:?}", deployment.fundme_address);
    println!("   Feed:   {:?}", deployment.price_feed_address);

    let client = FundMeClient::with_abi(
        session,
        deployment.fundme_address,
        deployment.artifact.abi()?,
        ContractVersion::V2,
        Duration::from_millis(200),
    )?;

    let expected_price = format_price(I256::from(MOCK_FEED_INITIAL_ANSWER), MOCK_FEED_DECIMALS);
    assert_eq!(expected_price, "2000.00000000");

    // One updatePrice must produce exactly one PriceUpdated with the feed's value
    let (tx, mut rx) = mpsc::unbounded_channel();
    let callback: PriceCallback = Arc::new(move |event| {
        let _ = tx.send(event);
    });
    let subscription = client.listen_to_price_updates(callback).await?;
    client.update_price().await?;

    let event = tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await?
        .ok_or("price listener stopped")?;
    match event {
        PriceEvent::Updated(quote) => assert_eq!(quote.eth_usd, expected_price),
        other => return Err(format!("unexpected price event {:?}", other).into()),
    }
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(rx.try_recv().is_err(), "price event delivered more than once");
    subscription.unsubscribe().await;

    let candidate = Address::random();
    let response = client
        .fund_candidate(FundCandidateRequest {
            candidate_address: format!("{:?}", candidate),
            name: "Mock Candidate".to_string(),
            eth_amount: "1.0".to_string(),
        })
        .await?;
    assert_eq!(response.amount_eth, "1.0");
    assert_eq!(client.get_funding_for_candidate(&format!("{:?}", candidate)).await?, "1.0");

    let _ = std::fs::remove_file(&output);
    println!("Mock feed scenario completed successfully!");
    Ok(())
}

fn parse_eth_amount_or_zero(amount: &str) -> Result<U256, Box<dyn std::error::Error>> {
    match parse_eth_amount(amount) {
        Ok(wei) => Ok(wei),
        Err(UnitsError::NonPositive) => Ok(U256::zero()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_funding_parses_as_zero() {
        assert!(parse_eth_amount_or_zero("0.0").unwrap().is_zero());
        assert_eq!(parse_eth_amount_or_zero("1.5").unwrap(), U256::exp10(17) * 15);
        assert!(parse_eth_amount_or_zero("abc").is_err());
    }
}
