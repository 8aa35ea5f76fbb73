use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use dotenvy::dotenv;
use ethers::types::I256;
use tracing::{error, info};

use pollingapp::config::{AppConfig, DEFAULT_FUNDME_ARTIFACT};
use pollingapp::domain::services::{parse_address, ContractError};
use pollingapp::infrastructure::contracts::deployer::{
    deploy_fundme, CompiledArtifact, PriceFeed, MOCK_FEED_DECIMALS, MOCK_FEED_INITIAL_ANSWER,
};
use pollingapp::infrastructure::contracts::session::WalletSession;

/// Deploy the FundMe contract and write its deployment file
#[derive(Parser, Debug)]
#[command(name = "deploy_fundme", version)]
struct Args {
    /// Compiled FundMe artifact (Hardhat or Foundry JSON)
    #[arg(long, env = "FUNDME_BUILD_ARTIFACT")]
    artifact: PathBuf,

    /// Existing ETH/USD price feed passed to the constructor
    #[arg(long, conflicts_with = "mock_feed")]
    price_feed: Option<String>,

    /// Compiled MockV3Aggregator artifact to deploy as the price feed
    #[arg(long)]
    mock_feed: Option<PathBuf>,

    #[arg(long, default_value_t = MOCK_FEED_DECIMALS)]
    mock_decimals: u8,

    #[arg(long, default_value_t = MOCK_FEED_INITIAL_ANSWER)]
    mock_answer: i64,

    /// Where to write the deployment file
    #[arg(long, default_value = DEFAULT_FUNDME_ARTIFACT)]
    output: PathBuf,

    #[arg(long, default_value = "info")]
    log_level: tracing::Level,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    let args = Args::parse();
    tracing_subscriber::fmt().with_max_level(args.log_level).init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Error during deployment: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    let private_key = config
        .private_key
        .as_deref()
        .ok_or_else(|| ContractError::Connection("PRIVATE_KEY environment variable not set".to_string()))?;
    let session = WalletSession::connect(config.chain.clone(), Some(private_key)).await?;

    let fundme = CompiledArtifact::load(&args.artifact)?;
    let price_feed = match (args.price_feed, args.mock_feed) {
        (Some(address), _) => Some(PriceFeed::Existing(parse_address(&address)?)),
        (None, Some(path)) => Some(PriceFeed::Mock {
            artifact: CompiledArtifact::load(&path)?,
            decimals: args.mock_decimals,
            initial_answer: I256::from(args.mock_answer),
        }),
        (None, None) => None,
    };

    let deployment = deploy_fundme(&session, &fundme, price_feed, &args.output).await?;
    info!("FundMe contract deployed to: {:?}", deployment.fundme_address);
    if let Some(feed) = deployment.price_feed_address {
        info!("Price feed: {:?}", feed);
    }
    println!("FundMe contract deployed to: {:?}", deployment.fundme_address);
    Ok(())
}
