use std::sync::Arc;

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tracing::info;

use pollingapp::application::panels::{
    AdminPanel, ConsoleNotifier, FundingPanel, LifecycleAction, Notifier, VotingPanel,
};
use pollingapp::application::AppContext;
use pollingapp::config::AppConfig;

/// Election administration, voting view and candidate funding
#[derive(Parser, Debug)]
#[command(name = "pollingapp", version)]
struct Cli {
    #[arg(long, global = true, default_value = "info")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Admin panel
    Admin {
        #[command(subcommand)]
        action: Option<AdminAction>,
    },
    /// Voting panel
    Voting,
    /// Candidate funding panel
    Fund {
        #[command(subcommand)]
        action: Option<FundAction>,
    },
}

#[derive(Subcommand, Debug)]
enum AdminAction {
    CreateElection {
        #[arg(long)]
        name: String,
        /// Unix seconds, RFC 3339 or YYYY-MM-DDTHH:MM (UTC)
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
    },
    AddCandidate {
        #[arg(long)]
        address: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        party: String,
    },
    AddVoter {
        #[arg(long)]
        address: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        age: u64,
    },
    Start,
    End,
}

#[derive(Subcommand, Debug)]
enum FundAction {
    /// Fund a candidate from the election's candidate list
    Candidate {
        #[arg(long)]
        candidate: Option<String>,
        #[arg(long, default_value = "")]
        amount: String,
    },
    UpdatePrice,
    /// Print price updates until interrupted
    Watch,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt().with_max_level(cli.log_level).init();

    let config = AppConfig::from_env()?;
    let chain = &config.chain;
    info!("Using {} ({}) at {}", chain.name, chain.native_currency.symbol, chain.rpc_url);
    if let Some(explorer) = &chain.explorer_url {
        info!("Block explorer: {}", explorer);
    }
    let context = AppContext::from_config(&config).await?;
    let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier);

    match cli.command {
        Command::Admin { action } => run_admin(&context, notifier, action).await?,
        Command::Voting => {
            let mut panel = VotingPanel::new(context.election()?, notifier);
            panel.mount().await;
            let view = panel.view();
            println!("{}", panel.status_line());
            if let Some(winner) = &view.election.winner {
                println!("Winner: {}", winner);
            }
            print_candidates(&view.candidates);
        }
        Command::Fund { action } => run_funding(&context, notifier, action).await?,
    }

    Ok(())
}

async fn run_admin(
    context: &AppContext,
    notifier: Arc<dyn Notifier>,
    action: Option<AdminAction>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut panel = AdminPanel::new(context.election()?, notifier);
    panel.mount().await;

    match action {
        None => {}
        Some(AdminAction::CreateElection { name, start, end }) => panel.create_election(&name, &start, &end).await,
        Some(AdminAction::AddCandidate { address, name, party }) => panel.add_candidate(&address, &name, &party).await,
        Some(AdminAction::AddVoter { address, name, age }) => panel.add_voter(&address, &name, age).await,
        Some(AdminAction::Start) => panel.start_election().await,
        Some(AdminAction::End) => panel.end_election().await,
    }

    let view = panel.view();
    match &view.election_name {
        Some(name) => println!("Election Name: {}", name),
        None => println!("No election created"),
    }
    if let Some(winner) = &view.winner_name {
        println!("Winner Name: {}", winner);
    }
    print_candidates(&view.candidates);
    println!("Voters:");
    if view.voters.is_empty() {
        println!("  No voters available.");
    }
    for voter in &view.voters {
        println!("  Name: {}, Address: {:?}", voter.name, voter.address);
    }
    match view.lifecycle_action() {
        Some(LifecycleAction::Start) => println!("Next: start the election (admin start)"),
        Some(LifecycleAction::End) => println!("Next: end the election (admin end)"),
        None => {}
    }
    Ok(())
}

async fn run_funding(
    context: &AppContext,
    notifier: Arc<dyn Notifier>,
    action: Option<FundAction>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut panel = FundingPanel::new(context.election()?, context.funding()?, notifier);
    panel.mount().await;

    match action {
        None => {}
        Some(FundAction::Candidate { candidate, amount }) => panel.fund(candidate.as_deref(), &amount).await,
        Some(FundAction::UpdatePrice) => panel.update_price().await,
        Some(FundAction::Watch) => {
            let mut updates = panel.price_updates();
            println!("{}", panel.price_line());
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    changed = updates.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        println!("{}", panel.price_line());
                    }
                }
            }
        }
    }

    println!("Candidates:");
    for candidate in &panel.view().candidates {
        println!("  {} ({:?})", candidate.name, candidate.address);
    }
    println!("ETH to USD Price: {}", panel.price_line());
    println!("Funded Candidates:");
    for line in panel.funded_lines() {
        println!("  {}", line);
    }

    panel.teardown().await;
    Ok(())
}

fn print_candidates(candidates: &[pollingapp::domain::models::Candidate]) {
    println!("Candidates:");
    if candidates.is_empty() {
        println!("  No candidates available.");
    }
    for candidate in candidates {
        println!("  Name: {}, Party: {}, Address: {:?}", candidate.name, candidate.party, candidate.address);
    }
}
