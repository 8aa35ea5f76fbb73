use pollingapp::tests::contract_tests::{
    test_connection, test_end_election_finalizes, test_funding_is_monotonic, test_mock_feed_scenario,
    test_start_before_create_fails,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Polling App Contract Test Runner");
    println!("================================\n");

    tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

    // Get command line arguments
    let args: Vec<String> = std::env::args().collect();
    let test_name = args.get(1).map(|s| s.as_str()).unwrap_or("all");

    match test_name {
        "connection" => {
            println!("Running connection test...");
            test_connection().await?;
        }
        "start_before_create" => {
            println!("Running start before create test...");
            test_start_before_create_fails().await?;
        }
        "end_election" => {
            println!("Running election finalization test...");
            test_end_election_finalizes().await?;
        }
        "funding" => {
            println!("Running funding monotonicity test...");
            test_funding_is_monotonic().await?;
        }
        "mock_feed" => {
            println!("Running mock price feed scenario...");
            test_mock_feed_scenario().await?;
        }
        "all" => {
            println!("Running all tests...\n");

            println!("1. Connection test...");
            test_connection().await?;

            println!("\n2. Start before create test...");
            test_start_before_create_fails().await?;

            println!("\n3. Funding monotonicity test...");
            test_funding_is_monotonic().await?;

            println!("\n4. Election finalization test...");
            test_end_election_finalizes().await?;

            println!("\n All tests completed successfully!");
        }
        _ => {
            println!("Unknown test: {}", test_name);
            println!("Available tests:");
            println!("  connection - Test wallet and network connection");
            println!("  start_before_create - startElection must revert without an election");
            println!("  end_election - endElection finalizes and cannot run twice");
            println!("  funding - Funding a candidate only ever increases its total");
            println!("  mock_feed - Deploy FundMe with a mock feed and check price and funding");
            println!("  all - Run every test against the configured contracts (mock_feed excluded)");
        }
    }

    Ok(())
}
