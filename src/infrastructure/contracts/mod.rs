// Contract integration module
// Election and FundMe clients plus the plumbing they share

pub mod abis;
pub mod artifacts;
pub mod config;
pub mod deployer;
pub mod election_client;
pub mod event_utils;
pub mod fundme_client;
pub mod session;
pub mod transactions;
pub mod types;
pub mod utils;

pub use election_client::ElectionClient;
pub use fundme_client::FundMeClient;
pub use session::WalletSession;
pub use types::*;
