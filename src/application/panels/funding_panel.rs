use std::sync::Arc;

use ethers::types::Address;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::application::panels::notifier::{Notification, Notifier};
use crate::domain::models::{Candidate, FundCandidateRequest, FundedCandidate, PriceEvent};
use crate::domain::services::{ContractError, ElectionApi, FundingApi, PriceCallback};
use crate::infrastructure::contracts::types::TransactionStatus;
use crate::infrastructure::workers::price_listener::PriceSubscription;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FundingView {
    /// Dropdown entries, read from the election contract
    pub candidates: Vec<Candidate>,
    pub funded: Vec<FundedCandidate>,
    pub status: TransactionStatus,
}

/// Candidate funding view.
///
/// The latest ETH/USD quote is written by the price subscription's task and
/// read by the panel through a watch channel.
pub struct FundingPanel {
    election: Arc<dyn ElectionApi>,
    funding: Arc<dyn FundingApi>,
    notifier: Arc<dyn Notifier>,
    view: FundingView,
    price: Arc<watch::Sender<Option<String>>>,
    subscription: Option<PriceSubscription>,
}

impl FundingPanel {
    pub fn new(election: Arc<dyn ElectionApi>, funding: Arc<dyn FundingApi>, notifier: Arc<dyn Notifier>) -> Self {
        let (price, _) = watch::channel(None);
        Self {
            election,
            funding,
            notifier,
            view: FundingView::default(),
            price: Arc::new(price),
            subscription: None,
        }
    }

    pub fn view(&self) -> &FundingView {
        &self.view
    }

    /// Receiver that observes every quote the panel receives
    pub fn price_updates(&self) -> watch::Receiver<Option<String>> {
        self.price.subscribe()
    }

    pub fn has_subscription(&self) -> bool {
        self.subscription.is_some()
    }

    /// Load the dropdown and funded list and start listening for prices
    pub async fn mount(&mut self) {
        let callback = self.price_callback();
        let (candidates, funded, subscription) = tokio::join!(
            self.election.get_candidates(),
            self.funding.get_funded_candidates(),
            self.funding.listen_to_price_updates(callback),
        );

        match candidates {
            Ok(candidates) => self.view.candidates = candidates,
            Err(e) => {
                error!("Error fetching candidates: {}", e);
                self.notifier.notify(Notification::error("Error fetching candidates."));
            }
        }
        match funded {
            Ok(funded) => self.view.funded = funded,
            Err(e) => self.funded_fetch_failed(e),
        }
        match subscription {
            Ok(subscription) => self.replace_subscription(subscription).await,
            Err(e @ ContractError::Unsupported { .. }) => {
                warn!("Price updates unavailable: {}", e);
                self.notifier.notify(Notification::info(format!("{}. Live prices are disabled.", e)));
            }
            Err(e) => {
                error!("Error listening to price updates: {}", e);
                self.notifier.notify(Notification::error("Error listening to price updates."));
            }
        }
    }

    fn funded_fetch_failed(&self, e: ContractError) {
        error!("Error fetching funded candidates: {}", e);
        self.notifier.notify(Notification::error("Error fetching funded candidates."));
    }

    fn price_callback(&self) -> PriceCallback {
        let price = self.price.clone();
        Arc::new(move |event| match event {
            PriceEvent::Updated(quote) => {
                info!("ETH/USD price updated: {}", quote.eth_usd);
                price.send_replace(Some(quote.eth_usd));
            }
            PriceEvent::UpdateFailed { reason, .. } => warn!("Price update failed: {}", reason),
        })
    }

    async fn replace_subscription(&mut self, subscription: PriceSubscription) {
        if let Some(previous) = self.subscription.replace(subscription) {
            previous.unsubscribe().await;
        }
    }

    // ============ ACTIONS ============

    /// Fund the selected candidate. The name sent to the contract is the
    /// one shown in the dropdown.
    pub async fn fund(&mut self, selected: Option<&str>, eth_amount: &str) {
        let selected = selected.map(str::trim).filter(|s| !s.is_empty());
        let (Some(selected), false) = (selected, eth_amount.trim().is_empty()) else {
            self.notifier
                .notify(Notification::error("Please select a candidate and enter an ETH amount."));
            return;
        };

        let Some(name) = self.candidate_name(selected) else {
            self.notifier
                .notify(Notification::error(format!("Candidate {} is not in the candidate list.", selected)));
            return;
        };

        self.view.status = TransactionStatus::Idle;
        let request = FundCandidateRequest {
            candidate_address: selected.to_string(),
            name,
            eth_amount: eth_amount.trim().to_string(),
        };
        match self.funding.fund_candidate(request).await {
            Ok(response) => {
                self.view.status = response.transaction.status;
                self.notifier.notify(Notification::info(format!(
                    "Successfully funded {} ETH to the candidate.",
                    eth_amount.trim()
                )));
                match self.funding.get_funded_candidates().await {
                    Ok(funded) => self.view.funded = funded,
                    Err(e) => self.funded_fetch_failed(e),
                }
            }
            Err(e) => {
                error!("Error funding candidate: {}", e);
                self.view.status = TransactionStatus::Idle.failed(e.to_string());
                self.notifier
                    .notify(Notification::error("Error while funding the candidate. Please try again."));
            }
        }
    }

    pub async fn update_price(&mut self) {
        match self.funding.update_price().await {
            Ok(_) => self
                .notifier
                .notify(Notification::info("Price update initiated. Please wait for confirmation.")),
            Err(e) => {
                error!("Error updating price: {}", e);
                let message = match e {
                    ContractError::Unsupported { .. } => e.to_string(),
                    _ => "Failed to update the price. Please try again.".to_string(),
                };
                self.notifier.notify(Notification::error(message));
            }
        }
    }

    /// Release the price subscription
    pub async fn teardown(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe().await;
        }
    }

    // ============ RENDERING ============

    pub fn price_line(&self) -> String {
        match self.price.borrow().as_deref() {
            Some(price) if !price.is_empty() => format!("$1 ETH = {} USD", price),
            _ => "Price not available".to_string(),
        }
    }

    pub fn funded_lines(&self) -> Vec<String> {
        self.view
            .funded
            .iter()
            .map(|c| match &c.dollar_amount {
                Some(dollars) => format!("{}: {} ETH ( ${})", c.name, c.funding_eth, dollars),
                None => format!("{}: {} ETH", c.name, c.funding_eth),
            })
            .collect()
    }

    fn candidate_name(&self, selected: &str) -> Option<String> {
        let address = selected.parse::<Address>().ok()?;
        self.view
            .candidates
            .iter()
            .find(|c| c.address == address)
            .map(|c| c.name.clone())
    }
}
