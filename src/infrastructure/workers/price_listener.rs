use std::sync::Arc;

use async_trait::async_trait;
use ethers::{
    providers::{Http, Middleware, Provider},
    types::{Address, Filter, Log, ValueOrArray},
};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::services::{ContractError, PriceCallback};
use crate::infrastructure::contracts::event_utils::{decode_price_event, event_signatures, EventMatcher};

/// Source of contract logs polled by the listener
#[async_trait]
pub trait LogSource: Send + Sync {
    async fn latest_block(&self) -> Result<u64, ContractError>;

    /// Price event logs in the inclusive block range
    async fn fetch_logs(&self, from_block: u64, to_block: u64) -> Result<Vec<Log>, ContractError>;
}

/// Logs of a FundMe contract, read over JSON-RPC
pub struct ContractLogSource {
    provider: Arc<Provider<Http>>,
    address: Address,
}

impl ContractLogSource {
    pub fn new(provider: Arc<Provider<Http>>, address: Address) -> Self {
        Self { provider, address }
    }
}

#[async_trait]
impl LogSource for ContractLogSource {
    async fn latest_block(&self) -> Result<u64, ContractError> {
        let block = self
            .provider
            .get_block_number()
            .await
            .map_err(|e| ContractError::fetch("Failed to fetch block number", e.to_string()))?;
        Ok(block.as_u64())
    }

    async fn fetch_logs(&self, from_block: u64, to_block: u64) -> Result<Vec<Log>, ContractError> {
        let topics = vec![
            Some(event_signatures::price_updated()),
            Some(event_signatures::price_update_failed()),
        ];
        let filter = Filter::new()
            .address(self.address)
            .topic0(ValueOrArray::Array(topics))
            .from_block(from_block)
            .to_block(to_block);

        self.provider
            .get_logs(&filter)
            .await
            .map_err(|e| ContractError::fetch("Failed to fetch price events", e.to_string()))
    }
}

/// Polls a [`LogSource`] for price events and hands each one to a callback.
pub struct PriceListener {
    source: Arc<dyn LogSource>,
    poll_interval: Duration,
}

impl PriceListener {
    pub fn new(source: Arc<dyn LogSource>, poll_interval: Duration) -> Self {
        Self { source, poll_interval }
    }

    /// Subscribe to events emitted after the current block.
    pub async fn subscribe(&self, callback: PriceCallback) -> Result<PriceSubscription, ContractError> {
        let start_block = self.source.latest_block().await?;
        Ok(self.subscribe_from(start_block, callback))
    }

    /// Subscribe to events in blocks after `last_processed_block`.
    pub fn subscribe_from(&self, last_processed_block: u64, callback: PriceCallback) -> PriceSubscription {
        let id = Uuid::new_v4();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let source = self.source.clone();
        let poll_interval = self.poll_interval;

        info!("Price subscription {} listening from block {}", id, last_processed_block + 1);
        let handle = tokio::spawn(async move {
            run(id, source, poll_interval, last_processed_block, callback, shutdown_rx).await;
        });

        PriceSubscription {
            id,
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        }
    }
}

async fn run(
    id: Uuid,
    source: Arc<dyn LogSource>,
    poll_interval: Duration,
    mut last_processed_block: u64,
    callback: PriceCallback,
    mut shutdown: oneshot::Receiver<()>,
) {
    let matcher = EventMatcher::new();
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                match process_new_blocks(source.as_ref(), &matcher, last_processed_block, &callback).await {
                    Ok(processed) => last_processed_block = processed,
                    Err(e) => error!("Price subscription {}: {}", id, e),
                }
            }
        }
    }

    debug!("Price subscription {} stopped", id);
}

/// Deliver events from blocks after `last_processed_block`, returning the
/// new high-water mark. On error nothing is delivered and the mark stays.
async fn process_new_blocks(
    source: &dyn LogSource,
    matcher: &EventMatcher,
    last_processed_block: u64,
    callback: &PriceCallback,
) -> Result<u64, ContractError> {
    let current_block = source.latest_block().await?;
    if current_block <= last_processed_block {
        return Ok(last_processed_block);
    }

    let logs = source.fetch_logs(last_processed_block + 1, current_block).await?;
    for log in &logs {
        match matcher.match_log(log) {
            Some(event_signatures::PRICE_UPDATED) | Some(event_signatures::PRICE_UPDATE_FAILED) => {}
            Some(other) => {
                debug!("Skipping {} log in block {:?}", other, log.block_number);
                continue;
            }
            None => {
                debug!("Skipping unknown log in block {:?}", log.block_number);
                continue;
            }
        }

        match decode_price_event(log) {
            Ok(Some(event)) => callback(event),
            Ok(None) => {}
            Err(e) => warn!("Undecodable price event in block {:?}: {}", log.block_number, e),
        }
    }

    Ok(current_block)
}

/// Live price subscription. Polling stops when the handle is released,
/// either explicitly through [`PriceSubscription::unsubscribe`] or on drop.
#[derive(Debug)]
pub struct PriceSubscription {
    id: Uuid,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl PriceSubscription {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.handle.as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }

    /// Stop polling and wait for the worker to exit
    pub async fn unsubscribe(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        info!("Price subscription {} released", self.id);
    }

    /// Subscription with no worker behind it
    #[cfg(test)]
    pub(crate) fn detached() -> Self {
        Self { id: Uuid::new_v4(), shutdown: None, handle: None }
    }
}

impl Drop for PriceSubscription {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("Price subscription {} dropped", self.id);
        }
    }
}
