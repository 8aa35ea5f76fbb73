use ethers::{
    abi::Detokenize,
    contract::ContractCall,
    providers::Middleware,
    types::TransactionReceipt,
};
use tracing::{debug, error, info};

use crate::domain::models::TransactionSummary;
use crate::domain::services::ContractError;
use crate::infrastructure::contracts::session::SignerClient;
use crate::infrastructure::contracts::types::TransactionStatus;

/// Send a prepared call and wait until it is mined.
///
/// Any failure is logged with its underlying cause and returned as an
/// `Operation` error carrying `message` and the decoded revert reason.
pub async fn send_and_confirm<D: Detokenize>(
    call: ContractCall<SignerClient, D>,
    message: &str,
    confirmations: usize,
) -> Result<(TransactionSummary, TransactionReceipt), ContractError> {
    let mut status = TransactionStatus::Idle;

    // Send the transaction
    let pending_tx = match call.send().await {
        Ok(pending_tx) => pending_tx,
        Err(e) => {
            let reason = revert_reason(&e);
            error!("{}: {}", message, e);
            status = status.failed(reason.clone());
            debug!("Transaction {}", status);
            return Err(ContractError::operation(message, reason));
        }
    };
    status = status.submitted(*pending_tx);
    debug!("Transaction {}", status);

    // Wait for the transaction to be mined
    let receipt = pending_tx
        .confirmations(confirmations.max(1))
        .await
        .map_err(|e| {
            error!("{}: {}", message, e);
            ContractError::operation(message, e.to_string())
        })?
        .ok_or_else(|| ContractError::operation(message, "transaction dropped from mempool"))?;

    // Check if transaction was successful
    if receipt.status == Some(0u64.into()) {
        status = status.failed("transaction reverted");
        debug!("Transaction {}", status);
        return Err(ContractError::operation(message, "transaction reverted"));
    }

    let block_number = receipt.block_number.unwrap_or_default().as_u64();
    let status = status.confirmed(block_number);
    info!("Transaction {}", status);

    Ok((
        TransactionSummary {
            transaction_hash: receipt.transaction_hash,
            block_number,
            status,
        },
        receipt,
    ))
}

/// Map a failed read to a `Fetch` error, logging the cause
pub fn fetch_error<M: Middleware>(message: &str, err: ethers::contract::ContractError<M>) -> ContractError {
    error!("{}: {}", message, err);
    ContractError::fetch(message, revert_reason(&err))
}

/// Revert string of an `Error(string)` revert, or the error text otherwise
pub fn revert_reason<M: Middleware>(err: &ethers::contract::ContractError<M>) -> String {
    err.decode_revert::<String>().unwrap_or_else(|| err.to_string())
}
