//! Submission with bounded retry and receipt confirmation.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::B256;
use tracing::{info, warn};

use crate::{
    error::{AppError, Result},
    ethereum::{
        constants::{
            DEFAULT_CONFIRMATION_TIMEOUT, DEFAULT_RECEIPT_POLL_INTERVAL,
            DEFAULT_SUBMIT_MAX_ATTEMPTS,
        },
        ChainClient, RetryPolicy,
    },
    types::{SignedTransaction, TxReceipt},
};

/// Node messages meaning the exact transaction is already in the pool.
const ALREADY_KNOWN_MARKERS: [&str; 3] = ["already known", "known transaction", "alreadyknown"];

fn is_already_known(message: &str) -> bool {
    let message = message.to_lowercase();
    ALREADY_KNOWN_MARKERS.iter().any(|marker| message.contains(marker))
}

/// Submission and confirmation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitterConfig {
    /// Delay between receipt lookups.
    pub poll_interval: Duration,
    /// Default time to wait for a receipt.
    pub confirmation_timeout: Duration,
    /// Retry policy for broadcasting the same signed bytes.
    pub retry: RetryPolicy,
}

impl Default for SubmitterConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_RECEIPT_POLL_INTERVAL,
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
            retry: RetryPolicy::with_attempts(DEFAULT_SUBMIT_MAX_ATTEMPTS),
        }
    }
}

/// Broadcasts signed transactions and waits for receipts.
#[derive(Clone)]
pub struct Submitter {
    client: Arc<dyn ChainClient>,
    config: SubmitterConfig,
}

impl Submitter {
    /// Create a new submitter.
    pub fn new(client: Arc<dyn ChainClient>, config: SubmitterConfig) -> Self {
        Self { client, config }
    }

    /// Current settings.
    pub fn config(&self) -> &SubmitterConfig {
        &self.config
    }

    /// Broadcast `tx`.
    ///
    /// Transient transport failures resend the identical signed bytes, so a
    /// retry can never consume a different nonce. A node reporting the
    /// transaction as already known counts as success.
    pub async fn submit(&self, tx: &SignedTransaction) -> Result<B256> {
        let hash = self
            .config
            .retry
            .run("eth_sendRawTransaction", || async {
                match self.client.submit(tx).await {
                    Err(AppError::Rpc(msg)) if is_already_known(&msg) => {
                        info!(hash = %tx.hash(), "Node already knows transaction");
                        Ok(tx.hash())
                    }
                    other => other,
                }
            })
            .await?;

        if hash != tx.hash() {
            warn!(expected = %tx.hash(), reported = %hash, "Node reported a different hash");
        }

        info!(hash = %tx.hash(), from = %tx.from(), nonce = tx.nonce(), "Transaction submitted");
        Ok(tx.hash())
    }

    /// Wait for the receipt of `hash` using the configured timeout.
    pub async fn confirm(&self, hash: B256) -> Result<TxReceipt> {
        self.confirm_within(hash, self.config.confirmation_timeout).await
    }

    /// Wait for the receipt of `hash` for at most `timeout`.
    ///
    /// A reverted transaction is returned as a receipt with `success == false`.
    pub async fn confirm_within(&self, hash: B256, timeout: Duration) -> Result<TxReceipt> {
        let receipt =
            self.client.wait_for_receipt(hash, self.config.poll_interval, timeout).await?;

        if receipt.success {
            info!(
                hash = %hash,
                block = receipt.block_number,
                gas_used = receipt.gas_used,
                "Transaction confirmed"
            );
        } else {
            warn!(hash = %hash, block = receipt.block_number, "Transaction mined but reverted");
        }
        Ok(receipt)
    }

    /// Submit once (with transport retries) and wait up to `timeout` for the receipt.
    pub async fn submit_and_confirm(
        &self,
        tx: &SignedTransaction,
        timeout: Duration,
    ) -> Result<TxReceipt> {
        let hash = self.submit(tx).await?;
        self.confirm_within(hash, timeout).await
    }
}
