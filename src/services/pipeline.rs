//! End-to-end transaction flow: build, sign, submit, confirm.

use std::sync::Arc;

use alloy::primitives::{Address, Bytes, B256, U256};
use tracing::{info, warn};

use crate::{
    config::TxSettings,
    error::{AppError, Result},
    ethereum::{ChainClient, TransactionSigner},
    services::{
        builder::TransactionBuilder,
        nonce::NonceManager,
        submitter::{Submitter, SubmitterConfig},
    },
    types::{SignedTransaction, TxLifecycle, TxReceipt, TxState, UnsignedTransaction},
};

/// A submitted transaction awaiting confirmation.
#[derive(Debug, Clone)]
pub struct PendingTransaction {
    signed: SignedTransaction,
    lifecycle: TxLifecycle,
}

impl PendingTransaction {
    /// Transaction hash.
    pub fn hash(&self) -> B256 {
        self.signed.hash()
    }

    /// The signed transaction as broadcast.
    pub fn signed(&self) -> &SignedTransaction {
        &self.signed
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TxState {
        self.lifecycle.state()
    }
}

/// Final result of a confirmed transaction.
#[derive(Debug, Clone)]
pub struct TransactionOutcome {
    /// The signed transaction as broadcast.
    pub transaction: SignedTransaction,
    /// Receipt observed on chain. `success` is false for reverts.
    pub receipt: TxReceipt,
    /// Final lifecycle state.
    pub state: TxState,
}

enum Intent {
    Transfer { to: Address, value: U256 },
    Call { contract: Address, data: Bytes, value: U256 },
    Deploy { init_code: Bytes, value: U256 },
}

/// Sends transactions for a single signer.
#[derive(Clone)]
pub struct TransactionPipeline {
    client: Arc<dyn ChainClient>,
    signer: Arc<dyn TransactionSigner>,
    nonces: Arc<NonceManager>,
    builder: TransactionBuilder,
    submitter: Submitter,
}

impl TransactionPipeline {
    /// Create a pipeline with default settings and its own nonce manager.
    pub fn new(client: Arc<dyn ChainClient>, signer: Arc<dyn TransactionSigner>) -> Self {
        Self {
            builder: TransactionBuilder::new(client.clone()),
            submitter: Submitter::new(client.clone(), SubmitterConfig::default()),
            nonces: Arc::new(NonceManager::new()),
            client,
            signer,
        }
    }

    /// Share a nonce manager with other pipelines.
    pub fn with_nonce_manager(mut self, nonces: Arc<NonceManager>) -> Self {
        self.nonces = nonces;
        self
    }

    /// Apply submission and gas settings.
    pub fn with_settings(mut self, settings: &TxSettings) -> Self {
        self.builder = TransactionBuilder::new(self.client.clone())
            .with_gas_margin(settings.gas_limit_margin_percent);
        self.submitter = Submitter::new(self.client.clone(), settings.submitter_config());
        self
    }

    /// Address that signs and pays.
    pub fn sender(&self) -> Address {
        self.signer.address()
    }

    /// Underlying chain client.
    pub fn client(&self) -> &Arc<dyn ChainClient> {
        &self.client
    }

    /// Submitter used for broadcasting and confirmation.
    pub fn submitter(&self) -> &Submitter {
        &self.submitter
    }

    /// Submit a value transfer without waiting for it to be mined.
    pub async fn submit_transfer(&self, to: Address, value: U256) -> Result<PendingTransaction> {
        self.dispatch(Intent::Transfer { to, value }).await
    }

    /// Submit a contract call without waiting for it to be mined.
    pub async fn submit_call(
        &self,
        contract: Address,
        data: Bytes,
        value: U256,
    ) -> Result<PendingTransaction> {
        self.dispatch(Intent::Call { contract, data, value }).await
    }

    /// Submit a contract creation without waiting for it to be mined.
    pub async fn submit_deployment(
        &self,
        init_code: Bytes,
        value: U256,
    ) -> Result<PendingTransaction> {
        self.dispatch(Intent::Deploy { init_code, value }).await
    }

    /// Transfer `value` to `to` and wait for the receipt.
    pub async fn send_transfer(&self, to: Address, value: U256) -> Result<TransactionOutcome> {
        let mut pending = self.submit_transfer(to, value).await?;
        self.confirm(&mut pending).await
    }

    /// Call `contract` with `data` and wait for the receipt.
    pub async fn send_call(
        &self,
        contract: Address,
        data: Bytes,
        value: U256,
    ) -> Result<TransactionOutcome> {
        let mut pending = self.submit_call(contract, data, value).await?;
        self.confirm(&mut pending).await
    }

    /// Deploy `init_code` and wait for the receipt.
    pub async fn send_deployment(
        &self,
        init_code: Bytes,
        value: U256,
    ) -> Result<TransactionOutcome> {
        let mut pending = self.submit_deployment(init_code, value).await?;
        self.confirm(&mut pending).await
    }

    /// Wait for `pending` to be mined, using the configured timeout.
    ///
    /// A timeout moves the transaction to [`TxState::TimedOut`] and returns
    /// [`AppError::ConfirmationTimeout`]; it may still be mined later.
    pub async fn confirm(&self, pending: &mut PendingTransaction) -> Result<TransactionOutcome> {
        if pending.state().is_terminal() {
            return Err(AppError::InvalidStateTransition {
                from: pending.state(),
                to: TxState::Confirmed,
            });
        }

        match self.submitter.confirm(pending.hash()).await {
            Ok(receipt) => {
                pending.lifecycle.advance(TxState::Confirmed)?;
                Ok(TransactionOutcome {
                    transaction: pending.signed.clone(),
                    receipt,
                    state: pending.state(),
                })
            }
            Err(err @ AppError::ConfirmationTimeout { .. }) => {
                pending.lifecycle.advance(TxState::TimedOut)?;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    async fn dispatch(&self, intent: Intent) -> Result<PendingTransaction> {
        let chain_id = self.client.chain_id().await?;
        let sender = self.signer.address();

        // Held until the node has answered the submission.
        let mut guard = self.nonces.acquire(sender).await;

        let unsigned: UnsignedTransaction = match intent {
            Intent::Transfer { to, value } => {
                self.builder.build_transfer(&mut guard, to, value).await?
            }
            Intent::Call { contract, data, value } => {
                self.builder.build_contract_call(&mut guard, contract, data, value).await?
            }
            Intent::Deploy { init_code, value } => {
                self.builder.build_deployment(&mut guard, init_code, value).await?
            }
        };
        let mut lifecycle = TxLifecycle::new();

        let signed = match self.signer.sign(&unsigned, chain_id).await {
            Ok(signed) => signed,
            Err(err) => {
                guard.release(unsigned.nonce);
                return Err(err);
            }
        };
        lifecycle.advance(TxState::Signed)?;

        match self.submitter.submit(&signed).await {
            Ok(_) => {}
            Err(err @ AppError::Rpc(_)) => {
                warn!(
                    from = %sender,
                    nonce = signed.nonce(),
                    error = %err,
                    "Node rejected transaction"
                );
                guard.release(signed.nonce());
                return Err(err);
            }
            Err(err) => {
                warn!(
                    from = %sender,
                    nonce = signed.nonce(),
                    hash = %signed.hash(),
                    error = %err,
                    "Submission outcome unknown, resyncing nonce"
                );
                guard.resync();
                return Err(err);
            }
        }
        lifecycle.advance(TxState::Submitted)?;
        drop(guard);

        info!(
            chain_id,
            from = %sender,
            nonce = signed.nonce(),
            hash = %signed.hash(),
            "Transaction pending"
        );
        Ok(PendingTransaction { signed, lifecycle })
    }
}
