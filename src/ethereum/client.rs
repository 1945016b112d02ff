//! Ethereum RPC client.

use std::sync::Arc;
use std::time::Duration;

use alloy::{
    consensus::Transaction as ConsensusTransaction,
    eips::BlockNumberOrTag,
    network::{Ethereum, ReceiptResponse, TransactionBuilder, TransactionResponse},
    primitives::{Address, Bytes, B256, U256},
    providers::{Provider, ProviderBuilder, RootProvider},
    rpc::types::{Block, TransactionReceipt, TransactionRequest},
};
use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::{
    error::{AppError, Result},
    ethereum::retry::RetryPolicy,
    types::{BlockSelector, BlockSummary, CallRequest, SignedTransaction, TxReceipt, TxSummary},
};

/// Type alias for the HTTP provider.
pub type HttpProvider = RootProvider<Ethereum>;

/// Read and submit operations against an Ethereum-compatible node.
///
/// Reads carry no shared mutable state and may run concurrently.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Network ID used for EIP-155 replay protection.
    async fn chain_id(&self) -> Result<u64>;

    /// Height of the latest block.
    async fn block_number(&self) -> Result<u64>;

    /// Transaction count of `address`, including pending transactions when `pending`.
    async fn nonce(&self, address: Address, pending: bool) -> Result<u64>;

    /// Suggested legacy gas price in wei.
    async fn gas_price(&self) -> Result<u128>;

    /// Native balance in wei.
    async fn balance(&self, address: Address) -> Result<U256>;

    /// Block header summary. Fails with `NotFound` for unknown heights.
    async fn block(&self, selector: BlockSelector) -> Result<BlockSummary>;

    /// Gas estimate for `request`. Fails with `Estimation` when the node cannot estimate.
    async fn estimate_gas(&self, request: &CallRequest) -> Result<u64>;

    /// Read-only `eth_call`.
    async fn call(&self, request: &CallRequest) -> Result<Bytes>;

    /// Broadcast a signed transaction and return its hash.
    async fn submit(&self, tx: &SignedTransaction) -> Result<B256>;

    /// Receipt of `hash`, or None while pending.
    async fn receipt(&self, hash: B256) -> Result<Option<TxReceipt>>;

    /// Poll [`ChainClient::receipt`] every `poll_interval` until it appears.
    ///
    /// Fails with `ConfirmationTimeout` after `timeout`. Transient transport errors
    /// while polling are logged and polling continues. Dropping the future stops
    /// polling without touching the submitted transaction.
    async fn wait_for_receipt(
        &self,
        hash: B256,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<TxReceipt> {
        let poll = async {
            loop {
                match self.receipt(hash).await {
                    Ok(Some(receipt)) => return Ok(receipt),
                    Ok(None) => debug!(hash = %hash, "Receipt not available yet"),
                    Err(err) if err.is_retryable() => {
                        warn!(hash = %hash, error = %err, "Receipt lookup failed, polling again")
                    }
                    Err(err) => return Err(err),
                }
                tokio::time::sleep(poll_interval).await;
            }
        };

        tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| AppError::ConfirmationTimeout { hash, waited: timeout })?
    }
}

/// Ethereum RPC client wrapper with lazy initialization.
#[derive(Clone)]
pub struct EthereumClient {
    /// The underlying provider.
    provider: Arc<HttpProvider>,
    /// RPC URL for logging.
    rpc_url: String,
    /// Lazily initialized chain ID.
    chain_id: Arc<OnceCell<u64>>,
    /// Retry policy for reads.
    retry: RetryPolicy,
}

impl EthereumClient {
    /// Create a new Ethereum client.
    ///
    /// Note: This does NOT make any network calls. The connection is
    /// established lazily when the first operation is performed.
    pub fn new(rpc_url: &str) -> Result<Self> {
        Self::with_retry(rpc_url, RetryPolicy::default())
    }

    /// Create a client with a custom retry policy for reads.
    pub fn with_retry(rpc_url: &str, retry: RetryPolicy) -> Result<Self> {
        let url = rpc_url
            .parse()
            .map_err(|_| AppError::Config(format!("Invalid RPC URL: {}", rpc_url)))?;

        let provider = ProviderBuilder::new().connect_http(url).root().clone();

        info!(rpc_url = %rpc_url, "Ethereum client created (lazy initialization)");

        Ok(Self {
            provider: Arc::new(provider),
            rpc_url: rpc_url.to_string(),
            chain_id: Arc::new(OnceCell::new()),
            retry,
        })
    }

    /// Get the underlying provider.
    pub fn provider(&self) -> &HttpProvider {
        &self.provider
    }
}

fn to_request(request: &CallRequest) -> TransactionRequest {
    let mut tx =
        TransactionRequest::default().value(request.value).input(request.data.clone().into());
    if let Some(from) = request.from {
        tx = tx.from(from);
    }
    match request.to {
        Some(to) => tx.to(to),
        None => tx.into_create(),
    }
}

fn to_receipt(receipt: &TransactionReceipt) -> Result<TxReceipt> {
    let block_number = receipt.block_number().ok_or_else(|| {
        AppError::Rpc(format!("Receipt for {} has no block number", receipt.transaction_hash()))
    })?;

    Ok(TxReceipt {
        transaction_hash: receipt.transaction_hash(),
        block_number,
        success: receipt.status(),
        gas_used: receipt.gas_used(),
        effective_gas_price: receipt.effective_gas_price(),
        contract_address: receipt.contract_address(),
    })
}

fn to_summary(block: &Block) -> BlockSummary {
    let first_transaction = block.transactions.txns().next().map(|tx| TxSummary {
        hash: TransactionResponse::tx_hash(tx),
        gas_price: ConsensusTransaction::gas_price(tx)
            .unwrap_or_else(|| ConsensusTransaction::max_fee_per_gas(tx)),
        gas_limit: ConsensusTransaction::gas_limit(tx),
        value: ConsensusTransaction::value(tx),
    });

    BlockSummary {
        number: block.header.number,
        hash: block.header.hash,
        parent_hash: block.header.parent_hash,
        timestamp: block.header.timestamp,
        transaction_count: block.transactions.len(),
        gas_used: block.header.gas_used,
        gas_limit: block.header.gas_limit,
        miner: block.header.beneficiary,
        first_transaction,
    }
}

#[async_trait]
impl ChainClient for EthereumClient {
    /// Get the chain ID (fetches from network on first call).
    async fn chain_id(&self) -> Result<u64> {
        self.chain_id
            .get_or_try_init(|| async {
                let chain_id = self
                    .retry
                    .run("eth_chainId", || async { Ok(self.provider.get_chain_id().await?) })
                    .await?;
                info!(chain_id = chain_id, rpc_url = %self.rpc_url, "Connected to Ethereum node");
                Ok(chain_id)
            })
            .await
            .copied()
    }

    async fn block_number(&self) -> Result<u64> {
        self.retry
            .run("eth_blockNumber", || async { Ok(self.provider.get_block_number().await?) })
            .await
    }

    async fn nonce(&self, address: Address, pending: bool) -> Result<u64> {
        self.retry
            .run("eth_getTransactionCount", || async {
                let count = self.provider.get_transaction_count(address);
                let nonce = if pending { count.pending().await? } else { count.latest().await? };
                Ok(nonce)
            })
            .await
    }

    async fn gas_price(&self) -> Result<u128> {
        self.retry.run("eth_gasPrice", || async { Ok(self.provider.get_gas_price().await?) }).await
    }

    async fn balance(&self, address: Address) -> Result<U256> {
        self.retry
            .run("eth_getBalance", || async { Ok(self.provider.get_balance(address).await?) })
            .await
    }

    async fn block(&self, selector: BlockSelector) -> Result<BlockSummary> {
        let tag = BlockNumberOrTag::from(selector);
        let block = self
            .retry
            .run("eth_getBlockByNumber", || async {
                Ok(self.provider.get_block_by_number(tag).full().await?)
            })
            .await?
            .ok_or_else(|| AppError::NotFound(format!("block {selector}")))?;

        Ok(to_summary(&block))
    }

    async fn estimate_gas(&self, request: &CallRequest) -> Result<u64> {
        let tx = to_request(request);
        self.retry
            .run("eth_estimateGas", || async { Ok(self.provider.estimate_gas(tx.clone()).await?) })
            .await
            .map_err(|err| match err {
                AppError::Rpc(msg) => AppError::Estimation(msg),
                other => other,
            })
    }

    async fn call(&self, request: &CallRequest) -> Result<Bytes> {
        let tx = to_request(request);
        self.retry.run("eth_call", || async { Ok(self.provider.call(tx.clone()).await?) }).await
    }

    async fn submit(&self, tx: &SignedTransaction) -> Result<B256> {
        let pending = self.provider.send_raw_transaction(tx.raw()).await?;
        let hash = *pending.tx_hash();
        debug!(hash = %hash, nonce = tx.nonce(), "Raw transaction accepted by node");
        Ok(hash)
    }

    async fn receipt(&self, hash: B256) -> Result<Option<TxReceipt>> {
        let receipt = self
            .retry
            .run("eth_getTransactionReceipt", || async {
                Ok(self.provider.get_transaction_receipt(hash).await?)
            })
            .await?;

        receipt.as_ref().map(to_receipt).transpose()
    }
}
