//! Common utilities for integration tests.

#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};

use alloy::primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use eth_tx_orchestrator::{
    types::{BlockSelector, BlockSummary, CallRequest, SignedTransaction, TxReceipt},
    AppError, ChainClient, KeySigner, Result, RetryPolicy, TxSettings,
};

/// Well-known development key (Hardhat/Anvil account #0).
pub const DEV_PRIVATE_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub const TEST_CHAIN_ID: u64 = 31337;

pub const TWENTY_GWEI: u128 = 20_000_000_000;

pub const ONE_ETHER: u64 = 1_000_000_000_000_000_000;

pub fn dev_signer() -> KeySigner {
    KeySigner::from_private_key(DEV_PRIVATE_KEY).unwrap()
}

/// Settings that keep scenario tests fast.
pub fn fast_settings() -> TxSettings {
    TxSettings {
        poll_interval: Duration::from_millis(5),
        confirmation_timeout: Duration::from_millis(200),
        submit_max_attempts: 3,
        rpc_max_attempts: 1,
        gas_limit_margin_percent: 20,
    }
}

/// Retry policy with millisecond backoff.
pub fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(4),
    }
}

#[derive(Debug)]
struct ChainState {
    latest_block: u64,
    gas_price: u128,
    gas_estimate: u64,
    estimate_error: Option<String>,
    call_result: Bytes,
    nonces: HashMap<Address, u64>,
    balances: HashMap<Address, U256>,
    receipts: HashMap<B256, TxReceipt>,
    submitted: Vec<Bytes>,
    accepted: Vec<u64>,
    submit_failures: VecDeque<AppError>,
    mining: bool,
    revert: bool,
}

/// In-memory chain implementing [`ChainClient`].
///
/// Accepted transactions bump the sender's pending nonce. While mining is
/// enabled they also get a receipt immediately.
#[derive(Debug)]
pub struct FakeChain {
    state: Mutex<ChainState>,
}

impl FakeChain {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ChainState {
                latest_block: 9_735_711,
                gas_price: TWENTY_GWEI,
                gas_estimate: 50_000,
                estimate_error: None,
                call_result: Bytes::new(),
                nonces: HashMap::new(),
                balances: HashMap::new(),
                receipts: HashMap::new(),
                submitted: Vec::new(),
                accepted: Vec::new(),
                submit_failures: VecDeque::new(),
                mining: true,
                revert: false,
            }),
        }
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn fund(&self, address: Address, amount: U256) {
        self.state.lock().unwrap().balances.insert(address, amount);
    }

    pub fn set_nonce(&self, address: Address, nonce: u64) {
        self.state.lock().unwrap().nonces.insert(address, nonce);
    }

    pub fn set_gas_price(&self, gas_price: u128) {
        self.state.lock().unwrap().gas_price = gas_price;
    }

    pub fn set_gas_estimate(&self, gas: u64) {
        self.state.lock().unwrap().gas_estimate = gas;
    }

    pub fn fail_estimates(&self, message: &str) {
        self.state.lock().unwrap().estimate_error = Some(message.to_string());
    }

    pub fn set_call_result(&self, data: impl Into<Bytes>) {
        self.state.lock().unwrap().call_result = data.into();
    }

    /// Queue an error for the next submission attempt.
    pub fn fail_next_submit(&self, err: AppError) {
        self.state.lock().unwrap().submit_failures.push_back(err);
    }

    pub fn set_mining(&self, mining: bool) {
        self.state.lock().unwrap().mining = mining;
    }

    pub fn set_revert(&self, revert: bool) {
        self.state.lock().unwrap().revert = revert;
    }

    /// Raw bytes of every submission attempt, in order.
    pub fn submitted(&self) -> Vec<Bytes> {
        self.state.lock().unwrap().submitted.clone()
    }

    /// Nonces of every accepted transaction, in order.
    pub fn accepted_nonces(&self) -> Vec<u64> {
        self.state.lock().unwrap().accepted.clone()
    }
}

impl Default for FakeChain {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChainClient for FakeChain {
    async fn chain_id(&self) -> Result<u64> {
        Ok(TEST_CHAIN_ID)
    }

    async fn block_number(&self) -> Result<u64> {
        Ok(self.state.lock().unwrap().latest_block)
    }

    async fn nonce(&self, address: Address, _pending: bool) -> Result<u64> {
        Ok(self.state.lock().unwrap().nonces.get(&address).copied().unwrap_or_default())
    }

    async fn gas_price(&self) -> Result<u128> {
        Ok(self.state.lock().unwrap().gas_price)
    }

    async fn balance(&self, address: Address) -> Result<U256> {
        Ok(self.state.lock().unwrap().balances.get(&address).copied().unwrap_or_default())
    }

    async fn block(&self, selector: BlockSelector) -> Result<BlockSummary> {
        let latest = self.state.lock().unwrap().latest_block;
        let number = match selector {
            BlockSelector::Latest => latest,
            BlockSelector::Number(n) if n <= latest => n,
            BlockSelector::Number(n) => return Err(AppError::NotFound(format!("Block {n}"))),
        };
        Ok(BlockSummary {
            number,
            hash: B256::with_last_byte(number as u8),
            parent_hash: B256::with_last_byte(number.wrapping_sub(1) as u8),
            timestamp: 1_700_000_000 + number * 12,
            transaction_count: 0,
            gas_used: 0,
            gas_limit: 30_000_000,
            miner: Address::ZERO,
            first_transaction: None,
        })
    }

    async fn estimate_gas(&self, _request: &CallRequest) -> Result<u64> {
        let state = self.state.lock().unwrap();
        match &state.estimate_error {
            Some(message) => Err(AppError::Rpc(message.clone())),
            None => Ok(state.gas_estimate),
        }
    }

    async fn call(&self, _request: &CallRequest) -> Result<Bytes> {
        Ok(self.state.lock().unwrap().call_result.clone())
    }

    async fn submit(&self, tx: &SignedTransaction) -> Result<B256> {
        let mut state = self.state.lock().unwrap();
        state.submitted.push(tx.raw().clone());

        if let Some(err) = state.submit_failures.pop_front() {
            return Err(err);
        }

        let pending = state.nonces.entry(tx.from()).or_default();
        *pending = (*pending).max(tx.nonce() + 1);
        state.accepted.push(tx.nonce());

        if state.mining {
            state.latest_block += 1;
            let unsigned = tx.unsigned();
            let receipt = TxReceipt {
                transaction_hash: tx.hash(),
                block_number: state.latest_block,
                success: !state.revert,
                gas_used: unsigned.gas_limit,
                effective_gas_price: unsigned.gas_price,
                contract_address: unsigned.to.is_none().then(|| tx.from().create(tx.nonce())),
            };
            state.receipts.insert(tx.hash(), receipt);
        }
        Ok(tx.hash())
    }

    async fn receipt(&self, hash: B256) -> Result<Option<TxReceipt>> {
        Ok(self.state.lock().unwrap().receipts.get(&hash).cloned())
    }
}

/// Skip test if live network settings are missing.
#[macro_export]
macro_rules! skip_if_no_network {
    () => {{
        let _ = dotenvy::dotenv();
        match std::env::var("ETHEREUM_RPC_URL") {
            Ok(url) if !url.is_empty() => url,
            _ => {
                eprintln!("Skipping test: ETHEREUM_RPC_URL not set");
                return;
            }
        }
    }};
}
