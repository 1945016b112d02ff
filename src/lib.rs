//! Ethereum Transaction Orchestrator Library
//!
//! Builds, signs, submits and confirms Ethereum transactions, and deploys and
//! calls contracts, against any JSON-RPC node.
//!
//! # Features
//!
//! - **Chain Queries**: Blocks, balances, nonces and gas prices over JSON-RPC
//! - **Transaction Pipeline**: Per-sender nonce allocation, EIP-155 signing,
//!   retrying submission and bounded receipt polling
//! - **Contract Invocation**: Deployment plus ABI-encoded reads and writes
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use eth_tx_orchestrator::{Config, EthereumClient, TransactionPipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let client = Arc::new(EthereumClient::new(&config.rpc_url)?);
//!     let pipeline = TransactionPipeline::new(client, Arc::new(config.signer()?))
//!         .with_settings(&config.tx);
//!     let to = config.require_recipient()?;
//!     let outcome = pipeline.send_transfer(to, config.transfer_value).await?;
//!     println!("{}", outcome.receipt.transaction_hash);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod ethereum;
pub mod logging;
pub mod services;
pub mod types;

pub use config::{Config, TxSettings};
pub use error::{AppError, Result};
pub use ethereum::constants::*;
pub use ethereum::{ChainClient, EthereumClient, KeySigner, RetryPolicy, TransactionSigner};
pub use services::{
    ChainQueryService, ContractInvoker, ContractMethod, NonceManager, PendingTransaction,
    Submitter, TransactionBuilder, TransactionOutcome, TransactionPipeline,
};
