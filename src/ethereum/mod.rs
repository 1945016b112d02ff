//! Ethereum interaction module.
//!
//! Contains the RPC client, signing, retry policy, and contract bindings.

pub mod client;
pub mod constants;
pub mod contracts;
pub mod retry;
pub mod wallet;

pub use client::{ChainClient, EthereumClient, HttpProvider};
pub use retry::RetryPolicy;
pub use wallet::{KeySigner, TransactionSigner};
