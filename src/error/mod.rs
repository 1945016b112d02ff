//! Error types and handling module.
//!
//! Defines all application-specific error types and conversions.

use std::time::Duration;

use alloy::{
    primitives::{Address, B256, U256},
    transports::{RpcError, TransportErrorKind},
};
use thiserror::Error;

use crate::types::TxState;

/// Application-wide error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network or connection failure talking to the node.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The node answered with a JSON-RPC error.
    #[error("Ethereum RPC error: {0}")]
    Rpc(String),

    /// Requested block or transaction does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed key material.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Signer failed to produce a signature.
    #[error("Signing error: {0}")]
    Signing(String),

    /// Invalid Ethereum address.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Gas estimation failed.
    #[error("Gas estimation failed: {0}")]
    Estimation(String),

    /// Arguments do not match the method signature.
    #[error("ABI encoding error: {0}")]
    Encoding(String),

    /// Return data does not match the declared output types.
    #[error("ABI decoding error: {0}")]
    Decoding(String),

    /// Pre-flight balance check failed.
    #[error("Insufficient balance for {address}: have {have} wei, need {need} wei")]
    InsufficientBalance { address: Address, have: U256, need: U256 },

    /// Gas limit below the intrinsic cost of the transaction.
    #[error("Gas limit {provided} is below intrinsic gas {required}")]
    IntrinsicGas { required: u64, provided: u64 },

    /// Waiting for the receipt ran out of time. The transaction may still be mined.
    #[error("No receipt for {hash} after {waited:?}; the transaction may still be mined")]
    ConfirmationTimeout { hash: B256, waited: Duration },

    /// Lifecycle transition that the state machine does not allow.
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: TxState, to: TxState },

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl AppError {
    /// Whether the failed operation may be retried as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Transport(_))
    }
}

impl From<RpcError<TransportErrorKind>> for AppError {
    fn from(err: RpcError<TransportErrorKind>) -> Self {
        match err {
            RpcError::ErrorResp(payload) => AppError::Rpc(payload.to_string()),
            RpcError::SerError(_) | RpcError::DeserError { .. } => AppError::Parse(err.to_string()),
            other => AppError::Transport(other.to_string()),
        }
    }
}

impl From<alloy::signers::local::LocalSignerError> for AppError {
    fn from(err: alloy::signers::local::LocalSignerError) -> Self {
        AppError::InvalidKey(err.to_string())
    }
}

impl From<alloy::signers::Error> for AppError {
    fn from(err: alloy::signers::Error) -> Self {
        AppError::Signing(err.to_string())
    }
}

impl From<alloy::hex::FromHexError> for AppError {
    fn from(err: alloy::hex::FromHexError) -> Self {
        AppError::Parse(err.to_string())
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(err: std::num::ParseIntError) -> Self {
        AppError::Parse(err.to_string())
    }
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;
