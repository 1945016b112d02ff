//! Ethereum network constants.
//!
//! Contains chain IDs and gas schedule values.

use std::time::Duration;

// ============================================================================
// Chain IDs
// ============================================================================

/// Ethereum Mainnet chain ID.
pub const ETHEREUM_MAINNET_CHAIN_ID: u64 = 1;

/// Sepolia testnet chain ID.
pub const SEPOLIA_CHAIN_ID: u64 = 11155111;

// ============================================================================
// Gas Schedule
// ============================================================================

/// Gas limit of a plain native-currency transfer.
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;

/// Base intrinsic gas of every transaction.
pub const TX_BASE_GAS: u64 = 21_000;

/// Extra intrinsic gas for contract creation.
pub const TX_CREATE_GAS: u64 = 32_000;

/// Gas per zero calldata byte.
pub const TX_DATA_ZERO_GAS: u64 = 4;

/// Gas per non-zero calldata byte (EIP-2028).
pub const TX_DATA_NON_ZERO_GAS: u64 = 16;

/// Gas per 32-byte word of init code (EIP-3860).
pub const TX_INITCODE_WORD_GAS: u64 = 2;

/// Default safety margin added on top of `eth_estimateGas`.
pub const DEFAULT_GAS_LIMIT_MARGIN_PERCENT: u64 = 20;

/// Smallest gas price bump nodes accept for a replacement transaction.
pub const MIN_REPLACEMENT_BUMP_PERCENT: u64 = 10;

// ============================================================================
// Submission & Confirmation
// ============================================================================

/// Default time to wait for a receipt.
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(120);

/// Default delay between receipt lookups.
pub const DEFAULT_RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default number of submission attempts on transient transport failures.
pub const DEFAULT_SUBMIT_MAX_ATTEMPTS: u32 = 3;

/// Default number of attempts for RPC reads.
pub const DEFAULT_RPC_MAX_ATTEMPTS: u32 = 3;

/// Default first backoff delay between retries.
pub const DEFAULT_RETRY_INITIAL_BACKOFF: Duration = Duration::from_millis(250);

/// Upper bound on backoff delay between retries.
pub const DEFAULT_RETRY_MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Default transfer value used by the demo program (0.001 ETH).
pub const DEFAULT_TRANSFER_VALUE_WEI: u64 = 1_000_000_000_000_000;
