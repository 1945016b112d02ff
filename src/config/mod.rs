//! Configuration management module.
//!
//! Handles loading configuration from environment variables. Key material is
//! injected through `ETHEREUM_PRIVATE_KEY` or a secret file named by
//! `ETHEREUM_PRIVATE_KEY_FILE`; it is never compiled in.

use std::{env, fmt, str::FromStr, time::Duration};

use alloy::primitives::{Address, Bytes, U256};
use zeroize::Zeroizing;

use crate::{
    error::{AppError, Result},
    ethereum::{
        constants::{
            DEFAULT_CONFIRMATION_TIMEOUT, DEFAULT_GAS_LIMIT_MARGIN_PERCENT,
            DEFAULT_RECEIPT_POLL_INTERVAL, DEFAULT_RPC_MAX_ATTEMPTS, DEFAULT_SUBMIT_MAX_ATTEMPTS,
            DEFAULT_TRANSFER_VALUE_WEI,
        },
        KeySigner, RetryPolicy,
    },
    services::SubmitterConfig,
    types::{parse_wei, BlockSelector},
};

/// Transaction submission settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxSettings {
    /// Delay between receipt lookups.
    pub poll_interval: Duration,
    /// Time to wait for a receipt.
    pub confirmation_timeout: Duration,
    /// Attempts for broadcasting a signed transaction.
    pub submit_max_attempts: u32,
    /// Attempts for RPC reads.
    pub rpc_max_attempts: u32,
    /// Margin added to gas estimates, in percent.
    pub gas_limit_margin_percent: u64,
}

impl TxSettings {
    /// Settings for the submitter.
    pub fn submitter_config(&self) -> SubmitterConfig {
        SubmitterConfig {
            poll_interval: self.poll_interval,
            confirmation_timeout: self.confirmation_timeout,
            retry: RetryPolicy::with_attempts(self.submit_max_attempts),
        }
    }

    /// Retry policy for RPC reads.
    pub fn rpc_retry(&self) -> RetryPolicy {
        RetryPolicy::with_attempts(self.rpc_max_attempts)
    }
}

impl Default for TxSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_RECEIPT_POLL_INTERVAL,
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
            submit_max_attempts: DEFAULT_SUBMIT_MAX_ATTEMPTS,
            rpc_max_attempts: DEFAULT_RPC_MAX_ATTEMPTS,
            gas_limit_margin_percent: DEFAULT_GAS_LIMIT_MARGIN_PERCENT,
        }
    }
}

/// Application configuration.
#[derive(Clone)]
pub struct Config {
    /// Ethereum JSON-RPC endpoint URL.
    pub rpc_url: String,
    /// Private key (hex), zeroed on drop.
    private_key: Option<Zeroizing<String>>,
    /// Recipient of the demo transfer.
    pub recipient: Option<Address>,
    /// Value of the demo transfer in wei.
    pub transfer_value: U256,
    /// Block queried by the demo.
    pub query_block: BlockSelector,
    /// Counter contract creation bytecode.
    pub counter_bytecode: Option<Bytes>,
    /// Submission settings.
    pub tx: TxSettings,
    /// Logging level (default: info).
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `ETHEREUM_RPC_URL`: Ethereum JSON-RPC endpoint
    ///
    /// Secret injection (one of, required only for signing):
    /// - `ETHEREUM_PRIVATE_KEY`: private key (hex)
    /// - `ETHEREUM_PRIVATE_KEY_FILE`: path to a file holding the key
    ///
    /// Optional environment variables:
    /// - `RECIPIENT_ADDRESS`: transfer recipient
    /// - `TRANSFER_VALUE_WEI`: transfer value (default: 10^15)
    /// - `QUERY_BLOCK_NUMBER`: block to query, 0 for latest (default: 0)
    /// - `COUNTER_BYTECODE` / `COUNTER_BYTECODE_FILE`: counter bytecode (hex)
    /// - `CONFIRMATION_TIMEOUT_SECS` (default: 120)
    /// - `RECEIPT_POLL_INTERVAL_MS` (default: 2000)
    /// - `SUBMIT_MAX_ATTEMPTS` (default: 3)
    /// - `RPC_MAX_ATTEMPTS` (default: 3)
    /// - `GAS_LIMIT_MARGIN_PERCENT` (default: 20)
    /// - `LOG_LEVEL`: Logging level (default: info)
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let rpc_url = var("ETHEREUM_RPC_URL").ok_or_else(|| {
            AppError::Config("ETHEREUM_RPC_URL environment variable not set".into())
        })?;

        let private_key = match (var("ETHEREUM_PRIVATE_KEY"), var("ETHEREUM_PRIVATE_KEY_FILE")) {
            (Some(key), _) => Some(Zeroizing::new(key)),
            (None, Some(path)) => Some(read_secret_file(&path)?),
            (None, None) => None,
        };

        let recipient = var("RECIPIENT_ADDRESS")
            .map(|s| {
                s.parse::<Address>()
                    .map_err(|e| AppError::InvalidAddress(format!("RECIPIENT_ADDRESS {s}: {e}")))
            })
            .transpose()?;

        let transfer_value = match var("TRANSFER_VALUE_WEI") {
            Some(s) => parse_wei(&s)?,
            None => U256::from(DEFAULT_TRANSFER_VALUE_WEI),
        };

        let query_block = BlockSelector::from_height(parse_or(&var, "QUERY_BLOCK_NUMBER", 0)?);

        let counter_bytecode = match (var("COUNTER_BYTECODE"), var("COUNTER_BYTECODE_FILE")) {
            (Some(hex), _) => Some(parse_bytecode(&hex)?),
            (None, Some(path)) => {
                let contents = std::fs::read_to_string(&path).map_err(|e| {
                    AppError::Config(format!("Cannot read COUNTER_BYTECODE_FILE {path}: {e}"))
                })?;
                Some(parse_bytecode(&contents)?)
            }
            (None, None) => None,
        };

        let defaults = TxSettings::default();
        let tx = TxSettings {
            poll_interval: Duration::from_millis(parse_or(
                &var,
                "RECEIPT_POLL_INTERVAL_MS",
                defaults.poll_interval.as_millis() as u64,
            )?),
            confirmation_timeout: Duration::from_secs(parse_or(
                &var,
                "CONFIRMATION_TIMEOUT_SECS",
                defaults.confirmation_timeout.as_secs(),
            )?),
            submit_max_attempts: parse_or(
                &var,
                "SUBMIT_MAX_ATTEMPTS",
                defaults.submit_max_attempts,
            )?,
            rpc_max_attempts: parse_or(&var, "RPC_MAX_ATTEMPTS", defaults.rpc_max_attempts)?,
            gas_limit_margin_percent: parse_or(
                &var,
                "GAS_LIMIT_MARGIN_PERCENT",
                defaults.gas_limit_margin_percent,
            )?,
        };

        if tx.poll_interval.is_zero() {
            return Err(AppError::Config("RECEIPT_POLL_INTERVAL_MS must be positive".into()));
        }

        let log_level = var("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        Ok(Self {
            rpc_url,
            private_key,
            recipient,
            transfer_value,
            query_block,
            counter_bytecode,
            tx,
            log_level,
        })
    }

    /// Whether key material was injected.
    pub fn has_private_key(&self) -> bool {
        self.private_key.is_some()
    }

    /// Build the signer from the injected key.
    pub fn signer(&self) -> Result<KeySigner> {
        let key = self.private_key.as_ref().ok_or_else(|| {
            AppError::Config(
                "Set ETHEREUM_PRIVATE_KEY or ETHEREUM_PRIVATE_KEY_FILE to sign transactions".into(),
            )
        })?;
        KeySigner::from_private_key(key)
    }

    /// Transfer recipient, required by the transfer program.
    pub fn require_recipient(&self) -> Result<Address> {
        self.recipient.ok_or_else(|| {
            AppError::Config("RECIPIENT_ADDRESS environment variable not set".into())
        })
    }

    /// Counter bytecode, required by the counter program.
    pub fn require_counter_bytecode(&self) -> Result<Bytes> {
        self.counter_bytecode.clone().ok_or_else(|| {
            AppError::Config("Set COUNTER_BYTECODE or COUNTER_BYTECODE_FILE".into())
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("rpc_url", &self.rpc_url)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("recipient", &self.recipient)
            .field("transfer_value", &self.transfer_value)
            .field("query_block", &self.query_block)
            .field("counter_bytecode_len", &self.counter_bytecode.as_ref().map(|b| b.len()))
            .field("tx", &self.tx)
            .field("log_level", &self.log_level)
            .finish()
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw.parse().map_err(|e| AppError::Config(format!("Invalid {key} {raw}: {e}"))),
        None => Ok(default),
    }
}

fn read_secret_file(path: &str) -> Result<Zeroizing<String>> {
    let contents = Zeroizing::new(std::fs::read_to_string(path).map_err(|e| {
        AppError::Config(format!("Cannot read ETHEREUM_PRIVATE_KEY_FILE {path}: {e}"))
    })?);
    let key = contents.trim();
    if key.is_empty() {
        return Err(AppError::Config(format!("ETHEREUM_PRIVATE_KEY_FILE {path} is empty")));
    }
    Ok(Zeroizing::new(key.to_string()))
}

fn parse_bytecode(hex: &str) -> Result<Bytes> {
    let bytes = alloy::hex::decode(hex.trim())?;
    if bytes.is_empty() {
        return Err(AppError::Config("Counter bytecode is empty".into()));
    }
    Ok(Bytes::from(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const TEST_PRIVATE_KEY: &str =
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_missing_rpc_url() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains("ETHEREUM_RPC_URL")));
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("ETHEREUM_RPC_URL", "http://localhost:8545")]).unwrap();

        assert_eq!(config.rpc_url, "http://localhost:8545");
        assert!(!config.has_private_key());
        assert_eq!(config.transfer_value, U256::from(1_000_000_000_000_000u64));
        assert_eq!(config.query_block, BlockSelector::Latest);
        assert_eq!(config.tx, TxSettings::default());
        assert_eq!(config.log_level, "info");
        assert!(matches!(config.signer(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("ETHEREUM_RPC_URL", "http://localhost:8545"),
            ("ETHEREUM_PRIVATE_KEY", TEST_PRIVATE_KEY),
            ("RECIPIENT_ADDRESS", "0x489C6e2f86d21F84B5207520D070B12573F739F5"),
            ("TRANSFER_VALUE_WEI", "42"),
            ("QUERY_BLOCK_NUMBER", "9735711"),
            ("COUNTER_BYTECODE", "0x6080604052"),
            ("CONFIRMATION_TIMEOUT_SECS", "30"),
            ("RECEIPT_POLL_INTERVAL_MS", "500"),
            ("SUBMIT_MAX_ATTEMPTS", "5"),
            ("GAS_LIMIT_MARGIN_PERCENT", "50"),
        ])
        .unwrap();

        assert!(config.has_private_key());
        assert!(config.signer().is_ok());
        assert!(config.require_recipient().is_ok());
        assert_eq!(config.transfer_value, U256::from(42u64));
        assert_eq!(config.query_block, BlockSelector::Number(9_735_711));
        assert_eq!(config.require_counter_bytecode().unwrap().len(), 5);
        assert_eq!(config.tx.confirmation_timeout, Duration::from_secs(30));
        assert_eq!(config.tx.poll_interval, Duration::from_millis(500));
        assert_eq!(config.tx.submit_max_attempts, 5);
        assert_eq!(config.tx.gas_limit_margin_percent, 50);
    }

    #[test]
    fn test_invalid_values() {
        let base = ("ETHEREUM_RPC_URL", "http://localhost:8545");
        assert!(matches!(
            load(&[base, ("RECIPIENT_ADDRESS", "0x1234")]),
            Err(AppError::InvalidAddress(_))
        ));
        assert!(matches!(load(&[base, ("SUBMIT_MAX_ATTEMPTS", "many")]), Err(AppError::Config(_))));
        assert!(matches!(
            load(&[base, ("RECEIPT_POLL_INTERVAL_MS", "0")]),
            Err(AppError::Config(_))
        ));
        assert!(load(&[base, ("COUNTER_BYTECODE", "0xzz")]).is_err());
    }

    #[test]
    fn test_private_key_file_injection() {
        let path = env::temp_dir().join(format!("eth-tx-orchestrator-key-{}", std::process::id()));
        std::fs::write(&path, format!("{TEST_PRIVATE_KEY}\n")).unwrap();

        let config = load(&[
            ("ETHEREUM_RPC_URL", "http://localhost:8545"),
            ("ETHEREUM_PRIVATE_KEY_FILE", path.to_str().unwrap()),
        ])
        .unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(config.signer().is_ok());
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let config = load(&[
            ("ETHEREUM_RPC_URL", "http://localhost:8545"),
            ("ETHEREUM_PRIVATE_KEY", TEST_PRIVATE_KEY),
        ])
        .unwrap();
        let debug_str = format!("{config:?}");

        assert!(debug_str.contains("<redacted>"));
        assert!(!debug_str.contains(TEST_PRIVATE_KEY.trim_start_matches("0x")));
    }
}
