//! Transaction signing.

use alloy::{
    consensus::SignableTransaction,
    network::TxSignerSync,
    primitives::Address,
    signers::local::PrivateKeySigner,
};
use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::{
    error::{AppError, Result},
    types::{SignedTransaction, UnsignedTransaction},
};

/// Produces signed transactions for a single account.
///
/// Implementations must be deterministic: the same unsigned transaction and
/// chain ID always yield the same signed transaction.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    /// Address of the signing account.
    fn address(&self) -> Address;

    /// Sign `tx` with EIP-155 replay protection for `chain_id`.
    async fn sign(&self, tx: &UnsignedTransaction, chain_id: u64) -> Result<SignedTransaction>;
}

/// In-memory secp256k1 signer.
///
/// The key never leaves this struct and is excluded from `Debug`.
#[derive(Clone)]
pub struct KeySigner {
    /// The local signer.
    signer: PrivateKeySigner,
    /// Wallet address.
    address: Address,
}

impl KeySigner {
    /// Create a signer from a hex private key, with or without `0x` prefix.
    pub fn from_private_key(private_key: &str) -> Result<Self> {
        let secret = Zeroizing::new(private_key.trim().to_string());
        let key = secret.strip_prefix("0x").unwrap_or(secret.as_str());

        let signer: PrivateKeySigner = key
            .parse()
            .map_err(|e: alloy::signers::local::LocalSignerError| {
                AppError::InvalidKey(e.to_string())
            })?;

        let address = signer.address();

        tracing::info!(address = %address, "Signer initialized");

        Ok(Self { signer, address })
    }

    /// Sign synchronously.
    pub fn sign_sync(&self, tx: &UnsignedTransaction, chain_id: u64) -> Result<SignedTransaction> {
        let mut legacy = tx.to_legacy(chain_id);
        let signature = self.signer.sign_transaction_sync(&mut legacy)?;
        SignedTransaction::from_signed_legacy(legacy.into_signed(signature), self.address)
    }
}

#[async_trait]
impl TransactionSigner for KeySigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign(&self, tx: &UnsignedTransaction, chain_id: u64) -> Result<SignedTransaction> {
        self.sign_sync(tx, chain_id)
    }
}

impl std::fmt::Debug for KeySigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySigner").field("address", &self.address).finish()
    }
}
