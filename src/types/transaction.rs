//! Transaction-related types.

use std::fmt;

use alloy::{
    consensus::{
        transaction::SignerRecoverable, SignableTransaction, Signed, TxEnvelope, TxLegacy,
    },
    eips::eip2718::{Decodable2718, Encodable2718},
    primitives::{Address, Bytes, Signature, TxKind, B256, U256},
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, Result},
    ethereum::constants::{
        TX_BASE_GAS, TX_CREATE_GAS, TX_DATA_NON_ZERO_GAS, TX_DATA_ZERO_GAS, TX_INITCODE_WORD_GAS,
    },
};

/// Minimum gas a transaction consumes before any execution.
pub fn intrinsic_gas(data: &[u8], is_create: bool) -> u64 {
    let zero_bytes = data.iter().filter(|b| **b == 0).count() as u64;
    let non_zero_bytes = data.len() as u64 - zero_bytes;

    let mut gas =
        TX_BASE_GAS + zero_bytes * TX_DATA_ZERO_GAS + non_zero_bytes * TX_DATA_NON_ZERO_GAS;
    if is_create {
        gas += TX_CREATE_GAS + TX_INITCODE_WORD_GAS * (data.len() as u64).div_ceil(32);
    }
    gas
}

/// Transaction fields before signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTransaction {
    /// Sender nonce.
    pub nonce: u64,
    /// Recipient (None creates a contract).
    pub to: Option<Address>,
    /// Value in wei.
    pub value: U256,
    /// Gas limit.
    pub gas_limit: u64,
    /// Gas price in wei.
    pub gas_price: u128,
    /// Calldata or init code.
    #[serde(default)]
    pub data: Bytes,
}

impl UnsignedTransaction {
    /// Whether this transaction deploys a contract.
    pub fn is_contract_creation(&self) -> bool {
        self.to.is_none()
    }

    /// Intrinsic gas of this transaction.
    pub fn intrinsic_gas(&self) -> u64 {
        intrinsic_gas(&self.data, self.is_contract_creation())
    }

    /// Upper bound on what the sender pays: `gas_limit * gas_price + value`.
    pub fn max_cost(&self) -> U256 {
        U256::from(self.gas_limit) * U256::from(self.gas_price) + self.value
    }

    /// Reject transactions whose gas limit cannot cover the intrinsic cost.
    pub fn validate(&self) -> Result<()> {
        let required = self.intrinsic_gas();
        if self.gas_limit < required {
            return Err(AppError::IntrinsicGas { required, provided: self.gas_limit });
        }
        Ok(())
    }

    /// EIP-155 legacy transaction bound to `chain_id`.
    pub fn to_legacy(&self, chain_id: u64) -> TxLegacy {
        TxLegacy {
            chain_id: Some(chain_id),
            nonce: self.nonce,
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            to: self.to.map_or(TxKind::Create, TxKind::Call),
            value: self.value,
            input: self.data.clone(),
        }
    }
}

/// A signed, broadcast-ready transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    unsigned: UnsignedTransaction,
    chain_id: u64,
    signature: Signature,
    hash: B256,
    from: Address,
    raw: Bytes,
}

impl SignedTransaction {
    /// Wrap a signed legacy transaction whose sender is already known.
    pub fn from_signed_legacy(signed: Signed<TxLegacy>, from: Address) -> Result<Self> {
        let tx = signed.tx();
        let chain_id = tx
            .chain_id
            .ok_or_else(|| AppError::Signing("transaction is not replay protected".into()))?;

        let unsigned = UnsignedTransaction {
            nonce: tx.nonce,
            to: tx.to.to().copied(),
            value: tx.value,
            gas_limit: tx.gas_limit,
            gas_price: tx.gas_price,
            data: tx.input.clone(),
        };
        let signature = *signed.signature();
        let hash = *signed.hash();
        let raw = Bytes::from(TxEnvelope::Legacy(signed).encoded_2718());

        Ok(Self { unsigned, chain_id, signature, hash, from, raw })
    }

    /// Assemble from unsigned fields and an externally produced signature.
    pub fn from_parts(
        unsigned: UnsignedTransaction,
        chain_id: u64,
        signature: Signature,
        from: Address,
    ) -> Result<Self> {
        let signed = unsigned.to_legacy(chain_id).into_signed(signature);
        Self::from_signed_legacy(signed, from)
    }

    /// Decode a serialized EIP-2718 transaction and recover its sender.
    pub fn decode(raw: &[u8]) -> Result<Self> {
        let envelope = TxEnvelope::decode_2718(&mut &raw[..])
            .map_err(|e| AppError::Parse(format!("Invalid transaction encoding: {e}")))?;
        let from = envelope
            .recover_signer()
            .map_err(|e| AppError::Signing(format!("Cannot recover sender: {e}")))?;

        match envelope {
            TxEnvelope::Legacy(signed) => Self::from_signed_legacy(signed, from),
            other => Err(AppError::Parse(format!(
                "Unsupported transaction type {:?}",
                other.tx_type()
            ))),
        }
    }

    /// The unsigned fields.
    pub fn unsigned(&self) -> &UnsignedTransaction {
        &self.unsigned
    }

    /// Sender nonce.
    pub fn nonce(&self) -> u64 {
        self.unsigned.nonce
    }

    /// Chain the signature is bound to.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// The signature.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Transaction hash.
    pub fn hash(&self) -> B256 {
        self.hash
    }

    /// Sender address.
    pub fn from(&self) -> Address {
        self.from
    }

    /// EIP-2718 encoding as sent to `eth_sendRawTransaction`.
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }
}

/// Outcome of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    /// Transaction hash.
    pub transaction_hash: B256,
    /// Block that included the transaction.
    pub block_number: u64,
    /// False when execution reverted.
    pub success: bool,
    /// Gas consumed.
    pub gas_used: u64,
    /// Price actually paid per gas unit.
    pub effective_gas_price: u128,
    /// Address of the created contract, for deployments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<Address>,
}

/// Lifecycle state of a single transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxState {
    /// Unsigned fields assembled.
    Built,
    /// Signature attached.
    Signed,
    /// Accepted by the node.
    Submitted,
    /// Receipt observed.
    Confirmed,
    /// Gave up waiting for a receipt.
    TimedOut,
}

impl TxState {
    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: TxState) -> bool {
        matches!(
            (self, next),
            (TxState::Built, TxState::Signed)
                | (TxState::Signed, TxState::Submitted)
                | (TxState::Submitted, TxState::Confirmed)
                | (TxState::Submitted, TxState::TimedOut)
        )
    }

    /// Terminal states admit no further transition.
    pub fn is_terminal(self) -> bool {
        matches!(self, TxState::Confirmed | TxState::TimedOut)
    }
}

impl fmt::Display for TxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TxState::Built => "built",
            TxState::Signed => "signed",
            TxState::Submitted => "submitted",
            TxState::Confirmed => "confirmed",
            TxState::TimedOut => "timed_out",
        };
        f.write_str(s)
    }
}

/// Forward-only tracker for [`TxState`].
#[derive(Debug, Clone)]
pub struct TxLifecycle {
    state: TxState,
}

impl TxLifecycle {
    /// A freshly built transaction.
    pub fn new() -> Self {
        Self { state: TxState::Built }
    }

    /// Current state.
    pub fn state(&self) -> TxState {
        self.state
    }

    /// Move to `next`, rejecting backward or skipping transitions.
    pub fn advance(&mut self, next: TxState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(AppError::InvalidStateTransition { from: self.state, to: next });
        }
        self.state = next;
        Ok(())
    }
}

impl Default for TxLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Parameters for `eth_call` and `eth_estimateGas`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallRequest {
    /// Caller.
    pub from: Option<Address>,
    /// Target (None for creation).
    pub to: Option<Address>,
    /// Attached value in wei.
    pub value: U256,
    /// Calldata or init code.
    pub data: Bytes,
}
