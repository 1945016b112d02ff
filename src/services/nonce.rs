//! Nonce allocation for sending addresses.
//!
//! Handles:
//! - One writer per address at a time (build, sign, submit)
//! - Fresh on-chain lookup for every allocation
//! - Strictly increasing nonces within a session

use std::sync::Arc;

use alloy::primitives::Address;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

use crate::{error::Result, ethereum::ChainClient};

/// Per-address nonce state.
#[derive(Debug, Default)]
struct AccountNonce {
    /// Next nonce this session would hand out, if any was allocated.
    next: Option<u64>,
}

/// Serializes writers per address and hands out nonces.
#[derive(Debug, Default)]
pub struct NonceManager {
    accounts: DashMap<Address, Arc<Mutex<AccountNonce>>>,
}

impl NonceManager {
    /// Create an empty nonce manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive write access to `address`.
    ///
    /// The returned guard must be held from nonce allocation until the
    /// transaction has been submitted.
    pub async fn acquire(&self, address: Address) -> NonceGuard {
        let slot = self.accounts.entry(address).or_default().clone();
        let state = slot.lock_owned().await;
        NonceGuard { address, state }
    }

    /// Number of addresses seen so far.
    pub fn tracked_accounts(&self) -> usize {
        self.accounts.len()
    }
}

/// Exclusive write access to one sending address.
#[derive(Debug)]
pub struct NonceGuard {
    address: Address,
    state: OwnedMutexGuard<AccountNonce>,
}

impl NonceGuard {
    /// The sending address this guard locks.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Allocate the next nonce.
    ///
    /// Re-reads the pending nonce from the chain on every call and never
    /// returns a value lower than the previous allocation plus one.
    pub async fn allocate(&mut self, client: &dyn ChainClient) -> Result<u64> {
        let on_chain = client.nonce(self.address, true).await?;

        let nonce = match self.state.next {
            Some(local) if local > on_chain => local,
            Some(local) if local < on_chain => {
                warn!(
                    address = %self.address,
                    local,
                    on_chain,
                    "Pending nonce advanced outside this session"
                );
                on_chain
            }
            _ => on_chain,
        };

        self.state.next = Some(nonce + 1);
        debug!(address = %self.address, nonce, on_chain, "Allocated nonce");
        Ok(nonce)
    }

    /// Return `nonce` when the transaction was definitely never broadcast.
    ///
    /// Only the most recent allocation can be rolled back.
    pub fn release(&mut self, nonce: u64) {
        if self.state.next == Some(nonce + 1) {
            self.state.next = Some(nonce);
            debug!(address = %self.address, nonce, "Released nonce");
        }
    }

    /// Drop local state so the next allocation trusts the chain alone.
    ///
    /// Used when a submission outcome is unknown.
    pub fn resync(&mut self) {
        self.state.next = None;
    }
}
