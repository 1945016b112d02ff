//! Read-only chain queries.

use std::sync::Arc;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    ethereum::ChainClient,
    types::{format_ether, BlockSelector, BlockSummary},
};

/// Native balance of an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceInfo {
    /// Account address.
    pub address: Address,
    /// Human-readable balance in ether.
    pub balance: String,
    /// Raw balance in wei.
    pub balance_raw: String,
}

/// Service for block and balance queries.
#[derive(Clone)]
pub struct ChainQueryService {
    client: Arc<dyn ChainClient>,
}

impl ChainQueryService {
    /// Create a new query service.
    pub fn new(client: Arc<dyn ChainClient>) -> Self {
        Self { client }
    }

    /// Height of the latest block.
    pub async fn latest_block_number(&self) -> Result<u64> {
        self.client.block_number().await
    }

    /// Summary of the selected block.
    pub async fn block_summary(&self, selector: BlockSelector) -> Result<BlockSummary> {
        tracing::debug!(block = %selector, "Querying block");
        self.client.block(selector).await
    }

    /// Native ETH balance of `address`.
    pub async fn balance_of(&self, address: Address) -> Result<BalanceInfo> {
        tracing::debug!(address = %address, "Querying ETH balance");

        let balance = self.client.balance(address).await?;

        Ok(BalanceInfo {
            address,
            balance: format_ether(balance),
            balance_raw: balance.to_string(),
        })
    }
}
