//! Block-related types.

use std::fmt;

use alloy::{
    eips::BlockNumberOrTag,
    primitives::{Address, B256, U256},
};
use serde::{Deserialize, Serialize};

/// Which block to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockSelector {
    /// Most recent block.
    #[default]
    Latest,
    /// Block at a fixed height.
    Number(u64),
}

impl BlockSelector {
    /// Height `0` means "latest", anything else a fixed block.
    pub fn from_height(height: u64) -> Self {
        if height == 0 {
            BlockSelector::Latest
        } else {
            BlockSelector::Number(height)
        }
    }
}

impl From<BlockSelector> for BlockNumberOrTag {
    fn from(selector: BlockSelector) -> Self {
        match selector {
            BlockSelector::Latest => BlockNumberOrTag::Latest,
            BlockSelector::Number(n) => BlockNumberOrTag::Number(n),
        }
    }
}

impl fmt::Display for BlockSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockSelector::Latest => f.write_str("latest"),
            BlockSelector::Number(n) => write!(f, "#{n}"),
        }
    }
}

/// Summary of a transaction included in a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxSummary {
    /// Transaction hash.
    pub hash: B256,
    /// Gas price (legacy) or max fee per gas (EIP-1559).
    pub gas_price: u128,
    /// Gas limit.
    pub gas_limit: u64,
    /// Value in wei.
    pub value: U256,
}

/// Header data and transaction count of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSummary {
    /// Block height.
    pub number: u64,
    /// Block hash.
    pub hash: B256,
    /// Parent block hash.
    pub parent_hash: B256,
    /// Unix timestamp.
    pub timestamp: u64,
    /// Number of transactions.
    pub transaction_count: usize,
    /// Gas used by all transactions.
    pub gas_used: u64,
    /// Block gas limit.
    pub gas_limit: u64,
    /// Fee recipient.
    pub miner: Address,
    /// First transaction of the block, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_transaction: Option<TxSummary>,
}
