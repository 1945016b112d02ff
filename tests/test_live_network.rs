//! Live network tests.
//!
//! Run with: `cargo test --test test_live_network -- --ignored`

mod common;

use eth_tx_orchestrator::{
    types::BlockSelector, AppError, ChainClient, ChainQueryService, EthereumClient,
};
use std::sync::Arc;

/// Query the latest block and the block before it.
#[tokio::test]
#[ignore = "Requires network access and environment variables"]
async fn test_query_blocks() {
    let rpc_url = skip_if_no_network!();
    let client = Arc::new(EthereumClient::new(&rpc_url).unwrap());
    let query = ChainQueryService::new(client.clone());

    let latest = query.latest_block_number().await.unwrap();
    assert!(latest > 0);

    let block = query.block_summary(BlockSelector::Number(latest - 1)).await.unwrap();
    assert_eq!(block.number, latest - 1);
    assert!(block.gas_used <= block.gas_limit);

    println!("Block summary: {block:?}");
}

/// Query a well-known balance.
#[tokio::test]
#[ignore = "Requires network access and environment variables"]
async fn test_query_balance() {
    let rpc_url = skip_if_no_network!();
    let client = Arc::new(EthereumClient::new(&rpc_url).unwrap());
    let query = ChainQueryService::new(client.clone());

    let address = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045".parse().unwrap();
    let balance = query.balance_of(address).await.unwrap();

    assert_eq!(balance.address, address);
    assert!(!balance.balance_raw.is_empty());
    println!("Balance: {} ETH", balance.balance);

    let chain_id = client.chain_id().await.unwrap();
    assert_eq!(client.chain_id().await.unwrap(), chain_id);
}

/// A block far in the future does not exist.
#[tokio::test]
#[ignore = "Requires network access and environment variables"]
async fn test_missing_block() {
    let rpc_url = skip_if_no_network!();
    let client = EthereumClient::new(&rpc_url).unwrap();

    let err = client.block(BlockSelector::Number(u64::MAX / 2)).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
