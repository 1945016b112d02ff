//! Block query and ETH transfer
//!
//! Prints a block summary, then sends a value transfer and waits for it.

use std::sync::Arc;

use eth_tx_orchestrator::{
    logging,
    types::{format_ether, BlockSummary},
    AppError, ChainClient, ChainQueryService, Config, EthereumClient, TransactionPipeline,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    logging::init(&config.log_level);

    let client = Arc::new(EthereumClient::with_retry(&config.rpc_url, config.tx.rpc_retry())?);
    let chain_id = client.chain_id().await?;
    println!("Connected to chain {chain_id}");

    // Block query
    let query = ChainQueryService::new(client.clone());
    println!("\n========== Block ==========");
    println!("Latest block: {}", query.latest_block_number().await?);
    println!("Querying:     {}", config.query_block);
    print_block(&query.block_summary(config.query_block).await?);

    // Transfer
    println!("\n========== Transfer ==========");
    let recipient = config.require_recipient()?;
    let signer = Arc::new(config.signer()?);
    let pipeline = TransactionPipeline::new(client.clone(), signer).with_settings(&config.tx);

    let balance = query.balance_of(pipeline.sender()).await?;
    println!("Sender:    {}", pipeline.sender());
    println!("Balance:   {} wei ({} ETH)", balance.balance_raw, balance.balance);

    let mut pending = pipeline.submit_transfer(recipient, config.transfer_value).await?;
    println!("Nonce:     {}", pending.signed().nonce());
    println!("Gas price: {} wei", pending.signed().unsigned().gas_price);
    println!("Tx hash:   {}", pending.hash());
    println!("Value:     {} ETH", format_ether(config.transfer_value));
    println!("Recipient: {recipient}");

    match pipeline.confirm(&mut pending).await {
        Ok(outcome) => {
            let status = if outcome.receipt.success { "success" } else { "reverted" };
            println!("Mined in block {} ({status})", outcome.receipt.block_number);
        }
        Err(err @ AppError::ConfirmationTimeout { .. }) => {
            println!("Not mined yet ({}): {err}", pending.state());
        }
        Err(err) => return Err(err.into()),
    }

    Ok(())
}

fn print_block(block: &BlockSummary) {
    println!("Number:       {}", block.number);
    println!("Hash:         {}", block.hash);
    println!("Parent hash:  {}", block.parent_hash);
    println!("Timestamp:    {}", block.timestamp);
    println!("Transactions: {}", block.transaction_count);
    println!("Gas used:     {}", block.gas_used);
    println!("Gas limit:    {}", block.gas_limit);
    println!("Miner:        {}", block.miner);

    if let Some(tx) = &block.first_transaction {
        println!("\n--- First transaction ---");
        println!("Hash:         {}", tx.hash);
        println!("Gas price:    {}", tx.gas_price);
        println!("Gas limit:    {}", tx.gas_limit);
        println!("Value:        {} wei", tx.value);
    }
}
