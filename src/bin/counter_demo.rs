//! Counter contract walkthrough
//!
//! Deploys the counter, reads it, increments it, overwrites it and reads it
//! again, waiting for every transaction to be mined.

use std::sync::Arc;

use alloy::{
    dyn_abi::DynSolValue,
    primitives::{Address, U256},
};
use eth_tx_orchestrator::{
    ethereum::contracts::counter::{signatures, ICounter, DEMO_SET_COUNT, INITIAL_COUNT},
    logging, AppError, ChainClient, Config, ContractInvoker, EthereumClient, TransactionOutcome,
    TransactionPipeline,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    logging::init(&config.log_level);

    let bytecode = config.require_counter_bytecode()?;
    let client = Arc::new(EthereumClient::with_retry(&config.rpc_url, config.tx.rpc_retry())?);
    println!("Connected to chain {}", client.chain_id().await?);

    let pipeline =
        TransactionPipeline::new(client, Arc::new(config.signer()?)).with_settings(&config.tx);
    println!("Wallet: {}", pipeline.sender());
    let counter = ContractInvoker::new(pipeline);

    println!("\n========== Deploy ==========");
    let initial = DynSolValue::Uint(U256::from(INITIAL_COUNT), 256);
    let (address, outcome) = counter.deploy_and_confirm(&bytecode, &[initial]).await?;
    report(&outcome)?;
    println!("Contract: {address}");

    println!("\n========== Read ==========");
    println!("Count: {}", read_count(&counter, address).await?);

    println!("\n========== Increment ==========");
    report(&counter.send_typed(address, &ICounter::incrementCall {}).await?)?;
    println!("Count: {}", read_count(&counter, address).await?);

    println!("\n========== Set ==========");
    let value = DynSolValue::Uint(U256::from(DEMO_SET_COUNT), 256);
    report(&counter.send(address, signatures::SET_COUNT, &[value]).await?)?;

    let values = counter.call(address, signatures::GET_COUNT, &[]).await?;
    let count = values
        .first()
        .and_then(DynSolValue::as_uint)
        .map(|(count, _)| count)
        .ok_or_else(|| AppError::Decoding("getCount returned no integer".into()))?;
    println!("Count: {count}");

    Ok(())
}

async fn read_count(counter: &ContractInvoker, address: Address) -> Result<U256, AppError> {
    counter.call_typed(address, &ICounter::getCountCall {}).await
}

fn report(outcome: &TransactionOutcome) -> Result<(), AppError> {
    println!("Tx hash: {}", outcome.transaction.hash());
    println!("Block:   {}", outcome.receipt.block_number);
    if !outcome.receipt.success {
        return Err(AppError::Rpc(format!("Transaction {} reverted", outcome.transaction.hash())));
    }
    Ok(())
}
