//! Integration tests for transaction building against an in-memory chain.

mod common;

use alloy::primitives::{address, Bytes, U256};
use common::{FakeChain, ONE_ETHER, TWENTY_GWEI};
use eth_tx_orchestrator::{AppError, NonceManager, TransactionBuilder, TransactionSigner};
use tokio_test::{assert_err, assert_ok};

/// Scenario: nonce 5, gas price 20 gwei, balance 1 ETH, transfer of 0.001 ETH.
#[tokio::test]
async fn test_build_transfer_uses_chain_state() {
    let chain = FakeChain::shared();
    let sender = common::dev_signer().address();
    let recipient = address!("489C6e2f86d21F84B5207520D070B12573F739F5");
    chain.set_nonce(sender, 5);
    chain.fund(sender, U256::from(ONE_ETHER));

    let builder = TransactionBuilder::new(chain.clone());
    let nonces = NonceManager::new();
    let mut guard = nonces.acquire(sender).await;

    let value = U256::from(1_000_000_000_000_000u64);
    let tx = assert_ok!(builder.build_transfer(&mut guard, recipient, value).await);

    assert_eq!(tx.nonce, 5);
    assert_eq!(tx.to, Some(recipient));
    assert_eq!(tx.value, value);
    assert_eq!(tx.gas_limit, 21_000);
    assert_eq!(tx.gas_price, 20_000_000_000);
    assert!(tx.data.is_empty());
}

#[tokio::test]
async fn test_sequential_builds_have_increasing_nonces() {
    let chain = FakeChain::shared();
    let sender = common::dev_signer().address();
    chain.set_nonce(sender, 7);
    chain.fund(sender, U256::from(ONE_ETHER));

    let builder = TransactionBuilder::new(chain.clone());
    let nonces = NonceManager::new();
    let recipient = address!("0000000000000000000000000000000000000001");

    let mut allocated = Vec::new();
    for _ in 0..4 {
        let mut guard = nonces.acquire(sender).await;
        let tx = assert_ok!(builder.build_transfer(&mut guard, recipient, U256::from(1u64)).await);
        allocated.push(tx.nonce);
    }

    assert_eq!(allocated, vec![7, 8, 9, 10]);
}

#[tokio::test]
async fn test_chain_nonce_ahead_of_session_wins() {
    let chain = FakeChain::shared();
    let sender = common::dev_signer().address();
    chain.fund(sender, U256::from(ONE_ETHER));

    let builder = TransactionBuilder::new(chain.clone());
    let nonces = NonceManager::new();
    let recipient = address!("0000000000000000000000000000000000000001");

    let mut guard = nonces.acquire(sender).await;
    let first = assert_ok!(builder.build_transfer(&mut guard, recipient, U256::ZERO).await);
    assert_eq!(first.nonce, 0);

    // Another wallet instance sent transactions meanwhile
    chain.set_nonce(sender, 12);
    let second = assert_ok!(builder.build_transfer(&mut guard, recipient, U256::ZERO).await);
    assert_eq!(second.nonce, 12);
}

#[tokio::test]
async fn test_insufficient_balance_releases_nonce() {
    let chain = FakeChain::shared();
    let sender = common::dev_signer().address();
    chain.set_nonce(sender, 5);
    chain.fund(sender, U256::from(1_000u64));

    let builder = TransactionBuilder::new(chain.clone());
    let nonces = NonceManager::new();
    let recipient = address!("0000000000000000000000000000000000000001");
    let mut guard = nonces.acquire(sender).await;

    let err = assert_err!(builder.build_transfer(&mut guard, recipient, U256::from(1u64)).await);
    match err {
        AppError::InsufficientBalance { address, have, need } => {
            assert_eq!(address, sender);
            assert_eq!(have, U256::from(1_000u64));
            assert_eq!(need, U256::from(21_000u128 * TWENTY_GWEI + 1));
        }
        other => panic!("unexpected error: {other}"),
    }

    chain.fund(sender, U256::from(ONE_ETHER));
    let tx = assert_ok!(builder.build_transfer(&mut guard, recipient, U256::from(1u64)).await);
    assert_eq!(tx.nonce, 5);
}

#[tokio::test]
async fn test_built_transactions_are_affordable() {
    let chain = FakeChain::shared();
    let sender = common::dev_signer().address();
    let balance = U256::from(ONE_ETHER);
    chain.fund(sender, balance);

    let builder = TransactionBuilder::new(chain.clone());
    let nonces = NonceManager::new();
    let recipient = address!("0000000000000000000000000000000000000001");

    for value in [0u64, 1, 500_000_000_000_000_000, 999_000_000_000_000_000] {
        let mut guard = nonces.acquire(sender).await;
        match builder.build_transfer(&mut guard, recipient, U256::from(value)).await {
            Ok(tx) => assert!(tx.max_cost() <= balance),
            Err(err) => assert!(matches!(err, AppError::InsufficientBalance { .. })),
        }
    }
}

#[tokio::test]
async fn test_contract_call_applies_gas_margin() {
    let chain = FakeChain::shared();
    let sender = common::dev_signer().address();
    chain.fund(sender, U256::from(ONE_ETHER));
    chain.set_gas_estimate(43_000);

    let builder = TransactionBuilder::new(chain.clone()).with_gas_margin(20);
    let nonces = NonceManager::new();
    let mut guard = nonces.acquire(sender).await;
    let contract = address!("5FbDB2315678afecb367f032d93F642f64180aa3");
    let data = Bytes::from_static(&[0xd0, 0x9d, 0xe0, 0x8a]);

    let tx = assert_ok!(
        builder.build_contract_call(&mut guard, contract, data.clone(), U256::ZERO).await
    );

    assert_eq!(tx.to, Some(contract));
    assert_eq!(tx.data, data);
    assert_eq!(tx.gas_limit, 51_600);
}

#[tokio::test]
async fn test_estimation_failure() {
    let chain = FakeChain::shared();
    let sender = common::dev_signer().address();
    chain.fund(sender, U256::from(ONE_ETHER));
    chain.fail_estimates("execution reverted");

    let builder = TransactionBuilder::new(chain.clone());
    let nonces = NonceManager::new();
    let mut guard = nonces.acquire(sender).await;
    let contract = address!("5FbDB2315678afecb367f032d93F642f64180aa3");

    let err = assert_err!(
        builder.build_contract_call(&mut guard, contract, Bytes::new(), U256::ZERO).await
    );
    assert!(matches!(err, AppError::Estimation(msg) if msg.contains("execution reverted")));
}

#[tokio::test]
async fn test_deployment_below_intrinsic_gas() {
    let chain = FakeChain::shared();
    let sender = common::dev_signer().address();
    chain.fund(sender, U256::from(ONE_ETHER));
    chain.set_gas_estimate(30_000);

    let builder = TransactionBuilder::new(chain.clone()).with_gas_margin(0);
    let nonces = NonceManager::new();
    let mut guard = nonces.acquire(sender).await;

    let init_code = Bytes::from(vec![0x60u8; 64]);
    let err = assert_err!(builder.build_deployment(&mut guard, init_code, U256::ZERO).await);
    match err {
        AppError::IntrinsicGas { required, provided } => {
            // 21000 + 32000 + 64 * 16 + 2 words * 2
            assert_eq!(required, 54_028);
            assert_eq!(provided, 30_000);
        }
        other => panic!("unexpected error: {other}"),
    }
}
