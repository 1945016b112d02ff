//! Unsigned transaction assembly from current chain state.

use std::sync::Arc;

use alloy::primitives::{Address, Bytes, U256};
use tracing::debug;

use crate::{
    error::{AppError, Result},
    ethereum::{
        constants::{
            DEFAULT_GAS_LIMIT_MARGIN_PERCENT, MIN_REPLACEMENT_BUMP_PERCENT, TRANSFER_GAS_LIMIT,
        },
        ChainClient,
    },
    services::nonce::NonceGuard,
    types::{CallRequest, UnsignedTransaction},
};

/// Add `margin_percent` on top of a gas estimate.
pub fn apply_gas_margin(estimate: u64, margin_percent: u64) -> u64 {
    estimate.saturating_add(estimate.saturating_mul(margin_percent) / 100)
}

/// Replacement-by-fee: same transaction and nonce with a higher gas price.
///
/// The bump is at least [`MIN_REPLACEMENT_BUMP_PERCENT`], the minimum most
/// nodes accept. Submitting the replacement is left to the caller.
pub fn replacement_for(original: &UnsignedTransaction, bump_percent: u64) -> UnsignedTransaction {
    let bump = bump_percent.max(MIN_REPLACEMENT_BUMP_PERCENT) as u128;
    let scaled = original.gas_price.saturating_mul(100 + bump);
    let bumped = scaled / 100 + u128::from(scaled % 100 != 0);

    UnsignedTransaction { gas_price: bumped.max(original.gas_price.saturating_add(1)), ..original.clone() }
}

/// Builds unsigned transactions for a sender.
///
/// Every build re-reads the nonce through the sender's [`NonceGuard`] and
/// rejects transactions the sender cannot pay for.
#[derive(Clone)]
pub struct TransactionBuilder {
    client: Arc<dyn ChainClient>,
    gas_limit_margin_percent: u64,
}

impl TransactionBuilder {
    /// Create a builder with the default estimation margin.
    pub fn new(client: Arc<dyn ChainClient>) -> Self {
        Self { client, gas_limit_margin_percent: DEFAULT_GAS_LIMIT_MARGIN_PERCENT }
    }

    /// Override the margin applied to gas estimates.
    pub fn with_gas_margin(mut self, percent: u64) -> Self {
        self.gas_limit_margin_percent = percent;
        self
    }

    /// Plain value transfer with the fixed 21000 gas limit.
    pub async fn build_transfer(
        &self,
        sender: &mut NonceGuard,
        to: Address,
        value: U256,
    ) -> Result<UnsignedTransaction> {
        self.assemble(sender, Some(to), value, Bytes::new(), TRANSFER_GAS_LIMIT).await
    }

    /// Contract method call with an estimated gas limit.
    pub async fn build_contract_call(
        &self,
        sender: &mut NonceGuard,
        contract: Address,
        data: Bytes,
        value: U256,
    ) -> Result<UnsignedTransaction> {
        let gas_limit = self.estimate(sender.address(), Some(contract), value, &data).await?;
        self.assemble(sender, Some(contract), value, data, gas_limit).await
    }

    /// Contract creation with an estimated gas limit.
    pub async fn build_deployment(
        &self,
        sender: &mut NonceGuard,
        init_code: Bytes,
        value: U256,
    ) -> Result<UnsignedTransaction> {
        let gas_limit = self.estimate(sender.address(), None, value, &init_code).await?;
        self.assemble(sender, None, value, init_code, gas_limit).await
    }

    async fn estimate(
        &self,
        from: Address,
        to: Option<Address>,
        value: U256,
        data: &Bytes,
    ) -> Result<u64> {
        let request = CallRequest { from: Some(from), to, value, data: data.clone() };
        let estimate = self.client.estimate_gas(&request).await.map_err(|err| match err {
            AppError::Rpc(msg) => AppError::Estimation(msg),
            other => other,
        })?;
        let gas_limit = apply_gas_margin(estimate, self.gas_limit_margin_percent);
        debug!(from = %from, estimate, gas_limit, "Estimated gas");
        Ok(gas_limit)
    }

    async fn assemble(
        &self,
        sender: &mut NonceGuard,
        to: Option<Address>,
        value: U256,
        data: Bytes,
        gas_limit: u64,
    ) -> Result<UnsignedTransaction> {
        let gas_price = self.client.gas_price().await?;
        let nonce = sender.allocate(self.client.as_ref()).await?;

        let tx = UnsignedTransaction { nonce, to, value, gas_limit, gas_price, data };

        if let Err(err) = self.preflight(sender.address(), &tx).await {
            sender.release(nonce);
            return Err(err);
        }

        debug!(
            from = %sender.address(),
            nonce,
            gas_limit,
            gas_price,
            value = %value,
            "Built transaction"
        );
        Ok(tx)
    }

    async fn preflight(&self, from: Address, tx: &UnsignedTransaction) -> Result<()> {
        tx.validate()?;

        let balance = self.client.balance(from).await?;
        let need = tx.max_cost();
        if need > balance {
            return Err(AppError::InsufficientBalance { address: from, have: balance, need });
        }
        Ok(())
    }
}
