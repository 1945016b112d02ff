//! Contract deployment and method invocation.
//!
//! Methods are described by human-readable signatures such as
//! `setCount(uint256)` or `getCount() returns (uint256)` and encoded with the
//! Solidity ABI at runtime. `sol!`-generated call structs can be used instead
//! through the typed variants.

use alloy::{
    dyn_abi::{DynSolType, DynSolValue, FunctionExt, JsonAbiExt, Specifier},
    json_abi::Function,
    primitives::{Address, Bytes, Selector, U256},
    sol_types::SolCall,
};
use tracing::{debug, warn};

use crate::{
    error::{AppError, Result},
    services::pipeline::{PendingTransaction, TransactionOutcome, TransactionPipeline},
    types::CallRequest,
};

/// A contract method parsed from its human-readable signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractMethod {
    function: Function,
}

impl ContractMethod {
    /// Parse a signature like `transfer(address,uint256) returns (bool)`.
    pub fn parse(signature: &str) -> Result<Self> {
        let function = Function::parse(signature).map_err(|e| {
            AppError::Encoding(format!("Invalid method signature {signature}: {e}"))
        })?;
        Ok(Self { function })
    }

    /// Method name.
    pub fn name(&self) -> &str {
        &self.function.name
    }

    /// Four-byte selector.
    pub fn selector(&self) -> Selector {
        self.function.selector()
    }

    /// Encode selector and arguments as calldata.
    ///
    /// Fails with [`AppError::Encoding`] when the argument count or any
    /// argument type differs from the signature.
    pub fn encode_args(&self, args: &[DynSolValue]) -> Result<Bytes> {
        check_args(&self.function.signature(), &self.input_types()?, args)?;
        let data = self
            .function
            .abi_encode_input(args)
            .map_err(|e| AppError::Encoding(format!("{}: {e}", self.name())))?;
        Ok(data.into())
    }

    /// Decode return data according to the declared outputs.
    pub fn decode_output(&self, data: &[u8]) -> Result<Vec<DynSolValue>> {
        self.function
            .abi_decode_output(data)
            .map_err(|e| {
                AppError::Decoding(format!("{} returned {} bytes: {e}", self.name(), data.len()))
            })
    }

    fn input_types(&self) -> Result<Vec<DynSolType>> {
        self.function
            .inputs
            .iter()
            .map(|param| param.resolve().map_err(|e| AppError::Encoding(e.to_string())))
            .collect()
    }
}

fn check_args(context: &str, types: &[DynSolType], args: &[DynSolValue]) -> Result<()> {
    if types.len() != args.len() {
        return Err(AppError::Encoding(format!(
            "{context} expects {} arguments, got {}",
            types.len(),
            args.len()
        )));
    }
    for (index, (ty, value)) in types.iter().zip(args).enumerate() {
        if !ty.matches(value) {
            return Err(AppError::Encoding(format!(
                "{context} argument {index} expects {ty}, got {:?}",
                value.as_type()
            )));
        }
    }
    Ok(())
}

/// Creation code followed by ABI-encoded constructor arguments.
pub fn deployment_code(bytecode: &[u8], constructor_args: &[DynSolValue]) -> Bytes {
    let mut code = bytecode.to_vec();
    if !constructor_args.is_empty() {
        code.extend(DynSolValue::Tuple(constructor_args.to_vec()).abi_encode_params());
    }
    code.into()
}

/// Deploys contracts and calls their methods through a [`TransactionPipeline`].
#[derive(Clone)]
pub struct ContractInvoker {
    pipeline: TransactionPipeline,
}

impl ContractInvoker {
    /// Create an invoker sending from the pipeline's signer.
    pub fn new(pipeline: TransactionPipeline) -> Self {
        Self { pipeline }
    }

    /// The underlying pipeline.
    pub fn pipeline(&self) -> &TransactionPipeline {
        &self.pipeline
    }

    /// Submit a deployment of `bytecode` with `constructor_args`.
    ///
    /// Returns the CREATE address derived from the sender and nonce together
    /// with the pending transaction.
    pub async fn deploy(
        &self,
        bytecode: &[u8],
        constructor_args: &[DynSolValue],
    ) -> Result<(Address, PendingTransaction)> {
        if bytecode.is_empty() {
            return Err(AppError::Encoding("Empty contract bytecode".into()));
        }

        let init_code = deployment_code(bytecode, constructor_args);
        let pending = self.pipeline.submit_deployment(init_code, U256::ZERO).await?;
        let address = pending.signed().from().create(pending.signed().nonce());

        debug!(address = %address, hash = %pending.hash(), "Deployment submitted");
        Ok((address, pending))
    }

    /// Deploy and wait for the receipt.
    ///
    /// The address reported by the receipt wins if it differs from the
    /// derived one.
    pub async fn deploy_and_confirm(
        &self,
        bytecode: &[u8],
        constructor_args: &[DynSolValue],
    ) -> Result<(Address, TransactionOutcome)> {
        let (predicted, mut pending) = self.deploy(bytecode, constructor_args).await?;
        let outcome = self.pipeline.confirm(&mut pending).await?;

        let address = match outcome.receipt.contract_address {
            Some(reported) if reported != predicted => {
                warn!(predicted = %predicted, reported = %reported, "Contract address mismatch");
                reported
            }
            _ => predicted,
        };
        Ok((address, outcome))
    }

    /// Read-only call of `signature` on `contract`. Sends no transaction.
    pub async fn call(
        &self,
        contract: Address,
        signature: &str,
        args: &[DynSolValue],
    ) -> Result<Vec<DynSolValue>> {
        let method = ContractMethod::parse(signature)?;
        let data = self.eth_call(contract, method.encode_args(args)?).await?;
        method.decode_output(&data)
    }

    /// Read-only call with a `sol!`-generated call struct.
    pub async fn call_typed<C>(&self, contract: Address, call: &C) -> Result<C::Return>
    where
        C: SolCall + Sync,
    {
        let data = self.eth_call(contract, call.abi_encode().into()).await?;
        C::abi_decode_returns(&data)
            .map_err(|e| AppError::Decoding(format!("{}: {e}", C::SIGNATURE)))
    }

    /// State-changing call of `signature` on `contract`, waiting for the receipt.
    pub async fn send(
        &self,
        contract: Address,
        signature: &str,
        args: &[DynSolValue],
    ) -> Result<TransactionOutcome> {
        let method = ContractMethod::parse(signature)?;
        let data = method.encode_args(args)?;
        self.pipeline.send_call(contract, data, U256::ZERO).await
    }

    /// State-changing call with a `sol!`-generated call struct.
    pub async fn send_typed<C>(&self, contract: Address, call: &C) -> Result<TransactionOutcome>
    where
        C: SolCall + Sync,
    {
        self.pipeline.send_call(contract, call.abi_encode().into(), U256::ZERO).await
    }

    async fn eth_call(&self, contract: Address, data: Bytes) -> Result<Bytes> {
        let request = CallRequest {
            from: Some(self.pipeline.sender()),
            to: Some(contract),
            value: U256::ZERO,
            data,
        };
        self.pipeline.client().call(&request).await
    }
}
