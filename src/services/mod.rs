//! Transaction lifecycle services.

pub mod builder;
pub mod contract;
pub mod nonce;
pub mod pipeline;
pub mod query;
pub mod submitter;

pub use builder::{apply_gas_margin, replacement_for, TransactionBuilder};
pub use contract::{ContractInvoker, ContractMethod};
pub use nonce::{NonceGuard, NonceManager};
pub use pipeline::{PendingTransaction, TransactionOutcome, TransactionPipeline};
pub use query::{BalanceInfo, ChainQueryService};
pub use submitter::{Submitter, SubmitterConfig};
