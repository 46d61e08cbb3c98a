//! Several contract calls in one transaction.
//!
//! A batch becomes a single envelope: one simulation, one classification,
//! one signature and one submission cover every call in it. If the envelope
//! fails simulation, none of its calls are signed or submitted. A batch
//! holding any write takes the write path as a whole, so reads batched with
//! a write are submitted too.

use crate::api::AccountInfo;
use crate::error::{StellarError, StellarResult};
use crate::transaction::builder::{ExtraOperation, TransactionBuilder};
use crate::transaction::call::{joined_method_names, ContractCall};
use flash_stellar_types::transaction::{InvokeHostFunctionOp, MAX_OPS_PER_TX};
use flash_stellar_types::{Operation, OperationBody, ScAddress, Transaction};
use std::time::Duration;

/// Ordered contract calls, followed by ordered extra operations.
///
/// # Example
///
/// ```rust
/// use flash_stellar_sdk::transaction::{Arg, Batch, ContractCall, ExtraOperation};
///
/// let wallet = "GA7QYNF7SOWQ3GLR2BGMZEHXAVIRZA4KVWLTJJFC7MGXUA74P7UJVSGZ";
/// let batch = Batch::new()
///     .call(ContractCall::for_wallet(wallet, "approve", vec![Arg::i128(1_000)]))
///     .call(ContractCall::for_wallet(wallet, "deposit", vec![Arg::i128(1_000)]))
///     .extra(ExtraOperation::change_trust("USDC", wallet, i64::MAX).unwrap());
/// assert_eq!(batch.label(), "approve+deposit");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    calls: Vec<ContractCall>,
    extras: Vec<ExtraOperation>,
}

impl Batch {
    /// An empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// A batch of the given calls.
    pub fn of(calls: impl IntoIterator<Item = ContractCall>) -> Self {
        Self {
            calls: calls.into_iter().collect(),
            extras: Vec::new(),
        }
    }

    /// Appends a contract call.
    #[must_use]
    pub fn call(mut self, call: ContractCall) -> Self {
        self.calls.push(call);
        self
    }

    /// Appends an operation to run after every contract call.
    #[must_use]
    pub fn extra(mut self, extra: ExtraOperation) -> Self {
        self.extras.push(extra);
        self
    }

    /// Appends several extra operations.
    #[must_use]
    pub fn extras(mut self, extras: impl IntoIterator<Item = ExtraOperation>) -> Self {
        self.extras.extend(extras);
        self
    }

    /// The contract calls, in order.
    pub fn calls(&self) -> &[ContractCall] {
        &self.calls
    }

    /// The extra operations, in order.
    pub fn extra_operations(&self) -> &[ExtraOperation] {
        &self.extras
    }

    /// Method names joined with `+`, used to label errors and logs.
    pub fn label(&self) -> String {
        joined_method_names(&self.calls)
    }

    /// Encodes every operation, without touching the network.
    ///
    /// # Errors
    ///
    /// Returns [`StellarError::Encoding`] for the first argument that does
    /// not fit its type, and [`StellarError::Configuration`] when the batch
    /// has no contract call or too many operations.
    pub fn operations(&self, contract: &ScAddress) -> StellarResult<Vec<Operation>> {
        if self.calls.is_empty() {
            return Err(StellarError::Configuration(
                "a batch needs at least one contract call".into(),
            ));
        }
        let total = self.calls.len() + self.extras.len();
        if total > MAX_OPS_PER_TX {
            return Err(StellarError::Configuration(format!(
                "batch {} has {total} operations; at most {MAX_OPS_PER_TX} are allowed",
                self.label()
            )));
        }

        let mut operations = Vec::with_capacity(total);
        for call in &self.calls {
            let invoke = call.to_invoke_args(contract)?;
            operations.push(Operation::new(OperationBody::InvokeHostFunction(
                InvokeHostFunctionOp {
                    invoke,
                    auth: Vec::new(),
                },
            )));
        }
        for extra in &self.extras {
            operations.push(extra.to_operation()?);
        }
        Ok(operations)
    }
}

impl From<ContractCall> for Batch {
    fn from(call: ContractCall) -> Self {
        Self::of([call])
    }
}

/// Builds the unsigned transaction for already encoded operations.
pub(crate) fn build_transaction(
    account: &AccountInfo,
    operations: Vec<Operation>,
    fee_per_operation: u32,
    timeout: Duration,
) -> StellarResult<Transaction> {
    let mut builder = TransactionBuilder::new(account)?
        .fee_per_operation(fee_per_operation)
        .timeout(timeout);
    for operation in operations {
        builder = builder.add_operation(operation);
    }
    builder.build()
}
