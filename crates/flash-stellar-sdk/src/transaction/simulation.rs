//! Simulation results and read/write classification.
//!
//! A simulation is a dry run of the built transaction against current
//! ledger state. Its footprint decides what happens next: a call that only
//! reads storage ends with the simulated return value; a call that writes
//! goes on to preparation, signing and submission.

use crate::api::SimulateTransactionResponse;
use crate::error::{StellarError, StellarResult};
use flash_stellar_types::{
    to_native, LedgerFootprint, ReadXdr, ScVal, SorobanTransactionData, XdrError,
};
use serde_json::Value;

/// How a simulated call touches storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    /// Reads storage and writes nothing; no transaction is submitted.
    ReadOnly,
    /// Writes storage; must be prepared, signed and submitted.
    Write,
}

impl CallKind {
    /// Whether the call is read-only.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::ReadOnly)
    }
}

/// Classifies a footprint.
///
/// Read-only when something is read and nothing is written, a write when
/// anything is written.
///
/// # Errors
///
/// Returns [`StellarError::AmbiguousFootprint`] when nothing is read or
/// written.
pub fn classify_footprint(method: &str, footprint: &LedgerFootprint) -> StellarResult<CallKind> {
    match (footprint.read_only.is_empty(), footprint.read_write.is_empty()) {
        (false, true) => Ok(CallKind::ReadOnly),
        (_, false) => Ok(CallKind::Write),
        (true, true) => Err(StellarError::AmbiguousFootprint {
            method: method.to_string(),
        }),
    }
}

/// Decoded result of one simulated invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedInvocation {
    /// Encoded authorization entries to attach to the operation
    pub auth: Vec<Vec<u8>>,
    /// Return value; `None` when the node sent none
    pub return_value: Option<ScVal>,
}

/// A successful simulation, decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Simulation {
    method: String,
    transaction_data: Option<SorobanTransactionData>,
    min_resource_fee: u64,
    invocations: Vec<SimulatedInvocation>,
    needs_restore: bool,
    latest_ledger: u32,
}

impl Simulation {
    /// Decodes a `simulateTransaction` result for `method`.
    ///
    /// # Errors
    ///
    /// Returns [`StellarError::Simulation`] with the node diagnostic if the
    /// dry run failed, or [`StellarError::ResponseParsing`] if the result
    /// holds undecodable XDR.
    pub fn from_response(method: &str, response: SimulateTransactionResponse) -> StellarResult<Self> {
        if let Some(diagnostic) = response.error {
            return Err(StellarError::Simulation {
                method: method.to_string(),
                diagnostic,
            });
        }

        let undecodable = |field: &str, e: XdrError| {
            StellarError::parsing(format!("simulateTransaction {field} for {method}: {e}"))
        };

        let transaction_data = response
            .transaction_data
            .as_deref()
            .filter(|encoded| !encoded.is_empty())
            .map(SorobanTransactionData::from_xdr_base64)
            .transpose()
            .map_err(|e| undecodable("transactionData", e))?;

        let invocations = response
            .results
            .unwrap_or_default()
            .into_iter()
            .map(|result| {
                let auth = result
                    .auth
                    .iter()
                    .map(|entry| base64::decode(entry.trim()).map_err(XdrError::from))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| undecodable("auth", e))?;
                let return_value = if result.xdr.is_empty() {
                    None
                } else {
                    Some(ScVal::from_xdr_base64(&result.xdr).map_err(|e| undecodable("xdr", e))?)
                };
                Ok(SimulatedInvocation { auth, return_value })
            })
            .collect::<StellarResult<Vec<_>>>()?;

        Ok(Self {
            method: method.to_string(),
            transaction_data,
            min_resource_fee: response.min_resource_fee.unwrap_or_default(),
            invocations,
            needs_restore: response.restore_preamble.is_some(),
            latest_ledger: response.latest_ledger,
        })
    }

    /// Classifies the simulated call by its footprint.
    ///
    /// # Errors
    ///
    /// Returns [`StellarError::AmbiguousFootprint`] when the call touched no
    /// storage.
    pub fn classify(&self) -> StellarResult<CallKind> {
        let empty = LedgerFootprint::default();
        let footprint = self
            .transaction_data
            .as_ref()
            .map_or(&empty, SorobanTransactionData::footprint);
        classify_footprint(&self.method, footprint)
    }

    /// The method (or `+`-joined methods) that was simulated.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Resource data to attach to the transaction.
    pub fn transaction_data(&self) -> Option<&SorobanTransactionData> {
        self.transaction_data.as_ref()
    }

    /// Resource fee to add on top of the inclusion fee.
    pub fn min_resource_fee(&self) -> u64 {
        self.min_resource_fee
    }

    /// Per-invocation results, in operation order.
    pub fn invocations(&self) -> &[SimulatedInvocation] {
        &self.invocations
    }

    /// Whether archived entries must be restored before the call can run.
    pub fn needs_restore(&self) -> bool {
        self.needs_restore
    }

    /// Latest ledger at simulation time.
    pub fn latest_ledger(&self) -> u32 {
        self.latest_ledger
    }

    /// The simulated return values, in operation order.
    pub fn return_values(&self) -> Vec<&ScVal> {
        self.invocations
            .iter()
            .filter_map(|invocation| invocation.return_value.as_ref())
            .collect()
    }

    /// The return value as plain JSON.
    ///
    /// A single invocation yields its value, several yield an array, and
    /// none yields `null`.
    pub fn native_return_value(&self) -> Value {
        let mut values = self.return_values();
        match values.len() {
            0 => Value::Null,
            1 => to_native(values.remove(0)),
            _ => Value::Array(values.into_iter().map(to_native).collect()),
        }
    }
}
