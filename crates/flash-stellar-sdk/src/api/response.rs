//! Soroban RPC request and response types.

use crate::error::{StellarError, StellarResult};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct JsonRpcRequest<'a> {
    pub(crate) jsonrpc: &'static str,
    pub(crate) id: u64,
    pub(crate) method: &'a str,
    pub(crate) params: Value,
}

/// A JSON-RPC 2.0 response; exactly one of `result` and `error` is set.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct JsonRpcResponse {
    #[serde(default)]
    pub(crate) result: Option<Value>,
    #[serde(default)]
    pub(crate) error: Option<JsonRpcError>,
}

/// The error object of a JSON-RPC response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct JsonRpcError {
    pub(crate) code: i64,
    pub(crate) message: String,
    #[serde(default)]
    pub(crate) data: Option<Value>,
}

impl From<JsonRpcError> for StellarError {
    fn from(err: JsonRpcError) -> Self {
        StellarError::Rpc {
            code: err.code,
            message: err.message,
            data: err.data,
        }
    }
}

/// Accepts an unsigned integer sent either as a JSON number or a decimal string.
fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        String(String),
    }

    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(n)) => Ok(Some(n)),
        Some(NumberOrString::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Source account state needed to build a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    /// `G...` account id
    pub account_id: String,
    /// Current sequence number; the next transaction uses this plus one
    pub sequence: i64,
}

/// One entry of a `getLedgerEntries` result.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntryResult {
    /// Base64 `LedgerKey`
    pub key: String,
    /// Base64 `LedgerEntryData`
    pub xdr: String,
    /// Ledger of the last modification
    #[serde(default)]
    pub last_modified_ledger_seq: Option<u32>,
}

/// Result of `getLedgerEntries`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetLedgerEntriesResponse {
    /// Entries found; absent keys are omitted
    #[serde(default)]
    pub entries: Option<Vec<LedgerEntryResult>>,
    /// Latest ledger known to the node
    #[serde(default)]
    pub latest_ledger: u32,
}

/// Return value and authorization of one simulated host function.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimulateHostFunctionResult {
    /// Base64 `SorobanAuthorizationEntry` values to attach
    #[serde(default)]
    pub auth: Vec<String>,
    /// Base64 `ScVal` return value
    #[serde(default)]
    pub xdr: String,
}

/// Data needed to restore archived entries before the call can run.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestorePreamble {
    /// Base64 `SorobanTransactionData` of the restore
    pub transaction_data: String,
    /// Resource fee of the restore
    #[serde(default, deserialize_with = "lenient_u64")]
    pub min_resource_fee: Option<u64>,
}

/// Result of `simulateTransaction`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateTransactionResponse {
    /// Base64 `SorobanTransactionData` with footprint and resources
    #[serde(default)]
    pub transaction_data: Option<String>,
    /// Resource fee the transaction must add, in stroops
    #[serde(default, deserialize_with = "lenient_u64")]
    pub min_resource_fee: Option<u64>,
    /// One result per host function invocation
    #[serde(default)]
    pub results: Option<Vec<SimulateHostFunctionResult>>,
    /// Diagnostic when the simulation failed
    #[serde(default)]
    pub error: Option<String>,
    /// Present when archived entries must be restored first
    #[serde(default)]
    pub restore_preamble: Option<RestorePreamble>,
    /// Base64 diagnostic events
    #[serde(default)]
    pub events: Option<Vec<String>>,
    /// Latest ledger known to the node
    #[serde(default)]
    pub latest_ledger: u32,
}

/// Status returned by `sendTransaction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SendTransactionStatus {
    /// Accepted into the queue
    Pending,
    /// Already known to the node
    Duplicate,
    /// Node is congested; nothing was queued
    TryAgainLater,
    /// Rejected; see `error_result_xdr`
    Error,
}

impl SendTransactionStatus {
    /// The wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Duplicate => "DUPLICATE",
            Self::TryAgainLater => "TRY_AGAIN_LATER",
            Self::Error => "ERROR",
        }
    }
}

/// Result of `sendTransaction`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTransactionResponse {
    /// Submission status
    pub status: SendTransactionStatus,
    /// Hex transaction hash
    pub hash: String,
    /// Base64 `TransactionResult` when `status` is `ERROR`
    #[serde(default)]
    pub error_result_xdr: Option<String>,
    /// Latest ledger known to the node
    #[serde(default)]
    pub latest_ledger: u32,
}

/// Status returned by `getTransaction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// Applied successfully
    Success,
    /// Not (yet) known to the node
    NotFound,
    /// Applied and failed
    Failed,
}

impl TransactionStatus {
    /// The wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::NotFound => "NOT_FOUND",
            Self::Failed => "FAILED",
        }
    }
}

/// Result of `getTransaction`.
///
/// Metadata fields are kept as untyped JSON because their layout changes
/// between protocol versions; the raw response is kept for fallbacks.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTransactionResponse {
    /// Transaction status
    pub status: TransactionStatus,
    /// Ledger the transaction was applied in
    #[serde(default)]
    pub ledger: Option<u32>,
    /// Base64 `TransactionResult`
    #[serde(default)]
    pub result_xdr: Option<String>,
    /// JSON rendering of `TransactionResult`
    #[serde(default)]
    pub result_json: Option<Value>,
    /// JSON rendering of `TransactionMeta`
    #[serde(default)]
    pub result_meta_json: Option<Value>,
    /// Return value, when the node extracts it
    #[serde(default)]
    pub return_value: Option<Value>,
    /// The response exactly as received
    #[serde(skip)]
    pub raw: Value,
}

impl GetTransactionResponse {
    /// Parses a `getTransaction` result, keeping the raw value.
    ///
    /// # Errors
    ///
    /// Returns [`StellarError::ResponseParsing`] carrying the raw value when
    /// the shape is not understood.
    pub fn from_value(raw: Value) -> StellarResult<Self> {
        match serde_json::from_value::<Self>(raw.clone()) {
            Ok(mut parsed) => {
                parsed.raw = raw;
                Ok(parsed)
            }
            Err(e) => Err(StellarError::ResponseParsing {
                message: format!("getTransaction: {e}"),
                raw: Some(raw),
            }),
        }
    }

    /// The status as a string, read from the raw response.
    ///
    /// Works even when the typed parse failed.
    pub fn raw_status(raw: &Value) -> Option<&str> {
        raw.get("status").and_then(Value::as_str)
    }
}
