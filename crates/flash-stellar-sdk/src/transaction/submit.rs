//! Submission of signed transactions and polling for their outcome.
//!
//! After `sendTransaction` accepts an envelope, its status is polled with
//! `getTransaction` until it is applied or fails. Nodes and SDKs of
//! different vintages render results differently, so two tolerances apply:
//!
//! - a status response that does not parse with a schema-mismatch signature
//!   is retried once after a delay;
//! - the return value of a successful transaction is read by trying an
//!   ordered list of [`ReturnValueStrategy`]s, each logged by name when it
//!   succeeds. When none applies the raw status is returned as
//!   [`ExtractedValue::Unparsed`].
//!
//! If the status stays unreadable while the node never says the
//! transaction failed, success is presumed after a configured number of
//! polls and reported as [`TransactionOutcome::Presumed`], with a warning.
//! Such an outcome is not a confirmation; re-check it with `getTransaction`.

use crate::api::{GetTransactionResponse, SendTransactionStatus, SorobanRpc, TransactionStatus};
use crate::config::PollConfig;
use crate::error::{StellarError, StellarResult};
use crate::transaction::response::{ExtractedValue, TransactionOutcome};
use flash_stellar_types::xdr::XdrReader;
use flash_stellar_types::{to_native, ReadXdr, ScVal};
use serde_json::Value;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// One way of reading a return value from a `getTransaction` result.
#[derive(Debug, Clone, Copy)]
pub struct ReturnValueStrategy {
    /// Name logged when the strategy succeeds
    pub name: &'static str,
    /// Returns the value as plain JSON, or `None` when it does not apply
    pub extract: fn(&GetTransactionResponse) -> Option<Value>,
}

/// Return value strategies, in the order they are tried.
pub const RETURN_VALUE_STRATEGIES: &[ReturnValueStrategy] = &[
    ReturnValueStrategy {
        name: "return_value_field",
        extract: from_return_value_field,
    },
    ReturnValueStrategy {
        name: "soroban_meta",
        extract: from_soroban_meta,
    },
    ReturnValueStrategy {
        name: "shape_scan",
        extract: from_shape_scan,
    },
];

const SHAPE_SCAN_KEYS: &[&str] = &["returnValue", "return_value", "result"];
const SHAPE_SCAN_DEPTH: usize = 6;

/// Reads the return value of a successful transaction.
pub fn extract_return_value(response: &GetTransactionResponse) -> ExtractedValue {
    for strategy in RETURN_VALUE_STRATEGIES {
        if let Some(value) = (strategy.extract)(response) {
            debug!(strategy = strategy.name, "Extracted return value");
            return ExtractedValue::Decoded {
                strategy: strategy.name,
                value,
            };
        }
    }
    warn!("No return value strategy applied; returning the raw transaction status");
    ExtractedValue::Unparsed {
        status: response.raw.clone(),
    }
}

/// Decodes a contract value sent as JSON or as base64 XDR.
fn decode_sc_val(value: &Value) -> Option<ScVal> {
    if let Ok(sc_val) = ScVal::from_json(value) {
        return Some(sc_val);
    }
    value
        .as_str()
        .and_then(|encoded| ScVal::from_xdr_base64(encoded).ok())
}

fn from_return_value_field(response: &GetTransactionResponse) -> Option<Value> {
    response
        .return_value
        .as_ref()
        .and_then(decode_sc_val)
        .map(|sc_val| to_native(&sc_val))
}

fn from_soroban_meta(response: &GetTransactionResponse) -> Option<Value> {
    let meta = response.result_meta_json.as_ref()?;
    ["v4", "v3"]
        .iter()
        .filter_map(|version| meta.get(version))
        .filter_map(|versioned| versioned.get("soroban_meta"))
        .filter_map(|soroban| soroban.get("return_value"))
        .find_map(decode_sc_val)
        .map(|sc_val| to_native(&sc_val))
}

fn from_shape_scan(response: &GetTransactionResponse) -> Option<Value> {
    let mut frontier = vec![&response.raw];
    for _ in 0..SHAPE_SCAN_DEPTH {
        let mut next = Vec::new();
        for node in frontier {
            match node {
                Value::Object(map) => {
                    for key in SHAPE_SCAN_KEYS {
                        if let Some(sc_val) = map.get(*key).and_then(decode_sc_val) {
                            return Some(to_native(&sc_val));
                        }
                    }
                    next.extend(map.values());
                }
                Value::Array(items) => next.extend(items),
                _ => {}
            }
        }
        if next.is_empty() {
            break;
        }
        frontier = next;
    }
    None
}

/// Names the result code inside a base64 `TransactionResult`.
fn result_code_name(result_xdr: &str) -> Option<&'static str> {
    let bytes = base64::decode(result_xdr.trim()).ok()?;
    let mut r = XdrReader::new(&bytes);
    r.read_i64().ok()?;
    Some(match r.read_i32().ok()? {
        1 => "txFEE_BUMP_INNER_SUCCESS",
        0 => "txSUCCESS",
        -1 => "txFAILED",
        -2 => "txTOO_EARLY",
        -3 => "txTOO_LATE",
        -4 => "txMISSING_OPERATION",
        -5 => "txBAD_SEQ",
        -6 => "txBAD_AUTH",
        -7 => "txINSUFFICIENT_BALANCE",
        -8 => "txNO_ACCOUNT",
        -9 => "txINSUFFICIENT_FEE",
        -10 => "txBAD_AUTH_EXTRA",
        -11 => "txINTERNAL_ERROR",
        -12 => "txNOT_SUPPORTED",
        -13 => "txFEE_BUMP_INNER_FAILED",
        -14 => "txBAD_SPONSORSHIP",
        -15 => "txBAD_MIN_SEQ_AGE_OR_GAP",
        -16 => "txMALFORMED",
        -17 => "txSOROBAN_INVALID",
        _ => return None,
    })
}

/// The result code and result XDR, as reported by the node.
fn result_diagnostic(result_xdr: Option<&str>, result_json: Option<&Value>) -> String {
    match (result_xdr, result_json) {
        (_, Some(json)) => json.to_string(),
        (Some(xdr), None) => match result_code_name(xdr) {
            Some(code) => format!("{code}: {xdr}"),
            None => xdr.to_string(),
        },
        (None, None) => String::new(),
    }
}

enum PollStep {
    Done(TransactionOutcome),
    Pending,
    Unresolved,
}

/// Submits signed envelopes and waits for their outcome.
#[derive(Debug, Clone)]
pub struct Submitter<R> {
    rpc: R,
    poll: PollConfig,
    cancel: Option<CancellationToken>,
}

impl<R: SorobanRpc> Submitter<R> {
    /// Creates a submitter polling as configured by `poll`.
    pub fn new(rpc: R, poll: PollConfig) -> Self {
        Self {
            rpc,
            poll,
            cancel: None,
        }
    }

    /// Stops waiting with [`StellarError::Cancelled`] when `token` fires.
    ///
    /// Cancelling only abandons the wait; a submitted transaction may still
    /// be applied.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Sends a signed envelope and returns its hash.
    ///
    /// # Errors
    ///
    /// Returns [`StellarError::Submission`] when the node answers
    /// `TRY_AGAIN_LATER` or `ERROR`, carrying its result code.
    pub async fn submit(&self, signed_xdr: &str, method: &str) -> StellarResult<String> {
        let response = self.rpc.send_transaction(signed_xdr).await?;
        match response.status {
            SendTransactionStatus::Pending | SendTransactionStatus::Duplicate => {
                info!(
                    method = %method,
                    txn_hash = %response.hash,
                    status = response.status.as_str(),
                    "Transaction submitted"
                );
                Ok(response.hash)
            }
            SendTransactionStatus::TryAgainLater | SendTransactionStatus::Error => {
                Err(StellarError::Submission {
                    method: method.to_string(),
                    status: response.status.as_str().to_string(),
                    diagnostic: result_diagnostic(response.error_result_xdr.as_deref(), None),
                })
            }
        }
    }

    /// Polls `hash` until the transaction is applied, fails, or waiting ends.
    ///
    /// # Errors
    ///
    /// Returns [`StellarError::Submission`] if it failed on chain,
    /// [`StellarError::PollTimeout`] when the configured limits are reached,
    /// and [`StellarError::Cancelled`] when cancelled.
    pub async fn wait_for_transaction(&self, hash: &str, method: &str) -> StellarResult<TransactionOutcome> {
        let started = Instant::now();
        let mut attempts = 0u32;
        let mut unresolved = 0u32;

        loop {
            if self.poll.max_attempts.is_some_and(|max| attempts >= max) {
                return Err(self.timeout(hash, method, started, attempts));
            }
            self.pause(self.poll.interval, hash, method).await?;
            attempts += 1;

            match self.poll_once(hash, method).await? {
                PollStep::Done(outcome) => return Ok(outcome),
                PollStep::Pending => {
                    // the node answered cleanly, so the presumption window starts over
                    unresolved = 0;
                    debug!(txn_hash = %hash, attempts, "Transaction not found yet");
                }
                PollStep::Unresolved => {
                    unresolved += 1;
                    if unresolved >= self.poll.presume_success_after {
                        warn!(
                            method = %method,
                            txn_hash = %hash,
                            attempts,
                            "TRANSACTION STATUS UNCONFIRMED: status responses could not be read; \
                             presuming success. The transaction may not have been applied; \
                             re-verify it before relying on this result"
                        );
                        return Ok(TransactionOutcome::Presumed {
                            hash: hash.to_string(),
                        });
                    }
                }
            }

            if self
                .poll
                .max_duration
                .is_some_and(|max| started.elapsed() >= max)
            {
                return Err(self.timeout(hash, method, started, attempts));
            }
        }
    }

    /// Submits a signed envelope and waits for its outcome.
    ///
    /// # Errors
    ///
    /// As for [`Submitter::submit`] and [`Submitter::wait_for_transaction`].
    pub async fn submit_and_wait(&self, signed_xdr: &str, method: &str) -> StellarResult<TransactionOutcome> {
        let hash = self.submit(signed_xdr, method).await?;
        self.wait_for_transaction(&hash, method).await
    }

    async fn poll_once(&self, hash: &str, method: &str) -> StellarResult<PollStep> {
        let response = match self.rpc.get_transaction(hash).await {
            Ok(response) => response,
            Err(e) if e.is_format_mismatch() => {
                warn!(
                    txn_hash = %hash,
                    error = %e,
                    delay_ms = self.poll.format_retry_delay.as_millis() as u64,
                    "Transaction status did not parse; retrying once"
                );
                self.pause(self.poll.format_retry_delay, hash, method).await?;
                match self.rpc.get_transaction(hash).await {
                    Ok(response) => response,
                    Err(e) if e.is_format_mismatch() => return passthrough(e, hash, method),
                    Err(e) => return Err(e),
                }
            }
            Err(e) => return Err(e),
        };

        match response.status {
            TransactionStatus::Success => {
                let value = extract_return_value(&response);
                info!(
                    method = %method,
                    txn_hash = %hash,
                    ledger = response.ledger,
                    "Transaction confirmed"
                );
                Ok(PollStep::Done(TransactionOutcome::Confirmed {
                    hash: hash.to_string(),
                    ledger: response.ledger,
                    value,
                }))
            }
            TransactionStatus::Failed => Err(StellarError::Submission {
                method: method.to_string(),
                status: TransactionStatus::Failed.as_str().to_string(),
                diagnostic: result_diagnostic(
                    response.result_xdr.as_deref(),
                    response.result_json.as_ref(),
                ),
            }),
            TransactionStatus::NotFound => Ok(PollStep::Pending),
        }
    }

    async fn pause(&self, delay: Duration, hash: &str, method: &str) -> StellarResult<()> {
        match &self.cancel {
            Some(token) => tokio::select! {
                biased;
                () = token.cancelled() => Err(StellarError::Cancelled {
                    method: method.to_string(),
                    hash: hash.to_string(),
                }),
                () = sleep(delay) => Ok(()),
            },
            None => {
                sleep(delay).await;
                Ok(())
            }
        }
    }

    fn timeout(&self, hash: &str, method: &str, started: Instant, attempts: u32) -> StellarError {
        StellarError::PollTimeout {
            method: method.to_string(),
            hash: hash.to_string(),
            elapsed_secs: started.elapsed().as_secs(),
            attempts,
        }
    }
}

/// Handles a status that failed to parse twice, using whatever status the
/// raw response still shows.
fn passthrough(error: StellarError, hash: &str, method: &str) -> StellarResult<PollStep> {
    let raw = match &error {
        StellarError::ResponseParsing { raw: Some(raw), .. } => Some(raw),
        _ => None,
    };

    match raw.and_then(GetTransactionResponse::raw_status) {
        Some("SUCCESS") => {
            let Some(raw) = raw else {
                return Err(error);
            };
            warn!(
                method = %method,
                txn_hash = %hash,
                "Transaction succeeded but its status did not parse; returning the raw status"
            );
            Ok(PollStep::Done(TransactionOutcome::Confirmed {
                hash: hash.to_string(),
                ledger: raw
                    .get("ledger")
                    .and_then(Value::as_u64)
                    .and_then(|ledger| u32::try_from(ledger).ok()),
                value: ExtractedValue::Unparsed { status: raw.clone() },
            }))
        }
        Some("FAILED") => {
            let raw = raw.map(|raw| {
                result_diagnostic(
                    raw.get("resultXdr").and_then(Value::as_str),
                    raw.get("resultJson"),
                )
            });
            Err(StellarError::Submission {
                method: method.to_string(),
                status: "FAILED".into(),
                diagnostic: raw.unwrap_or_default(),
            })
        }
        Some("NOT_FOUND") | None => {
            warn!(txn_hash = %hash, error = %error, "Transaction status still unreadable");
            Ok(PollStep::Unresolved)
        }
        Some(_) => Err(error),
    }
}
