//! Error types for the Stellar SDK.
//!
//! This module provides a unified error type [`StellarError`] covering every
//! failure of the contract-call pipeline, from argument encoding to polling.
//! Variants raised for a specific call carry the contract method name, and
//! variants raised by the node carry its diagnostic verbatim.

use flash_stellar_types::{StrKeyError, XdrError};
use thiserror::Error;

/// A specialized Result type for Stellar SDK operations.
pub type StellarResult<T> = Result<T, StellarError>;

/// The main error type for the Stellar SDK.
#[derive(Error, Debug)]
pub enum StellarError {
    /// Error occurred during HTTP communication
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Error occurred during JSON serialization/deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error occurred during URL parsing
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Error occurred while encoding or decoding XDR
    #[error("XDR error: {0}")]
    Xdr(#[from] XdrError),

    /// Invalid StrKey address or secret
    #[error("StrKey error: {0}")]
    StrKey(#[from] StrKeyError),

    /// An argument value cannot be represented as its declared type
    #[error("Encoding error in {method}: {message}")]
    Encoding {
        /// Contract method being encoded
        method: String,
        /// What was wrong with the argument
        message: String,
    },

    /// The source account could not be loaded
    #[error("Account lookup failed for {account}: {message}")]
    AccountLookup {
        /// The account that was looked up
        account: String,
        /// Why the lookup failed
        message: String,
    },

    /// The dry run was rejected by the node
    #[error("Simulation of {method} failed: {diagnostic}")]
    Simulation {
        /// Contract method (batches join names with `+`)
        method: String,
        /// Node-provided diagnostic, untouched
        diagnostic: String,
    },

    /// The simulation read and wrote no storage, so the call cannot be classified
    #[error("Simulation of {method} touched no storage; cannot classify it as read-only or write")]
    AmbiguousFootprint {
        /// Contract method (batches join names with `+`)
        method: String,
    },

    /// Resource preparation was rejected
    #[error("Preparation of {method} failed: {message}")]
    Preparation {
        /// Contract method (batches join names with `+`)
        method: String,
        /// Node diagnostic or local reason
        message: String,
    },

    /// A write was attempted without a signer, or the client is misconfigured
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The external signer rejected or failed
    #[error("Signing of {method} failed: {source}")]
    Signing {
        /// Contract method (batches join names with `+`)
        method: String,
        /// The signer's own error
        #[source]
        source: anyhow::Error,
    },

    /// The node rejected the signed transaction, or it failed on chain
    #[error("Submission of {method} failed with status {status}: {diagnostic}")]
    Submission {
        /// Contract method, empty for pre-signed payloads
        method: String,
        /// Node status (`ERROR`, `TRY_AGAIN_LATER`, `FAILED`)
        status: String,
        /// Result code or result XDR from the node, untouched
        diagnostic: String,
    },

    /// A node response did not have the expected shape
    #[error("Failed to parse response: {message}")]
    ResponseParsing {
        /// What could not be parsed
        message: String,
        /// The raw response, when one was received
        raw: Option<serde_json::Value>,
    },

    /// The network identifier is not one the SDK knows
    #[error("Unsupported network: {0}")]
    UnsupportedNetwork(String),

    /// Polling reached its configured limit without a terminal status
    #[error(
        "Transaction {hash}{} not final after {elapsed_secs} seconds ({attempts} polls)",
        of_method(.method)
    )]
    PollTimeout {
        /// Contract method, empty for pre-signed payloads
        method: String,
        /// Hash of the submitted transaction
        hash: String,
        /// Time spent polling
        elapsed_secs: u64,
        /// Number of polls made
        attempts: u32,
    },

    /// Waiting was cancelled by the caller; the transaction may still land
    #[error("Waiting for transaction {hash}{} was cancelled", of_method(.method))]
    Cancelled {
        /// Contract method, empty for pre-signed payloads
        method: String,
        /// Hash of the submitted transaction
        hash: String,
    },

    /// The JSON-RPC endpoint returned an error object
    #[error("RPC error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code
        code: i64,
        /// JSON-RPC error message
        message: String,
        /// Optional error data
        data: Option<serde_json::Value>,
    },

    /// The RPC endpoint returned a non-success HTTP status
    #[error("API error ({status_code}): {message}")]
    Api {
        /// HTTP status code
        status_code: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// An error with no method of its own, raised while running a contract call
    #[error("{method}: {source}")]
    Call {
        /// Contract method (batches join names with `+`)
        method: String,
        /// What went wrong
        #[source]
        source: Box<StellarError>,
    },
}

fn of_method(method: &str) -> String {
    if method.is_empty() {
        String::new()
    } else {
        format!(" of {method}")
    }
}

/// Maximum length for error messages to prevent excessive memory usage in logs.
const MAX_ERROR_MESSAGE_LENGTH: usize = 1000;

/// Patterns that might indicate sensitive information in error messages.
const SENSITIVE_PATTERNS: &[&str] = &[
    "private_key",
    "secret",
    "password",
    "seed",
    "bearer",
    "authorization",
];

/// Message fragments produced when a node response uses a newer schema than
/// the decoder expects.
const FORMAT_MISMATCH_SIGNATURES: &[&str] = &[
    "union switch",
    "bad union",
    "unknown variant",
    "discriminant",
    "invalid type",
    "missing field",
    "xdr",
];

impl StellarError {
    /// Creates a new encoding error.
    pub fn encoding(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Encoding {
            method: method.into(),
            message: message.into(),
        }
    }

    /// Creates a new response parsing error without a raw body.
    pub fn parsing(message: impl Into<String>) -> Self {
        Self::ResponseParsing {
            message: message.into(),
            raw: None,
        }
    }

    /// Creates a new API error from response details.
    pub fn api(status_code: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status_code,
            message: message.into(),
        }
    }

    /// Attributes this error to the contract method `name`.
    ///
    /// Variants with a method field get it filled in when it is still empty.
    /// Any other error is wrapped in [`StellarError::Call`]. An error that
    /// already names a method is returned unchanged.
    pub fn with_method(mut self, name: &str) -> Self {
        if let Some(method) = self.method_slot() {
            if method.is_empty() {
                *method = name.to_string();
            }
            return self;
        }
        if name.is_empty() {
            return self;
        }
        Self::Call {
            method: name.to_string(),
            source: Box::new(self),
        }
    }

    fn method_slot(&mut self) -> Option<&mut String> {
        match self {
            Self::Encoding { method, .. }
            | Self::Simulation { method, .. }
            | Self::AmbiguousFootprint { method }
            | Self::Preparation { method, .. }
            | Self::Signing { method, .. }
            | Self::Submission { method, .. }
            | Self::PollTimeout { method, .. }
            | Self::Cancelled { method, .. }
            | Self::Call { method, .. } => Some(method),
            _ => None,
        }
    }

    /// Returns the contract method this error is about, if any.
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Encoding { method, .. }
            | Self::Simulation { method, .. }
            | Self::AmbiguousFootprint { method }
            | Self::Preparation { method, .. }
            | Self::Signing { method, .. }
            | Self::Submission { method, .. }
            | Self::PollTimeout { method, .. }
            | Self::Cancelled { method, .. }
            | Self::Call { method, .. }
                if !method.is_empty() =>
            {
                Some(method.as_str())
            }
            _ => None,
        }
    }

    /// Returns the underlying error, looking through [`StellarError::Call`].
    pub fn root(&self) -> &StellarError {
        match self {
            Self::Call { source, .. } => source.root(),
            other => other,
        }
    }

    /// Returns true if this is a transient error that might succeed on retry
    pub fn is_retryable(&self) -> bool {
        match self.root() {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status_code, .. } => {
                matches!(status_code, 408 | 429 | 500 | 502 | 503 | 504)
            }
            _ => false,
        }
    }

    /// Returns true if this looks like a response decoded against the wrong
    /// schema version, rather than a genuine failure.
    pub fn is_format_mismatch(&self) -> bool {
        let message = match self.root() {
            Self::ResponseParsing { message, .. } => message.to_lowercase(),
            Self::Json(e) => e.to_string().to_lowercase(),
            Self::Xdr(_) => return true,
            _ => return false,
        };
        FORMAT_MISMATCH_SIGNATURES
            .iter()
            .any(|signature| message.contains(signature))
    }

    /// Returns true if the outcome of an already submitted transaction is unknown.
    pub fn is_unconfirmed(&self) -> bool {
        matches!(self.root(), Self::PollTimeout { .. } | Self::Cancelled { .. })
    }

    /// Returns a sanitized version of the error message safe for logging.
    ///
    /// Control characters are stripped, messages that look like they carry
    /// secrets are redacted and long messages are truncated.
    ///
    /// # Example
    ///
    /// ```rust
    /// use flash_stellar_sdk::StellarError;
    ///
    /// let err = StellarError::api(500, "Internal server error with details...");
    /// let safe_msg = err.sanitized_message();
    /// assert!(safe_msg.len() <= 1100);
    /// ```
    pub fn sanitized_message(&self) -> String {
        let raw_message = self.to_string();
        Self::sanitize_string(&raw_message)
    }

    fn sanitize_string(s: &str) -> String {
        let cleaned: String = s
            .chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
            .collect();

        let lower = cleaned.to_lowercase();
        for pattern in SENSITIVE_PATTERNS {
            if lower.contains(pattern) {
                return format!("[REDACTED: message contained sensitive pattern '{pattern}']");
            }
        }

        if cleaned.len() > MAX_ERROR_MESSAGE_LENGTH {
            let mut cut = MAX_ERROR_MESSAGE_LENGTH;
            while !cleaned.is_char_boundary(cut) {
                cut -= 1;
            }
            format!(
                "{}... [truncated, total length: {}]",
                &cleaned[..cut],
                cleaned.len()
            )
        } else {
            cleaned
        }
    }

    /// Returns the error message suitable for display to end users.
    pub fn user_message(&self) -> &'static str {
        match self.root() {
            Self::Http(_) => "Network error occurred",
            Self::Json(_) => "Failed to process response",
            Self::Url(_) => "Invalid URL",
            Self::Xdr(_) => "Failed to process ledger data",
            Self::StrKey(_) => "Invalid address or key",
            Self::Encoding { .. } => "Invalid contract argument",
            Self::AccountLookup { .. } => "Account not found",
            Self::Simulation { .. } => "Contract call was rejected",
            Self::AmbiguousFootprint { .. } => "Contract call could not be classified",
            Self::Preparation { .. } => "Transaction preparation failed",
            Self::Configuration(_) => "Configuration error",
            Self::Signing { .. } => "Transaction signing failed",
            Self::Submission { .. } => "Transaction submission failed",
            Self::ResponseParsing { .. } => "Failed to process response",
            Self::UnsupportedNetwork(_) => "Unsupported network",
            Self::PollTimeout { .. } => "Transaction confirmation timed out",
            Self::Cancelled { .. } => "Transaction confirmation was cancelled",
            Self::Rpc { .. } => "RPC error",
            Self::Api {
                status_code: 429, ..
            } => "Rate limit exceeded",
            Self::Api { status_code, .. } if *status_code >= 500 => "Server error",
            Self::Api { .. } => "API error",
            Self::Call { .. } => "Contract call failed",
        }
    }
}
