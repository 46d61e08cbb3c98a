//! Outcomes of contract calls.

use serde::Serialize;
use serde_json::Value;

/// How a return value was read from a confirmed transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ExtractedValue {
    /// A strategy found and decoded the return value.
    Decoded {
        /// Name of the strategy that succeeded
        strategy: &'static str,
        /// The value as plain JSON
        value: Value,
    },
    /// No strategy applied; the polled status object is returned as is.
    Unparsed {
        /// The `getTransaction` result as received
        status: Value,
    },
}

impl ExtractedValue {
    /// The decoded value, if a strategy produced one.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Decoded { value, .. } => Some(value),
            Self::Unparsed { .. } => None,
        }
    }
}

/// What is known about a submitted transaction once waiting ends.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum TransactionOutcome {
    /// The node reported the transaction as applied successfully.
    Confirmed {
        /// Hex transaction hash
        hash: String,
        /// Ledger it was applied in, when reported
        ledger: Option<u32>,
        /// Its return value
        value: ExtractedValue,
    },
    /// The status could never be read; success is assumed, not known.
    ///
    /// Re-check with [`crate::ContractClient::transaction_status`] before
    /// relying on the write.
    Presumed {
        /// Hex transaction hash
        hash: String,
    },
}

impl TransactionOutcome {
    /// The transaction hash.
    pub fn hash(&self) -> &str {
        match self {
            Self::Confirmed { hash, .. } | Self::Presumed { hash } => hash,
        }
    }

    /// Whether the node confirmed the outcome.
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed { .. })
    }

    /// The decoded return value of a confirmed transaction.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Confirmed { value, .. } => value.value(),
            Self::Presumed { .. } => None,
        }
    }
}

/// The result carried by a [`ContractMethodResponse`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CallResult {
    /// Return value of a read-only call, from simulation.
    Value(Value),
    /// A prepared write not yet signed: the base64 envelope to sign.
    UnsignedPayload(String),
    /// A write that was signed and submitted.
    Submitted(TransactionOutcome),
}

/// Outcome of one contract call or batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractMethodResponse {
    /// Whether the call succeeded (presumed outcomes count as successes)
    pub is_success: bool,
    /// False only for a write whose success was presumed rather than confirmed
    pub confirmed: bool,
    /// Whether the call was classified read-only
    pub is_read_only: bool,
    /// What the call produced
    pub result: CallResult,
}

impl ContractMethodResponse {
    /// A read-only call's value.
    pub fn read_only(value: Value) -> Self {
        Self {
            is_success: true,
            confirmed: true,
            is_read_only: true,
            result: CallResult::Value(value),
        }
    }

    /// A prepared, unsigned write.
    pub fn unsigned(payload: String) -> Self {
        Self {
            is_success: true,
            confirmed: true,
            is_read_only: false,
            result: CallResult::UnsignedPayload(payload),
        }
    }

    /// A submitted write.
    pub fn submitted(outcome: TransactionOutcome) -> Self {
        Self {
            is_success: true,
            confirmed: outcome.is_confirmed(),
            is_read_only: false,
            result: CallResult::Submitted(outcome),
        }
    }

    /// The decoded value: the simulated value of a read, or the extracted
    /// return value of a confirmed write.
    pub fn value(&self) -> Option<&Value> {
        match &self.result {
            CallResult::Value(value) => Some(value),
            CallResult::UnsignedPayload(_) => None,
            CallResult::Submitted(outcome) => outcome.value(),
        }
    }

    /// The unsigned envelope of a prepared write.
    pub fn unsigned_payload(&self) -> Option<&str> {
        match &self.result {
            CallResult::UnsignedPayload(payload) => Some(payload),
            _ => None,
        }
    }

    /// The outcome of a submitted write.
    pub fn outcome(&self) -> Option<&TransactionOutcome> {
        match &self.result {
            CallResult::Submitted(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// False only for a write whose success was presumed rather than confirmed.
    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_presumed_is_not_confirmed() {
        let response = ContractMethodResponse::submitted(TransactionOutcome::Presumed {
            hash: "ab".into(),
        });
        assert!(response.is_success);
        assert!(!response.is_confirmed());
        assert_eq!(response.outcome().unwrap().hash(), "ab");
        assert!(response.value().is_none());
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "isSuccess": true,
                "confirmed": false,
                "isReadOnly": false,
                "result": { "outcome": "presumed", "hash": "ab" }
            })
        );
    }

    #[test]
    fn test_serialized_shape() {
        let response = ContractMethodResponse::read_only(json!("7"));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "isSuccess": true, "confirmed": true, "isReadOnly": true, "result": "7" })
        );

        let response = ContractMethodResponse::submitted(TransactionOutcome::Confirmed {
            hash: "ff".into(),
            ledger: Some(9),
            value: ExtractedValue::Decoded {
                strategy: "return_value_field",
                value: json!(42),
            },
        });
        assert_eq!(response.value(), Some(&json!(42)));
        assert_eq!(
            serde_json::to_value(&response).unwrap()["result"],
            json!({
                "outcome": "confirmed",
                "hash": "ff",
                "ledger": 9,
                "value": { "kind": "decoded", "strategy": "return_value_field", "value": 42 }
            })
        );
    }
}
