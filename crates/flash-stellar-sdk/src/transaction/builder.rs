//! Transaction builder.

use crate::api::AccountInfo;
use crate::config::{DEFAULT_BASE_FEE, DEFAULT_TRANSACTION_TIMEOUT};
use crate::error::{StellarError, StellarResult};
use crate::transaction::call::ContractCall;
use flash_stellar_types::transaction::{
    ChangeTrustOp, InvokeHostFunctionOp, Memo, MuxedAccount, TimeBounds, MAX_OPS_PER_TX,
};
use flash_stellar_types::{
    AccountId, Asset, Operation, OperationBody, ScAddress, Transaction, XdrError,
};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A non-contract operation appended after the contract calls of an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtraOperation {
    /// Creates, updates or (with a zero limit) removes a trust line.
    ChangeTrust {
        /// Asset to trust
        asset: Asset,
        /// Maximum balance in stroops
        limit: i64,
    },
    /// A base64 `Operation` built elsewhere.
    Xdr(String),
}

impl ExtraOperation {
    /// Trusts `code` issued by `issuer` up to `limit` stroops.
    ///
    /// # Errors
    ///
    /// Fails if the issuer is not a `G...` address or the code is not 1 to
    /// 12 alphanumeric characters.
    pub fn change_trust(code: &str, issuer: &str, limit: i64) -> StellarResult<Self> {
        let issuer = AccountId::from_strkey(issuer)?;
        let asset = Asset::credit(code, issuer).ok_or_else(|| {
            StellarError::Configuration(format!("invalid asset code {code:?}"))
        })?;
        Ok(Self::ChangeTrust { asset, limit })
    }

    /// Removes the trust line for `code` issued by `issuer`.
    ///
    /// # Errors
    ///
    /// As for [`ExtraOperation::change_trust`].
    pub fn remove_trust(code: &str, issuer: &str) -> StellarResult<Self> {
        Self::change_trust(code, issuer, 0)
    }

    /// Converts into an operation.
    ///
    /// # Errors
    ///
    /// Fails if an XDR operation cannot be decoded.
    pub fn to_operation(&self) -> StellarResult<Operation> {
        match self {
            Self::ChangeTrust { asset, limit } => {
                Ok(Operation::new(OperationBody::ChangeTrust(ChangeTrustOp {
                    asset: asset.clone(),
                    limit: *limit,
                })))
            }
            Self::Xdr(encoded) => {
                let bytes = base64::decode(encoded.trim()).map_err(XdrError::from)?;
                Ok(Operation::from_xdr_opaque(&bytes)?)
            }
        }
    }
}

/// A builder for unsigned transactions.
///
/// The sequence number comes from the source account; every other field has
/// a default: a base fee of 100 stroops per operation and a 60 second
/// validity window starting now.
///
/// # Example
///
/// ```rust
/// use flash_stellar_sdk::api::AccountInfo;
/// use flash_stellar_sdk::transaction::{Arg, ContractCall, TransactionBuilder};
/// use flash_stellar_types::ScAddress;
///
/// let account = AccountInfo {
///     account_id: "GA7QYNF7SOWQ3GLR2BGMZEHXAVIRZA4KVWLTJJFC7MGXUA74P7UJVSGZ".into(),
///     sequence: 41,
/// };
/// let contract = ScAddress::Contract([7; 32]);
///
/// let tx = TransactionBuilder::new(&account)
///     .unwrap()
///     .add_contract_call(&contract, &ContractCall::new("get_count").with_arg(Arg::u32(1)))
///     .unwrap()
///     .build()
///     .unwrap();
/// assert_eq!(tx.seq_num, 42);
/// assert_eq!(tx.fee, 100);
/// ```
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    source: AccountId,
    sequence: i64,
    fee_per_operation: u32,
    timeout: Duration,
    valid_until: Option<u64>,
    memo: Memo,
    operations: Vec<Operation>,
}

impl TransactionBuilder {
    /// Starts a transaction from `account`.
    ///
    /// # Errors
    ///
    /// Fails if the account id is not a `G...` address.
    pub fn new(account: &AccountInfo) -> StellarResult<Self> {
        Ok(Self {
            source: AccountId::from_strkey(&account.account_id)?,
            sequence: account.sequence,
            fee_per_operation: DEFAULT_BASE_FEE,
            timeout: DEFAULT_TRANSACTION_TIMEOUT,
            valid_until: None,
            memo: Memo::None,
            operations: Vec::new(),
        })
    }

    /// Sets the inclusion fee per operation, in stroops.
    #[must_use]
    pub fn fee_per_operation(mut self, fee: u32) -> Self {
        self.fee_per_operation = fee;
        self
    }

    /// Sets how long after building the transaction stays valid.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets an absolute expiration (unix seconds), overriding the timeout.
    #[must_use]
    pub fn valid_until(mut self, unix_secs: u64) -> Self {
        self.valid_until = Some(unix_secs);
        self
    }

    /// Sets the memo.
    #[must_use]
    pub fn memo(mut self, memo: Memo) -> Self {
        self.memo = memo;
        self
    }

    /// Appends an operation.
    #[must_use]
    pub fn add_operation(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    /// Appends an invocation of `call` on `contract`.
    ///
    /// # Errors
    ///
    /// Returns [`StellarError::Encoding`] if an argument does not fit its type.
    pub fn add_contract_call(self, contract: &ScAddress, call: &ContractCall) -> StellarResult<Self> {
        let invoke = call.to_invoke_args(contract)?;
        Ok(self.add_operation(Operation::new(OperationBody::InvokeHostFunction(
            InvokeHostFunctionOp {
                invoke,
                auth: Vec::new(),
            },
        ))))
    }

    /// Appends a non-contract operation.
    ///
    /// # Errors
    ///
    /// Fails if an XDR operation cannot be decoded.
    pub fn add_extra_operation(self, extra: &ExtraOperation) -> StellarResult<Self> {
        let operation = extra.to_operation()?;
        Ok(self.add_operation(operation))
    }

    /// Number of operations added so far.
    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    /// Builds the unsigned transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StellarError::Configuration`] if there are no operations,
    /// too many, or the total fee overflows.
    pub fn build(self) -> StellarResult<Transaction> {
        if self.operations.is_empty() {
            return Err(StellarError::Configuration(
                "transaction has no operations".into(),
            ));
        }
        if self.operations.len() > MAX_OPS_PER_TX {
            return Err(StellarError::Configuration(format!(
                "transaction has {} operations; at most {MAX_OPS_PER_TX} are allowed",
                self.operations.len()
            )));
        }

        let fee = u32::try_from(self.operations.len())
            .ok()
            .and_then(|count| self.fee_per_operation.checked_mul(count))
            .ok_or_else(|| StellarError::Configuration("transaction fee overflows".into()))?;

        let seq_num = self.sequence.checked_add(1).ok_or_else(|| {
            StellarError::Configuration("account sequence number is exhausted".into())
        })?;

        let max_time = self.valid_until.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs()
                .saturating_add(self.timeout.as_secs())
        });

        Ok(Transaction {
            source_account: MuxedAccount::from(self.source),
            fee,
            seq_num,
            time_bounds: Some(TimeBounds {
                min_time: 0,
                max_time,
            }),
            memo: self.memo,
            operations: self.operations,
            soroban_data: None,
        })
    }
}
