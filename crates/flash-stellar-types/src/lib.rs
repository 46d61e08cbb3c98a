//! # Flash Stellar Types
//!
//! Wire-level types for Soroban contract calls on Stellar.
//!
//! This crate has no I/O. It encodes and decodes the XDR structures the
//! transaction pipeline needs: contract values, ledger keys and footprints,
//! transactions and their envelopes, plus the StrKey address format.
//!
//! ## Modules
//!
//! - [`xdr`] - XDR reader and writer
//! - [`strkey`] - `G...`/`C...`/`S...` key encoding
//! - [`scval`] - Contract values and addresses
//! - [`json`] - Reading contract values from a node's JSON rendering
//! - [`native`] - Plain JSON view of contract values for callers
//! - [`ledger`] - Ledger keys, footprints and resource data
//! - [`transaction`] - Transactions, operations, envelopes and hashing
//!
//! ```rust,ignore
//! use flash_stellar_types::{ScVal, WriteXdr};
//!
//! let arg = ScVal::U32(42);
//! let encoded = arg.to_xdr_base64();
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod json;
pub mod ledger;
pub mod native;
pub mod scval;
pub mod strkey;
pub mod transaction;
pub mod xdr;

pub use ledger::{Asset, LedgerFootprint, LedgerKey, SorobanTransactionData};
pub use native::to_native;
pub use scval::{AccountId, ScAddress, ScVal};
pub use strkey::{StrKey, StrKeyError, StrKeyKind};
pub use transaction::{
    network_id, EnvelopeParts, Operation, OperationBody, Transaction, TransactionEnvelope,
};
pub use xdr::{ReadXdr, WriteXdr, XdrError};
