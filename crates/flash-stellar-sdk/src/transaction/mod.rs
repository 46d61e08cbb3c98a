//! The contract-call pipeline.
//!
//! A call moves through these stages in order:
//!
//! 1. [`args`] encodes typed arguments;
//! 2. [`builder`] and [`batch`] turn calls into an unsigned transaction;
//! 3. [`simulation`] dry-runs it and classifies it read-only or write;
//! 4. [`prepare`] attaches resources to a write;
//! 5. [`signer`] gets it signed;
//! 6. [`submit`] sends it and polls for the outcome, described by [`response`].
//!
//! [`crate::ContractClient`] runs the stages end to end; the stages are
//! public so they can be driven by hand.
//!
//! # Example
//!
//! ```rust
//! use flash_stellar_sdk::transaction::{Arg, Batch, ContractCall};
//! use flash_stellar_types::ScAddress;
//!
//! let call = ContractCall::new("register_provider")
//!     .with_arg(Arg::address("GA7QYNF7SOWQ3GLR2BGMZEHXAVIRZA4KVWLTJJFC7MGXUA74P7UJVSGZ"))
//!     .with_arg(Arg::string("Provider One"))
//!     .with_arg(Arg::none());
//!
//! let operations = Batch::from(call)
//!     .operations(&ScAddress::Contract([1; 32]))
//!     .unwrap();
//! assert_eq!(operations.len(), 1);
//! ```

pub mod args;
pub mod batch;
pub mod builder;
pub mod call;
pub mod prepare;
pub mod response;
pub mod signer;
pub mod simulation;
pub mod submit;

pub use args::{encode_args, Arg, ArgType, ArgValue};
pub use batch::Batch;
pub use builder::{ExtraOperation, TransactionBuilder};
pub use call::ContractCall;
pub use prepare::{assemble_transaction, prepare_transaction, unsigned_payload};
pub use response::{CallResult, ContractMethodResponse, ExtractedValue, TransactionOutcome};
pub use signer::{sign_payload, FnSigner, KeypairSigner, TransactionSigner};
pub use simulation::{classify_footprint, CallKind, Simulation};
pub use submit::{extract_return_value, ReturnValueStrategy, Submitter, RETURN_VALUE_STRATEGIES};
