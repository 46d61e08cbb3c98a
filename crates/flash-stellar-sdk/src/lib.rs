//! # Flash Stellar SDK
//!
//! Calls Soroban smart contracts on Stellar.
//!
//! Every call is simulated before anything is signed. The simulated
//! footprint decides whether the call is a read, answered from the
//! simulation, or a write, which is prepared with its resource data, signed
//! through a caller-supplied [`transaction::TransactionSigner`], submitted,
//! and polled until it is applied.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flash_stellar_sdk::transaction::{Arg, ContractCall, FnSigner};
//! use flash_stellar_sdk::{ClientContext, ContractClient, NetworkConfig, StellarConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let network = NetworkConfig::from_id("TESTNET")?;
//!     let wallet = "GA7QYNF7SOWQ3GLR2BGMZEHXAVIRZA4KVWLTJJFC7MGXUA74P7UJVSGZ";
//!
//!     // a wallet callback that signs the base64 envelope
//!     let signer = FnSigner::new(|unsigned: String| async move {
//!         Ok::<_, anyhow::Error>(unsigned)
//!     });
//!
//!     let context = ClientContext::new(
//!         "CA3D5KRYM6CB7OWQ6TWYRR3Z4T7GNZLKERYNZGGA5SOAOPIFY6YQGAXE",
//!         network,
//!     )?
//!     .with_signer(signer);
//!     let client = ContractClient::new(StellarConfig::testnet(), context)?;
//!
//!     let count = client
//!         .simulate(wallet, &ContractCall::new("provider_count"))
//!         .await?;
//!     println!("providers: {:?}", count.value());
//!
//!     let response = client
//!         .execute_wallet(wallet, "deposit", vec![Arg::i128(1_000_000)])
//!         .await?;
//!     if !response.is_confirmed() {
//!         // success was presumed; re-check before relying on it
//!         let hash = response.outcome().map(|o| o.hash().to_string()).unwrap_or_default();
//!         println!("status: {:?}", client.transaction_status(&hash).await?.status);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Networks, endpoints, retry and polling settings
//! - [`context`] - Contract, network and signer of a client
//! - [`transaction`] - The pipeline stages
//! - [`api`] - Soroban JSON-RPC client
//! - [`error`] - Error type
//! - [`retry`] - Backoff for transient transport failures

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod retry;
pub mod transaction;

mod client;

// Re-export main entry points
pub use client::ContractClient;
pub use config::{Network, NetworkConfig, PollConfig, StellarConfig};
pub use context::{ClientContext, ReadContext, WriteContext};
pub use error::{StellarError, StellarResult};

// Re-export the wire crate
pub use flash_stellar_types as types;
