//! Call contexts.
//!
//! A [`ClientContext`] names the contract, the network, and optionally a
//! signer. Reads run on a [`ReadContext`]; anything that may submit a
//! transaction takes a [`WriteContext`], which cannot exist without a signer.
//! Obtaining one from a context without a signer fails before any network
//! traffic.

use crate::config::NetworkConfig;
use crate::error::{StellarError, StellarResult};
use crate::transaction::signer::TransactionSigner;
use flash_stellar_types::{ScAddress, StrKey};
use std::fmt;
use std::sync::Arc;

/// The contract, network and signer shared by every call of one client.
#[derive(Clone)]
pub struct ClientContext {
    read: ReadContext,
    signer: Option<Arc<dyn TransactionSigner>>,
}

impl ClientContext {
    /// Creates a read-only context for the contract at `contract_address`.
    ///
    /// # Errors
    ///
    /// Returns [`StellarError::Configuration`] if the address is not a
    /// `C...` contract address.
    pub fn new(contract_address: &str, network: NetworkConfig) -> StellarResult<Self> {
        let hash = StrKey::decode_contract(contract_address).map_err(|e| {
            StellarError::Configuration(format!(
                "invalid contract address {contract_address:?}: {e}"
            ))
        })?;
        Ok(Self {
            read: ReadContext {
                contract: ScAddress::Contract(hash),
                contract_id: contract_address.to_string(),
                network,
            },
            signer: None,
        })
    }

    /// Attaches the signer used for writes.
    #[must_use]
    pub fn with_signer(mut self, signer: impl TransactionSigner + 'static) -> Self {
        self.signer = Some(Arc::new(signer));
        self
    }

    /// Attaches an already shared signer.
    #[must_use]
    pub fn with_shared_signer(mut self, signer: Arc<dyn TransactionSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Whether writes can be signed.
    pub fn has_signer(&self) -> bool {
        self.signer.is_some()
    }

    /// The read view of this context.
    pub fn read_only(&self) -> &ReadContext {
        &self.read
    }

    /// The write view of this context.
    ///
    /// # Errors
    ///
    /// Returns [`StellarError::Configuration`] when no signer is attached.
    pub fn writer(&self) -> StellarResult<WriteContext> {
        match &self.signer {
            Some(signer) => Ok(WriteContext {
                read: self.read.clone(),
                signer: Arc::clone(signer),
            }),
            None => Err(StellarError::Configuration(format!(
                "a signer is required to write to contract {}",
                self.read.contract_id
            ))),
        }
    }

    /// The contract address.
    pub fn contract(&self) -> &ScAddress {
        &self.read.contract
    }

    /// The `C...` contract id.
    pub fn contract_id(&self) -> &str {
        &self.read.contract_id
    }

    /// The network.
    pub fn network(&self) -> &NetworkConfig {
        &self.read.network
    }
}

impl fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientContext")
            .field("contract", &self.read.contract_id)
            .field("network", &self.read.network.network())
            .field("signer", &self.signer.as_ref().map(|_| "configured"))
            .finish()
    }
}

/// Everything a read-only call needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadContext {
    contract: ScAddress,
    contract_id: String,
    network: NetworkConfig,
}

impl ReadContext {
    /// The contract address.
    pub fn contract(&self) -> &ScAddress {
        &self.contract
    }

    /// The `C...` contract id.
    pub fn contract_id(&self) -> &str {
        &self.contract_id
    }

    /// The network.
    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }
}

/// A context that is guaranteed to carry a signer.
#[derive(Clone)]
pub struct WriteContext {
    read: ReadContext,
    signer: Arc<dyn TransactionSigner>,
}

impl WriteContext {
    /// The read view.
    pub fn read(&self) -> &ReadContext {
        &self.read
    }

    /// The signer.
    pub fn signer(&self) -> &dyn TransactionSigner {
        self.signer.as_ref()
    }

    /// The network.
    pub fn network(&self) -> &NetworkConfig {
        &self.read.network
    }
}

impl fmt::Debug for WriteContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteContext")
            .field("read", &self.read)
            .finish_non_exhaustive()
    }
}
