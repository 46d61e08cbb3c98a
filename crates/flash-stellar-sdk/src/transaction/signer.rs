//! Signing of prepared transactions.
//!
//! The pipeline never holds key material itself: it hands the unsigned
//! base64 envelope to a [`TransactionSigner`] and takes back the signed
//! envelope. A wallet callback is wrapped in [`FnSigner`]; a local secret
//! key can be used through [`KeypairSigner`].

use crate::config::NetworkConfig;
use crate::error::{StellarError, StellarResult};
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey};
use flash_stellar_types::transaction::DecoratedSignature;
use flash_stellar_types::{EnvelopeParts, StrKey};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;
use zeroize::Zeroizing;

/// Signs base64 transaction envelopes.
///
/// Implementations receive the envelope exactly as built and prepared, and
/// must return the same envelope with their signature appended. They may
/// suspend (a hardware wallet, a remote signing service).
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    /// Signs `unsigned_xdr` for `network`.
    async fn sign_transaction(
        &self,
        unsigned_xdr: &str,
        network: &NetworkConfig,
    ) -> anyhow::Result<String>;
}

#[async_trait]
impl<T: TransactionSigner + ?Sized> TransactionSigner for Arc<T> {
    async fn sign_transaction(
        &self,
        unsigned_xdr: &str,
        network: &NetworkConfig,
    ) -> anyhow::Result<String> {
        (**self).sign_transaction(unsigned_xdr, network).await
    }
}

/// Adapts an async closure into a [`TransactionSigner`].
///
/// ```rust
/// use flash_stellar_sdk::transaction::FnSigner;
///
/// let signer = FnSigner::new(|unsigned: String| async move {
///     // hand `unsigned` to a wallet here
///     Ok::<_, anyhow::Error>(unsigned)
/// });
/// ```
pub struct FnSigner<F> {
    sign: F,
}

impl<F> FnSigner<F> {
    /// Wraps `sign`.
    pub fn new(sign: F) -> Self {
        Self { sign }
    }
}

impl<F> fmt::Debug for FnSigner<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSigner").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut> TransactionSigner for FnSigner<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<String>> + Send,
{
    async fn sign_transaction(
        &self,
        unsigned_xdr: &str,
        _network: &NetworkConfig,
    ) -> anyhow::Result<String> {
        (self.sign)(unsigned_xdr.to_string()).await
    }
}

/// Signs with an ed25519 key held in memory.
///
/// The key is zeroized when the signer is dropped.
pub struct KeypairSigner {
    key: SigningKey,
}

impl KeypairSigner {
    /// Loads a signer from an `S...` secret seed.
    ///
    /// # Errors
    ///
    /// Returns [`StellarError::StrKey`] if `secret` is not a valid seed.
    pub fn from_secret(secret: &str) -> StellarResult<Self> {
        let seed = Zeroizing::new(StrKey::decode_secret_seed(secret)?);
        Ok(Self {
            key: SigningKey::from_bytes(&seed),
        })
    }

    /// Generates a fresh random key.
    pub fn generate() -> Self {
        Self {
            key: SigningKey::generate(&mut rand::rngs::OsRng),
        }
    }

    /// The `G...` account id of this key.
    pub fn public_key(&self) -> String {
        StrKey::account_id(&self.key.verifying_key().to_bytes())
    }

    /// The `S...` secret seed of this key.
    pub fn secret(&self) -> Zeroizing<String> {
        let seed = Zeroizing::new(self.key.to_bytes());
        Zeroizing::new(flash_stellar_types::strkey::encode(
            flash_stellar_types::StrKeyKind::SecretSeed,
            seed.as_slice(),
        ))
    }

    /// Signs an envelope synchronously and returns it with the signature appended.
    ///
    /// # Errors
    ///
    /// Fails if `unsigned_xdr` is not a v1 transaction envelope.
    pub fn sign_envelope(&self, unsigned_xdr: &str, network_id: &[u8; 32]) -> anyhow::Result<String> {
        let mut envelope =
            EnvelopeParts::split_base64(unsigned_xdr).context("decoding envelope to sign")?;
        let hash = envelope.hash(network_id);
        let public = self.key.verifying_key().to_bytes();

        let mut hint = [0u8; 4];
        hint.copy_from_slice(&public[28..]);
        envelope.add_signature(DecoratedSignature {
            hint,
            signature: self.key.sign(&hash).to_bytes().to_vec(),
        });
        Ok(envelope.to_xdr_base64())
    }
}

impl fmt::Debug for KeypairSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeypairSigner")
            .field("public_key", &self.public_key())
            .field("key", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl TransactionSigner for KeypairSigner {
    async fn sign_transaction(
        &self,
        unsigned_xdr: &str,
        network: &NetworkConfig,
    ) -> anyhow::Result<String> {
        self.sign_envelope(unsigned_xdr, &network.network_id())
    }
}

/// Invokes `signer` on a prepared payload for `method`.
///
/// # Errors
///
/// Returns [`StellarError::Signing`] wrapping the signer's own error, or an
/// empty payload.
pub async fn sign_payload(
    signer: &dyn TransactionSigner,
    unsigned_xdr: &str,
    network: &NetworkConfig,
    method: &str,
) -> StellarResult<String> {
    debug!(method = %method, network = %network.network(), "Requesting signature");
    let signed = signer
        .sign_transaction(unsigned_xdr, network)
        .await
        .map_err(|source| StellarError::Signing {
            method: method.to_string(),
            source,
        })?;

    if signed.trim().is_empty() {
        return Err(StellarError::Signing {
            method: method.to_string(),
            source: anyhow!("signer returned an empty payload"),
        });
    }
    Ok(signed)
}
