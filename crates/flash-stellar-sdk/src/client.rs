//! Main contract client entry point.
//!
//! The [`ContractClient`] runs the whole pipeline for one contract: encode,
//! build, simulate, classify, then either return the simulated value or
//! prepare, sign, submit and wait.

use crate::api::{GetTransactionResponse, SorobanRpc, SorobanRpcClient};
use crate::config::StellarConfig;
use crate::context::{ClientContext, ReadContext, WriteContext};
use crate::error::{StellarError, StellarResult};
use crate::transaction::args::Arg;
use crate::transaction::batch::{build_transaction, Batch};
use crate::transaction::call::ContractCall;
use crate::transaction::prepare::{prepare_transaction, unsigned_payload};
use crate::transaction::response::{ContractMethodResponse, TransactionOutcome};
use crate::transaction::signer::sign_payload;
use crate::transaction::simulation::{CallKind, Simulation};
use crate::transaction::submit::Submitter;
use futures::future::join_all;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Calls the methods of one Soroban contract.
///
/// Every call is simulated first. A call that only reads storage returns
/// its simulated value and never reaches the signer. A call that writes is
/// prepared and, when a signer is available, signed, submitted and polled
/// until it is applied.
///
/// The client holds shared immutable state only; clones are cheap and may
/// be used from many tasks at once.
///
/// # Example
///
/// ```rust,no_run
/// use flash_stellar_sdk::transaction::{Arg, ContractCall, KeypairSigner};
/// use flash_stellar_sdk::{ClientContext, ContractClient, StellarConfig};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = StellarConfig::testnet();
///     let signer = KeypairSigner::generate();
///     let wallet = signer.public_key();
///     let context = ClientContext::new(
///         "CA3D5KRYM6CB7OWQ6TWYRR3Z4T7GNZLKERYNZGGA5SOAOPIFY6YQGAXE",
///         config.network().clone(),
///     )?
///     .with_signer(signer);
///     let client = ContractClient::new(config, context)?;
///
///     let provider = client
///         .simulate(&wallet, &ContractCall::new("get_provider").with_arg(Arg::address(&wallet)))
///         .await?;
///     println!("provider: {:?}", provider.value());
///
///     let response = client
///         .execute_wallet(&wallet, "register_provider", vec![Arg::string("Provider One")])
///         .await?;
///     println!("confirmed: {}", response.is_confirmed());
///     Ok(())
/// }
/// ```
pub struct ContractClient<R: SorobanRpc = SorobanRpcClient> {
    rpc: Arc<R>,
    context: Arc<ClientContext>,
    config: Arc<StellarConfig>,
    cancel: Option<CancellationToken>,
}

impl ContractClient<SorobanRpcClient> {
    /// Creates a client talking to the RPC endpoint of `config`.
    ///
    /// # Errors
    ///
    /// Returns [`StellarError::Configuration`] if `context` and `config`
    /// name different networks, or an error if the HTTP client fails to
    /// build.
    pub fn new(config: StellarConfig, context: ClientContext) -> StellarResult<Self> {
        let rpc = SorobanRpcClient::new(config.clone())?;
        Self::with_rpc(rpc, config, context)
    }
}

impl<R: SorobanRpc> ContractClient<R> {
    /// Creates a client over any [`SorobanRpc`] implementation.
    ///
    /// # Errors
    ///
    /// Returns [`StellarError::Configuration`] if `context` and `config`
    /// name different networks.
    pub fn with_rpc(rpc: R, config: StellarConfig, context: ClientContext) -> StellarResult<Self> {
        if context.network() != config.network() {
            return Err(StellarError::Configuration(format!(
                "context is for {} but the client is configured for {}",
                context.network().network(),
                config.network().network()
            )));
        }
        Ok(Self {
            rpc: Arc::new(rpc),
            context: Arc::new(context),
            config: Arc::new(config),
            cancel: None,
        })
    }

    /// Stops waiting for submitted transactions when `token` fires.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Returns the context.
    pub fn context(&self) -> &ClientContext {
        &self.context
    }

    /// Returns the configuration.
    pub fn config(&self) -> &StellarConfig {
        &self.config
    }

    /// Returns the RPC client.
    pub fn rpc(&self) -> &R {
        &self.rpc
    }

    /// Simulates `call` with `source` as the transaction source.
    ///
    /// A read-only call returns its value. A write is prepared and returned
    /// as an unsigned payload; nothing is signed or submitted.
    ///
    /// # Errors
    ///
    /// Returns the error of the first stage that fails.
    pub async fn simulate(&self, source: &str, call: &ContractCall) -> StellarResult<ContractMethodResponse> {
        self.run(self.context.read_only(), source, &Batch::from(call.clone()), None)
            .await
    }

    /// Runs `call`, submitting it if it writes.
    ///
    /// # Errors
    ///
    /// Returns [`StellarError::Configuration`] before any network traffic
    /// if the context has no signer, otherwise the error of the first stage
    /// that fails.
    pub async fn execute(&self, source: &str, call: &ContractCall) -> StellarResult<ContractMethodResponse> {
        let writer = self
            .context
            .writer()
            .map_err(|e| e.with_method(call.method()))?;
        self.execute_with(&writer, source, call).await
    }

    /// Runs `call` on an explicit write context.
    ///
    /// # Errors
    ///
    /// Returns [`StellarError::Configuration`] before any network traffic
    /// if `writer` is for another network than the client, otherwise the
    /// error of the first stage that fails.
    pub async fn execute_with(
        &self,
        writer: &WriteContext,
        source: &str,
        call: &ContractCall,
    ) -> StellarResult<ContractMethodResponse> {
        if writer.network() != self.config.network() {
            return Err(StellarError::Configuration(format!(
                "write context is for {} but the client is configured for {}",
                writer.network().network(),
                self.config.network().network()
            ))
            .with_method(call.method()));
        }
        self.run(writer.read(), source, &Batch::from(call.clone()), Some(writer))
            .await
    }

    /// Runs `method` on behalf of `wallet`: the wallet is the transaction
    /// source and the first argument.
    ///
    /// # Errors
    ///
    /// As for [`ContractClient::execute`].
    pub async fn execute_wallet(
        &self,
        wallet: &str,
        method: &str,
        args: Vec<Arg>,
    ) -> StellarResult<ContractMethodResponse> {
        let call = ContractCall::for_wallet(wallet, method, args);
        self.execute(wallet, &call).await
    }

    /// Runs every call of `batch` in one transaction sourced from `wallet`.
    ///
    /// The batch is simulated and classified once. If the combined
    /// simulation fails, nothing is signed or submitted.
    ///
    /// # Errors
    ///
    /// Returns [`StellarError::Configuration`] before any network traffic
    /// if the context has no signer, otherwise the error of the first stage
    /// that fails, labelled with the joined method names.
    pub async fn execute_batch(&self, wallet: &str, batch: &Batch) -> StellarResult<ContractMethodResponse> {
        let writer = self
            .context
            .writer()
            .map_err(|e| e.with_method(&batch.label()))?;
        self.run(writer.read(), wallet, batch, Some(&writer)).await
    }

    /// Simulates every call of `batch` in one transaction.
    ///
    /// # Errors
    ///
    /// Returns the error of the first stage that fails.
    pub async fn simulate_batch(&self, source: &str, batch: &Batch) -> StellarResult<ContractMethodResponse> {
        self.run(self.context.read_only(), source, batch, None).await
    }

    /// Simulates independent calls concurrently, each in its own transaction.
    ///
    /// Results are returned in the order of `calls`; one failure does not
    /// affect the others.
    pub async fn read_many(
        &self,
        source: &str,
        calls: &[ContractCall],
    ) -> Vec<StellarResult<ContractMethodResponse>> {
        join_all(calls.iter().map(|call| self.simulate(source, call))).await
    }

    /// Submits an envelope signed elsewhere and waits for its outcome.
    ///
    /// # Errors
    ///
    /// As for [`Submitter::submit_and_wait`].
    pub async fn submit_signed(&self, signed_xdr: &str) -> StellarResult<TransactionOutcome> {
        self.submitter().submit_and_wait(signed_xdr, "").await
    }

    /// Queries the status of a submitted transaction once.
    ///
    /// Use it to re-verify a [`TransactionOutcome::Presumed`] outcome.
    ///
    /// # Errors
    ///
    /// Returns transport and parsing errors.
    pub async fn transaction_status(&self, hash: &str) -> StellarResult<GetTransactionResponse> {
        self.rpc.get_transaction(hash).await
    }

    fn submitter(&self) -> Submitter<Arc<R>> {
        let submitter = Submitter::new(Arc::clone(&self.rpc), self.config.poll_config().clone());
        match &self.cancel {
            Some(token) => submitter.with_cancellation(token.clone()),
            None => submitter,
        }
    }

    async fn run(
        &self,
        read: &ReadContext,
        source: &str,
        batch: &Batch,
        writer: Option<&WriteContext>,
    ) -> StellarResult<ContractMethodResponse> {
        let label = batch.label();
        self.run_stages(read, source, batch, writer, &label)
            .await
            .map_err(|e| e.with_method(&label))
    }

    async fn run_stages(
        &self,
        read: &ReadContext,
        source: &str,
        batch: &Batch,
        writer: Option<&WriteContext>,
        label: &str,
    ) -> StellarResult<ContractMethodResponse> {
        let operations = batch.operations(read.contract())?;

        let account = self.rpc.get_account(source).await?;
        let tx = build_transaction(
            &account,
            operations,
            self.config.base_fee(),
            self.config.transaction_timeout(),
        )?;
        debug!(
            method = %label,
            contract = %read.contract_id(),
            source = %source,
            sequence = tx.seq_num,
            "Built transaction"
        );

        let response = self.rpc.simulate_transaction(&unsigned_payload(&tx)).await?;
        let simulation = Simulation::from_response(label, response)?;
        let kind = simulation.classify()?;
        debug!(method = %label, kind = ?kind, "Classified call");

        if kind == CallKind::ReadOnly {
            return Ok(ContractMethodResponse::read_only(
                simulation.native_return_value(),
            ));
        }

        let prepared = prepare_transaction(self.rpc.as_ref(), tx, label).await?;
        let payload = unsigned_payload(&prepared);

        let Some(writer) = writer else {
            debug!(method = %label, "Returning unsigned payload");
            return Ok(ContractMethodResponse::unsigned(payload));
        };

        let signed = sign_payload(writer.signer(), &payload, writer.network(), label).await?;
        let outcome = self.submitter().submit_and_wait(&signed, label).await?;
        Ok(ContractMethodResponse::submitted(outcome))
    }
}

impl<R: SorobanRpc> Clone for ContractClient<R> {
    fn clone(&self) -> Self {
        Self {
            rpc: Arc::clone(&self.rpc),
            context: Arc::clone(&self.context),
            config: Arc::clone(&self.config),
            cancel: self.cancel.clone(),
        }
    }
}

impl<R: SorobanRpc> fmt::Debug for ContractClient<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractClient")
            .field("context", &self.context)
            .field("rpc_url", &self.config.rpc_url().as_str())
            .finish_non_exhaustive()
    }
}
