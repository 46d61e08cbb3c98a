//! Soroban JSON-RPC client.

use crate::api::response::{
    AccountInfo, GetLedgerEntriesResponse, GetTransactionResponse, JsonRpcRequest,
    JsonRpcResponse, SendTransactionResponse, SimulateTransactionResponse,
};
use crate::config::StellarConfig;
use crate::error::{StellarError, StellarResult};
use crate::retry::{RetryConfig, RetryExecutor};
use async_trait::async_trait;
use flash_stellar_types::ledger::AccountEntry;
use flash_stellar_types::{AccountId, LedgerKey, WriteXdr};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;
use url::Url;

const JSON_CONTENT_TYPE: &str = "application/json";

/// The Soroban RPC methods the pipeline depends on.
///
/// [`SorobanRpcClient`] talks to a real node; tests and alternative
/// transports (a gateway, a recorded fixture) implement this trait instead.
#[async_trait]
pub trait SorobanRpc: Send + Sync {
    /// Loads the sequence number of a `G...` account.
    async fn get_account(&self, account_id: &str) -> StellarResult<AccountInfo>;

    /// Dry-runs a base64 transaction envelope.
    async fn simulate_transaction(
        &self,
        envelope_xdr: &str,
    ) -> StellarResult<SimulateTransactionResponse>;

    /// Submits a base64 signed envelope.
    async fn send_transaction(&self, envelope_xdr: &str) -> StellarResult<SendTransactionResponse>;

    /// Queries a transaction by hex hash.
    async fn get_transaction(&self, hash: &str) -> StellarResult<GetTransactionResponse>;
}

#[async_trait]
impl<T: SorobanRpc + ?Sized> SorobanRpc for Arc<T> {
    async fn get_account(&self, account_id: &str) -> StellarResult<AccountInfo> {
        (**self).get_account(account_id).await
    }

    async fn simulate_transaction(
        &self,
        envelope_xdr: &str,
    ) -> StellarResult<SimulateTransactionResponse> {
        (**self).simulate_transaction(envelope_xdr).await
    }

    async fn send_transaction(&self, envelope_xdr: &str) -> StellarResult<SendTransactionResponse> {
        (**self).send_transaction(envelope_xdr).await
    }

    async fn get_transaction(&self, hash: &str) -> StellarResult<GetTransactionResponse> {
        (**self).get_transaction(hash).await
    }
}

/// Client for the Soroban JSON-RPC API.
///
/// Requests are retried with exponential backoff on transient transport
/// failures. Configure retry behavior via [`StellarConfig::with_retry`].
///
/// # Example
///
/// ```rust,no_run
/// use flash_stellar_sdk::api::{SorobanRpc, SorobanRpcClient};
/// use flash_stellar_sdk::StellarConfig;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let rpc = SorobanRpcClient::new(StellarConfig::testnet())?;
///     let account = rpc
///         .get_account("GA7QYNF7SOWQ3GLR2BGMZEHXAVIRZA4KVWLTJJFC7MGXUA74P7UJVSGZ")
///         .await?;
///     println!("sequence: {}", account.sequence);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SorobanRpcClient {
    url: Url,
    client: Client,
    retry_config: Arc<RetryConfig>,
    next_id: Arc<AtomicU64>,
}

impl SorobanRpcClient {
    /// Creates a new RPC client.
    ///
    /// TLS certificate validation is left at reqwest's defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: StellarConfig) -> StellarResult<Self> {
        let pool = config.pool_config();
        let client = Client::builder()
            .timeout(config.timeout())
            .pool_max_idle_per_host(pool.max_idle_per_host)
            .pool_idle_timeout(pool.idle_timeout)
            .tcp_keepalive(pool.keepalive)
            .tcp_nodelay(true)
            .build()
            .map_err(StellarError::Http)?;

        Ok(Self {
            url: config.rpc_url().clone(),
            client,
            retry_config: Arc::new(config.retry_config().clone()),
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    /// Returns the RPC endpoint.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Calls a JSON-RPC method and returns its raw `result`.
    ///
    /// # Errors
    ///
    /// Returns [`StellarError::Rpc`] for a JSON-RPC error object,
    /// [`StellarError::Api`] for a non-success HTTP status, and transport
    /// errors after retries are exhausted.
    pub async fn call_raw(&self, method: &str, params: Value) -> StellarResult<Value> {
        self.call_raw_with(method, params, |error| {
            self.retry_config.is_retryable_error(error)
        })
        .await
    }

    async fn call_raw_with<P>(&self, method: &str, params: Value, should_retry: P) -> StellarResult<Value>
    where
        P: Fn(&StellarError) -> bool,
    {
        let executor = RetryExecutor::new((*self.retry_config).clone());
        executor
            .execute_with_predicate(
                || {
                    let request = JsonRpcRequest {
                        jsonrpc: "2.0",
                        id: self.next_id.fetch_add(1, Ordering::Relaxed),
                        method,
                        params: params.clone(),
                    };
                    async move {
                        debug!(rpc_method = method, id = request.id, "Sending RPC request");
                        let response = self
                            .client
                            .post(self.url.clone())
                            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
                            .header(ACCEPT, JSON_CONTENT_TYPE)
                            .json(&request)
                            .send()
                            .await?;
                        Self::handle_response_static(response).await
                    }
                },
                should_retry,
            )
            .await
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> StellarResult<T> {
        let result = self.call_raw(method, params).await?;
        Self::parse_result(method, result)
    }

    fn parse_result<T: DeserializeOwned>(method: &str, result: Value) -> StellarResult<T> {
        serde_json::from_value(result.clone()).map_err(|e| StellarError::ResponseParsing {
            message: format!("{method}: {e}"),
            raw: Some(result),
        })
    }

    async fn handle_response_static(response: reqwest::Response) -> StellarResult<Value> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            } else {
                body
            };
            return Err(StellarError::api(status.as_u16(), message));
        }

        let envelope: JsonRpcResponse = response.json().await?;
        match (envelope.result, envelope.error) {
            (_, Some(error)) => Err(error.into()),
            (Some(result), None) => Ok(result),
            (None, None) => Err(StellarError::parsing(
                "JSON-RPC response has neither result nor error",
            )),
        }
    }
}

#[async_trait]
impl SorobanRpc for SorobanRpcClient {
    async fn get_account(&self, account_id: &str) -> StellarResult<AccountInfo> {
        let id = AccountId::from_strkey(account_id).map_err(|e| StellarError::AccountLookup {
            account: account_id.to_string(),
            message: e.to_string(),
        })?;
        let key = LedgerKey::Account(id).to_xdr_base64();

        let response: GetLedgerEntriesResponse = self
            .call("getLedgerEntries", json!({ "keys": [key] }))
            .await?;
        let entry = response
            .entries
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| StellarError::AccountLookup {
                account: account_id.to_string(),
                message: "account not found on the network".to_string(),
            })?;

        let account = AccountEntry::from_ledger_entry_data(&entry.xdr)?;
        debug!(account = %account_id, sequence = account.seq_num, "Loaded source account");
        Ok(AccountInfo {
            account_id: account_id.to_string(),
            sequence: account.seq_num,
        })
    }

    async fn simulate_transaction(
        &self,
        envelope_xdr: &str,
    ) -> StellarResult<SimulateTransactionResponse> {
        self.call("simulateTransaction", json!({ "transaction": envelope_xdr }))
            .await
    }

    async fn send_transaction(&self, envelope_xdr: &str) -> StellarResult<SendTransactionResponse> {
        // Retry only when the request never reached the node.
        let result = self
            .call_raw_with(
                "sendTransaction",
                json!({ "transaction": envelope_xdr }),
                |error| matches!(error, StellarError::Http(e) if e.is_connect()),
            )
            .await?;
        Self::parse_result("sendTransaction", result)
    }

    async fn get_transaction(&self, hash: &str) -> StellarResult<GetTransactionResponse> {
        let result = self
            .call_raw("getTransaction", json!({ "hash": hash, "xdrFormat": "json" }))
            .await?;
        GetTransactionResponse::from_value(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::response::{SendTransactionStatus, TransactionStatus};
    use crate::config::Network;
    use flash_stellar_types::xdr::XdrWriter;
    use flash_stellar_types::StrKey;
    use wiremock::{
        matchers::{body_partial_json, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    const ACCOUNT: &str = "GA7QYNF7SOWQ3GLR2BGMZEHXAVIRZA4KVWLTJJFC7MGXUA74P7UJVSGZ";

    async fn create_mock_client(server: &MockServer) -> SorobanRpcClient {
        let url = format!("{}/rpc", server.uri());
        let config = StellarConfig::custom(Network::Testnet, &url)
            .unwrap()
            .without_retry();
        SorobanRpcClient::new(config).unwrap()
    }

    fn rpc_result(result: Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": result
        }))
    }

    fn account_entry_xdr(sequence: i64) -> String {
        let key = StrKey::decode_account_id(ACCOUNT).unwrap();
        let mut w = XdrWriter::new();
        w.write_i32(0); // ACCOUNT
        w.write_i32(0); // PUBLIC_KEY_TYPE_ED25519
        w.write_fixed(&key);
        w.write_i64(10_000_000);
        w.write_i64(sequence);
        base64::encode(w.into_bytes())
    }

    #[tokio::test]
    async fn test_get_account() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rpc"))
            .and(body_partial_json(json!({ "method": "getLedgerEntries" })))
            .respond_with(rpc_result(json!({
                "entries": [{
                    "key": "AAAA",
                    "xdr": account_entry_xdr(4242),
                    "lastModifiedLedgerSeq": 7
                }],
                "latestLedger": 100
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = create_mock_client(&server).await;
        let account = client.get_account(ACCOUNT).await.unwrap();
        assert_eq!(account.sequence, 4242);
        assert_eq!(account.account_id, ACCOUNT);
    }

    #[tokio::test]
    async fn test_get_account_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": "getLedgerEntries" })))
            .respond_with(rpc_result(json!({ "entries": [], "latestLedger": 100 })))
            .expect(1)
            .mount(&server)
            .await;

        let client = create_mock_client(&server).await;
        let err = client.get_account(ACCOUNT).await.unwrap_err();
        assert!(matches!(err, StellarError::AccountLookup { .. }));
    }

    #[tokio::test]
    async fn test_get_account_rejects_bad_address() {
        let server = MockServer::start().await;
        let client = create_mock_client(&server).await;
        let err = client.get_account("not-an-account").await.unwrap_err();
        assert!(matches!(err, StellarError::AccountLookup { .. }));
    }

    #[tokio::test]
    async fn test_simulate_transaction() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "method": "simulateTransaction",
                "params": { "transaction": "AAAAAg==" }
            })))
            .respond_with(rpc_result(json!({
                "transactionData": "AAAA",
                "minResourceFee": "100",
                "results": [{ "auth": [], "xdr": "AAAAAQ==" }],
                "latestLedger": 100
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = create_mock_client(&server).await;
        let response = client.simulate_transaction("AAAAAg==").await.unwrap();
        assert_eq!(response.min_resource_fee, Some(100));
    }

    #[tokio::test]
    async fn test_send_transaction() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": "sendTransaction" })))
            .respond_with(rpc_result(json!({
                "status": "PENDING",
                "hash": "d8ec9b68780314ffdfdfc2194b1b35dd27d7303c3bceaef6447e31631a1419dc",
                "latestLedger": 100
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = create_mock_client(&server).await;
        let response = client.send_transaction("AAAA").await.unwrap();
        assert_eq!(response.status, SendTransactionStatus::Pending);
    }

    #[tokio::test]
    async fn test_get_transaction_requests_json_format() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "method": "getTransaction",
                "params": { "hash": "abcd", "xdrFormat": "json" }
            })))
            .respond_with(rpc_result(json!({ "status": "NOT_FOUND", "latestLedger": 100 })))
            .expect(1)
            .mount(&server)
            .await;

        let client = create_mock_client(&server).await;
        let response = client.get_transaction("abcd").await.unwrap();
        assert_eq!(response.status, TransactionStatus::NotFound);
    }

    #[tokio::test]
    async fn test_rpc_error_object() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": -32602, "message": "invalid parameters" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = create_mock_client(&server).await;
        let err = client.simulate_transaction("AAAA").await.unwrap_err();
        assert!(matches!(err, StellarError::Rpc { code: -32602, .. }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_server_error_retryable() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .expect(1)
            .mount(&server)
            .await;

        let client = create_mock_client(&server).await;
        let err = client.get_transaction("abcd").await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_retries_transient_errors() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(rpc_result(json!({ "status": "SUCCESS", "ledger": 3 })))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/rpc", server.uri());
        let config = StellarConfig::custom(Network::Testnet, &url)
            .unwrap()
            .with_retry(
                RetryConfig::builder()
                    .max_retries(2)
                    .initial_delay_ms(1)
                    .jitter(false)
                    .build(),
            );
        let client = SorobanRpcClient::new(config).unwrap();
        let response = client.get_transaction("abcd").await.unwrap();
        assert_eq!(response.status, TransactionStatus::Success);
    }
}
