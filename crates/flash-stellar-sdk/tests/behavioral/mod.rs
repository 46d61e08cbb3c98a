//! Behavioral tests for the contract-call pipeline.
//!
//! These tests drive [`ContractClient`] against an in-memory RPC node that
//! counts every call it receives, so each scenario can assert exactly which
//! network traffic happened.

mod support {
    use async_trait::async_trait;
    use flash_stellar_sdk::api::response::SimulateHostFunctionResult;
    use flash_stellar_sdk::api::{
        AccountInfo, GetTransactionResponse, SendTransactionResponse, SendTransactionStatus,
        SimulateTransactionResponse, SorobanRpc,
    };
    use flash_stellar_sdk::transaction::{KeypairSigner, TransactionSigner};
    use flash_stellar_sdk::types::ledger::SorobanResources;
    use flash_stellar_sdk::types::{
        AccountId, LedgerFootprint, LedgerKey, ScVal, SorobanTransactionData, WriteXdr,
    };
    use flash_stellar_sdk::{
        ClientContext, ContractClient, Network, NetworkConfig, PollConfig, StellarConfig,
        StellarResult,
    };
    use serde_json::Value;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    pub const CONTRACT: &str = "CA3D5KRYM6CB7OWQ6TWYRR3Z4T7GNZLKERYNZGGA5SOAOPIFY6YQGAXE";
    pub const WALLET: &str = "GA7QYNF7SOWQ3GLR2BGMZEHXAVIRZA4KVWLTJJFC7MGXUA74P7UJVSGZ";
    pub const HASH: &str = "5a1c0de5";

    /// RPC node answering from queued responses.
    #[derive(Default)]
    pub struct MockRpc {
        simulations: Mutex<VecDeque<SimulateTransactionResponse>>,
        statuses: Mutex<VecDeque<Value>>,
        simulated: Mutex<Vec<String>>,
        pub account_calls: AtomicUsize,
        pub simulate_calls: AtomicUsize,
        pub send_calls: AtomicUsize,
        pub status_calls: AtomicUsize,
    }

    impl MockRpc {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_simulation(self, response: SimulateTransactionResponse) -> Self {
            self.simulations.lock().unwrap().push_back(response);
            self
        }

        pub fn with_status(self, raw: Value) -> Self {
            self.push_status(raw);
            self
        }

        pub fn push_status(&self, raw: Value) {
            self.statuses.lock().unwrap().push_back(raw);
        }

        pub fn total_calls(&self) -> usize {
            self.account_calls.load(Ordering::SeqCst)
                + self.simulate_calls.load(Ordering::SeqCst)
                + self.send_calls.load(Ordering::SeqCst)
                + self.status_calls.load(Ordering::SeqCst)
        }

        pub fn simulated_envelopes(&self) -> Vec<String> {
            self.simulated.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SorobanRpc for MockRpc {
        async fn get_account(&self, account_id: &str) -> StellarResult<AccountInfo> {
            self.account_calls.fetch_add(1, Ordering::SeqCst);
            Ok(AccountInfo {
                account_id: account_id.to_string(),
                sequence: 100,
            })
        }

        async fn simulate_transaction(
            &self,
            envelope_xdr: &str,
        ) -> StellarResult<SimulateTransactionResponse> {
            self.simulate_calls.fetch_add(1, Ordering::SeqCst);
            self.simulated.lock().unwrap().push(envelope_xdr.to_string());
            Ok(self
                .simulations
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected simulateTransaction"))
        }

        async fn send_transaction(
            &self,
            _envelope_xdr: &str,
        ) -> StellarResult<SendTransactionResponse> {
            self.send_calls.fetch_add(1, Ordering::SeqCst);
            Ok(SendTransactionResponse {
                status: SendTransactionStatus::Pending,
                hash: HASH.to_string(),
                error_result_xdr: None,
                latest_ledger: 10,
            })
        }

        async fn get_transaction(&self, _hash: &str) -> StellarResult<GetTransactionResponse> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            let raw = self
                .statuses
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected getTransaction");
            GetTransactionResponse::from_value(raw)
        }
    }

    /// Signer that counts how often it was asked to sign.
    pub struct CountingSigner {
        inner: KeypairSigner,
        pub calls: AtomicUsize,
    }

    impl CountingSigner {
        pub fn new() -> Arc<Self> {
            Arc::new(Self {
                inner: KeypairSigner::generate(),
                calls: AtomicUsize::new(0),
            })
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TransactionSigner for CountingSigner {
        async fn sign_transaction(
            &self,
            unsigned_xdr: &str,
            network: &NetworkConfig,
        ) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.sign_transaction(unsigned_xdr, network).await
        }
    }

    fn transaction_data(reads: usize, writes: usize) -> String {
        let key = |i: usize| LedgerKey::Account(AccountId([i as u8; 32]));
        SorobanTransactionData {
            archived_entries: None,
            resources: SorobanResources {
                footprint: LedgerFootprint {
                    read_only: (0..reads).map(key).collect(),
                    read_write: (100..100 + writes).map(key).collect(),
                },
                instructions: 2_000_000,
                disk_read_bytes: 512,
                write_bytes: 128,
            },
            resource_fee: 40_000,
        }
        .to_xdr_base64()
    }

    pub fn simulation(reads: usize, writes: usize, value: ScVal) -> SimulateTransactionResponse {
        SimulateTransactionResponse {
            transaction_data: Some(transaction_data(reads, writes)),
            min_resource_fee: Some(40_000),
            results: Some(vec![SimulateHostFunctionResult {
                auth: vec![],
                xdr: value.to_xdr_base64(),
            }]),
            latest_ledger: 10,
            ..Default::default()
        }
    }

    pub fn read_simulation(value: ScVal) -> SimulateTransactionResponse {
        simulation(2, 0, value)
    }

    pub fn write_simulation(value: ScVal) -> SimulateTransactionResponse {
        simulation(1, 1, value)
    }

    pub fn failed_simulation(diagnostic: &str) -> SimulateTransactionResponse {
        SimulateTransactionResponse {
            error: Some(diagnostic.to_string()),
            latest_ledger: 10,
            ..Default::default()
        }
    }

    pub fn read_context() -> ClientContext {
        ClientContext::new(CONTRACT, NetworkConfig::new(Network::Testnet)).unwrap()
    }

    pub fn write_context(signer: Arc<dyn TransactionSigner>) -> ClientContext {
        read_context().with_shared_signer(signer)
    }

    pub fn client(rpc: MockRpc, context: ClientContext) -> ContractClient<MockRpc> {
        client_polling(rpc, context, PollConfig::default())
    }

    pub fn client_polling(
        rpc: MockRpc,
        context: ClientContext,
        poll: PollConfig,
    ) -> ContractClient<MockRpc> {
        ContractClient::with_rpc(rpc, StellarConfig::testnet().with_poll(poll), context).unwrap()
    }
}

mod classification_tests {
    use super::support::*;
    use flash_stellar_sdk::transaction::{Arg, ContractCall};
    use flash_stellar_sdk::types::ScVal;
    use flash_stellar_sdk::StellarError;
    use serde_json::{json, Value};
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_getter_is_read_only() {
        let rpc = MockRpc::new().with_simulation(read_simulation(ScVal::U32(3)));
        let client = client(rpc, read_context());

        let response = client
            .simulate(WALLET, &ContractCall::new("provider_count"))
            .await
            .unwrap();

        assert!(response.is_success);
        assert!(response.is_read_only);
        assert_eq!(response.value(), Some(&json!(3)));
        assert_eq!(client.rpc().simulate_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_provider_reads_as_null() {
        let rpc = MockRpc::new().with_simulation(read_simulation(ScVal::Void));
        let client = client(rpc, read_context());

        let call = ContractCall::new("get_provider").with_arg(Arg::address(WALLET));
        let response = client.simulate(WALLET, &call).await.unwrap();

        assert!(response.is_success);
        assert!(response.is_read_only);
        assert_eq!(response.value(), Some(&Value::Null));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "isSuccess": true, "confirmed": true, "isReadOnly": true, "result": null })
        );
        assert_eq!(client.rpc().send_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_mutating_method_is_write() {
        let rpc = MockRpc::new()
            .with_simulation(write_simulation(ScVal::Void))
            .with_simulation(write_simulation(ScVal::Void));
        let client = client(rpc, read_context());

        let call = ContractCall::for_wallet(WALLET, "register_provider", vec![Arg::string("One")]);
        let response = client.simulate(WALLET, &call).await.unwrap();

        assert!(response.is_success);
        assert!(!response.is_read_only);
        assert!(response.unsigned_payload().is_some());
        assert_eq!(client.rpc().send_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_reads_are_idempotent() {
        let rpc = MockRpc::new()
            .with_simulation(read_simulation(ScVal::U64(7)))
            .with_simulation(read_simulation(ScVal::U64(7)));
        let client = client(rpc, read_context());
        let call = ContractCall::new("get_balance").with_arg(Arg::address(WALLET));

        let first = client.simulate(WALLET, &call).await.unwrap();
        let second = client.simulate(WALLET, &call).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.value(), Some(&json!("7")));
    }

    #[tokio::test]
    async fn test_empty_footprint_is_ambiguous() {
        let rpc = MockRpc::new().with_simulation(simulation(0, 0, ScVal::Void));
        let client = client(rpc, read_context());

        let err = client
            .simulate(WALLET, &ContractCall::new("noop"))
            .await
            .unwrap_err();
        assert!(matches!(err, StellarError::AmbiguousFootprint { method } if method == "noop"));
    }

    #[tokio::test]
    async fn test_read_with_signer_is_never_signed() {
        let signer = CountingSigner::new();
        let rpc = MockRpc::new().with_simulation(read_simulation(ScVal::Bool(true)));
        let client = client(rpc, write_context(signer.clone()));

        let response = client
            .execute(WALLET, &ContractCall::new("is_active"))
            .await
            .unwrap();

        assert!(response.is_read_only);
        assert_eq!(signer.calls(), 0);
        assert_eq!(client.rpc().send_calls.load(Ordering::SeqCst), 0);
    }
}

mod encoding_tests {
    use super::support::*;
    use flash_stellar_sdk::transaction::{Arg, ArgType, ArgValue, ContractCall};
    use flash_stellar_sdk::types::{ScVal, WriteXdr};
    use flash_stellar_sdk::StellarError;
    use serde_json::json;

    #[tokio::test]
    async fn test_u32_round_trip() {
        let arg = Arg::from_json(&json!({ "value": 42, "type": "u32" })).unwrap();
        let encoded = arg.to_sc_val().unwrap();
        assert_eq!(encoded, ScVal::U32(42));

        // the contract echoes its argument
        let rpc = MockRpc::new().with_simulation(read_simulation(encoded.clone()));
        let client = client(rpc, read_context());
        let response = client
            .simulate(WALLET, &ContractCall::new("echo").with_arg(arg))
            .await
            .unwrap();
        assert_eq!(response.value(), Some(&json!(42)));

        let envelope = base64::decode(&client.rpc().simulated_envelopes()[0]).unwrap();
        let needle = encoded.to_xdr();
        assert!(envelope.windows(needle.len()).any(|w| w == needle.as_slice()));
    }

    #[tokio::test]
    async fn test_invalid_argument_makes_no_calls() {
        let client = client(MockRpc::new(), read_context());
        let call = ContractCall::new("set_limit")
            .with_arg(Arg::new(ArgValue::Signed(-1), ArgType::U32));

        let err = client.simulate(WALLET, &call).await.unwrap_err();
        match err {
            StellarError::Encoding { method, message } => {
                assert_eq!(method, "set_limit");
                assert!(message.starts_with("argument 0"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(client.rpc().total_calls(), 0);
    }

    #[test]
    fn test_null_vec_is_absent_optional() {
        assert_eq!(Arg::none().to_sc_val().unwrap(), ScVal::Vec(None));
        assert_eq!(Arg::vec(vec![]).to_sc_val().unwrap(), ScVal::Vec(Some(vec![])));
        assert!(Arg::new(ArgValue::Null, ArgType::U64).to_sc_val().is_err());
    }
}

mod signer_tests {
    use super::support::*;
    use anyhow::anyhow;
    use flash_stellar_sdk::transaction::{Arg, Batch, ContractCall, FnSigner};
    use flash_stellar_sdk::types::ScVal;
    use flash_stellar_sdk::{ClientContext, Network, NetworkConfig, StellarError};
    use serde_json::json;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_missing_signer_fails_fast() {
        let client = client(MockRpc::new(), read_context());

        let err = client
            .execute(WALLET, &ContractCall::new("deposit"))
            .await
            .unwrap_err();
        assert!(matches!(err.root(), StellarError::Configuration(_)));
        assert_eq!(err.method(), Some("deposit"));

        let batch = Batch::of([ContractCall::new("approve"), ContractCall::new("deposit")]);
        let err = client.execute_batch(WALLET, &batch).await.unwrap_err();
        assert!(matches!(err.root(), StellarError::Configuration(_)));
        assert_eq!(err.method(), Some("approve+deposit"));

        assert_eq!(client.rpc().total_calls(), 0);
    }

    #[tokio::test]
    async fn test_writer_for_other_network_is_rejected() {
        let signer = CountingSigner::new();
        let client = client(MockRpc::new(), read_context());
        let writer = ClientContext::new(CONTRACT, NetworkConfig::new(Network::Public))
            .unwrap()
            .with_shared_signer(signer.clone())
            .writer()
            .unwrap();

        let err = client
            .execute_with(&writer, WALLET, &ContractCall::new("deposit"))
            .await
            .unwrap_err();

        assert!(matches!(err.root(), StellarError::Configuration(_)));
        assert_eq!(err.method(), Some("deposit"));
        assert_eq!(signer.calls(), 0);
        assert_eq!(client.rpc().total_calls(), 0);
    }

    #[tokio::test]
    async fn test_signing_error_is_wrapped() {
        let rpc = MockRpc::new()
            .with_simulation(write_simulation(ScVal::Void))
            .with_simulation(write_simulation(ScVal::Void));
        let signer = FnSigner::new(|_unsigned: String| async move {
            Err::<String, _>(anyhow!("wallet is locked"))
        });
        let client = client(rpc, read_context().with_signer(signer));

        let err = client
            .execute_wallet(WALLET, "deposit", vec![Arg::i128(10)])
            .await
            .unwrap_err();
        match err {
            StellarError::Signing { method, source } => {
                assert_eq!(method, "deposit");
                assert_eq!(source.to_string(), "wallet is locked");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(client.rpc().send_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_is_signed_once_and_confirmed() {
        let signer = CountingSigner::new();
        let rpc = MockRpc::new()
            .with_simulation(write_simulation(ScVal::U32(7)))
            .with_simulation(write_simulation(ScVal::U32(7)))
            .with_status(json!({
                "status": "SUCCESS",
                "ledger": 11,
                "returnValue": { "u32": 7 }
            }));
        let client = client(rpc, write_context(signer.clone()));

        let response = client
            .execute_wallet(WALLET, "deposit", vec![Arg::i128(500)])
            .await
            .unwrap();

        assert!(response.is_success);
        assert!(!response.is_read_only);
        assert!(response.is_confirmed());
        assert_eq!(response.value(), Some(&json!(7)));
        assert_eq!(response.outcome().unwrap().hash(), HASH);

        assert_eq!(signer.calls(), 1);
        let rpc = client.rpc();
        assert_eq!(rpc.simulate_calls.load(Ordering::SeqCst), 2);
        assert_eq!(rpc.send_calls.load(Ordering::SeqCst), 1);
        assert_eq!(rpc.status_calls.load(Ordering::SeqCst), 1);
    }
}

mod batch_tests {
    use super::support::*;
    use flash_stellar_sdk::transaction::{Arg, Batch, ContractCall};
    use flash_stellar_sdk::types::ScVal;
    use flash_stellar_sdk::StellarError;
    use serde_json::json;
    use std::sync::atomic::Ordering;

    fn deposit_batch() -> Batch {
        Batch::new()
            .call(ContractCall::for_wallet(WALLET, "approve", vec![Arg::i128(1_000)]))
            .call(ContractCall::for_wallet(WALLET, "deposit", vec![Arg::i128(1_000)]))
    }

    #[tokio::test]
    async fn test_failed_simulation_signs_nothing() {
        let signer = CountingSigner::new();
        let rpc = MockRpc::new()
            .with_simulation(failed_simulation("HostError: Error(Contract, #10)"));
        let client = client(rpc, write_context(signer.clone()));

        let err = client.execute_batch(WALLET, &deposit_batch()).await.unwrap_err();
        match err {
            StellarError::Simulation { method, diagnostic } => {
                assert_eq!(method, "approve+deposit");
                assert_eq!(diagnostic, "HostError: Error(Contract, #10)");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert_eq!(signer.calls(), 0);
        let rpc = client.rpc();
        assert_eq!(rpc.simulate_calls.load(Ordering::SeqCst), 1);
        assert_eq!(rpc.send_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mixed_batch_takes_write_path() {
        let signer = CountingSigner::new();
        let rpc = MockRpc::new()
            .with_simulation(write_simulation(ScVal::Void))
            .with_simulation(write_simulation(ScVal::Void))
            .with_status(json!({ "status": "SUCCESS", "ledger": 12 }));
        let client = client(rpc, write_context(signer.clone()));

        let batch = Batch::new()
            .call(ContractCall::new("provider_count"))
            .call(ContractCall::for_wallet(WALLET, "deposit", vec![Arg::i128(5)]));
        let response = client.execute_batch(WALLET, &batch).await.unwrap();

        assert!(!response.is_read_only);
        assert!(response.is_confirmed());
        assert_eq!(signer.calls(), 1);
        assert_eq!(client.rpc().send_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_batch_is_one_envelope() {
        let rpc = MockRpc::new().with_simulation(read_simulation(ScVal::U32(1)));
        let client = client(rpc, read_context());

        let batch = Batch::of([
            ContractCall::new("provider_count"),
            ContractCall::new("consumer_count"),
            ContractCall::new("bucket_count"),
        ]);
        let response = client.simulate_batch(WALLET, &batch).await.unwrap();

        assert!(response.is_read_only);
        let rpc = client.rpc();
        assert_eq!(rpc.account_calls.load(Ordering::SeqCst), 1);
        assert_eq!(rpc.simulate_calls.load(Ordering::SeqCst), 1);
    }
}

mod polling_tests {
    use super::support::*;
    use flash_stellar_sdk::api::TransactionStatus;
    use flash_stellar_sdk::transaction::{Arg, TransactionOutcome};
    use flash_stellar_sdk::types::ScVal;
    use flash_stellar_sdk::{PollConfig, StellarError};
    use serde_json::{json, Value};
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use tokio::time::Instant;

    fn write_rpc() -> MockRpc {
        MockRpc::new()
            .with_simulation(write_simulation(ScVal::Void))
            .with_simulation(write_simulation(ScVal::Void))
    }

    fn unreadable(status: &str) -> Value {
        json!({ "status": status, "ledger": "not a number" })
    }

    #[tokio::test(start_paused = true)]
    async fn test_format_mismatch_retried_once_after_two_seconds() {
        let rpc = write_rpc()
            .with_status(unreadable("SUCCESS"))
            .with_status(json!({ "status": "SUCCESS", "ledger": 9, "returnValue": { "u32": 1 } }));
        let client = client(rpc, write_context(CountingSigner::new()));

        let started = Instant::now();
        let response = client
            .execute_wallet(WALLET, "deposit", vec![Arg::i128(1)])
            .await
            .unwrap();
        let elapsed = started.elapsed();

        assert!(response.is_confirmed());
        assert_eq!(response.value(), Some(&json!(1)));
        assert_eq!(client.rpc().status_calls.load(Ordering::SeqCst), 2);
        // one poll interval, then the two second retry delay
        assert!(elapsed >= Duration::from_secs(3), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_secs(4), "elapsed {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_mismatch_propagates() {
        let rpc = write_rpc()
            .with_status(json!({ "status": "ARCHIVED" }))
            .with_status(json!({ "status": "ARCHIVED" }));
        let client = client(rpc, write_context(CountingSigner::new()));

        let err = client
            .execute_wallet(WALLET, "deposit", vec![Arg::i128(1)])
            .await
            .unwrap_err();

        assert!(matches!(err.root(), StellarError::ResponseParsing { .. }));
        assert_eq!(err.method(), Some("deposit"));
        assert_eq!(client.rpc().status_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreadable_not_found_is_presumed_and_reverifiable() {
        let mut rpc = write_rpc();
        for _ in 0..6 {
            rpc = rpc.with_status(unreadable("NOT_FOUND"));
        }
        let client = client(rpc, write_context(CountingSigner::new()));

        let response = client
            .execute_wallet(WALLET, "deposit", vec![Arg::i128(1)])
            .await
            .unwrap();

        assert!(response.is_success);
        assert!(!response.is_confirmed());
        assert_eq!(
            response.outcome(),
            Some(&TransactionOutcome::Presumed { hash: HASH.into() })
        );
        // three polls, each retried once
        assert_eq!(client.rpc().status_calls.load(Ordering::SeqCst), 6);

        client
            .rpc()
            .push_status(json!({ "status": "SUCCESS", "ledger": 20 }));
        let status = client.transaction_status(HASH).await.unwrap();
        assert_eq!(status.status, TransactionStatus::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clean_not_found_times_out() {
        let mut rpc = write_rpc();
        for _ in 0..3 {
            rpc = rpc.with_status(json!({ "status": "NOT_FOUND" }));
        }
        let client = client_polling(
            rpc,
            write_context(CountingSigner::new()),
            PollConfig::default().with_max_attempts(3),
        );

        let err = client
            .execute_wallet(WALLET, "deposit", vec![Arg::i128(1)])
            .await
            .unwrap_err();

        assert!(err.is_unconfirmed());
        assert_eq!(err.method(), Some("deposit"));
        assert!(err.to_string().contains("deposit"));
        match err {
            StellarError::PollTimeout { hash, attempts, .. } => {
                assert_eq!(hash, HASH);
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_clean_not_found_restarts_presumption() {
        // two unreadable polls, a clean answer, two unreadable polls, a clean answer
        let mut rpc = write_rpc();
        for _ in 0..2 {
            for _ in 0..2 {
                // each unreadable poll is retried once
                rpc = rpc
                    .with_status(unreadable("NOT_FOUND"))
                    .with_status(unreadable("NOT_FOUND"));
            }
            rpc = rpc.with_status(json!({ "status": "NOT_FOUND" }));
        }
        let client = client_polling(
            rpc,
            write_context(CountingSigner::new()),
            PollConfig::default().with_max_attempts(6),
        );

        let err = client
            .execute_wallet(WALLET, "deposit", vec![Arg::i128(1)])
            .await
            .unwrap_err();

        assert_eq!(err.method(), Some("deposit"));
        assert!(matches!(err, StellarError::PollTimeout { attempts: 6, .. }));
        assert_eq!(client.rpc().status_calls.load(Ordering::SeqCst), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_signed_only_submits() {
        let rpc = MockRpc::new().with_status(json!({ "status": "FAILED", "resultXdr": "AAAAAAAAAGT/////AAAAAA==" }));
        let client = client(rpc, read_context());

        let err = client.submit_signed("AAAA").await.unwrap_err();
        match err {
            StellarError::Submission { status, diagnostic, .. } => {
                assert_eq!(status, "FAILED");
                assert!(diagnostic.starts_with("txFAILED"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(client.rpc().simulate_calls.load(Ordering::SeqCst), 0);
    }
}

mod network_tests {
    use flash_stellar_sdk::{Network, NetworkConfig, StellarConfig, StellarError};

    #[test]
    fn test_network_ids() {
        let testnet = NetworkConfig::from_id("TESTNET").unwrap();
        assert_eq!(testnet.network(), Network::Testnet);
        assert_eq!(testnet.passphrase(), "Test SDF Network ; September 2015");

        let public = NetworkConfig::from_id("PUBLIC").unwrap();
        assert_eq!(
            public.passphrase(),
            "Public Global Stellar Network ; September 2015"
        );
    }

    #[test]
    fn test_unknown_network_is_rejected() {
        let err = NetworkConfig::from_id("FUTURENET").unwrap_err();
        assert!(matches!(err, StellarError::UnsupportedNetwork(_)));
        assert!(StellarConfig::for_network_id("LOCAL").is_err());
    }
}
