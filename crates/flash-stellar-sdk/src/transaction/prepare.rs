//! Preparation of write transactions.
//!
//! A write cannot be accepted by the ledger until it declares the resources
//! it uses. Preparing re-simulates the transaction and attaches the
//! simulation's resource data, authorization entries and resource fee.

use crate::api::SorobanRpc;
use crate::error::{StellarError, StellarResult};
use crate::transaction::simulation::Simulation;
use flash_stellar_types::{OperationBody, Transaction, TransactionEnvelope, WriteXdr};
use tracing::debug;

/// Encodes `tx` as an unsigned base64 envelope.
pub fn unsigned_payload(tx: &Transaction) -> String {
    TransactionEnvelope::unsigned(tx.clone()).to_xdr_base64()
}

/// Simulates `tx` again and assembles the result into it.
///
/// # Errors
///
/// Returns [`StellarError::Preparation`] if the node rejects the dry run,
/// archived entries must first be restored, or the result cannot be
/// attached. Transport errors pass through unchanged.
pub async fn prepare_transaction<R>(rpc: &R, tx: Transaction, method: &str) -> StellarResult<Transaction>
where
    R: SorobanRpc + ?Sized,
{
    debug!(method = %method, operations = tx.operations.len(), "Preparing transaction");
    let response = rpc.simulate_transaction(&unsigned_payload(&tx)).await?;

    let simulation = Simulation::from_response(method, response).map_err(|e| match e {
        StellarError::Simulation { method, diagnostic } => StellarError::Preparation {
            method,
            message: diagnostic,
        },
        other => other,
    })?;

    if simulation.needs_restore() {
        return Err(StellarError::Preparation {
            method: method.to_string(),
            message: "archived ledger entries must be restored before this call".into(),
        });
    }

    assemble_transaction(tx, &simulation)
}

/// Attaches a simulation's resources to `tx`.
///
/// The resource fee is added to the inclusion fee already on the
/// transaction, and each contract call gets the authorization entries its
/// simulated invocation returned. Operations keep their order.
///
/// # Errors
///
/// Returns [`StellarError::Preparation`] when the simulation has no
/// resource data or the combined fee does not fit.
pub fn assemble_transaction(mut tx: Transaction, simulation: &Simulation) -> StellarResult<Transaction> {
    let method = simulation.method();
    let preparation = |message: String| StellarError::Preparation {
        method: method.to_string(),
        message,
    };

    let data = simulation
        .transaction_data()
        .cloned()
        .ok_or_else(|| preparation("simulation returned no resource data".into()))?;

    let fee = u64::from(tx.fee)
        .checked_add(simulation.min_resource_fee())
        .and_then(|fee| u32::try_from(fee).ok())
        .ok_or_else(|| {
            preparation(format!(
                "fee {} plus resource fee {} exceeds the maximum",
                tx.fee,
                simulation.min_resource_fee()
            ))
        })?;

    let mut invocations = simulation.invocations().iter();
    for operation in &mut tx.operations {
        if let OperationBody::InvokeHostFunction(invoke) = &mut operation.body {
            if let Some(invocation) = invocations.next() {
                if invoke.auth.is_empty() {
                    invoke.auth = invocation.auth.clone();
                }
            }
        }
    }

    debug!(
        method = %method,
        fee,
        resource_fee = simulation.min_resource_fee(),
        "Assembled transaction"
    );
    tx.fee = fee;
    tx.soroban_data = Some(data);
    Ok(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::response::{RestorePreamble, SimulateHostFunctionResult};
    use crate::api::{
        AccountInfo, GetTransactionResponse, SendTransactionResponse, SimulateTransactionResponse,
    };
    use crate::transaction::builder::TransactionBuilder;
    use crate::transaction::call::ContractCall;
    use crate::transaction::simulation::tests::transaction_data;
    use async_trait::async_trait;
    use flash_stellar_types::ScAddress;
    use std::sync::Mutex;

    struct FixedSimulation(Mutex<Option<SimulateTransactionResponse>>);

    #[async_trait]
    impl SorobanRpc for FixedSimulation {
        async fn get_account(&self, _account_id: &str) -> StellarResult<AccountInfo> {
            unreachable!()
        }

        async fn simulate_transaction(&self, _envelope_xdr: &str) -> StellarResult<SimulateTransactionResponse> {
            Ok(self.0.lock().unwrap().take().unwrap())
        }

        async fn send_transaction(&self, _envelope_xdr: &str) -> StellarResult<SendTransactionResponse> {
            unreachable!()
        }

        async fn get_transaction(&self, _hash: &str) -> StellarResult<GetTransactionResponse> {
            unreachable!()
        }
    }

    fn transaction() -> Transaction {
        let account = AccountInfo {
            account_id: "GA7QYNF7SOWQ3GLR2BGMZEHXAVIRZA4KVWLTJJFC7MGXUA74P7UJVSGZ".into(),
            sequence: 1,
        };
        TransactionBuilder::new(&account)
            .unwrap()
            .add_contract_call(&ScAddress::Contract([9; 32]), &ContractCall::new("deposit"))
            .unwrap()
            .build()
            .unwrap()
    }

    fn write_simulation() -> SimulateTransactionResponse {
        SimulateTransactionResponse {
            transaction_data: Some(transaction_data(1, 1)),
            min_resource_fee: Some(58_181),
            results: Some(vec![SimulateHostFunctionResult {
                auth: vec![base64::encode([1u8, 2, 3, 4])],
                xdr: String::new(),
            }]),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_prepare_attaches_resources() {
        let rpc = FixedSimulation(Mutex::new(Some(write_simulation())));
        let prepared = prepare_transaction(&rpc, transaction(), "deposit").await.unwrap();

        assert_eq!(prepared.fee, 100 + 58_181);
        assert!(prepared.soroban_data.is_some());
        match &prepared.operations[0].body {
            OperationBody::InvokeHostFunction(invoke) => {
                assert_eq!(invoke.auth, vec![vec![1u8, 2, 3, 4]]);
            }
            other => panic!("unexpected operation: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rejection_is_preparation_error() {
        let rpc = FixedSimulation(Mutex::new(Some(SimulateTransactionResponse {
            error: Some("resource limit exceeded".into()),
            ..Default::default()
        })));
        let err = prepare_transaction(&rpc, transaction(), "deposit").await.unwrap_err();
        match err {
            StellarError::Preparation { method, message } => {
                assert_eq!(method, "deposit");
                assert_eq!(message, "resource limit exceeded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_restore_required() {
        let mut response = write_simulation();
        response.restore_preamble = Some(RestorePreamble {
            transaction_data: transaction_data(0, 1),
            min_resource_fee: Some(1),
        });
        let rpc = FixedSimulation(Mutex::new(Some(response)));
        let err = prepare_transaction(&rpc, transaction(), "deposit").await.unwrap_err();
        assert!(matches!(err, StellarError::Preparation { .. }));
    }

    #[test]
    fn test_fee_overflow() {
        let mut response = write_simulation();
        response.min_resource_fee = Some(u64::from(u32::MAX));
        let simulation = Simulation::from_response("deposit", response).unwrap();
        let err = assemble_transaction(transaction(), &simulation).unwrap_err();
        assert!(matches!(err, StellarError::Preparation { .. }));
    }
}
