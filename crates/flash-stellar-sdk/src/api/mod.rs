//! Soroban RPC access.
//!
//! - [`SorobanRpc`] - the RPC methods the pipeline depends on
//! - [`SorobanRpcClient`] - JSON-RPC over HTTP implementation

pub mod response;
pub mod rpc;

pub use response::{
    AccountInfo, GetTransactionResponse, SendTransactionResponse, SendTransactionStatus,
    SimulateTransactionResponse, TransactionStatus,
};
pub use rpc::{SorobanRpc, SorobanRpcClient};
