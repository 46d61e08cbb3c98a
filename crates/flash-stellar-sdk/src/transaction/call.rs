//! Contract calls.

use crate::error::{StellarError, StellarResult};
use crate::transaction::args::{encode_args, validate_symbol, Arg};
use flash_stellar_types::transaction::InvokeContractArgs;
use flash_stellar_types::ScAddress;
use serde_json::Value;

/// One contract method invocation with its typed arguments.
///
/// # Example
///
/// ```rust
/// use flash_stellar_sdk::transaction::{Arg, ContractCall};
///
/// let call = ContractCall::new("get_provider")
///     .with_arg(Arg::address("GA7QYNF7SOWQ3GLR2BGMZEHXAVIRZA4KVWLTJJFC7MGXUA74P7UJVSGZ"));
/// assert_eq!(call.method(), "get_provider");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    method: String,
    args: Vec<Arg>,
}

impl ContractCall {
    /// A call of `method` without arguments.
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            args: Vec::new(),
        }
    }

    /// A call of `method` with `args`.
    pub fn with_args(method: impl Into<String>, args: Vec<Arg>) -> Self {
        Self {
            method: method.into(),
            args,
        }
    }

    /// A call made on behalf of `wallet`: the wallet address becomes the
    /// first argument.
    pub fn for_wallet(wallet: impl Into<String>, method: impl Into<String>, args: Vec<Arg>) -> Self {
        let mut all = Vec::with_capacity(args.len() + 1);
        all.push(Arg::address(wallet));
        all.extend(args);
        Self {
            method: method.into(),
            args: all,
        }
    }

    /// Reads the `{ "method": ..., "args": [...] }` form used by dynamic callers.
    ///
    /// `args` may be omitted; each entry has the form read by [`Arg::from_json`].
    pub fn from_json(json: &Value) -> Result<Self, String> {
        let method = json
            .get("method")
            .and_then(Value::as_str)
            .ok_or_else(|| "call is missing its \"method\"".to_string())?;
        let args = match json.get("args") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| Arg::from_json(item).map_err(|e| format!("argument {i}: {e}")))
                .collect::<Result<_, _>>()?,
            Some(_) => return Err("\"args\" must be an array".to_string()),
        };
        Ok(Self::with_args(method, args))
    }

    /// Appends an argument.
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<Arg>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// The method name.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The arguments, in order.
    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    /// Encodes the invocation of this call on `contract`.
    pub(crate) fn to_invoke_args(&self, contract: &ScAddress) -> StellarResult<InvokeContractArgs> {
        validate_symbol(&self.method).map_err(|e| {
            StellarError::encoding(&self.method, format!("method name: {e}"))
        })?;
        Ok(InvokeContractArgs {
            contract_address: *contract,
            function_name: self.method.clone(),
            args: encode_args(&self.method, &self.args)?,
        })
    }
}

/// The label used in errors and logs for a group of calls.
pub(crate) fn joined_method_names(calls: &[ContractCall]) -> String {
    calls
        .iter()
        .map(ContractCall::method)
        .collect::<Vec<_>>()
        .join("+")
}

#[cfg(test)]
mod tests {
    use super::*;
    use flash_stellar_types::ScVal;

    const WALLET: &str = "GA7QYNF7SOWQ3GLR2BGMZEHXAVIRZA4KVWLTJJFC7MGXUA74P7UJVSGZ";

    #[test]
    fn test_for_wallet_prepends_address() {
        let call = ContractCall::for_wallet(WALLET, "deposit", vec![Arg::i128(500)]);
        assert_eq!(call.args().len(), 2);
        assert_eq!(call.args()[0], Arg::address(WALLET));

        let contract = ScAddress::Contract([3; 32]);
        let invoke = call.to_invoke_args(&contract).unwrap();
        assert_eq!(invoke.function_name, "deposit");
        assert!(matches!(invoke.args[0], ScVal::Address(ScAddress::Account(_))));
        assert_eq!(invoke.args[1], ScVal::I128(500));
    }

    #[test]
    fn test_invalid_method_name() {
        let call = ContractCall::new("not a symbol");
        let err = call.to_invoke_args(&ScAddress::Contract([0; 32])).unwrap_err();
        assert!(matches!(err, StellarError::Encoding { .. }));
    }

    #[test]
    fn test_from_json() {
        let call = ContractCall::from_json(&serde_json::json!({
            "method": "set_limit",
            "args": [{ "value": 7, "type": "u64" }]
        }))
        .unwrap();
        assert_eq!(call, ContractCall::new("set_limit").with_arg(Arg::u64(7)));

        let call = ContractCall::from_json(&serde_json::json!({ "method": "version" })).unwrap();
        assert!(call.args().is_empty());

        assert!(ContractCall::from_json(&serde_json::json!({ "args": [] })).is_err());
    }

    #[test]
    fn test_joined_names() {
        let calls = vec![ContractCall::new("approve"), ContractCall::new("deposit")];
        assert_eq!(joined_method_names(&calls), "approve+deposit");
    }
}
