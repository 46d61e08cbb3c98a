//! Typed contract arguments.
//!
//! An [`Arg`] pairs a loosely typed value with the contract type it must be
//! encoded as. Encoding checks that the value fits the type (no negative
//! `u32`, no 40-character symbol) before anything touches the network.
//!
//! # Example
//!
//! ```rust
//! use flash_stellar_sdk::transaction::{encode_args, Arg};
//!
//! let args = vec![
//!     Arg::address("GA7QYNF7SOWQ3GLR2BGMZEHXAVIRZA4KVWLTJJFC7MGXUA74P7UJVSGZ"),
//!     Arg::u32(42),
//!     Arg::vec(vec![Arg::symbol("tier_1"), Arg::symbol("tier_2")]),
//!     Arg::none(),
//! ];
//! let encoded = encode_args("register_provider", &args).unwrap();
//! assert_eq!(encoded.len(), 4);
//! ```

use crate::error::{StellarError, StellarResult};
use flash_stellar_types::scval::SCSYMBOL_LIMIT;
use flash_stellar_types::{ScAddress, ScVal};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Contract types an argument can be encoded as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgType {
    /// `u32`
    U32,
    /// `i32`
    I32,
    /// `u64`
    U64,
    /// `i64`
    I64,
    /// `u128`
    U128,
    /// `i128`
    I128,
    /// UTF-8 string
    String,
    /// Symbol: up to 32 characters of `[A-Za-z0-9_]`
    Symbol,
    /// Account or contract address
    Address,
    /// Boolean
    Bool,
    /// Vector of typed arguments, or an absent optional when null
    Vec,
}

impl ArgType {
    /// The lowercase type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::U32 => "u32",
            Self::I32 => "i32",
            Self::U64 => "u64",
            Self::I64 => "i64",
            Self::U128 => "u128",
            Self::I128 => "i128",
            Self::String => "string",
            Self::Symbol => "symbol",
            Self::Address => "address",
            Self::Bool => "bool",
            Self::Vec => "vec",
        }
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArgType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "u32" => Self::U32,
            "i32" => Self::I32,
            "u64" => Self::U64,
            "i64" => Self::I64,
            "u128" => Self::U128,
            "i128" => Self::I128,
            "string" => Self::String,
            "symbol" => Self::Symbol,
            "address" => Self::Address,
            "bool" => Self::Bool,
            "vec" => Self::Vec,
            other => return Err(format!("unknown argument type {other:?}")),
        })
    }
}

/// An argument value before it is checked against its type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    /// No value; only valid for `vec`, where it means "not provided"
    Null,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Signed(i128),
    /// Unsigned integer
    Unsigned(u128),
    /// Text: strings, symbols, addresses, or decimal integers
    Text(String),
    /// Elements of a `vec`
    List(Vec<Arg>),
}

/// A value paired with the contract type it is encoded as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arg {
    value: ArgValue,
    ty: ArgType,
}

impl Arg {
    /// Pairs a value with a type. The pairing is checked on encoding.
    pub fn new(value: ArgValue, ty: ArgType) -> Self {
        Self { value, ty }
    }

    /// A `u32` argument.
    pub fn u32(value: u32) -> Self {
        Self::new(ArgValue::Unsigned(value.into()), ArgType::U32)
    }

    /// An `i32` argument.
    pub fn i32(value: i32) -> Self {
        Self::new(ArgValue::Signed(value.into()), ArgType::I32)
    }

    /// A `u64` argument.
    pub fn u64(value: u64) -> Self {
        Self::new(ArgValue::Unsigned(value.into()), ArgType::U64)
    }

    /// An `i64` argument.
    pub fn i64(value: i64) -> Self {
        Self::new(ArgValue::Signed(value.into()), ArgType::I64)
    }

    /// A `u128` argument.
    pub fn u128(value: u128) -> Self {
        Self::new(ArgValue::Unsigned(value), ArgType::U128)
    }

    /// An `i128` argument.
    pub fn i128(value: i128) -> Self {
        Self::new(ArgValue::Signed(value), ArgType::I128)
    }

    /// A string argument.
    pub fn string(value: impl Into<String>) -> Self {
        Self::new(ArgValue::Text(value.into()), ArgType::String)
    }

    /// A symbol argument.
    pub fn symbol(value: impl Into<String>) -> Self {
        Self::new(ArgValue::Text(value.into()), ArgType::Symbol)
    }

    /// An address argument (`G...` or `C...`).
    pub fn address(value: impl Into<String>) -> Self {
        Self::new(ArgValue::Text(value.into()), ArgType::Address)
    }

    /// A boolean argument.
    pub fn bool(value: bool) -> Self {
        Self::new(ArgValue::Bool(value), ArgType::Bool)
    }

    /// A vector of arguments; an empty list is still a present list.
    pub fn vec(items: Vec<Arg>) -> Self {
        Self::new(ArgValue::List(items), ArgType::Vec)
    }

    /// An absent optional list, distinct from an empty one.
    pub fn none() -> Self {
        Self::new(ArgValue::Null, ArgType::Vec)
    }

    /// Reads the `{ "value": ..., "type": ... }` form used by dynamic callers.
    ///
    /// `vec` values are arrays of the same form, or `null`.
    pub fn from_json(json: &Value) -> Result<Self, String> {
        let ty: ArgType = json
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| "argument is missing its \"type\"".to_string())?
            .parse()?;
        let value = match json.get("value").unwrap_or(&Value::Null) {
            Value::Null => ArgValue::Null,
            Value::Bool(b) => ArgValue::Bool(*b),
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    ArgValue::Unsigned(u.into())
                } else if let Some(i) = n.as_i64() {
                    ArgValue::Signed(i.into())
                } else {
                    return Err(format!("{n} is not an integer"));
                }
            }
            Value::String(s) => ArgValue::Text(s.clone()),
            Value::Array(items) => ArgValue::List(
                items
                    .iter()
                    .map(Arg::from_json)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Value::Object(_) => return Err("object values are not supported".to_string()),
        };
        Ok(Self::new(value, ty))
    }

    /// The declared type.
    pub fn arg_type(&self) -> ArgType {
        self.ty
    }

    /// The unchecked value.
    pub fn value(&self) -> &ArgValue {
        &self.value
    }

    /// Encodes the argument, checking the value fits the type.
    ///
    /// # Errors
    ///
    /// Returns a description of the mismatch; [`encode_args`] wraps it in
    /// [`StellarError::Encoding`].
    pub fn to_sc_val(&self) -> Result<ScVal, String> {
        let ty = self.ty;
        match (ty, &self.value) {
            (ArgType::Vec, ArgValue::Null) => Ok(ScVal::Vec(None)),
            (ArgType::Vec, ArgValue::List(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| item.to_sc_val().map_err(|e| format!("element {i}: {e}")))
                .collect::<Result<Vec<_>, _>>()
                .map(|items| ScVal::Vec(Some(items))),
            (_, ArgValue::Null) => Err(format!("null is not a valid {ty}")),
            (ArgType::U32, v) => integer::<u32>(v, ty).map(ScVal::U32),
            (ArgType::I32, v) => integer::<i32>(v, ty).map(ScVal::I32),
            (ArgType::U64, v) => integer::<u64>(v, ty).map(ScVal::U64),
            (ArgType::I64, v) => integer::<i64>(v, ty).map(ScVal::I64),
            (ArgType::U128, v) => integer::<u128>(v, ty).map(ScVal::U128),
            (ArgType::I128, v) => integer::<i128>(v, ty).map(ScVal::I128),
            (ArgType::Bool, ArgValue::Bool(b)) => Ok(ScVal::Bool(*b)),
            (ArgType::String, ArgValue::Text(s)) => Ok(ScVal::String(s.clone())),
            (ArgType::Symbol, ArgValue::Text(s)) => {
                validate_symbol(s)?;
                Ok(ScVal::Symbol(s.clone()))
            }
            (ArgType::Address, ArgValue::Text(s)) => parse_address(s).map(ScVal::Address),
            (_, v) => Err(format!("{} is not a valid {ty}", describe(v))),
        }
    }
}

impl From<u32> for Arg {
    fn from(value: u32) -> Self {
        Self::u32(value)
    }
}

impl From<i32> for Arg {
    fn from(value: i32) -> Self {
        Self::i32(value)
    }
}

impl From<u64> for Arg {
    fn from(value: u64) -> Self {
        Self::u64(value)
    }
}

impl From<i64> for Arg {
    fn from(value: i64) -> Self {
        Self::i64(value)
    }
}

impl From<u128> for Arg {
    fn from(value: u128) -> Self {
        Self::u128(value)
    }
}

impl From<i128> for Arg {
    fn from(value: i128) -> Self {
        Self::i128(value)
    }
}

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Self::bool(value)
    }
}

/// Encodes the arguments of `method`, in order.
///
/// # Errors
///
/// Returns [`StellarError::Encoding`] naming the method and the position of
/// the first argument that does not fit its type.
pub fn encode_args(method: &str, args: &[Arg]) -> StellarResult<Vec<ScVal>> {
    args.iter()
        .enumerate()
        .map(|(i, arg)| {
            arg.to_sc_val()
                .map_err(|e| StellarError::encoding(method, format!("argument {i}: {e}")))
        })
        .collect()
}

/// Checks a symbol: non-empty, at most 32 characters of `[A-Za-z0-9_]`.
pub(crate) fn validate_symbol(s: &str) -> Result<(), String> {
    if s.is_empty() {
        return Err("symbol must not be empty".to_string());
    }
    if s.len() > SCSYMBOL_LIMIT as usize {
        return Err(format!(
            "symbol {s:?} is longer than {SCSYMBOL_LIMIT} characters"
        ));
    }
    if let Some(c) = s.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
        return Err(format!("symbol {s:?} contains invalid character {c:?}"));
    }
    Ok(())
}

fn parse_address(s: &str) -> Result<ScAddress, String> {
    let address: ScAddress = s
        .parse()
        .map_err(|e| format!("{s:?} is not a valid address: {e}"))?;
    match address {
        ScAddress::Account(_) | ScAddress::Contract(_) | ScAddress::MuxedAccount { .. } => {
            Ok(address)
        }
        _ => Err(format!("{s:?} is not an account or contract address")),
    }
}

fn integer<T>(value: &ArgValue, ty: ArgType) -> Result<T, String>
where
    T: TryFrom<i128> + TryFrom<u128> + FromStr,
{
    let out_of_range = |v: &dyn fmt::Display| format!("{v} is out of range for {ty}");
    match value {
        ArgValue::Signed(v) => T::try_from(*v).map_err(|_| out_of_range(v)),
        ArgValue::Unsigned(v) => T::try_from(*v).map_err(|_| out_of_range(v)),
        ArgValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty()
                || !trimmed
                    .trim_start_matches('-')
                    .bytes()
                    .all(|b| b.is_ascii_digit())
            {
                return Err(format!("{s:?} is not an integer"));
            }
            trimmed.parse::<T>().map_err(|_| out_of_range(&trimmed))
        }
        other => Err(format!("{} is not a valid {ty}", describe(other))),
    }
}

fn describe(value: &ArgValue) -> String {
    match value {
        ArgValue::Null => "null".to_string(),
        ArgValue::Bool(b) => b.to_string(),
        ArgValue::Signed(v) => v.to_string(),
        ArgValue::Unsigned(v) => v.to_string(),
        ArgValue::Text(s) => format!("{s:?}"),
        ArgValue::List(items) => format!("a list of {} items", items.len()),
    }
}
