//! Reader for the JSON rendering of contract values.
//!
//! RPC nodes asked for `xdrFormat: "json"` return metadata with `SCVal`s in
//! the serde form of the protocol types (`{"u32": 42}`, `{"vec": [...]}`,
//! `"void"`). The rendering of wide integers has drifted across releases
//! (numbers, decimal strings, `{hi, lo}` parts), so every form is accepted.

use crate::native::decimal_to_256;
use crate::scval::{ContractExecutable, ContractInstance, ScAddress, ScError, ScMapEntry, ScVal};
use crate::xdr::{XdrError, MAX_DEPTH};
use serde_json::Value;

const ERROR_TYPES: &[&str] = &[
    "contract", "wasm_vm", "context", "storage", "object", "crypto", "events", "budget", "value",
    "auth",
];

const ERROR_CODES: &[&str] = &[
    "arith_domain",
    "index_bounds",
    "invalid_input",
    "missing_value",
    "existing_value",
    "exceeded_limit",
    "invalid_action",
    "internal_error",
    "unexpected_type",
    "unexpected_size",
];

fn invalid(msg: impl Into<String>) -> XdrError {
    XdrError::InvalidJson(msg.into())
}

impl ScVal {
    /// Reads a contract value from its JSON rendering.
    ///
    /// # Errors
    ///
    /// Returns [`XdrError::InvalidJson`] if the value is not a recognizable
    /// `SCVal` shape.
    pub fn from_json(value: &Value) -> Result<Self, XdrError> {
        from_json_at(value, 0)
    }

    /// Whether `value` looks like the JSON rendering of a contract value.
    pub fn is_json_shaped(value: &Value) -> bool {
        Self::from_json(value).is_ok()
    }
}

fn from_json_at(value: &Value, depth: u32) -> Result<ScVal, XdrError> {
    if depth > MAX_DEPTH {
        return Err(XdrError::DepthExceeded);
    }
    if let Value::String(tag) = value {
        return match tag.as_str() {
            "void" => Ok(ScVal::Void),
            "ledger_key_contract_instance" => Ok(ScVal::LedgerKeyContractInstance),
            other => Err(invalid(format!("unknown SCVal tag {other:?}"))),
        };
    }
    let object = value
        .as_object()
        .ok_or_else(|| invalid("SCVal must be a string tag or a single-key object"))?;
    if object.len() != 1 {
        return Err(invalid("SCVal object must have exactly one key"));
    }
    let Some((tag, inner)) = object.iter().next() else {
        return Err(invalid("empty SCVal object"));
    };

    let sc_val = match tag.as_str() {
        "bool" => ScVal::Bool(inner.as_bool().ok_or_else(|| invalid("bool expected"))?),
        "void" => ScVal::Void,
        "error" => ScVal::Error(read_error(inner)?),
        "u32" => ScVal::U32(narrow(read_u128(inner)?, "u32")?),
        "i32" => ScVal::I32(narrow(read_i128(inner)?, "i32")?),
        "u64" => ScVal::U64(narrow(read_u128(inner)?, "u64")?),
        "i64" => ScVal::I64(narrow(read_i128(inner)?, "i64")?),
        "timepoint" => ScVal::Timepoint(narrow(read_u128(inner)?, "timepoint")?),
        "duration" => ScVal::Duration(narrow(read_u128(inner)?, "duration")?),
        "u128" => ScVal::U128(read_u128(inner)?),
        "i128" => ScVal::I128(read_i128(inner)?),
        "u256" => ScVal::U256(read_256(inner, false)?),
        "i256" => ScVal::I256(read_256(inner, true)?),
        "bytes" => ScVal::Bytes(read_hex(inner)?),
        "string" => ScVal::String(read_str(inner)?.to_string()),
        "symbol" => ScVal::Symbol(read_str(inner)?.to_string()),
        "vec" => match inner {
            Value::Null => ScVal::Vec(None),
            Value::Array(items) => ScVal::Vec(Some(
                items
                    .iter()
                    .map(|item| from_json_at(item, depth + 1))
                    .collect::<Result<_, _>>()?,
            )),
            _ => return Err(invalid("vec expects an array or null")),
        },
        "map" => ScVal::Map(read_map(inner, depth)?),
        "address" => ScVal::Address(
            read_str(inner)?
                .parse::<ScAddress>()
                .map_err(|e| invalid(format!("address: {e}")))?,
        ),
        "contract_instance" => {
            let executable = match inner.get("executable") {
                Some(Value::String(s)) if s == "stellar_asset" => ContractExecutable::StellarAsset,
                Some(Value::Object(o)) if o.contains_key("wasm") => {
                    let hash = read_hex(&o["wasm"])?;
                    let hash: [u8; 32] = hash
                        .try_into()
                        .map_err(|_| invalid("wasm hash must be 32 bytes"))?;
                    ContractExecutable::Wasm(hash)
                }
                _ => return Err(invalid("unknown contract executable")),
            };
            let storage = match inner.get("storage") {
                Some(storage) => read_map(storage, depth)?,
                None => None,
            };
            ScVal::ContractInstance(ContractInstance {
                executable,
                storage,
            })
        }
        "ledger_key_nonce" => {
            let nonce = inner.get("nonce").unwrap_or(inner);
            ScVal::LedgerKeyNonce(narrow(read_i128(nonce)?, "nonce")?)
        }
        other => return Err(invalid(format!("unknown SCVal tag {other:?}"))),
    };
    Ok(sc_val)
}

fn read_map(value: &Value, depth: u32) -> Result<Option<Vec<ScMapEntry>>, XdrError> {
    match value {
        Value::Null => Ok(None),
        Value::Array(entries) => entries
            .iter()
            .map(|entry| -> Result<ScMapEntry, XdrError> {
                let key = entry.get("key").ok_or_else(|| invalid("map entry without key"))?;
                let val = entry.get("val").ok_or_else(|| invalid("map entry without val"))?;
                Ok(ScMapEntry::new(
                    from_json_at(key, depth + 1)?,
                    from_json_at(val, depth + 1)?,
                ))
            })
            .collect::<Result<_, XdrError>>()
            .map(Some),
        _ => Err(invalid("map expects an array or null")),
    }
}

fn read_error(value: &Value) -> Result<ScError, XdrError> {
    let object = value
        .as_object()
        .and_then(|o| o.iter().next())
        .ok_or_else(|| invalid("error expects an object"))?;
    let (kind_name, code) = object;
    let kind = ERROR_TYPES
        .iter()
        .position(|t| *t == kind_name.as_str())
        .ok_or_else(|| invalid(format!("unknown error type {kind_name:?}")))?;
    let code = match code {
        Value::String(name) => ERROR_CODES
            .iter()
            .position(|c| *c == name.as_str())
            .ok_or_else(|| invalid(format!("unknown error code {name:?}")))?,
        other => {
            let code: usize = narrow(read_u128(other)?, "error code")?;
            code
        }
    };
    Ok(ScError {
        kind: narrow(kind as u128, "error type")?,
        code: narrow(code as u128, "error code")?,
    })
}

fn read_str(value: &Value) -> Result<&str, XdrError> {
    value.as_str().ok_or_else(|| invalid("string expected"))
}

fn read_hex(value: &Value) -> Result<Vec<u8>, XdrError> {
    hex::decode(read_str(value)?).map_err(|e| invalid(format!("hex: {e}")))
}

fn read_u128(value: &Value) -> Result<u128, XdrError> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(u128::from)
            .ok_or_else(|| invalid(format!("{n} is not an unsigned integer"))),
        Value::String(s) => s
            .parse::<u128>()
            .map_err(|_| invalid(format!("{s:?} is not an unsigned integer"))),
        Value::Object(o) => {
            let hi = o.get("hi").ok_or_else(|| invalid("missing hi"))?;
            let lo = o.get("lo").ok_or_else(|| invalid("missing lo"))?;
            let hi: u64 = narrow(read_u128(hi)?, "hi")?;
            let lo: u64 = narrow(read_u128(lo)?, "lo")?;
            Ok((u128::from(hi) << 64) | u128::from(lo))
        }
        _ => Err(invalid("integer expected")),
    }
}

fn read_i128(value: &Value) -> Result<i128, XdrError> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .ok_or_else(|| invalid(format!("{n} is not an integer"))),
        Value::String(s) => s
            .parse::<i128>()
            .map_err(|_| invalid(format!("{s:?} is not an integer"))),
        Value::Object(o) => {
            let hi = o.get("hi").ok_or_else(|| invalid("missing hi"))?;
            let lo = o.get("lo").ok_or_else(|| invalid("missing lo"))?;
            let hi: i64 = narrow(read_i128(hi)?, "hi")?;
            let lo: u64 = narrow(read_u128(lo)?, "lo")?;
            Ok((i128::from(hi) << 64) | i128::from(lo))
        }
        _ => Err(invalid("integer expected")),
    }
}

fn read_256(value: &Value, signed: bool) -> Result<[u8; 32], XdrError> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Object(o) => {
            // {hi_hi, hi_lo, lo_hi, lo_lo}
            let mut out = [0u8; 32];
            for (i, part) in ["hi_hi", "hi_lo", "lo_hi", "lo_lo"].into_iter().enumerate() {
                let v = o.get(part).ok_or_else(|| invalid(format!("missing {part}")))?;
                let bytes = if i == 0 && signed {
                    let word: i64 = narrow(read_i128(v)?, part)?;
                    word.to_be_bytes()
                } else {
                    let word: u64 = narrow(read_u128(v)?, part)?;
                    word.to_be_bytes()
                };
                out[i * 8..(i + 1) * 8].copy_from_slice(&bytes);
            }
            return Ok(out);
        }
        _ => return Err(invalid("256-bit integer expected")),
    };
    decimal_to_256(&text, signed).ok_or_else(|| invalid(format!("{text:?} out of range")))
}

fn narrow<T: TryFrom<N>, N: std::fmt::Display + Copy>(value: N, what: &str) -> Result<T, XdrError> {
    T::try_from(value).map_err(|_| invalid(format!("{value} out of range for {what}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalars() {
        assert_eq!(ScVal::from_json(&json!({"bool": true})).unwrap(), ScVal::Bool(true));
        assert_eq!(ScVal::from_json(&json!("void")).unwrap(), ScVal::Void);
        assert_eq!(ScVal::from_json(&json!({"u32": 42})).unwrap(), ScVal::U32(42));
        assert_eq!(ScVal::from_json(&json!({"i64": "-5"})).unwrap(), ScVal::I64(-5));
        assert_eq!(ScVal::from_json(&json!({"i64": -5})).unwrap(), ScVal::I64(-5));
    }

    #[test]
    fn test_wide_integers_in_every_form() {
        let expected = ScVal::I128(-2);
        assert_eq!(ScVal::from_json(&json!({"i128": "-2"})).unwrap(), expected);
        assert_eq!(
            ScVal::from_json(&json!({"i128": {"hi": -1, "lo": 18_446_744_073_709_551_614u64}}))
                .unwrap(),
            expected
        );
        assert_eq!(
            ScVal::from_json(&json!({"u128": {"hi": "1", "lo": "0"}})).unwrap(),
            ScVal::U128(1u128 << 64)
        );
    }

    #[test]
    fn test_collections() {
        let value = json!({"map": [
            {"key": {"symbol": "units"}, "val": {"vec": [{"u32": 1}, {"u32": 2}]}},
            {"key": {"symbol": "note"}, "val": {"vec": null}}
        ]});
        let parsed = ScVal::from_json(&value).unwrap();
        assert_eq!(
            parsed,
            ScVal::Map(Some(vec![
                ScMapEntry::new(
                    ScVal::Symbol("units".into()),
                    ScVal::Vec(Some(vec![ScVal::U32(1), ScVal::U32(2)]))
                ),
                ScMapEntry::new(ScVal::Symbol("note".into()), ScVal::Vec(None)),
            ]))
        );
    }

    #[test]
    fn test_error_value() {
        let parsed = ScVal::from_json(&json!({"error": {"contract": 3}})).unwrap();
        assert_eq!(parsed, ScVal::Error(ScError { kind: 0, code: 3 }));
        let parsed = ScVal::from_json(&json!({"error": {"storage": "missing_value"}})).unwrap();
        assert_eq!(parsed, ScVal::Error(ScError { kind: 3, code: 3 }));
    }

    #[test]
    fn test_rejects_unknown_shapes() {
        assert!(ScVal::from_json(&json!({"status": "SUCCESS"})).is_err());
        assert!(ScVal::from_json(&json!({"u32": 1, "i32": 2})).is_err());
        assert!(ScVal::from_json(&json!({"u32": -1})).is_err());
        assert!(!ScVal::is_json_shaped(&json!(42)));
    }
}
