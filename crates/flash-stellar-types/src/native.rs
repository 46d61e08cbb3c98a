//! Conversion of contract values into plain JSON for callers.
//!
//! JSON numbers lose precision past 2^53, so every 64-bit and wider integer
//! is rendered as a decimal string. This is an explicit adapter applied where
//! values leave the SDK; nothing global is patched to make serialization work.

use crate::scval::{ContractExecutable, ScVal};
use serde_json::{json, Map, Value};

/// Converts a contract value into its native JSON form.
///
/// | `ScVal` | JSON |
/// |---|---|
/// | `void`, absent vec/map | `null` |
/// | `bool` | bool |
/// | `u32`, `i32` | number |
/// | `u64` .. `i256`, timepoint, duration, nonce | decimal string |
/// | `bytes` | lowercase hex string |
/// | `string`, `symbol` | string |
/// | `vec` | array |
/// | `map` with symbol/string keys | object |
/// | other `map` | array of `[key, value]` pairs |
/// | `address` | StrKey string |
pub fn to_native(value: &ScVal) -> Value {
    match value {
        ScVal::Void | ScVal::Vec(None) | ScVal::Map(None) | ScVal::LedgerKeyContractInstance => {
            Value::Null
        }
        ScVal::Bool(b) => Value::Bool(*b),
        ScVal::U32(v) => json!(v),
        ScVal::I32(v) => json!(v),
        ScVal::U64(v) | ScVal::Timepoint(v) | ScVal::Duration(v) => Value::String(v.to_string()),
        ScVal::I64(v) | ScVal::LedgerKeyNonce(v) => Value::String(v.to_string()),
        ScVal::U128(v) => Value::String(v.to_string()),
        ScVal::I128(v) => Value::String(v.to_string()),
        ScVal::U256(bytes) => Value::String(u256_to_decimal(bytes)),
        ScVal::I256(bytes) => Value::String(i256_to_decimal(bytes)),
        ScVal::Bytes(bytes) => Value::String(hex::encode(bytes)),
        ScVal::String(s) | ScVal::Symbol(s) => Value::String(s.clone()),
        ScVal::Vec(Some(items)) => Value::Array(items.iter().map(to_native).collect()),
        ScVal::Map(Some(entries)) => {
            let string_keyed = entries
                .iter()
                .all(|e| matches!(e.key, ScVal::Symbol(_) | ScVal::String(_)));
            if string_keyed {
                let mut object = Map::with_capacity(entries.len());
                for entry in entries {
                    if let ScVal::Symbol(k) | ScVal::String(k) = &entry.key {
                        object.insert(k.clone(), to_native(&entry.val));
                    }
                }
                Value::Object(object)
            } else {
                Value::Array(
                    entries
                        .iter()
                        .map(|e| Value::Array(vec![to_native(&e.key), to_native(&e.val)]))
                        .collect(),
                )
            }
        }
        ScVal::Address(addr) => Value::String(addr.to_string()),
        ScVal::Error(err) => json!({ "error": { "type": err.kind, "code": err.code } }),
        ScVal::ContractInstance(instance) => {
            let executable = match &instance.executable {
                ContractExecutable::Wasm(hash) => json!({ "wasm": hex::encode(hash) }),
                ContractExecutable::StellarAsset => json!("stellar_asset"),
            };
            let storage = instance
                .storage
                .clone()
                .map_or(Value::Null, |entries| to_native(&ScVal::Map(Some(entries))));
            json!({ "executable": executable, "storage": storage })
        }
    }
}

/// Renders a big-endian unsigned 256-bit integer in decimal.
pub(crate) fn u256_to_decimal(bytes: &[u8; 32]) -> String {
    let mut digits = Vec::new();
    let mut value = *bytes;
    while value.iter().any(|b| *b != 0) {
        // Long division by 10, most significant byte first.
        let mut rem: u32 = 0;
        for byte in value.iter_mut() {
            let acc = (rem << 8) | u32::from(*byte);
            *byte = (acc / 10) as u8;
            rem = acc % 10;
        }
        digits.push(char::from(b'0' + rem as u8));
    }
    if digits.is_empty() {
        return "0".to_string();
    }
    digits.iter().rev().collect()
}

/// Renders a big-endian two's-complement 256-bit integer in decimal.
pub(crate) fn i256_to_decimal(bytes: &[u8; 32]) -> String {
    if bytes[0] & 0x80 == 0 {
        return u256_to_decimal(bytes);
    }
    format!("-{}", u256_to_decimal(&negate(bytes)))
}

/// Parses a decimal string into a big-endian 256-bit integer.
///
/// Negative input is accepted only when `signed` is set and yields two's
/// complement. Returns `None` on overflow or malformed input.
pub(crate) fn decimal_to_256(s: &str, signed: bool) -> Option<[u8; 32]> {
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) if signed => (true, rest),
        Some(_) => return None,
        None => (false, s),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let mut out = [0u8; 32];
    for digit in digits.bytes() {
        let mut carry = u32::from(digit - b'0');
        for byte in out.iter_mut().rev() {
            let acc = u32::from(*byte) * 10 + carry;
            *byte = (acc & 0xff) as u8;
            carry = acc >> 8;
        }
        if carry != 0 {
            return None;
        }
    }
    if signed {
        let magnitude_limit_hit = out[0] & 0x80 != 0;
        if negative {
            // |i256::MIN| is the only magnitude with the top bit set that fits.
            let is_min = out[0] == 0x80 && out[1..].iter().all(|b| *b == 0);
            if magnitude_limit_hit && !is_min {
                return None;
            }
            return Some(negate(&out));
        }
        if magnitude_limit_hit {
            return None;
        }
    }
    Some(out)
}

fn negate(bytes: &[u8; 32]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut carry = 1u16;
    for i in (0..32).rev() {
        let acc = u16::from(!bytes[i]) + carry;
        out[i] = (acc & 0xff) as u8;
        carry = acc >> 8;
    }
    out
}
