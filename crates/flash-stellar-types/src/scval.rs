//! Soroban contract values (`SCVal`) and addresses (`SCAddress`).

use crate::strkey::{self, StrKey, StrKeyError, StrKeyKind};
use crate::xdr::{read_vec, write_vec, ReadXdr, WriteXdr, XdrError, XdrReader, XdrWriter};
use std::fmt;
use std::str::FromStr;

/// Longest symbol the protocol accepts.
pub const SCSYMBOL_LIMIT: u32 = 32;

/// A 32-byte hash (contract ids, wasm hashes, pool ids).
pub type Hash = [u8; 32];

/// An ed25519 account id, encoded as the `PublicKey` union.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    /// Parses a `G...` StrKey.
    pub fn from_strkey(s: &str) -> Result<Self, StrKeyError> {
        StrKey::decode_account_id(s).map(Self)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&StrKey::account_id(&self.0))
    }
}

impl FromStr for AccountId {
    type Err = StrKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_strkey(s)
    }
}

impl WriteXdr for AccountId {
    fn write_xdr(&self, w: &mut XdrWriter) {
        // PUBLIC_KEY_TYPE_ED25519
        w.write_i32(0);
        w.write_fixed(&self.0);
    }
}

impl ReadXdr for AccountId {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, XdrError> {
        match r.read_i32()? {
            0 => Ok(Self(r.read_fixed()?)),
            other => Err(XdrError::InvalidDiscriminant {
                type_name: "PublicKey",
                value: other.into(),
            }),
        }
    }
}

/// Any address a contract can see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScAddress {
    /// A classic account
    Account(AccountId),
    /// A contract
    Contract(Hash),
    /// A multiplexed account
    MuxedAccount {
        /// Multiplexing id
        id: u64,
        /// Underlying ed25519 key
        key: [u8; 32],
    },
    /// A claimable balance
    ClaimableBalance(Hash),
    /// A liquidity pool
    LiquidityPool(Hash),
}

impl fmt::Display for ScAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = match self {
            Self::Account(id) => StrKey::account_id(&id.0),
            Self::Contract(hash) => StrKey::contract(hash),
            Self::MuxedAccount { id, key } => {
                let mut payload = key.to_vec();
                payload.extend_from_slice(&id.to_be_bytes());
                strkey::encode(StrKeyKind::MuxedAccount, &payload)
            }
            Self::ClaimableBalance(hash) => {
                let mut payload = vec![0u8];
                payload.extend_from_slice(hash);
                strkey::encode(StrKeyKind::ClaimableBalance, &payload)
            }
            Self::LiquidityPool(hash) => strkey::encode(StrKeyKind::LiquidityPool, hash),
        };
        f.write_str(&encoded)
    }
}

impl FromStr for ScAddress {
    type Err = StrKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = StrKey::decode(s)?;
        let payload = key.payload();
        let hash = |bytes: &[u8]| -> Result<Hash, StrKeyError> {
            bytes
                .try_into()
                .map_err(|_| StrKeyError::InvalidLength(bytes.len()))
        };
        match key.kind() {
            StrKeyKind::AccountId => Ok(Self::Account(AccountId(hash(payload)?))),
            StrKeyKind::Contract => Ok(Self::Contract(hash(payload)?)),
            StrKeyKind::MuxedAccount => {
                let mut id = [0u8; 8];
                id.copy_from_slice(&payload[32..]);
                Ok(Self::MuxedAccount {
                    id: u64::from_be_bytes(id),
                    key: hash(&payload[..32])?,
                })
            }
            StrKeyKind::ClaimableBalance => Ok(Self::ClaimableBalance(hash(&payload[1..])?)),
            StrKeyKind::LiquidityPool => Ok(Self::LiquidityPool(hash(payload)?)),
            StrKeyKind::SecretSeed => Err(StrKeyError::UnexpectedVersion {
                found: StrKeyKind::SecretSeed.version(),
                expected: "an address",
            }),
        }
    }
}

impl WriteXdr for ScAddress {
    fn write_xdr(&self, w: &mut XdrWriter) {
        match self {
            Self::Account(id) => {
                w.write_i32(0);
                id.write_xdr(w);
            }
            Self::Contract(hash) => {
                w.write_i32(1);
                w.write_fixed(hash);
            }
            Self::MuxedAccount { id, key } => {
                w.write_i32(2);
                w.write_u64(*id);
                w.write_fixed(key);
            }
            Self::ClaimableBalance(hash) => {
                w.write_i32(3);
                // CLAIMABLE_BALANCE_ID_TYPE_V0
                w.write_i32(0);
                w.write_fixed(hash);
            }
            Self::LiquidityPool(hash) => {
                w.write_i32(4);
                w.write_fixed(hash);
            }
        }
    }
}

impl ReadXdr for ScAddress {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, XdrError> {
        match r.read_i32()? {
            0 => Ok(Self::Account(AccountId::read_xdr(r)?)),
            1 => Ok(Self::Contract(r.read_fixed()?)),
            2 => Ok(Self::MuxedAccount {
                id: r.read_u64()?,
                key: r.read_fixed()?,
            }),
            3 => match r.read_i32()? {
                0 => Ok(Self::ClaimableBalance(r.read_fixed()?)),
                other => Err(XdrError::InvalidDiscriminant {
                    type_name: "ClaimableBalanceID",
                    value: other.into(),
                }),
            },
            4 => Ok(Self::LiquidityPool(r.read_fixed()?)),
            other => Err(XdrError::InvalidDiscriminant {
                type_name: "SCAddress",
                value: other.into(),
            }),
        }
    }
}

/// A contract error value: error type plus code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScError {
    /// `SCErrorType` discriminant (0 = contract-defined)
    pub kind: i32,
    /// Contract code for contract errors, `SCErrorCode` otherwise
    pub code: u32,
}

impl ScError {
    /// Whether this error was raised by contract code.
    pub fn is_contract_error(&self) -> bool {
        self.kind == 0
    }
}

/// What a contract instance executes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContractExecutable {
    /// Uploaded wasm, by hash
    Wasm(Hash),
    /// The built-in Stellar asset contract
    StellarAsset,
}

/// Instance storage attached to a contract.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContractInstance {
    /// The executable
    pub executable: ContractExecutable,
    /// Instance storage, if any
    pub storage: Option<Vec<ScMapEntry>>,
}

/// One key/value pair of an `SCMap`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScMapEntry {
    /// Entry key
    pub key: ScVal,
    /// Entry value
    pub val: ScVal,
}

impl ScMapEntry {
    /// Creates an entry.
    pub fn new(key: ScVal, val: ScVal) -> Self {
        Self { key, val }
    }
}

/// A Soroban contract value.
///
/// `Vec(None)` and `Map(None)` are the protocol's absent vec/map, distinct
/// from an empty one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScVal {
    /// Boolean
    Bool(bool),
    /// Unit / absent optional
    Void,
    /// Error value
    Error(ScError),
    /// Unsigned 32-bit integer
    U32(u32),
    /// Signed 32-bit integer
    I32(i32),
    /// Unsigned 64-bit integer
    U64(u64),
    /// Signed 64-bit integer
    I64(i64),
    /// Seconds since the unix epoch
    Timepoint(u64),
    /// Seconds
    Duration(u64),
    /// Unsigned 128-bit integer
    U128(u128),
    /// Signed 128-bit integer
    I128(i128),
    /// Big-endian 256-bit unsigned integer
    U256([u8; 32]),
    /// Big-endian two's-complement 256-bit integer
    I256([u8; 32]),
    /// Opaque bytes
    Bytes(Vec<u8>),
    /// Text
    String(String),
    /// Identifier of at most 32 `[A-Za-z0-9_]` characters
    Symbol(String),
    /// Vector, `None` when absent
    Vec(Option<Vec<ScVal>>),
    /// Map, `None` when absent
    Map(Option<Vec<ScMapEntry>>),
    /// Address
    Address(ScAddress),
    /// Contract instance (ledger representation)
    ContractInstance(ContractInstance),
    /// Key of the contract instance entry
    LedgerKeyContractInstance,
    /// Key of a nonce entry
    LedgerKeyNonce(i64),
}

impl ScVal {
    /// Name of the variant as the protocol spells it.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Void => "void",
            Self::Error(_) => "error",
            Self::U32(_) => "u32",
            Self::I32(_) => "i32",
            Self::U64(_) => "u64",
            Self::I64(_) => "i64",
            Self::Timepoint(_) => "timepoint",
            Self::Duration(_) => "duration",
            Self::U128(_) => "u128",
            Self::I128(_) => "i128",
            Self::U256(_) => "u256",
            Self::I256(_) => "i256",
            Self::Bytes(_) => "bytes",
            Self::String(_) => "string",
            Self::Symbol(_) => "symbol",
            Self::Vec(_) => "vec",
            Self::Map(_) => "map",
            Self::Address(_) => "address",
            Self::ContractInstance(_) => "contract_instance",
            Self::LedgerKeyContractInstance => "ledger_key_contract_instance",
            Self::LedgerKeyNonce(_) => "ledger_key_nonce",
        }
    }

    fn discriminant(&self) -> i32 {
        match self {
            Self::Bool(_) => 0,
            Self::Void => 1,
            Self::Error(_) => 2,
            Self::U32(_) => 3,
            Self::I32(_) => 4,
            Self::U64(_) => 5,
            Self::I64(_) => 6,
            Self::Timepoint(_) => 7,
            Self::Duration(_) => 8,
            Self::U128(_) => 9,
            Self::I128(_) => 10,
            Self::U256(_) => 11,
            Self::I256(_) => 12,
            Self::Bytes(_) => 13,
            Self::String(_) => 14,
            Self::Symbol(_) => 15,
            Self::Vec(_) => 16,
            Self::Map(_) => 17,
            Self::Address(_) => 18,
            Self::ContractInstance(_) => 19,
            Self::LedgerKeyContractInstance => 20,
            Self::LedgerKeyNonce(_) => 21,
        }
    }
}

fn write_map(w: &mut XdrWriter, map: &Option<Vec<ScMapEntry>>) {
    match map {
        Some(entries) => {
            w.write_bool(true);
            write_vec(w, entries);
        }
        None => w.write_bool(false),
    }
}

fn read_map(r: &mut XdrReader<'_>) -> Result<Option<Vec<ScMapEntry>>, XdrError> {
    if r.read_bool()? {
        Ok(Some(read_vec(r, u32::MAX)?))
    } else {
        Ok(None)
    }
}

impl WriteXdr for ScMapEntry {
    fn write_xdr(&self, w: &mut XdrWriter) {
        self.key.write_xdr(w);
        self.val.write_xdr(w);
    }
}

impl ReadXdr for ScMapEntry {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, XdrError> {
        Ok(Self {
            key: ScVal::read_xdr(r)?,
            val: ScVal::read_xdr(r)?,
        })
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
impl WriteXdr for ScVal {
    fn write_xdr(&self, w: &mut XdrWriter) {
        w.write_i32(self.discriminant());
        match self {
            Self::Bool(b) => w.write_bool(*b),
            Self::Void | Self::LedgerKeyContractInstance => {}
            Self::Error(err) => {
                w.write_i32(err.kind);
                w.write_u32(err.code);
            }
            Self::U32(v) => w.write_u32(*v),
            Self::I32(v) => w.write_i32(*v),
            Self::U64(v) | Self::Timepoint(v) | Self::Duration(v) => w.write_u64(*v),
            Self::I64(v) | Self::LedgerKeyNonce(v) => w.write_i64(*v),
            Self::U128(v) => {
                w.write_u64((*v >> 64) as u64);
                w.write_u64(*v as u64);
            }
            Self::I128(v) => {
                w.write_i64((*v >> 64) as i64);
                w.write_u64(*v as u64);
            }
            Self::U256(bytes) | Self::I256(bytes) => w.write_fixed(bytes),
            Self::Bytes(bytes) => w.write_var(bytes),
            Self::String(s) | Self::Symbol(s) => w.write_var(s.as_bytes()),
            Self::Vec(items) => match items {
                Some(items) => {
                    w.write_bool(true);
                    write_vec(w, items);
                }
                None => w.write_bool(false),
            },
            Self::Map(map) => write_map(w, map),
            Self::Address(addr) => addr.write_xdr(w),
            Self::ContractInstance(instance) => {
                match &instance.executable {
                    ContractExecutable::Wasm(hash) => {
                        w.write_i32(0);
                        w.write_fixed(hash);
                    }
                    ContractExecutable::StellarAsset => w.write_i32(1),
                }
                write_map(w, &instance.storage);
            }
        }
    }
}

impl ReadXdr for ScVal {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, XdrError> {
        r.enter()?;
        let value = read_sc_val(r);
        r.leave();
        value
    }
}

fn read_sc_val(r: &mut XdrReader<'_>) -> Result<ScVal, XdrError> {
    let value = match r.read_i32()? {
        0 => ScVal::Bool(r.read_bool()?),
        1 => ScVal::Void,
        2 => ScVal::Error(ScError {
            kind: r.read_i32()?,
            code: r.read_u32()?,
        }),
        3 => ScVal::U32(r.read_u32()?),
        4 => ScVal::I32(r.read_i32()?),
        5 => ScVal::U64(r.read_u64()?),
        6 => ScVal::I64(r.read_i64()?),
        7 => ScVal::Timepoint(r.read_u64()?),
        8 => ScVal::Duration(r.read_u64()?),
        9 => {
            let hi = r.read_u64()?;
            let lo = r.read_u64()?;
            ScVal::U128((u128::from(hi) << 64) | u128::from(lo))
        }
        10 => {
            let hi = r.read_i64()?;
            let lo = r.read_u64()?;
            ScVal::I128((i128::from(hi) << 64) | i128::from(lo))
        }
        11 => ScVal::U256(r.read_fixed()?),
        12 => ScVal::I256(r.read_fixed()?),
        13 => ScVal::Bytes(r.read_var(u32::MAX)?),
        // SCString is opaque bytes on the wire; contracts may store non-UTF-8.
        14 => ScVal::String(String::from_utf8_lossy(&r.read_var(u32::MAX)?).into_owned()),
        15 => ScVal::Symbol(r.read_string(SCSYMBOL_LIMIT)?),
        16 => {
            if r.read_bool()? {
                ScVal::Vec(Some(read_vec(r, u32::MAX)?))
            } else {
                ScVal::Vec(None)
            }
        }
        17 => ScVal::Map(read_map(r)?),
        18 => ScVal::Address(ScAddress::read_xdr(r)?),
        19 => {
            let executable = match r.read_i32()? {
                0 => ContractExecutable::Wasm(r.read_fixed()?),
                1 => ContractExecutable::StellarAsset,
                other => {
                    return Err(XdrError::InvalidDiscriminant {
                        type_name: "ContractExecutable",
                        value: other.into(),
                    })
                }
            };
            ScVal::ContractInstance(ContractInstance {
                executable,
                storage: read_map(r)?,
            })
        }
        20 => ScVal::LedgerKeyContractInstance,
        21 => ScVal::LedgerKeyNonce(r.read_i64()?),
        other => {
            return Err(XdrError::InvalidDiscriminant {
                type_name: "SCVal",
                value: other.into(),
            })
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u32_encoding() {
        assert_eq!(ScVal::U32(42).to_xdr(), vec![0, 0, 0, 3, 0, 0, 0, 42]);
    }

    #[test]
    fn test_i128_split_into_hi_lo() {
        let value = ScVal::I128(-1);
        let bytes = value.to_xdr();
        assert_eq!(&bytes[..4], &[0, 0, 0, 10]);
        assert!(bytes[4..].iter().all(|b| *b == 0xff));
        assert_eq!(ScVal::from_xdr(&bytes).unwrap(), value);
    }

    #[test]
    fn test_absent_vec_differs_from_empty_vec() {
        let absent = ScVal::Vec(None).to_xdr();
        let empty = ScVal::Vec(Some(vec![])).to_xdr();
        assert_eq!(absent, vec![0, 0, 0, 16, 0, 0, 0, 0]);
        assert_eq!(empty, vec![0, 0, 0, 16, 0, 0, 0, 1, 0, 0, 0, 0]);
    }

    #[test]
    fn test_nested_value_decodes() {
        let value = ScVal::Map(Some(vec![ScMapEntry::new(
            ScVal::Symbol("owner".into()),
            ScVal::Vec(Some(vec![
                ScVal::Address(ScAddress::Contract([3; 32])),
                ScVal::String("unit-1".into()),
                ScVal::Bool(false),
            ])),
        )]));
        let encoded = value.to_xdr_base64();
        assert_eq!(ScVal::from_xdr_base64(&encoded).unwrap(), value);
    }

    #[test]
    fn test_unknown_discriminant() {
        let err = ScVal::from_xdr(&[0, 0, 0, 99]).unwrap_err();
        assert_eq!(
            err,
            XdrError::InvalidDiscriminant {
                type_name: "SCVal",
                value: 99
            }
        );
    }

    #[test]
    fn test_symbol_limit_enforced_on_read() {
        let mut w = XdrWriter::new();
        w.write_i32(15);
        w.write_var(&[b'a'; 33]);
        assert!(matches!(
            ScVal::from_xdr(&w.into_bytes()),
            Err(XdrError::LengthExceeded { max: 32, .. })
        ));
    }

    #[test]
    fn test_deeply_nested_payload_rejected() {
        let mut w = XdrWriter::new();
        for _ in 0..200 {
            w.write_i32(16);
            w.write_bool(true);
            w.write_u32(1);
        }
        w.write_i32(1);
        assert_eq!(
            ScVal::from_xdr(&w.into_bytes()).unwrap_err(),
            XdrError::DepthExceeded
        );
    }

    #[test]
    fn test_address_strkey_round_trip() {
        let contract = ScAddress::Contract([5; 32]);
        let parsed: ScAddress = contract.to_string().parse().unwrap();
        assert_eq!(parsed, contract);

        let muxed = ScAddress::MuxedAccount { id: 9, key: [1; 32] };
        let parsed: ScAddress = muxed.to_string().parse().unwrap();
        assert_eq!(parsed, muxed);
    }
}
