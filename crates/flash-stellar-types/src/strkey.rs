//! StrKey: the human-readable form of Stellar keys and addresses.
//!
//! A StrKey is RFC 4648 base32 (unpadded) over
//! `version byte || payload || crc16-xmodem(version || payload)` with the
//! checksum stored little-endian. The version byte fixes the leading letter.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Errors raised while decoding a StrKey.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StrKeyError {
    /// Character outside the base32 alphabet
    #[error("invalid base32 character {0:?}")]
    InvalidCharacter(char),

    /// Encoded length does not match any key kind
    #[error("invalid strkey length: {0}")]
    InvalidLength(usize),

    /// Version byte is unknown or not the one expected
    #[error("unexpected strkey version byte {found:#04x}, expected {expected}")]
    UnexpectedVersion {
        /// The version byte found
        found: u8,
        /// What the caller asked for
        expected: &'static str,
    },

    /// Checksum mismatch
    #[error("invalid strkey checksum")]
    InvalidChecksum,

    /// Non-canonical encoding (leftover bits set)
    #[error("non-canonical strkey encoding")]
    NonCanonical,
}

/// Kinds of StrKey, identified by their version byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrKeyKind {
    /// `G...` ed25519 public key (account id)
    AccountId,
    /// `S...` ed25519 secret seed
    SecretSeed,
    /// `C...` contract id
    Contract,
    /// `M...` muxed account
    MuxedAccount,
    /// `B...` claimable balance id
    ClaimableBalance,
    /// `L...` liquidity pool id
    LiquidityPool,
}

impl StrKeyKind {
    pub(crate) fn version(self) -> u8 {
        match self {
            Self::AccountId => 6 << 3,
            Self::SecretSeed => 18 << 3,
            Self::Contract => 2 << 3,
            Self::MuxedAccount => 12 << 3,
            Self::ClaimableBalance => 1 << 3,
            Self::LiquidityPool => 11 << 3,
        }
    }

    fn payload_len(self) -> usize {
        match self {
            Self::MuxedAccount => 40,
            Self::ClaimableBalance => 33,
            _ => 32,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::AccountId => "account id (G...)",
            Self::SecretSeed => "secret seed (S...)",
            Self::Contract => "contract (C...)",
            Self::MuxedAccount => "muxed account (M...)",
            Self::ClaimableBalance => "claimable balance (B...)",
            Self::LiquidityPool => "liquidity pool (L...)",
        }
    }

    fn from_version(version: u8) -> Option<Self> {
        [
            Self::AccountId,
            Self::SecretSeed,
            Self::Contract,
            Self::MuxedAccount,
            Self::ClaimableBalance,
            Self::LiquidityPool,
        ]
        .into_iter()
        .find(|kind| kind.version() == version)
    }
}

/// A decoded StrKey: its kind and raw payload.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct StrKey {
    kind: StrKeyKind,
    payload: Vec<u8>,
}

impl fmt::Debug for StrKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Secret seeds never reach logs.
        if self.kind == StrKeyKind::SecretSeed {
            return f.write_str("StrKey(SecretSeed, <redacted>)");
        }
        write!(f, "StrKey({})", self.encode())
    }
}

impl StrKey {
    /// Builds a StrKey from a kind and payload.
    ///
    /// Returns an error if the payload length does not fit the kind.
    pub fn new(kind: StrKeyKind, payload: &[u8]) -> Result<Self, StrKeyError> {
        if payload.len() != kind.payload_len() {
            return Err(StrKeyError::InvalidLength(payload.len()));
        }
        Ok(Self {
            kind,
            payload: payload.to_vec(),
        })
    }

    /// Encodes a 32-byte ed25519 public key as `G...`.
    pub fn account_id(key: &[u8; 32]) -> String {
        encode(StrKeyKind::AccountId, key)
    }

    /// Encodes a 32-byte contract hash as `C...`.
    pub fn contract(hash: &[u8; 32]) -> String {
        encode(StrKeyKind::Contract, hash)
    }

    /// The key kind.
    pub fn kind(&self) -> StrKeyKind {
        self.kind
    }

    /// The raw payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Encodes back to the textual form.
    pub fn encode(&self) -> String {
        encode(self.kind, &self.payload)
    }

    /// Decodes any supported StrKey.
    pub fn decode(s: &str) -> Result<Self, StrKeyError> {
        let raw = base32_decode(s)?;
        if raw.len() < 3 {
            return Err(StrKeyError::InvalidLength(s.len()));
        }
        let (body, checksum) = raw.split_at(raw.len() - 2);
        if crc16_xmodem(body).to_le_bytes() != [checksum[0], checksum[1]] {
            return Err(StrKeyError::InvalidChecksum);
        }
        let kind = StrKeyKind::from_version(body[0]).ok_or(StrKeyError::UnexpectedVersion {
            found: body[0],
            expected: "a known key kind",
        })?;
        let key = Self::new(kind, &body[1..])?;
        // Re-encoding must reproduce the input, which rules out stray low bits.
        if key.encode() != s {
            return Err(StrKeyError::NonCanonical);
        }
        Ok(key)
    }

    /// Decodes a StrKey and checks it is of `kind`.
    pub fn decode_kind(s: &str, kind: StrKeyKind) -> Result<Self, StrKeyError> {
        let key = Self::decode(s)?;
        if key.kind != kind {
            return Err(StrKeyError::UnexpectedVersion {
                found: key.kind.version(),
                expected: kind.name(),
            });
        }
        Ok(key)
    }

    /// Decodes a `G...` account id into its 32-byte public key.
    pub fn decode_account_id(s: &str) -> Result<[u8; 32], StrKeyError> {
        Self::decode_kind(s, StrKeyKind::AccountId)?.payload_32()
    }

    /// Decodes a `C...` contract id into its 32-byte hash.
    pub fn decode_contract(s: &str) -> Result<[u8; 32], StrKeyError> {
        Self::decode_kind(s, StrKeyKind::Contract)?.payload_32()
    }

    /// Decodes an `S...` secret seed into its 32-byte ed25519 seed.
    pub fn decode_secret_seed(s: &str) -> Result<[u8; 32], StrKeyError> {
        Self::decode_kind(s, StrKeyKind::SecretSeed)?.payload_32()
    }

    fn payload_32(&self) -> Result<[u8; 32], StrKeyError> {
        self.payload
            .as_slice()
            .try_into()
            .map_err(|_| StrKeyError::InvalidLength(self.payload.len()))
    }
}

impl fmt::Display for StrKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for StrKey {
    type Err = StrKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

/// Encodes `payload` as a StrKey of `kind`.
pub fn encode(kind: StrKeyKind, payload: &[u8]) -> String {
    let mut raw = Vec::with_capacity(payload.len() + 3);
    raw.push(kind.version());
    raw.extend_from_slice(payload);
    let crc = crc16_xmodem(&raw);
    raw.extend_from_slice(&crc.to_le_bytes());
    base32_encode(&raw)
}

fn crc16_xmodem(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for byte in data {
        crc ^= u16::from(*byte) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}

fn base32_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity((data.len() * 8).div_ceil(5));
    let mut buffer: u32 = 0;
    let mut bits = 0;
    for byte in data {
        buffer = (buffer << 8) | u32::from(*byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(char::from(ALPHABET[((buffer >> bits) & 0x1f) as usize]));
        }
    }
    if bits > 0 {
        out.push(char::from(ALPHABET[((buffer << (5 - bits)) & 0x1f) as usize]));
    }
    out
}

fn base32_decode(s: &str) -> Result<Vec<u8>, StrKeyError> {
    let mut out = Vec::with_capacity(s.len() * 5 / 8);
    let mut buffer: u32 = 0;
    let mut bits = 0;
    for c in s.chars() {
        let value = ALPHABET
            .iter()
            .position(|a| char::from(*a) == c)
            .ok_or(StrKeyError::InvalidCharacter(c))?;
        buffer = (buffer << 5) | value as u32;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push(((buffer >> bits) & 0xff) as u8);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Published test vector from the Stellar StrKey documentation.
    const ACCOUNT: &str = "GA7QYNF7SOWQ3GLR2BGMZEHXAVIRZA4KVWLTJJFC7MGXUA74P7UJVSGZ";

    #[test]
    fn test_account_round_trip() {
        let key = StrKey::decode(ACCOUNT).unwrap();
        assert_eq!(key.kind(), StrKeyKind::AccountId);
        assert_eq!(key.payload().len(), 32);
        assert_eq!(key.encode(), ACCOUNT);
    }

    #[test]
    fn test_contract_encoding() {
        let hash = [7u8; 32];
        let encoded = StrKey::contract(&hash);
        assert!(encoded.starts_with('C'));
        assert_eq!(StrKey::decode_contract(&encoded).unwrap(), hash);
    }

    #[test]
    fn test_leading_letters() {
        let payload = [0u8; 32];
        assert!(encode(StrKeyKind::AccountId, &payload).starts_with('G'));
        assert!(encode(StrKeyKind::SecretSeed, &payload).starts_with('S'));
        assert!(encode(StrKeyKind::LiquidityPool, &payload).starts_with('L'));
        assert!(encode(StrKeyKind::MuxedAccount, &[0u8; 40]).starts_with('M'));
        assert!(encode(StrKeyKind::ClaimableBalance, &[0u8; 33]).starts_with('B'));
    }

    #[test]
    fn test_bad_checksum() {
        let mut corrupted = ACCOUNT.to_string();
        corrupted.replace_range(10..11, if &ACCOUNT[10..11] == "A" { "B" } else { "A" });
        assert!(StrKey::decode(&corrupted).is_err());
    }

    #[test]
    fn test_wrong_kind() {
        let err = StrKey::decode_contract(ACCOUNT).unwrap_err();
        assert!(matches!(err, StrKeyError::UnexpectedVersion { .. }));
    }

    #[test]
    fn test_invalid_character() {
        assert_eq!(
            StrKey::decode("GA1").unwrap_err(),
            StrKeyError::InvalidCharacter('1')
        );
    }

    #[test]
    fn test_secret_debug_is_redacted() {
        let key = StrKey::new(StrKeyKind::SecretSeed, &[9u8; 32]).unwrap();
        assert!(!format!("{key:?}").contains(&key.encode()));
    }
}
