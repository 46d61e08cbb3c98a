//! Ledger keys, footprints and the Soroban resource declaration.

use crate::scval::{AccountId, Hash, ScAddress, ScVal};
use crate::xdr::{read_vec, write_vec, ReadXdr, WriteXdr, XdrError, XdrReader, XdrWriter};

/// A classic asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Asset {
    /// The native lumen
    Native,
    /// 1 to 4 character asset code
    CreditAlphanum4 {
        /// Zero-padded code
        code: [u8; 4],
        /// Issuing account
        issuer: AccountId,
    },
    /// 5 to 12 character asset code
    CreditAlphanum12 {
        /// Zero-padded code
        code: [u8; 12],
        /// Issuing account
        issuer: AccountId,
    },
}

impl Asset {
    /// Builds a credit asset, choosing the 4 or 12 byte form from the code length.
    ///
    /// Returns `None` if the code is empty, longer than 12 characters or not
    /// alphanumeric ASCII.
    pub fn credit(code: &str, issuer: AccountId) -> Option<Self> {
        if code.is_empty() || code.len() > 12 || !code.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return None;
        }
        if code.len() <= 4 {
            let mut padded = [0u8; 4];
            padded[..code.len()].copy_from_slice(code.as_bytes());
            Some(Self::CreditAlphanum4 {
                code: padded,
                issuer,
            })
        } else {
            let mut padded = [0u8; 12];
            padded[..code.len()].copy_from_slice(code.as_bytes());
            Some(Self::CreditAlphanum12 {
                code: padded,
                issuer,
            })
        }
    }
}

impl WriteXdr for Asset {
    fn write_xdr(&self, w: &mut XdrWriter) {
        match self {
            Self::Native => w.write_i32(0),
            Self::CreditAlphanum4 { code, issuer } => {
                w.write_i32(1);
                w.write_fixed(code);
                issuer.write_xdr(w);
            }
            Self::CreditAlphanum12 { code, issuer } => {
                w.write_i32(2);
                w.write_fixed(code);
                issuer.write_xdr(w);
            }
        }
    }
}

/// Asset of a trust line: a classic asset or a pool share.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TrustLineAsset {
    /// Classic asset
    Asset(Asset),
    /// Liquidity pool share
    PoolShare(Hash),
}

impl WriteXdr for TrustLineAsset {
    fn write_xdr(&self, w: &mut XdrWriter) {
        match self {
            Self::Asset(asset) => asset.write_xdr(w),
            Self::PoolShare(pool) => {
                w.write_i32(3);
                w.write_fixed(pool);
            }
        }
    }
}

impl ReadXdr for TrustLineAsset {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, XdrError> {
        let asset = match r.read_i32()? {
            0 => Asset::Native,
            1 => Asset::CreditAlphanum4 {
                code: r.read_fixed()?,
                issuer: AccountId::read_xdr(r)?,
            },
            2 => Asset::CreditAlphanum12 {
                code: r.read_fixed()?,
                issuer: AccountId::read_xdr(r)?,
            },
            3 => return Ok(Self::PoolShare(r.read_fixed()?)),
            other => {
                return Err(XdrError::InvalidDiscriminant {
                    type_name: "TrustLineAsset",
                    value: other.into(),
                })
            }
        };
        Ok(Self::Asset(asset))
    }
}

/// Lifetime class of a contract data entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractDataDurability {
    /// Evicted once its TTL lapses
    Temporary,
    /// Archived once its TTL lapses
    Persistent,
}

/// Key of a ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LedgerKey {
    /// Account entry
    Account(AccountId),
    /// Trust line entry
    Trustline {
        /// Holder
        account_id: AccountId,
        /// Trusted asset
        asset: TrustLineAsset,
    },
    /// Offer entry
    Offer {
        /// Seller
        seller_id: AccountId,
        /// Offer id
        offer_id: i64,
    },
    /// Account data entry
    Data {
        /// Owner
        account_id: AccountId,
        /// Entry name (up to 64 bytes)
        data_name: String,
    },
    /// Claimable balance entry
    ClaimableBalance(Hash),
    /// Liquidity pool entry
    LiquidityPool(Hash),
    /// Contract storage entry
    ContractData {
        /// Owning contract
        contract: ScAddress,
        /// Storage key
        key: ScVal,
        /// Storage class
        durability: ContractDataDurability,
    },
    /// Uploaded wasm
    ContractCode(Hash),
    /// Network configuration setting
    ConfigSetting(i32),
    /// Time-to-live of another entry, by key hash
    Ttl(Hash),
}

impl LedgerKey {
    /// Short name of the entry type, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Account(_) => "account",
            Self::Trustline { .. } => "trustline",
            Self::Offer { .. } => "offer",
            Self::Data { .. } => "data",
            Self::ClaimableBalance(_) => "claimable_balance",
            Self::LiquidityPool(_) => "liquidity_pool",
            Self::ContractData { .. } => "contract_data",
            Self::ContractCode(_) => "contract_code",
            Self::ConfigSetting(_) => "config_setting",
            Self::Ttl(_) => "ttl",
        }
    }
}

impl WriteXdr for LedgerKey {
    fn write_xdr(&self, w: &mut XdrWriter) {
        match self {
            Self::Account(id) => {
                w.write_i32(0);
                id.write_xdr(w);
            }
            Self::Trustline { account_id, asset } => {
                w.write_i32(1);
                account_id.write_xdr(w);
                asset.write_xdr(w);
            }
            Self::Offer {
                seller_id,
                offer_id,
            } => {
                w.write_i32(2);
                seller_id.write_xdr(w);
                w.write_i64(*offer_id);
            }
            Self::Data {
                account_id,
                data_name,
            } => {
                w.write_i32(3);
                account_id.write_xdr(w);
                w.write_var(data_name.as_bytes());
            }
            Self::ClaimableBalance(hash) => {
                w.write_i32(4);
                w.write_i32(0);
                w.write_fixed(hash);
            }
            Self::LiquidityPool(hash) => {
                w.write_i32(5);
                w.write_fixed(hash);
            }
            Self::ContractData {
                contract,
                key,
                durability,
            } => {
                w.write_i32(6);
                contract.write_xdr(w);
                key.write_xdr(w);
                w.write_i32(match durability {
                    ContractDataDurability::Temporary => 0,
                    ContractDataDurability::Persistent => 1,
                });
            }
            Self::ContractCode(hash) => {
                w.write_i32(7);
                w.write_fixed(hash);
            }
            Self::ConfigSetting(id) => {
                w.write_i32(8);
                w.write_i32(*id);
            }
            Self::Ttl(hash) => {
                w.write_i32(9);
                w.write_fixed(hash);
            }
        }
    }
}

impl ReadXdr for LedgerKey {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, XdrError> {
        let key = match r.read_i32()? {
            0 => Self::Account(AccountId::read_xdr(r)?),
            1 => Self::Trustline {
                account_id: AccountId::read_xdr(r)?,
                asset: TrustLineAsset::read_xdr(r)?,
            },
            2 => Self::Offer {
                seller_id: AccountId::read_xdr(r)?,
                offer_id: r.read_i64()?,
            },
            3 => Self::Data {
                account_id: AccountId::read_xdr(r)?,
                data_name: r.read_string(64)?,
            },
            4 => match r.read_i32()? {
                0 => Self::ClaimableBalance(r.read_fixed()?),
                other => {
                    return Err(XdrError::InvalidDiscriminant {
                        type_name: "ClaimableBalanceID",
                        value: other.into(),
                    })
                }
            },
            5 => Self::LiquidityPool(r.read_fixed()?),
            6 => Self::ContractData {
                contract: ScAddress::read_xdr(r)?,
                key: ScVal::read_xdr(r)?,
                durability: match r.read_i32()? {
                    0 => ContractDataDurability::Temporary,
                    1 => ContractDataDurability::Persistent,
                    other => {
                        return Err(XdrError::InvalidDiscriminant {
                            type_name: "ContractDataDurability",
                            value: other.into(),
                        })
                    }
                },
            },
            7 => Self::ContractCode(r.read_fixed()?),
            8 => Self::ConfigSetting(r.read_i32()?),
            9 => Self::Ttl(r.read_fixed()?),
            other => {
                return Err(XdrError::InvalidDiscriminant {
                    type_name: "LedgerKey",
                    value: other.into(),
                })
            }
        };
        Ok(key)
    }
}

/// The storage keys a transaction declares it will read and write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerFootprint {
    /// Keys only read
    pub read_only: Vec<LedgerKey>,
    /// Keys read and written
    pub read_write: Vec<LedgerKey>,
}

impl LedgerFootprint {
    /// Whether the transaction touches no storage at all.
    pub fn is_empty(&self) -> bool {
        self.read_only.is_empty() && self.read_write.is_empty()
    }
}

impl WriteXdr for LedgerFootprint {
    fn write_xdr(&self, w: &mut XdrWriter) {
        write_vec(w, &self.read_only);
        write_vec(w, &self.read_write);
    }
}

impl ReadXdr for LedgerFootprint {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, XdrError> {
        Ok(Self {
            read_only: read_vec(r, u32::MAX)?,
            read_write: read_vec(r, u32::MAX)?,
        })
    }
}

/// Execution resources declared for a Soroban transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SorobanResources {
    /// Storage footprint
    pub footprint: LedgerFootprint,
    /// CPU instructions
    pub instructions: u32,
    /// Bytes read from disk
    pub disk_read_bytes: u32,
    /// Bytes written
    pub write_bytes: u32,
}

impl WriteXdr for SorobanResources {
    fn write_xdr(&self, w: &mut XdrWriter) {
        self.footprint.write_xdr(w);
        w.write_u32(self.instructions);
        w.write_u32(self.disk_read_bytes);
        w.write_u32(self.write_bytes);
    }
}

impl ReadXdr for SorobanResources {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, XdrError> {
        Ok(Self {
            footprint: LedgerFootprint::read_xdr(r)?,
            instructions: r.read_u32()?,
            disk_read_bytes: r.read_u32()?,
            write_bytes: r.read_u32()?,
        })
    }
}

/// Resource metadata attached to a Soroban transaction by the prepare step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SorobanTransactionData {
    /// Indices of archived footprint entries to restore automatically
    pub archived_entries: Option<Vec<u32>>,
    /// Declared resources
    pub resources: SorobanResources,
    /// Fee covering the declared resources, in stroops
    pub resource_fee: i64,
}

impl SorobanTransactionData {
    /// The footprint declared in the resources.
    pub fn footprint(&self) -> &LedgerFootprint {
        &self.resources.footprint
    }
}

impl WriteXdr for SorobanTransactionData {
    fn write_xdr(&self, w: &mut XdrWriter) {
        match &self.archived_entries {
            Some(indices) => {
                w.write_i32(1);
                w.write_len(indices.len());
                for index in indices {
                    w.write_u32(*index);
                }
            }
            None => w.write_i32(0),
        }
        self.resources.write_xdr(w);
        w.write_i64(self.resource_fee);
    }
}

impl ReadXdr for SorobanTransactionData {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, XdrError> {
        let archived_entries = match r.read_i32()? {
            0 => None,
            1 => {
                let len = r.read_len(u32::MAX)?;
                let mut indices = Vec::with_capacity(len.min(r.remaining() / 4));
                for _ in 0..len {
                    indices.push(r.read_u32()?);
                }
                Some(indices)
            }
            other => {
                return Err(XdrError::InvalidDiscriminant {
                    type_name: "SorobanTransactionDataExt",
                    value: other.into(),
                })
            }
        };
        Ok(Self {
            archived_entries,
            resources: SorobanResources::read_xdr(r)?,
            resource_fee: r.read_i64()?,
        })
    }
}

/// The leading fields of an account ledger entry.
///
/// Only the prefix needed to build transactions is decoded; the remainder of
/// the entry (thresholds, signers, extensions) is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountEntry {
    /// The account
    pub account_id: AccountId,
    /// Balance in stroops
    pub balance: i64,
    /// Current sequence number
    pub seq_num: i64,
}

impl AccountEntry {
    /// Reads the account prefix of a base64 `LedgerEntryData`.
    ///
    /// # Errors
    ///
    /// Fails if the data is not an account entry or is truncated.
    pub fn from_ledger_entry_data(encoded: &str) -> Result<Self, XdrError> {
        let bytes = base64::decode(encoded.trim())?;
        let mut r = XdrReader::new(&bytes);
        match r.read_i32()? {
            0 => Ok(Self {
                account_id: AccountId::read_xdr(&mut r)?,
                balance: r.read_i64()?,
                seq_num: r.read_i64()?,
            }),
            other => Err(XdrError::InvalidDiscriminant {
                type_name: "LedgerEntryType (expected ACCOUNT)",
                value: other.into(),
            }),
        }
    }
}
