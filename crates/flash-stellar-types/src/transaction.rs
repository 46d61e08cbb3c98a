//! Transactions, operations and envelopes.

use crate::ledger::{Asset, SorobanTransactionData};
use crate::scval::{AccountId, ScAddress, ScVal, SCSYMBOL_LIMIT};
use crate::xdr::{read_vec, write_vec, ReadXdr, WriteXdr, XdrError, XdrReader, XdrWriter};
use sha2::{Digest, Sha256};

/// Envelope type tag of a v1 transaction envelope.
pub const ENVELOPE_TYPE_TX: i32 = 2;

/// Maximum operations per transaction.
pub const MAX_OPS_PER_TX: usize = 100;

/// Maximum signatures per envelope.
pub const MAX_SIGNATURES: u32 = 20;

const KEY_TYPE_MUXED_ED25519: i32 = 0x100;

/// Bytes taken by one ed25519 decorated signature: hint, length, signature.
const ED25519_SIGNATURE_XDR_LEN: usize = 4 + 4 + 64;

/// SHA-256 of a network passphrase, mixed into every transaction hash.
pub fn network_id(passphrase: &str) -> [u8; 32] {
    Sha256::digest(passphrase.as_bytes()).into()
}

fn signature_payload_hash(network_id: &[u8; 32], tx_bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(network_id);
    hasher.update(ENVELOPE_TYPE_TX.to_be_bytes());
    hasher.update(tx_bytes);
    hasher.finalize().into()
}

/// A transaction or operation source account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MuxedAccount {
    /// Plain ed25519 account
    Ed25519([u8; 32]),
    /// Multiplexed account
    MuxedEd25519 {
        /// Multiplexing id
        id: u64,
        /// Underlying key
        key: [u8; 32],
    },
}

impl From<AccountId> for MuxedAccount {
    fn from(id: AccountId) -> Self {
        Self::Ed25519(id.0)
    }
}

impl WriteXdr for MuxedAccount {
    fn write_xdr(&self, w: &mut XdrWriter) {
        match self {
            Self::Ed25519(key) => {
                w.write_i32(0);
                w.write_fixed(key);
            }
            Self::MuxedEd25519 { id, key } => {
                w.write_i32(KEY_TYPE_MUXED_ED25519);
                w.write_u64(*id);
                w.write_fixed(key);
            }
        }
    }
}

impl ReadXdr for MuxedAccount {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, XdrError> {
        match r.read_i32()? {
            0 => Ok(Self::Ed25519(r.read_fixed()?)),
            KEY_TYPE_MUXED_ED25519 => Ok(Self::MuxedEd25519 {
                id: r.read_u64()?,
                key: r.read_fixed()?,
            }),
            other => Err(XdrError::InvalidDiscriminant {
                type_name: "MuxedAccount",
                value: other.into(),
            }),
        }
    }
}

/// Validity window of a transaction, in unix seconds (0 = unbounded).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBounds {
    /// Earliest close time
    pub min_time: u64,
    /// Latest close time
    pub max_time: u64,
}

/// Transaction memo.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Memo {
    /// No memo
    #[default]
    None,
    /// Up to 28 bytes of text
    Text(String),
    /// 64-bit id
    Id(u64),
}

impl WriteXdr for Memo {
    fn write_xdr(&self, w: &mut XdrWriter) {
        match self {
            Self::None => w.write_i32(0),
            Self::Text(text) => {
                w.write_i32(1);
                w.write_var(text.as_bytes());
            }
            Self::Id(id) => {
                w.write_i32(2);
                w.write_u64(*id);
            }
        }
    }
}

/// Arguments of a contract invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeContractArgs {
    /// Contract being called
    pub contract_address: ScAddress,
    /// Function name (a symbol)
    pub function_name: String,
    /// Encoded arguments
    pub args: Vec<ScVal>,
}

impl WriteXdr for InvokeContractArgs {
    fn write_xdr(&self, w: &mut XdrWriter) {
        self.contract_address.write_xdr(w);
        w.write_var(self.function_name.as_bytes());
        write_vec(w, &self.args);
    }
}

impl ReadXdr for InvokeContractArgs {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, XdrError> {
        Ok(Self {
            contract_address: ScAddress::read_xdr(r)?,
            function_name: r.read_string(SCSYMBOL_LIMIT)?,
            args: read_vec(r, u32::MAX)?,
        })
    }
}

/// An `InvokeHostFunction` operation calling a contract function.
///
/// Authorization entries come from simulation and are carried as opaque,
/// already encoded `SorobanAuthorizationEntry` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeHostFunctionOp {
    /// The invocation
    pub invoke: InvokeContractArgs,
    /// Encoded authorization entries
    pub auth: Vec<Vec<u8>>,
}

impl WriteXdr for InvokeHostFunctionOp {
    fn write_xdr(&self, w: &mut XdrWriter) {
        // HOST_FUNCTION_TYPE_INVOKE_CONTRACT
        w.write_i32(0);
        self.invoke.write_xdr(w);
        w.write_len(self.auth.len());
        for entry in &self.auth {
            w.write_raw(entry);
        }
    }
}

/// A `ChangeTrust` operation. A limit of zero removes the trust line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeTrustOp {
    /// Asset to trust
    pub asset: Asset,
    /// Maximum balance, in stroops
    pub limit: i64,
}

impl WriteXdr for ChangeTrustOp {
    fn write_xdr(&self, w: &mut XdrWriter) {
        self.asset.write_xdr(w);
        w.write_i64(self.limit);
    }
}

/// Body of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationBody {
    /// Contract call
    InvokeHostFunction(InvokeHostFunctionOp),
    /// Trust line change
    ChangeTrust(ChangeTrustOp),
    /// Any other operation, already encoded
    Raw {
        /// `OperationType` discriminant
        op_type: i32,
        /// Encoded body following the discriminant
        body: Vec<u8>,
    },
}

impl OperationBody {
    /// The `OperationType` discriminant.
    pub fn op_type(&self) -> i32 {
        match self {
            Self::ChangeTrust(_) => 6,
            Self::InvokeHostFunction(_) => 24,
            Self::Raw { op_type, .. } => *op_type,
        }
    }
}

/// A transaction operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// Overrides the transaction source for this operation
    pub source_account: Option<MuxedAccount>,
    /// What the operation does
    pub body: OperationBody,
}

impl Operation {
    /// Builds an operation without a source override.
    pub fn new(body: OperationBody) -> Self {
        Self {
            source_account: None,
            body,
        }
    }

    /// Reads an encoded operation, keeping its body opaque.
    ///
    /// Used for operations built elsewhere and appended to an envelope.
    pub fn from_xdr_opaque(bytes: &[u8]) -> Result<Self, XdrError> {
        let mut r = XdrReader::new(bytes);
        let source_account = if r.read_bool()? {
            Some(MuxedAccount::read_xdr(&mut r)?)
        } else {
            None
        };
        let op_type = r.read_i32()?;
        if !(0..=26).contains(&op_type) {
            return Err(XdrError::InvalidDiscriminant {
                type_name: "OperationType",
                value: op_type.into(),
            });
        }
        let body = r.read_raw(r.remaining())?.to_vec();
        Ok(Self {
            source_account,
            body: OperationBody::Raw { op_type, body },
        })
    }
}

impl WriteXdr for Operation {
    fn write_xdr(&self, w: &mut XdrWriter) {
        match &self.source_account {
            Some(source) => {
                w.write_bool(true);
                source.write_xdr(w);
            }
            None => w.write_bool(false),
        }
        w.write_i32(self.body.op_type());
        match &self.body {
            OperationBody::InvokeHostFunction(op) => op.write_xdr(w),
            OperationBody::ChangeTrust(op) => op.write_xdr(w),
            OperationBody::Raw { body, .. } => w.write_raw(body),
        }
    }
}

/// A v1 transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Fee-paying source account
    pub source_account: MuxedAccount,
    /// Total fee in stroops (inclusion fee plus any resource fee)
    pub fee: u32,
    /// Sequence number (account sequence + 1)
    pub seq_num: i64,
    /// Validity window
    pub time_bounds: Option<TimeBounds>,
    /// Memo
    pub memo: Memo,
    /// Operations, in execution order
    pub operations: Vec<Operation>,
    /// Soroban resource metadata, set by the prepare step
    pub soroban_data: Option<SorobanTransactionData>,
}

impl Transaction {
    /// Hash signed by every signer of this transaction on `network_id`.
    pub fn hash(&self, network_id: &[u8; 32]) -> [u8; 32] {
        signature_payload_hash(network_id, &self.to_xdr())
    }
}

impl WriteXdr for Transaction {
    fn write_xdr(&self, w: &mut XdrWriter) {
        self.source_account.write_xdr(w);
        w.write_u32(self.fee);
        w.write_i64(self.seq_num);
        match &self.time_bounds {
            Some(bounds) => {
                // PRECOND_TIME
                w.write_i32(1);
                w.write_u64(bounds.min_time);
                w.write_u64(bounds.max_time);
            }
            None => w.write_i32(0),
        }
        self.memo.write_xdr(w);
        write_vec(w, &self.operations);
        match &self.soroban_data {
            Some(data) => {
                w.write_i32(1);
                data.write_xdr(w);
            }
            None => w.write_i32(0),
        }
    }
}

/// A signature with the last four bytes of the signer's public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratedSignature {
    /// Signer hint
    pub hint: [u8; 4],
    /// Signature bytes (up to 64)
    pub signature: Vec<u8>,
}

impl WriteXdr for DecoratedSignature {
    fn write_xdr(&self, w: &mut XdrWriter) {
        w.write_fixed(&self.hint);
        w.write_var(&self.signature);
    }
}

impl ReadXdr for DecoratedSignature {
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, XdrError> {
        Ok(Self {
            hint: r.read_fixed()?,
            signature: r.read_var(64)?,
        })
    }
}

/// A transaction with its signatures, ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionEnvelope {
    /// The transaction
    pub tx: Transaction,
    /// Signatures collected so far
    pub signatures: Vec<DecoratedSignature>,
}

impl TransactionEnvelope {
    /// Wraps an unsigned transaction.
    pub fn unsigned(tx: Transaction) -> Self {
        Self {
            tx,
            signatures: Vec::new(),
        }
    }
}

impl WriteXdr for TransactionEnvelope {
    fn write_xdr(&self, w: &mut XdrWriter) {
        w.write_i32(ENVELOPE_TYPE_TX);
        self.tx.write_xdr(w);
        write_vec(w, &self.signatures);
    }
}

/// An encoded v1 envelope split into transaction bytes and signatures.
///
/// The signature list is the envelope's trailing field and ed25519
/// signatures have a fixed encoded size, so it can be located from the end
/// without decoding operations whose bodies (authorization trees, foreign
/// operations) this crate keeps opaque. Only ed25519 signatures are
/// recognized in an existing list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeParts {
    tx_bytes: Vec<u8>,
    signatures: Vec<DecoratedSignature>,
}

impl EnvelopeParts {
    /// Splits an encoded envelope.
    ///
    /// # Errors
    ///
    /// Fails if the envelope is not a v1 transaction envelope or no
    /// consistent signature list ends the buffer.
    pub fn split(bytes: &[u8]) -> Result<Self, XdrError> {
        let mut r = XdrReader::new(bytes);
        let envelope_type = r.read_i32()?;
        if envelope_type != ENVELOPE_TYPE_TX {
            return Err(XdrError::InvalidDiscriminant {
                type_name: "EnvelopeType",
                value: envelope_type.into(),
            });
        }

        for count in 0..=MAX_SIGNATURES as usize {
            let tail = 4 + count * ED25519_SIGNATURE_XDR_LEN;
            let Some(sig_start) = bytes.len().checked_sub(tail) else {
                break;
            };
            if sig_start <= 4 {
                break;
            }
            let mut sigs = XdrReader::new(&bytes[sig_start..]);
            let Ok(parsed) = read_vec::<DecoratedSignature>(&mut sigs, MAX_SIGNATURES) else {
                continue;
            };
            if parsed.len() == count
                && sigs.remaining() == 0
                && parsed.iter().all(|s| s.signature.len() == 64)
            {
                return Ok(Self {
                    tx_bytes: bytes[4..sig_start].to_vec(),
                    signatures: parsed,
                });
            }
        }
        Err(XdrError::Malformed("envelope signature list"))
    }

    /// Splits a base64 encoded envelope.
    pub fn split_base64(encoded: &str) -> Result<Self, XdrError> {
        Self::split(&base64::decode(encoded.trim())?)
    }

    /// The encoded transaction.
    pub fn tx_bytes(&self) -> &[u8] {
        &self.tx_bytes
    }

    /// Signatures already present.
    pub fn signatures(&self) -> &[DecoratedSignature] {
        &self.signatures
    }

    /// Hash to sign for `network_id`.
    pub fn hash(&self, network_id: &[u8; 32]) -> [u8; 32] {
        signature_payload_hash(network_id, &self.tx_bytes)
    }

    /// Appends a signature.
    pub fn add_signature(&mut self, signature: DecoratedSignature) {
        self.signatures.push(signature);
    }

    /// Re-encodes the envelope.
    pub fn to_xdr(&self) -> Vec<u8> {
        let mut w = XdrWriter::new();
        w.write_i32(ENVELOPE_TYPE_TX);
        w.write_raw(&self.tx_bytes);
        write_vec(&mut w, &self.signatures);
        w.into_bytes()
    }

    /// Re-encodes the envelope as base64.
    pub fn to_xdr_base64(&self) -> String {
        base64::encode(self.to_xdr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tx() -> Transaction {
        Transaction {
            source_account: MuxedAccount::Ed25519([1; 32]),
            fee: 100,
            seq_num: 43,
            time_bounds: Some(TimeBounds {
                min_time: 0,
                max_time: 1_700_000_060,
            }),
            memo: Memo::None,
            operations: vec![Operation::new(OperationBody::InvokeHostFunction(
                InvokeHostFunctionOp {
                    invoke: InvokeContractArgs {
                        contract_address: ScAddress::Contract([2; 32]),
                        function_name: "get_provider".into(),
                        args: vec![ScVal::U32(42)],
                    },
                    auth: vec![],
                },
            ))],
            soroban_data: None,
        }
    }

    #[test]
    fn test_network_id_is_passphrase_hash() {
        let id = network_id("Test SDF Network ; September 2015");
        assert_eq!(
            hex::encode(id),
            "cee0302d59844d32bdca915c8203dd44b33fbb7edc19051ea37abedf28ecd472"
        );
    }

    #[test]
    fn test_envelope_layout() {
        let envelope = TransactionEnvelope::unsigned(sample_tx());
        let bytes = envelope.to_xdr();
        assert_eq!(&bytes[..4], &[0, 0, 0, 2]);
        // Unsigned: trailing empty signature list.
        assert_eq!(&bytes[bytes.len() - 4..], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_split_unsigned_envelope() {
        let tx = sample_tx();
        let bytes = TransactionEnvelope::unsigned(tx.clone()).to_xdr();
        let parts = EnvelopeParts::split(&bytes).unwrap();
        assert_eq!(parts.tx_bytes(), tx.to_xdr().as_slice());
        assert!(parts.signatures().is_empty());

        let id = network_id("Test SDF Network ; September 2015");
        assert_eq!(parts.hash(&id), tx.hash(&id));
    }

    #[test]
    fn test_split_signed_envelope_and_append() {
        let tx = sample_tx();
        let envelope = TransactionEnvelope {
            tx: tx.clone(),
            signatures: vec![DecoratedSignature {
                hint: [1, 2, 3, 4],
                signature: vec![7; 64],
            }],
        };
        let mut parts = EnvelopeParts::split(&envelope.to_xdr()).unwrap();
        assert_eq!(parts.signatures().len(), 1);
        assert_eq!(parts.tx_bytes(), tx.to_xdr().as_slice());

        parts.add_signature(DecoratedSignature {
            hint: [5, 6, 7, 8],
            signature: vec![9; 64],
        });
        let reparsed = EnvelopeParts::split(&parts.to_xdr()).unwrap();
        assert_eq!(reparsed.signatures().len(), 2);
    }

    #[test]
    fn test_split_rejects_other_envelope_types() {
        let mut bytes = TransactionEnvelope::unsigned(sample_tx()).to_xdr();
        bytes[3] = 5;
        assert!(EnvelopeParts::split(&bytes).is_err());
    }

    #[test]
    fn test_opaque_operation_reencodes_identically() {
        let op = Operation {
            source_account: Some(MuxedAccount::Ed25519([3; 32])),
            body: OperationBody::ChangeTrust(ChangeTrustOp {
                asset: Asset::Native,
                limit: i64::MAX,
            }),
        };
        let bytes = op.to_xdr();
        let opaque = Operation::from_xdr_opaque(&bytes).unwrap();
        assert_eq!(opaque.body.op_type(), 6);
        assert_eq!(opaque.to_xdr(), bytes);
    }
}
