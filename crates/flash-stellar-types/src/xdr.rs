//! Minimal XDR (RFC 4506) codec.
//!
//! Everything on the Stellar wire is XDR: big-endian integers, 4-byte
//! alignment, length-prefixed variable data. [`XdrWriter`] appends and never
//! fails; [`XdrReader`] is bounds-checked and guards against runaway nesting
//! so hostile payloads from a node cannot blow the stack.

use thiserror::Error;

/// Maximum nesting depth accepted while decoding recursive values.
pub const MAX_DEPTH: u32 = 128;

/// Errors raised while decoding XDR or its textual forms.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum XdrError {
    /// Input ended before the value was complete
    #[error("unexpected end of XDR input: needed {needed} bytes, {remaining} left")]
    UnexpectedEof {
        /// Bytes required by the read
        needed: usize,
        /// Bytes left in the buffer
        remaining: usize,
    },

    /// A union discriminant is not one the type defines
    #[error("invalid {type_name} discriminant: {value}")]
    InvalidDiscriminant {
        /// The XDR type being decoded
        type_name: &'static str,
        /// The discriminant found on the wire
        value: i64,
    },

    /// A bool was encoded as something other than 0 or 1
    #[error("invalid XDR bool: {0}")]
    InvalidBool(u32),

    /// A variable-length item exceeds its declared bound
    #[error("length {actual} exceeds XDR bound {max}")]
    LengthExceeded {
        /// The declared maximum
        max: u32,
        /// The length found on the wire
        actual: u32,
    },

    /// Padding bytes were not zero
    #[error("non-zero XDR padding")]
    NonZeroPadding,

    /// Bytes remained after a complete value
    #[error("{0} trailing bytes after XDR value")]
    TrailingBytes(usize),

    /// A string field held invalid UTF-8 where UTF-8 is required
    #[error("invalid UTF-8 in XDR string")]
    InvalidUtf8,

    /// Recursive value nested deeper than [`MAX_DEPTH`]
    #[error("XDR value nested deeper than {MAX_DEPTH}")]
    DepthExceeded,

    /// Base64 transport encoding was invalid
    #[error("invalid base64: {0}")]
    Base64(String),

    /// A JSON rendering did not have the expected shape
    #[error("invalid JSON value: {0}")]
    InvalidJson(String),

    /// A structurally valid buffer that does not form the expected value
    #[error("malformed {0}")]
    Malformed(&'static str),
}

impl From<base64::DecodeError> for XdrError {
    fn from(err: base64::DecodeError) -> Self {
        Self::Base64(err.to_string())
    }
}

fn padding(len: usize) -> usize {
    (4 - len % 4) % 4
}

/// Append-only XDR encoder.
#[derive(Debug, Default, Clone)]
pub struct XdrWriter {
    buf: Vec<u8>,
}

impl XdrWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes an unsigned 32-bit integer.
    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Writes a signed 32-bit integer.
    pub fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Writes an unsigned hyper.
    pub fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Writes a signed hyper.
    pub fn write_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Writes a bool as 0 or 1.
    pub fn write_bool(&mut self, value: bool) {
        self.write_u32(u32::from(value));
    }

    /// Writes fixed-length opaque data followed by its padding.
    pub fn write_fixed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
        self.buf.extend(std::iter::repeat(0u8).take(padding(bytes.len())));
    }

    /// Writes variable-length opaque data: length prefix, bytes, padding.
    #[allow(clippy::cast_possible_truncation)] // XDR lengths are u32 by definition
    pub fn write_var(&mut self, bytes: &[u8]) {
        self.write_u32(bytes.len() as u32);
        self.write_fixed(bytes);
    }

    /// Writes a length prefix for a variable-length array.
    #[allow(clippy::cast_possible_truncation)]
    pub fn write_len(&mut self, len: usize) {
        self.write_u32(len as u32);
    }

    /// Appends bytes that are already XDR encoded.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Current encoded length.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consumes the writer, returning the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Bounds-checked XDR decoder over a borrowed buffer.
#[derive(Debug, Clone)]
pub struct XdrReader<'a> {
    data: &'a [u8],
    pos: usize,
    depth: u32,
}

impl<'a> XdrReader<'a> {
    /// Creates a reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            depth: 0,
        }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Current offset into the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], XdrError> {
        if self.remaining() < n {
            return Err(XdrError::UnexpectedEof {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], XdrError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Reads an unsigned 32-bit integer.
    pub fn read_u32(&mut self) -> Result<u32, XdrError> {
        Ok(u32::from_be_bytes(self.take_array()?))
    }

    /// Reads a signed 32-bit integer.
    pub fn read_i32(&mut self) -> Result<i32, XdrError> {
        Ok(i32::from_be_bytes(self.take_array()?))
    }

    /// Reads an unsigned hyper.
    pub fn read_u64(&mut self) -> Result<u64, XdrError> {
        Ok(u64::from_be_bytes(self.take_array()?))
    }

    /// Reads a signed hyper.
    pub fn read_i64(&mut self) -> Result<i64, XdrError> {
        Ok(i64::from_be_bytes(self.take_array()?))
    }

    /// Reads a bool, rejecting values other than 0 and 1.
    pub fn read_bool(&mut self) -> Result<bool, XdrError> {
        match self.read_u32()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(XdrError::InvalidBool(other)),
        }
    }

    fn skip_padding(&mut self, len: usize) -> Result<(), XdrError> {
        let pad = self.take(padding(len))?;
        if pad.iter().any(|b| *b != 0) {
            return Err(XdrError::NonZeroPadding);
        }
        Ok(())
    }

    /// Reads `N` bytes of fixed-length opaque data.
    pub fn read_fixed<const N: usize>(&mut self) -> Result<[u8; N], XdrError> {
        let out = self.take_array::<N>()?;
        self.skip_padding(N)?;
        Ok(out)
    }

    /// Reads a length prefix and checks it against `max`.
    pub fn read_len(&mut self, max: u32) -> Result<usize, XdrError> {
        let len = self.read_u32()?;
        if len > max {
            return Err(XdrError::LengthExceeded { max, actual: len });
        }
        Ok(len as usize)
    }

    /// Reads variable-length opaque data bounded by `max`.
    pub fn read_var(&mut self, max: u32) -> Result<Vec<u8>, XdrError> {
        let len = self.read_len(max)?;
        let bytes = self.take(len)?.to_vec();
        self.skip_padding(len)?;
        Ok(bytes)
    }

    /// Reads a UTF-8 string bounded by `max`.
    pub fn read_string(&mut self, max: u32) -> Result<String, XdrError> {
        String::from_utf8(self.read_var(max)?).map_err(|_| XdrError::InvalidUtf8)
    }

    /// Consumes `n` bytes verbatim, for fields kept opaque.
    pub fn read_raw(&mut self, n: usize) -> Result<&'a [u8], XdrError> {
        self.take(n)
    }

    /// Enters one level of a recursive value.
    pub fn enter(&mut self) -> Result<(), XdrError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(XdrError::DepthExceeded);
        }
        Ok(())
    }

    /// Leaves one level entered with [`XdrReader::enter`].
    pub fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Fails if any input is left over.
    pub fn finish(&self) -> Result<(), XdrError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(XdrError::TrailingBytes(n)),
        }
    }
}

/// Types that encode to XDR.
pub trait WriteXdr {
    /// Appends this value to `w`.
    fn write_xdr(&self, w: &mut XdrWriter);

    /// Encodes this value to bytes.
    fn to_xdr(&self) -> Vec<u8> {
        let mut w = XdrWriter::new();
        self.write_xdr(&mut w);
        w.into_bytes()
    }

    /// Encodes this value to base64, the form RPC endpoints exchange.
    fn to_xdr_base64(&self) -> String {
        base64::encode(self.to_xdr())
    }
}

/// Types that decode from XDR.
pub trait ReadXdr: Sized {
    /// Reads one value from `r`.
    fn read_xdr(r: &mut XdrReader<'_>) -> Result<Self, XdrError>;

    /// Decodes a complete value, rejecting trailing bytes.
    fn from_xdr(bytes: &[u8]) -> Result<Self, XdrError> {
        let mut r = XdrReader::new(bytes);
        let value = Self::read_xdr(&mut r)?;
        r.finish()?;
        Ok(value)
    }

    /// Decodes a complete base64 encoded value.
    fn from_xdr_base64(encoded: &str) -> Result<Self, XdrError> {
        let bytes = base64::decode(encoded.trim())?;
        Self::from_xdr(&bytes)
    }
}

pub(crate) fn read_vec<T: ReadXdr>(r: &mut XdrReader<'_>, max: u32) -> Result<Vec<T>, XdrError> {
    let len = r.read_len(max)?;
    // Cap the pre-allocation: a length prefix is untrusted until elements arrive.
    let mut items = Vec::with_capacity(len.min(r.remaining() / 4 + 1));
    for _ in 0..len {
        items.push(T::read_xdr(r)?);
    }
    Ok(items)
}

pub(crate) fn write_vec<T: WriteXdr>(w: &mut XdrWriter, items: &[T]) {
    w.write_len(items.len());
    for item in items {
        item.write_xdr(w);
    }
}
