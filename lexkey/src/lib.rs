//! Order-preserving encoding of typed tuples into byte keys.
//!
//! Keys produced by this crate compare byte-lexicographically in the same
//! order as the tuples they encode, field by field in declaration order.
//! That property is what makes structured keys usable in a sorted store:
//! a range scan over encoded keys visits tuples in tuple order, and all
//! keys sharing a field prefix form one contiguous run.
//!
//! # Field Encodings
//!
//! | Field type     | Encoding |
//! |----------------|----------|
//! | `Str`, `Bytes` | terminated bytes (see below) |
//! | `I32`, `I64`   | sign-bit-flipped big-endian |
//! | `U64`          | big-endian |
//!
//! # Terminated Bytes
//!
//! Variable-length fields are escaped and terminated with `0x00`:
//!
//! - `0x00` → `0x01 0x01`
//! - `0x01` → `0x01 0x02`
//! - All other bytes unchanged
//! - Terminated with `0x00` delimiter
//!
//! Using `0x00` as the terminator ensures shorter values sort before longer
//! values with the same prefix (e.g., "foo" < "foobar"), and because escape
//! sequences never emit a `0x00`, the terminator position is unambiguous.
//!
//! Decoding requires the caller to supply the field-type list; the encoding
//! carries no type tags of its own.

use bytes::{BufMut, Bytes, BytesMut};

/// Terminator byte for terminated bytes encoding (lowest byte value)
const TERMINATOR_BYTE: u8 = 0x00;

/// Escape character for terminated bytes encoding
const ESCAPE_BYTE: u8 = 0x01;

/// Error type for tuple encoding and decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed or truncated encoded input.
    Encoding(String),
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Encoding(msg) => write!(f, "Encoding error: {}", msg),
        }
    }
}

/// Result type alias for tuple codec operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The type of a single tuple field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// UTF-8 string, terminated-bytes encoded.
    Str,
    /// Raw bytes, terminated-bytes encoded.
    Bytes,
    /// Signed 32-bit integer, sign-flipped big-endian.
    I32,
    /// Signed 64-bit integer, sign-flipped big-endian.
    I64,
    /// Unsigned 64-bit integer, big-endian.
    U64,
}

/// A single decoded tuple field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    Bytes(Bytes),
    I32(i32),
    I64(i64),
    U64(u64),
}

impl Value {
    /// Returns the field type this value encodes as.
    pub fn field_type(&self) -> FieldType {
        match self {
            Value::Str(_) => FieldType::Str,
            Value::Bytes(_) => FieldType::Bytes,
            Value::I32(_) => FieldType::I32,
            Value::I64(_) => FieldType::I64,
            Value::U64(_) => FieldType::U64,
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::U64(v)
    }
}

impl From<Bytes> for Value {
    fn from(v: Bytes) -> Self {
        Value::Bytes(v)
    }
}

/// Encodes a tuple of values into an order-preserving byte key.
///
/// Fields are concatenated in declaration order; comparing two encoded
/// tuples of the same shape byte-lexicographically yields the same result
/// as comparing the tuples field by field.
pub fn encode(values: &[Value]) -> Bytes {
    let mut buf = BytesMut::new();
    for value in values {
        encode_value(value, &mut buf);
    }
    buf.freeze()
}

fn encode_value(value: &Value, buf: &mut BytesMut) {
    match value {
        Value::Str(s) => encode_terminated(s.as_bytes(), buf),
        Value::Bytes(b) => encode_terminated(b, buf),
        Value::I32(v) => buf.put_u32((*v as u32) ^ (1 << 31)),
        Value::I64(v) => buf.put_u64((*v as u64) ^ (1 << 63)),
        Value::U64(v) => buf.put_u64(*v),
    }
}

/// Decodes a complete key against the given field-type list.
///
/// # Errors
///
/// Returns an error if the key is malformed, a `Str` field is not valid
/// UTF-8, or bytes remain after the last field.
pub fn decode(key: &[u8], types: &[FieldType]) -> Result<Vec<Value>> {
    let (values, consumed) = decode_prefix(key, types)?;
    if consumed != key.len() {
        return Err(Error::Encoding(format!(
            "{} trailing bytes after decoding {} fields",
            key.len() - consumed,
            types.len()
        )));
    }
    Ok(values)
}

/// Decodes the leading fields of a key against the given field-type list.
///
/// Returns the decoded values and the number of key bytes consumed. The
/// remaining suffix `&key[consumed..]` is untouched, so a caller can treat
/// the leading fields as a group prefix while leaving the rest opaque.
pub fn decode_prefix(key: &[u8], types: &[FieldType]) -> Result<(Vec<Value>, usize)> {
    let mut values = Vec::with_capacity(types.len());
    let mut rest = key;
    for field_type in types {
        let value = decode_value(*field_type, &mut rest)?;
        values.push(value);
    }
    Ok((values, key.len() - rest.len()))
}

fn decode_value(field_type: FieldType, buf: &mut &[u8]) -> Result<Value> {
    match field_type {
        FieldType::Str => {
            let raw = decode_terminated(buf)?;
            let s = String::from_utf8(raw.to_vec())
                .map_err(|e| Error::Encoding(format!("invalid UTF-8 in string field: {}", e)))?;
            Ok(Value::Str(s))
        }
        FieldType::Bytes => Ok(Value::Bytes(decode_terminated(buf)?)),
        FieldType::I32 => {
            let raw = take_fixed::<4>(buf, "i32")?;
            Ok(Value::I32((u32::from_be_bytes(raw) ^ (1 << 31)) as i32))
        }
        FieldType::I64 => {
            let raw = take_fixed::<8>(buf, "i64")?;
            Ok(Value::I64((u64::from_be_bytes(raw) ^ (1 << 63)) as i64))
        }
        FieldType::U64 => {
            let raw = take_fixed::<8>(buf, "u64")?;
            Ok(Value::U64(u64::from_be_bytes(raw)))
        }
    }
}

fn take_fixed<const N: usize>(buf: &mut &[u8], what: &str) -> Result<[u8; N]> {
    if buf.len() < N {
        return Err(Error::Encoding(format!(
            "buffer too short for {} field: need {} bytes, have {}",
            what,
            N,
            buf.len()
        )));
    }
    let mut raw = [0u8; N];
    raw.copy_from_slice(&buf[..N]);
    *buf = &buf[N..];
    Ok(raw)
}

/// Appends one field's worth of escaped bytes plus the terminator.
///
/// Only the two structurally meaningful bytes are escaped, each to the pair
/// formed by `0x01` and its value plus one (`0x00` becomes `0x01 0x01`,
/// `0x01` becomes `0x01 0x02`); every other byte passes through untouched.
/// A single `0x00` closes the field.
fn encode_terminated(data: &[u8], buf: &mut BytesMut) {
    for &byte in data {
        if byte == TERMINATOR_BYTE || byte == ESCAPE_BYTE {
            buf.put_u8(ESCAPE_BYTE);
            buf.put_u8(byte + 1);
        } else {
            buf.put_u8(byte);
        }
    }
    buf.put_u8(TERMINATOR_BYTE);
}

/// Reads one terminated field, leaving `buf` positioned just past its
/// `0x00` terminator.
fn decode_terminated(buf: &mut &[u8]) -> Result<Bytes> {
    let mut out = BytesMut::new();
    let mut rest = *buf;

    loop {
        let (&byte, tail) = rest.split_first().ok_or_else(|| {
            Error::Encoding("terminated field has no 0x00 terminator".to_string())
        })?;
        rest = tail;

        match byte {
            TERMINATOR_BYTE => {
                *buf = rest;
                return Ok(out.freeze());
            }
            ESCAPE_BYTE => {
                // An escape byte promises a second byte naming the original.
                let (&escaped, tail) = rest.split_first().ok_or_else(|| {
                    Error::Encoding("escape byte 0x01 ends the input".to_string())
                })?;
                rest = tail;
                match escaped {
                    0x01 => out.put_u8(TERMINATOR_BYTE),
                    0x02 => out.put_u8(ESCAPE_BYTE),
                    other => {
                        return Err(Error::Encoding(format!(
                            "unknown escape pair 0x01 0x{:02x}",
                            other
                        )));
                    }
                }
            }
            other => out.put_u8(other),
        }
    }
}
