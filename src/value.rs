//! Value kinds, decoded values, and little-endian primitive decoding.
//!
//! Every register entry declares a [`ValueKind`] fixing how many register
//! units it occupies and how its bytes decode. Decoded results are stored
//! in the [`Value`] tagged variant so one set can hold a homogeneous entry
//! list without type parameters.
//!
//! | Kind | Register units | Decoded as |
//! |------|---------------|------------|
//! | `Bool` | 1 | boolean from one byte |
//! | `Int16` | 1 | signed 16-bit little-endian |
//! | `Int32` | 2 | signed 32-bit little-endian |
//! | `Int64` | 4 | signed 64-bit little-endian |
//! | `Float32` | 2 | IEEE-754 single |
//! | `Float64` | 4 | IEEE-754 double |
//! | `FixedString` | caller-supplied | ASCII, trailing NUL padding trimmed |
//!
//! # Example
//!
//! ```
//! use plc_batch::{Value, ValueKind};
//!
//! assert_eq!(ValueKind::Float32.width(), Some(2));
//! assert_eq!(ValueKind::FixedString.width(), None);
//!
//! let v = Value::zero(ValueKind::Int16);
//! assert_eq!(v, Value::Int16(0));
//! assert_eq!(v.kind(), ValueKind::Int16);
//! ```

use crate::error::{PlcError, Result};

/// The declared type of a register entry.
///
/// One register unit is a 16-bit word (two bytes) for word-addressed sets,
/// or one register's worth of bits for bit-addressed sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Boolean, one register unit (or a single bit in a bit set).
    Bool,
    /// Signed 16-bit integer, one register unit.
    Int16,
    /// Signed 32-bit integer, two register units.
    Int32,
    /// Signed 64-bit integer, four register units.
    Int64,
    /// IEEE-754 single-precision float, two register units.
    Float32,
    /// IEEE-754 double-precision float, four register units.
    Float64,
    /// Fixed-length ASCII string; width supplied by the caller.
    FixedString,
}

impl ValueKind {
    /// Register units this kind occupies, or `None` for `FixedString`,
    /// whose width is caller-supplied.
    pub fn width(self) -> Option<u32> {
        match self {
            ValueKind::Bool => Some(1),
            ValueKind::Int16 => Some(1),
            ValueKind::Int32 => Some(2),
            ValueKind::Int64 => Some(4),
            ValueKind::Float32 => Some(2),
            ValueKind::Float64 => Some(4),
            ValueKind::FixedString => None,
        }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ValueKind::Bool => "Bool",
            ValueKind::Int16 => "Int16",
            ValueKind::Int32 => "Int32",
            ValueKind::Int64 => "Int64",
            ValueKind::Float32 => "Float32",
            ValueKind::Float64 => "Float64",
            ValueKind::FixedString => "FixedString",
        };
        write!(f, "{name}")
    }
}

/// A decoded register value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Boolean value.
    Bool(bool),
    /// Signed 16-bit integer.
    Int16(i16),
    /// Signed 32-bit integer.
    Int32(i32),
    /// Signed 64-bit integer.
    Int64(i64),
    /// Single-precision float.
    Float32(f32),
    /// Double-precision float.
    Float64(f64),
    /// ASCII text.
    Text(String),
}

impl Value {
    /// The zero value of a kind, used when entries are created or cleared.
    pub fn zero(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Bool => Value::Bool(false),
            ValueKind::Int16 => Value::Int16(0),
            ValueKind::Int32 => Value::Int32(0),
            ValueKind::Int64 => Value::Int64(0),
            ValueKind::Float32 => Value::Float32(0.0),
            ValueKind::Float64 => Value::Float64(0.0),
            ValueKind::FixedString => Value::Text(String::new()),
        }
    }

    /// The kind tag of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Int16(_) => ValueKind::Int16,
            Value::Int32(_) => ValueKind::Int32,
            Value::Int64(_) => ValueKind::Int64,
            Value::Float32(_) => ValueKind::Float32,
            Value::Float64(_) => ValueKind::Float64,
            Value::Text(_) => ValueKind::FixedString,
        }
    }

    /// Returns the boolean payload, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer payload widened to `i64`, if this is an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int16(v) => Some(i64::from(*v)),
            Value::Int32(v) => Some(i64::from(*v)),
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the float payload widened to `f64`, if this is a float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float32(v) => Some(f64::from(*v)),
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the text payload, if this is a `Text`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int16(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Float32(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "{v}"),
        }
    }
}

fn take<const N: usize>(buffer: &[u8], offset: usize) -> Result<[u8; N]> {
    let end = offset
        .checked_add(N)
        .ok_or_else(|| PlcError::out_of_range(offset, N, buffer.len()))?;
    if end > buffer.len() {
        return Err(PlcError::out_of_range(offset, N, buffer.len()));
    }
    let mut bytes = [0u8; N];
    bytes.copy_from_slice(&buffer[offset..end]);
    Ok(bytes)
}

/// Decodes a boolean from the byte at `offset`.
///
/// Any non-zero byte is `true`.
pub fn decode_bool(buffer: &[u8], offset: usize) -> Result<bool> {
    let [b] = take::<1>(buffer, offset)?;
    Ok(b != 0)
}

/// Decodes a signed 16-bit little-endian integer at `offset`.
pub fn decode_i16(buffer: &[u8], offset: usize) -> Result<i16> {
    Ok(i16::from_le_bytes(take(buffer, offset)?))
}

/// Decodes a signed 32-bit little-endian integer at `offset`.
pub fn decode_i32(buffer: &[u8], offset: usize) -> Result<i32> {
    Ok(i32::from_le_bytes(take(buffer, offset)?))
}

/// Decodes a signed 64-bit little-endian integer at `offset`.
pub fn decode_i64(buffer: &[u8], offset: usize) -> Result<i64> {
    Ok(i64::from_le_bytes(take(buffer, offset)?))
}

/// Decodes an IEEE-754 single at `offset` (little-endian byte order).
pub fn decode_f32(buffer: &[u8], offset: usize) -> Result<f32> {
    Ok(f32::from_le_bytes(take(buffer, offset)?))
}

/// Decodes an IEEE-754 double at `offset` (little-endian byte order).
pub fn decode_f64(buffer: &[u8], offset: usize) -> Result<f64> {
    Ok(f64::from_le_bytes(take(buffer, offset)?))
}

/// Decodes `len` bytes of ASCII text at `offset`, trimming trailing NUL
/// padding.
pub fn decode_ascii(buffer: &[u8], offset: usize, len: usize) -> Result<String> {
    let end = offset
        .checked_add(len)
        .ok_or_else(|| PlcError::out_of_range(offset, len, buffer.len()))?;
    if end > buffer.len() {
        return Err(PlcError::out_of_range(offset, len, buffer.len()));
    }
    let mut bytes = &buffer[offset..end];
    while let [head @ .., 0] = bytes {
        bytes = head;
    }
    Ok(String::from_utf8_lossy(bytes).to_string())
}
