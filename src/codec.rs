//! Scatter-decode of one raw response buffer into a register set.
//!
//! A decode pass takes the bytes the transport returned for a set's
//! covering range and writes each entry's value at its computed offset:
//!
//! - **Word sets**: each entry decodes at byte offset
//!   `(entry_offset - start_addr) * 2` according to its kind.
//! - **Bit sets**: the buffer is reinterpreted as little-endian 16-bit
//!   words and expanded to a bit sequence where bit `i` of word `w` lives
//!   at global index `w * 16 + i`; each entry reads the bit at
//!   `(entry_offset - start_addr) * 16 + bit`.
//!
//! Every decode shifts the entry's current value into its previous slot
//! and stamps the update time, even when the value is unchanged. Entries
//! are updated in place, in insertion order; if the buffer runs out
//! mid-pass the entries already processed keep their new values — a batch
//! is best-effort telemetry, not a transaction.
//!
//! # Example
//!
//! ```
//! use plc_batch::{decode_set, RegisterSet, Value, ValueKind};
//!
//! let mut set = RegisterSet::new("s");
//! set.add("a", "D100", ValueKind::Int16, None).unwrap();
//! set.add("b", "D101", ValueKind::Int16, None).unwrap();
//!
//! decode_set(&[0x01, 0x00, 0x02, 0x00], &mut set).unwrap();
//! assert_eq!(*set[0].current(), Value::Int16(1));
//! assert_eq!(*set[1].current(), Value::Int16(2));
//! ```

use crate::error::{PlcError, Result};
use crate::set::RegisterSet;
use crate::value::{self, Value, ValueKind};

/// Bytes per register unit: one 16-bit word.
pub const BYTES_PER_REGISTER: usize = 2;

/// Decodes a raw response buffer into every entry of the set.
///
/// The buffer must hold exactly `set.span() * 2` bytes. A longer buffer is
/// rejected up front; a shorter one fails with `OutOfRange` at the first
/// entry that reaches past the end, leaving earlier entries updated.
///
/// # Errors
///
/// `OutOfRange` on any length mismatch between the computed span and the
/// payload.
pub fn decode_set(buffer: &[u8], set: &mut RegisterSet) -> Result<()> {
    let expected = set.span() as usize * BYTES_PER_REGISTER;
    if buffer.len() > expected {
        // The whole pass needs exactly `expected` bytes from offset 0.
        return Err(PlcError::out_of_range(0, expected, buffer.len()));
    }

    let Some(start) = set.start_addr() else {
        return Ok(());
    };

    if set.is_bit_addressed() {
        decode_bits(buffer, set, start)
    } else {
        decode_words(buffer, set, start)
    }
}

fn decode_bits(buffer: &[u8], set: &mut RegisterSet, start: u32) -> Result<()> {
    for entry in set.entries_mut() {
        let address = entry.address();
        let bit = u32::from(address.bit.unwrap_or(0));
        let global = (address.offset - start) * 16 + bit;
        let byte = global as usize / 8;
        if byte >= buffer.len() {
            return Err(PlcError::out_of_range(byte, 1, buffer.len()));
        }
        let on = (buffer[byte] >> (global % 8)) & 1 != 0;
        entry.set_value(Value::Bool(on));
    }
    Ok(())
}

fn decode_words(buffer: &[u8], set: &mut RegisterSet, start: u32) -> Result<()> {
    for entry in set.entries_mut() {
        let offset = (entry.address().offset - start) as usize * BYTES_PER_REGISTER;
        let decoded = match entry.kind() {
            ValueKind::Bool => Value::Bool(value::decode_bool(buffer, offset)?),
            ValueKind::Int16 => Value::Int16(value::decode_i16(buffer, offset)?),
            ValueKind::Int32 => Value::Int32(value::decode_i32(buffer, offset)?),
            ValueKind::Int64 => Value::Int64(value::decode_i64(buffer, offset)?),
            ValueKind::Float32 => Value::Float32(value::decode_f32(buffer, offset)?),
            ValueKind::Float64 => Value::Float64(value::decode_f64(buffer, offset)?),
            ValueKind::FixedString => {
                let len = entry.width() as usize * BYTES_PER_REGISTER;
                Value::Text(value::decode_ascii(buffer, offset, len)?)
            }
        };
        entry.set_value(decoded);
    }
    Ok(())
}
