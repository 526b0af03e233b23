//! The transport capability consumed by the controller.
//!
//! The batch engine does not implement a wire protocol. It talks to a
//! [`Transport`]: a session-oriented backend that can read and write raw
//! register memory by address text. Melsec-style and Omron-style clients
//! are different implementations of this one trait, selected when the
//! controller is constructed; the engine never branches on backend
//! identity.
//!
//! Buffers returned by `read_words` are little-endian byte images, two
//! bytes per register, which is what the decode pass expects. Timeouts are
//! the transport's business; this layer only reports outcomes.

use crate::error::Result;

/// Default upper bound on register units per read, matching transports
/// whose length field is a 16-bit count.
pub const DEFAULT_MAX_READ_UNITS: u32 = u16::MAX as u32;

/// A session-oriented register transport.
///
/// All addresses are canonical text (`D100`, `M10.3`) as rendered by
/// [`Address`](crate::Address). Implementations report failures through
/// [`PlcError::Transport`](crate::PlcError::Transport); the controller
/// reacts by dropping its connection state.
pub trait Transport {
    /// Establishes a session with the device.
    fn open(&mut self) -> Result<()>;

    /// Tears the session down. A close that fails has nothing useful to
    /// tell the caller, so this is infallible.
    fn close(&mut self);

    /// Reads `length` registers starting at `start_addr`, returning their
    /// little-endian byte image (`length * 2` bytes).
    fn read_words(&mut self, start_addr: &str, length: u32) -> Result<Vec<u8>>;

    /// Reads `length` consecutive bit devices starting at `start_addr`.
    ///
    /// Used for transports with a native bit-read path; the controller
    /// falls back to `read_words` plus expansion for batch cycles.
    fn read_bits(&mut self, start_addr: &str, length: u32) -> Result<Vec<bool>>;

    /// Writes consecutive 16-bit registers starting at `start_addr`.
    fn write_words(&mut self, start_addr: &str, values: &[i16]) -> Result<()>;

    /// Writes consecutive bit devices starting at `start_addr`.
    fn write_bits(&mut self, start_addr: &str, values: &[bool]) -> Result<()>;

    /// Most register units one read may request. The controller rejects
    /// larger spans before calling the transport.
    fn max_read_units(&self) -> u32 {
        DEFAULT_MAX_READ_UNITS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_max_read_units() {
        assert_eq!(DEFAULT_MAX_READ_UNITS, 65535);
    }
}
