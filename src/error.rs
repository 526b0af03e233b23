//! Error types for the batch-register engine.

use thiserror::Error;

/// Result type alias for PLC batch operations.
pub type Result<T> = std::result::Result<T, PlcError>;

/// Errors that can occur while building register sets or running cycles.
#[derive(Debug, Error)]
pub enum PlcError {
    /// A register address string could not be parsed.
    #[error("malformed address '{text}': {reason}")]
    MalformedAddress {
        /// The address text as given by the caller.
        text: String,
        /// Description of what was wrong with it.
        reason: String,
    },

    /// An entry could not be inserted into a register set.
    ///
    /// Raised on mixed prefixes, mixed bit/word mode, or duplicate
    /// addresses. The set is left untouched.
    #[error("incompatible entry: {reason}")]
    IncompatibleEntry {
        /// Description of the incompatibility.
        reason: String,
    },

    /// The set's covering span exceeds the transport's read limit.
    ///
    /// Checked before any transport call is made.
    #[error("span of {span} register units exceeds transport maximum of {max}")]
    RangeTooLarge {
        /// The span that was requested, in register units.
        span: u32,
        /// The transport's maximum read size, in register units.
        max: u32,
    },

    /// The transport reported a failure on open, read, or write.
    ///
    /// The controller drops to `Unconnected` when this occurs.
    #[error("transport failure: {reason}")]
    Transport {
        /// Description from the transport backend.
        reason: String,
    },

    /// A decode reached past the end of the response buffer.
    ///
    /// Indicates a mismatch between the computed span and the payload the
    /// transport actually returned. Entries decoded before the overrun keep
    /// their updated values.
    #[error("decode out of range: need {needed} bytes at offset {offset}, buffer holds {available}")]
    OutOfRange {
        /// Byte offset the decode started at.
        offset: usize,
        /// Bytes the entry needed from that offset.
        needed: usize,
        /// Total bytes available in the buffer.
        available: usize,
    },
}

impl PlcError {
    /// Creates a new `MalformedAddress` error.
    ///
    /// # Example
    ///
    /// ```
    /// use plc_batch::PlcError;
    ///
    /// let err = PlcError::malformed_address("D", "missing numeric offset");
    /// ```
    pub fn malformed_address(text: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedAddress {
            text: text.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new `IncompatibleEntry` error.
    ///
    /// # Example
    ///
    /// ```
    /// use plc_batch::PlcError;
    ///
    /// let err = PlcError::incompatible_entry("duplicate address D100");
    /// ```
    pub fn incompatible_entry(reason: impl Into<String>) -> Self {
        Self::IncompatibleEntry {
            reason: reason.into(),
        }
    }

    /// Creates a new `Transport` error.
    ///
    /// # Example
    ///
    /// ```
    /// use plc_batch::PlcError;
    ///
    /// let err = PlcError::transport("connection refused");
    /// ```
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    /// Creates a new `OutOfRange` error.
    pub fn out_of_range(offset: usize, needed: usize, available: usize) -> Self {
        Self::OutOfRange {
            offset,
            needed,
            available,
        }
    }
}
