//! Register address parsing and rendering.
//!
//! PLC registers are referenced by a single prefix letter identifying the
//! memory area, a numeric offset within that area, and an optional bit
//! sub-index for bit-addressed references:
//!
//! | Text | Meaning |
//! |------|---------|
//! | `D100` | word register 100 of area `D` |
//! | `M10.3` | bit 3 of word 10 in area `M` |
//!
//! Parsing is a pure function with no side effects; a reference that does
//! not match the grammar fails with [`PlcError::MalformedAddress`].
//!
//! # Example
//!
//! ```
//! use plc_batch::Address;
//!
//! let word: Address = "D100".parse().unwrap();
//! assert_eq!(word.prefix, 'D');
//! assert_eq!(word.offset, 100);
//! assert!(!word.is_bit_addressed());
//!
//! let bit: Address = "M10.3".parse().unwrap();
//! assert_eq!(bit.bit, Some(3));
//! assert_eq!(bit.to_string(), "M10.3");
//! ```

use std::str::FromStr;

use crate::error::{PlcError, Result};

/// Highest valid bit sub-index within a 16-bit register.
pub const MAX_BIT_INDEX: u8 = 15;

/// A parsed register reference.
///
/// `prefix` and `offset` (plus `bit` when present) uniquely identify one
/// physical location; two addresses are equal iff all three match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    /// Memory area letter, e.g. `D` for a data register bank.
    pub prefix: char,
    /// Register index within the area.
    pub offset: u32,
    /// Bit sub-index (0-15) for bit-addressed references.
    pub bit: Option<u8>,
}

impl Address {
    /// Creates a word address.
    ///
    /// # Example
    ///
    /// ```
    /// use plc_batch::Address;
    ///
    /// let addr = Address::word('D', 100);
    /// assert_eq!(addr.to_string(), "D100");
    /// ```
    pub fn word(prefix: char, offset: u32) -> Self {
        Self {
            prefix,
            offset,
            bit: None,
        }
    }

    /// Creates a bit address.
    ///
    /// # Errors
    ///
    /// Returns `MalformedAddress` if `bit` > 15.
    ///
    /// # Example
    ///
    /// ```
    /// use plc_batch::Address;
    ///
    /// let addr = Address::bit('M', 10, 3).unwrap();
    /// assert_eq!(addr.to_string(), "M10.3");
    /// assert!(Address::bit('M', 10, 16).is_err());
    /// ```
    pub fn bit(prefix: char, offset: u32, bit: u8) -> Result<Self> {
        if bit > MAX_BIT_INDEX {
            return Err(PlcError::malformed_address(
                format!("{prefix}{offset}.{bit}"),
                format!("bit index {bit} exceeds {MAX_BIT_INDEX}"),
            ));
        }
        Ok(Self {
            prefix,
            offset,
            bit: Some(bit),
        })
    }

    /// Parses an address from its text form.
    ///
    /// Accepts `{prefix}{offset}` and `{prefix}{offset}.{bit}` where the
    /// prefix is one letter, the offset is a non-negative integer, and the
    /// bit is 0-15.
    ///
    /// # Errors
    ///
    /// Returns `MalformedAddress` when the prefix is missing, the offset is
    /// not numeric, or the bit suffix is out of range.
    ///
    /// # Example
    ///
    /// ```
    /// use plc_batch::Address;
    ///
    /// assert!(Address::parse("D100").is_ok());
    /// assert!(Address::parse("M10.3").is_ok());
    /// assert!(Address::parse("100").is_err());
    /// assert!(Address::parse("M10.16").is_err());
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        let mut chars = text.chars();
        let prefix = match chars.next() {
            Some(c) if c.is_ascii_alphabetic() => c,
            Some(_) => {
                return Err(PlcError::malformed_address(
                    text,
                    "prefix must be a letter",
                ))
            }
            None => return Err(PlcError::malformed_address(text, "empty address")),
        };

        let rest = chars.as_str();
        match rest.split_once('.') {
            Some((offset_part, bit_part)) => {
                let offset = parse_offset(text, offset_part)?;
                let bit: u8 = bit_part.parse().map_err(|_| {
                    PlcError::malformed_address(text, "bit suffix is not numeric")
                })?;
                Self::bit(prefix, offset, bit)
            }
            None => {
                let offset = parse_offset(text, rest)?;
                Ok(Self::word(prefix, offset))
            }
        }
    }

    /// Returns whether this address denotes a single-bit value.
    pub fn is_bit_addressed(&self) -> bool {
        self.bit.is_some()
    }
}

fn parse_offset(text: &str, part: &str) -> Result<u32> {
    if part.is_empty() {
        return Err(PlcError::malformed_address(text, "missing numeric offset"));
    }
    part.parse()
        .map_err(|_| PlcError::malformed_address(text, "offset is not a non-negative integer"))
}

impl FromStr for Address {
    type Err = PlcError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.bit {
            Some(bit) => write!(f, "{}{}.{}", self.prefix, self.offset, bit),
            None => write!(f, "{}{}", self.prefix, self.offset),
        }
    }
}
