//! Ordered collections of register entries sharing one prefix and mode.
//!
//! A [`RegisterSet`] holds the entries of one batch read. All members must
//! share the memory-area prefix and the bit/word addressing mode, both
//! locked by the first successful insert. The set maintains the minimal
//! contiguous range covering every member — `start_addr` and `span` — so a
//! controller can fetch the whole set with a single transport round trip
//! instead of one read per named register.
//!
//! Insertion order is preserved and is the iteration order. Duplicate
//! addresses, foreign prefixes, and mode mismatches are rejected without
//! mutating the set.
//!
//! # Example
//!
//! ```
//! use plc_batch::{RegisterSet, ValueKind};
//!
//! let mut set = RegisterSet::new("machine");
//! set.add("speed", "D100", ValueKind::Int16, None).unwrap();
//! set.add("target", "D104", ValueKind::Int16, None).unwrap();
//!
//! assert_eq!(set.start_addr(), Some(100));
//! assert_eq!(set.span(), 5); // D100..=D104 inclusive
//! assert_eq!(set.full_start_address().unwrap(), "D100");
//!
//! for entry in &set {
//!     println!("{} -> {}", entry.name(), entry.full_address());
//! }
//! ```

use crate::address::Address;
use crate::entry::RegisterEntry;
use crate::error::{PlcError, Result};
use crate::value::ValueKind;

/// An ordered, homogeneous collection of register entries with a computed
/// covering range.
#[derive(Debug, Clone, Default)]
pub struct RegisterSet {
    name: String,
    prefix: Option<char>,
    bit_addressed: bool,
    start_addr: Option<u32>,
    span: u32,
    entries: Vec<RegisterEntry>,
}

impl RegisterSet {
    /// Creates an empty set with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// The set's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The shared prefix, locked by the first insert. `None` while empty.
    pub fn prefix(&self) -> Option<char> {
        self.prefix
    }

    /// Whether this set holds bit-addressed entries.
    pub fn is_bit_addressed(&self) -> bool {
        self.bit_addressed
    }

    /// Lowest member offset, or `None` while the set is empty.
    pub fn start_addr(&self) -> Option<u32> {
        self.start_addr
    }

    /// Register units spanned by the covering range.
    ///
    /// For bit-addressed sets this is a word-granularity length: enough
    /// whole registers to cover every member bit.
    pub fn span(&self) -> u32 {
        self.span
    }

    /// Canonical text of the range start, e.g. `D100`. `None` while empty.
    pub fn full_start_address(&self) -> Option<String> {
        match (self.prefix, self.start_addr) {
            (Some(prefix), Some(start)) => Some(format!("{prefix}{start}")),
            _ => None,
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, RegisterEntry> {
        self.entries.iter()
    }

    /// First entry with the given name, if any.
    pub fn entry(&self, name: &str) -> Option<&RegisterEntry> {
        self.entries.iter().find(|e| e.name() == name)
    }

    /// Entry with the given name and disambiguating index, if any.
    pub fn entry_at(&self, name: &str, index: u32) -> Option<&RegisterEntry> {
        self.entries
            .iter()
            .find(|e| e.name() == name && e.index() == Some(index))
    }

    /// Adds one word-addressed entry.
    ///
    /// The address text must not carry a bit suffix, and `kind` must not be
    /// `FixedString` (use [`add_fixed_string`](Self::add_fixed_string)).
    ///
    /// # Errors
    ///
    /// `MalformedAddress` if the text does not parse; `IncompatibleEntry`
    /// if the kind or address does not fit this set. A failed add performs
    /// no mutation.
    ///
    /// # Example
    ///
    /// ```
    /// use plc_batch::{RegisterSet, ValueKind};
    ///
    /// let mut set = RegisterSet::new("s");
    /// set.add("pressure", "D200", ValueKind::Float32, None).unwrap();
    /// assert!(set.add("pressure", "D200", ValueKind::Float32, None).is_err());
    /// ```
    pub fn add(
        &mut self,
        name: impl Into<String>,
        addr: &str,
        kind: ValueKind,
        index: Option<u32>,
    ) -> Result<()> {
        let width = kind.width().ok_or_else(|| {
            PlcError::incompatible_entry("FixedString entries require add_fixed_string")
        })?;
        let address = Address::parse(addr)?;
        if address.is_bit_addressed() {
            return Err(PlcError::incompatible_entry(format!(
                "bit-addressed reference {address} passed to add; use add_bit"
            )));
        }
        self.insert(RegisterEntry::new(name, index, address, kind, width))
    }

    /// Adds `count` consecutive word-addressed entries under one name.
    ///
    /// Each generated address advances by the previous entry's width, so
    /// multi-word kinds pack contiguously: three `Float32` entries starting
    /// at `D0` land at `D0`, `D2`, `D4`. Entries are indexed `0..count`.
    ///
    /// # Errors
    ///
    /// Fails on the first entry that cannot be inserted; earlier entries of
    /// the batch remain in the set.
    pub fn add_many(
        &mut self,
        name: impl Into<String>,
        addr: &str,
        kind: ValueKind,
        count: u32,
    ) -> Result<()> {
        let width = kind.width().ok_or_else(|| {
            PlcError::incompatible_entry("FixedString entries require add_fixed_strings")
        })?;
        let base = Address::parse(addr)?;
        if base.is_bit_addressed() {
            return Err(PlcError::incompatible_entry(format!(
                "bit-addressed reference {base} passed to add_many; use add_bits"
            )));
        }
        let name = name.into();
        for i in 0..count {
            let address = Address::word(base.prefix, batch_offset(base, i, width)?);
            self.insert(RegisterEntry::new(
                name.clone(),
                Some(i),
                address,
                kind,
                width,
            ))?;
        }
        Ok(())
    }

    /// Adds one bit-addressed entry.
    ///
    /// The address text must carry a `.bit` suffix, e.g. `M10.3`.
    ///
    /// # Errors
    ///
    /// `MalformedAddress` if the text does not parse or lacks the bit
    /// suffix; `IncompatibleEntry` if the set holds word entries, the
    /// prefix differs, or the `(offset, bit)` pair is already present.
    ///
    /// # Example
    ///
    /// ```
    /// use plc_batch::RegisterSet;
    ///
    /// let mut set = RegisterSet::new("flags");
    /// set.add_bit("running", "M10.3", None).unwrap();
    /// assert!(set.is_bit_addressed());
    /// ```
    pub fn add_bit(&mut self, name: impl Into<String>, addr: &str, index: Option<u32>) -> Result<()> {
        let address = Self::parse_bit(addr)?;
        self.insert(RegisterEntry::new(name, index, address, ValueKind::Bool, 1))
    }

    /// Adds `count` consecutive bit entries under one name.
    ///
    /// Only the word offset advances; the bit sub-index stays fixed. Ten
    /// entries from `M10.3` land at `M10.3`, `M11.3`, ... `M19.3`, indexed
    /// `0..count`.
    pub fn add_bits(&mut self, name: impl Into<String>, addr: &str, count: u32) -> Result<()> {
        let base = Self::parse_bit(addr)?;
        let bit = base.bit.unwrap_or(0);
        let name = name.into();
        for i in 0..count {
            let address = Address::bit(base.prefix, batch_offset(base, i, 1)?, bit)?;
            self.insert(RegisterEntry::new(
                name.clone(),
                Some(i),
                address,
                ValueKind::Bool,
                1,
            ))?;
        }
        Ok(())
    }

    /// Adds one fixed-length string entry occupying `width` register units.
    ///
    /// # Errors
    ///
    /// `IncompatibleEntry` if `width` is zero or the entry does not fit
    /// this set; `MalformedAddress` if the text does not parse.
    ///
    /// # Example
    ///
    /// ```
    /// use plc_batch::RegisterSet;
    ///
    /// let mut set = RegisterSet::new("labels");
    /// // 6 registers = 12 ASCII characters
    /// set.add_fixed_string("product_code", "D300", 6, None).unwrap();
    /// assert_eq!(set.span(), 6);
    /// ```
    pub fn add_fixed_string(
        &mut self,
        name: impl Into<String>,
        addr: &str,
        width: u32,
        index: Option<u32>,
    ) -> Result<()> {
        let address = Self::parse_string_addr(addr, width)?;
        self.insert(RegisterEntry::new(
            name,
            index,
            address,
            ValueKind::FixedString,
            width,
        ))
    }

    /// Adds `count` consecutive fixed-length string entries under one name,
    /// each advancing by `width` register units and indexed `0..count`.
    pub fn add_fixed_strings(
        &mut self,
        name: impl Into<String>,
        addr: &str,
        width: u32,
        count: u32,
    ) -> Result<()> {
        let base = Self::parse_string_addr(addr, width)?;
        let name = name.into();
        for i in 0..count {
            let address = Address::word(base.prefix, batch_offset(base, i, width)?);
            self.insert(RegisterEntry::new(
                name.clone(),
                Some(i),
                address,
                ValueKind::FixedString,
                width,
            ))?;
        }
        Ok(())
    }

    /// Removes every entry with the given name. Returns how many were
    /// removed.
    pub fn remove_by_name(&mut self, name: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.name() != name);
        let removed = before - self.entries.len();
        if removed > 0 {
            self.recompute_range();
        }
        removed
    }

    /// Removes the entry at `index`, if it exists.
    pub fn remove_at(&mut self, index: usize) -> Option<RegisterEntry> {
        if index >= self.entries.len() {
            return None;
        }
        let entry = self.entries.remove(index);
        self.recompute_range();
        Some(entry)
    }

    /// Removes all entries and resets the range.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.recompute_range();
    }

    /// Resets every entry's current and previous value to the kind's zero
    /// without removing entries.
    pub fn clear_values(&mut self) {
        for entry in &mut self.entries {
            entry.clear_value();
        }
        // Membership is unchanged, so the range comes out identical.
        self.recompute_range();
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [RegisterEntry] {
        &mut self.entries
    }

    fn parse_bit(addr: &str) -> Result<Address> {
        let address = Address::parse(addr)?;
        if !address.is_bit_addressed() {
            return Err(PlcError::malformed_address(
                addr,
                "bit entry requires a '.bit' suffix",
            ));
        }
        Ok(address)
    }

    fn parse_string_addr(addr: &str, width: u32) -> Result<Address> {
        if width == 0 {
            return Err(PlcError::incompatible_entry(
                "fixed string width must be at least 1 register",
            ));
        }
        let address = Address::parse(addr)?;
        if address.is_bit_addressed() {
            return Err(PlcError::incompatible_entry(format!(
                "bit-addressed reference {address} cannot hold a string"
            )));
        }
        Ok(address)
    }

    fn insert(&mut self, entry: RegisterEntry) -> Result<()> {
        let address = entry.address();
        if address.offset.checked_add(entry.width()).is_none() {
            return Err(PlcError::incompatible_entry(format!(
                "entry at {address} runs past the end of the address space"
            )));
        }
        if self.entries.is_empty() {
            self.prefix = Some(address.prefix);
            self.bit_addressed = address.is_bit_addressed();
        } else {
            if self.prefix != Some(address.prefix) {
                return Err(PlcError::incompatible_entry(format!(
                    "prefix '{}' does not match the set's prefix '{}'",
                    address.prefix,
                    self.prefix.unwrap_or('?')
                )));
            }
            if self.bit_addressed != address.is_bit_addressed() {
                return Err(PlcError::incompatible_entry(if self.bit_addressed {
                    format!("word entry {address} in a bit-addressed set")
                } else {
                    format!("bit entry {address} in a word-addressed set")
                }));
            }
        }

        let duplicate = self.entries.iter().any(|e| {
            let existing = e.address();
            existing.offset == address.offset
                && (!self.bit_addressed || existing.bit == address.bit)
        });
        if duplicate {
            return Err(PlcError::incompatible_entry(format!(
                "duplicate address {address}"
            )));
        }

        self.entries.push(entry);
        self.recompute_range();
        Ok(())
    }

    /// Recomputes `start_addr` and `span` from the current members.
    ///
    /// `span = (max_offset + width_of_that_entry) - min_offset`. When
    /// several entries share the maximum offset, the width of the last one
    /// in iteration order wins; possible only in bit sets, where every
    /// width is 1.
    fn recompute_range(&mut self) {
        if self.entries.is_empty() {
            self.start_addr = None;
            self.span = 0;
            return;
        }

        let mut start = u32::MAX;
        let mut end = 0u32;
        let mut end_width = 1u32;
        for entry in &self.entries {
            let offset = entry.address().offset;
            if offset < start {
                start = offset;
            }
            if offset >= end {
                end = offset;
                end_width = entry.width();
            }
        }

        self.start_addr = Some(start);
        // Insert guarantees offset + width fits in u32 for every member.
        self.span = (end + end_width) - start;
    }
}

/// Offset of batch member `step`, guarding against wrap-around near the
/// end of the address space.
fn batch_offset(base: Address, step: u32, width: u32) -> Result<u32> {
    step.checked_mul(width)
        .and_then(|delta| base.offset.checked_add(delta))
        .ok_or_else(|| {
            PlcError::incompatible_entry(format!(
                "batch entry {step} from {base} overflows the address space"
            ))
        })
}

impl std::ops::Index<usize> for RegisterSet {
    type Output = RegisterEntry;

    fn index(&self, index: usize) -> &RegisterEntry {
        &self.entries[index]
    }
}

impl<'a> IntoIterator for &'a RegisterSet {
    type Item = &'a RegisterEntry;
    type IntoIter = std::slice::Iter<'a, RegisterEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
