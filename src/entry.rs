//! A single named, typed register slot.
//!
//! A [`RegisterEntry`] binds a caller-chosen name to one [`Address`] and
//! keeps a two-slot value history (current and previous) plus the
//! monotonic instant of the last decode. The two-slot history gives O(1)
//! change detection without external diffing; the timestamp drives the
//! staleness flag.
//!
//! Entries are created by [`RegisterSet`](crate::RegisterSet) insertion and
//! their values are only written by a decode pass (or an explicit clear).
//!
//! # Example
//!
//! ```
//! use plc_batch::{RegisterSet, Value, ValueKind};
//!
//! let mut set = RegisterSet::new("demo");
//! set.add("temperature", "D100", ValueKind::Int16, None).unwrap();
//!
//! let entry = &set[0];
//! assert_eq!(entry.full_address(), "D100");
//! assert_eq!(*entry.current(), Value::Int16(0));
//! assert!(!entry.changed());
//! assert!(entry.is_stale()); // never decoded
//! ```

use std::time::{Duration, Instant};

use crate::address::Address;
use crate::value::{Value, ValueKind};

/// An entry is stale when no decode pass has touched it for this long.
pub const STALE_AFTER: Duration = Duration::from_secs(5);

/// One named, typed slot bound to a register address.
#[derive(Debug, Clone)]
pub struct RegisterEntry {
    name: String,
    index: Option<u32>,
    address: Address,
    kind: ValueKind,
    width: u32,
    current: Value,
    previous: Value,
    last_update: Option<Instant>,
}

impl RegisterEntry {
    pub(crate) fn new(
        name: impl Into<String>,
        index: Option<u32>,
        address: Address,
        kind: ValueKind,
        width: u32,
    ) -> Self {
        Self {
            name: name.into(),
            index,
            address,
            kind,
            width,
            current: Value::zero(kind),
            previous: Value::zero(kind),
            last_update: None,
        }
    }

    /// The logical name of the entry.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Disambiguating index for repeated additions of the same name,
    /// e.g. element 3 of an array of temperatures.
    pub fn index(&self) -> Option<u32> {
        self.index
    }

    /// The register address this entry is bound to.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The declared value kind.
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Register units this entry consumes.
    ///
    /// Derived from the kind, except for `FixedString` entries where it is
    /// caller-supplied.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// The most recently decoded value.
    pub fn current(&self) -> &Value {
        &self.current
    }

    /// The value decoded by the pass before the current one.
    pub fn previous(&self) -> &Value {
        &self.previous
    }

    /// The instant of the last decode, or `None` if never decoded.
    pub fn last_update(&self) -> Option<Instant> {
        self.last_update
    }

    /// Whether the last decode changed the value.
    pub fn changed(&self) -> bool {
        self.current != self.previous
    }

    /// Whether no decode has touched this entry within [`STALE_AFTER`].
    ///
    /// An entry that has never been decoded is stale.
    pub fn is_stale(&self) -> bool {
        self.is_stale_after(STALE_AFTER)
    }

    /// Staleness check against a caller-chosen threshold.
    pub fn is_stale_after(&self, threshold: Duration) -> bool {
        match self.last_update {
            Some(at) => at.elapsed() > threshold,
            None => true,
        }
    }

    /// Canonical text form of the address, e.g. `D100` or `M10.3`.
    pub fn full_address(&self) -> String {
        self.address.to_string()
    }

    /// Shifts the current value into the previous slot, stores the new
    /// value, and stamps the update time. Runs on every decode, even when
    /// the value is unchanged.
    pub(crate) fn set_value(&mut self, value: Value) {
        self.previous = std::mem::replace(&mut self.current, value);
        self.last_update = Some(Instant::now());
    }

    /// Resets both value slots to the kind's zero without touching the
    /// update time.
    pub(crate) fn clear_value(&mut self) {
        self.current = Value::zero(self.kind);
        self.previous = Value::zero(self.kind);
    }
}

impl std::fmt::Display for RegisterEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.address, self.current)
    }
}
