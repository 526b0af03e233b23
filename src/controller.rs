//! Cycle orchestration: one batch read or write against the transport.
//!
//! The [`PlcController`] owns a [`Transport`] backend and drives complete
//! cycles: compute the covering range of a [`RegisterSet`], fetch it in a
//! single round trip, scatter-decode the payload into the entries, and
//! track connection state. The state machine has exactly two states,
//! `Connected` and `Unconnected`; anything in between belongs to the
//! transport.
//!
//! Status observers are invoked synchronously, inside the call that caused
//! the transition, and exactly once per actual transition. A transport
//! failure drops the controller to `Unconnected` and is returned to the
//! caller as-is; there is no automatic retry or reconnection — the next
//! successful cycle or an explicit [`open`](PlcController::open) brings
//! the state back up.
//!
//! # Example
//!
//! ```no_run
//! use plc_batch::{PlcController, RegisterSet, Transport, ValueKind};
//!
//! fn run(transport: impl Transport) -> plc_batch::Result<()> {
//!     let mut plc = PlcController::new(transport);
//!     plc.on_status_change(|status| println!("plc is now {status}"));
//!     plc.open()?;
//!
//!     let mut set = RegisterSet::new("machine");
//!     set.add("speed", "D100", ValueKind::Int16, None)?;
//!     set.add("target", "D101", ValueKind::Int16, None)?;
//!
//!     plc.read_set(&mut set)?;
//!     for entry in &set {
//!         println!("{} = {} (changed: {})", entry.name(), entry.current(), entry.changed());
//!     }
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info, warn};

use crate::codec::decode_set;
use crate::error::{PlcError, Result};
use crate::set::RegisterSet;
use crate::transport::Transport;

/// Connection state of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlcStatus {
    /// A session with the device is established.
    Connected,
    /// No session; the last transport call failed or none was opened.
    Unconnected,
}

impl std::fmt::Display for PlcStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlcStatus::Connected => write!(f, "connected"),
            PlcStatus::Unconnected => write!(f, "unconnected"),
        }
    }
}

/// A thread-safe keyed registry of register sets.
///
/// Clones share the same underlying map, so a registry can be handed to
/// other threads while the controller keeps reading through it. Upserts
/// by key are atomic; distinct keys never contend.
///
/// # Example
///
/// ```
/// use plc_batch::{SetRegistry, RegisterSet, ValueKind};
///
/// let registry = SetRegistry::new();
/// let mut set = RegisterSet::new("machine");
/// set.add("speed", "D100", ValueKind::Int16, None).unwrap();
/// registry.insert("machine", set);
///
/// let span = registry.with("machine", |s| s.span()).unwrap();
/// assert_eq!(span, 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SetRegistry {
    inner: Arc<DashMap<String, RegisterSet>>,
}

impl SetRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the set stored under `key`, returning the
    /// previous set if one existed.
    pub fn insert(&self, key: impl Into<String>, set: RegisterSet) -> Option<RegisterSet> {
        self.inner.insert(key.into(), set)
    }

    /// Removes and returns the set stored under `key`.
    pub fn remove(&self, key: &str) -> Option<RegisterSet> {
        self.inner.remove(key).map(|(_, set)| set)
    }

    /// Whether a set is stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// Number of stored sets.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the registry holds no sets.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Runs `f` against the set stored under `key`, if present.
    pub fn with<R>(&self, key: &str, f: impl FnOnce(&RegisterSet) -> R) -> Option<R> {
        self.inner.get(key).map(|set| f(&set))
    }
}

type StatusObserver = Box<dyn Fn(PlcStatus) + Send + Sync>;

/// Orchestrates batch read/write cycles against one transport backend.
pub struct PlcController<T: Transport> {
    transport: T,
    connected: bool,
    max_read_units: Option<u32>,
    observers: Vec<StatusObserver>,
    registry: SetRegistry,
}

impl<T: Transport> PlcController<T> {
    /// Creates a controller over the given transport, initially
    /// `Unconnected`.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            connected: false,
            max_read_units: None,
            observers: Vec::new(),
            registry: SetRegistry::new(),
        }
    }

    /// Caps the span a single read cycle may request, overriding the
    /// transport's own limit. Useful when a device accepts less than its
    /// protocol's length field allows.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use plc_batch::{PlcController, Transport};
    /// # fn demo(transport: impl Transport) {
    /// let plc = PlcController::new(transport).with_max_read_units(960);
    /// # }
    /// ```
    pub fn with_max_read_units(mut self, limit: u32) -> Self {
        self.max_read_units = Some(limit);
        self
    }

    /// Current connection state.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Registers a callback fired on every `Connected`/`Unconnected`
    /// transition, synchronously within the call that caused it.
    pub fn on_status_change(&mut self, observer: impl Fn(PlcStatus) + Send + Sync + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// The shared keyed registry of named sets.
    pub fn registry(&self) -> &SetRegistry {
        &self.registry
    }

    /// Asks the transport to establish a session.
    ///
    /// Transitions to `Connected` only on success. Calling `open` while
    /// already connected fires no signal.
    ///
    /// # Errors
    ///
    /// Propagates the transport's failure; the controller stays (or
    /// becomes) `Unconnected`.
    pub fn open(&mut self) -> Result<()> {
        match self.transport.open() {
            Ok(()) => {
                self.set_connected(true);
                Ok(())
            }
            Err(err) => {
                self.set_connected(false);
                Err(err)
            }
        }
    }

    /// Tears the session down if one is up and transitions to
    /// `Unconnected`. A no-op when already unconnected.
    pub fn close(&mut self) {
        if self.connected {
            self.transport.close();
            self.set_connected(false);
        }
    }

    /// Runs one batch read cycle: fetches the set's covering range in a
    /// single round trip and decodes every entry in place.
    ///
    /// # Errors
    ///
    /// - `IncompatibleEntry` if the set is empty (no covering range) —
    ///   the transport is not contacted.
    /// - `RangeTooLarge` if the span exceeds the read limit (the
    ///   transport's, or a [`with_max_read_units`](Self::with_max_read_units)
    ///   override) — the transport is not contacted.
    /// - `Transport` if the fetch fails; connection state drops to
    ///   `Unconnected`.
    /// - `OutOfRange` if the payload is shorter than the span implies;
    ///   entries decoded before the overrun keep their new values.
    pub fn read_set(&mut self, set: &mut RegisterSet) -> Result<()> {
        let span = set.span();
        if span == 0 {
            return Err(PlcError::incompatible_entry(format!(
                "register set '{}' spans no registers",
                set.name()
            )));
        }
        let max = self
            .max_read_units
            .unwrap_or_else(|| self.transport.max_read_units());
        if span > max {
            return Err(PlcError::RangeTooLarge { span, max });
        }

        // span > 0 implies the set is non-empty, so the start exists.
        let start = set
            .full_start_address()
            .ok_or_else(|| PlcError::incompatible_entry("register set has no start address"))?;

        debug!(set = set.name(), %start, span, "batch read cycle");
        let buffer = match self.transport.read_words(&start, span) {
            Ok(buffer) => {
                self.set_connected(true);
                buffer
            }
            Err(err) => {
                warn!(set = set.name(), %err, "batch read failed");
                self.set_connected(false);
                return Err(err);
            }
        };

        decode_set(&buffer, set)
    }

    /// Runs a read cycle against the set stored in the registry under
    /// `key`, updating it in place.
    ///
    /// The set never leaves the registry: its entry stays visible to other
    /// holders of the registry and is locked for the duration of the cycle,
    /// so a concurrent upsert of the same key waits rather than being
    /// clobbered. Status observers run inside the cycle and must not touch
    /// the registry.
    ///
    /// # Errors
    ///
    /// `IncompatibleEntry` if no set is stored under `key`; otherwise as
    /// [`read_set`](Self::read_set).
    pub fn read_keyed(&mut self, key: &str) -> Result<()> {
        let registry = self.registry.clone();
        let mut set = registry.inner.get_mut(key).ok_or_else(|| {
            PlcError::incompatible_entry(format!("no register set under key '{key}'"))
        })?;
        self.read_set(&mut set)
    }

    /// Reads `count` raw 16-bit registers without a register set.
    pub fn read_i16s(&mut self, start_addr: &str, count: u32) -> Result<Vec<i16>> {
        if count == 0 {
            return Err(PlcError::incompatible_entry("read of zero registers"));
        }
        let buffer = self.track(|t| t.read_words(start_addr, count))?;
        let mut values = Vec::with_capacity(count as usize);
        for chunk in buffer.chunks_exact(2) {
            values.push(i16::from_le_bytes([chunk[0], chunk[1]]));
        }
        Ok(values)
    }

    /// Reads `count` raw bit devices without a register set.
    pub fn read_bools(&mut self, start_addr: &str, count: u32) -> Result<Vec<bool>> {
        if count == 0 {
            return Err(PlcError::incompatible_entry("read of zero bits"));
        }
        self.track(|t| t.read_bits(start_addr, count))
    }

    /// Writes one 16-bit register.
    pub fn write_i16(&mut self, addr: &str, value: i16) -> Result<()> {
        self.write_i16s(addr, &[value])
    }

    /// Writes consecutive 16-bit registers starting at `addr`.
    pub fn write_i16s(&mut self, addr: &str, values: &[i16]) -> Result<()> {
        self.track(|t| t.write_words(addr, values))
    }

    /// Writes one bit device.
    pub fn write_bool(&mut self, addr: &str, value: bool) -> Result<()> {
        self.write_bools(addr, &[value])
    }

    /// Writes consecutive bit devices starting at `addr`.
    pub fn write_bools(&mut self, addr: &str, values: &[bool]) -> Result<()> {
        self.track(|t| t.write_bits(addr, values))
    }

    /// Runs a transport call and folds its outcome into connection state.
    fn track<R>(&mut self, call: impl FnOnce(&mut T) -> Result<R>) -> Result<R> {
        match call(&mut self.transport) {
            Ok(value) => {
                self.set_connected(true);
                Ok(value)
            }
            Err(err) => {
                warn!(%err, "transport call failed");
                self.set_connected(false);
                Err(err)
            }
        }
    }

    fn set_connected(&mut self, connected: bool) {
        if connected == self.connected {
            return;
        }
        self.connected = connected;
        let status = if connected {
            PlcStatus::Connected
        } else {
            PlcStatus::Unconnected
        };
        info!(%status, "plc status changed");
        for observer in &self.observers {
            observer(status);
        }
    }
}

impl<T: Transport> std::fmt::Debug for PlcController<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlcController")
            .field("connected", &self.connected)
            .field("observers", &self.observers.len())
            .field("registry", &self.registry.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Value, ValueKind};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory transport over a flat little-endian register image.
    struct MockTransport {
        image: Vec<u8>,
        fail_reads: bool,
        fail_open: bool,
        read_calls: usize,
        written_words: Vec<(String, Vec<i16>)>,
        written_bits: Vec<(String, Vec<bool>)>,
    }

    impl MockTransport {
        fn with_image(image: Vec<u8>) -> Self {
            Self {
                image,
                fail_reads: false,
                fail_open: false,
                read_calls: 0,
                written_words: Vec::new(),
                written_bits: Vec::new(),
            }
        }

        fn offset_of(start_addr: &str) -> usize {
            let addr = crate::Address::parse(start_addr).unwrap();
            addr.offset as usize * 2
        }
    }

    impl Transport for MockTransport {
        fn open(&mut self) -> Result<()> {
            if self.fail_open {
                Err(PlcError::transport("open refused"))
            } else {
                Ok(())
            }
        }

        fn close(&mut self) {}

        fn read_words(&mut self, start_addr: &str, length: u32) -> Result<Vec<u8>> {
            self.read_calls += 1;
            if self.fail_reads {
                return Err(PlcError::transport("read failed"));
            }
            let from = Self::offset_of(start_addr);
            let to = from + length as usize * 2;
            if to > self.image.len() {
                return Err(PlcError::transport("address out of device memory"));
            }
            Ok(self.image[from..to].to_vec())
        }

        fn read_bits(&mut self, start_addr: &str, length: u32) -> Result<Vec<bool>> {
            let bytes = self.read_words(start_addr, length.div_ceil(16))?;
            Ok((0..length as usize)
                .map(|i| (bytes[i / 8] >> (i % 8)) & 1 != 0)
                .collect())
        }

        fn write_words(&mut self, start_addr: &str, values: &[i16]) -> Result<()> {
            if self.fail_reads {
                return Err(PlcError::transport("write failed"));
            }
            self.written_words
                .push((start_addr.to_string(), values.to_vec()));
            Ok(())
        }

        fn write_bits(&mut self, start_addr: &str, values: &[bool]) -> Result<()> {
            self.written_bits
                .push((start_addr.to_string(), values.to_vec()));
            Ok(())
        }
    }

    fn image_with_word(offset: usize, value: i16) -> Vec<u8> {
        let mut image = vec![0u8; 1024];
        image[offset * 2..offset * 2 + 2].copy_from_slice(&value.to_le_bytes());
        image
    }

    #[test]
    fn test_open_transitions_once() {
        let mut plc = PlcController::new(MockTransport::with_image(vec![]));
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        plc.on_status_change(move |status| {
            assert_eq!(status, PlcStatus::Connected);
            counter.fetch_add(1, Ordering::SeqCst);
        });

        plc.open().unwrap();
        plc.open().unwrap();
        assert!(plc.is_connected());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_open_failure_stays_unconnected() {
        let mut transport = MockTransport::with_image(vec![]);
        transport.fail_open = true;
        let mut plc = PlcController::new(transport);
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        plc.on_status_change(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(plc.open().is_err());
        assert!(!plc.is_connected());
        // Already unconnected, so no transition fired.
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_close_only_when_connected() {
        let mut plc = PlcController::new(MockTransport::with_image(vec![]));
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        plc.on_status_change(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        plc.close();
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        plc.open().unwrap();
        plc.close();
        assert!(!plc.is_connected());
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_read_set_decodes_entries() {
        let mut image = image_with_word(100, 1);
        image[101 * 2..101 * 2 + 2].copy_from_slice(&2i16.to_le_bytes());
        let mut plc = PlcController::new(MockTransport::with_image(image));

        let mut set = RegisterSet::new("s");
        set.add("a", "D100", ValueKind::Int16, None).unwrap();
        set.add("b", "D101", ValueKind::Int16, None).unwrap();

        plc.read_set(&mut set).unwrap();
        assert!(plc.is_connected());
        assert_eq!(*set[0].current(), Value::Int16(1));
        assert_eq!(*set[1].current(), Value::Int16(2));
    }

    #[test]
    fn test_read_bit_set_via_word_path() {
        let mut image = vec![0u8; 64];
        image[10 * 2] = 0b0000_1000; // M10.3
        let mut plc = PlcController::new(MockTransport::with_image(image));

        let mut set = RegisterSet::new("flags");
        set.add_bits("flag", "M10.3", 10).unwrap();

        plc.read_set(&mut set).unwrap();
        assert_eq!(*set[0].current(), Value::Bool(true));
        assert_eq!(*set[1].current(), Value::Bool(false));
    }

    #[test]
    fn test_read_set_empty_rejected_without_transport() {
        let mut plc = PlcController::new(MockTransport::with_image(vec![]));
        let mut set = RegisterSet::new("empty");
        assert!(plc.read_set(&mut set).is_err());
        assert_eq!(plc.transport.read_calls, 0);
    }

    #[test]
    fn test_read_set_span_too_large_rejected_without_transport() {
        // A 70000-unit span exceeds the 16-bit length bound.
        let mut plc = PlcController::new(MockTransport::with_image(vec![]));
        let mut set = RegisterSet::new("wide");
        set.add("lo", "D0", ValueKind::Int16, None).unwrap();
        set.add("hi", "D69999", ValueKind::Int16, None).unwrap();
        assert_eq!(set.span(), 70000);

        let err = plc.read_set(&mut set).unwrap_err();
        assert!(matches!(
            err,
            PlcError::RangeTooLarge { span: 70000, max: 65535 }
        ));
        assert_eq!(plc.transport.read_calls, 0);
    }

    #[test]
    fn test_max_read_units_override() {
        let mut plc =
            PlcController::new(MockTransport::with_image(vec![0u8; 64])).with_max_read_units(4);
        let mut set = RegisterSet::new("s");
        set.add_many("a", "D0", ValueKind::Int16, 5).unwrap();

        let err = plc.read_set(&mut set).unwrap_err();
        assert!(matches!(err, PlcError::RangeTooLarge { span: 5, max: 4 }));
        assert_eq!(plc.transport.read_calls, 0);

        set.remove_by_name("a");
        set.add_many("a", "D0", ValueKind::Int16, 4).unwrap();
        plc.read_set(&mut set).unwrap();
    }

    #[test]
    fn test_transport_failure_drops_connection_once() {
        let mut transport = MockTransport::with_image(vec![0u8; 16]);
        transport.fail_reads = true;
        let mut plc = PlcController::new(transport);
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();

        plc.open().unwrap();
        plc.on_status_change(move |status| {
            assert_eq!(status, PlcStatus::Unconnected);
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let mut set = RegisterSet::new("s");
        set.add("a", "D0", ValueKind::Int16, None).unwrap();

        assert!(plc.read_set(&mut set).is_err());
        assert!(!plc.is_connected());
        assert!(plc.read_set(&mut set).is_err());
        // Second failure is not a transition.
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_successful_read_restores_connection() {
        let mut transport = MockTransport::with_image(vec![0u8; 16]);
        transport.fail_reads = true;
        let mut plc = PlcController::new(transport);

        let mut set = RegisterSet::new("s");
        set.add("a", "D0", ValueKind::Int16, None).unwrap();

        assert!(plc.read_set(&mut set).is_err());
        plc.transport.fail_reads = false;
        plc.read_set(&mut set).unwrap();
        assert!(plc.is_connected());
    }

    #[test]
    fn test_raw_reads() {
        let mut image = image_with_word(5, -7);
        image[0] = 0b0000_0101;
        let mut plc = PlcController::new(MockTransport::with_image(image));

        assert_eq!(plc.read_i16s("D5", 1).unwrap(), vec![-7]);
        let bits = plc.read_bools("M0.0", 4).unwrap();
        assert_eq!(bits, vec![true, false, true, false]);
        assert!(plc.read_i16s("D0", 0).is_err());
        assert!(plc.read_bools("M0.0", 0).is_err());
    }

    #[test]
    fn test_writes_delegate_and_track_state() {
        let mut plc = PlcController::new(MockTransport::with_image(vec![]));
        plc.write_i16("D10", 42).unwrap();
        plc.write_bools("M0.0", &[true, false]).unwrap();
        assert!(plc.is_connected());
        assert_eq!(plc.transport.written_words, vec![("D10".into(), vec![42])]);
        assert_eq!(
            plc.transport.written_bits,
            vec![("M0.0".into(), vec![true, false])]
        );

        plc.transport.fail_reads = true;
        assert!(plc.write_i16s("D20", &[1, 2]).is_err());
        assert!(!plc.is_connected());
    }

    #[test]
    fn test_registry_upsert_and_keyed_read() {
        let mut plc = PlcController::new(MockTransport::with_image(image_with_word(100, 9)));

        let mut set = RegisterSet::new("machine");
        set.add("speed", "D100", ValueKind::Int16, None).unwrap();
        assert!(plc.registry().insert("machine", set).is_none());
        assert!(plc.registry().contains("machine"));

        plc.read_keyed("machine").unwrap();
        let speed = plc
            .registry()
            .with("machine", |s| s.entry("speed").unwrap().current().clone())
            .unwrap();
        assert_eq!(speed, Value::Int16(9));

        assert!(plc.read_keyed("missing").is_err());
    }

    #[test]
    fn test_read_keyed_failure_keeps_stored_set() {
        let mut transport = MockTransport::with_image(vec![0u8; 16]);
        transport.fail_reads = true;
        let mut plc = PlcController::new(transport);

        let mut set = RegisterSet::new("machine");
        set.add("speed", "D0", ValueKind::Int16, None).unwrap();
        plc.registry().insert("machine", set);

        assert!(plc.read_keyed("machine").is_err());
        // The stored set never left the registry and was not decoded.
        assert!(plc.registry().contains("machine"));
        let touched = plc
            .registry()
            .with("machine", |s| s.entry("speed").unwrap().last_update())
            .unwrap();
        assert!(touched.is_none());
    }

    #[test]
    fn test_registry_shared_across_clones() {
        let registry = SetRegistry::new();
        let clone = registry.clone();
        clone.insert("a", RegisterSet::new("a"));
        assert!(registry.contains("a"));
        assert_eq!(registry.len(), 1);
        assert!(registry.remove("a").is_some());
        assert!(clone.is_empty());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(PlcStatus::Connected.to_string(), "connected");
        assert_eq!(PlcStatus::Unconnected.to_string(), "unconnected");
    }
}
