//! # PLC Batch-Register Engine
//!
//! A Rust library for batch-reading sparse sets of named, typed registers
//! from industrial controllers (PLCs) in a single transport round trip.
//!
//! The operator describes the registers they care about — scattered across
//! bit and word address spaces — and the engine coalesces them into one
//! minimal contiguous read range, then scatters the raw response buffer
//! back into heterogeneous typed values at the correct byte/bit offsets,
//! tracking change and staleness per entry.
//!
//! This is an **engine-only** library: the wire protocol, socket I/O, and
//! retry policy live behind the [`Transport`] trait supplied by the caller.
//! Each cycle is exactly one transport round trip; no caching, no
//! automatic reconnection.
//!
//! ## Features
//!
//! - **Coalesced reads** — many named registers, one `read(start, length)`
//! - **Typed scatter decode** — bits, 16/32/64-bit integers, floats,
//!   doubles, and fixed-length ASCII strings at their computed offsets
//! - **Change tracking** — two-slot value history per entry for O(1)
//!   change detection
//! - **Staleness** — per-entry timestamps against a configurable threshold
//! - **Backend agnostic** — Melsec-style, Omron-style, or mock transports
//!   behind one trait
//! - **No panics** — all errors returned as `Result<T, PlcError>`
//!
//! ## Quick Start
//!
//! ```no_run
//! use plc_batch::{PlcController, RegisterSet, Transport, ValueKind};
//!
//! fn monitor(transport: impl Transport) -> plc_batch::Result<()> {
//!     let mut plc = PlcController::new(transport);
//!     plc.on_status_change(|status| println!("plc: {status}"));
//!     plc.open()?;
//!
//!     // Describe the registers of interest.
//!     let mut set = RegisterSet::new("machine");
//!     set.add("speed", "D100", ValueKind::Int16, None)?;
//!     set.add("temperature", "D102", ValueKind::Float32, None)?;
//!     set.add_fixed_string("product_code", "D110", 6, None)?;
//!
//!     // One round trip fetches and decodes all of them.
//!     plc.read_set(&mut set)?;
//!     for entry in &set {
//!         println!(
//!             "{} = {} (changed: {}, stale: {})",
//!             entry.name(),
//!             entry.current(),
//!             entry.changed(),
//!             entry.is_stale(),
//!         );
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Addressing
//!
//! Registers are referenced by a prefix letter, a numeric offset, and an
//! optional bit sub-index:
//!
//! | Text | Meaning |
//! |------|---------|
//! | `D100` | word register 100 of area `D` |
//! | `M10.3` | bit 3 of word 10 in area `M` |
//!
//! A [`RegisterSet`] locks its prefix and bit/word mode to the first entry
//! inserted; incompatible entries are rejected without mutating the set.
//!
//! ## Value Kinds
//!
//! | Kind | Register units | Decoded as |
//! |------|---------------|------------|
//! | [`ValueKind::Bool`] | 1 | boolean |
//! | [`ValueKind::Int16`] | 1 | signed 16-bit little-endian |
//! | [`ValueKind::Int32`] | 2 | signed 32-bit little-endian |
//! | [`ValueKind::Int64`] | 4 | signed 64-bit little-endian |
//! | [`ValueKind::Float32`] | 2 | IEEE-754 single |
//! | [`ValueKind::Float64`] | 4 | IEEE-754 double |
//! | [`ValueKind::FixedString`] | caller-supplied | ASCII, padding trimmed |
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, PlcError>`]. Parse and insertion
//! errors never touch the transport; transport failures drop the
//! controller to `Unconnected` and fire the status signal once per
//! transition. A decode that runs past the buffer leaves already-decoded
//! entries updated — a batch is best-effort telemetry, not a transaction.
//!
//! ```no_run
//! use plc_batch::{PlcController, PlcError, RegisterSet, Transport, ValueKind};
//!
//! fn cycle(plc: &mut PlcController<impl Transport>, set: &mut RegisterSet) {
//!     match plc.read_set(set) {
//!         Ok(()) => {}
//!         Err(PlcError::RangeTooLarge { span, max }) => {
//!             eprintln!("set spans {span} units, transport allows {max}");
//!         }
//!         Err(PlcError::Transport { reason }) => {
//!             eprintln!("link lost: {reason}");
//!         }
//!         Err(e) => eprintln!("cycle failed: {e}"),
//!     }
//! }
//! ```

#![warn(clippy::all)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod address;
mod codec;
mod controller;
mod entry;
mod error;
mod set;
mod transport;
mod value;

// Public re-exports
pub use address::{Address, MAX_BIT_INDEX};
pub use codec::{decode_set, BYTES_PER_REGISTER};
pub use controller::{PlcController, PlcStatus, SetRegistry};
pub use entry::{RegisterEntry, STALE_AFTER};
pub use error::{PlcError, Result};
pub use set::RegisterSet;
pub use transport::{Transport, DEFAULT_MAX_READ_UNITS};
pub use value::{
    decode_ascii, decode_bool, decode_f32, decode_f64, decode_i16, decode_i32, decode_i64, Value,
    ValueKind,
};
