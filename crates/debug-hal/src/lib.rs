//! Hardware abstraction layer for the ARMv7-M debug monitor
//!
//! This crate provides the trait seams between the architecture backend
//! (`armv7m-monitor`) and the things it only ever talks to through an
//! interface, so the backend can be developed and tested on the host.
//!
//! # Architecture Layers
//!
//! ```text
//! GDB protocol layer (packet parser, dispatcher)
//!         ↓
//! Architecture backend (armv7m-monitor)
//!         ↓
//! Debug HAL (this crate - trait abstractions + register map)
//!         ↓
//! Hardware (SCB / DCB / FPB / DWT, core registers)
//! ```
//!
//! # Abstractions
//!
//! - [`DebugPeripherals`] - memory-mapped debug registers and BASEPRI
//! - [`MemoryProbe`] - fault-tolerant target memory reads
//! - [`Console`] - text output to the debugger console
//! - [`HexBuffer`] - hex-pair packet encoding and decoding
//!
//! # Features
//!
//! - `std`: Expose [`mocks`] to other crates' tests
//! - `defmt`: Enable defmt `Format` derives

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::print_stdout)] // prefer defmt over println! in lib code
// Pedantic lints suppressed for this hardware HAL crate:
#![allow(clippy::doc_markdown)] // hex addresses and register names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors (callers decide)
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod buffer;
pub mod console;
pub mod memory;
pub mod mocks;
pub mod peripherals;
pub mod registers;

pub use buffer::{BufferError, HexBuffer, PacketBuffer};
pub use console::Console;
pub use memory::{FaultLatch, MemoryFault, MemoryProbe};
pub use peripherals::DebugPeripherals;
