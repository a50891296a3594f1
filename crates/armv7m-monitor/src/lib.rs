//! ARMv7-M debug monitor backend
//!
//! Architecture layer of an on-target GDB stub for Cortex-M3/M4/M7 parts.
//! The debugger runs inside the DebugMonitor exception (halting-mode debug
//! is not used), so the target keeps servicing higher-priority interrupts
//! while it is stopped.
//!
//! # Architecture
//!
//! ```text
//! GDB remote protocol layer
//!         ↓
//! CortexMMonitor (monitor)
//!    ├── step        single-step state machine
//!    ├── comparators FPB breakpoints, DWT watchpoints
//!    ├── fault       stop signal + fault text
//!    ├── codec       register context ↔ hex
//!    └── session     per-program state
//!         ↓
//! debug-hal traits (DebugPeripherals, MemoryProbe, Console, HexBuffer)
//!         ↓
//! hardware (this crate, `hardware` feature) or debug_hal::mocks
//! ```
//!
//! # Features
//!
//! - `hardware` - Build for a Cortex-M target (volatile MMIO, cortex-m, defmt)
//! - `defmt` - defmt `Format` derives and log statements
//! - `std` - `std::error::Error` impls
//! - `fpu` - S0-S31/FPSCR in the register context and target description
//! - `task-aware` - leave system handler priorities and MSP/PSP to an RTOS
//!
//! # Example
//!
//! ```bash
//! cargo build --release --target thumbv7em-none-eabihf -p armv7m-monitor --features hardware,fpu
//! ```

#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)]
// Logging discipline
#![warn(clippy::print_stdout)] // prefer defmt over println! in lib code
#![warn(clippy::dbg_macro)]
// Intentional allows for this codebase:
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
// Register-width casts are audited at each site:
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::doc_markdown)]

pub mod codec;
pub mod comparators;
pub mod config;
pub mod context;
pub mod decode;
pub mod error;
pub mod fault;
pub mod monitor;
pub mod session;
pub mod step;
pub mod target_xml;

#[cfg(feature = "hardware")]
pub mod hardware;

pub use comparators::{DwtUnit, FpbUnit, WatchpointKind};
pub use config::MonitorConfig;
pub use context::RegisterContext;
pub use decode::{InstructionType, InstructionWidth};
pub use error::MonitorError;
pub use fault::{FaultStatus, StopSignal};
pub use monitor::{write_stop_reply, CortexMMonitor};
pub use session::DebugSession;
pub use step::{StepController, StepState};
pub use target_xml::TARGET_XML;

#[cfg(feature = "hardware")]
pub use hardware::{CortexMMemory, CortexMPeripherals};
