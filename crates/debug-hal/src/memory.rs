//! Fault-tolerant target memory access
//!
//! # Why a latch instead of a return value
//!
//! A read of an unmapped address from inside the DebugMonitor handler raises
//! a BusFault (or escalates to HardFault). The fault handler cannot unwind
//! the monitor; it can only record that the fault happened, step the stacked
//! PC past the faulting load and return. The monitor then asks the latch
//! whether the read it just issued is trustworthy.
//!
//! The latch is consumed on read: asking clears it, so one stale fault can
//! never poison the next access.
//!
//! ```text
//! monitor: read_halfword(addr) ──► BusFault handler: latch.raise()
//!          was_fault_encountered() ◄── swap(false)
//! ```

use core::sync::atomic::{AtomicBool, Ordering};

/// Returned when a target memory access faulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MemoryFault;

#[cfg(feature = "std")]
impl std::error::Error for MemoryFault {}

impl core::fmt::Display for MemoryFault {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Memory fault during debugger access")
    }
}

/// Consumed-on-read "fault during debug" flag.
///
/// Written from the fault handler that pre-empts the monitor and read from
/// the monitor itself, so it is the one datum shared across exception
/// contexts. Place it in a `static`.
#[derive(Debug)]
pub struct FaultLatch {
    raised: AtomicBool,
}

impl FaultLatch {
    /// Create a cleared latch.
    pub const fn new() -> Self {
        Self {
            raised: AtomicBool::new(false),
        }
    }

    /// Record that a debugger-issued access faulted.
    pub fn raise(&self) {
        self.raised.store(true, Ordering::Release);
    }

    /// Report whether a fault was recorded, clearing the latch.
    pub fn take(&self) -> bool {
        self.raised.swap(false, Ordering::AcqRel)
    }
}

impl Default for FaultLatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Target memory reads that may fault without crashing the monitor.
pub trait MemoryProbe {
    /// Read the halfword at `address`.
    ///
    /// The value is meaningless if [`MemoryProbe::was_fault_encountered`]
    /// reports `true` afterwards.
    fn read_halfword(&mut self, address: u32) -> u16;

    /// Report (and clear) whether an access faulted since the last query.
    fn was_fault_encountered(&mut self) -> bool;

    /// Discard any pending fault indication.
    fn clear_fault(&mut self) {
        let _ = self.was_fault_encountered();
    }
}
