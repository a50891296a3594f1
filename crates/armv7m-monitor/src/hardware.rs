//! Cortex-M hardware backend (`hardware` feature)
//!
//! Real implementations of the `debug-hal` traits: volatile MMIO for the
//! System Control Space, `cortex-m` for BASEPRI and barriers, and the static
//! fault latch that the BusFault/HardFault handlers raise while the monitor
//! is probing memory.
//!
//! The fault handlers themselves live in the firmware that embeds the
//! monitor. When they see [`is_debugger_active`] they must call
//! [`record_fault_during_debug`], advance the stacked PC past the faulting
//! load and return instead of entering the debugger.

use core::sync::atomic::{AtomicBool, Ordering};

use debug_hal::{DebugPeripherals, FaultLatch, MemoryProbe};

static FAULT_DURING_DEBUG: FaultLatch = FaultLatch::new();
static DEBUGGER_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Called from a fault handler that interrupted a monitor memory access.
pub fn record_fault_during_debug() {
    FAULT_DURING_DEBUG.raise();
}

/// `true` between the monitor's entry and exit glue.
pub fn is_debugger_active() -> bool {
    DEBUGGER_ACTIVE.load(Ordering::Acquire)
}

/// Mark the monitor as running (entry glue) or not (exit glue).
pub fn set_debugger_active(active: bool) {
    DEBUGGER_ACTIVE.store(active, Ordering::Release);
}

/// System Control Space accessed through volatile pointers.
#[derive(Debug, Default)]
pub struct CortexMPeripherals {
    _private: (),
}

impl CortexMPeripherals {
    /// Claim the debug registers.
    ///
    /// # Safety
    ///
    /// Only one instance may exist, and nothing else may reconfigure the
    /// FPB, DWT, DEMCR or system handler priorities while it does.
    pub const unsafe fn steal() -> Self {
        Self { _private: () }
    }
}

impl DebugPeripherals for CortexMPeripherals {
    fn read_word(&mut self, address: u32) -> u32 {
        // SAFETY: addresses come from debug_hal::registers (SCS, always
        // mapped on ARMv7-M) or from VTOR, which points at the vector table.
        unsafe { core::ptr::read_volatile(address as *const u32) }
    }

    fn write_word(&mut self, address: u32, value: u32) {
        // SAFETY: see read_word; `steal` grants exclusive ownership.
        unsafe { core::ptr::write_volatile(address as *mut u32, value) }
    }

    fn basepri(&self) -> u8 {
        cortex_m::register::basepri::read()
    }

    fn set_basepri(&mut self, value: u8) {
        // SAFETY: the monitor runs above every priority it can mask, so
        // raising or restoring BASEPRI cannot break a critical section the
        // interrupted code relies on.
        unsafe { cortex_m::register::basepri::write(value) }
    }
}

/// Target memory read from inside the monitor, guarded by the fault latch.
#[derive(Debug, Default)]
pub struct CortexMMemory {
    _private: (),
}

impl CortexMMemory {
    /// Memory accessor.
    pub const fn new() -> Self {
        Self { _private: () }
    }
}

impl MemoryProbe for CortexMMemory {
    fn read_halfword(&mut self, address: u32) -> u16 {
        // SAFETY: a faulting read is caught by the fault handler, which
        // raises FAULT_DURING_DEBUG and skips the load.
        unsafe { core::ptr::read_volatile(address as *const u16) }
    }

    fn was_fault_encountered(&mut self) -> bool {
        // Imprecise bus faults land after the load retires.
        cortex_m::asm::dsb();
        FAULT_DURING_DEBUG.take()
    }
}
