//! Monitor configuration and constants
//!
//! Central place for exception numbers, arena sizes and the per-chip
//! settings the backend cannot discover from the debug registers.

// ---------------------------------------------------------------------------
// Exception numbers (ARMv7-M ARM §B1.5.2)
// ---------------------------------------------------------------------------

/// Non-maskable interrupt.
pub const EXCEPTION_NMI: u32 = 2;
/// HardFault.
pub const EXCEPTION_HARD_FAULT: u32 = 3;
/// MemManage fault.
pub const EXCEPTION_MEM_MANAGE: u32 = 4;
/// BusFault.
pub const EXCEPTION_BUS_FAULT: u32 = 5;
/// UsageFault.
pub const EXCEPTION_USAGE_FAULT: u32 = 6;
/// SVCall.
pub const EXCEPTION_SVCALL: u32 = 11;
/// DebugMonitor.
pub const EXCEPTION_DEBUG_MONITOR: u32 = 12;

// ---------------------------------------------------------------------------
// Sizes
// ---------------------------------------------------------------------------

/// Largest number of FPB code comparators tracked. FP_CTRL.NUM_CODE is a
/// 7-bit field but no shipping Cortex-M part implements more than 8.
pub const MAX_FPB_COMPARATORS: usize = 8;

/// Largest number of DWT comparators tracked (NUMCOMP is 4 bits; parts
/// implement at most 4).
pub const MAX_DWT_COMPARATORS: usize = 4;

/// Packet buffer capacity in characters.
///
/// Must hold the full `g` reply: 8 hex characters per register.
pub const PACKET_BUFFER_SIZE: usize = 1024;

/// Fill word written over the debugger stack before first use.
pub const DEBUGGER_STACK_FILL: u32 = 0xDEAD_BEEF;

/// Priority-bit count used when [`MonitorConfig::default`] is taken
/// (STM32F4/F7/H7, LPC17xx and most Cortex-M4 parts implement 4).
pub const DEFAULT_PRIORITY_BITS: u8 = 4;

/// Logical priority given to SVCall, PendSV and SysTick so the
/// DebugMonitor (priority 0) pre-empts them.
pub const SYSTEM_HANDLER_PRIORITY: u8 = 1;

/// Logical DebugMonitor priority.
///
/// Highest (0) when the monitor owns the core; lowest when an RTOS
/// scheduler must keep running underneath it.
#[cfg(not(feature = "task-aware"))]
pub const DEBUG_MONITOR_PRIORITY: u8 = 0;

/// Logical DebugMonitor priority.
#[cfg(feature = "task-aware")]
pub const DEBUG_MONITOR_PRIORITY: u8 = 255;

/// Per-chip configuration the debug registers do not expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MonitorConfig {
    /// Number of implemented NVIC priority bits (`__NVIC_PRIO_BITS`).
    pub priority_bits: u8,
    /// First exception number of the debugger's communication channel
    /// interrupts (UART IRQs). Faults from this range report SIGINT.
    pub comm_exception_first: u32,
    /// Last exception number (inclusive) of the communication range.
    pub comm_exception_last: u32,
}

impl MonitorConfig {
    /// Build a config for a part with `priority_bits` implemented bits and
    /// the default communication range.
    pub const fn with_priority_bits(priority_bits: u8) -> Self {
        Self {
            priority_bits,
            comm_exception_first: 21,
            comm_exception_last: 24,
        }
    }

    /// Scale a logical priority to the byte written to SHPRn / BASEPRI.
    ///
    /// Only the top `priority_bits` bits of the byte are implemented, so the
    /// logical value is shifted into them and anything above is discarded.
    pub const fn scale_priority(&self, logical: u32) -> u8 {
        let shift = 8u32.saturating_sub(self.priority_bits as u32);
        (logical.wrapping_shl(shift) & 0xFF) as u8
    }

    /// Inverse of [`MonitorConfig::scale_priority`] for a register byte.
    pub const fn logical_priority(&self, register_byte: u8) -> u32 {
        let shift = 8u32.saturating_sub(self.priority_bits as u32);
        (register_byte as u32).wrapping_shr(shift)
    }

    /// `true` when `exception_number` is one of the communication IRQs.
    pub const fn is_comm_exception(&self, exception_number: u32) -> bool {
        exception_number >= self.comm_exception_first && exception_number <= self.comm_exception_last
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::with_priority_bits(DEFAULT_PRIORITY_BITS)
    }
}
