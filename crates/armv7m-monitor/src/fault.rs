//! Fault classification and fault-cause text
//!
//! Every debugger entry is reported to GDB as a stop signal. The signal is
//! derived from the exception number that brought the core into the
//! monitor; for DebugMonitor entries the sticky DFSR bits say which debug
//! event fired.
//!
//! | Exception            | Signal   |
//! |----------------------|----------|
//! | NMI (2)              | SIGINT   |
//! | HardFault (3)        | SIGSEGV  |
//! | MemManage (4)        | SIGSEGV  |
//! | BusFault (5)         | SIGBUS   |
//! | UsageFault (6)       | SIGILL   |
//! | DebugMonitor (12)    | DFSR     |
//! | comm IRQs (21..=24)  | SIGINT   |
//! | anything else        | SIGSTOP  |
//!
//! DFSR priority: EXTERNAL → SIGSTOP, then DWTTRAP, BKPT, HALTED → SIGTRAP.
//! An empty DFSR is SIGSTOP.

use debug_hal::registers::{
    DFSR_BKPT, DFSR_DWTTRAP, DFSR_EXTERNAL, DFSR_HALTED, HFSR_DEBUGEVT, HFSR_FORCED, HFSR_VECTTBL,
    SCB_BFAR, SCB_CFSR, SCB_DFSR, SCB_HFSR, SCB_MMFAR,
};
use debug_hal::{Console, DebugPeripherals};

use crate::config::{
    MonitorConfig, EXCEPTION_BUS_FAULT, EXCEPTION_DEBUG_MONITOR, EXCEPTION_HARD_FAULT,
    EXCEPTION_MEM_MANAGE, EXCEPTION_NMI, EXCEPTION_USAGE_FAULT,
};

/// GDB stop signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum StopSignal {
    /// SIGINT
    Interrupt = 2,
    /// SIGILL
    IllegalInstruction = 4,
    /// SIGTRAP
    Trap = 5,
    /// SIGBUS
    BusError = 10,
    /// SIGSEGV
    SegmentationFault = 11,
    /// SIGSTOP
    Stopped = 17,
}

impl StopSignal {
    /// Signal number as sent in `S`/`T` replies.
    pub const fn number(self) -> u8 {
        self as u8
    }
}

/// Fault status registers captured on debugger entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FaultStatus {
    /// Debug Fault Status Register.
    pub dfsr: u32,
    /// HardFault Status Register.
    pub hfsr: u32,
    /// Configurable Fault Status Register.
    pub cfsr: u32,
    /// MemManage Fault Address Register.
    pub mmfar: u32,
    /// BusFault Address Register.
    pub bfar: u32,
}

impl FaultStatus {
    /// Read the fault registers and acknowledge the debug events.
    ///
    /// DFSR is sticky; writing back what was read clears exactly those
    /// events so the next entry is classified from fresh bits.
    pub fn capture<P: DebugPeripherals>(p: &mut P) -> Self {
        let status = Self {
            dfsr: p.read_word(SCB_DFSR),
            hfsr: p.read_word(SCB_HFSR),
            cfsr: p.read_word(SCB_CFSR),
            mmfar: p.read_word(SCB_MMFAR),
            bfar: p.read_word(SCB_BFAR),
        };
        p.write_word(SCB_DFSR, status.dfsr);
        status
    }
}

/// Map an exception number (and, for DebugMonitor, the DFSR) to a signal.
pub fn determine_cause(
    exception_number: u32,
    status: &FaultStatus,
    config: &MonitorConfig,
) -> StopSignal {
    match exception_number {
        EXCEPTION_NMI => StopSignal::Interrupt,
        EXCEPTION_HARD_FAULT | EXCEPTION_MEM_MANAGE => StopSignal::SegmentationFault,
        EXCEPTION_BUS_FAULT => StopSignal::BusError,
        EXCEPTION_USAGE_FAULT => StopSignal::IllegalInstruction,
        EXCEPTION_DEBUG_MONITOR => debug_event_signal(status.dfsr),
        n if config.is_comm_exception(n) => StopSignal::Interrupt,
        _ => StopSignal::Stopped,
    }
}

fn debug_event_signal(dfsr: u32) -> StopSignal {
    const PRIORITY: [(u32, StopSignal); 4] = [
        (DFSR_EXTERNAL, StopSignal::Stopped),
        (DFSR_DWTTRAP, StopSignal::Trap),
        (DFSR_BKPT, StopSignal::Trap),
        (DFSR_HALTED, StopSignal::Trap),
    ];
    PRIORITY
        .iter()
        .find(|(bit, _)| dfsr & bit != 0)
        .map_or(StopSignal::Stopped, |(_, signal)| *signal)
}

// ─── Fault text ──────────────────────────────────────────────────────────────

const STATUS_LABEL: &str = "\n  Status Register: ";
const ADDRESS_LABEL: &str = "\n    Fault Address: ";

// MMFSR / BFSR share bit positions for these.
const ADDRESS_VALID: u32 = 1 << 7;
const LAZY_FP: u32 = 1 << 5;
const STACKING: u32 = 1 << 4;
const UNSTACKING: u32 = 1 << 3;
const IMPRECISE: u32 = 1 << 2;
const DATA_ACCESS: u32 = 1 << 1;
const INSTRUCTION: u32 = 1 << 0;

const USAGE_BITS: [(u32, &str); 6] = [
    (1 << 9, "\n    Divide by Zero"),
    (1 << 8, "\n    Unaligned Access"),
    (1 << 3, "\n    Coprocessor Access"),
    (1 << 2, "\n    Invalid Exception Return State"),
    (1 << 1, "\n    Invalid State"),
    (1 << 0, "\n    Undefined Instruction"),
];

/// Write a human-readable description of a HardFault, MemManage, BusFault
/// or UsageFault to `console`, followed by a newline. Other exception
/// numbers write nothing.
pub fn render_fault_cause<C: Console>(
    console: &mut C,
    exception_number: u32,
    status: &FaultStatus,
    task_sp: u32,
) {
    match exception_number {
        EXCEPTION_HARD_FAULT => render_hard_fault(console, status, task_sp),
        EXCEPTION_MEM_MANAGE => render_mem_manage(console, status, task_sp),
        EXCEPTION_BUS_FAULT => render_bus_fault(console, status, task_sp),
        EXCEPTION_USAGE_FAULT => render_usage_fault(console, status),
        _ => return,
    }
    console.write_str("\n");
}

fn render_hard_fault<C: Console>(console: &mut C, status: &FaultStatus, task_sp: u32) {
    console.write_str("\n**Hard Fault**");
    console.write_str(STATUS_LABEL);
    console.write_hex(status.hfsr);

    if status.hfsr & HFSR_DEBUGEVT != 0 {
        console.write_str("\n    Debug Event");
    }
    if status.hfsr & HFSR_VECTTBL != 0 {
        console.write_str("\n    Vector Table Read");
    }
    if status.hfsr & HFSR_FORCED != 0 {
        console.write_str("\n    Forced");
        render_mem_manage(console, status, task_sp);
        render_bus_fault(console, status, task_sp);
        render_usage_fault(console, status);
    }
}

fn render_stacking_bits<C: Console>(console: &mut C, fsr: u32, task_sp: u32) {
    if fsr & LAZY_FP != 0 {
        console.write_str("\n    FP Lazy Preservation");
    }
    if fsr & STACKING != 0 {
        console.write_str("\n    Stacking Error w/ SP = ");
        console.write_hex(task_sp);
    }
    if fsr & UNSTACKING != 0 {
        console.write_str("\n    Unstacking Error w/ SP = ");
        console.write_hex(task_sp);
    }
}

fn render_mem_manage<C: Console>(console: &mut C, status: &FaultStatus, task_sp: u32) {
    let mmfsr = status.cfsr & 0xFF;
    if mmfsr == 0 {
        return;
    }
    console.write_str("\n**MPU Fault**");
    console.write_str(STATUS_LABEL);
    console.write_hex(mmfsr);

    if mmfsr & ADDRESS_VALID != 0 {
        console.write_str(ADDRESS_LABEL);
        console.write_hex(status.mmfar);
    }
    render_stacking_bits(console, mmfsr, task_sp);
    if mmfsr & DATA_ACCESS != 0 {
        console.write_str("\n    Data Access");
    }
    if mmfsr & INSTRUCTION != 0 {
        console.write_str("\n    Instruction Fetch");
    }
}

fn render_bus_fault<C: Console>(console: &mut C, status: &FaultStatus, task_sp: u32) {
    let bfsr = status.cfsr.wrapping_shr(8) & 0xFF;
    if bfsr == 0 {
        return;
    }
    console.write_str("\n**Bus Fault**");
    console.write_str(STATUS_LABEL);
    console.write_hex(bfsr);

    if bfsr & ADDRESS_VALID != 0 {
        console.write_str(ADDRESS_LABEL);
        console.write_hex(status.bfar);
    }
    render_stacking_bits(console, bfsr, task_sp);
    if bfsr & IMPRECISE != 0 {
        console.write_str("\n    Imprecise Data Access");
    }
    if bfsr & DATA_ACCESS != 0 {
        console.write_str("\n    Precise Data Access");
    }
    if bfsr & INSTRUCTION != 0 {
        console.write_str("\n    Instruction Prefetch");
    }
}

fn render_usage_fault<C: Console>(console: &mut C, status: &FaultStatus) {
    let ufsr = status.cfsr.wrapping_shr(16);
    if ufsr == 0 {
        return;
    }
    console.write_str("\n**Usage Fault**");
    console.write_str(STATUS_LABEL);
    console.write_hex(ufsr);

    for (bit, text) in USAGE_BITS {
        if ufsr & bit != 0 {
            console.write_str(text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use debug_hal::mocks::{MockConsole, MockPeripherals};

    fn debug_entry(dfsr: u32) -> StopSignal {
        let status = FaultStatus {
            dfsr,
            ..FaultStatus::default()
        };
        determine_cause(EXCEPTION_DEBUG_MONITOR, &status, &MonitorConfig::default())
    }

    // ── Test A ──────────────────────────────────────────────────────────────
    #[test]
    fn exception_numbers_map_to_signals() {
        let status = FaultStatus::default();
        let config = MonitorConfig::default();
        let cause = |n| determine_cause(n, &status, &config);
        assert_eq!(cause(2), StopSignal::Interrupt);
        assert_eq!(cause(3), StopSignal::SegmentationFault);
        assert_eq!(cause(4), StopSignal::SegmentationFault);
        assert_eq!(cause(5), StopSignal::BusError);
        assert_eq!(cause(6), StopSignal::IllegalInstruction);
        assert_eq!(cause(21), StopSignal::Interrupt);
        assert_eq!(cause(24), StopSignal::Interrupt);
        assert_eq!(cause(25), StopSignal::Stopped);
        assert_eq!(cause(11), StopSignal::Stopped);
    }

    // ── Test B ──────────────────────────────────────────────────────────────
    // EXTERNAL outranks every trap bit; an empty DFSR is SIGSTOP.
    #[test]
    fn dfsr_priority_order() {
        assert_eq!(debug_entry(DFSR_DWTTRAP), StopSignal::Trap);
        assert_eq!(debug_entry(DFSR_BKPT | DFSR_HALTED), StopSignal::Trap);
        assert_eq!(debug_entry(DFSR_EXTERNAL | DFSR_BKPT), StopSignal::Stopped);
        assert_eq!(debug_entry(0), StopSignal::Stopped);
        assert_eq!(StopSignal::Trap.number(), 5);
    }

    // ── Test C ──────────────────────────────────────────────────────────────
    // A custom communication range replaces the default one.
    #[test]
    fn custom_comm_range() {
        let config = MonitorConfig {
            comm_exception_first: 53,
            comm_exception_last: 53,
            ..MonitorConfig::default()
        };
        let status = FaultStatus::default();
        assert_eq!(determine_cause(53, &status, &config), StopSignal::Interrupt);
        assert_eq!(determine_cause(21, &status, &config), StopSignal::Stopped);
    }

    // ── Test D ──────────────────────────────────────────────────────────────
    #[test]
    fn capture_acknowledges_dfsr() {
        let mut p = MockPeripherals::new();
        p.preset(SCB_DFSR, DFSR_BKPT);
        p.preset(SCB_CFSR, 0x0001_0000);
        let status = FaultStatus::capture(&mut p);
        assert_eq!(status.dfsr, DFSR_BKPT);
        assert_eq!(status.cfsr, 0x0001_0000);
        assert_eq!(p.peek(SCB_DFSR), 0);
    }

    // ── Test E ──────────────────────────────────────────────────────────────
    // Forced HardFault expands into the configurable fault sections.
    #[test]
    fn forced_hard_fault_text() {
        let status = FaultStatus {
            hfsr: HFSR_FORCED,
            cfsr: 0x0200_8200,
            bfar: 0x6000_0000,
            ..FaultStatus::default()
        };
        let mut console = MockConsole::new();
        render_fault_cause(&mut console, EXCEPTION_HARD_FAULT, &status, 0x2000_0F00);
        assert_eq!(
            console.output(),
            "\n**Hard Fault**\n  Status Register: 0x40000000\n    Forced\
             \n**Bus Fault**\n  Status Register: 0x00000082\n    Fault Address: 0x60000000\
             \n    Precise Data Access\
             \n**Usage Fault**\n  Status Register: 0x00000200\n    Divide by Zero\n"
        );
    }

    // ── Test F ──────────────────────────────────────────────────────────────
    #[test]
    fn mem_manage_stacking_reports_task_sp() {
        let status = FaultStatus {
            cfsr: 0x11,
            ..FaultStatus::default()
        };
        let mut console = MockConsole::new();
        render_fault_cause(&mut console, EXCEPTION_MEM_MANAGE, &status, 0x2000_1234);
        assert_eq!(
            console.output(),
            "\n**MPU Fault**\n  Status Register: 0x00000011\
             \n    Stacking Error w/ SP = 0x20001234\n    Instruction Fetch\n"
        );
    }

    // ── Test G ──────────────────────────────────────────────────────────────
    #[test]
    fn non_fault_exceptions_render_nothing() {
        let mut console = MockConsole::new();
        render_fault_cause(&mut console, EXCEPTION_DEBUG_MONITOR, &FaultStatus::default(), 0);
        render_fault_cause(&mut console, EXCEPTION_NMI, &FaultStatus::default(), 0);
        assert_eq!(console.output(), "");
    }

    // ── Test H ──────────────────────────────────────────────────────────────
    // A fault class with an empty status byte prints only the trailing newline.
    #[test]
    fn empty_usage_fault_prints_newline_only() {
        let mut console = MockConsole::new();
        render_fault_cause(&mut console, EXCEPTION_USAGE_FAULT, &FaultStatus::default(), 0);
        assert_eq!(console.output(), "\n");
    }

    // ── Test I ──────────────────────────────────────────────────────────────
    // Non-forced HardFault causes.
    #[test]
    fn hard_fault_debug_event_and_vector_read() {
        let status = FaultStatus {
            hfsr: HFSR_DEBUGEVT | HFSR_VECTTBL,
            ..FaultStatus::default()
        };
        let mut console = MockConsole::new();
        render_fault_cause(&mut console, EXCEPTION_HARD_FAULT, &status, 0);
        assert_eq!(
            console.output(),
            "\n**Hard Fault**\n  Status Register: 0x80000002\
             \n    Debug Event\n    Vector Table Read\n"
        );
    }

    // ── Test J ──────────────────────────────────────────────────────────────
    // MMARVALID, MLSPERR, MUNSTKERR and DACCVIOL.
    #[test]
    fn mem_manage_address_and_access_bits() {
        let status = FaultStatus {
            cfsr: 0xAA,
            mmfar: 0x2000_8000,
            ..FaultStatus::default()
        };
        let mut console = MockConsole::new();
        render_fault_cause(&mut console, EXCEPTION_MEM_MANAGE, &status, 0x2000_0ff0);
        assert_eq!(
            console.output(),
            "\n**MPU Fault**\n  Status Register: 0x000000aa\
             \n    Fault Address: 0x20008000\
             \n    FP Lazy Preservation\
             \n    Unstacking Error w/ SP = 0x20000ff0\
             \n    Data Access\n"
        );
    }

    // ── Test K ──────────────────────────────────────────────────────────────
    // LSPERR, STKERR, UNSTKERR, IMPRECISERR and IBUSERR; no BFAR without
    // BFARVALID.
    #[test]
    fn bus_fault_stacking_imprecise_and_prefetch() {
        let status = FaultStatus {
            cfsr: 0x3D00,
            bfar: 0x6000_0000,
            ..FaultStatus::default()
        };
        let mut console = MockConsole::new();
        render_fault_cause(&mut console, EXCEPTION_BUS_FAULT, &status, 0x2000_0f00);
        assert_eq!(
            console.output(),
            "\n**Bus Fault**\n  Status Register: 0x0000003d\
             \n    FP Lazy Preservation\
             \n    Stacking Error w/ SP = 0x20000f00\
             \n    Unstacking Error w/ SP = 0x20000f00\
             \n    Imprecise Data Access\
             \n    Instruction Prefetch\n"
        );
    }

    // ── Test L ──────────────────────────────────────────────────────────────
    // Every UsageFault bit, in register order from the top.
    #[test]
    fn usage_fault_all_bits() {
        let status = FaultStatus {
            cfsr: 0x030F_0000,
            ..FaultStatus::default()
        };
        let mut console = MockConsole::new();
        render_fault_cause(&mut console, EXCEPTION_USAGE_FAULT, &status, 0);
        assert_eq!(
            console.output(),
            "\n**Usage Fault**\n  Status Register: 0x0000030f\
             \n    Divide by Zero\n    Unaligned Access\n    Coprocessor Access\
             \n    Invalid Exception Return State\n    Invalid State\
             \n    Undefined Instruction\n"
        );
    }
}
