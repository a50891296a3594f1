//! Integration test: drives the monitor through complete debug sessions on
//! mock peripherals.
//!
//! Tests that:
//!   1. init programs DEMCR, the FPB, the DWT and every handler priority
//!   2. Breakpoints of kind 2/3/4 round trip through the FPB registers
//!   3. Exhausting a pool leaves the installed comparators untouched
//!   4. Stop signals follow the exception number and DFSR
//!   5. Stepping masks interrupts and restores BASEPRI on the next entry
//!   6. Stepping over SVC plants a breakpoint on the handler instead, and
//!      re-arming it does not leak the comparator
//!   7. The leaving hook tracks the debugger stack high-water mark
//!
//! Does NOT require physical hardware.
//!
//! Run with: cargo test -p armv7m-monitor --test integration_debug_session

// Integration test file -- intentional test patterns permitted.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::cast_possible_truncation,
    clippy::arithmetic_side_effects,
)]

use armv7m_monitor::config::{EXCEPTION_BUS_FAULT, EXCEPTION_DEBUG_MONITOR, EXCEPTION_NMI};
use armv7m_monitor::{
    CortexMMonitor, FaultStatus, MonitorConfig, MonitorError, StepState, StopSignal,
    WatchpointKind,
};
use debug_hal::mocks::{MockConsole, MockMemory, MockPeripherals};
use debug_hal::DebugPeripherals;
use debug_hal::registers::{
    dwt_comp, dwt_function, dwt_mask, fp_comp, DCB_DEMCR, DEMCR_MON_EN, DEMCR_MON_PEND,
    DEMCR_MON_STEP, DEMCR_TRCENA, DFSR_DWTTRAP, FP_CTRL, FP_CTRL_ENABLE, SCB_DFSR, SCB_SHPR2,
    SCB_SHPR3, SCB_VTOR,
};

type Monitor = CortexMMonitor<MockPeripherals, MockMemory>;

const VTOR: u32 = 0x0800_0000;
const SVC_HANDLER: u32 = 0x0800_2000;

fn monitor_with(peripherals: MockPeripherals, memory: MockMemory) -> Monitor {
    let mut m = CortexMMonitor::new(peripherals, memory, MonitorConfig::default());
    m.init();
    m
}

fn monitor() -> Monitor {
    monitor_with(MockPeripherals::new(), MockMemory::new())
}

/// Simulate a DebugMonitor entry at `pc`.
fn enter(m: &mut Monitor, exception: u32, pc: u32) {
    m.context_mut().set_pc(pc);
    let status = m.capture_fault_status();
    m.entering_debugger(exception, status, 0x2000_0F00);
}

// -- 1. init -----------------------------------------------------------------

#[test]
fn init_arms_the_debug_monitor() {
    let m = monitor();
    let p = m.peripherals();
    let demcr = p.peek(DCB_DEMCR);
    assert_eq!(demcr & DEMCR_TRCENA, DEMCR_TRCENA);
    assert_eq!(demcr & DEMCR_MON_EN, DEMCR_MON_EN);
    assert_eq!(demcr & (DEMCR_MON_STEP | DEMCR_MON_PEND), 0);
    assert_eq!(p.peek(FP_CTRL) & FP_CTRL_ENABLE, FP_CTRL_ENABLE);
    assert_eq!(m.fpb().capacity(), 6);
    assert_eq!(m.dwt().capacity(), 4);
    assert_eq!(m.dwt().max_mask(), 0xF);
}

#[cfg(not(feature = "task-aware"))]
#[test]
fn init_sets_handler_priorities() {
    let m = monitor();
    let p = m.peripherals();
    // SVCall in SHPR2[31:24]; SysTick, PendSV, DebugMonitor in SHPR3.
    assert_eq!(p.peek(SCB_SHPR2), 0x1000_0000);
    assert_eq!(p.peek(SCB_SHPR3), 0x1010_0000);
}

#[test]
fn init_disables_stale_comparators() {
    let mut p = MockPeripherals::new();
    p.preset(fp_comp(2), 0x4800_0101);
    p.preset(dwt_function(1), 6);
    let m = monitor_with(p, MockMemory::new());
    assert_eq!(m.peripherals().peek(fp_comp(2)), 0);
    assert_eq!(m.peripherals().peek(dwt_function(1)), 0);
}

// -- 2. breakpoints ----------------------------------------------------------

#[test]
fn breakpoint_kinds_round_trip() {
    let mut m = monitor();
    for (kind, expected) in [(2, 0x4800_0101), (3, 0xC800_0101), (4, 0xC800_0101)] {
        m.set_breakpoint_of_kind(0x0800_0100, kind).unwrap();
        assert_eq!(m.peripherals().peek(fp_comp(0)), expected, "kind {kind}");
        m.clear_breakpoint_of_kind(0x0800_0100, kind).unwrap();
        assert_eq!(m.peripherals().peek(fp_comp(0)), 0, "kind {kind}");
        assert_eq!(m.fpb().in_use(), 0);
    }
}

#[test]
fn breakpoint_argument_errors() {
    let mut m = monitor();
    assert_eq!(m.set_breakpoint_of_kind(0x100, 1), Err(MonitorError::InvalidArgument));
    assert_eq!(m.set_breakpoint_of_kind(0x2000_0000, 2), Err(MonitorError::InvalidArgument));
    assert_eq!(m.clear_breakpoint_of_kind(0x100, 2), Ok(()));
}

// -- 3. exhaustion -----------------------------------------------------------

#[test]
fn fpb_exhaustion_is_atomic() {
    let mut m = monitor_with(MockPeripherals::new().with_fpb_comparators(2), MockMemory::new());
    m.set_breakpoint_of_kind(0x100, 2).unwrap();
    m.set_breakpoint_of_kind(0x200, 2).unwrap();
    m.peripherals_mut().clear_writes();
    assert_eq!(m.set_breakpoint_of_kind(0x300, 2), Err(MonitorError::ResourceExhausted));
    assert!(m.peripherals().writes().is_empty());
    assert_eq!(m.peripherals().peek(fp_comp(0)), 0x4000_0101);
    assert_eq!(m.peripherals().peek(fp_comp(1)), 0x4000_0201);
}

#[test]
fn dwt_exhaustion_is_atomic() {
    let mut m = monitor_with(MockPeripherals::new().with_dwt_comparators(1), MockMemory::new());
    m.set_watchpoint(0x2000_0000, 4, WatchpointKind::Write).unwrap();
    m.peripherals_mut().clear_writes();
    assert_eq!(
        m.set_watchpoint(0x2000_0100, 4, WatchpointKind::Read),
        Err(MonitorError::ResourceExhausted)
    );
    assert!(m.peripherals().writes().is_empty());
    assert_eq!(m.peripherals().peek(dwt_comp(0)), 0x2000_0000);
    assert_eq!(m.peripherals().peek(dwt_mask(0)), 2);
    assert_eq!(m.peripherals().peek(dwt_function(0)), 6);
}

// -- 4. stop signals ---------------------------------------------------------

#[test]
fn watchpoint_hit_reports_sigtrap() {
    let mut m = monitor();
    m.set_watchpoint(0x2000_0040, 4, WatchpointKind::ReadWrite).unwrap();
    m.peripherals_mut().preset(SCB_DFSR, DFSR_DWTTRAP);
    enter(&mut m, EXCEPTION_DEBUG_MONITOR, 0x0800_0100);
    assert_eq!(m.determine_cause(), StopSignal::Trap);
    // The event was acknowledged on entry: the next entry sees an empty DFSR.
    enter(&mut m, EXCEPTION_DEBUG_MONITOR, 0x0800_0100);
    assert_eq!(m.determine_cause(), StopSignal::Stopped);
}

#[test]
fn fault_entries_report_fault_signals() {
    let mut m = monitor();
    enter(&mut m, EXCEPTION_NMI, 0x100);
    assert_eq!(m.determine_cause(), StopSignal::Interrupt);
    m.entering_debugger(
        EXCEPTION_BUS_FAULT,
        FaultStatus {
            cfsr: 0x0000_8200,
            bfar: 0x6000_0000,
            ..FaultStatus::default()
        },
        0x2000_0F00,
    );
    assert_eq!(m.determine_cause(), StopSignal::BusError);
    let mut console = MockConsole::new();
    m.render_fault_cause(&mut console);
    assert!(console.output().contains("**Bus Fault**"));
    assert!(console.output().contains("Fault Address: 0x60000000"));
}

// -- 5. masked step ----------------------------------------------------------

#[cfg(not(feature = "task-aware"))]
#[test]
fn step_masks_then_restores_on_entry() {
    let mem = MockMemory::new().with_halfword(0x0800_0100, 0x3001); // adds r0, #1
    let mut m = monitor_with(MockPeripherals::new(), mem);
    enter(&mut m, EXCEPTION_DEBUG_MONITOR, 0x0800_0100);
    m.peripherals_mut().set_basepri(0x60);

    m.enable_single_step();
    assert!(m.is_single_stepping());
    // DebugMonitor at logical 0 → BASEPRI for logical 1 with 4 bits.
    assert_eq!(m.peripherals().basepri(), 0x10);
    assert_eq!(m.peripherals().peek(DCB_DEMCR) & DEMCR_MON_STEP, DEMCR_MON_STEP);

    enter(&mut m, EXCEPTION_DEBUG_MONITOR, 0x0800_0102);
    assert!(!m.is_single_stepping());
    assert_eq!(m.peripherals().basepri(), 0x60);
    assert_eq!(m.peripherals().peek(DCB_DEMCR) & DEMCR_MON_STEP, 0);
}

// With the DebugMonitor at the lowest priority there is nothing to raise
// BASEPRI to; the program's mask must survive the step untouched.
#[cfg(feature = "task-aware")]
#[test]
fn task_aware_step_keeps_program_basepri() {
    let mem = MockMemory::new().with_halfword(0x0800_0100, 0x3001);
    let mut m = monitor_with(MockPeripherals::new(), mem);
    enter(&mut m, EXCEPTION_DEBUG_MONITOR, 0x0800_0100);
    m.peripherals_mut().set_basepri(0x40);

    m.enable_single_step();
    assert!(m.is_single_stepping());
    assert_eq!(m.peripherals().basepri(), 0x40);

    enter(&mut m, EXCEPTION_DEBUG_MONITOR, 0x0800_0102);
    assert_eq!(m.peripherals().basepri(), 0x40);
}

#[test]
fn disable_single_step_cancels() {
    let mem = MockMemory::new().with_halfword(0x0800_0100, 0x3001);
    let mut m = monitor_with(MockPeripherals::new(), mem);
    enter(&mut m, EXCEPTION_DEBUG_MONITOR, 0x0800_0100);
    m.enable_single_step();
    m.disable_single_step();
    assert_eq!(m.session().step.state(), StepState::Idle);
    assert_eq!(m.peripherals().peek(DCB_DEMCR) & DEMCR_MON_STEP, 0);
}

// -- 6. SVC step -------------------------------------------------------------

#[test]
fn step_over_svc_breaks_on_handler() {
    let mut p = MockPeripherals::new();
    p.preset(SCB_VTOR, VTOR);
    p.preset(VTOR + 0x2C, SVC_HANDLER | 1);
    let mem = MockMemory::new()
        .with_halfword(0x0800_0100, 0xDF01) // svc #1
        .with_thumb32(SVC_HANDLER, 0xE92D, 0x41F0); // push.w
    let mut m = monitor_with(p, mem);
    enter(&mut m, EXCEPTION_DEBUG_MONITOR, 0x0800_0100);
    m.peripherals_mut().set_basepri(0x40);

    m.enable_single_step();
    assert!(!m.is_single_stepping());
    assert_eq!(m.peripherals().basepri(), 0x40);
    assert_eq!(m.peripherals().peek(DCB_DEMCR) & DEMCR_MON_STEP, 0);
    assert_eq!(m.peripherals().peek(fp_comp(0)), 0xC800_2001);

    enter(&mut m, EXCEPTION_DEBUG_MONITOR, SVC_HANDLER);
    assert_eq!(m.peripherals().peek(fp_comp(0)), 0);
    assert_eq!(m.fpb().in_use(), 0);
}

#[test]
fn repeated_svc_step_does_not_leak_comparator() {
    let mut p = MockPeripherals::new();
    p.preset(SCB_VTOR, VTOR);
    p.preset(VTOR + 0x2C, SVC_HANDLER | 1);
    let mem = MockMemory::new()
        .with_halfword(0x0800_0100, 0xDF01)
        .with_halfword(SVC_HANDLER, 0xB580);
    let mut m = monitor_with(p, mem);
    enter(&mut m, EXCEPTION_DEBUG_MONITOR, 0x0800_0100);

    m.enable_single_step();
    m.enable_single_step();
    assert_eq!(m.fpb().in_use(), 1);

    enter(&mut m, EXCEPTION_DEBUG_MONITOR, SVC_HANDLER);
    assert_eq!(m.fpb().in_use(), 0);
    assert_eq!(m.peripherals().peek(fp_comp(0)), 0);
}

// -- 7. leaving hook ---------------------------------------------------------

#[test]
fn leaving_tracks_stack_and_clears_pending() {
    let mut m = monitor();
    enter(&mut m, EXCEPTION_DEBUG_MONITOR, 0x100);
    m.peripherals_mut().preset(DCB_DEMCR, DEMCR_MON_EN | DEMCR_MON_PEND);
    let mut stack = [0xDEAD_BEEFu32; 64];
    for word in &mut stack[40..] {
        *word = 0;
    }
    m.leaving_debugger(&stack);
    assert_eq!(m.max_stack_used(), 24 * 4);
    assert_eq!(m.peripherals().peek(DCB_DEMCR) & DEMCR_MON_PEND, 0);
}

