//! Architecture backend facade
//!
//! [`CortexMMonitor`] is what the protocol layer talks to. It owns the
//! peripheral and memory accessors, the register context of the interrupted
//! program, both comparator pools and the [`DebugSession`].
//!
//! # Entry / exit protocol
//!
//! ```text
//! DebugMonitor / fault handler
//!   1. glue copies the stacked frame and callee-saved registers into
//!      context_mut()
//!   2. entering_debugger(exception, capture_fault_status(), task_sp)
//!   3. protocol layer runs (Z/z, g/G, step, continue ...)
//!   4. leaving_debugger(debugger_stack)
//!   5. glue writes the frame back (RegisterContext::store_frame)
//! ```

use debug_hal::registers::{
    DCB_DEMCR, DEMCR_MON_EN, DEMCR_MON_PEND, DEMCR_TRCENA, SCB_SHPR3, SHPR3_DEBUGMON_SHIFT,
};
#[cfg(not(feature = "task-aware"))]
use debug_hal::registers::{SCB_SHPR2, SHPR2_SVCALL_SHIFT, SHPR3_PENDSV_SHIFT, SHPR3_SYSTICK_SHIFT};
use debug_hal::{Console, DebugPeripherals, HexBuffer, MemoryProbe, PacketBuffer};

use crate::codec;
use crate::comparators::fpb::width_from_kind;
use crate::comparators::{DwtUnit, FpbUnit, WatchpointKind};
use crate::config::{MonitorConfig, DEBUG_MONITOR_PRIORITY, PACKET_BUFFER_SIZE};
#[cfg(not(feature = "task-aware"))]
use crate::config::SYSTEM_HANDLER_PRIORITY;
use crate::context::{RegisterContext, R0, R3};
use crate::decode::{classify_breakpoint_opcode, fetch_halfword, InstructionType, InstructionWidth};
use crate::error::MonitorError;
use crate::fault::{self, FaultStatus, StopSignal};
use crate::session::DebugSession;
use crate::target_xml::{target_xml_size, TARGET_XML};

/// ARMv7-M debug monitor backend.
pub struct CortexMMonitor<P, M> {
    peripherals: P,
    probe: M,
    config: MonitorConfig,
    context: RegisterContext,
    fpb: FpbUnit,
    dwt: DwtUnit,
    session: DebugSession,
}

impl<P, M> CortexMMonitor<P, M>
where
    P: DebugPeripherals,
    M: MemoryProbe,
{
    /// Wrap the accessors. Nothing touches hardware until [`Self::init`].
    pub fn new(peripherals: P, probe: M, config: MonitorConfig) -> Self {
        Self {
            peripherals,
            probe,
            config,
            context: RegisterContext::new(),
            fpb: FpbUnit::new(),
            dwt: DwtUnit::new(),
            session: DebugSession::new(),
        }
    }

    /// Bring the debug hardware into monitor mode.
    ///
    /// After this returns every comparator is disabled, the FPB is enabled,
    /// single-step is off and the DebugMonitor exception is armed at its
    /// configured priority.
    pub fn init(&mut self) {
        let p = &mut self.peripherals;
        p.set_bits(DCB_DEMCR, DEMCR_TRCENA);
        self.dwt.init(p);
        self.fpb.init(p);

        #[cfg(not(feature = "task-aware"))]
        {
            let priority = self.config.scale_priority(u32::from(SYSTEM_HANDLER_PRIORITY));
            p.write_priority_byte(SCB_SHPR2, SHPR2_SVCALL_SHIFT, priority);
            p.write_priority_byte(SCB_SHPR3, SHPR3_PENDSV_SHIFT, priority);
            p.write_priority_byte(SCB_SHPR3, SHPR3_SYSTICK_SHIFT, priority);
        }

        self.session.step.cleanup(p, &mut self.fpb);
        p.clear_bits(DCB_DEMCR, DEMCR_MON_PEND);
        let monitor_priority = self.config.scale_priority(u32::from(DEBUG_MONITOR_PRIORITY));
        p.write_priority_byte(SCB_SHPR3, SHPR3_DEBUGMON_SHIFT, monitor_priority);
        p.set_bits(DCB_DEMCR, DEMCR_MON_EN);

        #[cfg(feature = "defmt")]
        defmt::info!(
            "debug monitor armed: {=usize} breakpoints, {=usize} watchpoints",
            self.fpb.capacity(),
            self.dwt.capacity()
        );
    }

    // ── Single step ─────────────────────────────────────────────────────────

    /// Arrange for the next resume to stop after one instruction.
    pub fn enable_single_step(&mut self) {
        let pc = self.context.pc();
        self.session.step.enable(
            &mut self.peripherals,
            &mut self.probe,
            &mut self.fpb,
            &self.config,
            pc,
        );
    }

    /// Cancel a pending step and undo its side effects.
    pub fn disable_single_step(&mut self) {
        self.session.step.cleanup(&mut self.peripherals, &mut self.fpb);
    }

    /// `true` while a hardware step is armed.
    pub fn is_single_stepping(&self) -> bool {
        self.session.step.is_single_stepping()
    }

    // ── Entry / exit ────────────────────────────────────────────────────────

    /// Read and acknowledge the fault status registers.
    pub fn capture_fault_status(&mut self) -> FaultStatus {
        FaultStatus::capture(&mut self.peripherals)
    }

    /// Debugger entry hook. The context must already hold the interrupted
    /// program's registers.
    pub fn entering_debugger(
        &mut self,
        exception_number: u32,
        fault_status: FaultStatus,
        task_sp: u32,
    ) {
        self.probe.clear_fault();
        let pc = self.context.pc();
        self.session
            .record_entry(exception_number, fault_status, task_sp, pc);
        self.session.step.cleanup(&mut self.peripherals, &mut self.fpb);

        #[cfg(feature = "defmt")]
        defmt::debug!("debugger entry: exception {=u32}, pc {=u32:#x}", exception_number, pc);
    }

    /// Debugger exit hook. `debugger_stack` is the monitor's own stack
    /// region, lowest address first.
    pub fn leaving_debugger(&mut self, debugger_stack: &[u32]) {
        let _used = self.session.record_stack_usage(debugger_stack);
        self.peripherals.clear_bits(DCB_DEMCR, DEMCR_MON_PEND);

        #[cfg(feature = "defmt")]
        defmt::trace!("debugger exit: {=usize} stack bytes used", _used);
    }

    /// Stop signal for the current entry.
    pub fn determine_cause(&self) -> StopSignal {
        fault::determine_cause(
            self.session.exception_number(),
            self.session.fault_status(),
            &self.config,
        )
    }

    /// Describe the fault behind the current entry, if it was one.
    pub fn render_fault_cause<C: Console>(&self, console: &mut C) {
        fault::render_fault_cause(
            console,
            self.session.exception_number(),
            self.session.fault_status(),
            self.session.task_sp(),
        );
    }

    // ── Breakpoints / watchpoints ───────────────────────────────────────────

    /// `Z1,addr,kind`: hardware breakpoint with an explicit GDB kind.
    pub fn set_breakpoint_of_kind(&mut self, address: u32, kind: u32) -> Result<(), MonitorError> {
        let width = width_from_kind(kind)?;
        self.fpb.enable(&mut self.peripherals, address, width).map(|_| ())
    }

    /// `z1,addr,kind`. Clearing a breakpoint that is not set succeeds.
    pub fn clear_breakpoint_of_kind(&mut self, address: u32, kind: u32) -> Result<(), MonitorError> {
        let width = width_from_kind(kind)?;
        self.fpb.disable(&mut self.peripherals, address, width).map(|_| ())
    }

    /// Breakpoint sized from the instruction found at `address`.
    pub fn set_breakpoint(&mut self, address: u32) -> Result<(), MonitorError> {
        let width = self.instruction_width_at(address)?;
        self.fpb.enable(&mut self.peripherals, address, width).map(|_| ())
    }

    /// Remove a breakpoint set with [`Self::set_breakpoint`].
    pub fn clear_breakpoint(&mut self, address: u32) -> Result<(), MonitorError> {
        let width = self.instruction_width_at(address)?;
        self.fpb.disable(&mut self.peripherals, address, width).map(|_| ())
    }

    /// `Z2`/`Z3`/`Z4`: data watchpoint over `size` bytes at `address`.
    pub fn set_watchpoint(
        &mut self,
        address: u32,
        size: u32,
        kind: WatchpointKind,
    ) -> Result<(), MonitorError> {
        self.dwt
            .enable(&mut self.peripherals, address, size, kind)
            .map(|_| ())
    }

    /// `z2`/`z3`/`z4`. Clearing a watchpoint that is not set succeeds.
    pub fn clear_watchpoint(
        &mut self,
        address: u32,
        size: u32,
        kind: WatchpointKind,
    ) -> Result<(), MonitorError> {
        self.dwt
            .disable(&mut self.peripherals, address, size, kind)
            .map(|_| ())
    }

    fn instruction_width_at(&mut self, address: u32) -> Result<InstructionWidth, MonitorError> {
        Ok(InstructionWidth::of(fetch_halfword(&mut self.probe, address)?))
    }

    // ── Registers ───────────────────────────────────────────────────────────

    /// Append every register to the packet buffer (`g` reply).
    pub fn copy_context_to_buffer(&mut self) -> Result<(), MonitorError> {
        codec::write_context(&self.context, self.session.buffer_mut())
    }

    /// Decode every register from the packet buffer's read position (`G`).
    pub fn copy_context_from_buffer(&mut self) -> Result<(), MonitorError> {
        codec::read_context(&mut self.context, self.session.buffer_mut())
    }

    /// Append the expedited stop-reply registers to the packet buffer.
    pub fn write_stop_registers(&mut self) -> Result<(), MonitorError> {
        codec::write_stop_registers(&self.context, self.session.buffer_mut())
    }

    /// Current PC of the interrupted program.
    pub fn program_counter(&self) -> u32 {
        self.context.pc()
    }

    /// Resume at `address`.
    pub fn set_program_counter(&mut self, address: u32) {
        self.context.set_pc(address);
    }

    /// Skip the instruction at PC. An unreadable PC is left alone.
    pub fn advance_program_counter(&mut self) {
        let pc = self.context.pc();
        if let Ok(width) = self.instruction_width_at(pc) {
            self.context.set_pc(pc.wrapping_add(width.bytes()));
        }
    }

    /// `true` once the PC differs from its value at entry.
    pub fn was_program_counter_modified(&self) -> bool {
        self.context.pc() != self.session.original_pc()
    }

    /// Recognise semihost requests and compiled-in breakpoints at PC.
    pub fn current_instruction_type(&mut self) -> InstructionType {
        let pc = self.context.pc();
        fetch_halfword(&mut self.probe, pc).map_or(InstructionType::Other, classify_breakpoint_opcode)
    }

    // ── Semihosting ─────────────────────────────────────────────────────────

    /// R0-R3 of a semihost request.
    pub fn semihost_parameters(&self) -> [u32; 4] {
        let mut parameters = [0u32; 4];
        for (n, parameter) in (R0..=R3).zip(parameters.iter_mut()) {
            *parameter = self.context.argument(n);
        }
        parameters
    }

    /// Complete a semihost request: `value` goes to R0, and `errno` is kept
    /// for the target when `value` signals failure.
    pub fn set_semihost_return(&mut self, value: i32, errno: i32) {
        self.context.set_r0(u32::from_ne_bytes(value.to_ne_bytes()));
        self.session.set_semihost_errno((value < 0).then_some(errno));
    }

    /// errno of the last failing semihost request.
    pub fn semihost_errno(&self) -> Option<i32> {
        self.session.semihost_errno()
    }

    // ── Accessors ───────────────────────────────────────────────────────────

    /// GDB target description for this build.
    pub fn target_xml(&self) -> &'static str {
        TARGET_XML
    }

    /// Length of [`Self::target_xml`] in bytes.
    pub fn target_xml_size(&self) -> usize {
        target_xml_size()
    }

    /// Packet buffer shared with the protocol layer.
    pub fn packet_buffer(&mut self) -> &mut PacketBuffer<PACKET_BUFFER_SIZE> {
        self.session.buffer_mut()
    }

    /// Most debugger stack bytes seen in use.
    pub fn max_stack_used(&self) -> usize {
        self.session.max_stack_used()
    }

    /// Session state.
    pub fn session(&self) -> &DebugSession {
        &self.session
    }

    /// Registers of the interrupted program.
    pub fn context(&self) -> &RegisterContext {
        &self.context
    }

    /// Mutable registers, for the entry/exit glue.
    pub fn context_mut(&mut self) -> &mut RegisterContext {
        &mut self.context
    }

    /// Active configuration.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Hardware breakpoint pool.
    pub fn fpb(&self) -> &FpbUnit {
        &self.fpb
    }

    /// Hardware watchpoint pool.
    pub fn dwt(&self) -> &DwtUnit {
        &self.dwt
    }

    /// Peripheral accessor.
    pub fn peripherals(&self) -> &P {
        &self.peripherals
    }

    /// Mutable peripheral accessor.
    pub fn peripherals_mut(&mut self) -> &mut P {
        &mut self.peripherals
    }
}

/// Write the stop reply header and expedited registers: `T<sig><regs>`.
pub fn write_stop_reply<P, M, B>(
    monitor: &CortexMMonitor<P, M>,
    buffer: &mut B,
) -> Result<(), MonitorError>
where
    P: DebugPeripherals,
    M: MemoryProbe,
    B: HexBuffer,
{
    buffer.write_char(b'T')?;
    buffer.write_byte_as_hex(monitor.determine_cause().number())?;
    codec::write_stop_registers(monitor.context(), buffer)
}
