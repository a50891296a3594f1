//! Per-program debug session state
//!
//! One [`DebugSession`] lives for as long as the monitor does. It is owned
//! by the monitor and only ever touched from the DebugMonitor handler, which
//! cannot re-enter itself, so it needs no locking.

use debug_hal::PacketBuffer;

use crate::config::{DEBUGGER_STACK_FILL, PACKET_BUFFER_SIZE};
use crate::fault::FaultStatus;
use crate::step::StepController;

/// Everything the backend remembers between debugger entries.
#[derive(Debug, Clone, Default)]
pub struct DebugSession {
    /// Single-step state machine.
    pub step: StepController,
    exception_number: u32,
    fault_status: FaultStatus,
    original_pc: u32,
    task_sp: u32,
    buffer: PacketBuffer<PACKET_BUFFER_SIZE>,
    max_stack_used: usize,
    semihost_errno: Option<i32>,
}

impl DebugSession {
    /// Fresh session.
    pub const fn new() -> Self {
        Self {
            step: StepController::new(),
            exception_number: 0,
            fault_status: FaultStatus {
                dfsr: 0,
                hfsr: 0,
                cfsr: 0,
                mmfar: 0,
                bfar: 0,
            },
            original_pc: 0,
            task_sp: 0,
            buffer: PacketBuffer::new(),
            max_stack_used: 0,
            semihost_errno: None,
        }
    }

    /// Record why and where the debugger was entered.
    pub fn record_entry(
        &mut self,
        exception_number: u32,
        fault_status: FaultStatus,
        task_sp: u32,
        pc: u32,
    ) {
        self.exception_number = exception_number;
        self.fault_status = fault_status;
        self.task_sp = task_sp;
        self.original_pc = pc;
    }

    /// Exception number of the current entry.
    pub fn exception_number(&self) -> u32 {
        self.exception_number
    }

    /// Fault registers captured on the current entry.
    pub fn fault_status(&self) -> &FaultStatus {
        &self.fault_status
    }

    /// PC at entry, before any debugger edits.
    pub fn original_pc(&self) -> u32 {
        self.original_pc
    }

    /// Stack pointer of the interrupted code at entry.
    pub fn task_sp(&self) -> u32 {
        self.task_sp
    }

    /// Packet buffer shared with the protocol layer.
    pub fn buffer(&self) -> &PacketBuffer<PACKET_BUFFER_SIZE> {
        &self.buffer
    }

    /// Mutable packet buffer.
    pub fn buffer_mut(&mut self) -> &mut PacketBuffer<PACKET_BUFFER_SIZE> {
        &mut self.buffer
    }

    /// Largest number of debugger stack bytes seen in use.
    pub fn max_stack_used(&self) -> usize {
        self.max_stack_used
    }

    /// errno reported with the last failing semihost call.
    pub fn semihost_errno(&self) -> Option<i32> {
        self.semihost_errno
    }

    pub(crate) fn set_semihost_errno(&mut self, errno: Option<i32>) {
        self.semihost_errno = errno;
    }

    /// Update the high-water mark from the debugger stack.
    ///
    /// `stack` is the whole stack region, lowest address first, pre-filled
    /// with [`DEBUGGER_STACK_FILL`]. The stack grows down, so the untouched
    /// part is the run of fill words at the start. Returns the bytes used by
    /// this entry.
    pub fn record_stack_usage(&mut self, stack: &[u32]) -> usize {
        let untouched = stack
            .iter()
            .take_while(|word| **word == DEBUGGER_STACK_FILL)
            .count();
        let used = stack
            .len()
            .saturating_sub(untouched)
            .saturating_mul(core::mem::size_of::<u32>());
        self.max_stack_used = self.max_stack_used.max(used);
        used
    }
}
