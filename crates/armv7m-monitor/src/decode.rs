//! Safe instruction fetch and the handful of Thumb decoders the monitor needs
//!
//! This is not a disassembler. It answers four questions about the
//! instruction at an address:
//!
//! - is it 16 or 32 bits wide (breakpoint encoding, PC advance)
//! - is it `SVC` (single-step cannot mask priority around it)
//! - is it `MSR BASEPRI` / `MSR BASEPRI_MAX` (step must not restore BASEPRI)
//! - is it one of the `BKPT` forms used for semihosting or hard breakpoints
//!
//! Every fetch can fault (PC pointing into unmapped memory is a common
//! reason for entering the debugger), so [`fetch_halfword`] returns a
//! `Result` built from the probe's consumed-on-read fault latch.

use debug_hal::{MemoryFault, MemoryProbe};

const THUMB32_PREFIX_MASK: u16 = 0xF800;
const THUMB32_PREFIXES: [u16; 3] = [0xE800, 0xF000, 0xF800];

const SVC_MASK: u16 = 0xFF00;
const SVC_OPCODE: u16 = 0xDF00;

const MSR_FIRST_MASK: u16 = 0xFFF0;
const MSR_FIRST_OPCODE: u16 = 0xF380;
const MSR_SECOND_BASEPRI: u16 = 0x8811;
const MSR_SECOND_BASEPRI_MAX: u16 = 0x8812;

/// `BKPT 0xAB`: mbed-style semihosting trap.
pub const BKPT_VENDOR_SEMIHOST: u16 = 0xBEAB;
/// `BKPT 0xFF`: newlib-style semihosting trap.
pub const BKPT_STANDARD_SEMIHOST: u16 = 0xBEFF;
/// `BKPT 0x00`: breakpoint compiled into the program.
pub const BKPT_HARDCODED: u16 = 0xBE00;

/// Read the halfword at `address`, turning a latched fault into an error.
///
/// The latch is consumed by the check but never cleared up front: a fault
/// still pending from an earlier access is reported here rather than lost.
/// The monitor clears it once per debugger entry.
pub fn fetch_halfword<M: MemoryProbe>(probe: &mut M, address: u32) -> Result<u16, MemoryFault> {
    let halfword = probe.read_halfword(address);
    if probe.was_fault_encountered() {
        return Err(MemoryFault);
    }
    Ok(halfword)
}

/// Thumb instruction width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InstructionWidth {
    /// 16-bit Thumb instruction.
    Narrow,
    /// 32-bit Thumb-2 instruction.
    Wide,
}

impl InstructionWidth {
    /// Width implied by the first halfword of an instruction.
    pub fn of(first_halfword: u16) -> Self {
        if is_thumb32(first_halfword) {
            Self::Wide
        } else {
            Self::Narrow
        }
    }

    /// Width in bytes.
    pub const fn bytes(self) -> u32 {
        match self {
            Self::Narrow => 2,
            Self::Wide => 4,
        }
    }
}

/// `true` when `first_halfword` starts a 32-bit instruction
/// (top five bits 0b11101, 0b11110 or 0b11111; ARMv7-M ARM §A5.1).
pub fn is_thumb32(first_halfword: u16) -> bool {
    THUMB32_PREFIXES.contains(&(first_halfword & THUMB32_PREFIX_MASK))
}

/// `true` for any `SVC #imm8`.
pub const fn is_svc(halfword: u16) -> bool {
    halfword & SVC_MASK == SVC_OPCODE
}

/// `true` when the two halfwords encode `MSR BASEPRI, Rn` or
/// `MSR BASEPRI_MAX, Rn`.
pub const fn is_msr_basepri_write(first: u16, second: u16) -> bool {
    first & MSR_FIRST_MASK == MSR_FIRST_OPCODE
        && (second == MSR_SECOND_BASEPRI || second == MSR_SECOND_BASEPRI_MAX)
}

/// Fetch-and-decode variant of [`is_svc`]. A faulting fetch is "not SVC".
pub fn points_to_svc<M: MemoryProbe>(probe: &mut M, address: u32) -> bool {
    fetch_halfword(probe, address).is_ok_and(is_svc)
}

/// Fetch-and-decode variant of [`is_msr_basepri_write`]. A fault on either
/// halfword is "not MSR".
pub fn points_to_basepri_write<M: MemoryProbe>(probe: &mut M, address: u32) -> bool {
    let Ok(first) = fetch_halfword(probe, address) else {
        return false;
    };
    let Ok(second) = fetch_halfword(probe, address.wrapping_add(2)) else {
        return false;
    };
    is_msr_basepri_write(first, second)
}

/// What the current instruction means to the protocol layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InstructionType {
    /// `BKPT 0xAB`: mbed-style semihost request.
    VendorSemihostCall,
    /// `BKPT 0xFF`: newlib-style semihost request.
    StandardSemihostCall,
    /// `BKPT 0x00`: breakpoint compiled into the program.
    HardcodedBreakpoint,
    /// Anything else, including an unreadable PC.
    Other,
}

/// Classify a halfword as one of the recognised `BKPT` forms.
pub const fn classify_breakpoint_opcode(halfword: u16) -> InstructionType {
    match halfword {
        BKPT_VENDOR_SEMIHOST => InstructionType::VendorSemihostCall,
        BKPT_STANDARD_SEMIHOST => InstructionType::StandardSemihostCall,
        BKPT_HARDCODED => InstructionType::HardcodedBreakpoint,
        _ => InstructionType::Other,
    }
}
