//! Mock implementations for testing
//!
//! This module provides mock implementations of all debug-hal traits for use
//! in unit and integration tests. [`MockPeripherals`] emulates the parts of
//! the SCB / DCB / FPB / DWT register behaviour the monitor relies on:
//!
//! - FP_CTRL reports a configurable NUM_CODE and only accepts writes with KEY
//! - DWT_CTRL reports a configurable NUMCOMP
//! - DWT_MASKn keeps only the implemented mask bits
//! - SHPRn keep only the implemented priority bits of each byte
//! - DFSR / CFSR / HFSR are write-one-to-clear

#![cfg(any(test, feature = "std"))]

use crate::registers::{
    DCB_DEMCR, DWT_COMP0, DWT_COMPARATOR_STRIDE, DWT_CTRL, DWT_CTRL_NUMCOMP_SHIFT, DWT_MASK_OFFSET,
    FP_CTRL, FP_CTRL_ENABLE, FP_CTRL_KEY, SCB_CFSR, SCB_DFSR, SCB_HFSR, SCB_SHPR2, SCB_SHPR3,
};
use crate::{Console, DebugPeripherals, FaultLatch, MemoryProbe};

const REGISTER_CAPACITY: usize = 128;
const WRITE_LOG_CAPACITY: usize = 512;

/// Mock debug peripheral block
#[derive(Debug, Clone)]
pub struct MockPeripherals {
    registers: heapless::Vec<(u32, u32), REGISTER_CAPACITY>,
    writes: heapless::Vec<(u32, u32), WRITE_LOG_CAPACITY>,
    basepri: u8,
    fpb_comparators: u32,
    dwt_comparators: u32,
    dwt_max_mask: u32,
    priority_bits: u8,
}

impl MockPeripherals {
    /// Create a Cortex-M4-like block: 6 code comparators, 4 DWT comparators,
    /// MASK limited to 15 and 4 priority bits.
    pub fn new() -> Self {
        Self {
            registers: heapless::Vec::new(),
            writes: heapless::Vec::new(),
            basepri: 0,
            fpb_comparators: 6,
            dwt_comparators: 4,
            dwt_max_mask: 0xF,
            priority_bits: 4,
        }
    }

    /// Set the FP_CTRL.NUM_CODE value reported to the monitor.
    #[must_use]
    pub fn with_fpb_comparators(mut self, count: u32) -> Self {
        self.fpb_comparators = count & 0x7F;
        self
    }

    /// Set the DWT_CTRL.NUMCOMP value reported to the monitor.
    #[must_use]
    pub fn with_dwt_comparators(mut self, count: u32) -> Self {
        self.dwt_comparators = count & 0xF;
        self
    }

    /// Set the widest MASK value the DWT comparators accept.
    #[must_use]
    pub fn with_dwt_max_mask(mut self, max_mask: u32) -> Self {
        self.dwt_max_mask = max_mask & 0x1F;
        self
    }

    /// Set the number of implemented priority bits.
    #[must_use]
    pub fn with_priority_bits(mut self, bits: u8) -> Self {
        self.priority_bits = bits.clamp(1, 8);
        self
    }

    /// Poke a register or memory word (e.g. a vector table entry) without
    /// recording a write.
    pub fn preset(&mut self, address: u32, value: u32) {
        self.store(address, value);
    }

    /// Current stored value at `address` (zero if never written).
    pub fn peek(&self, address: u32) -> u32 {
        self.registers
            .iter()
            .find(|(a, _)| *a == address)
            .map_or(0, |(_, v)| *v)
    }

    /// Every write issued through [`DebugPeripherals::write_word`], in order.
    pub fn writes(&self) -> &[(u32, u32)] {
        &self.writes
    }

    /// Number of writes issued to `address`.
    pub fn write_count(&self, address: u32) -> usize {
        self.writes.iter().filter(|(a, _)| *a == address).count()
    }

    /// Forget the write log (register state is kept).
    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }

    fn store(&mut self, address: u32, value: u32) {
        if let Some(slot) = self.registers.iter_mut().find(|(a, _)| *a == address) {
            slot.1 = value;
        } else {
            let _ = self.registers.push((address, value));
        }
    }

    fn priority_byte_mask(&self) -> u32 {
        let byte = 0xFFu32.wrapping_shl(u32::from(8u8.saturating_sub(self.priority_bits))) & 0xFF;
        byte | byte.wrapping_shl(8) | byte.wrapping_shl(16) | byte.wrapping_shl(24)
    }

    #[allow(clippy::arithmetic_side_effects)] // constant non-zero stride
    fn is_dwt_mask(address: u32) -> bool {
        address >= DWT_COMP0
            && address < DWT_COMP0.wrapping_add(DWT_COMPARATOR_STRIDE.wrapping_mul(16))
            && address.wrapping_sub(DWT_COMP0) % DWT_COMPARATOR_STRIDE == DWT_MASK_OFFSET
    }
}

impl Default for MockPeripherals {
    fn default() -> Self {
        Self::new()
    }
}

impl DebugPeripherals for MockPeripherals {
    #[allow(clippy::arithmetic_side_effects)] // field packing with constant shifts
    fn read_word(&mut self, address: u32) -> u32 {
        match address {
            FP_CTRL => {
                let num_code = self.fpb_comparators;
                let encoded = ((num_code & 0xF) << 4) | ((num_code & 0x70) << 8);
                (self.peek(FP_CTRL) & FP_CTRL_ENABLE) | encoded
            }
            DWT_CTRL => {
                (self.peek(DWT_CTRL) & !(0xF << DWT_CTRL_NUMCOMP_SHIFT))
                    | (self.dwt_comparators << DWT_CTRL_NUMCOMP_SHIFT)
            }
            _ => self.peek(address),
        }
    }

    fn write_word(&mut self, address: u32, value: u32) {
        let _ = self.writes.push((address, value));
        let stored = match address {
            FP_CTRL if value & FP_CTRL_KEY == 0 => return,
            FP_CTRL => value & FP_CTRL_ENABLE,
            SCB_SHPR2 | SCB_SHPR3 => value & self.priority_byte_mask(),
            SCB_DFSR | SCB_CFSR | SCB_HFSR => self.peek(address) & !value,
            DCB_DEMCR => value,
            a if Self::is_dwt_mask(a) => value.min(self.dwt_max_mask),
            _ => value,
        };
        self.store(address, stored);
    }

    fn basepri(&self) -> u8 {
        self.basepri
    }

    fn set_basepri(&mut self, value: u8) {
        self.basepri = value;
    }
}

/// Mock target memory
///
/// Reads of mapped halfwords succeed; any other read raises the fault latch,
/// mimicking the BusFault handler's behaviour on hardware.
#[derive(Debug, Default)]
pub struct MockMemory {
    halfwords: heapless::Vec<(u32, u16), 64>,
    latch: FaultLatch,
    reads: usize,
}

impl MockMemory {
    /// Create memory with nothing mapped.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map one halfword.
    #[must_use]
    pub fn with_halfword(mut self, address: u32, value: u16) -> Self {
        self.map_halfword(address, value);
        self
    }

    /// Map a 32-bit Thumb instruction as its two halfwords (first halfword
    /// at the lower address).
    #[must_use]
    pub fn with_thumb32(mut self, address: u32, first: u16, second: u16) -> Self {
        self.map_halfword(address, first);
        self.map_halfword(address.wrapping_add(2), second);
        self
    }

    /// Map or replace one halfword.
    pub fn map_halfword(&mut self, address: u32, value: u16) {
        if let Some(slot) = self.halfwords.iter_mut().find(|(a, _)| *a == address) {
            slot.1 = value;
        } else {
            let _ = self.halfwords.push((address, value));
        }
    }

    /// Number of reads issued so far.
    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl MemoryProbe for MockMemory {
    fn read_halfword(&mut self, address: u32) -> u16 {
        self.reads = self.reads.saturating_add(1);
        match self.halfwords.iter().find(|(a, _)| *a == address) {
            Some((_, value)) => *value,
            None => {
                self.latch.raise();
                0
            }
        }
    }

    fn was_fault_encountered(&mut self) -> bool {
        self.latch.take()
    }
}

/// Mock console collecting everything written to it
#[derive(Debug, Default)]
pub struct MockConsole {
    output: heapless::String<2048>,
}

impl MockConsole {
    /// Create an empty console.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    pub fn output(&self) -> &str {
        &self.output
    }
}

impl Console for MockConsole {
    fn write_str(&mut self, text: &str) {
        let _ = self.output.push_str(text);
    }
}
