//! FPB (Flash Patch and Breakpoint) hardware breakpoints
//!
//! Revision 1 comparator layout (ARMv7-M ARM §C1.11.5):
//!
//! ```text
//!  31 30 29 28                                   2  1  0
//! ┌─────┬──┬──────────────────────────────────────┬──┬──┐
//! │REPL │  │ COMP = address[28:2]                  │  │EN│
//! └─────┴──┴──────────────────────────────────────┴──┴──┘
//! ```
//!
//! REPLACE selects which halfword of the matched word raises the
//! breakpoint. A 32-bit instruction at a word-aligned address covers both;
//! otherwise the address's bit 1 picks the halfword. Only the code region
//! (below 0x2000_0000) can be matched.

use debug_hal::registers::{
    fp_comp, fp_ctrl_num_code, FPB_CODE_REGION_END, FP_COMP_ADDRESS_MASK, FP_COMP_ENABLE,
    FP_COMP_REPLACE_BOTH, FP_COMP_REPLACE_LOWER, FP_COMP_REPLACE_UPPER, FP_CTRL, FP_CTRL_ENABLE,
    FP_CTRL_KEY,
};
use debug_hal::DebugPeripherals;

use super::{ComparatorArena, SlotBinding};
use crate::config::MAX_FPB_COMPARATORS;
use crate::decode::InstructionWidth;
use crate::error::MonitorError;

/// An encoded FP_COMPn value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FpbComparator(u32);

impl FpbComparator {
    /// Encode a breakpoint on the instruction of `width` at `address`.
    ///
    /// # Errors
    ///
    /// [`MonitorError::InvalidArgument`] when `address` lies outside the
    /// code region.
    pub fn encode(address: u32, width: InstructionWidth) -> Result<Self, MonitorError> {
        if address >= FPB_CODE_REGION_END {
            return Err(MonitorError::InvalidArgument);
        }
        let upper_halfword = address & 0b10 != 0;
        let replace = match (width, upper_halfword) {
            (InstructionWidth::Wide, false) => FP_COMP_REPLACE_BOTH,
            (_, true) => FP_COMP_REPLACE_UPPER,
            (InstructionWidth::Narrow, false) => FP_COMP_REPLACE_LOWER,
        };
        Ok(Self((address & FP_COMP_ADDRESS_MASK) | replace | FP_COMP_ENABLE))
    }

    /// Register value to write into FP_COMPn.
    pub const fn bits(self) -> u32 {
        self.0
    }
}

/// Instruction width implied by a GDB `Z1` breakpoint kind.
///
/// Kind 2 is a 16-bit Thumb instruction; 3 and 4 are 32-bit Thumb-2.
pub fn width_from_kind(kind: u32) -> Result<InstructionWidth, MonitorError> {
    match kind {
        2 => Ok(InstructionWidth::Narrow),
        3 | 4 => Ok(InstructionWidth::Wide),
        _ => Err(MonitorError::InvalidArgument),
    }
}

/// The FPB code comparator pool.
#[derive(Debug, Clone, Default)]
pub struct FpbUnit {
    arena: ComparatorArena<FpbComparator, MAX_FPB_COMPARATORS>,
}

impl FpbUnit {
    /// Pool with no comparators until [`FpbUnit::init`].
    pub const fn new() -> Self {
        Self {
            arena: ComparatorArena::new(),
        }
    }

    /// Discover NUM_CODE, disable every comparator and enable the unit.
    pub fn init<P: DebugPeripherals>(&mut self, p: &mut P) {
        let implemented = fp_ctrl_num_code(p.read_word(FP_CTRL));
        for index in 0..implemented {
            p.write_word(fp_comp(index), 0);
        }
        self.arena.set_capacity(implemented as usize);
        p.write_word(FP_CTRL, FP_CTRL_KEY | FP_CTRL_ENABLE);

        #[cfg(feature = "defmt")]
        defmt::debug!("FPB: {=u32} code comparators, {=usize} usable", implemented, self.arena.capacity());
    }

    /// Install a breakpoint, reusing an identical one. Returns the slot.
    ///
    /// # Errors
    ///
    /// - [`MonitorError::InvalidArgument`] outside the code region
    /// - [`MonitorError::ResourceExhausted`] with every comparator in use;
    ///   no register is written
    pub fn enable<P: DebugPeripherals>(
        &mut self,
        p: &mut P,
        address: u32,
        width: InstructionWidth,
    ) -> Result<usize, MonitorError> {
        let comparator = FpbComparator::encode(address, width)?;
        match self.arena.bind(comparator) {
            Some(SlotBinding::Allocated(slot)) => {
                p.write_word(fp_comp(slot as u32), comparator.bits());
                Ok(slot)
            }
            Some(SlotBinding::Existing(slot)) => Ok(slot),
            None => {
                #[cfg(feature = "defmt")]
                defmt::warn!("FPB: no free comparator for {=u32:#x}", address);
                Err(MonitorError::ResourceExhausted)
            }
        }
    }

    /// Remove the breakpoint matching `address`/`width`. Removing one that
    /// was never installed is a no-op (`Ok(None)`).
    pub fn disable<P: DebugPeripherals>(
        &mut self,
        p: &mut P,
        address: u32,
        width: InstructionWidth,
    ) -> Result<Option<usize>, MonitorError> {
        let comparator = FpbComparator::encode(address, width)?;
        let released = self.arena.release(&comparator);
        if let Some(slot) = released {
            p.write_word(fp_comp(slot as u32), 0);
        }
        Ok(released)
    }

    /// `true` when an identical breakpoint is installed.
    pub fn is_set(&self, address: u32, width: InstructionWidth) -> bool {
        FpbComparator::encode(address, width).is_ok_and(|c| self.arena.find(&c).is_some())
    }

    /// Usable comparators.
    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Installed breakpoints.
    pub fn in_use(&self) -> usize {
        self.arena.in_use()
    }
}
