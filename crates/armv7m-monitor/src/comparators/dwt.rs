//! DWT (Data Watchpoint and Trace) hardware watchpoints
//!
//! Each comparator watches a naturally aligned power-of-two range:
//! `DWT_COMPn` holds the base, `DWT_MASKn` the number of ignored low address
//! bits (log2 of the size) and `DWT_FUNCTIONn` the access type. Writing
//! FUNCTION = 0 disables the comparator.
//!
//! How many MASK bits a part implements varies. Writing the architectural
//! maximum to `DWT_MASK0` and reading it back reveals the limit, which is
//! done once at init.

use debug_hal::registers::{
    dwt_comp, dwt_function, dwt_mask, DWT_CTRL, DWT_CTRL_NUMCOMP_SHIFT, DWT_FUNCTION_READ,
    DWT_FUNCTION_READ_WRITE, DWT_FUNCTION_WRITE, DWT_MASK_PROBE,
};
use debug_hal::DebugPeripherals;

use super::{ComparatorArena, SlotBinding};
use crate::config::MAX_DWT_COMPARATORS;
use crate::error::MonitorError;

/// Access type a watchpoint triggers on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WatchpointKind {
    /// Data write (`Z2`).
    Write,
    /// Data read (`Z3`).
    Read,
    /// Data read or write (`Z4`).
    ReadWrite,
}

impl WatchpointKind {
    /// Convert a GDB `Z`/`z` packet type number.
    ///
    /// # Errors
    ///
    /// [`MonitorError::InvalidArgument`] for anything but 2, 3 or 4.
    pub fn from_gdb_type(packet_type: u32) -> Result<Self, MonitorError> {
        match packet_type {
            2 => Ok(Self::Write),
            3 => Ok(Self::Read),
            4 => Ok(Self::ReadWrite),
            _ => Err(MonitorError::InvalidArgument),
        }
    }

    /// DWT_FUNCTION encoding.
    pub const fn function(self) -> u32 {
        match self {
            Self::Write => DWT_FUNCTION_WRITE,
            Self::Read => DWT_FUNCTION_READ,
            Self::ReadWrite => DWT_FUNCTION_READ_WRITE,
        }
    }
}

/// A validated COMP / MASK / FUNCTION triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DwtComparator {
    address: u32,
    mask: u32,
    function: u32,
}

impl DwtComparator {
    /// Validate and encode a watchpoint.
    ///
    /// # Errors
    ///
    /// [`MonitorError::InvalidArgument`] when `size` is not a power of two,
    /// `address` is not aligned to `size`, or `size` needs more MASK bits
    /// than `max_mask`.
    pub fn encode(
        address: u32,
        size: u32,
        kind: WatchpointKind,
        max_mask: u32,
    ) -> Result<Self, MonitorError> {
        if !size.is_power_of_two() {
            return Err(MonitorError::InvalidArgument);
        }
        if address & size.wrapping_sub(1) != 0 {
            return Err(MonitorError::InvalidArgument);
        }
        let mask = size.trailing_zeros();
        if mask > max_mask {
            return Err(MonitorError::InvalidArgument);
        }
        Ok(Self {
            address,
            mask,
            function: kind.function(),
        })
    }

    /// DWT_COMPn value.
    pub const fn address(&self) -> u32 {
        self.address
    }

    /// DWT_MASKn value.
    pub const fn mask(&self) -> u32 {
        self.mask
    }

    /// DWT_FUNCTIONn value.
    pub const fn function(&self) -> u32 {
        self.function
    }
}

/// The DWT comparator pool.
#[derive(Debug, Clone, Default)]
pub struct DwtUnit {
    arena: ComparatorArena<DwtComparator, MAX_DWT_COMPARATORS>,
    max_mask: u32,
}

impl DwtUnit {
    /// Pool with no comparators until [`DwtUnit::init`].
    pub const fn new() -> Self {
        Self {
            arena: ComparatorArena::new(),
            max_mask: 0,
        }
    }

    /// Discover NUMCOMP and the MASK limit, then disable every comparator.
    ///
    /// DEMCR.TRCENA must already be set or the DWT reads as zero.
    pub fn init<P: DebugPeripherals>(&mut self, p: &mut P) {
        let implemented = p.read_word(DWT_CTRL).wrapping_shr(DWT_CTRL_NUMCOMP_SHIFT);
        for index in 0..implemented {
            p.write_word(dwt_function(index), 0);
            p.write_word(dwt_comp(index), 0);
            p.write_word(dwt_mask(index), 0);
        }
        self.max_mask = if implemented == 0 {
            0
        } else {
            p.write_word(dwt_mask(0), DWT_MASK_PROBE);
            let max_mask = p.read_word(dwt_mask(0));
            p.write_word(dwt_mask(0), 0);
            max_mask
        };
        self.arena.set_capacity(implemented as usize);

        #[cfg(feature = "defmt")]
        defmt::debug!("DWT: {=u32} comparators, max mask {=u32}", implemented, self.max_mask);
    }

    /// Install a watchpoint, reusing an identical one. Returns the slot.
    ///
    /// # Errors
    ///
    /// - [`MonitorError::InvalidArgument`] on a bad size or alignment; no
    ///   register is written
    /// - [`MonitorError::ResourceExhausted`] with every comparator in use
    pub fn enable<P: DebugPeripherals>(
        &mut self,
        p: &mut P,
        address: u32,
        size: u32,
        kind: WatchpointKind,
    ) -> Result<usize, MonitorError> {
        let comparator = DwtComparator::encode(address, size, kind, self.max_mask)?;
        match self.arena.bind(comparator) {
            Some(SlotBinding::Allocated(slot)) => {
                let index = slot as u32;
                p.write_word(dwt_comp(index), comparator.address());
                p.write_word(dwt_mask(index), comparator.mask());
                // FUNCTION last: the comparator arms as soon as it is non-zero.
                p.write_word(dwt_function(index), comparator.function());
                Ok(slot)
            }
            Some(SlotBinding::Existing(slot)) => Ok(slot),
            None => {
                #[cfg(feature = "defmt")]
                defmt::warn!("DWT: no free comparator for {=u32:#x}", address);
                Err(MonitorError::ResourceExhausted)
            }
        }
    }

    /// Remove the watchpoint matching the request. Validation is identical
    /// to [`DwtUnit::enable`]; a valid request that matches nothing is a
    /// no-op (`Ok(None)`).
    pub fn disable<P: DebugPeripherals>(
        &mut self,
        p: &mut P,
        address: u32,
        size: u32,
        kind: WatchpointKind,
    ) -> Result<Option<usize>, MonitorError> {
        let comparator = DwtComparator::encode(address, size, kind, self.max_mask)?;
        let released = self.arena.release(&comparator);
        if let Some(slot) = released {
            let index = slot as u32;
            p.write_word(dwt_function(index), 0);
            p.write_word(dwt_comp(index), 0);
            p.write_word(dwt_mask(index), 0);
        }
        Ok(released)
    }

    /// Largest MASK value the hardware accepted at init.
    pub fn max_mask(&self) -> u32 {
        self.max_mask
    }

    /// Usable comparators.
    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Installed watchpoints.
    pub fn in_use(&self) -> usize {
        self.arena.in_use()
    }
}
