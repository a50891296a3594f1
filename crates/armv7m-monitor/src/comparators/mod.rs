//! Hardware comparator pools
//!
//! The FPB and DWT each expose a small, fixed number of comparators whose
//! count is only known at run time (FP_CTRL.NUM_CODE, DWT_CTRL.NUMCOMP).
//! Both pools share the same bookkeeping:
//!
//! - a slot is free or bound to exactly one encoded value
//! - allocation is first-fit
//! - binding a value that is already bound returns the existing slot, so a
//!   repeated `Z` packet is idempotent
//! - release looks up the slot by recomputing the same encoding
//!
//! [`ComparatorArena`] is that bookkeeping; [`fpb`] and [`dwt`] turn
//! requests into encodings and mirror slot changes into the registers.

pub mod dwt;
pub mod fpb;

pub use dwt::{DwtComparator, DwtUnit, WatchpointKind};
pub use fpb::{FpbComparator, FpbUnit};

/// Result of [`ComparatorArena::bind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlotBinding {
    /// A free slot was claimed; hardware must be programmed.
    Allocated(usize),
    /// The value was already bound to this slot; hardware is up to date.
    Existing(usize),
}

impl SlotBinding {
    /// Slot index regardless of how it was obtained.
    pub const fn slot(self) -> usize {
        match self {
            Self::Allocated(slot) | Self::Existing(slot) => slot,
        }
    }
}

/// Fixed-capacity first-fit arena of comparator encodings.
///
/// `N` is the compile-time upper bound; [`ComparatorArena::set_capacity`]
/// clamps the usable prefix to what the hardware reports.
#[derive(Debug, Clone)]
pub struct ComparatorArena<T, const N: usize> {
    slots: [Option<T>; N],
    capacity: usize,
}

impl<T: Copy + PartialEq, const N: usize> ComparatorArena<T, N> {
    /// Arena with no usable slots until [`ComparatorArena::set_capacity`].
    pub const fn new() -> Self {
        Self {
            slots: [None; N],
            capacity: 0,
        }
    }

    /// Use the first `count` slots (clamped to `N`) and free all of them.
    pub fn set_capacity(&mut self, count: usize) {
        self.capacity = count.min(N);
        self.slots = [None; N];
    }

    /// Number of usable slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of bound slots.
    pub fn in_use(&self) -> usize {
        self.usable().iter().filter(|slot| slot.is_some()).count()
    }

    /// Slot currently bound to `value`.
    pub fn find(&self, value: &T) -> Option<usize> {
        self.usable().iter().position(|slot| slot.as_ref() == Some(value))
    }

    /// First unbound slot.
    pub fn find_free(&self) -> Option<usize> {
        self.usable().iter().position(Option::is_none)
    }

    /// Value bound to `slot`.
    pub fn get(&self, slot: usize) -> Option<T> {
        self.usable().get(slot).copied().flatten()
    }

    /// Bind `value`, reusing an identical binding. `None` when full.
    pub fn bind(&mut self, value: T) -> Option<SlotBinding> {
        if let Some(slot) = self.find(&value) {
            return Some(SlotBinding::Existing(slot));
        }
        let slot = self.find_free()?;
        *self.slots.get_mut(slot)? = Some(value);
        Some(SlotBinding::Allocated(slot))
    }

    /// Unbind `value`, returning the slot it occupied.
    pub fn release(&mut self, value: &T) -> Option<usize> {
        let slot = self.find(value)?;
        *self.slots.get_mut(slot)? = None;
        Some(slot)
    }

    fn usable(&self) -> &[Option<T>] {
        self.slots.get(..self.capacity).unwrap_or(&[])
    }
}

impl<T: Copy + PartialEq, const N: usize> Default for ComparatorArena<T, N> {
    fn default() -> Self {
        Self::new()
    }
}
