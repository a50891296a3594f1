//! Register context: one flat register index space over split storage
//!
//! On exception entry the core pushes part of the register file onto the
//! interrupted stack (the *frame*); the entry glue saves the rest into
//! session-owned storage. GDB sees a single ordered register list, so every
//! logical index is mapped to exactly one word of one of the two fragments.
//!
//! # Frame layout (ARMv7-M ARM §B1.5.6)
//!
//! ```text
//! basic:    R0 R1 R2 R3 R12 LR PC xPSR
//! extended: ... S0-S15 FPSCR (reserved)          [fpu]
//! ```
//!
//! # Saved layout
//!
//! ```text
//! R4-R11 SP  MSP PSP PRIMASK BASEPRI FAULTMASK CONTROL  S16-S31
//!            └──────── not task-aware ──────────┘       └ fpu ┘
//! ```
//!
//! The index → slot table is computed at compile time and never changes.

use crate::error::MonitorError;

/// R0 index.
pub const R0: usize = 0;
/// R1 index.
pub const R1: usize = 1;
/// R2 index.
pub const R2: usize = 2;
/// R3 index.
pub const R3: usize = 3;
/// R7 (Thumb frame pointer) index.
pub const R7: usize = 7;
/// R12 index.
pub const R12: usize = 12;
/// Stack pointer index.
pub const SP: usize = 13;
/// Link register index.
pub const LR: usize = 14;
/// Program counter index.
pub const PC: usize = 15;
/// Program status register index.
pub const XPSR: usize = 16;

const CORE_COUNT: usize = 17;

#[cfg(not(feature = "task-aware"))]
const SYSTEM_COUNT: usize = 6;
#[cfg(feature = "task-aware")]
const SYSTEM_COUNT: usize = 0;

/// MSP index.
#[cfg(not(feature = "task-aware"))]
pub const MSP: usize = CORE_COUNT;
/// PSP index.
#[cfg(not(feature = "task-aware"))]
pub const PSP: usize = CORE_COUNT + 1;
/// PRIMASK index.
#[cfg(not(feature = "task-aware"))]
pub const PRIMASK: usize = CORE_COUNT + 2;
/// BASEPRI index.
#[cfg(not(feature = "task-aware"))]
pub const BASEPRI: usize = CORE_COUNT + 3;
/// FAULTMASK index.
#[cfg(not(feature = "task-aware"))]
pub const FAULTMASK: usize = CORE_COUNT + 4;
/// CONTROL index.
#[cfg(not(feature = "task-aware"))]
pub const CONTROL: usize = CORE_COUNT + 5;

#[cfg(feature = "fpu")]
const FPU_COUNT: usize = 33;
#[cfg(not(feature = "fpu"))]
const FPU_COUNT: usize = 0;

// S16-S31 are not stacked by hardware.
#[cfg(feature = "fpu")]
const FPU_SAVED_COUNT: usize = 16;
#[cfg(not(feature = "fpu"))]
const FPU_SAVED_COUNT: usize = 0;

/// S0 index (S0-S31 are consecutive; the wire shows them as D0-D15).
#[cfg(feature = "fpu")]
pub const S0: usize = CORE_COUNT + SYSTEM_COUNT;
/// FPSCR index.
#[cfg(feature = "fpu")]
pub const FPSCR: usize = S0 + 32;

/// Number of logical registers in this build.
pub const REGISTER_COUNT: usize = CORE_COUNT + SYSTEM_COUNT + FPU_COUNT;

/// Words in the hardware-stacked exception frame.
#[cfg(not(feature = "fpu"))]
pub const FRAME_WORDS: usize = 8;
/// Words in the hardware-stacked exception frame (extended, with FP state).
#[cfg(feature = "fpu")]
pub const FRAME_WORDS: usize = 26;

const SAVED_WORDS: usize = 9 + SYSTEM_COUNT + FPU_SAVED_COUNT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Frame(usize),
    Saved(usize),
}

#[allow(clippy::arithmetic_side_effects)] // const-evaluated; indices bounded by REGISTER_COUNT
const fn slot_of(index: usize) -> Slot {
    match index {
        0..=3 => Slot::Frame(index),
        4..=11 => Slot::Saved(index - 4),
        R12 => Slot::Frame(4),
        SP => Slot::Saved(8),
        LR => Slot::Frame(5),
        PC => Slot::Frame(6),
        XPSR => Slot::Frame(7),
        _ if index < CORE_COUNT + SYSTEM_COUNT => Slot::Saved(9 + index - CORE_COUNT),
        _ => {
            // Floating point block: S0-S15 and FPSCR are stacked, S16-S31 saved.
            let fp = index - CORE_COUNT - SYSTEM_COUNT;
            if fp < 16 {
                Slot::Frame(8 + fp)
            } else if fp < 32 {
                Slot::Saved(9 + SYSTEM_COUNT + fp - 16)
            } else {
                Slot::Frame(24)
            }
        }
    }
}

#[allow(clippy::indexing_slicing, clippy::arithmetic_side_effects)] // const-evaluated
const fn build_map() -> [Slot; REGISTER_COUNT] {
    let mut map = [Slot::Frame(0); REGISTER_COUNT];
    let mut i = 0;
    while i < REGISTER_COUNT {
        map[i] = slot_of(i);
        i += 1;
    }
    map
}

static SLOT_MAP: [Slot; REGISTER_COUNT] = build_map();

/// Logically indexed register file of the interrupted program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterContext {
    frame: [u32; FRAME_WORDS],
    saved: [u32; SAVED_WORDS],
}

impl RegisterContext {
    /// All-zero context.
    pub const fn new() -> Self {
        Self {
            frame: [0; FRAME_WORDS],
            saved: [0; SAVED_WORDS],
        }
    }

    /// Number of logical registers.
    pub const fn count(&self) -> usize {
        REGISTER_COUNT
    }

    /// Value of register `index`, or `None` past [`RegisterContext::count`].
    pub fn get(&self, index: usize) -> Option<u32> {
        match SLOT_MAP.get(index)? {
            Slot::Frame(word) => self.frame.get(*word).copied(),
            Slot::Saved(word) => self.saved.get(*word).copied(),
        }
    }

    /// Overwrite register `index`.
    pub fn set(&mut self, index: usize, value: u32) -> Result<(), MonitorError> {
        let word = match SLOT_MAP.get(index).ok_or(MonitorError::InvalidArgument)? {
            Slot::Frame(word) => self.frame.get_mut(*word),
            Slot::Saved(word) => self.saved.get_mut(*word),
        };
        *word.ok_or(MonitorError::InvalidArgument)? = value;
        Ok(())
    }

    /// Copy the stacked exception frame in. Extra words are ignored; missing
    /// words keep their previous value.
    pub fn load_frame(&mut self, stacked: &[u32]) {
        for (dst, src) in self.frame.iter_mut().zip(stacked) {
            *dst = *src;
        }
    }

    /// Copy the frame fragment back out so the core unstacks any edits.
    pub fn store_frame(&self, stacked: &mut [u32]) {
        for (dst, src) in stacked.iter_mut().zip(&self.frame) {
            *dst = *src;
        }
    }

    /// Program counter.
    pub fn pc(&self) -> u32 {
        self.get(PC).unwrap_or(0)
    }

    /// Overwrite the program counter.
    pub fn set_pc(&mut self, value: u32) {
        let _ = self.set(PC, value);
    }

    /// Stack pointer of the interrupted code.
    pub fn sp(&self) -> u32 {
        self.get(SP).unwrap_or(0)
    }

    /// Link register.
    pub fn lr(&self) -> u32 {
        self.get(LR).unwrap_or(0)
    }

    /// Argument/result register `n` (R0-R3); zero for any other `n`.
    pub fn argument(&self, n: usize) -> u32 {
        if n > R3 {
            return 0;
        }
        self.get(n).unwrap_or(0)
    }

    /// Overwrite R0 (semihost and call return value).
    pub fn set_r0(&mut self, value: u32) {
        let _ = self.set(R0, value);
    }
}

impl Default for RegisterContext {
    fn default() -> Self {
        Self::new()
    }
}
