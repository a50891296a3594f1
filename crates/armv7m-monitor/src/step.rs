//! Single-step controller
//!
//! # Why stepping needs more than DEMCR.MON_STEP
//!
//! MON_STEP makes the core re-enter the DebugMonitor after one instruction,
//! but any pending interrupt of higher priority than the interrupted code
//! is taken first, so "step" would land in an ISR. The controller therefore
//! raises BASEPRI to just below the DebugMonitor for the duration of the
//! step and restores it on the next entry.
//!
//! Two instructions break that scheme:
//!
//! - `SVC`: with BASEPRI raised above SVCall the SVC escalates to HardFault.
//!   Instead of stepping, a hardware breakpoint is placed on the SVCall
//!   handler and execution resumes normally. If no comparator is free the
//!   step runs unmasked.
//! - `MSR BASEPRI[_MAX]`: the stepped instruction writes BASEPRI itself, so
//!   restoring the old value afterwards would undo it. The priority is still
//!   raised but nothing is saved for restore.
//!
//! BASEPRI is only ever raised. When the DebugMonitor sits at the lowest
//! priority (task-aware builds) there is no level between it and thread
//! code, the elevated value scales to 0 and the program's own mask is left
//! as it is.
//!
//! # States
//!
//! ```text
//!            enable (not SVC)              entry cleanup
//!   Idle ───────────────────► SteppingMasked ─────────────► Idle
//!     │      enable (SVC)                     entry cleanup
//!     └──────────────────────► SteppingViaSvcBreakpoint ──► Idle
//! ```

use debug_hal::registers::{
    DCB_DEMCR, DEMCR_MON_STEP, SCB_SHPR3, SCB_VTOR, SHPR3_DEBUGMON_SHIFT, VECTOR_SVCALL_OFFSET,
};
use debug_hal::{DebugPeripherals, MemoryProbe};

use crate::comparators::FpbUnit;
use crate::config::MonitorConfig;
use crate::decode::{fetch_halfword, points_to_basepri_write, points_to_svc, InstructionWidth};
use crate::error::MonitorError;

/// Where a step request currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepState {
    /// No step in progress.
    #[default]
    Idle,
    /// MON_STEP armed. `restore_basepri` holds the value to put back, if
    /// the step raised BASEPRI over a value the program still owns.
    SteppingMasked {
        /// BASEPRI to restore on the next entry.
        restore_basepri: Option<u8>,
    },
    /// Breakpoint on the SVCall handler stands in for the step.
    SteppingViaSvcBreakpoint {
        /// Handler address (Thumb bit cleared).
        handler: u32,
        /// Width the breakpoint was encoded with.
        width: InstructionWidth,
        /// `false` when a user breakpoint was already on the handler; it is
        /// left in place by cleanup.
        owned: bool,
    },
}

/// Single-step state machine.
#[derive(Debug, Clone, Default)]
pub struct StepController {
    state: StepState,
}

impl StepController {
    /// Idle controller.
    pub const fn new() -> Self {
        Self {
            state: StepState::Idle,
        }
    }

    /// Current state.
    pub fn state(&self) -> StepState {
        self.state
    }

    /// `true` while a MON_STEP step is armed.
    ///
    /// Deliberately `false` in [`StepState::SteppingViaSvcBreakpoint`],
    /// although a step request is outstanding there. The substitution is not
    /// a hardware step and the stop it produces is reported as a breakpoint
    /// hit on the handler, so callers that treat "single stepping" as
    /// "MON_STEP will fire" must not see it. Use [`StepController::state`]
    /// to tell an idle controller from a pending SVC step.
    pub fn is_single_stepping(&self) -> bool {
        matches!(self.state, StepState::SteppingMasked { .. })
    }

    /// Arm a step of the instruction at `pc`.
    ///
    /// A step still armed from an earlier call is cleaned up first, so
    /// repeated requests never stack comparators or BASEPRI saves.
    pub fn enable<P, M>(
        &mut self,
        p: &mut P,
        probe: &mut M,
        fpb: &mut FpbUnit,
        config: &MonitorConfig,
        pc: u32,
    ) where
        P: DebugPeripherals,
        M: MemoryProbe,
    {
        if self.state != StepState::Idle {
            self.cleanup(p, fpb);
        }

        if !points_to_svc(probe, pc) {
            let current = p.basepri();
            let elevated = elevated_basepri(p, config);
            let restore_basepri = if masks_more(elevated, current) {
                p.set_basepri(elevated);
                if points_to_basepri_write(probe, pc) {
                    None
                } else {
                    Some(current)
                }
            } else {
                None
            };
            p.set_bits(DCB_DEMCR, DEMCR_MON_STEP);
            self.state = StepState::SteppingMasked { restore_basepri };
            return;
        }

        match install_svc_breakpoint(p, probe, fpb) {
            Ok(state) => self.state = state,
            Err(_e) => {
                // Raising BASEPRI would escalate the SVC to HardFault, so
                // step unmasked.
                #[cfg(feature = "defmt")]
                defmt::warn!("step over SVC: handler breakpoint failed ({}), stepping unmasked", _e);
                p.set_bits(DCB_DEMCR, DEMCR_MON_STEP);
                self.state = StepState::SteppingMasked {
                    restore_basepri: None,
                };
            }
        }
    }

    /// Undo whatever [`StepController::enable`] did and return to `Idle`.
    ///
    /// Runs on every debugger entry, stepping or not.
    pub fn cleanup<P: DebugPeripherals>(&mut self, p: &mut P, fpb: &mut FpbUnit) {
        match core::mem::take(&mut self.state) {
            StepState::SteppingMasked {
                restore_basepri: Some(basepri),
            } => p.set_basepri(basepri),
            StepState::SteppingViaSvcBreakpoint {
                handler,
                width,
                owned: true,
            } => {
                let _ = fpb.disable(p, handler, width);
            }
            _ => {}
        }
        p.clear_bits(DCB_DEMCR, DEMCR_MON_STEP);
    }
}

/// BASEPRI value that masks everything except the DebugMonitor.
fn elevated_basepri<P: DebugPeripherals>(p: &mut P, config: &MonitorConfig) -> u8 {
    let shpr3 = p.read_word(SCB_SHPR3);
    let monitor_byte = (shpr3.wrapping_shr(SHPR3_DEBUGMON_SHIFT) & 0xFF) as u8;
    let monitor_priority = config.logical_priority(monitor_byte);
    config.scale_priority(monitor_priority.wrapping_add(1))
}

/// `true` when writing `elevated` to BASEPRI masks strictly more than
/// `current` does. 0 disables masking, lower non-zero values mask more.
const fn masks_more(elevated: u8, current: u8) -> bool {
    elevated != 0 && (current == 0 || elevated < current)
}

/// SVCall handler entry from the active vector table, Thumb bit cleared.
pub(crate) fn svc_handler_address<P: DebugPeripherals>(p: &mut P) -> u32 {
    let vtor = p.read_word(SCB_VTOR);
    p.read_word(vtor.wrapping_add(VECTOR_SVCALL_OFFSET)) & !1
}

fn install_svc_breakpoint<P, M>(
    p: &mut P,
    probe: &mut M,
    fpb: &mut FpbUnit,
) -> Result<StepState, MonitorError>
where
    P: DebugPeripherals,
    M: MemoryProbe,
{
    let handler = svc_handler_address(p);
    let width = InstructionWidth::of(fetch_halfword(probe, handler)?);
    let owned = !fpb.is_set(handler, width);
    fpb.enable(p, handler, width)?;
    Ok(StepState::SteppingViaSvcBreakpoint {
        handler,
        width,
        owned,
    })
}
