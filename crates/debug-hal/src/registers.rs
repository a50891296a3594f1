//! ARMv7-M debug register map
//!
//! Source: ARMv7-M Architecture Reference Manual (ARM DDI 0403E), chapters
//! C1 (Debug) and B3 (System Address Map).
//!
//! # Blocks used by the debug monitor
//!
//! | Block | Base          | Purpose                                        |
//! |-------|---------------|------------------------------------------------|
//! | DWT   | 0xE000_1000   | Data watchpoint comparators                    |
//! | FPB   | 0xE000_2000   | Flash patch / hardware breakpoint comparators  |
//! | SCB   | 0xE000_ED00   | Vector table, exception priorities, fault regs |
//! | DCB   | 0xE000_EDF0   | DEMCR monitor control                          |
//!
//! ## Write-one-to-clear
//! DFSR, CFSR and HFSR bits are cleared by writing the bit back as 1. Writing
//! the value that was read clears exactly the reported events.
//!
//! ## FPB revision
//! Only FPB revision 1 comparator encoding is produced here (COMP holds
//! address bits \[28:2\], so breakpoints are limited to the code region
//! below 0x2000_0000).

// ---------------------------------------------------------------------------
// DWT: Data Watchpoint and Trace
// ---------------------------------------------------------------------------

/// DWT control register. NUMCOMP lives in bits \[31:28\].
pub const DWT_CTRL: u32 = 0xE000_1000;

/// Bit offset of DWT_CTRL.NUMCOMP.
pub const DWT_CTRL_NUMCOMP_SHIFT: u32 = 28;

/// First DWT comparator register (`DWT_COMP0`).
pub const DWT_COMP0: u32 = 0xE000_1020;

/// Byte stride between consecutive comparator register groups.
pub const DWT_COMPARATOR_STRIDE: u32 = 0x10;

/// Offset of `DWT_MASKn` from `DWT_COMPn`.
pub const DWT_MASK_OFFSET: u32 = 0x4;

/// Offset of `DWT_FUNCTIONn` from `DWT_COMPn`.
pub const DWT_FUNCTION_OFFSET: u32 = 0x8;

/// Widest MASK field the architecture allows (5 bits).
///
/// Implementations may support fewer bits; writing this value and reading it
/// back reveals the supported maximum.
pub const DWT_MASK_PROBE: u32 = 0x1F;

/// FUNCTION encoding: watchpoint on read access.
pub const DWT_FUNCTION_READ: u32 = 0x5;

/// FUNCTION encoding: watchpoint on write access.
pub const DWT_FUNCTION_WRITE: u32 = 0x6;

/// FUNCTION encoding: watchpoint on read or write access.
pub const DWT_FUNCTION_READ_WRITE: u32 = 0x7;

/// Address of `DWT_COMPn`.
///
/// `index` is bounded by the 4-bit NUMCOMP field, so the result never
/// leaves the DWT block.
#[must_use]
pub const fn dwt_comp(index: u32) -> u32 {
    DWT_COMP0.wrapping_add(index.wrapping_mul(DWT_COMPARATOR_STRIDE))
}

/// Address of `DWT_MASKn`.
#[must_use]
pub const fn dwt_mask(index: u32) -> u32 {
    dwt_comp(index).wrapping_add(DWT_MASK_OFFSET)
}

/// Address of `DWT_FUNCTIONn`.
#[must_use]
pub const fn dwt_function(index: u32) -> u32 {
    dwt_comp(index).wrapping_add(DWT_FUNCTION_OFFSET)
}

// ---------------------------------------------------------------------------
// FPB: Flash Patch and Breakpoint
// ---------------------------------------------------------------------------

/// FPB control register.
pub const FP_CTRL: u32 = 0xE000_2000;

/// FP_CTRL.ENABLE (bit 0).
pub const FP_CTRL_ENABLE: u32 = 1 << 0;

/// FP_CTRL.KEY (bit 1): must be written as 1 for any FP_CTRL write to land.
pub const FP_CTRL_KEY: u32 = 1 << 1;

/// FP_CTRL.NUM_CODE low nibble: bits \[7:4\].
pub const FP_CTRL_NUM_CODE_LOW_MASK: u32 = 0xF << 4;

/// FP_CTRL.NUM_CODE high bits: bits \[14:12\].
pub const FP_CTRL_NUM_CODE_HIGH_MASK: u32 = 0x7 << 12;

/// First FPB comparator register (`FP_COMP0`).
pub const FP_COMP0: u32 = 0xE000_2008;

/// FP_COMPn.ENABLE (bit 0).
pub const FP_COMP_ENABLE: u32 = 1 << 0;

/// FP_COMPn.COMP field: address bits \[28:2\].
pub const FP_COMP_ADDRESS_MASK: u32 = 0x1FFF_FFFC;

/// FP_COMPn.REPLACE = 0b01: breakpoint on the lower halfword.
pub const FP_COMP_REPLACE_LOWER: u32 = 0x1 << 30;

/// FP_COMPn.REPLACE = 0b10: breakpoint on the upper halfword.
pub const FP_COMP_REPLACE_UPPER: u32 = 0x2 << 30;

/// FP_COMPn.REPLACE = 0b11: breakpoint on both halfwords.
pub const FP_COMP_REPLACE_BOTH: u32 = 0x3 << 30;

/// First address outside the region a revision 1 FPB comparator can match.
pub const FPB_CODE_REGION_END: u32 = 0x2000_0000;

/// Address of `FP_COMPn`.
#[must_use]
pub const fn fp_comp(index: u32) -> u32 {
    FP_COMP0.wrapping_add(index.wrapping_mul(4))
}

/// Decode FP_CTRL.NUM_CODE (split field: bits \[14:12\] are the high part).
#[must_use]
pub const fn fp_ctrl_num_code(fp_ctrl: u32) -> u32 {
    (fp_ctrl & FP_CTRL_NUM_CODE_LOW_MASK).wrapping_shr(4)
        | (fp_ctrl & FP_CTRL_NUM_CODE_HIGH_MASK).wrapping_shr(8)
}

// ---------------------------------------------------------------------------
// SCB: System Control Block
// ---------------------------------------------------------------------------

/// Vector Table Offset Register.
pub const SCB_VTOR: u32 = 0xE000_ED08;

/// System Handler Priority Register 2 (SVCall priority in byte 3).
pub const SCB_SHPR2: u32 = 0xE000_ED1C;

/// System Handler Priority Register 3
/// (DebugMonitor byte 0, PendSV byte 2, SysTick byte 3).
pub const SCB_SHPR3: u32 = 0xE000_ED20;

/// Configurable Fault Status Register (MMFSR | BFSR << 8 | UFSR << 16).
pub const SCB_CFSR: u32 = 0xE000_ED28;

/// HardFault Status Register.
pub const SCB_HFSR: u32 = 0xE000_ED2C;

/// Debug Fault Status Register.
pub const SCB_DFSR: u32 = 0xE000_ED30;

/// MemManage Fault Address Register.
pub const SCB_MMFAR: u32 = 0xE000_ED34;

/// BusFault Address Register.
pub const SCB_BFAR: u32 = 0xE000_ED38;

/// Byte offset of the SVCall handler inside the vector table (entry 11).
pub const VECTOR_SVCALL_OFFSET: u32 = 0x2C;

/// Bit position of the SVCall priority byte inside SHPR2.
pub const SHPR2_SVCALL_SHIFT: u32 = 24;

/// Bit position of the DebugMonitor priority byte inside SHPR3.
pub const SHPR3_DEBUGMON_SHIFT: u32 = 0;

/// Bit position of the PendSV priority byte inside SHPR3.
pub const SHPR3_PENDSV_SHIFT: u32 = 16;

/// Bit position of the SysTick priority byte inside SHPR3.
pub const SHPR3_SYSTICK_SHIFT: u32 = 24;

/// DFSR.HALTED (bit 0): halt request or step completed.
pub const DFSR_HALTED: u32 = 1 << 0;

/// DFSR.BKPT (bit 1): BKPT instruction or FPB match.
pub const DFSR_BKPT: u32 = 1 << 1;

/// DFSR.DWTTRAP (bit 2): DWT comparator match.
pub const DFSR_DWTTRAP: u32 = 1 << 2;

/// DFSR.EXTERNAL (bit 4): EDBGRQ asserted.
pub const DFSR_EXTERNAL: u32 = 1 << 4;

/// HFSR.VECTTBL (bit 1): vector table read fault.
pub const HFSR_VECTTBL: u32 = 1 << 1;

/// HFSR.FORCED (bit 30): escalated configurable fault.
pub const HFSR_FORCED: u32 = 1 << 30;

/// HFSR.DEBUGEVT (bit 31): debug event while debug disabled.
pub const HFSR_DEBUGEVT: u32 = 1 << 31;

// ---------------------------------------------------------------------------
// DCB: Debug Control Block
// ---------------------------------------------------------------------------

/// Debug Exception and Monitor Control Register.
pub const DCB_DEMCR: u32 = 0xE000_EDFC;

/// DEMCR.MON_EN (bit 16): enable the DebugMonitor exception.
pub const DEMCR_MON_EN: u32 = 1 << 16;

/// DEMCR.MON_PEND (bit 17): pend the DebugMonitor exception.
pub const DEMCR_MON_PEND: u32 = 1 << 17;

/// DEMCR.MON_STEP (bit 18): step one instruction on monitor return.
pub const DEMCR_MON_STEP: u32 = 1 << 18;

/// DEMCR.TRCENA (bit 24): power the DWT and ITM blocks.
pub const DEMCR_TRCENA: u32 = 1 << 24;

#[cfg(test)]
mod tests {
    use super::*;

    // ── Test A ──────────────────────────────────────────────────────────────
    // NUM_CODE is split across two fields; both parts must be combined.
    #[test]
    fn num_code_combines_split_field() {
        assert_eq!(fp_ctrl_num_code(0x0000_0060), 6);
        assert_eq!(fp_ctrl_num_code(0x0000_1000), 16);
        assert_eq!(fp_ctrl_num_code(0x0000_7FF0), 127);
        assert_eq!(fp_ctrl_num_code(FP_CTRL_KEY | FP_CTRL_ENABLE), 0);
    }

    // ── Test B ──────────────────────────────────────────────────────────────
    // Comparator register groups are laid out with the documented strides.
    #[test]
    fn comparator_addresses_follow_strides() {
        assert_eq!(fp_comp(0), 0xE000_2008);
        assert_eq!(fp_comp(5), 0xE000_201C);
        assert_eq!(dwt_comp(1), 0xE000_1030);
        assert_eq!(dwt_mask(1), 0xE000_1034);
        assert_eq!(dwt_function(3), 0xE000_1058);
    }

    // ── Test C ──────────────────────────────────────────────────────────────
    #[test]
    fn replace_encodings_are_distinct_two_bit_values() {
        assert_eq!(FP_COMP_REPLACE_LOWER | FP_COMP_REPLACE_UPPER, FP_COMP_REPLACE_BOTH);
        assert_eq!(FP_COMP_REPLACE_BOTH & FP_COMP_ADDRESS_MASK, 0);
    }
}
