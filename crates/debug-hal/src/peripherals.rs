//! Debug peripheral access
//!
//! The monitor touches the SCB, DCB, FPB and DWT blocks only through this
//! trait. The `hardware` backend in `armv7m-monitor` implements it with
//! volatile MMIO; [`crate::mocks::MockPeripherals`] implements it for host
//! tests.

/// Word-granular access to the memory-mapped debug registers plus the
/// BASEPRI core register.
pub trait DebugPeripherals {
    /// Read the 32-bit register at `address`.
    fn read_word(&mut self, address: u32) -> u32;

    /// Write `value` to the 32-bit register at `address`.
    fn write_word(&mut self, address: u32, value: u32);

    /// Current BASEPRI value.
    fn basepri(&self) -> u8;

    /// Set BASEPRI. Zero disables priority masking.
    fn set_basepri(&mut self, value: u8);

    /// Set the bits of `mask` in the register at `address`.
    fn set_bits(&mut self, address: u32, mask: u32) {
        let value = self.read_word(address);
        self.write_word(address, value | mask);
    }

    /// Clear the bits of `mask` in the register at `address`.
    fn clear_bits(&mut self, address: u32, mask: u32) {
        let value = self.read_word(address);
        self.write_word(address, value & !mask);
    }

    /// Replace one priority byte of a SHPRn register, leaving the other
    /// three untouched.
    ///
    /// `shift` is the bit position of the byte (0, 8, 16 or 24).
    fn write_priority_byte(&mut self, address: u32, shift: u32, priority: u8) {
        let mask = 0xFFu32.wrapping_shl(shift);
        let value = self.read_word(address) & !mask;
        self.write_word(address, value | u32::from(priority).wrapping_shl(shift));
    }
}
