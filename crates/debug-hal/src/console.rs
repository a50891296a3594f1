//! Debugger console output

use core::fmt::Write as _;

/// Text sink for diagnostics shown in the attached debugger.
///
/// The protocol layer usually wraps this in `O` (console output) packets.
pub trait Console {
    /// Write `text` verbatim.
    fn write_str(&mut self, text: &str);

    /// Write `value` as `0x` followed by eight lowercase hex digits.
    fn write_hex(&mut self, value: u32) {
        let mut text: heapless::String<10> = heapless::String::new();
        // "0x" + 8 digits is exactly the capacity; formatting cannot overflow.
        let _ = write!(text, "0x{value:08x}");
        self.write_str(&text);
    }
}
