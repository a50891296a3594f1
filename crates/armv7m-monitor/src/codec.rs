//! Register context ↔ GDB hex text
//!
//! Every register travels as four bytes, least significant first, each byte
//! as two lowercase hex digits. `g`/`G` packets carry all registers in index
//! order; the stop reply (`T` packet) carries only the registers GDB needs to
//! unwind the stack as `nn:vvvvvvvv;` pairs.

use debug_hal::HexBuffer;

use crate::context::{RegisterContext, LR, PC, R7, SP, REGISTER_COUNT};
use crate::error::MonitorError;

/// Registers expedited in a stop reply: frame pointer, SP, LR, PC.
pub const STOP_REGISTERS: [usize; 4] = [R7, SP, LR, PC];

fn write_word<B: HexBuffer>(buffer: &mut B, value: u32) -> Result<(), MonitorError> {
    for byte in value.to_le_bytes() {
        buffer.write_byte_as_hex(byte)?;
    }
    Ok(())
}

fn read_word<B: HexBuffer>(buffer: &mut B) -> Result<u32, MonitorError> {
    let mut bytes = [0u8; 4];
    for byte in &mut bytes {
        *byte = buffer.read_byte_as_hex()?;
    }
    Ok(u32::from_le_bytes(bytes))
}

/// Append `nn:vvvvvvvv;` for each of [`STOP_REGISTERS`].
pub fn write_stop_registers<B: HexBuffer>(
    context: &RegisterContext,
    buffer: &mut B,
) -> Result<(), MonitorError> {
    for index in STOP_REGISTERS {
        let number = u8::try_from(index).map_err(|_| MonitorError::InvalidArgument)?;
        buffer.write_byte_as_hex(number)?;
        buffer.write_char(b':')?;
        write_word(buffer, context.get(index).unwrap_or(0))?;
        buffer.write_char(b';')?;
    }
    Ok(())
}

/// Append every register, in index order (`g` reply).
pub fn write_context<B: HexBuffer>(
    context: &RegisterContext,
    buffer: &mut B,
) -> Result<(), MonitorError> {
    for index in 0..context.count() {
        write_word(buffer, context.get(index).unwrap_or(0))?;
    }
    Ok(())
}

/// Decode every register from `buffer` (`G` request).
///
/// The context is only updated once the whole packet has decoded, so a
/// short or malformed packet leaves it untouched.
pub fn read_context<B: HexBuffer>(
    context: &mut RegisterContext,
    buffer: &mut B,
) -> Result<(), MonitorError> {
    let mut values = [0u32; REGISTER_COUNT];
    for value in &mut values {
        *value = read_word(buffer)?;
    }
    for (index, value) in values.into_iter().enumerate() {
        context.set(index, value)?;
    }
    Ok(())
}
