//! Hex-pair packet buffer
//!
//! GDB remote serial protocol payloads carry binary data as pairs of ASCII
//! hex digits. The monitor writes register values into, and decodes them
//! out of, a fixed-capacity buffer owned by the debug session.
//!
//! Encoding is always lowercase; decoding accepts either case.

/// Packet buffer errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BufferError {
    /// Write past capacity or read past the end of the data.
    Overrun,
    /// A character that is not a hex digit was found where one was expected.
    InvalidHexDigit,
}

#[cfg(feature = "std")]
impl std::error::Error for BufferError {}

impl core::fmt::Display for BufferError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Overrun => write!(f, "Packet buffer overrun"),
            Self::InvalidHexDigit => write!(f, "Invalid hex digit in packet"),
        }
    }
}

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

fn nibble_to_hex(nibble: u8) -> u8 {
    HEX_DIGITS.get(usize::from(nibble & 0xF)).copied().unwrap_or(b'0')
}

fn hex_to_nibble(c: u8) -> Result<u8, BufferError> {
    match c {
        b'0'..=b'9' => Ok(c.wrapping_sub(b'0')),
        b'a'..=b'f' => Ok(c.wrapping_sub(b'a').wrapping_add(10)),
        b'A'..=b'F' => Ok(c.wrapping_sub(b'A').wrapping_add(10)),
        _ => Err(BufferError::InvalidHexDigit),
    }
}

/// Character stream with hex-pair helpers.
pub trait HexBuffer {
    /// Append one raw character.
    fn write_char(&mut self, c: u8) -> Result<(), BufferError>;

    /// Consume one raw character.
    fn read_char(&mut self) -> Result<u8, BufferError>;

    /// Append `byte` as two lowercase hex digits.
    fn write_byte_as_hex(&mut self, byte: u8) -> Result<(), BufferError> {
        self.write_char(nibble_to_hex(byte.wrapping_shr(4)))?;
        self.write_char(nibble_to_hex(byte))
    }

    /// Consume two hex digits and return the byte they encode.
    fn read_byte_as_hex(&mut self) -> Result<u8, BufferError> {
        let high = hex_to_nibble(self.read_char()?)?;
        let low = hex_to_nibble(self.read_char()?)?;
        Ok(high.wrapping_shl(4) | low)
    }

    /// Append every byte of `text`.
    fn write_str(&mut self, text: &str) -> Result<(), BufferError> {
        text.bytes().try_for_each(|c| self.write_char(c))
    }
}

/// Fixed-capacity packet buffer with an independent read cursor.
#[derive(Debug, Clone)]
pub struct PacketBuffer<const N: usize> {
    data: heapless::Vec<u8, N>,
    cursor: usize,
}

impl<const N: usize> PacketBuffer<N> {
    /// Create an empty buffer.
    pub const fn new() -> Self {
        Self {
            data: heapless::Vec::new(),
            cursor: 0,
        }
    }

    /// Create a buffer holding `bytes`, positioned at the start.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BufferError> {
        let data = heapless::Vec::from_slice(bytes).map_err(|_| BufferError::Overrun)?;
        Ok(Self { data, cursor: 0 })
    }

    /// Everything written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Number of characters held.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// `true` when nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Characters not yet consumed by reads.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.cursor)
    }

    /// Drop all content and rewind the read cursor.
    pub fn clear(&mut self) {
        self.data.clear();
        self.cursor = 0;
    }

    /// Rewind the read cursor to the first character.
    pub fn reset_read(&mut self) {
        self.cursor = 0;
    }

    /// Replace the content with `bytes`, rewinding the read cursor.
    pub fn load(&mut self, bytes: &[u8]) -> Result<(), BufferError> {
        self.clear();
        self.data
            .extend_from_slice(bytes)
            .map_err(|_| BufferError::Overrun)
    }
}

impl<const N: usize> Default for PacketBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> HexBuffer for PacketBuffer<N> {
    fn write_char(&mut self, c: u8) -> Result<(), BufferError> {
        self.data.push(c).map_err(|_| BufferError::Overrun)
    }

    fn read_char(&mut self) -> Result<u8, BufferError> {
        let c = self.data.get(self.cursor).copied().ok_or(BufferError::Overrun)?;
        self.cursor = self.cursor.saturating_add(1);
        Ok(c)
    }
}
