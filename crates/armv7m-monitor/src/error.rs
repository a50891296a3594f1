//! Monitor error type

use debug_hal::{BufferError, MemoryFault};

/// Errors reported to the protocol layer.
///
/// Every failing operation leaves hardware untouched, so the caller only has
/// to translate the variant into an `E` reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MonitorError {
    /// Unsupported kind, misaligned or out-of-range address, bad size,
    /// unknown watchpoint type or register index.
    InvalidArgument,
    /// Every comparator of the required pool is in use.
    ResourceExhausted,
    /// An instruction fetch on behalf of the debugger faulted.
    MemoryFault,
    /// The packet buffer overran or held a non-hex character.
    Buffer(BufferError),
}

#[cfg(feature = "std")]
impl std::error::Error for MonitorError {}

impl core::fmt::Display for MonitorError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidArgument => write!(f, "Invalid argument"),
            Self::ResourceExhausted => write!(f, "Hardware comparators exhausted"),
            Self::MemoryFault => write!(f, "Memory fault during debugger access"),
            Self::Buffer(e) => write!(f, "Buffer error: {e}"),
        }
    }
}

impl From<MemoryFault> for MonitorError {
    fn from(_: MemoryFault) -> Self {
        Self::MemoryFault
    }
}

impl From<BufferError> for MonitorError {
    fn from(e: BufferError) -> Self {
        Self::Buffer(e)
    }
}
