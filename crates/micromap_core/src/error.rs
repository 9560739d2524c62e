//! Query-path error types
//!
//! Everything here is `Copy` so the decode functions can report failures
//! without allocating.

use thiserror::Error;

/// Error raised while resolving or decoding micromap data
///
/// Any of these indicates a corrupted or untrusted buffer, or a caller
/// passing a level outside the supported range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Subdivision level above [`crate::MAX_SUBDIVISION_LEVEL`]
    #[error("subdivision level {level} exceeds the supported maximum")]
    SubdivisionLevelTooHigh { level: u32 },
    /// Descriptor format field is neither OC1 nor OC2
    #[error("invalid micromap format {raw}")]
    InvalidFormat { raw: u32 },
    /// Index buffer entry for a primitive lies outside the buffer
    #[error("index entry of primitive {primitive} at byte {byte_offset} is out of bounds")]
    IndexOutOfBounds { primitive: u32, byte_offset: u64 },
    /// Descriptor record lies outside the descriptor buffer
    #[error("descriptor {index} at byte {byte_offset} is out of bounds")]
    DescriptorOutOfBounds { index: u32, byte_offset: u64 },
    /// Packed state word lies outside the state buffer
    #[error("state word at byte {byte_offset} is out of bounds")]
    StateOutOfBounds { byte_offset: u64 },
}
