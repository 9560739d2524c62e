//! Per-primitive index resolution
//!
//! Each primitive has one entry in the OMM index buffer. The entry is either
//! the index of a descriptor or one of four reserved codes at the top of the
//! value range meaning "the whole primitive has this state".

use micromap_core::{load_u32, DecodeError, OmmIndexFormat, OpacityState};

/// Number of reserved special codes per index format
const SPECIAL_CODE_COUNT: u32 = 4;

/// Result of resolving a primitive's index entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OmmIndex {
    /// Index into the descriptor array
    Descriptor(u32),
    /// The whole primitive has a single state; no descriptor lookup needed
    Special(OpacityState),
}

/// Resolve a primitive's entry in the OMM index buffer
///
/// 16-bit entries are packed two per little-endian 32-bit word, even
/// primitives in the low half. Special codes count down from the top of the
/// value range: all ones is state 0, all ones minus three is state 3.
#[inline]
pub fn resolve(
    index_buffer: &[u8],
    index_buffer_offset: u32,
    primitive_index: u32,
    format: OmmIndexFormat,
) -> Result<OmmIndex, DecodeError> {
    let (word_index, shift, all_ones) = match format {
        OmmIndexFormat::Uint16 => (primitive_index >> 1, (primitive_index & 1) * 16, 0xffff),
        OmmIndexFormat::Uint32 => (primitive_index, 0, u32::MAX),
    };
    let byte_offset = index_buffer_offset as u64 + 4 * word_index as u64;
    let word = load_u32(index_buffer, byte_offset).ok_or(DecodeError::IndexOutOfBounds {
        primitive: primitive_index,
        byte_offset,
    })?;
    let raw = (word >> shift) & all_ones;
    Ok(interpret(raw, all_ones))
}

#[inline]
fn interpret(raw: u32, all_ones: u32) -> OmmIndex {
    if raw > all_ones - SPECIAL_CODE_COUNT {
        OmmIndex::Special(OpacityState::from_bits(all_ones - raw))
    } else {
        OmmIndex::Descriptor(raw)
    }
}
