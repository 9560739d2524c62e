//! Descriptor loading and per micro-triangle state decoding

use micromap_core::{
    load_u32, DecodeError, OmmDescriptor, OmmDescriptorRecord, OmmFormat, OpacityState,
    MAX_SUBDIVISION_LEVEL,
};

/// Load and validate descriptor `index` from a descriptor array
///
/// `descriptor_offset` is the byte offset of the geometry's first record.
#[inline]
pub fn load_descriptor(descriptors: &[u8], descriptor_offset: u32, index: u32) -> Result<OmmDescriptor, DecodeError> {
    let byte_offset = descriptor_offset as u64 + OmmDescriptorRecord::SIZE as u64 * index as u64;
    let out_of_bounds = DecodeError::DescriptorOutOfBounds { index, byte_offset };
    let offset = load_u32(descriptors, byte_offset).ok_or(out_of_bounds)?;
    let format_and_level = load_u32(descriptors, byte_offset + 4).ok_or(out_of_bounds)?;
    OmmDescriptor::from_record(OmmDescriptorRecord {
        offset,
        format_and_level,
    })
}

/// Decode the state of one micro-triangle
///
/// States are packed LSB-first into little-endian 32-bit words: 32 states per
/// word for OC1 and 16 for OC2. The word lives at
/// `state_offset + descriptor.byte_offset + 4 * word_index`.
///
/// An OC1 micromap only ever yields [`OpacityState::Transparent`] or
/// [`OpacityState::Opaque`].
#[inline]
pub fn decode_state(
    descriptor: &OmmDescriptor,
    micro_triangle_index: u32,
    states: &[u8],
    state_offset: u32,
) -> Result<OpacityState, DecodeError> {
    let level = descriptor.subdivision_level as u32;
    if level > MAX_SUBDIVISION_LEVEL {
        return Err(DecodeError::SubdivisionLevelTooHigh { level });
    }

    // log2 of states per word
    let word_shift = match descriptor.format {
        OmmFormat::Oc1TwoState => 5,
        OmmFormat::Oc2FourState => 4,
    };
    let bits = descriptor.format.bits_per_state();
    let state_mask = (1 << bits) - 1;

    let byte_offset = state_offset as u64
        + descriptor.byte_offset as u64
        + 4 * (micro_triangle_index >> word_shift) as u64;
    let word = load_u32(states, byte_offset).ok_or(DecodeError::StateOutOfBounds { byte_offset })?;

    let bit = (micro_triangle_index & ((1 << word_shift) - 1)) * bits;
    Ok(OpacityState::from_bits((word >> bit) & state_mask))
}
