//! Micromap descriptor records
//!
//! The descriptor array is an external binary contract: 8-byte records of
//! `{ offset: u32, format_and_level: u32 }`, where the high 16 bits of the
//! second word hold the format and the low 16 bits hold the subdivision level.

use bytemuck::{Pod, Zeroable};

use crate::{DecodeError, OmmFormat, MAX_SUBDIVISION_LEVEL};

/// Raw descriptor record as stored in the descriptor buffer
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct OmmDescriptorRecord {
    /// Byte offset of the micromap's states, relative to the state array start
    pub offset: u32,
    /// Format in the high halfword, subdivision level in the low halfword
    pub format_and_level: u32,
}

impl OmmDescriptorRecord {
    /// Size of one record in bytes
    pub const SIZE: u32 = 8;
}

/// A validated micromap descriptor
///
/// Many primitives may reference the same descriptor when their micromaps
/// are identical.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OmmDescriptor {
    /// Byte offset of the micromap's states, relative to the state array start
    pub byte_offset: u32,
    /// State packing
    pub format: OmmFormat,
    /// Subdivision level, at most [`MAX_SUBDIVISION_LEVEL`]
    pub subdivision_level: u16,
}

impl OmmDescriptor {
    /// Create a new descriptor
    pub fn new(byte_offset: u32, format: OmmFormat, subdivision_level: u16) -> Self {
        Self {
            byte_offset,
            format,
            subdivision_level,
        }
    }

    /// Validate and decode a raw record
    pub fn from_record(record: OmmDescriptorRecord) -> Result<Self, DecodeError> {
        let raw_format = record.format_and_level >> 16;
        let level = record.format_and_level & 0xffff;
        let format = OmmFormat::from_raw(raw_format).ok_or(DecodeError::InvalidFormat { raw: raw_format })?;
        if level > MAX_SUBDIVISION_LEVEL {
            return Err(DecodeError::SubdivisionLevelTooHigh { level });
        }
        Ok(Self {
            byte_offset: record.offset,
            format,
            subdivision_level: level as u16,
        })
    }

    /// Encode as a raw record
    pub fn to_record(&self) -> OmmDescriptorRecord {
        OmmDescriptorRecord {
            offset: self.byte_offset,
            format_and_level: (self.format.raw() << 16) | self.subdivision_level as u32,
        }
    }

    /// Bytes of state data this micromap occupies
    pub fn array_data_size(&self) -> u32 {
        self.format.array_data_size(self.subdivision_level as u32)
    }
}
