//! Micromap formats and build flags

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Packing of the per micro-triangle state array
#[repr(u16)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OmmFormat {
    /// One bit per micro-triangle: transparent or opaque
    #[default]
    Oc1TwoState = 1,
    /// Two bits per micro-triangle: all four opacity states
    Oc2FourState = 2,
}

impl OmmFormat {
    /// Parse the format field of a descriptor record
    #[inline]
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            1 => Some(OmmFormat::Oc1TwoState),
            2 => Some(OmmFormat::Oc2FourState),
            _ => None,
        }
    }

    /// Value stored in the descriptor record
    #[inline]
    pub const fn raw(self) -> u32 {
        self as u32
    }

    /// Bits used per micro-triangle state
    #[inline]
    pub const fn bits_per_state(self) -> u32 {
        match self {
            OmmFormat::Oc1TwoState => 1,
            OmmFormat::Oc2FourState => 2,
        }
    }

    /// Bytes of state data for one micromap at `level`, rounded up to whole words
    pub const fn array_data_size(self, level: u32) -> u32 {
        let bits = self.bits_per_state() << (2 * level);
        bits.div_ceil(32) * 4
    }
}

/// Width of the per-primitive entries of the OMM index buffer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OmmIndexFormat {
    /// Two entries packed per 32-bit word
    #[default]
    Uint16,
    /// One entry per 32-bit word
    Uint32,
}

impl OmmIndexFormat {
    /// Bytes per index entry
    #[inline]
    pub const fn stride(self) -> u32 {
        match self {
            OmmIndexFormat::Uint16 => 2,
            OmmIndexFormat::Uint32 => 4,
        }
    }

    /// Largest value that is not a special index code
    #[inline]
    pub const fn max_descriptor_index(self) -> u32 {
        match self {
            OmmIndexFormat::Uint16 => 0xfffb,
            OmmIndexFormat::Uint32 => 0xffff_fffb,
        }
    }

    /// Index value meaning "the whole primitive has this state"
    ///
    /// Codes count down from the top of the value range:
    /// all ones is transparent, all ones minus three is unknown-opaque.
    #[inline]
    pub const fn special_code(self, state: crate::OpacityState) -> u32 {
        let all_ones = match self {
            OmmIndexFormat::Uint16 => 0xffff,
            OmmIndexFormat::Uint32 => 0xffff_ffff,
        };
        all_ones - state as u32
    }
}

bitflags! {
    /// Build preferences for a micromap array
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct MicromapBuildFlags: u8 {
        /// Optimise for traversal speed
        const FAST_TRACE = 1 << 0;
        /// Optimise for build speed
        const FAST_BUILD = 1 << 1;
    }
}
