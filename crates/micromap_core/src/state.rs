//! Opacity states of micro-triangles

use serde::{Deserialize, Serialize};

/// Opacity classification of a micro-triangle (or of a whole primitive)
///
/// The discriminant is the value stored in the packed state array and the
/// ordinal used by special index codes.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OpacityState {
    /// Proven transparent, any-hit can be skipped
    Transparent = 0,
    /// Proven opaque, any-hit can be skipped
    Opaque = 1,
    /// Needs the exact alpha test, transparent when forced to two states
    UnknownTransparent = 2,
    /// Needs the exact alpha test, opaque when forced to two states
    UnknownOpaque = 3,
}

impl OpacityState {
    /// All states in ordinal order
    pub const ALL: [OpacityState; 4] = [
        OpacityState::Transparent,
        OpacityState::Opaque,
        OpacityState::UnknownTransparent,
        OpacityState::UnknownOpaque,
    ];

    /// State from the low two bits of a packed value
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0 => OpacityState::Transparent,
            1 => OpacityState::Opaque,
            2 => OpacityState::UnknownTransparent,
            _ => OpacityState::UnknownOpaque,
        }
    }

    /// Ordinal value (0..=3)
    #[inline]
    pub const fn ordinal(self) -> usize {
        self as usize
    }

    /// Whether traversal still has to run the exact alpha test
    #[inline]
    pub const fn is_unknown(self) -> bool {
        matches!(self, OpacityState::UnknownTransparent | OpacityState::UnknownOpaque)
    }

    /// The state traversal sees when an instance forces two-state micromaps
    #[inline]
    pub const fn to_two_state(self) -> Self {
        match self {
            OpacityState::Transparent | OpacityState::UnknownTransparent => OpacityState::Transparent,
            OpacityState::Opaque | OpacityState::UnknownOpaque => OpacityState::Opaque,
        }
    }
}

impl std::fmt::Display for OpacityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OpacityState::Transparent => "transparent",
            OpacityState::Opaque => "opaque",
            OpacityState::UnknownTransparent => "unknown-transparent",
            OpacityState::UnknownOpaque => "unknown-opaque",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bits_round_trips_ordinal() {
        for state in OpacityState::ALL {
            assert_eq!(OpacityState::from_bits(state.ordinal() as u32), state);
        }
    }

    #[test]
    fn test_from_bits_ignores_high_bits() {
        assert_eq!(OpacityState::from_bits(0b101), OpacityState::Opaque);
    }

    #[test]
    fn test_unknown_states() {
        assert!(!OpacityState::Transparent.is_unknown());
        assert!(!OpacityState::Opaque.is_unknown());
        assert!(OpacityState::UnknownTransparent.is_unknown());
        assert!(OpacityState::UnknownOpaque.is_unknown());
    }

    #[test]
    fn test_two_state_collapse() {
        assert_eq!(OpacityState::UnknownTransparent.to_two_state(), OpacityState::Transparent);
        assert_eq!(OpacityState::UnknownOpaque.to_two_state(), OpacityState::Opaque);
        assert_eq!(OpacityState::Opaque.to_two_state(), OpacityState::Opaque);
    }
}
