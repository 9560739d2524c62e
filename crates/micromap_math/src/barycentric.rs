//! Barycentric coordinates on a subdivided triangle

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// A hit barycentric coordinate as reported by ray traversal
///
/// Only the second and third vertex weights are stored; the first one is
/// `1 - u - v`. Layout matches the two-float attribute ray tracing shaders emit.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Barycentric {
    pub u: f32,
    pub v: f32,
}

impl Barycentric {
    /// Create a new barycentric coordinate
    #[inline]
    pub const fn new(u: f32, v: f32) -> Self {
        Self { u, v }
    }

    /// The implied weight `1 - u - v`
    #[inline]
    pub fn w(&self) -> f32 {
        1.0 - self.u - self.v
    }

    /// Snap to the integer cell coordinate of a triangle subdivided `level` times
    ///
    /// Each component is `floor(2^level * weight)`, clamped to `[0, 2^level - 1]`
    /// so that hits exactly on the far edge stay inside the grid.
    ///
    /// This departs from truncating to `level` bits on purpose: a weight of
    /// exactly 1.0 would wrap to 0 under a mask, moving a vertex hit such as
    /// `(1.0, 0.0)` into the micro-triangle at the opposite corner.
    pub fn discretize(&self, level: u32) -> DiscreteBarycentric {
        let steps = (1u32 << level) as f32;
        let max = (1u32 << level) - 1;
        // `as` saturates negatives and NaN to zero
        let snap = |weight: f32| ((steps * weight) as u32).min(max);
        DiscreteBarycentric {
            u: snap(self.u),
            v: snap(self.v),
            w: snap(self.w()),
        }
    }
}

impl From<[f32; 2]> for Barycentric {
    fn from(bc: [f32; 2]) -> Self {
        Self::new(bc[0], bc[1])
    }
}

impl From<(f32, f32)> for Barycentric {
    fn from(bc: (f32, f32)) -> Self {
        Self::new(bc.0, bc.1)
    }
}

/// Integer barycentric cell coordinate at a given subdivision level
///
/// For a valid micro-triangle `u + v + w` is either `2^level - 1` (upright
/// triangle) or `2^level - 2` (inverted triangle).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DiscreteBarycentric {
    pub u: u32,
    pub v: u32,
    pub w: u32,
}

impl DiscreteBarycentric {
    /// Create a new discrete coordinate
    #[inline]
    pub const fn new(u: u32, v: u32, w: u32) -> Self {
        Self { u, v, w }
    }

    /// Orientation parity of the cell: `(u ^ v ^ w) & 1`
    #[inline]
    pub const fn is_upright(&self) -> bool {
        ((self.u ^ self.v ^ self.w) & 1) == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_implied_weight() {
        let bc = Barycentric::new(0.25, 0.5);
        assert!((bc.w() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_discretize_level_zero_is_single_cell() {
        let d = Barycentric::new(0.3, 0.3).discretize(0);
        assert_eq!(d, DiscreteBarycentric::new(0, 0, 0));
    }

    #[test]
    fn test_discretize_upright_and_inverted() {
        // Centroid of the corner triangle at w: (0, 0, 1)
        let d = Barycentric::new(0.15, 0.15).discretize(1);
        assert_eq!(d, DiscreteBarycentric::new(0, 0, 1));
        assert!(d.is_upright());

        // Centroid of the middle (inverted) triangle
        let d = Barycentric::new(1.0 / 3.0, 1.0 / 3.0).discretize(1);
        assert_eq!(d, DiscreteBarycentric::new(0, 0, 0));
        assert!(!d.is_upright());
    }

    #[test]
    fn test_discretize_clamps_far_edge() {
        let d = Barycentric::new(1.0, 0.0).discretize(3);
        assert_eq!(d.u, 7);
        assert_eq!(d.v, 0);
        assert_eq!(d.w, 0);
    }

    #[test]
    fn test_discretize_negative_and_nan_snap_to_zero() {
        let d = Barycentric::new(-0.5, f32::NAN).discretize(2);
        assert_eq!(d.u, 0);
        assert_eq!(d.v, 0);
    }

    #[test]
    fn test_barycentric_layout() {
        assert_eq!(std::mem::size_of::<Barycentric>(), 8);
        assert_eq!(std::mem::align_of::<Barycentric>(), 4);
    }
}
