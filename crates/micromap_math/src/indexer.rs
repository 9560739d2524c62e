//! Barycentric to micro-triangle index mapping
//!
//! The storage order of micro-triangles is a recursive space-filling curve over
//! the subdivision hierarchy. It is a fixed external contract: baked micromaps
//! are laid out in exactly this order, so the bit pattern below has to be
//! reproduced exactly.

use crate::bits::{interleave_bits, prefix_xor_fold};
use crate::{Barycentric, DiscreteBarycentric};

/// Highest subdivision level a micromap may use
///
/// The interleaved index needs `2 * level` bits and the halfword bit routines
/// operate on 16-bit halves.
pub const MAX_SUBDIVISION_LEVEL: u32 = 12;

/// A resolved micro-triangle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MicroTriangle {
    /// Linear index in `[0, 4^level)`
    pub index: u32,
    /// Orientation parity of the micro-triangle inside its subdivision cell
    ///
    /// Only used for visual shading; it carries no opacity meaning.
    pub is_upright: bool,
}

/// Number of micro-triangles of a triangle subdivided `level` times
#[inline]
pub const fn micro_triangle_count(level: u32) -> u32 {
    1 << (2 * level)
}

/// Map a discrete barycentric cell coordinate to its linear storage index
///
/// `level` must not exceed [`MAX_SUBDIVISION_LEVEL`].
pub fn dbary_to_index(d: DiscreteBarycentric, level: u32) -> u32 {
    debug_assert!(level <= MAX_SUBDIVISION_LEVEL);
    let DiscreteBarycentric { u, v, w } = d;
    let mask = (1u32 << level) - 1;

    let b0 = !(u ^ w) & mask;
    let t = (u ^ v) & b0;
    let c = (((u & v & w) | (!u & !v & !w)) & mask) << 16;
    let f = prefix_xor_fold(t | c) ^ u;
    let b1 = (f & !b0) | t;

    interleave_bits(b0, b1)
}

/// Map a hit barycentric coordinate to the micro-triangle it falls in
///
/// `level` must not exceed [`MAX_SUBDIVISION_LEVEL`]; use
/// [`try_bary_to_index`] for untrusted levels.
pub fn bary_to_index(bc: Barycentric, level: u32) -> MicroTriangle {
    let d = bc.discretize(level);
    MicroTriangle {
        index: dbary_to_index(d, level),
        is_upright: d.is_upright(),
    }
}

/// Checked variant of [`bary_to_index`], `None` if `level` is out of range
pub fn try_bary_to_index(bc: Barycentric, level: u32) -> Option<MicroTriangle> {
    (level <= MAX_SUBDIVISION_LEVEL).then(|| bary_to_index(bc, level))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Every valid (u, v, w) cell at a level, upright and inverted
    fn valid_cells(level: u32) -> Vec<DiscreteBarycentric> {
        let n = 1u32 << level;
        let mut cells = Vec::new();
        for u in 0..n {
            for v in 0..(n - u) {
                cells.push(DiscreteBarycentric::new(u, v, n - 1 - u - v));
                if u + v + 2 <= n {
                    cells.push(DiscreteBarycentric::new(u, v, n - 2 - u - v));
                }
            }
        }
        cells
    }

    #[test]
    fn test_bijection_over_valid_cells() {
        for level in 0..=3 {
            let cells = valid_cells(level);
            let count = micro_triangle_count(level);
            assert_eq!(cells.len() as u32, count);

            let indices: HashSet<u32> = cells.iter().map(|d| dbary_to_index(*d, level)).collect();
            assert_eq!(indices.len() as u32, count, "collision at level {}", level);
            assert!(indices.iter().all(|&i| i < count), "gap at level {}", level);
        }
    }

    #[test]
    fn test_bijection_through_centroids() {
        // Sweep the centroid of every micro-triangle through the float path
        for level in 0..=5 {
            let n = (1u32 << level) as f32;
            let mut seen = HashSet::new();
            for i in 0..(1u32 << level) {
                for j in 0..((1u32 << level) - i) {
                    let upright = Barycentric::new((i as f32 + 1.0 / 3.0) / n, (j as f32 + 1.0 / 3.0) / n);
                    seen.insert(bary_to_index(upright, level).index);
                    if i + j + 1 < (1u32 << level) {
                        let inverted =
                            Barycentric::new((i as f32 + 2.0 / 3.0) / n, (j as f32 + 2.0 / 3.0) / n);
                        seen.insert(bary_to_index(inverted, level).index);
                    }
                }
            }
            let expected: HashSet<u32> = (0..micro_triangle_count(level)).collect();
            assert_eq!(seen, expected, "level {}", level);
        }
    }

    #[test]
    fn test_reference_value_level_one() {
        // Regression value from the documented bit algorithm; must never change
        let tri = bary_to_index(Barycentric::new(0.5, 0.5), 1);
        assert_eq!(tri.index, 2);
        assert!(!tri.is_upright);
    }

    #[test]
    fn test_reference_values_level_one_corners() {
        assert_eq!(bary_to_index(Barycentric::new(0.2, 0.2), 1).index, 0);
        assert_eq!(bary_to_index(Barycentric::new(0.4, 0.4), 1).index, 1);
        assert_eq!(bary_to_index(Barycentric::new(0.6, 0.2), 1).index, 2);
        assert_eq!(bary_to_index(Barycentric::new(0.2, 0.6), 1).index, 3);
    }

    #[test]
    fn test_reference_values_level_two() {
        let expected = [
            (DiscreteBarycentric::new(0, 0, 3), 0),
            (DiscreteBarycentric::new(0, 1, 2), 3),
            (DiscreteBarycentric::new(0, 2, 1), 14),
            (DiscreteBarycentric::new(0, 3, 0), 15),
            (DiscreteBarycentric::new(1, 0, 2), 2),
            (DiscreteBarycentric::new(1, 1, 1), 5),
            (DiscreteBarycentric::new(1, 2, 0), 12),
            (DiscreteBarycentric::new(2, 0, 1), 8),
            (DiscreteBarycentric::new(2, 1, 0), 11),
            (DiscreteBarycentric::new(3, 0, 0), 10),
        ];
        for (d, index) in expected {
            assert_eq!(dbary_to_index(d, 2), index, "{:?}", d);
        }
    }

    #[test]
    fn test_level_zero_is_index_zero() {
        let tri = bary_to_index(Barycentric::new(0.3, 0.3), 0);
        assert_eq!(tri.index, 0);
    }

    #[test]
    fn test_vertices_stay_in_range() {
        for level in 0..=MAX_SUBDIVISION_LEVEL {
            for bc in [
                Barycentric::new(1.0, 0.0),
                Barycentric::new(0.0, 1.0),
                Barycentric::new(0.0, 0.0),
            ] {
                assert!(bary_to_index(bc, level).index < micro_triangle_count(level));
            }
        }
    }

    #[test]
    fn test_try_rejects_excessive_level() {
        assert!(try_bary_to_index(Barycentric::new(0.1, 0.1), MAX_SUBDIVISION_LEVEL).is_some());
        assert!(try_bary_to_index(Barycentric::new(0.1, 0.1), MAX_SUBDIVISION_LEVEL + 1).is_none());
    }
}
