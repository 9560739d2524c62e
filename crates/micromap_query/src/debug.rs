//! Debug classification of ray hits
//!
//! Composes [`resolve`], the micro-triangle indexer and [`decode_state`]
//! into a state plus a visualization color, the same answer traversal
//! hardware computes for a hit at `(primitive, barycentric)`.

use micromap_core::{Barycentric, DecodeError, OmmBuffers, OpacityState};
use micromap_math::bary_to_index;

use crate::{decode_state, load_descriptor, resolve, OmmIndex};

/// Debug colors indexed by [`OpacityState::ordinal`]
pub const STATE_COLORS: [[f32; 3]; 4] = [
    [0.0, 0.0, 1.0], // Transparent: blue
    [0.0, 1.0, 0.0], // Opaque: green
    [1.0, 0.0, 1.0], // UnknownTransparent: magenta
    [1.0, 1.0, 0.0], // UnknownOpaque: yellow
];

/// Base debug color of a state
#[inline]
pub const fn state_color(state: OpacityState) -> [f32; 3] {
    STATE_COLORS[state.ordinal()]
}

/// How a hit was resolved
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OmmHit {
    /// The primitive's index entry was a special code
    Special(OpacityState),
    /// The state came from a micromap
    MicroTriangle {
        state: OpacityState,
        descriptor_index: u32,
        micro_triangle_index: u32,
        subdivision_level: u16,
    },
}

impl OmmHit {
    /// The opacity state regardless of how it was resolved
    pub fn state(&self) -> OpacityState {
        match *self {
            OmmHit::Special(state) => state,
            OmmHit::MicroTriangle { state, .. } => state,
        }
    }

    /// Whether the state came from a special index
    pub fn is_special(&self) -> bool {
        matches!(self, OmmHit::Special(_))
    }
}

/// Result of [`classify`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Classification {
    pub hit: OmmHit,
    /// State color, halved component-wise for upright micro-triangles
    pub color: [f32; 3],
    /// Orientation of the micro-triangle; always false for special states
    pub is_upright: bool,
}

/// Classify a hit against one geometry's OMM buffers
///
/// Special states return their color unchanged. Micromap states are looked
/// up through the descriptor, and upright micro-triangles get half the color
/// so the subdivision pattern stays visible.
pub fn classify(
    primitive_index: u32,
    barycentric: Barycentric,
    buffers: &OmmBuffers<'_>,
) -> Result<Classification, DecodeError> {
    let descriptor_index = match resolve(buffers.index, buffers.index_offset, primitive_index, buffers.index_format)? {
        OmmIndex::Special(state) => {
            return Ok(Classification {
                hit: OmmHit::Special(state),
                color: state_color(state),
                is_upright: false,
            });
        }
        OmmIndex::Descriptor(index) => index,
    };

    let descriptor = load_descriptor(buffers.descriptors, buffers.descriptor_offset, descriptor_index)?;
    let micro = bary_to_index(barycentric, descriptor.subdivision_level as u32);
    let state = decode_state(&descriptor, micro.index, buffers.states, buffers.state_offset)?;

    let mut color = state_color(state);
    if micro.is_upright {
        color = color.map(|c| c * 0.5);
    }

    Ok(Classification {
        hit: OmmHit::MicroTriangle {
            state,
            descriptor_index,
            micro_triangle_index: micro.index,
            subdivision_level: descriptor.subdivision_level,
        },
        color,
        is_upright: micro.is_upright,
    })
}

/// Classify a regular grid of hits over one primitive
///
/// Samples the centers of a `resolution` x `resolution` grid in barycentric
/// space, keeping only points inside the triangle. Rows run along `v`.
pub fn classify_grid(
    primitive_index: u32,
    resolution: u32,
    buffers: &OmmBuffers<'_>,
) -> Result<Vec<Vec<Classification>>, DecodeError> {
    let step = 1.0 / resolution.max(1) as f32;
    let mut rows = Vec::new();
    for j in 0..resolution {
        let v = (j as f32 + 0.5) * step;
        let mut row = Vec::new();
        for i in 0..resolution {
            let u = (i as f32 + 0.5) * step;
            if u + v > 1.0 {
                break;
            }
            row.push(classify(primitive_index, Barycentric::new(u, v), buffers)?);
        }
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use micromap_core::{Buffer, BufferHandle, OmmDescriptor, OmmFormat, OmmIndexFormat};

    struct Fixture {
        index: BufferHandle,
        descriptors: BufferHandle,
        states: BufferHandle,
    }

    impl Fixture {
        /// Primitive 0: OC2 level 1 micromap with states 0, 1, 2, 3
        /// Primitive 1: special UnknownOpaque
        /// Primitive 2: OC1 level 0 micromap, opaque
        fn new() -> Self {
            let format = OmmIndexFormat::Uint16;
            let index = Buffer::from_words("index", &[format.special_code(OpacityState::UnknownOpaque) << 16, 1]);

            let d0 = OmmDescriptor::new(0, OmmFormat::Oc2FourState, 1).to_record();
            let d1 = OmmDescriptor::new(4, OmmFormat::Oc1TwoState, 0).to_record();
            let descriptors = Buffer::from_words(
                "descriptors",
                &[d0.offset, d0.format_and_level, d1.offset, d1.format_and_level],
            );

            let states = Buffer::from_words("states", &[0b11_10_01_00, 1]);
            Self {
                index,
                descriptors,
                states,
            }
        }

        fn buffers(&self) -> OmmBuffers<'_> {
            OmmBuffers {
                index_format: OmmIndexFormat::Uint16,
                index: self.index.bytes(),
                index_offset: 0,
                descriptors: self.descriptors.bytes(),
                descriptor_offset: 0,
                states: self.states.bytes(),
                state_offset: 0,
            }
        }
    }

    #[test]
    fn test_color_table_order() {
        assert_eq!(state_color(OpacityState::Transparent), [0.0, 0.0, 1.0]);
        assert_eq!(state_color(OpacityState::Opaque), [0.0, 1.0, 0.0]);
        assert_eq!(state_color(OpacityState::UnknownTransparent), [1.0, 0.0, 1.0]);
        assert_eq!(state_color(OpacityState::UnknownOpaque), [1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_micromap_hits_follow_indexer() {
        let fixture = Fixture::new();
        let buffers = fixture.buffers();

        // Level 1 cells: (0.2, 0.2) -> 0, (0.4, 0.4) -> 1, (0.6, 0.2) -> 2, (0.2, 0.6) -> 3
        let cases = [
            ((0.2, 0.2), 0, OpacityState::Transparent),
            ((0.4, 0.4), 1, OpacityState::Opaque),
            ((0.6, 0.2), 2, OpacityState::UnknownTransparent),
            ((0.2, 0.6), 3, OpacityState::UnknownOpaque),
        ];
        for ((u, v), index, state) in cases {
            let result = classify(0, Barycentric::new(u, v), &buffers).unwrap();
            assert_eq!(
                result.hit,
                OmmHit::MicroTriangle {
                    state,
                    descriptor_index: 0,
                    micro_triangle_index: index,
                    subdivision_level: 1,
                }
            );
        }
    }

    #[test]
    fn test_upright_darkening() {
        let fixture = Fixture::new();
        let buffers = fixture.buffers();

        // The center cell of level 1 is inverted, the corners are upright
        let center = classify(0, Barycentric::new(0.4, 0.4), &buffers).unwrap();
        assert!(!center.is_upright);
        assert_eq!(center.color, state_color(OpacityState::Opaque));

        let corner = classify(0, Barycentric::new(0.6, 0.2), &buffers).unwrap();
        assert!(corner.is_upright);
        assert_eq!(corner.color, [0.5, 0.0, 0.5]);
    }

    #[test]
    fn test_special_state_never_darkened() {
        let fixture = Fixture::new();
        let buffers = fixture.buffers();

        for (u, v) in [(0.1, 0.1), (0.4, 0.4), (0.8, 0.1)] {
            let result = classify(1, Barycentric::new(u, v), &buffers).unwrap();
            assert_eq!(result.hit, OmmHit::Special(OpacityState::UnknownOpaque));
            assert!(result.hit.is_special());
            assert!(!result.is_upright);
            assert_eq!(result.color, [1.0, 1.0, 0.0]);
        }
    }

    #[test]
    fn test_level_zero_micromap() {
        let fixture = Fixture::new();
        let buffers = fixture.buffers();

        let result = classify(2, Barycentric::new(0.3, 0.3), &buffers).unwrap();
        assert_eq!(result.hit.state(), OpacityState::Opaque);
        assert!(!result.is_upright);
        assert_eq!(result.color, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_errors_propagate() {
        let fixture = Fixture::new();
        let buffers = fixture.buffers();

        assert!(matches!(
            classify(4, Barycentric::new(0.3, 0.3), &buffers),
            Err(DecodeError::IndexOutOfBounds { primitive: 4, .. })
        ));

        // Primitive 3 points at descriptor 0 of an empty descriptor array
        let empty = OmmBuffers {
            descriptors: &[],
            ..buffers
        };
        assert!(matches!(
            classify(3, Barycentric::new(0.3, 0.3), &empty),
            Err(DecodeError::DescriptorOutOfBounds { index: 0, .. })
        ));
    }

    #[test]
    fn test_grid_covers_triangle() {
        let fixture = Fixture::new();
        let buffers = fixture.buffers();

        let grid = classify_grid(0, 4, &buffers).unwrap();
        assert_eq!(grid.len(), 4);
        let lengths: Vec<usize> = grid.iter().map(Vec::len).collect();
        assert_eq!(lengths, vec![4, 3, 2, 1]);
        assert!(grid.iter().flatten().all(|c| !c.hit.is_special()));
    }
}
