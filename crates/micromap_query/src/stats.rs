//! Whole-geometry validation helpers
//!
//! These walk every primitive of a geometry, so unlike the per-hit functions
//! they allocate and log.

use std::collections::HashMap;

use micromap_core::{DecodeError, OmmBuffers, OpacityState, UsageHistogram};
use micromap_math::micro_triangle_count;

use crate::{decode_state, load_descriptor, resolve, OmmIndex};

/// Recompute a geometry's usage histogram from its index and descriptor buffers
///
/// Primitives with a special index are not counted.
pub fn compute_usage_histogram(buffers: &OmmBuffers<'_>, primitive_count: u32) -> Result<UsageHistogram, DecodeError> {
    let mut histogram = UsageHistogram::new();
    for primitive in 0..primitive_count {
        if let OmmIndex::Descriptor(index) = resolve(buffers.index, buffers.index_offset, primitive, buffers.index_format)? {
            let descriptor = load_descriptor(buffers.descriptors, buffers.descriptor_offset, index)?;
            histogram.add(descriptor.format, descriptor.subdivision_level, 1);
        }
    }
    Ok(histogram)
}

/// Micro-triangle statistics of one geometry
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OmmStats {
    /// Micro-triangles per state, indexed by [`OpacityState::ordinal`]
    pub states: [u64; 4],
    /// Primitives resolved through a descriptor
    pub micromap_primitives: u32,
    /// Primitives per special state, indexed by [`OpacityState::ordinal`]
    pub special_primitives: [u32; 4],
    /// Distinct descriptors referenced by the index buffer
    pub unique_descriptors: u32,
}

impl OmmStats {
    /// Opaque plus transparent micro-triangles
    pub fn known(&self) -> u64 {
        self.states[OpacityState::Opaque.ordinal()] + self.states[OpacityState::Transparent.ordinal()]
    }

    /// Micro-triangles left for the any-hit shader
    pub fn unknown(&self) -> u64 {
        self.states[OpacityState::UnknownOpaque.ordinal()] + self.states[OpacityState::UnknownTransparent.ordinal()]
    }

    /// Primitives whose whole area has a single special state
    pub fn special_primitive_count(&self) -> u32 {
        self.special_primitives.iter().sum()
    }
}

/// Decode every micro-triangle of every primitive of a geometry
///
/// Micro-triangles are counted once per referencing primitive; a descriptor
/// shared by many primitives is decoded only once.
pub fn gather_stats(buffers: &OmmBuffers<'_>, primitive_count: u32) -> Result<OmmStats, DecodeError> {
    let mut stats = OmmStats::default();
    let mut decoded: HashMap<u32, [u64; 4]> = HashMap::new();

    for primitive in 0..primitive_count {
        let index = match resolve(buffers.index, buffers.index_offset, primitive, buffers.index_format)? {
            OmmIndex::Special(state) => {
                stats.special_primitives[state.ordinal()] += 1;
                continue;
            }
            OmmIndex::Descriptor(index) => index,
        };

        let counts = match decoded.get(&index) {
            Some(counts) => *counts,
            None => {
                let descriptor = load_descriptor(buffers.descriptors, buffers.descriptor_offset, index)?;
                let mut counts = [0u64; 4];
                for micro in 0..micro_triangle_count(descriptor.subdivision_level as u32) {
                    let state = decode_state(&descriptor, micro, buffers.states, buffers.state_offset)?;
                    counts[state.ordinal()] += 1;
                }
                decoded.insert(index, counts);
                counts
            }
        };

        stats.micromap_primitives += 1;
        for (total, count) in stats.states.iter_mut().zip(counts) {
            *total += count;
        }
    }

    stats.unique_descriptors = decoded.len() as u32;
    log::debug!(
        "Gathered OMM stats over {} primitives: {} known, {} unknown, {} special",
        primitive_count,
        stats.known(),
        stats.unknown(),
        stats.special_primitive_count()
    );
    Ok(stats)
}
