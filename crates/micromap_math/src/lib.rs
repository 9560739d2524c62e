//! Micro-triangle indexing for opacity micromaps
//!
//! A triangle subdivided `level` times holds `4^level` micro-triangles. Baked
//! micromap data stores one state per micro-triangle in a fixed, bit-interleaved
//! order; this crate maps hit barycentrics onto that order.
//!
//! ## Core Types
//!
//! - [`Barycentric`] - Hit barycentric coordinate (third weight implied)
//! - [`DiscreteBarycentric`] - Integer (u, v, w) cell coordinate at a level
//! - [`MicroTriangle`] - Linear micro-triangle index plus orientation parity
//!
//! ## Bit Routines
//!
//! - [`bits::prefix_xor_fold`] - Per-halfword cumulative XOR scan
//! - [`bits::interleave_bits`] - Even/odd bit interleave of two halfwords

mod barycentric;
pub mod bits;
pub mod indexer;

pub use barycentric::{Barycentric, DiscreteBarycentric};
pub use indexer::{
    bary_to_index, dbary_to_index, micro_triangle_count, try_bary_to_index, MicroTriangle,
    MAX_SUBDIVISION_LEVEL,
};
