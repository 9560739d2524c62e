//! Host-side opacity micromap queries
//!
//! Reproduces on the CPU what ray traversal does with an attached micromap:
//!
//! - [`resolve`] - Primitive index to descriptor index or special state
//! - [`decode_state`] - Descriptor plus micro-triangle index to opacity state
//! - [`classify`] - Full hit classification with a debug color
//!
//! The per-hit functions never allocate, never log and only read their
//! inputs, so they can be called concurrently from any number of threads.
//! [`compute_usage_histogram`] and [`gather_stats`] are whole-geometry
//! validation helpers built on top of them.

pub mod debug;
pub mod decoder;
pub mod resolver;
pub mod stats;

pub use debug::{classify, classify_grid, state_color, Classification, OmmHit, STATE_COLORS};
pub use decoder::{decode_state, load_descriptor};
pub use resolver::{resolve, OmmIndex};
pub use stats::{compute_usage_histogram, gather_stats, OmmStats};
