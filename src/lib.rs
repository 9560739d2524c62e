//! Micromap inspection tool library
//!
//! Re-exports the workspace crates and provides the application config.

pub mod config;
pub mod inspect;

pub use micromap_accel as accel;
pub use micromap_core as core;
pub use micromap_math as math;
pub use micromap_query as query;
