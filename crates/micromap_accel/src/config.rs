//! BVH build configuration

use serde::{Deserialize, Serialize};

/// Options that change how mesh geometries are turned into BLAS descriptors
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BvhConfig {
    /// Cull geometries with a transmissive material via the degenerate transform
    pub exclude_transmissive: bool,
}

impl BvhConfig {
    /// Create a config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether transmissive geometries are culled
    pub fn with_exclude_transmissive(mut self, exclude: bool) -> Self {
        self.exclude_transmissive = exclude;
        self
    }
}
