//! Per-geometry affine transforms

use bytemuck::{Pod, Zeroable};

/// Row-major 3x4 affine transform, the layout native builders consume
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct AffineTransform(pub [f32; 12]);

impl AffineTransform {
    /// The identity transform
    pub const IDENTITY: Self = Self([
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0,
    ]);

    /// Create a transform from its twelve row-major components
    pub const fn new(m: [f32; 12]) -> Self {
        Self(m)
    }

    /// Build from a rotation/scale matrix (rows) and a translation
    pub fn from_rows(rows: [[f32; 3]; 3], translation: [f32; 3]) -> Self {
        let mut m = [0.0; 12];
        for (r, row) in rows.iter().enumerate() {
            m[r * 4..r * 4 + 3].copy_from_slice(row);
            m[r * 4 + 3] = translation[r];
        }
        Self(m)
    }

    /// Whether every component is non-finite
    pub fn is_degenerate(&self) -> bool {
        self.0.iter().all(|c| !c.is_finite())
    }

    /// Apply to a point
    pub fn transform_point(&self, p: [f32; 3]) -> [f32; 3] {
        let m = &self.0;
        [
            m[0] * p[0] + m[1] * p[1] + m[2] * p[2] + m[3],
            m[4] * p[0] + m[5] * p[1] + m[6] * p[2] + m[7],
            m[8] * p[0] + m[9] * p[1] + m[10] * p[2] + m[11],
        ]
    }
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Transform that removes a geometry from the built structure
///
/// Every component is NaN. Native builders give such a geometry no valid
/// extent, so rays never hit it, while it keeps its slot in the geometry
/// list and per-geometry lookup tables stay aligned.
pub const DEGENERATE_TRANSFORM: AffineTransform = AffineTransform([f32::NAN; 12]);
