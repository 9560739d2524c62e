//! OMM bake settings, geometry selection and the baker interface
//!
//! Baking itself (rasterising alpha textures into micro-triangle states) is
//! done by an external baker behind [`OmmBaker`]. The build queue only
//! sizes, sub-allocates and attaches what the baker produces.

use std::sync::Arc;

use micromap_core::{
    Material, MeshGeometry, MeshInfo, MicromapBuildFlags, OmmFormat, OmmIndexFormat, UsageHistogram,
    MAX_SUBDIVISION_LEVEL,
};
use serde::{Deserialize, Serialize};

use crate::{BakeError, BvhConfig};

/// Per-geometry bake settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OmmBakeSettings {
    /// Upper bound for the subdivision level of any micromap
    pub max_subdivision_level: u32,
    /// Pick the level per triangle from its texture-space size
    pub dynamic_subdivision: bool,
    /// Texels per micro-triangle edge used by dynamic subdivision
    pub dynamic_subdivision_scale: f32,
    /// State packing
    pub format: OmmFormat,
    /// Micromap array build preference
    pub build_flags: MicromapBuildFlags,
    /// State data budget per geometry in MiB
    pub max_array_data_size_mb: u32,

    // Debug toggles, normally left at their defaults
    pub compute_only: bool,
    pub level_line_intersection: bool,
    pub tex_coord_deduplication: bool,
    pub force_32bit_indices: bool,
    pub special_indices: bool,
}

impl Default for OmmBakeSettings {
    fn default() -> Self {
        Self {
            max_subdivision_level: MAX_SUBDIVISION_LEVEL,
            dynamic_subdivision: true,
            dynamic_subdivision_scale: 1.0,
            format: OmmFormat::Oc2FourState,
            build_flags: MicromapBuildFlags::FAST_TRACE,
            max_array_data_size_mb: 100,
            compute_only: true,
            level_line_intersection: true,
            tex_coord_deduplication: true,
            force_32bit_indices: false,
            special_indices: true,
        }
    }
}

impl OmmBakeSettings {
    /// Subdivision scale handed to the baker; zero disables dynamic subdivision
    pub fn effective_subdivision_scale(&self) -> f32 {
        if self.dynamic_subdivision {
            self.dynamic_subdivision_scale
        } else {
            0.0
        }
    }

    /// Maximum subdivision level, clamped to what decoding supports
    pub fn subdivision_level_limit(&self) -> u32 {
        self.max_subdivision_level.min(MAX_SUBDIVISION_LEVEL)
    }

    /// State data budget in bytes
    pub fn max_array_data_size(&self) -> u64 {
        (self.max_array_data_size_mb as u64) << 20
    }

    /// Index format the baker should emit
    pub fn preferred_index_format(&self) -> OmmIndexFormat {
        if self.force_32bit_indices {
            OmmIndexFormat::Uint32
        } else {
            OmmIndexFormat::Uint16
        }
    }
}

/// One geometry of a mesh to bake
#[derive(Clone, Debug, PartialEq)]
pub struct OmmGeometryInput {
    /// Slot of the geometry in the mesh
    pub geometry_index: usize,
    pub settings: OmmBakeSettings,
}

/// Everything the queue needs to bake and attach micromaps for one mesh
#[derive(Clone, Debug)]
pub struct OmmBuildInput {
    pub mesh: Arc<MeshInfo>,
    pub geometries: Vec<OmmGeometryInput>,
    pub bvh: BvhConfig,
}

impl OmmBuildInput {
    /// Create an input with no geometries
    pub fn new(mesh: Arc<MeshInfo>, bvh: BvhConfig) -> Self {
        Self {
            mesh,
            geometries: Vec::new(),
            bvh,
        }
    }

    /// Add a geometry to bake
    pub fn with_geometry(mut self, geometry_index: usize, settings: OmmBakeSettings) -> Self {
        self.geometries.push(OmmGeometryInput {
            geometry_index,
            settings,
        });
        self
    }
}

/// Whether a geometry's material gets a micromap
///
/// It needs an enabled alpha texture and an alpha-tested domain.
pub fn wants_omm(material: &Material) -> bool {
    material.has_alpha_texture() && material.domain.is_alpha_tested()
}

/// Select the geometries of a mesh that get micromaps
///
/// Skinned meshes are skipped. Returns `None` when nothing qualifies.
pub fn select_omm_geometries(
    mesh: &Arc<MeshInfo>,
    settings: &OmmBakeSettings,
    bvh: &BvhConfig,
) -> Option<OmmBuildInput> {
    if mesh.skinned {
        return None;
    }

    let input = mesh
        .geometries
        .iter()
        .enumerate()
        .filter(|(_, geometry)| wants_omm(&geometry.material))
        .fold(OmmBuildInput::new(mesh.clone(), bvh.clone()), |input, (i, _)| {
            input.with_geometry(i, settings.clone())
        });

    (!input.geometries.is_empty()).then_some(input)
}

/// One geometry as seen by the baker
#[derive(Clone, Copy, Debug)]
pub struct BakeRequest<'a> {
    pub mesh: &'a MeshInfo,
    pub geometry_index: usize,
    pub geometry: &'a MeshGeometry,
    pub settings: &'a OmmBakeSettings,
}

impl<'a> BakeRequest<'a> {
    /// The geometry's material
    pub fn material(&self) -> &'a Material {
        &self.geometry.material
    }

    /// Byte offset of the geometry's first index in the mesh index buffer
    pub fn index_byte_offset(&self) -> u64 {
        (self.mesh.index_offset as u64 + self.geometry.index_offset_in_mesh as u64) * 4
    }

    /// Number of triangles to bake
    pub fn triangle_count(&self) -> u32 {
        self.geometry.triangle_count()
    }
}

/// Sizes and histograms the baker reports before the bake
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BakeSetup {
    pub index_format: OmmIndexFormat,
    /// Number of index entries; must equal the triangle count
    pub index_count: u32,
    pub index_buffer_size: u64,
    pub descriptor_buffer_size: u64,
    /// Per (format, level) primitive references
    pub index_histogram: UsageHistogram,
    /// Per (format, level) micromaps in the array
    pub array_histogram: UsageHistogram,
    /// Bytes of packed state data
    pub array_data_size: u64,
}

/// Zero-initialised output regions of one geometry
///
/// Descriptor offsets are relative to the start of `states`, descriptor
/// indices relative to the start of `descriptors`.
#[derive(Debug)]
pub struct BakeTarget<'a> {
    pub index: &'a mut [u8],
    pub descriptors: &'a mut [u8],
    pub states: &'a mut [u8],
}

/// Micro-triangle totals reported by a bake
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BakeStats {
    pub opaque: u64,
    pub transparent: u64,
    pub unknown: u64,
}

impl BakeStats {
    /// Opaque plus transparent
    pub fn known(&self) -> u64 {
        self.opaque + self.transparent
    }
}

/// External micromap baker
pub trait OmmBaker {
    /// Report the buffer sizes and histograms a bake will produce
    fn setup(&mut self, request: &BakeRequest<'_>) -> Result<BakeSetup, BakeError>;

    /// Write the index, descriptor and state data into `target`
    fn bake(&mut self, request: &BakeRequest<'_>, target: BakeTarget<'_>) -> Result<BakeStats, BakeError>;
}
