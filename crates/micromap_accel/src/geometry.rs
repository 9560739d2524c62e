//! Acceleration-structure descriptor model
//!
//! Mirrors the descriptor a native bottom-level build consumes: per-geometry
//! triangle buffers, an optional transform, an optional micromap attachment
//! and the opacity flags, plus whole-structure build flags.

use bitflags::bitflags;
use micromap_core::{
    BufferHandle, MicromapHandle, OmmAttachment, OmmBuffers, OmmIndexFormat, UsageHistogram,
};

use crate::AffineTransform;

bitflags! {
    /// Per-geometry build flags
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct GeometryFlags: u8 {
        /// Never invoke any-hit for this geometry
        const OPAQUE = 1 << 0;
        /// Invoke any-hit at most once per primitive
        const NO_DUPLICATE_ANY_HIT = 1 << 1;
    }
}

bitflags! {
    /// Whole-structure build flags
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct AccelStructBuildFlags: u8 {
        const ALLOW_UPDATE = 1 << 0;
        const ALLOW_COMPACTION = 1 << 1;
        const PREFER_FAST_TRACE = 1 << 2;
        const PREFER_FAST_BUILD = 1 << 3;
        const MINIMIZE_MEMORY = 1 << 4;
    }
}

/// Element format of a triangle buffer view
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferFormat {
    /// 32-bit unsigned index
    R32Uint,
    /// Three 32-bit floats
    Rgb32Float,
}

impl BufferFormat {
    /// Bytes per element
    pub const fn size(self) -> u32 {
        match self {
            BufferFormat::R32Uint => 4,
            BufferFormat::Rgb32Float => 12,
        }
    }
}

/// Micromap fields of a triangle geometry
#[derive(Clone, Debug)]
pub struct GeometryOmm {
    pub micromap: MicromapHandle,
    pub index_format: OmmIndexFormat,
    pub index_buffer: BufferHandle,
    pub index_buffer_offset: u32,
    pub descriptor_buffer: BufferHandle,
    pub descriptor_buffer_offset: u32,
    pub state_buffer: BufferHandle,
    pub state_buffer_offset: u32,
    pub usage_counts: UsageHistogram,
}

impl GeometryOmm {
    /// Borrow the three buffers as a query view
    pub fn buffers(&self) -> OmmBuffers<'_> {
        OmmBuffers {
            index_format: self.index_format,
            index: self.index_buffer.bytes(),
            index_offset: self.index_buffer_offset,
            descriptors: self.descriptor_buffer.bytes(),
            descriptor_offset: self.descriptor_buffer_offset,
            states: self.state_buffer.bytes(),
            state_offset: self.state_buffer_offset,
        }
    }
}

impl From<&OmmAttachment> for GeometryOmm {
    fn from(attachment: &OmmAttachment) -> Self {
        Self {
            micromap: attachment.micromap.clone(),
            index_format: attachment.index_format,
            index_buffer: attachment.index_buffer.clone(),
            index_buffer_offset: attachment.index_buffer_offset,
            descriptor_buffer: attachment.descriptor_buffer.clone(),
            descriptor_buffer_offset: attachment.descriptor_buffer_offset,
            state_buffer: attachment.state_buffer.clone(),
            state_buffer_offset: attachment.state_buffer_offset,
            usage_counts: attachment.usage_histogram.clone(),
        }
    }
}

/// Triangle buffer views of one geometry
#[derive(Clone, Debug)]
pub struct GeometryTriangles {
    pub index_buffer: BufferHandle,
    pub index_offset: u64,
    pub index_format: BufferFormat,
    pub index_count: u32,
    pub vertex_buffer: BufferHandle,
    pub vertex_offset: u64,
    pub vertex_format: BufferFormat,
    pub vertex_stride: u32,
    pub vertex_count: u32,
    pub omm: Option<GeometryOmm>,
}

impl GeometryTriangles {
    /// Number of triangles described by the index view
    pub fn triangle_count(&self) -> u32 {
        self.index_count / 3
    }
}

/// One geometry of a bottom-level structure
#[derive(Clone, Debug)]
pub struct GeometryDesc {
    pub triangles: GeometryTriangles,
    /// `None` means identity
    pub transform: Option<AffineTransform>,
    pub flags: GeometryFlags,
}

impl GeometryDesc {
    /// Whether the geometry carries the NaN transform that culls it
    pub fn is_culled(&self) -> bool {
        self.transform.is_some_and(|t| t.is_degenerate())
    }

    /// Whether any-hit is skipped for every primitive
    pub fn is_opaque(&self) -> bool {
        self.flags.contains(GeometryFlags::OPAQUE)
    }

    /// Whether a micromap is attached
    pub fn has_omm(&self) -> bool {
        self.triangles.omm.is_some()
    }
}

/// Descriptor of an acceleration structure
#[derive(Clone, Debug, Default)]
pub struct AccelStructDesc {
    pub debug_name: String,
    pub is_top_level: bool,
    pub geometries: Vec<GeometryDesc>,
    pub build_flags: AccelStructBuildFlags,
}

impl AccelStructDesc {
    /// Total triangle count over all geometries
    pub fn triangle_count(&self) -> u64 {
        self.geometries.iter().map(|g| g.triangles.triangle_count() as u64).sum()
    }

    /// Number of geometries with a micromap attached
    pub fn omm_geometry_count(&self) -> usize {
        self.geometries.iter().filter(|g| g.has_omm()).count()
    }
}
