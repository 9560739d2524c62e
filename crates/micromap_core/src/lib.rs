//! Core types for opacity micromaps
//!
//! This crate provides the data model shared by the build path and the query path:
//!
//! - [`OpacityState`] - Per micro-triangle opacity classification
//! - [`OmmFormat`] / [`OmmIndexFormat`] - State packing and index width
//! - [`OmmDescriptor`] - Decoded 8-byte descriptor record
//! - [`UsageHistogram`] - (format, level) usage counts
//! - [`Buffer`] / [`OmmBuffers`] - Immutable byte buffers and a borrowed view of the OMM triple
//! - [`OmmAttachment`] - Everything needed to attach a baked micromap to a geometry
//! - [`Material`] / [`MeshInfo`] - The mesh metadata the geometry builder consumes
//! - [`BakeManifest`] - RON description of a baked mesh on disk

mod attachment;
mod buffer;
mod descriptor;
mod error;
mod format;
mod histogram;
mod manifest;
mod material;
mod mesh;
mod state;

pub use attachment::{Micromap, MicromapHandle, OmmAttachment};
pub use buffer::{load_u32, Buffer, BufferHandle, OmmBuffers};
pub use descriptor::{OmmDescriptor, OmmDescriptorRecord};
pub use error::DecodeError;
pub use format::{MicromapBuildFlags, OmmFormat, OmmIndexFormat};
pub use histogram::{UsageCount, UsageHistogram};
pub use manifest::{
    AttachmentTemplate, BakeManifest, GeometryTemplate, ManifestLoadError, ManifestSaveError,
    MeshTemplate, OmmFiles,
};
pub use material::{Material, MaterialDomain};
pub use mesh::{MeshBuffers, MeshGeometry, MeshInfo};
pub use state::OpacityState;

// Re-export the indexer types for convenience
pub use micromap_math::{Barycentric, MicroTriangle, MAX_SUBDIVISION_LEVEL};
