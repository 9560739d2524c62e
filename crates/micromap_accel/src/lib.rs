//! Acceleration-structure descriptors with opacity micromap attachments
//!
//! This crate turns meshes and their baked micromaps into bottom-level
//! acceleration structure descriptors:
//!
//! - [`build_blas_desc`] - Geometry descriptors with OMM fields, opacity flags and culling
//! - [`OmmBuildQueue`] - Bakes micromaps through an [`OmmBaker`] over several updates
//! - [`instance_desc`] - Chooses the plain or OMM BLAS for a top-level instance

mod bake;
mod build_queue;
mod builder;
mod config;
mod error;
mod geometry;
mod instance;
mod transform;

pub use bake::{
    select_omm_geometries, wants_omm, BakeRequest, BakeSetup, BakeStats, BakeTarget, OmmBakeSettings, OmmBaker,
    OmmBuildInput, OmmGeometryInput,
};
pub use build_queue::{
    BuildStage, LinearBufferAllocator, OmmBuildEvent, OmmBuildKey, OmmBuildQueue, OmmBuildResult, OmmDebugData,
    OmmGeometryDebug, SUBALLOCATION_ALIGNMENT,
};
pub use builder::{
    build_blas_desc, build_flags, culling_transform, geometry_flags, validate_attachment, MAX_GEOMETRIES_PER_BLAS,
};
pub use config::BvhConfig;
pub use error::{BakeError, BuildError};
pub use geometry::{
    AccelStructBuildFlags, AccelStructDesc, BufferFormat, GeometryDesc, GeometryFlags, GeometryOmm, GeometryTriangles,
};
pub use instance::{instance_desc, BlasVariant, InstanceDesc, InstanceFlags, InstanceList, OmmInstanceSettings};
pub use transform::{AffineTransform, DEGENERATE_TRANSFORM};
