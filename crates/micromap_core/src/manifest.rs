//! Bake manifests
//!
//! A manifest is a RON file describing one baked mesh: its geometries and
//! materials, the files holding the OMM buffer triple, and where each
//! geometry's region starts inside those buffers.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::{
    Buffer, BufferHandle, Material, MeshBuffers, MeshGeometry, MeshInfo, Micromap,
    MicromapBuildFlags, OmmAttachment, OmmIndexFormat, UsageHistogram,
};

/// A serializable description of a baked mesh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BakeManifest {
    /// The mesh the micromaps were baked for
    pub mesh: MeshTemplate,
    /// Files holding the OMM buffers (shared by all geometries)
    #[serde(default)]
    pub omm: Option<OmmFiles>,
}

/// Serializable mesh description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshTemplate {
    /// Mesh name
    pub name: String,
    /// Rebuilt every frame
    #[serde(default)]
    pub skinned: bool,
    /// First index of the mesh
    #[serde(default)]
    pub index_offset: u32,
    /// First vertex of the mesh
    #[serde(default)]
    pub vertex_offset: u32,
    /// Raw 32-bit index file (optional, only needed when uploading)
    #[serde(default)]
    pub index_file: Option<String>,
    /// Raw vertex file (optional, only needed when uploading)
    #[serde(default)]
    pub vertex_file: Option<String>,
    /// Byte offset of positions inside the vertex file
    #[serde(default)]
    pub position_byte_offset: u64,
    /// Geometries in slot order
    pub geometries: Vec<GeometryTemplate>,
}

/// Serializable geometry description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometryTemplate {
    /// Geometry material
    pub material: Material,
    /// First index relative to the mesh
    #[serde(default)]
    pub index_offset_in_mesh: u32,
    /// First vertex relative to the mesh
    #[serde(default)]
    pub vertex_offset_in_mesh: u32,
    /// Number of indices
    pub num_indices: u32,
    /// Number of vertices
    pub num_vertices: u32,
    /// Baked micromap region for this geometry, if any
    #[serde(default)]
    pub omm: Option<AttachmentTemplate>,
}

/// Where one geometry's micromap data lives inside the shared OMM buffers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentTemplate {
    /// Width of the index entries
    pub index_format: OmmIndexFormat,
    /// Byte offset inside the index file
    #[serde(default)]
    pub index_buffer_offset: u32,
    /// Byte offset inside the descriptor file
    #[serde(default)]
    pub descriptor_buffer_offset: u32,
    /// Byte offset inside the state file
    #[serde(default)]
    pub state_buffer_offset: u32,
    /// Index usage histogram reported by the baker
    pub usage_histogram: UsageHistogram,
    /// Per (format, level) count of micromaps in the array; empty when unknown
    #[serde(default)]
    pub array_histogram: UsageHistogram,
    /// Flags the micromap array was built with
    #[serde(default)]
    pub build_flags: MicromapBuildFlags,
}

/// Files holding the OMM buffer triple, relative to the manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OmmFiles {
    pub index_file: String,
    pub descriptor_file: String,
    pub state_file: String,
}

impl BakeManifest {
    /// Load a manifest from a RON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ManifestLoadError> {
        let contents = fs::read_to_string(path)?;
        let manifest = ron::from_str(&contents)?;
        Ok(manifest)
    }

    /// Save a manifest to a RON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ManifestSaveError> {
        let pretty = ron::ser::PrettyConfig::new()
            .struct_names(true)
            .enumerate_arrays(false);
        let contents = ron::ser::to_string_pretty(self, pretty)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Load the referenced buffer files and build the mesh plus its attachments
    ///
    /// File paths are resolved relative to `base_dir`. The attachment list has
    /// one slot per geometry; geometries without micromaps get `None`.
    pub fn instantiate<P: AsRef<Path>>(
        &self,
        base_dir: P,
    ) -> Result<(MeshInfo, Vec<Option<OmmAttachment>>), ManifestLoadError> {
        let base_dir = base_dir.as_ref();
        let mesh_template = &self.mesh;

        let read = |file: &Option<String>, name: &str| -> Result<BufferHandle, ManifestLoadError> {
            match file {
                Some(file) => Ok(Buffer::new(name, fs::read(base_dir.join(file))?)),
                None => Ok(Buffer::empty(name)),
            }
        };
        let buffers = MeshBuffers::new(
            read(&mesh_template.index_file, "IndexBuffer")?,
            read(&mesh_template.vertex_file, "VertexBuffer")?,
        )
        .with_position_offset(mesh_template.position_byte_offset);

        let mut mesh = MeshInfo::new(mesh_template.name.clone(), Arc::new(buffers))
            .with_offsets(mesh_template.index_offset, mesh_template.vertex_offset);
        mesh.skinned = mesh_template.skinned;

        for geometry in &mesh_template.geometries {
            mesh.geometries.push(
                MeshGeometry::new(
                    Arc::new(geometry.material.clone()),
                    geometry.num_indices,
                    geometry.num_vertices,
                )
                .with_offsets(geometry.index_offset_in_mesh, geometry.vertex_offset_in_mesh),
            );
        }

        let omm_buffers = match &self.omm {
            Some(files) => Some((
                Buffer::new("OmmIndexBuffer", fs::read(base_dir.join(&files.index_file))?),
                Buffer::new("OmmDescBuffer", fs::read(base_dir.join(&files.descriptor_file))?),
                Buffer::new("OmmArrayBuffer", fs::read(base_dir.join(&files.state_file))?),
            )),
            None => None,
        };

        let mut attachments = Vec::with_capacity(mesh_template.geometries.len());
        for (geometry_index, geometry) in mesh_template.geometries.iter().enumerate() {
            let Some(template) = &geometry.omm else {
                attachments.push(None);
                continue;
            };
            let (index, descriptors, states) = omm_buffers
                .as_ref()
                .ok_or(ManifestLoadError::MissingOmmFiles { geometry: geometry_index })?;

            attachments.push(Some(OmmAttachment {
                micromap: Micromap::new(
                    format!("{}/omm{}", mesh_template.name, geometry_index),
                    template.build_flags,
                    template.array_histogram.clone(),
                ),
                index_format: template.index_format,
                index_buffer: index.clone(),
                index_buffer_offset: template.index_buffer_offset,
                descriptor_buffer: descriptors.clone(),
                descriptor_buffer_offset: template.descriptor_buffer_offset,
                state_buffer: states.clone(),
                state_buffer_offset: template.state_buffer_offset,
                usage_histogram: template.usage_histogram.clone(),
            }));
        }

        log::debug!(
            "Instantiated mesh '{}': {} geometries, {} with micromaps",
            mesh.name,
            mesh.geometries.len(),
            attachments.iter().filter(|a| a.is_some()).count()
        );

        Ok((mesh, attachments))
    }
}

/// Error loading a manifest or its buffer files
#[derive(Debug, Error)]
pub enum ManifestLoadError {
    /// IO error (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Parse error (invalid RON syntax)
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// A geometry has an attachment but no OMM buffer files are named
    #[error("geometry {geometry} has a micromap but the manifest names no OMM buffer files")]
    MissingOmmFiles { geometry: usize },
}

/// Error saving a manifest
#[derive(Debug, Error)]
pub enum ManifestSaveError {
    /// IO error (permission denied, disk full, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Serialization error
    #[error("Serialize error: {0}")]
    Serialize(#[from] ron::Error),
}
