//! Mesh metadata consumed by the acceleration-structure builder
//!
//! A mesh is a slice of shared index/vertex buffers split into geometries,
//! each with its own material. Offsets are in elements, not bytes.

use std::sync::Arc;

use crate::{BufferHandle, Material};

/// Shared index and vertex buffers of one or more meshes
#[derive(Clone, Debug)]
pub struct MeshBuffers {
    /// 32-bit triangle indices
    pub index_buffer: BufferHandle,
    /// Vertex attributes; positions are tightly packed `[f32; 3]`
    pub vertex_buffer: BufferHandle,
    /// Byte offset of the position stream inside the vertex buffer
    pub position_byte_offset: u64,
}

impl MeshBuffers {
    /// Create mesh buffers with positions at the start of the vertex buffer
    pub fn new(index_buffer: BufferHandle, vertex_buffer: BufferHandle) -> Self {
        Self {
            index_buffer,
            vertex_buffer,
            position_byte_offset: 0,
        }
    }

    /// Set the byte offset of the position stream
    pub fn with_position_offset(mut self, byte_offset: u64) -> Self {
        self.position_byte_offset = byte_offset;
        self
    }
}

/// A range of a mesh drawn with a single material
#[derive(Clone, Debug)]
pub struct MeshGeometry {
    /// The geometry's material
    pub material: Arc<Material>,
    /// First index, relative to the mesh's first index
    pub index_offset_in_mesh: u32,
    /// First vertex, relative to the mesh's first vertex
    pub vertex_offset_in_mesh: u32,
    /// Number of indices (three per triangle)
    pub num_indices: u32,
    /// Number of vertices
    pub num_vertices: u32,
}

impl MeshGeometry {
    /// Create a geometry covering `num_indices` indices and `num_vertices` vertices
    pub fn new(material: Arc<Material>, num_indices: u32, num_vertices: u32) -> Self {
        Self {
            material,
            index_offset_in_mesh: 0,
            vertex_offset_in_mesh: 0,
            num_indices,
            num_vertices,
        }
    }

    /// Set the index and vertex offsets relative to the mesh
    pub fn with_offsets(mut self, index_offset_in_mesh: u32, vertex_offset_in_mesh: u32) -> Self {
        self.index_offset_in_mesh = index_offset_in_mesh;
        self.vertex_offset_in_mesh = vertex_offset_in_mesh;
        self
    }

    /// Number of triangles (primitives)
    #[inline]
    pub fn triangle_count(&self) -> u32 {
        self.num_indices / 3
    }
}

/// A mesh: named range of shared buffers plus its geometries
#[derive(Clone, Debug)]
pub struct MeshInfo {
    /// Mesh name, used as the acceleration structure's debug name
    pub name: String,
    /// Shared buffers
    pub buffers: Arc<MeshBuffers>,
    /// First index of the mesh inside the index buffer
    pub index_offset: u32,
    /// First vertex of the mesh inside the vertex buffer
    pub vertex_offset: u32,
    /// Geometries in slot order
    pub geometries: Vec<MeshGeometry>,
    /// Regenerated every frame (skinned) rather than built once
    pub skinned: bool,
}

impl MeshInfo {
    /// Create an empty static mesh
    pub fn new(name: impl Into<String>, buffers: Arc<MeshBuffers>) -> Self {
        Self {
            name: name.into(),
            buffers,
            index_offset: 0,
            vertex_offset: 0,
            geometries: Vec::new(),
            skinned: false,
        }
    }

    /// Set the mesh's first index and vertex
    pub fn with_offsets(mut self, index_offset: u32, vertex_offset: u32) -> Self {
        self.index_offset = index_offset;
        self.vertex_offset = vertex_offset;
        self
    }

    /// Add a geometry
    pub fn with_geometry(mut self, geometry: MeshGeometry) -> Self {
        self.geometries.push(geometry);
        self
    }

    /// Mark the mesh as skinned (rebuilt every frame)
    pub fn skinned(mut self) -> Self {
        self.skinned = true;
        self
    }

    /// Total number of triangles over all geometries
    pub fn triangle_count(&self) -> u64 {
        self.geometries.iter().map(|g| g.triangle_count() as u64).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Buffer, MaterialDomain};

    fn buffers() -> Arc<MeshBuffers> {
        Arc::new(MeshBuffers::new(Buffer::empty("ib"), Buffer::empty("vb")))
    }

    #[test]
    fn test_triangle_count() {
        let material = Arc::new(Material::new("m", MaterialDomain::Opaque));
        let mesh = MeshInfo::new("mesh", buffers())
            .with_geometry(MeshGeometry::new(material.clone(), 6, 4))
            .with_geometry(MeshGeometry::new(material, 9, 5).with_offsets(6, 4));
        assert_eq!(mesh.geometries[0].triangle_count(), 2);
        assert_eq!(mesh.triangle_count(), 5);
        assert!(!mesh.skinned);
    }

    #[test]
    fn test_skinned_builder() {
        let mesh = MeshInfo::new("character", buffers()).with_offsets(30, 10).skinned();
        assert!(mesh.skinned);
        assert_eq!(mesh.index_offset, 30);
        assert_eq!(mesh.vertex_offset, 10);
    }
}
