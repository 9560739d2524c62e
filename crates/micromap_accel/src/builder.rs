//! BLAS descriptor construction
//!
//! Turns a mesh and its optional per-geometry micromap attachments into an
//! [`AccelStructDesc`]. Material domains drive the opacity flags and the
//! transmissive culling transform; skinning drives the build flags.

use std::collections::BTreeSet;

use micromap_core::{Material, MaterialDomain, MeshInfo, OmmAttachment};
use micromap_query::compute_usage_histogram;

use crate::{
    AccelStructBuildFlags, AccelStructDesc, AffineTransform, BufferFormat, BuildError, BvhConfig,
    GeometryDesc, GeometryFlags, GeometryOmm, GeometryTriangles, DEGENERATE_TRANSFORM,
};

/// Maximum number of geometries in one BLAS
///
/// The geometry index shares the hit info word with the instance index and
/// only gets 12 bits.
pub const MAX_GEOMETRIES_PER_BLAS: usize = 1 << 12;

/// Opacity flags of a geometry
///
/// Alpha-tested domains and materials excluded from NEE need any-hit, so
/// they are non-opaque. An attached micromap then skips most of those
/// any-hit calls.
pub fn geometry_flags(material: &Material) -> GeometryFlags {
    let needs_any_hit = match material.domain {
        MaterialDomain::AlphaTested | MaterialDomain::TransmissiveAlphaTested => true,
        MaterialDomain::Opaque | MaterialDomain::Transmissive => material.exclude_from_nee,
    };
    if needs_any_hit {
        GeometryFlags::empty()
    } else {
        GeometryFlags::OPAQUE
    }
}

/// Transform attached to a geometry, if any
///
/// Transmissive geometries get [`DEGENERATE_TRANSFORM`] when the config
/// excludes them, so they keep their slot but can never be hit.
pub fn culling_transform(config: &BvhConfig, material: &Material) -> Option<AffineTransform> {
    (config.exclude_transmissive && material.domain == MaterialDomain::Transmissive).then_some(DEGENERATE_TRANSFORM)
}

/// Build flags for a mesh's BLAS
///
/// Skinned meshes are rebuilt every frame, compacting them does not pay off.
pub fn build_flags(mesh: &MeshInfo) -> AccelStructBuildFlags {
    if mesh.skinned {
        AccelStructBuildFlags::PREFER_FAST_BUILD
    } else {
        AccelStructBuildFlags::PREFER_FAST_TRACE | AccelStructBuildFlags::ALLOW_COMPACTION
    }
}

/// Check a declared usage histogram against the attachment's index buffer
///
/// Every one of the `triangle_count` primitives is resolved; the recomputed
/// histogram must equal the declared one bucket for bucket.
pub fn validate_attachment(
    geometry: usize,
    attachment: &OmmAttachment,
    triangle_count: u32,
) -> Result<(), BuildError> {
    let actual = compute_usage_histogram(&attachment.buffers(), triangle_count)
        .map_err(|source| BuildError::Decode { geometry, source })?;
    let declared = &attachment.usage_histogram;

    let buckets: BTreeSet<_> = declared
        .normalized()
        .into_iter()
        .chain(actual.normalized())
        .map(|c| (c.format, c.subdivision_level))
        .collect();

    for (format, level) in buckets {
        let expected = declared.count(format, level);
        let found = actual.count(format, level);
        if expected != found {
            return Err(BuildError::HistogramMismatch {
                geometry,
                format,
                level,
                expected,
                actual: found,
            });
        }
    }
    Ok(())
}

/// Build the BLAS descriptor of a mesh
///
/// `attachments`, when given, must hold one slot per geometry; `None` slots
/// get no micromap. Attached histograms are validated against their index
/// buffers before anything is returned.
pub fn build_blas_desc(
    config: &BvhConfig,
    mesh: &MeshInfo,
    attachments: Option<&[Option<OmmAttachment>]>,
) -> Result<AccelStructDesc, BuildError> {
    if mesh.geometries.len() > MAX_GEOMETRIES_PER_BLAS {
        return Err(BuildError::TooManyGeometries {
            mesh: mesh.name.clone(),
            count: mesh.geometries.len(),
            max: MAX_GEOMETRIES_PER_BLAS,
        });
    }
    if let Some(slots) = attachments {
        if slots.len() != mesh.geometries.len() {
            return Err(BuildError::AttachmentCountMismatch {
                mesh: mesh.name.clone(),
                geometries: mesh.geometries.len(),
                attachments: slots.len(),
            });
        }
    }

    let buffers = &mesh.buffers;
    let mut geometries = Vec::with_capacity(mesh.geometries.len());

    for (i, geometry) in mesh.geometries.iter().enumerate() {
        let index_offset =
            (mesh.index_offset as u64 + geometry.index_offset_in_mesh as u64) * BufferFormat::R32Uint.size() as u64;
        let vertex_offset = (mesh.vertex_offset as u64 + geometry.vertex_offset_in_mesh as u64)
            * BufferFormat::Rgb32Float.size() as u64
            + buffers.position_byte_offset;

        let omm = match attachments.and_then(|slots| slots[i].as_ref()) {
            Some(attachment) => {
                validate_attachment(i, attachment, geometry.triangle_count())?;
                Some(GeometryOmm::from(attachment))
            }
            None => None,
        };

        let desc = GeometryDesc {
            triangles: GeometryTriangles {
                index_buffer: buffers.index_buffer.clone(),
                index_offset,
                index_format: BufferFormat::R32Uint,
                index_count: geometry.num_indices,
                vertex_buffer: buffers.vertex_buffer.clone(),
                vertex_offset,
                vertex_format: BufferFormat::Rgb32Float,
                vertex_stride: BufferFormat::Rgb32Float.size(),
                vertex_count: geometry.num_vertices,
                omm,
            },
            transform: culling_transform(config, &geometry.material),
            flags: geometry_flags(&geometry.material),
        };

        log::debug!(
            "{} geometry {}: material '{}' ({:?}), {} triangles, opaque: {}, culled: {}, omm: {}",
            mesh.name,
            i,
            geometry.material.name,
            geometry.material.domain,
            geometry.triangle_count(),
            desc.is_opaque(),
            desc.is_culled(),
            desc.has_omm()
        );
        geometries.push(desc);
    }

    let desc = AccelStructDesc {
        debug_name: mesh.name.clone(),
        is_top_level: false,
        geometries,
        build_flags: build_flags(mesh),
    };
    log::info!(
        "Built BLAS descriptor '{}': {} geometries ({} with OMM), {} triangles",
        desc.debug_name,
        desc.geometries.len(),
        desc.omm_geometry_count(),
        desc.triangle_count()
    );
    Ok(desc)
}
