//! Build-time error types

use micromap_core::{DecodeError, OmmFormat};
use thiserror::Error;

/// Error raised while building a BLAS descriptor
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BuildError {
    /// The attachment slice does not have one slot per geometry
    #[error("mesh '{mesh}' has {geometries} geometries but {attachments} attachment slots")]
    AttachmentCountMismatch {
        mesh: String,
        geometries: usize,
        attachments: usize,
    },
    /// A declared usage histogram disagrees with the index buffer
    #[error(
        "geometry {geometry}: histogram declares {expected} primitives of {format:?} level {level}, index buffer has {actual}"
    )]
    HistogramMismatch {
        geometry: usize,
        format: OmmFormat,
        level: u16,
        expected: u32,
        actual: u32,
    },
    /// The baker produced a different number of index entries than the geometry has triangles
    #[error("geometry {geometry}: {index_count} OMM index entries for {triangle_count} triangles")]
    IndexCountMismatch {
        geometry: usize,
        index_count: u32,
        triangle_count: u32,
    },
    /// More geometries than the hit info can address
    #[error("mesh '{mesh}' has {count} geometries, at most {max} are supported")]
    TooManyGeometries { mesh: String, count: usize, max: usize },
    /// The OMM buffers could not be decoded during validation
    #[error("geometry {geometry}: {source}")]
    Decode {
        geometry: usize,
        #[source]
        source: DecodeError,
    },
}

/// Error raised by the OMM build queue
#[derive(Debug, Error)]
pub enum BakeError {
    /// The baker itself failed
    #[error("baker failed on geometry {geometry}: {message}")]
    Baker { geometry: usize, message: String },
    /// A sub-allocation does not fit 32-bit offsets
    #[error("{buffer} offset {offset} of geometry {geometry} exceeds 4 GiB")]
    OffsetOverflow {
        geometry: usize,
        buffer: &'static str,
        offset: u64,
    },
    /// A build input names a geometry the mesh does not have
    #[error("geometry {geometry} is out of range, mesh has {geometry_count} geometries")]
    GeometryOutOfRange { geometry: usize, geometry_count: usize },
    /// A build input names the same geometry twice
    #[error("geometry {geometry} is queued more than once")]
    DuplicateGeometry { geometry: usize },
    /// The baker reported a buffer too small for its own contents
    #[error("geometry {geometry}: {buffer} buffer of {size} bytes, at least {required} needed")]
    UndersizedBuffer {
        geometry: usize,
        buffer: &'static str,
        size: u64,
        required: u64,
    },
    /// State array data of one geometry exceeds the configured budget
    #[error("geometry {geometry} needs {size} bytes of OMM array data, limit is {limit}")]
    ArrayDataBudget { geometry: usize, size: u64, limit: u64 },
    /// Attaching the baked data failed
    #[error(transparent)]
    Build(#[from] BuildError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_mismatch_message() {
        let err = BuildError::HistogramMismatch {
            geometry: 2,
            format: OmmFormat::Oc2FourState,
            level: 4,
            expected: 10,
            actual: 9,
        };
        let msg = err.to_string();
        assert!(msg.contains("geometry 2"));
        assert!(msg.contains("Oc2FourState level 4"));
        assert!(msg.contains("index buffer has 9"));
    }

    #[test]
    fn test_decode_error_is_source() {
        use std::error::Error as _;

        let err = BuildError::Decode {
            geometry: 0,
            source: DecodeError::StateOutOfBounds { byte_offset: 12 },
        };
        assert!(err.source().is_some());
    }

    #[test]
    fn test_bake_error_wraps_build_error() {
        let err: BakeError = BuildError::TooManyGeometries {
            mesh: "tree".into(),
            count: 5000,
            max: 4096,
        }
        .into();
        assert!(matches!(err, BakeError::Build(BuildError::TooManyGeometries { .. })));
        assert!(err.to_string().contains("5000"));
    }
}
