//! Manifest inspection
//!
//! Loads a baked mesh, builds its BLAS descriptor with micromaps attached and
//! decodes the attached micromaps on the CPU.

use micromap_accel::{build_blas_desc, AccelStructDesc, AffineTransform, BuildError, InstanceDesc, InstanceList};
use micromap_core::{BakeManifest, DecodeError, ManifestLoadError, MeshInfo, OmmAttachment, OpacityState};
use micromap_query::{classify_grid, gather_stats, Classification, OmmStats};
use std::path::Path;
use thiserror::Error;

use crate::config::AppConfig;

/// Everything learned about one manifest
#[derive(Debug)]
pub struct InspectReport {
    pub mesh: MeshInfo,
    pub attachments: Vec<Option<OmmAttachment>>,
    pub blas: AccelStructDesc,
    /// One entry per geometry with a micromap, when stats are enabled
    pub stats: Vec<(usize, OmmStats)>,
    /// Classification grid of the configured primitive of the first attached geometry
    pub grid: Option<(usize, Vec<Vec<Classification>>)>,
    pub instance: InstanceDesc,
}

/// Error inspecting a manifest
#[derive(Debug, Error)]
pub enum InspectError {
    #[error("failed to load manifest: {0}")]
    Manifest(#[from] ManifestLoadError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("geometry {geometry}: {source}")]
    Decode { geometry: usize, source: DecodeError },
}

/// Load, build and decode the manifest at `path`
///
/// Buffer files are resolved relative to the manifest's directory.
pub fn inspect_manifest<P: AsRef<Path>>(config: &AppConfig, path: P) -> Result<InspectReport, InspectError> {
    let path = path.as_ref();
    let manifest = BakeManifest::load(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let (mesh, attachments) = manifest.instantiate(base_dir)?;

    let blas = build_blas_desc(&config.bvh.to_bvh_config(), &mesh, Some(&attachments[..]))?;

    let mut stats = Vec::new();
    if config.debug.gather_stats {
        for (geometry, attachment) in attachments.iter().enumerate() {
            let Some(attachment) = attachment else { continue };
            let triangle_count = mesh.geometries[geometry].triangle_count();
            let geometry_stats = gather_stats(&attachment.buffers(), triangle_count)
                .map_err(|source| InspectError::Decode { geometry, source })?;
            stats.push((geometry, geometry_stats));
        }
    }

    let first_attached = attachments
        .iter()
        .enumerate()
        .find_map(|(geometry, attachment)| attachment.as_ref().map(|a| (geometry, a)));
    let grid = match first_attached {
        Some((geometry, attachment)) if mesh.geometries[geometry].triangle_count() > config.debug.grid_primitive => {
            let rows = classify_grid(config.debug.grid_primitive, config.debug.grid_resolution, &attachment.buffers())
                .map_err(|source| InspectError::Decode { geometry, source })?;
            Some((geometry, rows))
        }
        _ => None,
    };

    let instance_settings = config.omm.to_instance_settings(&config.debug);
    let mut instances = InstanceList::new();
    let instance = instances
        .push(
            blas.omm_geometry_count() > 0,
            mesh.geometries.len() as u32,
            &instance_settings,
            AffineTransform::IDENTITY,
        )
        .clone();

    Ok(InspectReport {
        mesh,
        attachments,
        blas,
        stats,
        grid,
        instance,
    })
}

/// Character drawn for a classified sample
pub fn state_glyph(classification: &Classification) -> char {
    let glyph = match classification.hit.state() {
        OpacityState::Transparent => '.',
        OpacityState::Opaque => '#',
        OpacityState::UnknownTransparent => '?',
        OpacityState::UnknownOpaque => '%',
    };
    // Upright micro-triangles are drawn in the other case where one exists
    if classification.is_upright {
        match glyph {
            '#' => 'X',
            '.' => ',',
            other => other,
        }
    } else {
        glyph
    }
}

/// Render a classification grid as text, one row per line
pub fn render_grid(grid: &[Vec<Classification>]) -> String {
    let mut out = String::new();
    for row in grid.iter().rev() {
        out.extend(row.iter().map(state_glyph));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use micromap_query::OmmHit;

    fn sample(state: OpacityState, is_upright: bool) -> Classification {
        Classification {
            hit: OmmHit::Special(state),
            color: [0.0; 3],
            is_upright,
        }
    }

    #[test]
    fn test_state_glyphs() {
        assert_eq!(state_glyph(&sample(OpacityState::Opaque, false)), '#');
        assert_eq!(state_glyph(&sample(OpacityState::Opaque, true)), 'X');
        assert_eq!(state_glyph(&sample(OpacityState::Transparent, true)), ',');
        assert_eq!(state_glyph(&sample(OpacityState::UnknownOpaque, true)), '%');
    }

    #[test]
    fn test_render_grid_puts_first_row_last() {
        let grid = vec![
            vec![sample(OpacityState::Opaque, false), sample(OpacityState::Transparent, false)],
            vec![sample(OpacityState::UnknownTransparent, false)],
        ];
        assert_eq!(render_grid(&grid), "?\n#.\n");
    }

    #[test]
    fn test_missing_manifest() {
        let result = inspect_manifest(&AppConfig::default(), "does/not/exist.ron");
        assert!(matches!(result, Err(InspectError::Manifest(ManifestLoadError::Io(_)))));
    }
}
