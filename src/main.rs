//! micromap - opacity micromap inspector
//!
//! Loads a bake manifest, builds the BLAS descriptor with its micromaps
//! attached and prints what ray traversal would see.
//!
//! Usage: `micromap [manifest.ron]` (defaults to `input.manifest` from the config)

use micromap::config::AppConfig;
use micromap::inspect::{inspect_manifest, render_grid, InspectReport};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let (config, config_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.debug.log_level.as_str())).init();
    if let Some(e) = config_error {
        log::warn!("Failed to load config: {}. Using defaults.", e);
    }

    let manifest = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| config.input.manifest.clone());

    match inspect_manifest(&config, &manifest) {
        Ok(report) => {
            print_report(&config, &report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}: {}", manifest.display(), e);
            ExitCode::FAILURE
        }
    }
}

fn print_report(config: &AppConfig, report: &InspectReport) {
    log::info!(
        "Built '{}': {} geometries, {} triangles, {} with micromaps ({:?})",
        report.blas.debug_name,
        report.blas.geometries.len(),
        report.blas.triangle_count(),
        report.blas.omm_geometry_count(),
        report.blas.build_flags
    );

    for (index, geometry) in report.blas.geometries.iter().enumerate() {
        let material = &report.mesh.geometries[index].material;
        println!(
            "geometry {index}: material '{}' ({:?}), {} triangles, flags {:?}{}{}",
            material.name,
            material.domain,
            geometry.triangles.triangle_count(),
            geometry.flags,
            if geometry.has_omm() { ", micromap" } else { "" },
            if geometry.is_culled() { ", culled" } else { "" },
        );
        if let Some(attachment) = &report.attachments[index] {
            for usage in attachment.usage_histogram.normalized() {
                println!(
                    "  {:?} level {}: {} primitives",
                    usage.format, usage.subdivision_level, usage.count
                );
            }
        }
    }

    for (geometry, stats) in &report.stats {
        let total = stats.known() + stats.unknown();
        let known_percent = if total > 0 {
            stats.known() as f64 * 100.0 / total as f64
        } else {
            0.0
        };
        println!(
            "geometry {geometry}: {} micro-triangles, {:.1}% known, {} special primitives, {} unique descriptors",
            total,
            known_percent,
            stats.special_primitive_count(),
            stats.unique_descriptors
        );
    }

    if let Some((geometry, rows)) = &report.grid {
        println!(
            "geometry {geometry}, primitive {} ({}x{} samples):",
            config.debug.grid_primitive, config.debug.grid_resolution, config.debug.grid_resolution
        );
        print!("{}", render_grid(rows));
    }

    let instance = &report.instance;
    println!(
        "instance: {:?} BLAS, mask {}, flags {:?}",
        instance.blas, instance.instance_mask, instance.flags
    );
}
