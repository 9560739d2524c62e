//! Application configuration
//!
//! Configuration is loaded from multiple sources with the following priority (lowest to highest):
//! 1. `config/default.toml` (version controlled)
//! 2. `config/user.toml` (gitignored, user overrides)
//! 3. Environment variables (`OMM_SECTION__KEY`)

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use micromap_accel::{BvhConfig, OmmBakeSettings, OmmInstanceSettings};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Input files
    #[serde(default)]
    pub input: InputConfig,
    /// BLAS build options
    #[serde(default)]
    pub bvh: BvhSection,
    /// Micromap runtime toggles and bake settings
    #[serde(default)]
    pub omm: OmmConfig,
    /// Debug configuration
    #[serde(default)]
    pub debug: DebugConfig,
}

impl AppConfig {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. `config/default.toml`
    /// 2. `config/user.toml`
    /// 3. Environment variables (`OMM_*`)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific config directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::new();

        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        }

        if user_path.exists() {
            figment = figment.merge(Toml::file(&user_path));
        }

        // OMM_BVH__EXCLUDE_TRANSMISSIVE=true -> bvh.exclude_transmissive = true
        figment = figment.merge(Env::prefixed("OMM_").split("__"));

        Ok(figment.extract()?)
    }
}

/// Input files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Path of the RON bake manifest
    pub manifest: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            manifest: PathBuf::from("assets/bake.ron"),
        }
    }
}

/// BLAS build options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BvhSection {
    /// Cull transmissive geometry with the degenerate transform
    pub exclude_transmissive: bool,
}

impl BvhSection {
    /// Convert to the builder's config
    pub fn to_bvh_config(&self) -> BvhConfig {
        BvhConfig::new().with_exclude_transmissive(self.exclude_transmissive)
    }
}

/// Micromap configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OmmConfig {
    /// Use micromap BLASes where available
    pub enable: bool,
    /// Resolve unknown states without any-hit
    pub force_2_state: bool,
    /// Hide instances without micromaps
    pub only_omms: bool,
    /// Settings for newly baked micromaps
    pub bake: OmmBakeSettings,
}

impl Default for OmmConfig {
    fn default() -> Self {
        Self {
            enable: true,
            force_2_state: false,
            only_omms: false,
            bake: OmmBakeSettings::default(),
        }
    }
}

impl OmmConfig {
    /// Instance toggles, with the debug view taken from the debug section
    pub fn to_instance_settings(&self, debug: &DebugConfig) -> OmmInstanceSettings {
        OmmInstanceSettings {
            enable: self.enable,
            force_2_state: self.force_2_state,
            only_omms: self.only_omms,
            force_opaque: false,
            debug_view: debug.omm_debug_view,
        }
    }
}

/// Debug configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
    /// Samples per triangle edge when printing a classification grid
    pub grid_resolution: u32,
    /// Primitive whose classification grid is printed
    pub grid_primitive: u32,
    /// Decode every micro-triangle and print per-geometry statistics
    pub gather_stats: bool,
    /// Micromap debug view is active
    pub omm_debug_view: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            grid_resolution: 16,
            grid_primitive: 0,
            gather_stats: true,
            omm_debug_view: false,
        }
    }
}

/// Configuration error
#[derive(Debug, Error)]
#[error("Configuration error: {0}")]
pub struct ConfigError(#[from] Box<figment::Error>);

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError(Box::new(e))
    }
}
