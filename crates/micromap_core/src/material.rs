//! Material metadata relevant to ray tracing geometry

use serde::{Deserialize, Serialize};

/// How a material's surface interacts with rays
///
/// A closed set; the geometry builder matches on it exhaustively.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialDomain {
    /// Solid surface, never needs an alpha test
    #[default]
    Opaque,
    /// Cut-out surface driven by an alpha texture
    AlphaTested,
    /// Refractive or thin-transmissive surface
    Transmissive,
    /// Transmissive surface that is also alpha tested
    TransmissiveAlphaTested,
}

impl MaterialDomain {
    /// Whether hits need an alpha test (and so benefit from an OMM)
    #[inline]
    pub fn is_alpha_tested(self) -> bool {
        matches!(self, MaterialDomain::AlphaTested | MaterialDomain::TransmissiveAlphaTested)
    }
}

/// The material properties the acceleration-structure build cares about
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Material name (for logs and debugging)
    pub name: String,
    /// Surface domain
    #[serde(default)]
    pub domain: MaterialDomain,
    /// Opt out of next-event estimation
    #[serde(default)]
    pub exclude_from_nee: bool,
    /// Alpha threshold used by the alpha test (and by OMM baking)
    #[serde(default = "default_alpha_cutoff")]
    pub alpha_cutoff: f32,
    /// Path of the base color / alpha texture, if any
    #[serde(default)]
    pub alpha_texture: Option<String>,
    /// Whether the alpha texture is enabled
    #[serde(default = "default_true")]
    pub enable_alpha_texture: bool,
}

fn default_alpha_cutoff() -> f32 {
    0.5
}

fn default_true() -> bool {
    true
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            domain: MaterialDomain::Opaque,
            exclude_from_nee: false,
            alpha_cutoff: default_alpha_cutoff(),
            alpha_texture: None,
            enable_alpha_texture: true,
        }
    }
}

impl Material {
    /// Create a new material with the given domain
    pub fn new(name: impl Into<String>, domain: MaterialDomain) -> Self {
        Self {
            name: name.into(),
            domain,
            ..Self::default()
        }
    }

    /// Exclude this material from next-event estimation
    pub fn excluded_from_nee(mut self) -> Self {
        self.exclude_from_nee = true;
        self
    }

    /// Set the alpha texture path
    pub fn with_alpha_texture(mut self, path: impl Into<String>) -> Self {
        self.alpha_texture = Some(path.into());
        self
    }

    /// Whether an alpha texture is present and enabled
    pub fn has_alpha_texture(&self) -> bool {
        self.enable_alpha_texture && self.alpha_texture.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alpha_tested_domains() {
        assert!(!MaterialDomain::Opaque.is_alpha_tested());
        assert!(MaterialDomain::AlphaTested.is_alpha_tested());
        assert!(!MaterialDomain::Transmissive.is_alpha_tested());
        assert!(MaterialDomain::TransmissiveAlphaTested.is_alpha_tested());
    }

    #[test]
    fn test_default_material() {
        let m = Material::default();
        assert_eq!(m.domain, MaterialDomain::Opaque);
        assert!(!m.exclude_from_nee);
        assert_eq!(m.alpha_cutoff, 0.5);
        assert!(!m.has_alpha_texture());
    }

    #[test]
    fn test_alpha_texture_can_be_disabled() {
        let mut m = Material::new("leaves", MaterialDomain::AlphaTested).with_alpha_texture("leaves.png");
        assert!(m.has_alpha_texture());
        m.enable_alpha_texture = false;
        assert!(!m.has_alpha_texture());
    }

    #[test]
    fn test_material_ron_defaults() {
        let m: Material = ron::from_str("(name: \"glass\", domain: Transmissive)").unwrap();
        assert_eq!(m.domain, MaterialDomain::Transmissive);
        assert!(!m.exclude_from_nee);
        assert!(m.enable_alpha_texture);
    }
}
