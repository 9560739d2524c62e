//! Top-level instance selection
//!
//! Picks which of a mesh's two BLASes (plain or with micromaps) an instance
//! references, and the instance flags that control micromap traversal.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::AffineTransform;

bitflags! {
    /// Per-instance traversal flags
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct InstanceFlags: u8 {
        const TRIANGLE_CULL_DISABLE = 1 << 0;
        const TRIANGLE_FRONT_COUNTERCLOCKWISE = 1 << 1;
        /// Treat every geometry as opaque, any-hit is never invoked
        const FORCE_OPAQUE = 1 << 2;
        const FORCE_NON_OPAQUE = 1 << 3;
        /// Read unknown micromap states as their known counterparts
        const FORCE_OMM_2_STATE = 1 << 4;
        const DISABLE_OMMS = 1 << 5;
    }
}

/// Runtime micromap toggles; changing them needs no rebuild
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OmmInstanceSettings {
    /// Use the micromap BLAS where one exists
    pub enable: bool,
    /// Resolve unknown states without any-hit
    pub force_2_state: bool,
    /// Hide instances without a micromap BLAS
    pub only_omms: bool,
    /// Treat all geometry as opaque
    pub force_opaque: bool,
    /// A micromap debug view is active
    pub debug_view: bool,
}

impl Default for OmmInstanceSettings {
    fn default() -> Self {
        Self {
            enable: true,
            force_2_state: false,
            only_omms: false,
            force_opaque: false,
            debug_view: false,
        }
    }
}

/// Which BLAS of a mesh an instance references
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlasVariant {
    /// Built without micromaps
    Plain,
    /// Built with micromaps attached
    WithOmm,
}

/// One top-level instance
#[derive(Clone, Debug, PartialEq)]
pub struct InstanceDesc {
    pub blas: BlasVariant,
    pub instance_mask: u8,
    pub instance_id: u32,
    /// First hit group record of this instance's geometries
    pub hit_group_offset: u32,
    pub flags: InstanceFlags,
    pub transform: AffineTransform,
}

/// Describe one top-level instance
///
/// The debug view has to intersect transparent micro-triangles, so it (like
/// force-opaque) uses the plain BLAS with every geometry forced opaque.
pub fn instance_desc(
    has_omm_blas: bool,
    settings: &OmmInstanceSettings,
    instance_id: u32,
    hit_group_offset: u32,
    transform: AffineTransform,
) -> InstanceDesc {
    let force_opaque = settings.debug_view || settings.force_opaque;
    let use_omm_blas = settings.enable && has_omm_blas && !force_opaque;

    let mut flags = InstanceFlags::empty();
    if settings.force_2_state {
        flags |= InstanceFlags::FORCE_OMM_2_STATE;
    }
    if force_opaque {
        flags |= InstanceFlags::FORCE_OPAQUE;
    }

    InstanceDesc {
        blas: if use_omm_blas {
            BlasVariant::WithOmm
        } else {
            BlasVariant::Plain
        },
        instance_mask: if settings.only_omms && !has_omm_blas { 0 } else { 1 },
        instance_id,
        hit_group_offset,
        flags,
        transform,
    }
}

/// Accumulates instances, assigning consecutive hit group ranges
#[derive(Clone, Debug, Default)]
pub struct InstanceList {
    instances: Vec<InstanceDesc>,
    sub_instance_count: u32,
}

impl InstanceList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an instance of a mesh with `geometry_count` geometries
    pub fn push(
        &mut self,
        has_omm_blas: bool,
        geometry_count: u32,
        settings: &OmmInstanceSettings,
        transform: AffineTransform,
    ) -> &InstanceDesc {
        let desc = instance_desc(
            has_omm_blas,
            settings,
            self.sub_instance_count,
            self.sub_instance_count,
            transform,
        );
        self.sub_instance_count += geometry_count;
        self.instances.push(desc);
        &self.instances[self.instances.len() - 1]
    }

    /// All instances so far
    pub fn instances(&self) -> &[InstanceDesc] {
        &self.instances
    }

    /// Total geometries over all instances
    pub fn sub_instance_count(&self) -> u32 {
        self.sub_instance_count
    }
}
