//! Amortised OMM build queue
//!
//! Each queued mesh goes through three stages, one stage per [`update`]:
//!
//! 1. **Setup** - ask the baker for sizes and sub-allocate index and
//!    descriptor regions
//! 2. **Bake and build** - sub-allocate state data, bake every geometry into
//!    shared buffers, create the micromaps and the BLAS descriptor
//! 3. **Finalize** - collect per-geometry debug data and publish the result
//!
//! Only the oldest build advances on each call, so the cost of baking a
//! scene is spread over many frames.
//!
//! [`update`]: OmmBuildQueue::update

use std::collections::{HashMap, VecDeque};

use micromap_core::{
    Buffer, BufferHandle, Micromap, OmmAttachment, OmmDescriptorRecord, OmmIndexFormat, UsageHistogram,
};
use slotmap::{new_key_type, SlotMap};

use crate::{
    build_blas_desc, AccelStructDesc, BakeError, BakeRequest, BakeStats, BakeTarget, BuildError, OmmBaker,
    OmmBuildInput,
};

new_key_type! {
    /// Key to a build in the queue
    pub struct OmmBuildKey;
}

/// Alignment of every sub-allocation
pub const SUBALLOCATION_ALIGNMENT: u64 = 256;

/// Bump allocator handing out offsets into one buffer
#[derive(Clone, Debug, Default)]
pub struct LinearBufferAllocator {
    offset: u64,
}

impl LinearBufferAllocator {
    /// Create an empty allocator
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `size` bytes at the next multiple of `alignment`
    pub fn allocate(&mut self, size: u64, alignment: u64) -> u64 {
        self.offset = self.offset.next_multiple_of(alignment.max(1));
        let offset = self.offset;
        self.offset += size;
        offset
    }

    /// Bytes reserved so far
    pub fn size(&self) -> u64 {
        self.offset
    }

    /// Take zeroed storage covering every allocation and reset
    pub fn take_storage(&mut self) -> Vec<u8> {
        let storage = vec![0; self.offset as usize];
        self.offset = 0;
        storage
    }
}

/// Stage a build has completed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildStage {
    /// Waiting for its first update
    Queued,
    Setup,
    BakeAndBuild,
}

/// What an [`OmmBuildQueue::update`] call did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OmmBuildEvent {
    /// The build completed a stage and stays queued
    Advanced { key: OmmBuildKey, stage: BuildStage },
    /// The build finished; its result is ready
    Finished { key: OmmBuildKey },
    /// The build failed and was dropped; the error is ready as its result
    Failed { key: OmmBuildKey },
}

/// Debug data of one baked geometry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OmmGeometryDebug {
    pub geometry_index: usize,
    pub index_offset: u32,
    pub index_format: OmmIndexFormat,
    pub descriptor_offset: u32,
    pub array_data_offset: u32,
    /// Opaque plus transparent micro-triangles
    pub known: u64,
    pub unknown: u64,
}

/// Shared buffers and per-geometry debug data of one build
#[derive(Clone, Debug)]
pub struct OmmDebugData {
    pub index_buffer: BufferHandle,
    pub descriptor_buffer: BufferHandle,
    pub array_data_buffer: BufferHandle,
    pub geometries: Vec<OmmGeometryDebug>,
}

/// Output of a finished build
#[derive(Clone, Debug)]
pub struct OmmBuildResult {
    /// BLAS descriptor with the micromaps attached
    pub blas: AccelStructDesc,
    /// One slot per mesh geometry, `None` where nothing was baked
    pub attachments: Vec<Option<OmmAttachment>>,
    pub debug: OmmDebugData,
}

/// Sizes and offsets of one geometry inside the shared buffers
#[derive(Clone, Debug)]
struct GeometryBufferInfo {
    index_format: OmmIndexFormat,
    index_offset: u64,
    index_size: u64,
    descriptor_offset: u64,
    descriptor_size: u64,
    array_data_size: u64,
    index_histogram: UsageHistogram,
    array_histogram: UsageHistogram,
    // Known after bake-and-build
    array_data_offset: u32,
    stats: BakeStats,
}

struct BuildTask {
    input: OmmBuildInput,
    stage: BuildStage,
    buffer_infos: Vec<GeometryBufferInfo>,
    index_allocator: LinearBufferAllocator,
    descriptor_allocator: LinearBufferAllocator,
    built: Option<(OmmDebugData, AccelStructDesc, Vec<Option<OmmAttachment>>)>,
}

impl BuildTask {
    fn new(input: OmmBuildInput) -> Self {
        Self {
            input,
            stage: BuildStage::Queued,
            buffer_infos: Vec::new(),
            index_allocator: LinearBufferAllocator::new(),
            descriptor_allocator: LinearBufferAllocator::new(),
            built: None,
        }
    }

    fn request(&self, i: usize) -> BakeRequest<'_> {
        let geometry = &self.input.geometries[i];
        BakeRequest {
            mesh: &self.input.mesh,
            geometry_index: geometry.geometry_index,
            geometry: &self.input.mesh.geometries[geometry.geometry_index],
            settings: &geometry.settings,
        }
    }

    fn run_setup(&mut self, baker: &mut dyn OmmBaker) -> Result<(), BakeError> {
        self.check_geometries()?;

        let mut infos = Vec::with_capacity(self.input.geometries.len());
        for i in 0..self.input.geometries.len() {
            let request = self.request(i);
            let setup = baker.setup(&request)?;

            let triangle_count = request.triangle_count();
            if setup.index_count != triangle_count {
                return Err(BuildError::IndexCountMismatch {
                    geometry: request.geometry_index,
                    index_count: setup.index_count,
                    triangle_count,
                }
                .into());
            }
            let index_required = setup.index_count as u64 * setup.index_format.stride() as u64;
            if setup.index_buffer_size < index_required {
                return Err(BakeError::UndersizedBuffer {
                    geometry: request.geometry_index,
                    buffer: "OMM index",
                    size: setup.index_buffer_size,
                    required: index_required,
                });
            }
            let descriptor_required = setup.array_histogram.total() * OmmDescriptorRecord::SIZE as u64;
            if setup.descriptor_buffer_size < descriptor_required {
                return Err(BakeError::UndersizedBuffer {
                    geometry: request.geometry_index,
                    buffer: "OMM descriptor",
                    size: setup.descriptor_buffer_size,
                    required: descriptor_required,
                });
            }

            let limit = request.settings.max_array_data_size();
            if setup.array_data_size > limit {
                return Err(BakeError::ArrayDataBudget {
                    geometry: request.geometry_index,
                    size: setup.array_data_size,
                    limit,
                });
            }

            infos.push(GeometryBufferInfo {
                index_format: setup.index_format,
                index_offset: self
                    .index_allocator
                    .allocate(setup.index_buffer_size, SUBALLOCATION_ALIGNMENT),
                index_size: setup.index_buffer_size,
                descriptor_offset: self
                    .descriptor_allocator
                    .allocate(setup.descriptor_buffer_size, SUBALLOCATION_ALIGNMENT),
                descriptor_size: setup.descriptor_buffer_size,
                array_data_size: setup.array_data_size,
                index_histogram: setup.index_histogram,
                array_histogram: setup.array_histogram,
                array_data_offset: u32::MAX,
                stats: BakeStats::default(),
            });
        }
        self.buffer_infos = infos;
        Ok(())
    }

    /// Every geometry slot must exist and be baked at most once
    fn check_geometries(&self) -> Result<(), BakeError> {
        let geometry_count = self.input.mesh.geometries.len();
        let mut seen = vec![false; geometry_count];
        for geometry in &self.input.geometries {
            let slot = geometry.geometry_index;
            if slot >= geometry_count {
                return Err(BakeError::GeometryOutOfRange {
                    geometry: slot,
                    geometry_count,
                });
            }
            if std::mem::replace(&mut seen[slot], true) {
                return Err(BakeError::DuplicateGeometry { geometry: slot });
            }
        }
        Ok(())
    }

    fn run_bake_and_build(&mut self, baker: &mut dyn OmmBaker) -> Result<(), BakeError> {
        let mut array_allocator = LinearBufferAllocator::new();
        for (info, geometry) in self.buffer_infos.iter_mut().zip(&self.input.geometries) {
            let offset = array_allocator.allocate(info.array_data_size, SUBALLOCATION_ALIGNMENT);
            info.array_data_offset = to_u32(offset, geometry.geometry_index, "OMM array data")?;
        }

        let mut index_data = self.index_allocator.take_storage();
        let mut descriptor_data = self.descriptor_allocator.take_storage();
        let mut array_data = array_allocator.take_storage();

        for i in 0..self.buffer_infos.len() {
            let request = self.request(i);
            let info = &self.buffer_infos[i];
            let target = BakeTarget {
                index: region(&mut index_data, info.index_offset, info.index_size),
                descriptors: region(&mut descriptor_data, info.descriptor_offset, info.descriptor_size),
                states: region(&mut array_data, info.array_data_offset as u64, info.array_data_size),
            };
            let stats = baker.bake(&request, target)?;
            self.buffer_infos[i].stats = stats;
        }

        let index_buffer = Buffer::new("OmmIndexBuffer", index_data);
        let descriptor_buffer = Buffer::new("OmmDescBuffer", descriptor_data);
        let array_data_buffer = Buffer::new("OmmArrayBuffer", array_data);

        let mesh = &self.input.mesh;
        let mut attachments: Vec<Option<OmmAttachment>> = vec![None; mesh.geometries.len()];
        let mut geometries = Vec::with_capacity(self.buffer_infos.len());

        for (info, geometry) in self.buffer_infos.iter().zip(&self.input.geometries) {
            let slot = geometry.geometry_index;
            let index_offset = to_u32(info.index_offset, slot, "OMM index")?;
            let descriptor_offset = to_u32(info.descriptor_offset, slot, "OMM descriptor")?;

            let micromap = Micromap::new(
                format!("{}/omm{}", mesh.name, slot),
                geometry.settings.build_flags,
                info.array_histogram.clone(),
            );
            attachments[slot] = Some(OmmAttachment {
                micromap,
                index_format: info.index_format,
                index_buffer: index_buffer.clone(),
                index_buffer_offset: index_offset,
                descriptor_buffer: descriptor_buffer.clone(),
                descriptor_buffer_offset: descriptor_offset,
                state_buffer: array_data_buffer.clone(),
                state_buffer_offset: info.array_data_offset,
                usage_histogram: info.index_histogram.clone(),
            });
            geometries.push(OmmGeometryDebug {
                geometry_index: slot,
                index_offset,
                index_format: info.index_format,
                descriptor_offset,
                array_data_offset: info.array_data_offset,
                known: info.stats.known(),
                unknown: info.stats.unknown,
            });
        }

        let blas = build_blas_desc(&self.input.bvh, mesh, Some(attachments.as_slice()))?;
        let debug = OmmDebugData {
            index_buffer,
            descriptor_buffer,
            array_data_buffer,
            geometries,
        };
        self.built = Some((debug, blas, attachments));
        Ok(())
    }

    fn finalize(&mut self) -> Option<OmmBuildResult> {
        let (debug, blas, attachments) = self.built.take()?;
        for geometry in &debug.geometries {
            log::debug!(
                "{} geometry {}: {} known, {} unknown micro-triangles, {:?} indices",
                self.input.mesh.name,
                geometry.geometry_index,
                geometry.known,
                geometry.unknown,
                geometry.index_format
            );
        }
        Some(OmmBuildResult {
            blas,
            attachments,
            debug,
        })
    }
}

fn to_u32(offset: u64, geometry: usize, buffer: &'static str) -> Result<u32, BakeError> {
    u32::try_from(offset).map_err(|_| BakeError::OffsetOverflow {
        geometry,
        buffer,
        offset,
    })
}

fn region(storage: &mut [u8], offset: u64, size: u64) -> &mut [u8] {
    let start = offset as usize;
    &mut storage[start..start + size as usize]
}

/// Queue of OMM builds, advanced one stage per update
#[derive(Default)]
pub struct OmmBuildQueue {
    pending: SlotMap<OmmBuildKey, BuildTask>,
    order: VecDeque<OmmBuildKey>,
    finished: HashMap<OmmBuildKey, Result<OmmBuildResult, BakeError>>,
}

impl OmmBuildQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a build and return its key
    pub fn queue_build(&mut self, input: OmmBuildInput) -> OmmBuildKey {
        log::info!(
            "Queued OMM build for '{}' ({} geometries)",
            input.mesh.name,
            input.geometries.len()
        );
        let key = self.pending.insert(BuildTask::new(input));
        self.order.push_back(key);
        key
    }

    /// Number of builds not finished yet
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Last completed stage of a pending build
    pub fn stage(&self, key: OmmBuildKey) -> Option<BuildStage> {
        self.pending.get(key).map(|task| task.stage)
    }

    /// Drop every unfinished build
    pub fn cancel_pending(&mut self) {
        if !self.pending.is_empty() {
            log::info!("Cancelled {} pending OMM builds", self.pending.len());
        }
        self.pending.clear();
        self.order.clear();
    }

    /// Take the result of a finished or failed build
    pub fn take_result(&mut self, key: OmmBuildKey) -> Option<Result<OmmBuildResult, BakeError>> {
        self.finished.remove(&key)
    }

    /// Advance the oldest pending build by one stage
    ///
    /// Returns `None` when nothing is pending.
    pub fn update(&mut self, baker: &mut dyn OmmBaker) -> Option<OmmBuildEvent> {
        let key = *self.order.front()?;
        let task = self.pending.get_mut(key)?;

        let outcome = match task.stage {
            BuildStage::Queued => task.run_setup(baker).map(|()| Some(BuildStage::Setup)),
            BuildStage::Setup => task.run_bake_and_build(baker).map(|()| Some(BuildStage::BakeAndBuild)),
            BuildStage::BakeAndBuild => Ok(None),
        };

        match outcome {
            Ok(Some(stage)) => {
                log::debug!("OMM build '{}' completed {:?}", task.input.mesh.name, stage);
                task.stage = stage;
                Some(OmmBuildEvent::Advanced { key, stage })
            }
            Ok(None) => {
                let result = task.finalize();
                self.retire(key);
                match result {
                    Some(result) => {
                        log::info!(
                            "Finished OMM build '{}': {} micromaps attached",
                            result.blas.debug_name,
                            result.blas.omm_geometry_count()
                        );
                        self.finished.insert(key, Ok(result));
                        Some(OmmBuildEvent::Finished { key })
                    }
                    None => None,
                }
            }
            Err(err) => {
                log::warn!("OMM build '{}' failed: {}", task.input.mesh.name, err);
                self.retire(key);
                self.finished.insert(key, Err(err));
                Some(OmmBuildEvent::Failed { key })
            }
        }
    }

    /// Run updates until nothing is pending, returning the number of calls
    pub fn flush(&mut self, baker: &mut dyn OmmBaker) -> usize {
        let mut updates = 0;
        while self.update(baker).is_some() {
            updates += 1;
        }
        updates
    }

    fn retire(&mut self, key: OmmBuildKey) {
        self.pending.remove(key);
        self.order.retain(|k| *k != key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BakeSetup, BvhConfig, OmmBakeSettings};
    use micromap_core::{Material, MaterialDomain, MeshBuffers, MeshGeometry, MeshInfo, OmmFormat};
    use std::sync::Arc;

    /// Reports a fixed setup and bakes nothing
    struct FixedBaker {
        setup: BakeSetup,
        setups: usize,
    }

    impl FixedBaker {
        fn new(setup: BakeSetup) -> Self {
            Self { setup, setups: 0 }
        }
    }

    impl OmmBaker for FixedBaker {
        fn setup(&mut self, _: &BakeRequest<'_>) -> Result<BakeSetup, BakeError> {
            self.setups += 1;
            Ok(self.setup.clone())
        }
        fn bake(&mut self, _: &BakeRequest<'_>, _: BakeTarget<'_>) -> Result<BakeStats, BakeError> {
            Ok(BakeStats::default())
        }
    }

    /// One alpha-tested geometry with two triangles
    fn leaf_mesh() -> Arc<MeshInfo> {
        let buffers = MeshBuffers::new(Buffer::empty("IndexBuffer"), Buffer::empty("VertexBuffer"));
        let material = Arc::new(Material::new("leaf", MaterialDomain::AlphaTested).with_alpha_texture("leaf.png"));
        Arc::new(MeshInfo::new("leaf", Arc::new(buffers)).with_geometry(MeshGeometry::new(material, 6, 4)))
    }

    fn two_triangle_setup() -> BakeSetup {
        let mut array_histogram = UsageHistogram::new();
        array_histogram.add(OmmFormat::Oc2FourState, 1, 1);
        let mut index_histogram = UsageHistogram::new();
        index_histogram.add(OmmFormat::Oc2FourState, 1, 2);
        BakeSetup {
            index_format: OmmIndexFormat::Uint16,
            index_count: 2,
            index_buffer_size: 4,
            descriptor_buffer_size: 8,
            index_histogram,
            array_histogram,
            array_data_size: 4,
        }
    }

    fn failed_error(queue: &mut OmmBuildQueue, baker: &mut FixedBaker, input: OmmBuildInput) -> BakeError {
        let key = queue.queue_build(input);
        assert_eq!(queue.update(baker), Some(OmmBuildEvent::Failed { key }));
        assert_eq!(queue.pending_count(), 0);
        match queue.take_result(key) {
            Some(Err(err)) => err,
            other => panic!("expected a failed build, got ok = {:?}", other.map(|r| r.is_ok())),
        }
    }

    #[test]
    fn test_geometry_out_of_range_fails_build() {
        let mut queue = OmmBuildQueue::new();
        let mut baker = FixedBaker::new(two_triangle_setup());
        let input = OmmBuildInput::new(leaf_mesh(), BvhConfig::default()).with_geometry(5, OmmBakeSettings::default());

        let err = failed_error(&mut queue, &mut baker, input);
        assert!(matches!(
            err,
            BakeError::GeometryOutOfRange {
                geometry: 5,
                geometry_count: 1
            }
        ));
        assert_eq!(baker.setups, 0);
    }

    #[test]
    fn test_duplicate_geometry_fails_build() {
        let mut queue = OmmBuildQueue::new();
        let mut baker = FixedBaker::new(two_triangle_setup());
        let input = OmmBuildInput::new(leaf_mesh(), BvhConfig::default())
            .with_geometry(0, OmmBakeSettings::default())
            .with_geometry(0, OmmBakeSettings::default());

        let err = failed_error(&mut queue, &mut baker, input);
        assert!(matches!(err, BakeError::DuplicateGeometry { geometry: 0 }));
    }

    #[test]
    fn test_undersized_index_buffer_fails_build() {
        let mut queue = OmmBuildQueue::new();
        let mut baker = FixedBaker::new(BakeSetup {
            index_buffer_size: 2,
            ..two_triangle_setup()
        });
        let input = OmmBuildInput::new(leaf_mesh(), BvhConfig::default()).with_geometry(0, OmmBakeSettings::default());

        let err = failed_error(&mut queue, &mut baker, input);
        assert!(matches!(
            err,
            BakeError::UndersizedBuffer {
                geometry: 0,
                buffer: "OMM index",
                size: 2,
                required: 4
            }
        ));
    }

    #[test]
    fn test_undersized_descriptor_buffer_fails_build() {
        let mut queue = OmmBuildQueue::new();
        let mut baker = FixedBaker::new(BakeSetup {
            descriptor_buffer_size: 0,
            ..two_triangle_setup()
        });
        let input = OmmBuildInput::new(leaf_mesh(), BvhConfig::default()).with_geometry(0, OmmBakeSettings::default());

        let err = failed_error(&mut queue, &mut baker, input);
        assert!(matches!(
            err,
            BakeError::UndersizedBuffer {
                buffer: "OMM descriptor",
                required: 8,
                ..
            }
        ));
    }

    #[test]
    fn test_exact_sizes_pass_setup() {
        let mut queue = OmmBuildQueue::new();
        let mut baker = FixedBaker::new(two_triangle_setup());
        let input = OmmBuildInput::new(leaf_mesh(), BvhConfig::default()).with_geometry(0, OmmBakeSettings::default());

        let key = queue.queue_build(input);
        assert_eq!(
            queue.update(&mut baker),
            Some(OmmBuildEvent::Advanced {
                key,
                stage: BuildStage::Setup
            })
        );
    }

    #[test]
    fn test_linear_allocator_alignment() {
        let mut allocator = LinearBufferAllocator::new();
        assert_eq!(allocator.allocate(10, 256), 0);
        assert_eq!(allocator.allocate(300, 256), 256);
        assert_eq!(allocator.allocate(0, 256), 768);
        assert_eq!(allocator.allocate(4, 256), 768);
        assert_eq!(allocator.size(), 772);

        let storage = allocator.take_storage();
        assert_eq!(storage.len(), 772);
        assert!(storage.iter().all(|b| *b == 0));
        assert_eq!(allocator.size(), 0);
    }

    #[test]
    fn test_offset_overflow() {
        assert_eq!(to_u32(u32::MAX as u64, 0, "x").ok(), Some(u32::MAX));
        assert!(matches!(
            to_u32(u32::MAX as u64 + 1, 3, "OMM array data"),
            Err(BakeError::OffsetOverflow { geometry: 3, offset: 0x1_0000_0000, .. })
        ));
    }

    #[test]
    fn test_empty_queue_update_is_none() {
        struct NeverCalled;
        impl OmmBaker for NeverCalled {
            fn setup(&mut self, _: &BakeRequest<'_>) -> Result<crate::BakeSetup, BakeError> {
                unreachable!()
            }
            fn bake(&mut self, _: &BakeRequest<'_>, _: BakeTarget<'_>) -> Result<BakeStats, BakeError> {
                unreachable!()
            }
        }

        let mut queue = OmmBuildQueue::new();
        assert_eq!(queue.update(&mut NeverCalled), None);
        assert_eq!(queue.flush(&mut NeverCalled), 0);
        assert_eq!(queue.pending_count(), 0);
    }
}
