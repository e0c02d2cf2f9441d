//! Render backend for one graphics context
//!
//! Owns the capability table, the resource registry and the timestamp
//! profiler. Create it right after the context is made current and drop it
//! before the context is destroyed; everything that needs capabilities or
//! resource dispatch borrows it from here.

use crate::capabilities::CapabilityTable;
use crate::context::DriverContext;
use crate::registry::{RegistryError, ResourceRegistry};
use crate::resource::{InstanceKind, ResourceKind, ResourcePool, StoragePool};
use crate::storage::{
    CanvasTexture, Light, Lightmap, Material, Mesh, MeshInstance, Multimesh, RenderTarget, Shader,
    Texture,
};
use crate::timer::HeadlessTimer;
use crate::{DeviceType, Platform};
use ember_core::{ConfigSource, DependencyTracker, HandleAllocator, ResourceHandle};
use ember_metrics::{GpuTimer, ProfilerConfig, TimestampProfiler};
use std::sync::Arc;

/// Name of the timestamp callers record when their frame work starts.
pub const FRAME_BEGIN_TIMESTAMP: &str = "Frame Begin";

pub struct RenderBackend<T: GpuTimer = HeadlessTimer> {
    capabilities: CapabilityTable,
    registry: ResourceRegistry,
    profiler: TimestampProfiler<T>,
    allocator: Arc<HandleAllocator>,
}

impl<T: GpuTimer> RenderBackend<T> {
    /// Probe the context and register a storage pool for every resource kind.
    pub fn new(
        ctx: &dyn DriverContext,
        config: &dyn ConfigSource,
        platform: Platform,
        timer: T,
        profiler: ProfilerConfig,
    ) -> Result<Self, RegistryError> {
        let capabilities = CapabilityTable::probe(ctx, config, platform);
        let allocator = Arc::new(HandleAllocator::new());

        let pools: [Box<dyn ResourcePool>; 10] = [
            Box::new(StoragePool::<RenderTarget>::new(Arc::clone(&allocator))),
            Box::new(StoragePool::<Texture>::new(Arc::clone(&allocator))),
            Box::new(StoragePool::<CanvasTexture>::new(Arc::clone(&allocator))),
            Box::new(StoragePool::<Shader>::new(Arc::clone(&allocator))),
            Box::new(StoragePool::<Material>::new(Arc::clone(&allocator))),
            Box::new(StoragePool::<Mesh>::new(Arc::clone(&allocator))),
            Box::new(StoragePool::<Multimesh>::new(Arc::clone(&allocator))),
            Box::new(StoragePool::<MeshInstance>::new(Arc::clone(&allocator))),
            Box::new(StoragePool::<Light>::new(Arc::clone(&allocator))),
            Box::new(StoragePool::<Lightmap>::new(Arc::clone(&allocator))),
        ];
        let mut registry = ResourceRegistry::new();
        for pool in pools {
            registry.register_pool(pool)?;
        }

        tracing::info!(
            "Render backend ready on {} ({})",
            capabilities.adapter_name,
            capabilities.api_version
        );

        Ok(Self {
            capabilities,
            registry,
            profiler: TimestampProfiler::new(timer, profiler),
            allocator,
        })
    }

    pub fn capabilities(&self) -> &CapabilityTable {
        &self.capabilities
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ResourceRegistry {
        &mut self.registry
    }

    /// Allocator shared by all pools; hand it to pools registered later.
    pub fn allocator(&self) -> &Arc<HandleAllocator> {
        &self.allocator
    }

    pub fn profiler(&self) -> &TimestampProfiler<T> {
        &self.profiler
    }

    // ------------------------------------------------------------------
    // Feature and adapter queries
    // ------------------------------------------------------------------

    pub fn has_os_feature(&self, feature: &str) -> bool {
        self.capabilities.has_feature(feature)
    }

    pub fn maximum_viewport_size(&self) -> (u32, u32) {
        self.capabilities.max_viewport_size()
    }

    pub fn video_adapter_name(&self) -> &str {
        &self.capabilities.adapter_name
    }

    pub fn video_adapter_vendor(&self) -> &str {
        &self.capabilities.adapter_vendor
    }

    pub fn video_adapter_type(&self) -> DeviceType {
        self.capabilities.device_type
    }

    pub fn video_adapter_api_version(&self) -> &str {
        &self.capabilities.api_version
    }

    // ------------------------------------------------------------------
    // Resources
    // ------------------------------------------------------------------

    pub fn free(&mut self, handle: ResourceHandle) -> bool {
        self.registry.free(handle)
    }

    pub fn classify(&self, handle: ResourceHandle) -> Option<ResourceKind> {
        self.registry.classify(handle)
    }

    pub fn base_type(&self, handle: ResourceHandle) -> InstanceKind {
        self.registry.base_type(handle)
    }

    pub fn base_update_dependency(&self, base: ResourceHandle, instance: &mut DependencyTracker) {
        self.registry.propagate_dependency(base, instance);
    }

    pub fn update_dirty_resources(&mut self) {
        self.registry.update_dirty_resources();
    }

    // ------------------------------------------------------------------
    // Timestamps
    // ------------------------------------------------------------------

    /// Start of a rendered frame; resolves the slot captured a ring ago.
    pub fn begin_frame(&mut self) {
        self.profiler.begin_frame();
    }

    pub fn end_frame(&mut self) {
        self.profiler.end_frame();
    }

    pub fn capture_timestamps_begin(&mut self) {
        self.capture_timestamp(FRAME_BEGIN_TIMESTAMP);
    }

    /// Record a named timestamp. Past the per-frame capacity the timestamp
    /// is dropped with a warning; the frame carries on.
    pub fn capture_timestamp(&mut self, name: &str) {
        if let Err(err) = self.profiler.capture(name) {
            tracing::warn!("{err}");
        }
    }

    pub fn capture_timestamps_end(&mut self) {
        self.end_frame();
    }

    pub fn captured_timestamps_count(&self) -> usize {
        self.profiler.captured_count()
    }

    pub fn captured_timestamps_frame(&self) -> u64 {
        self.profiler.captured_frame()
    }

    pub fn captured_timestamp_gpu_time(&self, index: usize) -> Option<u64> {
        self.profiler.captured_gpu_time(index)
    }

    pub fn captured_timestamp_cpu_time(&self, index: usize) -> Option<u64> {
        self.profiler.captured_cpu_time(index)
    }

    pub fn captured_timestamp_name(&self, index: usize) -> Option<&str> {
        self.profiler.captured_name(index)
    }
}

impl<T: GpuTimer> Drop for RenderBackend<T> {
    fn drop(&mut self) {
        let leaked = self.registry.len();
        if leaked > 0 {
            tracing::warn!("Render backend torn down with {leaked} live resources");
        } else {
            tracing::debug!("Render backend torn down");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{FloatQuery, HeadlessContext};
    use crate::storage::LightType;
    use crate::TargetOs;
    use ember_core::EmptyConfig;

    fn backend() -> RenderBackend {
        RenderBackend::new(
            &HeadlessContext::typical_desktop(),
            &EmptyConfig,
            Platform::desktop_gl(TargetOs::Linux),
            HeadlessTimer::new(),
            ProfilerConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_every_kind_has_a_pool() {
        let backend = backend();
        let kinds: Vec<_> = backend.registry().pool_kinds().collect();
        assert_eq!(kinds, ResourceKind::ALL.to_vec());
    }

    #[test]
    fn test_feature_queries() {
        let backend = backend();
        assert!(backend.has_os_feature("s3tc"));
        assert!(backend.has_os_feature("bptc"));
        assert!(backend.has_os_feature("rgtc"));
        assert!(!backend.has_os_feature("etc2"));
        assert!(!backend.has_os_feature("pvrtc"));
        assert_eq!(backend.maximum_viewport_size(), (16384, 16384));
        assert_eq!(backend.video_adapter_vendor(), "Ember");
        assert_eq!(backend.video_adapter_type(), DeviceType::Other);
    }

    #[test]
    fn test_anisotropy_from_context() {
        let backend = RenderBackend::new(
            &HeadlessContext::typical_desktop()
                .with_float(FloatQuery::MaxTextureMaxAnisotropy, 2.0),
            &EmptyConfig,
            Platform::desktop_gl(TargetOs::Windows),
            HeadlessTimer::new(),
            ProfilerConfig::default(),
        )
        .unwrap();
        assert_eq!(backend.capabilities().anisotropic_level, 2.0);
    }

    #[test]
    fn test_free_through_backend() {
        let mut backend = backend();
        let mesh = backend.registry_mut().create(Mesh::with_surfaces(2)).unwrap();
        let instance = backend
            .registry_mut()
            .create(MeshInstance { mesh })
            .unwrap();
        let light = backend.registry_mut().create(Light::new(LightType::Omni)).unwrap();

        assert_eq!(backend.classify(instance), Some(ResourceKind::MeshInstance));
        assert_eq!(backend.base_type(instance), InstanceKind::None);
        assert_eq!(backend.base_type(light), InstanceKind::Light);

        let mut tracker = DependencyTracker::new();
        backend.base_update_dependency(mesh, &mut tracker);
        assert_eq!(tracker.edge_count(), 1);

        for handle in [instance, mesh, light] {
            assert!(backend.free(handle));
            assert!(!backend.free(handle));
        }
        assert!(backend.registry().is_empty());
    }

    #[test]
    fn test_timestamp_round_trip() {
        let mut backend = backend();

        backend.begin_frame();
        backend.capture_timestamps_begin();
        backend.capture_timestamp("A");
        backend.capture_timestamp("B");
        backend.capture_timestamps_end();

        for _ in 0..ProfilerConfig::default().frame_count {
            backend.begin_frame();
            backend.end_frame();
        }

        assert_eq!(backend.captured_timestamps_frame(), 0);
        assert_eq!(backend.captured_timestamps_count(), 5);
        assert_eq!(backend.captured_timestamp_name(1), Some(FRAME_BEGIN_TIMESTAMP));
        assert_eq!(backend.captured_timestamp_name(2), Some("A"));
        assert_eq!(backend.captured_timestamp_name(3), Some("B"));
        assert_eq!(backend.captured_timestamp_name(5), None);

        let cpu = |i| backend.captured_timestamp_cpu_time(i);
        let gpu = |i| backend.captured_timestamp_gpu_time(i);
        for i in 1..backend.captured_timestamps_count() {
            assert!(cpu(i) >= cpu(i - 1));
            assert!(gpu(i) >= gpu(i - 1));
        }
    }

    #[test]
    fn test_capture_overflow_is_not_fatal() {
        let mut backend = RenderBackend::new(
            &HeadlessContext::new(),
            &EmptyConfig,
            Platform::desktop_gl(TargetOs::Linux),
            HeadlessTimer::new(),
            ProfilerConfig {
                frame_count: 2,
                max_queries: 8,
            },
        )
        .unwrap();

        for _ in 0..3 {
            backend.begin_frame();
            for i in 0..100 {
                backend.capture_timestamp(&format!("pass {i}"));
            }
            backend.end_frame();
        }
        assert_eq!(backend.captured_timestamps_count(), 8);
    }

    #[test]
    fn test_zero_frame_ring_is_not_fatal() {
        let mut backend = RenderBackend::new(
            &HeadlessContext::new(),
            &EmptyConfig,
            Platform::desktop_gl(TargetOs::Linux),
            HeadlessTimer::new(),
            ProfilerConfig {
                frame_count: 0,
                max_queries: 8,
            },
        )
        .unwrap();

        backend.begin_frame();
        backend.capture_timestamps_begin();
        backend.capture_timestamps_end();
        backend.begin_frame();
        assert_eq!(backend.profiler().frame_count(), 1);
        assert_eq!(backend.captured_timestamps_count(), 3);
    }

    #[test]
    fn test_profiler_owns_every_query() {
        let backend = backend();
        let config = ProfilerConfig::default();
        assert_eq!(
            backend.profiler().timer().live_queries(),
            config.frame_count * config.max_queries
        );
    }
}
