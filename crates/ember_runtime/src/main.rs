//! Ember Runtime
//!
//! Boots a render backend against the best available context, pushes a few
//! resources and frames through it, and tears it down again.

use anyhow::{Context, Result};
use ember_core::DependencyTracker;
use ember_metrics::ProfilerConfig;
use ember_render::storage::{Light, LightType, Mesh, Multimesh};
use ember_render::{DriverContext, HeadlessContext, HeadlessTimer, Platform, RenderBackend};
use ember_services::Settings;
use tracing_subscriber::EnvFilter;

const DEMO_FRAMES: usize = 4;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Ember v{}", ember_core::VERSION);

    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::load(&path)
            .with_context(|| format!("loading settings from {path}"))?,
        None => Settings::default(),
    };
    let config = settings.snapshot()?;

    let ctx = probe_context();
    let mut backend = RenderBackend::new(
        ctx.as_ref(),
        &config,
        Platform::current(),
        HeadlessTimer::new(),
        ProfilerConfig::default(),
    )?;

    let (w, h) = backend.maximum_viewport_size();
    tracing::info!(
        "Adapter: {} / {} ({:?}), {}, viewport {w}x{h}",
        backend.video_adapter_name(),
        backend.video_adapter_vendor(),
        backend.video_adapter_type(),
        backend.video_adapter_api_version(),
    );
    for feature in ["s3tc", "bptc", "rgtc", "etc2"] {
        tracing::info!("  {feature}: {}", backend.has_os_feature(feature));
    }

    let registry = backend.registry_mut();
    let mesh = registry.create(Mesh::with_surfaces(1))?;
    let multimesh = registry.create(Multimesh::new(Some(mesh), 64))?;
    let light = registry.create(Light::new(LightType::Directional))?;

    let mut tracker = DependencyTracker::new();
    tracker.update_begin();
    backend.base_update_dependency(multimesh, &mut tracker);
    backend.base_update_dependency(light, &mut tracker);
    tracker.update_end();
    tracing::info!(
        "Instance of {:?} tracks {} dependencies",
        backend.base_type(multimesh),
        tracker.edge_count()
    );

    for _ in 0..DEMO_FRAMES {
        run_frame(&mut backend);
    }
    log_timestamps(&backend);

    for handle in [light, multimesh, mesh] {
        let kind = backend.classify(handle);
        let freed = backend.free(handle);
        tracing::info!("Free {handle} ({kind:?}): {freed}");
    }
    tracing::info!("Free {mesh} again: {}", backend.free(mesh));

    drop(backend);
    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(feature = "wgpu")]
fn probe_context() -> Box<dyn DriverContext> {
    match pollster::block_on(ember_render::WgpuContext::request_default()) {
        Some(ctx) => Box::new(ctx),
        None => {
            tracing::warn!("No GPU adapter available, falling back to headless");
            Box::new(HeadlessContext::typical_desktop())
        }
    }
}

#[cfg(not(feature = "wgpu"))]
fn probe_context() -> Box<dyn DriverContext> {
    Box::new(HeadlessContext::typical_desktop())
}

fn run_frame(backend: &mut RenderBackend) {
    backend.begin_frame();
    backend.capture_timestamps_begin();
    backend.update_dirty_resources();
    backend.capture_timestamp("Update Dirty");
    backend.capture_timestamp("Render Scene");
    backend.capture_timestamps_end();
}

fn log_timestamps(backend: &RenderBackend) {
    let count = backend.captured_timestamps_count();
    tracing::info!(
        "Frame {}: {count} timestamps",
        backend.captured_timestamps_frame()
    );
    for i in 0..count {
        let name = backend.captured_timestamp_name(i).unwrap_or_default();
        let gpu = backend.profiler().captured_gpu_elapsed(i).unwrap_or_default();
        let cpu = backend.captured_timestamp_cpu_time(i).unwrap_or_default();
        tracing::info!("  {name:<16} gpu +{gpu}ns  cpu {cpu}us");
    }
}
