//! Ember Metrics - GPU timestamp profiling
//!
//! Provides the per-frame timestamp ring used to instrument the render loop.
//! Capture compiles away in builds without the `metrics` feature.
//!
//! # Feature Flags
//!
//! - `metrics` - Enable timestamp capture (default: enabled)
//!
//! # Usage
//!
//! ```ignore
//! use ember_metrics::{ProfilerConfig, TimestampProfiler};
//!
//! let mut profiler = TimestampProfiler::new(timer, ProfilerConfig::default());
//! profiler.begin_frame();
//! profiler.capture("Shadows")?;
//! // ... render ...
//! profiler.end_frame();
//!
//! for i in 0..profiler.captured_count() {
//!     println!("{:?}: {:?}", profiler.captured_name(i), profiler.captured_gpu_elapsed(i));
//! }
//! ```

mod frame_ring;
mod timer;
#[cfg(feature = "metrics")]
mod timestamp;

pub use frame_ring::FrameRing;
pub use timer::{
    GpuTimer, ProfilerConfig, TimestampError, DEFAULT_FRAME_COUNT, DEFAULT_MAX_QUERIES,
};
#[cfg(feature = "metrics")]
pub use timestamp::{TimestampProfiler, FRAME_BEGIN_MARKER, FRAME_END_MARKER};

// ============================================================================
// No-op stubs when metrics disabled
// ============================================================================

#[cfg(not(feature = "metrics"))]
pub const FRAME_BEGIN_MARKER: &str = "Internal Begin";
#[cfg(not(feature = "metrics"))]
pub const FRAME_END_MARKER: &str = "Internal End";

#[cfg(not(feature = "metrics"))]
pub struct TimestampProfiler<T: GpuTimer> {
    timer: T,
    frame_count: usize,
    max_queries: usize,
}

#[cfg(not(feature = "metrics"))]
impl<T: GpuTimer> TimestampProfiler<T> {
    pub fn new(timer: T, config: ProfilerConfig) -> Self {
        let config = config.sanitized();
        Self {
            timer,
            frame_count: config.frame_count,
            max_queries: config.max_queries,
        }
    }
    pub fn frame_count(&self) -> usize { self.frame_count }
    pub fn max_queries(&self) -> usize { self.max_queries }
    pub fn frames_drawn(&self) -> u64 { 0 }
    pub fn timer(&self) -> &T { &self.timer }
    pub fn begin_frame(&mut self) {}
    pub fn capture(&mut self, _name: &str) -> Result<(), TimestampError> { Ok(()) }
    pub fn end_frame(&mut self) {}
    pub fn captured_count(&self) -> usize { 0 }
    pub fn captured_frame(&self) -> u64 { 0 }
    pub fn captured_gpu_time(&self, _index: usize) -> Option<u64> { None }
    pub fn captured_gpu_elapsed(&self, _index: usize) -> Option<u64> { None }
    pub fn captured_cpu_time(&self, _index: usize) -> Option<u64> { None }
    pub fn captured_name(&self, _index: usize) -> Option<&str> { None }
}
