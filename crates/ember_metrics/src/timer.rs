//! GPU timestamp query source

use thiserror::Error;

/// Default number of frames a query waits before it is read back.
pub const DEFAULT_FRAME_COUNT: usize = 2;

/// Default per-frame timestamp capacity.
pub const DEFAULT_MAX_QUERIES: usize = 256;

/// Asynchronous timestamp queries on the graphics context.
///
/// Queries are created once per frame slot and reused for the life of the
/// profiler. `resolve` blocks until the result is available; the profiler
/// only calls it on queries issued a full ring ago.
pub trait GpuTimer {
    type Query;

    /// False on contexts without timer queries (plain GLES). Nothing is
    /// issued and every resolved value reads as 0.
    fn supports_timestamps(&self) -> bool;

    fn create_queries(&mut self, count: usize) -> Vec<Self::Query>;

    /// Record the GPU clock into `query` once prior commands complete.
    fn issue(&mut self, query: &Self::Query);

    /// Blocking read of an issued query, in GPU ticks (nanoseconds).
    fn resolve(&mut self, query: &Self::Query) -> u64;

    fn delete_queries(&mut self, queries: Vec<Self::Query>);
}

/// Sizing of the timestamp ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfilerConfig {
    /// Ring length; results are read back this many frames after capture.
    pub frame_count: usize,
    /// Timestamps per frame, including the begin/end markers.
    pub max_queries: usize,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            frame_count: DEFAULT_FRAME_COUNT,
            max_queries: DEFAULT_MAX_QUERIES,
        }
    }
}

impl ProfilerConfig {
    /// The ring needs at least one slot; a zero `frame_count` becomes 1.
    pub fn sanitized(self) -> Self {
        if self.frame_count == 0 {
            tracing::warn!("Timestamp ring configured with 0 frames, using 1");
        }
        Self {
            frame_count: self.frame_count.max(1),
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    #[error("timestamp '{name}' dropped: frame already holds {max} timestamps")]
    CapacityExceeded { name: String, max: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitized_keeps_one_frame() {
        let config = ProfilerConfig { frame_count: 0, max_queries: 8 }.sanitized();
        assert_eq!(config, ProfilerConfig { frame_count: 1, max_queries: 8 });
        assert_eq!(ProfilerConfig::default().sanitized(), ProfilerConfig::default());
    }
}
