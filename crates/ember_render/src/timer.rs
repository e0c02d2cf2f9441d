//! CPU-clock stand-in for GPU timestamp queries

use ember_metrics::GpuTimer;
use std::time::Instant;

/// Timestamp queries answered from the CPU clock at issue time.
///
/// Used for headless contexts and tests; values are nanoseconds since the
/// timer was created, so they are monotonic like real GPU timestamps.
pub struct HeadlessTimer {
    epoch: Instant,
    values: Vec<u64>,
    live_queries: usize,
}

impl HeadlessTimer {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            values: Vec::new(),
            live_queries: 0,
        }
    }

    /// Queries created and not yet deleted.
    pub fn live_queries(&self) -> usize {
        self.live_queries
    }
}

impl Default for HeadlessTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuTimer for HeadlessTimer {
    type Query = usize;

    fn supports_timestamps(&self) -> bool {
        true
    }

    fn create_queries(&mut self, count: usize) -> Vec<usize> {
        let start = self.values.len();
        self.values.resize(start + count, 0);
        self.live_queries += count;
        (start..start + count).collect()
    }

    fn issue(&mut self, query: &usize) {
        let now = self.epoch.elapsed().as_nanos() as u64;
        if let Some(value) = self.values.get_mut(*query) {
            *value = now;
        }
    }

    fn resolve(&mut self, query: &usize) -> u64 {
        self.values.get(*query).copied().unwrap_or(0)
    }

    fn delete_queries(&mut self, queries: Vec<usize>) {
        self.live_queries = self.live_queries.saturating_sub(queries.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_resolve() {
        let mut timer = HeadlessTimer::new();
        let queries = timer.create_queries(2);
        assert_eq!(timer.live_queries(), 2);

        timer.issue(&queries[0]);
        timer.issue(&queries[1]);
        assert!(timer.resolve(&queries[1]) >= timer.resolve(&queries[0]));

        timer.delete_queries(queries);
        assert_eq!(timer.live_queries(), 0);
    }
}
