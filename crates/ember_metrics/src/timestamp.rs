//! Multi-frame GPU timestamp profiler
//!
//! GPU timer queries complete asynchronously. Reading one right after it is
//! issued would stall the pipeline, so each frame records into its own slot
//! of a ring and the slot is only read back when the ring comes around to
//! it again, `frame_count` frames later. By then the GPU is expected to have
//! finished; if it has not, `begin_frame` blocks inside the timer instead of
//! returning partial data.

use crate::frame_ring::FrameRing;
use crate::timer::{GpuTimer, ProfilerConfig, TimestampError};
use std::mem;
use std::time::Instant;

pub const FRAME_BEGIN_MARKER: &str = "Internal Begin";
pub const FRAME_END_MARKER: &str = "Internal End";

struct TimestampFrame<Q> {
    queries: Vec<Q>,

    // Recording side, written during the frame.
    names: Vec<String>,
    cpu_values: Vec<u64>,
    count: usize,
    recording_frame: u64,

    // Result side, filled when the slot comes around again.
    result_names: Vec<String>,
    cpu_result_values: Vec<u64>,
    result_values: Vec<u64>,
    result_count: usize,
    result_frame: u64,
}

impl<Q> TimestampFrame<Q> {
    fn new(queries: Vec<Q>, capacity: usize) -> Self {
        Self {
            queries,
            names: vec![String::new(); capacity],
            cpu_values: vec![0; capacity],
            count: 0,
            recording_frame: 0,
            result_names: vec![String::new(); capacity],
            cpu_result_values: vec![0; capacity],
            result_values: vec![0; capacity],
            result_count: 0,
            result_frame: 0,
        }
    }
}

/// Ring of per-frame timestamp slots.
///
/// Frame protocol: `begin_frame`, any number of `capture` calls, then
/// `end_frame`. Readers see the most recently resolved slot, which holds
/// the timestamps captured `frame_count` frames earlier.
pub struct TimestampProfiler<T: GpuTimer> {
    timer: T,
    frames: FrameRing<TimestampFrame<T::Query>>,
    max_queries: usize,
    frames_drawn: u64,
    resolved_slot: Option<usize>,
    epoch: Instant,
}

impl<T: GpuTimer> TimestampProfiler<T> {
    pub fn new(mut timer: T, config: ProfilerConfig) -> Self {
        let config = config.sanitized();
        let max_queries = config.max_queries;
        let frames = FrameRing::from_fn(config.frame_count, |_| {
            TimestampFrame::new(timer.create_queries(max_queries), max_queries)
        });
        Self {
            timer,
            frames,
            max_queries,
            frames_drawn: 0,
            resolved_slot: None,
            epoch: Instant::now(),
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn max_queries(&self) -> usize {
        self.max_queries
    }

    /// Frames completed so far (incremented by `end_frame`).
    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    /// Resolve the slot we are about to overwrite, then start recording.
    pub fn begin_frame(&mut self) {
        let slot = self.frames.index();
        let frames_drawn = self.frames_drawn;
        let supports_timestamps = self.timer.supports_timestamps();
        let timer = &mut self.timer;
        let frame = self.frames.current_mut();

        if frame.count > 0 {
            for i in 0..frame.count {
                frame.result_values[i] = if supports_timestamps {
                    timer.resolve(&frame.queries[i])
                } else {
                    0
                };
            }
            mem::swap(&mut frame.names, &mut frame.result_names);
            mem::swap(&mut frame.cpu_values, &mut frame.cpu_result_values);
        }

        frame.result_count = frame.count;
        frame.result_frame = frame.recording_frame;
        frame.count = 0;
        frame.recording_frame = frames_drawn;
        self.resolved_slot = Some(slot);

        tracing::trace!(slot, frame = frames_drawn, "timestamp frame begin");
        if let Err(err) = self.capture(FRAME_BEGIN_MARKER) {
            tracing::warn!("{err}");
        }
    }

    /// Append a named timestamp to the current frame.
    pub fn capture(&mut self, name: &str) -> Result<(), TimestampError> {
        let cpu_time = self.epoch.elapsed().as_micros() as u64;
        let supports_timestamps = self.timer.supports_timestamps();
        let max = self.max_queries;
        let timer = &mut self.timer;
        let frame = self.frames.current_mut();

        if frame.count >= max {
            return Err(TimestampError::CapacityExceeded {
                name: name.to_string(),
                max,
            });
        }

        let index = frame.count;
        if supports_timestamps {
            timer.issue(&frame.queries[index]);
        }
        let slot_name = &mut frame.names[index];
        slot_name.clear();
        slot_name.push_str(name);
        frame.cpu_values[index] = cpu_time;
        frame.count += 1;
        Ok(())
    }

    pub fn end_frame(&mut self) {
        if let Err(err) = self.capture(FRAME_END_MARKER) {
            tracing::warn!("{err}");
        }
        self.frames.advance();
        self.frames_drawn += 1;
    }

    fn resolved(&self) -> Option<&TimestampFrame<T::Query>> {
        self.resolved_slot.and_then(|slot| self.frames.get(slot))
    }

    pub fn captured_count(&self) -> usize {
        self.resolved().map_or(0, |frame| frame.result_count)
    }

    /// Frame number the resolved timestamps were captured in.
    pub fn captured_frame(&self) -> u64 {
        self.resolved().map_or(0, |frame| frame.result_frame)
    }

    /// Raw GPU timestamp in ticks.
    pub fn captured_gpu_time(&self, index: usize) -> Option<u64> {
        let frame = self.resolved()?;
        (index < frame.result_count).then(|| frame.result_values[index])
    }

    /// GPU ticks elapsed between the frame's first timestamp and `index`.
    pub fn captured_gpu_elapsed(&self, index: usize) -> Option<u64> {
        let start = self.captured_gpu_time(0)?;
        let value = self.captured_gpu_time(index)?;
        Some(value.saturating_sub(start))
    }

    /// CPU time in microseconds since the profiler was created.
    pub fn captured_cpu_time(&self, index: usize) -> Option<u64> {
        let frame = self.resolved()?;
        (index < frame.result_count).then(|| frame.cpu_result_values[index])
    }

    pub fn captured_name(&self, index: usize) -> Option<&str> {
        let frame = self.resolved()?;
        (index < frame.result_count).then(|| frame.result_names[index].as_str())
    }
}

impl<T: GpuTimer> Drop for TimestampProfiler<T> {
    fn drop(&mut self) {
        let timer = &mut self.timer;
        for frame in self.frames.iter_mut() {
            timer.delete_queries(mem::take(&mut frame.queries));
        }
    }
}
