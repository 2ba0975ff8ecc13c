use std::time::{Duration, Instant};

use crate::graph::render_queue::RenderQueue;
use crate::models::events::{ModemEvent, PipelineStage};

/// Sample count accumulated for one stage since `start`.
#[derive(Debug, Clone, Copy)]
pub struct RateWindow {
    pub start: Instant,
    pub count: u64,
}

/// Per-stage throughput meter for the render contexts.
///
/// Each context owns its own monitor, so recording needs no synchronization.
/// Rates are posted to the control thread, which logs them and forwards them
/// to the delegate.
#[derive(Debug)]
pub struct RateMonitor {
    window: Duration,
    windows: [Option<RateWindow>; PipelineStage::COUNT],
    queue: RenderQueue,
}

impl RateMonitor {
    pub fn new(window: Duration, queue: RenderQueue) -> Self {
        Self {
            window,
            windows: [None; PipelineStage::COUNT],
            queue,
        }
    }

    pub fn record(&mut self, stage: PipelineStage, count: usize) {
        self.record_at(stage, count, Instant::now());
    }

    /// Add `count` samples at `now`. When the stage's window has run longer
    /// than the configured length, posts and returns the rate in samples per
    /// second and opens a new window.
    pub fn record_at(&mut self, stage: PipelineStage, count: usize, now: Instant) -> Option<f64> {
        let slot = &mut self.windows[stage.index()];
        let window = slot.get_or_insert(RateWindow { start: now, count: 0 });
        window.count += count as u64;

        let elapsed = now.saturating_duration_since(window.start);
        if elapsed <= self.window {
            return None;
        }

        let rate = window.count as f64 * 1e9 / elapsed.as_nanos() as f64;
        *window = RateWindow { start: now, count: 0 };
        self.queue.post(ModemEvent::RateMeasured {
            stage,
            samples_per_sec: rate,
        });
        Some(rate)
    }
}
