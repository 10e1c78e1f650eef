use std::time::{Duration, Instant};

/// Rates and tick costs over one logging interval.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    pub tps: f32,
    pub tick_cost_ms: f32,
    pub tick_cost_max_ms: f32,
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval_start: Instant,
    interval: Duration,
    frames: u32,
    ticks: u32,
    tick_cost_sum: Duration,
    tick_cost_max: Duration,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration) -> Self {
        Self::starting_at(Instant::now(), interval)
    }

    pub(crate) fn starting_at(interval_start: Instant, interval: Duration) -> Self {
        Self {
            interval_start,
            interval,
            frames: 0,
            ticks: 0,
            tick_cost_sum: Duration::ZERO,
            tick_cost_max: Duration::ZERO,
        }
    }

    pub(crate) fn record_frame(&mut self) {
        self.frames = self.frames.saturating_add(1);
    }

    pub(crate) fn record_tick(&mut self, cost: Duration) {
        self.ticks = self.ticks.saturating_add(1);
        self.tick_cost_sum = self.tick_cost_sum.saturating_add(cost);
        self.tick_cost_max = self.tick_cost_max.max(cost);
    }

    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed < self.interval {
            return None;
        }

        let elapsed_seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let tick_cost_ms = if self.ticks == 0 {
            0.0
        } else {
            (self.tick_cost_sum.as_secs_f32() / self.ticks as f32) * 1000.0
        };

        let snapshot = LoopMetricsSnapshot {
            fps: self.frames as f32 / elapsed_seconds,
            tps: self.ticks as f32 / elapsed_seconds,
            tick_cost_ms,
            tick_cost_max_ms: self.tick_cost_max.as_secs_f32() * 1000.0,
        };

        self.interval_start = now;
        self.frames = 0;
        self.ticks = 0;
        self.tick_cost_sum = Duration::ZERO;
        self.tick_cost_max = Duration::ZERO;

        Some(snapshot)
    }
}
