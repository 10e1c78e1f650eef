use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use super::metrics::MetricsAccumulator;

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
        }
    }
}

/// Anything advanced by the fixed-step loop.
pub trait Simulation {
    fn tick(&mut self, fixed_dt_seconds: f32);

    fn finished(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPlan {
    pub ticks_to_run: u32,
    pub remaining_accumulator: Duration,
    pub dropped_backlog: Duration,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopSummary {
    pub frames: u64,
    pub ticks: u64,
    pub dropped_backlog: Duration,
}

/// Converts variable frame times into whole fixed-size ticks.
#[derive(Debug, Clone)]
pub struct FixedStepClock {
    fixed_dt: Duration,
    max_frame_delta: Duration,
    max_ticks_per_frame: u32,
    accumulator: Duration,
}

impl FixedStepClock {
    pub fn new(config: &LoopConfig) -> Self {
        let target_tps = config.target_tps.max(1);
        Self {
            fixed_dt: Duration::from_secs_f64(1.0 / target_tps as f64),
            max_frame_delta: normalize_non_zero_duration(
                config.max_frame_delta,
                Duration::from_millis(250),
            ),
            max_ticks_per_frame: config.max_ticks_per_frame.max(1),
            accumulator: Duration::ZERO,
        }
    }

    pub fn fixed_dt(&self) -> Duration {
        self.fixed_dt
    }

    pub fn fixed_dt_seconds(&self) -> f32 {
        self.fixed_dt.as_secs_f32()
    }

    pub fn plan_frame(&mut self, raw_frame_dt: Duration) -> StepPlan {
        let clamped = clamp_frame_delta(raw_frame_dt, self.max_frame_delta);
        let accumulator = self.accumulator.saturating_add(clamped);
        let plan = plan_sim_steps(accumulator, self.fixed_dt, self.max_ticks_per_frame);
        self.accumulator = plan.remaining_accumulator;
        plan
    }
}

/// Drives `simulation` over a known sequence of frame times without sleeping.
pub fn run_frames<S, I>(config: &LoopConfig, simulation: &mut S, frame_deltas: I) -> LoopSummary
where
    S: Simulation,
    I: IntoIterator<Item = Duration>,
{
    let mut clock = FixedStepClock::new(config);
    let fixed_dt_seconds = clock.fixed_dt_seconds();
    let mut summary = LoopSummary::default();

    for frame_dt in frame_deltas {
        if simulation.finished() {
            break;
        }
        let plan = clock.plan_frame(frame_dt);
        for _ in 0..plan.ticks_to_run {
            simulation.tick(fixed_dt_seconds);
            summary.ticks = summary.ticks.saturating_add(1);
        }
        summary.frames = summary.frames.saturating_add(1);
        record_dropped_backlog(&mut summary, plan, config.max_ticks_per_frame);
    }

    summary
}

/// Drives `simulation` against the wall clock until it finishes or `max_duration` elapses.
pub fn run_realtime<S: Simulation>(
    config: &LoopConfig,
    simulation: &mut S,
    max_duration: Duration,
) -> LoopSummary {
    let mut clock = FixedStepClock::new(config);
    let fixed_dt = clock.fixed_dt();
    let fixed_dt_seconds = clock.fixed_dt_seconds();
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let mut metrics = MetricsAccumulator::new(metrics_log_interval);
    let mut summary = LoopSummary::default();

    info!(
        target_tps = config.target_tps.max(1),
        max_frame_delta_ms = config.max_frame_delta.as_millis() as u64,
        max_ticks_per_frame = config.max_ticks_per_frame.max(1),
        "loop_config"
    );

    let started = Instant::now();
    let mut last_frame_instant = started;
    while !simulation.finished() && started.elapsed() < max_duration {
        let now = Instant::now();
        let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
        last_frame_instant = now;

        let plan = clock.plan_frame(raw_frame_dt);
        for _ in 0..plan.ticks_to_run {
            let tick_started = Instant::now();
            simulation.tick(fixed_dt_seconds);
            metrics.record_tick(tick_started.elapsed());
            summary.ticks = summary.ticks.saturating_add(1);
        }
        metrics.record_frame();
        summary.frames = summary.frames.saturating_add(1);
        record_dropped_backlog(&mut summary, plan, config.max_ticks_per_frame);

        if let Some(snapshot) = metrics.maybe_snapshot(Instant::now()) {
            info!(
                fps = snapshot.fps,
                tps = snapshot.tps,
                tick_cost_ms = snapshot.tick_cost_ms,
                tick_cost_max_ms = snapshot.tick_cost_max_ms,
                "loop_metrics"
            );
        }

        let frame_cost = Instant::now().saturating_duration_since(now);
        if frame_cost < fixed_dt {
            thread::sleep(fixed_dt - frame_cost);
        }
    }

    summary
}

fn record_dropped_backlog(summary: &mut LoopSummary, plan: StepPlan, max_ticks_per_frame: u32) {
    if plan.dropped_backlog > Duration::ZERO {
        summary.dropped_backlog = summary.dropped_backlog.saturating_add(plan.dropped_backlog);
        warn!(
            dropped_backlog_ms = plan.dropped_backlog.as_millis() as u64,
            max_ticks_per_frame, "sim_clamp_triggered"
        );
    }
}

fn plan_sim_steps(mut accumulator: Duration, fixed_dt: Duration, max_ticks_per_frame: u32) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingSim {
        ticks: u32,
        total_seconds: f32,
        stop_after: Option<u32>,
    }

    impl Simulation for CountingSim {
        fn tick(&mut self, fixed_dt_seconds: f32) {
            self.ticks += 1;
            self.total_seconds += fixed_dt_seconds;
        }

        fn finished(&self) -> bool {
            self.stop_after.is_some_and(|limit| self.ticks >= limit)
        }
    }

    #[test]
    fn clamp_frame_delta_caps_large_frame() {
        let max_frame_delta = Duration::from_millis(250);
        let raw_frame_dt = Duration::from_millis(600);

        assert_eq!(
            clamp_frame_delta(raw_frame_dt, max_frame_delta),
            max_frame_delta
        );
    }

    #[test]
    fn plan_sim_steps_runs_expected_ticks_without_drop() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(48), fixed_dt, 5);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn plan_sim_steps_drops_backlog_when_tick_cap_hit() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(120), fixed_dt, 3);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::from_millis(72));
    }

    #[test]
    fn clock_carries_partial_frames_forward() {
        let config = LoopConfig {
            target_tps: 50,
            ..LoopConfig::default()
        };
        let mut clock = FixedStepClock::new(&config);

        assert_eq!(clock.plan_frame(Duration::from_millis(15)).ticks_to_run, 0);
        assert_eq!(clock.plan_frame(Duration::from_millis(15)).ticks_to_run, 1);
    }

    #[test]
    fn zero_tick_rate_falls_back_to_one_tick_per_second() {
        let config = LoopConfig {
            target_tps: 0,
            ..LoopConfig::default()
        };
        let clock = FixedStepClock::new(&config);
        assert_eq!(clock.fixed_dt(), Duration::from_secs(1));
    }

    #[test]
    fn run_frames_ticks_once_per_fixed_step() {
        let config = LoopConfig {
            target_tps: 50,
            ..LoopConfig::default()
        };
        let mut sim = CountingSim::default();
        let summary = run_frames(&config, &mut sim, vec![Duration::from_millis(20); 10]);

        assert_eq!(summary.frames, 10);
        assert_eq!(summary.ticks, 10);
        assert_eq!(sim.ticks, 10);
        assert!((sim.total_seconds - 0.2).abs() < 1e-4);
    }

    #[test]
    fn run_frames_stops_when_simulation_finishes() {
        let config = LoopConfig {
            target_tps: 50,
            ..LoopConfig::default()
        };
        let mut sim = CountingSim {
            stop_after: Some(3),
            ..CountingSim::default()
        };
        let summary = run_frames(&config, &mut sim, vec![Duration::from_millis(20); 10]);

        assert_eq!(sim.ticks, 3);
        assert_eq!(summary.frames, 3);
    }

    #[test]
    fn run_frames_reports_stall_backlog() {
        let config = LoopConfig {
            target_tps: 100,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            ..LoopConfig::default()
        };
        let mut sim = CountingSim::default();
        let summary = run_frames(&config, &mut sim, [Duration::from_secs(3)]);

        assert_eq!(summary.ticks, 5);
        assert_eq!(summary.dropped_backlog, Duration::from_millis(200));
    }
}
