use std::process::ExitCode;
use std::time::Duration;

use encounter::bootstrap::{init_tracing, load_settings};
use encounter::save::write_save_file;
use encounter::DemoRun;
use engine::{run_frames, run_realtime, FixedStepClock, LoopConfig};
use tracing::{error, info};

fn main() -> ExitCode {
    init_tracing();
    info!("=== Encounter Demo Startup ===");

    let settings = match load_settings() {
        Ok(settings) => settings,
        Err(error) => {
            error!(error = %error, "startup_failed");
            return ExitCode::FAILURE;
        }
    };

    let loop_config = LoopConfig::default();
    let clock = FixedStepClock::new(&loop_config);
    let mut run = DemoRun::new(
        settings.config,
        settings.demo_seconds,
        clock.fixed_dt_seconds(),
    );
    info!(
        seconds = settings.demo_seconds,
        realtime = settings.realtime,
        "demo_starting"
    );

    let loop_summary = if settings.realtime {
        let budget = Duration::from_secs_f32(settings.demo_seconds + 1.0);
        run_realtime(&loop_config, &mut run, budget)
    } else {
        let frames = (settings.demo_seconds / clock.fixed_dt_seconds()).ceil() as usize;
        run_frames(
            &loop_config,
            &mut run,
            std::iter::repeat(clock.fixed_dt()).take(frames),
        )
    };

    let summary = run.summary();
    info!(
        frames = loop_summary.frames,
        ticks = summary.ticks,
        waves = summary.waves,
        enemies_killed = summary.enemies_killed,
        strikes = summary.strikes,
        damage_taken = summary.damage_taken,
        drops_collected = summary.drops_collected,
        player_health = summary.player_health,
        player_died = summary.player_died,
        "demo_finished"
    );

    if let Some(path) = settings.save_path {
        if let Err(error) = write_save_file(&path, &run.save_snapshot()) {
            error!(error = %error, "save_failed");
            return ExitCode::FAILURE;
        }
        info!(path = %path.display(), "save_written");
    }

    ExitCode::SUCCESS
}
