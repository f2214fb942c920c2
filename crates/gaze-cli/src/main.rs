//! `gaze` – runs the animatronic eye control loop.
//!
//! 1. Loads `~/.gaze/config.toml`, writing the defaults there on first run.
//! 2. Brings up the sensor, calibrates, and announces `Puppet_is_ready`.
//! 3. Ticks the [`EyeLoop`] every `tick_ms` until Ctrl-C or a restart request.
//!
//! Without hardware attached the sensor, servos and event link are simulated:
//! a scripted visitor walks past the eyes over and over, and events go to the
//! log.

mod config;
mod scene;

use colored::Colorize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use gaze_hal::sim::{SimAnimator, SimTofSensor};
use gaze_middleware::{LogSink, PublishOutcome};
use gaze_runtime::{EyeLoop, init_tracing};
use gaze_types::{GazeError, TofEvent};

/// Quiet time between two simulated visits.
const SCENE_PAUSE_MS: u64 = 8_000;

fn main() {
    init_tracing();
    print_banner();

    let cfg = match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => {
            let cfg = config::Config::default();
            match config::save(&cfg) {
                Ok(()) => println!(
                    "  {} Default config written to {}",
                    "✓".green().bold(),
                    config::config_path().display().to_string().bold()
                ),
                Err(e) => println!("{}: {}", "Error saving config".red(), e),
            }
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            config::Config::default()
        }
    };

    // ── Shutdown flag ─────────────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – closing the eyes …".yellow().bold());
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler");
    }

    // ── Bring-up ──────────────────────────────────────────────────────────
    let background_mm = cfg.perception.max_calibration_mm;
    let width = cfg.sensor.resolution.isqrt();
    let tick = Duration::from_millis(cfg.cadence.tick_ms.max(1));
    let sensor = SimTofSensor::new(cfg.sensor.resolution).with_background(background_mm);
    let epoch = Instant::now();
    let now_ms = || u64::try_from(epoch.elapsed().as_millis()).unwrap_or(u64::MAX);

    let mut eyes = match EyeLoop::start(
        sensor,
        SimAnimator::new(),
        LogSink,
        cfg.into_loop_config(),
        now_ms(),
    ) {
        Ok(eyes) => eyes,
        Err(GazeError::SensorNotFound) => {
            error!("{}", GazeError::SensorNotFound);
            // Hang so the hardware watchdog resets the board.
            while !shutdown.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(10));
            }
            return;
        }
        Err(e) => {
            error!(error = %e, "bring-up failed");
            std::process::exit(1);
        }
    };
    println!("  {} Eyes calibrated and ready.\n", "✓".green().bold());

    // ── Control loop ──────────────────────────────────────────────────────
    let mut scene_idle_since: Option<u64> = Some(0);
    while !shutdown.load(Ordering::SeqCst) && !eyes.restart_requested() {
        let now = now_ms();

        if eyes.sensor_mut().frames_remaining() == 0 {
            match scene_idle_since {
                None => scene_idle_since = Some(now),
                Some(since) if now.saturating_sub(since) >= SCENE_PAUSE_MS => {
                    for frame in scene::visitor_walk(width, background_mm) {
                        eyes.sensor_mut().push_frame(frame);
                    }
                    info!("visitor approaching");
                    scene_idle_since = None;
                }
                Some(_) => {}
            }
        }

        match eyes.tick(now) {
            Ok(report) => {
                if let (Some(event), Some(outcome)) = (report.event, report.published) {
                    print_event(event, outcome);
                }
            }
            Err(e) => warn!(error = %e, "tick failed"),
        }
        thread::sleep(tick);
    }

    if eyes.restart_requested() {
        info!("leaving control loop for restart");
    }
    println!("{}", "  ✓ Eyes closed.".green());
}

// ─────────────────────────────────────────────────────────────────────────────
// Output
// ─────────────────────────────────────────────────────────────────────────────

fn print_event(event: TofEvent, outcome: PublishOutcome) {
    let label = match event {
        TofEvent::PersonEnteredFov => event.name().green(),
        TofEvent::PersonTooClose => event.name().red(),
        TofEvent::PersonLeftQuickly | TofEvent::PersonLeftFov => event.name().yellow(),
        _ => event.name().normal(),
    };
    match outcome {
        PublishOutcome::Published => println!("  ● {} ({})", label.bold(), event.code()),
        PublishOutcome::Throttled => println!("  ○ {} {}", label, "(throttled)".dimmed()),
    }
}

fn print_banner() {
    println!();
    println!("{}", r#"   ____               "#.bold().cyan());
    println!("{}", r#"  / __/__ ____ ___ ___"#.bold().cyan());
    println!("{}", r#" / (_ / _ `/_ // -_|_-<"#.bold().cyan());
    println!("{}", r#" \___/\_,_//__/\__/___/"#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "gaze".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Animatronic eye controller");
    println!();
}
