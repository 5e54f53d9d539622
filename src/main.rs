use anyhow::Result;
use clap::Parser;
use log::info;
use std::time::{Duration, Instant};

use junction_sim::{
    config::SimulationConfig,
    driver::SimulationDriver,
    simulation::{PerformanceTracker, Topology},
};

#[derive(Parser)]
#[command(name = "junction-sim")]
#[command(about = "Headless signalised intersection and roundabout simulation")]
struct Args {
    /// Scene configuration file
    #[arg(long, default_value = "scene.toml")]
    scene: String,

    /// Phase schedule file
    #[arg(short, long, default_value = "phases.toml")]
    phases: String,

    /// Intersection type id (1-5), overriding the scene file
    #[arg(short, long)]
    topology: Option<u8>,

    /// Random seed for reproducible runs
    #[arg(short, long)]
    seed: Option<u64>,

    /// Wall-clock seconds to run for
    #[arg(short, long, default_value_t = 10)]
    duration: u64,

    /// Enable verbose logging for detailed simulation progress
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info })
        .init();
    info!("Starting junction simulator (console mode)");

    let config = SimulationConfig::load_from_files(&args.scene, &args.phases)?;
    info!(
        "Loaded scene '{}': {} with {} phases",
        config.scene.scene.name,
        config.scene.scene.topology.name(),
        config.phases.phases.len()
    );

    let mut driver = SimulationDriver::from_config(&config, args.seed);

    if let Some(id) = args.topology {
        let topology = Topology::from_id_or_default(id);
        let mut request = config.scene.population_request();
        if topology != request.topology {
            request.topology = topology;
            request.roads.clear();
        }
        driver.rebuild(&request);
    }

    if args.verbose {
        let snapshot = driver.snapshot();
        info!("Topology: {}", snapshot.topology.description());
        for approach in &snapshot.approaches {
            info!(
                "Approach {} ({}): stop line at {:.1}, travel {:.1}",
                approach.id.0, approach.road, approach.stop_line, approach.travel_length
            );
        }
        for (class, count) in snapshot.class_counts() {
            info!("  {}: {}", class, count);
        }
    }

    let mut performance_tracker =
        PerformanceTracker::new(config.scene.driver.timing_samples as usize);
    let target_frame_time = Duration::from_secs_f32(1.0 / config.scene.driver.target_fps);
    let run_duration = Duration::from_secs(args.duration);

    let start_time = Instant::now();
    let mut last_report = Instant::now();

    info!("Running {} engine for {} seconds...", driver.engine_name(), run_duration.as_secs());

    while start_time.elapsed() < run_duration {
        let frame_start = Instant::now();

        performance_tracker.start_tick();
        if driver.frame().is_none() {
            break;
        }
        performance_tracker.end_tick();

        if last_report.elapsed() >= Duration::from_secs(1) {
            let snapshot = driver.snapshot();
            let phase = driver
                .active_phase()
                .and_then(|p| p.active_road.clone())
                .unwrap_or_else(|| "all red".to_string());

            info!(
                "t={:.1}s phase {} ({}), mean speed {:.1}, queues {:?}, tick {:.3}ms",
                snapshot.time,
                driver.phase_cursor().active_index() + 1,
                phase,
                snapshot.mean_speed(),
                snapshot.queue_lengths(),
                performance_tracker.average_tick_time().as_secs_f64() * 1000.0
            );

            last_report = Instant::now();
        }

        // Sleep to maintain target framerate
        let elapsed = frame_start.elapsed();
        if elapsed < target_frame_time {
            std::thread::sleep(target_frame_time - elapsed);
        }
    }

    driver.stop();

    let snapshot = driver.snapshot();
    info!("Simulation completed!");
    info!("Model time: {:.2}s over {} frames", snapshot.time, driver.frames());
    info!(
        "Vehicles: {}, recycled {} times, {} phase cycles",
        snapshot.vehicles.len(),
        snapshot.total_recycled,
        driver.phase_cursor().completed_cycles()
    );

    Ok(())
}
