//! BhumiStation - Ground-station daemon for a UDP-linked mobile robot
//!
//! Receives line-oriented telemetry from the robot, fuses it into a pose and
//! obstacle point-cloud, and exposes cancellable target-pose navigation.
//!
//! # Usage
//!
//! ```bash
//! # With default config
//! cargo run --release
//!
//! # With custom config file
//! cargo run --release -- --config bhumi-station.toml
//! ```

use std::fs;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bhumi_station::{Station, StationConfig};

struct Args {
    config_path: Option<String>,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut result = Args { config_path: None };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    result.config_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    result
}

fn print_help() {
    println!("bhumi-station - ground-station daemon for a UDP-linked mobile robot");
    println!();
    println!("USAGE:");
    println!("    bhumi-station [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <FILE>     Configuration file (default: bhumi-station.toml)");
    println!("    -h, --help              Print help information");
    println!();
    println!("CONFIGURATION:");
    println!("    All settings are configured via the TOML config file:");
    println!("    - [link] bind_addr, robot_addr: UDP endpoints");
    println!("    - [sensors] sensor_count, beam geometry");
    println!("    - [navigation] tolerances and timeouts");
    println!("    - [telemetry_log] enabled, path: CSV telemetry capture");
    println!();
    println!("THREADS:");
    println!("    The daemon runs with up to 4 threads:");
    println!("    - Receiver Thread: parses inbound telemetry");
    println!("    - Fusion Thread: dead reckoning and obstacle projection");
    println!("    - Navigation Thread: active move execution (on demand)");
    println!("    - Telemetry Log Thread: CSV capture (optional)");
}

fn load_config(args: &Args) -> StationConfig {
    match &args.config_path {
        Some(path) => match StationConfig::from_file(path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path);
                config
            }
            Err(e) => {
                log::warn!("Failed to load config {}: {}", path, e);
                StationConfig::default()
            }
        },
        None => {
            // Try default paths
            for path in &["bhumi-station.toml", "/etc/bhumi-station.toml"] {
                if fs::metadata(path).is_ok() {
                    if let Ok(config) = StationConfig::from_file(path) {
                        log::info!("Loaded config from {}", path);
                        return config;
                    }
                }
            }
            StationConfig::default()
        }
    }
}

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {} - {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();

    let args = parse_args();
    let config = load_config(&args);

    log::info!("bhumi-station starting");
    log::info!("  Telemetry: UDP {}", config.link.bind_addr);
    log::info!("  Commands: UDP {}", config.link.robot_addr);
    log::info!(
        "  Sensors: {} beams, first at {} deg, step {} deg",
        config.sensors.sensor_count,
        config.sensors.first_beam_deg,
        config.sensors.beam_step_deg
    );
    log::info!("  Fusion tick: {} ms", config.fusion.tick_interval_ms);
    if config.telemetry_log.enabled {
        log::info!("  Telemetry log: {}", config.telemetry_log.path);
    }

    // Setup signal handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    }) {
        log::error!("Failed to set Ctrl-C handler: {}", e);
        std::process::exit(1);
    }

    let mut station = match Station::start(&config) {
        Ok(station) => station,
        Err(e) => {
            log::error!("Failed to start station: {}", e);
            std::process::exit(1);
        }
    };
    log::info!("Station running");

    // Main thread just monitors for shutdown
    while running.load(Ordering::Relaxed) {
        std::thread::sleep(Duration::from_millis(100));
    }

    station.shutdown();
    log::info!("bhumi-station shutdown complete");
}
