//! YantraIO - HTTP control daemon
//!
//! Startup order: config → logging → device probe → sensor poller → servo to
//! center → HTTP server. Ctrl-C clears the running flag; the accept loop
//! exits and every device is released.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use yantra_io::config::Config;
use yantra_io::devices::probe;
use yantra_io::error::{Error, Result};
use yantra_io::http::HttpServer;
use yantra_io::state::create_shared_state;
use yantra_io::ControlPanel;

/// Config files tried when no `--config` is given
const DEFAULT_CONFIG_PATHS: &[&str] = &["yantra-io.toml", "/etc/yantra-io.toml"];

/// Command line arguments.
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
    println!("yantra-io - control daemon for servo, DC motor, distance sensor and IMU");
    println!();
    println!("USAGE:");
    println!("    yantra-io [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <FILE>     Configuration file (default: yantra-io.toml)");
    println!("    -h, --help              Print help information");
    println!();
    println!("ENVIRONMENT:");
    println!("    RUST_LOG                Overrides [logging] level");
}

/// Load the explicit config (errors are fatal) or the first default path that
/// parses. Returns the config and where it came from.
fn load_config(args: &Args) -> Result<(Config, Option<String>)> {
    if let Some(path) = &args.config_path {
        return Ok((Config::load(path)?, Some(path.clone())));
    }

    for path in DEFAULT_CONFIG_PATHS {
        if let Ok(cfg) = Config::load(path) {
            return Ok((cfg, Some(path.to_string())));
        }
    }
    Ok((Config::default(), None))
}

fn main() -> Result<()> {
    let args = parse_args();
    let (config, config_source) = load_config(&args)?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    log::info!("YantraIO v{} starting...", env!("CARGO_PKG_VERSION"));
    match config_source {
        Some(path) => log::info!("Loaded config from {}", path),
        None => log::info!("No config file found, using defaults"),
    }

    // Shutdown signal
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    // Devices and shared state
    let devices = probe(&config)?;
    let state = create_shared_state();
    let panel = Arc::new(ControlPanel::new(devices, state, &config));

    if config.poller.autostart {
        panel.start_polling()?;
    }

    if let Err(e) = panel.set_servo_angle(90) {
        log::warn!("Failed to center servo: {}", e);
    }

    // Serve until Ctrl-C; devices are released whatever the outcome
    let served = HttpServer::bind(config.server.clone(), Arc::clone(&panel))
        .and_then(|server| {
            log::info!("YantraIO running. Press Ctrl-C to stop.");
            server.run(Arc::clone(&running))
        });

    log::info!("Shutting down...");
    panel.shutdown();
    log::info!("YantraIO stopped");

    served
}
