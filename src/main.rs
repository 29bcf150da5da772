mod catalog;
mod config;
mod engine;
mod frame;
mod time;
mod web;

use clap::{Parser, Subcommand};
use std::fs;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::catalog::{CatalogFetcher, CatalogSource, HttpTransport};
use crate::config::Config;
use crate::engine::{FrameSignal, PathPredictor, TrackingEngine, ViewerPosition};
use crate::frame::{FrameLoop, SnapshotHandle};
use crate::time::{Clock, SystemClock};
use crate::web::AppState;

const REPORT_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "sat-o-scope")]
#[command(about = "Satellite visibility prediction engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a local TLE file and list its entries
    Check { file: String },
    /// Run the engine and log the closest satellites
    Run {
        #[arg(long, default_value = "config.yaml")]
        config: String,
        /// Viewer position as "lat,lon", overriding the config file
        #[arg(long)]
        viewer: Option<String>,
    },
    /// Run the engine with the HTTP API
    Serve {
        #[arg(long, default_value = "config.yaml")]
        config: String,
        /// Viewer position as "lat,lon", overriding the config file
        #[arg(long)]
        viewer: Option<String>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { file } => check(&file),
        Commands::Run { config, viewer } => run(&config, viewer.as_deref()),
        Commands::Serve { config, viewer } => serve(&config, viewer.as_deref()),
    }
}

fn check(path: &str) -> ExitCode {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let entries = catalog::load(&catalog::split_lines(&content));
    println!("Catalog is valid ({} satellites)", entries.len());
    for (i, entry) in entries.iter().enumerate() {
        println!(
            "  {}: {} [{}]{}",
            i + 1,
            entry.name,
            entry.state.norad_id(),
            if entry.special { " special" } else { "" }
        );
    }
    ExitCode::SUCCESS
}

fn load_config(path: &str, viewer: Option<&str>) -> Option<Config> {
    let mut config = match Config::from_file(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config {}: {}", path, e);
            return None;
        }
    };
    if let Some(coordinates) = viewer {
        let Some(position) = ViewerPosition::from_coordinates(coordinates) else {
            eprintln!("Invalid viewer coordinates: {}", coordinates);
            return None;
        };
        config.viewer.latitude_deg = position.latitude_deg;
        config.viewer.longitude_deg = position.longitude_deg;
    }
    Some(config)
}

/// Build the engine and start both workers and the frame loop.
fn start(config: &Config) -> std::io::Result<(Arc<TrackingEngine>, SnapshotHandle)> {
    let viewer = ViewerPosition::new(config.viewer.latitude_deg, config.viewer.longitude_deg);
    let source = CatalogSource::new(config.catalog.url.clone(), config.catalog.identity.clone());
    let engine = Arc::new(TrackingEngine::new(viewer, source, config.prediction.show));
    engine.set_max_visible(config.render.max_satellites);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let signal = Arc::new(FrameSignal::new());

    let transport = Arc::new(HttpTransport::new(config.catalog.fetch_timeout));
    CatalogFetcher::new(engine.clone(), transport, clock.clone(), config.catalog.clone())
        .spawn(signal.clone())?;
    PathPredictor::new(engine.clone(), clock.clone(), config.prediction.clone())
        .spawn(signal.clone())?;

    let frames = FrameLoop::new(engine.clone(), clock, signal, &config.render);
    let snapshots = frames.snapshots();
    frames.spawn()?;

    Ok((engine, snapshots))
}

fn run(path: &str, viewer: Option<&str>) -> ExitCode {
    let Some(config) = load_config(path, viewer) else {
        return ExitCode::FAILURE;
    };
    let (engine, snapshots) = match start(&config) {
        Ok(started) => started,
        Err(e) => {
            eprintln!("Failed to start workers: {}", e);
            return ExitCode::FAILURE;
        }
    };

    loop {
        thread::sleep(REPORT_INTERVAL);
        let snapshot = snapshots.latest();
        log::info!(
            "Frame {}: {} satellites in catalog, {} visible paths",
            snapshot.frame,
            engine.catalog_len(),
            snapshot.paths.len()
        );
        for visible in snapshot.satellites.iter().take(5) {
            log::info!(
                "  {} ({:.0} km)",
                visible.satellite.name,
                visible.distance_km
            );
        }
    }
}

fn serve(path: &str, viewer: Option<&str>) -> ExitCode {
    let Some(config) = load_config(path, viewer) else {
        return ExitCode::FAILURE;
    };
    let (engine, snapshots) = match start(&config) {
        Ok(started) => started,
        Err(e) => {
            eprintln!("Failed to start workers: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let state = AppState { engine, snapshots };
    match runtime.block_on(web::run_server(state, &config.web.bind)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}
