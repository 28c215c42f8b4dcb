//! # QUARRY Server
//!
//! Headless world host. Builds the shared world once, pre-warms the spawn
//! area and reports where new players will stand.
//!
//! ```bash
//! # Stock world
//! ./quarry_server
//!
//! # Custom world, verbose chunk logging
//! RUST_LOG=debug ./quarry_server world.toml
//! ```

use std::process::ExitCode;
use std::time::Instant;

use quarry_procedural::World;
use quarry_shared::{ConfigResult, WorldConfig};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run(std::env::args().nth(1)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            ExitCode::FAILURE
        }
    }
}

fn run(config_path: Option<String>) -> ConfigResult<()> {
    let config = match config_path {
        Some(path) => {
            tracing::info!(path = %path, "Loading world config");
            WorldConfig::load(&path)?
        }
        None => {
            tracing::info!("No config given, using defaults");
            WorldConfig::default()
        }
    };

    let started = Instant::now();
    let world = World::new(&config)?;

    let welcome = world.prewarm_spawn();
    let spawn = world.find_safe_starting_position();
    let payload_bytes: usize = welcome.iter().map(|(_, chunk)| chunk.as_bytes().len()).sum();

    tracing::info!(
        chunks = world.store().len(),
        payload_bytes,
        spawn_x = spawn.x,
        spawn_y = spawn.y,
        spawn_z = spawn.z,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Server ready"
    );
    Ok(())
}
