//! Blockworld headless server
//!
//! Runs the authoritative simulation against a small demo world with a few
//! scripted players and logs what happens.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p blockworld-headless -- [OPTIONS]
//! ```
//!
//! ## Options
//!
//! - `-c, --config <PATH>`: TOML server configuration
//! - `-t, --ticks <N>`: Number of ticks to run (default: 200)
//! - `-p, --players <N>`: Number of scripted players (default: 4)
//! - `--solid-water` / `--no-solid-water`: Override the water policy
//! - `-h, --help`: Print help message
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Set log level (e.g., info, debug, trace)

mod demo;
mod options;

use std::time::Duration;

use anyhow::Context;
use blockworld_server::{
    MovementRequest, PlayerInput, ServerConfig, Simulation, TickCommand, TickEvent, TickLoopHandle,
};
use glam::Vec3;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::options::Options;

fn main() -> anyhow::Result<()> {
    let options = Options::from_args();
    if options.help {
        print_help();
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = match &options.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(water) = options.water {
        config.physics.water_collision_enabled = water;
    }
    config.validate()?;

    let world = demo::build_world(&config.physics);
    info!(blocks = world.len(), "demo world built");

    let tick_rate = config.tick_rate;
    let simulation = Simulation::new(config, world.into_shared())?;
    let mut handle = TickLoopHandle::spawn(simulation, tick_rate)?;

    let names: Vec<String> = (0..options.players).map(|i| format!("player-{i}")).collect();
    for (i, name) in names.iter().enumerate() {
        handle.send(TickCommand::Join {
            player: name.clone(),
            spawn: demo::spawn_point(i),
        })?;
        // Everyone walks towards the wall at x = 32.
        handle.send(TickCommand::Input {
            player: name.clone(),
            input: PlayerInput::walk(4.0, 0.5 * (i % 3) as f32 - 0.5),
        })?;
    }
    if let Some(first) = names.first() {
        handle.send(TickCommand::Jump(first.clone()))?;
        // A teleport the gate must refuse.
        handle.send(TickCommand::Move(MovementRequest::new(
            first.clone(),
            Vec3::new(60.0, 20.0, 60.0),
        )))?;
    }

    let period = Duration::from_secs_f64(1.0 / f64::from(tick_rate.max(1)));
    let mut ticks = 0;
    while ticks < options.ticks {
        let Some(event) = handle.recv_timeout(period * 10) else {
            anyhow::bail!("no event from the tick loop within ten periods");
        };
        match event {
            TickEvent::Tick(summary) => {
                ticks += 1;
                if summary.tick % u64::from(tick_rate.max(1)) == 0 {
                    info!(tick = summary.tick, simulated = summary.simulated, "tick");
                }
            }
            TickEvent::MovementResponse(response) => {
                info!(
                    player = %response.player,
                    status = ?response.status,
                    position = ?response.position,
                    "movement response"
                );
            }
            TickEvent::Disconnected { player } => warn!(%player, "player disconnected"),
            TickEvent::Rejected { command, reason } => warn!(command, %reason, "command rejected"),
        }
    }

    let simulation = handle
        .shutdown()
        .context("tick loop thread did not return the simulation")?;
    for name in &names {
        if let Some(slot) = simulation.player(name) {
            info!(
                player = %name,
                position = ?slot.motion.position,
                on_ground = slot.motion.on_ground,
                "final state"
            );
        }
    }
    info!(ticks = simulation.current_tick(), "shutdown complete");
    Ok(())
}

fn print_help() {
    eprintln!(
        "Blockworld headless server

USAGE:
    cargo run -p blockworld-headless -- [OPTIONS]

OPTIONS:
    -c, --config <PATH>     TOML server configuration
    -t, --ticks <N>         Number of ticks to run (default: 200)
    -p, --players <N>       Number of scripted players (default: 4)
    --solid-water           Water blocks stop players
    --no-solid-water        Water blocks are passable
    -h, --help              Print this help message

ENVIRONMENT VARIABLES:
    RUST_LOG                Set log level (e.g., info, debug, trace)"
    );
}
