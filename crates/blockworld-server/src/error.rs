//! Server error types.

use blockworld_core::VoxelCoord;
use thiserror::Error;

use crate::connection::ConnectionState;

/// Errors from the anti-cheat gate.
///
/// Bad moves are verdicts, not errors. These are caller mistakes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// The player was never registered with the gate.
    #[error("Unknown player: {0}")]
    UnknownPlayer(String),
}

/// Errors from the connection state machine.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionError {
    /// A backward or skipping transition.
    #[error("Invalid connection transition: {from} -> {to}")]
    InvalidTransition {
        from: ConnectionState,
        to: ConnectionState,
    },

    /// The connection is already closed.
    #[error("Connection already closed")]
    Closed,
}

/// Errors from the simulation, its configuration and its tick loop.
#[derive(Error, Debug)]
pub enum SimulationError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration values are inconsistent
    #[error("Invalid config: {0}")]
    Config(String),

    /// Physics configuration values are inconsistent
    #[error("Invalid physics config: {0}")]
    Physics(#[from] blockworld_physics::ConfigError),

    /// Core error
    #[error(transparent)]
    Core(#[from] blockworld_core::Error),

    /// Gate error
    #[error(transparent)]
    Gate(#[from] GateError),

    /// Connection error
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// No slot for this player
    #[error("Unknown player: {0}")]
    UnknownPlayer(String),

    /// A slot already exists for this player
    #[error("Player already joined: {0}")]
    PlayerExists(String),

    /// The player's connection is not in the play state
    #[error("Player {player} is not playing (state: {state})")]
    NotPlaying {
        player: String,
        state: ConnectionState,
    },

    /// Spawn position is outside the world or inside solid blocks
    #[error("Invalid spawn position for {0}")]
    InvalidSpawn(String),

    /// A block placement would overlap a player body
    #[error("Voxel {0} is occupied by a player")]
    Occupied(VoxelCoord),

    /// The tick loop command queue is full
    #[error("Tick loop command queue is full")]
    QueueFull,

    /// The tick loop thread has stopped
    #[error("Tick loop has stopped")]
    TickLoopStopped,
}

/// Result type alias using [`SimulationError`].
pub type Result<T> = std::result::Result<T, SimulationError>;
