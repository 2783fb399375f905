//! Authoritative server side of Blockworld movement.
//!
//! - [`AntiCheatGate`]: accept/reject judgement of client movement requests
//! - [`ConnectionState`]: the per-connection lifecycle
//! - [`Simulation`]: player slots, block edits and the physics tick
//! - [`TickLoopHandle`]: the simulation running at a fixed rate on its own thread

pub mod anti_cheat;
pub mod config;
pub mod connection;
pub mod error;
pub mod protocol;
pub mod simulation;
pub mod tick_loop;

pub use anti_cheat::{AntiCheatGate, ForbidReason, MoveVerdict};
pub use config::ServerConfig;
pub use connection::ConnectionState;
pub use error::{ConnectionError, GateError, Result, SimulationError};
pub use protocol::{MoveStatus, MovementRequest, MovementResponse};
pub use simulation::{PlayerInput, PlayerSlot, Simulation, TickSummary};
pub use tick_loop::{TickCommand, TickEvent, TickLoopHandle};
