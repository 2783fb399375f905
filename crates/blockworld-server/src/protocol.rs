//! Movement messages exchanged with clients.
//!
//! Only the message shapes live here. Framing and transport belong to the
//! network layer.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Outcome of a movement request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveStatus {
    Ok,
    Forbidden,
}

/// A client asking to be moved to `position`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementRequest {
    pub player: String,
    pub position: Vec3,
}

impl MovementRequest {
    pub fn new(player: impl Into<String>, position: Vec3) -> Self {
        Self {
            player: player.into(),
            position,
        }
    }
}

/// The server's answer to a [`MovementRequest`].
///
/// `position` is the requested one when accepted, and the last accepted
/// one when forbidden.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementResponse {
    pub player: String,
    pub status: MoveStatus,
    pub position: Vec3,
}

impl MovementResponse {
    /// Whether the move was accepted.
    pub fn is_ok(&self) -> bool {
        self.status == MoveStatus::Ok
    }
}
