//! Binary accept/reject gate for client movement requests.
//!
//! Unlike the resolver, which slides a body to the nearest legal position,
//! the gate either takes the requested position as is or refuses it and
//! echoes the last position it accepted. The straight path from the last
//! accepted position is audited too, so a short hop across a thin wall is
//! refused even when both ends are free.

use blockworld_core::VoxelCoord;
use blockworld_physics::{
    CollisionDetector, CollisionResolver, OtherPlayer, PhysicsConfig, TraversalAuditor,
};
use glam::Vec3;
use hashbrown::HashMap;

use crate::error::GateError;
use crate::protocol::MoveStatus;

/// Why a request was forbidden.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ForbidReason {
    /// A coordinate was NaN or infinite.
    NonFinite,
    /// The body would leave the world.
    OutOfBounds,
    /// The move is longer than the per-request limit.
    TooFar { distance: f32 },
    /// The body would overlap a solid block or another player.
    Collision,
    /// The path from the last accepted position crosses a solid block.
    Traversal { block: VoxelCoord },
}

/// Decision for one request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveVerdict {
    pub status: MoveStatus,
    /// The accepted position, or the last accepted one when forbidden.
    pub position: Vec3,
    pub reason: Option<ForbidReason>,
}

impl MoveVerdict {
    const fn ok(position: Vec3) -> Self {
        Self {
            status: MoveStatus::Ok,
            position,
            reason: None,
        }
    }

    const fn forbidden(last_good: Vec3, reason: ForbidReason) -> Self {
        Self {
            status: MoveStatus::Forbidden,
            position: last_good,
            reason: Some(reason),
        }
    }

    /// Whether the request was accepted.
    pub fn is_ok(&self) -> bool {
        self.status == MoveStatus::Ok
    }
}

/// Tracks the last accepted position of each player and judges requests
/// against it.
#[derive(Debug, Clone)]
pub struct AntiCheatGate {
    max_move: f32,
    bounds: CollisionResolver,
    auditor: TraversalAuditor,
    last_accepted: HashMap<String, Vec3>,
}

impl AntiCheatGate {
    /// Create a gate allowing moves up to `max_move` in the world described
    /// by `physics`.
    pub fn new(max_move: f32, physics: &PhysicsConfig) -> Self {
        Self {
            max_move,
            bounds: CollisionResolver::new(physics),
            auditor: TraversalAuditor::new(),
            last_accepted: HashMap::new(),
        }
    }

    /// Per-request movement limit.
    pub const fn max_move(&self) -> f32 {
        self.max_move
    }

    /// Start tracking `player` at `position`, or overwrite its known-good
    /// position with one the server itself decided.
    pub fn register(&mut self, player: &str, position: Vec3) {
        if let Some(last) = self.last_accepted.get_mut(player) {
            *last = position;
        } else {
            self.last_accepted.insert(player.to_owned(), position);
        }
    }

    /// Stop tracking `player`, returning its last accepted position.
    pub fn forget(&mut self, player: &str) -> Option<Vec3> {
        self.last_accepted.remove(player)
    }

    /// The last accepted position of `player`.
    pub fn last_accepted(&self, player: &str) -> Option<Vec3> {
        self.last_accepted.get(player).copied()
    }

    /// Number of tracked players.
    pub fn len(&self) -> usize {
        self.last_accepted.len()
    }

    /// Whether no players are tracked.
    pub fn is_empty(&self) -> bool {
        self.last_accepted.is_empty()
    }

    /// Judge a request to move `player` to `requested`.
    ///
    /// `others` must not contain `player` itself. Accepted positions become
    /// the new reference for the next request.
    pub fn validate_move(
        &mut self,
        detector: &CollisionDetector,
        player: &str,
        requested: Vec3,
        others: &[OtherPlayer],
    ) -> Result<MoveVerdict, GateError> {
        let last = self
            .last_accepted
            .get_mut(player)
            .ok_or_else(|| GateError::UnknownPlayer(player.to_owned()))?;

        let reason = if !requested.is_finite() {
            Some(ForbidReason::NonFinite)
        } else if !self.bounds.in_bounds(requested) {
            Some(ForbidReason::OutOfBounds)
        } else {
            let distance = last.distance(requested);
            if !distance.is_finite() || distance > self.max_move {
                Some(ForbidReason::TooFar { distance })
            } else if detector.check_collision(requested, Some(others)) {
                Some(ForbidReason::Collision)
            } else {
                self.auditor
                    .audit(detector, player, *last, requested)
                    .block()
                    .map(|(block, _)| ForbidReason::Traversal { block })
            }
        };

        let verdict = match reason {
            None => {
                tracing::debug!(player, position = ?requested, "move accepted");
                *last = requested;
                MoveVerdict::ok(requested)
            }
            Some(reason) => {
                tracing::warn!(
                    player,
                    requested = ?requested,
                    last_good = ?*last,
                    ?reason,
                    "move forbidden"
                );
                MoveVerdict::forbidden(*last, reason)
            }
        };
        Ok(verdict)
    }
}
