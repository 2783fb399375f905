//! After-the-fact detection of movement through solid geometry.
//!
//! The auditor never changes a position. It looks at a move that already
//! happened and reports whether the body passed through, or ended inside,
//! a solid voxel. Callers decide what to do with the outcome.

use blockworld_core::{BlockType, VoxelCoord};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::{MAX_SWEEP_STEP, MAX_SWEEP_SUBSTEPS};
use crate::detector::CollisionDetector;

/// Result of auditing one move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditOutcome {
    /// The path touched no solid voxel.
    Clean,
    /// The body crossed a solid voxel on the way but ended free.
    Traversed {
        block: VoxelCoord,
        block_type: BlockType,
    },
    /// The final position is inside solid geometry.
    Embedded {
        block: VoxelCoord,
        block_type: BlockType,
    },
}

impl AuditOutcome {
    /// Whether the move passed the audit.
    pub const fn is_clean(&self) -> bool {
        matches!(self, Self::Clean)
    }

    /// Whether the offending connection should be dropped.
    pub const fn recommend_disconnect(&self) -> bool {
        matches!(self, Self::Embedded { .. })
    }

    /// The offending voxel, if any.
    pub const fn block(&self) -> Option<(VoxelCoord, BlockType)> {
        match *self {
            Self::Clean => None,
            Self::Traversed { block, block_type } | Self::Embedded { block, block_type } => {
                Some((block, block_type))
            }
        }
    }
}

/// Samples completed moves for block traversal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraversalAuditor {
    sample_step: f32,
}

impl Default for TraversalAuditor {
    fn default() -> Self {
        Self {
            sample_step: MAX_SWEEP_STEP,
        }
    }
}

impl TraversalAuditor {
    /// Create an auditor sampling paths at the default step.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample paths at `step` instead. Non-positive or non-finite values
    /// keep the current step.
    pub fn with_sample_step(mut self, step: f32) -> Self {
        if step.is_finite() && step > 0.0 {
            self.sample_step = step;
        }
        self
    }

    /// Distance between path samples.
    pub const fn sample_step(&self) -> f32 {
        self.sample_step
    }

    /// Audit the move of `player` from `old` to `new`.
    ///
    /// Only block geometry is considered. Non-finite positions produce
    /// [`AuditOutcome::Clean`]; those are rejected elsewhere.
    pub fn audit(
        &self,
        detector: &CollisionDetector,
        player: &str,
        old: Vec3,
        new: Vec3,
    ) -> AuditOutcome {
        if !old.is_finite() || !new.is_finite() {
            return AuditOutcome::Clean;
        }

        let world = detector.world().read();
        let outcome = if let Some((block, block_type)) = detector.blocking_voxel_in(&world, new) {
            AuditOutcome::Embedded { block, block_type }
        } else {
            let samples =
                ((old.distance(new) / self.sample_step).ceil() as u32).min(MAX_SWEEP_SUBSTEPS);
            (1..samples)
                .map(|k| old.lerp(new, k as f32 / samples as f32))
                .find_map(|sample| detector.blocking_voxel_in(&world, sample))
                .map_or(AuditOutcome::Clean, |(block, block_type)| {
                    AuditOutcome::Traversed { block, block_type }
                })
        };
        drop(world);

        if let Some((block, block_type)) = outcome.block() {
            tracing::warn!(
                "ILLEGAL BLOCK TRAVERSAL — player {player} traversed solid block {block}"
            );
            tracing::info!("  old position: ({:.3}, {:.3}, {:.3})", old.x, old.y, old.z);
            tracing::info!("  new position: ({:.3}, {:.3}, {:.3})", new.x, new.y, new.z);
            tracing::info!("  block type: {block_type}");
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockworld_core::BlockRecord;
    use blockworld_world::World;

    use crate::config::PhysicsConfig;

    fn detector_with_wall() -> CollisionDetector {
        let mut world = World::new();
        world.fill(
            VoxelCoord::new(20, 5, 8),
            VoxelCoord::new(20, 8, 12),
            &BlockRecord::new(BlockType::Stone, true),
        );
        CollisionDetector::new(world.into_shared(), &PhysicsConfig::default())
    }

    #[test]
    fn free_path_is_clean() {
        let detector = detector_with_wall();
        let auditor = TraversalAuditor::new();
        let outcome = auditor.audit(
            &detector,
            "alice",
            Vec3::new(10.0, 5.0, 10.0),
            Vec3::new(15.0, 5.0, 10.0),
        );
        assert_eq!(outcome, AuditOutcome::Clean);
        assert!(!outcome.recommend_disconnect());
    }

    #[test]
    fn passing_through_wall_is_traversal() {
        let detector = detector_with_wall();
        let auditor = TraversalAuditor::new();
        let outcome = auditor.audit(
            &detector,
            "bob",
            Vec3::new(15.0, 5.0, 10.0),
            Vec3::new(25.0, 5.0, 10.0),
        );
        match outcome {
            AuditOutcome::Traversed { block, block_type } => {
                assert_eq!(block.x, 20);
                assert_eq!(block_type, BlockType::Stone);
            }
            other => panic!("expected traversal, got {other:?}"),
        }
        assert!(!outcome.recommend_disconnect());
    }

    #[test]
    fn ending_inside_wall_is_embedded() {
        let detector = detector_with_wall();
        let auditor = TraversalAuditor::new();
        let outcome = auditor.audit(
            &detector,
            "carol",
            Vec3::new(15.0, 5.0, 10.0),
            Vec3::new(20.0, 5.0, 10.0),
        );
        assert!(matches!(outcome, AuditOutcome::Embedded { .. }));
        assert!(outcome.recommend_disconnect());
    }

    #[test]
    fn non_finite_input_is_clean() {
        let detector = detector_with_wall();
        let auditor = TraversalAuditor::new();
        let outcome = auditor.audit(
            &detector,
            "dave",
            Vec3::new(15.0, 5.0, 10.0),
            Vec3::splat(f32::NAN),
        );
        assert_eq!(outcome, AuditOutcome::Clean);
    }

    #[test]
    fn zero_length_move_checks_final_position_only() {
        let detector = detector_with_wall();
        let auditor = TraversalAuditor::new();
        let p = Vec3::new(10.0, 5.0, 10.0);
        assert!(auditor.audit(&detector, "erin", p, p).is_clean());
    }

    #[test]
    fn invalid_sample_step_is_ignored() {
        let auditor = TraversalAuditor::new().with_sample_step(-1.0);
        assert_eq!(auditor.sample_step(), MAX_SWEEP_STEP);
        let fine = TraversalAuditor::new().with_sample_step(0.25);
        assert_eq!(fine.sample_step(), 0.25);
    }
}
