//! Gravity, jumping and flight over discrete ticks.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::{PhysicsConfig, SUPPORT_DEPTH};
use crate::detector::{CollisionDetector, OtherPlayer};
use crate::resolver::CollisionResolver;

/// Kinematic state of one player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionState {
    /// Feet position
    pub position: Vec3,
    /// Velocity in blocks per second
    pub velocity: Vec3,
    /// Standing on something solid
    pub on_ground: bool,
    /// Flight mode: gravity off, vertical velocity driven by input
    pub flying: bool,
}

impl MotionState {
    /// A player at rest at `position`, not yet known to be grounded.
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }
}

/// Advances [`MotionState`]s through time.
#[derive(Debug, Clone)]
pub struct PhysicsIntegrator {
    gravity: f32,
    terminal_velocity: f32,
    jump_speed: f32,
    resolver: CollisionResolver,
}

impl PhysicsIntegrator {
    /// Create an integrator from the physics configuration.
    pub fn new(config: &PhysicsConfig) -> Self {
        Self {
            gravity: config.gravity,
            terminal_velocity: config.terminal_velocity,
            jump_speed: config.jump_speed(),
            resolver: CollisionResolver::new(config),
        }
    }

    /// The resolver used for movement.
    pub const fn resolver(&self) -> &CollisionResolver {
        &self.resolver
    }

    /// Upward speed given by a jump.
    pub const fn jump_speed(&self) -> f32 {
        self.jump_speed
    }

    /// Apply one step of gravity to a vertical velocity.
    ///
    /// Grounded bodies are left untouched so they never build up downward
    /// speed while standing still.
    pub fn apply_gravity(&self, vy: f32, dt: f32, on_ground: bool) -> f32 {
        if on_ground {
            return vy;
        }
        (vy - self.gravity * dt).max(-self.terminal_velocity)
    }

    /// Start a jump if the body is grounded. Returns whether it jumped.
    pub fn jump(&self, state: &mut MotionState) -> bool {
        if !state.on_ground {
            return false;
        }
        state.velocity.y = self.jump_speed;
        state.on_ground = false;
        true
    }

    /// Advance `state` by `dt` seconds.
    ///
    /// `skip_physics` is set by the caller during the grace window after an
    /// authoritative position change; the state is then returned untouched.
    /// Non-finite or non-positive `dt` is also a no-op.
    pub fn update_position(
        &self,
        detector: &CollisionDetector,
        state: MotionState,
        dt: f32,
        others: &[OtherPlayer],
        skip_physics: bool,
    ) -> MotionState {
        if skip_physics || !dt.is_finite() || dt <= 0.0 {
            return state;
        }

        let mut next = state;
        // Corrupt input velocity does not get to poison the position.
        for i in 0..3 {
            if !next.velocity[i].is_finite() {
                next.velocity[i] = 0.0;
            }
        }

        if !next.flying {
            next.velocity.y = self.apply_gravity(next.velocity.y, dt, next.on_ground);
        }

        let mut displacement = next.velocity * dt;
        if next.on_ground && !next.flying {
            displacement.y = 0.0;
        }

        let candidate = state.position + displacement;
        let (position, info) = self
            .resolver
            .resolve_movement(detector, state.position, candidate, others);
        next.position = position;

        if info.x {
            next.velocity.x = 0.0;
        }
        if info.z {
            next.velocity.z = 0.0;
        }
        if info.y {
            if displacement.y < 0.0 {
                next.on_ground = true;
                next.velocity.y = 0.0;
            } else if displacement.y > 0.0 {
                // Head bump
                next.velocity.y = 0.0;
            }
        } else if displacement.y != 0.0 {
            next.on_ground = false;
        }

        if next.on_ground && !next.flying && !self.has_support(detector, next.position, others) {
            tracing::trace!(position = ?next.position, "lost ground support");
            next.on_ground = false;
        }

        next
    }

    /// Whether something solid sits just below the feet at `position`.
    ///
    /// The world floor counts as support.
    pub fn has_support(
        &self,
        detector: &CollisionDetector,
        position: Vec3,
        others: &[OtherPlayer],
    ) -> bool {
        let below = position - Vec3::Y * SUPPORT_DEPTH;
        if below.y < self.resolver.feet_min().y {
            return true;
        }
        let world = detector.world().read();
        detector.check_collision_in(&world, below, others)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use blockworld_core::{BlockRecord, BlockType, VoxelCoord};
    use blockworld_world::World;

    use crate::config::CONTACT_SKIN;

    const DT: f32 = 0.05;

    fn floor_world() -> (CollisionDetector, PhysicsIntegrator) {
        let config = PhysicsConfig::default();
        let mut world = World::new();
        world.fill(
            VoxelCoord::new(0, 4, 0),
            VoxelCoord::new(20, 4, 20),
            &BlockRecord::new(BlockType::Stone, true),
        );
        (
            CollisionDetector::new(world.into_shared(), &config),
            PhysicsIntegrator::new(&config),
        )
    }

    fn standing() -> MotionState {
        MotionState {
            position: Vec3::new(10.0, 4.5 + CONTACT_SKIN, 10.0),
            on_ground: true,
            ..Default::default()
        }
    }

    #[test]
    fn gravity_skipped_on_ground() {
        let (_, integrator) = floor_world();
        assert_eq!(integrator.apply_gravity(0.0, DT, true), 0.0);
        assert_eq!(integrator.apply_gravity(2.0, DT, true), 2.0);
    }

    #[test]
    fn gravity_accelerates_and_caps() {
        let (_, integrator) = floor_world();
        assert_relative_eq!(
            integrator.apply_gravity(0.0, DT, false),
            -1.0,
            epsilon = 1e-6
        );
        assert_relative_eq!(integrator.apply_gravity(-49.5, DT, false), -50.0);
        assert_relative_eq!(integrator.apply_gravity(-50.0, 1.0, false), -50.0);
    }

    #[test]
    fn grounded_player_does_not_sink() {
        let (detector, integrator) = floor_world();
        let start = standing();
        let mut state = start;
        for _ in 0..200 {
            state = integrator.update_position(&detector, state, DT, &[], false);
        }
        assert_eq!(state, start);
    }

    #[test]
    fn falling_player_lands_on_floor() {
        let (detector, integrator) = floor_world();
        let mut state = MotionState::at(Vec3::new(10.0, 12.0, 10.0));
        for _ in 0..100 {
            state = integrator.update_position(&detector, state, DT, &[], false);
            if state.on_ground {
                break;
            }
        }
        assert!(state.on_ground);
        assert_eq!(state.velocity.y, 0.0);
        assert_relative_eq!(state.position.y, 4.5 + CONTACT_SKIN, epsilon = 1e-4);
    }

    #[test]
    fn jump_requires_ground() {
        let (_, integrator) = floor_world();
        let mut airborne = MotionState::at(Vec3::new(1.0, 10.0, 1.0));
        assert!(!integrator.jump(&mut airborne));
        assert_eq!(airborne.velocity.y, 0.0);

        let mut grounded = standing();
        assert!(integrator.jump(&mut grounded));
        assert!(!grounded.on_ground);
        assert_relative_eq!(grounded.velocity.y, (2.0_f32 * 20.0 * 1.25).sqrt());
    }

    #[test]
    fn jump_rises_and_returns_to_ground() {
        let (detector, integrator) = floor_world();
        let mut state = standing();
        integrator.jump(&mut state);

        let mut apex = state.position.y;
        for _ in 0..100 {
            state = integrator.update_position(&detector, state, DT, &[], false);
            apex = apex.max(state.position.y);
            if state.on_ground {
                break;
            }
        }
        assert!(state.on_ground);
        assert!(apex > standing().position.y + 1.0);
        assert!(apex < standing().position.y + 1.4);
    }

    #[test]
    fn head_bump_zeroes_upward_velocity() {
        let (detector, integrator) = floor_world();
        detector.world().write().insert(
            VoxelCoord::new(10, 7, 10),
            BlockRecord::new(BlockType::Stone, true),
        );
        let mut state = standing();
        integrator.jump(&mut state);
        // Head starts at 6.301, ceiling face at 6.5.
        let next = integrator.update_position(&detector, state, DT, &[], false);
        assert_eq!(next.velocity.y, 0.0);
        assert!(!next.on_ground);
        assert!(!detector.check_block_collision(next.position));
    }

    #[test]
    fn walking_off_a_ledge_starts_falling() {
        let (detector, integrator) = floor_world();
        let mut state = standing();
        state.position.x = 20.2;
        state.velocity.x = 16.0;
        let next = integrator.update_position(&detector, state, DT, &[], false);
        assert_relative_eq!(next.position.x, 21.0, epsilon = 1e-5);
        assert!(!next.on_ground);
    }

    #[test]
    fn flying_ignores_gravity() {
        let (detector, integrator) = floor_world();
        let mut state = MotionState::at(Vec3::new(10.0, 10.0, 10.0));
        state.flying = true;
        state.velocity.y = 2.0;
        let next = integrator.update_position(&detector, state, DT, &[], false);
        assert_relative_eq!(next.position.y, 10.1, epsilon = 1e-5);
        assert_eq!(next.velocity.y, 2.0);
    }

    #[test]
    fn skip_flag_freezes_state() {
        let (detector, integrator) = floor_world();
        let state = MotionState::at(Vec3::new(10.0, 30.0, 10.0));
        assert_eq!(
            integrator.update_position(&detector, state, DT, &[], true),
            state
        );
    }

    #[test]
    fn bad_timestep_is_a_no_op() {
        let (detector, integrator) = floor_world();
        let state = MotionState::at(Vec3::new(10.0, 30.0, 10.0));
        for dt in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            assert_eq!(
                integrator.update_position(&detector, state, dt, &[], false),
                state
            );
        }
    }

    #[test]
    fn non_finite_velocity_is_discarded() {
        let (detector, integrator) = floor_world();
        let mut state = standing();
        state.velocity = Vec3::new(f32::NAN, 0.0, 1.0);
        let next = integrator.update_position(&detector, state, DT, &[], false);
        assert!(next.position.is_finite());
        assert_eq!(next.velocity.x, 0.0);
        assert_relative_eq!(next.position.z, 10.05, epsilon = 1e-5);
    }

    #[test]
    fn world_floor_supports_players() {
        let config = PhysicsConfig::default();
        let detector = CollisionDetector::new(World::new().into_shared(), &config);
        let integrator = PhysicsIntegrator::new(&config);
        let mut state = MotionState::at(Vec3::new(5.0, 0.2, 5.0));
        for _ in 0..20 {
            state = integrator.update_position(&detector, state, DT, &[], false);
        }
        assert!(state.on_ground);
        assert_eq!(state.position.y, 0.0);
    }
}
