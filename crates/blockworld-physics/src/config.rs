//! Physics configuration.

use blockworld_core::Aabb;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Gap kept between a resting body and the face it rests against.
///
/// Touching faces count as contact, so a body placed exactly on a surface
/// would be reported as colliding with it.
pub const CONTACT_SKIN: f32 = 1.0e-3;

/// Distance below the feet checked to decide whether a grounded body is
/// still supported. Must exceed [`CONTACT_SKIN`].
pub const SUPPORT_DEPTH: f32 = 1.0e-2;

/// Longest single step taken when sweeping a move along one axis.
pub const MAX_SWEEP_STEP: f32 = 0.5;

/// Sweeps needing more steps than this are treated as blocked.
pub const MAX_SWEEP_SUBSTEPS: u32 = 1024;

/// A [`PhysicsConfig`] value that cannot work.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A quantity that must be positive is zero, negative or not finite
    #[error("{name} must be a positive finite number, got {value}")]
    NotPositive { name: &'static str, value: f32 },

    /// The player body is larger than the world along some axis
    #[error("{name} {size} does not fit in world extent {extent}")]
    BodyTooLarge {
        name: &'static str,
        size: f32,
        extent: u32,
    },
}

/// Tunable physics parameters.
///
/// Every engine instance carries its own copy, so differently configured
/// instances (for example with and without solid water) can coexist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Player bounding box width in X and Z.
    pub player_width: f32,
    /// Player bounding box height above the feet.
    pub player_height: f32,
    /// Downward acceleration in blocks per second squared.
    pub gravity: f32,
    /// Apex height of a jump, used to derive the jump speed.
    pub max_jump_height: f32,
    /// Maximum falling speed in blocks per second.
    pub terminal_velocity: f32,
    /// Whether water blocks stop bodies.
    pub water_collision_enabled: bool,
    /// World extent in X and Z.
    pub world_size: u32,
    /// World extent in Y.
    pub world_height: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            player_width: 0.6,
            player_height: 1.8,
            gravity: 20.0,
            max_jump_height: 1.25,
            terminal_velocity: 50.0,
            water_collision_enabled: true,
            world_size: 128,
            world_height: 64,
        }
    }
}

impl PhysicsConfig {
    /// Set the player bounding box.
    pub fn with_player_size(mut self, width: f32, height: f32) -> Self {
        self.player_width = width;
        self.player_height = height;
        self
    }

    /// Set the gravity acceleration.
    pub fn with_gravity(mut self, gravity: f32) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set the jump apex height.
    pub fn with_max_jump_height(mut self, height: f32) -> Self {
        self.max_jump_height = height;
        self
    }

    /// Set the terminal falling speed.
    pub fn with_terminal_velocity(mut self, speed: f32) -> Self {
        self.terminal_velocity = speed;
        self
    }

    /// Enable or disable water solidity.
    pub fn with_water_collision(mut self, enabled: bool) -> Self {
        self.water_collision_enabled = enabled;
        self
    }

    /// Set the world dimensions.
    pub fn with_world_dimensions(mut self, size: u32, height: u32) -> Self {
        self.world_size = size;
        self.world_height = height;
        self
    }

    /// Half the player width.
    #[inline]
    pub fn half_width(&self) -> f32 {
        self.player_width * 0.5
    }

    /// Initial upward speed that reaches `max_jump_height` under `gravity`.
    #[inline]
    pub fn jump_speed(&self) -> f32 {
        (2.0 * self.gravity * self.max_jump_height).max(0.0).sqrt()
    }

    /// The world volume every body must stay inside.
    pub fn world_bounds(&self) -> Aabb {
        let size = self.world_size as f32;
        Aabb::new(Vec3::ZERO, Vec3::new(size, self.world_height as f32, size))
    }

    /// Check the values for obvious mistakes, reporting the first problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("player_width", self.player_width),
            ("player_height", self.player_height),
            ("gravity", self.gravity),
            ("max_jump_height", self.max_jump_height),
            ("terminal_velocity", self.terminal_velocity),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NotPositive { name, value });
            }
        }
        if self.player_width > self.world_size as f32 {
            return Err(ConfigError::BodyTooLarge {
                name: "player_width",
                size: self.player_width,
                extent: self.world_size,
            });
        }
        if self.player_height > self.world_height as f32 {
            return Err(ConfigError::BodyTooLarge {
                name: "player_height",
                size: self.player_height,
                extent: self.world_height,
            });
        }
        Ok(())
    }
}
