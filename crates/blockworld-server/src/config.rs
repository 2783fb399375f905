//! Server configuration.

use std::path::Path;

use blockworld_physics::PhysicsConfig;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};

/// Configuration of the authoritative simulation.
///
/// Loaded from TOML; every field is optional and falls back to its default.
///
/// ```toml
/// tick_rate = 20
/// max_move_per_tick = 2.0
///
/// [physics]
/// water_collision_enabled = false
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Simulation ticks per second.
    pub tick_rate: u32,
    /// How long after an accepted move physics leaves the player alone.
    pub grace_period_secs: f32,
    /// Longest accepted distance between the last accepted position and a
    /// requested one.
    pub max_move_per_tick: f32,
    /// Physics parameters.
    pub physics: PhysicsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_rate: 20,
            grace_period_secs: 0.5,
            max_move_per_tick: 2.0,
            physics: PhysicsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Set the tick rate.
    pub fn with_tick_rate(mut self, tick_rate: u32) -> Self {
        self.tick_rate = tick_rate;
        self
    }

    /// Set the grace period.
    pub fn with_grace_period(mut self, secs: f32) -> Self {
        self.grace_period_secs = secs;
        self
    }

    /// Set the per-request movement limit.
    pub fn with_max_move_per_tick(mut self, distance: f32) -> Self {
        self.max_move_per_tick = distance;
        self
    }

    /// Set the physics parameters.
    pub fn with_physics(mut self, physics: PhysicsConfig) -> Self {
        self.physics = physics;
        self
    }

    /// Seconds simulated per tick.
    pub fn tick_dt(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }

    /// The grace period expressed in whole ticks, rounded up.
    pub fn grace_ticks(&self) -> u64 {
        let ticks = (self.grace_period_secs.max(0.0) * self.tick_rate as f32).ceil();
        if ticks.is_finite() {
            ticks as u64
        } else {
            0
        }
    }

    /// Parse a TOML document and validate it.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check the values for obvious mistakes.
    pub fn validate(&self) -> Result<()> {
        if self.tick_rate == 0 {
            return Err(SimulationError::Config(
                "tick_rate must be at least 1".into(),
            ));
        }
        if !self.grace_period_secs.is_finite() || self.grace_period_secs < 0.0 {
            return Err(SimulationError::Config(format!(
                "grace_period_secs must be a non-negative finite number, got {}",
                self.grace_period_secs
            )));
        }
        if !self.max_move_per_tick.is_finite() || self.max_move_per_tick <= 0.0 {
            return Err(SimulationError::Config(format!(
                "max_move_per_tick must be a positive finite number, got {}",
                self.max_move_per_tick
            )));
        }
        self.physics.validate().map_err(SimulationError::from)
    }
}
