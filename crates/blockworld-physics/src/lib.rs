//! Voxel collision and player physics for Blockworld.
//!
//! This crate provides:
//! - The block solidity policy ([`BlockSolidityTable`])
//! - Body versus world and body versus body queries ([`CollisionDetector`])
//! - Per-axis movement resolution with sliding ([`CollisionResolver`])
//! - Gravity, jumping and flight ([`PhysicsIntegrator`])
//! - Auditing of completed moves ([`TraversalAuditor`])
//!
//! Player bodies are axis-aligned boxes anchored at the feet: a body at
//! `(x, y, z)` spans `x ± width/2`, `y ..= y + height` and `z ± width/2`.

pub mod audit;
pub mod config;
pub mod detector;
pub mod integrator;
pub mod resolver;
pub mod solidity;

pub use audit::{AuditOutcome, TraversalAuditor};
pub use config::{
    ConfigError, PhysicsConfig, CONTACT_SKIN, MAX_SWEEP_STEP, MAX_SWEEP_SUBSTEPS, SUPPORT_DEPTH,
};
pub use detector::{CollisionDetector, OtherPlayer};
pub use integrator::{MotionState, PhysicsIntegrator};
pub use resolver::{Axis, CollisionInfo, CollisionResolver, AXIS_ORDER};
pub use solidity::BlockSolidityTable;
