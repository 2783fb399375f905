//! Error types for the engine.

use thiserror::Error;

/// Engine-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Block type name or id that no `BlockType` matches
    #[error("Unknown block type: {0}")]
    UnknownBlockType(String),

    /// Out of bounds access
    #[error("Out of bounds: {0}")]
    OutOfBounds(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
