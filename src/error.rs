//! Error types
//!
//! Every failure is a construction-time rejection: stepping a world cannot
//! fail once its bodies have been validated.

use thiserror::Error;

use crate::sim::BodyHandle;

/// Errors raised while building shapes, bodies, worlds and scenes
#[derive(Debug, Error)]
pub enum PhysicsError {
    /// Shape dimensions or position are not usable for collision
    #[error("invalid shape: {0}")]
    InvalidShape(String),

    /// Collider kind outside the Circle/Rect set
    #[error("unsupported collider kind `{0}` (expected circle or rect)")]
    UnsupportedCollider(String),

    /// Density must be positive and finite
    #[error("density must be positive and finite, got {0}")]
    InvalidDensity(f32),

    /// Collider area too small to give the body a mass
    #[error("collider area must be positive, got {0}")]
    DegenerateCollider(f32),

    /// Any other out-of-range body parameter
    #[error("invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: f32 },

    /// Handle does not refer to a live body
    #[error("no live body for {0}")]
    UnknownBody(BodyHandle),

    #[error("config parse error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PhysicsError>;
