//! Simulation module
//!
//! Everything that moves bodies lives here. The step is deterministic:
//! - Bodies update strictly in registration order
//! - Each axis is proposed from the start-of-update position
//! - No clocks, threads or randomness inside a step

pub mod body;
pub mod collision;
pub mod handle;
pub mod response;
pub mod shape;
pub mod tick;
pub mod world;

pub use body::{Body, BodyBuilder, CollisionHooks};
pub use collision::{Axis, AxisHits, CollisionEvent};
pub use handle::BodyHandle;
pub use shape::{Circle, ColliderId, Rect, Shape, ShapeKind};
pub use tick::step;
pub use world::{BodySnapshot, PostStep, World, WorldSnapshot};
