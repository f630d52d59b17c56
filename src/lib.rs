//! Pixel Physics - axis-separated collision and motion for 2D games
//!
//! Core modules:
//! - `sim`: Shapes, bodies, the world registry and the per-frame step
//! - `config`: Serializable world and scene configuration
//! - `scenario`: Preset scenes (pong, football, platformer, gravity well)
//! - `runner`: Fixed-timestep pacing and background stepping

pub mod config;
pub mod error;
pub mod runner;
pub mod scenario;
pub mod sim;

pub use config::{SceneConfig, WorldConfig};
pub use error::{PhysicsError, Result};
pub use sim::{Axis, Body, BodyBuilder, BodyHandle, CollisionHooks, Shape, World};

use glam::Vec2;

/// Engine constants
pub mod consts {
    use glam::Vec2;

    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Frames slower than this (scaled seconds) are skipped by the driving loop
    pub const DT_THRESHOLD: f32 = 0.2;

    /// Default pixel to metre conversion rate
    pub const PIXELS_PER_METRE: f32 = 10.0;
    /// Earth gravity in m/s²
    pub const GRAVITY_MAGNITUDE: f32 = 9.81;

    /// Below this squared speed a body counts as stalled for bounces and
    /// is left alone by interpenetration correction
    pub const MIN_SPEED_SQUARED: f32 = 4.0;
    /// Step length of the interpenetration correction loop
    pub const SEPARATION_FIDELITY: f32 = 0.001;
    /// Hard cap on correction nudges per overlapping pair
    pub const MAX_SEPARATION_STEPS: u32 = 1_000_000;

    /// Screen-space directions (+Y points down)
    pub const UP: Vec2 = Vec2::new(0.0, -1.0);
    pub const DOWN: Vec2 = Vec2::new(0.0, 1.0);
    pub const LEFT: Vec2 = Vec2::new(-1.0, 0.0);
    pub const RIGHT: Vec2 = Vec2::new(1.0, 0.0);
}

/// Unit vector pointing from `from` to `to`, or zero if they coincide
#[inline]
pub fn direction_between(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalize_or_zero()
}

/// Compass bearing of a vector in degrees: 0 is up, 90 is right
#[inline]
pub fn bearing_degrees(v: Vec2) -> f32 {
    v.x.atan2(-v.y).to_degrees()
}

/// Rotate a vector by an angle in degrees
#[inline]
pub fn rotate_degrees(v: Vec2, degrees: f32) -> Vec2 {
    Vec2::from_angle(degrees.to_radians()).rotate(v)
}

/// Round to a fixed number of decimal places
#[inline]
pub fn round_to(value: f32, places: i32) -> f32 {
    let scale = 10f32.powi(places);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_between() {
        let d = direction_between(Vec2::new(1.0, 1.0), Vec2::new(4.0, 5.0));
        assert!((d - Vec2::new(0.6, 0.8)).length() < 1e-6);
        assert_eq!(direction_between(Vec2::ONE, Vec2::ONE), Vec2::ZERO);
    }

    #[test]
    fn test_bearing_degrees() {
        assert!(bearing_degrees(consts::UP).abs() < 1e-4);
        assert!((bearing_degrees(consts::RIGHT) - 90.0).abs() < 1e-4);
        assert!((bearing_degrees(consts::DOWN).abs() - 180.0).abs() < 1e-4);
        assert!((bearing_degrees(consts::LEFT) + 90.0).abs() < 1e-4);
    }

    #[test]
    fn test_rotate_degrees() {
        let v = rotate_degrees(Vec2::new(10.0, 0.0), 90.0);
        assert!((v - Vec2::new(0.0, 10.0)).length() < 1e-4);
    }

    #[test]
    fn test_round_to() {
        assert!((round_to(12.34567, 3) - 12.346).abs() < 1e-5);
        assert!((round_to(-0.0004, 3)).abs() < 1e-6);
    }
}
