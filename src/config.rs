//! World and scene configuration
//!
//! Everything here is plain serde data. Missing JSON fields fall back to the
//! engine defaults, so `{}` is a valid world config.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts;
use crate::error::{PhysicsError, Result};
use crate::sim::{Body, BodyBuilder, Shape, World};

/// World-wide tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Pixel to metre conversion rate
    pub pixels_per_metre: f32,
    /// Gravity in m/s²
    pub gravity_magnitude: f32,
    /// Unit direction of gravity in screen space (+Y down)
    pub gravity_direction: Vec2,
    /// Per-axis drag coefficients
    pub resistance: Vec2,

    // === Driving loop ===
    /// Multiplier applied to wall-clock time before stepping
    pub time_scale: f32,
    /// Frames whose scaled elapsed time exceeds this are skipped
    pub dt_threshold: f32,
    /// Fixed timestep in seconds
    pub fixed_dt: f32,
    /// Maximum steps run for one frame
    pub max_substeps: u32,

    // === Resolution ===
    /// Step length of the interpenetration correction loop
    pub fidelity: f32,
    /// Squared speed under which a body counts as stalled
    pub min_speed_squared: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            pixels_per_metre: consts::PIXELS_PER_METRE,
            gravity_magnitude: consts::GRAVITY_MAGNITUDE,
            gravity_direction: consts::DOWN,
            resistance: Vec2::ZERO,

            time_scale: 1.0,
            dt_threshold: consts::DT_THRESHOLD,
            fixed_dt: consts::SIM_DT,
            max_substeps: consts::MAX_SUBSTEPS,

            fidelity: consts::SEPARATION_FIDELITY,
            min_speed_squared: consts::MIN_SPEED_SQUARED,
        }
    }
}

impl WorldConfig {
    /// Gravity in pixels/s²
    pub fn gravity(&self) -> Vec2 {
        self.gravity_direction * self.gravity_magnitude * self.pixels_per_metre
    }

    /// Same config with gravity switched off
    pub fn without_gravity(mut self) -> Self {
        self.gravity_magnitude = 0.0;
        self
    }

    /// Reject values the step or the driving loop cannot work with
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("pixels_per_metre", self.pixels_per_metre),
            ("fidelity", self.fidelity),
            ("fixed_dt", self.fixed_dt),
            ("dt_threshold", self.dt_threshold),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(PhysicsError::InvalidParameter { name, value });
            }
        }
        let non_negative = [
            ("time_scale", self.time_scale),
            ("min_speed_squared", self.min_speed_squared),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(PhysicsError::InvalidParameter { name, value });
            }
        }
        if !(self.gravity().is_finite() && self.resistance.is_finite()) {
            return Err(PhysicsError::InvalidParameter {
                name: "gravity",
                value: self.gravity_magnitude,
            });
        }
        if self.max_substeps == 0 {
            return Err(PhysicsError::InvalidParameter {
                name: "max_substeps",
                value: 0.0,
            });
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded world config from {}", path.as_ref().display());
        Ok(config)
    }
}

/// Collider description
///
/// Polygons parse so that scene files written for richer engines still
/// load, but they cannot be turned into a collider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ShapeConfig {
    Circle { centre: Vec2, radius: f32 },
    Rect { origin: Vec2, size: Vec2 },
    Polygon { points: Vec<Vec2> },
}

impl ShapeConfig {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ShapeConfig::Circle { .. } => "circle",
            ShapeConfig::Rect { .. } => "rect",
            ShapeConfig::Polygon { .. } => "polygon",
        }
    }

    pub fn to_shape(&self) -> Result<Shape> {
        match self {
            ShapeConfig::Circle { centre, radius } => Shape::circle(*centre, *radius),
            ShapeConfig::Rect { origin, size } => Shape::rect(*origin, *size),
            ShapeConfig::Polygon { .. } => {
                Err(PhysicsError::UnsupportedCollider(self.kind_name().to_string()))
            }
        }
    }
}

fn default_density() -> f32 {
    1.0
}

fn default_bounciness() -> f32 {
    1.0
}

/// Body constructor parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyConfig {
    pub shape: ShapeConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec2>,
    #[serde(default)]
    pub kinematic: bool,
    #[serde(default = "default_density")]
    pub density: f32,
    #[serde(default)]
    pub velocity: Vec2,
    #[serde(default)]
    pub acceleration: Vec2,
    #[serde(default = "default_bounciness")]
    pub bounciness: f32,
    #[serde(default)]
    pub attractiveness: f32,
    #[serde(default)]
    pub immobile: bool,
}

impl BodyConfig {
    pub fn new(shape: ShapeConfig) -> Self {
        Self {
            shape,
            position: None,
            kinematic: false,
            density: default_density(),
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            bounciness: default_bounciness(),
            attractiveness: 0.0,
            immobile: false,
        }
    }

    pub fn to_builder(&self) -> Result<BodyBuilder> {
        let mut builder = Body::builder(self.shape.to_shape()?)
            .kinematic(self.kinematic)
            .density(self.density)
            .velocity(self.velocity)
            .acceleration(self.acceleration)
            .bounciness(self.bounciness)
            .attractiveness(self.attractiveness)
            .immobile(self.immobile);
        if let Some(position) = self.position {
            builder = builder.position(position);
        }
        Ok(builder)
    }
}

/// A world plus the bodies to register, in order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub bodies: Vec<BodyConfig>,
}

impl SceneConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let scene = Self::from_json(&json)?;
        log::info!(
            "Loaded scene with {} bodies from {}",
            scene.bodies.len(),
            path.as_ref().display()
        );
        Ok(scene)
    }

    /// Build the world; every body is validated before any is registered
    pub fn build(&self) -> Result<World> {
        let mut world = World::try_new(&self.world)?;
        let bodies = self
            .bodies
            .iter()
            .map(|b| b.to_builder()?.build())
            .collect::<Result<Vec<_>>>()?;

        for body in bodies {
            world.register(body);
        }
        Ok(world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorldConfig::default();
        assert_eq!(config.pixels_per_metre, 10.0);
        assert_eq!(config.gravity_direction, Vec2::new(0.0, 1.0));
        assert_eq!(config.resistance, Vec2::ZERO);
        assert_eq!(config.time_scale, 1.0);
        assert_eq!(config.fidelity, 0.001);
        assert_eq!(config.min_speed_squared, 4.0);
        assert_eq!(config.dt_threshold, 0.2);
        assert_eq!(config.max_substeps, 8);
        assert!((config.gravity().y - 98.1).abs() < 1e-4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(WorldConfig::from_json("{}").unwrap(), WorldConfig::default());
        assert_eq!(SceneConfig::from_json("{}").unwrap(), SceneConfig::default());
    }

    #[test]
    fn test_json_keeps_non_default_fields() {
        let mut config = WorldConfig::default();
        config.pixels_per_metre = 32.0;
        config.resistance = Vec2::new(0.1, 0.2);
        config.max_substeps = 3;

        let json = config.to_json().unwrap();
        let parsed = WorldConfig::from_json(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_json() {
        let config = WorldConfig::from_json(r#"{ "gravity_magnitude": 0.0, "resistance": [1.0, 2.0] }"#)
            .unwrap();
        assert_eq!(config.gravity(), Vec2::ZERO);
        assert_eq!(config.resistance, Vec2::new(1.0, 2.0));
        assert_eq!(config.fidelity, 0.001);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = WorldConfig::default();
        config.fidelity = 0.0;
        assert!(matches!(
            config.validate(),
            Err(PhysicsError::InvalidParameter { name: "fidelity", .. })
        ));

        let mut config = WorldConfig::default();
        config.max_substeps = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_body_config_defaults() {
        let body: BodyConfig =
            serde_json::from_str(r#"{ "shape": { "kind": "circle", "centre": [1.0, 2.0], "radius": 3.0 } }"#)
                .unwrap();
        assert_eq!(body.density, 1.0);
        assert_eq!(body.bounciness, 1.0);
        assert!(!body.kinematic);
        assert_eq!(body, BodyConfig::new(body.shape.clone()));
    }

    #[test]
    fn test_polygon_rejected() {
        let shape: ShapeConfig =
            serde_json::from_str(r#"{ "kind": "polygon", "points": [[0, 0], [1, 0], [0, 1]] }"#).unwrap();
        assert!(matches!(
            shape.to_shape(),
            Err(PhysicsError::UnsupportedCollider(kind)) if kind == "polygon"
        ));
    }

    #[test]
    fn test_scene_build() {
        let json = r#"{
            "world": { "gravity_magnitude": 0.0 },
            "bodies": [
                { "shape": { "kind": "rect", "origin": [0, 0], "size": [10, 10] }, "immobile": true },
                { "shape": { "kind": "circle", "centre": [50, 0], "radius": 5 }, "velocity": [-10, 0] }
            ]
        }"#;
        let world = SceneConfig::from_json(json).unwrap().build().unwrap();
        assert_eq!(world.len(), 2);
        assert_eq!(world.gravity, Vec2::ZERO);

        let handles = world.handles();
        assert!(world.get(handles[0]).unwrap().is_immobile());
        assert_eq!(world.get(handles[1]).unwrap().velocity, Vec2::new(-10.0, 0.0));
    }

    #[test]
    fn test_scene_build_is_all_or_nothing() {
        let mut scene = SceneConfig::default();
        scene.bodies.push(BodyConfig::new(ShapeConfig::Circle {
            centre: Vec2::ZERO,
            radius: 1.0,
        }));
        scene.bodies.push(BodyConfig::new(ShapeConfig::Polygon { points: Vec::new() }));

        assert!(matches!(scene.build(), Err(PhysicsError::UnsupportedCollider(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let err = SceneConfig::load("/definitely/not/here.json");
        assert!(matches!(err, Err(PhysicsError::Io(_))));
    }
}
