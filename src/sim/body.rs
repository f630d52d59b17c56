//! Physics bodies
//!
//! A body owns exactly one collider. Mass is derived once from density and
//! collider area and never changes afterwards.

use std::fmt;

use glam::Vec2;

use super::collision::{Axis, AxisHits};
use super::shape::Shape;
use super::world::World;
use crate::error::{PhysicsError, Result};

/// Per-body collision callbacks
///
/// Both methods default to no-ops. During `on_own_collision` the body being
/// updated is detached from `world`, so looking its own handle up fails.
pub trait CollisionHooks: Send {
    /// Called once per frame on the moving body when either axis proposal hit something
    fn on_own_collision(&mut self, _own: &mut Body, _hits: &AxisHits, _world: &World) {}

    /// Called on each body hit by another body's proposal
    fn on_other_collision(&mut self, _own: &mut Body, _mover: &mut Body, _axis: Axis) {}
}

/// A simulated body
pub struct Body {
    /// Last resolved collider position
    pub position: Vec2,
    pub velocity: Vec2,
    /// Constant acceleration integrated every frame (non-kinematic only)
    pub acceleration: Vec2,
    /// Response tuning coefficient, averaged with whatever it hits
    pub bounciness: f32,
    /// Inverse-square pull exerted on other bodies; 0 is inert
    pub attractiveness: f32,
    collider: Shape,
    density: f32,
    mass: f32,
    kinematic: bool,
    immobile: bool,
    hooks: Option<Box<dyn CollisionHooks>>,
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body")
            .field("position", &self.position)
            .field("velocity", &self.velocity)
            .field("acceleration", &self.acceleration)
            .field("bounciness", &self.bounciness)
            .field("attractiveness", &self.attractiveness)
            .field("collider", &self.collider)
            .field("mass", &self.mass)
            .field("kinematic", &self.kinematic)
            .field("immobile", &self.immobile)
            .field("hooks", &self.hooks.is_some())
            .finish()
    }
}

impl Body {
    /// Start a builder with the default constructor parameters
    pub fn builder(collider: Shape) -> BodyBuilder {
        BodyBuilder::new(collider)
    }

    #[inline]
    pub fn collider(&self) -> &Shape {
        &self.collider
    }

    #[inline]
    pub fn density(&self) -> f32 {
        self.density
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Weight under the given gravity (F = mg)
    #[inline]
    pub fn weight(&self, gravity: Vec2) -> Vec2 {
        gravity * self.mass
    }

    #[inline]
    pub fn is_kinematic(&self) -> bool {
        self.kinematic
    }

    #[inline]
    pub fn is_immobile(&self) -> bool {
        self.immobile
    }

    /// Toggle kinematic behaviour; immobile bodies stay kinematic
    pub fn set_kinematic(&mut self, kinematic: bool) {
        self.kinematic = kinematic || self.immobile;
    }

    #[inline]
    pub fn speed_squared(&self) -> f32 {
        self.velocity.length_squared()
    }

    /// Move the collider anchor (and the stored position) to `position`
    pub fn set_position(&mut self, position: Vec2) {
        self.collider.set_position(position);
        self.position = self.collider.position();
    }

    /// Move the collider (and the stored position) by `delta`
    pub fn translate(&mut self, delta: Vec2) {
        self.collider.translate(delta);
        self.position = self.collider.position();
    }

    /// v = u + at
    #[inline]
    pub fn apply_acceleration(&mut self, acceleration: Vec2, dt: f32) {
        self.velocity += acceleration * dt;
    }

    /// Replace the constant acceleration with f / m
    #[inline]
    pub fn apply_force(&mut self, force: Vec2) {
        self.acceleration = force / self.mass;
    }

    pub fn set_hooks(&mut self, hooks: Box<dyn CollisionHooks>) {
        self.hooks = Some(hooks);
    }

    pub fn clear_hooks(&mut self) -> Option<Box<dyn CollisionHooks>> {
        self.hooks.take()
    }

    pub(crate) fn collider_mut(&mut self) -> &mut Shape {
        &mut self.collider
    }

    pub(crate) fn sync_position(&mut self) {
        self.position = self.collider.position();
    }

    pub(crate) fn take_hooks(&mut self) -> Option<Box<dyn CollisionHooks>> {
        self.hooks.take()
    }

    pub(crate) fn restore_hooks(&mut self, hooks: Option<Box<dyn CollisionHooks>>) {
        // A hook may have installed a replacement for itself
        if self.hooks.is_none() {
            self.hooks = hooks;
        }
    }
}

/// Builder mirroring the body constructor and its defaults
pub struct BodyBuilder {
    collider: Shape,
    position: Option<Vec2>,
    kinematic: bool,
    density: f32,
    velocity: Vec2,
    acceleration: Vec2,
    bounciness: f32,
    attractiveness: f32,
    immobile: bool,
    hooks: Option<Box<dyn CollisionHooks>>,
}

impl BodyBuilder {
    pub fn new(collider: Shape) -> Self {
        Self {
            collider,
            position: None,
            kinematic: false,
            density: 1.0,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            bounciness: 1.0,
            attractiveness: 0.0,
            immobile: false,
            hooks: None,
        }
    }

    /// Initial collider anchor; defaults to where the collider already is
    pub fn position(mut self, position: Vec2) -> Self {
        self.position = Some(position);
        self
    }

    pub fn kinematic(mut self, kinematic: bool) -> Self {
        self.kinematic = kinematic;
        self
    }

    pub fn density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    pub fn velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn acceleration(mut self, acceleration: Vec2) -> Self {
        self.acceleration = acceleration;
        self
    }

    pub fn bounciness(mut self, bounciness: f32) -> Self {
        self.bounciness = bounciness;
        self
    }

    pub fn attractiveness(mut self, attractiveness: f32) -> Self {
        self.attractiveness = attractiveness;
        self
    }

    /// Immobile bodies are always kinematic
    pub fn immobile(mut self, immobile: bool) -> Self {
        self.immobile = immobile;
        self
    }

    pub fn hooks(mut self, hooks: Box<dyn CollisionHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Validate parameters and derive mass
    pub fn build(self) -> Result<Body> {
        if !(self.density.is_finite() && self.density > 0.0) {
            return Err(PhysicsError::InvalidDensity(self.density));
        }
        let area = self.collider.area();
        if !(area.is_finite() && area > 0.0) {
            return Err(PhysicsError::DegenerateCollider(area));
        }
        let mass = self.density * area;
        if !(mass.is_finite() && mass > 0.0) {
            return Err(PhysicsError::InvalidParameter {
                name: "mass",
                value: mass,
            });
        }
        if !(self.bounciness.is_finite() && self.bounciness >= 0.0) {
            return Err(PhysicsError::InvalidParameter {
                name: "bounciness",
                value: self.bounciness,
            });
        }
        if !self.attractiveness.is_finite() {
            return Err(PhysicsError::InvalidParameter {
                name: "attractiveness",
                value: self.attractiveness,
            });
        }
        for (name, v) in [("velocity", self.velocity), ("acceleration", self.acceleration)] {
            if !v.is_finite() {
                return Err(PhysicsError::InvalidParameter {
                    name,
                    value: if v.x.is_finite() { v.y } else { v.x },
                });
            }
        }

        let mut collider = self.collider;
        if let Some(position) = self.position {
            if !position.is_finite() {
                return Err(PhysicsError::InvalidShape(format!(
                    "initial position {} is not finite",
                    position
                )));
            }
            collider.set_position(position);
        }

        Ok(Body {
            position: collider.position(),
            velocity: self.velocity,
            acceleration: self.acceleration,
            bounciness: self.bounciness,
            attractiveness: self.attractiveness,
            collider,
            density: self.density,
            mass,
            kinematic: self.kinematic || self.immobile,
            immobile: self.immobile,
            hooks: self.hooks,
        })
    }
}
