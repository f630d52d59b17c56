//! World registry
//!
//! The world owns every body in an arena of generational slots. Iteration
//! follows registration order; removing a body compacts that order without
//! disturbing the relative order of the survivors.

use std::fmt;

use glam::Vec2;
use serde::Serialize;

use super::body::{Body, BodyBuilder};
use super::collision::CollisionEvent;
use super::handle::BodyHandle;
use super::shape::{ColliderId, Shape};
use crate::config::WorldConfig;
use crate::error::{PhysicsError, Result};

/// Callback run after every step
pub type PostStep = Box<dyn FnMut(&mut World) + Send>;

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    body: Option<Body>,
}

/// The simulation world
pub struct World {
    /// Gravity in pixels/s² (direction × magnitude × pixels-per-metre)
    pub gravity: Vec2,
    /// Per-axis drag coefficients
    pub resistance: Vec2,
    pixels_per_metre: f32,
    fidelity: f32,
    min_speed_squared: f32,
    slots: Vec<Slot>,
    free: Vec<u32>,
    order: Vec<u32>,
    elapsed: f64,
    frame: u64,
    pub(crate) events: Vec<CollisionEvent>,
    pub(crate) post_step: Option<PostStep>,
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("gravity", &self.gravity)
            .field("resistance", &self.resistance)
            .field("pixels_per_metre", &self.pixels_per_metre)
            .field("bodies", &self.order.len())
            .field("elapsed", &self.elapsed)
            .field("frame", &self.frame)
            .finish()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(&WorldConfig::default())
    }
}

impl World {
    /// Build an empty world from `config` as given
    ///
    /// Values are not checked; a non-positive fidelity stalls overlap
    /// correction. Use [`World::try_new`] for configs from outside.
    pub fn new(config: &WorldConfig) -> Self {
        Self {
            gravity: config.gravity(),
            resistance: config.resistance,
            pixels_per_metre: config.pixels_per_metre,
            fidelity: config.fidelity,
            min_speed_squared: config.min_speed_squared,
            slots: Vec::new(),
            free: Vec::new(),
            order: Vec::new(),
            elapsed: 0.0,
            frame: 0,
            events: Vec::new(),
            post_step: None,
        }
    }

    /// Validate `config`, then build
    pub fn try_new(config: &WorldConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Recompute gravity as direction × magnitude × pixels-per-metre
    pub fn set_gravity(&mut self, direction: Vec2, magnitude: f32) {
        self.gravity = direction * magnitude * self.pixels_per_metre;
    }

    #[inline]
    pub fn pixels_per_metre(&self) -> f32 {
        self.pixels_per_metre
    }

    /// Step length of the interpenetration correction loop
    #[inline]
    pub fn fidelity(&self) -> f32 {
        self.fidelity
    }

    /// Must be positive and finite; the old value is kept on error
    pub fn set_fidelity(&mut self, fidelity: f32) -> Result<()> {
        if !(fidelity.is_finite() && fidelity > 0.0) {
            return Err(PhysicsError::InvalidParameter {
                name: "fidelity",
                value: fidelity,
            });
        }
        self.fidelity = fidelity;
        Ok(())
    }

    #[inline]
    pub fn min_speed_squared(&self) -> f32 {
        self.min_speed_squared
    }

    /// Simulated seconds stepped so far
    #[inline]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Completed steps
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Append a body to the registry
    pub fn register(&mut self, body: Body) -> BodyHandle {
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index as usize].body = Some(body);
                index
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    body: Some(body),
                });
                (self.slots.len() - 1) as u32
            }
        };
        self.order.push(index);
        let handle = BodyHandle::new(index, self.slots[index as usize].generation);
        log::debug!("registered {}", handle);
        handle
    }

    /// Build and register in one go; nothing is registered on error
    pub fn spawn(&mut self, builder: BodyBuilder) -> Result<BodyHandle> {
        Ok(self.register(builder.build()?))
    }

    /// Remove a body, returning it; the handle (and any copy of it) goes dead
    pub fn remove(&mut self, handle: BodyHandle) -> Option<Body> {
        let slot = self.slot_mut(handle)?;
        let body = slot.body.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index());
        self.order.retain(|&i| i != handle.index());
        log::debug!("removed {}", handle);
        Some(body)
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.get(handle).is_some()
    }

    pub fn get(&self, handle: BodyHandle) -> Option<&Body> {
        self.slots
            .get(handle.index() as usize)
            .filter(|s| s.generation == handle.generation())
            .and_then(|s| s.body.as_ref())
    }

    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.slot_mut(handle).and_then(|s| s.body.as_mut())
    }

    /// Like [`World::get`] but reports stale handles as errors
    pub fn body(&self, handle: BodyHandle) -> Result<&Body> {
        self.get(handle).ok_or(PhysicsError::UnknownBody(handle))
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Result<&mut Body> {
        self.get_mut(handle).ok_or(PhysicsError::UnknownBody(handle))
    }

    /// Weight of a body under the current gravity
    pub fn weight(&self, handle: BodyHandle) -> Option<Vec2> {
        self.get(handle).map(|b| b.weight(self.gravity))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Live handles in registry order
    pub fn handles(&self) -> Vec<BodyHandle> {
        self.order.iter().map(|&i| self.handle_at(i)).collect()
    }

    /// Live bodies in registry order
    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &Body)> + '_ {
        self.order.iter().filter_map(move |&i| {
            let slot = &self.slots[i as usize];
            slot.body
                .as_ref()
                .map(|b| (BodyHandle::new(i, slot.generation), b))
        })
    }

    /// Every body whose collider intersects `shape`, skipping the collider
    /// identified by `exclude`; results follow registry order
    pub fn query(&self, shape: &Shape, exclude: ColliderId) -> Vec<BodyHandle> {
        self.iter()
            .filter(|(_, b)| b.collider().id() != exclude && shape.intersects(b.collider()))
            .map(|(h, _)| h)
            .collect()
    }

    /// Bodies containing a point, in registry order
    pub fn query_point(&self, point: Vec2) -> Vec<BodyHandle> {
        self.iter()
            .filter(|(_, b)| b.collider().contains_point(point))
            .map(|(h, _)| h)
            .collect()
    }

    /// Collision events of the latest step
    ///
    /// Cleared when the next step starts; drain them after each step to
    /// keep them.
    pub fn events(&self) -> &[CollisionEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<CollisionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Install the callback run at the end of every step
    pub fn set_post_step(&mut self, callback: impl FnMut(&mut World) + Send + 'static) {
        self.post_step = Some(Box::new(callback));
    }

    pub fn clear_post_step(&mut self) {
        self.post_step = None;
    }

    /// Copy of every collider and velocity, for readers off the physics thread
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            frame: self.frame,
            elapsed: self.elapsed,
            bodies: self
                .iter()
                .map(|(handle, b)| BodySnapshot {
                    handle,
                    collider: b.collider().clone(),
                    velocity: b.velocity,
                    kinematic: b.is_kinematic(),
                    immobile: b.is_immobile(),
                })
                .collect(),
        }
    }

    pub(crate) fn begin_frame(&mut self, dt: f32) {
        self.events.clear();
        self.elapsed += f64::from(dt);
    }

    pub(crate) fn finish_frame(&mut self) {
        self.frame += 1;
    }

    /// Handle of the n-th body in registry order
    pub(crate) fn handle_in_order(&self, n: usize) -> Option<BodyHandle> {
        self.order.get(n).map(|&i| self.handle_at(i))
    }

    /// Take a body out of its slot while it is being updated
    pub(crate) fn detach(&mut self, handle: BodyHandle) -> Option<Body> {
        self.slot_mut(handle).and_then(|s| s.body.take())
    }

    pub(crate) fn attach(&mut self, handle: BodyHandle, body: Body) {
        if let Some(slot) = self.slots.get_mut(handle.index() as usize) {
            if slot.generation == handle.generation() && slot.body.is_none() {
                slot.body = Some(body);
            }
        }
    }

    /// Live bodies in arena order
    pub(crate) fn bodies_mut(&mut self) -> impl Iterator<Item = &mut Body> + '_ {
        self.slots.iter_mut().filter_map(|s| s.body.as_mut())
    }

    fn handle_at(&self, index: u32) -> BodyHandle {
        BodyHandle::new(index, self.slots[index as usize].generation)
    }

    fn slot_mut(&mut self, handle: BodyHandle) -> Option<&mut Slot> {
        self.slots
            .get_mut(handle.index() as usize)
            .filter(|s| s.generation == handle.generation())
    }
}

/// Read-only copy of a body's collision state
#[derive(Debug, Clone, Serialize)]
pub struct BodySnapshot {
    pub handle: BodyHandle,
    pub collider: Shape,
    pub velocity: Vec2,
    pub kinematic: bool,
    pub immobile: bool,
}

/// Read-only copy of a world after a step
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorldSnapshot {
    pub frame: u64,
    pub elapsed: f64,
    pub bodies: Vec<BodySnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ball(x: f32, y: f32) -> Body {
        Body::builder(Shape::circle(Vec2::new(x, y), 5.0).unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn test_register_keeps_order() {
        let mut world = World::default();
        let a = world.register(ball(0.0, 0.0));
        let b = world.register(ball(100.0, 0.0));
        let c = world.register(ball(200.0, 0.0));

        assert_eq!(world.len(), 3);
        assert_eq!(world.handles(), vec![a, b, c]);
    }

    #[test]
    fn test_query_excludes_identity() {
        let mut world = World::default();
        let a = world.register(ball(0.0, 0.0));
        let b = world.register(ball(8.0, 0.0));

        let probe = world.get(a).unwrap().collider().clone();
        assert_eq!(world.query(&probe, probe.id()), vec![b]);

        // A fresh collider at the same spot is a different identity
        let stranger = Shape::circle(Vec2::ZERO, 5.0).unwrap();
        assert_eq!(world.query(&stranger, stranger.id()), vec![a, b]);
    }

    #[test]
    fn test_remove_invalidates_handle() {
        let mut world = World::default();
        let a = world.register(ball(0.0, 0.0));
        let b = world.register(ball(100.0, 0.0));
        let c = world.register(ball(200.0, 0.0));

        assert!(world.remove(b).is_some());
        assert!(!world.contains(b));
        assert!(world.remove(b).is_none());
        assert_eq!(world.handles(), vec![a, c]);

        // Slot reuse hands out a new generation and appends to the order
        let d = world.register(ball(300.0, 0.0));
        assert_eq!(d.index(), b.index());
        assert_ne!(d, b);
        assert!(world.get(b).is_none());
        assert!(matches!(world.body(b), Err(PhysicsError::UnknownBody(_))));
        assert_eq!(world.handles(), vec![a, c, d]);
    }

    #[test]
    fn test_removed_body_no_longer_collides() {
        let mut world = World::default();
        let a = world.register(ball(0.0, 0.0));
        let b = world.register(ball(8.0, 0.0));
        world.remove(b);

        let probe = world.get(a).unwrap().collider().clone();
        assert!(world.query(&probe, probe.id()).is_empty());
    }

    #[test]
    fn test_set_gravity_scales_by_pixels_per_metre() {
        let mut world = World::default();
        assert!((world.gravity - Vec2::new(0.0, 98.1)).length() < 1e-4);

        world.set_gravity(Vec2::new(1.0, 0.0), 2.0);
        assert_eq!(world.gravity, Vec2::new(20.0, 0.0));

        world.gravity = Vec2::ZERO;
        let a = world.register(ball(0.0, 0.0));
        assert_eq!(world.weight(a), Some(Vec2::ZERO));
    }

    #[test]
    fn test_query_point() {
        let mut world = World::default();
        let a = world.register(ball(0.0, 0.0));
        world.register(ball(50.0, 0.0));
        assert_eq!(world.query_point(Vec2::new(1.0, 1.0)), vec![a]);
    }

    #[test]
    fn test_spawn_rejects_without_registering() {
        let mut world = World::default();
        let builder = Body::builder(Shape::circle(Vec2::ZERO, 1.0).unwrap()).density(0.0);
        assert!(world.spawn(builder).is_err());
        assert!(world.is_empty());
    }

    #[test]
    fn test_snapshot() {
        let mut world = World::default();
        let a = world.register(ball(3.0, 4.0));
        let snap = world.snapshot();
        assert_eq!(snap.bodies.len(), 1);
        assert_eq!(snap.bodies[0].handle, a);
        assert_eq!(snap.bodies[0].collider.position(), Vec2::new(3.0, 4.0));
    }

    #[test]
    fn test_set_fidelity_rejects_non_positive() {
        let mut world = World::default();
        assert!(world.set_fidelity(0.5).is_ok());
        for bad in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                world.set_fidelity(bad),
                Err(PhysicsError::InvalidParameter { name: "fidelity", .. })
            ));
        }
        assert_eq!(world.fidelity(), 0.5);
    }

    #[test]
    fn test_try_new_validates() {
        let mut config = WorldConfig::default();
        assert!(World::try_new(&config).is_ok());
        config.fidelity = 0.0;
        assert!(World::try_new(&config).is_err());
    }
}
