//! Collision response and force application
//!
//! These formulas are tuned for game feel, not derived from physics: push
//! scales by the mass ratio and the mean bounciness of the pair, bounce by
//! the mean bounciness of everything involved.

use glam::Vec2;

use super::body::Body;
use super::collision::{self, Axis, AxisHits};
use super::handle::BodyHandle;
use super::world::World;
use crate::consts::MAX_SEPARATION_STEPS;
use crate::rotate_degrees;

/// Velocity handed from a body of `from_mass` to one of `to_mass`
#[inline]
pub fn transfer(velocity: Vec2, from_mass: f32, to_mass: f32, bounciness: f32) -> Vec2 {
    velocity * from_mass / to_mass * bounciness
}

/// Push every hit body, then take the first pushed body's velocity back
///
/// Immobile bodies are skipped on both legs. If nothing was pushed the
/// mover's velocity is left alone.
pub fn push(world: &mut World, mover: &mut Body, hits: &[BodyHandle]) {
    let source = push_onto(world, mover, hits);
    if let Some(other) = source.and_then(|h| world.get(h)) {
        let bounciness = (mover.bounciness + other.bounciness) / 2.0;
        mover.velocity = transfer(other.velocity, other.mass(), mover.mass(), bounciness);
    }
}

/// One-way push used by kinematic movers; returns the first body pushed
pub fn push_onto(world: &mut World, mover: &Body, hits: &[BodyHandle]) -> Option<BodyHandle> {
    let mut first = None;
    for &handle in hits {
        let Some(other) = world.get_mut(handle) else {
            continue;
        };
        if other.is_immobile() {
            continue;
        }
        let bounciness = (other.bounciness + mover.bounciness) / 2.0;
        other.velocity = transfer(mover.velocity, mover.mass(), other.mass(), bounciness);
        first.get_or_insert(handle);
    }
    first
}

/// Reflect the mover's velocity on `axis` off immobile or stalled hit bodies
///
/// Does nothing unless at least one hit body is immobile or slower than the
/// world's minimum speed. Stalled bodies are reflected as well.
pub fn bounce(world: &mut World, mover: &mut Body, hits: &[BodyHandle], axis: Axis) {
    let min_speed_squared = world.min_speed_squared();
    let is_stalled = |b: &Body| b.is_immobile() || b.speed_squared() < min_speed_squared;

    let mut stalled = Vec::new();
    let mut total = mover.bounciness;
    let mut count = 1;
    for &handle in hits {
        let Some(other) = world.get(handle) else {
            continue;
        };
        total += other.bounciness;
        count += 1;
        if is_stalled(other) {
            stalled.push(handle);
        }
    }
    if stalled.is_empty() {
        return;
    }

    let avg = total / count as f32;
    let reflected = -avg * axis.component(mover.velocity);
    axis.set_component(&mut mover.velocity, reflected);
    for handle in stalled {
        if let Some(other) = world.get_mut(handle) {
            other.velocity *= -avg;
        }
    }
}

/// Rotate the mover's velocity off the first circular hit body
pub fn deflect(world: &World, mover: &mut Body, hits: &[BodyHandle]) {
    let circle_centre = hits
        .iter()
        .filter_map(|&h| world.get(h))
        .find_map(|b| b.collider().as_circle().map(|c| c.centre));
    if let Some(centre) = circle_centre {
        let degrees = collision::deflection_degrees(centre, mover.collider().centre());
        mover.velocity = rotate_degrees(mover.velocity, degrees);
    }
}

/// Push the mover out of every body it was about to hit and still overlaps
///
/// Slow movers are left in place.
pub fn correct_overlaps(world: &World, mover: &mut Body, hits: &AxisHits) {
    if mover.speed_squared() <= world.min_speed_squared() {
        return;
    }
    let fidelity = world.fidelity();
    for handle in hits.iter() {
        let Some(other) = world.get(handle) else {
            continue;
        };
        let obstacle = other.collider();
        if !mover.collider().intersects(obstacle) {
            continue;
        }
        let Some(direction) =
            collision::separation_direction(obstacle.centre(), mover.collider().centre(), mover.velocity)
        else {
            continue;
        };
        collision::separate(mover.collider_mut(), obstacle, direction, fidelity, MAX_SEPARATION_STEPS);
    }
    mover.sync_position();
}

/// Inverse-square acceleration pulling a body at `target` toward `source`
///
/// `None` for coincident centres.
pub fn attraction(source: Vec2, target: Vec2, attractiveness: f32) -> Option<Vec2> {
    let offset = source - target;
    let distance_squared = offset.length_squared();
    if distance_squared == 0.0 {
        return None;
    }
    Some(offset.normalize() * (attractiveness / distance_squared))
}

/// Pull every other body toward the attractor's centre
///
/// Kinematic bodies are pulled too; immobile ones never act on it.
pub fn attract(world: &mut World, attractor: &Body, dt: f32) {
    if attractor.attractiveness == 0.0 {
        return;
    }
    let source = attractor.collider().centre();
    let id = attractor.collider().id();
    for other in world.bodies_mut() {
        if other.collider().id() == id {
            continue;
        }
        if let Some(a) = attraction(source, other.collider().centre(), attractor.attractiveness) {
            other.apply_acceleration(a, dt);
        }
    }
}

/// Acceleration from quadratic drag
///
/// The drag force on each axis is `k·v²·dt`, opposing the velocity and
/// exactly zero on a stationary axis; dividing by mass gives the
/// acceleration.
pub fn drag_acceleration(velocity: Vec2, resistance: Vec2, mass: f32, dt: f32) -> Vec2 {
    let axis_force = |v: f32, k: f32| {
        if v == 0.0 {
            return 0.0;
        }
        -v.signum() * k.abs() * v * v * dt
    };
    Vec2::new(
        axis_force(velocity.x, resistance.x),
        axis_force(velocity.y, resistance.y),
    ) / mass
}

/// Velocity change from drag over one step
///
/// The drag acceleration integrated over `dt`, clamped per axis so it never
/// overshoots into the opposite direction.
pub fn drag_delta(velocity: Vec2, resistance: Vec2, mass: f32, dt: f32) -> Vec2 {
    let delta = drag_acceleration(velocity, resistance, mass, dt) * dt;
    let clamp = |d: f32, v: f32| if d.abs() > v.abs() { -v } else { d };
    Vec2::new(clamp(delta.x, velocity.x), clamp(delta.y, velocity.y))
}

/// Semi-implicit Euler: gravity, then constant acceleration, then drag
pub fn integrate(body: &mut Body, gravity: Vec2, resistance: Vec2, dt: f32) {
    body.apply_acceleration(gravity, dt);
    let acceleration = body.acceleration;
    body.apply_acceleration(acceleration, dt);
    body.velocity += drag_delta(body.velocity, resistance, body.mass(), dt);
}
