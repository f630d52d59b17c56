//! World step
//!
//! Each body is updated once per step, strictly in registry order, so later
//! bodies see the already-resolved state of earlier ones. Within a body the
//! X and Y proposals are both made from its starting position and then
//! resolved X first, independently; that independence is what lets a body
//! slide along a wall it is pressed against.

use super::body::Body;
use super::collision::{Axis, AxisHits, CollisionEvent};
use super::handle::BodyHandle;
use super::response;
use super::world::World;

/// Advance the world by `dt` seconds
///
/// Events from the previous step are dropped first. The post-step callback
/// runs after every body has been updated and sees this step's events. A
/// callback that installs a replacement with `set_post_step` keeps the
/// replacement.
pub fn step(world: &mut World, dt: f32) {
    world.begin_frame(dt);

    let mut n = 0;
    while let Some(handle) = world.handle_in_order(n) {
        update_body(world, handle, dt);
        n += 1;
    }

    world.finish_frame();

    if let Some(mut callback) = world.post_step.take() {
        callback(world);
        if world.post_step.is_none() {
            world.post_step = Some(callback);
        }
    }
}

impl World {
    /// Advance by `dt` seconds; see [`step`]
    pub fn step(&mut self, dt: f32) {
        step(self, dt);
    }
}

fn update_body(world: &mut World, handle: BodyHandle, dt: f32) {
    // Detached bodies are invisible to queries, which keeps borrows apart
    let Some(mut body) = world.detach(handle) else {
        return;
    };

    if !body.is_immobile() {
        let hits = propose(world, &body, dt);
        if !hits.is_empty() {
            notify(world, handle, &mut body, &hits);
        }
        for axis in Axis::ALL {
            resolve_axis(world, &mut body, &hits, axis, dt);
        }
    }

    response::attract(world, &body, dt);

    if !body.is_kinematic() {
        response::integrate(&mut body, world.gravity, world.resistance, dt);
    }

    body.sync_position();
    world.attach(handle, body);
}

/// Query both single-axis moves from the body's current position
fn propose(world: &World, body: &Body, dt: f32) -> AxisHits {
    let collider = body.collider();
    let probe = |axis: Axis| {
        let candidate = collider.translated(axis.unit() * axis.component(body.velocity) * dt);
        world.query(&candidate, collider.id())
    };
    AxisHits {
        x: probe(Axis::X),
        y: probe(Axis::Y),
    }
}

fn notify(world: &mut World, handle: BodyHandle, body: &mut Body, hits: &AxisHits) {
    for axis in Axis::ALL {
        let on_axis = hits.on(axis);
        if !on_axis.is_empty() {
            log::trace!("{} hit {} bodies on {:?}", handle, on_axis.len(), axis);
            world.events.push(CollisionEvent {
                mover: handle,
                axis,
                hits: on_axis.to_vec(),
            });
        }
    }

    if let Some(mut hooks) = body.take_hooks() {
        hooks.on_own_collision(body, hits, world);
        body.restore_hooks(Some(hooks));
    }

    for axis in Axis::ALL {
        for &other_handle in hits.on(axis) {
            let Some(other) = world.get_mut(other_handle) else {
                continue;
            };
            if let Some(mut hooks) = other.take_hooks() {
                hooks.on_other_collision(other, body, axis);
                other.restore_hooks(Some(hooks));
            }
        }
    }
}

fn resolve_axis(world: &mut World, body: &mut Body, hits: &AxisHits, axis: Axis, dt: f32) {
    let on_axis = hits.on(axis);
    if on_axis.is_empty() {
        body.translate(axis.unit() * axis.component(body.velocity) * dt);
        return;
    }

    if body.is_kinematic() {
        body.sync_position();
        response::push_onto(world, body, on_axis);
    } else {
        response::push(world, body, on_axis);
        response::bounce(world, body, on_axis, axis);
        if axis == Axis::Y {
            response::deflect(world, body, on_axis);
        }
    }

    response::correct_overlaps(world, body, hits);
}
