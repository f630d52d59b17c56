//! Narrow-phase collision tests and collision bookkeeping types
//!
//! The pairwise table covers the three unordered pairings of the closed
//! shape set. Circle-rect is answered by the same routine whichever operand
//! the query starts from.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::handle::BodyHandle;
use super::shape::{Circle, Rect, Shape, ShapeKind};
use crate::{bearing_degrees, direction_between, round_to};

/// Movement axis resolved by the per-frame protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    /// Resolution order within a frame
    pub const ALL: [Axis; 2] = [Axis::X, Axis::Y];

    #[inline]
    pub fn unit(self) -> Vec2 {
        match self {
            Axis::X => Vec2::X,
            Axis::Y => Vec2::Y,
        }
    }

    #[inline]
    pub fn component(self, v: Vec2) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
        }
    }

    #[inline]
    pub fn set_component(self, v: &mut Vec2, value: f32) {
        match self {
            Axis::X => v.x = value,
            Axis::Y => v.y = value,
        }
    }
}

/// Bodies hit by the X and Y proposals of one mover in one frame
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisHits {
    pub x: Vec<BodyHandle>,
    pub y: Vec<BodyHandle>,
}

impl AxisHits {
    pub fn on(&self, axis: Axis) -> &[BodyHandle] {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty() && self.y.is_empty()
    }

    /// X hits followed by Y hits (a body hit on both axes appears twice)
    pub fn iter(&self) -> impl Iterator<Item = BodyHandle> + '_ {
        self.x.iter().chain(self.y.iter()).copied()
    }
}

/// One axis collision recorded during a step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionEvent {
    /// Body whose proposal collided
    pub mover: BodyHandle,
    pub axis: Axis,
    /// Bodies hit on this axis, in registry order
    pub hits: Vec<BodyHandle>,
}

/// Dispatch over the pairwise table
pub fn intersects(a: &ShapeKind, b: &ShapeKind) -> bool {
    match (a, b) {
        (ShapeKind::Circle(a), ShapeKind::Circle(b)) => circle_circle(a, b),
        (ShapeKind::Circle(c), ShapeKind::Rect(r)) | (ShapeKind::Rect(r), ShapeKind::Circle(c)) => {
            circle_rect(c, r)
        }
        (ShapeKind::Rect(a), ShapeKind::Rect(b)) => rect_rect(a, b),
    }
}

/// Overlap iff squared centre distance < (r1 + r2)²
#[inline]
pub fn circle_circle(a: &Circle, b: &Circle) -> bool {
    let total_radius = a.radius + b.radius;
    a.centre.distance_squared(b.centre) < total_radius * total_radius
}

/// Closest point of a rectangle to `point`
#[inline]
pub fn closest_point_on_rect(point: Vec2, rect: &Rect) -> Vec2 {
    point.clamp(rect.min(), rect.max())
}

/// Overlap iff the rect point closest to the centre lies inside the circle
#[inline]
pub fn circle_rect(circle: &Circle, rect: &Rect) -> bool {
    let closest = closest_point_on_rect(circle.centre, rect);
    circle.centre.distance_squared(closest) < circle.radius * circle.radius
}

/// Strict overlap of both axis projections; shared edges do not collide
#[inline]
pub fn rect_rect(a: &Rect, b: &Rect) -> bool {
    let (a_min, a_max) = (a.min(), a.max());
    let (b_min, b_max) = (b.min(), b.max());
    a_min.x < b_max.x && b_min.x < a_max.x && a_min.y < b_max.y && b_min.y < a_max.y
}

/// Rotation (degrees, 3 decimals) applied to a mover after striking a circle
///
/// The angle is the bearing of the line from the circle's centre to the
/// mover's centre.
pub fn deflection_degrees(circle_centre: Vec2, mover_centre: Vec2) -> f32 {
    round_to(bearing_degrees(direction_between(circle_centre, mover_centre)), 3)
}

/// Direction in which to push `mover` out of `obstacle`
///
/// Points from the obstacle's centre to the mover's. Falls back to the
/// reverse of `velocity` for coincident centres.
pub fn separation_direction(obstacle_centre: Vec2, mover_centre: Vec2, velocity: Vec2) -> Option<Vec2> {
    let dir = direction_between(obstacle_centre, mover_centre);
    if dir != Vec2::ZERO {
        return Some(dir);
    }
    let back = (-velocity).normalize_or_zero();
    (back != Vec2::ZERO).then_some(back)
}

/// Nudge `mover` by `direction * fidelity` until it no longer overlaps `obstacle`
///
/// Returns the number of nudges taken. Stops early at `max_steps`.
pub fn separate(mover: &mut Shape, obstacle: &Shape, direction: Vec2, fidelity: f32, max_steps: u32) -> u32 {
    let step = direction * fidelity;
    let mut steps = 0;
    while mover.intersects(obstacle) {
        if steps >= max_steps {
            log::warn!(
                "{} still overlaps {} after {} separation steps",
                mover.id(),
                obstacle.id(),
                steps
            );
            break;
        }
        mover.translate(step);
        steps += 1;
    }
    steps
}
