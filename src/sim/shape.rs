//! Collider geometry
//!
//! A collider is a circle or an axis-aligned rectangle plus an identity
//! token. Clones keep the token, so a speculative copy moved ahead of its
//! body still compares identity-equal to the live collider it came from.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision;
use crate::error::{PhysicsError, Result};

static NEXT_COLLIDER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity token shared by a collider and all of its clones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColliderId(u64);

impl ColliderId {
    fn next() -> Self {
        Self(NEXT_COLLIDER_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ColliderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Collider({})", self.0)
    }
}

/// Circle geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub centre: Vec2,
    pub radius: f32,
}

impl Circle {
    #[inline]
    pub fn area(&self) -> f32 {
        std::f32::consts::PI * self.radius * self.radius
    }

    #[inline]
    pub fn contains_point(&self, point: Vec2) -> bool {
        self.centre.distance(point) < self.radius
    }
}

/// Axis-aligned rectangle, `origin` is the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub fn min(&self) -> Vec2 {
        self.origin
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.origin + self.size
    }

    #[inline]
    pub fn centre(&self) -> Vec2 {
        self.origin + self.size * 0.5
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.size.x * self.size.y
    }

    /// Half-open containment: the right and bottom edges are outside
    #[inline]
    pub fn contains_point(&self, point: Vec2) -> bool {
        let (min, max) = (self.min(), self.max());
        point.x >= min.x && point.x < max.x && point.y >= min.y && point.y < max.y
    }
}

/// The closed set of collider geometries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ShapeKind {
    Circle(Circle),
    Rect(Rect),
}

/// A collider: geometry plus identity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shape {
    id: ColliderId,
    kind: ShapeKind,
}

impl Shape {
    /// Circle collider centred at `centre`
    pub fn circle(centre: Vec2, radius: f32) -> Result<Self> {
        Self::new(ShapeKind::Circle(Circle { centre, radius }))
    }

    /// Rectangle collider with top-left corner at `origin`
    pub fn rect(origin: Vec2, size: Vec2) -> Result<Self> {
        Self::new(ShapeKind::Rect(Rect { origin, size }))
    }

    /// Validate geometry and issue a fresh identity
    pub fn new(kind: ShapeKind) -> Result<Self> {
        match kind {
            ShapeKind::Circle(c) => {
                if !c.centre.is_finite() {
                    return Err(PhysicsError::InvalidShape(format!(
                        "circle centre {} is not finite",
                        c.centre
                    )));
                }
                if !(c.radius.is_finite() && c.radius > 0.0) {
                    return Err(PhysicsError::InvalidShape(format!(
                        "circle radius must be positive, got {}",
                        c.radius
                    )));
                }
            }
            ShapeKind::Rect(r) => {
                if !r.origin.is_finite() {
                    return Err(PhysicsError::InvalidShape(format!(
                        "rect origin {} is not finite",
                        r.origin
                    )));
                }
                if !(r.size.is_finite() && r.size.x > 0.0 && r.size.y > 0.0) {
                    return Err(PhysicsError::InvalidShape(format!(
                        "rect size must be positive, got {}",
                        r.size
                    )));
                }
            }
        }
        Ok(Self {
            id: ColliderId::next(),
            kind,
        })
    }

    #[inline]
    pub fn id(&self) -> ColliderId {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> &ShapeKind {
        &self.kind
    }

    pub fn as_circle(&self) -> Option<&Circle> {
        match &self.kind {
            ShapeKind::Circle(c) => Some(c),
            ShapeKind::Rect(_) => None,
        }
    }

    pub fn as_rect(&self) -> Option<&Rect> {
        match &self.kind {
            ShapeKind::Rect(r) => Some(r),
            ShapeKind::Circle(_) => None,
        }
    }

    #[inline]
    pub fn is_circle(&self) -> bool {
        matches!(self.kind, ShapeKind::Circle(_))
    }

    /// Anchor position: centre for circles, top-left corner for rects
    pub fn position(&self) -> Vec2 {
        match &self.kind {
            ShapeKind::Circle(c) => c.centre,
            ShapeKind::Rect(r) => r.origin,
        }
    }

    /// Geometric centre
    pub fn centre(&self) -> Vec2 {
        match &self.kind {
            ShapeKind::Circle(c) => c.centre,
            ShapeKind::Rect(r) => r.centre(),
        }
    }

    pub fn area(&self) -> f32 {
        match &self.kind {
            ShapeKind::Circle(c) => c.area(),
            ShapeKind::Rect(r) => r.area(),
        }
    }

    /// Axis-aligned bounds as (min, max)
    pub fn bounds(&self) -> (Vec2, Vec2) {
        match &self.kind {
            ShapeKind::Circle(c) => (c.centre - Vec2::splat(c.radius), c.centre + Vec2::splat(c.radius)),
            ShapeKind::Rect(r) => (r.min(), r.max()),
        }
    }

    /// Moved copy with the same identity; the receiver is untouched
    #[must_use]
    pub fn translated(&self, delta: Vec2) -> Shape {
        let mut copy = self.clone();
        copy.translate(delta);
        copy
    }

    /// Move in place
    pub fn translate(&mut self, delta: Vec2) {
        match &mut self.kind {
            ShapeKind::Circle(c) => c.centre += delta,
            ShapeKind::Rect(r) => r.origin += delta,
        }
    }

    /// Move the anchor (see [`Shape::position`]) to `position`
    pub fn set_position(&mut self, position: Vec2) {
        let delta = position - self.position();
        self.translate(delta);
    }

    #[inline]
    pub fn intersects(&self, other: &Shape) -> bool {
        collision::intersects(&self.kind, &other.kind)
    }

    #[inline]
    pub fn contains_point(&self, point: Vec2) -> bool {
        match &self.kind {
            ShapeKind::Circle(c) => c.contains_point(point),
            ShapeKind::Rect(r) => r.contains_point(point),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_keeps_identity() {
        let a = Shape::circle(Vec2::new(10.0, 10.0), 5.0).unwrap();
        let b = Shape::circle(Vec2::new(10.0, 10.0), 5.0).unwrap();
        let moved = a.translated(Vec2::new(3.0, 0.0));

        assert_eq!(a.id(), moved.id());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_translated_is_pure() {
        let rect = Shape::rect(Vec2::new(0.0, 0.0), Vec2::new(10.0, 20.0)).unwrap();
        let moved = rect.translated(Vec2::new(5.0, -5.0));

        assert_eq!(rect.position(), Vec2::ZERO);
        assert_eq!(moved.position(), Vec2::new(5.0, -5.0));
        assert_eq!(moved.centre(), Vec2::new(10.0, 5.0));
    }

    #[test]
    fn test_translate_in_place() {
        let mut circle = Shape::circle(Vec2::new(1.0, 2.0), 3.0).unwrap();
        circle.translate(Vec2::new(1.0, 1.0));
        assert_eq!(circle.position(), Vec2::new(2.0, 3.0));

        circle.set_position(Vec2::new(-4.0, 0.0));
        assert_eq!(circle.centre(), Vec2::new(-4.0, 0.0));
    }

    #[test]
    fn test_area() {
        let circle = Shape::circle(Vec2::ZERO, 2.0).unwrap();
        assert!((circle.area() - 4.0 * std::f32::consts::PI).abs() < 1e-5);

        let rect = Shape::rect(Vec2::ZERO, Vec2::new(3.0, 4.0)).unwrap();
        assert_eq!(rect.area(), 12.0);
    }

    #[test]
    fn test_contains_point() {
        let circle = Shape::circle(Vec2::new(0.0, 0.0), 10.0).unwrap();
        assert!(circle.contains_point(Vec2::new(5.0, 5.0)));
        assert!(!circle.contains_point(Vec2::new(10.0, 0.0)));

        let rect = Shape::rect(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0)).unwrap();
        assert!(rect.contains_point(Vec2::new(0.0, 0.0)));
        assert!(rect.contains_point(Vec2::new(9.9, 9.9)));
        assert!(!rect.contains_point(Vec2::new(10.0, 5.0)));
    }

    #[test]
    fn test_rejects_bad_geometry() {
        assert!(matches!(
            Shape::circle(Vec2::ZERO, 0.0),
            Err(PhysicsError::InvalidShape(_))
        ));
        assert!(matches!(
            Shape::circle(Vec2::new(f32::NAN, 0.0), 1.0),
            Err(PhysicsError::InvalidShape(_))
        ));
        assert!(matches!(
            Shape::rect(Vec2::ZERO, Vec2::new(10.0, -1.0)),
            Err(PhysicsError::InvalidShape(_))
        ));
    }

    #[test]
    fn test_bounds() {
        let circle = Shape::circle(Vec2::new(5.0, 5.0), 2.0).unwrap();
        assert_eq!(circle.bounds(), (Vec2::new(3.0, 3.0), Vec2::new(7.0, 7.0)));
    }
}
