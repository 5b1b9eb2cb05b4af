//! Geometry primitives: vectors, axis-aligned boxes, and layer transforms.
//!
//! All coordinates are document (world) units. Rotation math goes through
//! `kurbo::Affine` so the forward and inverse transforms stay consistent.

use kurbo::{Affine, Point};
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

// ─── Vec2 ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Vec2) -> f64 {
        (self - other).length()
    }

    /// Rotate this point by `degrees` around `pivot`.
    pub fn rotate_about(self, pivot: Vec2, degrees: f64) -> Vec2 {
        if degrees == 0.0 {
            return self;
        }
        let affine = Affine::rotate_about(degrees.to_radians(), Point::from(pivot));
        (affine * Point::from(self)).into()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl From<Vec2> for Point {
    fn from(v: Vec2) -> Point {
        Point::new(v.x, v.y)
    }
}

impl From<Point> for Vec2 {
    fn from(p: Point) -> Vec2 {
        Vec2::new(p.x, p.y)
    }
}

// ─── Aabb ────────────────────────────────────────────────────────────────

/// Axis-aligned bounding box. Containment and intersection are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aabb {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Aabb {
    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn from_pos_size(position: Vec2, size: Vec2) -> Self {
        Self::new(
            position.x,
            position.y,
            position.x + size.x,
            position.y + size.y,
        )
    }

    /// Normalized box spanning two arbitrary corners (e.g. a marquee drag).
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self::new(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y))
    }

    /// Smallest box containing every point, or `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = Vec2>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut b = Self::new(first.x, first.y, first.x, first.y);
        for p in iter {
            b.min_x = b.min_x.min(p.x);
            b.min_y = b.min_y.min(p.y);
            b.max_x = b.max_x.max(p.x);
            b.max_y = b.max_y.max(p.y);
        }
        Some(b)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn area(&self) -> f64 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// True when `other` lies entirely inside this box.
    pub fn contains_box(&self, other: &Aabb) -> bool {
        other.min_x >= self.min_x
            && other.max_x <= self.max_x
            && other.min_y >= self.min_y
            && other.max_y <= self.max_y
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    /// Shrink on every side by `amount`.
    pub fn inset(&self, amount: f64) -> Aabb {
        Aabb::new(
            self.min_x + amount,
            self.min_y + amount,
            self.max_x - amount,
            self.max_y - amount,
        )
    }
}

// ─── Transform ───────────────────────────────────────────────────────────

/// Placement of a layer: top-left position, size, and rotation (degrees)
/// about a pivot expressed as a fraction of the size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    pub position: Vec2,
    pub size: Vec2,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub skew_x: f64,
    #[serde(default)]
    pub skew_y: f64,
    #[serde(default = "Transform::default_pivot")]
    pub pivot: Vec2,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 100.0, 100.0)
    }
}

impl Transform {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            position: Vec2::new(x, y),
            size: Vec2::new(width, height),
            rotation: 0.0,
            skew_x: 0.0,
            skew_y: 0.0,
            pivot: Self::default_pivot(),
        }
    }

    fn default_pivot() -> Vec2 {
        Vec2::new(0.5, 0.5)
    }

    /// Unrotated box.
    pub fn aabb(&self) -> Aabb {
        Aabb::from_pos_size(self.position, self.size)
    }

    /// World-space pivot point.
    pub fn pivot_point(&self) -> Vec2 {
        Vec2::new(
            self.position.x + self.size.x * self.pivot.x,
            self.position.y + self.size.y * self.pivot.y,
        )
    }

    pub fn is_rotated(&self) -> bool {
        self.rotation % 360.0 != 0.0
    }

    /// Local (unrotated) space → world space.
    pub fn to_affine(&self) -> Affine {
        Affine::rotate_about(self.rotation.to_radians(), Point::from(self.pivot_point()))
    }

    /// The four corners in world space, clockwise from top-left.
    pub fn corners(&self) -> [Vec2; 4] {
        let b = self.aabb();
        let affine = self.to_affine();
        [
            Vec2::new(b.min_x, b.min_y),
            Vec2::new(b.max_x, b.min_y),
            Vec2::new(b.max_x, b.max_y),
            Vec2::new(b.min_x, b.max_y),
        ]
        .map(|c| (affine * Point::from(c)).into())
    }

    /// Bounding box of the rotated layer.
    pub fn world_aabb(&self) -> Aabb {
        if !self.is_rotated() {
            return self.aabb();
        }
        Aabb::from_points(self.corners()).unwrap_or_else(|| self.aabb())
    }

    /// Rotation-aware containment: the point is mapped back into local
    /// space by the inverse rotation about the pivot, then box-tested.
    pub fn contains_point(&self, p: Vec2) -> bool {
        if !self.is_rotated() {
            return self.aabb().contains(p);
        }
        let local: Vec2 = (self.to_affine().inverse() * Point::from(p)).into();
        self.aabb().contains(local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aabb_inclusive_edges() {
        let b = Aabb::new(0.0, 0.0, 10.0, 10.0);
        assert!(b.contains(Vec2::new(10.0, 10.0)));
        assert!(b.intersects(&Aabb::new(10.0, 10.0, 20.0, 20.0)));
        assert!(!b.intersects(&Aabb::new(10.1, 0.0, 20.0, 20.0)));
    }

    #[test]
    fn rotated_corner_excluded() {
        let mut t = Transform::new(0.0, 0.0, 100.0, 20.0);
        t.rotation = 90.0;
        // After a quarter turn about the center the box is 20 wide, 100 tall.
        assert!(!t.contains_point(Vec2::new(2.0, 2.0)));
        assert!(t.contains_point(Vec2::new(50.0, -30.0)));
        let wb = t.world_aabb();
        assert!((wb.width() - 20.0).abs() < 1e-9);
        assert!((wb.height() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn rotate_about_pivot() {
        let p = Vec2::new(10.0, 0.0).rotate_about(Vec2::ZERO, 90.0);
        assert!(p.x.abs() < 1e-9);
        assert!((p.y - 10.0).abs() < 1e-9);
    }
}
