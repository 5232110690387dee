//! Straight line and arrow annotations.

use super::{point_to_segment_dist, ShapeGeometry, ShapeKind};
use crate::geometry::rotate_point;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Arrow,
    Line,
}

impl LineKind {
    pub fn shape_kind(&self) -> ShapeKind {
        match self {
            LineKind::Arrow => ShapeKind::Arrow,
            LineKind::Line => ShapeKind::Line,
        }
    }
}

/// Which end of a line is being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineEnd {
    Start,
    End,
}

/// A segment stored as its start point and the signed delta to its end.
///
/// The delta is never normalized: an arrow drawn right-to-left keeps a
/// negative x delta so its head stays where it was drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineShape {
    pub kind: LineKind,
    pub start: Point,
    pub delta: Vec2,
}

impl LineShape {
    pub fn new(kind: LineKind, start: Point, end: Point) -> Self {
        Self {
            kind,
            start,
            delta: end - start,
        }
    }

    pub fn end(&self) -> Point {
        self.start + self.delta
    }

    pub fn midpoint(&self) -> Point {
        self.start + self.delta * 0.5
    }

    /// Move the start to `point`, keeping the end where it is.
    pub fn with_start(&self, point: Point) -> Self {
        Self::new(self.kind, point, self.end())
    }

    /// Move the end to `point`, keeping the start where it is.
    pub fn with_end(&self, point: Point) -> Self {
        Self::new(self.kind, self.start, point)
    }

    pub fn with_endpoint(&self, end: LineEnd, point: Point) -> Self {
        match end {
            LineEnd::Start => self.with_start(point),
            LineEnd::End => self.with_end(point),
        }
    }

    /// Turn the segment `angle` degrees clockwise about its midpoint.
    pub fn rotated(&self, angle: f64) -> Self {
        let mid = self.midpoint();
        Self::new(
            self.kind,
            rotate_point(self.start, mid, angle),
            rotate_point(self.end(), mid, angle),
        )
    }

    /// Rotation handle: `offset` above the top of the segment's bounds,
    /// level with its midpoint.
    pub fn rotation_handle(&self, offset: f64) -> Point {
        Point::new(self.midpoint().x, self.bounds().y0 - offset)
    }
}

impl ShapeGeometry for LineShape {
    fn bounds(&self) -> Rect {
        Rect::from_points(self.start, self.end())
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        point_to_segment_dist(point, self.start, self.end()) <= tolerance
    }

    fn translated(&self, delta: Vec2) -> Self {
        Self {
            kind: self.kind,
            start: self.start + delta,
            delta: self.delta,
        }
    }
}
