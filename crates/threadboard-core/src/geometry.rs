//! Geometry kernel: rotation about a center and rotation-aware resizing.
//!
//! Canvas space is y-down and rotations are clockwise in degrees, which is
//! kurbo's positive rotation direction in a y-down frame.

use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// A rotated rectangle: an axis-aligned box rotated about its own center.
///
/// `x`/`y` is the top-left corner of the box *before* rotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Clockwise rotation in degrees.
    #[serde(default)]
    pub rotation: f64,
}

impl Frame {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            rotation: 0.0,
        }
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    /// Build a normalized frame from two opposite corners.
    pub fn from_corners(p1: Point, p2: Point) -> Self {
        Self::new(
            p1.x.min(p2.x),
            p1.y.min(p2.y),
            (p2.x - p1.x).abs(),
            (p2.y - p1.y).abs(),
        )
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Position of a resize handle in canvas space, rotation applied.
    pub fn handle_point(&self, handle: ResizeHandle) -> Point {
        let (sx, sy) = handle.local_sign();
        let offset = Vec2::new(sx * self.width / 2.0, sy * self.height / 2.0);
        rotate_point(self.center() + offset, self.center(), self.rotation)
    }

    /// The four rotated corners in order nw, ne, se, sw.
    pub fn corners(&self) -> [Point; 4] {
        [
            self.handle_point(ResizeHandle::NorthWest),
            self.handle_point(ResizeHandle::NorthEast),
            self.handle_point(ResizeHandle::SouthEast),
            self.handle_point(ResizeHandle::SouthWest),
        ]
    }

    /// Position of the rotation handle, `offset` units above the top edge.
    pub fn rotation_handle(&self, offset: f64) -> Point {
        let center = self.center();
        let above = Point::new(center.x, center.y - self.height.abs() / 2.0 - offset);
        rotate_point(above, center, self.rotation)
    }

    /// Axis-aligned bounds of the rotated frame.
    pub fn aabb(&self) -> Rect {
        let [a, b, c, d] = self.corners();
        Rect::from_points(a, b).union_pt(c).union_pt(d)
    }

    /// Rotation-aware containment: the query point is brought into the
    /// frame's unrotated space and tested against the box.
    pub fn contains(&self, point: Point) -> bool {
        let local = unrotate_point(point, self.center(), self.rotation);
        let rect = Rect::new(self.x, self.y, self.x + self.width, self.y + self.height).abs();
        local.x >= rect.x0 && local.x <= rect.x1 && local.y >= rect.y0 && local.y <= rect.y1
    }

    /// Grow the frame about its center so each side is at least `min_extent`.
    pub fn inflated_to(&self, min_extent: f64) -> Frame {
        let width = self.width.abs().max(min_extent);
        let height = self.height.abs().max(min_extent);
        let center = self.center();
        Frame {
            x: center.x - width / 2.0,
            y: center.y - height / 2.0,
            width,
            height,
            rotation: self.rotation,
        }
    }

    pub fn translated(&self, delta: Vec2) -> Frame {
        Frame {
            x: self.x + delta.x,
            y: self.y + delta.y,
            ..*self
        }
    }
}

/// Anything positioned by a [`Frame`] can be resized by the kernel.
pub trait BoundingBox: Sized {
    fn frame(&self) -> Frame;

    /// Return a copy carrying `frame` in place of the current one.
    fn with_frame(&self, frame: Frame) -> Self;
}

impl BoundingBox for Frame {
    fn frame(&self) -> Frame {
        *self
    }

    fn with_frame(&self, frame: Frame) -> Self {
        frame
    }
}

/// One of the eight resize handles of a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResizeHandle {
    #[serde(rename = "n")]
    North,
    #[serde(rename = "s")]
    South,
    #[serde(rename = "e")]
    East,
    #[serde(rename = "w")]
    West,
    #[serde(rename = "ne")]
    NorthEast,
    #[serde(rename = "nw")]
    NorthWest,
    #[serde(rename = "se")]
    SouthEast,
    #[serde(rename = "sw")]
    SouthWest,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::NorthWest,
        ResizeHandle::North,
        ResizeHandle::NorthEast,
        ResizeHandle::East,
        ResizeHandle::SouthEast,
        ResizeHandle::South,
        ResizeHandle::SouthWest,
        ResizeHandle::West,
    ];

    /// The handle diagonally (or directly) across the box.
    pub fn opposite(self) -> ResizeHandle {
        match self {
            ResizeHandle::North => ResizeHandle::South,
            ResizeHandle::South => ResizeHandle::North,
            ResizeHandle::East => ResizeHandle::West,
            ResizeHandle::West => ResizeHandle::East,
            ResizeHandle::NorthEast => ResizeHandle::SouthWest,
            ResizeHandle::NorthWest => ResizeHandle::SouthEast,
            ResizeHandle::SouthEast => ResizeHandle::NorthWest,
            ResizeHandle::SouthWest => ResizeHandle::NorthEast,
        }
    }

    fn moves_top(self) -> bool {
        matches!(
            self,
            ResizeHandle::North | ResizeHandle::NorthEast | ResizeHandle::NorthWest
        )
    }

    fn moves_bottom(self) -> bool {
        matches!(
            self,
            ResizeHandle::South | ResizeHandle::SouthEast | ResizeHandle::SouthWest
        )
    }

    fn moves_left(self) -> bool {
        matches!(
            self,
            ResizeHandle::West | ResizeHandle::NorthWest | ResizeHandle::SouthWest
        )
    }

    fn moves_right(self) -> bool {
        matches!(
            self,
            ResizeHandle::East | ResizeHandle::NorthEast | ResizeHandle::SouthEast
        )
    }

    /// Unit offsets of the handle from the box center, before rotation.
    fn local_sign(self) -> (f64, f64) {
        let sx = if self.moves_left() {
            -1.0
        } else if self.moves_right() {
            1.0
        } else {
            0.0
        };
        let sy = if self.moves_top() {
            -1.0
        } else if self.moves_bottom() {
            1.0
        } else {
            0.0
        };
        (sx, sy)
    }
}

/// Rotate `point` clockwise by `angle` degrees about `center`.
pub fn rotate_point(point: Point, center: Point, angle: f64) -> Point {
    Affine::rotate_about(angle.to_radians(), center) * point
}

/// Inverse of [`rotate_point`].
pub fn unrotate_point(point: Point, center: Point, angle: f64) -> Point {
    rotate_point(point, center, -angle)
}

/// Rotate a free vector clockwise by `angle` degrees.
pub fn rotate_vector(v: Vec2, angle: f64) -> Vec2 {
    let (sin, cos) = angle.to_radians().sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Angle in degrees that points a shape's "up" toward `pointer`.
///
/// Zero means the pointer is straight above `center`.
pub fn rotation_toward(center: Point, pointer: Point) -> f64 {
    (pointer.y - center.y).atan2(pointer.x - center.x).to_degrees() + 90.0
}

/// Resize `shape` by dragging `handle` to `pointer`.
///
/// The point across the box from the dragged handle stays fixed in canvas
/// space regardless of rotation, and the rotation itself is preserved.
/// Dragging past the opposite edge flips the box instead of producing a
/// negative extent.
pub fn resize<B: BoundingBox>(shape: &B, handle: ResizeHandle, pointer: Point) -> B {
    shape.with_frame(resize_frame(shape.frame(), handle, pointer))
}

fn resize_frame(frame: Frame, handle: ResizeHandle, pointer: Point) -> Frame {
    let center = frame.center();
    let local = unrotate_point(pointer, center, frame.rotation) - center;

    let mut left = -frame.width / 2.0;
    let mut right = frame.width / 2.0;
    let mut top = -frame.height / 2.0;
    let mut bottom = frame.height / 2.0;

    if handle.moves_left() {
        left = local.x;
    }
    if handle.moves_right() {
        right = local.x;
    }
    if handle.moves_top() {
        top = local.y;
    }
    if handle.moves_bottom() {
        bottom = local.y;
    }

    let (left, right) = (left.min(right), left.max(right));
    let (top, bottom) = (top.min(bottom), top.max(bottom));

    let width = right - left;
    let height = bottom - top;
    let shift = Vec2::new((left + right) / 2.0, (top + bottom) / 2.0);
    let new_center = center + rotate_vector(shift, frame.rotation);

    Frame {
        x: new_center.x - width / 2.0,
        y: new_center.y - height / 2.0,
        width,
        height,
        rotation: frame.rotation,
    }
}
