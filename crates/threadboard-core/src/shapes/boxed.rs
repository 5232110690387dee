//! Box-shaped annotations: rectangle, ellipse, star, text block and image.

use super::{ShapeGeometry, ShapeKind};
use crate::geometry::{BoundingBox, Frame};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Default font size for new text blocks.
pub const DEFAULT_FONT_SIZE: f64 = 18.0;

/// Text carried by a text block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub content: String,
    pub font_size: f64,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
}

impl Default for TextBlock {
    fn default() -> Self {
        Self {
            content: String::new(),
            font_size: DEFAULT_FONT_SIZE,
            bold: false,
            italic: false,
        }
    }
}

/// An uploaded image placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Opaque reference returned by the asset uploader.
    pub reference: String,
    /// Optional callout point the image points at, in canvas coordinates.
    #[serde(default)]
    pub pointer: Option<Point>,
}

/// What a box-shaped annotation draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoxKind {
    Rectangle,
    Ellipse,
    Star,
    Text(TextBlock),
    Image(ImageRef),
}

impl BoxKind {
    pub fn shape_kind(&self) -> ShapeKind {
        match self {
            BoxKind::Rectangle => ShapeKind::Rectangle,
            BoxKind::Ellipse => ShapeKind::Ellipse,
            BoxKind::Star => ShapeKind::Star,
            BoxKind::Text(_) => ShapeKind::Text,
            BoxKind::Image(_) => ShapeKind::Image,
        }
    }
}

/// A rotatable box annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxShape {
    pub kind: BoxKind,
    pub frame: Frame,
}

impl BoxShape {
    pub fn new(kind: BoxKind, frame: Frame) -> Self {
        Self { kind, frame }
    }

    /// Box spanned by a drag from `start` to `end`, normalized so the
    /// extent is non-negative.
    pub fn from_drag(kind: BoxKind, start: Point, end: Point) -> Self {
        Self::new(kind, Frame::from_corners(start, end))
    }

    pub fn image(&self) -> Option<&ImageRef> {
        match &self.kind {
            BoxKind::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&TextBlock> {
        match &self.kind {
            BoxKind::Text(block) => Some(block),
            _ => None,
        }
    }
}

impl BoundingBox for BoxShape {
    fn frame(&self) -> Frame {
        self.frame
    }

    fn with_frame(&self, frame: Frame) -> Self {
        Self {
            kind: self.kind.clone(),
            frame,
        }
    }
}

impl ShapeGeometry for BoxShape {
    fn bounds(&self) -> Rect {
        self.frame.aabb()
    }

    /// `tolerance` is the minimum hit extent: small boxes are picked as if
    /// they were at least that wide and tall.
    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.frame.inflated_to(tolerance).contains(point)
    }

    /// An image's callout pointer is a fixed canvas point and stays put.
    fn translated(&self, delta: Vec2) -> Self {
        self.with_frame(self.frame.translated(delta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_drag_normalizes() {
        let shape = BoxShape::from_drag(
            BoxKind::Ellipse,
            Point::new(100.0, 80.0),
            Point::new(40.0, 120.0),
        );
        assert_eq!(shape.frame, Frame::new(40.0, 80.0, 60.0, 40.0));
    }

    #[test]
    fn test_rotated_hit_test() {
        let shape = BoxShape::new(
            BoxKind::Rectangle,
            Frame::new(0.0, 0.0, 200.0, 60.0).with_rotation(90.0),
        );
        // Standing upright about (100, 30): spans y from -70 to 130.
        assert!(shape.hit_test(Point::new(100.0, 120.0), 0.0));
        assert!(!shape.hit_test(Point::new(190.0, 30.0), 0.0));
    }

    #[test]
    fn test_translate_keeps_image_pointer() {
        let shape = BoxShape::new(
            BoxKind::Image(ImageRef {
                reference: "img-1".into(),
                pointer: Some(Point::new(500.0, 500.0)),
            }),
            Frame::new(0.0, 0.0, 300.0, 150.0),
        );
        let moved = shape.translated(Vec2::new(10.0, 20.0));
        assert_eq!(moved.frame.position(), Point::new(10.0, 20.0));
        assert_eq!(moved.image().unwrap().pointer, Some(Point::new(500.0, 500.0)));
    }

    #[test]
    fn test_bounds_of_rotated_square() {
        let shape = BoxShape::new(
            BoxKind::Star,
            Frame::new(0.0, 0.0, 100.0, 100.0).with_rotation(45.0),
        );
        let half_diag = 50.0 * 2f64.sqrt();
        let bounds = shape.bounds();
        assert!((bounds.x0 - (50.0 - half_diag)).abs() < 1e-9);
        assert!((bounds.width() - 2.0 * half_diag).abs() < 1e-9);
    }
}
