//! Annotation shapes for the whiteboard.

mod boxed;
mod freehand;
mod line;

pub use boxed::{BoxKind, BoxShape, ImageRef, TextBlock};
pub use freehand::PathShape;
pub use line::{LineEnd, LineKind, LineShape};

use crate::geometry::Frame;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned identifier of a persisted annotation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(String);

impl AnnotationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AnnotationId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Identifier of the user who authored an annotation.
pub type UserId = String;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Default annotation red.
    pub fn red() -> Self {
        Self::new(0xef, 0x44, 0x44, 255)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`. The leading `#` is optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => {
                let mut out = [0u8; 3];
                for (i, c) in hex.char_indices() {
                    let v = c.to_digit(16)? as u8;
                    out[i] = v * 16 + v;
                }
                Some(Self::new(out[0], out[1], out[2], 255))
            }
            6 => Some(Self::new(
                channel(hex.get(0..2)?)?,
                channel(hex.get(2..4)?)?,
                channel(hex.get(4..6)?)?,
                255,
            )),
            8 => Some(Self::new(
                channel(hex.get(0..2)?)?,
                channel(hex.get(2..4)?)?,
                channel(hex.get(4..6)?)?,
                channel(hex.get(6..8)?)?,
            )),
            _ => None,
        }
    }

    /// `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Default for SerializableColor {
    fn default() -> Self {
        Self::red()
    }
}

/// Dash pattern of a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrokeStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

/// Style properties shared by every annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    pub stroke_color: SerializableColor,
    pub stroke_width: f64,
    #[serde(default)]
    pub dash: StrokeStyle,
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            stroke_color: SerializableColor::red(),
            stroke_width: 3.0,
            dash: StrokeStyle::Solid,
        }
    }
}

/// Review state of an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStatus {
    #[default]
    Open,
    Resolved,
}

/// Flat tag naming what an annotation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Rectangle,
    Ellipse,
    Star,
    Arrow,
    Line,
    Freehand,
    Text,
    Image,
}

impl ShapeKind {
    /// Human-readable name.
    pub fn label(&self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "Rectangle",
            ShapeKind::Ellipse => "Ellipse",
            ShapeKind::Star => "Star",
            ShapeKind::Arrow => "Arrow",
            ShapeKind::Line => "Line",
            ShapeKind::Freehand => "Freehand",
            ShapeKind::Text => "Text",
            ShapeKind::Image => "Image",
        }
    }
}

/// Geometry queries every shape variant answers.
pub trait ShapeGeometry {
    /// Axis-aligned bounds in canvas coordinates.
    fn bounds(&self) -> Rect;

    /// Check if a canvas point hits this shape.
    fn hit_test(&self, point: Point, tolerance: f64) -> bool;

    /// Copy of the shape moved by `delta`.
    fn translated(&self, delta: Vec2) -> Self;
}

/// The geometry of an annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// Rectangle, ellipse, star, text or image: a rotatable box.
    Box(BoxShape),
    /// Arrow or straight line: a start point and a signed delta.
    Line(LineShape),
    /// Freehand stroke.
    Path(PathShape),
}

impl Shape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Box(shape) => shape.kind.shape_kind(),
            Shape::Line(shape) => shape.kind.shape_kind(),
            Shape::Path(_) => ShapeKind::Freehand,
        }
    }

    /// Top-left of a box, the start of a line, the canvas origin for a path.
    pub fn position(&self) -> Point {
        match self {
            Shape::Box(shape) => shape.frame.position(),
            Shape::Line(shape) => shape.start,
            Shape::Path(_) => Point::ZERO,
        }
    }

    /// Clockwise rotation in degrees. Only boxes rotate.
    pub fn rotation(&self) -> f64 {
        match self {
            Shape::Box(shape) => shape.frame.rotation,
            _ => 0.0,
        }
    }

    pub fn frame(&self) -> Option<Frame> {
        match self {
            Shape::Box(shape) => Some(shape.frame),
            _ => None,
        }
    }

    pub fn as_box(&self) -> Option<&BoxShape> {
        match self {
            Shape::Box(shape) => Some(shape),
            _ => None,
        }
    }

    pub fn as_line(&self) -> Option<&LineShape> {
        match self {
            Shape::Line(shape) => Some(shape),
            _ => None,
        }
    }

    pub fn bounds(&self) -> Rect {
        match self {
            Shape::Box(shape) => shape.bounds(),
            Shape::Line(shape) => shape.bounds(),
            Shape::Path(shape) => shape.bounds(),
        }
    }

    pub fn translated(&self, delta: Vec2) -> Shape {
        match self {
            Shape::Box(shape) => Shape::Box(shape.translated(delta)),
            Shape::Line(shape) => Shape::Line(shape.translated(delta)),
            Shape::Path(shape) => Shape::Path(shape.translated(delta)),
        }
    }

    /// Hit test with the tolerances used for picking annotations.
    pub fn hit_test(&self, point: Point, stroke_width: f64, hit: &HitTolerance) -> bool {
        match self {
            Shape::Box(shape) => shape.hit_test(point, hit.min_box_extent),
            Shape::Line(shape) => shape.hit_test(point, hit.stroke_tolerance + stroke_width / 2.0),
            Shape::Path(shape) => shape.hit_test(point, hit.stroke_tolerance + stroke_width / 2.0),
        }
    }

    /// Merge the geometric fields of `patch` into this shape.
    pub fn apply_patch(&mut self, patch: &AnnotationPatch) {
        match self {
            Shape::Box(shape) => {
                if let Some(position) = patch.position {
                    shape.frame.x = position.x;
                    shape.frame.y = position.y;
                }
                if let Some(extent) = patch.extent {
                    shape.frame.width = extent.x;
                    shape.frame.height = extent.y;
                }
                if let Some(rotation) = patch.rotation {
                    shape.frame.rotation = rotation;
                }
                match (&mut shape.kind, &patch.image_pointer, &patch.text) {
                    (BoxKind::Image(image), Some(pointer), _) => image.pointer = *pointer,
                    (BoxKind::Text(block), _, Some(text)) => *block = text.clone(),
                    (_, None, None) => {}
                    (kind, _, _) => log::warn!("Ignoring content patch for {:?}", kind.shape_kind()),
                }
                if patch.points.is_some() {
                    log::warn!("Ignoring points patch for {:?}", shape.kind.shape_kind());
                }
            }
            Shape::Line(shape) => {
                if let Some(position) = patch.position {
                    shape.start = position;
                }
                if let Some(extent) = patch.extent {
                    shape.delta = extent;
                }
                if patch.rotation.is_some() || patch.points.is_some() || patch.has_content() {
                    log::warn!("Ignoring non-line fields in patch for {:?}", shape.kind);
                }
            }
            Shape::Path(shape) => {
                if let Some(points) = &patch.points {
                    shape.points = points.clone();
                }
                if patch.position.is_some()
                    || patch.extent.is_some()
                    || patch.rotation.is_some()
                    || patch.has_content()
                {
                    log::warn!("Ignoring non-path fields in patch for freehand stroke");
                }
            }
        }
    }
}

/// Tolerances for picking annotations under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitTolerance {
    /// Boxes are hit-tested as if at least this wide and tall.
    pub min_box_extent: f64,
    /// Distance added to half the stroke width for strokes.
    pub stroke_tolerance: f64,
}

impl Default for HitTolerance {
    fn default() -> Self {
        Self {
            min_box_extent: 40.0,
            stroke_tolerance: 4.0,
        }
    }
}

/// A persisted annotation: geometry plus the metadata the whiteboard shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    pub shape: Shape,
    pub style: ShapeStyle,
    #[serde(default)]
    pub status: LifecycleStatus,
    pub author: UserId,
}

impl Annotation {
    pub fn kind(&self) -> ShapeKind {
        self.shape.kind()
    }

    pub fn hit_test(&self, point: Point, hit: &HitTolerance) -> bool {
        self.shape.hit_test(point, self.style.stroke_width, hit)
    }

    /// Merge every field `patch` carries; fields it omits stay untouched.
    pub fn apply_patch(&mut self, patch: &AnnotationPatch) {
        self.shape.apply_patch(patch);
        if let Some(color) = patch.stroke_color {
            self.style.stroke_color = color;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }
}

/// An annotation that has not been given an id by the store yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationDraft {
    pub shape: Shape,
    pub style: ShapeStyle,
    #[serde(default)]
    pub status: LifecycleStatus,
    pub author: UserId,
}

impl AnnotationDraft {
    pub fn new(shape: Shape, style: ShapeStyle, author: impl Into<UserId>) -> Self {
        Self {
            shape,
            style,
            status: LifecycleStatus::Open,
            author: author.into(),
        }
    }

    pub fn into_annotation(self, id: AnnotationId) -> Annotation {
        Annotation {
            id,
            shape: self.shape,
            style: self.style,
            status: self.status,
            author: self.author,
        }
    }
}

/// Merge-style partial update of an annotation.
///
/// `extent` is the signed width/height: a box extent after normalization,
/// the delta from start to end for a line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extent: Option<Vec2>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<Point>>,
    /// `Some(None)` removes the pointer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_pointer: Option<Option<Point>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<SerializableColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<LifecycleStatus>,
}

impl AnnotationPatch {
    /// Patch that replaces the frame of a box.
    pub fn frame(frame: &Frame) -> Self {
        Self {
            position: Some(frame.position()),
            extent: Some(Vec2::new(frame.width, frame.height)),
            ..Self::default()
        }
    }

    pub fn position(position: Point) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    pub fn rotation(rotation: f64) -> Self {
        Self {
            rotation: Some(rotation),
            ..Self::default()
        }
    }

    pub fn stroke_color(color: SerializableColor) -> Self {
        Self {
            stroke_color: Some(color),
            ..Self::default()
        }
    }

    pub fn status(status: LifecycleStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn has_content(&self) -> bool {
        self.image_pointer.is_some() || self.text.is_some()
    }
}

/// Distance from a point to a line segment.
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    (point - (a + seg * t)).hypot()
}

/// Minimum distance from a point to a polyline (sequence of connected segments).
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => (point - *only).hypot(),
        _ => points
            .windows(2)
            .map(|w| point_to_segment_dist(point, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_annotation() -> Annotation {
        AnnotationDraft::new(
            Shape::Box(BoxShape::new(BoxKind::Rectangle, Frame::new(0.0, 0.0, 100.0, 50.0))),
            ShapeStyle::default(),
            "ana",
        )
        .into_annotation(AnnotationId::from("a1"))
    }

    #[test]
    fn test_color_hex_parsing() {
        assert_eq!(SerializableColor::from_hex("#ef4444"), Some(SerializableColor::red()));
        assert_eq!(
            SerializableColor::from_hex("0f0"),
            Some(SerializableColor::new(0, 255, 0, 255))
        );
        assert_eq!(
            SerializableColor::from_hex("#00000080"),
            Some(SerializableColor::new(0, 0, 0, 128))
        );
        assert_eq!(SerializableColor::from_hex("#12345"), None);
        assert_eq!(SerializableColor::from_hex("#zzzzzz"), None);
    }

    #[test]
    fn test_color_hex_formatting() {
        assert_eq!(SerializableColor::red().to_hex(), "#ef4444");
        assert_eq!(SerializableColor::new(1, 2, 3, 4).to_hex(), "#01020304");
    }

    #[test]
    fn test_patch_touches_only_carried_fields() {
        let mut annotation = rect_annotation();
        annotation.apply_patch(&AnnotationPatch::rotation(30.0));
        let frame = annotation.shape.frame().unwrap();
        assert!((frame.rotation - 30.0).abs() < f64::EPSILON);
        assert!((frame.width - 100.0).abs() < f64::EPSILON);
        assert_eq!(annotation.status, LifecycleStatus::Open);

        annotation.apply_patch(&AnnotationPatch::status(LifecycleStatus::Resolved));
        assert_eq!(annotation.status, LifecycleStatus::Resolved);
        assert!((annotation.shape.rotation() - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_patch_ignores_fields_of_other_kinds() {
        let mut annotation = rect_annotation();
        let before = annotation.shape.clone();
        let patch = AnnotationPatch {
            points: Some(vec![Point::new(1.0, 1.0)]),
            image_pointer: Some(Some(Point::new(5.0, 5.0))),
            ..AnnotationPatch::default()
        };
        annotation.apply_patch(&patch);
        assert_eq!(annotation.shape, before);
    }

    #[test]
    fn test_patch_serializes_sparsely() {
        let json = serde_json::to_value(AnnotationPatch::rotation(12.0)).unwrap();
        assert_eq!(json, serde_json::json!({ "rotation": 12.0 }));

        let cleared = AnnotationPatch {
            image_pointer: Some(None),
            ..AnnotationPatch::default()
        };
        let json = serde_json::to_string(&cleared).unwrap();
        let back: AnnotationPatch = serde_json::from_str(&json).unwrap();
        assert_eq!(back.image_pointer, Some(None));
    }

    #[test]
    fn test_hit_test_uses_minimum_box_extent() {
        let annotation = AnnotationDraft::new(
            Shape::Box(BoxShape::new(BoxKind::Rectangle, Frame::new(0.0, 0.0, 4.0, 4.0))),
            ShapeStyle::default(),
            "ana",
        )
        .into_annotation(AnnotationId::from("tiny"));
        let hit = HitTolerance::default();
        assert!(annotation.hit_test(Point::new(18.0, 2.0), &hit));
        assert!(!annotation.hit_test(Point::new(30.0, 2.0), &hit));
    }

    #[test]
    fn test_polyline_distance_edge_cases() {
        assert!(point_to_polyline_dist(Point::ZERO, &[]).is_infinite());
        let single = point_to_polyline_dist(Point::ZERO, &[Point::new(3.0, 4.0)]);
        assert!((single - 5.0).abs() < f64::EPSILON);
        let d = point_to_polyline_dist(
            Point::new(5.0, 3.0),
            &[Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)],
        );
        assert!((d - 3.0).abs() < 1e-9);
    }
}
