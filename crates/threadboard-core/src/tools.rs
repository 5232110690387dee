//! Tool system: the active tool and the in-progress drawing draft.

use crate::config::DrawConfig;
use crate::geometry::Frame;
use crate::shapes::{
    BoxKind, BoxShape, LineKind, LineShape, PathShape, Shape, ShapeKind, TextBlock,
};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    #[default]
    Select,
    Rectangle,
    Ellipse,
    Star,
    Arrow,
    Line,
    Freehand,
    Text,
}

impl ToolKind {
    /// The kind of shape this tool draws, or `None` for the select tool.
    pub fn draws(&self) -> Option<ShapeKind> {
        match self {
            ToolKind::Select => None,
            ToolKind::Rectangle => Some(ShapeKind::Rectangle),
            ToolKind::Ellipse => Some(ShapeKind::Ellipse),
            ToolKind::Star => Some(ShapeKind::Star),
            ToolKind::Arrow => Some(ShapeKind::Arrow),
            ToolKind::Line => Some(ShapeKind::Line),
            ToolKind::Freehand => Some(ShapeKind::Freehand),
            ToolKind::Text => Some(ShapeKind::Text),
        }
    }

    pub fn is_drawing_tool(&self) -> bool {
        self.draws().is_some()
    }
}

/// A shape being drawn. Extents stay signed until the draft is finished.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    kind: ShapeKind,
    start: Point,
    current: Point,
    /// Accumulated points for freehand drawing.
    points: Vec<Point>,
}

impl Draft {
    /// Start a draft for `tool` at `start`. The select tool draws nothing;
    /// images are placed from an upload, never drawn.
    pub fn new(tool: ToolKind, start: Point) -> Option<Self> {
        let kind = tool.draws()?;
        let points = if kind == ShapeKind::Freehand {
            vec![start]
        } else {
            Vec::new()
        };
        Some(Self {
            kind,
            start,
            current: start,
            points,
        })
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    /// Signed width and height from the start point to the pointer.
    pub fn extent(&self) -> Vec2 {
        self.current - self.start
    }

    pub fn update(&mut self, pointer: Point) {
        self.current = pointer;
        if self.kind == ShapeKind::Freehand {
            self.points.push(pointer);
        }
    }

    /// The shape as it would look if the gesture ended now, ignoring the
    /// minimum-size rule.
    pub fn preview(&self) -> Shape {
        match self.kind {
            ShapeKind::Arrow => Shape::Line(LineShape::new(LineKind::Arrow, self.start, self.current)),
            ShapeKind::Line => Shape::Line(LineShape::new(LineKind::Line, self.start, self.current)),
            ShapeKind::Freehand => Shape::Path(PathShape::new(self.points.clone())),
            ShapeKind::Text => Shape::Box(BoxShape::from_drag(
                BoxKind::Text(TextBlock::default()),
                self.start,
                self.current,
            )),
            ShapeKind::Ellipse => {
                Shape::Box(BoxShape::from_drag(BoxKind::Ellipse, self.start, self.current))
            }
            ShapeKind::Star => Shape::Box(BoxShape::from_drag(BoxKind::Star, self.start, self.current)),
            ShapeKind::Rectangle | ShapeKind::Image => {
                Shape::Box(BoxShape::from_drag(BoxKind::Rectangle, self.start, self.current))
            }
        }
    }

    /// Turn the draft into the shape to persist, or `None` when it is too
    /// small to keep.
    ///
    /// Freehand strokes and text blocks are always kept; text grows to its
    /// minimum size. Lines and arrows keep their signed delta.
    pub fn finish(self, rules: &DrawConfig) -> Option<Shape> {
        let extent = self.extent();
        let big_enough = extent.x.abs() > rules.min_extent || extent.y.abs() > rules.min_extent;
        match self.kind {
            ShapeKind::Freehand => Some(Shape::Path(PathShape::new(self.points))),
            ShapeKind::Text => {
                let mut frame = Frame::from_corners(self.start, self.current);
                frame.width = frame.width.max(rules.text_min_width);
                frame.height = frame.height.max(rules.text_min_height);
                Some(Shape::Box(BoxShape::new(BoxKind::Text(TextBlock::default()), frame)))
            }
            _ if !big_enough => {
                log::debug!("Discarding {} smaller than {}", self.kind.label(), rules.min_extent);
                None
            }
            _ => Some(self.preview()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drag(tool: ToolKind, from: (f64, f64), to: (f64, f64)) -> Option<Shape> {
        let mut draft = Draft::new(tool, Point::new(from.0, from.1))?;
        draft.update(Point::new(to.0, to.1));
        draft.finish(&DrawConfig::default())
    }

    #[test]
    fn test_select_tool_has_no_draft() {
        assert!(Draft::new(ToolKind::Select, Point::ZERO).is_none());
        assert!(!ToolKind::Select.is_drawing_tool());
        assert!(ToolKind::Star.is_drawing_tool());
    }

    #[test]
    fn test_rectangle_is_normalized() {
        let shape = drag(ToolKind::Rectangle, (200.0, 150.0), (100.0, 50.0)).unwrap();
        assert_eq!(shape.frame(), Some(Frame::new(100.0, 50.0, 100.0, 100.0)));
    }

    #[test]
    fn test_tiny_drags_are_discarded() {
        for tool in [ToolKind::Rectangle, ToolKind::Ellipse, ToolKind::Star, ToolKind::Arrow, ToolKind::Line] {
            assert!(drag(tool, (10.0, 10.0), (12.0, 8.0)).is_none(), "{tool:?}");
        }
    }

    #[test]
    fn test_one_long_side_is_enough() {
        assert!(drag(ToolKind::Ellipse, (10.0, 10.0), (10.5, 40.0)).is_some());
    }

    #[test]
    fn test_reverse_arrow_keeps_signed_extent() {
        let shape = drag(ToolKind::Arrow, (300.0, 300.0), (100.0, 250.0)).unwrap();
        let line = shape.as_line().unwrap();
        assert_eq!(line.start, Point::new(300.0, 300.0));
        assert_eq!(line.delta, Vec2::new(-200.0, -50.0));
        assert_eq!(shape.kind(), ShapeKind::Arrow);
    }

    #[test]
    fn test_text_click_gets_minimum_size() {
        let shape = drag(ToolKind::Text, (40.0, 40.0), (40.0, 40.0)).unwrap();
        assert_eq!(shape.frame(), Some(Frame::new(40.0, 40.0, 200.0, 100.0)));
    }

    #[test]
    fn test_freehand_collects_points_and_is_always_kept() {
        let mut draft = Draft::new(ToolKind::Freehand, Point::new(1.0, 1.0)).unwrap();
        draft.update(Point::new(2.0, 1.0));
        draft.update(Point::new(3.0, 2.0));
        let Some(Shape::Path(path)) = draft.finish(&DrawConfig::default()) else {
            panic!("expected a freehand path");
        };
        assert_eq!(path.points.len(), 3);
        assert_eq!(path.points[0], Point::new(1.0, 1.0));
    }

    #[test]
    fn test_threshold_is_configurable() {
        let rules = DrawConfig {
            min_extent: 50.0,
            ..DrawConfig::default()
        };
        let mut draft = Draft::new(ToolKind::Rectangle, Point::ZERO).unwrap();
        draft.update(Point::new(40.0, 40.0));
        assert!(draft.finish(&rules).is_none());
    }
}
