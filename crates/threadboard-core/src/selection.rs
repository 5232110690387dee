//! Selection, manipulation handles and pointer-down routing.

use crate::geometry::ResizeHandle;
use crate::interaction::TransformMode;
use crate::shapes::{Annotation, AnnotationId, BoxKind, HitTolerance, LineEnd, Shape};
use crate::tools::ToolKind;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Type of selection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleKind {
    /// Corner or edge-midpoint handle of a box.
    Resize(ResizeHandle),
    /// Rotation handle above the top edge of a box or line.
    Rotate,
    /// Endpoint of an arrow or line.
    Endpoint(LineEnd),
    /// Callout point of an image.
    ImagePointer,
}

impl HandleKind {
    /// The transform a drag on this handle performs.
    pub fn transform_mode(&self) -> TransformMode {
        match self {
            HandleKind::Resize(handle) => TransformMode::Resize(*handle),
            HandleKind::Rotate => TransformMode::Rotate,
            HandleKind::Endpoint(end) => TransformMode::LineEndpoint(*end),
            HandleKind::ImagePointer => TransformMode::ImagePointer,
        }
    }
}

/// A selection handle with its position and type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    /// Position in canvas coordinates.
    pub position: Point,
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    /// Check if a canvas point hits this handle. `radius` is in canvas units.
    pub fn hit_test(&self, point: Point, radius: f64) -> bool {
        (point - self.position).hypot2() <= radius * radius
    }
}

/// Get the selection handles for a shape.
///
/// Boxes get eight resize handles and a rotation handle `rotate_offset`
/// above the top edge, all following the box's rotation; images with a
/// callout also get a handle on the callout point. Lines get their two
/// endpoints and a rotation handle above their bounds. Freehand strokes
/// only move.
pub fn handles_for(shape: &Shape, rotate_offset: f64) -> Vec<Handle> {
    match shape {
        Shape::Box(shape) => {
            let frame = shape.frame;
            let mut handles: Vec<Handle> = ResizeHandle::ALL
                .iter()
                .map(|h| Handle::new(frame.handle_point(*h), HandleKind::Resize(*h)))
                .collect();
            handles.push(Handle::new(frame.rotation_handle(rotate_offset), HandleKind::Rotate));
            if let BoxKind::Image(image) = &shape.kind {
                if let Some(pointer) = image.pointer {
                    handles.push(Handle::new(pointer, HandleKind::ImagePointer));
                }
            }
            handles
        }
        Shape::Line(line) => vec![
            Handle::new(line.start, HandleKind::Endpoint(LineEnd::Start)),
            Handle::new(line.end(), HandleKind::Endpoint(LineEnd::End)),
            Handle::new(line.rotation_handle(rotate_offset), HandleKind::Rotate),
        ],
        Shape::Path(_) => Vec::new(),
    }
}

/// Find the handle under `point`, preferring the nearest when several overlap.
pub fn hit_test_handles(shape: &Shape, point: Point, radius: f64, rotate_offset: f64) -> Option<HandleKind> {
    handles_for(shape, rotate_offset)
        .into_iter()
        .filter(|h| h.hit_test(point, radius))
        .min_by(|a, b| {
            let da = (point - a.position).hypot2();
            let db = (point - b.position).hypot2();
            da.total_cmp(&db)
        })
        .map(|h| h.kind)
}

/// Topmost annotation under `point`. `annotations` is ordered back to front.
pub fn topmost_at<'a>(annotations: &'a [Annotation], point: Point, hit: &HitTolerance) -> Option<&'a Annotation> {
    annotations.iter().rev().find(|a| a.hit_test(point, hit))
}

/// Pointer button pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerButton {
    #[default]
    Primary,
    Middle,
}

/// Modifier keys held during a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub shift: bool,
    /// Ctrl, or Cmd on macOS.
    pub ctrl: bool,
}

/// What a pointer-down should start.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerIntent {
    /// Start drawing with the active tool.
    Draw(ToolKind),
    /// Start transforming an annotation.
    Transform { id: AnnotationId, mode: TransformMode },
    /// Shift-click toggled selection membership; no gesture follows.
    Toggle(AnnotationId),
    /// Nothing to grab: pan the view.
    Pan,
}

/// Picking parameters for routing a pointer-down, in canvas units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickContext {
    pub handle_radius: f64,
    pub rotate_offset: f64,
    pub hit: HitTolerance,
}

/// Tracks the active tool and the ordered set of selected annotations.
#[derive(Debug, Clone, Default)]
pub struct SelectionManager {
    selected: Vec<AnnotationId>,
    tool: ToolKind,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        self.tool = tool;
    }

    /// Selected ids in the order they were selected.
    pub fn selected(&self) -> &[AnnotationId] {
        &self.selected
    }

    pub fn is_selected(&self, id: &AnnotationId) -> bool {
        self.selected.contains(id)
    }

    /// The selected id when exactly one annotation is selected.
    pub fn single(&self) -> Option<&AnnotationId> {
        match self.selected.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    pub fn select_only(&mut self, id: AnnotationId) {
        self.selected.clear();
        self.selected.push(id);
    }

    /// Add or remove `id`. Returns whether it is selected afterwards.
    pub fn toggle(&mut self, id: AnnotationId) -> bool {
        if let Some(index) = self.selected.iter().position(|s| *s == id) {
            self.selected.remove(index);
            false
        } else {
            self.selected.push(id);
            true
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Drop ids that no longer exist in `annotations`.
    pub fn retain_existing(&mut self, annotations: &[Annotation]) {
        self.selected.retain(|id| annotations.iter().any(|a| &a.id == id));
    }

    /// Decide what a pointer-down at `point` starts and update the
    /// selection accordingly.
    ///
    /// Handles of a single selected annotation win over the shapes under
    /// them. A plain click on a shape selects only it and starts moving it;
    /// a shift-click toggles it. A plain click on empty canvas clears the
    /// selection and pans.
    pub fn route_pointer_down(
        &mut self,
        annotations: &[Annotation],
        point: Point,
        button: PointerButton,
        modifiers: Modifiers,
        pick: &PickContext,
    ) -> PointerIntent {
        if button == PointerButton::Middle {
            return PointerIntent::Pan;
        }
        if self.tool.is_drawing_tool() {
            return PointerIntent::Draw(self.tool);
        }

        if let Some(selected) = self.single().and_then(|id| annotations.iter().find(|a| &a.id == id)) {
            if let Some(handle) =
                hit_test_handles(&selected.shape, point, pick.handle_radius, pick.rotate_offset)
            {
                return PointerIntent::Transform {
                    id: selected.id.clone(),
                    mode: handle.transform_mode(),
                };
            }
        }

        match topmost_at(annotations, point, &pick.hit) {
            Some(hit) if modifiers.shift => {
                self.toggle(hit.id.clone());
                PointerIntent::Toggle(hit.id.clone())
            }
            Some(hit) => {
                self.select_only(hit.id.clone());
                PointerIntent::Transform {
                    id: hit.id.clone(),
                    mode: TransformMode::Move,
                }
            }
            None => {
                if !modifiers.shift {
                    self.clear();
                }
                PointerIntent::Pan
            }
        }
    }
}
