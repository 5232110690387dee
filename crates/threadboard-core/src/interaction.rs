//! Pointer gesture state machine.
//!
//! A gesture is one pointer-down/move/up sequence. While drawing, the
//! machine grows a [`Draft`]; while transforming, every pointer-move is
//! computed from the snapshot taken at pointer-down so that intermediate
//! writes never feed back into the geometry.

use crate::config::DrawConfig;
use crate::geometry::{resize, rotation_toward, ResizeHandle};
use crate::shapes::{
    Annotation, AnnotationId, AnnotationPatch, BoxKind, LineEnd, Shape, ShapeGeometry,
};
use crate::store::{WriteToken, WriterId};
use crate::tools::{Draft, ToolKind};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// What a transform gesture does to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformMode {
    Move,
    Resize(ResizeHandle),
    Rotate,
    /// Drag one end of an arrow or line.
    LineEndpoint(LineEnd),
    /// Drag the callout point of an image.
    ImagePointer,
}

impl TransformMode {
    /// Whether this mode can act on `shape`.
    pub fn applies_to(&self, shape: &Shape) -> bool {
        match (self, shape) {
            (TransformMode::Move, _) => true,
            (TransformMode::Resize(_) | TransformMode::Rotate, Shape::Box(_)) => true,
            (TransformMode::Rotate, Shape::Line(_)) => true,
            (TransformMode::LineEndpoint(_), Shape::Line(_)) => true,
            (TransformMode::ImagePointer, Shape::Box(b)) => matches!(b.kind, BoxKind::Image(_)),
            _ => false,
        }
    }
}

/// Compute the shape produced by dragging from `anchor` to `pointer` in
/// `mode`, starting from `snapshot`, along with the patch describing the
/// change. Returns `None` if `mode` does not apply to the snapshot.
pub fn apply_transform(
    snapshot: &Shape,
    mode: TransformMode,
    anchor: Point,
    pointer: Point,
) -> Option<(Shape, AnnotationPatch)> {
    match (mode, snapshot) {
        (TransformMode::Move, Shape::Path(path)) => {
            let moved = path.translated(pointer - anchor);
            let patch = AnnotationPatch {
                points: Some(moved.points.clone()),
                ..AnnotationPatch::default()
            };
            Some((Shape::Path(moved), patch))
        }
        (TransformMode::Move, shape) => {
            let moved = shape.translated(pointer - anchor);
            let patch = AnnotationPatch::position(moved.position());
            Some((moved, patch))
        }
        (TransformMode::Resize(handle), Shape::Box(shape)) => {
            let resized = resize(shape, handle, pointer);
            let patch = AnnotationPatch::frame(&resized.frame);
            Some((Shape::Box(resized), patch))
        }
        (TransformMode::Rotate, Shape::Box(shape)) => {
            let mut rotated = shape.clone();
            rotated.frame.rotation = rotation_toward(shape.frame.center(), pointer);
            let patch = AnnotationPatch::rotation(rotated.frame.rotation);
            Some((Shape::Box(rotated), patch))
        }
        (TransformMode::Rotate, Shape::Line(line)) => {
            // Lines carry no rotation; both ends turn by the angle swept
            // around the midpoint since pointer-down.
            let mid = line.midpoint();
            let turned = line.rotated(rotation_toward(mid, pointer) - rotation_toward(mid, anchor));
            let patch = AnnotationPatch {
                position: Some(turned.start),
                extent: Some(turned.delta),
                ..AnnotationPatch::default()
            };
            Some((Shape::Line(turned), patch))
        }
        (TransformMode::LineEndpoint(end), Shape::Line(line)) => {
            let moved = line.with_endpoint(end, pointer);
            let patch = AnnotationPatch {
                position: (end == LineEnd::Start).then_some(moved.start),
                extent: Some(moved.delta),
                ..AnnotationPatch::default()
            };
            Some((Shape::Line(moved), patch))
        }
        (TransformMode::ImagePointer, Shape::Box(shape)) => {
            let mut moved = shape.clone();
            let BoxKind::Image(image) = &mut moved.kind else {
                return None;
            };
            image.pointer = Some(pointer);
            let patch = AnnotationPatch {
                image_pointer: Some(Some(pointer)),
                ..AnnotationPatch::default()
            };
            Some((Shape::Box(moved), patch))
        }
        _ => None,
    }
}

/// An open transform gesture on one annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformSession {
    pub target: AnnotationId,
    pub mode: TransformMode,
    /// Pointer position at pointer-down.
    pub anchor_pointer: Point,
    /// Geometry of the target at pointer-down.
    pub snapshot: Shape,
    gesture: u64,
    seq: u64,
    /// Most recent geometry and patch computed by this gesture.
    latest: Option<(Shape, AnnotationPatch)>,
}

impl TransformSession {
    /// Live geometry of the target, if the pointer has moved yet.
    pub fn live_shape(&self) -> Option<&Shape> {
        self.latest.as_ref().map(|(shape, _)| shape)
    }
}

/// Interaction state.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum InteractionState {
    #[default]
    Idle,
    Drawing(Draft),
    Transforming(TransformSession),
}

/// A geometry change to apply locally and send to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveUpdate {
    pub id: AnnotationId,
    pub shape: Shape,
    pub patch: AnnotationPatch,
    pub token: WriteToken,
}

/// What a pointer-move did.
#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    /// The drawing draft changed; nothing to persist yet.
    Preview,
    /// The transform target changed.
    Live(LiveUpdate),
}

/// How a gesture ended.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    /// No gesture was open.
    Idle,
    /// The draft was too small to keep.
    Discarded,
    /// A new shape to persist.
    Created(Shape),
    /// The final geometry of a transformed annotation.
    Committed(LiveUpdate),
    /// The pointer never moved; nothing to write.
    Unchanged(AnnotationId),
}

/// Drives the interaction state through a gesture's pointer events.
#[derive(Debug, Clone)]
pub struct InteractionController {
    state: InteractionState,
    writer: WriterId,
    gestures: u64,
}

impl InteractionController {
    pub fn new(writer: impl Into<WriterId>) -> Self {
        Self {
            state: InteractionState::Idle,
            writer: writer.into(),
            gestures: 0,
        }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == InteractionState::Idle
    }

    pub fn draft(&self) -> Option<&Draft> {
        match &self.state {
            InteractionState::Drawing(draft) => Some(draft),
            _ => None,
        }
    }

    pub fn session(&self) -> Option<&TransformSession> {
        match &self.state {
            InteractionState::Transforming(session) => Some(session),
            _ => None,
        }
    }

    /// Start drawing with `tool`. Refused while another gesture is open.
    pub fn begin_draw(&mut self, tool: ToolKind, pointer: Point) -> bool {
        if !self.is_idle() {
            log::debug!("Ignoring draw start while a gesture is open");
            return false;
        }
        match Draft::new(tool, pointer) {
            Some(draft) => {
                self.state = InteractionState::Drawing(draft);
                true
            }
            None => false,
        }
    }

    /// Start transforming `target`. Refused while another gesture is open
    /// or if `mode` does not apply to the target's kind.
    pub fn begin_transform(&mut self, target: &Annotation, mode: TransformMode, pointer: Point) -> bool {
        if !self.is_idle() {
            log::debug!("Ignoring transform start while a gesture is open");
            return false;
        }
        if !mode.applies_to(&target.shape) {
            log::debug!("{:?} does not apply to {:?}", mode, target.kind());
            return false;
        }
        self.gestures += 1;
        self.state = InteractionState::Transforming(TransformSession {
            target: target.id.clone(),
            mode,
            anchor_pointer: pointer,
            snapshot: target.shape.clone(),
            gesture: self.gestures,
            seq: 0,
            latest: None,
        });
        true
    }

    /// Feed a pointer-move. Ignored while idle.
    pub fn pointer_move(&mut self, pointer: Point) -> Option<MoveOutcome> {
        match &mut self.state {
            InteractionState::Idle => None,
            InteractionState::Drawing(draft) => {
                draft.update(pointer);
                Some(MoveOutcome::Preview)
            }
            InteractionState::Transforming(session) => {
                let (shape, patch) = apply_transform(
                    &session.snapshot,
                    session.mode,
                    session.anchor_pointer,
                    pointer,
                )?;
                session.seq += 1;
                session.latest = Some((shape.clone(), patch.clone()));
                Some(MoveOutcome::Live(LiveUpdate {
                    id: session.target.clone(),
                    shape,
                    patch,
                    token: WriteToken {
                        writer: self.writer.clone(),
                        gesture: session.gesture,
                        seq: session.seq,
                    },
                }))
            }
        }
    }

    /// End the gesture and return to idle.
    ///
    /// A finished transform commits the last computed geometry under a
    /// token newer than every live update of the gesture.
    pub fn pointer_up(&mut self, rules: &DrawConfig) -> GestureOutcome {
        match std::mem::take(&mut self.state) {
            InteractionState::Idle => GestureOutcome::Idle,
            InteractionState::Drawing(draft) => match draft.finish(rules) {
                Some(shape) => GestureOutcome::Created(shape),
                None => GestureOutcome::Discarded,
            },
            InteractionState::Transforming(session) => match session.latest {
                Some((shape, patch)) => GestureOutcome::Committed(LiveUpdate {
                    id: session.target,
                    shape,
                    patch,
                    token: WriteToken {
                        writer: self.writer.clone(),
                        gesture: session.gesture,
                        seq: session.seq + 1,
                    },
                }),
                None => GestureOutcome::Unchanged(session.target),
            },
        }
    }

    /// Abort the gesture the same way a pointer-up would end it.
    pub fn cancel(&mut self, rules: &DrawConfig) -> GestureOutcome {
        self.pointer_up(rules)
    }
}
