//! The whiteboard: one client's view of a shared annotation workspace.
//!
//! Owns the selection, the gesture state machine and the viewport, keeps a
//! local cache of the workspace fed by the store subscription, and turns
//! pointer events into store writes.

use crate::assets::{check_size, place_image, AssetError, ImageUploader};
use crate::config::EngineConfig;
use crate::geometry::rotate_point;
use crate::interaction::{GestureOutcome, InteractionController, LiveUpdate, MoveOutcome};
use crate::selection::{
    handles_for, Handle, Modifiers, PickContext, PointerButton, PointerIntent, SelectionManager,
};
use crate::shapes::{
    Annotation, AnnotationDraft, AnnotationId, AnnotationPatch, BoxKind, LifecycleStatus,
    SerializableColor, Shape, ShapeStyle, TextBlock, UserId,
};
use crate::store::{
    BoxFuture, DocumentStore, StoreError, StoreResult, Subscription, WorkspaceId, WriteOutcome,
};
use crate::tools::ToolKind;
use crate::viewport::Viewport;
use kurbo::{Point, Vec2};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Distance of a new image callout beyond the image's right edge.
const IMAGE_POINTER_REACH: f64 = 50.0;

/// A live-update write detached from the gesture that produced it.
///
/// Failures are logged and dropped; only the final commit of a gesture is
/// reported to the caller.
pub type PendingWrite = BoxFuture<'static, ()>;

#[derive(Debug, Error)]
pub enum WhiteboardError {
    #[error("Failed to save {id}: {source}")]
    CommitFailed {
        id: AnnotationId,
        #[source]
        source: StoreError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("No annotation {0}")]
    UnknownAnnotation(AnnotationId),
    #[error("Annotation {0} is not {1}")]
    WrongKind(AnnotationId, &'static str),
}

/// A pointer event in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub position: Point,
    pub button: PointerButton,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            position: Point::new(x, y),
            button: PointerButton::Primary,
            modifiers: Modifiers::default(),
        }
    }

    pub fn with_shift(mut self) -> Self {
        self.modifiers.shift = true;
        self
    }

    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }
}

/// How a pointer-up ended the gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureResult {
    Idle,
    Panned,
    Discarded,
    Created(AnnotationId),
    Committed(AnnotationId),
    Unchanged(AnnotationId),
}

pub struct Whiteboard {
    store: Arc<dyn DocumentStore>,
    workspace: WorkspaceId,
    author: UserId,
    config: EngineConfig,
    viewport: Viewport,
    selection: SelectionManager,
    interaction: InteractionController,
    subscription: Subscription,
    /// Local cache of the workspace, back to front.
    annotations: Vec<Annotation>,
    /// Style for the next annotation drawn.
    style: ShapeStyle,
    /// Last screen position while panning.
    pan_from: Option<Point>,
}

impl Whiteboard {
    /// Open `workspace` on `store` as `author`.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        workspace: WorkspaceId,
        author: impl Into<UserId>,
        config: EngineConfig,
    ) -> StoreResult<Self> {
        let subscription = store.subscribe(&workspace)?;
        let annotations = subscription.latest().unwrap_or_default();
        log::info!("Opened workspace {} with {} annotations", workspace, annotations.len());
        Ok(Self {
            store,
            workspace,
            author: author.into(),
            viewport: Viewport::new(&config.viewport),
            style: config.style.clone(),
            config,
            selection: SelectionManager::new(),
            interaction: InteractionController::new(Uuid::new_v4().to_string()),
            subscription,
            annotations,
            pan_from: None,
        })
    }

    pub fn workspace(&self) -> &WorkspaceId {
        &self.workspace
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn annotation(&self, id: &AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| &a.id == id)
    }

    pub fn selected(&self) -> &[AnnotationId] {
        self.selection.selected()
    }

    pub fn tool(&self) -> ToolKind {
        self.selection.tool()
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        self.selection.set_tool(tool);
    }

    pub fn style(&self) -> &ShapeStyle {
        &self.style
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn interaction(&self) -> &InteractionController {
        &self.interaction
    }

    /// The shape being drawn, for rendering a preview.
    pub fn draft_preview(&self) -> Option<Shape> {
        self.interaction.draft().map(|draft| draft.preview())
    }

    /// Handles of the single selected annotation.
    pub fn handles(&self) -> Vec<Handle> {
        self.selection
            .single()
            .and_then(|id| self.annotation(id))
            .map(|a| handles_for(&a.shape, self.config.handles.rotate_offset))
            .unwrap_or_default()
    }

    /// Handle hit radius in canvas units at the current zoom.
    pub fn handle_radius(&self) -> f64 {
        self.pick_context().handle_radius
    }

    /// Adopt the newest snapshot from the store, if one arrived.
    ///
    /// The target of an open transform keeps its live geometry so the
    /// shape under the pointer does not jump back while writes are in flight.
    pub fn sync(&mut self) -> bool {
        let Some(snapshot) = self.subscription.latest() else {
            return false;
        };
        self.annotations = snapshot;
        if let Some(session) = self.interaction.session() {
            if let Some(shape) = session.live_shape() {
                if let Some(target) = self.annotations.iter_mut().find(|a| a.id == session.target) {
                    target.shape = shape.clone();
                }
            }
        }
        self.selection.retain_existing(&self.annotations);
        true
    }

    fn pick_context(&self) -> PickContext {
        PickContext {
            handle_radius: self.viewport.screen_len(self.config.handles.hit_radius),
            rotate_offset: self.config.handles.rotate_offset,
            hit: self.config.hit,
        }
    }

    /// Start a gesture. Returns `None` if one is already in progress.
    pub fn pointer_down(&mut self, event: PointerEvent) -> Option<PointerIntent> {
        if !self.interaction.is_idle() || self.pan_from.is_some() {
            log::debug!("Ignoring pointer-down during a gesture");
            return None;
        }
        let point = self.viewport.screen_to_canvas(event.position);
        let pick = self.pick_context();
        let intent = self.selection.route_pointer_down(
            &self.annotations,
            point,
            event.button,
            event.modifiers,
            &pick,
        );
        match &intent {
            PointerIntent::Draw(tool) => {
                self.interaction.begin_draw(*tool, point);
            }
            PointerIntent::Transform { id, mode } => {
                if let Some(target) = self.annotations.iter().find(|a| &a.id == id) {
                    self.interaction.begin_transform(target, *mode, point);
                }
            }
            PointerIntent::Toggle(_) => {}
            PointerIntent::Pan => self.pan_from = Some(event.position),
        }
        Some(intent)
    }

    /// Feed a pointer-move. A transform updates the local cache at once and
    /// returns the store write for the caller to run.
    pub fn pointer_move(&mut self, event: PointerEvent) -> Option<PendingWrite> {
        if let Some(last) = self.pan_from {
            self.viewport.pan_by(event.position - last);
            self.pan_from = Some(event.position);
            return None;
        }
        let point = self.viewport.screen_to_canvas(event.position);
        match self.interaction.pointer_move(point)? {
            MoveOutcome::Preview => None,
            MoveOutcome::Live(update) => {
                self.apply_local(&update.id, &update.shape);
                Some(self.detached_write(update))
            }
        }
    }

    fn detached_write(&self, update: LiveUpdate) -> PendingWrite {
        let store = Arc::clone(&self.store);
        let workspace = self.workspace.clone();
        Box::pin(async move {
            match store
                .update(&workspace, &update.id, &update.patch, Some(update.token))
                .await
            {
                Ok(WriteOutcome::Applied) => {}
                Ok(WriteOutcome::Stale) => log::debug!("Live update of {} superseded", update.id),
                Err(e) => log::warn!("Live update of {} failed: {}", update.id, e),
            }
        })
    }

    /// End the gesture: persist a new shape or commit the final geometry.
    pub async fn pointer_up(&mut self) -> Result<GestureResult, WhiteboardError> {
        if self.pan_from.take().is_some() {
            return Ok(GestureResult::Panned);
        }
        match self.interaction.pointer_up(&self.config.draw) {
            GestureOutcome::Idle => Ok(GestureResult::Idle),
            GestureOutcome::Discarded => Ok(GestureResult::Discarded),
            GestureOutcome::Unchanged(id) => Ok(GestureResult::Unchanged(id)),
            GestureOutcome::Created(shape) => {
                let id = self.create(shape).await?;
                self.selection.set_tool(ToolKind::Select);
                self.selection.select_only(id.clone());
                Ok(GestureResult::Created(id))
            }
            GestureOutcome::Committed(update) => {
                self.apply_local(&update.id, &update.shape);
                let written = self
                    .store
                    .update(&self.workspace, &update.id, &update.patch, Some(update.token))
                    .await;
                match written {
                    Ok(_) => Ok(GestureResult::Committed(update.id)),
                    Err(source) => Err(WhiteboardError::CommitFailed {
                        id: update.id,
                        source,
                    }),
                }
            }
        }
    }

    /// The pointer left the canvas: end the gesture as a pointer-up would.
    pub async fn pointer_leave(&mut self) -> Result<GestureResult, WhiteboardError> {
        self.pointer_up().await
    }

    /// Feed a wheel event. A plain wheel scrolls the canvas; with Ctrl or
    /// Cmd held the vertical delta zooms around the cursor.
    pub fn wheel(&mut self, delta: Vec2, screen: Point, modifiers: Modifiers) {
        if modifiers.ctrl {
            self.viewport
                .wheel_zoom(delta.y, screen, self.config.viewport.wheel_zoom_factor);
        } else {
            self.viewport.scroll(delta);
        }
    }

    async fn create(&mut self, shape: Shape) -> Result<AnnotationId, WhiteboardError> {
        let kind = shape.kind();
        let draft = AnnotationDraft::new(shape, self.style.clone(), self.author.clone());
        let id = self.store.create(&self.workspace, draft.clone()).await?;
        log::info!("Created {} {}", kind.label(), id);
        self.annotations.push(draft.into_annotation(id.clone()));
        Ok(id)
    }

    fn apply_local(&mut self, id: &AnnotationId, shape: &Shape) {
        if let Some(annotation) = self.annotations.iter_mut().find(|a| &a.id == id) {
            annotation.shape = shape.clone();
        }
    }

    async fn patch(&mut self, id: &AnnotationId, patch: AnnotationPatch) -> Result<(), WhiteboardError> {
        self.store.update(&self.workspace, id, &patch, None).await?;
        if let Some(annotation) = self.annotations.iter_mut().find(|a| &a.id == id) {
            annotation.apply_patch(&patch);
        }
        Ok(())
    }

    /// Delete every selected annotation. Returns how many were removed.
    pub async fn delete_selected(&mut self) -> Result<usize, WhiteboardError> {
        let ids = self.selection.selected().to_vec();
        for id in &ids {
            self.store.delete(&self.workspace, id).await?;
            self.annotations.retain(|a| &a.id != id);
            log::info!("Deleted {}", id);
        }
        self.selection.clear();
        Ok(ids.len())
    }

    /// Recolor the selected annotations, or set the color of the next one
    /// drawn when nothing is selected. Returns how many were recolored.
    pub async fn set_stroke_color(&mut self, color: SerializableColor) -> Result<usize, WhiteboardError> {
        let ids = self.selection.selected().to_vec();
        if ids.is_empty() {
            self.style.stroke_color = color;
            return Ok(0);
        }
        for id in &ids {
            self.patch(id, AnnotationPatch::stroke_color(color)).await?;
        }
        Ok(ids.len())
    }

    pub async fn set_status(&mut self, id: &AnnotationId, status: LifecycleStatus) -> Result<(), WhiteboardError> {
        if self.annotation(id).is_none() {
            return Err(WhiteboardError::UnknownAnnotation(id.clone()));
        }
        self.patch(id, AnnotationPatch::status(status)).await
    }

    /// Replace the content of a text annotation.
    pub async fn edit_text(&mut self, id: &AnnotationId, block: TextBlock) -> Result<(), WhiteboardError> {
        let annotation = self
            .annotation(id)
            .ok_or_else(|| WhiteboardError::UnknownAnnotation(id.clone()))?;
        if annotation.shape.as_box().and_then(|b| b.text()).is_none() {
            return Err(WhiteboardError::WrongKind(id.clone(), "a text block"));
        }
        let patch = AnnotationPatch {
            text: Some(block),
            ..AnnotationPatch::default()
        };
        self.patch(id, patch).await
    }

    /// Add a callout pointer to an image, or remove the one it has.
    pub async fn toggle_image_pointer(&mut self, id: &AnnotationId) -> Result<Option<Point>, WhiteboardError> {
        let annotation = self
            .annotation(id)
            .ok_or_else(|| WhiteboardError::UnknownAnnotation(id.clone()))?;
        let Shape::Box(shape) = &annotation.shape else {
            return Err(WhiteboardError::WrongKind(id.clone(), "an image"));
        };
        let BoxKind::Image(image) = &shape.kind else {
            return Err(WhiteboardError::WrongKind(id.clone(), "an image"));
        };
        let pointer = match image.pointer {
            Some(_) => None,
            None => {
                let frame = shape.frame;
                let center = frame.center();
                let reach = Vec2::new(frame.width / 2.0 + IMAGE_POINTER_REACH, 0.0);
                Some(rotate_point(center + reach, center, frame.rotation))
            }
        };
        let patch = AnnotationPatch {
            image_pointer: Some(pointer),
            ..AnnotationPatch::default()
        };
        self.patch(id, patch).await?;
        Ok(pointer)
    }

    /// Upload an image and place it near the top-left of the view.
    pub async fn place_image(
        &mut self,
        uploader: &dyn ImageUploader,
        bytes: Vec<u8>,
    ) -> Result<AnnotationId, WhiteboardError> {
        check_size(&bytes, self.config.images.max_bytes)?;
        let asset = uploader.upload_image(bytes).await?;
        let margin = self.config.images.placement_margin;
        let at = self.viewport.visible_origin() + Vec2::new(margin, margin);
        let shape = place_image(&asset, at, self.config.images.display_width);
        let id = self.create(Shape::Box(shape)).await?;
        self.selection.set_tool(ToolKind::Select);
        self.selection.select_only(id.clone());
        Ok(id)
    }
}
