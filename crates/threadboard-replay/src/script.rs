//! Gesture scripts: a JSON list of pointer and editing steps.

use kurbo::{Point, Vec2};
use serde::Deserialize;
use thiserror::Error;
use threadboard_core::selection::{Modifiers, PointerButton};
use threadboard_core::shapes::{LifecycleStatus, SerializableColor};
use threadboard_core::{GestureResult, PointerEvent, StoreError, ToolKind, Whiteboard, WhiteboardError};

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Failed to read script {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed script: {0}")]
    Script(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] threadboard_core::ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Step {index} failed: {source}")]
    Step {
        index: usize,
        #[source]
        source: WhiteboardError,
    },
    #[error("Step {index}: not a color: {hex}")]
    BadColor { index: usize, hex: String },
}

/// One scripted action. Pointer positions are screen coordinates.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    Tool {
        tool: ToolKind,
    },
    Down {
        x: f64,
        y: f64,
        #[serde(default)]
        shift: bool,
        #[serde(default)]
        button: PointerButton,
    },
    Move {
        x: f64,
        y: f64,
    },
    Up,
    Leave,
    /// Scroll, or zoom with `ctrl` held.
    Wheel {
        #[serde(default)]
        dx: f64,
        dy: f64,
        x: f64,
        y: f64,
        #[serde(default)]
        ctrl: bool,
    },
    /// Recolor the selection, or the next annotation if nothing is selected.
    Color {
        hex: String,
    },
    /// Set the status of every selected annotation.
    Status {
        status: LifecycleStatus,
    },
    /// Delete the selection.
    Delete,
}

pub fn parse(json: &str) -> Result<Vec<Step>, ReplayError> {
    Ok(serde_json::from_str(json)?)
}

/// Tally of how the script's gestures ended.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    pub created: usize,
    pub committed: usize,
    pub discarded: usize,
    pub live_writes: usize,
}

/// Run `steps` against `board`, executing every live write before the next
/// step so writes reach the store in order.
pub async fn run(board: &mut Whiteboard, steps: &[Step]) -> Result<Summary, ReplayError> {
    let mut summary = Summary::default();
    for (index, step) in steps.iter().enumerate() {
        log::debug!("Step {}: {:?}", index, step);
        let step_error = |source| ReplayError::Step { index, source };
        match step {
            Step::Tool { tool } => board.set_tool(*tool),
            Step::Down { x, y, shift, button } => {
                let mut event = PointerEvent::at(*x, *y).with_button(*button);
                if *shift {
                    event = event.with_shift();
                }
                let intent = board.pointer_down(event);
                log::debug!("Pointer down routed to {:?}", intent);
            }
            Step::Move { x, y } => {
                if let Some(write) = board.pointer_move(PointerEvent::at(*x, *y)) {
                    write.await;
                    summary.live_writes += 1;
                }
            }
            Step::Up | Step::Leave => {
                let result = if matches!(step, Step::Up) {
                    board.pointer_up().await
                } else {
                    board.pointer_leave().await
                };
                match result.map_err(step_error)? {
                    GestureResult::Created(id) => {
                        log::info!("Created {}", id);
                        summary.created += 1;
                    }
                    GestureResult::Committed(_) => summary.committed += 1,
                    GestureResult::Discarded => summary.discarded += 1,
                    _ => {}
                }
            }
            Step::Wheel { dx, dy, x, y, ctrl } => {
                let modifiers = Modifiers {
                    ctrl: *ctrl,
                    ..Modifiers::default()
                };
                board.wheel(Vec2::new(*dx, *dy), Point::new(*x, *y), modifiers);
            }
            Step::Color { hex } => {
                let color = SerializableColor::from_hex(hex).ok_or_else(|| ReplayError::BadColor {
                    index,
                    hex: hex.clone(),
                })?;
                board.set_stroke_color(color).await.map_err(step_error)?;
            }
            Step::Status { status } => {
                for id in board.selected().to_vec() {
                    board.set_status(&id, *status).await.map_err(step_error)?;
                }
            }
            Step::Delete => {
                board.delete_selected().await.map_err(step_error)?;
            }
        }
        board.sync();
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pollster::block_on;
    use std::sync::Arc;
    use threadboard_core::{EngineConfig, MemoryStore, WorkspaceId};

    fn board() -> Whiteboard {
        Whiteboard::new(
            Arc::new(MemoryStore::new()),
            WorkspaceId::new("replay"),
            "script",
            EngineConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_parse_steps() {
        let steps = parse(
            r##"[
                { "step": "tool", "tool": "ellipse" },
                { "step": "down", "x": 10, "y": 20 },
                { "step": "move", "x": 60, "y": 80 },
                { "step": "up" },
                { "step": "color", "hex": "#3b82f6" }
            ]"##,
        )
        .unwrap();
        assert_eq!(steps[0], Step::Tool { tool: ToolKind::Ellipse });
        assert_eq!(
            steps[1],
            Step::Down {
                x: 10.0,
                y: 20.0,
                shift: false,
                button: PointerButton::Primary
            }
        );
        assert_eq!(steps.len(), 5);
    }

    #[test]
    fn test_unknown_step_is_rejected() {
        assert!(matches!(parse(r#"[{ "step": "teleport" }]"#), Err(ReplayError::Script(_))));
    }

    #[test]
    fn test_draw_then_move() {
        let mut board = board();
        let steps = vec![
            Step::Tool { tool: ToolKind::Rectangle },
            Step::Down { x: 0.0, y: 0.0, shift: false, button: PointerButton::Primary },
            Step::Move { x: 100.0, y: 50.0 },
            Step::Up,
            Step::Down { x: 50.0, y: 25.0, shift: false, button: PointerButton::Primary },
            Step::Move { x: 60.0, y: 35.0 },
            Step::Move { x: 70.0, y: 45.0 },
            Step::Up,
            Step::Status { status: LifecycleStatus::Resolved },
        ];
        let summary = block_on(run(&mut board, &steps)).unwrap();
        assert_eq!(summary.created, 1);
        assert_eq!(summary.committed, 1);
        assert_eq!(summary.live_writes, 2);
        let annotation = &board.annotations()[0];
        assert_eq!(annotation.shape.position(), Point::new(20.0, 20.0));
        assert_eq!(annotation.status, LifecycleStatus::Resolved);
    }

    #[test]
    fn test_wheel_scrolls_unless_ctrl_is_held() {
        let mut board = board();
        let steps = parse(
            r#"[
                { "step": "wheel", "dy": 100, "x": 50, "y": 50 },
                { "step": "wheel", "dy": 100, "x": 50, "y": 50, "ctrl": true }
            ]"#,
        )
        .unwrap();
        block_on(run(&mut board, &steps[..1])).unwrap();
        assert_eq!(board.viewport().pan, Vec2::new(0.0, -100.0));
        assert!((board.viewport().zoom - 1.0).abs() < f64::EPSILON);

        block_on(run(&mut board, &steps[1..])).unwrap();
        assert!((board.viewport().zoom - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_bad_color_names_the_step() {
        let mut board = board();
        let steps = vec![Step::Color { hex: "blurple".into() }];
        let err = block_on(run(&mut board, &steps)).unwrap_err();
        assert!(matches!(err, ReplayError::BadColor { index: 0, .. }));
    }
}
