//! Threadboard Core Library
//!
//! Platform-agnostic transform engine for the Threadboard collaborative
//! whiteboard: rotation-aware geometry, the annotation model, pointer
//! gesture handling and the store interface annotations sync through.

pub mod assets;
pub mod config;
pub mod geometry;
pub mod interaction;
pub mod links;
pub mod selection;
pub mod shapes;
pub mod store;
pub mod tools;
pub mod viewport;
pub mod whiteboard;

pub use assets::{AssetError, ImageAsset, ImageUploader};
pub use config::{ConfigError, EngineConfig};
pub use geometry::{resize, rotate_point, unrotate_point, BoundingBox, Frame, ResizeHandle};
pub use interaction::{InteractionController, InteractionState, TransformMode, TransformSession};
pub use selection::{Handle, HandleKind, PointerIntent, SelectionManager};
pub use shapes::{Annotation, AnnotationId, AnnotationPatch, Shape, ShapeKind};
pub use store::{DocumentStore, MemoryStore, StoreError, WorkspaceId, WriteToken};
pub use tools::ToolKind;
pub use viewport::Viewport;
pub use whiteboard::{GestureResult, PointerEvent, Whiteboard, WhiteboardError};
