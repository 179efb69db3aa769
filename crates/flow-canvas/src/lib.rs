//! Flow Canvas - editor state for node-graph workflows
//!
//! Sits between a presentation layer and `flow-engine`:
//!
//! - `Viewport`: pan/zoom and the screen/world transform
//! - `InteractionController`: pointer gestures (pan, drag, connect)
//! - `Editor`: the context object a host drives
//! - `CanvasSnapshot`: what the host draws
//!
//! Hit-testing stays in the host; input events arrive already tagged with
//! the node or port under the pointer.

pub mod controller;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod input;
pub mod snapshot;

// Re-export key types
pub use controller::{
    ConnectionRefusal, ControllerConfig, Gesture, InteractionController, InteractionOutcome,
};
pub use editor::{Editor, EditorConfig};
pub use error::{CanvasError, Result};
pub use geometry::{Viewport, ViewportConfig};
pub use input::{HitTarget, InputEvent, PointerButton, PointerEvent, WheelEvent};
pub use snapshot::CanvasSnapshot;
