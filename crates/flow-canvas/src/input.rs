//! Host input events consumed by the interaction controller
//!
//! Hit-testing belongs to the presentation layer, which knows where nodes
//! and ports are drawn; it tags each pointer event with what was under it.

use flow_engine::{NodeId, Point};
use serde::{Deserialize, Serialize};

/// Pointer button identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// What the pointer is over
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "nodeId", rename_all = "snake_case")]
pub enum HitTarget {
    /// Empty canvas
    Background,
    /// A node body
    NodeBody(NodeId),
    /// A node's output port (connections start here)
    OutputPort(NodeId),
    /// A node's input port (connections end here)
    InputPort(NodeId),
}

impl HitTarget {
    pub fn node_id(&self) -> Option<&str> {
        match self {
            HitTarget::Background => None,
            HitTarget::NodeBody(id) | HitTarget::OutputPort(id) | HitTarget::InputPort(id) => {
                Some(id)
            }
        }
    }
}

/// Pointer press, move or release
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerEvent {
    /// Screen position in pixels
    pub position: Point,
    pub button: PointerButton,
    pub target: HitTarget,
}

impl PointerEvent {
    pub fn primary(position: impl Into<Point>, target: HitTarget) -> Self {
        Self {
            position: position.into(),
            button: PointerButton::Primary,
            target,
        }
    }
}

/// Wheel scroll
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WheelEvent {
    /// Vertical scroll delta; positive scrolls down
    pub delta_y: f64,
    /// Screen position of the pointer
    pub position: Point,
}

/// Any input the controller handles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InputEvent {
    PointerDown(PointerEvent),
    PointerMove(PointerEvent),
    PointerUp(PointerEvent),
    /// Pointer left the canvas bounds
    PointerLeave,
    Wheel(WheelEvent),
}
