//! Serializable view of the editor for presentation layers

use flow_engine::{Edge, Node, NodeId, Point};
use serde::{Deserialize, Serialize};

use crate::geometry::Viewport;

/// Everything a renderer needs to draw one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub viewport: Viewport,
    pub selection: Option<NodeId>,
    /// End of the connection being drawn, in world units
    pub temp_endpoint: Option<Point>,
    /// Engine running flag when the snapshot was taken; snapshots taken
    /// through `Editor` are never mid-run
    pub is_running: bool,
}

impl CanvasSnapshot {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
