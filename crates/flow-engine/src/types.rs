//! Core types for workflow graphs
//!
//! These are plain data records: nodes, edges and the world-space points
//! they are positioned with. Mutation goes through [`crate::WorkflowGraph`].

use std::ops::{Add, Div, Mul, Sub};

use serde::{Deserialize, Serialize};

/// Unique identifier for a node
pub type NodeId = String;

/// Unique identifier for an edge
pub type EdgeId = String;

/// Free-form per-node configuration (source text, model choice, depth, ...)
pub type NodeConfig = serde_json::Map<String, serde_json::Value>;

/// Configuration key holding a source node's literal content
pub const CONFIG_CONTENT: &str = "content";
/// Configuration key holding the name the source content came from
pub const CONFIG_SOURCE: &str = "source";
/// Configuration key overriding the instruction passed to the producer
pub const CONFIG_INSTRUCTION: &str = "instruction";

/// A 2D point or vector
///
/// Used for both screen pixels and world units; which space a value lives
/// in is determined by where it came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Point {
    type Output = Point;

    fn div(self, rhs: f64) -> Point {
        Point::new(self.x / rhs, self.y / rhs)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point::new(x, y)
    }
}

/// Kind of a node, which decides how the engine computes its output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Emits its configured literal content
    Source,
    /// Feeds its upstream value through the content producer
    Transform,
    /// Like a transform, but asks the producer for a labelled output shape
    Sink,
}

impl NodeKind {
    /// Whether edges may leave a node of this kind
    pub fn accepts_outgoing(&self) -> bool {
        !matches!(self, NodeKind::Sink)
    }

    /// Whether edges may enter a node of this kind
    pub fn accepts_incoming(&self) -> bool {
        !matches!(self, NodeKind::Source)
    }
}

/// Lifecycle status of a node within a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Error,
}

impl NodeStatus {
    /// Terminal statuses are the ones a run leaves behind
    pub fn is_terminal(&self) -> bool {
        matches!(self, NodeStatus::Completed | NodeStatus::Error)
    }
}

/// A node instance in a graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique identifier, stable for the node's lifetime
    pub id: NodeId,
    pub kind: NodeKind,
    /// Display label; sinks also pass it to the producer as the format hint
    pub label: String,
    /// Position in world units
    pub position: Point,
    pub status: NodeStatus,
    #[serde(default)]
    pub config: NodeConfig,
    /// Output produced by the most recent run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl Node {
    /// Create an idle node with an empty configuration
    pub fn new(id: impl Into<NodeId>, kind: NodeKind, label: impl Into<String>, position: Point) -> Self {
        Self {
            id: id.into(),
            kind,
            label: label.into(),
            position,
            status: NodeStatus::Idle,
            config: NodeConfig::new(),
            output: None,
        }
    }

    /// Read a string configuration entry, ignoring non-string values
    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(|v| v.as_str())
    }
}

/// A directed connection from one node's output to another's input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    /// Unique identifier for this edge
    pub id: EdgeId,
    /// Upstream node
    pub from: NodeId,
    /// Downstream node
    pub to: NodeId,
}
