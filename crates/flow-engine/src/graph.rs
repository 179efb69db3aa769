//! The graph model: authoritative store for nodes and edges
//!
//! Every mutation preserves three invariants:
//!
//! - node ids are unique and never reused while the node lives
//! - every edge references two existing nodes
//! - at most one edge exists per `(from, to)` pair
//!
//! Violations are no-ops. Operations that can refuse report what happened
//! through a return value, but the graph is valid either way.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::templates::NodeTemplate;
use crate::types::{
    Edge, EdgeId, Node, NodeId, NodeStatus, Point, CONFIG_CONTENT, CONFIG_SOURCE,
};

/// Field name `update_node` treats as the node label rather than a config key
pub const FIELD_LABEL: &str = "label";

/// Result of an `add_edge` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeOutcome {
    /// A new edge was appended
    Added(EdgeId),
    /// `from == to`
    SelfLoop,
    /// An edge with the same `(from, to)` already exists
    Duplicate(EdgeId),
    /// One of the endpoints is not in the graph
    UnknownNode(NodeId),
}

impl EdgeOutcome {
    pub fn is_added(&self) -> bool {
        matches!(self, EdgeOutcome::Added(_))
    }
}

/// Raw serialized shape of a graph, sanitized on the way in
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphParts {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// A workflow graph: nodes plus directed edges in creation order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "GraphParts")]
pub struct WorkflowGraph {
    id: String,
    name: String,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl From<GraphParts> for WorkflowGraph {
    fn from(parts: GraphParts) -> Self {
        Self::from_parts(parts)
    }
}

impl WorkflowGraph {
    /// Create a new empty graph
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Build a graph from raw parts, dropping anything that would break an
    /// invariant (repeated node ids, dangling, self or duplicate edges)
    pub fn from_parts(parts: GraphParts) -> Self {
        let mut graph = Self::new(parts.id, parts.name);

        let mut seen = HashSet::new();
        for node in parts.nodes {
            if seen.insert(node.id.clone()) {
                graph.nodes.push(node);
            } else {
                log::warn!("Dropping node with repeated id '{}'", node.id);
            }
        }

        for edge in parts.edges {
            let keep = edge.from != edge.to
                && graph.contains_node(&edge.from)
                && graph.contains_node(&edge.to)
                && graph.find_edge(&edge.from, &edge.to).is_none()
                && graph.edges.iter().all(|e| e.id != edge.id);
            if keep {
                graph.edges.push(edge);
            } else {
                log::warn!("Dropping invalid edge '{}' ({} -> {})", edge.id, edge.from, edge.to);
            }
        }

        graph
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Edges in creation order
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Find a node by ID
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// Find the edge for a `(from, to)` pair
    pub fn find_edge(&self, from: &str, to: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.from == from && e.to == to)
    }

    /// Get edges coming into a node, in creation order
    pub fn incoming_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.to == node_id)
    }

    /// Get edges going out of a node, in creation order
    pub fn outgoing_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.from == node_id)
    }

    pub fn has_incoming(&self, node_id: &str) -> bool {
        self.incoming_edges(node_id).next().is_some()
    }

    /// Create a node from a template at a world position
    pub fn add_node(&mut self, template: &NodeTemplate, position: Point) -> &Node {
        let id = self.fresh_node_id();
        let mut node = Node::new(id, template.kind, template.label.clone(), position);
        node.config = template.config.clone();
        log::debug!("Adding {:?} node '{}' ({})", node.kind, node.label, node.id);
        self.nodes.push(node);
        &self.nodes[self.nodes.len() - 1]
    }

    /// Insert a fully formed node, keeping its id
    ///
    /// Returns false (and leaves the graph untouched) if the id is taken.
    pub fn insert_node(&mut self, node: Node) -> bool {
        if self.contains_node(&node.id) {
            return false;
        }
        self.nodes.push(node);
        true
    }

    /// Partially update a node
    ///
    /// `"label"` replaces the label (string values only); any other field
    /// sets that single configuration entry. Returns whether anything
    /// changed; unknown ids are a no-op.
    pub fn update_node(&mut self, id: &str, field: &str, value: serde_json::Value) -> bool {
        let Some(node) = self.node_mut(id) else {
            return false;
        };

        if field == FIELD_LABEL {
            return match value {
                serde_json::Value::String(label) => {
                    node.label = label;
                    true
                }
                _ => false,
            };
        }

        node.config.insert(field.to_string(), value);
        true
    }

    /// Attach loaded content to a source node (file upload, transcription)
    pub fn set_source_content(
        &mut self,
        id: &str,
        source_name: impl Into<String>,
        content: impl Into<String>,
    ) -> bool {
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        node.config
            .insert(CONFIG_SOURCE.to_string(), serde_json::Value::String(source_name.into()));
        node.config
            .insert(CONFIG_CONTENT.to_string(), serde_json::Value::String(content.into()));
        true
    }

    /// Move a node to a world position
    pub fn set_position(&mut self, id: &str, position: Point) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    pub fn set_status(&mut self, id: &str, status: NodeStatus) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.status = status;
                true
            }
            None => false,
        }
    }

    pub fn set_output(&mut self, id: &str, output: Option<String>) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.output = output;
                true
            }
            None => false,
        }
    }

    /// Remove a node and every edge touching it
    pub fn delete_node(&mut self, id: &str) -> Option<Node> {
        let pos = self.nodes.iter().position(|n| n.id == id)?;
        let removed_edges = self.delete_edges_for_node(id);
        log::debug!("Deleted node '{}' and {} edge(s)", id, removed_edges);
        Some(self.nodes.remove(pos))
    }

    /// Remove every edge with `from == id` or `to == id`
    ///
    /// Returns the number of edges removed.
    pub fn delete_edges_for_node(&mut self, id: &str) -> usize {
        let before = self.edges.len();
        self.edges.retain(|e| e.from != id && e.to != id);
        before - self.edges.len()
    }

    /// Connect two nodes
    pub fn add_edge(&mut self, from: &str, to: &str) -> EdgeOutcome {
        if from == to {
            return EdgeOutcome::SelfLoop;
        }
        for endpoint in [from, to] {
            if !self.contains_node(endpoint) {
                return EdgeOutcome::UnknownNode(endpoint.to_string());
            }
        }
        if let Some(existing) = self.find_edge(from, to) {
            return EdgeOutcome::Duplicate(existing.id.clone());
        }

        let id = format!("edge-{}", uuid::Uuid::new_v4());
        self.edges.push(Edge {
            id: id.clone(),
            from: from.to_string(),
            to: to.to_string(),
        });
        log::debug!("Connected {} -> {} ({})", from, to, id);
        EdgeOutcome::Added(id)
    }

    /// Remove a single edge by ID
    pub fn delete_edge(&mut self, edge_id: &str) -> Option<Edge> {
        let pos = self.edges.iter().position(|e| e.id == edge_id)?;
        Some(self.edges.remove(pos))
    }

    /// Put every node back to idle with no output, ready for a new run
    pub fn reset_run_state(&mut self) {
        for node in &mut self.nodes {
            node.status = NodeStatus::Idle;
            node.output = None;
        }
    }

    fn fresh_node_id(&self) -> NodeId {
        loop {
            let id = uuid::Uuid::new_v4().to_string();
            if !self.contains_node(&id) {
                return id;
            }
        }
    }
}
