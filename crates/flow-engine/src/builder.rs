//! Fluent builder for workflow graphs
//!
//! Provides a compact API for constructing graphs programmatically with
//! caller-chosen ids, which keeps tests and demos readable.

use crate::graph::{GraphParts, WorkflowGraph};
use crate::types::{Edge, Node, NodeKind, Point, CONFIG_CONTENT};

/// Fluent builder for constructing workflow graphs
///
/// # Example
///
/// ```
/// use flow_engine::{NodeKind, WorkflowBuilder};
///
/// let graph = WorkflowBuilder::new("wf-1", "My Workflow")
///     .add_node("notes", NodeKind::Source, "Study Notes", (0.0, 0.0))
///     .with_content("Photosynthesis notes")
///     .add_node("cards", NodeKind::Sink, "Flashcards", (200.0, 0.0))
///     .connect("notes", "cards")
///     .build();
///
/// assert_eq!(graph.edges().len(), 1);
/// ```
pub struct WorkflowBuilder {
    id: String,
    name: String,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    edge_counter: usize,
}

impl WorkflowBuilder {
    /// Create a new workflow builder
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
            edge_counter: 0,
        }
    }

    /// Add a node to the graph
    pub fn add_node(
        mut self,
        id: impl Into<String>,
        kind: NodeKind,
        label: impl Into<String>,
        position: impl Into<Point>,
    ) -> Self {
        self.nodes.push(Node::new(id, kind, label, position.into()));
        self
    }

    /// Set a config entry on the most recently added node
    ///
    /// Must be called immediately after `add_node`.
    pub fn with_config(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        if let Some(node) = self.nodes.last_mut() {
            node.config.insert(key.into(), value);
        }
        self
    }

    /// Set the literal content of the most recently added (source) node
    pub fn with_content(self, content: impl Into<String>) -> Self {
        self.with_config(CONFIG_CONTENT, serde_json::Value::String(content.into()))
    }

    /// Connect two nodes (auto-generates edge ID)
    pub fn connect(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.edge_counter += 1;
        self.edges.push(Edge {
            id: format!("edge-{}", self.edge_counter),
            from: from.into(),
            to: to.into(),
        });
        self
    }

    /// Build the graph
    ///
    /// Edges that would violate a graph invariant are dropped.
    pub fn build(self) -> WorkflowGraph {
        WorkflowGraph::from_parts(GraphParts {
            id: self.id,
            name: self.name,
            nodes: self.nodes,
            edges: self.edges,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workflow_builder_basic() {
        let graph = WorkflowBuilder::new("wf-1", "Test Workflow")
            .add_node("input-1", NodeKind::Source, "Study Notes", (0.0, 0.0))
            .with_content("Hello")
            .add_node("output-1", NodeKind::Sink, "Flashcards", (200.0, 0.0))
            .connect("input-1", "output-1")
            .build();

        assert_eq!(graph.id(), "wf-1");
        assert_eq!(graph.name(), "Test Workflow");
        assert_eq!(graph.nodes().len(), 2);
        assert_eq!(graph.edges().len(), 1);
        assert_eq!(graph.nodes()[0].config_str(CONFIG_CONTENT), Some("Hello"));
    }

    #[test]
    fn test_workflow_builder_auto_edge_ids() {
        let graph = WorkflowBuilder::new("wf", "Test")
            .add_node("a", NodeKind::Source, "A", (0.0, 0.0))
            .add_node("b", NodeKind::Transform, "B", (100.0, 0.0))
            .add_node("c", NodeKind::Sink, "C", (200.0, 0.0))
            .connect("a", "b")
            .connect("b", "c")
            .build();

        assert_eq!(graph.edges()[0].id, "edge-1");
        assert_eq!(graph.edges()[1].id, "edge-2");
    }

    #[test]
    fn test_workflow_builder_drops_invalid_edges() {
        let graph = WorkflowBuilder::new("wf", "Test")
            .add_node("a", NodeKind::Source, "A", (0.0, 0.0))
            .add_node("b", NodeKind::Sink, "B", (100.0, 0.0))
            .connect("a", "b")
            .connect("a", "b")
            .connect("a", "a")
            .connect("a", "nowhere")
            .build();

        assert_eq!(graph.edges().len(), 1);
    }

    #[test]
    fn test_workflow_builder_serde_roundtrip() {
        let graph = WorkflowBuilder::new("wf-rt", "Roundtrip Test")
            .add_node("a", NodeKind::Source, "A", (0.0, 0.0))
            .add_node("b", NodeKind::Sink, "B", (100.0, 0.0))
            .connect("a", "b")
            .build();

        let json = serde_json::to_string(&graph).unwrap();
        let restored: WorkflowGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, graph);
    }
}
