//! Graph validation for workflow graphs
//!
//! The graph model itself only guards structural invariants. Authoring
//! rules (edge direction per node kind) and cycle detection live here so
//! the interaction layer and the engine can opt into them.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::graph::WorkflowGraph;
use crate::types::{EdgeId, NodeId, NodeKind};

/// Validation error with location context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Cycle detected; lists the nodes that could not be ordered
    CycleDetected { nodes: Vec<NodeId> },
    /// An edge points into a source node
    EdgeIntoSource { edge_id: EdgeId, node_id: NodeId },
    /// An edge leaves a sink node
    EdgeOutOfSink { edge_id: EdgeId, node_id: NodeId },
    /// The graph has no source node, so a run would do nothing
    NoSourceNodes,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CycleDetected { nodes } => {
                write!(f, "Cycle detected through {} node(s)", nodes.len())
            }
            Self::EdgeIntoSource { edge_id, node_id } => {
                write!(f, "Edge '{}' points into source node '{}'", edge_id, node_id)
            }
            Self::EdgeOutOfSink { edge_id, node_id } => {
                write!(f, "Edge '{}' leaves sink node '{}'", edge_id, node_id)
            }
            Self::NoSourceNodes => write!(f, "Workflow has no source node"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a workflow graph
///
/// Returns all validation errors found (not just the first).
pub fn validate_workflow(graph: &WorkflowGraph) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    validate_edge_directions(graph, &mut errors);
    if !graph.nodes().iter().any(|n| n.kind == NodeKind::Source) {
        errors.push(ValidationError::NoSourceNodes);
    }
    if let Some(nodes) = find_cycle(graph) {
        errors.push(ValidationError::CycleDetected { nodes });
    }

    errors
}

/// Check edges against the per-kind direction rules
fn validate_edge_directions(graph: &WorkflowGraph, errors: &mut Vec<ValidationError>) {
    for edge in graph.edges() {
        if let Some(from) = graph.node(&edge.from) {
            if !from.kind.accepts_outgoing() {
                errors.push(ValidationError::EdgeOutOfSink {
                    edge_id: edge.id.clone(),
                    node_id: from.id.clone(),
                });
            }
        }
        if let Some(to) = graph.node(&edge.to) {
            if !to.kind.accepts_incoming() {
                errors.push(ValidationError::EdgeIntoSource {
                    edge_id: edge.id.clone(),
                    node_id: to.id.clone(),
                });
            }
        }
    }
}

/// Detect cycles using Kahn's algorithm (topological sort)
///
/// Returns the ids of the nodes left over once every orderable node has
/// been removed, or `None` if the graph is acyclic.
pub fn find_cycle(graph: &WorkflowGraph) -> Option<Vec<NodeId>> {
    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    for node in graph.nodes() {
        in_degree.insert(&node.id, 0);
    }
    for edge in graph.edges() {
        *in_degree.entry(&edge.to).or_insert(0) += 1;
    }

    let mut queue: VecDeque<&str> = in_degree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(&id, _)| id)
        .collect();

    let mut ordered: HashSet<&str> = HashSet::new();
    while let Some(node_id) = queue.pop_front() {
        ordered.insert(node_id);
        for edge in graph.outgoing_edges(node_id) {
            if let Some(deg) = in_degree.get_mut(edge.to.as_str()) {
                *deg -= 1;
                if *deg == 0 {
                    queue.push_back(&edge.to);
                }
            }
        }
    }

    if ordered.len() == graph.nodes().len() {
        return None;
    }
    Some(
        graph
            .nodes()
            .iter()
            .filter(|n| !ordered.contains(n.id.as_str()))
            .map(|n| n.id.clone())
            .collect(),
    )
}

/// Whether adding `from -> to` would close a cycle
///
/// True when `from` is already reachable from `to` (or the two are equal).
pub fn would_create_cycle(graph: &WorkflowGraph, from: &str, to: &str) -> bool {
    if from == to {
        return true;
    }
    let mut stack = vec![to];
    let mut visited = HashSet::new();
    while let Some(current) = stack.pop() {
        if current == from {
            return true;
        }
        if !visited.insert(current) {
            continue;
        }
        stack.extend(graph.outgoing_edges(current).map(|e| e.to.as_str()));
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::WorkflowBuilder;

    fn linear() -> WorkflowGraph {
        WorkflowBuilder::new("wf", "Linear")
            .add_node("a", NodeKind::Source, "A", (0.0, 0.0))
            .add_node("b", NodeKind::Transform, "B", (100.0, 0.0))
            .add_node("c", NodeKind::Sink, "C", (200.0, 0.0))
            .connect("a", "b")
            .connect("b", "c")
            .build()
    }

    #[test]
    fn test_valid_linear_workflow() {
        assert!(validate_workflow(&linear()).is_empty());
    }

    #[test]
    fn test_cycle_detected() {
        let graph = WorkflowBuilder::new("wf", "Cyclic")
            .add_node("s", NodeKind::Source, "S", (0.0, 0.0))
            .add_node("x", NodeKind::Transform, "X", (0.0, 0.0))
            .add_node("y", NodeKind::Transform, "Y", (0.0, 0.0))
            .connect("s", "x")
            .connect("x", "y")
            .connect("y", "x")
            .build();

        let cycle = find_cycle(&graph).unwrap();
        assert_eq!(cycle, vec!["x".to_string(), "y".to_string()]);
        assert!(validate_workflow(&graph)
            .iter()
            .any(|e| matches!(e, ValidationError::CycleDetected { .. })));
    }

    #[test]
    fn test_direction_rules() {
        let graph = WorkflowBuilder::new("wf", "Backwards")
            .add_node("s", NodeKind::Source, "S", (0.0, 0.0))
            .add_node("o", NodeKind::Sink, "O", (0.0, 0.0))
            .connect("o", "s")
            .build();

        let errors = validate_workflow(&graph);
        assert!(errors.contains(&ValidationError::EdgeOutOfSink {
            edge_id: "edge-1".to_string(),
            node_id: "o".to_string(),
        }));
        assert!(errors.contains(&ValidationError::EdgeIntoSource {
            edge_id: "edge-1".to_string(),
            node_id: "s".to_string(),
        }));
    }

    #[test]
    fn test_no_sources() {
        let graph = WorkflowBuilder::new("wf", "Empty")
            .add_node("t", NodeKind::Transform, "T", (0.0, 0.0))
            .build();
        assert_eq!(validate_workflow(&graph), vec![ValidationError::NoSourceNodes]);
    }

    #[test]
    fn test_would_create_cycle() {
        let graph = linear();
        assert!(would_create_cycle(&graph, "c", "a"));
        assert!(would_create_cycle(&graph, "b", "b"));
        assert!(!would_create_cycle(&graph, "a", "c"));
    }
}
