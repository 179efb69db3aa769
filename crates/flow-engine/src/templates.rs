//! Node library and the starter workflow
//!
//! Templates describe what "add node" creates. The library mirrors the
//! palette of the study-content studio: note sources, concept extraction,
//! and a handful of publishable output formats.

use serde::{Deserialize, Serialize};

use crate::graph::WorkflowGraph;
use crate::types::{NodeConfig, NodeKind, Point, CONFIG_CONTENT, CONFIG_SOURCE};

/// Blueprint for a node created through `WorkflowGraph::add_node`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTemplate {
    pub kind: NodeKind,
    pub label: String,
    /// Configuration copied onto every node created from this template
    #[serde(default)]
    pub config: NodeConfig,
}

impl NodeTemplate {
    pub fn new(kind: NodeKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            config: NodeConfig::new(),
        }
    }

    pub fn source(label: impl Into<String>) -> Self {
        Self::new(NodeKind::Source, label)
    }

    pub fn transform(label: impl Into<String>) -> Self {
        Self::new(NodeKind::Transform, label)
    }

    pub fn sink(label: impl Into<String>) -> Self {
        Self::new(NodeKind::Sink, label)
    }

    /// Add a configuration entry to the template
    pub fn with_config(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.config.insert(key.into(), value);
        self
    }
}

/// A named group of templates, as shown in the node palette
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateGroup {
    pub title: String,
    pub templates: Vec<NodeTemplate>,
}

/// The built-in node palette, grouped by kind
pub fn node_library() -> Vec<TemplateGroup> {
    vec![
        TemplateGroup {
            title: "INPUTS".to_string(),
            templates: vec![
                NodeTemplate::source("Study Notes"),
                NodeTemplate::source("Upload File"),
                NodeTemplate::source("Voice Input"),
            ],
        },
        TemplateGroup {
            title: "PROCESSES".to_string(),
            templates: vec![
                NodeTemplate::transform("Extract Concepts"),
                NodeTemplate::transform("Generate Content"),
            ],
        },
        TemplateGroup {
            title: "OUTPUTS".to_string(),
            templates: vec![
                NodeTemplate::sink("TikTok Script"),
                NodeTemplate::sink("YouTube Outline"),
                NodeTemplate::sink("Flashcards"),
            ],
        },
    ]
}

/// Look up a library template by label
pub fn find_template(label: &str) -> Option<NodeTemplate> {
    node_library()
        .into_iter()
        .flat_map(|group| group.templates)
        .find(|t| t.label == label)
}

/// The workflow an editor opens with
///
/// Study Notes feeds Extract Concepts, which fans out to a TikTok script
/// and a flashcard deck.
pub fn seed_graph() -> WorkflowGraph {
    let mut graph = WorkflowGraph::new("autoflow", "AutoFlow Studio");

    let notes = NodeTemplate::source("Study Notes")
        .with_config(CONFIG_SOURCE, serde_json::json!("Biology_Ch4.txt"))
        .with_config(
            CONFIG_CONTENT,
            serde_json::json!("Photosynthesis is the process used by plants..."),
        );
    let concepts = NodeTemplate::transform("Extract Concepts")
        .with_config("model", serde_json::json!("Gemini 3 Pro"))
        .with_config("depth", serde_json::json!(50));

    let notes = graph.add_node(&notes, Point::new(100.0, 250.0)).id.clone();
    let concepts = graph.add_node(&concepts, Point::new(450.0, 250.0)).id.clone();
    let tiktok = graph
        .add_node(&NodeTemplate::sink("TikTok Script"), Point::new(800.0, 150.0))
        .id
        .clone();
    let cards = graph
        .add_node(&NodeTemplate::sink("Flashcards"), Point::new(800.0, 350.0))
        .id
        .clone();

    graph.add_edge(&notes, &concepts);
    graph.add_edge(&concepts, &tiktok);
    graph.add_edge(&concepts, &cards);
    graph
}
