//! Editor context: one graph, its viewport, the interaction controller and
//! the engine that runs it
//!
//! Hosts own an `Editor` and route everything through it; nothing here is
//! global, so several editors can coexist.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use flow_engine::{
    seed_graph, CancelHandle, ContentProducer, EngineConfig, EventSink, ExecutionEngine, Node,
    NodeId, NodeTemplate, Point, RunReport, RunningHandle, WorkflowGraph,
};
use serde::{Deserialize, Serialize};

use crate::controller::{ControllerConfig, InteractionController, InteractionOutcome};
use crate::error::{CanvasError, Result};
use crate::geometry::{Viewport, ViewportConfig};
use crate::input::InputEvent;
use crate::snapshot::CanvasSnapshot;

/// Offset from the canvas centre to a new node's top-left corner
pub const NEW_NODE_OFFSET: Point = Point { x: 100.0, y: 50.0 };

/// Shift applied when a new node would land exactly on another one
pub const NEW_NODE_CASCADE: Point = Point { x: 20.0, y: 20.0 };

const MAX_CASCADE: usize = 32;

/// Settings for every part of an editor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    pub viewport: ViewportConfig,
    pub controller: ControllerConfig,
    pub engine: EngineConfig,
}

pub struct Editor {
    graph: WorkflowGraph,
    viewport: Viewport,
    controller: InteractionController,
    engine: ExecutionEngine,
}

impl Default for Editor {
    /// Editor on the seed workflow with default settings
    fn default() -> Self {
        Self::new(seed_graph(), EditorConfig::default())
    }
}

impl Editor {
    pub fn new(graph: WorkflowGraph, config: EditorConfig) -> Self {
        Self {
            graph,
            viewport: Viewport::new(config.viewport),
            controller: InteractionController::new(config.controller),
            engine: ExecutionEngine::new(config.engine),
        }
    }

    /// Stream run events to the given sink
    pub fn with_event_sink(mut self, event_sink: Arc<dyn EventSink>) -> Self {
        let engine = std::mem::take(&mut self.engine);
        self.engine = engine.with_event_sink(event_sink);
        self
    }

    pub fn graph(&self) -> &WorkflowGraph {
        &self.graph
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn selection(&self) -> Option<&str> {
        self.controller.selection()
    }

    /// Always false when called through `&self`: `run` borrows the
    /// editor mutably until it ends. Watch a run with `running_handle`.
    pub fn is_running(&self) -> bool {
        self.engine.is_running()
    }

    pub fn running_handle(&self) -> RunningHandle {
        self.engine.running_handle()
    }

    /// Feed one input event to the interaction controller
    pub fn handle_event(&mut self, event: &InputEvent) -> InteractionOutcome {
        self.controller
            .handle(event, &mut self.graph, &mut self.viewport)
    }

    /// Add a node from the library near the middle of the visible canvas
    ///
    /// The new node becomes the selection.
    pub fn add_node(&mut self, template: &NodeTemplate) -> &Node {
        let mut position = self.viewport.canvas_center_world() - NEW_NODE_OFFSET;
        for _ in 0..MAX_CASCADE {
            if !self.graph.nodes().iter().any(|n| n.position == position) {
                break;
            }
            position = position + NEW_NODE_CASCADE;
        }

        let id = self.graph.add_node(template, position).id.clone();
        self.controller.select(id);
        log::debug!("Placed '{}' at ({}, {})", template.label, position.x, position.y);
        &self.graph.nodes()[self.graph.nodes().len() - 1]
    }

    /// Delete a node and its connections; returns whether it existed
    pub fn delete_node(&mut self, id: &str) -> bool {
        self.controller.node_deleted(id);
        self.graph.delete_node(id).is_some()
    }

    pub fn delete_selected(&mut self) -> Result<Node> {
        let id = self.selected_id()?;
        self.controller.node_deleted(&id);
        self.graph
            .delete_node(&id)
            .ok_or(CanvasError::NodeNotFound(id))
    }

    /// Edit the selected node's label or one configuration entry
    pub fn update_selected(&mut self, field: &str, value: serde_json::Value) -> Result<bool> {
        let id = self.selected_id()?;
        Ok(self.graph.update_node(&id, field, value))
    }

    /// Read a text file into the selected node's `source`/`content` entries
    pub async fn load_source_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let id = self.selected_id()?;
        self.load_source_file_into(&id, path).await
    }

    pub async fn load_source_file_into(
        &mut self,
        node_id: &str,
        path: impl AsRef<Path>,
    ) -> Result<()> {
        if !self.graph.contains_node(node_id) {
            return Err(CanvasError::NodeNotFound(node_id.to_string()));
        }

        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        log::info!("Loaded {} ({} bytes) into node {}", name, content.len(), node_id);
        self.graph.set_source_content(node_id, name, content);
        Ok(())
    }

    /// Run the workflow with the given producer
    ///
    /// Holds the editor for the whole run; use `cancel_handle` to stop it
    /// from elsewhere.
    pub async fn run(&mut self, producer: &dyn ContentProducer) -> Result<RunReport> {
        let report = self.engine.run(&mut self.graph, producer).await?;
        Ok(report)
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.engine.cancel_handle()
    }

    /// Write a node's output to `{dir}/{label}_Output.txt`
    pub async fn export_output(&self, node_id: &str, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let node = self
            .graph
            .node(node_id)
            .ok_or_else(|| CanvasError::NodeNotFound(node_id.to_string()))?;
        let output = node
            .output
            .as_deref()
            .filter(|o| !o.is_empty())
            .ok_or_else(|| CanvasError::NoOutput(node_id.to_string()))?;

        let path = dir.as_ref().join(export_file_name(&node.label));
        tokio::fs::write(&path, output).await?;
        log::info!("Exported output of {} to {}", node_id, path.display());
        Ok(path)
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.viewport.zoom_in()
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.viewport.zoom_out()
    }

    pub fn reset_viewport(&mut self) {
        self.viewport.reset();
    }

    pub fn snapshot(&self) -> CanvasSnapshot {
        CanvasSnapshot {
            nodes: self.graph.nodes().to_vec(),
            edges: self.graph.edges().to_vec(),
            viewport: self.viewport,
            selection: self.controller.selection().map(str::to_string),
            temp_endpoint: self.controller.temp_endpoint(),
            is_running: self.engine.is_running(),
        }
    }

    fn selected_id(&self) -> Result<NodeId> {
        self.controller
            .selection()
            .map(str::to_string)
            .ok_or(CanvasError::NoSelection)
    }
}

/// File name used when exporting a node's output
pub fn export_file_name(label: &str) -> String {
    let stem: String = label
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    format!("{}_Output.txt", stem)
}
