//! Sequential workflow execution
//!
//! A run resets every node, picks the root source nodes and walks the
//! graph depth-first, children in edge creation order. Each node is
//! processed to completion (including its producer call) before the next
//! one starts, so sibling branches never overlap.
//!
//! # Traversal
//!
//! There is no visited set by default. A node reachable along two paths
//! is processed twice, and a cycle in the authored graph keeps the run
//! going forever. `EngineConfig::cycle_guard` and `EngineConfig::max_steps`
//! bound this for callers that need it.
//!
//! # Failures
//!
//! A failing producer call never aborts the run. The node gets fallback
//! text and is marked completed (or error under `strict_status`), and the
//! traversal carries on into its children.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::events::{EventSink, NullEventSink, RunEndReason, WorkflowEvent};
use crate::graph::WorkflowGraph;
use crate::producer::{ContentProducer, GenerationRequest};
use crate::types::{Node, NodeId, NodeKind, NodeStatus, CONFIG_CONTENT, CONFIG_INSTRUCTION};

/// How a node's output was obtained
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeOutcome {
    /// Source node emitted its configured content
    Literal,
    /// Source node had no content and emitted the placeholder
    Placeholder,
    /// Producer returned text
    Produced,
    /// Nothing reached the node; the producer was not called
    NoInput,
    /// Producer failed; the output is fallback text
    Fallback { error: String },
}

impl NodeOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, NodeOutcome::Fallback { .. })
    }
}

/// One processing step of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeVisit {
    pub node_id: NodeId,
    pub outcome: NodeOutcome,
}

/// Outputs produced during one run, keyed by node
///
/// Only alive for the run; the engine copies each entry onto the node as
/// soon as it is produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSession {
    outputs: HashMap<NodeId, String>,
}

impl RunSession {
    pub fn output(&self, node_id: &str) -> Option<&str> {
        self.outputs.get(node_id).map(String::as_str)
    }

    fn record(&mut self, node_id: &str, output: String) {
        self.outputs.insert(node_id.to_string(), output);
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: String,
    pub roots: Vec<NodeId>,
    /// Every node visit, in processing order
    pub visits: Vec<NodeVisit>,
    pub session: RunSession,
    pub reason: RunEndReason,
    pub elapsed_ms: u64,
}

impl RunReport {
    /// How many times a node was processed
    pub fn visit_count(&self, node_id: &str) -> usize {
        self.visits.iter().filter(|v| v.node_id == node_id).count()
    }

    /// Outcome of the most recent visit to a node
    pub fn outcome(&self, node_id: &str) -> Option<&NodeOutcome> {
        self.visits
            .iter()
            .rev()
            .find(|v| v.node_id == node_id)
            .map(|v| &v.outcome)
    }
}

/// Handle for requesting that the current run stop
///
/// The request is honoured between node steps, never in the middle of a
/// producer call. Nodes completed before that keep their output.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Read-only view of whether an engine is running
///
/// Clone it out before starting a run; the run itself borrows the engine
/// (and, through `Editor`, the whole editor) until it ends.
#[derive(Debug, Clone, Default)]
pub struct RunningHandle {
    flag: Arc<AtomicBool>,
}

impl RunningHandle {
    pub fn is_running(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Clears the running flag when a run ends, however it ends
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Runs workflow graphs against a content producer
pub struct ExecutionEngine {
    config: EngineConfig,
    running: Arc<AtomicBool>,
    cancel: CancelHandle,
    event_sink: Arc<dyn EventSink>,
}

impl ExecutionEngine {
    /// Create an engine with the given configuration and no event sink
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
            cancel: CancelHandle::default(),
            event_sink: Arc::new(NullEventSink),
        }
    }

    /// Stream run events to the given sink
    pub fn with_event_sink(mut self, event_sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = event_sink;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Whether a run is in flight; hosts use this to disable "Run"
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Handle that reports the running flag from outside a run
    pub fn running_handle(&self) -> RunningHandle {
        RunningHandle {
            flag: Arc::clone(&self.running),
        }
    }

    /// Handle that can cancel the next or current run
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Nodes a run starts from
    ///
    /// Source nodes without incoming edges; if every source has one, all
    /// source nodes, so a run is never empty while a source exists.
    pub fn root_nodes(graph: &WorkflowGraph) -> Vec<NodeId> {
        let sources: Vec<&Node> = graph
            .nodes()
            .iter()
            .filter(|n| n.kind == NodeKind::Source)
            .collect();

        let roots: Vec<NodeId> = sources
            .iter()
            .filter(|n| !graph.has_incoming(&n.id))
            .map(|n| n.id.clone())
            .collect();

        if roots.is_empty() {
            sources.iter().map(|n| n.id.clone()).collect()
        } else {
            roots
        }
    }

    /// Run the workflow end to end
    ///
    /// Holds the graph for the whole run, so edits cannot interleave with
    /// the traversal. Fails only if another run is already in progress.
    pub async fn run(
        &self,
        graph: &mut WorkflowGraph,
        producer: &dyn ContentProducer,
    ) -> Result<RunReport> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(EngineError::AlreadyRunning);
        }
        let _guard = RunningGuard(&*self.running);
        self.cancel.reset();

        let started = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();

        graph.reset_run_state();
        let roots = Self::root_nodes(graph);
        log::info!(
            "Run {} of '{}' starting from {} root(s)",
            run_id,
            graph.id(),
            roots.len()
        );
        self.emit(WorkflowEvent::RunStarted {
            workflow_id: graph.id().to_string(),
            run_id: run_id.clone(),
            roots: roots.clone(),
        });

        let mut session = RunSession::default();
        let mut visits = Vec::new();
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut pending: Vec<NodeId> = roots.iter().rev().cloned().collect();
        let mut reason = RunEndReason::Finished;

        while let Some(node_id) = pending.pop() {
            if self.cancel.is_cancelled() {
                log::info!("Run {} cancelled after {} visit(s)", run_id, visits.len());
                reason = RunEndReason::Cancelled;
                break;
            }
            if self.config.max_steps.is_some_and(|max| visits.len() >= max) {
                log::warn!("Run {} hit the step limit", run_id);
                reason = RunEndReason::StepLimit;
                break;
            }
            if self.config.cycle_guard && !visited.insert(node_id.clone()) {
                continue;
            }
            let Some(node) = graph.node(&node_id).cloned() else {
                continue;
            };

            graph.set_status(&node_id, NodeStatus::Running);
            self.emit(WorkflowEvent::NodeStarted {
                run_id: run_id.clone(),
                node_id: node_id.clone(),
            });

            let (output, outcome) = self.compute_output(&node, graph, &session, producer).await;
            let status = if self.config.strict_status && outcome.is_degraded() {
                NodeStatus::Error
            } else {
                NodeStatus::Completed
            };

            graph.set_status(&node_id, status);
            graph.set_output(&node_id, Some(output.clone()));
            session.record(&node_id, output.clone());
            self.emit(WorkflowEvent::NodeFinished {
                run_id: run_id.clone(),
                node_id: node_id.clone(),
                status,
                output,
                degraded: match &outcome {
                    NodeOutcome::Fallback { error } => Some(error.clone()),
                    _ => None,
                },
            });

            // Reversed so the first-created edge is processed first.
            let children: Vec<NodeId> = graph.outgoing_edges(&node_id).map(|e| e.to.clone()).collect();
            pending.extend(children.into_iter().rev());

            visits.push(NodeVisit { node_id, outcome });
        }

        let elapsed_ms = started.elapsed().as_millis() as u64;
        log::info!(
            "Run {} ended ({:?}) after {} visit(s) in {}ms",
            run_id,
            reason,
            visits.len(),
            elapsed_ms
        );
        self.emit(WorkflowEvent::RunFinished {
            workflow_id: graph.id().to_string(),
            run_id: run_id.clone(),
            reason,
            visits: visits.len(),
            elapsed_ms,
        });

        Ok(RunReport {
            run_id,
            roots,
            visits,
            session,
            reason,
            elapsed_ms,
        })
    }

    async fn compute_output(
        &self,
        node: &Node,
        graph: &WorkflowGraph,
        session: &RunSession,
        producer: &dyn ContentProducer,
    ) -> (String, NodeOutcome) {
        match node.kind {
            NodeKind::Source => {
                if self.config.source_delay_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(self.config.source_delay_ms)).await;
                }
                match node.config_str(CONFIG_CONTENT).filter(|c| !c.is_empty()) {
                    Some(content) => (content.to_string(), NodeOutcome::Literal),
                    None => (self.config.source_placeholder.clone(), NodeOutcome::Placeholder),
                }
            }
            NodeKind::Transform => {
                let Some(input) = Self::upstream_value(node, graph, session) else {
                    return (self.config.transform_no_input.clone(), NodeOutcome::NoInput);
                };
                let instruction = node
                    .config_str(CONFIG_INSTRUCTION)
                    .unwrap_or(&self.config.transform_instruction);
                let request = GenerationRequest::new(input, node.label.clone(), instruction);
                self.produce(node, &request, producer, &self.config.transform_fallback)
                    .await
            }
            NodeKind::Sink => {
                let Some(input) = Self::upstream_value(node, graph, session) else {
                    return (self.config.sink_no_input.clone(), NodeOutcome::NoInput);
                };
                let request = GenerationRequest::new(
                    input,
                    node.label.clone(),
                    EngineConfig::sink_instruction(&node.label),
                );
                let fallback = self.config.sink_fallback_for(&node.label);
                self.produce(node, &request, producer, fallback).await
            }
        }
    }

    /// Value carried by the first incoming edge, if it has been produced
    ///
    /// Only one upstream value is used even when several edges feed the
    /// node.
    fn upstream_value(node: &Node, graph: &WorkflowGraph, session: &RunSession) -> Option<String> {
        let edge = graph.incoming_edges(&node.id).next()?;
        session
            .output(&edge.from)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    async fn produce(
        &self,
        node: &Node,
        request: &GenerationRequest,
        producer: &dyn ContentProducer,
        fallback: &str,
    ) -> (String, NodeOutcome) {
        log::debug!(
            "Node '{}' ({}) requesting '{}' from producer",
            node.label,
            node.id,
            request.format_label
        );
        match producer.generate(request).await {
            Ok(text) => (text, NodeOutcome::Produced),
            Err(e) => {
                log::warn!("Producer failed for node '{}' ({}): {}", node.label, node.id, e);
                (
                    fallback.to_string(),
                    NodeOutcome::Fallback {
                        error: e.to_string(),
                    },
                )
            }
        }
    }

    fn emit(&self, event: WorkflowEvent) {
        if let Err(e) = self.event_sink.send(event) {
            log::debug!("Dropping workflow event: {}", e);
        }
    }
}

impl Default for ExecutionEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
