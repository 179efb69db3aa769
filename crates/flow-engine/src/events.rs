//! Event types for streaming run progress
//!
//! Events are sent from the engine to the presentation layer (or any
//! consumer) so node status changes can be shown while a run is in flight.

use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{NodeId, NodeStatus};

/// Trait for sending workflow events
///
/// This abstracts over the transport mechanism (channel, UI callback, log)
/// so the engine does not depend on a particular host.
pub trait EventSink: Send + Sync {
    /// Send an event
    ///
    /// Returns an error if the event could not be delivered (e.g., channel closed)
    fn send(&self, event: WorkflowEvent) -> Result<(), EventError>;
}

/// Error when sending events fails
#[derive(Debug, Clone, Error)]
#[error("Event error: {message}")]
pub struct EventError {
    pub message: String,
}

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunEndReason {
    /// Traversal visited everything reachable from the roots
    Finished,
    /// A cancel request was observed between node steps
    Cancelled,
    /// The configured visit limit was reached
    StepLimit,
}

/// Events emitted during a workflow run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WorkflowEvent {
    /// A run started from the given root nodes
    #[serde(rename_all = "camelCase")]
    RunStarted {
        workflow_id: String,
        run_id: String,
        roots: Vec<NodeId>,
    },

    /// A node was marked running
    #[serde(rename_all = "camelCase")]
    NodeStarted { run_id: String, node_id: NodeId },

    /// A node reached a terminal status
    ///
    /// `degraded` carries the producer error when the output is a fallback.
    #[serde(rename_all = "camelCase")]
    NodeFinished {
        run_id: String,
        node_id: NodeId,
        status: NodeStatus,
        output: String,
        degraded: Option<String>,
    },

    /// The run stopped
    #[serde(rename_all = "camelCase")]
    RunFinished {
        workflow_id: String,
        run_id: String,
        reason: RunEndReason,
        visits: usize,
        elapsed_ms: u64,
    },
}

impl WorkflowEvent {
    /// Node the event is about, if any
    pub fn node_id(&self) -> Option<&str> {
        match self {
            Self::NodeStarted { node_id, .. } | Self::NodeFinished { node_id, .. } => Some(node_id),
            _ => None,
        }
    }
}

/// A no-op event sink that discards all events
///
/// Useful for testing or when events aren't needed.
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: WorkflowEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// A vector-based event sink that collects events
///
/// Useful for testing to verify events were emitted correctly.
#[derive(Default)]
pub struct VecEventSink {
    events: Mutex<Vec<WorkflowEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<WorkflowEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Get all collected events
    pub fn events(&self) -> Vec<WorkflowEvent> {
        self.lock().clone()
    }

    /// Clear all collected events
    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: WorkflowEvent) -> Result<(), EventError> {
        self.lock().push(event);
        Ok(())
    }
}
