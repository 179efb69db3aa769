//! Content producer seam
//!
//! The engine does not know how text is generated. Anything that can turn
//! an input text plus a formatting intent into new text implements
//! [`ContentProducer`]: a remote model, a cache, or a scripted stand-in.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProducerError;

/// One generation request issued by the engine for a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// Upstream text the node received
    pub input: String,
    /// Output shape hint, e.g. "Flashcards"
    pub format_label: String,
    /// What the producer should do with the input
    pub instruction: String,
}

impl GenerationRequest {
    pub fn new(
        input: impl Into<String>,
        format_label: impl Into<String>,
        instruction: impl Into<String>,
    ) -> Self {
        Self {
            input: input.into(),
            format_label: format_label.into(),
            instruction: instruction.into(),
        }
    }
}

/// Async text generation capability consumed by the engine
///
/// Failures are recoverable: the engine substitutes fallback text for the
/// node and keeps going.
#[async_trait]
pub trait ContentProducer: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProducerError>;
}

type Responder = Box<dyn Fn(&GenerationRequest) -> String + Send + Sync>;

/// A deterministic producer that records every request
///
/// Answers with `"[{format_label}] {input}"` unless a custom responder is
/// installed, and fails for any format label registered via `fail_for`.
/// Useful for tests and offline demos.
pub struct ScriptedProducer {
    responder: Responder,
    failing_labels: HashSet<String>,
    calls: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedProducer {
    pub fn new() -> Self {
        Self {
            responder: Box::new(|req| format!("[{}] {}", req.format_label, req.input)),
            failing_labels: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Replace the default echo responder
    pub fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: Fn(&GenerationRequest) -> String + Send + Sync + 'static,
    {
        self.responder = Box::new(responder);
        self
    }

    /// Reject every request whose format label matches
    pub fn fail_for(mut self, format_label: impl Into<String>) -> Self {
        self.failing_labels.insert(format_label.into());
        self
    }

    fn lock(&self) -> MutexGuard<'_, Vec<GenerationRequest>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Every request received so far, in order
    pub fn calls(&self) -> Vec<GenerationRequest> {
        self.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().len()
    }
}

impl Default for ScriptedProducer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentProducer for ScriptedProducer {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProducerError> {
        self.lock().push(request.clone());
        if self.failing_labels.contains(&request.format_label) {
            return Err(ProducerError::rejected(format!(
                "scripted failure for '{}'",
                request.format_label
            )));
        }
        Ok((self.responder)(request))
    }
}
