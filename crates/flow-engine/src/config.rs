//! Engine configuration
//!
//! Every knob has a default matching the reference behaviour: re-entrant
//! traversal, fallbacks reported as completed, no pacing between sources.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Default texts and limits
pub mod defaults {
    /// Output of a source node without content
    pub const SOURCE_PLACEHOLDER: &str = "No content provided.";
    /// Output of a transform node nothing fed
    pub const TRANSFORM_NO_INPUT: &str = "No input data found.";
    /// Output of a sink node nothing fed
    pub const SINK_NO_INPUT: &str = "No input to generate from.";
    /// Output of a transform node whose producer call failed
    pub const TRANSFORM_FALLBACK: &str = "Error processing content.";
    /// Output of a sink node whose producer call failed and has no canned text
    pub const SINK_FALLBACK: &str = "Generation failed.";
    /// Instruction given to the producer for transform nodes
    pub const TRANSFORM_INSTRUCTION: &str = "Extract key concepts";
}

/// Configuration for [`crate::ExecutionEngine`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Process each node at most once per run
    ///
    /// Off by default: a node reachable along several paths runs once per
    /// path, and a cyclic graph never terminates. Turning this on makes
    /// cyclic graphs terminate but also drops those repeat visits.
    pub cycle_guard: bool,
    /// Stop the run after this many node visits
    pub max_steps: Option<usize>,
    /// Mark nodes whose producer call failed as `error` instead of
    /// `completed` with fallback text
    pub strict_status: bool,
    /// Pause after each source node, in milliseconds
    pub source_delay_ms: u64,
    pub source_placeholder: String,
    pub transform_no_input: String,
    pub sink_no_input: String,
    pub transform_fallback: String,
    pub sink_fallback: String,
    /// Canned sink output per label, used instead of `sink_fallback`
    pub sink_fallbacks: HashMap<String, String>,
    /// Instruction for transform nodes without an `instruction` config entry
    pub transform_instruction: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cycle_guard: false,
            max_steps: None,
            strict_status: false,
            source_delay_ms: 0,
            source_placeholder: defaults::SOURCE_PLACEHOLDER.to_string(),
            transform_no_input: defaults::TRANSFORM_NO_INPUT.to_string(),
            sink_no_input: defaults::SINK_NO_INPUT.to_string(),
            transform_fallback: defaults::TRANSFORM_FALLBACK.to_string(),
            sink_fallback: defaults::SINK_FALLBACK.to_string(),
            sink_fallbacks: HashMap::new(),
            transform_instruction: defaults::TRANSFORM_INSTRUCTION.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn with_cycle_guard(mut self, enabled: bool) -> Self {
        self.cycle_guard = enabled;
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    pub fn with_strict_status(mut self, enabled: bool) -> Self {
        self.strict_status = enabled;
        self
    }

    pub fn with_source_delay_ms(mut self, delay_ms: u64) -> Self {
        self.source_delay_ms = delay_ms;
        self
    }

    /// Register canned output for a sink label
    pub fn with_sink_fallback(mut self, label: impl Into<String>, text: impl Into<String>) -> Self {
        self.sink_fallbacks.insert(label.into(), text.into());
        self
    }

    /// Fallback text for a sink with the given label
    pub fn sink_fallback_for(&self, label: &str) -> &str {
        self.sink_fallbacks
            .get(label)
            .map(String::as_str)
            .unwrap_or(&self.sink_fallback)
    }

    /// Instruction given to the producer for a sink with the given label
    pub fn sink_instruction(label: &str) -> String {
        format!("Create a {}", label)
    }
}
