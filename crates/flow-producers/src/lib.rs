//! Flow Producers - content producers for flow-engine
//!
//! `OllamaProducer` talks to a local Ollama server; `render_prompt` builds
//! the prompt text any model-backed producer can reuse.

pub mod ollama;
pub mod prompt;

pub use ollama::{OllamaConfig, OllamaProducer};
pub use prompt::render_prompt;
