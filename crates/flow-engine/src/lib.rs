//! Flow Engine - graph model and runner for node-graph workflows
//!
//! This crate holds the parts of a visual workflow editor that do not
//! depend on any rendering technology:
//!
//! - `WorkflowGraph`: invariant-preserving node/edge store
//! - `ExecutionEngine`: sequential depth-first run from the root sources
//! - `ContentProducer`: the async seam to whatever generates text
//! - `EventSink`: progress streaming, not tied to any UI host
//!
//! # Example
//!
//! ```
//! use flow_engine::{ExecutionEngine, NodeKind, ScriptedProducer, WorkflowBuilder};
//!
//! let mut graph = WorkflowBuilder::new("wf", "Study pack")
//!     .add_node("notes", NodeKind::Source, "Study Notes", (0.0, 0.0))
//!     .with_content("Photosynthesis notes")
//!     .add_node("cards", NodeKind::Sink, "Flashcards", (300.0, 0.0))
//!     .connect("notes", "cards")
//!     .build();
//!
//! let engine = ExecutionEngine::default();
//! let report = tokio_test::block_on(engine.run(&mut graph, &ScriptedProducer::new())).unwrap();
//! assert_eq!(report.visits.len(), 2);
//! ```

pub mod builder;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod graph;
pub mod producer;
pub mod templates;
pub mod types;
pub mod validation;

// Re-export key types
pub use builder::WorkflowBuilder;
pub use config::EngineConfig;
pub use engine::{
    CancelHandle, ExecutionEngine, NodeOutcome, NodeVisit, RunReport, RunSession, RunningHandle,
};
pub use error::{EngineError, ProducerError, Result};
pub use events::{EventSink, NullEventSink, RunEndReason, VecEventSink, WorkflowEvent};
pub use graph::{EdgeOutcome, WorkflowGraph};
pub use producer::{ContentProducer, GenerationRequest, ScriptedProducer};
pub use templates::{node_library, seed_graph, NodeTemplate};
pub use types::{Edge, EdgeId, Node, NodeConfig, NodeId, NodeKind, NodeStatus, Point};
pub use validation::{validate_workflow, ValidationError};
