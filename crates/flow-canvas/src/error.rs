//! Error types for editor commands

use flow_engine::{EngineError, NodeId};
use thiserror::Error;

/// Result type alias using CanvasError
pub type Result<T> = std::result::Result<T, CanvasError>;

/// Errors returned by `Editor` commands
///
/// Pointer handling never fails; these cover toolbar-style commands that
/// need a target or touch the filesystem.
#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// The command acts on the selected node and nothing is selected
    #[error("No node selected")]
    NoSelection,

    #[error("Node {0} has no output to export")]
    NoOutput(NodeId),
}
