//! Parse phase: JSON → Rust types + graph construction.

pub mod graph;
pub mod types;

pub use graph::{FlowGraph, GraphDefect};
pub use types::*;

use crate::error::CompilerError;

/// Deserialize a canvas JSON string into a `FlowDocument`.
pub fn parse(json: &str) -> Result<FlowDocument, Vec<CompilerError>> {
    serde_json::from_str::<FlowDocument>(json).map_err(|e| {
        vec![CompilerError::parse(
            "P001",
            format!("Failed to parse rule graph JSON: {}", e),
        )]
    })
}

/// Parse JSON and build the strict graph index in one step.
pub fn parse_and_build(json: &str) -> Result<(FlowDocument, FlowGraph), Vec<CompilerError>> {
    let document = parse(json)?;
    let graph = FlowGraph::build(&document)?;
    Ok((document, graph))
}
