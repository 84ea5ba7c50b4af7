//! Admission check for a proposed edge, run before the edge is committed.

use tracing::debug;

use super::{ErrorKind, ValidationError, ValidationResult};
use crate::parse::graph::FlowGraph;
use crate::parse::types::FlowNode;

/// Decide whether `source → target` may be added to the graph. The graph is
/// not modified; the connection is admissible iff the result has no errors.
pub fn validate_edge_connection(graph: &FlowGraph, source: &str, target: &str) -> ValidationResult {
    let mut errors = Vec::new();

    let (Some(source_node), Some(target_node)) = (graph.node(source), graph.node(target)) else {
        for missing in [source, target] {
            if graph.node(missing).is_none() {
                errors.push(
                    ValidationError::new(
                        ErrorKind::InvalidConnection,
                        format!("Cannot connect to unknown node '{}'", missing),
                    )
                    .at_node(missing),
                );
            }
        }
        return ValidationResult::from_parts(errors, vec![]);
    };

    match (source_node, target_node) {
        (FlowNode::Condition(_), FlowNode::Condition(_)) => errors.push(
            ValidationError::new(
                ErrorKind::ConnectionConditionToCondition,
                "Conditions cannot be connected directly to each other",
            )
            .at_node(source),
        ),
        (FlowNode::Operator(_), FlowNode::Condition(_)) => errors.push(
            ValidationError::new(
                ErrorKind::ConnectionOperatorToCondition,
                "An operator cannot feed back into a condition",
            )
            .at_node(source),
        ),
        _ => {}
    }

    // The initial node fans out to every rule; everything else drives one node.
    if !source_node.is_root() && graph.outgoing_edge_count(source) >= 1 {
        errors.push(
            ValidationError::new(
                ErrorKind::ConnectionFanOut,
                format!("Node '{}' already has an outgoing connection", source),
            )
            .at_node(source),
        );
    }

    // With source → target added, a path target ⇝ source closes a cycle.
    if graph.has_path(target, source) {
        errors.push(
            ValidationError::new(
                ErrorKind::Cycle,
                format!("Connecting '{}' to '{}' would create a cycle", source, target),
            )
            .at_node(source),
        );
    }

    let result = ValidationResult::from_parts(errors, vec![]);
    debug!(source, target, admitted = result.is_valid, "checked connection");
    result
}
