//! Live validation of the canvas graph.
//!
//! Validators here never fail: every structural problem is reported as a
//! `ValidationError` so the UI can pinpoint it. Only the exporter turns
//! problems into hard errors.

pub mod connection;
pub mod document;
pub mod structural;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CompileOptions;
use crate::parse::graph::{FlowGraph, GraphDefect};
use crate::parse::types::FlowDocument;

pub use connection::validate_edge_connection;
pub use structural::validate_rule_group;

/// Error/warning taxonomy. The UI branches on the serialized `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    // Structure inside a group
    Cycle,
    Disconnected,
    OperatorInput,
    OperatorSingle,
    OperatorUnset,
    DeepNesting,

    // Connections
    InvalidConnection,
    ConnectionConditionToCondition,
    ConnectionOperatorToCondition,
    ConnectionFanOut,
    ConnectionDuplicate,
    ConnectionSelfLoop,

    // Initial (root) node
    InitialMissing,
    InitialMultiple,
    InitialNoName,
    InitialIncoming,
    InitialNoRules,

    // Rule groups
    RuleGroupNoName,
    RuleGroupMultipleNames,
    RuleGroupEmpty,
    RuleGroupUnreachable,

    // Action groups
    ActionGroupNoAction,
    ActionGroupIncomplete,

    // Condition payloads
    FieldIncomplete,
    ConditionInvalidOperator,

    // Containment
    GroupingOrphan,
    GroupingInvalidParent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_group_id: Option<String>,
}

impl ValidationError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        ValidationError {
            kind,
            message: message.into(),
            node_id: None,
            edge_id: None,
            rule_group_id: None,
            action_group_id: None,
        }
    }

    pub fn at_node(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    pub fn at_edge(mut self, edge_id: impl Into<String>) -> Self {
        self.edge_id = Some(edge_id.into());
        self
    }

    pub fn in_rule_group(mut self, group_id: impl Into<String>) -> Self {
        self.rule_group_id = Some(group_id.into());
        self
    }

    pub fn in_action_group(mut self, group_id: impl Into<String>) -> Self {
        self.action_group_id = Some(group_id.into());
        self
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = serde_json::to_value(self.kind)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        match &self.node_id {
            Some(id) => write!(f, "[{}] {} (node '{}')", kind, self.message, id),
            None => write!(f, "[{}] {}", kind, self.message),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn from_parts(errors: Vec<ValidationError>, warnings: Vec<ValidationError>) -> Self {
        ValidationResult {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.is_valid = self.errors.is_empty();
    }

    pub fn has_error(&self, kind: ErrorKind) -> bool {
        self.errors.iter().any(|e| e.kind == kind)
    }

    pub fn has_warning(&self, kind: ErrorKind) -> bool {
        self.warnings.iter().any(|e| e.kind == kind)
    }
}

/// Convert an indexing defect into the synthetic `invalid_connection` entry
/// reported by the live validators.
pub(crate) fn defect_to_error(defect: &GraphDefect) -> ValidationError {
    let error = ValidationError::new(ErrorKind::InvalidConnection, defect.message());
    match defect {
        GraphDefect::DanglingEdge { edge_id, .. } => error.at_edge(edge_id.clone()),
        GraphDefect::DuplicateNode { node_id } => error.at_node(node_id.clone()),
    }
}

/// Validate every group of an already-indexed graph and union the results.
pub fn validate_all_rule_groups(graph: &FlowGraph, options: &CompileOptions) -> ValidationResult {
    let mut result = ValidationResult::from_parts(vec![], vec![]);
    for group in graph.nodes().filter(|n| n.is_group()) {
        result.merge(validate_rule_group(graph, group.id(), options));
    }
    result
}

/// Whole-document validation: indexing defects, document checks, and every
/// group's structure.
pub fn validate_all(document: &FlowDocument, options: &CompileOptions) -> ValidationResult {
    let (graph, defects) = FlowGraph::build_lenient(document);

    let mut result = ValidationResult::from_parts(defects.iter().map(defect_to_error).collect(), vec![]);
    result.merge(document::validate_document(&graph));
    result.merge(validate_all_rule_groups(&graph, options));

    debug!(
        errors = result.errors.len(),
        warnings = result.warnings.len(),
        "validated rule graph"
    );
    result
}
