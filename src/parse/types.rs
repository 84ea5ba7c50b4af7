//! Rust types mirroring the rule-builder canvas model.
//!
//! These types are the serde target for the frontend graph JSON. Every payload
//! field is optional on the wire: nodes are saved while the user is still
//! filling them in, and the validators report what is missing.

use serde::{Deserialize, Serialize};

// =============================================================================
// TOP-LEVEL DOCUMENT
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowDocument {
    #[serde(default)]
    pub nodes: Vec<FlowNode>,
    #[serde(default)]
    pub edges: Vec<FlowEdge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

// =============================================================================
// NODE BASE
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeBase<D> {
    pub id: String,
    /// Enclosing group node. Visual containment only, never logical flow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    pub data: D,
}

// =============================================================================
// FLOW NODE: tagged union over the six canvas node kinds
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FlowNode {
    #[serde(rename = "initial")]
    Root(NodeBase<RootData>),
    #[serde(rename = "condition")]
    Condition(NodeBase<ConditionData>),
    #[serde(rename = "conditionalOperator")]
    Operator(NodeBase<OperatorData>),
    #[serde(rename = "resizableGroup")]
    Group(NodeBase<GroupData>),
    #[serde(rename = "ruleName")]
    RuleLabel(NodeBase<RuleLabelData>),
    #[serde(rename = "actionName")]
    ActionLabel(NodeBase<ActionLabelData>),
}

/// Payload-free discriminant of a [`FlowNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Root,
    Condition,
    Operator,
    Group,
    RuleLabel,
    ActionLabel,
}

impl FlowNode {
    pub fn id(&self) -> &str {
        match self {
            FlowNode::Root(n) => &n.id,
            FlowNode::Condition(n) => &n.id,
            FlowNode::Operator(n) => &n.id,
            FlowNode::Group(n) => &n.id,
            FlowNode::RuleLabel(n) => &n.id,
            FlowNode::ActionLabel(n) => &n.id,
        }
    }

    pub fn parent_id(&self) -> Option<&str> {
        match self {
            FlowNode::Root(n) => n.parent_id.as_deref(),
            FlowNode::Condition(n) => n.parent_id.as_deref(),
            FlowNode::Operator(n) => n.parent_id.as_deref(),
            FlowNode::Group(n) => n.parent_id.as_deref(),
            FlowNode::RuleLabel(n) => n.parent_id.as_deref(),
            FlowNode::ActionLabel(n) => n.parent_id.as_deref(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            FlowNode::Root(_) => NodeKind::Root,
            FlowNode::Condition(_) => NodeKind::Condition,
            FlowNode::Operator(_) => NodeKind::Operator,
            FlowNode::Group(_) => NodeKind::Group,
            FlowNode::RuleLabel(_) => NodeKind::RuleLabel,
            FlowNode::ActionLabel(_) => NodeKind::ActionLabel,
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, FlowNode::Root(_))
    }

    pub fn is_condition(&self) -> bool {
        matches!(self, FlowNode::Condition(_))
    }

    pub fn is_operator(&self) -> bool {
        matches!(self, FlowNode::Operator(_))
    }

    pub fn is_group(&self) -> bool {
        matches!(self, FlowNode::Group(_))
    }

    /// Conditions and operators make up the boolean sub-graph of a group.
    pub fn is_logic(&self) -> bool {
        matches!(self, FlowNode::Condition(_) | FlowNode::Operator(_))
    }
}

// =============================================================================
// PAYLOADS
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootData {
    #[serde(default)]
    pub workflow_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionData {
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
    /// Comparison operator as typed by the user; see `synthesize::leaf::ComparisonOp`.
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub is_valid: Option<bool>,
}

impl ConditionData {
    /// Names of the leaf fields that are absent or blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(&self.table) {
            missing.push("table");
        }
        if is_blank(&self.field) {
            missing.push("field");
        }
        if is_blank(&self.operator) {
            missing.push("operator");
        }
        if is_blank(&self.value) {
            missing.push("value");
        }
        missing
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOperator {
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
    #[serde(rename = "NOT")]
    Not,
}

impl LogicalOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
            LogicalOperator::Not => "NOT",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorData {
    #[serde(default)]
    pub operator: Option<LogicalOperator>,
    #[serde(default)]
    pub is_valid: Option<bool>,
}

impl OperatorData {
    /// The combinator symbol, falling back to AND when the user never picked one.
    pub fn symbol(&self) -> &'static str {
        self.operator.unwrap_or(LogicalOperator::And).symbol()
    }
}

/// Label carried by groups that hold an action rather than a rule.
pub const ACTION_GROUP_LABEL: &str = "Action Group";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupData {
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleLabelData {
    #[serde(default)]
    pub rule_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ActionType {
    OnSuccess,
    OnFailure,
    OnError,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionLabelData {
    #[serde(default)]
    pub action_type: Option<ActionType>,
    #[serde(default)]
    pub action_name: Option<String>,
}

pub(crate) fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).unwrap_or("").is_empty()
}
