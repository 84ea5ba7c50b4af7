use rulegraph::parse::*;

// =============================================================================
// Node builders
// =============================================================================

fn base<D>(id: &str, parent: Option<&str>, data: D) -> NodeBase<D> {
    NodeBase {
        id: id.into(),
        parent_id: parent.map(str::to_string),
        position: None,
        data,
    }
}

pub fn root(id: &str, workflow_name: &str) -> FlowNode {
    FlowNode::Root(base(
        id,
        None,
        RootData {
            workflow_name: Some(workflow_name.into()),
            description: None,
        },
    ))
}

pub fn rule_group(id: &str) -> FlowNode {
    FlowNode::Group(base(
        id,
        None,
        GroupData {
            label: Some("Rule Group".into()),
        },
    ))
}

pub fn action_group(id: &str, parent: Option<&str>) -> FlowNode {
    FlowNode::Group(base(
        id,
        parent,
        GroupData {
            label: Some(ACTION_GROUP_LABEL.into()),
        },
    ))
}

pub fn rule_label(id: &str, group: &str, name: &str) -> FlowNode {
    FlowNode::RuleLabel(base(
        id,
        Some(group),
        RuleLabelData {
            rule_name: Some(name.into()),
        },
    ))
}

pub fn action_label(id: &str, group: &str, action_type: ActionType, name: &str) -> FlowNode {
    FlowNode::ActionLabel(base(
        id,
        Some(group),
        ActionLabelData {
            action_type: Some(action_type),
            action_name: Some(name.into()),
        },
    ))
}

pub fn condition(id: &str, group: &str, table: &str, field: &str, op: &str, value: &str) -> FlowNode {
    FlowNode::Condition(base(
        id,
        Some(group),
        ConditionData {
            table: Some(table.into()),
            field: Some(field.into()),
            operator: Some(op.into()),
            value: Some(value.into()),
            is_valid: Some(true),
        },
    ))
}

pub fn operator(id: &str, group: Option<&str>, op: Option<LogicalOperator>) -> FlowNode {
    FlowNode::Operator(base(
        id,
        group,
        OperatorData {
            operator: op,
            is_valid: None,
        },
    ))
}

pub fn and(id: &str, group: &str) -> FlowNode {
    operator(id, Some(group), Some(LogicalOperator::And))
}

pub fn or(id: &str, group: &str) -> FlowNode {
    operator(id, Some(group), Some(LogicalOperator::Or))
}

/// `sales.Amount > "1000"`
pub fn amount_over_1000(id: &str, group: &str) -> FlowNode {
    condition(id, group, "sales", "amount", ">", "1000")
}

/// `user.Designation = "Manager"`
pub fn is_manager(id: &str, group: &str) -> FlowNode {
    condition(id, group, "user", "designation", "=", "Manager")
}

/// `region.Code = "EU"`
pub fn in_eu(id: &str, group: &str) -> FlowNode {
    condition(id, group, "region", "code", "=", "EU")
}

pub const AMOUNT: &str = "sales.Amount > \"1000\"";
pub const MANAGER: &str = "user.Designation = \"Manager\"";
pub const EU: &str = "region.Code = \"EU\"";

// =============================================================================
// Edges and documents
// =============================================================================

pub fn edge(source: &str, target: &str) -> FlowEdge {
    FlowEdge {
        id: format!("e-{}-{}", source, target),
        source: source.into(),
        target: target.into(),
        source_handle: None,
        target_handle: None,
    }
}

pub fn document(nodes: Vec<FlowNode>, edges: Vec<FlowEdge>) -> FlowDocument {
    FlowDocument { nodes, edges }
}

pub fn graph(document: &FlowDocument) -> FlowGraph {
    FlowGraph::build(document).expect("test graph should index cleanly")
}

/// Group `g1` holding conditions `a` (amount) and `b` (manager) joined by AND
/// operator `op`, without a root.
pub fn and_group_nodes() -> (Vec<FlowNode>, Vec<FlowEdge>) {
    (
        vec![
            rule_group("g1"),
            rule_label("name1", "g1", "HighValueManager"),
            amount_over_1000("a", "g1"),
            is_manager("b", "g1"),
            and("op", "g1"),
        ],
        vec![edge("a", "op"), edge("b", "op")],
    )
}

/// Root "Comp1" → rule label → group `g1` with the A AND B sub-graph.
pub fn sales_manager_document() -> FlowDocument {
    let (mut nodes, mut edges) = and_group_nodes();
    nodes.insert(0, root("start", "Comp1"));
    edges.insert(0, edge("start", "name1"));
    document(nodes, edges)
}
