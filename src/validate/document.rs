//! Document-level checks that do not belong to a single group's flow graph:
//! the initial node, group labels, condition payloads, containment and
//! connection hygiene.

use std::collections::HashSet;

use super::{ErrorKind, ValidationError, ValidationResult};
use crate::parse::graph::FlowGraph;
use crate::parse::types::{FlowNode, is_blank};
use crate::synthesize::leaf::ComparisonOp;

/// Run every document-level check.
pub fn validate_document(graph: &FlowGraph) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    check_initial_node(graph, &mut errors, &mut warnings);
    check_rule_groups(graph, &mut errors, &mut warnings);
    check_action_groups(graph, &mut errors);
    check_conditions(graph, &mut errors);
    check_operators(graph, &mut warnings);
    check_containment(graph, &mut errors);
    check_duplicate_edges(graph, &mut errors);
    check_self_loops(graph, &mut errors);

    ValidationResult::from_parts(errors, warnings)
}

fn check_initial_node(
    graph: &FlowGraph,
    errors: &mut Vec<ValidationError>,
    warnings: &mut Vec<ValidationError>,
) {
    let roots = graph.root_nodes();
    match roots.len() {
        0 => {
            errors.push(ValidationError::new(
                ErrorKind::InitialMissing,
                "The workflow needs an initial node",
            ));
            return;
        }
        1 => {}
        n => {
            for extra in &roots[1..] {
                errors.push(
                    ValidationError::new(
                        ErrorKind::InitialMultiple,
                        format!("Only one initial node is allowed, found {}", n),
                    )
                    .at_node(extra.id()),
                );
            }
        }
    }

    for root in roots {
        let FlowNode::Root(r) = root else { continue };
        if is_blank(&r.data.workflow_name) {
            errors.push(
                ValidationError::new(ErrorKind::InitialNoName, "Workflow name is required")
                    .at_node(root.id()),
            );
        }
        if graph.incoming_edge_count(root.id()) > 0 {
            errors.push(
                ValidationError::new(
                    ErrorKind::InitialIncoming,
                    format!("Initial node '{}' must not have incoming edges", root.id()),
                )
                .at_node(root.id()),
            );
        }
        let drives_rule = graph
            .outgoers(root.id())
            .iter()
            .any(|n| matches!(n, FlowNode::RuleLabel(_)));
        if !drives_rule {
            warnings.push(
                ValidationError::new(
                    ErrorKind::InitialNoRules,
                    "Initial node is not connected to any rule",
                )
                .at_node(root.id()),
            );
        }
    }
}

fn check_rule_groups(
    graph: &FlowGraph,
    errors: &mut Vec<ValidationError>,
    warnings: &mut Vec<ValidationError>,
) {
    let connected_groups: HashSet<&str> = graph
        .root_nodes()
        .iter()
        .flat_map(|root| graph.outgoers(root.id()))
        .filter(|n| matches!(n, FlowNode::RuleLabel(_)))
        .filter_map(|label| label.parent_id())
        .collect();

    for group in graph.nodes().filter(|n| n.is_group()) {
        if graph.is_action_group(group.id()) {
            continue;
        }
        let children = graph.children(group.id());
        let labels: Vec<&FlowNode> = children
            .iter()
            .copied()
            .filter(|n| matches!(n, FlowNode::RuleLabel(_)))
            .collect();

        match labels.as_slice() {
            [] => errors.push(
                ValidationError::new(
                    ErrorKind::RuleGroupNoName,
                    format!("Rule group '{}' has no rule name", group.id()),
                )
                .at_node(group.id())
                .in_rule_group(group.id()),
            ),
            [FlowNode::RuleLabel(label)] => {
                if is_blank(&label.data.rule_name) {
                    errors.push(
                        ValidationError::new(ErrorKind::RuleGroupNoName, "Rule name is required")
                            .at_node(label.id.clone())
                            .in_rule_group(group.id()),
                    );
                }
            }
            [_, extra @ ..] => {
                for label in extra {
                    errors.push(
                        ValidationError::new(
                            ErrorKind::RuleGroupMultipleNames,
                            format!("Rule group '{}' has more than one rule name", group.id()),
                        )
                        .at_node(label.id())
                        .in_rule_group(group.id()),
                    );
                }
            }
        }

        if !children.iter().any(|n| n.is_condition()) {
            warnings.push(
                ValidationError::new(
                    ErrorKind::RuleGroupEmpty,
                    format!("Rule group '{}' has no conditions", group.id()),
                )
                .at_node(group.id())
                .in_rule_group(group.id()),
            );
        }

        if !connected_groups.contains(group.id()) {
            warnings.push(
                ValidationError::new(
                    ErrorKind::RuleGroupUnreachable,
                    format!("Rule group '{}' is not connected to the initial node", group.id()),
                )
                .at_node(group.id())
                .in_rule_group(group.id()),
            );
        }
    }
}

fn check_action_groups(graph: &FlowGraph, errors: &mut Vec<ValidationError>) {
    for group in graph.nodes().filter(|n| n.is_group()) {
        if !graph.is_action_group(group.id()) {
            continue;
        }
        let label = graph.children(group.id()).into_iter().find_map(|n| match n {
            FlowNode::ActionLabel(a) => Some(a),
            _ => None,
        });
        let Some(label) = label else {
            errors.push(
                ValidationError::new(
                    ErrorKind::ActionGroupNoAction,
                    format!("Action group '{}' has no action", group.id()),
                )
                .at_node(group.id())
                .in_action_group(group.id()),
            );
            continue;
        };

        let mut missing = Vec::new();
        if label.data.action_type.is_none() {
            missing.push("action type");
        }
        if is_blank(&label.data.action_name) {
            missing.push("action name");
        }
        if !missing.is_empty() {
            errors.push(
                ValidationError::new(
                    ErrorKind::ActionGroupIncomplete,
                    format!("Action is missing {}", missing.join(" and ")),
                )
                .at_node(label.id.clone())
                .in_action_group(group.id()),
            );
        }
    }
}

fn check_conditions(graph: &FlowGraph, errors: &mut Vec<ValidationError>) {
    for node in graph.nodes() {
        let FlowNode::Condition(c) = node else { continue };
        let missing = c.data.missing_fields();
        if !missing.is_empty() {
            errors.push(with_group(
                graph,
                ValidationError::new(
                    ErrorKind::FieldIncomplete,
                    format!("Condition is missing {}", missing.join(", ")),
                )
                .at_node(node.id()),
                node,
            ));
            continue;
        }
        if let Some(op) = c.data.operator.as_deref() {
            if ComparisonOp::parse(op).is_none() {
                errors.push(with_group(
                    graph,
                    ValidationError::new(
                        ErrorKind::ConditionInvalidOperator,
                        format!("Unknown comparison operator '{}'", op),
                    )
                    .at_node(node.id()),
                    node,
                ));
            }
        }
    }
}

fn check_operators(graph: &FlowGraph, warnings: &mut Vec<ValidationError>) {
    for node in graph.nodes() {
        let FlowNode::Operator(o) = node else { continue };
        if o.data.operator.is_none() {
            warnings.push(with_group(
                graph,
                ValidationError::new(
                    ErrorKind::OperatorUnset,
                    "No logical operator selected, AND will be used",
                )
                .at_node(node.id()),
                node,
            ));
        }
    }
}

fn check_containment(graph: &FlowGraph, errors: &mut Vec<ValidationError>) {
    for node in graph.nodes().filter(|n| n.is_logic()) {
        match node.parent_id() {
            None => errors.push(
                ValidationError::new(
                    ErrorKind::GroupingOrphan,
                    format!("Node '{}' must be placed inside a group", node.id()),
                )
                .at_node(node.id()),
            ),
            Some(parent) if !graph.node(parent).is_some_and(FlowNode::is_group) => errors.push(
                ValidationError::new(
                    ErrorKind::GroupingInvalidParent,
                    format!("Node '{}' is nested in '{}', which is not a group", node.id(), parent),
                )
                .at_node(node.id()),
            ),
            Some(_) => {}
        }
    }
}

fn check_duplicate_edges(graph: &FlowGraph, errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();
    for edge in &graph.edges {
        if !seen.insert((edge.source.as_str(), edge.target.as_str())) {
            errors.push(
                ValidationError::new(
                    ErrorKind::ConnectionDuplicate,
                    format!("Duplicate edge from '{}' to '{}'", edge.source, edge.target),
                )
                .at_edge(edge.id.clone()),
            );
        }
    }
}

fn check_self_loops(graph: &FlowGraph, errors: &mut Vec<ValidationError>) {
    for edge in &graph.edges {
        if edge.source == edge.target {
            errors.push(
                ValidationError::new(
                    ErrorKind::ConnectionSelfLoop,
                    format!("Self-loop detected on node '{}'", edge.source),
                )
                .at_node(edge.source.clone())
                .at_edge(edge.id.clone()),
            );
        }
    }
}

/// Attach the enclosing group id, rule or action, when the node has one.
fn with_group(graph: &FlowGraph, error: ValidationError, node: &FlowNode) -> ValidationError {
    match node.parent_id() {
        Some(parent) if graph.is_action_group(parent) => error.in_action_group(parent),
        Some(parent) if graph.node(parent).is_some_and(FlowNode::is_group) => {
            error.in_rule_group(parent)
        }
        _ => error,
    }
}
