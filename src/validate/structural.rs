//! Per-group structural validation: cycles, operator arity, disconnected
//! nodes and nesting depth.

use std::collections::HashSet;

use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::visit::{Control, DfsEvent, depth_first_search};

use super::{ErrorKind, ValidationError, ValidationResult};
use crate::config::CompileOptions;
use crate::parse::graph::FlowGraph;
use crate::parse::types::FlowNode;

/// Validate the condition/operator sub-graph of one group.
///
/// Works for rule groups and action groups alike; errors are tagged with the
/// matching group id field. Ids that do not name a group yield an empty,
/// valid result.
pub fn validate_rule_group(
    graph: &FlowGraph,
    group_id: &str,
    options: &CompileOptions,
) -> ValidationResult {
    if !graph.node(group_id).is_some_and(FlowNode::is_group) {
        return ValidationResult::from_parts(vec![], vec![]);
    }

    let scope = GroupScope {
        group_id,
        is_action: graph.is_action_group(group_id),
    };
    let members = graph.group_members(group_id);

    // A bare single-condition rule needs no combination logic.
    if members.is_single_condition() || members.is_empty() {
        return ValidationResult::from_parts(vec![], vec![]);
    }

    let member_set: HashSet<NodeIndex> = members
        .iter()
        .filter_map(|n| graph.index_of(n.id()))
        .collect();

    let has_member_incomer = |idx: NodeIndex| {
        graph
            .graph
            .neighbors_directed(idx, Direction::Incoming)
            .any(|n| member_set.contains(&n))
    };
    // A member with no flow edge to another member is an island: it never
    // starts a walk, so it ends up reported as disconnected.
    let is_linked = |idx: NodeIndex| {
        graph
            .graph
            .neighbors_undirected(idx)
            .any(|n| n != idx && member_set.contains(&n))
    };

    // Sources are linked conditions nothing in the group feeds, plus operators
    // that only point out at their conditions (older canvas layout).
    let sources: Vec<NodeIndex> = members
        .iter()
        .filter_map(|n| graph.index_of(n.id()).map(|idx| (n, idx)))
        .filter(|&(node, idx)| {
            if !is_linked(idx) || has_member_incomer(idx) {
                return false;
            }
            match node {
                FlowNode::Condition(_) => true,
                FlowNode::Operator(_) => graph
                    .graph
                    .neighbors_directed(idx, Direction::Outgoing)
                    .any(|n| member_set.contains(&n) && graph.graph[n].is_condition()),
                _ => false,
            }
        })
        .map(|(_, idx)| idx)
        .collect();

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let walk = walk_from(graph, &member_set, &HashSet::new(), sources, options);
    let mut cyclic = walk.back_edge_targets;

    // Unreached members, islands included, are reported as disconnected
    // below, but a cycle among them is still a cycle.
    let unreached: Vec<NodeIndex> = members
        .iter()
        .filter_map(|n| graph.index_of(n.id()))
        .filter(|idx| !walk.visited.contains(idx))
        .collect();
    if !unreached.is_empty() {
        let island_walk = walk_from(graph, &member_set, &walk.visited, unreached, options);
        for idx in island_walk.back_edge_targets {
            if !cyclic.contains(&idx) {
                cyclic.push(idx);
            }
        }
    }

    for idx in cyclic {
        let node_id = graph.graph[idx].id();
        errors.push(scope.tag(
            ValidationError::new(
                ErrorKind::Cycle,
                format!(
                    "Cycle detected in group '{}' at node '{}'",
                    group_id, node_id
                ),
            )
            .at_node(node_id),
        ));
    }

    for operator in &members.operators {
        let operands = effective_operand_count(graph, operator.id());
        if operands < 2 {
            let (kind, message) = if operands == 0 {
                (
                    ErrorKind::OperatorInput,
                    format!("Operator '{}' has no inputs", operator.id()),
                )
            } else {
                (
                    ErrorKind::OperatorSingle,
                    format!(
                        "Operator '{}' needs at least two inputs, found 1",
                        operator.id()
                    ),
                )
            };
            errors.push(scope.tag(ValidationError::new(kind, message).at_node(operator.id())));
        }
    }

    for child in graph.children(group_id) {
        if !child.is_logic() {
            continue;
        }
        let reached = graph
            .index_of(child.id())
            .is_some_and(|idx| walk.visited.contains(&idx));
        if !reached {
            errors.push(scope.tag(
                ValidationError::new(
                    ErrorKind::Disconnected,
                    format!(
                        "Node '{}' is not connected to the rest of group '{}'",
                        child.id(),
                        group_id
                    ),
                )
                .at_node(child.id()),
            ));
        }
    }

    if let Some(idx) = walk.too_deep_at {
        warnings.push(scope.tag(
            ValidationError::new(
                ErrorKind::DeepNesting,
                format!(
                    "Group '{}' nests deeper than {} levels",
                    group_id, options.deep_nesting_threshold
                ),
            )
            .at_node(graph.graph[idx].id()),
        ));
    }

    ValidationResult::from_parts(errors, warnings)
}

/// Operands of an operator: incoming conditions/operators plus, for
/// compatibility with older canvases, outgoing edges that point at a condition.
pub fn effective_operand_count(graph: &FlowGraph, operator_id: &str) -> usize {
    let incoming = graph
        .incomers(operator_id)
        .iter()
        .filter(|n| n.is_logic())
        .count();
    let outgoing = graph
        .outgoers(operator_id)
        .iter()
        .filter(|n| n.is_condition())
        .count();
    incoming + outgoing
}

struct GroupScope<'a> {
    group_id: &'a str,
    is_action: bool,
}

impl GroupScope<'_> {
    fn tag(&self, error: ValidationError) -> ValidationError {
        if self.is_action {
            error.in_action_group(self.group_id)
        } else {
            error.in_rule_group(self.group_id)
        }
    }
}

struct Walk {
    visited: HashSet<NodeIndex>,
    back_edge_targets: Vec<NodeIndex>,
    too_deep_at: Option<NodeIndex>,
}

/// Depth-first walk restricted to `members`, never entering `excluded`.
fn walk_from(
    graph: &FlowGraph,
    members: &HashSet<NodeIndex>,
    excluded: &HashSet<NodeIndex>,
    starts: Vec<NodeIndex>,
    options: &CompileOptions,
) -> Walk {
    let mut visited = HashSet::new();
    let mut back_edge_targets = Vec::new();
    let mut too_deep_at = None;
    let mut depth = 0usize;

    depth_first_search(&graph.graph, starts, |event| {
        match event {
            DfsEvent::TreeEdge(_, v) if !members.contains(&v) || excluded.contains(&v) => {
                return Control::<()>::Prune;
            }
            DfsEvent::Discover(n, _) => {
                visited.insert(n);
                depth += 1;
                if depth > options.deep_nesting_threshold && too_deep_at.is_none() {
                    too_deep_at = Some(n);
                }
            }
            DfsEvent::Finish(_, _) => depth -= 1,
            DfsEvent::BackEdge(_, v) => {
                if !back_edge_targets.contains(&v) {
                    back_edge_targets.push(v);
                }
            }
            _ => {}
        }
        Control::Continue
    });

    Walk {
        visited,
        back_edge_targets,
        too_deep_at,
    }
}
