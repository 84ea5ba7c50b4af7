//! Expression synthesis: a group's condition/operator sub-graph → one
//! boolean expression string.
//!
//! Every operator folds its operands into `(a) OP (b) ...`. Operators chain
//! serially, so an upstream operator's folded expression is carried forward
//! as one more operand of the next one. Independent sub-graphs inside the
//! same group ("valid groups") are combined at the end:
//! - one: its expression as is
//! - two: `(g1) OP (g2)`, where OP comes from an operator whose edges touch
//!   both of them, or AND when there is none
//! - three or more: joined with ` AND `, whatever operators are drawn

pub mod leaf;

use std::collections::{HashMap, HashSet};

use petgraph::graph::NodeIndex;
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;
use tracing::debug;

use crate::error::CompilerError;
use crate::parse::graph::FlowGraph;
use crate::parse::types::FlowNode;

use leaf::LeafExpression;

/// Synthesize the expression of one rule or action group.
pub fn generate_expression(graph: &FlowGraph, group_id: &str) -> Result<String, CompilerError> {
    let members = graph.group_members(group_id);

    if members.conditions.is_empty() {
        return Err(CompilerError::synthesize(
            "S004",
            format!("Group '{}' has no conditions to combine", group_id),
            Some(group_id.to_string()),
        ));
    }

    if members.is_single_condition() {
        return render_leaf(members.conditions[0]);
    }

    let mut member_indices: Vec<NodeIndex> =
        members.iter().filter_map(|n| graph.index_of(n.id())).collect();
    member_indices.sort();

    let synthesizer = Synthesizer {
        graph,
        members: member_indices.iter().copied().collect(),
    };

    let mut groups = Vec::new();
    for component in synthesizer.components(&member_indices) {
        if let Some(expression) = synthesizer.component_expression(&component, group_id)? {
            groups.push((component, expression));
        }
    }

    let expression = match groups.as_slice() {
        [] => {
            return Err(CompilerError::synthesize(
                "S004",
                format!("Group '{}' produced no expression", group_id),
                Some(group_id.to_string()),
            ));
        }
        [(_, only)] => only.clone(),
        [(first_nodes, first), (second_nodes, second)] => {
            let symbol = synthesizer
                .bridging_operator(first_nodes, second_nodes)
                .unwrap_or("AND");
            format!("({}) {} ({})", first, symbol, second)
        }
        _ => groups
            .iter()
            .map(|(_, e)| e.as_str())
            .collect::<Vec<_>>()
            .join(" AND "),
    };

    debug!(group = group_id, %expression, "synthesized group expression");
    Ok(expression)
}

fn render_leaf(node: &FlowNode) -> Result<String, CompilerError> {
    match node {
        FlowNode::Condition(c) => Ok(LeafExpression::from_condition(c)?.render()),
        other => Err(CompilerError::synthesize(
            "S001",
            format!("Node '{}' is not a condition", other.id()),
            Some(other.id().to_string()),
        )),
    }
}

struct Synthesizer<'g> {
    graph: &'g FlowGraph,
    members: HashSet<NodeIndex>,
}

impl<'g> Synthesizer<'g> {
    /// Weakly connected components of the member sub-graph, ordered by their
    /// first node in document order.
    fn components(&self, member_indices: &[NodeIndex]) -> Vec<Vec<NodeIndex>> {
        let mut sets = UnionFind::<usize>::new(self.graph.graph.node_count());
        for edge in self.graph.graph.edge_references() {
            if self.members.contains(&edge.source()) && self.members.contains(&edge.target()) {
                sets.union(edge.source().index(), edge.target().index());
            }
        }

        let mut order: Vec<usize> = Vec::new();
        let mut by_root: HashMap<usize, Vec<NodeIndex>> = HashMap::new();
        for &idx in member_indices {
            let root = sets.find(idx.index());
            if !by_root.contains_key(&root) {
                order.push(root);
            }
            by_root.entry(root).or_default().push(idx);
        }
        order
            .into_iter()
            .filter_map(|root| by_root.remove(&root))
            .collect()
    }

    /// Fold every sink of a component. `None` when the component holds only
    /// operators with nothing to combine.
    fn component_expression(
        &self,
        component: &[NodeIndex],
        group_id: &str,
    ) -> Result<Option<String>, CompilerError> {
        let sinks: Vec<&FlowNode> = component
            .iter()
            .map(|&idx| &self.graph.graph[idx])
            .filter(|node| self.is_sink(node))
            .collect();

        if sinks.is_empty() {
            let node_id = self.graph.graph[component[0]].id().to_string();
            return Err(CompilerError::synthesize(
                "S003",
                format!("Cycle detected in group '{}' at node '{}'", group_id, node_id),
                Some(node_id),
            ));
        }

        let mut folded = Vec::new();
        for sink in sinks {
            let expression = self.fold(sink, &mut HashSet::new())?;
            if !expression.is_empty() {
                folded.push(expression);
            }
        }

        Ok(match folded.len() {
            0 => None,
            1 => folded.pop(),
            _ => Some(parenthesize_join(&folded, "AND")),
        })
    }

    /// A node nothing downstream consumes: no member operator among its
    /// outgoers and, for conditions, no member operator pointing at it.
    fn is_sink(&self, node: &FlowNode) -> bool {
        let feeds_operator = self
            .graph
            .outgoers(node.id())
            .iter()
            .any(|n| n.is_operator() && self.is_member(n));
        if feeds_operator {
            return false;
        }
        if node.is_condition() {
            let claimed = self
                .graph
                .incomers(node.id())
                .iter()
                .any(|n| n.is_operator() && self.is_member(n));
            return !claimed;
        }
        true
    }

    fn is_member(&self, node: &FlowNode) -> bool {
        self.graph
            .index_of(node.id())
            .is_some_and(|idx| self.members.contains(&idx))
    }

    fn fold(&self, node: &FlowNode, visiting: &mut HashSet<String>) -> Result<String, CompilerError> {
        let FlowNode::Operator(op) = node else {
            return render_leaf(node);
        };

        if !visiting.insert(op.id.clone()) {
            return Err(CompilerError::synthesize(
                "S003",
                format!("Cycle detected at operator '{}'", op.id),
                Some(op.id.clone()),
            ));
        }

        let incomers = self.graph.incomers(&op.id);
        let upstream_operators = incomers
            .iter()
            .filter(|n| n.is_operator() && self.is_member(n));
        let input_conditions = incomers
            .iter()
            .filter(|n| n.is_condition() && self.is_member(n));
        let outgoers = self.graph.outgoers(&op.id);
        let claimed_conditions = outgoers
            .iter()
            .filter(|n| n.is_condition() && self.is_member(n));

        let mut operands = Vec::new();
        for operand in upstream_operators
            .chain(input_conditions)
            .chain(claimed_conditions)
        {
            let expression = self.fold(operand, visiting)?;
            if !expression.is_empty() {
                operands.push(expression);
            }
        }

        visiting.remove(&op.id);
        Ok(parenthesize_join(&operands, op.data.symbol()))
    }

    /// Symbol of an operator outside both groups whose edges touch each of them.
    fn bridging_operator(&self, first: &[NodeIndex], second: &[NodeIndex]) -> Option<&'g str> {
        let touches = |node: &FlowNode, group: &[NodeIndex]| {
            self.graph
                .incomers(node.id())
                .into_iter()
                .chain(self.graph.outgoers(node.id()))
                .filter_map(|n| self.graph.index_of(n.id()))
                .any(|idx| group.contains(&idx))
        };

        self.graph.nodes().find_map(|node| {
            let FlowNode::Operator(op) = node else {
                return None;
            };
            let idx = self.graph.index_of(&op.id)?;
            if first.contains(&idx) || second.contains(&idx) {
                return None;
            }
            (touches(node, first) && touches(node, second)).then(|| op.data.symbol())
        })
    }
}

fn parenthesize_join(parts: &[String], symbol: &str) -> String {
    parts
        .iter()
        .map(|p| format!("({})", p))
        .collect::<Vec<_>>()
        .join(&format!(" {} ", symbol))
}
