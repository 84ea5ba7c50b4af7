//! petgraph-based index over the canvas graph.
//!
//! Two relations are kept apart: the directed flow graph (edges) and the
//! containment tree (`parentId`). Validators and the synthesizer consult both
//! explicitly.

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};

use super::types::{ACTION_GROUP_LABEL, FlowDocument, FlowEdge, FlowNode};
use crate::error::CompilerError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeLabel {
    pub id: String,
    pub source_handle: Option<String>,
    pub target_handle: Option<String>,
}

/// Inconsistency in the raw collections that prevents a node or edge from
/// being indexed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphDefect {
    DanglingEdge {
        edge_id: String,
        missing_node_id: String,
    },
    DuplicateNode {
        node_id: String,
    },
}

impl GraphDefect {
    pub fn message(&self) -> String {
        match self {
            GraphDefect::DanglingEdge {
                edge_id,
                missing_node_id,
            } => format!(
                "Edge '{}' references unknown node '{}'",
                edge_id, missing_node_id
            ),
            GraphDefect::DuplicateNode { node_id } => {
                format!("Node id '{}' is used more than once", node_id)
            }
        }
    }
}

impl From<GraphDefect> for CompilerError {
    fn from(defect: GraphDefect) -> Self {
        let message = defect.message();
        match defect {
            GraphDefect::DanglingEdge { .. } => CompilerError::parse("P002", message),
            GraphDefect::DuplicateNode { node_id } => CompilerError {
                node_id: Some(node_id),
                ..CompilerError::parse("P003", message)
            },
        }
    }
}

pub struct FlowGraph {
    pub graph: DiGraph<FlowNode, EdgeLabel>,
    pub node_indices: HashMap<String, NodeIndex>,
    /// Edges that made it into `graph`, in document order.
    pub edges: Vec<FlowEdge>,
    children: HashMap<String, Vec<NodeIndex>>,
}

impl FlowGraph {
    /// Index a document, failing on any dangling edge or duplicate node id.
    pub fn build(document: &FlowDocument) -> Result<Self, Vec<CompilerError>> {
        let (graph, defects) = Self::build_lenient(document);
        if defects.is_empty() {
            Ok(graph)
        } else {
            Err(defects.into_iter().map(CompilerError::from).collect())
        }
    }

    /// Index whatever is consistent and hand back the rest as defects.
    /// Duplicate node ids keep their first occurrence.
    pub fn build_lenient(document: &FlowDocument) -> (Self, Vec<GraphDefect>) {
        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::new();
        let mut children: HashMap<String, Vec<NodeIndex>> = HashMap::new();
        let mut edges = Vec::new();
        let mut defects = Vec::new();

        for node in &document.nodes {
            if node_indices.contains_key(node.id()) {
                defects.push(GraphDefect::DuplicateNode {
                    node_id: node.id().to_string(),
                });
                continue;
            }
            let idx = graph.add_node(node.clone());
            node_indices.insert(node.id().to_string(), idx);
            if let Some(parent) = node.parent_id() {
                children.entry(parent.to_string()).or_default().push(idx);
            }
        }

        for edge in &document.edges {
            let source_idx = node_indices.get(&edge.source);
            let target_idx = node_indices.get(&edge.target);

            match (source_idx, target_idx) {
                (Some(&s), Some(&t)) => {
                    graph.add_edge(
                        s,
                        t,
                        EdgeLabel {
                            id: edge.id.clone(),
                            source_handle: edge.source_handle.clone(),
                            target_handle: edge.target_handle.clone(),
                        },
                    );
                    edges.push(edge.clone());
                }
                (None, _) => defects.push(GraphDefect::DanglingEdge {
                    edge_id: edge.id.clone(),
                    missing_node_id: edge.source.clone(),
                }),
                (_, None) => defects.push(GraphDefect::DanglingEdge {
                    edge_id: edge.id.clone(),
                    missing_node_id: edge.target.clone(),
                }),
            }
        }

        (
            FlowGraph {
                graph,
                node_indices,
                edges,
                children,
            },
            defects,
        )
    }

    pub fn node(&self, node_id: &str) -> Option<&FlowNode> {
        self.node_indices.get(node_id).map(|&idx| &self.graph[idx])
    }

    pub fn index_of(&self, node_id: &str) -> Option<NodeIndex> {
        self.node_indices.get(node_id).copied()
    }

    /// All indexed nodes in document order.
    pub fn nodes(&self) -> impl Iterator<Item = &FlowNode> {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    /// Nodes with an edge whose target is `node_id`, deduplicated, in document order.
    pub fn incomers(&self, node_id: &str) -> Vec<&FlowNode> {
        self.neighbors(node_id, Direction::Incoming)
    }

    /// Nodes with an edge whose source is `node_id`, deduplicated, in document order.
    pub fn outgoers(&self, node_id: &str) -> Vec<&FlowNode> {
        self.neighbors(node_id, Direction::Outgoing)
    }

    fn neighbors(&self, node_id: &str, direction: Direction) -> Vec<&FlowNode> {
        let Some(&idx) = self.node_indices.get(node_id) else {
            return vec![];
        };
        let mut indices: Vec<NodeIndex> =
            self.graph.neighbors_directed(idx, direction).collect();
        indices.sort();
        indices.dedup();
        indices.into_iter().map(|n| &self.graph[n]).collect()
    }

    pub fn outgoing_edge_count(&self, node_id: &str) -> usize {
        self.edge_count(node_id, Direction::Outgoing)
    }

    pub fn incoming_edge_count(&self, node_id: &str) -> usize {
        self.edge_count(node_id, Direction::Incoming)
    }

    fn edge_count(&self, node_id: &str, direction: Direction) -> usize {
        self.node_indices
            .get(node_id)
            .map(|&idx| self.graph.edges_directed(idx, direction).count())
            .unwrap_or(0)
    }

    /// Nodes whose `parentId` is `group_id`, in document order.
    pub fn children(&self, group_id: &str) -> Vec<&FlowNode> {
        self.children
            .get(group_id)
            .map(|indices| indices.iter().map(|&idx| &self.graph[idx]).collect())
            .unwrap_or_default()
    }

    /// Whether `to` is reachable from `from` along flow edges. A node reaches itself.
    pub fn has_path(&self, from: &str, to: &str) -> bool {
        match (self.index_of(from), self.index_of(to)) {
            (Some(a), Some(b)) => has_path_connecting(&self.graph, a, b, None),
            _ => false,
        }
    }

    pub fn root_nodes(&self) -> Vec<&FlowNode> {
        self.nodes().filter(|n| n.is_root()).collect()
    }

    /// A group holds an action when it is labeled as one or contains an action label.
    pub fn is_action_group(&self, group_id: &str) -> bool {
        let labeled = match self.node(group_id) {
            Some(FlowNode::Group(g)) => g.data.label.as_deref() == Some(ACTION_GROUP_LABEL),
            _ => return false,
        };
        labeled
            || self
                .children(group_id)
                .iter()
                .any(|n| matches!(n, FlowNode::ActionLabel(_)))
    }

    /// Conditions and operators that make up a group's boolean sub-graph.
    ///
    /// Conditions are the group's direct children. Operators are either direct
    /// children or reached by an edge leaving the group node itself; both
    /// placements are legal.
    pub fn group_members(&self, group_id: &str) -> GroupMembers<'_> {
        let mut conditions = Vec::new();
        let mut operator_indices = Vec::new();

        for child in self.children(group_id) {
            match child {
                FlowNode::Condition(_) => conditions.push(child),
                FlowNode::Operator(_) => operator_indices.extend(self.index_of(child.id())),
                _ => {}
            }
        }
        for target in self.outgoers(group_id) {
            if target.is_operator() {
                operator_indices.extend(self.index_of(target.id()));
            }
        }
        operator_indices.sort();
        operator_indices.dedup();

        GroupMembers {
            conditions,
            operators: operator_indices
                .into_iter()
                .map(|idx| &self.graph[idx])
                .collect(),
        }
    }
}

pub struct GroupMembers<'g> {
    pub conditions: Vec<&'g FlowNode>,
    pub operators: Vec<&'g FlowNode>,
}

impl<'g> GroupMembers<'g> {
    pub fn is_single_condition(&self) -> bool {
        self.conditions.len() == 1 && self.operators.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty() && self.operators.is_empty()
    }

    /// Conditions first, then operators.
    pub fn iter(&self) -> impl Iterator<Item = &'g FlowNode> + '_ {
        self.conditions.iter().chain(self.operators.iter()).copied()
    }
}
