//! Export phase: canvas graph → rules-engine workflow document.
//!
//! Unlike live validation this path is fail-fast: the first unrecoverable
//! problem aborts the export with a descriptive `CompilerError`.

pub mod types;

pub use types::*;

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::config::CompileOptions;
use crate::error::CompilerError;
use crate::parse::graph::FlowGraph;
use crate::parse::types::{ActionType, FlowDocument, FlowNode, NodeBase, RootData, is_blank};
use crate::synthesize::generate_expression;
use crate::validate::{ValidationResult, validate_rule_group};

/// Build the workflow document from a canvas snapshot.
pub fn assemble_workflow(
    document: &FlowDocument,
    options: &CompileOptions,
) -> Result<RulesDocument, CompilerError> {
    let graph = FlowGraph::build(document).map_err(first_error)?;

    let root = find_root(&graph)?;
    let workflow_name = root
        .data
        .workflow_name
        .as_deref()
        .map(str::trim)
        .unwrap_or_default();
    if workflow_name.is_empty() {
        return Err(CompilerError::assemble(
            "A003",
            "Workflow name is missing on the initial node",
            Some(root.id.clone()),
        ));
    }

    let rule_groups = connected_rule_groups(&graph, &root.id);
    if rule_groups.is_empty() {
        return Err(CompilerError::assemble(
            "A004",
            "No rule groups are connected to the initial node",
            Some(root.id.clone()),
        ));
    }

    let mut rules = Vec::new();
    for (label, group_id) in rule_groups {
        if let Some(rule) = assemble_rule(&graph, label, group_id, options)? {
            rules.push(rule);
        }
    }

    if rules.is_empty() {
        return Err(CompilerError::assemble(
            "A005",
            "No valid rules could be generated",
            None,
        ));
    }

    debug!(workflow = workflow_name, rules = rules.len(), "assembled workflow");

    Ok(RulesDocument {
        workflow_name: workflow_name.to_string(),
        description: options
            .description
            .clone()
            .or_else(|| root.data.description.clone())
            .unwrap_or_default(),
        rules,
    })
}

/// Assemble and serialize to pretty-printed JSON.
pub fn generate_rule_engine_json(
    document: &FlowDocument,
    options: &CompileOptions,
) -> Result<String, CompilerError> {
    let workflow = assemble_workflow(document, options)?;
    serde_json::to_string_pretty(&workflow).map_err(|e| {
        CompilerError::assemble("A010", format!("Failed to serialize workflow: {}", e), None)
    })
}

fn first_error(errors: Vec<CompilerError>) -> CompilerError {
    errors
        .into_iter()
        .next()
        .unwrap_or_else(|| CompilerError::parse("P002", "Graph could not be indexed"))
}

fn find_root(graph: &FlowGraph) -> Result<&NodeBase<RootData>, CompilerError> {
    let roots: Vec<&NodeBase<RootData>> = graph
        .nodes()
        .filter_map(|n| match n {
            FlowNode::Root(r) => Some(r),
            _ => None,
        })
        .collect();

    match roots.as_slice() {
        [] => Err(CompilerError::assemble("A001", "No Initial Node found", None)),
        [root] => Ok(*root),
        [_, extra, ..] => Err(CompilerError::assemble(
            "A002",
            format!("Expected one initial node, found {}", roots.len()),
            Some(extra.id.clone()),
        )),
    }
}

/// Rule groups reached from the root through their rule label, paired with
/// that label, in document order of the labels.
fn connected_rule_groups<'g>(graph: &'g FlowGraph, root_id: &str) -> Vec<(&'g FlowNode, &'g str)> {
    let mut groups: Vec<(&FlowNode, &str)> = Vec::new();
    for label in graph.outgoers(root_id) {
        if !matches!(label, FlowNode::RuleLabel(_)) {
            continue;
        }
        let group = label
            .parent_id()
            .and_then(|parent| graph.node(parent))
            .filter(|n| n.is_group());
        match group {
            Some(group) if groups.iter().any(|(_, id)| *id == group.id()) => {}
            Some(group) => groups.push((label, group.id())),
            None => warn!(label = label.id(), "rule label is not inside a group, skipping"),
        }
    }
    groups
}

fn assemble_rule(
    graph: &FlowGraph,
    label: &FlowNode,
    group_id: &str,
    options: &CompileOptions,
) -> Result<Option<Rule>, CompilerError> {
    let rule_name = match label {
        FlowNode::RuleLabel(l) if !is_blank(&l.data.rule_name) => {
            l.data.rule_name.as_deref().unwrap_or_default().trim().to_string()
        }
        _ => {
            warn!(group = group_id, "rule group has no rule name, skipping");
            return Ok(None);
        }
    };

    if graph.group_members(group_id).conditions.is_empty() {
        warn!(group = group_id, rule = %rule_name, "rule group has no conditions, skipping");
        return Ok(None);
    }

    let structure = validate_rule_group(graph, group_id, options);
    if !structure.is_valid {
        return Err(structural_error("A006", "Rule group", group_id, &structure));
    }

    let expression = generate_expression(graph, group_id)?;
    let actions = assemble_actions(graph, group_id, options)?;

    Ok(Some(Rule {
        rule_name,
        expression,
        actions,
        success_event: options.success_event.clone(),
    }))
}

fn structural_error(
    code: &str,
    what: &str,
    group_id: &str,
    result: &ValidationResult,
) -> CompilerError {
    let details: Vec<String> = result.errors.iter().map(|e| e.message.clone()).collect();
    CompilerError::assemble(
        code,
        format!("{} '{}' is invalid: {}", what, group_id, details.join("; ")),
        result
            .errors
            .first()
            .and_then(|e| e.node_id.clone())
            .or_else(|| Some(group_id.to_string())),
    )
}

/// Action groups attached to a rule group: nested inside it, or reached by
/// an edge from the group node or one of its conditions or operators.
fn action_groups<'g>(graph: &'g FlowGraph, rule_group_id: &str) -> Vec<&'g FlowNode> {
    let mut indices = Vec::new();

    for child in graph.children(rule_group_id) {
        if child.is_group() && graph.is_action_group(child.id()) {
            indices.extend(graph.index_of(child.id()));
        }
    }

    let members = graph.group_members(rule_group_id);
    let sources = std::iter::once(rule_group_id).chain(members.iter().map(FlowNode::id));
    for source in sources {
        for target in graph.outgoers(source) {
            let group = match target {
                FlowNode::ActionLabel(_) => target.parent_id().and_then(|p| graph.node(p)),
                FlowNode::Group(_) => Some(target),
                _ => None,
            };
            if let Some(group) = group.filter(|g| g.is_group() && graph.is_action_group(g.id())) {
                indices.extend(graph.index_of(group.id()));
            }
        }
    }

    indices.sort();
    indices.dedup();
    indices.into_iter().map(|idx| &graph.graph[idx]).collect()
}

fn assemble_actions(
    graph: &FlowGraph,
    rule_group_id: &str,
    options: &CompileOptions,
) -> Result<BTreeMap<ActionType, Action>, CompilerError> {
    let mut actions = BTreeMap::new();

    for group in action_groups(graph, rule_group_id) {
        let label = graph.children(group.id()).into_iter().find_map(|n| match n {
            FlowNode::ActionLabel(a) => Some(a),
            _ => None,
        });
        let (action_type, action_name) = match label {
            Some(l) if !is_blank(&l.data.action_name) => match l.data.action_type {
                Some(action_type) => (
                    action_type,
                    l.data.action_name.as_deref().unwrap_or_default().trim().to_string(),
                ),
                None => return Err(incomplete_action(group.id())),
            },
            _ => return Err(incomplete_action(group.id())),
        };

        let structure = validate_rule_group(graph, group.id(), options);
        if !structure.is_valid {
            return Err(structural_error("A009", "Action group", group.id(), &structure));
        }

        let expression = if graph.group_members(group.id()).conditions.is_empty() {
            options.default_action_expression.clone()
        } else {
            generate_expression(graph, group.id())?
        };

        let action = Action {
            name: action_name,
            context: ActionContext { expression },
        };
        if actions.insert(action_type, action).is_some() {
            return Err(CompilerError::assemble(
                "A008",
                format!(
                    "Rule group '{}' defines more than one {:?} action",
                    rule_group_id, action_type
                ),
                Some(group.id().to_string()),
            ));
        }
    }

    Ok(actions)
}

fn incomplete_action(group_id: &str) -> CompilerError {
    CompilerError::assemble(
        "A007",
        format!("Action group '{}' needs an action type and name", group_id),
        Some(group_id.to_string()),
    )
}
