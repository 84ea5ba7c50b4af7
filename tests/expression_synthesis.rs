//! Integration tests for group expression synthesis.

#[allow(dead_code)]
mod helpers;

use helpers::*;
use rulegraph::parse::{FlowEdge, FlowNode, LogicalOperator};
use rulegraph::synthesize::generate_expression;
use rulegraph::synthesize::leaf::{ComparisonOp, LeafExpression};

fn synthesize(nodes: Vec<FlowNode>, edges: Vec<FlowEdge>) -> String {
    let doc = document(nodes, edges);
    let graph = graph(&doc);
    generate_expression(&graph, "g1").expect("Should synthesize")
}

#[test]
fn single_condition_is_returned_unparenthesized() {
    let expression = synthesize(vec![rule_group("g1"), amount_over_1000("a", "g1")], vec![]);
    assert_eq!(expression, AMOUNT);
}

#[test]
fn two_conditions_joined_by_and() {
    let (nodes, edges) = and_group_nodes();
    let expression = synthesize(nodes, edges);
    assert_eq!(
        expression,
        "(sales.Amount > \"1000\") AND (user.Designation = \"Manager\")"
    );
}

#[test]
fn operator_symbol_is_used() {
    let expression = synthesize(
        vec![rule_group("g1"), amount_over_1000("a", "g1"), is_manager("b", "g1"), or("op", "g1")],
        vec![edge("a", "op"), edge("b", "op")],
    );
    assert_eq!(expression, format!("({}) OR ({})", AMOUNT, MANAGER));
}

#[test]
fn unset_operator_defaults_to_and() {
    let expression = synthesize(
        vec![
            rule_group("g1"),
            amount_over_1000("a", "g1"),
            is_manager("b", "g1"),
            operator("op", Some("g1"), None),
        ],
        vec![edge("a", "op"), edge("b", "op")],
    );
    assert_eq!(expression, format!("({}) AND ({})", AMOUNT, MANAGER));
}

#[test]
fn chained_operators_carry_the_folded_expression_forward() {
    let expression = synthesize(
        vec![
            rule_group("g1"),
            amount_over_1000("a", "g1"),
            is_manager("b", "g1"),
            in_eu("c", "g1"),
            and("op1", "g1"),
            or("op2", "g1"),
        ],
        vec![
            edge("a", "op1"),
            edge("b", "op1"),
            edge("c", "op2"),
            edge("op1", "op2"),
        ],
    );
    assert_eq!(
        expression,
        format!("(({}) AND ({})) OR ({})", AMOUNT, MANAGER, EU)
    );
}

#[test]
fn outgoing_edge_to_condition_is_folded_as_operand() {
    let expression = synthesize(
        vec![rule_group("g1"), amount_over_1000("a", "g1"), is_manager("b", "g1"), and("op", "g1")],
        vec![edge("a", "op"), edge("op", "b")],
    );
    assert_eq!(expression, format!("({}) AND ({})", AMOUNT, MANAGER));
}

#[test]
fn operator_reached_from_group_node_is_used() {
    let expression = synthesize(
        vec![
            rule_group("g1"),
            amount_over_1000("a", "g1"),
            is_manager("b", "g1"),
            operator("free", None, Some(LogicalOperator::Or)),
        ],
        vec![edge("g1", "free"), edge("a", "free"), edge("b", "free")],
    );
    assert_eq!(expression, format!("({}) OR ({})", AMOUNT, MANAGER));
}

#[test]
fn two_independent_groups_default_to_and() {
    let expression = synthesize(
        vec![rule_group("g1"), amount_over_1000("a", "g1"), is_manager("b", "g1")],
        vec![],
    );
    assert_eq!(expression, format!("({}) AND ({})", AMOUNT, MANAGER));
}

#[test]
fn two_groups_use_the_bridging_operator() {
    let expression = synthesize(
        vec![
            rule_group("g1"),
            amount_over_1000("a", "g1"),
            is_manager("b", "g1"),
            and("op1", "g1"),
            in_eu("c", "g1"),
            condition("d", "g1", "sales", "channel", "contains", "web"),
            and("op2", "g1"),
            operator("bridge", None, Some(LogicalOperator::Or)),
        ],
        vec![
            edge("a", "op1"),
            edge("b", "op1"),
            edge("c", "op2"),
            edge("d", "op2"),
            edge("op1", "bridge"),
            edge("op2", "bridge"),
        ],
    );
    assert_eq!(
        expression,
        format!(
            "(({}) AND ({})) OR (({}) AND ({}))",
            AMOUNT, MANAGER, EU, "sales.Channel contains \"web\""
        )
    );
}

#[test]
fn three_or_more_groups_are_joined_with_and() {
    let expression = synthesize(
        vec![
            rule_group("g1"),
            amount_over_1000("a", "g1"),
            is_manager("b", "g1"),
            in_eu("c", "g1"),
        ],
        vec![],
    );
    assert_eq!(expression, format!("{} AND {} AND {}", AMOUNT, MANAGER, EU));
}

#[test]
fn incomplete_condition_fails_loudly() {
    let mut incomplete = amount_over_1000("a", "g1");
    if let FlowNode::Condition(c) = &mut incomplete {
        c.data.value = Some("  ".into());
    }
    let doc = document(
        vec![rule_group("g1"), incomplete, is_manager("b", "g1"), and("op", "g1")],
        vec![edge("a", "op"), edge("b", "op")],
    );
    let graph = graph(&doc);
    let err = generate_expression(&graph, "g1").unwrap_err();
    assert_eq!(err.code, "S001");
    assert_eq!(err.node_id.as_deref(), Some("a"));
}

#[test]
fn empty_group_has_nothing_to_synthesize() {
    let doc = document(vec![rule_group("g1")], vec![]);
    let graph = graph(&doc);
    let err = generate_expression(&graph, "g1").unwrap_err();
    assert_eq!(err.code, "S004");
}

#[test]
fn operator_cycle_is_reported_instead_of_looping() {
    let doc = document(
        vec![
            rule_group("g1"),
            amount_over_1000("a", "g1"),
            and("op1", "g1"),
            and("op2", "g1"),
        ],
        vec![edge("a", "op1"), edge("op1", "op2"), edge("op2", "op1")],
    );
    let graph = graph(&doc);
    let err = generate_expression(&graph, "g1").unwrap_err();
    assert_eq!(err.code, "S003");
}

#[test]
fn leaves_round_trip_through_the_grammar() {
    let (nodes, edges) = and_group_nodes();
    let expression = synthesize(nodes, edges);

    let leaves: Vec<LeafExpression> = expression
        .split(" AND ")
        .map(|part| {
            let inner = part.trim_start_matches('(').trim_end_matches(')');
            LeafExpression::parse(inner).expect("leaf should match the grammar")
        })
        .collect();

    assert_eq!(leaves.len(), 2);
    assert_eq!(leaves[0].table, "sales");
    assert_eq!(leaves[0].field, "Amount");
    assert_eq!(leaves[0].operator, ComparisonOp::Gt);
    assert_eq!(leaves[0].value, "1000");
    assert_eq!(leaves[1].render(), MANAGER);
}
