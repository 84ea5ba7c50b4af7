//! Leaf expressions: `table.Field op "value"`.

use serde::{Deserialize, Serialize};

use crate::error::CompilerError;
use crate::parse::types::{ConditionData, NodeBase};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOp {
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "!=")]
    NotEquals,
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "equals")]
    Equals,
    #[serde(rename = "starts with")]
    StartsWith,
    #[serde(rename = "ends with")]
    EndsWith,
}

impl ComparisonOp {
    pub const ALL: [ComparisonOp; 10] = [
        ComparisonOp::Gte,
        ComparisonOp::Lte,
        ComparisonOp::NotEquals,
        ComparisonOp::Eq,
        ComparisonOp::Gt,
        ComparisonOp::Lt,
        ComparisonOp::Contains,
        ComparisonOp::Equals,
        ComparisonOp::StartsWith,
        ComparisonOp::EndsWith,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOp::Gte => ">=",
            ComparisonOp::Lte => "<=",
            ComparisonOp::NotEquals => "!=",
            ComparisonOp::Eq => "=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Lt => "<",
            ComparisonOp::Contains => "contains",
            ComparisonOp::Equals => "equals",
            ComparisonOp::StartsWith => "starts with",
            ComparisonOp::EndsWith => "ends with",
        }
    }

    pub fn parse(symbol: &str) -> Option<Self> {
        let symbol = symbol.trim();
        Self::ALL.into_iter().find(|op| op.symbol() == symbol)
    }
}

/// One rendered condition, or the parts recovered from a rendered one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafExpression {
    pub table: String,
    pub field: String,
    pub operator: ComparisonOp,
    pub value: String,
}

impl LeafExpression {
    /// Build a leaf from a condition node. Incomplete payloads are an error,
    /// never an empty clause.
    pub fn from_condition(node: &NodeBase<ConditionData>) -> Result<Self, CompilerError> {
        let missing = node.data.missing_fields();
        if !missing.is_empty() {
            return Err(CompilerError::synthesize(
                "S001",
                format!("Condition is missing {}", missing.join(", ")),
                Some(node.id.clone()),
            ));
        }

        let symbol = node.data.operator.as_deref().unwrap_or_default();
        let operator = ComparisonOp::parse(symbol).ok_or_else(|| {
            CompilerError::synthesize(
                "S002",
                format!("Unknown comparison operator '{}'", symbol),
                Some(node.id.clone()),
            )
        })?;

        Ok(LeafExpression {
            table: node.data.table.as_deref().unwrap_or_default().trim().to_string(),
            field: capitalize(node.data.field.as_deref().unwrap_or_default().trim()),
            operator,
            value: node.data.value.clone().unwrap_or_default(),
        })
    }

    pub fn render(&self) -> String {
        format!(
            "{}.{} {} \"{}\"",
            self.table,
            self.field,
            self.operator.symbol(),
            escape_value(&self.value)
        )
    }

    /// Recognize a rendered leaf. Returns `None` for anything that does not
    /// match `table.Field op "value"` exactly.
    pub fn parse(expr: &str) -> Option<Self> {
        let expr = expr.trim();
        let (path, rest) = expr.split_once(' ')?;
        let (table, field) = path.split_once('.')?;
        if table.is_empty() || field.is_empty() {
            return None;
        }

        let quote = rest.find('"')?;
        let operator = ComparisonOp::parse(&rest[..quote])?;
        let quoted = &rest[quote..];
        if quoted.len() < 2 || !quoted.ends_with('"') {
            return None;
        }
        let value = unescape_value(&quoted[1..quoted.len() - 1])?;

        Some(LeafExpression {
            table: table.to_string(),
            field: field.to_string(),
            operator,
            value,
        })
    }
}

fn capitalize(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn escape_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn unescape_value(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push(chars.next()?),
            '"' => return None,
            _ => out.push(c),
        }
    }
    Some(out)
}
