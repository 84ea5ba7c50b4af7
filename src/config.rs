//! Options shared by the validators and the exporter.

use serde::{Deserialize, Serialize};

use crate::error::CompilerError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileOptions {
    /// Traversal depth past which a group gets a `deep_nesting` warning.
    pub deep_nesting_threshold: usize,
    /// `SuccessEvent` written on every exported rule.
    pub success_event: String,
    /// Overrides the description carried by the initial node.
    pub description: Option<String>,
    /// Guard expression for action groups that hold no conditions.
    pub default_action_expression: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            deep_nesting_threshold: 5,
            success_event: "IndividualTarget".into(),
            description: None,
            default_action_expression: "input1".into(),
        }
    }
}

impl CompileOptions {
    pub fn from_json(json: &str) -> Result<Self, CompilerError> {
        serde_json::from_str(json).map_err(|e| {
            CompilerError::parse("P004", format!("Failed to parse compile options: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let options = CompileOptions::from_json("{}").unwrap();
        assert_eq!(options, CompileOptions::default());
        assert_eq!(options.deep_nesting_threshold, 5);
        assert_eq!(options.success_event, "IndividualTarget");
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let options = CompileOptions::from_json(r#"{"successEvent":"Done"}"#).unwrap();
        assert_eq!(options.success_event, "Done");
        assert_eq!(options.default_action_expression, "input1");
    }

    #[test]
    fn malformed_options_are_rejected() {
        let err = CompileOptions::from_json(r#"{"deepNestingThreshold":"deep"}"#).unwrap_err();
        assert_eq!(err.code, "P004");
    }
}
