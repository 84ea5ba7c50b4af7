//! WASM entry points for browser use.

use wasm_bindgen::prelude::*;

use crate::config::CompileOptions;
use crate::error::CompilerError;
use crate::parse::FlowGraph;
use crate::validate::{ErrorKind, ValidationError, ValidationResult, defect_to_error};

/// Validate a canvas JSON: indexing defects, document checks and every group.
/// Returns a `ValidationResult` object.
#[wasm_bindgen]
pub fn validate_rule_graph(json: &str, options_json: Option<String>) -> JsValue {
    let result = validate_rule_graph_inner(json, options_json.as_deref());
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

fn validate_rule_graph_inner(json: &str, options_json: Option<&str>) -> ValidationResult {
    let options = match load_options(options_json) {
        Ok(o) => o,
        Err(e) => return failed_input(e),
    };
    match crate::parse::parse(json) {
        Ok(document) => crate::validate::validate_all(&document, &options),
        Err(errors) => errors
            .into_iter()
            .map(failed_input)
            .fold(ValidationResult::default(), |mut acc, r| {
                acc.merge(r);
                acc
            }),
    }
}

/// Check whether `source → target` may be added to the canvas described by
/// `json`. Returns a `ValidationResult` object; admissible iff `isValid`.
#[wasm_bindgen]
pub fn validate_edge_connection(json: &str, source: &str, target: &str) -> JsValue {
    let result = validate_edge_connection_inner(json, source, target);
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

fn validate_edge_connection_inner(json: &str, source: &str, target: &str) -> ValidationResult {
    let document = match crate::parse::parse(json) {
        Ok(d) => d,
        Err(errors) => {
            return ValidationResult::from_parts(
                errors
                    .into_iter()
                    .map(|e| ValidationError::new(ErrorKind::InvalidConnection, e.message))
                    .collect(),
                vec![],
            );
        }
    };
    let (graph, defects) = FlowGraph::build_lenient(&document);
    let mut result = crate::validate::validate_edge_connection(&graph, source, target);
    // Defects elsewhere in the graph do not block this edge; surface them as warnings.
    result.warnings.extend(defects.iter().map(defect_to_error));
    result
}

/// Full export: parse → assemble → JSON.
/// Returns a JSON object with either `document` (success) or `error` (failure).
#[wasm_bindgen]
pub fn generate_rule_engine_json(json: &str, options_json: Option<String>) -> JsValue {
    let result = generate_rule_engine_json_inner(json, options_json.as_deref());
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

fn generate_rule_engine_json_inner(json: &str, options_json: Option<&str>) -> ExportResult {
    let options = match load_options(options_json) {
        Ok(o) => o,
        Err(e) => return ExportResult::Error { error: ErrorDto::from(e) },
    };
    let document = match crate::parse::parse(json) {
        Ok(d) => d,
        Err(errors) => {
            return match errors.into_iter().next() {
                Some(e) => ExportResult::Error { error: ErrorDto::from(e) },
                None => ExportResult::Error {
                    error: ErrorDto::from(CompilerError::parse(
                        "P001",
                        "Failed to parse rule graph JSON",
                    )),
                },
            };
        }
    };

    match crate::assemble::generate_rule_engine_json(&document, &options) {
        Ok(document) => ExportResult::Success { document },
        Err(e) => ExportResult::Error { error: ErrorDto::from(e) },
    }
}

fn load_options(options_json: Option<&str>) -> Result<CompileOptions, CompilerError> {
    match options_json {
        Some(json) if !json.trim().is_empty() => CompileOptions::from_json(json),
        _ => Ok(CompileOptions::default()),
    }
}

fn failed_input(error: CompilerError) -> ValidationResult {
    ValidationResult::from_parts(
        vec![ValidationError::new(ErrorKind::InvalidConnection, error.to_string())],
        vec![],
    )
}

// ---------------------------------------------------------------------------
// DTOs for serialization to JS
// ---------------------------------------------------------------------------

#[derive(serde::Serialize, serde::Deserialize)]
struct ErrorDto {
    code: String,
    phase: String,
    message: String,
    node_id: Option<String>,
}

impl From<CompilerError> for ErrorDto {
    fn from(e: CompilerError) -> Self {
        ErrorDto {
            code: e.code,
            phase: e.phase.to_string(),
            message: e.message,
            node_id: e.node_id,
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(tag = "status")]
enum ExportResult {
    #[serde(rename = "success")]
    Success { document: String },
    #[serde(rename = "error")]
    Error { error: ErrorDto },
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANVAS: &str = r#"{
        "nodes": [
            {"id":"start","type":"initial","data":{"workflowName":"Comp1"}},
            {"id":"g1","type":"resizableGroup","data":{"label":"Rule Group"}},
            {"id":"n1","type":"ruleName","parentId":"g1","data":{"ruleName":"Solo"}},
            {"id":"a","type":"condition","parentId":"g1",
             "data":{"table":"sales","field":"amount","operator":">","value":"5"}},
            {"id":"op","type":"conditionalOperator","parentId":"g1","data":{"operator":"OR"}}
        ],
        "edges": [
            {"id":"e1","source":"start","target":"n1"},
            {"id":"e2","source":"n1","target":"ghost"}
        ]
    }"#;

    #[test]
    fn bad_json_is_reported_not_thrown() {
        let result = validate_rule_graph_inner("{", None);
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].kind, ErrorKind::InvalidConnection);
    }

    #[test]
    fn defects_elsewhere_do_not_block_a_connection() {
        let result = validate_edge_connection_inner(CANVAS, "a", "op");
        assert!(result.is_valid, "{:?}", result.errors);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].edge_id.as_deref(), Some("e2"));
    }

    #[test]
    fn export_failure_carries_code_and_phase() {
        let result = generate_rule_engine_json_inner(CANVAS, None);
        let ExportResult::Error { error } = result else {
            panic!("export should fail on a dangling edge");
        };
        assert_eq!(error.code, "P002");
        assert_eq!(error.phase, "Parse");
    }

    #[test]
    fn bad_options_fail_the_export() {
        let result = generate_rule_engine_json_inner(CANVAS, Some("not json"));
        assert!(matches!(result, ExportResult::Error { ref error } if error.code == "P004"));
    }

    #[test]
    fn blank_options_mean_defaults() {
        let options = load_options(Some("  ")).unwrap();
        assert_eq!(options, CompileOptions::default());
    }
}
