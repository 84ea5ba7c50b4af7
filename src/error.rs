//! Unified compiler error type used by the export path.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Parse,
    Synthesize,
    Assemble,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Parse => write!(f, "Parse"),
            Phase::Synthesize => write!(f, "Synthesize"),
            Phase::Assemble => write!(f, "Assemble"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("[{phase}:{code}] {message}{}", node_suffix(.node_id))]
pub struct CompilerError {
    pub code: String,
    pub phase: Phase,
    pub message: String,
    pub node_id: Option<String>,
}

fn node_suffix(node_id: &Option<String>) -> String {
    match node_id {
        Some(id) => format!(" (node '{}')", id),
        None => String::new(),
    }
}

impl CompilerError {
    pub fn parse(code: &str, message: impl Into<String>) -> Self {
        CompilerError {
            code: code.into(),
            phase: Phase::Parse,
            message: message.into(),
            node_id: None,
        }
    }

    pub fn synthesize(code: &str, message: impl Into<String>, node_id: Option<String>) -> Self {
        CompilerError {
            code: code.into(),
            phase: Phase::Synthesize,
            message: message.into(),
            node_id,
        }
    }

    pub fn assemble(code: &str, message: impl Into<String>, node_id: Option<String>) -> Self {
        CompilerError {
            code: code.into(),
            phase: Phase::Assemble,
            message: message.into(),
            node_id,
        }
    }
}
