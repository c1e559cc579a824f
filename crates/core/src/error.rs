use serde::Serialize;

use crate::build::Diagnostic;

/// A lexical or grammar error, positioned in the source file.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, thiserror::Error)]
#[error("{file}:{line}:{column}: {message}")]
pub struct SyntaxError {
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl SyntaxError {
    pub fn new(file: &str, line: u32, column: u32, message: impl Into<String>) -> Self {
        SyntaxError {
            file: file.to_owned(),
            line,
            column,
            message: message.into(),
        }
    }

    /// Serialize to JSON with every field present, for machine-readable CLI output.
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "column":  self.column,
            "file":    self.file,
            "line":    self.line,
            "message": self.message,
        })
    }
}

/// Errors surfaced by the `compile_*` pipeline entry points.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The source could not be tokenized at all; no document is produced.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// Strict mode rejected a document in which constructs were skipped.
    #[error("{} construct(s) skipped in strict mode", diagnostics.len())]
    Strict { diagnostics: Vec<Diagnostic> },
}

impl Error {
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            Error::Syntax(e) => e.to_json_value(),
            Error::Strict { diagnostics } => serde_json::json!({
                "message": self.to_string(),
                "diagnostics": diagnostics,
            }),
        }
    }
}
