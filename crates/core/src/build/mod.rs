//! Model builders: syntax tree in, semantic document out.
//!
//! Both builders walk the tree depth-first with a [`ScopeStack`] of
//! construct frames. Walks never fail: `Error` nodes and constructs with
//! no handler are skipped and reported as [`Diagnostic`]s next to the
//! partial document.
//!
//! [`ScopeStack`]: crate::scope::ScopeStack

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::SyntaxError;
use crate::model::{Field, Validation};
use crate::parser::DEFAULT_MAX_ERRORS;
use crate::resolve::{first_present, javadoc, resolve_or_true};
use crate::syntax::{Span, SyntaxKind, SyntaxNode};
use crate::value::Value;

mod zdl;
mod zfl;

pub use zdl::build_zdl;
pub use zfl::build_zfl;

/// Source range of a construct, recorded under a dotted model path.
pub type Location = Span;

/// A built document with its source locations and the anomalies skipped
/// while building it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Model {
    pub document: Value,
    pub locations: IndexMap<String, Location>,
    pub diagnostics: Vec<Diagnostic>,
}

/// A construct skipped during a best-effort build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
    pub message: String,
    /// Source text of the skipped construct.
    pub skipped: String,
}

impl Diagnostic {
    pub(crate) fn skipped(node: &SyntaxNode, message: impl Into<String>) -> Self {
        Diagnostic {
            line: node.span.line,
            column: node.span.column,
            end_line: node.span.end_line,
            end_column: node.span.end_column,
            message: message.into(),
            skipped: node.text.clone(),
        }
    }

    /// A grammar error no skipped node accounts for.
    pub(crate) fn unaccounted(error: &SyntaxError) -> Self {
        Diagnostic {
            line: error.line,
            column: error.column,
            end_line: error.line,
            end_column: error.column,
            message: error.message.clone(),
            skipped: String::new(),
        }
    }

    /// Whether `(line, column)` lies inside the skipped range.
    pub fn covers(&self, line: u32, column: u32) -> bool {
        (self.line, self.column) <= (line, column)
            && (line, column) <= (self.end_line, self.end_column)
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

/// Pipeline configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Reject documents with any diagnostic instead of returning them.
    pub strict: bool,
    /// Grammar errors collected before the rest of the input is skipped.
    pub max_errors: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            strict: false,
            max_errors: DEFAULT_MAX_ERRORS,
        }
    }
}

/// Options declared on `node`, in order, with absent values resolved to
/// `true`.
pub(crate) fn options_of(node: &SyntaxNode) -> Vec<(String, Value)> {
    node.children_of(SyntaxKind::Option)
        .filter_map(|option| {
            let name = option.child_text(SyntaxKind::OptionName)?;
            let value = resolve_or_true(option.child(SyntaxKind::OptionValue));
            Some((name.to_owned(), value))
        })
        .collect()
}

/// Leading documentation of `node`, falling back to its suffix comment.
pub(crate) fn javadoc_of(node: &SyntaxNode) -> Option<String> {
    first_present([
        node.child_text(SyntaxKind::Javadoc),
        node.child_text(SyntaxKind::SuffixJavadoc),
    ])
    .map(javadoc)
}

/// The field record of a `Field` node. A nested body is not visited here.
pub(crate) fn field_record(node: &SyntaxNode) -> Field {
    let field_type = node.child(SyntaxKind::FieldType);
    let type_name = field_type
        .and_then(|t| t.child_text(SyntaxKind::Id))
        .unwrap_or_default();
    let mut field = Field {
        name: node.child_text(SyntaxKind::FieldName).unwrap_or_default().to_owned(),
        type_name: type_name.to_owned(),
        javadoc: javadoc_of(node),
        is_array: field_type.map_or(false, |t| t.has_child(SyntaxKind::ArrayMarker)),
        ..Field::default()
    };
    field.options.extend(options_of(node));
    for validation in node.children_of(SyntaxKind::FieldValidation) {
        let Some(name) = validation.child_text(SyntaxKind::FieldValidationName) else {
            continue;
        };
        let value = validation
            .child_text(SyntaxKind::FieldValidationValue)
            .unwrap_or_default();
        field.validations.insert(
            name.to_owned(),
            Validation {
                name: name.to_owned(),
                value: value.to_owned(),
            },
        );
    }
    field
}

/// Report a skipped node.
pub(crate) fn skip(diagnostics: &mut Vec<Diagnostic>, node: &SyntaxNode, context: &str) {
    let message = if node.kind == SyntaxKind::Error {
        format!("skipped unrecognized input in {}", context)
    } else {
        format!("no handler for {:?} in {}", node.kind, context)
    };
    tracing::warn!(line = node.span.line, column = node.span.column, "{}", message);
    diagnostics.push(Diagnostic::skipped(node, message));
}
