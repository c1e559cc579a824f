//! Pipeline: source text -> syntax tree -> semantic document.
//!
//! A thin orchestrator over the parser and the builders. Grammar errors the
//! parser recovered from are folded into the model's diagnostics, so callers
//! see one list of everything that was skipped.

use std::path::Path;

use crate::build::{build_zdl, build_zfl, BuildOptions, Diagnostic, Model};
use crate::error::{Error, SyntaxError};
use crate::parser::{parse_zdl, parse_zfl, Parse};
use crate::syntax::SyntaxNode;

/// Source language of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Zdl,
    Zfl,
}

impl Language {
    /// Infer the language from a file extension (`.zdl`, `.jdl`, `.zfl`).
    pub fn from_path(path: &Path) -> Option<Language> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "zdl" | "jdl" => Some(Language::Zdl),
            "zfl" => Some(Language::Zfl),
            _ => None,
        }
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "zdl" => Ok(Language::Zdl),
            "zfl" => Ok(Language::Zfl),
            other => Err(format!("unknown language '{}', expected zdl or zfl", other)),
        }
    }
}

/// Compile entity-language source into its document.
pub fn compile_zdl(src: &str, filename: &str, options: &BuildOptions) -> Result<Model, Error> {
    let parse = parse_zdl(src, filename, options.max_errors)?;
    finish(parse, build_zdl, options)
}

/// Compile flow-language source into its document.
pub fn compile_zfl(src: &str, filename: &str, options: &BuildOptions) -> Result<Model, Error> {
    let parse = parse_zfl(src, filename, options.max_errors)?;
    finish(parse, build_zfl, options)
}

/// Compile `src` as `language`.
pub fn compile(
    language: Language,
    src: &str,
    filename: &str,
    options: &BuildOptions,
) -> Result<Model, Error> {
    match language {
        Language::Zdl => compile_zdl(src, filename, options),
        Language::Zfl => compile_zfl(src, filename, options),
    }
}

fn finish(
    parse: Parse,
    build: fn(&SyntaxNode) -> Model,
    options: &BuildOptions,
) -> Result<Model, Error> {
    let mut model = build(&parse.tree);
    explain(&mut model.diagnostics, &parse.errors);

    if options.strict && !model.diagnostics.is_empty() {
        return Err(Error::Strict {
            diagnostics: model.diagnostics,
        });
    }
    Ok(model)
}

/// Replace the builder's generic message with the grammar error that caused
/// the skipped range, when there is one. Grammar errors no diagnostic covers
/// are reported on their own.
fn explain(diagnostics: &mut Vec<Diagnostic>, errors: &[SyntaxError]) {
    for diagnostic in diagnostics.iter_mut() {
        if let Some(error) = errors
            .iter()
            .find(|e| diagnostic.covers(e.line, e.column))
        {
            diagnostic.message = error.message.clone();
        }
    }
    let unaccounted: Vec<Diagnostic> = errors
        .iter()
        .filter(|e| !diagnostics.iter().any(|d| d.covers(e.line, e.column)))
        .map(Diagnostic::unaccounted)
        .collect();
    diagnostics.extend(unaccounted);
}
