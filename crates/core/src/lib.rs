//! zdl-core: semantic model builder for the ZDL entity language and the ZFL
//! flow language.
//!
//! Source text is lexed and parsed into a [`SyntaxNode`] tree, then walked
//! by a model builder into a nested [`Value`] document that code generators
//! consume.
//!
//! # Public API
//!
//! - [`compile_zdl()`], [`compile_zfl()`], [`compile()`] -- run the full pipeline
//! - [`build_zdl()`], [`build_zfl()`] -- build a document from an existing tree
//! - [`parse_zdl()`], [`parse_zfl()`] -- reference front end
//! - [`Model`] -- document plus source locations and diagnostics
//! - [`Value`] -- the document's value type
//! - [`Error`], [`SyntaxError`] -- pipeline errors
//!
//! Typed model records live in [`model`]; the CRUD synthesizer in [`crud`].

pub mod build;
pub mod compile;
pub mod crud;
pub mod error;
pub mod inflector;
pub mod lexer;
pub mod model;
pub mod parser;
pub mod resolve;
pub mod scope;
pub mod syntax;
pub mod value;

// ── Convenience re-exports: key types ────────────────────────────────

pub use build::{BuildOptions, Diagnostic, Location, Model};
pub use compile::Language;
pub use error::{Error, SyntaxError};
pub use syntax::{Span, SyntaxKind, SyntaxNode};
pub use value::{Map, Value};

// ── Convenience re-exports: pipeline entry points ────────────────────

pub use build::{build_zdl, build_zfl};
pub use compile::{compile, compile_zdl, compile_zfl};
pub use parser::{parse_zdl, parse_zfl, DEFAULT_MAX_ERRORS};
