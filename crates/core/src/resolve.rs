//! Value resolution: syntax nodes in value position to [`Value`]s.
//!
//! Resolution never fails. A node the resolver does not understand
//! resolves to its raw source text.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use crate::syntax::{SyntaxKind, SyntaxNode};
use crate::value::{Map, Value};

pub fn resolve(node: &SyntaxNode) -> Value {
    match node.kind {
        SyntaxKind::Value
        | SyntaxKind::OptionValue
        | SyntaxKind::EnumValueValue
        | SyntaxKind::ImportValue => match node.children.first() {
            Some(inner) => resolve(inner),
            None => raw(node),
        },
        SyntaxKind::SingleQuoted => Value::String(unquote(&node.text, '\'')),
        SyntaxKind::DoubleQuoted => Value::String(unquote(&node.text, '"')),
        SyntaxKind::Int => BigInt::from_str(&node.text)
            .map(Value::Integer)
            .unwrap_or_else(|_| raw(node)),
        SyntaxKind::Number => BigDecimal::from_str(&node.text)
            .map(Value::Decimal)
            .unwrap_or_else(|_| raw(node)),
        SyntaxKind::True => Value::Boolean(true),
        SyntaxKind::False => Value::Boolean(false),
        SyntaxKind::Array | SyntaxKind::ArrayPlain => {
            Value::Sequence(node.children.iter().map(resolve).collect())
        }
        SyntaxKind::Object | SyntaxKind::Pairs => {
            let mut map = Map::new();
            for pair in node.children_of(SyntaxKind::Pair) {
                let Some(key) = pair.children.first() else {
                    continue;
                };
                map.insert(key_text(key), resolve_or_true(pair.children.get(1)));
            }
            Value::Mapping(map)
        }
        // Identifiers, keywords and anything unrecognized
        _ => raw(node),
    }
}

/// Resolve an optional value node; absence is the presence flag `true`.
pub fn resolve_or_true(node: Option<&SyntaxNode>) -> Value {
    node.map_or(Value::Boolean(true), resolve)
}

/// Resolve a value node to a string: quoted text is unquoted, everything
/// else is its source text.
pub fn resolve_text(node: &SyntaxNode) -> String {
    match resolve(node) {
        Value::String(s) => s,
        _ => node.text.clone(),
    }
}

fn raw(node: &SyntaxNode) -> Value {
    Value::String(node.text.clone())
}

fn key_text(node: &SyntaxNode) -> String {
    match node.kind {
        SyntaxKind::SingleQuoted => unquote(&node.text, '\''),
        SyntaxKind::DoubleQuoted => unquote(&node.text, '"'),
        _ => node.text.clone(),
    }
}

/// Strip the surrounding `quote`s and unescape `\quote`. Escapes of the
/// other quote character are left alone.
pub fn unquote(text: &str, quote: char) -> String {
    let inner = text.strip_prefix(quote).unwrap_or(text);
    let inner = inner.strip_suffix(quote).unwrap_or(inner);
    inner.replace(&format!("\\{quote}"), &quote.to_string())
}

/// Clean a documentation comment: drop the `/**` and `*/` delimiters and the
/// leading `*` of each line, then trim.
pub fn javadoc(text: &str) -> String {
    let body = text.trim();
    let body = body.strip_prefix("/**").unwrap_or(body);
    let body = body.strip_suffix("*/").unwrap_or(body);
    body.lines()
        .map(|line| {
            let line = line.trim();
            match line.strip_prefix('*') {
                Some(rest) => rest.strip_prefix(' ').unwrap_or(rest),
                None => line,
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_owned()
}

/// The first present value of an ordered default chain.
pub fn first_present<T>(candidates: impl IntoIterator<Item = Option<T>>) -> Option<T> {
    candidates.into_iter().flatten().next()
}
