//! Concrete syntax tree consumed by the model builders.
//!
//! Nodes carry their kind, the concatenated text of their significant
//! tokens (no whitespace, no documentation comments), a source span and
//! their ordered children. Punctuation only contributes to the parent's
//! text; it is never materialized as a child.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    // ===== Literal leaves =====
    Id,
    Keyword,
    SingleQuoted,
    DoubleQuoted,
    Int,
    Number,
    True,
    False,

    // ===== Values =====
    Value,
    Array,
    ArrayPlain,
    Object,
    Pairs,
    Pair,

    // ===== Shared declaration parts =====
    GlobalJavadoc,
    Javadoc,
    SuffixJavadoc,
    Option,
    OptionName,
    OptionValue,
    Field,
    FieldName,
    FieldType,
    ArrayMarker,
    FieldValidation,
    FieldValidationName,
    FieldValidationValue,
    NestedField,
    TableName,

    // ===== Entity language =====
    Zdl,
    LegacyConstant,
    Entity,
    EntityName,
    Enum,
    EnumName,
    EnumValue,
    EnumValueName,
    EnumValueValue,
    Relationships,
    RelationshipType,
    Relationship,
    RelationshipFrom,
    RelationshipTo,
    RelationshipDefinition,
    RelationshipEntityName,
    RelationshipFieldName,
    RelationshipRequired,
    Service,
    ServiceLegacy,
    ServiceName,
    ServiceAggregates,
    ServiceMethod,
    ServiceMethodName,
    ServiceMethodParameterId,
    ServiceMethodParameter,
    ServiceMethodReturn,
    OptionalMarker,
    ServiceMethodEvents,
    ServiceMethodEvent,
    Event,
    EventName,
    EventChannel,
    Input,
    InputName,

    // ===== Flow language =====
    Zfl,
    Import,
    ImportKey,
    ImportValue,
    Config,
    ConfigOption,
    Flow,
    FlowName,
    FlowSystems,
    FlowSystem,
    FlowSystemName,
    FlowSystemZdl,
    FlowSystemService,
    FlowSystemServiceName,
    FlowSystemServiceCommands,
    FlowSystemEvents,
    FlowStart,
    FlowStartName,
    FlowWhen,
    FlowWhenTrigger,
    FlowWhenEventTrigger,
    FlowWhenCommand,
    FlowWhenEvent,
    FlowWhenPolicy,
    FlowWhenIf,
    FlowWhenElseIf,
    FlowWhenElse,
    FlowEnd,
    FlowEndCompleted,
    FlowEndSuspended,
    FlowEndCancelled,

    /// Input the parser could not recognize.
    Error,
}

/// Source range: byte offsets plus 1-based start and end positions.
/// `end_column` points one past the last character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl Span {
    /// The smallest span covering both `self` and `other`.
    pub fn cover(self, other: Span) -> Span {
        let (first, last) = if self.start <= other.start {
            (self, other)
        } else {
            (other, self)
        };
        let last = if last.end >= first.end { last } else { first };
        Span {
            start: first.start,
            end: last.end,
            line: first.line,
            column: first.column,
            end_line: last.end_line,
            end_column: last.end_column,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    pub kind: SyntaxKind,
    pub text: String,
    pub span: Span,
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    pub fn new(kind: SyntaxKind, text: impl Into<String>, span: Span) -> Self {
        SyntaxNode {
            kind,
            text: text.into(),
            span,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<SyntaxNode>) -> Self {
        self.children = children;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// First direct child of the given kind.
    pub fn child(&self, kind: SyntaxKind) -> Option<&SyntaxNode> {
        self.children.iter().find(|c| c.kind == kind)
    }

    /// All direct children of the given kind, in order.
    pub fn children_of(&self, kind: SyntaxKind) -> impl Iterator<Item = &SyntaxNode> {
        self.children.iter().filter(move |c| c.kind == kind)
    }

    /// Text of the first direct child of the given kind.
    pub fn child_text(&self, kind: SyntaxKind) -> Option<&str> {
        self.child(kind).map(SyntaxNode::text)
    }

    pub fn has_child(&self, kind: SyntaxKind) -> bool {
        self.child(kind).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: usize, end: usize, line: u32) -> Span {
        Span {
            start,
            end,
            line,
            column: 1,
            end_line: line,
            end_column: 1 + (end - start) as u32,
        }
    }

    #[test]
    fn cover_spans_both_ranges() {
        let a = span(10, 14, 2);
        let b = span(0, 4, 1);
        let c = a.cover(b);
        assert_eq!((c.start, c.end, c.line, c.end_line), (0, 14, 1, 2));
    }

    #[test]
    fn child_lookup_is_by_kind_and_ordered() {
        let node = SyntaxNode::new(SyntaxKind::FlowWhenTrigger, "AandB", span(0, 7, 1))
            .with_children(vec![
                SyntaxNode::new(SyntaxKind::FlowWhenEventTrigger, "A", span(0, 1, 1)),
                SyntaxNode::new(SyntaxKind::FlowWhenEventTrigger, "B", span(6, 7, 1)),
            ]);
        let texts: Vec<_> = node
            .children_of(SyntaxKind::FlowWhenEventTrigger)
            .map(SyntaxNode::text)
            .collect();
        assert_eq!(texts, vec!["A", "B"]);
        assert_eq!(node.child_text(SyntaxKind::FlowWhenEventTrigger), Some("A"));
        assert!(!node.has_child(SyntaxKind::Error));
    }
}
