//! Reference front end: recursive-descent parsers producing [`SyntaxNode`]
//! trees for the entity language (`zdl`) and the flow language (`zfl`).
//!
//! Grammar violations never abort the parse. Each one is recorded as a
//! [`SyntaxError`] and the skipped tokens are wrapped in an `Error` node, so
//! the builders always receive a tree.
use crate::error::SyntaxError;
use crate::lexer::{self, Spanned, Token};
use crate::syntax::{Span, SyntaxKind, SyntaxNode};

mod zdl;
mod zfl;

/// Default maximum number of errors collected before the rest of the input
/// is skipped as a single `Error` node.
pub const DEFAULT_MAX_ERRORS: usize = 10;

/// A syntax tree plus the grammar errors recovered from while building it.
#[derive(Debug, Clone)]
pub struct Parse {
    pub tree: SyntaxNode,
    pub errors: Vec<SyntaxError>,
}

/// Lex and parse entity-language source. Only lexical errors are fatal.
pub fn parse_zdl(src: &str, filename: &str, max_errors: usize) -> Result<Parse, SyntaxError> {
    let tokens = lexer::lex(src, filename)?;
    let mut p = Parser::new(&tokens, filename, max_errors);
    let tree = p.parse_zdl_file();
    Ok(Parse {
        tree,
        errors: p.errors,
    })
}

/// Lex and parse flow-language source. Only lexical errors are fatal.
pub fn parse_zfl(src: &str, filename: &str, max_errors: usize) -> Result<Parse, SyntaxError> {
    let tokens = lexer::lex(src, filename)?;
    let mut p = Parser::new(&tokens, filename, max_errors);
    let tree = p.parse_zfl_file();
    Ok(Parse {
        tree,
        errors: p.errors,
    })
}

type PResult<T> = Result<T, SyntaxError>;

/// Words that resolve as keywords when they appear in a value position.
const KEYWORDS: &[&str] = &[
    "entity",
    "enum",
    "relationship",
    "service",
    "event",
    "input",
    "for",
    "with",
    "withEvents",
    "to",
    "flow",
    "systems",
    "start",
    "when",
    "command",
    "policy",
    "if",
    "else",
    "end",
    "import",
    "config",
    "zdl",
    "commands",
    "events",
];

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    filename: String,
    errors: Vec<SyntaxError>,
    max_errors: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Spanned], filename: &str, max_errors: usize) -> Self {
        Parser {
            tokens,
            pos: 0,
            filename: filename.to_owned(),
            errors: Vec::new(),
            max_errors: max_errors.max(1),
        }
    }

    fn cur(&self) -> &Spanned {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn nth(&self, ahead: usize) -> &Spanned {
        &self.tokens[(self.pos + ahead).min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> Token {
        self.cur().token
    }

    fn at(&self, token: Token) -> bool {
        self.peek() == token
    }

    fn at_eof(&self) -> bool {
        self.at(Token::Eof)
    }

    fn cur_line(&self) -> u32 {
        self.cur().line()
    }

    /// End line of the last consumed token.
    fn prev_line(&self) -> u32 {
        match self.pos {
            0 => 1,
            n => self.tokens[n - 1].span.end_line,
        }
    }

    /// Whether the current token starts exactly where the previous one ended.
    fn adjacent(&self) -> bool {
        self.pos > 0 && self.tokens[self.pos - 1].span.end == self.cur().span.start
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
    }

    fn is_word(&self, w: &str) -> bool {
        self.cur().is_word(w)
    }

    fn err(&self, msg: impl Into<String>) -> SyntaxError {
        let span = self.cur().span;
        SyntaxError::new(&self.filename, span.line, span.column, msg)
    }

    fn describe_cur(&self) -> String {
        match self.peek() {
            Token::Eof => "end of input".to_owned(),
            _ => format!("'{}'", self.cur().text),
        }
    }

    fn expect(&mut self, token: Token, what: &str) -> PResult<()> {
        if self.at(token) {
            self.advance();
            Ok(())
        } else {
            Err(self.err(format!("expected '{}', got {}", what, self.describe_cur())))
        }
    }

    fn expect_word(&mut self, expected: &str) -> PResult<()> {
        if self.is_word(expected) {
            self.advance();
            Ok(())
        } else {
            Err(self.err(format!(
                "expected '{}', got {}",
                expected,
                self.describe_cur()
            )))
        }
    }

    // -- Node construction ---------------------------------------

    /// Node of `kind` covering the tokens consumed since `start`.
    fn node(&self, kind: SyntaxKind, start: usize, children: Vec<SyntaxNode>) -> SyntaxNode {
        let consumed = &self.tokens[start.min(self.pos)..self.pos];
        // Documentation leaves keep their comment; composites skip it
        let is_doc = matches!(
            kind,
            SyntaxKind::Javadoc | SyntaxKind::SuffixJavadoc | SyntaxKind::GlobalJavadoc
        );
        let text: String = consumed
            .iter()
            .filter(|t| is_doc || t.token != Token::Javadoc)
            .map(|t| t.text.as_str())
            .collect();
        let span = match (consumed.first(), consumed.last()) {
            (Some(first), Some(last)) => first.span.cover(last.span),
            _ => {
                let at = self.cur().span;
                Span {
                    end: at.start,
                    end_line: at.line,
                    end_column: at.column,
                    ..at
                }
            }
        };
        SyntaxNode::new(kind, text, span).with_children(children)
    }

    /// Consume the current token as a leaf of `kind`.
    fn leaf(&mut self, kind: SyntaxKind) -> SyntaxNode {
        let start = self.pos;
        self.advance();
        self.node(kind, start, Vec::new())
    }

    /// A word, or dotted words (`Payments.chargePayment`), as a leaf of `kind`.
    fn name(&mut self, kind: SyntaxKind) -> PResult<SyntaxNode> {
        if !self.at(Token::Word) {
            return Err(self.err(format!("expected identifier, got {}", self.describe_cur())));
        }
        let start = self.pos;
        self.advance();
        while self.at(Token::Dot) && self.nth(1).token == Token::Word && self.adjacent() {
            self.advance();
            self.advance();
        }
        Ok(self.node(kind, start, Vec::new()))
    }

    /// A comma-separated list of names.
    fn name_list(&mut self, kind: SyntaxKind) -> PResult<Vec<SyntaxNode>> {
        let mut names = vec![self.name(kind)?];
        while self.at(Token::Comma) {
            self.advance();
            names.push(self.name(kind)?);
        }
        Ok(names)
    }

    // -- Error recovery -------------------------------------------

    fn record(&mut self, e: SyntaxError) {
        tracing::debug!(file = %e.file, line = e.line, "recovering from: {}", e.message);
        if self.errors.len() < self.max_errors {
            self.errors.push(e);
        }
    }

    fn exhausted(&self) -> bool {
        self.errors.len() >= self.max_errors
    }

    /// Skip the rest of the input as one error node.
    fn skip_to_eof(&mut self, start: usize) -> SyntaxNode {
        while !self.at_eof() {
            self.advance();
        }
        self.node(SyntaxKind::Error, start, Vec::new())
    }

    /// Check whether the current token can begin a top-level declaration.
    fn is_construct_start(&self, keywords: &[&str]) -> bool {
        match self.peek() {
            Token::Javadoc | Token::At => true,
            Token::Word => keywords.contains(&self.cur().text.as_str()),
            _ => false,
        }
    }

    /// Skip tokens until we find a closing `}` at the original nesting level,
    /// or a top-level construct start at nesting level 0.
    fn recover_to_next_construct(&mut self, start: usize, keywords: &[&str]) -> SyntaxNode {
        if self.exhausted() {
            return self.skip_to_eof(start);
        }
        if self.pos == start {
            self.advance();
        }
        let mut depth: i32 = 0;
        loop {
            match self.peek() {
                Token::Eof => break,
                Token::LBrace => {
                    depth += 1;
                    self.advance();
                }
                Token::RBrace => {
                    self.advance();
                    if depth <= 0 {
                        // The closing brace ends the broken construct
                        break;
                    }
                    depth -= 1;
                }
                _ => {
                    if depth == 0 && self.is_construct_start(keywords) {
                        break;
                    }
                    self.advance();
                }
            }
        }
        self.node(SyntaxKind::Error, start, Vec::new())
    }

    /// Skip a broken block item: stop at the first token of a later line at
    /// the same depth, or before the block's closing brace.
    fn recover_in_block(&mut self, start: usize) -> SyntaxNode {
        if self.exhausted() {
            return self.skip_to_eof(start);
        }
        if self.pos == start {
            self.advance();
        }
        let mut depth: i32 = 0;
        loop {
            match self.peek() {
                Token::Eof => break,
                Token::RBrace if depth == 0 => break,
                Token::RBrace => {
                    depth -= 1;
                    self.advance();
                }
                Token::LBrace => {
                    depth += 1;
                    self.advance();
                }
                _ => {
                    if depth == 0 && self.cur_line() > self.prev_line() {
                        break;
                    }
                    self.advance();
                }
            }
        }
        self.node(SyntaxKind::Error, start, Vec::new())
    }

    /// `{ item* }`, recovering from broken items.
    fn block(
        &mut self,
        mut item: impl FnMut(&mut Self) -> PResult<SyntaxNode>,
    ) -> PResult<Vec<SyntaxNode>> {
        self.expect(Token::LBrace, "{")?;
        let mut items = Vec::new();
        while !self.at(Token::RBrace) && !self.at_eof() {
            let start = self.pos;
            match item(self) {
                Ok(node) => items.push(node),
                Err(e) => {
                    self.record(e);
                    items.push(self.recover_in_block(start));
                }
            }
        }
        self.expect(Token::RBrace, "}")?;
        Ok(items)
    }

    // -- Documentation and options -----------------------------

    /// Leading documentation comment; only the last of consecutive ones is kept.
    fn javadoc(&mut self) -> Option<SyntaxNode> {
        let mut doc = None;
        while self.at(Token::Javadoc) {
            doc = Some(self.leaf(SyntaxKind::Javadoc));
        }
        doc
    }

    /// Documentation comment trailing a declaration on its last line.
    fn suffix_javadoc(&mut self) -> Option<SyntaxNode> {
        if self.at(Token::Javadoc) && self.cur_line() == self.prev_line() {
            Some(self.leaf(SyntaxKind::SuffixJavadoc))
        } else {
            None
        }
    }

    fn options(&mut self) -> PResult<Vec<SyntaxNode>> {
        let mut options = Vec::new();
        while self.at(Token::At) {
            options.push(self.option()?);
        }
        Ok(options)
    }

    /// `@name` or `@name(value | [array] | {object})`
    fn option(&mut self) -> PResult<SyntaxNode> {
        let start = self.pos;
        self.expect(Token::At, "@")?;
        if !self.at(Token::Word) {
            return Err(self.err(format!("expected option name, got {}", self.describe_cur())));
        }
        let mut children = vec![self.name(SyntaxKind::OptionName)?];
        if self.at(Token::LParen) && self.adjacent() {
            self.advance();
            let value_start = self.pos;
            let value = self.value()?;
            children.push(self.node(SyntaxKind::OptionValue, value_start, vec![value]));
            self.expect(Token::RParen, ")")?;
        }
        Ok(self.node(SyntaxKind::Option, start, children))
    }

    // -- Values -----------------------------------------------------

    /// A simple literal, an array or an object.
    fn value(&mut self) -> PResult<SyntaxNode> {
        match self.peek() {
            Token::LBracket => self.array(),
            Token::LBrace => self.object(),
            _ => self.simple_value(),
        }
    }

    /// A literal wrapped in a `Value` node.
    fn simple_value(&mut self) -> PResult<SyntaxNode> {
        let start = self.pos;
        let leaf = match self.peek() {
            Token::SingleQuoted => self.leaf(SyntaxKind::SingleQuoted),
            Token::DoubleQuoted => self.leaf(SyntaxKind::DoubleQuoted),
            Token::Int => self.leaf(SyntaxKind::Int),
            Token::Number => self.leaf(SyntaxKind::Number),
            Token::Word if self.is_word("true") => self.leaf(SyntaxKind::True),
            Token::Word if self.is_word("false") => self.leaf(SyntaxKind::False),
            Token::Word if KEYWORDS.contains(&self.cur().text.as_str()) => {
                self.leaf(SyntaxKind::Keyword)
            }
            Token::Word => self.name(SyntaxKind::Id)?,
            _ => return Err(self.err(format!("expected a value, got {}", self.describe_cur()))),
        };
        Ok(self.node(SyntaxKind::Value, start, vec![leaf]))
    }

    /// A quoted string wrapped in a `Value` node.
    fn string_value(&mut self) -> PResult<SyntaxNode> {
        match self.peek() {
            Token::SingleQuoted | Token::DoubleQuoted => self.simple_value(),
            _ => Err(self.err(format!("expected a string, got {}", self.describe_cur()))),
        }
    }

    fn array(&mut self) -> PResult<SyntaxNode> {
        let start = self.pos;
        self.expect(Token::LBracket, "[")?;
        let mut items = Vec::new();
        while !self.at(Token::RBracket) {
            items.push(self.value()?);
            if self.at(Token::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(Token::RBracket, "]")?;
        Ok(self.node(SyntaxKind::Array, start, items))
    }

    fn object(&mut self) -> PResult<SyntaxNode> {
        let start = self.pos;
        self.expect(Token::LBrace, "{")?;
        let mut pairs = Vec::new();
        while !self.at(Token::RBrace) {
            pairs.push(self.pair()?);
            if self.at(Token::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(Token::RBrace, "}")?;
        Ok(self.node(SyntaxKind::Object, start, pairs))
    }

    /// `key: value` where the key is a word or a quoted string.
    fn pair(&mut self) -> PResult<SyntaxNode> {
        let start = self.pos;
        let key = match self.peek() {
            Token::Word => self.name(SyntaxKind::Id)?,
            Token::SingleQuoted => self.leaf(SyntaxKind::SingleQuoted),
            Token::DoubleQuoted => self.leaf(SyntaxKind::DoubleQuoted),
            _ => return Err(self.err(format!("expected a key, got {}", self.describe_cur()))),
        };
        self.expect(Token::Colon, ":")?;
        let value = self.value()?;
        Ok(self.node(SyntaxKind::Pair, start, vec![key, value]))
    }

    // -- Fields -------------------------------------------------------

    /// `javadoc? option* name Type[]? (nested | validation*) suffix_javadoc? ,?`
    fn field(&mut self) -> PResult<SyntaxNode> {
        let start = self.pos;
        let mut children = Vec::new();
        children.extend(self.javadoc());
        children.extend(self.options()?);
        children.push(self.name(SyntaxKind::FieldName)?);
        children.push(self.field_type()?);
        let type_line = self.prev_line();

        if self.at_nested_field() {
            children.push(self.nested_field()?);
        } else {
            while self.at(Token::Word) && self.cur_line() == type_line {
                children.push(self.field_validation()?);
            }
        }
        if self.at(Token::Comma) {
            self.advance();
        }
        children.extend(self.suffix_javadoc());
        Ok(self.node(SyntaxKind::Field, start, children))
    }

    fn field_type(&mut self) -> PResult<SyntaxNode> {
        let start = self.pos;
        let mut children = vec![self.name(SyntaxKind::Id)?];
        if self.at(Token::LBracket) && self.nth(1).token == Token::RBracket {
            let marker = self.pos;
            self.advance();
            self.advance();
            children.push(self.node(SyntaxKind::ArrayMarker, marker, Vec::new()));
        }
        Ok(self.node(SyntaxKind::FieldType, start, children))
    }

    /// `{` or `(table) {` after a field type.
    fn at_nested_field(&self) -> bool {
        self.at(Token::LBrace)
            || (self.at(Token::LParen)
                && self.nth(1).token == Token::Word
                && self.nth(2).token == Token::RParen
                && self.nth(3).token == Token::LBrace)
    }

    fn nested_field(&mut self) -> PResult<SyntaxNode> {
        let start = self.pos;
        let mut children = Vec::new();
        children.extend(self.table_name()?);
        children.extend(self.block(Self::field)?);
        Ok(self.node(SyntaxKind::NestedField, start, children))
    }

    /// Optional `(table_name)`.
    fn table_name(&mut self) -> PResult<Option<SyntaxNode>> {
        if !self.at(Token::LParen) {
            return Ok(None);
        }
        self.advance();
        let table = self.name(SyntaxKind::TableName)?;
        self.expect(Token::RParen, ")")?;
        Ok(Some(table))
    }

    /// `name` or `name(raw text)`
    fn field_validation(&mut self) -> PResult<SyntaxNode> {
        let start = self.pos;
        let mut children = vec![self.leaf(SyntaxKind::FieldValidationName)];
        if self.at(Token::LParen) && self.adjacent() {
            self.advance();
            let value_start = self.pos;
            let mut depth = 0;
            while !(self.at(Token::RParen) && depth == 0) {
                match self.peek() {
                    Token::Eof | Token::LBrace | Token::RBrace => {
                        return Err(self.err(format!(
                            "unterminated validation argument, got {}",
                            self.describe_cur()
                        )));
                    }
                    Token::LParen => depth += 1,
                    Token::RParen => depth -= 1,
                    _ => {}
                }
                self.advance();
            }
            children.push(self.node(SyntaxKind::FieldValidationValue, value_start, Vec::new()));
            self.expect(Token::RParen, ")")?;
        }
        Ok(self.node(SyntaxKind::FieldValidation, start, children))
    }

    /// A documentation comment at the very top of the file that does not
    /// introduce a declaration.
    fn global_javadoc(&mut self, keywords: &[&str]) -> Option<SyntaxNode> {
        if !self.at(Token::Javadoc) {
            return None;
        }
        let next = self.nth(1);
        let introduces_declaration = next.token == Token::At
            || (next.token == Token::Word && keywords.contains(&next.text.as_str()));
        if introduces_declaration {
            None
        } else {
            Some(self.leaf(SyntaxKind::GlobalJavadoc))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_field(src: &str) -> SyntaxNode {
        let tokens = lexer::lex(src, "t.zdl").unwrap();
        let mut p = Parser::new(&tokens, "t.zdl", DEFAULT_MAX_ERRORS);
        let field = p.field().unwrap();
        assert!(p.errors.is_empty());
        field
    }

    #[test]
    fn option_without_parenthesis_has_no_value() {
        let tokens = lexer::lex("@aggregate entity", "t.zdl").unwrap();
        let mut p = Parser::new(&tokens, "t.zdl", DEFAULT_MAX_ERRORS);
        let option = p.option().unwrap();
        assert_eq!(option.child_text(SyntaxKind::OptionName), Some("aggregate"));
        assert!(!option.has_child(SyntaxKind::OptionValue));
        assert_eq!(option.text, "@aggregate");
    }

    #[test]
    fn option_value_may_be_an_object() {
        let tokens = lexer::lex("@rest({path: '/orders', paged: true})", "t.zdl").unwrap();
        let mut p = Parser::new(&tokens, "t.zdl", DEFAULT_MAX_ERRORS);
        let option = p.option().unwrap();
        let value = option.child(SyntaxKind::OptionValue).unwrap();
        let object = &value.children[0];
        assert_eq!(object.kind, SyntaxKind::Object);
        assert_eq!(object.children_of(SyntaxKind::Pair).count(), 2);
    }

    #[test]
    fn field_validations_stop_at_end_of_line() {
        let field = parse_field("name String required maxlength(100)\nage Integer");
        let names: Vec<_> = field
            .children_of(SyntaxKind::FieldValidation)
            .map(|v| v.child_text(SyntaxKind::FieldValidationName).unwrap())
            .collect();
        assert_eq!(names, vec!["required", "maxlength"]);
        let max = field.children_of(SyntaxKind::FieldValidation).nth(1).unwrap();
        assert_eq!(max.child_text(SyntaxKind::FieldValidationValue), Some("100"));
    }

    #[test]
    fn field_with_braces_is_nested() {
        let field = parse_field("address Address (address_table) {\n street String\n city String\n}");
        let nested = field.child(SyntaxKind::NestedField).unwrap();
        assert_eq!(nested.child_text(SyntaxKind::TableName), Some("address_table"));
        assert_eq!(nested.children_of(SyntaxKind::Field).count(), 2);
    }

    #[test]
    fn array_field_type_has_marker() {
        let field = parse_field("tags String[] /** the tags */");
        let ty = field.child(SyntaxKind::FieldType).unwrap();
        assert_eq!(ty.text, "String[]");
        assert!(ty.has_child(SyntaxKind::ArrayMarker));
        assert!(field.has_child(SyntaxKind::SuffixJavadoc));
    }

    #[test]
    fn node_text_skips_whitespace_and_javadoc() {
        let field = parse_field("/** doc */\n  total   BigDecimal");
        assert_eq!(field.text, "totalBigDecimal");
        assert_eq!(field.span.line, 1);
        assert_eq!(field.span.end_line, 2);
    }

    #[test]
    fn documentation_leaves_keep_their_comment() {
        let field = parse_field("/** the total */\n  total BigDecimal /** in cents */");
        assert_eq!(field.child_text(SyntaxKind::Javadoc), Some("/** the total */"));
        assert_eq!(field.child_text(SyntaxKind::SuffixJavadoc), Some("/** in cents */"));
        assert_eq!(field.text, "totalBigDecimal");

        let tokens = lexer::lex("/** Shop */\nMAX = 1", "t.zdl").unwrap();
        let mut p = Parser::new(&tokens, "t.zdl", DEFAULT_MAX_ERRORS);
        let global = p.global_javadoc(&["entity"]).unwrap();
        assert_eq!(global.text, "/** Shop */");
    }
}
