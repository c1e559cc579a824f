use super::{PResult, Parser};
use crate::lexer::Token;
use crate::syntax::{SyntaxKind, SyntaxNode};

/// Words that start a top-level entity-language declaration.
const ZDL_KEYWORDS: &[&str] = &["entity", "enum", "relationship", "service", "event", "input"];

impl<'a> Parser<'a> {
    pub(super) fn parse_zdl_file(&mut self) -> SyntaxNode {
        let mut children = Vec::new();
        children.extend(self.global_javadoc(ZDL_KEYWORDS));

        while self.at_legacy_constant() {
            let start = self.pos;
            match self.legacy_constant() {
                Ok(node) => children.push(node),
                Err(e) => {
                    self.record(e);
                    children.push(self.recover_to_next_construct(start, ZDL_KEYWORDS));
                }
            }
        }

        while !self.at_eof() {
            let start = self.pos;
            match self.zdl_declaration() {
                Ok(node) => children.push(node),
                Err(e) => {
                    self.record(e);
                    children.push(self.recover_to_next_construct(start, ZDL_KEYWORDS));
                }
            }
        }
        self.node(SyntaxKind::Zdl, 0, children)
    }

    /// `NAME = value` where NAME has no lowercase letters.
    fn at_legacy_constant(&self) -> bool {
        self.at(Token::Word)
            && self.nth(1).token == Token::Eq
            && !self.cur().text.chars().any(char::is_lowercase)
    }

    fn legacy_constant(&mut self) -> PResult<SyntaxNode> {
        let start = self.pos;
        let name = self.leaf(SyntaxKind::Id);
        self.expect(Token::Eq, "=")?;
        let value = self.simple_value()?;
        Ok(self.node(SyntaxKind::LegacyConstant, start, vec![name, value]))
    }

    fn zdl_declaration(&mut self) -> PResult<SyntaxNode> {
        let start = self.pos;
        let mut children = Vec::new();
        children.extend(self.javadoc());
        children.extend(self.options()?);

        if !self.at(Token::Word) {
            return Err(self.err(format!(
                "expected a declaration, got {}",
                self.describe_cur()
            )));
        }
        let keyword = self.cur().text.clone();
        match keyword.as_str() {
            "entity" => self.entity(start, children),
            "enum" => self.enum_decl(start, children),
            "relationship" => self.relationships(start, children),
            "service" => self.service(start, children),
            "event" => self.event(start, children),
            "input" => self.input(start, children),
            other => Err(self.err(format!("unexpected '{}', expected a declaration", other))),
        }
    }

    fn entity(&mut self, start: usize, mut children: Vec<SyntaxNode>) -> PResult<SyntaxNode> {
        self.advance();
        children.push(self.name(SyntaxKind::EntityName)?);
        children.extend(self.table_name()?);
        children.extend(self.block(Self::field)?);
        Ok(self.node(SyntaxKind::Entity, start, children))
    }

    fn enum_decl(&mut self, start: usize, mut children: Vec<SyntaxNode>) -> PResult<SyntaxNode> {
        self.advance();
        children.push(self.name(SyntaxKind::EnumName)?);
        children.extend(self.block(Self::enum_value)?);
        Ok(self.node(SyntaxKind::Enum, start, children))
    }

    fn enum_value(&mut self) -> PResult<SyntaxNode> {
        let start = self.pos;
        let mut children = Vec::new();
        children.extend(self.javadoc());
        children.push(self.name(SyntaxKind::EnumValueName)?);
        if self.at(Token::LParen) {
            self.advance();
            let value_start = self.pos;
            let value = self.simple_value()?;
            children.push(self.node(SyntaxKind::EnumValueValue, value_start, vec![value]));
            self.expect(Token::RParen, ")")?;
        }
        if self.at(Token::Comma) {
            self.advance();
        }
        children.extend(self.suffix_javadoc());
        Ok(self.node(SyntaxKind::EnumValue, start, children))
    }

    fn relationships(&mut self, start: usize, mut children: Vec<SyntaxNode>) -> PResult<SyntaxNode> {
        self.advance();
        children.push(self.name(SyntaxKind::RelationshipType)?);
        children.extend(self.block(Self::relationship)?);
        Ok(self.node(SyntaxKind::Relationships, start, children))
    }

    fn relationship(&mut self) -> PResult<SyntaxNode> {
        let start = self.pos;
        let from = self.relationship_endpoint(SyntaxKind::RelationshipFrom)?;
        self.expect_word("to")?;
        let to = self.relationship_endpoint(SyntaxKind::RelationshipTo)?;
        if self.at(Token::Comma) {
            self.advance();
        }
        Ok(self.node(SyntaxKind::Relationship, start, vec![from, to]))
    }

    /// `javadoc? option* Entity({field required?})?`
    fn relationship_endpoint(&mut self, kind: SyntaxKind) -> PResult<SyntaxNode> {
        let start = self.pos;
        let mut children = Vec::new();
        children.extend(self.javadoc());
        children.extend(self.options()?);

        let definition_start = self.pos;
        let mut definition = vec![self.name(SyntaxKind::RelationshipEntityName)?];
        if self.at(Token::LBrace) {
            self.advance();
            definition.push(self.name(SyntaxKind::RelationshipFieldName)?);
            if self.is_word("required") {
                definition.push(self.leaf(SyntaxKind::RelationshipRequired));
            }
            self.expect(Token::RBrace, "}")?;
        }
        children.push(self.node(SyntaxKind::RelationshipDefinition, definition_start, definition));
        Ok(self.node(kind, start, children))
    }

    /// `service Name for (A, B) { methods }` or the legacy
    /// `service A, B with Name`.
    fn service(&mut self, start: usize, mut children: Vec<SyntaxNode>) -> PResult<SyntaxNode> {
        self.advance();
        if self.nth(1).is_word("for") {
            children.push(self.name(SyntaxKind::ServiceName)?);
            self.expect_word("for")?;
            self.expect(Token::LParen, "(")?;
            let aggregates_start = self.pos;
            let aggregates = self.name_list(SyntaxKind::Id)?;
            children.push(self.node(SyntaxKind::ServiceAggregates, aggregates_start, aggregates));
            self.expect(Token::RParen, ")")?;
            if self.at(Token::LBrace) {
                children.extend(self.block(Self::service_method)?);
            }
            return Ok(self.node(SyntaxKind::Service, start, children));
        }

        let aggregates_start = self.pos;
        let aggregates = self.name_list(SyntaxKind::Id)?;
        children.push(self.node(SyntaxKind::ServiceAggregates, aggregates_start, aggregates));
        self.expect_word("with")?;
        children.push(self.name(SyntaxKind::ServiceName)?);
        Ok(self.node(SyntaxKind::ServiceLegacy, start, children))
    }

    fn service_method(&mut self) -> PResult<SyntaxNode> {
        let start = self.pos;
        let mut children = Vec::new();
        children.extend(self.javadoc());
        children.extend(self.options()?);
        children.push(self.name(SyntaxKind::ServiceMethodName)?);

        self.expect(Token::LParen, "(")?;
        if self.is_word("id") {
            children.push(self.leaf(SyntaxKind::ServiceMethodParameterId));
            if self.at(Token::Comma) {
                self.advance();
                children.push(self.name(SyntaxKind::ServiceMethodParameter)?);
            }
        } else if self.at(Token::Word) {
            children.push(self.name(SyntaxKind::ServiceMethodParameter)?);
        }
        self.expect(Token::RParen, ")")?;

        let line = self.prev_line();
        if self.at(Token::Word) && !self.is_word("withEvents") && self.cur_line() == line {
            children.push(self.method_return()?);
        }
        if self.is_word("withEvents") && self.cur_line() == line {
            children.push(self.method_events()?);
        }
        if self.at(Token::LBrace) {
            children.extend(self.block(Self::option)?);
        }
        if self.at(Token::Comma) {
            self.advance();
        }
        children.extend(self.suffix_javadoc());
        Ok(self.node(SyntaxKind::ServiceMethod, start, children))
    }

    /// `Type`, `Type[]`, `Type?`
    fn method_return(&mut self) -> PResult<SyntaxNode> {
        let start = self.pos;
        let mut children = vec![self.name(SyntaxKind::Id)?];
        if self.at(Token::LBracket) && self.nth(1).token == Token::RBracket {
            let marker = self.pos;
            self.advance();
            self.advance();
            children.push(self.node(SyntaxKind::ArrayMarker, marker, Vec::new()));
        }
        if self.at(Token::Question) {
            children.push(self.leaf(SyntaxKind::OptionalMarker));
        }
        Ok(self.node(SyntaxKind::ServiceMethodReturn, start, children))
    }

    /// `withEvents A B [C D]` up to the end of the line.
    fn method_events(&mut self) -> PResult<SyntaxNode> {
        let start = self.pos;
        let line = self.cur_line();
        self.advance();
        let mut events = Vec::new();
        loop {
            if self.cur_line() != line {
                break;
            }
            match self.peek() {
                Token::Word => events.push(self.name(SyntaxKind::ServiceMethodEvent)?),
                Token::LBracket => {
                    self.advance();
                    while self.at(Token::Word) {
                        events.push(self.name(SyntaxKind::ServiceMethodEvent)?);
                        if self.at(Token::Comma) {
                            self.advance();
                        }
                    }
                    self.expect(Token::RBracket, "]")?;
                }
                Token::Comma => self.advance(),
                _ => break,
            }
        }
        if events.is_empty() {
            return Err(self.err("expected at least one event after 'withEvents'"));
        }
        Ok(self.node(SyntaxKind::ServiceMethodEvents, start, events))
    }

    fn event(&mut self, start: usize, mut children: Vec<SyntaxNode>) -> PResult<SyntaxNode> {
        self.advance();
        children.push(self.name(SyntaxKind::EventName)?);
        if self.at(Token::LParen) {
            self.advance();
            let channel_start = self.pos;
            while !self.at(Token::RParen) {
                if self.at_eof() || self.at(Token::LBrace) {
                    return Err(self.err(format!(
                        "expected ')' after event channel, got {}",
                        self.describe_cur()
                    )));
                }
                self.advance();
            }
            if self.pos == channel_start {
                return Err(self.err("expected a channel name"));
            }
            children.push(self.node(SyntaxKind::EventChannel, channel_start, Vec::new()));
            self.expect(Token::RParen, ")")?;
        }
        children.extend(self.block(Self::field)?);
        Ok(self.node(SyntaxKind::Event, start, children))
    }

    fn input(&mut self, start: usize, mut children: Vec<SyntaxNode>) -> PResult<SyntaxNode> {
        self.advance();
        children.push(self.name(SyntaxKind::InputName)?);
        children.extend(self.block(Self::field)?);
        Ok(self.node(SyntaxKind::Input, start, children))
    }
}

#[cfg(test)]
mod tests {
    use super::super::{parse_zdl, DEFAULT_MAX_ERRORS};
    use crate::syntax::{SyntaxKind, SyntaxNode};

    fn parse(src: &str) -> SyntaxNode {
        let parse = parse_zdl(src, "test.zdl", DEFAULT_MAX_ERRORS).unwrap();
        assert!(parse.errors.is_empty(), "unexpected errors: {:?}", parse.errors);
        parse.tree
    }

    #[test]
    fn parses_entity_with_table_and_options() {
        let tree = parse(
            r#"
/** The customer */
@aggregate
entity Customer (customer_table) {
    name String required maxlength(254)
    email String
}
"#,
        );
        let entity = tree.child(SyntaxKind::Entity).unwrap();
        assert_eq!(entity.child_text(SyntaxKind::EntityName), Some("Customer"));
        assert_eq!(entity.child_text(SyntaxKind::TableName), Some("customer_table"));
        assert!(entity.has_child(SyntaxKind::Javadoc));
        assert_eq!(entity.children_of(SyntaxKind::Option).count(), 1);
        assert_eq!(entity.children_of(SyntaxKind::Field).count(), 2);
        assert!(!tree.has_child(SyntaxKind::GlobalJavadoc));
    }

    #[test]
    fn leading_javadoc_without_declaration_is_global() {
        let tree = parse("/** Global */\n/** Entity */\nentity A {}");
        assert!(tree.has_child(SyntaxKind::GlobalJavadoc));
        assert!(tree.child(SyntaxKind::Entity).unwrap().has_child(SyntaxKind::Javadoc));
    }

    #[test]
    fn parses_legacy_constants() {
        let tree = parse("MAX_LENGTH = 100\nPREFIX = \"ord\"\nentity A {}");
        assert_eq!(tree.children_of(SyntaxKind::LegacyConstant).count(), 2);
    }

    #[test]
    fn relationship_definition_text_includes_field() {
        let tree = parse(
            "relationship OneToMany {\n  Customer{addresses required} to @Id Address{customer}\n}",
        );
        let rels = tree.child(SyntaxKind::Relationships).unwrap();
        assert_eq!(rels.child_text(SyntaxKind::RelationshipType), Some("OneToMany"));
        let rel = rels.child(SyntaxKind::Relationship).unwrap();
        let from = rel.child(SyntaxKind::RelationshipFrom).unwrap();
        let definition = from.child(SyntaxKind::RelationshipDefinition).unwrap();
        assert_eq!(definition.text, "Customer{addressesrequired}");
        assert!(definition.has_child(SyntaxKind::RelationshipRequired));
        let to = rel.child(SyntaxKind::RelationshipTo).unwrap();
        assert_eq!(to.children_of(SyntaxKind::Option).count(), 1);
    }

    #[test]
    fn parses_service_methods() {
        let tree = parse(
            r#"
service OrderService for (Order) {
    @get("/orders/{id}")
    getOrder(id) Order? withEvents OrderFetched
    searchOrders(OrderCriteria) Order[] {
        @paginated
    }
    cancel(id, CancelInput) withEvents [OrderCancelled OrderFailed]
}
"#,
        );
        let service = tree.child(SyntaxKind::Service).unwrap();
        let methods: Vec<_> = service.children_of(SyntaxKind::ServiceMethod).collect();
        assert_eq!(methods.len(), 3);

        let ret = methods[0].child(SyntaxKind::ServiceMethodReturn).unwrap();
        assert!(ret.has_child(SyntaxKind::OptionalMarker));
        assert!(methods[0].has_child(SyntaxKind::ServiceMethodParameterId));

        let ret = methods[1].child(SyntaxKind::ServiceMethodReturn).unwrap();
        assert!(ret.has_child(SyntaxKind::ArrayMarker));
        assert_eq!(methods[1].children_of(SyntaxKind::Option).count(), 1);

        let events = methods[2].child(SyntaxKind::ServiceMethodEvents).unwrap();
        assert_eq!(events.children_of(SyntaxKind::ServiceMethodEvent).count(), 2);
        assert_eq!(
            methods[2].child_text(SyntaxKind::ServiceMethodParameter),
            Some("CancelInput")
        );
    }

    #[test]
    fn parses_legacy_service() {
        let tree = parse("service Customer, Order with ShopService");
        let service = tree.child(SyntaxKind::ServiceLegacy).unwrap();
        assert_eq!(service.child_text(SyntaxKind::ServiceName), Some("ShopService"));
        let aggregates = service.child(SyntaxKind::ServiceAggregates).unwrap();
        assert_eq!(aggregates.children.len(), 2);
    }

    #[test]
    fn parses_event_channel() {
        let tree = parse("event OrderCreated (orders-channel) {\n id Long\n}");
        let event = tree.child(SyntaxKind::Event).unwrap();
        assert_eq!(event.child_text(SyntaxKind::EventChannel), Some("orders-channel"));
    }

    #[test]
    fn recovers_from_broken_declarations() {
        let src = "entity A {\n  name String\n  # broken\n  age Integer\n}\n% junk\nentity B {}";
        let parse = parse_zdl(src, "bad.zdl", DEFAULT_MAX_ERRORS).unwrap();
        assert_eq!(parse.errors.len(), 2);
        assert_eq!(parse.errors[0].line, 3);

        let entities: Vec<_> = parse.tree.children_of(SyntaxKind::Entity).collect();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].children_of(SyntaxKind::Field).count(), 2);
        assert_eq!(entities[0].children_of(SyntaxKind::Error).count(), 1);
        assert_eq!(parse.tree.children_of(SyntaxKind::Error).count(), 1);
    }

    #[test]
    fn stops_collecting_after_max_errors() {
        let src = "% a\n% b\n% c\nentity A {}";
        let parse = parse_zdl(src, "bad.zdl", 1).unwrap();
        assert_eq!(parse.errors.len(), 1);
        assert!(parse.tree.child(SyntaxKind::Entity).is_none());
    }
}
