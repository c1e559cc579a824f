use super::{PResult, Parser};
use crate::lexer::Token;
use crate::syntax::{SyntaxKind, SyntaxNode};

/// Words that start a top-level flow-language construct.
const ZFL_KEYWORDS: &[&str] = &["import", "config", "flow"];

impl<'a> Parser<'a> {
    pub(super) fn parse_zfl_file(&mut self) -> SyntaxNode {
        let mut children = Vec::new();
        children.extend(self.global_javadoc(&["flow"]));

        while !self.at_eof() {
            let start = self.pos;
            let result = if self.is_word("import") {
                self.import()
            } else if self.is_word("config") {
                self.config()
            } else {
                self.flow()
            };
            match result {
                Ok(node) => children.push(node),
                Err(e) => {
                    self.record(e);
                    children.push(self.recover_to_next_construct(start, ZFL_KEYWORDS));
                }
            }
        }
        self.node(SyntaxKind::Zfl, 0, children)
    }

    /// `import key: "value"`
    fn import(&mut self) -> PResult<SyntaxNode> {
        let start = self.pos;
        self.advance();
        let key = self.name(SyntaxKind::ImportKey)?;
        self.expect(Token::Colon, ":")?;
        let value_start = self.pos;
        let value = self.string_value()?;
        let value = self.node(SyntaxKind::ImportValue, value_start, vec![value]);
        Ok(self.node(SyntaxKind::Import, start, vec![key, value]))
    }

    fn config(&mut self) -> PResult<SyntaxNode> {
        let start = self.pos;
        self.advance();
        let options = self.block(Self::config_option)?;
        Ok(self.node(SyntaxKind::Config, start, options))
    }

    /// `name complex_value`, terminated by the end of the line.
    fn config_option(&mut self) -> PResult<SyntaxNode> {
        let start = self.pos;
        let name = self.name(SyntaxKind::FieldName)?;
        let value = self.complex_value()?;
        Ok(self.node(SyntaxKind::ConfigOption, start, vec![name, value]))
    }

    /// A value, `a, b, c` (plain array) or `k: v, k2: v2` (pairs).
    fn complex_value(&mut self) -> PResult<SyntaxNode> {
        if self.at(Token::Word) && self.nth(1).token == Token::Colon {
            let start = self.pos;
            let mut pairs = vec![self.pair()?];
            while self.at(Token::Comma) {
                self.advance();
                pairs.push(self.pair()?);
            }
            return Ok(self.node(SyntaxKind::Pairs, start, pairs));
        }
        if self.at(Token::LBracket) || self.at(Token::LBrace) {
            return self.value();
        }
        let start = self.pos;
        let first = self.simple_value()?;
        if !self.at(Token::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.at(Token::Comma) {
            self.advance();
            items.push(self.simple_value()?);
        }
        Ok(self.node(SyntaxKind::ArrayPlain, start, items))
    }

    fn flow(&mut self) -> PResult<SyntaxNode> {
        let start = self.pos;
        let mut children = Vec::new();
        children.extend(self.javadoc());
        children.extend(self.options()?);
        self.expect_word("flow")?;
        children.push(self.name(SyntaxKind::FlowName)?);
        children.extend(self.block(Self::flow_item)?);
        Ok(self.node(SyntaxKind::Flow, start, children))
    }

    fn flow_item(&mut self) -> PResult<SyntaxNode> {
        let start = self.pos;
        let mut children = Vec::new();
        children.extend(self.javadoc());
        children.extend(self.options()?);
        if !self.at(Token::Word) {
            return Err(self.err(format!(
                "expected systems, start, when or end, got {}",
                self.describe_cur()
            )));
        }
        let keyword = self.cur().text.clone();
        match keyword.as_str() {
            "systems" => {
                self.advance();
                children.extend(self.block(Self::flow_system)?);
                Ok(self.node(SyntaxKind::FlowSystems, start, children))
            }
            "start" => {
                self.advance();
                children.push(self.name(SyntaxKind::FlowStartName)?);
                if self.at(Token::LBrace) {
                    children.extend(self.block(Self::field)?);
                }
                Ok(self.node(SyntaxKind::FlowStart, start, children))
            }
            "when" => self.flow_when(start, children),
            "end" => {
                self.advance();
                children.extend(self.block(Self::flow_end_outcome)?);
                Ok(self.node(SyntaxKind::FlowEnd, start, children))
            }
            other => Err(self.err(format!(
                "unexpected '{}', expected systems, start, when or end",
                other
            ))),
        }
    }

    fn flow_system(&mut self) -> PResult<SyntaxNode> {
        let start = self.pos;
        let mut children = Vec::new();
        children.extend(self.javadoc());
        children.extend(self.options()?);
        children.push(self.name(SyntaxKind::FlowSystemName)?);
        children.extend(self.block(Self::flow_system_item)?);
        Ok(self.node(SyntaxKind::FlowSystem, start, children))
    }

    fn flow_system_item(&mut self) -> PResult<SyntaxNode> {
        let start = self.pos;
        let mut children = Vec::new();
        children.extend(self.javadoc());
        children.extend(self.options()?);
        if self.is_word("zdl") {
            self.advance();
            children.push(self.string_value()?);
            return Ok(self.node(SyntaxKind::FlowSystemZdl, start, children));
        }
        if self.is_word("service") {
            self.advance();
            if self.at(Token::Word) {
                children.push(self.name(SyntaxKind::FlowSystemServiceName)?);
            }
            if self.at(Token::LBrace) {
                children.extend(self.block(Self::flow_system_service_item)?);
            }
            return Ok(self.node(SyntaxKind::FlowSystemService, start, children));
        }
        if self.is_word("events") {
            self.advance();
            self.expect(Token::Colon, ":")?;
            children.extend(self.name_list(SyntaxKind::Id)?);
            return Ok(self.node(SyntaxKind::FlowSystemEvents, start, children));
        }
        Err(self.err(format!(
            "expected zdl, service or events, got {}",
            self.describe_cur()
        )))
    }

    /// `commands: a, b, c`
    fn flow_system_service_item(&mut self) -> PResult<SyntaxNode> {
        let start = self.pos;
        self.expect_word("commands")?;
        self.expect(Token::Colon, ":")?;
        let commands = self.name_list(SyntaxKind::Id)?;
        Ok(self.node(SyntaxKind::FlowSystemServiceCommands, start, commands))
    }

    fn flow_when(&mut self, start: usize, mut children: Vec<SyntaxNode>) -> PResult<SyntaxNode> {
        self.advance();
        let trigger_start = self.pos;
        let mut triggers = vec![self.name(SyntaxKind::FlowWhenEventTrigger)?];
        while self.is_word("and") || self.is_word("or") {
            self.advance();
            triggers.push(self.name(SyntaxKind::FlowWhenEventTrigger)?);
        }
        children.push(self.node(SyntaxKind::FlowWhenTrigger, trigger_start, triggers));
        children.extend(self.block(Self::flow_when_item)?);
        Ok(self.node(SyntaxKind::FlowWhen, start, children))
    }

    fn flow_when_item(&mut self) -> PResult<SyntaxNode> {
        let start = self.pos;
        let word = if self.at(Token::Word) {
            self.cur().text.clone()
        } else {
            String::new()
        };
        let kind = match word.as_str() {
            "command" => Some(SyntaxKind::FlowWhenCommand),
            "event" => Some(SyntaxKind::FlowWhenEvent),
            "policy" => Some(SyntaxKind::FlowWhenPolicy),
            "if" => return self.flow_when_if(),
            _ => None,
        };
        let Some(kind) = kind else {
            return Err(self.err(format!(
                "expected command, event, policy or if, got {}",
                self.describe_cur()
            )));
        };
        self.advance();
        let target = if kind == SyntaxKind::FlowWhenPolicy {
            self.string_value()?
        } else {
            self.name(SyntaxKind::Id)?
        };
        Ok(self.node(kind, start, vec![target]))
    }

    /// `if "cond" {..} (else if "cond" {..})* (else {..})?`
    ///
    /// Else-if and else branches become trailing children of the if node.
    fn flow_when_if(&mut self) -> PResult<SyntaxNode> {
        let start = self.pos;
        self.expect_word("if")?;
        let mut children = vec![self.string_value()?];
        children.extend(self.block(Self::flow_when_item)?);

        while self.is_word("else") {
            let branch_start = self.pos;
            self.advance();
            if self.is_word("if") {
                self.advance();
                let mut branch = vec![self.string_value()?];
                branch.extend(self.block(Self::flow_when_item)?);
                children.push(self.node(SyntaxKind::FlowWhenElseIf, branch_start, branch));
            } else {
                let branch = self.block(Self::flow_when_item)?;
                children.push(self.node(SyntaxKind::FlowWhenElse, branch_start, branch));
                break;
            }
        }
        Ok(self.node(SyntaxKind::FlowWhenIf, start, children))
    }

    /// `completed: A, B` and its siblings.
    fn flow_end_outcome(&mut self) -> PResult<SyntaxNode> {
        let start = self.pos;
        let word = if self.at(Token::Word) {
            self.cur().text.clone()
        } else {
            String::new()
        };
        let kind = match word.as_str() {
            "completed" => Some(SyntaxKind::FlowEndCompleted),
            "suspended" => Some(SyntaxKind::FlowEndSuspended),
            "cancelled" => Some(SyntaxKind::FlowEndCancelled),
            _ => None,
        };
        let Some(kind) = kind else {
            return Err(self.err(format!(
                "expected completed, suspended or cancelled, got {}",
                self.describe_cur()
            )));
        };
        self.advance();
        self.expect(Token::Colon, ":")?;
        let events = self.name_list(SyntaxKind::Id)?;
        Ok(self.node(kind, start, events))
    }
}
