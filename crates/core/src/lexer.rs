use crate::error::SyntaxError;
use crate::syntax::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// Identifiers and keywords, distinguished in the parser
    Word,
    /// Quoted literals keep their quotes and escapes; the value resolver unquotes them
    SingleQuoted,
    DoubleQuoted,
    Int,
    /// Decimal literal, kept as text to preserve exact representation
    Number,
    /// `/** ... */`
    Javadoc,
    // Punctuation
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Colon,
    Comma,
    Dot,
    Eq,
    Question,
    At,
    Star,
    /// A character no grammar rule accepts; the parser reports it
    Unknown,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: Token,
    pub text: String,
    pub span: Span,
}

impl Spanned {
    pub fn line(&self) -> u32 {
        self.span.line
    }

    pub fn is_word(&self, w: &str) -> bool {
        self.token == Token::Word && self.text == w
    }
}

struct Cursor<'a> {
    src: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
    line: u32,
    column: u32,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Cursor {
            src,
            chars: src.char_indices().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|&(_, c)| c)
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).map(|&(_, c)| c)
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map_or(self.src.len(), |&(offset, _)| offset)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn mark(&self) -> (usize, u32, u32) {
        (self.offset(), self.line, self.column)
    }

    fn span_from(&self, (start, line, column): (usize, u32, u32)) -> Span {
        Span {
            start,
            end: self.offset(),
            line,
            column,
            end_line: self.line,
            end_column: self.column,
        }
    }
}

pub fn lex(src: &str, filename: &str) -> Result<Vec<Spanned>, SyntaxError> {
    let mut tokens = Vec::new();
    let mut cur = Cursor::new(src);

    while let Some(c) = cur.peek() {
        // Line comment
        if c == '/' && cur.peek_at(1) == Some('/') {
            while cur.peek().map_or(false, |c| c != '\n') {
                cur.bump();
            }
            continue;
        }

        // Block comment; `/**` is documentation and becomes a token
        if c == '/' && cur.peek_at(1) == Some('*') {
            let mark = cur.mark();
            let is_doc = cur.peek_at(2) == Some('*') && cur.peek_at(3) != Some('/');
            cur.bump();
            cur.bump();
            loop {
                match cur.peek() {
                    None => {
                        return Err(SyntaxError::new(
                            filename,
                            mark.1,
                            mark.2,
                            "unterminated block comment",
                        ));
                    }
                    Some('*') if cur.peek_at(1) == Some('/') => {
                        cur.bump();
                        cur.bump();
                        break;
                    }
                    Some(_) => {
                        cur.bump();
                    }
                }
            }
            if is_doc {
                let span = cur.span_from(mark);
                tokens.push(Spanned {
                    token: Token::Javadoc,
                    text: src[span.start..span.end].to_owned(),
                    span,
                });
            }
            continue;
        }

        // Whitespace
        if c.is_whitespace() {
            cur.bump();
            continue;
        }

        let mark = cur.mark();

        // String literal, raw
        if c == '"' || c == '\'' {
            cur.bump();
            loop {
                match cur.bump() {
                    None | Some('\n') => {
                        return Err(SyntaxError::new(
                            filename,
                            mark.1,
                            mark.2,
                            "unterminated string literal",
                        ));
                    }
                    Some('\\') => {
                        if cur.bump().is_none() {
                            return Err(SyntaxError::new(
                                filename,
                                mark.1,
                                mark.2,
                                "unterminated escape in string",
                            ));
                        }
                    }
                    Some(q) if q == c => break,
                    Some(_) => {}
                }
            }
            let token = if c == '"' {
                Token::DoubleQuoted
            } else {
                Token::SingleQuoted
            };
            push(&mut tokens, &cur, token, mark);
            continue;
        }

        // Number
        if c.is_ascii_digit()
            || (c == '-' && cur.peek_at(1).map_or(false, |n| n.is_ascii_digit()))
        {
            cur.bump();
            while cur.peek().map_or(false, |c| c.is_ascii_digit()) {
                cur.bump();
            }
            let token = if cur.peek() == Some('.')
                && cur.peek_at(1).map_or(false, |n| n.is_ascii_digit())
            {
                cur.bump(); // consume '.'
                while cur.peek().map_or(false, |c| c.is_ascii_digit()) {
                    cur.bump();
                }
                Token::Number
            } else {
                Token::Int
            };
            push(&mut tokens, &cur, token, mark);
            continue;
        }

        // Identifier / keyword
        if c.is_alphabetic() || c == '_' {
            while cur.peek().map_or(false, |c| c.is_alphanumeric() || c == '_') {
                cur.bump();
            }
            push(&mut tokens, &cur, Token::Word, mark);
            continue;
        }

        let token = match c {
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            '(' => Token::LParen,
            ')' => Token::RParen,
            ':' => Token::Colon,
            ',' => Token::Comma,
            '.' => Token::Dot,
            '=' => Token::Eq,
            '?' => Token::Question,
            '@' => Token::At,
            '*' => Token::Star,
            _ => Token::Unknown,
        };
        cur.bump();
        push(&mut tokens, &cur, token, mark);
    }

    let mark = cur.mark();
    tokens.push(Spanned {
        token: Token::Eof,
        text: String::new(),
        span: cur.span_from(mark),
    });
    Ok(tokens)
}

fn push(tokens: &mut Vec<Spanned>, cur: &Cursor<'_>, token: Token, mark: (usize, u32, u32)) {
    let span = cur.span_from(mark);
    tokens.push(Spanned {
        token,
        text: cur.src[span.start..span.end].to_owned(),
        span,
    });
}
