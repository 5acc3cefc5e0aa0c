//! Lexer: source text → flat [`Token`] list terminated by [`TokenKind::Eof`].
//!
//! Single forward pass with one character of lookahead. Comments are kept as tokens (the
//! parser skips them) so tools like `parseed --lexer` can show them.

use crate::ast::DataType;
use crate::error::{CompileError, CompileResult};
use crate::position::{Position, Span};
use std::fmt;

/// Reserved words. `LE`/`BE` select endianness.
pub const KEYWORDS: &[&str] = &["struct", "bitfield", "match", "LE", "BE"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Literals
    IntNumber,
    FloatNumber,
    String,
    Char,

    // Names
    Identifier,
    Keyword,
    DataType,

    // Arithmetic
    Plus,
    Minus,
    Star,
    Slash,

    // Bitwise
    Ampersand,
    Pipe,
    Caret,
    Tilde,
    ShiftLeft,
    ShiftRight,

    // Relational / logical
    EqualEqual,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    AndAnd,
    OrOr,

    // Punctuation
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Dot,
    Colon,
    Question,
    Backslash,

    Comment,
    Eof,
}

impl TokenKind {
    /// Stable upper-case name, used by the token dump.
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::IntNumber => "NUM_INT",
            TokenKind::FloatNumber => "NUM_FLOAT",
            TokenKind::String => "STRING",
            TokenKind::Char => "CHAR",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::Keyword => "KEYWORD",
            TokenKind::DataType => "DATA_TYPE",
            TokenKind::Plus => "PLUS",
            TokenKind::Minus => "MINUS",
            TokenKind::Star => "MULT",
            TokenKind::Slash => "DIV",
            TokenKind::Ampersand => "BIT_AND",
            TokenKind::Pipe => "BIT_OR",
            TokenKind::Caret => "BIT_XOR",
            TokenKind::Tilde => "BIT_NOT",
            TokenKind::ShiftLeft => "SHIFT_LEFT",
            TokenKind::ShiftRight => "SHIFT_RIGHT",
            TokenKind::EqualEqual => "COMP_EQ",
            TokenKind::NotEqual => "COMP_NE",
            TokenKind::Less => "COMP_LT",
            TokenKind::Greater => "COMP_GT",
            TokenKind::LessEqual => "COMP_LEQ",
            TokenKind::GreaterEqual => "COMP_GEQ",
            TokenKind::AndAnd => "AND",
            TokenKind::OrOr => "OR",
            TokenKind::LeftParen => "LPAREN",
            TokenKind::RightParen => "RPAREN",
            TokenKind::LeftBrace => "LCURLY",
            TokenKind::RightBrace => "RCURLY",
            TokenKind::LeftBracket => "LBRACK",
            TokenKind::RightBracket => "RBRACK",
            TokenKind::Comma => "COMMA",
            TokenKind::Dot => "DOT",
            TokenKind::Colon => "COLON",
            TokenKind::Question => "QUESTION",
            TokenKind::Backslash => "BACKSLASH",
            TokenKind::Comment => "COMMENT",
            TokenKind::Eof => "EOF",
        }
    }

    /// How the kind reads in an error message ("'{'", "identifier", ...).
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::IntNumber => "integer",
            TokenKind::FloatNumber => "float",
            TokenKind::String => "string literal",
            TokenKind::Char => "char literal",
            TokenKind::Identifier => "identifier",
            TokenKind::Keyword => "keyword",
            TokenKind::DataType => "data type",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Ampersand => "'&'",
            TokenKind::Pipe => "'|'",
            TokenKind::Caret => "'^'",
            TokenKind::Tilde => "'~'",
            TokenKind::ShiftLeft => "'<<'",
            TokenKind::ShiftRight => "'>>'",
            TokenKind::EqualEqual => "'=='",
            TokenKind::NotEqual => "'!='",
            TokenKind::Less => "'<'",
            TokenKind::Greater => "'>'",
            TokenKind::LessEqual => "'<='",
            TokenKind::GreaterEqual => "'>='",
            TokenKind::AndAnd => "'&&'",
            TokenKind::OrOr => "'||'",
            TokenKind::LeftParen => "'('",
            TokenKind::RightParen => "')'",
            TokenKind::LeftBrace => "'{'",
            TokenKind::RightBrace => "'}'",
            TokenKind::LeftBracket => "'['",
            TokenKind::RightBracket => "']'",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::Colon => "':'",
            TokenKind::Question => "'?'",
            TokenKind::Backslash => "'\\'",
            TokenKind::Comment => "comment",
            TokenKind::Eof => "end of input",
        }
    }
}

/// A lexed token. `text` is set for numbers, names, literals and comments.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: Option<String>,
    pub span: Span,
}

impl Token {
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text() == keyword
    }

    /// Token as it reads in an error message.
    pub fn describe(&self) -> String {
        match &self.text {
            Some(text) if self.kind != TokenKind::Comment => {
                format!("{} '{}'", self.kind.describe(), text)
            }
            _ => self.kind.describe().to_string(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.text {
            Some(text) => write!(f, "{}:{}", self.kind.name(), text),
            None => write!(f, "{}", self.kind.name()),
        }
    }
}

/// Lex a whole source text.
#[tracing::instrument(level = "debug", skip(source))]
pub fn tokenize(source: &str, source_id: &str) -> CompileResult<Vec<Token>> {
    let tokens = Lexer::new(source, source_id).run()?;
    tracing::debug!(tokens = tokens.len(), "lexing complete");
    Ok(tokens)
}

/// Lexer over one source text.
pub struct Lexer {
    pos: Position,
    tokens: Vec<Token>,
}

impl Lexer {
    pub fn new(source: &str, source_id: &str) -> Self {
        Lexer {
            pos: Position::start(source_id, source),
            tokens: Vec::new(),
        }
    }

    /// Consume the lexer and produce every token, ending with `Eof`.
    pub fn run(mut self) -> CompileResult<Vec<Token>> {
        while let Some(ch) = self.pos.current_char() {
            let start = self.pos.clone();
            match ch {
                ' ' | '\t' | '\r' | '\n' => self.pos.advance(),
                '0'..='9' => self.number(start, String::new()),
                '-' if self.peek_next().is_some_and(|c| c.is_ascii_digit())
                    && !self.previous_ends_operand() =>
                {
                    self.pos.advance();
                    self.number(start, "-".to_string());
                }
                '+' => self.single(start, TokenKind::Plus),
                '-' => self.single(start, TokenKind::Minus),
                '*' => self.single(start, TokenKind::Star),
                '^' => self.single(start, TokenKind::Caret),
                '~' => self.single(start, TokenKind::Tilde),
                '(' => self.single(start, TokenKind::LeftParen),
                ')' => self.single(start, TokenKind::RightParen),
                '{' => self.single(start, TokenKind::LeftBrace),
                '}' => self.single(start, TokenKind::RightBrace),
                '[' => self.single(start, TokenKind::LeftBracket),
                ']' => self.single(start, TokenKind::RightBracket),
                ',' => self.single(start, TokenKind::Comma),
                '.' => self.single(start, TokenKind::Dot),
                ':' => self.single(start, TokenKind::Colon),
                '?' => self.single(start, TokenKind::Question),
                '\\' => self.single(start, TokenKind::Backslash),
                '/' => {
                    if self.peek_next() == Some('/') {
                        self.comment(start);
                    } else {
                        self.single(start, TokenKind::Slash);
                    }
                }
                '&' => self.doubled(start, '&', TokenKind::AndAnd, TokenKind::Ampersand),
                '|' => self.doubled(start, '|', TokenKind::OrOr, TokenKind::Pipe),
                '<' => self.angle(start, '<', TokenKind::LessEqual, TokenKind::ShiftLeft, TokenKind::Less),
                '>' => self.angle(
                    start,
                    '>',
                    TokenKind::GreaterEqual,
                    TokenKind::ShiftRight,
                    TokenKind::Greater,
                ),
                '=' => self.needs_equal(start, TokenKind::EqualEqual)?,
                '!' => self.needs_equal(start, TokenKind::NotEqual)?,
                '"' => self.quoted(start, '"', TokenKind::String)?,
                '\'' => self.char_literal(start)?,
                c if c.is_ascii_alphabetic() => self.identifier(start),
                c => {
                    self.pos.advance();
                    return Err(CompileError::IllegalCharacter {
                        span: Span::new(start, self.pos.clone()),
                        character: c,
                    });
                }
            }
        }

        let end = self.pos.clone();
        self.tokens.push(Token {
            kind: TokenKind::Eof,
            text: None,
            span: Span::new(end.clone(), end),
        });
        Ok(self.tokens)
    }

    fn peek_next(&self) -> Option<char> {
        self.pos.source_text()[self.pos.index()..].chars().nth(1)
    }

    /// True when a `-` here must be the binary minus rather than a literal sign: the
    /// previous token is an operand ending right at the `-`, with no whitespace between.
    fn previous_ends_operand(&self) -> bool {
        self.tokens.last().is_some_and(|t| {
            t.span.end.index() == self.pos.index()
                && matches!(
                    t.kind,
                    TokenKind::IntNumber
                        | TokenKind::FloatNumber
                        | TokenKind::Identifier
                        | TokenKind::DataType
                        | TokenKind::RightParen
                        | TokenKind::RightBracket
                )
        })
    }

    fn push(&mut self, kind: TokenKind, text: Option<String>, start: Position) {
        self.tokens.push(Token {
            kind,
            text,
            span: Span::new(start, self.pos.clone()),
        });
    }

    fn single(&mut self, start: Position, kind: TokenKind) {
        self.pos.advance();
        self.push(kind, None, start);
    }

    /// `&&` / `||` when the character repeats, otherwise the single form.
    fn doubled(&mut self, start: Position, ch: char, double: TokenKind, single: TokenKind) {
        self.pos.advance();
        if self.pos.current_char() == Some(ch) {
            self.pos.advance();
            self.push(double, None, start);
        } else {
            self.push(single, None, start);
        }
    }

    /// `<=` / `<<` / `<` and the `>` family.
    fn angle(
        &mut self,
        start: Position,
        ch: char,
        or_equal: TokenKind,
        shift: TokenKind,
        plain: TokenKind,
    ) {
        self.pos.advance();
        match self.pos.current_char() {
            Some('=') => {
                self.pos.advance();
                self.push(or_equal, None, start);
            }
            Some(c) if c == ch => {
                self.pos.advance();
                self.push(shift, None, start);
            }
            _ => self.push(plain, None, start),
        }
    }

    /// `==` and `!=`; a lone `=` or `!` is an error.
    fn needs_equal(&mut self, start: Position, kind: TokenKind) -> CompileResult<()> {
        self.pos.advance();
        if self.pos.current_char() != Some('=') {
            return Err(CompileError::ExpectedMoreCharacters {
                span: Span::new(start, self.pos.clone()),
                expected: vec!["=".to_string()],
            });
        }
        self.pos.advance();
        self.push(kind, None, start);
        Ok(())
    }

    /// Digits with at most one `.`; `text` may already hold a leading `-`.
    fn number(&mut self, start: Position, mut text: String) {
        let mut seen_dot = false;
        while let Some(ch) = self.pos.current_char() {
            if ch == '.' {
                if seen_dot {
                    break;
                }
                seen_dot = true;
            } else if !ch.is_ascii_digit() {
                break;
            }
            text.push(ch);
            self.pos.advance();
        }
        let kind = if seen_dot {
            TokenKind::FloatNumber
        } else {
            TokenKind::IntNumber
        };
        self.push(kind, Some(text), start);
    }

    /// `//...` up to (not including) the newline. All leading slashes are dropped.
    fn comment(&mut self, start: Position) {
        while self.pos.current_char() == Some('/') {
            self.pos.advance();
        }
        let mut text = String::new();
        while let Some(ch) = self.pos.current_char() {
            if ch == '\n' {
                break;
            }
            text.push(ch);
            self.pos.advance();
        }
        self.push(TokenKind::Comment, Some(text), start);
    }

    /// Raw content between `quote`s. A backslash keeps the next character, so `\"` does not
    /// close the literal. Escapes are left undecoded in the token text.
    fn quoted(&mut self, start: Position, quote: char, kind: TokenKind) -> CompileResult<()> {
        self.pos.advance();
        let mut text = String::new();
        loop {
            match self.pos.current_char() {
                None => {
                    return Err(CompileError::ExpectedMoreCharacters {
                        span: Span::new(start, self.pos.clone()),
                        expected: vec![quote.to_string()],
                    });
                }
                Some(c) if c == quote => {
                    self.pos.advance();
                    break;
                }
                Some('\\') => {
                    text.push('\\');
                    self.pos.advance();
                    let Some(escaped) = self.pos.current_char() else {
                        continue;
                    };
                    text.push(escaped);
                    self.pos.advance();
                }
                Some(c) => {
                    text.push(c);
                    self.pos.advance();
                }
            }
        }
        self.push(kind, Some(text), start);
        Ok(())
    }

    fn char_literal(&mut self, start: Position) -> CompileResult<()> {
        self.quoted(start, '\'', TokenKind::Char)?;
        let Some(token) = self.tokens.last() else {
            return Ok(());
        };
        let content = token.text();
        let len = content.chars().count();
        let valid = if content.starts_with('\\') {
            (2..=3).contains(&len)
        } else {
            len == 1
        };
        if valid {
            Ok(())
        } else {
            Err(CompileError::syntax(
                token.span.clone(),
                format!(
                    "char literal must hold one character or a short escape, found '{}'",
                    content
                ),
            ))
        }
    }

    /// Letters, digits and `_`, then classified as keyword, data type or identifier.
    fn identifier(&mut self, start: Position) {
        let mut text = String::new();
        while let Some(ch) = self.pos.current_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                text.push(ch);
                self.pos.advance();
            } else {
                break;
            }
        }
        let kind = if KEYWORDS.contains(&text.as_str()) {
            TokenKind::Keyword
        } else if DataType::lookup(&text).is_some() {
            TokenKind::DataType
        } else {
            TokenKind::Identifier
        };
        self.push(kind, Some(text), start);
    }
}
