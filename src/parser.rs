//! Recursive-descent parser: tokens → [`Declaration`]s.
//!
//! The token list is fully materialised, so backtracking is an index reset. There are three
//! backtracking points:
//!
//! - a `(` before a member type is first tried as a ternary endian selector and, when its
//!   arms are not endian keywords, reparsed as a ternary type selector;
//! - a list length `[...]` is first tried as an expression and, when that does not end at
//!   `]`, reparsed as a comparison (repeat-while condition);
//! - a relation starting with `(` that does not parse as `expr relop expr` is reparsed as a
//!   parenthesised compound comparison.
//!
//! Comment tokens are skipped by [`Parser::advance`], so no rule has to deal with them.

use crate::ast::{
    BitfieldDef, BitfieldDefBuilder, BitfieldMemberBuilder, Comparison, DataType, Declaration,
    Delimiter, Endian, EndianSpec, Expr, Identifier, ListLength, MatchBody, MatchCase,
    MatchStmt, MemberType, Name, Operand, Operator, RelationalOp, StructDef, StructDefBuilder,
    StructItem, StructMember, StructMemberInfo, TernaryEndian, TernaryType, TypeRef,
};
use crate::error::{CompileError, CompileResult};
use crate::lexer::{tokenize, Token, TokenKind};
use crate::position::{Position, Span};
use crate::CompileOptions;

/// Outcome of a speculative parse. `NotApplicable` means "roll back and try the other
/// alternative"; it never leaves this module.
enum Speculation<T> {
    Parsed(T),
    NotApplicable,
}

/// Lex and parse one source text with default options.
pub fn parse(source: &str, source_id: &str) -> CompileResult<Vec<Declaration>> {
    parse_with(source, source_id, &CompileOptions::default())
}

pub fn parse_with(
    source: &str,
    source_id: &str,
    options: &CompileOptions,
) -> CompileResult<Vec<Declaration>> {
    let tokens = tokenize(source, source_id)?;
    Parser::with_options(tokens, options).run()
}

/// Shape committed to by the first case of a match statement.
#[derive(Clone, Copy, PartialEq, Eq)]
enum MatchShape {
    SingleMember,
    MemberGroups,
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self::with_options(tokens, &CompileOptions::default())
    }

    pub fn with_options(mut tokens: Vec<Token>, options: &CompileOptions) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let end = tokens
                .last()
                .map(|t| t.span.end.clone())
                .unwrap_or_else(|| Position::start("", ""));
            tokens.push(Token {
                kind: TokenKind::Eof,
                text: None,
                span: Span::new(end.clone(), end),
            });
        }
        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
            max_depth: options.max_nesting_depth,
        };
        parser.skip_comments();
        parser
    }

    /// Parse every declaration up to end of input.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn run(mut self) -> CompileResult<Vec<Declaration>> {
        let mut declarations = Vec::new();
        while !self.check(TokenKind::Eof) {
            let declaration = self.statement()?;
            tracing::trace!(name = declaration.name(), "parsed declaration");
            declarations.push(declaration);
        }
        tracing::debug!(declarations = declarations.len(), "parsing complete");
        Ok(declarations)
    }

    // ==================== Cursor helpers ====================

    fn current(&self) -> &Token {
        // `with_options` guarantees a trailing Eof and `advance` never moves past it.
        &self.tokens[self.pos]
    }

    fn kind_at(&self, index: usize) -> Option<TokenKind> {
        self.tokens.get(index).map(|t| t.kind)
    }

    fn skip_comments(&mut self) {
        while self.kind_at(self.pos) == Some(TokenKind::Comment) {
            self.pos += 1;
        }
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
            self.skip_comments();
        }
        token
    }

    fn rollback(&mut self, to: usize) {
        tracing::trace!(from = self.pos, to, "backtracking");
        self.pos = to;
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    /// `}` or end of input; the caller's `expect` reports the missing brace.
    fn at_block_end(&self) -> bool {
        self.check(TokenKind::RightBrace) || self.check(TokenKind::Eof)
    }

    fn check_keyword(&self, keyword: &str) -> bool {
        self.current().is_keyword(keyword)
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    fn expect(&mut self, kind: TokenKind) -> CompileResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(kind.describe()))
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> CompileResult<Token> {
        if self.check_keyword(keyword) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&format!("'{}'", keyword)))
        }
    }

    fn expect_name(&mut self, what: &str) -> CompileResult<Name> {
        if !self.check(TokenKind::Identifier) {
            return Err(self.unexpected(what));
        }
        let token = self.advance();
        Ok(Name {
            value: token.text().to_string(),
            span: token.span,
        })
    }

    /// Error for the current token. Running out of tokens is reported as missing input.
    fn unexpected(&self, expected: &str) -> CompileError {
        let token = self.current();
        if token.kind == TokenKind::Eof {
            CompileError::ExpectedMoreCharacters {
                span: token.span.clone(),
                expected: vec![expected.trim_matches('\'').to_string()],
            }
        } else {
            CompileError::syntax(
                token.span.clone(),
                format!("expected {}, found {}", expected, token.describe()),
            )
        }
    }

    /// Run `f` one nesting level deeper, failing once `max_nesting_depth` is exceeded.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> CompileResult<T>) -> CompileResult<T> {
        if self.depth >= self.max_depth {
            return Err(CompileError::syntax(
                self.current().span.clone(),
                "nesting too deep",
            ));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    // ==================== Declarations ====================

    fn statement(&mut self) -> CompileResult<Declaration> {
        if self.check_keyword("bitfield") {
            return self.bitfield_stmt().map(Declaration::Bitfield);
        }
        if self.check_keyword("struct")
            || self.check_keyword("LE")
            || self.check_keyword("BE")
            || self.check(TokenKind::LeftParen)
        {
            return self.struct_stmt().map(Declaration::Struct);
        }
        Err(self.unexpected("'struct' or 'bitfield'"))
    }

    fn struct_stmt(&mut self) -> CompileResult<StructDef> {
        let endian = if self.check_keyword("struct") {
            EndianSpec::default()
        } else {
            self.struct_endian()?
        };
        self.expect_keyword("struct")?;
        let name = self.expect_name("struct name")?;
        self.expect(TokenKind::LeftBrace)?;

        let mut builder = StructDefBuilder::new(name, endian);
        while !self.at_block_end() {
            let item = if self.check_keyword("match") {
                StructItem::Match(self.match_stmt(builder.endian())?)
            } else {
                StructItem::Member(self.struct_member(builder.endian())?)
            };
            builder.add_member(item);
        }
        self.expect(TokenKind::RightBrace)?;
        Ok(builder.finish())
    }

    /// Endian prefix of a struct. A ternary here must select between endian keywords.
    fn struct_endian(&mut self) -> CompileResult<EndianSpec> {
        if let Some(endian) = self.endian_keyword() {
            return Ok(EndianSpec::Fixed(endian));
        }
        let at = self.current().span.clone();
        match self.try_ternary_endian()? {
            Speculation::Parsed(ternary) => Ok(EndianSpec::Ternary(Box::new(ternary))),
            Speculation::NotApplicable => Err(CompileError::syntax(
                at,
                "struct endian selector must choose between LE and BE",
            )),
        }
    }

    fn endian_keyword(&mut self) -> Option<Endian> {
        let endian = match &self.current().kind {
            TokenKind::Keyword => Endian::from_keyword(self.current().text())?,
            _ => return None,
        };
        self.advance();
        Some(endian)
    }

    fn bitfield_stmt(&mut self) -> CompileResult<BitfieldDef> {
        self.expect_keyword("bitfield")?;
        let name = self.expect_name("bitfield name")?;
        let explicit_byte_size = if self.eat(TokenKind::LeftParen).is_some() {
            let size = self.expr()?;
            self.expect(TokenKind::RightParen)?;
            Some(size)
        } else {
            None
        };
        self.expect(TokenKind::LeftBrace)?;

        let mut builder = BitfieldDefBuilder::new(name, explicit_byte_size);
        while !self.at_block_end() {
            let mut member = BitfieldMemberBuilder::new(self.expect_name("bitfield member name")?);
            if self.eat(TokenKind::LeftParen).is_some() {
                member.set_bit_size(self.expr()?);
                self.expect(TokenKind::RightParen)?;
            }
            self.expect(TokenKind::Comma)?;
            builder.add_member(member.finish());
        }
        self.expect(TokenKind::RightBrace)?;
        Ok(builder.finish())
    }

    // ==================== Members ====================

    fn struct_member(&mut self, default_endian: &EndianSpec) -> CompileResult<StructMember> {
        let info = self.member_info(default_endian)?;
        let name = self.expect_name("member name")?;
        self.expect(TokenKind::Comma)?;
        Ok(StructMember { name, info })
    }

    /// `[endian] (data_type | ternary_type | IDENT) ["[" length "]"] ["(" delimiter ")"]`
    fn member_info(&mut self, default_endian: &EndianSpec) -> CompileResult<StructMemberInfo> {
        let mut endian = self.endian_keyword().map(EndianSpec::Fixed);
        let mut ty = None;
        if endian.is_none() && self.check(TokenKind::LeftParen) {
            match self.try_ternary_endian()? {
                Speculation::Parsed(ternary) => endian = Some(EndianSpec::Ternary(Box::new(ternary))),
                Speculation::NotApplicable => {
                    ty = Some(MemberType::Ternary(Box::new(self.ternary_type()?)))
                }
            }
        }
        let mut ty = match ty {
            Some(ty) => ty,
            None => self.member_type()?,
        };

        let list = if self.eat(TokenKind::LeftBracket).is_some() {
            Some(self.list_length()?)
        } else {
            None
        };

        if let MemberType::DataType(data_type) = &mut ty {
            if data_type.takes_delimiter() && self.check(TokenKind::LeftParen) {
                if data_type.delimiter.is_some() {
                    return Err(CompileError::syntax(
                        self.current().span.clone(),
                        format!("delimiter of '{}' given twice", data_type.name),
                    ));
                }
                data_type.delimiter = Some(self.delimiter()?);
            }
            Self::finish_delimiter(data_type)?;
        }

        Ok(StructMemberInfo {
            ty,
            endian: endian.unwrap_or_else(|| default_endian.clone()),
            list,
        })
    }

    fn member_type(&mut self) -> CompileResult<MemberType> {
        match self.current().kind {
            TokenKind::LeftParen => Ok(MemberType::Ternary(Box::new(self.ternary_type()?))),
            TokenKind::DataType => Ok(MemberType::DataType(self.data_type()?)),
            TokenKind::Identifier => Ok(MemberType::Named(self.identifier()?)),
            _ => Err(self.unexpected("data type or identifier")),
        }
    }

    fn type_ref(&mut self) -> CompileResult<TypeRef> {
        match self.current().kind {
            TokenKind::DataType => {
                let mut data_type = self.data_type()?;
                Self::finish_delimiter(&mut data_type)?;
                Ok(TypeRef::DataType(data_type))
            }
            TokenKind::Identifier => Ok(TypeRef::Named(self.identifier()?)),
            _ => Err(self.unexpected("data type or identifier")),
        }
    }

    /// Primitive type name, with its delimiter when one directly follows `string`/`bytes`.
    fn data_type(&mut self) -> CompileResult<DataType> {
        let token = self.expect(TokenKind::DataType)?;
        let Some(primitive) = DataType::lookup(token.text()) else {
            return Err(CompileError::syntax(
                token.span.clone(),
                format!("unknown data type '{}'", token.text()),
            ));
        };
        let mut data_type = DataType {
            name: primitive.name.to_string(),
            byte_size: primitive.byte_size,
            signed: primitive.signed,
            delimiter: None,
            span: token.span,
        };
        if data_type.takes_delimiter() && self.check(TokenKind::LeftParen) {
            data_type.delimiter = Some(self.delimiter()?);
        }
        Ok(data_type)
    }

    /// `string` defaults to a NUL delimiter; `bytes` must name one.
    fn finish_delimiter(data_type: &mut DataType) -> CompileResult<()> {
        if !data_type.takes_delimiter() || data_type.delimiter.is_some() {
            return Ok(());
        }
        if data_type.name == "bytes" {
            return Err(CompileError::syntax(
                data_type.span.clone(),
                "'bytes' requires a delimiter or length, e.g. bytes(4) or bytes(length)",
            ));
        }
        data_type.delimiter = Some(Delimiter::Int {
            value: 0,
            span: data_type.span.clone(),
        });
        Ok(())
    }

    fn delimiter(&mut self) -> CompileResult<Delimiter> {
        self.expect(TokenKind::LeftParen)?;
        let delimiter = match self.current().kind {
            TokenKind::String => {
                let token = self.advance();
                Delimiter::String {
                    text: token.text().to_string(),
                    span: token.span,
                }
            }
            TokenKind::Char => {
                let token = self.advance();
                Delimiter::Char {
                    text: token.text().to_string(),
                    span: token.span,
                }
            }
            TokenKind::IntNumber => {
                let token = self.advance();
                Delimiter::Int {
                    value: parse_int(&token)?,
                    span: token.span,
                }
            }
            TokenKind::Backslash => self.hex_escape()?,
            TokenKind::Identifier => Delimiter::Member(self.identifier()?),
            _ => return Err(self.unexpected("delimiter")),
        };
        self.expect(TokenKind::RightParen)?;
        Ok(delimiter)
    }

    /// `\x15` arrives as a backslash followed by the identifier `x15`.
    fn hex_escape(&mut self) -> CompileResult<Delimiter> {
        let backslash = self.expect(TokenKind::Backslash)?;
        let token = self.expect(TokenKind::Identifier)?;
        let span = backslash.span.to(&token.span);
        let value = token
            .text()
            .strip_prefix('x')
            .filter(|digits| (1..=2).contains(&digits.len()))
            .and_then(|digits| i64::from_str_radix(digits, 16).ok());
        match value {
            Some(value) => Ok(Delimiter::Int { value, span }),
            None => Err(CompileError::syntax(
                span,
                format!("invalid hex escape '\\{}', expected \\xH or \\xHH", token.text()),
            )),
        }
    }

    /// Contents of `[...]` after the opening bracket, closing bracket included.
    fn list_length(&mut self) -> CompileResult<ListLength> {
        if self.eat(TokenKind::RightBracket).is_some() {
            return Ok(ListLength::UntilEnd);
        }
        let start = self.pos;
        if let Ok(count) = self.expr() {
            if self.eat(TokenKind::RightBracket).is_some() {
                return Ok(ListLength::Count(count));
            }
        }
        self.rollback(start);
        let condition = self.comparison()?;
        self.expect(TokenKind::RightBracket)?;
        Ok(ListLength::While(condition))
    }

    // ==================== Ternaries ====================

    /// `( comparison ? LE|BE : LE|BE )`. Rolls back and reports `NotApplicable` when an arm
    /// is not an endian keyword; any other failure is a real error.
    fn try_ternary_endian(&mut self) -> CompileResult<Speculation<TernaryEndian>> {
        let start = self.pos;
        self.nested(|p| {
            let open = p.expect(TokenKind::LeftParen)?;
            let condition = p.comparison()?;
            p.expect(TokenKind::Question)?;
            let Some(if_true) = p.endian_keyword() else {
                p.rollback(start);
                return Ok(Speculation::NotApplicable);
            };
            p.expect(TokenKind::Colon)?;
            let Some(if_false) = p.endian_keyword() else {
                p.rollback(start);
                return Ok(Speculation::NotApplicable);
            };
            let close = p.expect(TokenKind::RightParen)?;
            Ok(Speculation::Parsed(TernaryEndian {
                condition,
                if_true,
                if_false,
                span: open.span.to(&close.span),
            }))
        })
    }

    fn ternary_type(&mut self) -> CompileResult<TernaryType> {
        self.nested(|p| {
            let open = p.expect(TokenKind::LeftParen)?;
            let condition = p.comparison()?;
            p.expect(TokenKind::Question)?;
            let if_true = p.type_ref()?;
            p.expect(TokenKind::Colon)?;
            let if_false = p.type_ref()?;
            let close = p.expect(TokenKind::RightParen)?;
            Ok(TernaryType {
                condition,
                if_true,
                if_false,
                span: open.span.to(&close.span),
            })
        })
    }

    // ==================== Match ====================

    fn match_stmt(&mut self, default_endian: &EndianSpec) -> CompileResult<MatchStmt> {
        let keyword = self.expect_keyword("match")?;
        self.expect(TokenKind::LeftParen)?;
        let condition = self.expr()?;
        self.expect(TokenKind::RightParen)?;
        self.expect(TokenKind::LeftBrace)?;
        if self.check(TokenKind::RightBrace) {
            return Err(CompileError::syntax(
                self.current().span.clone(),
                "match needs at least one case",
            ));
        }

        let mut shape = None;
        let mut single_cases = Vec::new();
        let mut group_cases = Vec::new();
        while !self.at_block_end() {
            let value = self.expr()?;
            self.expect(TokenKind::Colon)?;
            let case_shape = if self.check(TokenKind::LeftBrace) {
                MatchShape::MemberGroups
            } else {
                MatchShape::SingleMember
            };
            if *shape.get_or_insert(case_shape) != case_shape {
                return Err(CompileError::syntax(
                    value.span(),
                    "match cases mix single-member types and member groups",
                ));
            }
            match case_shape {
                MatchShape::SingleMember => {
                    let body = self.member_info(default_endian)?;
                    single_cases.push(MatchCase { value, body });
                }
                MatchShape::MemberGroups => {
                    let body = self.member_group(default_endian)?;
                    group_cases.push(MatchCase { value, body });
                }
            }
            self.expect(TokenKind::Comma)?;
        }
        self.expect(TokenKind::RightBrace)?;

        let body = match shape {
            Some(MatchShape::MemberGroups) => {
                if self.check(TokenKind::Identifier) {
                    return Err(CompileError::syntax(
                        self.current().span.clone(),
                        "a match over member groups does not bind a member name",
                    ));
                }
                MatchBody::MemberGroups { cases: group_cases }
            }
            _ => MatchBody::SingleMember {
                name: self.expect_name("member name after match block")?,
                cases: single_cases,
            },
        };
        self.expect(TokenKind::Comma)?;
        Ok(MatchStmt {
            condition,
            body,
            span: keyword.span,
        })
    }

    fn member_group(&mut self, default_endian: &EndianSpec) -> CompileResult<Vec<StructMember>> {
        let open = self.expect(TokenKind::LeftBrace)?;
        let mut members = Vec::new();
        while !self.at_block_end() {
            members.push(self.struct_member(default_endian)?);
        }
        let close = self.expect(TokenKind::RightBrace)?;
        if members.is_empty() {
            return Err(CompileError::syntax(
                open.span.to(&close.span),
                "member group needs at least one member",
            ));
        }
        Ok(members)
    }

    // ==================== Conditions ====================

    /// `||` chain over `&&` chains over relations, both left-associative.
    fn comparison(&mut self) -> CompileResult<Comparison> {
        self.nested(|p| {
            let mut left = p.conjunction()?;
            while p.eat(TokenKind::OrOr).is_some() {
                let right = p.conjunction()?;
                left = join(left, RelationalOp::Or, right);
            }
            Ok(left)
        })
    }

    fn conjunction(&mut self) -> CompileResult<Comparison> {
        let mut left = self.relation()?;
        while self.eat(TokenKind::AndAnd).is_some() {
            let right = self.relation()?;
            left = join(left, RelationalOp::And, right);
        }
        Ok(left)
    }

    fn relation(&mut self) -> CompileResult<Comparison> {
        let start = self.pos;
        match self.simple_relation() {
            Ok(relation) => Ok(relation),
            Err(_) if self.kind_at(start) == Some(TokenKind::LeftParen) => {
                self.rollback(start);
                self.expect(TokenKind::LeftParen)?;
                let inner = self.comparison()?;
                self.expect(TokenKind::RightParen)?;
                Ok(inner)
            }
            Err(err) => Err(err),
        }
    }

    fn simple_relation(&mut self) -> CompileResult<Comparison> {
        let left = self.expr()?;
        let op = match self.current().kind {
            TokenKind::EqualEqual => RelationalOp::Equal,
            TokenKind::NotEqual => RelationalOp::NotEqual,
            TokenKind::Less => RelationalOp::Less,
            TokenKind::Greater => RelationalOp::Greater,
            TokenKind::LessEqual => RelationalOp::LessEqual,
            TokenKind::GreaterEqual => RelationalOp::GreaterEqual,
            _ => return Err(self.unexpected("comparison operator")),
        };
        self.advance();
        let right = self.expr()?;
        Ok(Comparison {
            left: Box::new(Operand::Expr(left)),
            op,
            right: Box::new(Operand::Expr(right)),
        })
    }

    // ==================== Expressions ====================

    /// `term (("+" | "-" | bitop) term)*`
    fn expr(&mut self) -> CompileResult<Expr> {
        let mut left = self.term()?;
        while let Some(op) = additive_op(self.current().kind) {
            self.advance();
            let right = self.term()?;
            left = Expr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn term(&mut self) -> CompileResult<Expr> {
        let mut left = self.factor()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Star => Operator::Mul,
                TokenKind::Slash => Operator::Div,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.factor()?;
            left = Expr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
    }

    fn factor(&mut self) -> CompileResult<Expr> {
        if let Some(op) = additive_op(self.current().kind) {
            return self.nested(|p| {
                let token = p.advance();
                let operand = p.factor()?;
                Ok(Expr::Unary {
                    op,
                    span: token.span.to(&operand.span()),
                    operand: Box::new(operand),
                })
            });
        }
        match self.current().kind {
            TokenKind::IntNumber => {
                let token = self.advance();
                Ok(Expr::Int {
                    value: parse_int(&token)?,
                    span: token.span,
                })
            }
            TokenKind::FloatNumber => {
                let token = self.advance();
                let value = token.text().parse::<f64>().map_err(|_| {
                    CompileError::syntax(token.span.clone(), "malformed float literal")
                })?;
                Ok(Expr::Float {
                    value,
                    span: token.span,
                })
            }
            TokenKind::LeftParen => self.nested(|p| {
                p.advance();
                let inner = p.expr()?;
                p.expect(TokenKind::RightParen)?;
                Ok(inner)
            }),
            TokenKind::Identifier => Ok(Expr::Identifier(self.identifier()?)),
            _ => Err(self.unexpected("expression")),
        }
    }

    /// `IDENT ("." IDENT)*`
    fn identifier(&mut self) -> CompileResult<Identifier> {
        let first = self.expect(TokenKind::Identifier)?;
        let mut path = vec![first.text().to_string()];
        let mut span = first.span;
        while self.eat(TokenKind::Dot).is_some() {
            if !self.check(TokenKind::Identifier) {
                return Err(self.unexpected("identifier after '.'"));
            }
            let segment = self.advance();
            path.push(segment.text().to_string());
            span = span.to(&segment.span);
        }
        Ok(Identifier { path, span })
    }
}

/// Operators allowed between terms and as a prefix of a factor.
fn additive_op(kind: TokenKind) -> Option<Operator> {
    match kind {
        TokenKind::Plus => Some(Operator::Add),
        TokenKind::Minus => Some(Operator::Sub),
        TokenKind::Ampersand => Some(Operator::BitAnd),
        TokenKind::Pipe => Some(Operator::BitOr),
        TokenKind::Caret => Some(Operator::BitXor),
        TokenKind::Tilde => Some(Operator::BitNot),
        TokenKind::ShiftLeft => Some(Operator::ShiftLeft),
        TokenKind::ShiftRight => Some(Operator::ShiftRight),
        _ => None,
    }
}

fn join(left: Comparison, op: RelationalOp, right: Comparison) -> Comparison {
    Comparison {
        left: Box::new(Operand::Comparison(left)),
        op,
        right: Box::new(Operand::Comparison(right)),
    }
}

fn parse_int(token: &Token) -> CompileResult<i64> {
    token.text().parse::<i64>().map_err(|_| {
        CompileError::syntax(
            token.span.clone(),
            format!("integer literal '{}' out of range", token.text()),
        )
    })
}
