//! Abstract Syntax Tree for the layout DSL.
//!
//! Node families are closed enums. Declarations reference each other by name only (a member
//! typed `Header` stores the identifier, never a link to the `Header` struct), so the tree
//! stays acyclic and the validator resolves names through [`ResolvedSchema`](crate::ResolvedSchema).
//!
//! [`StructDef`] and [`BitfieldDef`] are sealed: the parser fills a builder and consumes it
//! once the closing brace is read.

use crate::position::Span;
use std::fmt;

// ==================== Primitive data types ====================

/// Entry of the primitive type table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Primitive {
    pub name: &'static str,
    /// `None` for variable-size types (`string`, `bytes`).
    pub byte_size: Option<u32>,
    pub signed: bool,
}

const fn primitive(name: &'static str, byte_size: Option<u32>, signed: bool) -> Primitive {
    Primitive {
        name,
        byte_size,
        signed,
    }
}

pub static DATA_TYPES: &[Primitive] = &[
    primitive("uint8", Some(1), false),
    primitive("uint16", Some(2), false),
    primitive("uint24", Some(3), false),
    primitive("uint32", Some(4), false),
    primitive("uint40", Some(5), false),
    primitive("uint48", Some(6), false),
    primitive("uint64", Some(8), false),
    primitive("uint128", Some(16), false),
    primitive("int8", Some(1), true),
    primitive("int16", Some(2), true),
    primitive("int24", Some(3), true),
    primitive("int32", Some(4), true),
    primitive("int40", Some(5), true),
    primitive("int48", Some(6), true),
    primitive("int64", Some(8), true),
    primitive("int128", Some(16), true),
    primitive("float", Some(4), true),
    primitive("double", Some(8), true),
    primitive("string", None, false),
    primitive("bytes", None, false),
];

/// A primitive type as written on a member, with its delimiter for `string`/`bytes`.
#[derive(Debug, Clone, PartialEq)]
pub struct DataType {
    pub name: String,
    pub byte_size: Option<u32>,
    pub signed: bool,
    pub delimiter: Option<Delimiter>,
    pub span: Span,
}

impl DataType {
    pub fn lookup(name: &str) -> Option<&'static Primitive> {
        DATA_TYPES.iter().find(|p| p.name == name)
    }

    /// `string` and `bytes` are the delimited types.
    pub fn takes_delimiter(&self) -> bool {
        self.byte_size.is_none()
    }
}

/// End marker (or length source) of a `string`/`bytes` member.
#[derive(Debug, Clone, PartialEq)]
pub enum Delimiter {
    /// `"..."`, escapes kept as written.
    String { text: String, span: Span },
    /// `'x'`, escapes kept as written.
    Char { text: String, span: Span },
    /// Integer literal or `\xNN`.
    Int { value: i64, span: Span },
    /// Value of another member, known only when decoding.
    Member(Identifier),
}

impl Delimiter {
    pub fn span(&self) -> &Span {
        match self {
            Delimiter::String { span, .. } | Delimiter::Char { span, .. } | Delimiter::Int { span, .. } => span,
            Delimiter::Member(ident) => &ident.span,
        }
    }

    /// Bytes a decoder scans for. `None` for member-valued delimiters and integers that do
    /// not fit in a byte.
    pub fn literal_bytes(&self) -> Option<Vec<u8>> {
        match self {
            Delimiter::String { text, .. } | Delimiter::Char { text, .. } => Some(unescape(text)),
            Delimiter::Int { value, .. } => u8::try_from(*value).ok().map(|b| vec![b]),
            Delimiter::Member(_) => None,
        }
    }
}

/// Decode `\n \t \r \0 \\ \' \"` and `\xH`/`\xHH`. Unknown escapes yield the escaped char.
pub fn unescape(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut buf = [0u8; 4];
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        match chars.next() {
            Some('n') => out.push(b'\n'),
            Some('t') => out.push(b'\t'),
            Some('r') => out.push(b'\r'),
            Some('0') => out.push(0),
            Some('x') => {
                let mut value: u32 = 0;
                let mut digits = 0;
                while digits < 2 {
                    match chars.peek().and_then(|c| c.to_digit(16)) {
                        Some(d) => {
                            value = value * 16 + d;
                            digits += 1;
                            chars.next();
                        }
                        None => break,
                    }
                }
                if digits == 0 {
                    out.push(b'x');
                } else {
                    out.push(value as u8);
                }
            }
            Some(other) => out.extend_from_slice(other.encode_utf8(&mut buf).as_bytes()),
            None => out.push(b'\\'),
        }
    }
    out
}

// ==================== Names and expressions ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endian {
    Big,
    Little,
}

impl Endian {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "BE" => Some(Endian::Big),
            "LE" => Some(Endian::Little),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Endian::Big => "BE",
            Endian::Little => "LE",
        }
    }
}

/// A declared name (struct, bitfield or member) with the span of its token.
#[derive(Debug, Clone, PartialEq)]
pub struct Name {
    pub value: String,
    pub span: Span,
}

impl Name {
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

/// A possibly dotted reference: `len`, `header.flags.count`.
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub path: Vec<String>,
    pub span: Span,
}

impl Identifier {
    pub fn name(&self) -> String {
        self.path.join(".")
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Arithmetic and bitwise operators, shared by unary and binary nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    BitAnd,
    BitOr,
    BitXor,
    BitNot,
    ShiftLeft,
    ShiftRight,
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::BitAnd => "&",
            Operator::BitOr => "|",
            Operator::BitXor => "^",
            Operator::BitNot => "~",
            Operator::ShiftLeft => "<<",
            Operator::ShiftRight => ">>",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationalOp {
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    And,
    Or,
}

impl RelationalOp {
    pub fn symbol(self) -> &'static str {
        match self {
            RelationalOp::Equal => "==",
            RelationalOp::NotEqual => "!=",
            RelationalOp::Less => "<",
            RelationalOp::Greater => ">",
            RelationalOp::LessEqual => "<=",
            RelationalOp::GreaterEqual => ">=",
            RelationalOp::And => "&&",
            RelationalOp::Or => "||",
        }
    }
}

/// Arithmetic expression used for lengths, bit counts and match values.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int {
        value: i64,
        span: Span,
    },
    Float {
        value: f64,
        span: Span,
    },
    Identifier(Identifier),
    Unary {
        op: Operator,
        operand: Box<Expr>,
        span: Span,
    },
    Binary {
        left: Box<Expr>,
        op: Operator,
        right: Box<Expr>,
    },
}

/// Result of folding a literal-only expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constant {
    Int(i64),
    Float(f64),
}

impl Constant {
    pub fn as_i64(self) -> Option<i64> {
        match self {
            Constant::Int(v) => Some(v),
            Constant::Float(_) => None,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Constant::Int(v) => v as f64,
            Constant::Float(v) => v,
        }
    }
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Int { span, .. } | Expr::Float { span, .. } | Expr::Unary { span, .. } => span.clone(),
            Expr::Identifier(ident) => ident.span.clone(),
            Expr::Binary { left, right, .. } => left.span().to(&right.span()),
        }
    }

    /// Fold the expression when it only involves literals. Integer arithmetic wraps;
    /// division by zero, out-of-range shifts and bit operations on floats give `None`.
    pub fn const_value(&self) -> Option<Constant> {
        match self {
            Expr::Int { value, .. } => Some(Constant::Int(*value)),
            Expr::Float { value, .. } => Some(Constant::Float(*value)),
            Expr::Identifier(_) => None,
            Expr::Unary { op, operand, .. } => {
                let value = operand.const_value()?;
                match (op, value) {
                    (Operator::Add, v) => Some(v),
                    (Operator::Sub, Constant::Int(v)) => Some(Constant::Int(v.wrapping_neg())),
                    (Operator::Sub, Constant::Float(v)) => Some(Constant::Float(-v)),
                    (Operator::BitNot, Constant::Int(v)) => Some(Constant::Int(!v)),
                    _ => None,
                }
            }
            Expr::Binary { left, op, right } => {
                let l = left.const_value()?;
                let r = right.const_value()?;
                match (l, r) {
                    (Constant::Int(l), Constant::Int(r)) => fold_int(l, *op, r).map(Constant::Int),
                    (l, r) => fold_float(l.as_f64(), *op, r.as_f64()).map(Constant::Float),
                }
            }
        }
    }
}

fn fold_int(l: i64, op: Operator, r: i64) -> Option<i64> {
    match op {
        Operator::Add => Some(l.wrapping_add(r)),
        Operator::Sub => Some(l.wrapping_sub(r)),
        Operator::Mul => Some(l.wrapping_mul(r)),
        Operator::Div => l.checked_div(r),
        Operator::BitAnd => Some(l & r),
        Operator::BitOr => Some(l | r),
        Operator::BitXor => Some(l ^ r),
        Operator::ShiftLeft => u32::try_from(r).ok().and_then(|r| l.checked_shl(r)),
        Operator::ShiftRight => u32::try_from(r).ok().and_then(|r| l.checked_shr(r)),
        Operator::BitNot => None,
    }
}

fn fold_float(l: f64, op: Operator, r: f64) -> Option<f64> {
    match op {
        Operator::Add => Some(l + r),
        Operator::Sub => Some(l - r),
        Operator::Mul => Some(l * r),
        Operator::Div if r != 0.0 => Some(l / r),
        _ => None,
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Int { value, .. } => write!(f, "{}", value),
            Expr::Float { value, .. } => write!(f, "{:?}", value),
            Expr::Identifier(ident) => write!(f, "{}", ident),
            Expr::Unary { op, operand, .. } => write!(f, "({}{})", op.symbol(), operand),
            Expr::Binary { left, op, right } => write!(f, "({} {} {})", left, op.symbol(), right),
        }
    }
}

/// One side of a comparison: arithmetic, or a nested comparison joined by `&&`/`||`.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Expr(Expr),
    Comparison(Comparison),
}

impl Operand {
    pub fn span(&self) -> Span {
        match self {
            Operand::Expr(e) => e.span(),
            Operand::Comparison(c) => c.span(),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Expr(e) => write!(f, "{}", e),
            Operand::Comparison(c) => write!(f, "{}", c),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub left: Box<Operand>,
    pub op: RelationalOp,
    pub right: Box<Operand>,
}

impl Comparison {
    pub fn span(&self) -> Span {
        self.left.span().to(&self.right.span())
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {})", self.left, self.op.symbol(), self.right)
    }
}

// ==================== Member types ====================

/// Arm of a ternary type: a primitive or a declared struct/bitfield.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    DataType(DataType),
    Named(Identifier),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TernaryType {
    pub condition: Comparison,
    pub if_true: TypeRef,
    pub if_false: TypeRef,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TernaryEndian {
    pub condition: Comparison,
    pub if_true: Endian,
    pub if_false: Endian,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EndianSpec {
    Fixed(Endian),
    Ternary(Box<TernaryEndian>),
}

impl Default for EndianSpec {
    fn default() -> Self {
        EndianSpec::Fixed(Endian::Big)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberType {
    DataType(DataType),
    Named(Identifier),
    Ternary(Box<TernaryType>),
}

/// Repetition of a list member (`type[...] name`).
#[derive(Debug, Clone, PartialEq)]
pub enum ListLength {
    /// `[]`: repeat until the buffer is exhausted.
    UntilEnd,
    /// `[expr]`: fixed element count.
    Count(Expr),
    /// `[a == b]`: repeat while the condition holds.
    While(Comparison),
}

/// Everything about a member except its name.
#[derive(Debug, Clone, PartialEq)]
pub struct StructMemberInfo {
    pub ty: MemberType,
    pub endian: EndianSpec,
    pub list: Option<ListLength>,
}

impl StructMemberInfo {
    pub fn is_list(&self) -> bool {
        self.list.is_some()
    }

    pub fn delimiter(&self) -> Option<&Delimiter> {
        match &self.ty {
            MemberType::DataType(dt) => dt.delimiter.as_ref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructMember {
    pub name: Name,
    pub info: StructMemberInfo,
}

// ==================== Match statements ====================

#[derive(Debug, Clone, PartialEq)]
pub struct MatchCase<T> {
    pub value: Expr,
    pub body: T,
}

/// The two shapes of a match; a statement never mixes them.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchBody {
    /// `match (x) { 1: uint8, 2: uint16, } value,`: selects the type of one member.
    SingleMember {
        name: Name,
        cases: Vec<MatchCase<StructMemberInfo>>,
    },
    /// `match (x) { 1: { uint8 a, }, 2: { uint16 b, }, },`: selects a group of members.
    MemberGroups {
        cases: Vec<MatchCase<Vec<StructMember>>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchStmt {
    pub condition: Expr,
    pub body: MatchBody,
    /// Span of the `match` keyword.
    pub span: Span,
}

impl MatchStmt {
    pub fn bound_name(&self) -> Option<&Name> {
        match &self.body {
            MatchBody::SingleMember { name, .. } => Some(name),
            MatchBody::MemberGroups { .. } => None,
        }
    }
}

// ==================== Declarations ====================

#[derive(Debug, Clone, PartialEq)]
pub enum StructItem {
    Member(StructMember),
    Match(MatchStmt),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDef {
    name: Name,
    endian: EndianSpec,
    members: Vec<StructItem>,
}

impl StructDef {
    pub fn name(&self) -> &str {
        &self.name.value
    }

    pub fn name_span(&self) -> &Span {
        &self.name.span
    }

    pub fn endian(&self) -> &EndianSpec {
        &self.endian
    }

    pub fn members(&self) -> &[StructItem] {
        &self.members
    }

    /// Plain members only, skipping match statements.
    pub fn plain_members(&self) -> impl Iterator<Item = &StructMember> {
        self.members.iter().filter_map(|item| match item {
            StructItem::Member(m) => Some(m),
            StructItem::Match(_) => None,
        })
    }
}

/// Collects members while a `struct` body is parsed.
#[derive(Debug)]
pub struct StructDefBuilder {
    name: Name,
    endian: EndianSpec,
    members: Vec<StructItem>,
}

impl StructDefBuilder {
    pub fn new(name: Name, endian: EndianSpec) -> Self {
        StructDefBuilder {
            name,
            endian,
            members: Vec::new(),
        }
    }

    pub fn endian(&self) -> &EndianSpec {
        &self.endian
    }

    pub fn add_member(&mut self, item: StructItem) {
        self.members.push(item);
    }

    pub fn finish(self) -> StructDef {
        StructDef {
            name: self.name,
            endian: self.endian,
            members: self.members,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BitfieldMember {
    name: Name,
    bit_size: Expr,
}

impl BitfieldMember {
    pub fn name(&self) -> &str {
        &self.name.value
    }

    pub fn name_span(&self) -> &Span {
        &self.name.span
    }

    pub fn bit_size(&self) -> &Expr {
        &self.bit_size
    }
}

/// Bitfield member whose `(size)` annotation may still follow.
#[derive(Debug)]
pub struct BitfieldMemberBuilder {
    name: Name,
    bit_size: Option<Expr>,
}

impl BitfieldMemberBuilder {
    pub fn new(name: Name) -> Self {
        BitfieldMemberBuilder { name, bit_size: None }
    }

    pub fn set_bit_size(&mut self, size: Expr) {
        debug_assert!(self.bit_size.is_none(), "bit size set twice");
        self.bit_size = Some(size);
    }

    /// Without an annotation the member is one bit wide.
    pub fn finish(self) -> BitfieldMember {
        let bit_size = self.bit_size.unwrap_or_else(|| Expr::Int {
            value: 1,
            span: self.name.span.clone(),
        });
        BitfieldMember {
            name: self.name,
            bit_size,
        }
    }
}

/// Size of a bitfield: the declared byte count, or the sum of its members' bit sizes.
#[derive(Debug, Clone, PartialEq)]
pub enum BitfieldSize<'a> {
    ExplicitBytes(&'a Expr),
    DerivedBits(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BitfieldDef {
    name: Name,
    members: Vec<BitfieldMember>,
    explicit_byte_size: Option<Expr>,
}

impl BitfieldDef {
    pub fn name(&self) -> &str {
        &self.name.value
    }

    pub fn name_span(&self) -> &Span {
        &self.name.span
    }

    pub fn members(&self) -> &[BitfieldMember] {
        &self.members
    }

    pub fn explicit_byte_size(&self) -> Option<&Expr> {
        self.explicit_byte_size.as_ref()
    }

    pub fn size(&self) -> BitfieldSize<'_> {
        match &self.explicit_byte_size {
            Some(bytes) => BitfieldSize::ExplicitBytes(bytes),
            None => BitfieldSize::DerivedBits(self.derived_bit_size()),
        }
    }

    /// `m1 + (m2 + (... + mn))` over the member sizes; `0` for an empty bitfield.
    pub fn derived_bit_size(&self) -> Expr {
        self.members
            .iter()
            .rev()
            .fold(None, |acc: Option<Expr>, member| {
                Some(match acc {
                    None => member.bit_size.clone(),
                    Some(rest) => Expr::Binary {
                        left: Box::new(member.bit_size.clone()),
                        op: Operator::Add,
                        right: Box::new(rest),
                    },
                })
            })
            .unwrap_or_else(|| Expr::Int {
                value: 0,
                span: self.name.span.clone(),
            })
    }
}

#[derive(Debug)]
pub struct BitfieldDefBuilder {
    name: Name,
    members: Vec<BitfieldMember>,
    explicit_byte_size: Option<Expr>,
}

impl BitfieldDefBuilder {
    pub fn new(name: Name, explicit_byte_size: Option<Expr>) -> Self {
        BitfieldDefBuilder {
            name,
            members: Vec::new(),
            explicit_byte_size,
        }
    }

    pub fn add_member(&mut self, member: BitfieldMember) {
        self.members.push(member);
    }

    pub fn finish(self) -> BitfieldDef {
        BitfieldDef {
            name: self.name,
            members: self.members,
            explicit_byte_size: self.explicit_byte_size,
        }
    }
}

/// Top-level item of a source file.
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Struct(StructDef),
    Bitfield(BitfieldDef),
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Struct(s) => s.name(),
            Declaration::Bitfield(b) => b.name(),
        }
    }

    pub fn name_span(&self) -> &Span {
        match self {
            Declaration::Struct(s) => s.name_span(),
            Declaration::Bitfield(b) => b.name_span(),
        }
    }
}
