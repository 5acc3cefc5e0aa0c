//! Text dumps of compiler stages: the token list and an indented declaration tree.
//!
//! [`TreeDump`] doubles as the reference [`Generator`]: it walks every node kind, and
//! constant sizes are shown folded.

use crate::ast::{
    BitfieldDef, BitfieldSize, Constant, Declaration, Delimiter, EndianSpec, Expr, ListLength,
    MatchBody, MatchStmt, MemberType, StructDef, StructItem, StructMember, StructMemberInfo,
    TypeRef,
};
use crate::generator::{Generator, Writer};
use crate::lexer::Token;
use crate::resolve::ResolvedSchema;
use std::fmt;

/// One token per line, `KIND` or `KIND:text`.
pub fn dump_tokens(tokens: &[Token]) -> String {
    tokens.iter().map(|t| format!("{}\n", t)).collect()
}

/// Indented tree of every declaration, in source order.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeDump;

impl Generator for TreeDump {
    fn generate(&self, schema: &ResolvedSchema, out: &mut Writer) -> fmt::Result {
        for declaration in schema.declarations() {
            match declaration {
                Declaration::Struct(s) => dump_struct(s, out)?,
                Declaration::Bitfield(b) => dump_bitfield(b, out)?,
            }
        }
        Ok(())
    }
}

fn dump_struct(def: &StructDef, out: &mut Writer) -> fmt::Result {
    out.line(format_args!("struct {} {}", def.name(), endian_text(def.endian())))?;
    out.indented(|out| {
        for item in def.members() {
            match item {
                StructItem::Member(m) => dump_member(m, out)?,
                StructItem::Match(m) => dump_match(m, out)?,
            }
        }
        Ok(())
    })
}

fn dump_member(member: &StructMember, out: &mut Writer) -> fmt::Result {
    out.line(format_args!("{}: {}", member.name.as_str(), info_text(&member.info)))
}

fn dump_match(stmt: &MatchStmt, out: &mut Writer) -> fmt::Result {
    match &stmt.body {
        MatchBody::SingleMember { name, cases } => {
            out.line(format_args!("match {} -> {}", stmt.condition, name.as_str()))?;
            out.indented(|out| {
                for case in cases {
                    out.line(format_args!("{} => {}", case.value, info_text(&case.body)))?;
                }
                Ok(())
            })
        }
        MatchBody::MemberGroups { cases } => {
            out.line(format_args!("match {}", stmt.condition))?;
            out.indented(|out| {
                for case in cases {
                    out.line(format_args!("{} =>", case.value))?;
                    out.indented(|out| {
                        for member in &case.body {
                            dump_member(member, out)?;
                        }
                        Ok(())
                    })?;
                }
                Ok(())
            })
        }
    }
}

fn dump_bitfield(def: &BitfieldDef, out: &mut Writer) -> fmt::Result {
    let size = match def.size() {
        BitfieldSize::ExplicitBytes(bytes) => format!("{} bytes", folded(bytes)),
        BitfieldSize::DerivedBits(bits) => format!("{} bits", folded(&bits)),
    };
    out.line(format_args!("bitfield {} ({})", def.name(), size))?;
    out.indented(|out| {
        for member in def.members() {
            out.line(format_args!("{}: {}", member.name(), folded(member.bit_size())))?;
        }
        Ok(())
    })
}

/// Literal value when the expression folds, the expression otherwise.
fn folded(expr: &Expr) -> String {
    match expr.const_value() {
        Some(Constant::Int(v)) => v.to_string(),
        Some(Constant::Float(v)) => format!("{:?}", v),
        None => expr.to_string(),
    }
}

fn endian_text(endian: &EndianSpec) -> String {
    match endian {
        EndianSpec::Fixed(e) => e.keyword().to_string(),
        EndianSpec::Ternary(t) => format!(
            "({} ? {} : {})",
            t.condition,
            t.if_true.keyword(),
            t.if_false.keyword()
        ),
    }
}

fn info_text(info: &StructMemberInfo) -> String {
    let mut text = match &info.ty {
        MemberType::DataType(dt) => dt.name.clone(),
        MemberType::Named(ident) => ident.name(),
        MemberType::Ternary(t) => format!(
            "({} ? {} : {})",
            t.condition,
            type_ref_text(&t.if_true),
            type_ref_text(&t.if_false)
        ),
    };
    match &info.list {
        None => {}
        Some(ListLength::UntilEnd) => text.push_str("[]"),
        Some(ListLength::Count(count)) => text.push_str(&format!("[{}]", count)),
        Some(ListLength::While(cond)) => text.push_str(&format!("[while {}]", cond)),
    }
    text.push(' ');
    text.push_str(&endian_text(&info.endian));
    if let Some(delimiter) = info.delimiter() {
        text.push_str(&format!(" until {}", delimiter_text(delimiter)));
    }
    text
}

fn type_ref_text(ty: &TypeRef) -> String {
    match ty {
        TypeRef::DataType(dt) => dt.name.clone(),
        TypeRef::Named(ident) => ident.name(),
    }
}

fn delimiter_text(delimiter: &Delimiter) -> String {
    match delimiter {
        Delimiter::String { text, .. } => format!("\"{}\"", text),
        Delimiter::Char { text, .. } => format!("'{}'", text),
        Delimiter::Int { value, .. } => format!("{:#04x}", value),
        Delimiter::Member(ident) => ident.name(),
    }
}
