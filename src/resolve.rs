//! Semantic validation and the read-only schema handed to generators.
//!
//! [`ResolvedSchema::resolve`] runs three checks in order, each stopping at the first error:
//!
//! 1. no two declarations (struct or bitfield) share a name;
//! 2. no struct has two members with the same name;
//! 3. every referenced type exists, and no struct contains itself.
//!
//! Structs refer to each other by name only, so the recursion check is a search over the
//! name table with an explicit stack.

use crate::ast::{
    BitfieldDef, Declaration, Identifier, MatchBody, MemberType, Name, StructDef, StructItem,
    StructMember, StructMemberInfo, TypeRef,
};
use crate::error::{CompileError, CompileResult};
use crate::position::Span;
use std::collections::{HashMap, HashSet};

/// Validated declarations with name lookup. Immutable once built.
#[derive(Debug, Clone)]
pub struct ResolvedSchema {
    declarations: Vec<Declaration>,
    structs_by_name: HashMap<String, usize>,
    bitfields_by_name: HashMap<String, usize>,
}

impl ResolvedSchema {
    #[tracing::instrument(level = "debug", skip_all, fields(declarations = declarations.len()))]
    pub fn resolve(declarations: Vec<Declaration>) -> CompileResult<Self> {
        check_duplicate_declarations(&declarations)?;
        tracing::debug!("no duplicate declarations");

        let mut structs_by_name = HashMap::new();
        let mut bitfields_by_name = HashMap::new();
        for (i, declaration) in declarations.iter().enumerate() {
            match declaration {
                Declaration::Struct(s) => structs_by_name.insert(s.name().to_string(), i),
                Declaration::Bitfield(b) => bitfields_by_name.insert(b.name().to_string(), i),
            };
        }
        let schema = ResolvedSchema {
            declarations,
            structs_by_name,
            bitfields_by_name,
        };

        for s in schema.structs() {
            check_duplicate_members(s)?;
        }
        tracing::debug!("no duplicate members");

        schema.check_all_types()?;
        tracing::debug!("all types known, no recursive structs");

        Ok(schema)
    }

    /// Declarations in source order.
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn structs(&self) -> impl Iterator<Item = &StructDef> {
        self.declarations.iter().filter_map(|d| match d {
            Declaration::Struct(s) => Some(s),
            Declaration::Bitfield(_) => None,
        })
    }

    pub fn bitfields(&self) -> impl Iterator<Item = &BitfieldDef> {
        self.declarations.iter().filter_map(|d| match d {
            Declaration::Bitfield(b) => Some(b),
            Declaration::Struct(_) => None,
        })
    }

    pub fn find_struct_by_name(&self, name: &str) -> Option<&StructDef> {
        match self.declarations.get(*self.structs_by_name.get(name)?) {
            Some(Declaration::Struct(s)) => Some(s),
            _ => None,
        }
    }

    pub fn find_bitfield_by_name(&self, name: &str) -> Option<&BitfieldDef> {
        match self.declarations.get(*self.bitfields_by_name.get(name)?) {
            Some(Declaration::Bitfield(b)) => Some(b),
            _ => None,
        }
    }

    fn is_declared(&self, name: &str) -> bool {
        self.structs_by_name.contains_key(name) || self.bitfields_by_name.contains_key(name)
    }

    fn check_all_types(&self) -> CompileResult<()> {
        let mut acyclic = HashSet::new();
        for s in self.structs() {
            self.check_types(s, &mut acyclic)?;
        }
        Ok(())
    }

    /// Unknown-type and recursion checks, member by member.
    fn check_types<'a>(
        &'a self,
        def: &'a StructDef,
        acyclic: &mut HashSet<&'a str>,
    ) -> CompileResult<()> {
        for info in member_infos(def) {
            for ident in all_type_refs(info) {
                if !self.is_declared(&ident.name()) {
                    return Err(CompileError::UnknownType {
                        span: ident.span.clone(),
                        type_name: ident.name(),
                        struct_name: def.name().to_string(),
                    });
                }
            }
            if let MemberType::Named(ident) = &info.ty {
                self.check_recursion(def, ident, acyclic)?;
            }
        }
        Ok(())
    }

    /// Depth-first walk from `root` through the struct named by `first`. Only a path back
    /// to a struct on the current stack is a cycle; structs fully explored without finding
    /// one are remembered in `acyclic`.
    fn check_recursion<'a>(
        &'a self,
        root: &'a StructDef,
        first: &'a Identifier,
        acyclic: &mut HashSet<&'a str>,
    ) -> CompileResult<()> {
        let mut stack = vec![Frame {
            def: root,
            refs: vec![first],
            next: 0,
            via: None,
        }];

        while let Some(frame) = stack.last_mut() {
            let Some(&ident) = frame.refs.get(frame.next) else {
                if let Some(done) = stack.pop() {
                    if !stack.is_empty() {
                        acyclic.insert(done.def.name());
                    }
                }
                continue;
            };
            frame.next += 1;

            // bitfields and unknown names are leaves
            let Some(target) = self.find_struct_by_name(&ident.name()) else {
                continue;
            };
            if acyclic.contains(target.name()) {
                continue;
            }
            if let Some(at) = stack.iter().position(|f| f.def.name() == target.name()) {
                let mut cycle: Vec<String> =
                    stack[at..].iter().map(|f| f.def.name().to_string()).collect();
                cycle.push(target.name().to_string());
                let mut spans: Vec<Span> = stack[at + 1..]
                    .iter()
                    .filter_map(|f| f.via.map(|via| via.span.clone()))
                    .collect();
                spans.push(ident.span.clone());
                tracing::debug!(cycle = %cycle.join(" -> "), "recursive struct");
                return Err(CompileError::RecursiveStruct { spans, cycle });
            }
            stack.push(Frame {
                def: target,
                refs: followed_refs(target),
                next: 0,
                via: Some(ident),
            });
        }
        Ok(())
    }
}

struct Frame<'a> {
    def: &'a StructDef,
    refs: Vec<&'a Identifier>,
    next: usize,
    /// Reference that led into this struct.
    via: Option<&'a Identifier>,
}

/// Type-bearing parts of a struct: plain members, single-member match cases and the
/// members of every match group.
fn member_infos(def: &StructDef) -> Vec<&StructMemberInfo> {
    let mut infos = Vec::new();
    for item in def.members() {
        match item {
            StructItem::Member(m) => infos.push(&m.info),
            StructItem::Match(m) => match &m.body {
                MatchBody::SingleMember { cases, .. } => {
                    infos.extend(cases.iter().map(|c| &c.body))
                }
                MatchBody::MemberGroups { cases } => {
                    infos.extend(cases.iter().flat_map(|c| c.body.iter().map(|m| &m.info)))
                }
            },
        }
    }
    infos
}

/// Every named type a member mentions, ternary arms included.
fn all_type_refs(info: &StructMemberInfo) -> Vec<&Identifier> {
    match &info.ty {
        MemberType::DataType(_) => Vec::new(),
        MemberType::Named(ident) => vec![ident],
        MemberType::Ternary(ternary) => [&ternary.if_true, &ternary.if_false]
            .into_iter()
            .filter_map(|arm| match arm {
                TypeRef::Named(ident) => Some(ident),
                TypeRef::DataType(_) => None,
            })
            .collect(),
    }
}

/// References the recursion walk descends into. Ternary arms are not followed.
fn followed_refs(def: &StructDef) -> Vec<&Identifier> {
    member_infos(def)
        .into_iter()
        .filter_map(|info| match &info.ty {
            MemberType::Named(ident) => Some(ident),
            _ => None,
        })
        .collect()
}

/// First name (by first appearance) that occurs more than once, with all its spans.
fn first_duplicate<'a>(names: impl IntoIterator<Item = &'a Name>) -> Option<(String, Vec<Span>)> {
    let mut order: Vec<&str> = Vec::new();
    let mut spans: HashMap<&str, Vec<Span>> = HashMap::new();
    for name in names {
        let entry = spans.entry(name.as_str()).or_default();
        if entry.is_empty() {
            order.push(name.as_str());
        }
        entry.push(name.span.clone());
    }
    order.into_iter().find_map(|name| {
        let found = spans.remove(name)?;
        (found.len() > 1).then(|| (name.to_string(), found))
    })
}

fn check_duplicate_declarations(declarations: &[Declaration]) -> CompileResult<()> {
    let names: Vec<Name> = declarations
        .iter()
        .map(|d| Name {
            value: d.name().to_string(),
            span: d.name_span().clone(),
        })
        .collect();
    match first_duplicate(&names) {
        Some((name, spans)) => Err(CompileError::DuplicateDeclaration { spans, name }),
        None => Ok(()),
    }
}

/// Top-level names are plain members plus the names bound by single-member matches. Each
/// member group of a match is checked together with the top-level names; alternative
/// groups may reuse each other's names.
fn check_duplicate_members(def: &StructDef) -> CompileResult<()> {
    let mut top_level: Vec<&Name> = Vec::new();
    let mut groups: Vec<&[StructMember]> = Vec::new();
    for item in def.members() {
        match item {
            StructItem::Member(m) => top_level.push(&m.name),
            StructItem::Match(m) => match &m.body {
                MatchBody::SingleMember { name, .. } => top_level.push(name),
                MatchBody::MemberGroups { cases } => {
                    groups.extend(cases.iter().map(|c| c.body.as_slice()))
                }
            },
        }
    }

    let duplicate = first_duplicate(top_level.iter().copied()).or_else(|| {
        groups.iter().find_map(|group| {
            first_duplicate(
                top_level
                    .iter()
                    .copied()
                    .chain(group.iter().map(|m| &m.name)),
            )
        })
    });
    match duplicate {
        Some((member_name, spans)) => Err(CompileError::DuplicateMember {
            spans,
            member_name,
            struct_name: def.name().to_string(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use proptest::prelude::*;

    fn resolve(src: &str) -> CompileResult<ResolvedSchema> {
        ResolvedSchema::resolve(parse(src, "test.pds").expect("parse"))
    }

    fn cycle_of(src: &str) -> Vec<String> {
        match resolve(src) {
            Err(CompileError::RecursiveStruct { cycle, .. }) => cycle,
            other => panic!("expected recursion error, got {:?}", other),
        }
    }

    #[test]
    fn lookup_by_name() {
        let schema = resolve("struct a { flags f, } bitfield flags { x, }").expect("resolve");
        assert_eq!(schema.find_struct_by_name("a").map(StructDef::name), Some("a"));
        assert_eq!(schema.find_bitfield_by_name("flags").map(BitfieldDef::name), Some("flags"));
        assert!(schema.find_struct_by_name("flags").is_none());
        assert!(schema.find_bitfield_by_name("a").is_none());
        assert_eq!(schema.structs().count(), 1);
        assert_eq!(schema.bitfields().count(), 1);
    }

    #[test]
    fn duplicate_declarations_across_kinds() {
        match resolve("struct x { } bitfield y { } bitfield x { } struct x { }") {
            Err(CompileError::DuplicateDeclaration { spans, name }) => {
                assert_eq!(name, "x");
                assert_eq!(spans.len(), 3);
                assert!(spans.iter().all(|s| s.text() == "x"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn duplicate_declarations_are_checked_before_types() {
        assert!(matches!(
            resolve("struct a { missing m, } struct a { }"),
            Err(CompileError::DuplicateDeclaration { .. })
        ));
    }

    #[test]
    fn duplicate_plain_members() {
        match resolve("struct s { uint8 a, uint8 b, uint16 a, }") {
            Err(CompileError::DuplicateMember {
                spans,
                member_name,
                struct_name,
            }) => {
                assert_eq!((member_name.as_str(), struct_name.as_str()), ("a", "s"));
                assert_eq!(spans.len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn match_names_take_part_in_duplicate_check() {
        let bound = "struct s { uint8 k, match (k) { 1: uint8, } k, }";
        assert!(matches!(resolve(bound), Err(CompileError::DuplicateMember { .. })));

        let against_top = "struct s { uint8 k, match (k) { 1: { uint8 k, }, }, }";
        assert!(matches!(resolve(against_top), Err(CompileError::DuplicateMember { .. })));

        let within_group = "struct s { uint8 k, match (k) { 1: { uint8 a, uint8 a, }, }, }";
        assert!(matches!(resolve(within_group), Err(CompileError::DuplicateMember { .. })));

        let across_groups = "struct s { uint8 k, match (k) { 1: { uint8 a, }, 2: { uint16 a, }, }, }";
        assert!(resolve(across_groups).is_ok());
    }

    #[test]
    fn unknown_types() {
        match resolve("struct test { unknown_type x, }") {
            Err(CompileError::UnknownType {
                span,
                type_name,
                struct_name,
            }) => {
                assert_eq!((type_name.as_str(), struct_name.as_str()), ("unknown_type", "test"));
                assert_eq!(span.text(), "unknown_type");
            }
            other => panic!("unexpected {:?}", other),
        }
        for src in [
            "struct t { (a == 1 ? uint8 : nope) x, }",
            "struct t { uint8 k, match (k) { 1: nope, } v, }",
            "struct t { uint8 k, match (k) { 1: { nope a, }, }, }",
            "struct t { nope[2] xs, }",
        ] {
            assert!(
                matches!(resolve(src), Err(CompileError::UnknownType { ref type_name, .. }) if type_name == "nope"),
                "{}",
                src
            );
        }
    }

    #[test]
    fn known_references_resolve() {
        let src = "bitfield flags { a, b(7), } struct inner { uint8 v, } \
                   struct outer { inner i, flags f, inner[2] more, (v == 1 ? inner : flags) t, }";
        assert!(resolve(src).is_ok());
    }

    #[test]
    fn two_struct_cycle() {
        assert_eq!(cycle_of("struct a { b x, } struct b { a y, }"), vec!["a", "b", "a"]);
    }

    #[test]
    fn three_struct_cycle_and_chain() {
        let cycle = cycle_of("struct a { b x, } struct b { c y, } struct c { a z, }");
        for name in ["a", "b", "c"] {
            assert!(cycle.iter().any(|c| c == name), "{:?}", cycle);
        }
        assert!(resolve("struct a { b x, } struct b { c y, } struct c { uint8 z, }").is_ok());
    }

    #[test]
    fn self_reference() {
        match resolve("struct node { uint8 v, node next, }") {
            Err(CompileError::RecursiveStruct { spans, cycle }) => {
                assert_eq!(cycle, vec!["node", "node"]);
                assert_eq!(spans.len(), 1);
                assert_eq!(spans[0].text(), "node");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn cycle_through_match_case() {
        let cycle = cycle_of("struct a { uint8 k, match (k) { 1: b, } v, } struct b { a back, }");
        assert_eq!(cycle, vec!["a", "b", "a"]);
    }

    #[test]
    fn ternary_arms_are_not_followed() {
        assert!(resolve("struct a { (x == 1 ? a : uint8) maybe, }").is_ok());
    }

    #[test]
    fn shared_struct_is_not_a_cycle() {
        let src = "struct leaf { uint8 v, } struct l { leaf x, } struct r { leaf y, } \
                   struct top { l a, r b, leaf c, }";
        assert!(resolve(src).is_ok());
    }

    #[test]
    fn cycle_below_the_root() {
        let cycle = cycle_of("struct top { b x, } struct b { c y, } struct c { b z, }");
        assert_eq!(cycle, vec!["b", "c", "b"]);
    }

    proptest! {
        #[test]
        fn duplicate_detection_symmetry(names in proptest::collection::vec("[a-e]", 1..8)) {
            let members: String = names.iter().map(|n| format!("uint8 {}, ", n)).collect();
            let src = format!("struct s {{ {}}}", members);
            let distinct: HashSet<&String> = names.iter().collect();
            let result = resolve(&src);
            if distinct.len() == names.len() {
                prop_assert!(result.is_ok());
            } else {
                let is_duplicate = matches!(result, Err(CompileError::DuplicateMember { ref spans, .. }) if spans.len() >= 2);
                prop_assert!(is_duplicate);
            }
        }
    }
}
