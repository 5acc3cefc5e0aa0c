//! DSL tests: syntax (parse success/failure) and semantics (resolve, references).

use parseed::ast::{
    Constant, Delimiter, Endian, EndianSpec, Expr, ListLength, MatchBody, MemberType, StructItem,
};
use parseed::{compile, parse, CompileError, Declaration, ResolvedSchema};

fn category(src: &str) -> &'static str {
    match compile(src, "dsl.pds") {
        Ok(_) => "ok",
        Err(e) => e.category(),
    }
}

// ==================== Syntax: valid programs ====================

#[test]
fn parse_empty_source() {
    let decls = parse("", "dsl.pds").expect("empty source parses");
    assert!(decls.is_empty());
    let decls = parse("  // only a comment\n\n", "dsl.pds").expect("comment only parses");
    assert!(decls.is_empty());
}

#[test]
fn parse_all_data_types() {
    let src = r#"
struct all_types {
    uint8 a, uint16 b, uint24 c, uint32 d, uint40 e, uint48 f, uint64 g, uint128 h,
    int8 i, int16 j, int24 k, int32 l, int40 m, int48 n, int64 o, int128 p,
    float q, double r, string s, bytes(4) t,
}
"#;
    let schema = compile(src, "dsl.pds").expect("compile");
    let s = schema.find_struct_by_name("all_types").expect("struct");
    assert_eq!(s.members().len(), 20);
    let sizes: Vec<Option<u32>> = s
        .plain_members()
        .map(|m| match &m.info.ty {
            MemberType::DataType(dt) => dt.byte_size,
            other => panic!("unexpected type {:?}", other),
        })
        .collect();
    assert_eq!(&sizes[..8], &[Some(1), Some(2), Some(3), Some(4), Some(5), Some(6), Some(8), Some(16)]);
    assert_eq!(sizes[18], None);
}

#[test]
fn parse_struct_with_comments() {
    let src = r#"
// packet header
BE struct header {   // trailing comment
    uint8 version,   //// many slashes
    // between members
    LE uint32 length,
}
"#;
    let schema = compile(src, "dsl.pds").expect("compile");
    let header = schema.find_struct_by_name("header").expect("header");
    let endians: Vec<EndianSpec> = header.plain_members().map(|m| m.info.endian.clone()).collect();
    assert_eq!(
        endians,
        vec![EndianSpec::Fixed(Endian::Big), EndianSpec::Fixed(Endian::Little)]
    );
}

#[test]
fn parse_nested_references_and_lists() {
    let src = r#"
struct point { int32 x, int32 y, }
struct polygon {
    uint16 count,
    point[count] vertices,
    point[] trailing,
    uint8[vertices.x != 0] until_zero,
}
"#;
    let schema = compile(src, "dsl.pds").expect("compile");
    let polygon = schema.find_struct_by_name("polygon").expect("polygon");
    let lists: Vec<&ListLength> = polygon
        .plain_members()
        .filter_map(|m| m.info.list.as_ref())
        .collect();
    assert!(matches!(lists[0], ListLength::Count(Expr::Identifier(id)) if id.name() == "count"));
    assert_eq!(lists[1], &ListLength::UntilEnd);
    assert!(matches!(lists[2], ListLength::While(_)));
}

#[test]
fn parse_delimited_strings() {
    let src = r#"
struct text {
    string plain,
    string('\n') line,
    string("\r\n") crlf,
    string(0) zero,
    bytes(\x0a) until_newline,
    uint8 size,
    bytes(size) sized,
}
"#;
    let schema = compile(src, "dsl.pds").expect("compile");
    let text = schema.find_struct_by_name("text").expect("text");
    let delimiters: Vec<Option<Vec<u8>>> = text
        .plain_members()
        .filter_map(|m| m.info.delimiter())
        .map(Delimiter::literal_bytes)
        .collect();
    assert_eq!(
        delimiters,
        vec![
            Some(vec![0]),
            Some(b"\n".to_vec()),
            Some(b"\r\n".to_vec()),
            Some(vec![0]),
            Some(vec![0x0a]),
            None,
        ]
    );
}

#[test]
fn parse_match_with_ternaries() {
    let src = r#"
struct opt { uint8 v, }
(version > 1 ? LE : BE) struct message {
    uint8 version,
    uint8 kind,
    match (kind & 0x0f) {
        1: opt,
        2: (version == 2 ? uint16 : uint32),
        3: (version == 2 ? LE : BE) uint64,
        -1: string,
    } body,
}
"#;
    // `0x0f` is not a literal form; the lexer sees `0` followed by identifier `x0f`.
    assert_eq!(category(src), "Invalid syntax error");

    let src = src.replace("0x0f", "15");
    let schema = compile(&src, "dsl.pds").expect("compile");
    let message = schema.find_struct_by_name("message").expect("message");
    assert!(matches!(message.endian(), EndianSpec::Ternary(_)));
    let Some(StructItem::Match(m)) = message.members().get(2) else {
        panic!("expected match");
    };
    let MatchBody::SingleMember { name, cases } = &m.body else {
        panic!("expected single-member match");
    };
    assert_eq!(name.as_str(), "body");
    let values: Vec<Option<Constant>> = cases.iter().map(|c| c.value.const_value()).collect();
    assert_eq!(
        values,
        vec![
            Some(Constant::Int(1)),
            Some(Constant::Int(2)),
            Some(Constant::Int(3)),
            Some(Constant::Int(-1)),
        ]
    );
    assert!(matches!(cases[2].body.endian, EndianSpec::Ternary(_)));
    assert!(matches!(cases[0].body.endian, EndianSpec::Ternary(_)), "inherits struct endian");
}

#[test]
fn parse_bitfields() {
    let src = r#"
bitfield status { ready, error, code(6), }
bitfield wide(4) { lo(16), hi(16), }
bitfield computed { a(2 * 4), b(1 << 3), }
bitfield nothing { }
"#;
    let decls = parse(src, "dsl.pds").expect("parse");
    let names: Vec<&str> = decls.iter().map(Declaration::name).collect();
    assert_eq!(names, vec!["status", "wide", "computed", "nothing"]);
    let schema = ResolvedSchema::resolve(decls).expect("resolve");
    let computed = schema.find_bitfield_by_name("computed").expect("computed");
    assert_eq!(computed.derived_bit_size().const_value(), Some(Constant::Int(16)));
}

// ==================== Syntax: invalid programs ====================

#[test]
fn reject_lexical_errors() {
    assert_eq!(category("struct t { uint8 $a, }"), "Illegal character error");
    assert_eq!(category("struct t { uint8[a = 1] x, }"), "Expected more chars error");
    assert_eq!(category("struct t { string(\"abc) x, }"), "Expected more chars error");
    assert_eq!(category("struct t { string('ab') x, }"), "Invalid syntax error");
}

#[test]
fn reject_structural_errors() {
    for src in [
        "struct { }",
        "struct t uint8 a, }",
        "struct t { uint8 a }",
        "struct t { uint8 a,, }",
        "struct t { uint8 , }",
        "struct t { LE LE uint8 a, }",
        "struct t { uint8[1 +] a, }",
        "struct t { (a == 1 ? uint8) a, }",
        "struct t { match k { 1: uint8, } v, }",
        "bitfield b { a(), }",
        "bitfield b { a b, }",
        "enum e { }",
    ] {
        assert_eq!(category(src), "Invalid syntax error", "{}", src);
    }
}

#[test]
fn reject_truncated_input() {
    for src in ["struct", "struct t", "struct t {", "bitfield b { a(3", "struct t { uint8[2"] {
        assert_eq!(category(src), "Expected more chars error", "{}", src);
    }
}

// ==================== Semantics ====================

#[test]
fn semantic_error_categories() {
    assert_eq!(category("struct a { } bitfield a { }"), "Duplicate struct or bitfield error");
    assert_eq!(category("struct a { uint8 x, uint16 x, }"), "Duplicate member error");
    assert_eq!(category("struct a { missing m, }"), "Unknown data type error");
    assert_eq!(category("struct a { a m, }"), "Recursive nested structs error");
}

#[test]
fn dotted_type_names_do_not_resolve() {
    match compile("struct inner { } struct outer { inner.sub x, }", "dsl.pds") {
        Err(CompileError::UnknownType { type_name, .. }) => assert_eq!(type_name, "inner.sub"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn bitfield_references_are_leaves() {
    let src = "bitfield f { a, } struct s { f flags, f[2] more, }";
    assert_eq!(category(src), "ok");
}

#[test]
fn error_display_is_category_and_detail() {
    let err = compile("struct test { unknown_type x, }", "dsl.pds").unwrap_err();
    assert_eq!(err.to_string(), "Unknown data type error: \"unknown_type\" in struct test");
}
