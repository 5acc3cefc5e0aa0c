//! Benchmark: lexing, parsing and the full compile pipeline over a synthetic layout with
//! many structs, match statements, ternaries and bitfields.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use parseed::{compile, parse, tokenize};

/// `count` record structs chained to their predecessor, plus one bitfield each.
fn synthetic_layout(count: usize) -> String {
    let mut src = String::new();
    for i in 0..count {
        src.push_str(&format!("bitfield flags{} {{ ack, nak, code(6), }}\n", i));
        src.push_str(&format!("LE struct record{} {{\n", i));
        src.push_str("    uint8 kind,\n    BE uint16 length,\n    bytes(length) payload,\n");
        src.push_str(&format!("    flags{} flags,\n", i));
        src.push_str("    uint8[length * 2 + 1] words,\n    uint8[kind != 0 && length > 3] tail,\n");
        src.push_str("    (kind == 1 ? LE : BE) (length > 255 ? uint32 : uint16) sized,\n");
        src.push_str("    match (kind) {\n        1: uint8,\n        2: string(\"\\r\\n\"),\n");
        if i > 0 {
            src.push_str(&format!("        3: record{},\n", i - 1));
        }
        src.push_str("    } body,\n}\n");
    }
    src
}

fn bench_compile(c: &mut Criterion) {
    let src = synthetic_layout(200);
    let tokens = tokenize(&src, "bench.pds").expect("lex");
    let schema = compile(&src, "bench.pds").expect("compile");
    eprintln!(
        "synthetic layout: {} bytes, {} tokens, {} declarations",
        src.len(),
        tokens.len(),
        schema.declarations().len()
    );

    c.bench_function("lex_synthetic_200", |b| {
        b.iter(|| tokenize(black_box(&src), "bench.pds"))
    });
    c.bench_function("parse_synthetic_200", |b| {
        b.iter(|| parse(black_box(&src), "bench.pds"))
    });
    c.bench_function("compile_synthetic_200", |b| {
        b.iter(|| compile(black_box(&src), "bench.pds"))
    });
}

criterion_group!(benches, bench_compile);
criterion_main!(benches);
