//! # parseed: DSL compiler for binary record layouts
//!
//! Compiles a textual description of binary records (structs, bitfields, match-selected
//! types, ternary types and endianness, lists, delimited strings) into a validated,
//! read-only AST that parser generators consume.
//!
//! ## Pipeline
//!
//! - **Lexer** ([`lexer::tokenize`]): text → tokens, with positions for diagnostics
//! - **Parser** ([`parser::parse`]): recursive descent with backtracking → [`Declaration`]s
//! - **Validator** ([`ResolvedSchema::resolve`]): duplicate names, unknown types, recursive structs
//! - **Generators** ([`Generator`]): read the [`ResolvedSchema`]; [`TreeDump`] is the reference one
//!
//! Every stage stops at its first error, returned as a [`CompileError`].
//!
//! ## Data types
//!
//! - Integers: `uint8` .. `uint128`, `int8` .. `int128` (8, 16, 24, 32, 40, 48, 64, 128 bits)
//! - `float`, `double`
//! - `string` (NUL-delimited unless a delimiter is given), `bytes(delimiter or length)`
//!
//! ## Example DSL
//!
//! ```text
//! LE struct packet {
//!     uint8 kind,
//!     BE uint16 length,
//!     bytes(length) payload,
//!     match (kind) {
//!         1: header,
//!         2: (length > 4 ? uint32 : uint16),
//!     } body,
//!     flags[] rest,
//! }
//!
//! struct header { string("\r\n") line, }
//!
//! bitfield flags { ack, nak, reserved(6), }
//! ```
//!
//! ## Usage
//!
//! ```
//! let schema = parseed::compile("struct test { uint8 a, }", "example.pds").unwrap();
//! assert!(schema.find_struct_by_name("test").is_some());
//! ```

pub mod ast;
pub mod dump;
pub mod error;
pub mod generator;
pub mod lexer;
pub mod parser;
pub mod position;
pub mod resolve;

pub use ast::{BitfieldDef, Declaration, StructDef};
pub use dump::{dump_tokens, TreeDump};
pub use error::{CompileError, CompileResult};
pub use generator::{Generator, Writer};
pub use lexer::{tokenize, Token, TokenKind};
pub use parser::parse;
pub use position::{Position, Span};
pub use resolve::ResolvedSchema;

/// Compiler limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Deepest parser nesting (parentheses, unary chains, nested comparisons, ternaries)
    /// accepted before reporting "nesting too deep". The default fits a 2 MiB thread stack
    /// in a debug build.
    pub max_nesting_depth: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            max_nesting_depth: 128,
        }
    }
}

/// Lex, parse and validate one source text.
pub fn compile(source: &str, source_id: &str) -> CompileResult<ResolvedSchema> {
    compile_with(&CompileOptions::default(), source, source_id)
}

#[tracing::instrument(level = "debug", skip(options, source))]
pub fn compile_with(
    options: &CompileOptions,
    source: &str,
    source_id: &str,
) -> CompileResult<ResolvedSchema> {
    let declarations = parser::parse_with(source, source_id, options)?;
    ResolvedSchema::resolve(declarations)
}
