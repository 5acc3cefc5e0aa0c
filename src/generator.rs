//! Generator interface: backends receive a validated [`ResolvedSchema`] and write text through
//! a [`Writer`] that tracks indentation.
//!
//! The schema is read-only here. Everything a generator sees has already passed validation:
//! unique names, resolvable types, no recursive structs.

use crate::resolve::ResolvedSchema;
use std::fmt::{self, Write as _};

pub trait Generator {
    fn generate(&self, schema: &ResolvedSchema, out: &mut Writer) -> fmt::Result;

    /// Run the generator into a fresh [`Writer`].
    fn generate_to_string(&self, schema: &ResolvedSchema) -> Result<String, fmt::Error> {
        let mut out = Writer::new();
        self.generate(schema, &mut out)?;
        Ok(out.into_string())
    }
}

/// Text sink that prefixes every non-empty line with the current indentation.
#[derive(Debug, Clone)]
pub struct Writer {
    buf: String,
    level: usize,
    unit: String,
    at_line_start: bool,
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer {
    /// Two spaces per level.
    pub fn new() -> Self {
        Self::with_indent_unit("  ")
    }

    pub fn with_indent_unit(unit: &str) -> Self {
        Writer {
            buf: String::new(),
            level: 0,
            unit: unit.to_string(),
            at_line_start: true,
        }
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn indent(&mut self) {
        self.level += 1;
    }

    pub fn dedent(&mut self) {
        self.level = self.level.saturating_sub(1);
    }

    /// Run `f` one level deeper.
    pub fn indented(&mut self, f: impl FnOnce(&mut Self) -> fmt::Result) -> fmt::Result {
        self.indent();
        let result = f(self);
        self.dedent();
        result
    }

    pub fn line(&mut self, text: impl fmt::Display) -> fmt::Result {
        writeln!(self, "{}", text)
    }

    pub fn blank_line(&mut self) -> fmt::Result {
        self.write_char('\n')
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn into_string(self) -> String {
        self.buf
    }
}

impl fmt::Write for Writer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for piece in s.split_inclusive('\n') {
            if self.at_line_start && piece != "\n" {
                for _ in 0..self.level {
                    self.buf.push_str(&self.unit);
                }
            }
            self.buf.push_str(piece);
            self.at_line_start = piece.ends_with('\n');
        }
        Ok(())
    }
}
