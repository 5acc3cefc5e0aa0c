//! Compilation errors and their rendering as underlined source excerpts.
//!
//! Every stage stops at its first error. An error exposes a category, one or more spans and
//! a detail string; [`CompileError::render`] turns that triple into the text shown to users:
//!
//! ```text
//! File layout.pds, on line 2
//!     unknown_type x,
//!     ~~~~~~~~~~~~
//!
//! Unknown data type error: "unknown_type" in struct test
//! ```

use crate::position::{Position, Span};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    /// The lexer met a character outside the recognised set.
    #[error("Illegal character error: '{character}'")]
    IllegalCharacter { span: Span, character: char },

    /// A multi-character token was started but never completed.
    #[error("Expected more chars error: {}", quoted_list(.expected))]
    ExpectedMoreCharacters { span: Span, expected: Vec<String> },

    #[error("Invalid syntax error: {message}")]
    InvalidSyntax { span: Span, message: String },

    #[error("Unknown data type error: \"{type_name}\" in struct {struct_name}")]
    UnknownType {
        span: Span,
        type_name: String,
        struct_name: String,
    },

    #[error("Duplicate member error: {member_name} in struct {struct_name}")]
    DuplicateMember {
        spans: Vec<Span>,
        member_name: String,
        struct_name: String,
    },

    #[error("Duplicate struct or bitfield error: {name}")]
    DuplicateDeclaration { spans: Vec<Span>, name: String },

    /// `cycle` starts and ends with the same struct name.
    #[error("Recursive nested structs error: {}", .cycle.join(" -> "))]
    RecursiveStruct { spans: Vec<Span>, cycle: Vec<String> },
}

pub type CompileResult<T> = Result<T, CompileError>;

fn quoted_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("'{}'", item))
        .collect::<Vec<_>>()
        .join(", ")
}

impl CompileError {
    pub(crate) fn syntax(span: Span, message: impl Into<String>) -> Self {
        CompileError::InvalidSyntax {
            span,
            message: message.into(),
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            CompileError::IllegalCharacter { .. } => "Illegal character error",
            CompileError::ExpectedMoreCharacters { .. } => "Expected more chars error",
            CompileError::InvalidSyntax { .. } => "Invalid syntax error",
            CompileError::UnknownType { .. } => "Unknown data type error",
            CompileError::DuplicateMember { .. } => "Duplicate member error",
            CompileError::DuplicateDeclaration { .. } => "Duplicate struct or bitfield error",
            CompileError::RecursiveStruct { .. } => "Recursive nested structs error",
        }
    }

    pub fn spans(&self) -> &[Span] {
        match self {
            CompileError::IllegalCharacter { span, .. }
            | CompileError::ExpectedMoreCharacters { span, .. }
            | CompileError::InvalidSyntax { span, .. }
            | CompileError::UnknownType { span, .. } => std::slice::from_ref(span),
            CompileError::DuplicateMember { spans, .. }
            | CompileError::DuplicateDeclaration { spans, .. }
            | CompileError::RecursiveStruct { spans, .. } => spans,
        }
    }

    pub fn detail(&self) -> String {
        match self {
            CompileError::IllegalCharacter { character, .. } => format!("'{}'", character),
            CompileError::ExpectedMoreCharacters { expected, .. } => quoted_list(expected),
            CompileError::InvalidSyntax { message, .. } => message.clone(),
            CompileError::UnknownType {
                type_name,
                struct_name,
                ..
            } => format!("\"{}\" in struct {}", type_name, struct_name),
            CompileError::DuplicateMember {
                member_name,
                struct_name,
                ..
            } => format!("{} in struct {}", member_name, struct_name),
            CompileError::DuplicateDeclaration { name, .. } => name.clone(),
            CompileError::RecursiveStruct { cycle, .. } => cycle.join(" -> "),
        }
    }

    /// Human-readable report: file and line of each span, the source lines with `~` under
    /// the offending characters, then `category: detail`.
    pub fn render(&self) -> String {
        let spans: Vec<Span> = self.spans().iter().map(anchored).collect();
        let Some(first) = spans.first() else {
            return format!("{}: {}\n", self.category(), self.detail());
        };
        let mut out = String::new();
        if spans.len() == 1 {
            out.push_str(&format!(
                "File {}, on line {}\n",
                first.start.source_id(),
                first.start.line() + 1
            ));
            out.push_str(&underline(first));
        } else {
            out.push_str(&format!("File {},\n", first.start.source_id()));
            for span in &spans {
                out.push_str(&format!("\non line {},\n", span.start.line() + 1));
                out.push_str(&underline(span));
            }
        }
        out.push_str(&format!("\n{}: {}\n", self.category(), self.detail()));
        out
    }
}

/// End-of-input marks sit on the last line with text, not on trailing blank lines.
fn anchored(span: &Span) -> Span {
    if span.start != span.end {
        return span.clone();
    }
    let at = span.start.before_trailing_whitespace();
    Span::new(at.clone(), at)
}

/// Source lines touched by `span`, each followed by its underline row. A zero-width span
/// gets a single `~` at its column.
fn underline(span: &Span) -> String {
    if span.start == span.end {
        return format!(
            "{}\n{}~\n",
            span.start.line_text(),
            " ".repeat(span.start.column())
        );
    }

    let mut cursor: Position = span.start.clone();
    cursor.go_to_beginning_of_line();

    let mut rows: Vec<(String, String)> = Vec::new();
    let mut text = String::new();
    let mut marks = String::new();

    while let Some(ch) = cursor.current_char() {
        if cursor >= span.end {
            // keep the rest of the line for context
            if ch == '\n' {
                break;
            }
            text.push(ch);
        } else if ch == '\n' {
            rows.push((std::mem::take(&mut text), std::mem::take(&mut marks)));
        } else {
            text.push(ch);
            marks.push(if cursor >= span.start { '~' } else { ' ' });
        }
        cursor.advance();
    }
    rows.push((text, marks));

    let mut out = String::new();
    for (text, marks) in rows {
        out.push_str(&text);
        out.push('\n');
        out.push_str(marks.trim_end());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span_of(text: &str, start: usize, end: usize) -> Span {
        let mut a = Position::start("layout.pds", text);
        for _ in 0..start {
            a.advance();
        }
        let mut b = a.clone();
        for _ in start..end {
            b.advance();
        }
        Span::new(a, b)
    }

    #[test]
    fn render_single_span() {
        let src = "struct test {\n    unknown_type x,\n}";
        let err = CompileError::UnknownType {
            span: span_of(src, 18, 30),
            type_name: "unknown_type".to_string(),
            struct_name: "test".to_string(),
        };
        let rendered = err.render();
        assert!(rendered.starts_with("File layout.pds, on line 2\n"));
        assert!(rendered.contains("    unknown_type x,\n    ~~~~~~~~~~~~\n"));
        assert!(rendered.ends_with("Unknown data type error: \"unknown_type\" in struct test\n"));
    }

    #[test]
    fn render_multiple_spans() {
        let src = "struct a { }\nstruct a { }";
        let err = CompileError::DuplicateDeclaration {
            spans: vec![span_of(src, 7, 8), span_of(src, 20, 21)],
            name: "a".to_string(),
        };
        let rendered = err.render();
        assert!(rendered.contains("on line 1,\nstruct a { }\n       ~\n"));
        assert!(rendered.contains("on line 2,\nstruct a { }\n       ~\n"));
    }

    #[test]
    fn zero_width_span_at_end_gets_a_mark() {
        let src = "struct x {";
        let err = CompileError::syntax(span_of(src, 10, 10), "expected '}'");
        assert!(err.render().contains("struct x {\n          ~\n"));
    }

    #[test]
    fn end_of_input_after_trailing_newlines_marks_last_text_line() {
        let src = "struct x {\n  uint8 a,\n\n";
        let err = CompileError::ExpectedMoreCharacters {
            span: span_of(src, src.len(), src.len()),
            expected: vec!["}".to_string()],
        };
        assert_eq!(
            err.render(),
            "File layout.pds, on line 2\n  uint8 a,\n          ~\n\nExpected more chars error: '}'\n"
        );
    }

    #[test]
    fn display_matches_category_and_detail() {
        let err = CompileError::RecursiveStruct {
            spans: Vec::new(),
            cycle: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), format!("{}: {}", err.category(), err.detail()));
        assert_eq!(err.detail(), "a -> b -> a");
    }
}
