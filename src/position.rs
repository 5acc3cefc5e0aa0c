//! Source cursor: index/line/column tracking over one source text.
//!
//! A [`Position`] is cheap to clone (the text is shared behind an [`Arc`]), so tokens and
//! diagnostics capture their own copies while the lexer keeps advancing its live cursor.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// One compilation input: an identifier (file name, `<stdin>`, ...) and its text.
#[derive(Debug, PartialEq, Eq)]
pub struct Source {
    pub id: String,
    pub text: String,
}

/// Cursor into a [`Source`]. `line` and `column` are 0-based; `index` is a byte offset
/// that is always on a char boundary, or equal to `text.len()` at the end.
#[derive(Clone)]
pub struct Position {
    index: usize,
    line: usize,
    column: usize,
    source: Arc<Source>,
}

impl Position {
    /// Position at the very beginning of a new source.
    pub fn start(source_id: &str, text: &str) -> Self {
        Position {
            index: 0,
            line: 0,
            column: 0,
            source: Arc::new(Source {
                id: source_id.to_string(),
                text: text.to_string(),
            }),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn source_id(&self) -> &str {
        &self.source.id
    }

    pub fn source_text(&self) -> &str {
        &self.source.text
    }

    /// Character under the cursor, `None` at the end of the text.
    pub fn current_char(&self) -> Option<char> {
        self.source.text[self.index..].chars().next()
    }

    pub fn is_at_end(&self) -> bool {
        self.index >= self.source.text.len()
    }

    /// Step past the current character. Once the end is reached this is a no-op.
    pub fn advance(&mut self) {
        let Some(ch) = self.current_char() else {
            return;
        };
        self.index += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
    }

    /// Full text of the line the cursor is on, without the trailing newline.
    pub fn line_text(&self) -> &str {
        self.source.text.split('\n').nth(self.line).unwrap_or("")
    }

    /// Rewind to column 0 of the current line. The line number is left untouched.
    pub fn go_to_beginning_of_line(&mut self) {
        let before = &self.source.text[..self.index];
        self.index = before.rfind('\n').map_or(0, |nl| nl + 1);
        self.column = 0;
    }

    /// When only whitespace follows the cursor, the position just after the last
    /// non-whitespace character; otherwise the cursor itself.
    pub fn before_trailing_whitespace(&self) -> Position {
        let text = &self.source.text;
        let target = text[..self.index].trim_end().len();
        if target == self.index || !text[self.index..].trim().is_empty() {
            return self.clone();
        }
        let mut pos = Position {
            index: 0,
            line: 0,
            column: 0,
            source: Arc::clone(&self.source),
        };
        while pos.index < target {
            pos.advance();
        }
        pos
    }

    fn same_source(&self, other: &Position) -> bool {
        Arc::ptr_eq(&self.source, &other.source) || self.source == other.source
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.same_source(other)
    }
}

impl Eq for Position {}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    /// # Panics
    ///
    /// Panics when the positions belong to different sources.
    fn cmp(&self, other: &Self) -> Ordering {
        assert!(
            self.same_source(other),
            "cannot compare positions of `{}` and `{}`",
            self.source.id,
            other.source.id
        );
        self.index.cmp(&other.index)
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}@{}",
            self.source.id,
            self.line + 1,
            self.column + 1,
            self.index
        )
    }
}

/// Half-open range `[start, end)` in one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Span { start, end }
    }

    /// Span covering both `self` and `other`.
    pub fn to(&self, other: &Span) -> Span {
        Span {
            start: self.start.clone(),
            end: other.end.clone(),
        }
    }

    pub fn text(&self) -> &str {
        &self.start.source_text()[self.start.index()..self.end.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn advance_tracks_lines_and_columns() {
        let mut pos = Position::start("t", "ab\ncd");
        pos.advance();
        pos.advance();
        assert_eq!((pos.index(), pos.line(), pos.column()), (2, 0, 2));
        pos.advance();
        assert_eq!((pos.index(), pos.line(), pos.column()), (3, 1, 0));
        assert_eq!(pos.current_char(), Some('c'));
        assert_eq!(pos.line_text(), "cd");
    }

    #[test]
    fn go_to_beginning_of_line_keeps_line() {
        let mut pos = Position::start("t", "first\nsecond line");
        for _ in 0..10 {
            pos.advance();
        }
        assert_eq!(pos.line(), 1);
        pos.go_to_beginning_of_line();
        assert_eq!((pos.index(), pos.line(), pos.column()), (6, 1, 0));
    }

    #[test]
    fn multibyte_chars_keep_index_on_boundary() {
        let mut pos = Position::start("t", "é!");
        pos.advance();
        assert_eq!(pos.index(), 2);
        assert_eq!(pos.current_char(), Some('!'));
    }

    #[test]
    fn ordering_by_index() {
        let a = Position::start("t", "xyz");
        let mut b = a.clone();
        b.advance();
        assert!(a < b);
        assert_eq!(a, a.clone());
    }

    #[test]
    #[should_panic(expected = "cannot compare positions")]
    fn comparing_different_sources_panics() {
        let a = Position::start("a", "one");
        let b = Position::start("b", "two");
        let _ = a < b;
    }

    proptest! {
        #[test]
        fn advancing_past_end_is_idempotent(text in "[a-z\n ]{0,32}", extra in 0usize..16) {
            let mut pos = Position::start("p", &text);
            while !pos.is_at_end() {
                pos.advance();
            }
            let (index, line, column) = (pos.index(), pos.line(), pos.column());
            for _ in 0..extra {
                pos.advance();
            }
            prop_assert_eq!((pos.index(), pos.line(), pos.column()), (index, line, column));
        }
    }
}
