//! Source locations
//!
//! Lines and columns are 1-based. Offsets count bytes into the source text, so a
//! span can slice the original string directly.
use crate::config::compile_time::lexical::TAB_WIDTH;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Position {
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(offset: usize, line: u32, column: u32) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }

    /// First character of a source: line 1, column 1
    pub fn start() -> Self {
        Self::new(0, 1, 1)
    }

    /// Position after consuming `ch`; a tab jumps to the next multiple of the tab width
    pub fn advance(self, ch: char) -> Self {
        let offset = self.offset + ch.len_utf8();
        match ch {
            '\n' => Self::new(offset, self.line + 1, 1),
            '\t' => {
                let tab = TAB_WIDTH.max(1) as u32;
                let next_stop = ((self.column - 1) / tab + 1) * tab + 1;
                Self::new(offset, self.line, next_stop)
            }
            _ => Self::new(offset, self.line, self.column + 1),
        }
    }

    pub fn advance_str(self, text: &str) -> Self {
        text.chars().fold(self, Position::advance)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Half-open range `[start, end)` of source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        debug_assert!(start.offset <= end.offset, "span ends before it starts");
        Self { start, end }
    }

    /// One column wide, starting at `pos`
    pub fn single(pos: Position) -> Self {
        Self::new(pos, Position::new(pos.offset + 1, pos.line, pos.column + 1))
    }

    /// Zero-width span at the start of input
    pub fn dummy() -> Self {
        Self::new(Position::start(), Position::start())
    }

    /// Smallest span covering both
    pub fn merge(self, other: Self) -> Self {
        let start = if other.start.offset < self.start.offset {
            other.start
        } else {
            self.start
        };
        let end = if other.end.offset > self.end.offset {
            other.end
        } else {
            self.end
        };
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start.offset == self.end.offset
    }

    /// Covered text, or "" when the span does not fit `source`
    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.start.offset..self.end.offset).unwrap_or("")
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start.line == self.end.line {
            write!(f, "{}-{}", self.start, self.end.column)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// A value tagged with where it came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Spanned<T> {
    pub value: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(value: T, span: Span) -> Self {
        Self { value, span }
    }
}

impl<T: fmt::Display> fmt::Display for Spanned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

/// Source text indexed by line, used to render diagnostics
#[derive(Debug, Clone)]
pub struct SourceMap {
    source: String,
    line_starts: Vec<usize>,
}

impl SourceMap {
    pub fn new(source: String) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            source,
            line_starts,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Text of a 1-based line without its terminator
    pub fn line(&self, number: u32) -> Option<&str> {
        let index = (number as usize).checked_sub(1)?;
        let start = *self.line_starts.get(index)?;
        let end = self
            .line_starts
            .get(index + 1)
            .map_or(self.source.len(), |next| next - 1);
        self.source
            .get(start..end)
            .map(|text| text.trim_end_matches('\r'))
    }

    /// Render `message` with the offending line and a caret underline
    ///
    /// ```text
    /// error: Expected token with tag COLON
    ///  --> 1:8
    ///   |
    /// 1 | class A
    ///   |        ^
    /// ```
    pub fn format_error(&self, span: &Span, message: &str) -> String {
        let mut out = format!("error: {}\n --> {}\n", message, span.start);

        let Some(text) = self.line(span.start.line) else {
            return out;
        };

        let number = span.start.line.to_string();
        let gutter = " ".repeat(number.len());
        let indent = span.start.column.saturating_sub(1) as usize;
        let width = if span.end.line == span.start.line {
            span.end.column.saturating_sub(span.start.column) as usize
        } else {
            text.chars().count().saturating_sub(indent)
        };

        out.push_str(&format!("{} |\n", gutter));
        out.push_str(&format!("{} | {}\n", number, text));
        out.push_str(&format!(
            "{} | {}{}\n",
            gutter,
            " ".repeat(indent),
            "^".repeat(width.max(1))
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_across_lines() {
        let pos = Position::start().advance_str("def\n  x");
        assert_eq!((pos.offset, pos.line, pos.column), (7, 2, 4));
    }

    #[test]
    fn test_tab_stops() {
        let tab = TAB_WIDTH as u32;
        assert_eq!(Position::start().advance('\t').column, 1 + tab);
        let pos = Position::start().advance('a').advance('\t');
        assert_eq!(pos.column, 1 + tab);
    }

    #[test]
    fn test_merge_and_slice() {
        let source = "class Point:";
        let name = Span::new(Position::new(6, 1, 7), Position::new(11, 1, 12));
        let colon = Span::single(Position::new(11, 1, 12));
        let both = name.merge(colon);

        assert_eq!(name.slice(source), "Point");
        assert_eq!(both.slice(source), "Point:");
        assert_eq!(colon.merge(name), both);
        assert_eq!(both.to_string(), "1:7-13");
        assert!(Span::dummy().is_empty());
    }

    #[test]
    fn test_source_map_lines() {
        let map = SourceMap::new("class A:\r\n    pass\n".to_string());
        assert_eq!(map.line_count(), 3);
        assert_eq!(map.line(1), Some("class A:"));
        assert_eq!(map.line(2), Some("    pass"));
        assert_eq!(map.line(3), Some(""));
        assert_eq!(map.line(0), None);
        assert_eq!(map.line(4), None);
    }

    #[test]
    fn test_format_error_underlines_span() {
        let map = SourceMap::new("class A\n".to_string());
        let span = Span::new(Position::new(6, 1, 7), Position::new(7, 1, 8));
        let rendered = map.format_error(&span, "expected ':'");

        assert!(rendered.starts_with("error: expected ':'"));
        assert!(rendered.contains(" --> 1:7"));
        assert!(rendered.contains("1 | class A"));
        assert!(rendered.trim_end().ends_with("      ^"));
    }
}
