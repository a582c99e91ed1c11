//! Materialized token sequence with a forward cursor
//!
//! The lexer is drained completely into a [`TokenStream`] before parsing
//! starts. The stream is append-only while it is built and read-only after.

use crate::{
    tokens::token::{Tag, Token},
    utils::{Position, SourceMap, Span, Spanned},
};

/// A token with span information
pub type SpannedToken = Spanned<Token>;

#[derive(Debug, Clone, Default)]
pub struct TokenStream {
    tokens: Vec<SpannedToken>,
    current_pos: usize,
    /// Source map for caret diagnostics
    source_map: Option<SourceMap>,
}

impl TokenStream {
    pub fn new(tokens: Vec<SpannedToken>) -> Self {
        Self {
            tokens,
            current_pos: 0,
            source_map: None,
        }
    }

    /// Create stream with source map for enhanced error reporting
    pub fn with_source_map(tokens: Vec<SpannedToken>, source_map: SourceMap) -> Self {
        Self {
            tokens,
            current_pos: 0,
            source_map: Some(source_map),
        }
    }

    pub fn add_token(&mut self, token: SpannedToken) {
        self.tokens.push(token);
    }

    pub fn set_source_map(&mut self, source_map: SourceMap) {
        self.source_map = Some(source_map);
    }

    /// Token at the cursor, advancing past it; `None` past the end
    pub fn next(&mut self) -> Option<&SpannedToken> {
        let token = self.tokens.get(self.current_pos)?;
        self.current_pos += 1;
        Some(token)
    }

    /// Token at the cursor without advancing
    pub fn peek(&self) -> Option<&SpannedToken> {
        self.tokens.get(self.current_pos)
    }

    /// Bounds-checked random access
    pub fn at(&self, position: usize) -> Option<&SpannedToken> {
        self.tokens.get(position)
    }

    pub fn position(&self) -> usize {
        self.current_pos
    }

    /// Move the cursor; positions past the end are ignored
    pub fn set_position(&mut self, position: usize) {
        if position <= self.tokens.len() {
            self.current_pos = position;
        }
    }

    pub fn reset(&mut self) {
        self.current_pos = 0;
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn size(&self) -> usize {
        self.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn is_at_end(&self) -> bool {
        self.current_pos >= self.tokens.len()
    }

    pub fn remaining_count(&self) -> usize {
        self.tokens.len().saturating_sub(self.current_pos)
    }

    /// Tag sequence of the whole stream
    pub fn tags(&self) -> Vec<Tag> {
        self.tokens.iter().map(|t| t.value.tag()).collect()
    }

    pub fn tokens(&self) -> &[SpannedToken] {
        &self.tokens
    }

    pub fn span_at_position(&self, position: usize) -> Option<Span> {
        self.tokens.get(position).map(|t| t.span)
    }

    /// Span of the last token, used for end-of-input diagnostics
    pub fn last_span(&self) -> Option<Span> {
        self.tokens.last().map(|t| t.span)
    }

    pub fn source_map(&self) -> Option<&SourceMap> {
        self.source_map.as_ref()
    }

    /// Format an error with a caret snippet when the source is known
    pub fn format_error(&self, span: Span, message: &str) -> String {
        if let Some(ref source_map) = self.source_map {
            source_map.format_error(&span, message)
        } else {
            format!("Error at {}: {}", span, message)
        }
    }

    /// Compact listing of the tokens around the cursor
    pub fn diagnostic(&self, radius: usize) -> String {
        let start = self.current_pos.saturating_sub(radius);
        let end = (self.current_pos + radius + 1).min(self.tokens.len());
        let mut out = format!(
            "TokenStream {{ position: {}/{} }}",
            self.current_pos,
            self.tokens.len()
        );
        for (index, token) in self.tokens[start..end].iter().enumerate() {
            let index = start + index;
            let marker = if index == self.current_pos { ">" } else { " " };
            out.push_str(&format!("\n{} {:4} {}", marker, index, token.value));
        }
        out
    }
}

/// Builds streams by hand in tests and tools, tracking positions from token text
#[derive(Debug)]
pub struct TokenStreamBuilder {
    tokens: Vec<SpannedToken>,
    current_position: Position,
}

impl TokenStreamBuilder {
    pub fn new() -> Self {
        Self {
            tokens: Vec::new(),
            current_position: Position::start(),
        }
    }

    /// Add a token with a span computed from its source text
    pub fn push_token(mut self, token: Token, text: &str) -> Self {
        let start = self.current_position;
        let end = start.advance_str(text);
        self.tokens.push(SpannedToken::new(token, Span::new(start, end)));
        self.current_position = end;
        self
    }

    pub fn push_structural(self, tag: Tag, text: &str) -> Self {
        self.push_token(Token::Structural(tag), text)
    }

    pub fn build(self) -> TokenStream {
        TokenStream::new(self.tokens)
    }
}

impl Default for TokenStreamBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub mod validation {
    use super::*;

    /// Spans must never go backwards
    pub fn validate_span_order(tokens: &[SpannedToken]) -> Result<(), String> {
        for window in tokens.windows(2) {
            let current = window[0].span;
            let next = window[1].span;

            if current.start.offset > next.start.offset {
                return Err(format!(
                    "Span order violation: token at {} precedes token at {}",
                    current.start.offset, next.start.offset
                ));
            }
        }
        Ok(())
    }

    /// Every INDENT must be closed by a DEDENT, and no DEDENT may close an unopened block
    pub fn validate_block_balance(stream: &TokenStream) -> Result<(), String> {
        let mut depth: usize = 0;
        for (position, token) in stream.tokens().iter().enumerate() {
            match token.value.tag() {
                Tag::Indent => depth += 1,
                Tag::Dedent => {
                    depth = depth.checked_sub(1).ok_or_else(|| {
                        format!("Unmatched DEDENT at token position {}", position)
                    })?;
                }
                _ => {}
            }
        }
        if depth != 0 {
            return Err(format!("{} INDENT token(s) never closed", depth));
        }
        Ok(())
    }

    pub fn validate_token_stream(stream: &TokenStream) -> Result<(), String> {
        validate_span_order(stream.tokens())?;
        validate_block_balance(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TokenStream {
        TokenStreamBuilder::new()
            .push_token(Token::word("class", Tag::Class), "class")
            .push_token(Token::word("A", Tag::Variable), " A")
            .push_structural(Tag::Colon, ":")
            .build()
    }

    #[test]
    fn test_cursor_moves_forward() {
        let mut stream = sample();
        assert_eq!(stream.peek().map(|t| t.value.tag()), Some(Tag::Class));
        assert_eq!(stream.next().map(|t| t.value.tag()), Some(Tag::Class));
        assert_eq!(stream.position(), 1);
        assert_eq!(stream.remaining_count(), 2);
        stream.next();
        stream.next();
        assert!(stream.is_at_end());
        assert!(stream.next().is_none());
        assert!(stream.peek().is_none());
    }

    #[test]
    fn test_random_access_out_of_range() {
        let stream = sample();
        assert_eq!(stream.at(2).map(|t| t.value.tag()), Some(Tag::Colon));
        assert!(stream.at(3).is_none());
        assert_eq!(stream.size(), 3);
    }

    #[test]
    fn test_set_position_past_end_is_ignored() {
        let mut stream = sample();
        stream.set_position(2);
        assert_eq!(stream.position(), 2);
        stream.set_position(10);
        assert_eq!(stream.position(), 2);
        stream.reset();
        assert_eq!(stream.position(), 0);
    }

    #[test]
    fn test_tags_and_add_token() {
        let mut stream = TokenStream::default();
        assert!(stream.is_empty());
        stream.add_token(SpannedToken::new(Token::Structural(Tag::Newline), Span::dummy()));
        stream.add_token(SpannedToken::new(Token::Num(7), Span::dummy()));
        assert_eq!(stream.tags(), vec![Tag::Newline, Tag::Num]);
    }

    #[test]
    fn test_block_balance() {
        let balanced = TokenStreamBuilder::new()
            .push_structural(Tag::Indent, "    ")
            .push_structural(Tag::Dedent, "")
            .build();
        assert!(validation::validate_token_stream(&balanced).is_ok());

        let open = TokenStreamBuilder::new()
            .push_structural(Tag::Indent, "    ")
            .build();
        assert!(validation::validate_block_balance(&open).is_err());
    }

    #[test]
    fn test_format_error_without_source() {
        let stream = sample();
        let span = stream.span_at_position(1).unwrap_or_else(Span::dummy);
        assert!(stream.format_error(span, "boom").contains("boom"));
    }
}
