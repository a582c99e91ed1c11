//! Single-token-lookahead parser base
//!
//! Holds the current lookahead token and consumes the stream strictly
//! forward. Grammar productions are written on top of [`Parser::match_tag`]
//! and [`Parser::is_type`].

use crate::syntax::error::{SyntaxError, SyntaxResult};
use crate::tokens::{SpannedToken, Tag, TokenStream};
use crate::utils::Span;

pub struct Parser {
    stream: TokenStream,
    look: Option<SpannedToken>,
    /// Stream index of `look`
    look_position: usize,
}

impl Parser {
    /// Build a parser positioned on the first token of `stream`
    pub fn new(stream: TokenStream) -> Self {
        let mut parser = Self {
            stream,
            look: None,
            look_position: 0,
        };
        parser.move_next();
        parser
    }

    /// Replace the lookahead with the next token from the stream
    pub fn move_next(&mut self) {
        self.look_position = self.stream.position();
        self.look = self.stream.next().cloned();
    }

    /// Consume the lookahead if it has `tag`, returning it
    pub fn match_tag(&mut self, tag: Tag) -> SyntaxResult<SpannedToken> {
        match self.look.take() {
            Some(token) if token.value.tag() == tag => {
                self.move_next();
                Ok(token)
            }
            other => {
                self.look = other;
                Err(self.error(tag))
            }
        }
    }

    pub fn is_type(&self, tag: Tag) -> bool {
        self.look_tag() == Some(tag)
    }

    /// Positioned failure for an `expected` tag at the current lookahead
    pub fn error(&self, expected: Tag) -> SyntaxError {
        match &self.look {
            Some(token) => SyntaxError::unexpected_token(
                self.look_position,
                expected,
                token.value.tag(),
                token.span,
            ),
            None => SyntaxError::unexpected_end_of_input(self.look_position, expected),
        }
    }

    pub fn look(&self) -> Option<&SpannedToken> {
        self.look.as_ref()
    }

    pub fn look_tag(&self) -> Option<Tag> {
        self.look.as_ref().map(|t| t.value.tag())
    }

    pub fn look_span(&self) -> Option<Span> {
        self.look.as_ref().map(|t| t.span)
    }

    pub fn is_at_end(&self) -> bool {
        self.look.is_none()
    }

    pub fn position(&self) -> usize {
        self.look_position
    }

    pub fn stream(&self) -> &TokenStream {
        &self.stream
    }

    /// Rewind to the first token
    pub fn reset(&mut self) {
        self.stream.reset();
        self.move_next();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::{Token, TokenStreamBuilder};
    use assert_matches::assert_matches;

    fn stream() -> TokenStream {
        TokenStreamBuilder::new()
            .push_token(Token::word("class", Tag::Class), "class")
            .push_token(Token::word("A", Tag::Variable), " A")
            .push_structural(Tag::Colon, ":")
            .build()
    }

    #[test]
    fn test_match_advances() {
        let mut parser = Parser::new(stream());
        assert!(parser.is_type(Tag::Class));
        let token = parser.match_tag(Tag::Class).expect("class matches");
        assert_eq!(token.value.tag(), Tag::Class);
        assert_eq!(parser.position(), 1);
        assert_eq!(
            parser.match_tag(Tag::Variable).map(|t| t.value.lexeme().map(String::from)),
            Ok(Some("A".to_string()))
        );
    }

    #[test]
    fn test_mismatch_keeps_lookahead() {
        let mut parser = Parser::new(stream());
        assert_matches!(
            parser.match_tag(Tag::Def),
            Err(SyntaxError::UnexpectedToken {
                position: 0,
                expected: Tag::Def,
                found: Tag::Class,
                ..
            })
        );
        assert!(parser.is_type(Tag::Class));
    }

    #[test]
    fn test_end_of_input() {
        let mut parser = Parser::new(stream());
        parser.move_next();
        parser.move_next();
        parser.move_next();
        assert!(parser.is_at_end());
        assert_matches!(
            parser.match_tag(Tag::Newline),
            Err(SyntaxError::UnexpectedEndOfInput {
                position: 3,
                expected: Tag::Newline
            })
        );
    }

    #[test]
    fn test_reset() {
        let mut parser = Parser::new(stream());
        parser.move_next();
        parser.reset();
        assert!(parser.is_type(Tag::Class));
        assert_eq!(parser.position(), 0);
    }
}
