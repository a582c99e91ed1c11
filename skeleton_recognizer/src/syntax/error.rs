//! Syntax errors raised by the skeleton recognizer
//!
//! The recognizer stops at the first failure; the error carries the token
//! position and the tag that was expected there.

use crate::logging::codes::{self, Code, Severity};
use crate::tokens::Tag;
use crate::utils::Span;

pub type SyntaxResult<T> = Result<T, SyntaxError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyntaxError {
    #[error("Syntax error at token position {position}: Expected token with tag {expected}, found {found}")]
    UnexpectedToken {
        position: usize,
        expected: Tag,
        found: Tag,
        span: Span,
    },

    #[error("Syntax error at token position {position}: Expected token with tag {expected}, found end of input")]
    UnexpectedEndOfInput { position: usize, expected: Tag },

    #[error("Empty token stream - no tokens to parse")]
    EmptyTokenStream,

    #[error("Too many classes: {count} (max {max})")]
    TooManyClasses { count: usize, max: usize },

    #[error("Too many parameters in method '{method}': {count} (max {max})")]
    TooManyParameters {
        method: String,
        count: usize,
        max: usize,
    },
}

impl SyntaxError {
    pub fn unexpected_token(position: usize, expected: Tag, found: Tag, span: Span) -> Self {
        Self::UnexpectedToken {
            position,
            expected,
            found,
            span,
        }
    }

    pub fn unexpected_end_of_input(position: usize, expected: Tag) -> Self {
        Self::UnexpectedEndOfInput { position, expected }
    }

    pub fn error_code(&self) -> Code {
        match self {
            Self::UnexpectedToken { .. } => codes::syntax::UNEXPECTED_TOKEN,
            Self::UnexpectedEndOfInput { .. } => codes::syntax::UNEXPECTED_END_OF_INPUT,
            Self::EmptyTokenStream => codes::syntax::EMPTY_TOKEN_STREAM,
            Self::TooManyClasses { .. } => codes::syntax::TOO_MANY_CLASSES,
            Self::TooManyParameters { .. } => codes::syntax::TOO_MANY_PARAMETERS,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::UnexpectedToken { span, .. } => Some(*span),
            _ => None,
        }
    }

    /// Token position the failure was detected at
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::UnexpectedToken { position, .. }
            | Self::UnexpectedEndOfInput { position, .. } => Some(*position),
            _ => None,
        }
    }

    pub fn expected(&self) -> Option<Tag> {
        match self {
            Self::UnexpectedToken { expected, .. }
            | Self::UnexpectedEndOfInput { expected, .. } => Some(*expected),
            _ => None,
        }
    }

    pub fn severity(&self) -> Severity {
        codes::get_severity(self.error_code().as_str())
    }

    pub fn is_recoverable(&self) -> bool {
        codes::is_recoverable(self.error_code().as_str())
    }

    pub fn category(&self) -> &'static str {
        codes::get_category(self.error_code().as_str())
    }

    /// Short fix-it line; tag mismatches name both tags
    pub fn help(&self) -> String {
        let action = codes::get_action(self.error_code().as_str());
        match self {
            Self::UnexpectedToken {
                expected, found, ..
            } => format!("expected {} here, not {}. {}", expected, found, action),
            Self::UnexpectedEndOfInput { expected, .. } => {
                format!("input ended while expecting {}. {}", expected, action)
            }
            _ => action.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{Position, Span};

    #[test]
    fn test_error_code_mapping() {
        let span = Span::new(Position::start(), Position::start());
        let error = SyntaxError::unexpected_token(3, Tag::Colon, Tag::Newline, span);
        assert_eq!(error.error_code().as_str(), "E040");
        assert!(error.severity() <= Severity::High);
        assert_eq!(
            SyntaxError::unexpected_end_of_input(9, Tag::Dedent).error_code().as_str(),
            "E041"
        );
        assert_eq!(SyntaxError::EmptyTokenStream.error_code().as_str(), "E042");
    }

    #[test]
    fn test_display_names_position_and_tags() {
        let error = SyntaxError::unexpected_token(2, Tag::Colon, Tag::Newline, Span::dummy());
        assert_eq!(
            error.to_string(),
            "Syntax error at token position 2: Expected token with tag COLON, found NEWLINE"
        );
        assert_eq!(error.position(), Some(2));
        assert_eq!(error.expected(), Some(Tag::Colon));
    }

    #[test]
    fn test_span_extraction() {
        let span = Span::new(Position::new(10, 1, 11), Position::new(15, 1, 16));
        let error = SyntaxError::unexpected_token(0, Tag::SelfKw, Tag::Cls, span);
        assert_eq!(error.span(), Some(span));
        assert_eq!(SyntaxError::EmptyTokenStream.span(), None);
    }

    #[test]
    fn test_help_names_both_tags() {
        let error = SyntaxError::unexpected_token(4, Tag::SelfKw, Tag::Cls, Span::dummy());
        let help = error.help();
        assert!(help.starts_with("expected SELF here, not CLS."));
        assert!(!error.is_recoverable());
    }
}
