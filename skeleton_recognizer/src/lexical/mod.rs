//! Lexical analysis
//!
//! Turns source text into a [`TokenStream`] through the indentation-sensitive
//! [`Lexer`]. Each run owns its own lexer and symbol table.

pub mod lexer;
pub mod symbol_table;

use crate::config::compile_time::lexical::*;
use crate::config::runtime::LexicalPreferences;
use crate::file_processor::FileProcessingResult;
use crate::logging::codes;
use crate::tokens::{Tag, TokenClass, TokenStream};

pub use lexer::{Lexer, LexerError, LexicalMetrics};
pub use symbol_table::SymbolTable;

/// Tokenize in-memory source with default preferences
pub fn tokenize_source(source: &str) -> Result<TokenStream, LexerError> {
    Lexer::new(source).generate_stream()
}

/// Tokenize the contents of a processed file
pub fn tokenize_file_result(file_result: &FileProcessingResult) -> Result<TokenStream, LexerError> {
    tokenize_file_result_with_preferences(file_result, LexicalPreferences::default())
}

pub fn tokenize_file_result_with_preferences(
    file_result: &FileProcessingResult,
    preferences: LexicalPreferences,
) -> Result<TokenStream, LexerError> {
    tokenize_with_metrics(file_result, preferences).map(|(stream, _)| stream)
}

/// Tokenize a processed file, keeping the lexer's metrics for reporting
pub fn tokenize_with_metrics(
    file_result: &FileProcessingResult,
    preferences: LexicalPreferences,
) -> Result<(TokenStream, LexicalMetrics), LexerError> {
    let file_path = file_result.metadata.path.display().to_string();

    crate::log_debug!("Starting lexical analysis",
        "file" => file_path.as_str(),
        "char_count" => file_result.char_count(),
        "line_count" => file_result.metadata.line_count,
        "max_tokens_allowed" => MAX_TOKEN_COUNT
    );

    let mut lexer = Lexer::with_preferences(&file_result.source, preferences);
    let stream = lexer.generate_stream()?;
    let metrics = lexer.metrics();

    crate::log_success!(codes::success::TOKENIZATION_COMPLETE,
        "Lexical analysis completed successfully",
        "file" => file_path.as_str(),
        "token_count" => stream.len(),
        "identifiers" => metrics.identifier_tokens,
        "decorators" => metrics.decorator_tokens,
        "indents" => metrics.indent_tokens,
        "comments" => metrics.comment_count,
        "interned_symbols" => lexer.symbol_table().interned_count()
    );

    Ok((stream, metrics.clone()))
}

/// Validate that every lexical code has registered metadata
pub fn init_lexical_analysis_logging() -> Result<(), String> {
    codes::ensure_registered(&[
        codes::lexical::CANNOT_OPEN_SOURCE,
        codes::lexical::UNEXPECTED_CHARACTER,
        codes::lexical::UNTERMINATED_STRING,
        codes::lexical::UNTERMINATED_DOCSTRING,
        codes::lexical::INVALID_INDENTATION,
        codes::lexical::INVALID_NUMBER,
        codes::lexical::IDENTIFIER_TOO_LONG,
        codes::lexical::STRING_TOO_LARGE,
        codes::lexical::TOO_MANY_TOKENS,
        codes::lexical::INDENT_TOO_DEEP,
    ])?;

    if TAB_WIDTH == 0 || MAX_TOKEN_COUNT == 0 || MAX_IDENTIFIER_LENGTH == 0 {
        return Err("Lexical limits must be non-zero".to_string());
    }

    crate::log_debug!("Lexical limits initialized",
        "max_string_size" => MAX_STRING_SIZE,
        "max_identifier_length" => MAX_IDENTIFIER_LENGTH,
        "max_token_count" => MAX_TOKEN_COUNT,
        "max_indent_depth" => MAX_INDENT_DEPTH,
        "tab_width" => TAB_WIDTH
    );

    Ok(())
}

/// Compile-time lexical limits, for reporting
pub fn get_security_limits() -> SecurityLimits {
    SecurityLimits {
        max_string_size: MAX_STRING_SIZE,
        max_identifier_length: MAX_IDENTIFIER_LENGTH,
        max_token_count: MAX_TOKEN_COUNT,
        max_indent_depth: MAX_INDENT_DEPTH,
        tab_width: TAB_WIDTH,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityLimits {
    pub max_string_size: usize,
    pub max_identifier_length: usize,
    pub max_token_count: usize,
    pub max_indent_depth: usize,
    pub tab_width: usize,
}

/// Count a stream's tokens by class
pub fn get_token_counts(token_stream: &TokenStream) -> TokenCounts {
    let mut counts = TokenCounts::default();

    for token in token_stream.tokens() {
        counts.total += 1;
        match token.value.tag() {
            Tag::Indent => counts.indents += 1,
            Tag::Dedent => counts.dedents += 1,
            Tag::Newline => counts.newlines += 1,
            tag => match tag.class() {
                TokenClass::Keyword => counts.keywords += 1,
                TokenClass::Decorator => counts.decorators += 1,
                TokenClass::Name => counts.names += 1,
                TokenClass::Literal => counts.literals += 1,
                TokenClass::Punctuation | TokenClass::Operator => counts.symbols += 1,
                TokenClass::Structure => {}
            },
        }
    }

    counts
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenCounts {
    pub total: usize,
    pub keywords: usize,
    pub decorators: usize,
    pub names: usize,
    pub literals: usize,
    pub symbols: usize,
    pub indents: usize,
    pub dedents: usize,
    pub newlines: usize,
}

impl TokenCounts {
    /// Tokens other than NEWLINE and block structure
    pub fn significant_tokens(&self) -> usize {
        self.total - self.indents - self.dedents - self.newlines
    }

    pub fn is_balanced(&self) -> bool {
        self.indents == self.dedents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_counts() {
        let stream = tokenize_source("@property\ndef area(self) -> int:\n    return 1\n")
            .expect("source should lex");
        let counts = get_token_counts(&stream);
        assert_eq!(counts.decorators, 1);
        assert_eq!(counts.keywords, 3);
        assert_eq!(counts.names, 2);
        assert_eq!(counts.literals, 1);
        assert!(counts.is_balanced());
        assert_eq!(counts.significant_tokens(), counts.total - 5);
    }

    #[test]
    fn test_limits_are_sane() {
        let limits = get_security_limits();
        assert_eq!(limits.tab_width, TAB_WIDTH);
        assert!(limits.max_token_count > 0);
    }

    #[test]
    fn test_init_validates_codes() {
        assert!(init_lexical_analysis_logging().is_ok());
    }
}
