//! Syntax analysis: recognizing the class and method skeleton of a token stream
//!
//! [`Parser`] is the one-token-lookahead base; [`RecursiveDescent`] implements
//! the skeleton grammar on top of it. Recognition either returns a
//! [`SkeletonSummary`] or the first [`SyntaxError`].

mod error;
pub mod grammar;
pub mod parser;

pub use error::{SyntaxError, SyntaxResult};
pub use grammar::{ClassSkeleton, Decorator, MethodSignature, RecursiveDescent, SkeletonSummary};
pub use parser::Parser;

use crate::config::runtime::SyntaxPreferences;
use crate::logging::codes;
use crate::tokens::TokenStream;
use crate::{log_debug, log_error, log_info, log_success};

/// Recognize a token stream with default preferences
pub fn parse_token_stream(token_stream: TokenStream) -> SyntaxResult<SkeletonSummary> {
    parse_token_stream_with_preferences(token_stream, &SyntaxPreferences::default())
}

pub fn parse_token_stream_with_preferences(
    token_stream: TokenStream,
    preferences: &SyntaxPreferences,
) -> SyntaxResult<SkeletonSummary> {
    log_debug!("Starting syntax analysis", "tokens" => token_stream.len());

    let mut recognizer = RecursiveDescent::with_preferences(token_stream, preferences);
    let result = recognizer.parse();

    match &result {
        Ok(summary) => {
            log_success!(
                codes::success::SKELETON_RECOGNIZED,
                "Skeleton recognized",
                "classes" => summary.class_count(),
                "methods" => summary.method_count(),
                "decorated" => summary.decorated_method_count()
            );
        }
        Err(error) => {
            let message = match (preferences.show_source_snippet, error.span()) {
                (true, Some(span)) => recognizer.stream().format_error(span, &error.to_string()),
                _ => error.to_string(),
            };
            match error.span() {
                Some(span) => log_error!(error.error_code(), &message, span = span,
                    "position" => error.position().unwrap_or_default(),
                    "hint" => error.help()
                ),
                None => log_error!(error.error_code(), &message, "hint" => error.help()),
            }
        }
    }

    result
}

/// Validate that every syntax code has registered metadata
pub fn init_syntax_logging() -> Result<(), String> {
    codes::ensure_registered(&[
        codes::syntax::UNEXPECTED_TOKEN,
        codes::syntax::UNEXPECTED_END_OF_INPUT,
        codes::syntax::EMPTY_TOKEN_STREAM,
        codes::syntax::TOO_MANY_CLASSES,
        codes::syntax::TOO_MANY_PARAMETERS,
    ])?;

    log_info!("Syntax module logging validation completed");
    Ok(())
}
