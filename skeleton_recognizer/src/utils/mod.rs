//! Shared source-location primitives used by the lexer, token stream and
//! error reporting.

pub mod span;

pub use span::{Position, SourceMap, Span, Spanned};
