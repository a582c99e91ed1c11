//! Recognizer for the class and method skeleton of Python-like sources
//!
//! A run reads one file, drains the indentation-aware [`lexical::Lexer`] into a
//! [`tokens::TokenStream`], and hands it to the [`syntax::RecursiveDescent`]
//! recognizer, which accepts the input or reports the first failure.

pub mod batch;
pub mod config;
pub mod file_processor;
pub mod lexical;
#[macro_use]
pub mod logging;
pub mod pipeline;
pub mod syntax;
pub mod tokens;
pub mod utils;

pub use batch::{BatchConfig, BatchError, BatchResults};
pub use pipeline::{PipelineError, PipelineResult};
pub use syntax::{SkeletonSummary, SyntaxError};
