//! Token model and token stream
//!
//! The lexer turns source text into [`SpannedToken`]s tagged from the closed
//! [`Tag`] set. Identifiers, keywords and decorators are [`Word`]s shared
//! through the lexer's symbol table; integer and fractional literals carry
//! their values; punctuation and block structure carry only a tag.
//!
//! A [`TokenStream`] holds the full output of one lexer run and exposes a
//! forward cursor (`peek`/`next`) plus bounds-checked random access.

pub mod token;
pub mod token_stream;

pub use token::{Tag, Token, TokenClass, Word};
pub use token_stream::{validation, SpannedToken, TokenStream, TokenStreamBuilder};
