//! Lexeme interning for one lexer run
use crate::tokens::{Tag, Word};
use std::collections::HashMap;
use std::sync::Arc;

/// Reserved spellings registered before any source is read
const RESERVED: &[(&str, Tag)] = &[
    ("and", Tag::And),
    ("or", Tag::Or),
    ("not", Tag::Not),
    ("True", Tag::True),
    ("False", Tag::False),
    ("None", Tag::None),
    ("Any", Tag::Any),
    ("if", Tag::If),
    ("elif", Tag::Elif),
    ("else", Tag::Else),
    ("for", Tag::For),
    ("while", Tag::While),
    ("class", Tag::Class),
    ("def", Tag::Def),
    ("self", Tag::SelfKw),
    ("super", Tag::Super),
    ("return", Tag::Return),
    ("pass", Tag::Pass),
    ("in", Tag::In),
    ("is", Tag::Is),
    ("break", Tag::Break),
    ("continue", Tag::Continue),
    ("from", Tag::From),
    ("import", Tag::Import),
    ("cls", Tag::Cls),
    ("@property", Tag::Property),
    ("@staticmethod", Tag::StaticMethod),
    ("@classmethod", Tag::ClassMethod),
    ("@abstractmethod", Tag::AbstractMethod),
    ("int", Tag::Type),
    ("float", Tag::Type),
    ("str", Tag::Type),
    ("list", Tag::Type),
    ("dict", Tag::Type),
    ("tuple", Tag::Type),
    ("set", Tag::Type),
    ("bool", Tag::Type),
];

/// Maps each lexeme to the single shared [`Word`] for it
#[derive(Debug, Clone)]
pub struct SymbolTable {
    words: HashMap<String, Arc<Word>>,
    reserved_count: usize,
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut words = HashMap::with_capacity(RESERVED.len() * 2);
        for &(lexeme, tag) in RESERVED {
            words.insert(lexeme.to_string(), Arc::new(Word::new(lexeme, tag)));
        }
        Self {
            reserved_count: words.len(),
            words,
        }
    }

    pub fn get(&self, lexeme: &str) -> Option<Arc<Word>> {
        self.words.get(lexeme).cloned()
    }

    /// Existing word for `lexeme`, or a new one tagged `tag` registered on first sight
    pub fn intern(&mut self, lexeme: &str, tag: Tag) -> Arc<Word> {
        if let Some(word) = self.words.get(lexeme) {
            return Arc::clone(word);
        }
        let word = Arc::new(Word::new(lexeme, tag));
        self.words.insert(lexeme.to_string(), Arc::clone(&word));
        word
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Entries added after construction
    pub fn interned_count(&self) -> usize {
        self.words.len() - self.reserved_count
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
