//! Token model for the skeleton lexer
//!
//! A closed [`Tag`] set, the interned [`Word`] payload, and the [`Token`]
//! enum that pairs them with numeric literals and structural markers.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Every token kind the lexer can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tag {
    // Keywords
    And,
    Or,
    Not,
    True,
    False,
    None,
    Any,
    If,
    Elif,
    Else,
    For,
    While,
    Class,
    Def,
    SelfKw,
    Super,
    Return,
    Pass,
    In,
    Is,
    Break,
    Continue,
    From,
    Import,
    Cls,

    // Decorators
    Property,
    StaticMethod,
    ClassMethod,
    AbstractMethod,
    Decorator,

    // Punctuation
    Colon,
    Comma,
    Dot,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    OpenBrace,
    CloseBrace,

    // Operators
    Assign,
    Arrow,
    LogicOp,
    Plus,
    Minus,
    Mult,
    Div,
    Mod,

    // Block structure
    Indent,
    Dedent,
    Newline,

    // Names and literals
    Type,
    Variable,
    SpecialName,
    Num,
    Real,
    String,
    Docstring,
}

/// Coarse grouping used for metrics and diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenClass {
    Keyword,
    Decorator,
    Punctuation,
    Operator,
    Structure,
    Name,
    Literal,
}

impl Tag {
    /// Upper-case tag name used in diagnostics
    pub fn name(self) -> &'static str {
        match self {
            Tag::And => "AND",
            Tag::Or => "OR",
            Tag::Not => "NOT",
            Tag::True => "TRUE",
            Tag::False => "FALSE",
            Tag::None => "NONE",
            Tag::Any => "ANY",
            Tag::If => "IF",
            Tag::Elif => "ELIF",
            Tag::Else => "ELSE",
            Tag::For => "FOR",
            Tag::While => "WHILE",
            Tag::Class => "CLASS",
            Tag::Def => "DEF",
            Tag::SelfKw => "SELF",
            Tag::Super => "SUPER",
            Tag::Return => "RETURN",
            Tag::Pass => "PASS",
            Tag::In => "IN",
            Tag::Is => "IS",
            Tag::Break => "BREAK",
            Tag::Continue => "CONTINUE",
            Tag::From => "FROM",
            Tag::Import => "IMPORT",
            Tag::Cls => "CLS",
            Tag::Property => "PROPERTY",
            Tag::StaticMethod => "STATICMETHOD",
            Tag::ClassMethod => "CLASSMETHOD",
            Tag::AbstractMethod => "ABSTRACTMETHOD",
            Tag::Decorator => "DECORATOR",
            Tag::Colon => "COLON",
            Tag::Comma => "COMMA",
            Tag::Dot => "DOT",
            Tag::OpenParen => "OPEN_PARENTHESIS",
            Tag::CloseParen => "CLOSE_PARENTHESIS",
            Tag::OpenBracket => "OPEN_BRACKET",
            Tag::CloseBracket => "CLOSE_BRACKET",
            Tag::OpenBrace => "OPEN_BRACE",
            Tag::CloseBrace => "CLOSE_BRACE",
            Tag::Assign => "ASSIGN",
            Tag::Arrow => "ARROW",
            Tag::LogicOp => "LOGIC_OP",
            Tag::Plus => "PLUS",
            Tag::Minus => "MINUS",
            Tag::Mult => "MULT",
            Tag::Div => "DIV",
            Tag::Mod => "MOD",
            Tag::Indent => "INDENT",
            Tag::Dedent => "DEDENT",
            Tag::Newline => "NEWLINE",
            Tag::Type => "TYPE",
            Tag::Variable => "VARIABLE",
            Tag::SpecialName => "SPECIAL_NAME",
            Tag::Num => "NUM",
            Tag::Real => "REAL",
            Tag::String => "STRING",
            Tag::Docstring => "DOCSTRING",
        }
    }

    pub fn class(self) -> TokenClass {
        match self {
            Tag::Property
            | Tag::StaticMethod
            | Tag::ClassMethod
            | Tag::AbstractMethod
            | Tag::Decorator => TokenClass::Decorator,
            Tag::Colon
            | Tag::Comma
            | Tag::Dot
            | Tag::OpenParen
            | Tag::CloseParen
            | Tag::OpenBracket
            | Tag::CloseBracket
            | Tag::OpenBrace
            | Tag::CloseBrace => TokenClass::Punctuation,
            Tag::Assign
            | Tag::Arrow
            | Tag::LogicOp
            | Tag::Plus
            | Tag::Minus
            | Tag::Mult
            | Tag::Div
            | Tag::Mod => TokenClass::Operator,
            Tag::Indent | Tag::Dedent | Tag::Newline => TokenClass::Structure,
            Tag::Type | Tag::Variable | Tag::SpecialName => TokenClass::Name,
            Tag::Num | Tag::Real | Tag::String | Tag::Docstring => TokenClass::Literal,
            _ => TokenClass::Keyword,
        }
    }

    /// One of the four decorators that select a method header shape
    pub fn is_reserved_decorator(self) -> bool {
        matches!(
            self,
            Tag::Property | Tag::StaticMethod | Tag::ClassMethod | Tag::AbstractMethod
        )
    }

    /// Tokens that can begin a class or method definition
    pub fn starts_definition(self) -> bool {
        matches!(self, Tag::Class | Tag::Def) || self.is_reserved_decorator()
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A lexeme with its tag; identifiers and keywords are shared through the symbol table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Word {
    pub lexeme: String,
    pub tag: Tag,
}

impl Word {
    pub fn new(lexeme: impl Into<String>, tag: Tag) -> Self {
        Self {
            lexeme: lexeme.into(),
            tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifiers, keywords, decorators, strings and comparison operators
    Word(Arc<Word>),
    /// Integer literal
    Num(i64),
    /// Fractional literal
    Real(f64),
    /// Punctuation, single-character operators and block structure
    Structural(Tag),
}

impl Token {
    pub fn word(lexeme: impl Into<String>, tag: Tag) -> Self {
        Token::Word(Arc::new(Word::new(lexeme, tag)))
    }

    pub fn tag(&self) -> Tag {
        match self {
            Token::Word(word) => word.tag,
            Token::Num(_) => Tag::Num,
            Token::Real(_) => Tag::Real,
            Token::Structural(tag) => *tag,
        }
    }

    pub fn lexeme(&self) -> Option<&str> {
        match self {
            Token::Word(word) => Some(&word.lexeme),
            _ => None,
        }
    }

    pub fn class(&self) -> TokenClass {
        self.tag().class()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(word) => match word.tag {
                Tag::String | Tag::Docstring => write!(f, "{}({:?})", word.tag, word.lexeme),
                tag => write!(f, "{}({})", tag, word.lexeme),
            },
            Token::Num(value) => write!(f, "NUM({})", value),
            Token::Real(value) => write!(f, "REAL({})", value),
            Token::Structural(tag) => write!(f, "{}", tag),
        }
    }
}
