//! Indentation-sensitive lexer
//!
//! Tokens are produced on demand by [`Lexer::scan`]. Leading whitespace at the
//! start of a statement line becomes INDENT/DEDENT tokens; a dedent that closes
//! several blocks at once emits the first DEDENT immediately and queues the rest,
//! so callers observe them one per call.

use crate::config::compile_time::lexical::*;
use crate::config::runtime::LexicalPreferences;
use crate::lexical::symbol_table::SymbolTable;
use crate::logging::codes::{self, Code, Severity};
use crate::tokens::{SpannedToken, Tag, Token, TokenStream};
use crate::utils::{Position, SourceMap, Span, Spanned};
use crate::{log_debug, log_error};
use std::collections::VecDeque;
use std::path::Path;

/// Lexical failures; every one ends the current run
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexerError {
    #[error("Cannot open source file: {path}: {reason}")]
    CannotOpenSource { path: String, reason: String },

    #[error("Invalid indentation at line {line}")]
    InvalidIndentation { line: u32 },

    #[error("Unterminated string at line {line}, column {column}")]
    UnterminatedString { line: u32, column: u32 },

    #[error("Unterminated docstring at line {line}, column {column}")]
    UnterminatedDocstring { line: u32, column: u32 },

    #[error("Unexpected character: '{character}' at line {line}, column {column}")]
    UnexpectedCharacter {
        character: char,
        line: u32,
        column: u32,
    },

    #[error("Invalid number literal '{text}' at line {line}")]
    InvalidNumber { text: String, line: u32 },

    #[error("Identifier too long: {length} characters at line {line} (max {max})", max = MAX_IDENTIFIER_LENGTH)]
    IdentifierTooLong { length: usize, line: u32 },

    #[error("String too large: {size} bytes at line {line} (max {max})", max = MAX_STRING_SIZE)]
    StringTooLarge { size: usize, line: u32 },

    #[error("Too many tokens: {count} (max {max})", max = MAX_TOKEN_COUNT)]
    TooManyTokens { count: usize },

    #[error("Indentation too deep: {depth} levels at line {line} (max {max})", max = MAX_INDENT_DEPTH)]
    IndentTooDeep { depth: usize, line: u32 },
}

impl LexerError {
    pub fn error_code(&self) -> Code {
        match self {
            LexerError::CannotOpenSource { .. } => codes::lexical::CANNOT_OPEN_SOURCE,
            LexerError::InvalidIndentation { .. } => codes::lexical::INVALID_INDENTATION,
            LexerError::UnterminatedString { .. } => codes::lexical::UNTERMINATED_STRING,
            LexerError::UnterminatedDocstring { .. } => codes::lexical::UNTERMINATED_DOCSTRING,
            LexerError::UnexpectedCharacter { .. } => codes::lexical::UNEXPECTED_CHARACTER,
            LexerError::InvalidNumber { .. } => codes::lexical::INVALID_NUMBER,
            LexerError::IdentifierTooLong { .. } => codes::lexical::IDENTIFIER_TOO_LONG,
            LexerError::StringTooLarge { .. } => codes::lexical::STRING_TOO_LARGE,
            LexerError::TooManyTokens { .. } => codes::lexical::TOO_MANY_TOKENS,
            LexerError::IndentTooDeep { .. } => codes::lexical::INDENT_TOO_DEEP,
        }
    }

    pub fn severity(&self) -> Severity {
        codes::get_severity(self.error_code().as_str())
    }

    pub fn is_recoverable(&self) -> bool {
        codes::is_recoverable(self.error_code().as_str())
    }

    /// Source line the failure was detected on, when known
    pub fn line(&self) -> Option<u32> {
        match self {
            LexerError::InvalidIndentation { line }
            | LexerError::UnterminatedString { line, .. }
            | LexerError::UnterminatedDocstring { line, .. }
            | LexerError::UnexpectedCharacter { line, .. }
            | LexerError::InvalidNumber { line, .. }
            | LexerError::IdentifierTooLong { line, .. }
            | LexerError::StringTooLarge { line, .. }
            | LexerError::IndentTooDeep { line, .. } => Some(*line),
            LexerError::CannotOpenSource { .. } | LexerError::TooManyTokens { .. } => None,
        }
    }
}

/// Per-run token counts
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LexicalMetrics {
    pub total_tokens: usize,
    pub keyword_tokens: usize,
    pub identifier_tokens: usize,
    pub special_name_tokens: usize,
    pub number_tokens: usize,
    pub string_tokens: usize,
    pub docstring_tokens: usize,
    pub decorator_tokens: usize,
    pub indent_tokens: usize,
    pub dedent_tokens: usize,
    pub newline_tokens: usize,
    pub comment_count: usize,
    pub max_indent_depth: usize,
    pub longest_identifier: usize,
}

impl LexicalMetrics {
    pub(crate) fn record_token(&mut self, token: &Token) {
        self.total_tokens += 1;

        match token.tag() {
            Tag::Variable | Tag::Type => self.identifier_tokens += 1,
            Tag::SpecialName => self.special_name_tokens += 1,
            Tag::Num | Tag::Real => self.number_tokens += 1,
            Tag::String => self.string_tokens += 1,
            Tag::Docstring => self.docstring_tokens += 1,
            Tag::Indent => self.indent_tokens += 1,
            Tag::Dedent => self.dedent_tokens += 1,
            Tag::Newline => self.newline_tokens += 1,
            tag if tag.class() == crate::tokens::TokenClass::Decorator => {
                self.decorator_tokens += 1
            }
            tag if tag.class() == crate::tokens::TokenClass::Keyword => self.keyword_tokens += 1,
            _ => {}
        }

        if let Token::Word(word) = token {
            if matches!(word.tag, Tag::Variable | Tag::SpecialName) {
                self.longest_identifier = self.longest_identifier.max(word.lexeme.len());
            }
        }
    }
}

#[derive(Debug)]
pub struct Lexer {
    source: String,
    chars: Vec<char>,
    index: usize,
    cursor: Position,
    line_start: bool,
    indent_stack: Vec<usize>,
    dedent_queue: VecDeque<SpannedToken>,
    symbols: SymbolTable,
    metrics: LexicalMetrics,
    preferences: LexicalPreferences,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self::with_preferences(source, LexicalPreferences::default())
    }

    pub fn with_preferences(source: &str, preferences: LexicalPreferences) -> Self {
        Self {
            source: source.to_string(),
            chars: source.chars().collect(),
            index: 0,
            cursor: Position::start(),
            line_start: true,
            indent_stack: vec![0],
            dedent_queue: VecDeque::new(),
            symbols: SymbolTable::new(),
            metrics: LexicalMetrics::default(),
            preferences,
        }
    }

    /// Read a source file; fails with `CannotOpenSource` before any token exists
    pub fn from_path(path: &Path) -> Result<Self, LexerError> {
        let source =
            std::fs::read_to_string(path).map_err(|e| LexerError::CannotOpenSource {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self::new(&source))
    }

    pub fn metrics(&self) -> &LexicalMetrics {
        &self.metrics
    }

    pub fn symbol_table(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Next token, or `None` once input and pending DEDENTs are exhausted
    pub fn scan(&mut self) -> Result<Option<SpannedToken>, LexerError> {
        if let Some(token) = self.dedent_queue.pop_front() {
            return self.emit(token).map(Some);
        }

        loop {
            let at_line_start = std::mem::replace(&mut self.line_start, false);
            let line_begin = self.cursor;
            let width = self.skip_whitespace(at_line_start);

            if at_line_start && !matches!(self.peek(), Some('\n') | Some('#') | None) {
                let top = self.current_indent();
                if width > top {
                    return self.indent(width, line_begin).map(Some);
                }
                if width < top {
                    return self.dedent(width).map(Some);
                }
            }

            let start = self.cursor;
            let ch = match self.peek() {
                Some(ch) => ch,
                None => return self.end_of_input(),
            };

            let token = match ch {
                '#' => {
                    self.skip_comment();
                    continue;
                }
                '\n' => {
                    self.bump();
                    self.line_start = true;
                    Token::Structural(Tag::Newline)
                }
                '@' => self.decorator()?,
                c if c.is_ascii_alphabetic() || c == '_' => self.identifier()?,
                c if c.is_ascii_digit() => self.number()?,
                '"' | '\'' => self.string(ch)?,
                _ => match self.punctuation(ch) {
                    Some(tag) => {
                        self.bump();
                        Token::Structural(tag)
                    }
                    None => self.operator(ch)?,
                },
            };

            let span = Span::new(start, self.cursor);
            return self.emit(Spanned::new(token, span)).map(Some);
        }
    }

    /// Drain the lexer into a stream that carries the source for diagnostics
    pub fn generate_stream(&mut self) -> Result<TokenStream, LexerError> {
        let mut stream = TokenStream::default();

        loop {
            match self.scan() {
                Ok(Some(token)) => stream.add_token(token),
                Ok(None) => break,
                Err(error) => {
                    let message = if self.preferences.include_position_in_errors {
                        format!(
                            "Lexical analysis failed at line {}, column {}",
                            self.cursor.line, self.cursor.column
                        )
                    } else {
                        "Lexical analysis failed".to_string()
                    };
                    log_error!(error.error_code(), &message,
                        span = Span::new(self.cursor, self.cursor),
                        "error" => &error,
                        "tokens_processed" => self.metrics.total_tokens
                    );
                    return Err(error);
                }
            }
        }

        stream.set_source_map(SourceMap::new(self.source.clone()));

        if self.preferences.collect_detailed_metrics {
            log_debug!("Lexical metrics",
                "tokens" => self.metrics.total_tokens,
                "keywords" => self.metrics.keyword_tokens,
                "identifiers" => self.metrics.identifier_tokens,
                "decorators" => self.metrics.decorator_tokens,
                "indents" => self.metrics.indent_tokens,
                "dedents" => self.metrics.dedent_tokens,
                "comments" => self.metrics.comment_count,
                "max_indent_depth" => self.metrics.max_indent_depth,
                "interned" => self.symbols.interned_count()
            );
        }

        Ok(stream)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.index + ahead).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.index += 1;
        self.cursor = self.cursor.advance(ch);
        Some(ch)
    }

    fn current_indent(&self) -> usize {
        self.indent_stack.last().copied().unwrap_or(0)
    }

    fn emit(&mut self, token: SpannedToken) -> Result<SpannedToken, LexerError> {
        if self.metrics.total_tokens >= MAX_TOKEN_COUNT {
            return Err(LexerError::TooManyTokens {
                count: self.metrics.total_tokens,
            });
        }
        if self.preferences.collect_detailed_metrics {
            self.metrics.record_token(&token.value);
        } else {
            self.metrics.total_tokens += 1;
        }
        Ok(token)
    }

    /// Skip blanks; at a line start, return the measured indentation width
    fn skip_whitespace(&mut self, at_line_start: bool) -> usize {
        let mut width = 0;
        while let Some(ch) = self.peek() {
            match ch {
                ' ' => width += 1,
                '\t' => width += TAB_WIDTH,
                '\r' => {}
                _ => break,
            }
            self.bump();
        }
        if at_line_start {
            width
        } else {
            0
        }
    }

    fn skip_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.bump();
        }
        self.metrics.comment_count += 1;
    }

    fn indent(&mut self, width: usize, line_begin: Position) -> Result<SpannedToken, LexerError> {
        if self.indent_stack.len() > MAX_INDENT_DEPTH {
            return Err(LexerError::IndentTooDeep {
                depth: self.indent_stack.len(),
                line: self.cursor.line,
            });
        }
        self.indent_stack.push(width);
        self.metrics.max_indent_depth = self.metrics.max_indent_depth.max(self.indent_stack.len() - 1);
        let span = Span::new(line_begin, self.cursor);
        self.emit(Spanned::new(Token::Structural(Tag::Indent), span))
    }

    fn dedent(&mut self, width: usize) -> Result<SpannedToken, LexerError> {
        let span = Span::new(self.cursor, self.cursor);
        self.indent_stack.pop();

        while self.indent_stack.last().is_some_and(|&top| width < top) {
            self.indent_stack.pop();
            self.dedent_queue
                .push_back(Spanned::new(Token::Structural(Tag::Dedent), span));
        }

        if self.indent_stack.last() != Some(&width) {
            return Err(LexerError::InvalidIndentation {
                line: self.cursor.line,
            });
        }

        self.emit(Spanned::new(Token::Structural(Tag::Dedent), span))
    }

    /// Close every block still open at end of input, one DEDENT per call
    fn end_of_input(&mut self) -> Result<Option<SpannedToken>, LexerError> {
        if self.indent_stack.len() <= 1 {
            return Ok(None);
        }

        let span = Span::new(self.cursor, self.cursor);
        self.indent_stack.pop();
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.dedent_queue
                .push_back(Spanned::new(Token::Structural(Tag::Dedent), span));
        }
        self.emit(Spanned::new(Token::Structural(Tag::Dedent), span))
            .map(Some)
    }

    fn take_while<F: Fn(char) -> bool>(&mut self, accept: F) -> String {
        let mut lexeme = String::new();
        while let Some(ch) = self.peek() {
            if !accept(ch) {
                break;
            }
            lexeme.push(ch);
            self.bump();
        }
        lexeme
    }

    /// The name after `@`, dots included, is held to the identifier limit
    fn decorator(&mut self) -> Result<Token, LexerError> {
        let line = self.cursor.line;
        self.bump();
        let name = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
        check_name_length(&name, line)?;
        Ok(Token::Word(self.symbols.intern(&format!("@{}", name), Tag::Decorator)))
    }

    fn identifier(&mut self) -> Result<Token, LexerError> {
        let line = self.cursor.line;
        let lexeme = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
        check_name_length(&lexeme, line)?;

        let tag = if is_dunder(&lexeme) {
            Tag::SpecialName
        } else {
            Tag::Variable
        };
        Ok(Token::Word(self.symbols.intern(&lexeme, tag)))
    }

    fn number(&mut self) -> Result<Token, LexerError> {
        let line = self.cursor.line;
        let mut text = self.take_while(|c| c.is_ascii_digit());

        let fractional = self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit());
        if fractional {
            self.bump();
            text.push('.');
            text.push_str(&self.take_while(|c| c.is_ascii_digit()));
            return text
                .parse::<f64>()
                .map(Token::Real)
                .map_err(|_| LexerError::InvalidNumber { text, line });
        }

        let mut value: i64 = 0;
        for digit in text.bytes().map(|b| i64::from(b - b'0')) {
            value = match value.checked_mul(10).and_then(|v| v.checked_add(digit)) {
                Some(v) => v,
                None => return Err(LexerError::InvalidNumber { text, line }),
            };
        }
        Ok(Token::Num(value))
    }

    fn string(&mut self, quote: char) -> Result<Token, LexerError> {
        let (line, column) = (self.cursor.line, self.cursor.column);
        let docstring = self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote);
        let mut content = String::new();

        if docstring {
            self.bump();
            self.bump();
            self.bump();
            loop {
                match self.peek() {
                    None => return Err(LexerError::UnterminatedDocstring { line, column }),
                    Some(c) if c == quote => {
                        let mut run = 0;
                        while run < 3 && self.peek() == Some(quote) {
                            self.bump();
                            run += 1;
                        }
                        if run == 3 {
                            break;
                        }
                        content.extend(std::iter::repeat(quote).take(run));
                    }
                    Some('\\') => {
                        self.bump();
                        match self.bump() {
                            Some(escaped) => content.push(unescape(escaped)),
                            None => return Err(LexerError::UnterminatedDocstring { line, column }),
                        }
                    }
                    Some(c) => {
                        content.push(c);
                        self.bump();
                    }
                }
                self.check_string_size(&content, line)?;
            }
            return Ok(Token::word(content, Tag::Docstring));
        }

        self.bump();
        loop {
            match self.peek() {
                None | Some('\n') => return Err(LexerError::UnterminatedString { line, column }),
                Some(c) if c == quote => {
                    self.bump();
                    break;
                }
                Some('\\') => {
                    self.bump();
                    match self.bump() {
                        Some(escaped) => content.push(unescape(escaped)),
                        None => return Err(LexerError::UnterminatedString { line, column }),
                    }
                }
                Some(c) => {
                    content.push(c);
                    self.bump();
                }
            }
            self.check_string_size(&content, line)?;
        }
        Ok(Token::word(content, Tag::String))
    }

    fn check_string_size(&self, content: &str, line: u32) -> Result<(), LexerError> {
        if content.len() > MAX_STRING_SIZE {
            return Err(LexerError::StringTooLarge {
                size: content.len(),
                line,
            });
        }
        Ok(())
    }

    fn punctuation(&self, ch: char) -> Option<Tag> {
        let tag = match ch {
            ':' => Tag::Colon,
            ',' => Tag::Comma,
            '.' => Tag::Dot,
            '(' => Tag::OpenParen,
            ')' => Tag::CloseParen,
            '[' => Tag::OpenBracket,
            ']' => Tag::CloseBracket,
            '{' => Tag::OpenBrace,
            '}' => Tag::CloseBrace,
            _ => return None,
        };
        Some(tag)
    }

    fn operator(&mut self, ch: char) -> Result<Token, LexerError> {
        let (line, column) = (self.cursor.line, self.cursor.column);
        let next = self.peek_at(1);

        let token = match (ch, next) {
            ('-', Some('>')) => Token::Structural(Tag::Arrow),
            ('=', Some('=')) => Token::word("==", Tag::LogicOp),
            ('!', Some('=')) => Token::word("!=", Tag::LogicOp),
            ('<', Some('=')) => Token::word("<=", Tag::LogicOp),
            ('>', Some('=')) => Token::word(">=", Tag::LogicOp),
            ('<', _) => Token::word("<", Tag::LogicOp),
            ('>', _) => Token::word(">", Tag::LogicOp),
            ('+', _) => Token::Structural(Tag::Plus),
            ('-', _) => Token::Structural(Tag::Minus),
            ('*', _) => Token::Structural(Tag::Mult),
            ('/', _) => Token::Structural(Tag::Div),
            ('%', _) => Token::Structural(Tag::Mod),
            ('=', _) => Token::Structural(Tag::Assign),
            _ => {
                return Err(LexerError::UnexpectedCharacter {
                    character: ch,
                    line,
                    column,
                })
            }
        };

        let width = match &token {
            Token::Structural(Tag::Arrow) => 2,
            Token::Word(word) => word.lexeme.chars().count(),
            _ => 1,
        };
        for _ in 0..width {
            self.bump();
        }
        Ok(token)
    }
}

fn check_name_length(name: &str, line: u32) -> Result<(), LexerError> {
    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(LexerError::IdentifierTooLong {
            length: name.len(),
            line,
        });
    }
    Ok(())
}

fn is_dunder(lexeme: &str) -> bool {
    lexeme.len() >= 4 && lexeme.starts_with("__") && lexeme.ends_with("__")
}

fn unescape(ch: char) -> char {
    match ch {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        other => other,
    }
}
