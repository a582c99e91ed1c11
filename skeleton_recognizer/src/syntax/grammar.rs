//! Recursive-descent recognizer for class and method skeletons
//!
//! ```text
//! program     -> pre_skip element+ post_skip
//! element     -> class_def+ | method_def+
//! class_def   -> CLASS VARIABLE inheritance? COLON NEWLINE INDENT method_def* DEDENT
//! method_def  -> (DECORATOR NEWLINE)? DEF method_name OPEN_PAREN params CLOSE_PAREN
//!                (ARROW TYPE)? COLON NEWLINE INDENT <balanced block> DEDENT
//! ```
//!
//! The decorator seen before `def` decides the mandatory first parameter.
//! Method bodies are skipped by counting INDENT/DEDENT, never inspected.

use crate::config::compile_time::syntax::{MAX_CLASS_COUNT, MAX_PARAMETERS_PER_METHOD};
use crate::config::runtime::SyntaxPreferences;
use crate::syntax::error::{SyntaxError, SyntaxResult};
use crate::syntax::parser::Parser;
use crate::tokens::{SpannedToken, Tag, TokenStream};
use crate::utils::Span;
use serde::Serialize;
use std::fmt;

/// The four decorators that shape a method header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decorator {
    Property,
    StaticMethod,
    ClassMethod,
    AbstractMethod,
}

impl Decorator {
    pub fn from_tag(tag: Tag) -> Option<Self> {
        match tag {
            Tag::Property => Some(Decorator::Property),
            Tag::StaticMethod => Some(Decorator::StaticMethod),
            Tag::ClassMethod => Some(Decorator::ClassMethod),
            Tag::AbstractMethod => Some(Decorator::AbstractMethod),
            _ => None,
        }
    }

    pub fn tag(self) -> Tag {
        match self {
            Decorator::Property => Tag::Property,
            Decorator::StaticMethod => Tag::StaticMethod,
            Decorator::ClassMethod => Tag::ClassMethod,
            Decorator::AbstractMethod => Tag::AbstractMethod,
        }
    }

    /// Required first parameter; `None` means any parameter list
    pub fn receiver(self) -> Option<Tag> {
        match self {
            Decorator::ClassMethod => Some(Tag::Cls),
            Decorator::Property | Decorator::AbstractMethod => Some(Tag::SelfKw),
            Decorator::StaticMethod => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Decorator::Property => "property",
            Decorator::StaticMethod => "staticmethod",
            Decorator::ClassMethod => "classmethod",
            Decorator::AbstractMethod => "abstractmethod",
        }
    }
}

impl fmt::Display for Decorator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodSignature {
    pub name: String,
    pub decorator: Option<Decorator>,
    pub parameters: Vec<String>,
    pub return_type: Option<String>,
    #[serde(skip)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassSkeleton {
    pub name: String,
    pub bases: Vec<String>,
    pub methods: Vec<MethodSignature>,
    #[serde(skip)]
    pub span: Span,
}

/// What a successful run recognized; the verdict itself is the `Ok`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SkeletonSummary {
    pub classes: Vec<ClassSkeleton>,
    /// Methods defined outside any class
    pub functions: Vec<MethodSignature>,
}

impl SkeletonSummary {
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn method_count(&self) -> usize {
        self.functions.len() + self.classes.iter().map(|c| c.methods.len()).sum::<usize>()
    }

    pub fn decorated_method_count(&self) -> usize {
        self.all_methods().filter(|m| m.decorator.is_some()).count()
    }

    pub fn all_methods(&self) -> impl Iterator<Item = &MethodSignature> {
        self.classes
            .iter()
            .flat_map(|c| c.methods.iter())
            .chain(self.functions.iter())
    }
}

impl fmt::Display for SkeletonSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} class(es), {} method(s), {} decorated",
            self.class_count(),
            self.method_count(),
            self.decorated_method_count()
        )
    }
}

pub struct RecursiveDescent {
    parser: Parser,
    trace: bool,
}

impl RecursiveDescent {
    pub fn new(stream: TokenStream) -> Self {
        Self::with_preferences(stream, &SyntaxPreferences::default())
    }

    pub fn with_preferences(stream: TokenStream, preferences: &SyntaxPreferences) -> Self {
        Self {
            parser: Parser::new(stream),
            trace: preferences.trace_productions,
        }
    }

    pub fn stream(&self) -> &TokenStream {
        self.parser.stream()
    }

    /// Recognize the whole stream, stopping at the first error
    pub fn parse(&mut self) -> SyntaxResult<SkeletonSummary> {
        if self.parser.stream().is_empty() {
            return Err(SyntaxError::EmptyTokenStream);
        }
        self.parser.reset();

        let mut summary = SkeletonSummary::default();
        self.program(&mut summary)?;
        Ok(summary)
    }

    fn enter(&self, production: &str) {
        if self.trace {
            crate::log_debug!("Production",
                "name" => production,
                "position" => self.parser.position()
            );
        }
    }

    fn program(&mut self, summary: &mut SkeletonSummary) -> SyntaxResult<()> {
        self.enter("program");
        self.pre_skip();
        loop {
            self.element(summary)?;
            if !self.starts_element() {
                break;
            }
        }
        self.post_skip();
        Ok(())
    }

    fn starts_element(&self) -> bool {
        self.parser
            .look_tag()
            .is_some_and(Tag::starts_definition)
    }

    fn starts_method(&self) -> bool {
        self.parser
            .look_tag()
            .is_some_and(|tag| tag == Tag::Def || tag.is_reserved_decorator())
    }

    fn element(&mut self, summary: &mut SkeletonSummary) -> SyntaxResult<()> {
        if self.parser.is_type(Tag::Class) {
            while self.parser.is_type(Tag::Class) {
                let class = self.class_def()?;
                summary.classes.push(class);
                if summary.classes.len() > MAX_CLASS_COUNT {
                    return Err(SyntaxError::TooManyClasses {
                        count: summary.classes.len(),
                        max: MAX_CLASS_COUNT,
                    });
                }
            }
        } else {
            self.method_defs(&mut summary.functions)?;
        }
        Ok(())
    }

    fn class_def(&mut self) -> SyntaxResult<ClassSkeleton> {
        self.enter("class_def");
        let start = self.parser.match_tag(Tag::Class)?.span;
        let name = lexeme_of(self.parser.match_tag(Tag::Variable)?);
        let bases = self.inheritance()?;
        self.parser.match_tag(Tag::Colon)?;

        // class suite
        self.parser.match_tag(Tag::Newline)?;
        self.parser.match_tag(Tag::Indent)?;
        let mut methods = Vec::new();
        if !self.parser.is_at_end() && !self.parser.is_type(Tag::Dedent) {
            self.method_defs(&mut methods)?;
        }
        let end = self.parser.match_tag(Tag::Dedent)?.span;

        Ok(ClassSkeleton {
            name,
            bases,
            methods,
            span: start.merge(end),
        })
    }

    fn inheritance(&mut self) -> SyntaxResult<Vec<String>> {
        let mut bases = Vec::new();
        if !self.parser.is_type(Tag::OpenParen) {
            return Ok(bases);
        }

        self.enter("inheritance");
        self.parser.match_tag(Tag::OpenParen)?;
        bases.push(lexeme_of(self.parser.match_tag(Tag::Variable)?));
        while self.parser.is_type(Tag::Comma) {
            self.parser.match_tag(Tag::Comma)?;
            bases.push(lexeme_of(self.parser.match_tag(Tag::Variable)?));
        }
        self.parser.match_tag(Tag::CloseParen)?;
        Ok(bases)
    }

    fn method_defs(&mut self, methods: &mut Vec<MethodSignature>) -> SyntaxResult<()> {
        loop {
            let method = self.method_def()?;
            methods.push(method);
            if !self.starts_method() {
                return Ok(());
            }
        }
    }

    fn method_def(&mut self) -> SyntaxResult<MethodSignature> {
        self.enter("method_def");
        let decorator = self.parser.look_tag().and_then(Decorator::from_tag);
        let decorator_span = match decorator {
            Some(kind) => {
                let span = self.parser.match_tag(kind.tag())?.span;
                self.parser.match_tag(Tag::Newline)?;
                Some(span)
            }
            None => None,
        };

        let def_span = self.parser.match_tag(Tag::Def)?.span;
        let name = self.method_name()?;
        self.parser.match_tag(Tag::OpenParen)?;

        let mut parameters = Vec::new();
        match decorator.map_or(Some(Tag::SelfKw), Decorator::receiver) {
            Some(receiver) => {
                parameters.push(lexeme_of(self.parser.match_tag(receiver)?));
                self.more_params(&mut parameters)?;
            }
            None => self.param_list(&mut parameters)?,
        }
        if parameters.len() > MAX_PARAMETERS_PER_METHOD {
            return Err(SyntaxError::TooManyParameters {
                method: name,
                count: parameters.len(),
                max: MAX_PARAMETERS_PER_METHOD,
            });
        }
        self.parser.match_tag(Tag::CloseParen)?;

        let return_type = if self.parser.is_type(Tag::Arrow) {
            self.parser.match_tag(Tag::Arrow)?;
            Some(lexeme_of(self.parser.match_tag(Tag::Type)?))
        } else {
            None
        };
        self.parser.match_tag(Tag::Colon)?;
        let end = self.method_suite()?;

        Ok(MethodSignature {
            name,
            decorator,
            parameters,
            return_type,
            span: decorator_span.unwrap_or(def_span).merge(end),
        })
    }

    fn method_name(&mut self) -> SyntaxResult<String> {
        let token = if self.parser.is_type(Tag::SpecialName) {
            self.parser.match_tag(Tag::SpecialName)?
        } else {
            self.parser.match_tag(Tag::Variable)?
        };
        Ok(lexeme_of(token))
    }

    fn param_list(&mut self, parameters: &mut Vec<String>) -> SyntaxResult<()> {
        if self.parser.is_type(Tag::Variable) || self.parser.is_type(Tag::Mult) {
            self.parameter(parameters)?;
            self.more_params(parameters)?;
        }
        Ok(())
    }

    fn more_params(&mut self, parameters: &mut Vec<String>) -> SyntaxResult<()> {
        while self.parser.is_type(Tag::Comma) {
            self.parser.match_tag(Tag::Comma)?;
            self.parameter(parameters)?;
        }
        Ok(())
    }

    fn parameter(&mut self, parameters: &mut Vec<String>) -> SyntaxResult<()> {
        let mut prefix = String::new();
        if self.parser.is_type(Tag::Mult) {
            self.parser.match_tag(Tag::Mult)?;
            prefix.push('*');
            if self.parser.is_type(Tag::Mult) {
                self.parser.match_tag(Tag::Mult)?;
                prefix.push('*');
            }
        }
        let name = lexeme_of(self.parser.match_tag(Tag::Variable)?);

        // type hint
        if self.parser.is_type(Tag::Colon) {
            self.parser.match_tag(Tag::Colon)?;
            self.parser.match_tag(Tag::Type)?;
        }

        // default value, skipped up to the next `,` or `)`
        if self.parser.is_type(Tag::Assign) {
            self.parser.match_tag(Tag::Assign)?;
            while !self.parser.is_at_end()
                && !self.parser.is_type(Tag::Comma)
                && !self.parser.is_type(Tag::CloseParen)
            {
                self.parser.move_next();
            }
        }

        parameters.push(prefix + &name);
        Ok(())
    }

    /// NEWLINE INDENT body DEDENT; returns the closing DEDENT's span
    fn method_suite(&mut self) -> SyntaxResult<Span> {
        self.parser.match_tag(Tag::Newline)?;
        self.parser.match_tag(Tag::Indent)?;
        if !self.parser.is_at_end() && !self.parser.is_type(Tag::Dedent) {
            self.skip_one_balanced_block();
        }
        Ok(self.parser.match_tag(Tag::Dedent)?.span)
    }

    /// Skip tokens until the DEDENT closing the already-open block, leaving it unconsumed
    fn skip_one_balanced_block(&mut self) {
        let mut depth: usize = 1;
        while let Some(tag) = self.parser.look_tag() {
            match tag {
                Tag::Indent => depth += 1,
                Tag::Dedent => {
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                _ => {}
            }
            self.parser.move_next();
        }
    }

    fn pre_skip(&mut self) {
        while !self.parser.is_at_end() && !self.starts_element() {
            self.parser.move_next();
        }
    }

    fn post_skip(&mut self) {
        while !self.parser.is_at_end() {
            self.parser.move_next();
        }
    }
}

fn lexeme_of(token: SpannedToken) -> String {
    token.value.lexeme().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexical::{tokenize_source, LexerError};
    use assert_matches::assert_matches;

    fn parse(source: &str) -> SyntaxResult<SkeletonSummary> {
        let stream = tokenize_source(source).expect("source should lex");
        RecursiveDescent::new(stream).parse()
    }

    #[test]
    fn test_simple_class() {
        let summary = parse("class MyClass:\n    def __init__(self):\n        pass").expect("accepted");
        assert_eq!(summary.class_count(), 1);
        assert_eq!(summary.classes[0].name, "MyClass");
        assert_eq!(summary.classes[0].methods[0].name, "__init__");
        assert_eq!(summary.classes[0].methods[0].parameters, vec!["self"]);
    }

    #[test]
    fn test_missing_colon() {
        assert_matches!(
            parse("class MyClass\n    pass"),
            Err(SyntaxError::UnexpectedToken {
                position: 2,
                expected: Tag::Colon,
                found: Tag::Newline,
                ..
            })
        );
    }

    #[test]
    fn test_property_requires_self() {
        assert_matches!(
            parse("@property\ndef my_property(cls):\n    pass"),
            Err(SyntaxError::UnexpectedToken {
                expected: Tag::SelfKw,
                found: Tag::Cls,
                ..
            })
        );
    }

    #[test]
    fn test_classmethod_requires_cls() {
        assert_matches!(
            parse("class A:\n    @classmethod\n    def make(self):\n        pass\n"),
            Err(SyntaxError::UnexpectedToken {
                expected: Tag::Cls,
                found: Tag::SelfKw,
                ..
            })
        );
    }

    #[test]
    fn test_plain_method_requires_self() {
        assert_matches!(
            parse("class A:\n    def f(x):\n        pass\n"),
            Err(SyntaxError::UnexpectedToken {
                expected: Tag::SelfKw,
                found: Tag::Variable,
                ..
            })
        );
    }

    #[test]
    fn test_bad_indentation_is_lexical() {
        let source = "class A:\n    def f(self):\n        pass\n  def g(self):\n        pass";
        assert_matches!(
            tokenize_source(source),
            Err(LexerError::InvalidIndentation { .. })
        );
    }

    #[test]
    fn test_inheritance_and_return_type() {
        let summary = parse(
            "class Dog(Animal, Pet):\n    def bark(self, times: int = 1) -> str:\n        return 'woof'\n",
        )
        .expect("accepted");
        let class = &summary.classes[0];
        assert_eq!(class.bases, vec!["Animal", "Pet"]);
        assert_eq!(class.methods[0].parameters, vec!["self", "times"]);
        assert_eq!(class.methods[0].return_type.as_deref(), Some("str"));
    }

    #[test]
    fn test_every_decorator() {
        let source = "\
class Shape:
    @abstractmethod
    def area(self) -> float:
        pass

    @property
    def name(self):
        return self._name

    @staticmethod
    def unit(x, y=None, *args, **kwargs):
        return Shape()

    @staticmethod
    def empty():
        pass

    @classmethod
    def create(cls, size: int):
        return cls(size)
";
        let summary = parse(source).expect("accepted");
        let methods = &summary.classes[0].methods;
        let kinds: Vec<Option<Decorator>> = methods.iter().map(|m| m.decorator).collect();
        assert_eq!(
            kinds,
            vec![
                Some(Decorator::AbstractMethod),
                Some(Decorator::Property),
                Some(Decorator::StaticMethod),
                Some(Decorator::StaticMethod),
                Some(Decorator::ClassMethod),
            ]
        );
        assert_eq!(methods[2].parameters, vec!["x", "y", "*args", "**kwargs"]);
        assert!(methods[3].parameters.is_empty());
        assert_eq!(summary.decorated_method_count(), 5);
    }

    #[test]
    fn test_nested_bodies_are_skipped() {
        let source = "\
class Counter:
    def tick(self, n):
        for i in range(n):
            if i % 2 == 0:
                self.count = self.count + 1
            else:
                pass
        return self.count

    def reset(self):
        self.count = 0
";
        let summary = parse(source).expect("accepted");
        let names: Vec<&str> = summary.classes[0]
            .methods
            .iter()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(names, vec!["tick", "reset"]);
    }

    #[test]
    fn test_module_statements_are_skipped() {
        let source = "\
import os
x = 1
class A:
    def f(self):
        pass
class B(A):
    def g(self):
        pass
print(A())
";
        let summary = parse(source).expect("accepted");
        assert_eq!(summary.class_count(), 2);
        assert_eq!(summary.method_count(), 2);
    }

    #[test]
    fn test_top_level_methods() {
        let summary = parse("def helper(self):\n    pass\n").expect("accepted");
        assert_eq!(summary.functions.len(), 1);
        assert_matches!(
            parse("def helper():\n    pass\n"),
            Err(SyntaxError::UnexpectedToken {
                expected: Tag::SelfKw,
                ..
            })
        );
    }

    #[test]
    fn test_no_definitions_fails_at_end() {
        assert_matches!(
            parse("x = 1\n"),
            Err(SyntaxError::UnexpectedEndOfInput {
                expected: Tag::Def,
                ..
            })
        );
    }

    #[test]
    fn test_empty_stream() {
        assert_eq!(
            RecursiveDescent::new(TokenStream::default()).parse(),
            Err(SyntaxError::EmptyTokenStream)
        );
    }

    #[test]
    fn test_class_body_must_hold_methods() {
        assert_matches!(
            parse("class A:\n    x = 1\n"),
            Err(SyntaxError::UnexpectedToken {
                expected: Tag::Def,
                found: Tag::Variable,
                ..
            })
        );
    }

    #[test]
    fn test_recognition_is_idempotent() {
        let good = "class A:\n    def f(self):\n        pass\n";
        let bad = "class A:\n    @property\n    def f(cls):\n        pass\n";

        for source in [good, bad] {
            let stream = tokenize_source(source).expect("source should lex");
            let mut recognizer = RecursiveDescent::new(stream);
            let first = recognizer.parse();
            let second = recognizer.parse();
            assert_eq!(first, second);
            assert_eq!(first, parse(source));
        }
    }

    #[test]
    fn test_decorator_receivers() {
        assert_eq!(Decorator::ClassMethod.receiver(), Some(Tag::Cls));
        assert_eq!(Decorator::AbstractMethod.receiver(), Some(Tag::SelfKw));
        assert_eq!(Decorator::StaticMethod.receiver(), None);
        assert_eq!(Decorator::from_tag(Tag::Decorator), None);
        assert_eq!(Decorator::Property.to_string(), "@property");
    }
}
