//! Stable codes for every event the recognizer logs
//!
//! Families: `ERR0xx` system, `E00x` source files, `E02x` lexical, `E04x` syntax,
//! `E06x` batch, `W0xx` warnings, `I0xx` success, `D000` debug. Error codes
//! carry registered metadata describing how a failure should be treated.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// What a caller should do after the failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The run may continue
    Recover,
    /// The input is rejected; other inputs are unaffected
    Reject,
    /// Stop everything
    Halt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Batch,
    FileProcessing,
    Lexical,
    Syntax,
    System,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Batch => "Batch",
            Category::FileProcessing => "FileProcessing",
            Category::Lexical => "Lexical",
            Category::Syntax => "Syntax",
            Category::System => "System",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: &'static str,
    pub category: Category,
    pub severity: Severity,
    pub disposition: Disposition,
    pub description: &'static str,
    pub recommended_action: &'static str,
}

impl ErrorMetadata {
    pub fn recoverable(&self) -> bool {
        self.disposition == Disposition::Recover
    }

    pub fn requires_halt(&self) -> bool {
        self.disposition == Disposition::Halt
    }
}

/// Fallback action text for unregistered codes
pub const NO_ACTION: &str = "No specific action available";

pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("ERR001");
    pub const INITIALIZATION_FAILURE: Code = Code::new("ERR002");
    pub const CONFIGURATION_ERROR: Code = Code::new("ERR003");
}

/// File processing error codes
pub mod file_processing {
    use super::Code;

    pub const FILE_NOT_FOUND: Code = Code::new("E005");
    pub const INVALID_EXTENSION: Code = Code::new("E006");
    pub const FILE_TOO_LARGE: Code = Code::new("E007");
    pub const EMPTY_FILE: Code = Code::new("E008");
    pub const PERMISSION_DENIED: Code = Code::new("E009");
    pub const INVALID_ENCODING: Code = Code::new("E010");
    pub const IO_ERROR: Code = Code::new("E011");
    pub const INVALID_PATH: Code = Code::new("E012");
    pub const TOO_MANY_LINES: Code = Code::new("E013");
}

/// Lexical analysis error codes
pub mod lexical {
    use super::Code;

    pub const CANNOT_OPEN_SOURCE: Code = Code::new("E020");
    pub const UNEXPECTED_CHARACTER: Code = Code::new("E021");
    pub const UNTERMINATED_STRING: Code = Code::new("E022");
    pub const UNTERMINATED_DOCSTRING: Code = Code::new("E023");
    pub const INVALID_INDENTATION: Code = Code::new("E024");
    pub const INVALID_NUMBER: Code = Code::new("E025");
    pub const IDENTIFIER_TOO_LONG: Code = Code::new("E026");
    pub const STRING_TOO_LARGE: Code = Code::new("E027");
    pub const TOO_MANY_TOKENS: Code = Code::new("E028");
    pub const INDENT_TOO_DEEP: Code = Code::new("E029");
}

/// Syntax analysis error codes
pub mod syntax {
    use super::Code;

    pub const UNEXPECTED_TOKEN: Code = Code::new("E040");
    pub const UNEXPECTED_END_OF_INPUT: Code = Code::new("E041");
    pub const EMPTY_TOKEN_STREAM: Code = Code::new("E042");
    pub const TOO_MANY_CLASSES: Code = Code::new("E043");
    pub const TOO_MANY_PARAMETERS: Code = Code::new("E044");
}

/// Batch processing error codes
pub mod batch {
    use super::Code;

    pub const DIRECTORY_NOT_FOUND: Code = Code::new("E060");
    pub const NO_SOURCE_FILES: Code = Code::new("E061");
    pub const TOO_MANY_FILES: Code = Code::new("E062");
    pub const WORKER_FAILURE: Code = Code::new("E063");
}

/// Warning codes
pub mod warnings {
    use super::Code;

    pub const GENERIC_WARNING: Code = Code::new("W000");
    pub const LARGE_FILE: Code = Code::new("W001");
    pub const NON_PY_EXTENSION: Code = Code::new("W002");
    pub const LOG_CAPACITY_REACHED: Code = Code::new("W003");
}

/// Success codes
pub mod success {
    use super::Code;

    pub const GENERIC_INFO: Code = Code::new("I000");
    pub const SYSTEM_INITIALIZATION_COMPLETED: Code = Code::new("I004");

    // File processing
    pub const FILE_PROCESSING_SUCCESS: Code = Code::new("I006");
    pub const FILE_VALIDATION_PASSED: Code = Code::new("I007");

    // Lexical
    pub const TOKENIZATION_COMPLETE: Code = Code::new("I020");

    // Syntax
    pub const SKELETON_RECOGNIZED: Code = Code::new("I040");
    pub const SYNTAX_VALIDATION_PASSED: Code = Code::new("I041");

    // Batch
    pub const BATCH_COMPLETE: Code = Code::new("I060");
}

/// Debug-only code used by `LogEvent::debug`
pub mod debug {
    use super::Code;

    pub const GENERIC_DEBUG: Code = Code::new("D000");
}

// ============================================================================
// REGISTRY
// ============================================================================

const fn entry(
    code: &'static str,
    category: Category,
    severity: Severity,
    disposition: Disposition,
    description: &'static str,
    recommended_action: &'static str,
) -> ErrorMetadata {
    ErrorMetadata {
        code,
        category,
        severity,
        disposition,
        description,
        recommended_action,
    }
}

use Category::*;
use Disposition::*;
use Severity::*;

#[rustfmt::skip]
static ERROR_TABLE: &[ErrorMetadata] = &[
    entry("ERR001", System, Critical, Halt,
        "Critical internal system error",
        "File a bug report with the failing input"),
    entry("ERR002", System, Critical, Halt,
        "System initialization failure",
        "Check logging and runtime configuration"),
    entry("ERR003", System, High, Halt,
        "Runtime configuration could not be loaded",
        "Fix or unset SKELETON_RUNTIME_CONFIG"),
    entry("E005", FileProcessing, High, Reject,
        "Source file not found",
        "Check the path passed on the command line"),
    entry("E006", FileProcessing, Medium, Recover,
        "Source file does not have a .py extension",
        "Rename the file or unset SKELETON_REQUIRE_PY_EXTENSION"),
    entry("E007", FileProcessing, High, Reject,
        "Source file exceeds the configured size limit",
        "Split the file or raise max_file_size in the build profile"),
    entry("E008", FileProcessing, Medium, Recover,
        "Source file is empty",
        "Provide a file containing at least one class or def"),
    entry("E009", FileProcessing, High, Reject,
        "Permission denied while reading source file",
        "Check file permissions"),
    entry("E010", FileProcessing, High, Reject,
        "Source file is not valid UTF-8",
        "Re-encode the file as UTF-8"),
    entry("E011", FileProcessing, High, Reject,
        "I/O error while reading source file",
        "Retry the operation or check the file system"),
    entry("E012", FileProcessing, High, Reject,
        "Path is not a regular file",
        "Pass a file path or a directory for batch mode"),
    entry("E013", FileProcessing, High, Reject,
        "Source file has too many lines",
        "Split the file or raise max_line_count_for_analysis"),
    entry("E020", Lexical, High, Halt,
        "Source cannot be opened",
        "Check that the path exists and is readable"),
    entry("E021", Lexical, High, Halt,
        "Character does not start any token",
        "Remove or quote the offending character"),
    entry("E022", Lexical, High, Halt,
        "String literal not closed on its line",
        "Add the closing quote before the end of the line"),
    entry("E023", Lexical, High, Halt,
        "Docstring not closed before end of input",
        "Close the docstring with three matching quotes"),
    entry("E024", Lexical, High, Halt,
        "Dedent does not match any enclosing indentation level",
        "Align the line with an enclosing block"),
    entry("E025", Lexical, High, Halt,
        "Numeric literal is out of range",
        "Use a smaller literal"),
    entry("E026", Lexical, High, Halt,
        "Identifier exceeds the configured length limit",
        "Shorten the identifier"),
    entry("E027", Lexical, High, Halt,
        "String literal exceeds the configured size limit",
        "Shorten the string literal"),
    entry("E028", Lexical, High, Halt,
        "Token count exceeds the configured limit",
        "Split the source file"),
    entry("E029", Lexical, High, Halt,
        "Indentation nesting exceeds the configured depth",
        "Flatten deeply nested blocks"),
    entry("E040", Syntax, High, Halt,
        "Token does not match the expected grammar tag",
        "Fix the class or method header at the reported position"),
    entry("E041", Syntax, High, Halt,
        "Input ended while a production was still open",
        "Complete the class or method definition"),
    entry("E042", Syntax, Medium, Halt,
        "Token stream is empty",
        "Provide a source containing at least one class or def"),
    entry("E043", Syntax, High, Halt,
        "Class count exceeds the configured limit",
        "Split the source file"),
    entry("E044", Syntax, High, Halt,
        "Method parameter count exceeds the configured limit",
        "Reduce the number of parameters"),
    entry("E060", Batch, High, Halt,
        "Batch directory not found",
        "Check the directory path"),
    entry("E061", Batch, Medium, Recover,
        "No .py files found in directory",
        "Check the directory contents or enable recursion"),
    entry("E062", Batch, Medium, Recover,
        "Too many files for one batch",
        "Use --max-files or split the directory"),
    entry("E063", Batch, Critical, Halt,
        "A batch worker thread panicked",
        "File a bug report with the failing input"),
];

fn registry() -> &'static HashMap<&'static str, &'static ErrorMetadata> {
    static INDEX: OnceLock<HashMap<&'static str, &'static ErrorMetadata>> = OnceLock::new();
    INDEX.get_or_init(|| ERROR_TABLE.iter().map(|m| (m.code, m)).collect())
}

pub fn get_error_metadata(code: &str) -> Option<&'static ErrorMetadata> {
    registry().get(code).copied()
}

/// Unregistered codes are treated as medium severity
pub fn get_severity(code: &str) -> Severity {
    get_error_metadata(code).map_or(Severity::Medium, |m| m.severity)
}

/// Unregistered codes are treated as recoverable
pub fn is_recoverable(code: &str) -> bool {
    get_error_metadata(code).map_or(true, ErrorMetadata::recoverable)
}

pub fn requires_halt(code: &str) -> bool {
    get_error_metadata(code).is_some_and(ErrorMetadata::requires_halt)
}

pub fn get_description(code: &str) -> &'static str {
    get_error_metadata(code).map_or("Unknown error", |m| m.description)
}

pub fn get_action(code: &str) -> &'static str {
    get_error_metadata(code).map_or(NO_ACTION, |m| m.recommended_action)
}

pub fn get_category(code: &str) -> &'static str {
    get_error_metadata(code).map_or("Unknown", |m| m.category.as_str())
}

/// Fails on the first code without registered metadata
pub fn ensure_registered(codes: &[Code]) -> Result<(), String> {
    match codes.iter().find(|c| get_error_metadata(c.as_str()).is_none()) {
        Some(code) => Err(format!("Error code {} has no registered metadata", code)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexical_codes_registered() {
        let all = [
            lexical::CANNOT_OPEN_SOURCE,
            lexical::UNEXPECTED_CHARACTER,
            lexical::UNTERMINATED_STRING,
            lexical::UNTERMINATED_DOCSTRING,
            lexical::INVALID_INDENTATION,
            lexical::INVALID_NUMBER,
            lexical::IDENTIFIER_TOO_LONG,
            lexical::STRING_TOO_LARGE,
            lexical::TOO_MANY_TOKENS,
            lexical::INDENT_TOO_DEEP,
        ];
        assert!(ensure_registered(&all).is_ok());
        assert_eq!(get_category("E024"), "Lexical");
    }

    #[test]
    fn test_unknown_code_defaults() {
        assert_eq!(get_description("E999"), "Unknown error");
        assert_eq!(get_severity("E999"), Severity::Medium);
        assert!(is_recoverable("E999"));
        assert!(!requires_halt("E999"));
        assert!(ensure_registered(&[Code::new("E999")]).is_err());
    }

    #[test]
    fn test_syntax_errors_halt() {
        assert!(requires_halt(syntax::UNEXPECTED_TOKEN.as_str()));
        assert!(!is_recoverable(syntax::UNEXPECTED_TOKEN.as_str()));
        assert_eq!(get_severity("ERR001"), Severity::Critical);
    }

    #[test]
    fn test_table_has_unique_codes() {
        let mut seen = std::collections::HashSet::new();
        assert!(ERROR_TABLE.iter().all(|m| seen.insert(m.code)));
        assert_eq!(registry().len(), ERROR_TABLE.len());
    }

    #[test]
    fn test_dispositions() {
        let halt = get_error_metadata("E063").unwrap();
        assert!(halt.requires_halt() && !halt.recoverable());
        assert_eq!(get_action("E999"), NO_ACTION);
    }
}
