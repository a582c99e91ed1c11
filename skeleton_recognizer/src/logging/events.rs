//! Log events
//!
//! An event is a level, a registered [`Code`], a message and optional location
//! and context. Text rendering is for consoles; JSON rendering derives from the
//! same struct through serde.

use super::codes::{self, Code};
use crate::utils::Span;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Ordered from most to least severe; a logger admits every level `<=` its minimum
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    #[serde(rename = "ERROR", alias = "error")]
    Error = 0,
    #[serde(rename = "WARN", alias = "warn", alias = "warning")]
    Warning = 1,
    #[serde(rename = "INFO", alias = "info")]
    Info = 2,
    #[serde(rename = "DEBUG", alias = "debug")]
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts names in any case and the numeric levels 0-3
impl FromStr for LogLevel {
    type Err = String;

    fn from_str(level: &str) -> Result<Self, Self::Err> {
        match level.trim().to_ascii_lowercase().as_str() {
            "error" | "0" => Ok(LogLevel::Error),
            "warning" | "warn" | "1" => Ok(LogLevel::Warning),
            "info" | "2" => Ok(LogLevel::Info),
            "debug" | "3" => Ok(LogLevel::Debug),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

/// Registry metadata attached to error events in JSON output
#[derive(Debug, Serialize)]
struct ErrorDetails {
    recoverable: bool,
    requires_halt: bool,
    description: &'static str,
    recommended_action: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEvent {
    #[serde(serialize_with = "millis")]
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    #[serde(serialize_with = "code_str")]
    pub code: Code,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, String>,
}

fn millis<S: Serializer>(timestamp: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&timestamp.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn code_str<S: Serializer>(code: &Code, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(code.as_str())
}

impl LogEvent {
    fn new(level: LogLevel, code: Code, message: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            code,
            message: message.to_string(),
            span: None,
            context: BTreeMap::new(),
        }
    }

    pub fn error(code: Code, message: &str) -> Self {
        Self::new(LogLevel::Error, code, message)
    }

    pub fn warning(message: &str) -> Self {
        Self::new(LogLevel::Warning, codes::warnings::GENERIC_WARNING, message)
    }

    pub fn warning_with_code(code: Code, message: &str) -> Self {
        Self::new(LogLevel::Warning, code, message)
    }

    pub fn info(message: &str) -> Self {
        Self::new(LogLevel::Info, codes::success::GENERIC_INFO, message)
    }

    /// Info-level event carrying a success code
    pub fn success(code: Code, message: &str) -> Self {
        Self::new(LogLevel::Info, code, message)
    }

    pub fn debug(message: &str) -> Self {
        Self::new(LogLevel::Debug, codes::debug::GENERIC_DEBUG, message)
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_context(mut self, key: &str, value: &str) -> Self {
        self.context.insert(key.to_string(), value.to_string());
        self
    }

    pub fn is_error(&self) -> bool {
        self.level == LogLevel::Error
    }

    pub fn is_warning(&self) -> bool {
        self.level == LogLevel::Warning
    }

    pub fn is_info(&self) -> bool {
        self.level == LogLevel::Info
    }

    pub fn requires_halt(&self) -> bool {
        codes::requires_halt(self.code.as_str())
    }

    pub fn is_recoverable(&self) -> bool {
        codes::is_recoverable(self.code.as_str())
    }

    pub fn severity(&self) -> &'static str {
        codes::get_severity(self.code.as_str()).as_str()
    }

    pub fn category(&self) -> &'static str {
        codes::get_category(self.code.as_str())
    }

    pub fn description(&self) -> &'static str {
        codes::get_description(self.code.as_str())
    }

    pub fn recommended_action(&self) -> &'static str {
        codes::get_action(self.code.as_str())
    }

    /// One console line: `[LEVEL] CODE - message at line:column`
    pub fn format(&self) -> String {
        self.to_string()
    }

    /// One JSON object per event; errors also carry their registry metadata
    pub fn format_json(&self) -> Result<String, serde_json::Error> {
        let mut value = serde_json::to_value(self)?;
        value["category"] = self.category().into();
        value["severity"] = self.severity().into();
        if self.is_error() {
            value["error_metadata"] = serde_json::to_value(ErrorDetails {
                recoverable: self.is_recoverable(),
                requires_halt: self.requires_halt(),
                description: self.description(),
                recommended_action: self.recommended_action(),
            })?;
        }
        serde_json::to_string(&value)
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} - {}", self.level, self.code, self.message)?;
        if let Some(span) = &self.span {
            write!(f, " at {}", span.start)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::Position;

    #[test]
    fn test_error_event_classification() {
        let event = LogEvent::error(codes::file_processing::FILE_NOT_FOUND, "File not found");

        assert!(event.is_error());
        assert!(!event.is_warning());
        assert_eq!(event.code.as_str(), "E005");
        assert_eq!(event.category(), "FileProcessing");
    }

    #[test]
    fn test_level_parsing() {
        assert_eq!("ERROR".parse(), Ok(LogLevel::Error));
        assert_eq!("warn".parse(), Ok(LogLevel::Warning));
        assert_eq!(" Warning ".parse(), Ok(LogLevel::Warning));
        assert_eq!("3".parse(), Ok(LogLevel::Debug));
        assert!("verbose".parse::<LogLevel>().is_err());
        assert!(LogLevel::Error < LogLevel::Debug);
    }

    #[test]
    fn test_generic_codes() {
        assert_eq!(LogEvent::warning("w").code.as_str(), "W000");
        assert_eq!(LogEvent::info("i").code.as_str(), "I000");
        assert_eq!(LogEvent::debug("d").code.as_str(), "D000");
    }

    #[test]
    fn test_text_format_includes_location() {
        let event = LogEvent::error(codes::lexical::INVALID_INDENTATION, "Invalid indentation")
            .with_span(Span::single(Position::new(10, 3, 5)));

        assert_eq!(event.format(), "[ERROR] E024 - Invalid indentation at 3:5");
    }

    #[test]
    fn test_json_format() {
        let event = LogEvent::error(codes::syntax::UNEXPECTED_TOKEN, "Expected COLON")
            .with_span(Span::single(Position::new(7, 1, 8)))
            .with_context("file", "shapes.py");

        let json = event.format_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["level"], "ERROR");
        assert_eq!(value["code"], "E040");
        assert_eq!(value["category"], "Syntax");
        assert_eq!(value["span"]["start"]["column"], 8);
        assert_eq!(value["context"]["file"], "shapes.py");
        assert!(value["error_metadata"]["requires_halt"].is_boolean());
    }

    #[test]
    fn test_json_omits_empty_fields() {
        let value: serde_json::Value =
            serde_json::from_str(&LogEvent::warning("heads up").format_json().unwrap()).unwrap();

        assert_eq!(value["level"], "WARN");
        assert!(value.get("span").is_none());
        assert!(value.get("context").is_none());
        assert!(value.get("error_metadata").is_none());
    }
}
