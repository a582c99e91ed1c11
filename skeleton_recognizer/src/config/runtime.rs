//! Runtime preferences
//!
//! Each field defaults from a `SKELETON_*` environment variable. A TOML file named
//! by `SKELETON_RUNTIME_CONFIG` overrides whatever sections it contains.

use crate::logging::LogLevel;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Unset or unparsable variables yield `None`
fn env_value<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

fn env_flag(name: &str, default: bool) -> bool {
    env_value(name).unwrap_or(default)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProcessorPreferences {
    /// Reject sources without a .py extension instead of warning
    pub require_py_extension: bool,

    pub enable_performance_logging: bool,
}

impl Default for FileProcessorPreferences {
    fn default() -> Self {
        Self {
            require_py_extension: env_flag(env_vars::REQUIRE_PY_EXTENSION, false),
            enable_performance_logging: env_flag(env_vars::ENABLE_PERFORMANCE_LOGGING, true),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LexicalPreferences {
    /// Per-kind token counts in [`LexicalMetrics`](crate::lexical::LexicalMetrics)
    pub collect_detailed_metrics: bool,

    pub include_position_in_errors: bool,
}

impl Default for LexicalPreferences {
    fn default() -> Self {
        Self {
            collect_detailed_metrics: env_flag(env_vars::LEXICAL_DETAILED_METRICS, true),
            include_position_in_errors: env_flag(env_vars::LEXICAL_INCLUDE_POSITIONS, true),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntaxPreferences {
    /// Debug event for every production entered
    pub trace_productions: bool,

    pub show_source_snippet: bool,
}

impl Default for SyntaxPreferences {
    fn default() -> Self {
        Self {
            trace_productions: env_flag(env_vars::SYNTAX_TRACE_PRODUCTIONS, false),
            show_source_snippet: env_flag(env_vars::SYNTAX_SHOW_SNIPPET, true),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingPreferences {
    /// JSON lines instead of text
    pub use_structured_logging: bool,

    pub enable_console_logging: bool,

    pub min_log_level: LogLevel,

    pub log_performance_events: bool,

    /// Print the per-file error report after a batch run
    pub enable_cargo_style_output: bool,

    pub include_file_context: bool,

    /// Also append every event to this file
    pub log_file: Option<PathBuf>,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            use_structured_logging: env_flag(env_vars::LOGGING_USE_STRUCTURED, false),
            enable_console_logging: env_flag(env_vars::LOGGING_ENABLE_CONSOLE, false),
            min_log_level: env_value(env_vars::LOGGING_MIN_LEVEL).unwrap_or(LogLevel::Info),
            log_performance_events: env_flag(env_vars::LOGGING_LOG_PERFORMANCE, true),
            enable_cargo_style_output: env_flag(env_vars::LOGGING_CARGO_STYLE, true),
            include_file_context: env_flag(env_vars::LOGGING_INCLUDE_FILE_CONTEXT, true),
            log_file: env::var(env_vars::LOGGING_FILE)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
        }
    }
}

/// Errors raised while loading a runtime configuration file
#[derive(Debug, thiserror::Error)]
pub enum RuntimeConfigError {
    #[error("Cannot read runtime configuration {path}: {message}")]
    Unreadable { path: String, message: String },

    #[error("Invalid runtime configuration {path}: {message}")]
    Invalid { path: String, message: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub file_processor: FileProcessorPreferences,
    pub lexical: LexicalPreferences,
    pub syntax: SyntaxPreferences,
    pub logging: LoggingPreferences,
}

impl RuntimeConfig {
    /// Parse preferences from TOML text; missing sections keep their env/default values
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load preferences from a TOML file on disk
    pub fn load(path: &Path) -> Result<Self, RuntimeConfigError> {
        let text =
            std::fs::read_to_string(path).map_err(|e| RuntimeConfigError::Unreadable {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::from_toml_str(&text).map_err(|e| RuntimeConfigError::Invalid {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Load from `SKELETON_RUNTIME_CONFIG` when set, otherwise env/defaults
    pub fn from_environment() -> Result<Self, RuntimeConfigError> {
        match env::var(env_vars::RUNTIME_CONFIG_FILE) {
            Ok(path) if !path.trim().is_empty() => Self::load(Path::new(&path)),
            _ => Ok(Self::default()),
        }
    }
}

/// Environment variable names for configuration
pub mod env_vars {
    pub const RUNTIME_CONFIG_FILE: &str = "SKELETON_RUNTIME_CONFIG";

    // File Processor
    pub const REQUIRE_PY_EXTENSION: &str = "SKELETON_REQUIRE_PY_EXTENSION";
    pub const ENABLE_PERFORMANCE_LOGGING: &str = "SKELETON_ENABLE_PERFORMANCE_LOGGING";

    // Lexical
    pub const LEXICAL_DETAILED_METRICS: &str = "SKELETON_LEXICAL_DETAILED_METRICS";
    pub const LEXICAL_INCLUDE_POSITIONS: &str = "SKELETON_LEXICAL_INCLUDE_POSITIONS";

    // Syntax
    pub const SYNTAX_TRACE_PRODUCTIONS: &str = "SKELETON_SYNTAX_TRACE_PRODUCTIONS";
    pub const SYNTAX_SHOW_SNIPPET: &str = "SKELETON_SYNTAX_SHOW_SNIPPET";

    // Logging
    pub const LOGGING_USE_STRUCTURED: &str = "SKELETON_LOGGING_USE_STRUCTURED";
    pub const LOGGING_ENABLE_CONSOLE: &str = "SKELETON_LOGGING_ENABLE_CONSOLE";
    pub const LOGGING_MIN_LEVEL: &str = "SKELETON_LOGGING_MIN_LEVEL";
    pub const LOGGING_LOG_PERFORMANCE: &str = "SKELETON_LOGGING_LOG_PERFORMANCE";
    pub const LOGGING_CARGO_STYLE: &str = "SKELETON_LOGGING_CARGO_STYLE";
    pub const LOGGING_INCLUDE_FILE_CONTEXT: &str = "SKELETON_LOGGING_INCLUDE_FILE_CONTEXT";
    pub const LOGGING_FILE: &str = "SKELETON_LOG_FILE";
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    #[test]
    fn test_partial_toml_keeps_other_sections() {
        let config = RuntimeConfig::from_toml_str(
            r#"
            [logging]
            min_log_level = "debug"
            use_structured_logging = true

            [syntax]
            trace_productions = true
            "#,
        )
        .unwrap();

        assert_eq!(config.logging.min_log_level, LogLevel::Debug);
        assert!(config.logging.use_structured_logging);
        assert!(config.syntax.trace_productions);
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        assert!(RuntimeConfig::from_toml_str("[logging]\nmin_log_level = 7").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[file_processor]\nrequire_py_extension = true").unwrap();

        let config = RuntimeConfig::load(file.path()).unwrap();
        assert!(config.file_processor.require_py_extension);
    }

    #[test]
    fn test_load_missing_file() {
        let result = RuntimeConfig::load(Path::new("/nonexistent/skeleton.toml"));
        assert_matches!(result, Err(RuntimeConfigError::Unreadable { .. }));
    }
}
