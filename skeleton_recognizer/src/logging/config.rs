//! Logging settings
//!
//! Buffer limits are compile-time constants from the build profile. Level and
//! output targets come from [`LoggingPreferences`], installed once at startup;
//! until then the environment defaults apply.

use super::events::LogLevel;
use crate::config::compile_time::logging::*;
use crate::config::runtime::LoggingPreferences;
use std::path::Path;
use std::sync::OnceLock;

static INSTALLED: OnceLock<LoggingPreferences> = OnceLock::new();
static FALLBACK: OnceLock<LoggingPreferences> = OnceLock::new();

/// Install runtime preferences; only the first call wins
pub fn init_runtime_preferences(preferences: LoggingPreferences) -> Result<(), String> {
    check_preferences(&preferences)?;
    INSTALLED
        .set(preferences)
        .map_err(|_| "Runtime preferences already initialized".to_string())
}

/// Active preferences: the installed ones, else environment defaults
pub fn preferences() -> &'static LoggingPreferences {
    INSTALLED
        .get()
        .unwrap_or_else(|| FALLBACK.get_or_init(LoggingPreferences::default))
}

fn check_preferences(preferences: &LoggingPreferences) -> Result<(), String> {
    match preferences.log_file.as_deref() {
        Some(path) if path.is_dir() => {
            Err(format!("Log file path is a directory: {}", path.display()))
        }
        _ => Ok(()),
    }
}

pub fn get_min_log_level() -> LogLevel {
    preferences().min_log_level
}

pub fn use_structured_logging() -> bool {
    preferences().use_structured_logging
}

pub fn use_console_logging() -> bool {
    preferences().enable_console_logging
}

pub fn log_performance_events() -> bool {
    preferences().log_performance_events
}

pub fn include_file_context() -> bool {
    preferences().include_file_context
}

pub fn log_file_path() -> Option<&'static Path> {
    preferences().log_file.as_deref()
}

pub fn get_error_buffer_size() -> usize {
    LOG_BUFFER_SIZE
}

/// Cut a message to the compile-time maximum, on a char boundary
pub fn clamp_message(message: &str) -> String {
    if message.len() <= MAX_LOG_MESSAGE_LENGTH {
        return message.to_string();
    }
    let end = (0..=MAX_LOG_MESSAGE_LENGTH)
        .rev()
        .find(|&i| message.is_char_boundary(i))
        .unwrap_or(0);
    format!("{}...", &message[..end])
}

/// Cross-check compile-time limits and any installed preferences
pub fn validate_config() -> Result<(), String> {
    if !(100..=100_000).contains(&LOG_BUFFER_SIZE) {
        return Err(format!(
            "Log buffer size {} outside 100..=100000",
            LOG_BUFFER_SIZE
        ));
    }
    if MAX_LOG_EVENTS_PER_FILE > LOG_BUFFER_SIZE {
        return Err("Max log events per file exceeds total buffer size".to_string());
    }
    if MAX_ERROR_COLLECTION == 0 {
        return Err("Error collection limit must be positive".to_string());
    }
    match INSTALLED.get() {
        Some(preferences) => check_preferences(preferences),
        None => Ok(()),
    }
}

pub fn get_config_summary() -> String {
    let prefs = preferences();
    let target = match (prefs.enable_console_logging, prefs.log_file.as_deref()) {
        (true, Some(path)) => format!("console + {}", path.display()),
        (true, None) => "console".to_string(),
        (false, Some(path)) => path.display().to_string(),
        (false, None) => "none".to_string(),
    };

    format!(
        "Logging: level={} format={} target={}\n\
         Limits: buffer={} per_file={} message={} collection={}",
        prefs.min_log_level,
        if prefs.use_structured_logging { "json" } else { "text" },
        target,
        LOG_BUFFER_SIZE,
        MAX_LOG_EVENTS_PER_FILE,
        MAX_LOG_MESSAGE_LENGTH,
        MAX_ERROR_COLLECTION,
    )
}
