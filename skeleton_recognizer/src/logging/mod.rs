//! Logging for the recognizer
//!
//! One global [`LoggingService`] feeds the configured backends. Each worker
//! thread carries the file it is recognizing, so errors and warnings also land
//! in an [`ErrorCollector`] grouped by file for the end-of-batch report. The
//! `log_*!` macros are the front end used throughout the crate.

pub mod codes;
pub mod collector;
pub mod config;
pub mod events;
pub mod macros;
pub mod service;

use crate::config::runtime::LoggingPreferences;
use crate::utils::Span;
use std::cell::RefCell;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

pub use codes::Code;
pub use collector::{ErrorCollector, FileProcessingContext, ProcessingSummary};
pub use events::{LogEvent, LogLevel};
pub use service::{
    ConsoleLogger, FileLogger, Logger, LoggingService, MemoryLogger, MultiLogger, OutputFormat,
};

static GLOBAL_LOGGER: OnceLock<Arc<LoggingService>> = OnceLock::new();
static GLOBAL_ERROR_COLLECTOR: OnceLock<ErrorCollector> = OnceLock::new();

thread_local! {
    static FILE_CONTEXT: RefCell<Option<FileProcessingContext>> = const { RefCell::new(None) };
}

/// Install preferences, then start the global logger from them
pub fn init_global_logging_with_preferences(
    preferences: LoggingPreferences,
) -> Result<(), String> {
    config::init_runtime_preferences(preferences)?;
    init_global_logging()
}

/// Start the global logger from the active preferences
pub fn init_global_logging() -> Result<(), String> {
    config::validate_config().map_err(|e| format!("Configuration validation failed: {}", e))?;
    codes::ensure_registered(&[
        codes::system::INTERNAL_ERROR,
        codes::system::INITIALIZATION_FAILURE,
        codes::system::CONFIGURATION_ERROR,
    ])?;

    let service = Arc::new(LoggingService::from_preferences());
    init_global_logging_with_service(service.clone())?;
    service.log_success(
        codes::success::SYSTEM_INITIALIZATION_COMPLETED,
        "Global logging initialized",
    );
    Ok(())
}

/// Start with a caller-built service, e.g. one backed by a [`MemoryLogger`]
pub fn init_global_logging_with_service(service: Arc<LoggingService>) -> Result<(), String> {
    GLOBAL_LOGGER
        .set(service)
        .map_err(|_| "Global logger already initialized".to_string())?;
    // a second collector would only ever be empty; keep the first
    let _ = GLOBAL_ERROR_COLLECTOR.set(ErrorCollector::new());
    Ok(())
}

pub fn is_initialized() -> bool {
    GLOBAL_LOGGER.get().is_some()
}

pub fn try_get_global_logger() -> Option<&'static LoggingService> {
    GLOBAL_LOGGER.get().map(Arc::as_ref)
}

pub fn try_get_global_error_collector() -> Option<&'static ErrorCollector> {
    GLOBAL_ERROR_COLLECTOR.get()
}

// ----------------------------------------------------------------------------
// Per-thread file context
// ----------------------------------------------------------------------------

/// Clears the thread's file context when dropped, including on unwind
struct ContextGuard;

impl Drop for ContextGuard {
    fn drop(&mut self) {
        clear_file_context();
    }
}

pub fn set_file_context(file_path: PathBuf, file_id: usize) {
    let context = FileProcessingContext::new(file_path, file_id);
    if let Some(collector) = try_get_global_error_collector() {
        collector.record_file_context(&context);
    }
    FILE_CONTEXT.with(|slot| *slot.borrow_mut() = Some(context));
}

pub fn clear_file_context() {
    FILE_CONTEXT.with(|slot| *slot.borrow_mut() = None);
}

pub fn get_current_file_context() -> Option<FileProcessingContext> {
    FILE_CONTEXT.with(|slot| slot.borrow().clone())
}

/// Run `f` with `file_path` as this thread's current file
pub fn with_file_context<F, R>(file_path: PathBuf, file_id: usize, f: F) -> R
where
    F: FnOnce() -> R,
{
    set_file_context(file_path, file_id);
    let _guard = ContextGuard;
    f()
}

// ----------------------------------------------------------------------------
// Macro back end
// ----------------------------------------------------------------------------

fn build(mut event: LogEvent, span: Option<Span>, context: &[(&str, String)]) -> LogEvent {
    if let Some(span) = span {
        event = event.with_span(span);
    }
    for (key, value) in context {
        event = event.with_context(key, value);
    }
    if config::include_file_context() {
        if let Some(file) = get_current_file_context() {
            event = event
                .with_context("file", &file.file_path.display().to_string())
                .with_context("file_id", &file.file_id.to_string());
        }
    }
    event
}

fn dispatch(event: LogEvent) {
    if event.is_error() || event.is_warning() {
        if let (Some(file), Some(collector)) =
            (get_current_file_context(), try_get_global_error_collector())
        {
            collector.record_event(&file.file_path, event.clone());
        }
    }
    if let Some(logger) = try_get_global_logger() {
        logger.log_event(event);
    }
}

#[doc(hidden)]
pub fn emit_error(code: Code, message: &str, span: Option<Span>, context: &[(&str, String)]) {
    let event = LogEvent::error(code, &config::clamp_message(message));
    dispatch(build(event, span, context));
}

#[doc(hidden)]
pub fn emit_success(code: Code, message: &str, context: &[(&str, String)]) {
    let event = LogEvent::success(code, &config::clamp_message(message));
    dispatch(build(event, None, context));
}

#[doc(hidden)]
pub fn emit_info(message: &str, context: &[(&str, String)]) {
    let event = LogEvent::info(&config::clamp_message(message));
    dispatch(build(event, None, context));
}

#[doc(hidden)]
pub fn emit_warning(code: Option<Code>, message: &str, context: &[(&str, String)]) {
    let message = config::clamp_message(message);
    let event = match code {
        Some(code) => LogEvent::warning_with_code(code, &message),
        None => LogEvent::warning(&message),
    };
    dispatch(build(event, None, context));
}

#[doc(hidden)]
pub fn emit_debug(message: &str, context: &[(&str, String)]) {
    let event = LogEvent::debug(&config::clamp_message(message));
    dispatch(build(event, None, context));
}

/// True when a debug event would reach a backend
pub fn debug_enabled() -> bool {
    try_get_global_logger().is_some_and(|logger| logger.should_log(LogLevel::Debug))
}

// ----------------------------------------------------------------------------
// Reporting
// ----------------------------------------------------------------------------

pub fn get_processing_summary() -> ProcessingSummary {
    try_get_global_error_collector()
        .map(ErrorCollector::get_summary)
        .unwrap_or_default()
}

/// Collected errors and warnings grouped by file, if logging was started
pub fn format_collected_report() -> Option<String> {
    try_get_global_error_collector().map(ErrorCollector::format_report)
}

pub fn clear_error_collection() {
    if let Some(collector) = try_get_global_error_collector() {
        collector.clear();
    }
}

pub fn get_system_diagnostics() -> String {
    let mut out = format!("Logging initialized: {}\n", is_initialized());
    if let Some(collector) = try_get_global_error_collector() {
        let summary = collector.get_summary();
        out.push_str(&format!(
            "Files: {} ({} failed)  Errors: {}  Warnings: {}  Dropped: {}\n",
            summary.total_files,
            summary.failed_files,
            summary.total_errors,
            summary.total_warnings,
            summary.dropped_events,
        ));
    }
    out.push_str(&config::get_config_summary());
    out
}

/// Log through the global logger, or straight to stderr before it exists
pub fn safe_log_error(code: Code, message: &str) {
    match try_get_global_logger() {
        Some(logger) => logger.log_error(code, message),
        None => eprintln!("[ERROR] {} - {}", code, message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_context_management() {
        let file_path = PathBuf::from("shapes.py");

        clear_file_context();
        assert!(get_current_file_context().is_none());

        set_file_context(file_path.clone(), 1);
        assert_eq!(
            get_current_file_context().map(|c| c.file_path),
            Some(file_path)
        );

        clear_file_context();
        assert!(get_current_file_context().is_none());
    }

    #[test]
    fn test_with_file_context_restores_none() {
        let result = with_file_context(PathBuf::from("zoo.py"), 2, || {
            assert_eq!(get_current_file_context().map(|c| c.file_id), Some(2));
            42
        });

        assert_eq!(result, 42);
        assert!(get_current_file_context().is_none());
    }

    #[test]
    fn test_context_cleared_after_panic() {
        let outcome = std::panic::catch_unwind(|| {
            with_file_context(PathBuf::from("boom.py"), 3, || panic!("worker failed"))
        });

        assert!(outcome.is_err());
        assert!(get_current_file_context().is_none());
    }

    #[test]
    fn test_macros_do_not_panic_without_logger() {
        crate::log_error!(codes::system::INTERNAL_ERROR, "Test error", "key" => 1);
        crate::log_warning!("Test warning");
        crate::log_info!("Test info", "count" => 3);
        crate::log_debug!("Test debug");
        safe_log_error(codes::system::INTERNAL_ERROR, "Fallback error");
    }

    #[test]
    fn test_build_attaches_pairs_and_span() {
        let span = Span::dummy();
        let event = build(
            LogEvent::info("tokens"),
            Some(span),
            &[("count", "12".to_string())],
        );

        assert_eq!(event.span, Some(span));
        assert_eq!(event.context.get("count").map(String::as_str), Some("12"));
    }

    #[test]
    fn test_diagnostics() {
        let diagnostics = get_system_diagnostics();
        assert!(diagnostics.starts_with("Logging initialized:"));
        assert!(diagnostics.contains("Logging: level="));
    }
}
