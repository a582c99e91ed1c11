//! Per-file event collection
//!
//! Batch runs recognize files on several threads. Errors and warnings are
//! grouped under the file that produced them so the closing report reads file
//! by file, in path order.

use super::codes;
use super::events::LogEvent;
use crate::config::compile_time::logging::*;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// The file a thread is currently working on
#[derive(Debug, Clone)]
pub struct FileProcessingContext {
    pub file_path: PathBuf,
    pub file_id: usize,
    pub start_time: Instant,
}

impl FileProcessingContext {
    pub fn new(file_path: PathBuf, file_id: usize) -> Self {
        Self {
            file_path,
            file_id,
            start_time: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProcessingSummary {
    pub total_files: usize,
    pub clean_files: usize,
    pub failed_files: usize,
    pub files_with_warnings: usize,
    pub total_errors: usize,
    pub total_warnings: usize,
    pub dropped_events: usize,
    pub elapsed: Duration,
}

impl ProcessingSummary {
    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }
}

#[derive(Debug, Default)]
struct FileRecord {
    events: Vec<LogEvent>,
    dropped: usize,
}

impl FileRecord {
    fn errors(&self) -> usize {
        self.events.iter().filter(|e| e.is_error()).count()
    }

    fn warnings(&self) -> usize {
        self.events.iter().filter(|e| e.is_warning()).count()
    }
}

/// Thread-safe store of events keyed by file
pub struct ErrorCollector {
    files: Mutex<BTreeMap<PathBuf, FileRecord>>,
    started: Instant,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self {
            files: Mutex::new(BTreeMap::new()),
            started: Instant::now(),
        }
    }

    fn files(&self) -> MutexGuard<'_, BTreeMap<PathBuf, FileRecord>> {
        self.files.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a file so it counts in the summary even if it logs nothing
    pub fn record_file_context(&self, context: &FileProcessingContext) {
        self.files().entry(context.file_path.clone()).or_default();
    }

    /// Store an event; past the per-file cap events are counted, not kept
    pub fn record_event(&self, file_path: &Path, event: LogEvent) {
        let mut files = self.files();
        let record = files.entry(file_path.to_path_buf()).or_default();
        if record.events.len() < MAX_LOG_EVENTS_PER_FILE {
            record.events.push(event);
        } else {
            record.dropped += 1;
        }
    }

    pub fn get_file_events(&self, file_path: &Path) -> Vec<LogEvent> {
        self.files()
            .get(file_path)
            .map(|record| record.events.clone())
            .unwrap_or_default()
    }

    pub fn get_summary(&self) -> ProcessingSummary {
        let files = self.files();
        let mut summary = ProcessingSummary {
            total_files: files.len(),
            elapsed: self.started.elapsed(),
            ..ProcessingSummary::default()
        };

        for record in files.values() {
            let (errors, warnings) = (record.errors(), record.warnings());
            summary.total_errors += errors;
            summary.total_warnings += warnings;
            summary.dropped_events += record.dropped;
            if errors > 0 {
                summary.failed_files += 1;
            } else {
                summary.clean_files += 1;
            }
            if warnings > 0 {
                summary.files_with_warnings += 1;
            }
        }

        summary
    }

    pub fn clear(&self) {
        self.files().clear();
    }

    pub fn total_event_count(&self) -> usize {
        self.files().values().map(|r| r.events.len()).sum()
    }

    /// Cargo-style report: errors and warnings grouped by file
    pub fn format_report(&self) -> String {
        let files = self.files();
        let mut out = String::new();
        let (mut errors, mut warnings) = (0, 0);

        for (path, record) in files.iter() {
            let issues: Vec<&LogEvent> = record
                .events
                .iter()
                .filter(|e| e.is_error() || e.is_warning())
                .collect();
            if issues.is_empty() && record.dropped == 0 {
                continue;
            }

            let _ = writeln!(out, "Checking {}...", path.display());
            for event in issues {
                write_event(&mut out, path, event);
            }
            if record.dropped > 0 {
                let _ = writeln!(
                    out,
                    "warning[{}]: {} more event(s) not kept (limit {} per file)",
                    codes::warnings::LOG_CAPACITY_REACHED,
                    record.dropped,
                    MAX_LOG_EVENTS_PER_FILE
                );
            }
            out.push('\n');

            errors += record.errors();
            warnings += record.warnings();
        }

        if errors > 0 {
            let _ = writeln!(out, "Total errors: {}", errors);
        }
        if warnings > 0 {
            let _ = writeln!(out, "Total warnings: {}", warnings);
        }
        out
    }
}

impl Default for ErrorCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn write_event(out: &mut String, path: &Path, event: &LogEvent) {
    let label = if event.is_error() { "error" } else { "warning" };
    let _ = writeln!(out, "{}[{}]: {}", label, event.code, event.message);

    if let Some(span) = &event.span {
        let _ = writeln!(out, "  --> {}:{}", path.display(), span.start);
    }

    for (key, value) in event.context.iter().filter(|(k, _)| !k.starts_with("file")) {
        let _ = writeln!(out, "  = {}: {}", key, value);
    }

    if event.is_error() {
        let action = event.recommended_action();
        if action != codes::NO_ACTION {
            let _ = writeln!(out, "  = help: {}", action);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{Position, Span};

    #[test]
    fn test_events_grouped_by_file() {
        let collector = ErrorCollector::new();
        let shapes = PathBuf::from("shapes.py");

        collector.record_event(
            &shapes,
            LogEvent::error(codes::file_processing::FILE_NOT_FOUND, "missing"),
        );
        collector.record_event(Path::new("other.py"), LogEvent::warning("odd"));

        assert_eq!(collector.get_file_events(&shapes).len(), 1);
        assert_eq!(collector.total_event_count(), 2);
    }

    #[test]
    fn test_summary_counts_context_only_files_as_clean() {
        let collector = ErrorCollector::new();

        collector.record_file_context(&FileProcessingContext::new(PathBuf::from("ok.py"), 0));
        collector.record_event(
            Path::new("bad.py"),
            LogEvent::error(codes::lexical::INVALID_INDENTATION, "Error"),
        );
        collector.record_event(Path::new("warn.py"), LogEvent::warning("Warning"));

        let summary = collector.get_summary();
        assert_eq!(summary.total_files, 3);
        assert_eq!(summary.failed_files, 1);
        assert_eq!(summary.clean_files, 2);
        assert_eq!(summary.files_with_warnings, 1);
        assert!(summary.has_errors());
    }

    #[test]
    fn test_per_file_cap_counts_dropped_events() {
        let collector = ErrorCollector::new();
        let noisy = PathBuf::from("noisy.py");

        for _ in 0..(MAX_LOG_EVENTS_PER_FILE + 5) {
            collector.record_event(&noisy, LogEvent::warning("again"));
        }

        assert_eq!(collector.get_file_events(&noisy).len(), MAX_LOG_EVENTS_PER_FILE);
        assert_eq!(collector.get_summary().dropped_events, 5);
        assert!(collector.format_report().contains("5 more event(s) not kept"));
    }

    #[test]
    fn test_cargo_style_report() {
        let collector = ErrorCollector::new();
        let shapes = PathBuf::from("shapes.py");

        collector.record_event(
            &shapes,
            LogEvent::error(codes::syntax::UNEXPECTED_TOKEN, "Expected COLON")
                .with_span(Span::single(Position::new(0, 4, 3)))
                .with_context("file", "shapes.py")
                .with_context("position", "12"),
        );

        let report = collector.format_report();
        assert!(report.contains("Checking shapes.py..."));
        assert!(report.contains("error[E040]: Expected COLON"));
        assert!(report.contains("  --> shapes.py:4:3"));
        assert!(report.contains("  = position: 12"));
        assert!(!report.contains("= file:"));
        assert!(report.contains("Total errors: 1"));
    }
}
