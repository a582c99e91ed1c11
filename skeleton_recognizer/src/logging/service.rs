//! Logger backends and the level-filtering service in front of them

use super::codes::Code;
use super::config;
use super::events::{LogEvent, LogLevel};
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// A sink for events that already passed level filtering
pub trait Logger: Send + Sync {
    fn log(&self, event: &LogEvent);
}

/// How a backend renders an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    fn render(self, event: &LogEvent) -> String {
        match self {
            OutputFormat::Text => event.format(),
            OutputFormat::Json => event.format_json().unwrap_or_else(|_| event.format()),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Drops events below `min_level`, forwards the rest
pub struct LoggingService {
    logger: Arc<dyn Logger>,
    min_level: LogLevel,
}

impl LoggingService {
    pub fn new(logger: Arc<dyn Logger>, min_level: LogLevel) -> Self {
        Self { logger, min_level }
    }

    /// Targets and level from the active logging preferences
    pub fn from_preferences() -> Self {
        let min_level = config::get_min_log_level();
        let format = if config::use_structured_logging() {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        };

        let mut targets = MultiLogger::new();
        if config::use_console_logging() {
            targets.add(Arc::new(ConsoleLogger::new(format)));
        }
        if let Some(path) = config::log_file_path() {
            match FileLogger::create(path, format) {
                Ok(file) => targets.add(Arc::new(file)),
                Err(error) => {
                    eprintln!(
                        "[WARN] Cannot open log file {}: {}; using console",
                        path.display(),
                        error
                    );
                    targets.add(Arc::new(ConsoleLogger::new(format)));
                }
            }
        }

        Self::new(Arc::new(targets), min_level)
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    pub fn should_log(&self, level: LogLevel) -> bool {
        level <= self.min_level
    }

    pub fn log_event(&self, event: LogEvent) {
        if self.should_log(event.level) {
            self.logger.log(&event);
        }
    }

    pub fn log_error(&self, code: Code, message: &str) {
        self.log_event(LogEvent::error(code, message));
    }

    pub fn log_success(&self, code: Code, message: &str) {
        self.log_event(LogEvent::success(code, message));
    }
}

/// Errors to stderr, everything else to stdout
pub struct ConsoleLogger {
    format: OutputFormat,
}

impl ConsoleLogger {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

impl Logger for ConsoleLogger {
    fn log(&self, event: &LogEvent) {
        let line = self.format.render(event);
        if event.is_error() {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

/// Ring buffer of the most recent events, sized by the compile-time buffer limit
pub struct MemoryLogger {
    events: Mutex<VecDeque<LogEvent>>,
    capacity: usize,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::with_capacity(config::get_error_buffer_size())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn events(&self) -> Vec<LogEvent> {
        lock(&self.events).iter().cloned().collect()
    }

    pub fn event_count(&self) -> usize {
        lock(&self.events).len()
    }

    pub fn clear(&self) {
        lock(&self.events).clear();
    }

    pub fn has_code(&self, code: Code) -> bool {
        lock(&self.events).iter().any(|e| e.code == code)
    }

    pub fn errors(&self) -> Vec<LogEvent> {
        lock(&self.events)
            .iter()
            .filter(|e| e.is_error())
            .cloned()
            .collect()
    }
}

impl Default for MemoryLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger for MemoryLogger {
    fn log(&self, event: &LogEvent) {
        let mut events = lock(&self.events);
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event.clone());
    }
}

/// Appends one rendered event per line to a file kept open for the run
pub struct FileLogger {
    file: Mutex<File>,
    format: OutputFormat,
}

impl FileLogger {
    pub fn create(path: &Path, format: OutputFormat) -> std::io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
            format,
        })
    }
}

impl Logger for FileLogger {
    fn log(&self, event: &LogEvent) {
        let line = self.format.render(event);
        // write failures are dropped; reporting them would log again
        let _ = writeln!(lock(&self.file), "{}", line);
    }
}

/// Fan-out to several backends; with none it discards everything
#[derive(Default)]
pub struct MultiLogger {
    targets: Vec<Arc<dyn Logger>>,
}

impl MultiLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, target: Arc<dyn Logger>) {
        self.targets.push(target);
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }
}

impl Logger for MultiLogger {
    fn log(&self, event: &LogEvent) {
        for target in &self.targets {
            target.log(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::codes;

    #[test]
    fn test_memory_logger_keeps_latest() {
        let logger = MemoryLogger::with_capacity(2);

        logger.log(&LogEvent::info("first"));
        logger.log(&LogEvent::error(codes::lexical::UNEXPECTED_CHARACTER, "second"));
        logger.log(&LogEvent::info("third"));

        let messages: Vec<String> = logger.events().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["second", "third"]);
        assert_eq!(logger.errors().len(), 1);
        assert!(logger.has_code(codes::lexical::UNEXPECTED_CHARACTER));

        logger.clear();
        assert_eq!(logger.event_count(), 0);
    }

    #[test]
    fn test_multi_logger_fans_out() {
        let first = Arc::new(MemoryLogger::new());
        let second = Arc::new(MemoryLogger::new());
        let mut multi = MultiLogger::new();
        multi.add(first.clone());
        multi.add(second.clone());

        multi.log(&LogEvent::info("hello"));

        assert_eq!(multi.target_count(), 2);
        assert_eq!(first.event_count(), 1);
        assert_eq!(second.event_count(), 1);
    }

    #[test]
    fn test_service_filters_by_level() {
        let memory = Arc::new(MemoryLogger::new());
        let service = LoggingService::new(memory.clone(), LogLevel::Warning);

        service.log_event(LogEvent::debug("hidden"));
        service.log_success(codes::success::SKELETON_RECOGNIZED, "hidden too");
        service.log_event(LogEvent::warning("shown"));
        service.log_error(codes::system::INTERNAL_ERROR, "shown");

        assert_eq!(memory.event_count(), 2);
        assert!(memory.has_code(codes::system::INTERNAL_ERROR));
        assert!(!service.should_log(LogLevel::Info));
    }

    #[test]
    fn test_file_logger_appends_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("run.log");
        let logger = FileLogger::create(&path, OutputFormat::Json).unwrap();

        logger.log(&LogEvent::error(codes::syntax::UNEXPECTED_TOKEN, "bad token"));
        logger.log(&LogEvent::info("done"));

        let written = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"code\":\"E040\""));
    }
}
