//! Reading source files under the build profile's size limits
//!
//! Every rejection is logged with its code before it is returned, so callers
//! only need to propagate the error.

use crate::config::compile_time::file_processing::{
    LARGE_FILE_THRESHOLD, MAX_FILE_SIZE, MAX_LINE_COUNT_FOR_ANALYSIS,
};
use crate::config::runtime::FileProcessorPreferences;
use crate::logging::codes::{self, Code, Severity};
use crate::{log_debug, log_error, log_performance, log_warning};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

/// Source extension recognized without a warning
pub const SOURCE_EXTENSION: &str = "py";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FileProcessorError {
    #[error("Cannot open source file: {}: not found", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("Invalid file extension: expected .py, found {extension:?}")]
    InvalidExtension { extension: Option<String> },

    #[error("File too large: {size} bytes (max: {max_size})")]
    FileTooLarge { size: u64, max_size: u64 },

    #[error("File is empty: {}", .path.display())]
    EmptyFile { path: PathBuf },

    #[error("Cannot open source file: {}: permission denied", .path.display())]
    PermissionDenied { path: PathBuf },

    #[error("Invalid UTF-8 encoding in file: {}", .path.display())]
    InvalidEncoding { path: PathBuf },

    #[error("Cannot open source file: {}: {message}", .path.display())]
    IoError { path: PathBuf, message: String },

    #[error("Not a regular file: {}", .path.display())]
    InvalidPath { path: PathBuf },

    #[error("File exceeds maximum line count: {lines} (max: {max_lines})")]
    TooManyLines { lines: usize, max_lines: usize },
}

impl FileProcessorError {
    /// Permission and encoding failures get their own variants
    fn from_io(path: &Path, error: &io::Error) -> Self {
        let path = path.to_path_buf();
        match error.kind() {
            io::ErrorKind::NotFound => Self::FileNotFound { path },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            io::ErrorKind::InvalidData => Self::InvalidEncoding { path },
            _ => Self::IoError {
                path,
                message: error.to_string(),
            },
        }
    }

    pub fn error_code(&self) -> Code {
        use codes::file_processing::*;
        match self {
            Self::FileNotFound { .. } => FILE_NOT_FOUND,
            Self::InvalidExtension { .. } => INVALID_EXTENSION,
            Self::FileTooLarge { .. } => FILE_TOO_LARGE,
            Self::EmptyFile { .. } => EMPTY_FILE,
            Self::PermissionDenied { .. } => PERMISSION_DENIED,
            Self::InvalidEncoding { .. } => INVALID_ENCODING,
            Self::IoError { .. } => IO_ERROR,
            Self::InvalidPath { .. } => INVALID_PATH,
            Self::TooManyLines { .. } => TOO_MANY_LINES,
        }
    }

    pub fn severity(&self) -> Severity {
        codes::get_severity(self.error_code().as_str())
    }

    pub fn is_recoverable(&self) -> bool {
        codes::is_recoverable(self.error_code().as_str())
    }
}

#[derive(Debug, Clone)]
pub struct FileMetadata {
    /// Canonical path
    pub path: PathBuf,
    pub size: u64,
    /// Lowercased
    pub extension: Option<String>,
    pub line_count: usize,
    pub is_source_file: bool,
    pub modified: Option<SystemTime>,
}

impl FileMetadata {
    fn read(path: PathBuf) -> io::Result<Self> {
        let stat = fs::metadata(&path)?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        Ok(Self {
            is_source_file: extension.as_deref() == Some(SOURCE_EXTENSION),
            size: stat.len(),
            modified: stat.modified().ok(),
            line_count: 0,
            extension,
            path,
        })
    }

    pub fn human_readable_size(&self) -> String {
        human_readable(self.size)
    }

    pub fn is_large_file(&self) -> bool {
        self.size > LARGE_FILE_THRESHOLD
    }
}

fn human_readable(size: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if size < 1024 {
        return format!("{} B", size);
    }
    let mut scaled = size as f64 / 1024.0;
    let mut unit = 0;
    while scaled >= 1024.0 && unit + 1 < UNITS.len() {
        scaled /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", scaled, UNITS[unit])
}

/// Source text plus what was learned while reading it
#[derive(Debug, Clone)]
pub struct FileProcessingResult {
    pub source: String,
    pub metadata: FileMetadata,
    pub processing_duration: Duration,
}

impl FileProcessingResult {
    pub fn char_count(&self) -> usize {
        self.source.chars().count()
    }

    pub fn is_effectively_empty(&self) -> bool {
        self.source.trim().is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct FileProcessor {
    pub require_py_extension: bool,
    pub enable_performance_logging: bool,
}

impl Default for FileProcessor {
    fn default() -> Self {
        Self {
            require_py_extension: false,
            enable_performance_logging: true,
        }
    }
}

impl FileProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_preferences(prefs: &FileProcessorPreferences) -> Self {
        Self {
            require_py_extension: prefs.require_py_extension,
            enable_performance_logging: prefs.enable_performance_logging,
        }
    }

    pub fn with_py_extension_required(self, required: bool) -> Self {
        Self {
            require_py_extension: required,
            ..self
        }
    }

    pub fn with_performance_logging(self, enabled: bool) -> Self {
        Self {
            enable_performance_logging: enabled,
            ..self
        }
    }

    /// Check limits and read `file_path` as UTF-8
    pub fn process_file(&self, file_path: &Path) -> Result<FileProcessingResult, FileProcessorError> {
        let started = Instant::now();
        let shown = file_path.display().to_string();
        log_debug!("Reading source file", "file" => &shown);

        let path = resolve(file_path).map_err(|e| reject(e, &shown))?;
        let mut metadata = FileMetadata::read(path)
            .map_err(|e| reject(FileProcessorError::from_io(file_path, &e), &shown))?;
        self.check_metadata(&metadata, &shown)?;

        let source = fs::read_to_string(&metadata.path)
            .map_err(|e| reject(FileProcessorError::from_io(file_path, &e), &shown))?;

        metadata.line_count = source.lines().count();
        if metadata.line_count > MAX_LINE_COUNT_FOR_ANALYSIS {
            let error = FileProcessorError::TooManyLines {
                lines: metadata.line_count,
                max_lines: MAX_LINE_COUNT_FOR_ANALYSIS,
            };
            return Err(reject(error, &shown));
        }

        let result = FileProcessingResult {
            source,
            metadata,
            processing_duration: started.elapsed(),
        };

        if self.enable_performance_logging {
            log_performance!(codes::success::FILE_PROCESSING_SUCCESS, "Source file read",
                duration = result.processing_duration,
                "file" => &shown,
                "size" => result.metadata.human_readable_size(),
                "lines" => result.metadata.line_count
            );
        }
        Ok(result)
    }

    fn check_metadata(&self, metadata: &FileMetadata, shown: &str) -> Result<(), FileProcessorError> {
        if metadata.size > MAX_FILE_SIZE {
            let error = FileProcessorError::FileTooLarge {
                size: metadata.size,
                max_size: MAX_FILE_SIZE,
            };
            return Err(reject(error, shown));
        }
        if metadata.size == 0 {
            let error = FileProcessorError::EmptyFile {
                path: metadata.path.clone(),
            };
            return Err(reject(error, shown));
        }

        if !metadata.is_source_file {
            if self.require_py_extension {
                let error = FileProcessorError::InvalidExtension {
                    extension: metadata.extension.clone(),
                };
                return Err(reject(error, shown));
            }
            log_warning!(code = codes::warnings::NON_PY_EXTENSION,
                "Reading a file without the .py extension", "file" => shown);
        }

        if metadata.is_large_file() {
            log_warning!(code = codes::warnings::LARGE_FILE, "Large source file",
                "file" => shown,
                "size" => metadata.human_readable_size()
            );
        }
        Ok(())
    }
}

fn resolve(file_path: &Path) -> Result<PathBuf, FileProcessorError> {
    if file_path.as_os_str().is_empty() {
        return Err(FileProcessorError::InvalidPath {
            path: file_path.to_path_buf(),
        });
    }
    if !file_path.exists() {
        return Err(FileProcessorError::FileNotFound {
            path: file_path.to_path_buf(),
        });
    }
    if !file_path.is_file() {
        return Err(FileProcessorError::InvalidPath {
            path: file_path.to_path_buf(),
        });
    }
    file_path
        .canonicalize()
        .map_err(|e| FileProcessorError::from_io(file_path, &e))
}

fn reject(error: FileProcessorError, shown: &str) -> FileProcessorError {
    log_error!(error.error_code(), &error.to_string(), "file" => shown);
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    #[test]
    fn test_process_valid_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("shape.py");
        let content = "class Shape:\n    def area(self):\n        pass\n";
        fs::write(&file_path, content).unwrap();

        let result = FileProcessor::new().process_file(&file_path).unwrap();
        assert_eq!(result.metadata.line_count, 3);
        assert!(result.metadata.is_source_file);
        assert_eq!(result.char_count(), content.chars().count());
        assert!(!result.is_effectively_empty());
    }

    #[test]
    fn test_file_not_found() {
        let result = FileProcessor::new().process_file(Path::new("nonexistent.py"));
        assert_matches!(result, Err(FileProcessorError::FileNotFound { .. }));
    }

    #[test]
    fn test_unreadable_sources_share_lexer_wording() {
        let missing = FileProcessor::new()
            .process_file(Path::new("nonexistent.py"))
            .unwrap_err();
        let lexer_side = crate::lexical::Lexer::from_path(Path::new("nonexistent.py"))
            .map(|_| ())
            .unwrap_err();

        assert!(missing.to_string().starts_with("Cannot open source file: nonexistent.py"));
        assert!(lexer_side.to_string().starts_with("Cannot open source file: nonexistent.py"));
    }

    #[test]
    fn test_directory_is_invalid_path() {
        let dir = tempdir().unwrap();
        let result = FileProcessor::new().process_file(dir.path());
        assert_matches!(result, Err(FileProcessorError::InvalidPath { .. }));
    }

    #[test]
    fn test_extension_requirement() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("notes.TXT");
        fs::write(&file_path, "class A:\n    pass\n").unwrap();

        assert!(FileProcessor::new().process_file(&file_path).is_ok());

        let strict = FileProcessor::new()
            .with_py_extension_required(true)
            .process_file(&file_path);
        assert_matches!(
            strict,
            Err(FileProcessorError::InvalidExtension { extension: Some(ref ext) }) if ext == "txt"
        );
    }

    #[test]
    fn test_empty_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("empty.py");
        fs::write(&file_path, "").unwrap();

        let result = FileProcessor::new().process_file(&file_path);
        assert_matches!(result, Err(FileProcessorError::EmptyFile { .. }));
    }

    #[test]
    fn test_invalid_encoding() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("latin1.py");
        fs::write(&file_path, [0x63u8, 0xff, 0xfe, 0x0a]).unwrap();

        let result = FileProcessor::new().process_file(&file_path);
        assert_matches!(result, Err(FileProcessorError::InvalidEncoding { .. }));
    }

    #[test]
    fn test_io_error_classification() {
        let path = Path::new("x.py");
        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let other = io::Error::new(io::ErrorKind::Other, "disk on fire");

        assert_matches!(
            FileProcessorError::from_io(path, &denied),
            FileProcessorError::PermissionDenied { .. }
        );
        assert_matches!(
            FileProcessorError::from_io(path, &other),
            FileProcessorError::IoError { ref message, .. } if message == "disk on fire"
        );
    }

    #[test]
    fn test_error_codes_and_sizes() {
        let error = FileProcessorError::TooManyLines {
            lines: 10,
            max_lines: 5,
        };
        assert_eq!(error.error_code().as_str(), "E013");
        assert_eq!(error.severity(), Severity::High);
        assert!(!error.is_recoverable());
        assert_eq!(human_readable(2048), "2.00 KB");
        assert_eq!(human_readable(12), "12 B");
        assert_eq!(human_readable(3 * 1024 * 1024), "3.00 MB");
    }
}
