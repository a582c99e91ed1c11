//! Source file access
//!
//! Resolves a path, enforces the compile-time size and line limits, and reads
//! the file as UTF-8 before any token is produced.

mod processor;

use crate::config::compile_time::file_processing::{
    LARGE_FILE_THRESHOLD, MAX_FILE_SIZE, MAX_LINE_COUNT_FOR_ANALYSIS,
};
use crate::config::runtime::FileProcessorPreferences;
use crate::log_debug;
use crate::logging::codes;
use std::path::Path;

pub use processor::{
    FileMetadata, FileProcessingResult, FileProcessor, FileProcessorError, SOURCE_EXTENSION,
};

/// Process a file with default settings
pub fn process_file(file_path: &Path) -> Result<FileProcessingResult, FileProcessorError> {
    FileProcessor::new().process_file(file_path)
}

pub fn create_processor_from_preferences(prefs: &FileProcessorPreferences) -> FileProcessor {
    FileProcessor::from_preferences(prefs)
}

/// Whether a path names a recognizable source file by extension
pub fn is_source_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SOURCE_EXTENSION))
}

pub fn get_max_file_size() -> u64 {
    MAX_FILE_SIZE
}

pub fn get_large_file_threshold() -> u64 {
    LARGE_FILE_THRESHOLD
}

/// Validate file-processing codes and log the active limits
pub fn init_file_processor_logging() -> Result<(), String> {
    codes::ensure_registered(&[
        codes::file_processing::FILE_NOT_FOUND,
        codes::file_processing::INVALID_EXTENSION,
        codes::file_processing::FILE_TOO_LARGE,
        codes::file_processing::EMPTY_FILE,
        codes::file_processing::PERMISSION_DENIED,
        codes::file_processing::INVALID_ENCODING,
        codes::file_processing::IO_ERROR,
        codes::file_processing::INVALID_PATH,
        codes::file_processing::TOO_MANY_LINES,
    ])?;

    log_debug!("File processor limits loaded",
        "max_file_size" => MAX_FILE_SIZE,
        "large_file_threshold" => LARGE_FILE_THRESHOLD,
        "max_line_count" => MAX_LINE_COUNT_FOR_ANALYSIS
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_module_api() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("point.py");
        fs::write(&file_path, "class Point:\n    def x(self):\n        pass\n").unwrap();
        assert!(process_file(&file_path).is_ok());
    }

    #[test]
    fn test_from_preferences() {
        let prefs = FileProcessorPreferences {
            require_py_extension: true,
            enable_performance_logging: false,
        };
        let processor = create_processor_from_preferences(&prefs);
        assert!(processor.require_py_extension);
        assert!(!processor.enable_performance_logging);
    }

    #[test]
    fn test_source_paths() {
        assert!(is_source_path(Path::new("a/b/model.py")));
        assert!(is_source_path(Path::new("MODEL.PY")));
        assert!(!is_source_path(Path::new("model.pyc")));
        assert!(!is_source_path(Path::new("Makefile")));
    }

    #[test]
    fn test_limits() {
        assert!(get_large_file_threshold() <= get_max_file_size());
        assert!(init_file_processor_logging().is_ok());
    }
}
