//! Directory mode: recognize every source file under a directory
//!
//! Each file gets its own run (file processor, lexer, token stream, recognizer), so
//! files can be spread across worker threads without sharing any state. The
//! outcome is a pass/fail report with the pass rate.

use crate::config::compile_time::batch_processing::{MAX_FILES_PER_BATCH, MAX_WORKER_THREADS};
use crate::config::runtime::RuntimeConfig;
use crate::file_processor::is_source_path;
use crate::logging::codes::{self, Code, Severity};
use crate::logging;
use crate::pipeline::{self, PipelineError, PipelineResult};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

// ============================================================================
// BATCH PROCESSING TYPES
// ============================================================================

/// Batch processing configuration
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub max_threads: usize,
    pub recursive: bool,
    pub max_files: Option<usize>,
    pub progress_reporting: bool,
    pub fail_fast: bool,
    pub runtime: RuntimeConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_threads: thread::available_parallelism()
                .map(|n| n.get().min(MAX_WORKER_THREADS))
                .unwrap_or(4),
            recursive: true,
            max_files: None,
            progress_reporting: true,
            fail_fast: false,
            runtime: RuntimeConfig::default(),
        }
    }
}

impl BatchConfig {
    /// Worker count clamped to the compile-time ceiling
    pub fn effective_threads(&self) -> usize {
        self.max_threads.clamp(1, MAX_WORKER_THREADS)
    }
}

/// Accepted and rejected files of one batch run, in path order once finished
#[derive(Debug, Default)]
pub struct BatchResults {
    pub accepted: Vec<(PathBuf, PipelineResult)>,
    pub rejected: Vec<(PathBuf, PipelineError)>,
    pub discovered: usize,
    pub processed: usize,
    pub elapsed: Duration,
}

impl BatchResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accepted_count(&self) -> usize {
        self.accepted.len()
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }

    /// Fraction of processed files that were accepted, 0.0 when nothing ran
    pub fn pass_rate(&self) -> f64 {
        match self.processed {
            0 => 0.0,
            n => self.accepted_count() as f64 / n as f64,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.rejected.is_empty() && self.processed == self.discovered
    }

    /// Returns whether the file was accepted
    pub fn record(&mut self, file_path: PathBuf, outcome: Result<PipelineResult, PipelineError>) -> bool {
        self.processed += 1;
        match outcome {
            Ok(result) => {
                self.accepted.push((file_path, result));
                true
            }
            Err(error) => {
                self.rejected.push((file_path, error));
                false
            }
        }
    }

    /// Fold a worker's partial results into this one
    pub fn absorb(&mut self, partial: BatchResults) {
        self.accepted.extend(partial.accepted);
        self.rejected.extend(partial.rejected);
        self.processed += partial.processed;
    }

    /// Order both lists by path so reports do not depend on thread scheduling
    pub fn sort(&mut self) {
        self.accepted.sort_by(|a, b| a.0.cmp(&b.0));
        self.rejected.sort_by(|a, b| a.0.cmp(&b.0));
    }

    pub fn summary(&self) -> String {
        format!(
            "{} of {} files passed ({:.1}%), {} failed, {:.2}s total",
            self.accepted_count(),
            self.processed,
            self.pass_rate() * 100.0,
            self.rejected_count(),
            self.elapsed.as_secs_f64()
        )
    }

    /// Pass/fail listing followed by the summary line
    pub fn report(&self, include_passed: bool) -> String {
        let mut out = String::new();

        if include_passed && !self.accepted.is_empty() {
            out.push_str("Passed:\n");
            for (path, result) in &self.accepted {
                let _ = writeln!(out, "  {} ({})", path.display(), result.summary);
            }
        }

        if !self.rejected.is_empty() {
            out.push_str("Failed:\n");
            for (path, error) in &self.rejected {
                let _ = writeln!(out, "  {}: {}", path.display(), error);
            }
        }

        if self.processed < self.discovered {
            let _ = writeln!(
                out,
                "Stopped early: {} of {} discovered files not processed",
                self.discovered - self.processed,
                self.discovered
            );
        }

        out.push_str(&self.summary());
        out
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Not a directory: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("No .py files under {}", .0.display())]
    NoFilesFound(PathBuf),

    #[error("{count} source files exceed the batch limit of {max}")]
    TooManyFiles { count: usize, max: usize },

    #[error("Cannot read directory {}: {source}", .path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Worker failure: {0}")]
    WorkerFailure(String),
}

impl BatchError {
    pub fn error_code(&self) -> Code {
        match self {
            Self::DirectoryNotFound(_) => codes::batch::DIRECTORY_NOT_FOUND,
            Self::NoFilesFound(_) => codes::batch::NO_SOURCE_FILES,
            Self::TooManyFiles { .. } => codes::batch::TOO_MANY_FILES,
            Self::IoError { .. } => codes::file_processing::IO_ERROR,
            Self::WorkerFailure(_) => codes::batch::WORKER_FAILURE,
        }
    }

    pub fn severity(&self) -> Severity {
        codes::get_severity(self.error_code().as_str())
    }

    pub fn is_recoverable(&self) -> bool {
        codes::is_recoverable(self.error_code().as_str())
    }
}

// ============================================================================
// FILE DISCOVERY
// ============================================================================

fn logged(error: BatchError) -> BatchError {
    crate::log_error!(error.error_code(), &error.to_string());
    error
}

/// Every `.py` file under `dir_path` in path order, capped by `max_files`
pub fn discover_source_files(
    dir_path: &Path,
    config: &BatchConfig,
) -> Result<Vec<PathBuf>, BatchError> {
    if !dir_path.is_dir() {
        return Err(logged(BatchError::DirectoryNotFound(dir_path.to_path_buf())));
    }

    let mut files = Vec::new();
    collect_sources(dir_path, config.recursive, &mut files).map_err(logged)?;
    if files.is_empty() {
        return Err(logged(BatchError::NoFilesFound(dir_path.to_path_buf())));
    }
    files.sort();

    if let Some(cap) = config.max_files.filter(|&cap| files.len() > cap) {
        crate::log_warning!("Source list truncated by --max-files",
            "found" => files.len(),
            "kept" => cap
        );
        files.truncate(cap);
    }
    if files.len() > MAX_FILES_PER_BATCH {
        return Err(logged(BatchError::TooManyFiles {
            count: files.len(),
            max: MAX_FILES_PER_BATCH,
        }));
    }

    crate::log_success!(codes::success::FILE_VALIDATION_PASSED, "Source files discovered",
        "directory" => dir_path.display(),
        "recursive" => config.recursive,
        "count" => files.len()
    );
    Ok(files)
}

/// Symlinked directories are not followed
fn collect_sources(dir: &Path, recursive: bool, out: &mut Vec<PathBuf>) -> Result<(), BatchError> {
    let io_error = |source| BatchError::IoError {
        path: dir.to_path_buf(),
        source,
    };

    for entry in fs::read_dir(dir).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        let path = entry.path();
        if entry.file_type().map_err(io_error)?.is_dir() {
            if recursive {
                collect_sources(&path, true, out)?;
            }
        } else if is_source_path(&path) && path.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

// ============================================================================
// BATCH PROCESSING
// ============================================================================

/// Recognize a directory of sources one file at a time
pub fn process_directory_sequential(
    dir_path: &Path,
    config: &BatchConfig,
) -> Result<BatchResults, BatchError> {
    let start_time = Instant::now();
    let files = discover_source_files(dir_path, config)?;
    let mut results = BatchResults {
        discovered: files.len(),
        ..BatchResults::default()
    };

    for (file_id, file_path) in files.iter().enumerate() {
        if config.progress_reporting {
            println!("[{}/{}] {}", file_id + 1, files.len(), file_path.display());
        }
        let accepted = results.record(file_path.clone(), recognize(file_path, file_id, &config.runtime));
        if !accepted && config.fail_fast {
            crate::log_warning!("Stopping after the first rejected file");
            break;
        }
    }

    finish(&mut results, start_time, 1);
    Ok(results)
}

/// Recognize a directory of sources on worker threads
///
/// Workers pull the next file index from a shared counter, so a slow file
/// never holds up a fixed chunk of others.
pub fn process_directory_parallel(
    dir_path: &Path,
    config: &BatchConfig,
) -> Result<BatchResults, BatchError> {
    let start_time = Instant::now();
    let files = discover_source_files(dir_path, config)?;
    let threads = config.effective_threads().min(files.len());

    crate::log_info!("Starting parallel batch processing",
        "directory" => dir_path.display(),
        "files" => files.len(),
        "threads" => threads
    );

    let next = AtomicUsize::new(0);
    let stop = AtomicBool::new(false);
    let collected = Mutex::new(BatchResults::new());
    let (files, next, stop, collected_ref) = (&files, &next, &stop, &collected);

    let panicked = thread::scope(|scope| {
        let workers: Vec<_> = (0..threads)
            .map(|_| {
                scope.spawn(move || {
                    let mut local = BatchResults::new();
                    while !stop.load(Ordering::Relaxed) {
                        let file_id = next.fetch_add(1, Ordering::Relaxed);
                        let Some(file_path) = files.get(file_id) else {
                            break;
                        };
                        let outcome = recognize(file_path, file_id, &config.runtime);
                        if !local.record(file_path.clone(), outcome) && config.fail_fast {
                            stop.store(true, Ordering::Relaxed);
                        }
                    }
                    // a poisoned lock still holds valid results
                    collected_ref
                        .lock()
                        .unwrap_or_else(|poisoned| poisoned.into_inner())
                        .absorb(local);
                })
            })
            .collect();

        workers
            .into_iter()
            .map(|worker| worker.join())
            .filter(Result::is_err)
            .count()
    });

    if panicked > 0 {
        return Err(logged(BatchError::WorkerFailure(format!(
            "{} worker thread(s) panicked",
            panicked
        ))));
    }

    if stop.load(Ordering::Relaxed) {
        crate::log_warning!("Stopping after the first rejected file");
    }

    let mut results = collected
        .into_inner()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    results.discovered = files.len();
    finish(&mut results, start_time, threads);
    Ok(results)
}

/// One pipeline run under this file's logging context
fn recognize(
    file_path: &Path,
    file_id: usize,
    runtime: &RuntimeConfig,
) -> Result<PipelineResult, PipelineError> {
    logging::with_file_context(file_path.to_path_buf(), file_id, || {
        let outcome = pipeline::run(file_path, runtime);
        if let Err(error) = &outcome {
            crate::log_debug!("File rejected",
                "stage" => error.stage(),
                "code" => error.error_code()
            );
        }
        outcome
    })
}

fn finish(results: &mut BatchResults, start_time: Instant, threads: usize) {
    results.sort();
    results.elapsed = start_time.elapsed();

    crate::log_success!(
        codes::success::BATCH_COMPLETE,
        "Batch processing completed",
        "processed" => results.processed,
        "accepted" => results.accepted_count(),
        "rejected" => results.rejected_count(),
        "pass_rate" => format!("{:.1}%", results.pass_rate() * 100.0),
        "threads" => threads,
        "duration_ms" => format!("{:.2}", results.elapsed.as_secs_f64() * 1000.0)
    );
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Process a directory with default configuration
pub fn process_directory(dir_path: &Path) -> Result<BatchResults, BatchError> {
    process_directory_with_config(dir_path, &BatchConfig::default())
}

/// Process a directory with custom configuration
pub fn process_directory_with_config(
    dir_path: &Path,
    config: &BatchConfig,
) -> Result<BatchResults, BatchError> {
    if config.effective_threads() == 1 {
        process_directory_sequential(dir_path, config)
    } else {
        process_directory_parallel(dir_path, config)
    }
}

/// Validate that every batch code has registered metadata
pub fn init_batch_logging() -> Result<(), String> {
    codes::ensure_registered(&[
        codes::batch::DIRECTORY_NOT_FOUND,
        codes::batch::NO_SOURCE_FILES,
        codes::batch::TOO_MANY_FILES,
        codes::batch::WORKER_FAILURE,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    const GOOD: &str = "class A:\n    def f(self):\n        pass\n";
    const BAD: &str = "class A:\n    def f(self)\n        pass\n";

    fn quiet(max_threads: usize) -> BatchConfig {
        BatchConfig {
            max_threads,
            progress_reporting: false,
            ..BatchConfig::default()
        }
    }

    #[test]
    fn test_file_discovery() {
        let temp_dir = tempdir().unwrap();
        let temp_path = temp_dir.path();

        fs::write(temp_path.join("b.py"), GOOD).unwrap();
        fs::write(temp_path.join("a.py"), GOOD).unwrap();
        fs::write(temp_path.join("notes.txt"), "not python").unwrap();
        fs::create_dir(temp_path.join("pkg")).unwrap();
        fs::write(temp_path.join("pkg").join("c.py"), GOOD).unwrap();

        let files = discover_source_files(temp_path, &quiet(1)).unwrap();
        assert_eq!(files.len(), 3);
        assert!(files.windows(2).all(|w| w[0] <= w[1]));
        assert!(files.iter().all(|f| f.extension().unwrap() == "py"));

        let shallow = BatchConfig {
            recursive: false,
            ..quiet(1)
        };
        assert_eq!(discover_source_files(temp_path, &shallow).unwrap().len(), 2);

        let capped = BatchConfig {
            max_files: Some(1),
            ..quiet(1)
        };
        let files = discover_source_files(temp_path, &capped).unwrap();
        assert_eq!(files, vec![temp_path.join("a.py")]);
    }

    #[test]
    fn test_discovery_errors() {
        let temp_dir = tempdir().unwrap();
        let missing = temp_dir.path().join("missing");
        assert_matches!(
            discover_source_files(&missing, &quiet(1)),
            Err(BatchError::DirectoryNotFound(_))
        );

        fs::write(temp_dir.path().join("readme.md"), "# nothing").unwrap();
        let error = discover_source_files(temp_dir.path(), &quiet(1)).unwrap_err();
        assert_matches!(error, BatchError::NoFilesFound(_));
        assert_eq!(error.error_code(), codes::batch::NO_SOURCE_FILES);
    }

    #[test]
    fn test_sequential_pass_rate() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join("good1.py"), GOOD).unwrap();
        fs::write(temp_dir.path().join("good2.py"), GOOD).unwrap();
        fs::write(temp_dir.path().join("good3.py"), GOOD).unwrap();
        fs::write(temp_dir.path().join("bad.py"), BAD).unwrap();

        let results = process_directory_sequential(temp_dir.path(), &quiet(1)).unwrap();
        assert_eq!(results.processed, 4);
        assert_eq!(results.accepted_count(), 3);
        assert_eq!(results.rejected_count(), 1);
        assert!((results.pass_rate() - 0.75).abs() < f64::EPSILON);
        assert!(!results.all_passed());

        let report = results.report(false);
        assert!(report.contains("bad.py"));
        assert!(report.contains("3 of 4 files passed (75.0%)"));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let temp_dir = tempdir().unwrap();
        for i in 0..6 {
            fs::write(temp_dir.path().join(format!("ok{}.py", i)), GOOD).unwrap();
        }
        fs::write(temp_dir.path().join("zz_bad.py"), BAD).unwrap();

        let results = process_directory_parallel(temp_dir.path(), &quiet(3)).unwrap();
        assert_eq!(results.processed, 7);
        assert_eq!(results.accepted_count(), 6);
        assert_eq!(results.rejected[0].0, temp_dir.path().join("zz_bad.py"));
        assert!(results
            .accepted
            .windows(2)
            .all(|w| w[0].0 <= w[1].0));
    }

    #[test]
    fn test_fail_fast_stops_sequential_run() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join("a_bad.py"), BAD).unwrap();
        fs::write(temp_dir.path().join("b_good.py"), GOOD).unwrap();

        let config = BatchConfig {
            fail_fast: true,
            ..quiet(1)
        };
        let results = process_directory_sequential(temp_dir.path(), &config).unwrap();
        assert_eq!(results.processed, 1);
        assert_eq!(results.discovered, 2);
        assert!(results.report(false).contains("Stopped early"));
    }

    #[test]
    fn test_batch_results_empty() {
        let results = BatchResults::new();
        assert_eq!(results.pass_rate(), 0.0);
        assert_eq!(results.accepted_count(), 0);
        assert_eq!(results.rejected_count(), 0);
        assert!(results.all_passed());
    }

    #[test]
    fn test_batch_config_default() {
        let config = BatchConfig::default();
        assert!(config.max_threads >= 1);
        assert!(config.max_threads <= MAX_WORKER_THREADS);
        assert!(config.recursive);
        assert!(config.progress_reporting);
        assert!(!config.fail_fast);
        assert!(config.max_files.is_none());
        assert_eq!(quiet(0).effective_threads(), 1);
        assert!(init_batch_logging().is_ok());
    }
}
