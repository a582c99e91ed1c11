//! One recognition run: file → tokens → skeleton
//!
//! Each run owns its lexer, symbol table and token stream. The lexer is drained
//! completely before the recognizer starts, and the first failure ends the run.

mod error;
mod result;
mod validation;

pub use error::PipelineError;
pub use result::{PipelineResult, StageTimings};
pub use validation::validate_pipeline;

use crate::config::runtime::RuntimeConfig;
use crate::file_processor::FileProcessor;
use crate::logging;
use std::path::Path;
use std::time::Instant;

/// Run a single file through the pipeline with default preferences
pub fn process_file(file_path: &Path) -> Result<PipelineResult, PipelineError> {
    process_file_with_config(file_path, &RuntimeConfig::default())
}

/// Run a single file through the pipeline with explicit preferences
pub fn process_file_with_config(
    file_path: &Path,
    config: &RuntimeConfig,
) -> Result<PipelineResult, PipelineError> {
    logging::with_file_context(file_path.to_path_buf(), 0, || run(file_path, config))
}

/// Pipeline body; the caller is responsible for the file context
pub(crate) fn run(file_path: &Path, config: &RuntimeConfig) -> Result<PipelineResult, PipelineError> {
    let started = Instant::now();
    crate::log_debug!("Starting recognition", "file" => file_path.display());

    let file_result = FileProcessor::from_preferences(&config.file_processor).process_file(file_path)?;

    let lex_start = Instant::now();
    let (tokens, lexical_metrics) =
        crate::lexical::tokenize_with_metrics(&file_result, config.lexical.clone())?;
    let lexing = lex_start.elapsed();
    let token_count = tokens.len();

    let parse_start = Instant::now();
    let summary = crate::syntax::parse_token_stream_with_preferences(tokens, &config.syntax)?;
    let parsing = parse_start.elapsed();

    let result = PipelineResult {
        summary,
        file_metadata: file_result.metadata,
        lexical_metrics,
        token_count,
        timings: StageTimings {
            lexing,
            parsing,
            total: started.elapsed(),
        },
    };
    result.log_success(file_path);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{Decorator, SyntaxError};
    use assert_matches::assert_matches;
    use std::fs;
    use tempfile::tempdir;

    const SHAPES: &str = "\
class Shape:
    def area(self) -> float:
        pass

class Circle(Shape):
    def __init__(self, radius: float):
        self.radius = radius

    @property
    def diameter(self):
        return self.radius * 2

    @classmethod
    def unit(cls):
        return cls(1)
";

    #[test]
    fn test_validate_pipeline() {
        let _ = crate::logging::init_global_logging();
        assert!(validate_pipeline().is_ok());
    }

    #[test]
    fn test_accepts_source_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shapes.py");
        fs::write(&path, SHAPES).unwrap();

        let result = process_file(&path).unwrap();
        assert_eq!(result.summary.class_count(), 2);
        assert_eq!(result.summary.method_count(), 4);
        assert_eq!(result.summary.decorated_method_count(), 2);
        assert_eq!(result.summary.classes[1].bases, vec!["Shape".to_string()]);
        assert_eq!(
            result.summary.classes[1].methods[2].decorator,
            Some(Decorator::ClassMethod)
        );
        assert!(result.token_count > 0);
        assert_eq!(result.lexical_metrics.decorator_tokens, 2);
    }

    #[test]
    fn test_missing_file_is_source_error() {
        let dir = tempdir().unwrap();
        let error = process_file(&dir.path().join("absent.py")).unwrap_err();
        assert_eq!(error.stage(), "source");
        assert_matches!(error, PipelineError::FileProcessor(_));
    }

    #[test]
    fn test_bad_indentation_is_lexical_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.py");
        fs::write(&path, "class A:\n    def f(self):\n        pass\n  def g(self):\n        pass\n")
            .unwrap();

        let error = process_file(&path).unwrap_err();
        assert_eq!(error.stage(), "lexical");
        assert!(error.to_string().contains("Invalid indentation at line 4"));
    }

    #[test]
    fn test_property_with_cls_is_syntax_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prop.py");
        fs::write(&path, "class A:\n    @property\n    def f(cls):\n        pass\n").unwrap();

        let error = process_file(&path).unwrap_err();
        assert_matches!(error, PipelineError::Syntax(SyntaxError::UnexpectedToken { .. }));
        assert!(error.to_string().starts_with("Syntax error at token position"));
    }
}
