use crate::file_processor::FileProcessorError;
use crate::lexical::LexerError;
use crate::logging::codes::{self, Code, Severity};
use crate::syntax::SyntaxError;

/// First failure of a run, tagged with the stage that produced it
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    FileProcessor(#[from] FileProcessorError),

    #[error(transparent)]
    Lexical(#[from] LexerError),

    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}

impl PipelineError {
    pub fn error_code(&self) -> Code {
        match self {
            Self::FileProcessor(e) => e.error_code(),
            Self::Lexical(e) => e.error_code(),
            Self::Syntax(e) => e.error_code(),
        }
    }

    pub fn stage(&self) -> &'static str {
        match self {
            Self::FileProcessor(_) => "source",
            Self::Lexical(_) => "lexical",
            Self::Syntax(_) => "syntax",
        }
    }

    pub fn severity(&self) -> Severity {
        codes::get_severity(self.error_code().as_str())
    }

    pub fn is_recoverable(&self) -> bool {
        codes::is_recoverable(self.error_code().as_str())
    }
}
