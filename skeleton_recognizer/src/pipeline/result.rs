use crate::file_processor::FileMetadata;
use crate::lexical::LexicalMetrics;
use crate::logging::codes;
use crate::syntax::SkeletonSummary;
use std::path::Path;
use std::time::Duration;

/// Wall time spent in each stage of one run
#[derive(Debug, Clone, Copy, Default)]
pub struct StageTimings {
    pub lexing: Duration,
    pub parsing: Duration,
    pub total: Duration,
}

fn millis(duration: Duration) -> String {
    format!("{:.2}", duration.as_secs_f64() * 1000.0)
}

/// Outcome of one accepted file
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub summary: SkeletonSummary,
    pub file_metadata: FileMetadata,
    pub lexical_metrics: LexicalMetrics,
    pub token_count: usize,
    pub timings: StageTimings,
}

impl PipelineResult {
    pub fn tokens_per_second(&self) -> f64 {
        let secs = self.timings.total.as_secs_f64();
        if secs > 0.0 {
            self.token_count as f64 / secs
        } else {
            0.0
        }
    }

    pub fn log_success(&self, file_path: &Path) {
        crate::log_success!(codes::success::SYNTAX_VALIDATION_PASSED, "Source accepted",
            "file" => file_path.display(),
            "summary" => &self.summary,
            "tokens" => self.token_count,
            "lex_ms" => millis(self.timings.lexing),
            "parse_ms" => millis(self.timings.parsing),
            "duration_ms" => millis(self.timings.total),
            "tokens_per_sec" => format!("{:.0}", self.tokens_per_second())
        );
    }
}
