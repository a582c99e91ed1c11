//! Turns `config/<profile>.toml` into the `compile_time` constant modules
//!
//! The profile is chosen with `SKELETON_BUILD_PROFILE` (default `development`)
//! and looked up under `SKELETON_CONFIG_DIR` relative to the workspace root.

use serde::Deserialize;
use std::env;
use std::error::Error;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Profile {
    file_processing: FileProcessing,
    lexical: Lexical,
    syntax: Syntax,
    batch_processing: BatchProcessing,
    logging: Logging,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FileProcessing {
    max_file_size: u64,
    large_file_threshold: u64,
    max_line_count_for_analysis: usize,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Lexical {
    max_string_size: usize,
    max_identifier_length: usize,
    max_token_count: usize,
    max_indent_depth: usize,
    tab_width: usize,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Syntax {
    max_class_count: usize,
    max_parameters_per_method: usize,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct BatchProcessing {
    max_worker_threads: usize,
    max_files_per_batch: usize,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Logging {
    max_error_collection: usize,
    log_buffer_size: usize,
    max_log_message_length: usize,
    max_log_events_per_file: usize,
}

const FILE_SIZE_CEILING: u64 = 1_000_000_000;
const PRODUCTION_FILE_SIZE_CEILING: u64 = 50_000_000;
const THREAD_CEILING: usize = 256;

impl Profile {
    fn check(&self, name: &str) -> Result<(), String> {
        let fp = &self.file_processing;
        let rules = [
            (fp.max_file_size <= FILE_SIZE_CEILING, "max_file_size above 1 GB"),
            (
                fp.large_file_threshold <= fp.max_file_size,
                "large_file_threshold above max_file_size",
            ),
            (self.lexical.tab_width > 0, "tab_width must be at least 1"),
            (self.lexical.max_indent_depth > 0, "max_indent_depth must be at least 1"),
            (
                (1..=THREAD_CEILING).contains(&self.batch_processing.max_worker_threads),
                "max_worker_threads outside 1..=256",
            ),
            (
                self.logging.max_log_events_per_file <= self.logging.log_buffer_size,
                "max_log_events_per_file above log_buffer_size",
            ),
            (
                name != "production" || fp.max_file_size <= PRODUCTION_FILE_SIZE_CEILING,
                "max_file_size above 50 MB in the production profile",
            ),
        ];

        match rules.iter().find(|(ok, _)| !ok) {
            Some((_, reason)) => Err(format!("profile '{}': {}", name, reason)),
            None => Ok(()),
        }
    }

    fn render(&self, name: &str) -> String {
        let fp = &self.file_processing;
        let lx = &self.lexical;
        let lg = &self.logging;

        let mut out = format!("// Generated from the '{}' build profile\n\npub mod compile_time {{\n", name);
        module(&mut out, "file_processing", &[
            ("MAX_FILE_SIZE", "u64", fp.max_file_size.to_string()),
            ("LARGE_FILE_THRESHOLD", "u64", fp.large_file_threshold.to_string()),
            ("MAX_LINE_COUNT_FOR_ANALYSIS", "usize", fp.max_line_count_for_analysis.to_string()),
        ]);
        module(&mut out, "lexical", &[
            ("MAX_STRING_SIZE", "usize", lx.max_string_size.to_string()),
            ("MAX_IDENTIFIER_LENGTH", "usize", lx.max_identifier_length.to_string()),
            ("MAX_TOKEN_COUNT", "usize", lx.max_token_count.to_string()),
            ("MAX_INDENT_DEPTH", "usize", lx.max_indent_depth.to_string()),
            ("TAB_WIDTH", "usize", lx.tab_width.to_string()),
        ]);
        module(&mut out, "syntax", &[
            ("MAX_CLASS_COUNT", "usize", self.syntax.max_class_count.to_string()),
            ("MAX_PARAMETERS_PER_METHOD", "usize", self.syntax.max_parameters_per_method.to_string()),
        ]);
        module(&mut out, "batch_processing", &[
            ("MAX_WORKER_THREADS", "usize", self.batch_processing.max_worker_threads.to_string()),
            ("MAX_FILES_PER_BATCH", "usize", self.batch_processing.max_files_per_batch.to_string()),
        ]);
        module(&mut out, "logging", &[
            ("MAX_ERROR_COLLECTION", "usize", lg.max_error_collection.to_string()),
            ("LOG_BUFFER_SIZE", "usize", lg.log_buffer_size.to_string()),
            ("MAX_LOG_MESSAGE_LENGTH", "usize", lg.max_log_message_length.to_string()),
            ("MAX_LOG_EVENTS_PER_FILE", "usize", lg.max_log_events_per_file.to_string()),
        ]);
        out.push_str("}\n");
        out
    }
}

fn module(out: &mut String, name: &str, constants: &[(&str, &str, String)]) {
    let _ = writeln!(out, "    pub mod {} {{", name);
    for (constant, ty, value) in constants {
        let _ = writeln!(out, "        pub const {}: {} = {};", constant, ty, value);
    }
    out.push_str("    }\n");
}

fn profile_path(profile: &str) -> Result<PathBuf, Box<dyn Error>> {
    let config_dir = env::var("SKELETON_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let workspace_root = manifest_dir
        .parent()
        .ok_or("crate directory has no parent workspace")?;
    Ok(workspace_root.join(config_dir).join(format!("{}.toml", profile)))
}

fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=SKELETON_BUILD_PROFILE");
    println!("cargo:rerun-if-env-changed=SKELETON_CONFIG_DIR");

    let name = env::var("SKELETON_BUILD_PROFILE").unwrap_or_else(|_| "development".to_string());
    let path = profile_path(&name)?;
    println!("cargo:rerun-if-changed={}", path.display());

    let text = fs::read_to_string(&path)
        .map_err(|e| format!("cannot read build profile {}: {}", path.display(), e))?;
    let profile: Profile = toml::from_str(&text)
        .map_err(|e| format!("invalid build profile {}: {}", path.display(), e))?;
    profile.check(&name)?;

    let out_dir = env::var("OUT_DIR")?;
    fs::write(Path::new(&out_dir).join("constants.rs"), profile.render(&name))?;
    Ok(())
}
