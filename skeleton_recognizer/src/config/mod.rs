//! Configuration module for the skeleton recognizer
//! Compile-time limits come from the TOML profile read by build.rs

// Generated at compile time from config/<profile>.toml
include!(concat!(env!("OUT_DIR"), "/constants.rs"));

pub mod runtime;

/// Build information and configuration metadata
pub mod build_info {
    /// Returns the configuration profile used during build
    pub fn profile() -> &'static str {
        option_env!("SKELETON_BUILD_PROFILE").unwrap_or("development")
    }

    /// Returns the configuration directory used during build
    pub fn config_dir() -> &'static str {
        option_env!("SKELETON_CONFIG_DIR").unwrap_or("config")
    }

    /// Returns configuration source information
    pub fn source_info() -> String {
        format!("Generated from {}/{}.toml", config_dir(), profile())
    }
}

#[cfg(test)]
mod tests {
    use super::compile_time;

    #[test]
    fn test_generated_limits_are_consistent() {
        assert!(compile_time::lexical::TAB_WIDTH >= 1);
        assert!(compile_time::lexical::MAX_INDENT_DEPTH >= 1);
        assert!(
            compile_time::file_processing::LARGE_FILE_THRESHOLD
                <= compile_time::file_processing::MAX_FILE_SIZE
        );
        assert!(
            compile_time::logging::MAX_LOG_EVENTS_PER_FILE <= compile_time::logging::LOG_BUFFER_SIZE
        );
    }

    #[test]
    fn test_build_info_source() {
        assert!(super::build_info::source_info().ends_with(".toml"));
    }
}
