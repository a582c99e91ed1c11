use skeleton_recognizer::config::{self, runtime::RuntimeConfig};
use skeleton_recognizer::logging::codes;
use skeleton_recognizer::{batch, logging, pipeline};
use std::env;
use std::path::Path;
use std::process::ExitCode;

/// Options that follow the single path argument
#[derive(Debug)]
struct CliOptions {
    batch: batch::BatchConfig,
    json: bool,
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let program = args
        .first()
        .map(String::as_str)
        .unwrap_or("skeleton_recognizer");

    if args.iter().skip(1).any(|a| a == "--help" || a == "-h") {
        print_help(program);
        return ExitCode::SUCCESS;
    }

    let Some(input) = args.get(1).filter(|a| !a.starts_with("--")) else {
        print_usage(program);
        return ExitCode::FAILURE;
    };

    let runtime = match RuntimeConfig::from_environment() {
        Ok(runtime) => runtime,
        Err(e) => {
            logging::safe_log_error(codes::system::CONFIGURATION_ERROR, &e.to_string());
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init_global_logging_with_preferences(runtime.logging.clone()) {
        logging::safe_log_error(
            codes::system::INITIALIZATION_FAILURE,
            &format!("Failed to initialize logging: {}", e),
        );
        return ExitCode::FAILURE;
    }

    if let Err(e) = startup_checks() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let options = match parse_options(&args[2..], runtime) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("Error: {}", message);
            print_usage(program);
            return ExitCode::FAILURE;
        }
    };

    let input_path = Path::new(input);
    if input_path.is_dir() {
        process_directory_batch(input_path, &options)
    } else {
        process_single_file(input_path, &options)
    }
}

/// Stage self-checks run after logging is up and before any input is read
fn startup_checks() -> Result<(), String> {
    pipeline::validate_pipeline()?;
    batch::init_batch_logging()
}

fn print_usage(program_name: &str) {
    eprintln!("Usage: {} <input.py|directory> [options]", program_name);
    eprintln!("       {} --help", program_name);
}

fn print_help(program_name: &str) {
    println!("Skeleton Recognizer v{}", env!("CARGO_PKG_VERSION"));
    println!("Accepts or rejects the class and method skeleton of Python-like sources");
    println!("Limits: {}", config::build_info::source_info());
    println!();
    println!("USAGE:");
    println!("    {} <input.py>                     # Recognize one file", program_name);
    println!("    {} <directory> [options]          # Recognize every .py file", program_name);
    println!();
    println!("OPTIONS:");
    println!("    --help              Show this help message");
    println!("    --sequential        Process directory files one at a time");
    println!("    --threads N         Set maximum number of worker threads");
    println!("    --no-recursive      Don't search subdirectories");
    println!("    --max-files N       Limit maximum files to process");
    println!("    --fail-fast         Stop on first rejected file");
    println!("    --quiet             Suppress progress reporting");
    println!("    --json              Print the recognized skeleton as JSON (single file)");
    println!();
    println!("EXIT STATUS:");
    println!("    0  every input was accepted");
    println!("    1  an input was rejected, or the arguments were invalid");
    println!();
    println!("ENVIRONMENT:");
    println!("    SKELETON_RUNTIME_CONFIG     TOML file with runtime preferences");
    println!("    SKELETON_LOGGING_MIN_LEVEL  debug | info | warning | error");
    println!("    SKELETON_LOG_FILE           Also write log events to this file");
    println!();
    println!("EXAMPLES:");
    println!("    {} shapes.py", program_name);
    println!("    {} src/ --threads 4", program_name);
    println!("    {} tests/ --sequential --fail-fast", program_name);
}

fn parse_options(args: &[String], runtime: RuntimeConfig) -> Result<CliOptions, String> {
    let mut options = CliOptions {
        batch: batch::BatchConfig {
            runtime,
            ..batch::BatchConfig::default()
        },
        json: false,
    };

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--sequential" => options.batch.max_threads = 1,
            "--threads" => options.batch.max_threads = numeric_value("--threads", iter.next())?,
            "--no-recursive" => options.batch.recursive = false,
            "--max-files" => {
                options.batch.max_files = Some(numeric_value("--max-files", iter.next())?)
            }
            "--fail-fast" => options.batch.fail_fast = true,
            "--quiet" => options.batch.progress_reporting = false,
            "--json" => options.json = true,
            other if other.starts_with("--") => return Err(format!("unknown option '{}'", other)),
            other => return Err(format!("unexpected extra argument '{}'", other)),
        }
    }

    Ok(options)
}

fn numeric_value(option: &str, value: Option<&String>) -> Result<usize, String> {
    let value = value.ok_or_else(|| format!("{} requires a number", option))?;
    match value.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("invalid value '{}' for {}", value, option)),
    }
}

fn process_single_file(file_path: &Path, options: &CliOptions) -> ExitCode {
    match pipeline::process_file_with_config(file_path, &options.batch.runtime) {
        Ok(result) => {
            if options.json {
                match serde_json::to_string_pretty(&result.summary) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Error: cannot serialize skeleton: {}", e);
                        return ExitCode::FAILURE;
                    }
                }
            } else if options.batch.progress_reporting {
                println!("{}: accepted ({})", file_path.display(), result.summary);
            }
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("{}", error);
            ExitCode::FAILURE
        }
    }
}

fn process_directory_batch(dir_path: &Path, options: &CliOptions) -> ExitCode {
    let config = &options.batch;
    if config.progress_reporting {
        println!("Starting batch processing: {}", dir_path.display());
        println!(
            "Configuration: {} threads, recursive={}, fail_fast={}",
            config.effective_threads(),
            config.recursive,
            config.fail_fast
        );
    }

    match batch::process_directory_with_config(dir_path, config) {
        Ok(results) => {
            println!("{}", results.report(config.progress_reporting));
            print_collected_errors();

            if results.all_passed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(error) => {
            eprintln!("Batch processing failed: {}", error);
            ExitCode::FAILURE
        }
    }
}

fn print_collected_errors() {
    if !logging::config::preferences().enable_cargo_style_output {
        return;
    }
    if let Some(summary) = logging::format_collected_report() {
        if !summary.trim().is_empty() {
            eprintln!("{}", summary);
        }
    }
}
