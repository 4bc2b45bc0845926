//! Command-line interface module for retrosort.
//!
//! This module handles all CLI-related functionality including:
//! - Argument definitions
//! - Pre-flight checks on the input, output and scratch directories
//! - Archive discovery
//! - Wiring the organizer to the console reporter

use crate::config::{CompiledFilters, Config, ConfigError};
use crate::extract::DefaultExtractor;
use crate::language::LanguageFilter;
use crate::organizer::{OrganizeOptions, Organizer, RunStatistics};
use crate::output::{ConsoleReporter, OutputFormatter};
use clap::Parser;
use glob::{MatchOptions, Pattern};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Sort archived retro games into genre folders.
#[derive(Debug, Clone, Parser)]
#[command(name = "retrosort", version, about)]
pub struct Args {
    /// Directory scanned recursively for archives.
    pub input: PathBuf,

    /// Destination root for the genre hierarchy (created if missing).
    pub output: PathBuf,

    /// Root for per-archive scratch directories.
    #[arg(long, value_name = "DIR")]
    pub temp: Option<PathBuf>,

    /// Language the descriptor must declare [default: English].
    #[arg(short, long, value_name = "LANG")]
    pub language: Option<String>,

    /// Configuration file (TOML).
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Show where archives would go without moving anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Arguments for organizing `input` into `output` with all defaults.
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            temp: None,
            language: None,
            config: None,
            dry_run: false,
            verbose: false,
        }
    }
}

/// Errors that abort a run before any archive is processed.
#[derive(Debug)]
pub enum RunError {
    /// The input directory does not exist.
    InputNotFound(PathBuf),
    /// The output root could not be created.
    OutputCreationFailed { path: PathBuf, source: io::Error },
    /// The scratch root could not be created.
    TempCreationFailed { path: PathBuf, source: io::Error },
    /// The configuration could not be loaded or compiled.
    Config(ConfigError),
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InputNotFound(path) => {
                write!(f, "Input path does not exist: {}", path.display())
            }
            Self::OutputCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create output directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::TempCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create temp directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::Config(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for RunError {}

impl From<ConfigError> for RunError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Runs a full organize pass and prints the report.
///
/// Per-archive problems are counted in the returned statistics; only
/// pre-flight failures are returned as errors.
///
/// # Examples
///
/// ```no_run
/// use retrosort::cli::{Args, run_cli};
///
/// match run_cli(&Args::new("/archives", "/games")) {
///     Ok(stats) => println!("{} archives processed", stats.processed),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(args: &Args) -> Result<RunStatistics, RunError> {
    let config = Config::load(args.config.as_deref())?;
    let filters = CompiledFilters::new(&config.filters)?;
    let settings = config.organize;

    let temp_root = args.temp.clone().unwrap_or_else(|| settings.temp_root());
    let language = args
        .language
        .clone()
        .unwrap_or_else(|| settings.language.clone());

    preflight(&args.input, &args.output, &temp_root, args.dry_run)?;

    let archives = discover_archives(&args.input, &settings.archive_extensions);

    if args.dry_run {
        OutputFormatter::dry_run_notice("No files will be moved.");
    }
    OutputFormatter::info(&format!(
        "Found {} archive(s) in {} (language: {})",
        archives.len(),
        args.input.display(),
        language
    ));

    let options = OrganizeOptions {
        output_root: args.output.clone(),
        temp_root,
        language: LanguageFilter::new(language).case_sensitive(settings.case_sensitive_language),
        descriptor_extensions: settings.descriptor_extensions,
        filters,
        dry_run: args.dry_run,
    };

    let reporter = ConsoleReporter::new(archives.len(), args.dry_run);
    let mut organizer = Organizer::new(options, DefaultExtractor, reporter);
    let stats = organizer.run(&archives).clone();
    organizer.into_reporter().finish();

    OutputFormatter::summary_report(&stats);
    Ok(stats)
}

/// Validates the input and creates the output and scratch roots.
///
/// In dry-run mode the output root is left alone.
fn preflight(
    input: &Path,
    output: &Path,
    temp_root: &Path,
    dry_run: bool,
) -> Result<(), RunError> {
    if !input.exists() {
        return Err(RunError::InputNotFound(input.to_path_buf()));
    }

    if !dry_run {
        fs::create_dir_all(output).map_err(|e| RunError::OutputCreationFailed {
            path: output.to_path_buf(),
            source: e,
        })?;
    }

    fs::create_dir_all(temp_root).map_err(|e| RunError::TempCreationFailed {
        path: temp_root.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

/// Finds archives under `root` recursively, sorted by path.
///
/// Extensions are matched case-insensitively. Unreadable directories are
/// logged and skipped.
pub fn discover_archives(root: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };
    let escaped_root = Pattern::escape(&root.to_string_lossy());

    let mut archives = BTreeSet::new();
    for ext in extensions {
        let pattern = format!("{}/**/*.{}", escaped_root, ext.trim_start_matches('.'));
        let paths = match glob::glob_with(&pattern, options) {
            Ok(paths) => paths,
            Err(e) => {
                warn!(%pattern, error = %e, "invalid archive pattern");
                continue;
            }
        };

        for entry in paths {
            match entry {
                Ok(path) if path.is_file() => {
                    archives.insert(path);
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "skipping unreadable path"),
            }
        }
    }

    debug!(root = %root.display(), count = archives.len(), "archive discovery complete");
    archives.into_iter().collect()
}
