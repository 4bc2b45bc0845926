//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output, including colored output,
//! progress tracking, and the final run report. The organizer only emits events;
//! [`ConsoleReporter`] turns them into lines on the terminal.

use crate::descriptor::GameRecord;
use crate::organizer::{ArchiveOutcome, Reporter, RunStatistics};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use retrosort::output::OutputFormatter;
    /// OutputFormatter::success("Moved 3 files");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a progress bar counting archives.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        pb
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Prints the end-of-run report.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use retrosort::organizer::RunStatistics;
    /// use retrosort::output::OutputFormatter;
    ///
    /// let stats = RunStatistics { total: 2, processed: 1, errors: 1, ..Default::default() };
    /// OutputFormatter::summary_report(&stats);
    /// ```
    pub fn summary_report(stats: &RunStatistics) {
        Self::header("SUMMARY");

        let skip_rows = [
            ("wrong language", stats.wrong_language),
            ("no descriptor", stats.no_descriptor),
            ("unparseable", stats.unparseable),
            ("invalid after cleaning", stats.invalid_after_cleaning),
        ];
        let width = skip_rows
            .iter()
            .map(|(label, _)| label.len() + 2)
            .max()
            .unwrap_or(0)
            .max("Files moved".len());

        println!("{:<width$} | {}", "Archives".bold(), stats.total, width = width);
        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {}",
            "Processed",
            stats.processed.to_string().green(),
            width = width
        );
        println!(
            "{:<width$} | {}",
            "Skipped",
            stats.skipped().to_string().yellow(),
            width = width
        );
        for (label, count) in skip_rows {
            println!("{:<width$} | {}", format!("  {}", label), count, width = width);
        }
        let errors = if stats.errors > 0 {
            stats.errors.to_string().red()
        } else {
            stats.errors.to_string().normal()
        };
        println!("{:<width$} | {}", "Errors", errors, width = width);
        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {}",
            "Files moved".bold(),
            stats.files_moved.to_string().green().bold(),
            width = width
        );
    }
}

/// Prints organizer events to the terminal behind a progress bar.
pub struct ConsoleReporter {
    bar: ProgressBar,
    dry_run: bool,
}

impl ConsoleReporter {
    pub fn new(total: usize, dry_run: bool) -> Self {
        Self {
            bar: OutputFormatter::create_progress_bar(total as u64),
            dry_run,
        }
    }

    /// Clears the progress bar before the summary is printed.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Reporter for ConsoleReporter {
    fn archive_started(&mut self, index: usize, total: usize, archive: &Path) {
        let name = archive
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| archive.display().to_string());
        self.bar.set_message(name.clone());
        self.bar.suspend(|| {
            OutputFormatter::info(&format!("[{}/{}] Processing {}", index, total, name));
        });
    }

    fn descriptor_parsed(&mut self, record: &GameRecord) {
        let fields = [
            ("Name", &record.name),
            ("Genre", &record.genre),
            ("Subgenre", &record.sub_genre),
            ("Language", &record.language),
        ];
        self.bar.suspend(|| {
            for (label, value) in fields {
                let shown = value.as_deref().unwrap_or("(none)");
                OutputFormatter::plain(&format!("   {}: {}", label, shown));
            }
        });
    }

    fn archive_finished(&mut self, archive: &Path, outcome: &ArchiveOutcome) {
        let dry_run = self.dry_run;
        self.bar.suspend(|| match outcome {
            ArchiveOutcome::Processed {
                destination,
                files_moved,
            } => {
                let files = if *files_moved == 1 { "file" } else { "files" };
                if dry_run {
                    OutputFormatter::dry_run_notice(&format!(
                        "   Would move {} {} to {}",
                        files_moved,
                        files,
                        destination.display()
                    ));
                } else {
                    OutputFormatter::success(&format!(
                        "  Moved {} {} to {}",
                        files_moved,
                        files,
                        destination.display()
                    ));
                }
            }
            ArchiveOutcome::Skipped(reason) => {
                OutputFormatter::warning(&format!(" Skipped: {}", reason.label()));
            }
            ArchiveOutcome::Failed(message) => {
                OutputFormatter::error(&format!(
                    " Error processing {}: {}",
                    archive.display(),
                    message
                ));
            }
        });
        self.bar.inc(1);
    }
}
