/// Per-archive organize pipeline and run statistics.
///
/// Each archive goes through extraction, descriptor lookup, parsing, language
/// filtering, sanitization, destination resolution and file moves. Every
/// archive ends in exactly one [`ArchiveOutcome`], and its scratch directory
/// is removed whatever that outcome is.
use crate::config::{CompiledFilters, has_extension};
use crate::descriptor::{GameRecord, read_descriptor};
use crate::destination::{DestinationResolver, ensure_dir, move_file, resolve_path};
use crate::extract::{ArchiveExtractor, ScratchDir};
use crate::language::LanguageFilter;
use crate::sanitize::sanitize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Why an archive was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The descriptor language does not match the requested one.
    WrongLanguage,
    /// No readable descriptor file in the archive.
    NoDescriptor,
    /// The descriptor lacks a name or a genre.
    Unparseable,
    /// Name or genre became empty after sanitization.
    InvalidAfterCleaning,
}

impl SkipReason {
    /// Short label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::WrongLanguage => "wrong language",
            SkipReason::NoDescriptor => "no descriptor",
            SkipReason::Unparseable => "unparseable descriptor",
            SkipReason::InvalidAfterCleaning => "invalid after cleaning",
        }
    }
}

/// Classification of a single archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveOutcome {
    /// Files were placed (or, in dry-run mode, planned) under `destination`.
    Processed {
        destination: PathBuf,
        files_moved: usize,
    },
    Skipped(SkipReason),
    /// Extraction, listing or moving failed.
    Failed(String),
}

/// Counters for a whole run.
///
/// `total == processed + skipped() + errors` holds after every update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStatistics {
    pub total: usize,
    pub processed: usize,
    pub wrong_language: usize,
    pub no_descriptor: usize,
    pub unparseable: usize,
    pub invalid_after_cleaning: usize,
    pub errors: usize,
    pub files_moved: usize,
}

impl RunStatistics {
    /// Counts one archive outcome.
    pub fn record(&mut self, outcome: &ArchiveOutcome) {
        self.total += 1;
        match outcome {
            ArchiveOutcome::Processed { files_moved, .. } => {
                self.processed += 1;
                self.files_moved += files_moved;
            }
            ArchiveOutcome::Skipped(reason) => match reason {
                SkipReason::WrongLanguage => self.wrong_language += 1,
                SkipReason::NoDescriptor => self.no_descriptor += 1,
                SkipReason::Unparseable => self.unparseable += 1,
                SkipReason::InvalidAfterCleaning => self.invalid_after_cleaning += 1,
            },
            ArchiveOutcome::Failed(_) => self.errors += 1,
        }
    }

    /// Total skipped archives across all reasons.
    pub fn skipped(&self) -> usize {
        self.wrong_language + self.no_descriptor + self.unparseable + self.invalid_after_cleaning
    }

    /// Checks the counting invariant.
    pub fn is_consistent(&self) -> bool {
        self.total == self.processed + self.skipped() + self.errors
    }
}

/// Receives progress events from the organizer.
pub trait Reporter {
    /// An archive is about to be processed. `index` is 1-based.
    fn archive_started(&mut self, index: usize, total: usize, archive: &Path);
    /// A descriptor was found and parsed.
    fn descriptor_parsed(&mut self, record: &GameRecord);
    /// An archive has been classified and its scratch directory released.
    fn archive_finished(&mut self, archive: &Path, outcome: &ArchiveOutcome);
}

/// A reporter that ignores every event.
#[derive(Debug, Default)]
pub struct SilentReporter;

impl Reporter for SilentReporter {
    fn archive_started(&mut self, _index: usize, _total: usize, _archive: &Path) {}
    fn descriptor_parsed(&mut self, _record: &GameRecord) {}
    fn archive_finished(&mut self, _archive: &Path, _outcome: &ArchiveOutcome) {}
}

/// Everything the organizer needs to know about a run.
#[derive(Debug)]
pub struct OrganizeOptions {
    pub output_root: PathBuf,
    pub temp_root: PathBuf,
    pub language: LanguageFilter,
    pub descriptor_extensions: Vec<String>,
    pub filters: CompiledFilters,
    /// Resolve destinations without creating directories or moving files.
    pub dry_run: bool,
}

impl OrganizeOptions {
    /// Options with default language, descriptor extension and filters.
    pub fn new(output_root: impl Into<PathBuf>, temp_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            temp_root: temp_root.into(),
            language: LanguageFilter::default(),
            descriptor_extensions: vec!["nfo".to_string()],
            filters: CompiledFilters::default(),
            dry_run: false,
        }
    }
}

/// Drives archives through the organize pipeline one at a time.
pub struct Organizer<E: ArchiveExtractor, R: Reporter> {
    options: OrganizeOptions,
    extractor: E,
    reporter: R,
    resolver: DestinationResolver,
    stats: RunStatistics,
}

impl<E: ArchiveExtractor, R: Reporter> Organizer<E, R> {
    pub fn new(options: OrganizeOptions, extractor: E, reporter: R) -> Self {
        Self {
            options,
            extractor,
            reporter,
            resolver: DestinationResolver::new(),
            stats: RunStatistics::default(),
        }
    }

    /// Processes every archive in order and returns the final statistics.
    ///
    /// A failing archive never stops the run.
    pub fn run(&mut self, archives: &[PathBuf]) -> &RunStatistics {
        let total = archives.len();
        for (i, archive) in archives.iter().enumerate() {
            self.reporter.archive_started(i + 1, total, archive);
            self.process_archive(archive);
        }
        &self.stats
    }

    /// Processes one archive, records its outcome and returns it.
    pub fn process_archive(&mut self, archive: &Path) -> ArchiveOutcome {
        let outcome = self.classify(archive);
        debug!(archive = %archive.display(), ?outcome, "archive classified");
        self.stats.record(&outcome);
        self.reporter.archive_finished(archive, &outcome);
        outcome
    }

    pub fn statistics(&self) -> &RunStatistics {
        &self.stats
    }

    pub fn into_reporter(self) -> R {
        self.reporter
    }

    fn classify(&mut self, archive: &Path) -> ArchiveOutcome {
        let scratch = match ScratchDir::create_in(&self.options.temp_root) {
            Ok(scratch) => scratch,
            Err(e) => return ArchiveOutcome::Failed(e.to_string()),
        };

        let outcome = self.classify_extracted(archive, scratch.path());

        let scratch_path = scratch.path().to_path_buf();
        release_scratch(outcome, &scratch_path, || scratch.close())
    }

    fn classify_extracted(&mut self, archive: &Path, scratch: &Path) -> ArchiveOutcome {
        if let Err(e) = self.extractor.extract(archive, scratch) {
            return ArchiveOutcome::Failed(e.to_string());
        }

        let descriptor = match find_descriptor(scratch, &self.options.descriptor_extensions) {
            Ok(Some(path)) => path,
            Ok(None) => return ArchiveOutcome::Skipped(SkipReason::NoDescriptor),
            Err(e) => {
                return ArchiveOutcome::Failed(format!("Failed to list extracted files: {}", e));
            }
        };
        debug!(descriptor = %descriptor.display(), "using descriptor");

        let Some(record) = read_descriptor(&descriptor) else {
            return ArchiveOutcome::Skipped(SkipReason::NoDescriptor);
        };
        self.reporter.descriptor_parsed(&record);

        // A declared mismatch wins over missing fields; an undeclared language
        // only counts once the record is otherwise complete.
        if record.language.is_some() && !self.options.language.accepts(&record) {
            return ArchiveOutcome::Skipped(SkipReason::WrongLanguage);
        }

        let (Some(name), Some(genre)) = (record.name.as_deref(), record.genre.as_deref()) else {
            return ArchiveOutcome::Skipped(SkipReason::Unparseable);
        };

        if !self.options.language.accepts(&record) {
            return ArchiveOutcome::Skipped(SkipReason::WrongLanguage);
        }

        let name = sanitize(name);
        let genre = sanitize(genre);
        let sub_genre = record
            .sub_genre
            .as_deref()
            .map(sanitize)
            .filter(|s| !s.is_empty());
        if name.is_empty() || genre.is_empty() {
            return ArchiveOutcome::Skipped(SkipReason::InvalidAfterCleaning);
        }

        let destination = resolve_path(
            &self.options.output_root,
            &genre,
            sub_genre.as_deref(),
            &name,
        );

        match self.place_files(scratch, &destination) {
            Ok(files_moved) => ArchiveOutcome::Processed {
                destination,
                files_moved,
            },
            Err(message) => ArchiveOutcome::Failed(message),
        }
    }

    fn place_files(&mut self, scratch: &Path, destination: &Path) -> Result<usize, String> {
        let files = list_files(scratch)
            .map_err(|e| format!("Failed to list extracted files: {}", e))?
            .into_iter()
            .filter(|(_, path)| self.options.filters.should_include(path))
            .collect::<Vec<_>>();

        if !self.options.dry_run {
            ensure_dir(destination).map_err(|e| e.to_string())?;
        }

        let resolved = self
            .resolver
            .resolve_file_destinations(&files, destination);

        if !self.options.dry_run {
            for (source, final_name) in &resolved {
                move_file(source, &destination.join(final_name)).map_err(|e| e.to_string())?;
            }
        }

        Ok(resolved.len())
    }
}

/// Runs the scratch release and hands back `outcome` unchanged.
///
/// A failed release is logged and never turns the outcome into an error.
fn release_scratch(
    outcome: ArchiveOutcome,
    scratch_path: &Path,
    close: impl FnOnce() -> io::Result<()>,
) -> ArchiveOutcome {
    if let Err(e) = close() {
        warn!(
            path = %scratch_path.display(),
            error = %e,
            "failed to remove scratch directory"
        );
    }
    outcome
}

/// Lists the regular files directly inside `dir`, sorted by name.
fn list_files(dir: &Path) -> io::Result<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push((entry.file_name().to_string_lossy().to_string(), entry.path()));
        }
    }
    files.sort();
    Ok(files)
}

/// Picks the lexicographically first top-level file with a descriptor extension.
fn find_descriptor(dir: &Path, extensions: &[String]) -> io::Result<Option<PathBuf>> {
    Ok(list_files(dir)?
        .into_iter()
        .map(|(_, path)| path)
        .find(|path| has_extension(path, extensions)))
}
