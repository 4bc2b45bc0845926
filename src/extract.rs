//! Archive extraction and scratch directories.
//!
//! Extraction is a collaborator of the organizer: given an archive and an empty
//! directory, it fills the directory with the archive contents. The format
//! specific work is delegated to the `zip` and `sevenz-rust` crates.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// Errors that can occur while extracting an archive.
#[derive(Debug)]
pub enum ExtractError {
    /// The archive extension has no extractor.
    UnsupportedFormat { archive: PathBuf },
    /// The archive could not be opened.
    OpenFailed { archive: PathBuf, source: io::Error },
    /// The archive is corrupt or unreadable by the format library.
    ExtractionFailed { archive: PathBuf, reason: String },
    /// Writing an extracted entry failed.
    WriteFailed { path: PathBuf, source: io::Error },
    /// The scratch directory could not be created.
    ScratchCreationFailed { root: PathBuf, source: io::Error },
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedFormat { archive } => {
                write!(f, "Unsupported archive format: {}", archive.display())
            }
            Self::OpenFailed { archive, source } => {
                write!(f, "Failed to open {}: {}", archive.display(), source)
            }
            Self::ExtractionFailed { archive, reason } => {
                write!(f, "Failed to extract {}: {}", archive.display(), reason)
            }
            Self::WriteFailed { path, source } => {
                write!(f, "Failed to write {}: {}", path.display(), source)
            }
            Self::ScratchCreationFailed { root, source } => {
                write!(
                    f,
                    "Failed to create scratch directory in {}: {}",
                    root.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for ExtractError {}

/// Unpacks an archive into a directory.
pub trait ArchiveExtractor {
    /// Extracts `archive` into `dest`, which already exists and is empty.
    fn extract(&self, archive: &Path, dest: &Path) -> Result<(), ExtractError>;
}

/// Extractor for ZIP archives.
pub struct ZipExtractor;

impl ArchiveExtractor for ZipExtractor {
    fn extract(&self, archive: &Path, dest: &Path) -> Result<(), ExtractError> {
        let file = File::open(archive).map_err(|e| ExtractError::OpenFailed {
            archive: archive.to_path_buf(),
            source: e,
        })?;

        let mut zip_archive =
            zip::ZipArchive::new(file).map_err(|e| ExtractError::ExtractionFailed {
                archive: archive.to_path_buf(),
                reason: e.to_string(),
            })?;

        for i in 0..zip_archive.len() {
            let mut entry = zip_archive
                .by_index(i)
                .map_err(|e| ExtractError::ExtractionFailed {
                    archive: archive.to_path_buf(),
                    reason: format!("failed to read entry {}: {}", i, e),
                })?;

            let Some(relative) = entry.enclosed_name().map(Path::to_path_buf) else {
                warn!(
                    archive = %archive.display(),
                    entry = entry.name(),
                    "skipping entry with unsafe path"
                );
                continue;
            };
            let out_path = dest.join(relative);

            if entry.is_dir() {
                fs::create_dir_all(&out_path).map_err(|e| ExtractError::WriteFailed {
                    path: out_path.clone(),
                    source: e,
                })?;
                continue;
            }

            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent).map_err(|e| ExtractError::WriteFailed {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }

            let mut out_file = File::create(&out_path).map_err(|e| ExtractError::WriteFailed {
                path: out_path.clone(),
                source: e,
            })?;
            io::copy(&mut entry, &mut out_file).map_err(|e| ExtractError::WriteFailed {
                path: out_path.clone(),
                source: e,
            })?;
        }

        debug!(archive = %archive.display(), entries = zip_archive.len(), "ZIP extraction complete");
        Ok(())
    }
}

/// Extractor for 7z archives.
pub struct SevenZipExtractor;

impl ArchiveExtractor for SevenZipExtractor {
    fn extract(&self, archive: &Path, dest: &Path) -> Result<(), ExtractError> {
        sevenz_rust::decompress_file(archive, dest).map_err(|e| {
            ExtractError::ExtractionFailed {
                archive: archive.to_path_buf(),
                reason: e.to_string(),
            }
        })?;

        debug!(archive = %archive.display(), "7z extraction complete");
        Ok(())
    }
}

/// Picks an extractor from the archive extension.
#[derive(Default)]
pub struct DefaultExtractor;

impl ArchiveExtractor for DefaultExtractor {
    fn extract(&self, archive: &Path, dest: &Path) -> Result<(), ExtractError> {
        let ext = archive
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "zip" => ZipExtractor.extract(archive, dest),
            "7z" => SevenZipExtractor.extract(archive, dest),
            _ => Err(ExtractError::UnsupportedFormat {
                archive: archive.to_path_buf(),
            }),
        }
    }
}

/// A per-archive scratch directory.
///
/// Call [`ScratchDir::close`] to remove it and observe the result. If the value
/// is dropped instead, removal still happens but errors are lost.
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    /// Creates a fresh, uniquely named directory inside `root`.
    pub fn create_in(root: &Path) -> Result<Self, ExtractError> {
        let dir = tempfile::Builder::new()
            .prefix("retrosort-")
            .tempdir_in(root)
            .map_err(|e| ExtractError::ScratchCreationFailed {
                root: root.to_path_buf(),
                source: e,
            })?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Removes the directory and everything in it.
    pub fn close(self) -> io::Result<()> {
        self.dir.close()
    }
}
