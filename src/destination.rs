/// Destination resolution for organized games.
///
/// This module builds the `root/genre[/sub_genre]/name` directory for a game,
/// picks collision-free file names inside it, and moves extracted files there.
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Errors that can occur while placing files at their destination.
#[derive(Debug)]
pub enum DestinationError {
    /// Failed to create the destination directory.
    DirectoryCreationFailed { path: PathBuf, source: io::Error },
    /// Failed to move a file into the destination directory.
    FileMoveFailure {
        source: PathBuf,
        destination: PathBuf,
        source_error: io::Error,
    },
}

impl std::fmt::Display for DestinationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DirectoryCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::FileMoveFailure {
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    source.display(),
                    destination.display(),
                    source_error
                )
            }
        }
    }
}

impl std::error::Error for DestinationError {}

/// Result type for destination operations.
pub type DestinationResult<T> = Result<T, DestinationError>;

/// Builds the destination directory for a game.
///
/// Segments are expected to be sanitized already; no further cleaning happens here.
///
/// # Examples
///
/// ```
/// use retrosort::destination::resolve_path;
/// use std::path::Path;
///
/// let dir = resolve_path(Path::new("/games"), "Racing", Some("Arcade"), "Pitstop");
/// assert_eq!(dir, Path::new("/games/Racing/Arcade/Pitstop"));
///
/// let dir = resolve_path(Path::new("/games"), "Puzzle", None, "Tetris");
/// assert_eq!(dir, Path::new("/games/Puzzle/Tetris"));
/// ```
pub fn resolve_path(root: &Path, genre: &str, sub_genre: Option<&str>, name: &str) -> PathBuf {
    let mut path = root.join(genre);
    if let Some(sub_genre) = sub_genre {
        path.push(sub_genre);
    }
    path.push(name);
    path
}

/// Picks collision-free file names inside destination directories.
///
/// Every name handed out is remembered for the lifetime of the resolver, so
/// files resolved later in a run never reuse a name claimed earlier, whether
/// or not the earlier file has reached the disk yet.
#[derive(Debug, Default)]
pub struct DestinationResolver {
    claimed: HashSet<PathBuf>,
}

impl DestinationResolver {
    /// Creates a resolver with no claimed names.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a free path for `file_name` inside `dir` and claims it.
    ///
    /// If `dir/file_name` is taken, `stem_1.ext`, `stem_2.ext`, ... are tried
    /// in order until one is neither on disk nor already claimed.
    pub fn claim(&mut self, dir: &Path, file_name: &str) -> PathBuf {
        let mut candidate = dir.join(file_name);
        let mut counter = 1usize;
        while self.is_taken(&candidate) {
            candidate = dir.join(numbered_name(file_name, counter));
            counter += 1;
        }
        self.claimed.insert(candidate.clone());
        candidate
    }

    /// Resolves final names for a batch of `(name, source)` pairs.
    ///
    /// Returns `(source, final_name)` pairs in input order.
    pub fn resolve_file_destinations(
        &mut self,
        files: &[(String, PathBuf)],
        dir: &Path,
    ) -> Vec<(PathBuf, String)> {
        files
            .iter()
            .map(|(name, source)| {
                let target = self.claim(dir, name);
                let final_name = target
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| name.clone());
                if final_name != *name {
                    debug!(original = %name, renamed = %final_name, "resolved name collision");
                }
                (source.clone(), final_name)
            })
            .collect()
    }

    fn is_taken(&self, candidate: &Path) -> bool {
        self.claimed.contains(candidate) || candidate.exists()
    }
}

/// Inserts `_N` before the extension: `foo.txt` becomes `foo_1.txt`.
fn numbered_name(file_name: &str, counter: usize) -> String {
    let path = Path::new(file_name);
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) => format!(
            "{}_{}.{}",
            stem.to_string_lossy(),
            counter,
            ext.to_string_lossy()
        ),
        _ => format!("{}_{}", file_name, counter),
    }
}

/// Creates the destination directory and any missing parents.
pub fn ensure_dir(dir: &Path) -> DestinationResult<()> {
    fs::create_dir_all(dir).map_err(|e| DestinationError::DirectoryCreationFailed {
        path: dir.to_path_buf(),
        source: e,
    })
}

/// Moves a file, falling back to copy and delete when a rename is not possible.
///
/// Scratch directories often live on a different filesystem than the output
/// root, where `rename` fails.
pub fn move_file(source: &Path, destination: &Path) -> DestinationResult<()> {
    if fs::rename(source, destination).is_ok() {
        return Ok(());
    }

    let to_move_error = |e: io::Error| DestinationError::FileMoveFailure {
        source: source.to_path_buf(),
        destination: destination.to_path_buf(),
        source_error: e,
    };

    fs::copy(source, destination).map_err(to_move_error)?;
    fs::remove_file(source).map_err(to_move_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_path_with_sub_genre() {
        let dir = resolve_path(Path::new("/out"), "Racing", Some("Arcade"), "Pitstop");
        assert_eq!(dir, PathBuf::from("/out/Racing/Arcade/Pitstop"));
    }

    #[test]
    fn test_resolve_path_without_sub_genre() {
        let dir = resolve_path(Path::new("/out"), "Racing", None, "Pitstop");
        assert_eq!(dir, PathBuf::from("/out/Racing/Pitstop"));
    }

    #[test]
    fn test_numbered_name() {
        assert_eq!(numbered_name("foo.txt", 1), "foo_1.txt");
        assert_eq!(numbered_name("game.tar.gz", 2), "game.tar_2.gz");
        assert_eq!(numbered_name("README", 3), "README_3");
        assert_eq!(numbered_name(".hidden", 1), ".hidden_1");
    }

    #[test]
    fn test_claim_free_name_is_unchanged() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut resolver = DestinationResolver::new();

        let path = resolver.claim(temp_dir.path(), "foo.txt");
        assert_eq!(path, temp_dir.path().join("foo.txt"));
    }

    #[test]
    fn test_claim_avoids_existing_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("foo.txt"), "existing").expect("Failed to write file");
        let mut resolver = DestinationResolver::new();

        assert_eq!(
            resolver.claim(temp_dir.path(), "foo.txt"),
            temp_dir.path().join("foo_1.txt")
        );
        assert_eq!(
            resolver.claim(temp_dir.path(), "foo.txt"),
            temp_dir.path().join("foo_2.txt")
        );
    }

    #[test]
    fn test_resolve_batch_avoids_self_collision() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut resolver = DestinationResolver::new();
        let files = vec![
            ("disk.d64".to_string(), PathBuf::from("/a/disk.d64")),
            ("disk.d64".to_string(), PathBuf::from("/b/disk.d64")),
            ("readme.txt".to_string(), PathBuf::from("/a/readme.txt")),
        ];

        let resolved = resolver.resolve_file_destinations(&files, temp_dir.path());
        assert_eq!(
            resolved,
            vec![
                (PathBuf::from("/a/disk.d64"), "disk.d64".to_string()),
                (PathBuf::from("/b/disk.d64"), "disk_1.d64".to_string()),
                (PathBuf::from("/a/readme.txt"), "readme.txt".to_string()),
            ]
        );
    }

    #[test]
    fn test_claims_are_per_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut resolver = DestinationResolver::new();

        let first = resolver.claim(&temp_dir.path().join("a"), "foo.txt");
        let second = resolver.claim(&temp_dir.path().join("b"), "foo.txt");
        assert_eq!(first.file_name(), second.file_name());
    }

    #[test]
    fn test_ensure_dir_creates_nested_directories() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path().join("Racing").join("Arcade").join("Pitstop");

        ensure_dir(&dir).expect("Failed to create directory");
        assert!(dir.is_dir());
        // Existing directories are fine
        ensure_dir(&dir).expect("Existing directory should be accepted");
    }

    #[test]
    fn test_move_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("game.prg");
        let destination = temp_dir.path().join("moved.prg");
        fs::write(&source, "data").expect("Failed to write file");

        move_file(&source, &destination).expect("Failed to move file");
        assert!(!source.exists());
        assert_eq!(fs::read_to_string(&destination).unwrap(), "data");
    }

    #[test]
    fn test_move_missing_file_fails() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let result = move_file(
            &temp_dir.path().join("missing.prg"),
            &temp_dir.path().join("out.prg"),
        );
        assert!(matches!(
            result,
            Err(DestinationError::FileMoveFailure { .. })
        ));
    }
}
