//! Run configuration.
//!
//! Settings are read from a TOML file and can be overridden from the command
//! line. Every key is optional:
//!
//! ```toml
//! [organize]
//! language = "English"
//! case_sensitive_language = true
//! temp_dir = "/tmp/retrosort"
//! archive_extensions = ["zip", "7z"]
//! descriptor_extensions = ["nfo"]
//!
//! [filters]
//! enable_hidden_files = true
//!
//! [filters.exclude]
//! filenames = ["Thumbs.db"]
//! extensions = ["bak"]
//! patterns = ["*.tmp"]
//! regex = []
//! ```
//!
//! Filters decide which extracted files are moved to the destination. Files
//! they exclude are discarded together with the scratch directory.

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors that can occur during configuration loading.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided with the actual error reason.
    InvalidRegexPattern {
        /// The regex pattern that failed to compile.
        pattern: String,
        /// The reason why the pattern is invalid.
        reason: String,
    },
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::InvalidGlobPattern(pattern) => {
                write!(f, "Invalid glob pattern '{}'", pattern)
            }
            ConfigError::InvalidRegexPattern { pattern, reason } => {
                write!(f, "Invalid regex pattern '{}': {}", pattern, reason)
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Top-level configuration file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub organize: OrganizeSettings,

    #[serde(default)]
    pub filters: FilterRules,
}

/// Settings for the organize run itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizeSettings {
    /// Language that descriptors must declare. Defaults to "English".
    #[serde(default = "default_language")]
    pub language: String,

    /// Whether the language match respects case. Defaults to true.
    #[serde(default = "default_true")]
    pub case_sensitive_language: bool,

    /// Root for per-archive scratch directories.
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,

    /// Extensions treated as archives when scanning the input tree.
    #[serde(default = "default_archive_extensions")]
    pub archive_extensions: Vec<String>,

    /// Extensions treated as descriptor files inside an archive.
    #[serde(default = "default_descriptor_extensions")]
    pub descriptor_extensions: Vec<String>,
}

fn default_language() -> String {
    "English".to_string()
}

fn default_true() -> bool {
    true
}

fn default_archive_extensions() -> Vec<String> {
    vec!["zip".to_string(), "7z".to_string()]
}

fn default_descriptor_extensions() -> Vec<String> {
    vec!["nfo".to_string()]
}

impl Default for OrganizeSettings {
    fn default() -> Self {
        Self {
            language: default_language(),
            case_sensitive_language: true,
            temp_dir: None,
            archive_extensions: default_archive_extensions(),
            descriptor_extensions: default_descriptor_extensions(),
        }
    }
}

impl OrganizeSettings {
    /// Scratch root, falling back to `<system temp>/retrosort`.
    pub fn temp_root(&self) -> PathBuf {
        self.temp_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("retrosort"))
    }
}

/// Rules deciding which extracted files are moved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether to move hidden files (starting with "."). Defaults to true.
    #[serde(default = "default_true")]
    pub enable_hidden_files: bool,

    #[serde(default)]
    pub exclude: ExcludeRules,
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            enable_hidden_files: true,
            exclude: ExcludeRules::default(),
        }
    }
}

/// Rules for leaving extracted files behind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g., "Thumbs.db", "file_id.diz").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns matched against the file name (e.g., "*.tmp").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// File extensions to exclude, compared case-insensitively.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

impl Config {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.retrosortrc.toml` in the current directory
    /// 3. Look for `~/.config/retrosort/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read,
    /// or if any discovered file is not valid TOML.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".retrosortrc.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("retrosort")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }
}

/// Pre-compiled filter rules.
#[derive(Debug)]
pub struct CompiledFilters {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
}

impl CompiledFilters {
    /// Compile filter rules.
    ///
    /// # Errors
    ///
    /// Returns an error if any glob or regex patterns are invalid.
    pub fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = rules
            .exclude
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns,
            exclude_regexes,
        })
    }

    /// Check if an extracted file should be moved to the destination.
    pub fn should_include(&self, file_path: &Path) -> bool {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if !self.enable_hidden_files && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = file_path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.exclude_extensions.contains(&ext_lower) {
                return false;
            }
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches(&file_name))
        {
            return false;
        }

        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
    }
}

impl Default for CompiledFilters {
    fn default() -> Self {
        Self {
            enable_hidden_files: true,
            exclude_filenames: HashSet::new(),
            exclude_extensions: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
        }
    }
}

/// Returns true if the path's extension is in `extensions`, ignoring case.
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| {
            extensions
                .iter()
                .any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(&ext))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules_with(exclude: ExcludeRules) -> FilterRules {
        FilterRules {
            enable_hidden_files: true,
            exclude,
        }
    }

    #[test]
    fn test_default_settings() {
        let config = Config::default();
        assert_eq!(config.organize.language, "English");
        assert!(config.organize.case_sensitive_language);
        assert_eq!(config.organize.archive_extensions, vec!["zip", "7z"]);
        assert_eq!(config.organize.descriptor_extensions, vec!["nfo"]);
        assert!(config.filters.enable_hidden_files);
    }

    #[test]
    fn test_default_temp_root() {
        let settings = OrganizeSettings::default();
        assert_eq!(settings.temp_root(), std::env::temp_dir().join("retrosort"));
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = Config::from_toml(
            r#"
            [organize]
            language = "German"
            temp_dir = "/scratch"

            [filters.exclude]
            filenames = ["file_id.diz"]
            "#,
        )
        .expect("Config should parse");

        assert_eq!(config.organize.language, "German");
        assert_eq!(config.organize.temp_root(), PathBuf::from("/scratch"));
        assert_eq!(config.organize.descriptor_extensions, vec!["nfo"]);
        assert_eq!(config.filters.exclude.filenames, vec!["file_id.diz"]);
    }

    #[test]
    fn test_parse_empty_toml_uses_defaults() {
        let config = Config::from_toml("").expect("Empty config should parse");
        assert_eq!(config.organize.language, "English");
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let result = Config::from_toml("[organize\nlanguage = ");
        assert!(matches!(result, Err(ConfigError::ConfigInvalid(_))));
    }

    #[test]
    fn test_explicit_missing_config_file() {
        let result = Config::load(Some(Path::new("/non/existent/retrosort.toml")));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }

    #[test]
    fn test_default_filters_include_everything() {
        let compiled = CompiledFilters::new(&FilterRules::default()).unwrap();
        assert!(compiled.should_include(Path::new("/scratch/game.d64")));
        assert!(compiled.should_include(Path::new("/scratch/.hidden")));
    }

    #[test]
    fn test_hidden_files_excluded_when_disabled() {
        let rules = FilterRules {
            enable_hidden_files: false,
            exclude: ExcludeRules::default(),
        };
        let compiled = CompiledFilters::new(&rules).unwrap();
        assert!(!compiled.should_include(Path::new("/scratch/.DS_Store")));
        assert!(compiled.should_include(Path::new("/scratch/game.d64")));
    }

    #[test]
    fn test_exclude_exact_filename() {
        let compiled = CompiledFilters::new(&rules_with(ExcludeRules {
            filenames: vec!["Thumbs.db".to_string()],
            ..Default::default()
        }))
        .unwrap();

        assert!(!compiled.should_include(Path::new("/scratch/Thumbs.db")));
        assert!(compiled.should_include(Path::new("/scratch/game.d64")));
    }

    #[test]
    fn test_exclude_extensions_case_insensitive() {
        let compiled = CompiledFilters::new(&rules_with(ExcludeRules {
            extensions: vec!["bak".to_string(), ".tmp".to_string()],
            ..Default::default()
        }))
        .unwrap();

        assert!(!compiled.should_include(Path::new("file.bak")));
        assert!(!compiled.should_include(Path::new("file.BAK")));
        assert!(!compiled.should_include(Path::new("file.tmp")));
        assert!(compiled.should_include(Path::new("file.txt")));
    }

    #[test]
    fn test_exclude_glob_matches_file_name() {
        let compiled = CompiledFilters::new(&rules_with(ExcludeRules {
            patterns: vec!["*.diz".to_string()],
            ..Default::default()
        }))
        .unwrap();

        assert!(!compiled.should_include(Path::new("/scratch/retrosort-abc/file_id.diz")));
        assert!(compiled.should_include(Path::new("/scratch/retrosort-abc/game.nfo")));
    }

    #[test]
    fn test_exclude_regex() {
        let compiled = CompiledFilters::new(&rules_with(ExcludeRules {
            regex: vec![r"^cracktro_.*$".to_string()],
            ..Default::default()
        }))
        .unwrap();

        assert!(!compiled.should_include(Path::new("cracktro_fairlight.prg")));
        assert!(compiled.should_include(Path::new("game.prg")));
    }

    #[test]
    fn test_invalid_regex_returns_error() {
        let result = CompiledFilters::new(&rules_with(ExcludeRules {
            regex: vec!["[invalid(".to_string()],
            ..Default::default()
        }));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidRegexPattern { .. })
        ));
    }

    #[test]
    fn test_invalid_glob_returns_error() {
        let result = CompiledFilters::new(&rules_with(ExcludeRules {
            patterns: vec!["[invalid".to_string()],
            ..Default::default()
        }));
        assert!(matches!(result, Err(ConfigError::InvalidGlobPattern(_))));
    }

    #[test]
    fn test_has_extension() {
        let exts = vec!["zip".to_string(), "7z".to_string()];
        assert!(has_extension(Path::new("a/game.zip"), &exts));
        assert!(has_extension(Path::new("a/GAME.ZIP"), &exts));
        assert!(has_extension(Path::new("game.7z"), &exts));
        assert!(!has_extension(Path::new("game.rar"), &exts));
        assert!(!has_extension(Path::new("zip"), &exts));
    }
}
