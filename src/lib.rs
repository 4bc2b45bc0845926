//! retrosort - Sort archived retro games into genre folders
//!
//! This library reads the descriptor file shipped inside each game archive,
//! filters games by declared language, turns the free-text name and genre
//! fields into safe folder names, and moves the extracted files into a
//! `genre/sub-genre/name` hierarchy without overwriting anything.

pub mod cli;
pub mod config;
pub mod descriptor;
pub mod destination;
pub mod extract;
pub mod language;
pub mod organizer;
pub mod output;
pub mod sanitize;

pub use config::{CompiledFilters, Config, ConfigError};
pub use descriptor::GameRecord;
pub use destination::DestinationResolver;
pub use extract::{ArchiveExtractor, DefaultExtractor};
pub use language::LanguageFilter;
pub use organizer::{ArchiveOutcome, Organizer, RunStatistics, SkipReason};

pub use cli::{Args, run_cli};
