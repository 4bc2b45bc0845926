//! Descriptor file parsing.
//!
//! A descriptor is a loosely structured text file shipped inside each archive.
//! Only three `Key: value` lines matter:
//!
//! ```text
//! Name: Pitstop
//! Genre: Racing - Arcade
//! Language: English
//! ```
//!
//! Keys are case-sensitive and must start at the beginning of a line. Every
//! other line is ignored.

use std::fs;
use std::path::Path;
use tracing::debug;

/// Separator between genre and sub-genre inside a `Genre:` value.
const SUB_GENRE_SEPARATOR: &str = " - ";

/// Metadata extracted from a descriptor file.
///
/// Absent fields are `None`; a key present with an empty value is `Some("")`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameRecord {
    pub name: Option<String>,
    pub genre: Option<String>,
    pub sub_genre: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Genre,
    Language,
}

/// Editors on Windows often save descriptors with a leading BOM.
const BYTE_ORDER_MARK: char = '\u{FEFF}';

/// Recognized keys, including the trailing colon.
const KEYS: &[(&str, Field)] = &[
    ("Name:", Field::Name),
    ("Genre:", Field::Genre),
    ("Language:", Field::Language),
];

/// Parses descriptor text into a [`GameRecord`].
///
/// The first occurrence of each key wins. A `Genre:` value containing
/// `" - "` is split on its first occurrence into genre and sub-genre.
///
/// # Examples
///
/// ```
/// use retrosort::descriptor::parse;
///
/// let record = parse("Name: Pitstop\nGenre: Racing - Arcade\nLanguage: English\n");
/// assert_eq!(record.name.as_deref(), Some("Pitstop"));
/// assert_eq!(record.genre.as_deref(), Some("Racing"));
/// assert_eq!(record.sub_genre.as_deref(), Some("Arcade"));
/// assert_eq!(record.language.as_deref(), Some("English"));
/// ```
pub fn parse(text: &str) -> GameRecord {
    let mut record = GameRecord::default();
    let mut genre_text: Option<String> = None;
    let text = text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(text);

    for line in text.lines() {
        let Some((field, value)) = match_key(line) else {
            continue;
        };

        let slot = match field {
            Field::Name => &mut record.name,
            Field::Language => &mut record.language,
            Field::Genre => &mut genre_text,
        };

        if slot.is_none() {
            *slot = Some(value.trim().to_string());
        }
    }

    if let Some(text) = genre_text {
        let (genre, sub_genre) = split_genre(&text);
        record.genre = Some(genre);
        record.sub_genre = sub_genre;
    }

    record
}

/// Reads and parses a descriptor file.
///
/// Returns `None` if the file cannot be read. Bytes that are not valid UTF-8
/// are replaced rather than rejected.
pub fn read_descriptor(path: &Path) -> Option<GameRecord> {
    match fs::read(path) {
        Ok(bytes) => Some(parse(&String::from_utf8_lossy(&bytes))),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "descriptor unreadable");
            None
        }
    }
}

fn match_key(line: &str) -> Option<(Field, &str)> {
    KEYS.iter()
        .find_map(|(key, field)| line.strip_prefix(key).map(|value| (*field, value)))
}

fn split_genre(text: &str) -> (String, Option<String>) {
    match text.split_once(SUB_GENRE_SEPARATOR) {
        Some((genre, sub_genre)) => (
            genre.trim().to_string(),
            Some(sub_genre.trim().to_string()),
        ),
        None => (text.to_string(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_all_fields() {
        let record = parse("Name: Pitstop\nGenre: Racing - Arcade\nLanguage: English");
        assert_eq!(
            record,
            GameRecord {
                name: Some("Pitstop".to_string()),
                genre: Some("Racing".to_string()),
                sub_genre: Some("Arcade".to_string()),
                language: Some("English".to_string()),
            }
        );
    }

    #[test]
    fn test_genre_without_separator() {
        let record = parse("Genre: Shoot'em Up");
        assert_eq!(record.genre.as_deref(), Some("Shoot'em Up"));
        assert_eq!(record.sub_genre, None);
    }

    #[test]
    fn test_genre_hyphen_without_spaces_is_not_split() {
        let record = parse("Genre: Beat-em-up");
        assert_eq!(record.genre.as_deref(), Some("Beat-em-up"));
        assert_eq!(record.sub_genre, None);

        let record = parse("Genre: Sports -Soccer");
        assert_eq!(record.genre.as_deref(), Some("Sports -Soccer"));
        assert_eq!(record.sub_genre, None);
    }

    #[test]
    fn test_genre_splits_on_first_separator() {
        let record = parse("Genre: Puzzle - Tiles - Mahjong");
        assert_eq!(record.genre.as_deref(), Some("Puzzle"));
        assert_eq!(record.sub_genre.as_deref(), Some("Tiles - Mahjong"));
    }

    #[test]
    fn test_missing_fields_stay_absent() {
        let record = parse("Publisher: Epyx\nYear: 1984\n");
        assert_eq!(record, GameRecord::default());
    }

    #[test]
    fn test_blank_value_is_present() {
        let record = parse("Name:   \nGenre: Racing");
        assert_eq!(record.name.as_deref(), Some(""));
        assert_eq!(record.genre.as_deref(), Some("Racing"));
    }

    #[test]
    fn test_leading_byte_order_mark_is_ignored() {
        let record = parse("\u{FEFF}Name: Pitstop\nGenre: Racing\n");
        assert_eq!(record.name.as_deref(), Some("Pitstop"));
        assert_eq!(record.genre.as_deref(), Some("Racing"));
    }

    #[test]
    fn test_read_descriptor_with_utf8_bom() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"\xEF\xBB\xBFName: Pitstop\r\nGenre: Racing\r\nLanguage: English\r\n")
            .unwrap();

        let record = read_descriptor(file.path()).unwrap();
        assert_eq!(record.name.as_deref(), Some("Pitstop"));
        assert_eq!(record.language.as_deref(), Some("English"));
    }

    #[test]
    fn test_first_match_wins() {
        let record = parse("Name: First\nName: Second\nLanguage: English\nLanguage: German");
        assert_eq!(record.name.as_deref(), Some("First"));
        assert_eq!(record.language.as_deref(), Some("English"));
    }

    #[test]
    fn test_keys_are_case_sensitive_and_line_anchored() {
        let record = parse("name: lower\n  Name: indented\nGame Name: prefixed\n");
        assert_eq!(record.name, None);
    }

    #[test]
    fn test_handles_crlf_line_endings() {
        let record = parse("Name: Pitstop\r\nGenre: Racing\r\nLanguage: English\r\n");
        assert_eq!(record.name.as_deref(), Some("Pitstop"));
        assert_eq!(record.genre.as_deref(), Some("Racing"));
        assert_eq!(record.language.as_deref(), Some("English"));
    }

    #[test]
    fn test_value_case_is_preserved() {
        let record = parse("Language: ENGLISH/german");
        assert_eq!(record.language.as_deref(), Some("ENGLISH/german"));
    }

    #[test]
    fn test_read_descriptor_missing_file() {
        assert_eq!(read_descriptor(Path::new("/non/existent/game.nfo")), None);
    }

    #[test]
    fn test_read_descriptor_non_utf8() {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(b"Name: Caf\xe9 Racer\nGenre: Racing\n")
            .expect("Failed to write descriptor");

        let record = read_descriptor(file.path()).expect("Descriptor should be readable");
        assert_eq!(record.name.as_deref(), Some("Caf\u{FFFD} Racer"));
        assert_eq!(record.genre.as_deref(), Some("Racing"));
    }
}
