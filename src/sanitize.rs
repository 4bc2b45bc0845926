//! Path segment sanitization.
//!
//! Descriptor text is free-form and frequently carries characters that cannot
//! appear in a folder name. Brackets are removed as well, since descriptors
//! wrap disambiguating suffixes such as `[a]` or `[cr XYZ]` in them.
//!
//! # Examples
//!
//! ```
//! use retrosort::sanitize::sanitize;
//!
//! assert_eq!(sanitize("Pitstop [a]"), "Pitstop a");
//! assert_eq!(sanitize("  Shoot'em   Up.. "), "Shoot'em Up");
//! assert_eq!(sanitize("[]"), "");
//! ```

/// Characters removed from every path segment.
pub const FORBIDDEN_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|', '[', ']'];

/// Turns free text into a single filesystem-safe path segment.
///
/// Forbidden characters and control characters are dropped, whitespace runs
/// collapse to one space, and leading/trailing spaces and periods are trimmed.
/// The result may be empty; callers must treat an empty segment as invalid.
pub fn sanitize(raw: &str) -> String {
    let stripped: String = raw
        .chars()
        .filter(|c| !FORBIDDEN_CHARS.contains(c) && !(c.is_control() && !c.is_whitespace()))
        .collect();

    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    collapsed
        .trim_matches(|c: char| c == ' ' || c == '.')
        .to_string()
}
