//! Language filtering for parsed descriptors.
//!
//! Matching is substring containment, not equality. A descriptor declaring
//! `"English/German"` therefore matches a request for `"English"`. This is a
//! known approximation: `"Swedish"` also matches `"ish"`, while
//! `"Multilanguage"` never matches `"English"`.

use crate::descriptor::GameRecord;

/// Returns true if `requested` is contained in the declared language.
///
/// A record without a language never matches.
///
/// # Examples
///
/// ```
/// use retrosort::language::matches;
///
/// assert!(matches(Some("English/German"), "English"));
/// assert!(!matches(Some("German"), "English"));
/// assert!(!matches(None, "English"));
/// ```
pub fn matches(language: Option<&str>, requested: &str) -> bool {
    language.is_some_and(|lang| lang.contains(requested))
}

/// A configured language constraint.
#[derive(Debug, Clone)]
pub struct LanguageFilter {
    requested: String,
    case_sensitive: bool,
}

impl LanguageFilter {
    /// Creates a case-sensitive filter.
    pub fn new(requested: impl Into<String>) -> Self {
        Self {
            requested: requested.into(),
            case_sensitive: true,
        }
    }

    /// Sets whether the containment test respects case.
    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Checks a declared language against this filter.
    pub fn matches(&self, language: Option<&str>) -> bool {
        if self.case_sensitive {
            matches(language, &self.requested)
        } else {
            let lowered = language.map(str::to_lowercase);
            matches(lowered.as_deref(), &self.requested.to_lowercase())
        }
    }

    /// Checks a parsed record against this filter.
    pub fn accepts(&self, record: &GameRecord) -> bool {
        self.matches(record.language.as_deref())
    }
}

impl Default for LanguageFilter {
    fn default() -> Self {
        Self::new("English")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_language_never_matches() {
        assert!(!matches(None, "English"));
        assert!(!LanguageFilter::default().matches(None));
    }

    #[test]
    fn test_substring_containment() {
        assert!(matches(Some("English"), "English"));
        assert!(matches(Some("English/German"), "English"));
        assert!(!matches(Some("German"), "English"));
    }

    #[test]
    fn test_known_approximations_are_preserved() {
        assert!(matches(Some("Swedish"), "ish"));
        assert!(!matches(Some("Multilanguage"), "English"));
    }

    #[test]
    fn test_case_sensitive_by_default() {
        let filter = LanguageFilter::new("English");
        assert!(!filter.matches(Some("english")));
        assert!(filter.matches(Some("English")));
    }

    #[test]
    fn test_case_insensitive_option() {
        let filter = LanguageFilter::new("English").case_sensitive(false);
        assert!(filter.matches(Some("ENGLISH/german")));
        assert!(!filter.matches(Some("German")));
    }

    #[test]
    fn test_accepts_record() {
        let record = GameRecord {
            language: Some("English".to_string()),
            ..Default::default()
        };
        assert!(LanguageFilter::default().accepts(&record));
        assert!(!LanguageFilter::new("German").accepts(&record));
    }
}
