//! Domain primitives with validated constructors.

use cinedex_shared::{ErrorCode, ErrorEnvelope};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Validation failures for domain primitives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimitiveError {
    /// `SubjectId` is empty after trimming.
    InvalidSubjectId {
        /// Length of the raw input before trimming.
        input_length: usize,
    },
    /// Language code outside the supported set.
    UnsupportedLanguage {
        /// Trimmed input that failed to parse.
        input: String,
    },
    /// Catalog title is empty after trimming.
    EmptyTitle,
}

impl PrimitiveError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidSubjectId { .. } => ErrorCode::new("domain", "invalid_subject_id"),
            Self::UnsupportedLanguage { .. } => ErrorCode::new("domain", "unsupported_language"),
            Self::EmptyTitle => ErrorCode::new("domain", "invalid_title"),
        }
    }
}

impl fmt::Display for PrimitiveError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSubjectId { .. } => formatter.write_str("subjectId must be non-empty"),
            Self::UnsupportedLanguage { input } => write!(
                formatter,
                "unsupported language `{input}` (expected one of: {})",
                Language::ALL
                    .iter()
                    .map(|language| language.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Self::EmptyTitle => formatter.write_str("title must be non-empty"),
        }
    }
}

impl std::error::Error for PrimitiveError {}

impl From<PrimitiveError> for ErrorEnvelope {
    fn from(error: PrimitiveError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());
        match error {
            PrimitiveError::InvalidSubjectId { input_length } => {
                envelope.with_metadata("input_length", input_length.to_string())
            },
            PrimitiveError::UnsupportedLanguage { input } => envelope.with_metadata("input", input),
            PrimitiveError::EmptyTitle => envelope,
        }
    }
}

/// Identifier of a catalog item (the subject of a detail page).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(Box<str>);

impl SubjectId {
    /// Parse a `SubjectId` from user input.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, PrimitiveError> {
        let raw = input.as_ref();
        let Some(trimmed) = trimmed_non_empty(raw) else {
            return Err(PrimitiveError::InvalidSubjectId {
                input_length: raw.len(),
            });
        };

        Ok(Self(trimmed.to_owned().into_boxed_str()))
    }

    /// Access the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SubjectId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Supported detail-page languages.
///
/// Enrichment text is produced in [`Language::PRODUCTION`] and translated on
/// read for every other language.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Portuguese.
    #[default]
    Pt,
    /// English.
    En,
    /// Spanish.
    Es,
    /// French.
    Fr,
}

impl Language {
    /// Language that providers produce enrichment text in.
    pub const PRODUCTION: Self = Self::Pt;

    /// Every supported language.
    pub const ALL: [Self; 4] = [Self::Pt, Self::En, Self::Es, Self::Fr];

    /// Parse a language code (`pt`, `en`, `es`, `fr`), case-insensitive.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, PrimitiveError> {
        let trimmed = input.as_ref().trim();
        Self::ALL
            .into_iter()
            .find(|language| language.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| PrimitiveError::UnsupportedLanguage {
                input: trimmed.to_owned(),
            })
    }

    /// Stable lowercase code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pt => "pt",
            Self::En => "en",
            Self::Es => "es",
            Self::Fr => "fr",
        }
    }

    /// English name, used when instructing translators.
    #[must_use]
    pub const fn english_name(self) -> &'static str {
        match self {
            Self::Pt => "Portuguese",
            Self::En => "English",
            Self::Es => "Spanish",
            Self::Fr => "French",
        }
    }

    /// Returns true when text must be translated for this language.
    #[must_use]
    pub fn needs_translation(self) -> bool {
        self != Self::PRODUCTION
    }
}

impl FromStr for Language {
    type Err = PrimitiveError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Key of a composite detail record: always `<subjectId>_<language>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(Box<str>);

impl CacheKey {
    /// Derive the cache key for a subject in a language.
    #[must_use]
    pub fn derive(subject_id: &SubjectId, language: Language) -> Self {
        Self(format!("{subject_id}_{language}").into_boxed_str())
    }

    /// Access the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Key of a soundtrack enrichment record: `<title>_<year>`, or the bare title
/// when the year is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SoundtrackKey(Box<str>);

impl SoundtrackKey {
    /// Derive the soundtrack key for a title and optional year.
    #[must_use]
    pub fn derive(title: &str, year: Option<i32>) -> Self {
        let title = title.trim();
        let key = match year {
            Some(year) => format!("{title}_{year}"),
            None => title.to_owned(),
        };
        Self(key.into_boxed_str())
    }

    /// Access the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SoundtrackKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Milliseconds since the Unix epoch.
pub type EpochMillis = i64;

pub(crate) fn trimmed_non_empty(input: &str) -> Option<&str> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_parses_case_insensitively() {
        assert_eq!(Language::parse(" EN "), Ok(Language::En));
        assert_eq!("fr".parse::<Language>(), Ok(Language::Fr));
        assert!(matches!(
            Language::parse("de"),
            Err(PrimitiveError::UnsupportedLanguage { .. })
        ));
    }

    #[test]
    fn production_language_needs_no_translation() {
        assert!(!Language::Pt.needs_translation());
        assert!(Language::En.needs_translation());
        assert_eq!(Language::default(), Language::Pt);
    }

    #[test]
    fn cache_key_joins_subject_and_language() -> Result<(), PrimitiveError> {
        let key = CacheKey::derive(&SubjectId::parse("m1")?, Language::Pt);
        assert_eq!(key.as_str(), "m1_pt");
        Ok(())
    }

    #[test]
    fn soundtrack_key_omits_missing_year() {
        assert_eq!(
            SoundtrackKey::derive("Bladerunner", Some(1982)).as_str(),
            "Bladerunner_1982"
        );
        assert_eq!(SoundtrackKey::derive(" Bladerunner ", None).as_str(), "Bladerunner");
    }

    #[test]
    fn unsupported_language_lists_the_supported_set() {
        let message = PrimitiveError::UnsupportedLanguage {
            input: "de".into(),
        }
        .to_string();
        assert!(message.contains("pt, en, es, fr"));
    }
}
