//! Point-in-time cache statistics.

use crate::primitives::Language;
use serde::{Deserialize, Serialize};

/// Number of composite records stored for one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageCount {
    /// Language code as stored.
    pub language: Box<str>,
    /// Record count.
    pub count: u64,
}

/// Composite cache statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// All stored composites.
    pub total: u64,
    /// Composites younger than the freshness window.
    pub valid: u64,
    /// `total - valid`.
    pub expired: u64,
    /// Per-language counts, largest first.
    pub per_language: Vec<LanguageCount>,
}

impl CacheStats {
    /// Build stats from raw counts. Languages are ordered by count, then code.
    #[must_use]
    pub fn new(total: u64, valid: u64, per_language: Vec<LanguageCount>) -> Self {
        let mut per_language = per_language;
        per_language.sort_by(|left, right| {
            right
                .count
                .cmp(&left.count)
                .then_with(|| left.language.cmp(&right.language))
        });
        Self {
            total,
            valid,
            expired: total.saturating_sub(valid),
            per_language,
        }
    }

    /// Count for one language, zero when absent.
    #[must_use]
    pub fn count_for(&self, language: Language) -> u64 {
        self.per_language
            .iter()
            .find(|entry| entry.language.as_ref() == language.as_str())
            .map_or(0, |entry| entry.count)
    }
}
