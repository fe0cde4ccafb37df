//! Persistent document store boundary contract.
//!
//! One store holds three collections: composite detail records and the two
//! enrichment record kinds. Every write is a full-document upsert keyed by the
//! natural key, so concurrent writers race benignly (last write wins).

use crate::BoxFuture;
use cinedex_domain::EpochMillis;
use cinedex_shared::{RequestContext, Result};
use std::fmt;

/// Named document collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    /// Composite detail records keyed by cache key.
    Composites,
    /// Director records keyed by name.
    Directors,
    /// Soundtrack records keyed by `(title, year)`.
    Soundtracks,
}

impl Collection {
    /// Every collection.
    pub const ALL: [Self; 3] = [Self::Composites, Self::Directors, Self::Soundtracks];

    /// Stable collection name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Composites => "composites",
            Self::Directors => "directors",
            Self::Soundtracks => "soundtracks",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A stored document: natural key, indexed fields, and a JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    /// Natural key, unique per collection.
    pub key: Box<str>,
    /// Indexed subject id (composites only).
    pub subject_id: Option<Box<str>>,
    /// Indexed language code (composites only).
    pub language: Option<Box<str>>,
    /// Write time.
    pub created_at_ms: EpochMillis,
    /// Full record.
    pub body: serde_json::Value,
}

/// Conjunctive filter over indexed fields. The default matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFilter {
    /// Match this subject id.
    pub subject_id: Option<Box<str>>,
    /// Match this language code.
    pub language: Option<Box<str>>,
    /// Match `created_at_ms <= value`.
    pub created_at_or_before_ms: Option<EpochMillis>,
    /// Match `created_at_ms > value`.
    pub created_after_ms: Option<EpochMillis>,
}

impl DocumentFilter {
    /// Filter matching every document.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to one subject.
    #[must_use]
    pub fn subject(mut self, subject_id: impl Into<Box<str>>) -> Self {
        self.subject_id = Some(subject_id.into());
        self
    }

    /// Restrict to one language.
    #[must_use]
    pub fn language(mut self, language: impl Into<Box<str>>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Restrict to documents written at or before `cutoff_ms`.
    #[must_use]
    pub const fn created_at_or_before(mut self, cutoff_ms: EpochMillis) -> Self {
        self.created_at_or_before_ms = Some(cutoff_ms);
        self
    }

    /// Restrict to documents written after `cutoff_ms`.
    #[must_use]
    pub const fn created_after(mut self, cutoff_ms: EpochMillis) -> Self {
        self.created_after_ms = Some(cutoff_ms);
        self
    }

    /// Evaluate the filter against a document.
    #[must_use]
    pub fn matches(&self, document: &StoredDocument) -> bool {
        let field_matches = |expected: Option<&str>, actual: Option<&str>| {
            expected.is_none_or(|expected| actual == Some(expected))
        };

        field_matches(self.subject_id.as_deref(), document.subject_id.as_deref())
            && field_matches(self.language.as_deref(), document.language.as_deref())
            && self
                .created_at_or_before_ms
                .is_none_or(|cutoff| document.created_at_ms <= cutoff)
            && self
                .created_after_ms
                .is_none_or(|cutoff| document.created_at_ms > cutoff)
    }
}

/// Boundary contract for the persistent document store.
pub trait DocumentStorePort: Send + Sync {
    /// Fetch one document by key.
    fn get(
        &self,
        ctx: &RequestContext,
        collection: Collection,
        key: Box<str>,
    ) -> BoxFuture<'_, Result<Option<StoredDocument>>>;

    /// Insert or fully replace a document.
    fn put(
        &self,
        ctx: &RequestContext,
        collection: Collection,
        document: StoredDocument,
    ) -> BoxFuture<'_, Result<()>>;

    /// Delete one document; returns whether it existed.
    fn delete_one(
        &self,
        ctx: &RequestContext,
        collection: Collection,
        key: Box<str>,
    ) -> BoxFuture<'_, Result<bool>>;

    /// Delete every matching document; returns how many were removed.
    fn delete_many(
        &self,
        ctx: &RequestContext,
        collection: Collection,
        filter: DocumentFilter,
    ) -> BoxFuture<'_, Result<u64>>;

    /// Count matching documents.
    fn count(
        &self,
        ctx: &RequestContext,
        collection: Collection,
        filter: DocumentFilter,
    ) -> BoxFuture<'_, Result<u64>>;

    /// Count matching documents grouped by language code.
    ///
    /// Documents without a language are not reported.
    fn count_by_language(
        &self,
        ctx: &RequestContext,
        collection: Collection,
        filter: DocumentFilter,
    ) -> BoxFuture<'_, Result<Vec<(Box<str>, u64)>>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(subject: &str, language: &str, created_at_ms: EpochMillis) -> StoredDocument {
        StoredDocument {
            key: format!("{subject}_{language}").into_boxed_str(),
            subject_id: Some(subject.into()),
            language: Some(language.into()),
            created_at_ms,
            body: serde_json::Value::Null,
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(DocumentFilter::all().matches(&document("m1", "pt", 0)));
    }

    #[test]
    fn filters_are_conjunctive() {
        let filter = DocumentFilter::all().subject("m1").language("en");
        assert!(filter.matches(&document("m1", "en", 0)));
        assert!(!filter.matches(&document("m1", "pt", 0)));
        assert!(!filter.matches(&document("m2", "en", 0)));
    }

    #[test]
    fn time_bounds_split_at_the_cutoff() {
        let stale = DocumentFilter::all().created_at_or_before(100);
        let fresh = DocumentFilter::all().created_after(100);
        assert!(stale.matches(&document("m1", "pt", 100)));
        assert!(!fresh.matches(&document("m1", "pt", 100)));
        assert!(fresh.matches(&document("m1", "pt", 101)));
    }

    #[test]
    fn documents_without_indexed_fields_fail_field_filters() {
        let mut bare = document("m1", "pt", 0);
        bare.subject_id = None;
        assert!(!DocumentFilter::all().subject("m1").matches(&bare));
    }
}
