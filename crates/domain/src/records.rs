//! Typed records: catalog items, enrichment records, and composite details.
//!
//! Enrichment that was looked up and is not available is `None`. Records that
//! were never looked up simply do not exist in their store.

use crate::primitives::{
    CacheKey, EpochMillis, Language, PrimitiveError, SoundtrackKey, SubjectId, trimmed_non_empty,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Base entity of a detail page, owned by the external catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    /// Catalog identifier.
    #[serde(alias = "tconst")]
    pub id: SubjectId,
    /// Display title.
    pub title: Box<str>,
    /// Release year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// Director field as stored in the catalog; may name several people.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub director: Option<Box<str>>,
    /// Remaining catalog attributes, carried through untouched.
    #[serde(flatten)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl CatalogItem {
    /// Build a catalog item with no extra attributes.
    #[must_use]
    pub fn new(
        id: SubjectId,
        title: impl Into<Box<str>>,
        year: Option<i32>,
        director: Option<&str>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            year,
            director: director.map(Into::into),
            attributes: BTreeMap::new(),
        }
    }

    /// Re-validate an item that arrived through deserialization.
    pub fn validated(self) -> Result<Self, PrimitiveError> {
        let id = SubjectId::parse(self.id.as_str())?;
        let Some(title) = trimmed_non_empty(&self.title) else {
            return Err(PrimitiveError::EmptyTitle);
        };
        Ok(Self {
            id,
            title: title.into(),
            ..self
        })
    }

    /// Director field, if present and non-blank.
    #[must_use]
    pub fn director_name(&self) -> Option<&str> {
        self.director.as_deref().and_then(trimmed_non_empty)
    }

    /// Key of this item's soundtrack enrichment record.
    #[must_use]
    pub fn soundtrack_key(&self) -> SoundtrackKey {
        SoundtrackKey::derive(&self.title, self.year)
    }
}

/// Director enrichment, keyed by name, stored in the production language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectorRecord {
    /// Director name (natural key).
    pub name: Box<str>,
    /// Biography text.
    #[serde(alias = "bio")]
    pub biography: Box<str>,
    /// Portrait URL.
    #[serde(default)]
    pub photo: Option<Box<str>>,
}

/// One soundtrack entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Track title.
    pub title: Box<str>,
    /// Performing artist or composer.
    pub artist: Box<str>,
    /// Role of the track in the film.
    #[serde(default)]
    pub description: Box<str>,
    /// Streaming catalog id, when matched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spotify_id: Option<Box<str>>,
    /// Preview clip URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<Box<str>>,
    /// Public track page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_url: Option<Box<str>>,
    /// Album name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<Box<str>>,
    /// Track length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// Soundtrack enrichment, keyed by `(title, year)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundtrackRecord {
    /// Natural key.
    pub key: SoundtrackKey,
    /// Film title.
    pub title: Box<str>,
    /// Film year.
    #[serde(default)]
    pub year: Option<i32>,
    /// Film director field.
    #[serde(default)]
    pub director: Option<Box<str>>,
    /// Ordered track list.
    pub tracks: Vec<Track>,
    /// Description of the soundtrack.
    #[serde(default)]
    pub description: Box<str>,
    /// Which pipeline produced the record (e.g. `gpt_spotify`).
    pub provenance: Box<str>,
}

/// The cached, client-facing detail document for one subject and language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeRecord {
    cache_key: CacheKey,
    /// Subject of the detail page.
    pub subject_id: SubjectId,
    /// Language the enrichment text is served in.
    pub language: Language,
    /// Catalog attributes captured at build time.
    pub base: CatalogItem,
    /// Director enrichment; `None` when unavailable.
    pub director: Option<DirectorRecord>,
    /// Soundtrack enrichment; `None` when unavailable.
    pub soundtrack: Option<SoundtrackRecord>,
    /// Assembly time.
    pub created_at_ms: EpochMillis,
}

impl CompositeRecord {
    /// Assemble a composite; the cache key is derived from the base item.
    #[must_use]
    pub fn assemble(
        base: CatalogItem,
        language: Language,
        director: Option<DirectorRecord>,
        soundtrack: Option<SoundtrackRecord>,
        created_at_ms: EpochMillis,
    ) -> Self {
        Self {
            cache_key: CacheKey::derive(&base.id, language),
            subject_id: base.id.clone(),
            language,
            base,
            director,
            soundtrack,
            created_at_ms,
        }
    }

    /// Derived cache key.
    #[must_use]
    pub const fn cache_key(&self) -> &CacheKey {
        &self.cache_key
    }

    /// Returns true when the key stored with the record matches its subject and
    /// language.
    #[must_use]
    pub fn has_consistent_key(&self) -> bool {
        self.cache_key == CacheKey::derive(&self.subject_id, self.language)
    }

    /// Compare two composites ignoring their assembly time.
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.cache_key == other.cache_key
            && self.subject_id == other.subject_id
            && self.language == other.language
            && self.base == other.base
            && self.director == other.director
            && self.soundtrack == other.soundtrack
    }
}
