//! API v1 DTO types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome category paired with every outward payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    /// The operation succeeded.
    Ok,
    /// The subject does not exist.
    NotFound,
    /// The caller's input was rejected before any I/O.
    BadInput,
    /// Store outage, cancellation, or a bug.
    InternalError,
}

impl StatusKind {
    /// Return the canonical wire string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::NotFound => "not_found",
            Self::BadInput => "bad_input",
            Self::InternalError => "internal_error",
        }
    }

    /// HTTP status code an HTTP surface would answer with.
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::NotFound => 404,
            Self::BadInput => 400,
            Self::InternalError => 500,
        }
    }

    /// Whether the status reports success.
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl std::fmt::Display for StatusKind {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Error kind exposed in API v1 responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiV1ErrorKind {
    /// Expected, user-facing errors (validation, not found, outages).
    Expected,
    /// Invariant violations that indicate a bug.
    Invariant,
}

/// API v1 error code string (stable contract value).
pub type ApiV1ErrorCode = String;

/// Metadata map attached to API v1 errors.
pub type ApiV1ErrorMeta = BTreeMap<String, String>;

/// API v1 error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiV1ErrorDto {
    /// Stable error code (e.g. `ERR_CORE_NOT_FOUND`).
    pub code: ApiV1ErrorCode,
    /// Human-readable message for the caller.
    pub message: String,
    /// Error category.
    pub kind: ApiV1ErrorKind,
    /// Optional metadata for debugging and correlation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ApiV1ErrorMeta>,
}

/// API v1 result wrapper for success or failure payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApiV1Result<T> {
    /// Success response.
    Ok {
        /// Indicates success.
        ok: bool,
        /// Success payload.
        data: T,
    },
    /// Error response.
    Err {
        /// Indicates failure.
        ok: bool,
        /// Error payload.
        error: ApiV1ErrorDto,
    },
}

impl<T> ApiV1Result<T> {
    /// Build a success response wrapper.
    #[must_use]
    pub const fn ok(data: T) -> Self {
        Self::Ok { ok: true, data }
    }

    /// Build an error response wrapper.
    #[must_use]
    pub const fn err(error: ApiV1ErrorDto) -> Self {
        Self::Err { ok: false, error }
    }

    /// Borrow the success payload, if any.
    #[must_use]
    pub const fn data(&self) -> Option<&T> {
        match self {
            Self::Ok { data, .. } => Some(data),
            Self::Err { .. } => None,
        }
    }

    /// Borrow the error payload, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&ApiV1ErrorDto> {
        match self {
            Self::Ok { .. } => None,
            Self::Err { error, .. } => Some(error),
        }
    }
}

/// Payload plus status, as returned by every outward operation.
pub type ApiV1Response<T> = (ApiV1Result<T>, StatusKind);

/// Request: read a detail record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ApiV1GetDetailRequestDto {
    /// Subject to read.
    pub subject_id: String,
    /// Language code; the configured default when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Request: drop cached detail records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ApiV1InvalidateDetailRequestDto {
    /// Subject whose records are dropped.
    pub subject_id: String,
    /// Only this language; every language when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Request: warm the whole catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ApiV1WarmAllRequestDto {
    /// Language code passed to providers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Worker bound; the configured default when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<u32>,
}

/// Request: warm one catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ApiV1WarmOneRequestDto {
    /// Item to warm.
    pub subject_id: String,
    /// Language code passed to providers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Request: warm a caller-supplied catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ApiV1WarmItemRequestDto {
    /// Raw catalog item (`id` or `tconst`, `title`, optional `year` and `director`).
    pub item: serde_json::Value,
    /// Language code passed to providers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Director enrichment as served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiV1DirectorDto {
    /// Director name, or the joined group names.
    pub name: String,
    /// Biography in the served language when translation succeeded.
    pub biography: String,
    /// Portrait URL.
    pub photo: Option<String>,
}

/// One soundtrack entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiV1TrackDto {
    /// Track title.
    pub title: String,
    /// Performing artist or composer.
    pub artist: String,
    /// Role of the track in the film.
    pub description: String,
    /// Streaming catalog id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spotify_id: Option<String>,
    /// Preview clip URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    /// Public track page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    /// Album name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    /// Track length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// Soundtrack enrichment as served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiV1SoundtrackDto {
    /// Film title.
    pub title: String,
    /// Film year.
    pub year: Option<i32>,
    /// Film director field.
    pub director: Option<String>,
    /// Ordered track list.
    pub tracks: Vec<ApiV1TrackDto>,
    /// Description of the soundtrack.
    pub description: String,
    /// Pipeline that produced the record.
    pub provenance: String,
}

/// A composite detail record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiV1DetailDto {
    /// Derived `<subjectId>_<language>` key.
    pub cache_key: String,
    /// Subject of the page.
    pub subject_id: String,
    /// Served language.
    pub language: String,
    /// Catalog attributes.
    pub base: serde_json::Map<String, serde_json::Value>,
    /// Director enrichment; `null` when unavailable.
    pub director: Option<ApiV1DirectorDto>,
    /// Soundtrack enrichment; `null` when unavailable.
    pub soundtrack: Option<ApiV1SoundtrackDto>,
    /// Assembly time (Unix ms).
    pub created_at_ms: i64,
}

/// Response: a served detail record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiV1GetDetailResponseDto {
    /// The composite.
    pub detail: ApiV1DetailDto,
    /// Whether the composite came from the cache.
    pub from_cache: bool,
    /// Age of a cached composite in hours.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_age_hours: Option<f64>,
}

/// Response: records removed by invalidation or cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiV1RemovedDto {
    /// Number of composites deleted.
    pub removed: u64,
}

/// Composite count for one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiV1LanguageCountDto {
    /// Language code.
    pub language: String,
    /// Composites stored for it.
    pub count: u64,
}

/// Response: composite cache statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiV1CacheStatsDto {
    /// Stored composites.
    pub total: u64,
    /// Composites younger than the freshness window.
    pub valid: u64,
    /// Composites past the window.
    pub expired: u64,
    /// Per-language breakdown.
    pub per_language_counts: Vec<ApiV1LanguageCountDto>,
}

/// Outcome of warming one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiV1WarmItemDto {
    /// Warmed item.
    pub subject_id: String,
    /// Item title.
    pub title: String,
    /// `success`, `already_exists`, or `error`.
    pub status: String,
    /// Director side state.
    pub director: String,
    /// Soundtrack side state.
    pub soundtrack: String,
    /// Failure messages, when any side failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response: bulk warm summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiV1WarmSummaryDto {
    /// Items attempted.
    pub total: u64,
    /// Items that fetched what was missing.
    pub success: u64,
    /// Items with both enrichments already stored.
    pub already_exists: u64,
    /// Items with a failed side.
    pub errors: u64,
    /// Per-item outcomes in catalog order.
    pub per_item_results: Vec<ApiV1WarmItemDto>,
}

/// Response: enrichment coverage of the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiV1WarmStatsDto {
    /// Catalog items.
    pub total_items: u64,
    /// Stored director records.
    pub total_directors: u64,
    /// Stored soundtrack records.
    pub total_soundtracks: u64,
    /// Director coverage percentage.
    pub director_coverage: f64,
    /// Soundtrack coverage percentage.
    pub soundtrack_coverage: f64,
    /// Mean of both coverages.
    pub overall_coverage: f64,
}
