//! API v1 DTO mapping helpers.

use crate::v1::{
    ApiV1CacheStatsDto, ApiV1DetailDto, ApiV1DirectorDto, ApiV1ErrorCode, ApiV1ErrorDto,
    ApiV1ErrorKind, ApiV1ErrorMeta, ApiV1GetDetailResponseDto, ApiV1LanguageCountDto,
    ApiV1Response, ApiV1Result, ApiV1SoundtrackDto, ApiV1TrackDto, ApiV1WarmItemDto,
    ApiV1WarmStatsDto, ApiV1WarmSummaryDto, StatusKind,
};
use cinedex_domain::{
    CacheStats, CatalogItem, CompositeRecord, DirectorRecord, EnrichmentState, SoundtrackRecord,
    Track, WarmCoverage, WarmItemResult, WarmStatus, WarmSummary,
};
use cinedex_shared::{ErrorEnvelope, ErrorKind, REDACTED, is_secret_key};
use serde_json::{Map, Value};

const API_V1_REDACTED_PREFIX: &str = "[REDACTED,len=";

impl StatusKind {
    /// Classify an error envelope into an outward status.
    #[must_use]
    pub fn from_error(error: &ErrorEnvelope) -> Self {
        match (error.code.namespace(), error.code.code()) {
            ("core", "not_found") => Self::NotFound,
            ("core", "invalid_input") | ("config" | "domain", _) => Self::BadInput,
            _ => Self::InternalError,
        }
    }
}

/// Convert a shared `ErrorCode` into an API v1 error code string.
#[must_use]
pub fn error_code_to_api_v1(code: &cinedex_shared::ErrorCode) -> ApiV1ErrorCode {
    let namespace = sanitize_code_segment(code.namespace());
    let detail = sanitize_code_segment(code.code());
    format!("ERR_{namespace}_{detail}")
}

/// Map an `ErrorEnvelope` into an API v1 error DTO.
#[must_use]
pub fn error_envelope_to_api_v1_error(
    envelope: &ErrorEnvelope,
    extra_meta: Option<ApiV1ErrorMeta>,
) -> ApiV1ErrorDto {
    let mut merged = ApiV1ErrorMeta::new();
    for (key, value) in &envelope.metadata {
        merged.insert(key.clone(), value.clone());
    }
    if let Some(extra) = extra_meta {
        merged.extend(extra);
    }
    let meta = if merged.is_empty() {
        None
    } else {
        Some(redact_api_v1_meta(&merged))
    };

    ApiV1ErrorDto {
        code: error_code_to_api_v1(&envelope.code),
        message: envelope.message.clone(),
        kind: map_error_kind(envelope.kind),
        meta,
    }
}

/// Map a shared result into an API v1 result wrapper.
#[must_use]
pub fn result_to_api_v1_result<T>(
    result: Result<T, ErrorEnvelope>,
    extra_meta: Option<ApiV1ErrorMeta>,
) -> ApiV1Result<T> {
    match result {
        Ok(data) => ApiV1Result::ok(data),
        Err(error) => ApiV1Result::err(error_envelope_to_api_v1_error(&error, extra_meta)),
    }
}

/// Map a shared result into a payload plus its outward status.
#[must_use]
pub fn result_to_api_v1_response<T>(
    result: Result<T, ErrorEnvelope>,
    extra_meta: Option<ApiV1ErrorMeta>,
) -> ApiV1Response<T> {
    match result {
        Ok(data) => (ApiV1Result::ok(data), StatusKind::Ok),
        Err(error) => {
            let status = StatusKind::from_error(&error);
            (
                ApiV1Result::err(error_envelope_to_api_v1_error(&error, extra_meta)),
                status,
            )
        },
    }
}

/// Map a composite record into its DTO.
#[must_use]
pub fn detail_to_api_v1(record: &CompositeRecord) -> ApiV1DetailDto {
    ApiV1DetailDto {
        cache_key: record.cache_key().as_str().to_owned(),
        subject_id: record.subject_id.as_str().to_owned(),
        language: record.language.as_str().to_owned(),
        base: catalog_item_to_map(&record.base),
        director: record.director.as_ref().map(director_to_api_v1),
        soundtrack: record.soundtrack.as_ref().map(soundtrack_to_api_v1),
        created_at_ms: record.created_at_ms,
    }
}

/// Map a served composite plus its cache facts into the response DTO.
#[must_use]
pub fn detail_response_to_api_v1(
    record: &CompositeRecord,
    from_cache: bool,
    cache_age_hours: Option<f64>,
) -> ApiV1GetDetailResponseDto {
    ApiV1GetDetailResponseDto {
        detail: detail_to_api_v1(record),
        from_cache,
        cache_age_hours,
    }
}

/// Map a director record into its DTO.
#[must_use]
pub fn director_to_api_v1(record: &DirectorRecord) -> ApiV1DirectorDto {
    ApiV1DirectorDto {
        name: record.name.to_string(),
        biography: record.biography.to_string(),
        photo: record.photo.as_deref().map(str::to_owned),
    }
}

/// Map a soundtrack record into its DTO.
#[must_use]
pub fn soundtrack_to_api_v1(record: &SoundtrackRecord) -> ApiV1SoundtrackDto {
    ApiV1SoundtrackDto {
        title: record.title.to_string(),
        year: record.year,
        director: record.director.as_deref().map(str::to_owned),
        tracks: record.tracks.iter().map(track_to_api_v1).collect(),
        description: record.description.to_string(),
        provenance: record.provenance.to_string(),
    }
}

fn track_to_api_v1(track: &Track) -> ApiV1TrackDto {
    ApiV1TrackDto {
        title: track.title.to_string(),
        artist: track.artist.to_string(),
        description: track.description.to_string(),
        spotify_id: track.spotify_id.as_deref().map(str::to_owned),
        preview_url: track.preview_url.as_deref().map(str::to_owned),
        external_url: track.external_url.as_deref().map(str::to_owned),
        album: track.album.as_deref().map(str::to_owned),
        duration_ms: track.duration_ms,
    }
}

/// Map composite cache statistics into their DTO.
#[must_use]
pub fn cache_stats_to_api_v1(stats: &CacheStats) -> ApiV1CacheStatsDto {
    ApiV1CacheStatsDto {
        total: stats.total,
        valid: stats.valid,
        expired: stats.expired,
        per_language_counts: stats
            .per_language
            .iter()
            .map(|entry| ApiV1LanguageCountDto {
                language: entry.language.to_string(),
                count: entry.count,
            })
            .collect(),
    }
}

/// Map one warming outcome into its DTO.
#[must_use]
pub fn warm_item_to_api_v1(item: &WarmItemResult) -> ApiV1WarmItemDto {
    ApiV1WarmItemDto {
        subject_id: item.subject_id.as_str().to_owned(),
        title: item.title.to_string(),
        status: warm_status_str(item.status).to_owned(),
        director: enrichment_state_str(item.director).to_owned(),
        soundtrack: enrichment_state_str(item.soundtrack).to_owned(),
        message: item.message.as_deref().map(str::to_owned),
    }
}

/// Map a bulk warm summary into its DTO.
#[must_use]
pub fn warm_summary_to_api_v1(summary: &WarmSummary) -> ApiV1WarmSummaryDto {
    ApiV1WarmSummaryDto {
        total: summary.total,
        success: summary.success,
        already_exists: summary.already_exists,
        errors: summary.errors,
        per_item_results: summary.items.iter().map(warm_item_to_api_v1).collect(),
    }
}

/// Map warm coverage figures into their DTO.
#[must_use]
pub const fn warm_stats_to_api_v1(coverage: &WarmCoverage) -> ApiV1WarmStatsDto {
    ApiV1WarmStatsDto {
        total_items: coverage.total_items,
        total_directors: coverage.total_directors,
        total_soundtracks: coverage.total_soundtracks,
        director_coverage: coverage.director_coverage,
        soundtrack_coverage: coverage.soundtrack_coverage,
        overall_coverage: coverage.overall_coverage,
    }
}

const fn warm_status_str(status: WarmStatus) -> &'static str {
    match status {
        WarmStatus::Success => "success",
        WarmStatus::AlreadyExists => "already_exists",
        WarmStatus::Error => "error",
    }
}

const fn enrichment_state_str(state: EnrichmentState) -> &'static str {
    match state {
        EnrichmentState::Cached => "cached",
        EnrichmentState::Fetched => "fetched",
        EnrichmentState::FetchFailed => "fetch_failed",
        EnrichmentState::NotApplicable => "not_applicable",
    }
}

fn catalog_item_to_map(item: &CatalogItem) -> Map<String, Value> {
    let mut map = Map::new();
    for (key, value) in &item.attributes {
        map.insert(key.clone(), value.clone());
    }
    map.insert("id".into(), Value::String(item.id.as_str().to_owned()));
    map.insert("title".into(), Value::String(item.title.to_string()));
    if let Some(year) = item.year {
        map.insert("year".into(), Value::from(year));
    }
    if let Some(director) = item.director.as_deref() {
        map.insert("director".into(), Value::String(director.to_owned()));
    }
    map
}

const fn map_error_kind(kind: ErrorKind) -> ApiV1ErrorKind {
    match kind {
        ErrorKind::Expected | ErrorKind::Unexpected => ApiV1ErrorKind::Expected,
        ErrorKind::Invariant => ApiV1ErrorKind::Invariant,
    }
}

fn sanitize_code_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() {
                ch.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

fn redact_api_v1_meta(meta: &ApiV1ErrorMeta) -> ApiV1ErrorMeta {
    meta.iter()
        .map(|(key, value)| {
            let redacted_value = if is_secret_key(key) {
                REDACTED.to_owned()
            } else if is_free_text_key(key) {
                format!("{API_V1_REDACTED_PREFIX}{}]", value.len())
            } else {
                value.clone()
            };
            (key.clone(), redacted_value)
        })
        .collect()
}

// Provider prompts and raw bodies can carry user content.
fn is_free_text_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key == "prompt" || key == "body" || key.ends_with("query") || key == "content"
}
