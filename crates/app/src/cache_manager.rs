//! Cache manager: serves fresh composites, rebuilds stale or missing ones,
//! and exposes invalidation, statistics, and expiry cleanup.

use crate::codec;
use crate::composer::{BuildDetailInput, build_detail};
use crate::deps::{DetailDeps, duration_ms};
use cinedex_domain::{
    CacheKey, CacheStats, CompositeRecord, Freshness, Language, LanguageCount, SubjectId,
    age_hours, expiry_cutoff_ms,
};
use cinedex_ports::{Collection, DocumentFilter, LogFields, LogLevel, log_fields};
use cinedex_shared::{RequestContext, Result, timeout_with_context};
use serde_json::Value;
use std::time::Instant;

/// Input payload for reading a detail record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetDetailInput {
    /// Subject to read.
    pub subject_id: SubjectId,
    /// Language to serve.
    pub language: Language,
}

/// A served detail record.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailLookup {
    /// The composite.
    pub record: CompositeRecord,
    /// Whether the record was served from the composite store.
    pub from_cache: bool,
    /// Age of a cached record in hours, one decimal.
    pub cache_age_hours: Option<f64>,
}

/// Input payload for invalidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidateDetailInput {
    /// Subject whose records are dropped.
    pub subject_id: SubjectId,
    /// Only this language; every language when `None`.
    pub language: Option<Language>,
}

/// Number of composites removed by invalidation or cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemovedRecords {
    /// Records deleted.
    pub removed: u64,
}

/// Serve a composite, rebuilding it when absent or older than the freshness
/// window.
///
/// Concurrent callers may rebuild the same key at once; each write replaces
/// the whole document, so the last one wins.
#[tracing::instrument(
    name = "detail.get",
    skip_all,
    fields(subject_id = %input.subject_id, language = %input.language)
)]
pub async fn get_detail(
    ctx: &RequestContext,
    deps: &DetailDeps,
    input: GetDetailInput,
) -> Result<DetailLookup> {
    let started_at = Instant::now();
    let key = CacheKey::derive(&input.subject_id, input.language);

    let result: Result<DetailLookup> = (async {
        ctx.ensure_not_cancelled("get_detail.start")?;

        if let Some(lookup) = read_fresh(ctx, deps, &key).await? {
            deps.emit(
                LogLevel::Debug,
                "detail.get.hit",
                "Detail served from cache",
                key_fields(&key, started_at),
            );
            return Ok(lookup);
        }

        let record = build_detail(
            ctx,
            deps,
            BuildDetailInput {
                subject_id: input.subject_id.clone(),
                language: input.language,
            },
        )
        .await?;

        let document = codec::composite_document(&record)?;
        timeout_with_context(
            ctx,
            deps.budgets.store,
            "get_detail.put",
            deps.store.put(ctx, Collection::Composites, document),
        )
        .await?;

        let mut fields = key_fields(&key, started_at);
        fields.insert("hasDirector".into(), Value::Bool(record.director.is_some()));
        fields.insert(
            "hasSoundtrack".into(),
            Value::Bool(record.soundtrack.is_some()),
        );
        deps.emit(LogLevel::Info, "detail.get.rebuilt", "Detail rebuilt", fields);

        Ok(DetailLookup {
            record,
            from_cache: false,
            cache_age_hours: None,
        })
    })
    .await;

    if let Err(error) = result.as_ref() {
        let level = if error.is_not_found() || error.is_cancelled() {
            LogLevel::Info
        } else {
            LogLevel::Error
        };
        deps.emit_error(
            level,
            "detail.get.failed",
            "Detail lookup failed",
            key_fields(&key, started_at),
            error,
        );
    }
    result
}

/// Return the stored composite when it is fresh; delete it when stale or unreadable.
async fn read_fresh(
    ctx: &RequestContext,
    deps: &DetailDeps,
    key: &CacheKey,
) -> Result<Option<DetailLookup>> {
    let read = timeout_with_context(
        ctx,
        deps.budgets.store,
        "get_detail.get",
        deps.store.get(ctx, Collection::Composites, key.as_str().into()),
    )
    .await;

    // Unreadable rows are dropped and rebuilt whether the store or the codec
    // rejected them.
    let (unreadable, age_ms) = match read {
        Ok(Some(document)) => {
            let freshness = Freshness::classify(document.created_at_ms, deps.clock.now_ms());
            match codec::composite_record(document) {
                Ok(record) if freshness.is_fresh() => {
                    return Ok(Some(DetailLookup {
                        record,
                        from_cache: true,
                        cache_age_hours: Some(age_hours(freshness.age_ms())),
                    }));
                },
                Ok(_) => (None, Some(freshness.age_ms())),
                Err(error) => (Some(error), Some(freshness.age_ms())),
            }
        },
        Ok(None) => return Ok(None),
        Err(error) if error.is_corrupt_document() => (Some(error), None),
        Err(error) => return Err(error),
    };

    let mut fields = log_fields([("cacheKey", key.as_str())]);
    if let Some(age_ms) = age_ms {
        fields.insert("ageMs".into(), Value::from(age_ms));
    }
    match unreadable {
        None => deps.emit(
            LogLevel::Info,
            "detail.get.stale",
            "Stale detail dropped",
            fields,
        ),
        Some(error) => deps.emit_error(
            LogLevel::Warn,
            "detail.get.stale",
            "Unreadable detail dropped",
            fields,
            &error,
        ),
    }

    timeout_with_context(
        ctx,
        deps.budgets.store,
        "get_detail.delete_stale",
        deps.store
            .delete_one(ctx, Collection::Composites, key.as_str().into()),
    )
    .await?;
    Ok(None)
}

/// Delete one language's composite, or every language of a subject.
///
/// Deleting nothing is not an error.
#[tracing::instrument(name = "detail.invalidate", skip_all, fields(subject_id = %input.subject_id))]
pub async fn invalidate_detail(
    ctx: &RequestContext,
    deps: &DetailDeps,
    input: InvalidateDetailInput,
) -> Result<RemovedRecords> {
    ctx.ensure_not_cancelled("invalidate_detail.start")?;

    let removed = match input.language {
        Some(language) => {
            let key = CacheKey::derive(&input.subject_id, language);
            let existed = timeout_with_context(
                ctx,
                deps.budgets.store,
                "invalidate_detail.delete_one",
                deps.store
                    .delete_one(ctx, Collection::Composites, key.as_str().into()),
            )
            .await?;
            u64::from(existed)
        },
        None => {
            timeout_with_context(
                ctx,
                deps.budgets.store,
                "invalidate_detail.delete_many",
                deps.store.delete_many(
                    ctx,
                    Collection::Composites,
                    DocumentFilter::all().subject(input.subject_id.as_str()),
                ),
            )
            .await?
        },
    };

    let mut fields = log_fields([
        ("subjectId", input.subject_id.as_str()),
        (
            "language",
            input.language.map_or("*", Language::as_str),
        ),
    ]);
    fields.insert("removed".into(), Value::from(removed));
    deps.emit(
        LogLevel::Info,
        "detail.invalidate.completed",
        "Detail invalidated",
        fields,
    );
    Ok(RemovedRecords { removed })
}

/// Point-in-time composite counts; read-only.
#[tracing::instrument(name = "detail.stats", skip_all)]
pub async fn cache_stats(ctx: &RequestContext, deps: &DetailDeps) -> Result<CacheStats> {
    ctx.ensure_not_cancelled("cache_stats.start")?;
    let cutoff_ms = expiry_cutoff_ms(deps.clock.now_ms());

    let total = timeout_with_context(
        ctx,
        deps.budgets.store,
        "cache_stats.total",
        deps.store
            .count(ctx, Collection::Composites, DocumentFilter::all()),
    )
    .await?;
    let valid = timeout_with_context(
        ctx,
        deps.budgets.store,
        "cache_stats.valid",
        deps.store.count(
            ctx,
            Collection::Composites,
            DocumentFilter::all().created_after(cutoff_ms),
        ),
    )
    .await?;
    let per_language = timeout_with_context(
        ctx,
        deps.budgets.store,
        "cache_stats.per_language",
        deps.store
            .count_by_language(ctx, Collection::Composites, DocumentFilter::all()),
    )
    .await?;

    let per_language = per_language
        .into_iter()
        .map(|(language, count)| LanguageCount { language, count })
        .collect();
    Ok(CacheStats::new(total, valid.min(total), per_language))
}

/// Delete every composite at or past the freshness window.
#[tracing::instrument(name = "detail.cleanup", skip_all)]
pub async fn cleanup_expired(ctx: &RequestContext, deps: &DetailDeps) -> Result<RemovedRecords> {
    let started_at = Instant::now();
    ctx.ensure_not_cancelled("cleanup_expired.start")?;
    let cutoff_ms = expiry_cutoff_ms(deps.clock.now_ms());

    let removed = timeout_with_context(
        ctx,
        deps.budgets.store,
        "cleanup_expired.delete_many",
        deps.store.delete_many(
            ctx,
            Collection::Composites,
            DocumentFilter::all().created_at_or_before(cutoff_ms),
        ),
    )
    .await?;

    let mut fields = LogFields::new();
    fields.insert("removed".into(), Value::from(removed));
    fields.insert("durationMs".into(), Value::from(duration_ms(started_at)));
    deps.emit(
        LogLevel::Info,
        "detail.cleanup.completed",
        "Expired details removed",
        fields,
    );
    Ok(RemovedRecords { removed })
}

fn key_fields(key: &CacheKey, started_at: Instant) -> LogFields {
    let mut fields = log_fields([("cacheKey", key.as_str())]);
    fields.insert("durationMs".into(), Value::from(duration_ms(started_at)));
    fields
}
