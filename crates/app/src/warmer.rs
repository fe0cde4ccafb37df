//! Bulk warmer: prepopulates the director and soundtrack stores across the
//! catalog without building composites.

use crate::deps::{DetailDeps, duration_ms};
use crate::enrichment::{Resolution, ResolveMode, resolve_directors, resolve_soundtrack};
use cinedex_domain::{
    CatalogItem, EnrichmentState, Language, SubjectId, WarmCoverage, WarmItemResult, WarmStatus,
    WarmSummary,
};
use cinedex_ports::{Collection, DocumentFilter, LogLevel, log_fields};
use cinedex_shared::{
    CorrelationId, ErrorEnvelope, RequestContext, Result, WorkerPool, WorkerPoolOptions,
    timeout_with_context,
};
use serde_json::Value;
use std::time::Instant;

/// Default worker bound for bulk warming.
pub const DEFAULT_WARM_CONCURRENCY: usize = 3;

/// Input payload for warming the whole catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarmAllInput {
    /// Language passed to providers.
    pub language: Language,
    /// Maximum number of items warmed at once.
    pub max_concurrency: usize,
}

/// Input payload for warming one catalog item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarmOneInput {
    /// Item to warm.
    pub subject_id: SubjectId,
    /// Language passed to providers.
    pub language: Language,
}

/// Warm every catalog item, at most `max_concurrency` at a time.
///
/// Counts are taken after every item finished. Items are reported in catalog
/// order. Cancelling the context stops items that have not started and
/// discards the results of those still running.
#[tracing::instrument(
    name = "warm.all",
    skip_all,
    fields(language = %input.language, max_concurrency = input.max_concurrency)
)]
pub async fn warm_all(
    ctx: &RequestContext,
    deps: &DetailDeps,
    input: WarmAllInput,
) -> Result<WarmSummary> {
    let started_at = Instant::now();
    if input.max_concurrency == 0 {
        return Err(ErrorEnvelope::invalid_input(
            "maxConcurrency must be at least 1",
        ));
    }
    ctx.ensure_not_cancelled("warm_all.start")?;

    let items = timeout_with_context(
        ctx,
        deps.budgets.store,
        "warm_all.list_items",
        deps.catalog.list_items(ctx),
    )
    .await?;

    let warm_id = CorrelationId::new_job_id();
    let mut fields = log_fields([
        ("language", input.language.as_str()),
        ("warmId", warm_id.as_str()),
    ]);
    fields.insert("total".into(), Value::from(items.len()));
    fields.insert("maxConcurrency".into(), Value::from(input.max_concurrency));
    deps.emit(LogLevel::Info, "warm.all.start", "Warm started", fields);

    let pool = WorkerPool::new(
        ctx.clone(),
        WorkerPoolOptions {
            concurrency: input.max_concurrency,
        },
    )?;
    let task_ctx = ctx.clone();
    let task_deps = deps.clone();
    let language = input.language;
    let outcome = pool
        .map(items, move |item, _index| {
            let ctx = task_ctx.clone();
            let deps = task_deps.clone();
            async move { warm_catalog_item(&ctx, &deps, item, language).await }
        })
        .await;

    match outcome {
        Ok(items) => {
            let summary = WarmSummary::from_items(items);
            let mut fields = log_fields([
                ("total", summary.total),
                ("success", summary.success),
                ("alreadyExists", summary.already_exists),
                ("errors", summary.errors),
                ("durationMs", duration_ms(started_at)),
            ]);
            fields.insert("language".into(), Value::from(language.as_str()));
            fields.insert("warmId".into(), Value::from(warm_id.as_str()));
            deps.emit(LogLevel::Info, "warm.all.completed", "Warm completed", fields);
            Ok(summary)
        },
        Err(error) => {
            let mut fields = log_fields([("durationMs", duration_ms(started_at))]);
            fields.insert("warmId".into(), Value::from(warm_id.as_str()));
            if error.is_cancelled() {
                deps.emit(LogLevel::Info, "warm.all.aborted", "Warm aborted", fields);
            } else {
                deps.emit_error(LogLevel::Error, "warm.all.aborted", "Warm failed", fields, &error);
            }
            Err(error)
        },
    }
}

/// Warm one item looked up in the catalog.
#[tracing::instrument(name = "warm.one", skip_all, fields(subject_id = %input.subject_id))]
pub async fn warm_one(
    ctx: &RequestContext,
    deps: &DetailDeps,
    input: WarmOneInput,
) -> Result<WarmItemResult> {
    ctx.ensure_not_cancelled("warm_one.start")?;
    let item = timeout_with_context(
        ctx,
        deps.budgets.store,
        "warm_one.catalog",
        deps.catalog.get_item(ctx, input.subject_id.clone()),
    )
    .await?
    .ok_or_else(|| {
        ErrorEnvelope::not_found(format!("no catalog item for {}", input.subject_id))
            .with_metadata("subjectId", input.subject_id.as_str())
    })?;

    warm_catalog_item(ctx, deps, item, input.language).await
}

/// Warm an item supplied by the caller instead of the catalog.
#[tracing::instrument(name = "warm.item", skip_all)]
pub async fn warm_item(
    ctx: &RequestContext,
    deps: &DetailDeps,
    item: CatalogItem,
    language: Language,
) -> Result<WarmItemResult> {
    let item = item.validated().map_err(ErrorEnvelope::from)?;
    ctx.ensure_not_cancelled("warm_item.start")?;
    warm_catalog_item(ctx, deps, item, language).await
}

/// Share of catalog items with stored enrichment.
#[tracing::instrument(name = "warm.stats", skip_all)]
pub async fn warm_stats(ctx: &RequestContext, deps: &DetailDeps) -> Result<WarmCoverage> {
    ctx.ensure_not_cancelled("warm_stats.start")?;

    let total_items = timeout_with_context(
        ctx,
        deps.budgets.store,
        "warm_stats.catalog",
        deps.catalog.count_items(ctx),
    )
    .await?;
    let directors = timeout_with_context(
        ctx,
        deps.budgets.store,
        "warm_stats.directors",
        deps.store
            .count(ctx, Collection::Directors, DocumentFilter::all()),
    )
    .await?;
    let soundtracks = timeout_with_context(
        ctx,
        deps.budgets.store,
        "warm_stats.soundtracks",
        deps.store
            .count(ctx, Collection::Soundtracks, DocumentFilter::all()),
    )
    .await?;

    Ok(WarmCoverage::compute(total_items, directors, soundtracks))
}

/// Warm both enrichment sides of one item.
///
/// Only cancellation escapes as an error; every other failure is recorded on
/// the item so one bad item never stops a pass.
async fn warm_catalog_item(
    ctx: &RequestContext,
    deps: &DetailDeps,
    item: CatalogItem,
    language: Language,
) -> Result<WarmItemResult> {
    let mode = ResolveMode::warming();
    let (director, soundtrack) = tokio::join!(
        resolve_directors(ctx, deps, &item, language, mode),
        resolve_soundtrack(ctx, deps, &item, language, mode),
    );

    let mut messages = Vec::new();
    let director_state = side_state(director, "director", &mut messages)?;
    let soundtrack_state = side_state(soundtrack, "soundtrack", &mut messages)?;

    let status = if director_state.is_present() && soundtrack_state.is_present() {
        WarmStatus::AlreadyExists
    } else if messages.is_empty() {
        WarmStatus::Success
    } else {
        WarmStatus::Error
    };
    let message = (!messages.is_empty()).then(|| messages.join("; ").into_boxed_str());

    if let Some(message) = message.as_deref() {
        deps.emit(
            LogLevel::Warn,
            "warm.item.failed",
            "Warm item failed",
            log_fields([("subjectId", item.id.as_str()), ("error", message)]),
        );
    }

    Ok(WarmItemResult {
        subject_id: item.id,
        title: item.title,
        status,
        director: director_state,
        soundtrack: soundtrack_state,
        message,
    })
}

/// Reduce one side to its state, collecting failure messages.
///
/// Store and timeout errors count as a failed side; only cancellation escapes.
fn side_state<T>(
    result: Result<Resolution<T>>,
    side: &str,
    messages: &mut Vec<String>,
) -> Result<EnrichmentState> {
    match result {
        Ok(resolution) => {
            if let Some(error) = resolution.failure {
                messages.push(format!("{side}: {}", error.message));
            }
            Ok(resolution.state)
        },
        Err(error) if error.is_cancelled() => Err(error),
        Err(error) => {
            messages.push(format!("{side}: {}", error.message));
            Ok(EnrichmentState::FetchFailed)
        },
    }
}
