//! Detail composer: assembles one composite record from the catalog and both
//! enrichment sides.

use crate::deps::DetailDeps;
use crate::enrichment::{ResolveMode, resolve_directors, resolve_soundtrack};
use cinedex_domain::{CompositeRecord, Language, SubjectId};
use cinedex_ports::{LogLevel, log_fields};
use cinedex_shared::{ErrorEnvelope, RequestContext, Result, timeout_with_context};

/// Input payload for building a detail record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildDetailInput {
    /// Subject to build.
    pub subject_id: SubjectId,
    /// Language to serve.
    pub language: Language,
}

/// Build a composite record without reading or writing the composite store.
///
/// The catalog lookup strictly precedes enrichment; the director and
/// soundtrack sides then resolve concurrently. Enrichment failures leave the
/// corresponding field empty.
pub async fn build_detail(
    ctx: &RequestContext,
    deps: &DetailDeps,
    input: BuildDetailInput,
) -> Result<CompositeRecord> {
    ctx.ensure_not_cancelled("build_detail.start")?;

    let base = timeout_with_context(
        ctx,
        deps.budgets.store,
        "build_detail.catalog",
        deps.catalog.get_item(ctx, input.subject_id.clone()),
    )
    .await?
    .ok_or_else(|| {
        ErrorEnvelope::not_found(format!("no catalog item for {}", input.subject_id))
            .with_metadata("subjectId", input.subject_id.as_str())
    })?;

    let mode = ResolveMode::serving(input.language);
    let (director, soundtrack) = tokio::join!(
        resolve_directors(ctx, deps, &base, input.language, mode),
        resolve_soundtrack(ctx, deps, &base, input.language, mode),
    );
    let (director, soundtrack) = (director?, soundtrack?);

    if let Some(error) = director.failure.as_ref() {
        deps.emit_error(
            LogLevel::Warn,
            "compose.director.degraded",
            "Director enrichment unavailable",
            log_fields([
                ("subjectId", input.subject_id.as_str()),
                ("director", base.director_name().unwrap_or_default()),
            ]),
            error,
        );
    }
    if let Some(error) = soundtrack.failure.as_ref() {
        deps.emit_error(
            LogLevel::Warn,
            "compose.soundtrack.degraded",
            "Soundtrack enrichment unavailable",
            log_fields([
                ("subjectId", input.subject_id.as_str()),
                ("title", &*base.title),
            ]),
            error,
        );
    }

    Ok(CompositeRecord::assemble(
        base,
        input.language,
        director.value,
        soundtrack.value,
        deps.clock.now_ms(),
    ))
}
