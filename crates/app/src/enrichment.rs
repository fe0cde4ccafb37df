//! Store-first enrichment resolution shared by the composer and the warmer.
//!
//! Each side (director, soundtrack) is read from its own store first. Missing
//! records are fetched from the provider and upserted under their natural key,
//! so concurrent resolvers of the same key simply overwrite each other with
//! equivalent documents. Provider failures are returned as a failed
//! resolution, never as an error; store failures and cancellation are errors.

use crate::codec;
use crate::deps::DetailDeps;
use cinedex_domain::{
    CatalogItem, DirectorGroup, DirectorRecord, EnrichmentState, Language, SoundtrackRecord,
};
use cinedex_ports::{
    Collection, DirectorQuery, LogLevel, SoundtrackQuery, TranslateRequest, log_fields,
};
use cinedex_shared::{ErrorEnvelope, RequestContext, Result, timeout_with_context};

/// How stored records are post-processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ResolveMode {
    /// Translate stored text into this language.
    pub(crate) serve_language: Option<Language>,
    /// Look up portraits for stored directors that have none.
    pub(crate) backfill_portraits: bool,
}

impl ResolveMode {
    /// Mode used when building a detail page.
    pub(crate) const fn serving(language: Language) -> Self {
        Self {
            serve_language: Some(language),
            backfill_portraits: true,
        }
    }

    /// Mode used by the warmer: stored records are left untouched.
    pub(crate) const fn warming() -> Self {
        Self {
            serve_language: None,
            backfill_portraits: false,
        }
    }
}

/// Outcome of resolving one enrichment side.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Resolution<T> {
    pub(crate) value: Option<T>,
    pub(crate) state: EnrichmentState,
    pub(crate) failure: Option<ErrorEnvelope>,
}

impl<T> Resolution<T> {
    fn cached(value: T) -> Self {
        Self {
            value: Some(value),
            state: EnrichmentState::Cached,
            failure: None,
        }
    }

    fn fetched(value: T) -> Self {
        Self {
            value: Some(value),
            state: EnrichmentState::Fetched,
            failure: None,
        }
    }

    fn failed(error: ErrorEnvelope) -> Self {
        Self {
            value: None,
            state: EnrichmentState::FetchFailed,
            failure: Some(error),
        }
    }

    fn not_applicable() -> Self {
        Self {
            value: None,
            state: EnrichmentState::NotApplicable,
            failure: None,
        }
    }
}

/// Resolve the director side of `item`, splitting group fields per member.
pub(crate) async fn resolve_directors(
    ctx: &RequestContext,
    deps: &DetailDeps,
    item: &CatalogItem,
    language: Language,
    mode: ResolveMode,
) -> Result<Resolution<DirectorRecord>> {
    let Some(group) = item.director_name().and_then(DirectorGroup::parse) else {
        return Ok(Resolution::not_applicable());
    };

    let mut values = Vec::with_capacity(group.members().len());
    let mut state = EnrichmentState::Cached;
    let mut failure = None;
    for name in group.members() {
        let member = resolve_director(ctx, deps, name, item, language, mode).await?;
        state = worst(state, member.state);
        if failure.is_none() {
            failure = member.failure;
        }
        values.push(member.value);
    }

    Ok(Resolution {
        value: group.merge(values),
        state,
        failure,
    })
}

async fn resolve_director(
    ctx: &RequestContext,
    deps: &DetailDeps,
    name: &str,
    item: &CatalogItem,
    language: Language,
    mode: ResolveMode,
) -> Result<Resolution<DirectorRecord>> {
    if let Some(mut record) = load_director(ctx, deps, name).await? {
        if mode.backfill_portraits && record.photo.is_none() {
            record = backfill_portrait(ctx, deps, record).await?;
        }
        if let Some(target) = mode.serve_language {
            record.biography = translate(ctx, deps, record.biography, target).await;
        }
        return Ok(Resolution::cached(record));
    }

    let query = DirectorQuery {
        name: name.into(),
        movie_context_id: Some(item.id.clone()),
        language,
    };
    let fetched = timeout_with_context(
        ctx,
        deps.budgets.director,
        "enrichment.resolve_director",
        deps.directors.resolve_director(ctx, query),
    )
    .await;
    let profile = match fetched {
        Ok(profile) => profile,
        Err(error) if error.is_cancelled() => return Err(error),
        Err(error) => return Ok(Resolution::failed(error)),
    };

    let record = DirectorRecord {
        name: name.into(),
        biography: profile.biography,
        photo: profile.photo,
    };
    save_director(ctx, deps, &record).await?;
    Ok(Resolution::fetched(record))
}

async fn load_director(
    ctx: &RequestContext,
    deps: &DetailDeps,
    name: &str,
) -> Result<Option<DirectorRecord>> {
    let read = timeout_with_context(
        ctx,
        deps.budgets.store,
        "enrichment.load_director",
        deps.store.get(ctx, Collection::Directors, name.into()),
    )
    .await;
    let decoded = match read {
        Ok(Some(document)) => codec::director_record(document),
        Ok(None) => return Ok(None),
        Err(error) if error.is_corrupt_document() => Err(error),
        Err(error) => return Err(error),
    };
    match decoded {
        Ok(record) => Ok(Some(record)),
        Err(error) => {
            // Unreadable records are refetched and overwritten.
            deps.emit_error(
                LogLevel::Warn,
                "enrichment.record.unreadable",
                "Stored director record is unreadable",
                log_fields([("director", name)]),
                &error,
            );
            Ok(None)
        },
    }
}

async fn save_director(
    ctx: &RequestContext,
    deps: &DetailDeps,
    record: &DirectorRecord,
) -> Result<()> {
    let document = codec::director_document(record, deps.clock.now_ms())?;
    timeout_with_context(
        ctx,
        deps.budgets.store,
        "enrichment.save_director",
        deps.store.put(ctx, Collection::Directors, document),
    )
    .await
}

async fn backfill_portrait(
    ctx: &RequestContext,
    deps: &DetailDeps,
    mut record: DirectorRecord,
) -> Result<DirectorRecord> {
    let Some(portraits) = deps.portraits.as_ref() else {
        return Ok(record);
    };

    let found = timeout_with_context(
        ctx,
        deps.budgets.portrait,
        "enrichment.find_portrait",
        portraits.find_portrait(ctx, record.name.clone()),
    )
    .await;
    let photo = match found {
        Ok(photo) => photo,
        Err(error) if error.is_cancelled() => return Err(error),
        Err(error) => {
            deps.emit_error(
                LogLevel::Debug,
                "compose.portrait.unavailable",
                "Portrait lookup failed",
                log_fields([("director", &*record.name)]),
                &error,
            );
            None
        },
    };

    if let Some(photo) = photo {
        record.photo = Some(photo);
        save_director(ctx, deps, &record).await?;
    }
    Ok(record)
}

/// Resolve the soundtrack side of `item`.
pub(crate) async fn resolve_soundtrack(
    ctx: &RequestContext,
    deps: &DetailDeps,
    item: &CatalogItem,
    language: Language,
    mode: ResolveMode,
) -> Result<Resolution<SoundtrackRecord>> {
    let key = item.soundtrack_key();
    if let Some(mut record) = load_soundtrack(ctx, deps, key.as_str()).await? {
        if let Some(target) = mode.serve_language {
            record.description = translate(ctx, deps, record.description, target).await;
        }
        return Ok(Resolution::cached(record));
    }

    let query = SoundtrackQuery {
        title: item.title.clone(),
        year: item.year,
        director: item.director_name().map(Into::into),
        language,
    };
    let fetched = timeout_with_context(
        ctx,
        deps.budgets.soundtrack,
        "enrichment.resolve_soundtrack",
        deps.soundtracks.resolve_soundtrack(ctx, query),
    )
    .await;
    let profile = match fetched {
        Ok(profile) => profile,
        Err(error) if error.is_cancelled() => return Err(error),
        Err(error) => return Ok(Resolution::failed(error)),
    };

    let record = SoundtrackRecord {
        key,
        title: item.title.clone(),
        year: item.year,
        director: item.director_name().map(Into::into),
        tracks: profile.tracks,
        description: profile.description,
        provenance: profile.provenance,
    };
    let document = codec::soundtrack_document(&record, deps.clock.now_ms())?;
    timeout_with_context(
        ctx,
        deps.budgets.store,
        "enrichment.save_soundtrack",
        deps.store.put(ctx, Collection::Soundtracks, document),
    )
    .await?;
    Ok(Resolution::fetched(record))
}

async fn load_soundtrack(
    ctx: &RequestContext,
    deps: &DetailDeps,
    key: &str,
) -> Result<Option<SoundtrackRecord>> {
    let read = timeout_with_context(
        ctx,
        deps.budgets.store,
        "enrichment.load_soundtrack",
        deps.store.get(ctx, Collection::Soundtracks, key.into()),
    )
    .await;
    let decoded = match read {
        Ok(Some(document)) => codec::soundtrack_record(document),
        Ok(None) => return Ok(None),
        Err(error) if error.is_corrupt_document() => Err(error),
        Err(error) => return Err(error),
    };
    match decoded {
        Ok(record) => Ok(Some(record)),
        Err(error) => {
            deps.emit_error(
                LogLevel::Warn,
                "enrichment.record.unreadable",
                "Stored soundtrack record is unreadable",
                log_fields([("soundtrackKey", key)]),
                &error,
            );
            Ok(None)
        },
    }
}

/// Best-effort translation: any failure returns the source text.
async fn translate(
    ctx: &RequestContext,
    deps: &DetailDeps,
    text: Box<str>,
    target: Language,
) -> Box<str> {
    if !target.needs_translation() || text.trim().is_empty() {
        return text;
    }
    let Some(translator) = deps.translator.as_ref() else {
        return text;
    };

    let request = TranslateRequest {
        text: text.clone(),
        target,
    };
    match timeout_with_context(
        ctx,
        deps.budgets.translation,
        "enrichment.translate",
        translator.translate(ctx, request),
    )
    .await
    {
        Ok(translated) if !translated.trim().is_empty() => translated,
        Ok(_) => text,
        Err(error) => {
            deps.emit_error(
                LogLevel::Warn,
                "compose.translation.fallback",
                "Translation failed; serving source text",
                log_fields([("language", target.as_str())]),
                &error,
            );
            text
        },
    }
}

/// Combine member states: a failure dominates, then fresh work, then cache hits.
const fn worst(left: EnrichmentState, right: EnrichmentState) -> EnrichmentState {
    const fn rank(state: EnrichmentState) -> u8 {
        match state {
            EnrichmentState::NotApplicable => 0,
            EnrichmentState::Cached => 1,
            EnrichmentState::Fetched => 2,
            EnrichmentState::FetchFailed => 3,
        }
    }
    if rank(right) > rank(left) { right } else { left }
}
