//! Composed backend and its outward operations.
//!
//! Every operation validates its request DTO before any I/O and returns the
//! payload paired with a `StatusKind`; errors never escape as `Err`.

use crate::InfraResult;
use crate::provider_factory::build_providers;
use crate::store_factory::{build_catalog, build_document_store, build_logger};
use cinedex_adapters::clock::SystemClock;
use cinedex_api::v1::{
    ApiV1CacheStatsDto, ApiV1GetDetailRequestDto, ApiV1GetDetailResponseDto,
    ApiV1InvalidateDetailRequestDto, ApiV1RemovedDto, ApiV1Response, ApiV1WarmAllRequestDto,
    ApiV1WarmItemDto, ApiV1WarmItemRequestDto, ApiV1WarmOneRequestDto, ApiV1WarmStatsDto,
    ApiV1WarmSummaryDto, cache_stats_to_api_v1, detail_response_to_api_v1,
    result_to_api_v1_response, validate_get_detail_request, validate_invalidate_detail_request,
    validate_warm_all_request, validate_warm_item_request, validate_warm_one_request,
    warm_item_to_api_v1, warm_stats_to_api_v1, warm_summary_to_api_v1,
};
use cinedex_app::{
    CallBudgets, DetailDeps, GetDetailInput, InvalidateDetailInput, WarmAllInput, WarmOneInput,
    cache_stats, cleanup_expired, get_detail, invalidate_detail, warm_all, warm_item, warm_one,
    warm_stats,
};
use cinedex_config::ValidatedBackendConfig;
use cinedex_domain::Language;
use cinedex_ports::{LogFields, LoggerPort};
use cinedex_shared::RequestContext;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// A fully wired backend: validated config plus concrete adapters.
#[derive(Clone)]
pub struct Backend {
    config: ValidatedBackendConfig,
    deps: DetailDeps,
    sources: Vec<&'static str>,
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Backend")
            .field("store", &self.config.store.provider)
            .field("sources", &self.sources)
            .field("budgets", &self.deps.budgets)
            .finish_non_exhaustive()
    }
}

impl Backend {
    /// Build every adapter named by the config.
    ///
    /// Fails when the store cannot be opened or the catalog cannot be read.
    pub fn from_config(config: ValidatedBackendConfig) -> InfraResult<Self> {
        let store = build_document_store(&config)?;
        let catalog = build_catalog(&config)?;
        let providers = build_providers(&config)?;
        tracing::debug!(
            store = ?config.store.provider,
            sources = ?providers.configured,
            "backend wired"
        );
        let deps = DetailDeps {
            catalog,
            store,
            directors: providers.directors,
            soundtracks: providers.soundtracks,
            translator: providers.translator,
            portraits: providers.portraits,
            clock: Arc::new(SystemClock),
            budgets: call_budgets(&config),
            logger: Some(build_logger(&config)),
        };
        Ok(Self {
            config,
            deps,
            sources: providers.configured,
        })
    }

    /// Wrap already-built dependencies.
    #[must_use]
    pub const fn from_parts(config: ValidatedBackendConfig, deps: DetailDeps) -> Self {
        Self {
            config,
            deps,
            sources: Vec::new(),
        }
    }

    /// Replace the application logger (`None` silences it).
    #[must_use]
    pub fn with_logger(mut self, logger: Option<Arc<dyn LoggerPort>>) -> Self {
        self.deps.logger = logger;
        self
    }

    /// The validated config this backend was built from.
    #[must_use]
    pub const fn config(&self) -> &ValidatedBackendConfig {
        &self.config
    }

    /// The wired dependencies.
    #[must_use]
    pub const fn deps(&self) -> &DetailDeps {
        &self.deps
    }

    /// Upstream sources with credentials or enabled in config.
    #[must_use]
    pub fn configured_sources(&self) -> &[&'static str] {
        &self.sources
    }

    fn default_language(&self) -> Language {
        self.config.core.default_language
    }

    fn scoped_deps(&self, ctx: &RequestContext) -> DetailDeps {
        let mut deps = self.deps.clone();
        if let Some(logger) = self.deps.logger.as_ref() {
            let mut fields = LogFields::new();
            fields.insert(
                "correlationId".into(),
                Value::String(ctx.correlation_id().as_str().to_owned()),
            );
            deps.logger = Some(Arc::from(logger.child(fields)));
        }
        deps
    }

    /// Serve a detail record, rebuilding it when missing or stale.
    pub async fn get_detail(
        &self,
        ctx: &RequestContext,
        request: &ApiV1GetDetailRequestDto,
    ) -> ApiV1Response<ApiV1GetDetailResponseDto> {
        result_to_api_v1_response(self.try_get_detail(ctx, request).await, None)
    }

    async fn try_get_detail(
        &self,
        ctx: &RequestContext,
        request: &ApiV1GetDetailRequestDto,
    ) -> InfraResult<ApiV1GetDetailResponseDto> {
        let target = validate_get_detail_request(request, self.default_language())?;
        let input = GetDetailInput {
            subject_id: target.subject_id,
            language: target.language,
        };
        let lookup = get_detail(ctx, &self.scoped_deps(ctx), input).await?;
        Ok(detail_response_to_api_v1(
            &lookup.record,
            lookup.from_cache,
            lookup.cache_age_hours,
        ))
    }

    /// Drop cached composites for a subject.
    pub async fn invalidate_detail(
        &self,
        ctx: &RequestContext,
        request: &ApiV1InvalidateDetailRequestDto,
    ) -> ApiV1Response<ApiV1RemovedDto> {
        result_to_api_v1_response(self.try_invalidate_detail(ctx, request).await, None)
    }

    async fn try_invalidate_detail(
        &self,
        ctx: &RequestContext,
        request: &ApiV1InvalidateDetailRequestDto,
    ) -> InfraResult<ApiV1RemovedDto> {
        let target = validate_invalidate_detail_request(request)?;
        let input = InvalidateDetailInput {
            subject_id: target.subject_id,
            language: target.language,
        };
        let removed = invalidate_detail(ctx, &self.scoped_deps(ctx), input).await?;
        Ok(ApiV1RemovedDto {
            removed: removed.removed,
        })
    }

    /// Count stored composites.
    pub async fn cache_stats(&self, ctx: &RequestContext) -> ApiV1Response<ApiV1CacheStatsDto> {
        let result = cache_stats(ctx, &self.scoped_deps(ctx))
            .await
            .map(|stats| cache_stats_to_api_v1(&stats));
        result_to_api_v1_response(result, None)
    }

    /// Delete composites past the freshness window.
    pub async fn cleanup_expired(&self, ctx: &RequestContext) -> ApiV1Response<ApiV1RemovedDto> {
        let result = cleanup_expired(ctx, &self.scoped_deps(ctx))
            .await
            .map(|removed| ApiV1RemovedDto {
                removed: removed.removed,
            });
        result_to_api_v1_response(result, None)
    }

    /// Warm director and soundtrack records across the catalog.
    pub async fn warm_all(
        &self,
        ctx: &RequestContext,
        request: &ApiV1WarmAllRequestDto,
    ) -> ApiV1Response<ApiV1WarmSummaryDto> {
        result_to_api_v1_response(self.try_warm_all(ctx, request).await, None)
    }

    async fn try_warm_all(
        &self,
        ctx: &RequestContext,
        request: &ApiV1WarmAllRequestDto,
    ) -> InfraResult<ApiV1WarmSummaryDto> {
        let target = validate_warm_all_request(
            request,
            self.default_language(),
            self.config.warm_concurrency(),
        )?;
        let input = WarmAllInput {
            language: target.language,
            max_concurrency: target.max_concurrency,
        };
        let summary = warm_all(ctx, &self.scoped_deps(ctx), input).await?;
        Ok(warm_summary_to_api_v1(&summary))
    }

    /// Warm one catalog item.
    pub async fn warm_one(
        &self,
        ctx: &RequestContext,
        request: &ApiV1WarmOneRequestDto,
    ) -> ApiV1Response<ApiV1WarmItemDto> {
        result_to_api_v1_response(self.try_warm_one(ctx, request).await, None)
    }

    async fn try_warm_one(
        &self,
        ctx: &RequestContext,
        request: &ApiV1WarmOneRequestDto,
    ) -> InfraResult<ApiV1WarmItemDto> {
        let target = validate_warm_one_request(request, self.default_language())?;
        let input = WarmOneInput {
            subject_id: target.subject_id,
            language: target.language,
        };
        let warmed = warm_one(ctx, &self.scoped_deps(ctx), input).await?;
        Ok(warm_item_to_api_v1(&warmed))
    }

    /// Warm a caller-supplied item that need not be in the catalog.
    pub async fn warm_item(
        &self,
        ctx: &RequestContext,
        request: &ApiV1WarmItemRequestDto,
    ) -> ApiV1Response<ApiV1WarmItemDto> {
        result_to_api_v1_response(self.try_warm_item(ctx, request).await, None)
    }

    async fn try_warm_item(
        &self,
        ctx: &RequestContext,
        request: &ApiV1WarmItemRequestDto,
    ) -> InfraResult<ApiV1WarmItemDto> {
        let target = validate_warm_item_request(request, self.default_language())?;
        let warmed = warm_item(ctx, &self.scoped_deps(ctx), target.item, target.language).await?;
        Ok(warm_item_to_api_v1(&warmed))
    }

    /// Report enrichment coverage of the catalog.
    pub async fn warm_stats(&self, ctx: &RequestContext) -> ApiV1Response<ApiV1WarmStatsDto> {
        let result = warm_stats(ctx, &self.scoped_deps(ctx))
            .await
            .map(|coverage| warm_stats_to_api_v1(&coverage));
        result_to_api_v1_response(result, None)
    }
}

/// Per-call budgets derived from config.
///
/// Director and soundtrack resolutions chain several upstream requests, so
/// they keep the longer defaults; single-request calls use their own timeout.
#[must_use]
pub fn call_budgets(config: &ValidatedBackendConfig) -> CallBudgets {
    let defaults = CallBudgets::default();
    CallBudgets {
        store: config.store_timeout(),
        director: defaults.director,
        soundtrack: defaults.soundtrack,
        translation: Duration::from_millis(config.providers.openai.translation_timeout_ms),
        portrait: Duration::from_millis(config.providers.portrait.timeout_ms),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinedex_config::BackendConfig;

    #[test]
    fn budgets_follow_configured_timeouts() -> InfraResult<()> {
        let mut config = BackendConfig::default();
        config.core.timeout_ms = 1_500;
        config.providers.openai.translation_timeout_ms = 900;
        let budgets = call_budgets(&config.validate_and_normalize()?);
        assert_eq!(budgets.store, Duration::from_millis(1_500));
        assert_eq!(budgets.translation, Duration::from_millis(900));
        assert_eq!(budgets.director, CallBudgets::default().director);
        Ok(())
    }
}
