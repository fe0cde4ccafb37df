//! Cache maintenance command handlers.

use crate::commands::detail::format_removed_text;
use crate::error::CliError;
use crate::format::OutputMode;
use crate::{CliOutput, ConfigSource, Renderer, run_backend_op};
use cinedex_api::v1::ApiV1CacheStatsDto;

/// Run `cache stats`.
pub fn run_cache_stats(mode: OutputMode, source: ConfigSource<'_>) -> Result<CliOutput, CliError> {
    run_backend_op(
        mode,
        source,
        "cache.stats",
        |backend, ctx| async move { backend.cache_stats(&ctx).await },
        &Renderer::text(format_stats_text),
    )
}

/// Run `cache cleanup`.
pub fn run_cache_cleanup(mode: OutputMode, source: ConfigSource<'_>) -> Result<CliOutput, CliError> {
    run_backend_op(
        mode,
        source,
        "cache.cleanup",
        |backend, ctx| async move { backend.cleanup_expired(&ctx).await },
        &Renderer::text(format_removed_text),
    )
}

fn format_stats_text(stats: &ApiV1CacheStatsDto) -> String {
    let mut out = format!(
        "total: {}\nvalid: {}\nexpired: {}\n",
        stats.total, stats.valid, stats.expired
    );
    if !stats.per_language_counts.is_empty() {
        out.push_str("languages:\n");
        for entry in &stats.per_language_counts {
            out.push_str(&format!("  {}: {}\n", entry.language, entry.count));
        }
    }
    out
}
