//! Warm command handlers.

use crate::error::CliError;
use crate::format::OutputMode;
use crate::{CliOutput, ConfigSource, Renderer, format_error_output, run_backend_op};
use cinedex_api::v1::{
    ApiV1WarmAllRequestDto, ApiV1WarmItemDto, ApiV1WarmItemRequestDto, ApiV1WarmOneRequestDto,
    ApiV1WarmStatsDto, ApiV1WarmSummaryDto,
};
use cinedex_shared::ErrorEnvelope;
use std::path::Path;

/// Run `warm all`.
pub fn run_warm_all(
    mode: OutputMode,
    source: ConfigSource<'_>,
    language: Option<&str>,
    max_concurrency: Option<u32>,
) -> Result<CliOutput, CliError> {
    let request = ApiV1WarmAllRequestDto {
        language: language.map(str::to_owned),
        max_concurrency,
    };
    run_backend_op(
        mode,
        source,
        "warm.all",
        move |backend, ctx| async move { backend.warm_all(&ctx, &request).await },
        &Renderer {
            text: format_summary_text,
            ndjson_items: summary_item_lines,
        },
    )
}

/// Run `warm one`.
pub fn run_warm_one(
    mode: OutputMode,
    source: ConfigSource<'_>,
    subject_id: &str,
    language: Option<&str>,
) -> Result<CliOutput, CliError> {
    let request = ApiV1WarmOneRequestDto {
        subject_id: subject_id.to_owned(),
        language: language.map(str::to_owned),
    };
    run_backend_op(
        mode,
        source,
        "warm.one",
        move |backend, ctx| async move { backend.warm_one(&ctx, &request).await },
        &Renderer::text(format_item_text),
    )
}

/// Run `warm item --file`.
pub fn run_warm_item(
    mode: OutputMode,
    source: ConfigSource<'_>,
    file: &Path,
    language: Option<&str>,
) -> Result<CliOutput, CliError> {
    let raw = std::fs::read_to_string(file)?;
    let item: serde_json::Value = match serde_json::from_str(&raw) {
        Ok(item) => item,
        Err(error) => {
            let error = ErrorEnvelope::invalid_input(format!("item file is not JSON: {error}"))
                .with_metadata("path", file.display().to_string());
            return Ok(format_error_output(mode, "warm.item", &error));
        },
    };
    let request = ApiV1WarmItemRequestDto {
        item,
        language: language.map(str::to_owned),
    };
    run_backend_op(
        mode,
        source,
        "warm.item",
        move |backend, ctx| async move { backend.warm_item(&ctx, &request).await },
        &Renderer::text(format_item_text),
    )
}

/// Run `warm stats`.
pub fn run_warm_stats(mode: OutputMode, source: ConfigSource<'_>) -> Result<CliOutput, CliError> {
    run_backend_op(
        mode,
        source,
        "warm.stats",
        |backend, ctx| async move { backend.warm_stats(&ctx).await },
        &Renderer::text(format_coverage_text),
    )
}

fn summary_item_lines(summary: &ApiV1WarmSummaryDto) -> Vec<serde_json::Value> {
    summary
        .per_item_results
        .iter()
        .map(|item| serde_json::json!({ "type": "item", "item": item }))
        .collect()
}

fn format_summary_text(summary: &ApiV1WarmSummaryDto) -> String {
    let mut out = format!(
        "total: {}\nsuccess: {}\nalreadyExists: {}\nerrors: {}\n",
        summary.total, summary.success, summary.already_exists, summary.errors
    );
    let failed: Vec<&ApiV1WarmItemDto> = summary
        .per_item_results
        .iter()
        .filter(|item| item.status == "error")
        .collect();
    if !failed.is_empty() {
        out.push_str("failed:\n");
        for item in failed {
            out.push_str(&format!(
                "  {} ({}): {}\n",
                item.subject_id,
                item.title,
                item.message.as_deref().unwrap_or("unknown error")
            ));
        }
    }
    out
}

fn format_item_text(item: &ApiV1WarmItemDto) -> String {
    let mut out = format!(
        "subjectId: {}\ntitle: {}\nresult: {}\ndirector: {}\nsoundtrack: {}\n",
        item.subject_id, item.title, item.status, item.director, item.soundtrack
    );
    if let Some(message) = item.message.as_deref() {
        out.push_str(&format!("message: {message}\n"));
    }
    out
}

fn format_coverage_text(stats: &ApiV1WarmStatsDto) -> String {
    format!(
        "totalItems: {}\ntotalDirectors: {}\ntotalSoundtracks: {}\ndirectorCoverage: {:.1}\nsoundtrackCoverage: {:.1}\noverallCoverage: {:.1}\n",
        stats.total_items,
        stats.total_directors,
        stats.total_soundtracks,
        stats.director_coverage,
        stats.soundtrack_coverage,
        stats.overall_coverage
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(subject_id: &str, status: &str, message: Option<&str>) -> ApiV1WarmItemDto {
        ApiV1WarmItemDto {
            subject_id: subject_id.to_owned(),
            title: format!("Film {subject_id}"),
            status: status.to_owned(),
            director: "fetched".to_owned(),
            soundtrack: "fetched".to_owned(),
            message: message.map(str::to_owned),
        }
    }

    #[test]
    fn summary_text_lists_only_failures() {
        let summary = ApiV1WarmSummaryDto {
            total: 2,
            success: 1,
            already_exists: 0,
            errors: 1,
            per_item_results: vec![
                item("m1", "success", None),
                item("m2", "error", Some("director: upstream 503")),
            ],
        };
        let text = format_summary_text(&summary);
        assert!(text.contains("errors: 1\n"));
        assert!(text.contains("  m2 (Film m2): director: upstream 503\n"));
        assert!(!text.contains("m1 ("));
    }

    #[test]
    fn ndjson_emits_one_line_per_item() {
        let summary = ApiV1WarmSummaryDto {
            total: 2,
            success: 2,
            already_exists: 0,
            errors: 0,
            per_item_results: vec![item("m1", "success", None), item("m2", "success", None)],
        };
        let lines = summary_item_lines(&summary);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["item"]["subjectId"], "m2");
    }
}
