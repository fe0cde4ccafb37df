//! Detail command handlers.

use crate::error::CliError;
use crate::format::OutputMode;
use crate::{CliOutput, ConfigSource, Renderer, run_backend_op};
use cinedex_api::v1::{
    ApiV1GetDetailRequestDto, ApiV1GetDetailResponseDto, ApiV1InvalidateDetailRequestDto,
    ApiV1RemovedDto,
};

/// Run `detail get`.
pub fn run_detail_get(
    mode: OutputMode,
    source: ConfigSource<'_>,
    subject_id: &str,
    language: Option<&str>,
) -> Result<CliOutput, CliError> {
    let request = ApiV1GetDetailRequestDto {
        subject_id: subject_id.to_owned(),
        language: language.map(str::to_owned),
    };
    run_backend_op(
        mode,
        source,
        "detail.get",
        move |backend, ctx| async move { backend.get_detail(&ctx, &request).await },
        &Renderer::text(format_detail_text),
    )
}

/// Run `detail invalidate`.
pub fn run_detail_invalidate(
    mode: OutputMode,
    source: ConfigSource<'_>,
    subject_id: &str,
    language: Option<&str>,
) -> Result<CliOutput, CliError> {
    let request = ApiV1InvalidateDetailRequestDto {
        subject_id: subject_id.to_owned(),
        language: language.map(str::to_owned),
    };
    run_backend_op(
        mode,
        source,
        "detail.invalidate",
        move |backend, ctx| async move { backend.invalidate_detail(&ctx, &request).await },
        &Renderer::text(format_removed_text),
    )
}

pub(crate) fn format_removed_text(removed: &ApiV1RemovedDto) -> String {
    format!("removed: {}\n", removed.removed)
}

fn format_detail_text(response: &ApiV1GetDetailResponseDto) -> String {
    let detail = &response.detail;
    let mut out = format!(
        "cacheKey: {}\nsubjectId: {}\nlanguage: {}\n",
        detail.cache_key, detail.subject_id, detail.language
    );
    if let Some(title) = detail.base.get("title").and_then(|value| value.as_str()) {
        out.push_str(&format!("title: {title}\n"));
    }
    out.push_str(&format!("fromCache: {}\n", response.from_cache));
    if let Some(age) = response.cache_age_hours {
        out.push_str(&format!("cacheAgeHours: {age:.1}\n"));
    }

    match detail.director.as_ref() {
        Some(director) => {
            out.push_str(&format!("director: {}\n", director.name));
            if let Some(photo) = director.photo.as_deref() {
                out.push_str(&format!("  photo: {photo}\n"));
            }
            out.push_str(&format!("  biography: {}\n", director.biography));
        },
        None => out.push_str("director: none\n"),
    }

    match detail.soundtrack.as_ref() {
        Some(soundtrack) => {
            out.push_str(&format!(
                "soundtrack: {} tracks ({})\n",
                soundtrack.tracks.len(),
                soundtrack.provenance
            ));
            for (position, track) in soundtrack.tracks.iter().enumerate() {
                out.push_str(&format!(
                    "  {}. {} - {}\n",
                    position + 1,
                    track.title,
                    track.artist
                ));
            }
        },
        None => out.push_str("soundtrack: none\n"),
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinedex_api::v1::{ApiV1DetailDto, ApiV1DirectorDto};

    #[test]
    fn text_lists_missing_enrichment_as_none() {
        let mut base = serde_json::Map::new();
        base.insert("title".to_owned(), serde_json::json!("Blade Runner"));
        let response = ApiV1GetDetailResponseDto {
            detail: ApiV1DetailDto {
                cache_key: "m1_pt".to_owned(),
                subject_id: "m1".to_owned(),
                language: "pt".to_owned(),
                base,
                director: Some(ApiV1DirectorDto {
                    name: "Ridley Scott".to_owned(),
                    biography: "Diretor britânico.".to_owned(),
                    photo: None,
                }),
                soundtrack: None,
                created_at_ms: 0,
            },
            from_cache: true,
            cache_age_hours: Some(2.0),
        };
        let text = format_detail_text(&response);
        assert!(text.contains("title: Blade Runner\n"));
        assert!(text.contains("cacheAgeHours: 2.0\n"));
        assert!(text.contains("director: Ridley Scott\n"));
        assert!(text.contains("soundtrack: none\n"));
    }
}
