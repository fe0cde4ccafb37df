//! API v1 wire-format contract tests.

use cinedex_api::v1::{
    ApiV1GetDetailRequestDto, ApiV1Result, ApiV1WarmSummaryDto, StatusKind,
    api_v1_detail_response_schema, api_v1_get_detail_request_schema, detail_response_to_api_v1,
    error_envelope_to_api_v1_error, result_to_api_v1_response, warm_summary_to_api_v1,
};
use cinedex_domain::{
    CatalogItem, CompositeRecord, DirectorRecord, EnrichmentState, Language, SubjectId,
    WarmItemResult, WarmStatus, WarmSummary,
};
use cinedex_shared::{ErrorCode, ErrorEnvelope};
use serde_json::json;
use std::error::Error;

#[test]
fn error_result_has_stable_shape() -> Result<(), Box<dyn Error>> {
    let envelope = ErrorEnvelope::expected(
        ErrorCode::new("domain", "unsupported_language"),
        "unsupported language `de` (expected one of: pt, en, es, fr)",
    )
    .with_metadata("input", "de")
    .with_metadata("token", "secret-token");

    let dto = error_envelope_to_api_v1_error(&envelope, None);
    let result: ApiV1Result<()> = ApiV1Result::err(dto);
    assert_eq!(
        serde_json::to_value(&result)?,
        json!({
            "ok": false,
            "error": {
                "code": "ERR_DOMAIN_UNSUPPORTED_LANGUAGE",
                "message": "unsupported language `de` (expected one of: pt, en, es, fr)",
                "kind": "EXPECTED",
                "meta": { "input": "de", "token": "[REDACTED]" }
            }
        })
    );
    Ok(())
}

#[test]
fn detail_response_serializes_camel_case() -> Result<(), Box<dyn Error>> {
    let base = CatalogItem::new(
        SubjectId::parse("m1")?,
        "Blade Runner",
        Some(1982),
        Some("Ridley Scott"),
    );
    let director = DirectorRecord {
        name: "Ridley Scott".into(),
        biography: "British director.".into(),
        photo: None,
    };
    let record = CompositeRecord::assemble(base, Language::Pt, Some(director), None, 42);
    let dto = detail_response_to_api_v1(&record, true, Some(1.5));

    let (payload, status) = result_to_api_v1_response(Ok::<_, ErrorEnvelope>(dto), None);
    assert_eq!(status, StatusKind::Ok);
    assert_eq!(
        serde_json::to_value(&payload)?,
        json!({
            "ok": true,
            "data": {
                "detail": {
                    "cacheKey": "m1_pt",
                    "subjectId": "m1",
                    "language": "pt",
                    "base": {
                        "id": "m1",
                        "title": "Blade Runner",
                        "year": 1982,
                        "director": "Ridley Scott"
                    },
                    "director": {
                        "name": "Ridley Scott",
                        "biography": "British director.",
                        "photo": null
                    },
                    "soundtrack": null,
                    "createdAtMs": 42
                },
                "fromCache": true,
                "cacheAgeHours": 1.5
            }
        })
    );
    Ok(())
}

#[test]
fn warm_summary_reports_items_in_order() -> Result<(), Box<dyn Error>> {
    let items = vec![
        WarmItemResult {
            subject_id: SubjectId::parse("m1")?,
            title: "Blade Runner".into(),
            status: WarmStatus::AlreadyExists,
            director: EnrichmentState::Cached,
            soundtrack: EnrichmentState::Cached,
            message: None,
        },
        WarmItemResult {
            subject_id: SubjectId::parse("m2")?,
            title: "Alien".into(),
            status: WarmStatus::Error,
            director: EnrichmentState::Cached,
            soundtrack: EnrichmentState::FetchFailed,
            message: Some("soundtrack: provider timeout".into()),
        },
    ];
    let dto: ApiV1WarmSummaryDto = warm_summary_to_api_v1(&WarmSummary::from_items(items));
    let value = serde_json::to_value(&dto)?;

    assert_eq!(value["total"], json!(2));
    assert_eq!(value["alreadyExists"], json!(1));
    assert_eq!(value["errors"], json!(1));
    assert_eq!(value["perItemResults"][0]["subjectId"], json!("m1"));
    assert_eq!(value["perItemResults"][1]["soundtrack"], json!("fetch_failed"));
    assert!(value["perItemResults"][0].get("message").is_none());
    Ok(())
}

#[test]
fn request_rejects_unknown_fields() {
    let parsed: Result<ApiV1GetDetailRequestDto, _> =
        serde_json::from_value(json!({ "subjectId": "m1", "lang": "en" }));
    assert!(parsed.is_err());
}

#[test]
fn schemas_name_camel_case_properties() -> Result<(), Box<dyn Error>> {
    let request = serde_json::to_value(api_v1_get_detail_request_schema())?;
    assert!(request["properties"].get("subjectId").is_some());

    let response = serde_json::to_value(api_v1_detail_response_schema())?;
    assert!(response["properties"].get("fromCache").is_some());
    Ok(())
}
