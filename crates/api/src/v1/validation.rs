//! API v1 request validation: shape and limit checks, before any I/O.

use crate::v1::{
    ApiV1GetDetailRequestDto, ApiV1InvalidateDetailRequestDto, ApiV1WarmAllRequestDto,
    ApiV1WarmItemRequestDto, ApiV1WarmOneRequestDto,
};
use cinedex_domain::{CatalogItem, Language, PrimitiveError, SubjectId};
use cinedex_shared::ErrorEnvelope;
use std::fmt;

/// Upper bound accepted for a caller-supplied warm concurrency.
pub const API_V1_MAX_WARM_CONCURRENCY: u32 = 32;

/// Validation failure details for API v1 DTOs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiV1ValidationIssue {
    /// Field name that failed validation.
    pub field: &'static str,
    /// Human-readable validation error message.
    pub message: Box<str>,
}

impl ApiV1ValidationIssue {
    fn new(field: &'static str, message: impl Into<Box<str>>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    fn from_primitive(field: &'static str, error: &PrimitiveError) -> Self {
        Self::new(field, error.to_string())
    }
}

impl fmt::Display for ApiV1ValidationIssue {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ApiV1ValidationIssue {}

impl From<ApiV1ValidationIssue> for ErrorEnvelope {
    fn from(issue: ApiV1ValidationIssue) -> Self {
        Self::invalid_input(issue.to_string()).with_metadata("field", issue.field)
    }
}

/// A validated detail address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiV1DetailTarget {
    /// Subject to read or warm.
    pub subject_id: SubjectId,
    /// Resolved language.
    pub language: Language,
}

/// A validated invalidation scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiV1InvalidateTarget {
    /// Subject whose records are dropped.
    pub subject_id: SubjectId,
    /// Only this language; every language when `None`.
    pub language: Option<Language>,
}

/// A validated bulk warm request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiV1WarmAllTarget {
    /// Resolved language.
    pub language: Language,
    /// Worker bound.
    pub max_concurrency: usize,
}

/// A validated raw-item warm request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiV1WarmItemTarget {
    /// Caller-supplied item.
    pub item: CatalogItem,
    /// Resolved language.
    pub language: Language,
}

/// Validate a get-detail request DTO.
pub fn validate_get_detail_request(
    dto: &ApiV1GetDetailRequestDto,
    default_language: Language,
) -> Result<ApiV1DetailTarget, ApiV1ValidationIssue> {
    Ok(ApiV1DetailTarget {
        subject_id: parse_subject_id(&dto.subject_id)?,
        language: parse_language(dto.language.as_deref(), default_language)?,
    })
}

/// Validate an invalidation request DTO.
pub fn validate_invalidate_detail_request(
    dto: &ApiV1InvalidateDetailRequestDto,
) -> Result<ApiV1InvalidateTarget, ApiV1ValidationIssue> {
    let language = match dto.language.as_deref() {
        None => None,
        Some(raw) => Some(
            Language::parse(raw)
                .map_err(|error| ApiV1ValidationIssue::from_primitive("language", &error))?,
        ),
    };
    Ok(ApiV1InvalidateTarget {
        subject_id: parse_subject_id(&dto.subject_id)?,
        language,
    })
}

/// Validate a bulk warm request DTO.
pub fn validate_warm_all_request(
    dto: &ApiV1WarmAllRequestDto,
    default_language: Language,
    default_concurrency: usize,
) -> Result<ApiV1WarmAllTarget, ApiV1ValidationIssue> {
    let language = parse_language(dto.language.as_deref(), default_language)?;
    let max_concurrency = match dto.max_concurrency {
        None => default_concurrency,
        Some(value) if (1..=API_V1_MAX_WARM_CONCURRENCY).contains(&value) => {
            usize::try_from(value).map_err(|_| concurrency_issue())?
        },
        Some(_) => return Err(concurrency_issue()),
    };
    Ok(ApiV1WarmAllTarget {
        language,
        max_concurrency,
    })
}

/// Validate a single-item warm request DTO.
pub fn validate_warm_one_request(
    dto: &ApiV1WarmOneRequestDto,
    default_language: Language,
) -> Result<ApiV1DetailTarget, ApiV1ValidationIssue> {
    Ok(ApiV1DetailTarget {
        subject_id: parse_subject_id(&dto.subject_id)?,
        language: parse_language(dto.language.as_deref(), default_language)?,
    })
}

/// Validate a raw-item warm request DTO.
pub fn validate_warm_item_request(
    dto: &ApiV1WarmItemRequestDto,
    default_language: Language,
) -> Result<ApiV1WarmItemTarget, ApiV1ValidationIssue> {
    let item: CatalogItem = serde_json::from_value(dto.item.clone())
        .map_err(|error| ApiV1ValidationIssue::new("item", error.to_string()))?;
    let item = item.validated().map_err(|error| {
        let field = match error {
            PrimitiveError::EmptyTitle => "item.title",
            _ => "item.id",
        };
        ApiV1ValidationIssue::from_primitive(field, &error)
    })?;
    Ok(ApiV1WarmItemTarget {
        item,
        language: parse_language(dto.language.as_deref(), default_language)?,
    })
}

fn parse_subject_id(raw: &str) -> Result<SubjectId, ApiV1ValidationIssue> {
    SubjectId::parse(raw).map_err(|error| ApiV1ValidationIssue::from_primitive("subjectId", &error))
}

fn parse_language(
    raw: Option<&str>,
    default_language: Language,
) -> Result<Language, ApiV1ValidationIssue> {
    raw.map_or(Ok(default_language), |raw| {
        Language::parse(raw).map_err(|error| ApiV1ValidationIssue::from_primitive("language", &error))
    })
}

fn concurrency_issue() -> ApiV1ValidationIssue {
    ApiV1ValidationIssue::new(
        "maxConcurrency",
        format!("value must be between 1 and {API_V1_MAX_WARM_CONCURRENCY}"),
    )
}
