//! API v1 DTOs and helpers.

mod mappers;
mod schema;
mod types;
mod validation;

pub use mappers::{
    cache_stats_to_api_v1, detail_response_to_api_v1, detail_to_api_v1, director_to_api_v1,
    error_code_to_api_v1, error_envelope_to_api_v1_error, result_to_api_v1_response,
    result_to_api_v1_result, soundtrack_to_api_v1, warm_item_to_api_v1, warm_stats_to_api_v1,
    warm_summary_to_api_v1,
};
pub use schema::{
    api_v1_cache_stats_schema, api_v1_detail_response_schema, api_v1_get_detail_request_schema,
    api_v1_warm_all_request_schema, api_v1_warm_stats_schema, api_v1_warm_summary_schema,
};
pub use types::*;
pub use validation::{
    API_V1_MAX_WARM_CONCURRENCY, ApiV1DetailTarget, ApiV1InvalidateTarget, ApiV1ValidationIssue,
    ApiV1WarmAllTarget, ApiV1WarmItemTarget, validate_get_detail_request,
    validate_invalidate_detail_request, validate_warm_all_request, validate_warm_item_request,
    validate_warm_one_request,
};
