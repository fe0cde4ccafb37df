//! JSON Schema exports for API v1 DTOs.

use crate::v1::{
    ApiV1CacheStatsDto, ApiV1GetDetailRequestDto, ApiV1GetDetailResponseDto,
    ApiV1WarmAllRequestDto, ApiV1WarmStatsDto, ApiV1WarmSummaryDto,
};
use schemars::{Schema, schema_for};

/// JSON Schema for `ApiV1GetDetailRequestDto`.
#[must_use]
pub fn api_v1_get_detail_request_schema() -> Schema {
    schema_for!(ApiV1GetDetailRequestDto)
}

/// JSON Schema for `ApiV1WarmAllRequestDto`.
#[must_use]
pub fn api_v1_warm_all_request_schema() -> Schema {
    schema_for!(ApiV1WarmAllRequestDto)
}

/// JSON Schema for `ApiV1GetDetailResponseDto`.
#[must_use]
pub fn api_v1_detail_response_schema() -> Schema {
    schema_for!(ApiV1GetDetailResponseDto)
}

/// JSON Schema for `ApiV1CacheStatsDto`.
#[must_use]
pub fn api_v1_cache_stats_schema() -> Schema {
    schema_for!(ApiV1CacheStatsDto)
}

/// JSON Schema for `ApiV1WarmSummaryDto`.
#[must_use]
pub fn api_v1_warm_summary_schema() -> Schema {
    schema_for!(ApiV1WarmSummaryDto)
}

/// JSON Schema for `ApiV1WarmStatsDto`.
#[must_use]
pub fn api_v1_warm_stats_schema() -> Schema {
    schema_for!(ApiV1WarmStatsDto)
}
