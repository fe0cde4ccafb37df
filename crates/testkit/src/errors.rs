//! Test fixtures for shared error codes and envelopes.

use cinedex_shared::{ErrorClass, ErrorCode, ErrorEnvelope};

/// Return a list of common error codes used in tests.
pub fn common_error_codes() -> Vec<ErrorCode> {
    vec![
        ErrorCode::cancelled(),
        ErrorCode::invalid_input(),
        ErrorCode::not_found(),
        ErrorCode::timeout(),
        ErrorCode::io(),
        ErrorCode::internal(),
        ErrorCode::store("unavailable"),
        ErrorCode::provider("http"),
    ]
}

/// A cancellation error fixture.
pub fn cancelled_error() -> ErrorEnvelope {
    ErrorEnvelope::cancelled("cancelled")
}

/// A retriable store outage fixture.
pub fn store_down_error() -> ErrorEnvelope {
    ErrorEnvelope::store_unavailable("store is down")
}

/// An upstream provider failure fixture.
pub fn provider_error(message: &str) -> ErrorEnvelope {
    ErrorEnvelope::provider("http", message, ErrorClass::Retriable)
}

/// A provider "nothing found" fixture.
pub fn no_match_error(subject: &str) -> ErrorEnvelope {
    ErrorEnvelope::provider(
        "no_match",
        format!("no result for {subject}"),
        ErrorClass::NonRetriable,
    )
}
