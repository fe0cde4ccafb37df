//! Shared HTTP plumbing for provider adapters: client construction,
//! cancellable sends, and error mapping onto `provider:*` codes.

use cinedex_shared::{ErrorClass, ErrorCode, ErrorEnvelope, RequestContext, Result};
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use std::time::Duration;

const USER_AGENT: &str = concat!("cinedex/", env!("CARGO_PKG_VERSION"));

/// Build a client with a default per-request timeout and headers.
pub(crate) fn build_client(
    provider: &'static str,
    timeout_ms: u64,
    headers: HeaderMap,
) -> Result<reqwest::Client> {
    if timeout_ms == 0 {
        return Err(ErrorEnvelope::expected(
            ErrorCode::invalid_input(),
            "timeout must be greater than zero",
        )
        .with_metadata("provider", provider));
    }
    reqwest::Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .build()
        .map_err(|error| {
            ErrorEnvelope::unexpected(
                ErrorCode::provider("client_init_failed"),
                format!("failed to build {provider} client: {error}"),
                ErrorClass::NonRetriable,
            )
        })
}

/// Trim a base URL and drop trailing slashes.
pub(crate) fn normalize_base_url(provider: &'static str, value: &str) -> Result<Box<str>> {
    let trimmed = value.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ErrorEnvelope::expected(
            ErrorCode::invalid_input(),
            format!("{provider} base url must be non-empty"),
        ));
    }
    Ok(trimmed.into())
}

/// Send a request, racing it against cancellation, and return the status and
/// raw body.
pub(crate) async fn send(
    ctx: &RequestContext,
    provider: &'static str,
    operation: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<(StatusCode, Vec<u8>)> {
    ctx.ensure_not_cancelled(operation)?;

    let response = tokio::select! {
        () = ctx.cancelled() => return Err(cancelled_error(operation)),
        result = request.send() => result.map_err(|error| map_reqwest_error(provider, &error.without_url()))?,
    };

    let status = response.status();
    let payload = tokio::select! {
        () = ctx.cancelled() => return Err(cancelled_error(operation)),
        result = response.bytes() => result.map_err(|error| map_reqwest_error(provider, &error.without_url()))?,
    };
    Ok((status, payload.to_vec()))
}

/// Send a request and decode a successful JSON body.
pub(crate) async fn send_json<T: DeserializeOwned>(
    ctx: &RequestContext,
    provider: &'static str,
    operation: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<T> {
    let (status, payload) = send(ctx, provider, operation, request).await?;
    if !status.is_success() {
        return Err(map_http_status(provider, status));
    }
    decode_json(provider, &payload)
}

pub(crate) fn decode_json<T: DeserializeOwned>(provider: &'static str, payload: &[u8]) -> Result<T> {
    serde_json::from_slice(payload).map_err(|error| malformed(provider, &error.to_string()))
}

pub(crate) fn malformed(provider: &'static str, detail: &str) -> ErrorEnvelope {
    ErrorEnvelope::provider(
        "malformed_response",
        format!("{provider} returned an unexpected payload: {detail}"),
        ErrorClass::NonRetriable,
    )
    .with_metadata("provider", provider)
}

pub(crate) fn no_match(provider: &'static str, message: impl Into<String>) -> ErrorEnvelope {
    ErrorEnvelope::provider("no_match", message, ErrorClass::NonRetriable)
        .with_metadata("provider", provider)
}

pub(crate) fn not_configured(provider: &'static str) -> ErrorEnvelope {
    ErrorEnvelope::provider(
        "not_configured",
        format!("{provider} credentials are not configured"),
        ErrorClass::NonRetriable,
    )
    .with_metadata("provider", provider)
}

pub(crate) fn map_http_status(provider: &'static str, status: StatusCode) -> ErrorEnvelope {
    let envelope = match status {
        StatusCode::TOO_MANY_REQUESTS => ErrorEnvelope::provider(
            "rate_limited",
            format!("{provider} rate limit reached"),
            ErrorClass::Retriable,
        ),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ErrorEnvelope::unexpected(
            ErrorCode::timeout(),
            format!("{provider} request timed out"),
            ErrorClass::Retriable,
        ),
        _ if status.is_server_error() => ErrorEnvelope::provider(
            "http",
            format!("{provider} is unavailable"),
            ErrorClass::Retriable,
        ),
        _ => ErrorEnvelope::provider(
            "http",
            format!("{provider} rejected the request"),
            ErrorClass::NonRetriable,
        ),
    };
    envelope
        .with_metadata("provider", provider)
        .with_metadata("status", status.as_u16().to_string())
}

fn map_reqwest_error(provider: &'static str, error: &reqwest::Error) -> ErrorEnvelope {
    let envelope = if error.is_timeout() {
        ErrorEnvelope::unexpected(
            ErrorCode::timeout(),
            format!("{provider} request timed out"),
            ErrorClass::Retriable,
        )
    } else if error.is_connect() {
        ErrorEnvelope::provider(
            "http",
            format!("{provider} connection failed: {error}"),
            ErrorClass::Retriable,
        )
    } else {
        ErrorEnvelope::provider(
            "http",
            format!("{provider} request failed: {error}"),
            ErrorClass::NonRetriable,
        )
    };
    envelope.with_metadata("provider", provider)
}

fn cancelled_error(operation: &'static str) -> ErrorEnvelope {
    ErrorEnvelope::cancelled("operation cancelled").with_metadata("operation", operation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limits_are_retriable() {
        let error = map_http_status("tmdb", StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(error.code, ErrorCode::provider("rate_limited"));
        assert_eq!(error.class, ErrorClass::Retriable);
        assert_eq!(error.metadata.get("status").map(String::as_str), Some("429"));
    }

    #[test]
    fn client_errors_are_not_retriable() {
        let error = map_http_status("spotify", StatusCode::UNAUTHORIZED);
        assert_eq!(error.code, ErrorCode::provider("http"));
        assert_eq!(error.class, ErrorClass::NonRetriable);
    }

    #[test]
    fn base_urls_lose_trailing_slashes() -> Result<()> {
        assert_eq!(&*normalize_base_url("tmdb", " https://x.test/3/ ")?, "https://x.test/3");
        assert!(normalize_base_url("tmdb", "  ").is_err());
        Ok(())
    }
}
