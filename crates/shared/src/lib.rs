//! # cinedex-shared
//!
//! Shared result types, error handling, and concurrency primitives for the
//! cinedex workspace.
//!
//! - Result and error envelope types
//! - Request context with cooperative cancellation
//! - A bounded worker pool for concurrent fan-out
//! - Timeout helpers and secret redaction
//!
//! This crate has no workspace dependencies.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod concurrency;
pub mod errors;
pub mod redaction;
pub mod result;
pub mod timeout;

pub use concurrency::{
    CancellationToken, CorrelationId, RequestContext, WorkerPool, WorkerPoolOptions,
};
pub use errors::{ErrorClass, ErrorCode, ErrorEnvelope, ErrorKind, ErrorMetadata};
pub use redaction::{REDACTED, SecretString, is_secret_key, redact_if_secret};
pub use result::{Result, ResultExt};
pub use timeout::timeout_with_context;

/// Returns the shared crate version.
#[must_use]
pub const fn shared_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
