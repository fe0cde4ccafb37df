//! Document store adapters.
//!
//! Both backends implement the same upsert/filter semantics; the in-memory
//! store backs tests and throwaway runs, SQLite backs everything else.

use cinedex_shared::{ErrorClass, ErrorCode, ErrorEnvelope};
use std::time::{SystemTime, UNIX_EPOCH};

mod memory;
mod sqlite;

pub use memory::InMemoryDocumentStore;
pub use sqlite::SqliteDocumentStore;

pub(super) const SCHEMA_VERSION: i64 = 1;

pub(super) fn legacy_suffix(found_version: i64) -> String {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_secs());
    format!("v{found_version}_{stamp}")
}

pub(super) fn store_error(operation: &'static str, message: &str) -> ErrorEnvelope {
    ErrorEnvelope::store_unavailable(format!("document store {operation} failed: {message}"))
        .with_metadata("operation", operation)
}

pub(super) fn corrupt_document(key: &str, message: &str) -> ErrorEnvelope {
    ErrorEnvelope::unexpected(
        ErrorCode::store("corrupt_document"),
        format!("stored document is not valid JSON: {message}"),
        ErrorClass::NonRetriable,
    )
    .with_metadata("key", key)
}
