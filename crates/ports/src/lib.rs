//! # cinedex-ports
//!
//! Port traits for the cinedex hexagonal architecture.
//!
//! This crate defines the interfaces between the use cases and the
//! infrastructure: catalog lookup, the document store, enrichment providers,
//! translation, portrait lookup, time, and logging. It depends only on
//! `domain` and `shared`.

use std::future::Future;
use std::pin::Pin;

/// Boxed future used by port traits.
///
/// Boundary calls are I/O-bound, so the allocation is negligible and keeps the
/// traits object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Returns the ports crate version.
#[must_use]
pub const fn ports_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub mod catalog;
pub mod clock;
pub mod enrichment;
pub mod logger;
pub mod store;

pub use catalog::*;
pub use clock::*;
pub use enrichment::*;
pub use logger::*;
pub use store::*;

// Re-export domain types used in port signatures, so adapter crates can
// implement ports without directly depending on `cinedex-domain`.
pub use cinedex_domain::{CatalogItem, EpochMillis, Language, SubjectId, Track};
