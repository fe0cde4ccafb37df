//! # cinedex-app
//!
//! Use cases of the movie detail cache: the cache manager, the detail
//! composer, store-first enrichment resolution, and the bulk warmer.
//! This crate depends on `ports`, `domain`, and `shared`.

pub mod cache_manager;
mod codec;
pub mod composer;
pub mod deps;
mod enrichment;
pub mod warmer;

/// Returns the app crate version.
#[must_use]
pub const fn app_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub use cache_manager::{
    DetailLookup, GetDetailInput, InvalidateDetailInput, RemovedRecords, cache_stats,
    cleanup_expired, get_detail, invalidate_detail,
};
pub use composer::{BuildDetailInput, build_detail};
pub use deps::{CallBudgets, DetailDeps};
pub use warmer::{
    DEFAULT_WARM_CONCURRENCY, WarmAllInput, WarmOneInput, warm_all, warm_item, warm_one,
    warm_stats,
};
