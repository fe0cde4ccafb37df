//! # cinedex-domain
//!
//! Domain records and pure cache rules for the movie detail cache.
//!
//! - **Primitives** - `SubjectId`, `Language`, `CacheKey`, `SoundtrackKey`
//! - **Records** - `CatalogItem`, `DirectorRecord`, `SoundtrackRecord`, `CompositeRecord`
//! - **Freshness** - the 24 hour window and its boundary rules
//! - **Director groups** - splitting and merging multi-director fields
//! - **Warm / stats** - bulk warming outcomes, coverage, and cache statistics
//!
//! ## Dependency Rules
//!
//! - Depends only on `shared` crate
//! - No infrastructure or adapter dependencies
//! - Pure domain logic with no I/O

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub use cinedex_shared::shared_crate_version;

pub mod director_group;
pub mod freshness;
pub mod primitives;
pub mod records;
pub mod stats;
pub mod warm;

pub use director_group::DirectorGroup;
pub use freshness::{FRESHNESS_WINDOW_MS, Freshness, age_hours, expiry_cutoff_ms};
pub use primitives::{CacheKey, EpochMillis, Language, PrimitiveError, SoundtrackKey, SubjectId};
pub use records::{CatalogItem, CompositeRecord, DirectorRecord, SoundtrackRecord, Track};
pub use stats::{CacheStats, LanguageCount};
pub use warm::{EnrichmentState, WarmCoverage, WarmItemResult, WarmStatus, WarmSummary};

/// Returns the domain crate version.
#[must_use]
pub const fn domain_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_crate_compiles() {
        assert!(!domain_crate_version().is_empty());
    }

    #[test]
    fn domain_depends_on_shared() {
        assert!(!shared_crate_version().is_empty());
    }
}
