//! # cinedex-testkit
//!
//! Test doubles for the cinedex ports: an in-memory catalog, scripted
//! enrichment providers that count their calls, a manual clock, and
//! capturing/no-op loggers.

pub mod errors;
pub mod in_memory;
pub mod providers;

/// Returns the testkit crate version.
#[must_use]
pub const fn testkit_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
