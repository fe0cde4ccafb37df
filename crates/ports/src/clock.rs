//! Wall-clock boundary contract.

use cinedex_domain::EpochMillis;

/// Source of the current time.
pub trait ClockPort: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> EpochMillis;
}
