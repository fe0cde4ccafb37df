//! Freshness rules for composite records.

use crate::primitives::EpochMillis;

/// Composite records are served for 24 hours after assembly.
pub const FRESHNESS_WINDOW_MS: EpochMillis = 24 * 60 * 60 * 1000;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Freshness of a composite record at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// `age < 24h`: serve from cache.
    Fresh {
        /// Age in milliseconds.
        age_ms: EpochMillis,
    },
    /// `age >= 24h`: delete and rebuild.
    Stale {
        /// Age in milliseconds.
        age_ms: EpochMillis,
    },
}

impl Freshness {
    /// Classify a record created at `created_at_ms`, observed at `now_ms`.
    ///
    /// Records stamped in the future (clock skew) count as age zero.
    #[must_use]
    pub fn classify(created_at_ms: EpochMillis, now_ms: EpochMillis) -> Self {
        let age_ms = now_ms.saturating_sub(created_at_ms).max(0);
        if age_ms < FRESHNESS_WINDOW_MS {
            Self::Fresh { age_ms }
        } else {
            Self::Stale { age_ms }
        }
    }

    /// Returns true for fresh records.
    #[must_use]
    pub const fn is_fresh(self) -> bool {
        matches!(self, Self::Fresh { .. })
    }

    /// Age in milliseconds.
    #[must_use]
    pub const fn age_ms(self) -> EpochMillis {
        match self {
            Self::Fresh { age_ms } | Self::Stale { age_ms } => age_ms,
        }
    }
}

/// Latest creation time that is already stale at `now_ms`.
///
/// A record is stale iff `created_at_ms <= expiry_cutoff_ms(now_ms)`.
#[must_use]
pub const fn expiry_cutoff_ms(now_ms: EpochMillis) -> EpochMillis {
    now_ms.saturating_sub(FRESHNESS_WINDOW_MS)
}

/// Age in hours rounded to one decimal place.
#[must_use]
#[expect(
    clippy::cast_precision_loss,
    reason = "ages are far below 2^52 milliseconds"
)]
pub fn age_hours(age_ms: EpochMillis) -> f64 {
    (age_ms as f64 / MILLIS_PER_HOUR * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: EpochMillis = 1_700_000_000_000;
    const SECOND: EpochMillis = 1_000;

    #[test]
    fn one_second_short_of_the_window_is_fresh() {
        let created = NOW - (FRESHNESS_WINDOW_MS - SECOND);
        assert!(Freshness::classify(created, NOW).is_fresh());
    }

    #[test]
    fn exactly_the_window_is_stale() {
        let created = NOW - FRESHNESS_WINDOW_MS;
        let freshness = Freshness::classify(created, NOW);
        assert_eq!(freshness, Freshness::Stale { age_ms: FRESHNESS_WINDOW_MS });
    }

    #[test]
    fn cutoff_agrees_with_classification() {
        let cutoff = expiry_cutoff_ms(NOW);
        assert!(!Freshness::classify(cutoff, NOW).is_fresh());
        assert!(Freshness::classify(cutoff + 1, NOW).is_fresh());
    }

    #[test]
    fn future_records_have_zero_age() {
        assert_eq!(Freshness::classify(NOW + SECOND, NOW).age_ms(), 0);
    }

    #[test]
    fn age_hours_rounds_to_one_decimal() {
        assert!((age_hours(90 * 60 * 1000) - 1.5).abs() < f64::EPSILON);
        assert!((age_hours(0)).abs() < f64::EPSILON);
    }
}
