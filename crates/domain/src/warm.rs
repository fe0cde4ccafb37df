//! Bulk warming outcomes and coverage figures.

use crate::primitives::SubjectId;
use serde::{Deserialize, Serialize};

/// Per-item warming outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarmStatus {
    /// Missing enrichment was fetched and stored.
    Success,
    /// Both enrichments were already stored; no network work done.
    AlreadyExists,
    /// At least one lookup failed.
    Error,
}

/// State of one enrichment side after a warming attempt.
///
/// `Missing -> Fetching -> {Fetched | FetchFailed}`; `FetchFailed` is not
/// sticky and the next pass starts again from `Missing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentState {
    /// Already stored before this pass.
    Cached,
    /// Fetched and stored during this pass.
    Fetched,
    /// Lookup failed during this pass.
    FetchFailed,
    /// Nothing to look up (e.g. the item has no director).
    NotApplicable,
}

impl EnrichmentState {
    /// Returns true when the side needs no work.
    #[must_use]
    pub const fn is_present(self) -> bool {
        matches!(self, Self::Cached | Self::NotApplicable)
    }
}

/// Result of warming one catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarmItemResult {
    /// Warmed item.
    pub subject_id: SubjectId,
    /// Item title.
    pub title: Box<str>,
    /// Overall outcome.
    pub status: WarmStatus,
    /// Director side.
    pub director: EnrichmentState,
    /// Soundtrack side.
    pub soundtrack: EnrichmentState,
    /// Failure message for `Error` outcomes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Box<str>>,
}

impl WarmItemResult {
    /// Returns true when this item triggered at least one provider lookup.
    #[must_use]
    pub const fn did_network_work(&self) -> bool {
        !matches!(self.status, WarmStatus::AlreadyExists)
    }
}

/// Aggregate over one warming pass. Items are in submission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarmSummary {
    /// Number of catalog items processed.
    pub total: u64,
    /// Items that ended in `Success`.
    pub success: u64,
    /// Items that ended in `AlreadyExists`.
    pub already_exists: u64,
    /// Items that ended in `Error`.
    pub errors: u64,
    /// Per-item outcomes, in catalog order.
    pub items: Vec<WarmItemResult>,
}

impl WarmSummary {
    /// Count outcomes once every item has completed.
    #[must_use]
    pub fn from_items(items: Vec<WarmItemResult>) -> Self {
        let count = |status: WarmStatus| {
            items.iter().filter(|item| item.status == status).count() as u64
        };
        Self {
            total: items.len() as u64,
            success: count(WarmStatus::Success),
            already_exists: count(WarmStatus::AlreadyExists),
            errors: count(WarmStatus::Error),
            items,
        }
    }
}

/// Share of the catalog that has stored enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarmCoverage {
    /// Catalog size.
    pub total_items: u64,
    /// Stored director records.
    pub total_directors: u64,
    /// Stored soundtrack records.
    pub total_soundtracks: u64,
    /// Directors per item, in percent, one decimal.
    pub director_coverage: f64,
    /// Soundtracks per item, in percent, one decimal.
    pub soundtrack_coverage: f64,
    /// Mean of both coverages, one decimal.
    pub overall_coverage: f64,
}

impl WarmCoverage {
    /// Compute coverage from raw counts; an empty catalog has zero coverage.
    #[must_use]
    pub fn compute(total_items: u64, total_directors: u64, total_soundtracks: u64) -> Self {
        let director_coverage = percent(total_directors, total_items);
        let soundtrack_coverage = percent(total_soundtracks, total_items);
        Self {
            total_items,
            total_directors,
            total_soundtracks,
            director_coverage: round_one(director_coverage),
            soundtrack_coverage: round_one(soundtrack_coverage),
            overall_coverage: round_one((director_coverage + soundtrack_coverage) / 2.0),
        }
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "record counts stay far below 2^52"
)]
fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

fn round_one(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
