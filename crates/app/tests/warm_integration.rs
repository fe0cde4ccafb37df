//! Integration tests for the bulk warmer.
#![allow(missing_docs, reason = "integration test crate")]

mod common;

use cinedex_app::{WarmAllInput, WarmOneInput, warm_all, warm_item, warm_one, warm_stats};
use cinedex_domain::{CatalogItem, EnrichmentState, Language, WarmStatus};
use cinedex_ports::{Collection, DocumentFilter, DocumentStorePort};
use cinedex_shared::{ErrorEnvelope, RequestContext, Result};
use cinedex_testkit::in_memory::catalog_item;
use cinedex_testkit::providers::{FakeDirectorProvider, FakeSoundtrackProvider, FakeTranslator};
use common::{Harness, subject};
use std::time::Duration;

fn catalog(size: usize) -> Vec<CatalogItem> {
    (1..=size)
        .map(|n| {
            catalog_item(
                &format!("m{n}"),
                &format!("Film {n}"),
                Some(1990),
                Some(&format!("Director {n}")),
            )
        })
        .collect()
}

fn directors_for(size: usize) -> FakeDirectorProvider {
    (1..=size).fold(FakeDirectorProvider::new(), |provider, n| {
        provider.with_profile(&format!("Director {n}"), "Biografia.", None)
    })
}

const fn all(max_concurrency: usize) -> WarmAllInput {
    WarmAllInput {
        language: Language::Pt,
        max_concurrency,
    }
}

#[tokio::test]
async fn warm_all_skips_items_with_stored_enrichment() -> Result<()> {
    let harness = Harness::new(catalog(5), directors_for(5));
    let deps = harness.deps();
    let ctx = RequestContext::new_request();

    for id in ["m2", "m4"] {
        let warmed = warm_one(
            &ctx,
            &deps,
            WarmOneInput {
                subject_id: subject(id)?,
                language: Language::Pt,
            },
        )
        .await?;
        assert_eq!(warmed.status, WarmStatus::Success);
    }
    let before = harness.provider_calls();

    let summary = warm_all(&ctx, &deps, all(3)).await?;

    assert_eq!(summary.total, 5);
    assert_eq!(summary.already_exists, 2);
    assert_eq!(summary.success, 3);
    assert_eq!(summary.errors, 0);
    let after = harness.provider_calls();
    assert_eq!((after.0 - before.0, after.1 - before.1), (3, 3));

    let ids: Vec<&str> = summary.items.iter().map(|item| item.subject_id.as_str()).collect();
    assert_eq!(ids, ["m1", "m2", "m3", "m4", "m5"]);
    let network_items = summary.items.iter().filter(|item| item.did_network_work()).count();
    assert_eq!(network_items, 3);

    // Warming never builds composites.
    let composites = harness
        .store
        .count(&ctx, Collection::Composites, DocumentFilter::all())
        .await?;
    assert_eq!(composites, 0);
    assert!(harness.logger.saw("warm.all.start"));
    assert!(harness.logger.saw("warm.all.completed"));
    Ok(())
}

#[tokio::test]
async fn a_second_pass_finds_everything_stored() -> Result<()> {
    let harness = Harness::new(catalog(4), directors_for(4));
    let deps = harness.deps();
    let ctx = RequestContext::new_request();

    let first = warm_all(&ctx, &deps, all(2)).await?;
    assert_eq!(first.success, 4);
    let second = warm_all(&ctx, &deps, all(2)).await?;
    assert_eq!(second.already_exists, 4);
    assert_eq!(harness.provider_calls(), (4, 4));

    let coverage = warm_stats(&ctx, &deps).await?;
    assert_eq!(coverage.total_items, 4);
    assert!((coverage.overall_coverage - 100.0).abs() < f64::EPSILON);
    Ok(())
}

#[tokio::test]
async fn failures_are_counted_per_item_and_retried_next_pass() -> Result<()> {
    let harness = Harness::with_parts(
        catalog(3),
        directors_for(3).failing_for("Director 2"),
        FakeSoundtrackProvider::new().failing_for("Film 3"),
        FakeTranslator::new(),
    );
    let deps = harness.deps();
    let ctx = RequestContext::new_request();

    let summary = warm_all(&ctx, &deps, all(3)).await?;
    assert_eq!((summary.success, summary.already_exists, summary.errors), (1, 0, 2));

    let second = summary
        .items
        .get(1)
        .ok_or_else(|| ErrorEnvelope::invalid_input("missing item"))?;
    assert_eq!(second.status, WarmStatus::Error);
    assert_eq!(second.director, EnrichmentState::FetchFailed);
    assert_eq!(second.soundtrack, EnrichmentState::Fetched);
    assert!(second.message.as_deref().is_some_and(|message| message.starts_with("director:")));
    assert!(harness.logger.saw("warm.item.failed"));

    // Failed sides are not sticky; stored sides are not fetched again.
    let before = harness.provider_calls();
    let retry = warm_all(&ctx, &deps, all(3)).await?;
    assert_eq!(retry.errors, 2);
    let after = harness.provider_calls();
    assert_eq!((after.0 - before.0, after.1 - before.1), (1, 1));
    Ok(())
}

#[tokio::test]
async fn items_without_director_only_need_a_soundtrack() -> Result<()> {
    let item = catalog_item("m9", "Koyaanisqatsi", Some(1982), None);
    let harness = Harness::new(vec![item], FakeDirectorProvider::new());
    let deps = harness.deps();
    let ctx = RequestContext::new_request();

    let first = warm_all(&ctx, &deps, all(1)).await?;
    let warmed = first
        .items
        .first()
        .ok_or_else(|| ErrorEnvelope::invalid_input("missing item"))?;
    assert_eq!(warmed.status, WarmStatus::Success);
    assert_eq!(warmed.director, EnrichmentState::NotApplicable);

    let second = warm_all(&ctx, &deps, all(1)).await?;
    assert_eq!(second.already_exists, 1);
    assert_eq!(harness.directors.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn concurrency_never_exceeds_the_bound() -> Result<()> {
    let harness = Harness::with_parts(
        catalog(8),
        directors_for(8).with_delay(Duration::from_millis(20)),
        FakeSoundtrackProvider::new().with_delay(Duration::from_millis(20)),
        FakeTranslator::new(),
    );
    let deps = harness.deps();
    let ctx = RequestContext::new_request();

    let summary = warm_all(&ctx, &deps, all(2)).await?;
    assert_eq!(summary.success, 8);
    assert!(harness.directors.peak_in_flight() <= 2);
    assert!(harness.soundtracks.peak_in_flight() <= 2);
    Ok(())
}

#[tokio::test]
async fn cancelling_a_pass_stops_pending_items() -> Result<()> {
    let harness = Harness::with_parts(
        catalog(6),
        directors_for(6).with_delay(Duration::from_millis(100)),
        FakeSoundtrackProvider::new().with_delay(Duration::from_millis(100)),
        FakeTranslator::new(),
    );
    let deps = harness.deps();
    let ctx = RequestContext::new_request();

    let canceller = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        canceller.cancel();
    });

    let result = warm_all(&ctx, &deps, all(1)).await;
    assert!(result.is_err_and(|error| error.is_cancelled()));
    assert!(harness.logger.saw("warm.all.aborted"));

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(harness.directors.calls() < 6);
    Ok(())
}

#[tokio::test]
async fn zero_concurrency_is_rejected_before_any_io() -> Result<()> {
    let harness = Harness::new(catalog(2), directors_for(2));
    let deps = harness.deps();
    let ctx = RequestContext::new_request();

    let result = warm_all(&ctx, &deps, all(0)).await;
    assert!(result.is_err_and(|error| error.code == cinedex_shared::ErrorCode::invalid_input()));
    assert_eq!(harness.provider_calls(), (0, 0));
    Ok(())
}

#[tokio::test]
async fn warm_one_reports_unknown_subjects() -> Result<()> {
    let harness = Harness::new(catalog(1), directors_for(1));
    let deps = harness.deps();
    let ctx = RequestContext::new_request();

    let result = warm_one(
        &ctx,
        &deps,
        WarmOneInput {
            subject_id: subject("m404")?,
            language: Language::Pt,
        },
    )
    .await;
    assert!(result.is_err_and(|error| error.is_not_found()));
    Ok(())
}

#[tokio::test]
async fn caller_supplied_items_are_validated_then_warmed() -> Result<()> {
    let harness = Harness::new(Vec::new(), directors_for(1));
    let deps = harness.deps();
    let ctx = RequestContext::new_request();

    let item = catalog_item("x1", "Film 1", Some(1990), Some("Director 1"));
    let warmed = warm_item(&ctx, &deps, item, Language::Pt).await?;
    assert_eq!(warmed.status, WarmStatus::Success);
    assert_eq!(harness.provider_calls(), (1, 1));

    let blank_title = catalog_item("x2", "   ", None, None);
    let result = warm_item(&ctx, &deps, blank_title, Language::Pt).await;
    assert!(result.is_err());
    Ok(())
}
