// Same behavioral contract for every document store adapter.
#![allow(missing_docs, reason = "integration test crate")]

use cinedex_adapters::store::{InMemoryDocumentStore, SqliteDocumentStore};
use cinedex_ports::{Collection, DocumentFilter, DocumentStorePort, StoredDocument};
use cinedex_shared::{RequestContext, Result};
use serde_json::json;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_DB: AtomicU32 = AtomicU32::new(0);

struct TempDb {
    dir: PathBuf,
}

impl TempDb {
    fn new() -> std::io::Result<Self> {
        let dir = std::env::temp_dir().join(format!(
            "cinedex-store-{}-{}",
            std::process::id(),
            NEXT_DB.fetch_add(1, Ordering::Relaxed)
        ));
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path(&self) -> PathBuf {
        self.dir.join("cache.sqlite3")
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

fn composite(subject: &str, language: &str, created_at_ms: i64) -> StoredDocument {
    StoredDocument {
        key: format!("{subject}_{language}").into_boxed_str(),
        subject_id: Some(subject.into()),
        language: Some(language.into()),
        created_at_ms,
        body: json!({ "subjectId": subject, "language": language }),
    }
}

async fn upsert_replaces_the_whole_document(store: &dyn DocumentStorePort) -> Result<()> {
    let ctx = RequestContext::new_request();
    store.put(&ctx, Collection::Composites, composite("m1", "pt", 10)).await?;

    let mut replacement = composite("m1", "pt", 20);
    replacement.body = json!({ "rebuilt": true });
    store.put(&ctx, Collection::Composites, replacement.clone()).await?;

    let stored = store.get(&ctx, Collection::Composites, "m1_pt".into()).await?;
    assert_eq!(stored, Some(replacement));
    assert_eq!(store.count(&ctx, Collection::Composites, DocumentFilter::all()).await?, 1);
    Ok(())
}

async fn collections_are_isolated(store: &dyn DocumentStorePort) -> Result<()> {
    let ctx = RequestContext::new_request();
    let director = StoredDocument {
        key: "ridley scott".into(),
        subject_id: None,
        language: None,
        created_at_ms: 5,
        body: json!({ "name": "Ridley Scott" }),
    };
    store.put(&ctx, Collection::Directors, director).await?;

    assert!(store.get(&ctx, Collection::Composites, "ridley scott".into()).await?.is_none());
    assert!(store.get(&ctx, Collection::Directors, "ridley scott".into()).await?.is_some());
    assert_eq!(store.count(&ctx, Collection::Soundtracks, DocumentFilter::all()).await?, 0);
    Ok(())
}

async fn filtered_deletes_and_counts(store: &dyn DocumentStorePort) -> Result<()> {
    let ctx = RequestContext::new_request();
    for (subject, language, created) in [
        ("m1", "pt", 100),
        ("m1", "en", 200),
        ("m2", "pt", 300),
        ("m2", "es", 400),
    ] {
        store
            .put(&ctx, Collection::Composites, composite(subject, language, created))
            .await?;
    }

    let fresh = store
        .count(&ctx, Collection::Composites, DocumentFilter::all().created_after(200))
        .await?;
    assert_eq!(fresh, 2);

    let mut by_language = store
        .count_by_language(&ctx, Collection::Composites, DocumentFilter::all())
        .await?;
    by_language.sort();
    let expected: Vec<(Box<str>, u64)> = vec![("en".into(), 1), ("es".into(), 1), ("pt".into(), 2)];
    assert_eq!(by_language, expected);

    let removed = store
        .delete_many(&ctx, Collection::Composites, DocumentFilter::all().subject("m1"))
        .await?;
    assert_eq!(removed, 2);

    let expired = store
        .delete_many(
            &ctx,
            Collection::Composites,
            DocumentFilter::all().created_at_or_before(300),
        )
        .await?;
    assert_eq!(expired, 1);

    assert!(store.delete_one(&ctx, Collection::Composites, "m2_es".into()).await?);
    assert!(!store.delete_one(&ctx, Collection::Composites, "m2_es".into()).await?);
    assert_eq!(store.count(&ctx, Collection::Composites, DocumentFilter::all()).await?, 0);
    Ok(())
}

async fn cancelled_requests_touch_nothing(store: &dyn DocumentStorePort) -> Result<()> {
    let ctx = RequestContext::new_request();
    ctx.cancel();
    let result = store.put(&ctx, Collection::Composites, composite("m9", "pt", 1)).await;
    assert!(result.is_err_and(|error| error.is_cancelled()));

    let fresh = RequestContext::new_request();
    assert!(store.get(&fresh, Collection::Composites, "m9_pt".into()).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn memory_store_upserts() -> Result<()> {
    upsert_replaces_the_whole_document(&InMemoryDocumentStore::new()).await
}

#[tokio::test]
async fn memory_store_isolates_collections() -> Result<()> {
    collections_are_isolated(&InMemoryDocumentStore::new()).await
}

#[tokio::test]
async fn memory_store_filters() -> Result<()> {
    filtered_deletes_and_counts(&InMemoryDocumentStore::new()).await
}

#[tokio::test]
async fn memory_store_honors_cancellation() -> Result<()> {
    cancelled_requests_touch_nothing(&InMemoryDocumentStore::new()).await
}

#[tokio::test]
async fn sqlite_store_upserts() -> Result<()> {
    let db = TempDb::new().map_err(cinedex_shared::ErrorEnvelope::from)?;
    upsert_replaces_the_whole_document(&SqliteDocumentStore::open(db.path())?).await
}

#[tokio::test]
async fn sqlite_store_isolates_collections() -> Result<()> {
    let db = TempDb::new().map_err(cinedex_shared::ErrorEnvelope::from)?;
    collections_are_isolated(&SqliteDocumentStore::open(db.path())?).await
}

#[tokio::test]
async fn sqlite_store_filters() -> Result<()> {
    let db = TempDb::new().map_err(cinedex_shared::ErrorEnvelope::from)?;
    filtered_deletes_and_counts(&SqliteDocumentStore::open(db.path())?).await
}

#[tokio::test]
async fn sqlite_store_honors_cancellation() -> Result<()> {
    let db = TempDb::new().map_err(cinedex_shared::ErrorEnvelope::from)?;
    cancelled_requests_touch_nothing(&SqliteDocumentStore::open(db.path())?).await
}

#[tokio::test]
async fn sqlite_store_survives_reopen() -> Result<()> {
    let db = TempDb::new().map_err(cinedex_shared::ErrorEnvelope::from)?;
    let ctx = RequestContext::new_request();
    {
        let store = SqliteDocumentStore::open(db.path())?;
        store.put(&ctx, Collection::Composites, composite("m1", "fr", 42)).await?;
    }
    let reopened = SqliteDocumentStore::open(db.path())?;
    let stored = reopened.get(&ctx, Collection::Composites, "m1_fr".into()).await?;
    assert_eq!(stored.map(|document| document.created_at_ms), Some(42));
    Ok(())
}

#[tokio::test]
async fn sqlite_store_rotates_foreign_schema_versions() -> Result<()> {
    let db = TempDb::new().map_err(cinedex_shared::ErrorEnvelope::from)?;
    {
        let conn = rusqlite_open(&db.path())?;
        conn.execute_batch("CREATE TABLE other (id INTEGER); PRAGMA user_version = 99;")
            .map_err(|error| cinedex_shared::ErrorEnvelope::invalid_input(error.to_string()))?;
    }

    let store = SqliteDocumentStore::open(db.path())?;
    let ctx = RequestContext::new_request();
    assert_eq!(store.count(&ctx, Collection::Composites, DocumentFilter::all()).await?, 0);

    let rotated = std::fs::read_dir(&db.dir)
        .map_err(cinedex_shared::ErrorEnvelope::from)?
        .filter_map(std::result::Result::ok)
        .any(|entry| entry.file_name().to_string_lossy().contains(".legacy.v99_"));
    assert!(rotated);
    Ok(())
}

fn rusqlite_open(path: &std::path::Path) -> Result<rusqlite::Connection> {
    rusqlite::Connection::open(path)
        .map_err(|error| cinedex_shared::ErrorEnvelope::invalid_input(error.to_string()))
}
