//! Shared wiring for the use case integration tests.
#![allow(dead_code, reason = "each test binary uses a different subset")]

use cinedex_adapters::store::InMemoryDocumentStore;
use cinedex_app::{CallBudgets, DetailDeps};
use cinedex_domain::{CatalogItem, SubjectId};
use cinedex_ports::{
    BoxFuture, Collection, DocumentFilter, DocumentStorePort, LoggerPort, PortraitLookupPort,
    StoredDocument, TranslatorPort,
};
use cinedex_shared::{ErrorClass, ErrorCode, ErrorEnvelope, RequestContext, Result};
use std::collections::HashSet;
use std::sync::Mutex;
use cinedex_testkit::in_memory::{CapturingLogger, InMemoryCatalog, ManualClock, catalog_item};
use cinedex_testkit::providers::{
    FakeDirectorProvider, FakePortraitLookup, FakeSoundtrackProvider, FakeTranslator,
};
use std::sync::Arc;
use std::time::Duration;

/// 2026-01-01T00:00:00Z.
pub const START_MS: i64 = 1_767_225_600_000;
pub const HOUR_MS: i64 = 60 * 60 * 1000;

/// Every collaborator of `DetailDeps`, kept concrete for assertions.
pub struct Harness {
    pub catalog: Arc<InMemoryCatalog>,
    pub store: Arc<InMemoryDocumentStore>,
    pub directors: Arc<FakeDirectorProvider>,
    pub soundtracks: Arc<FakeSoundtrackProvider>,
    pub translator: Arc<FakeTranslator>,
    pub portraits: Arc<FakePortraitLookup>,
    pub clock: Arc<ManualClock>,
    pub logger: CapturingLogger,
}

impl Harness {
    pub fn new(items: Vec<CatalogItem>, directors: FakeDirectorProvider) -> Self {
        Self::with_parts(
            items,
            directors,
            FakeSoundtrackProvider::new(),
            FakeTranslator::new(),
        )
    }

    pub fn with_parts(
        items: Vec<CatalogItem>,
        directors: FakeDirectorProvider,
        soundtracks: FakeSoundtrackProvider,
        translator: FakeTranslator,
    ) -> Self {
        Self {
            catalog: Arc::new(InMemoryCatalog::new(items)),
            store: Arc::new(InMemoryDocumentStore::new()),
            directors: Arc::new(directors),
            soundtracks: Arc::new(soundtracks),
            translator: Arc::new(translator),
            portraits: Arc::new(FakePortraitLookup::new()),
            clock: Arc::new(ManualClock::at(START_MS)),
            logger: CapturingLogger::new(),
        }
    }

    pub fn with_portraits(mut self, portraits: FakePortraitLookup) -> Self {
        self.portraits = Arc::new(portraits);
        self
    }

    pub fn deps(&self) -> DetailDeps {
        self.deps_with_store(self.store.clone())
    }

    pub fn deps_with_store(&self, store: Arc<dyn DocumentStorePort>) -> DetailDeps {
        let translator: Arc<dyn TranslatorPort> = self.translator.clone();
        let portraits: Arc<dyn PortraitLookupPort> = self.portraits.clone();
        let logger: Arc<dyn LoggerPort> = Arc::new(self.logger.clone());
        DetailDeps {
            catalog: self.catalog.clone(),
            store,
            directors: self.directors.clone(),
            soundtracks: self.soundtracks.clone(),
            translator: Some(translator),
            portraits: Some(portraits),
            clock: self.clock.clone(),
            budgets: CallBudgets {
                director: Duration::from_millis(200),
                soundtrack: Duration::from_millis(200),
                ..CallBudgets::default()
            },
            logger: Some(logger),
        }
    }

    pub fn provider_calls(&self) -> (usize, usize) {
        (self.directors.calls(), self.soundtracks.calls())
    }
}

pub fn blade_runner() -> CatalogItem {
    catalog_item("m1", "Bladerunner", Some(1982), Some("Ridley Scott"))
}

pub fn subject(id: &str) -> Result<SubjectId> {
    SubjectId::parse(id).map_err(ErrorEnvelope::from)
}

pub fn ridley() -> FakeDirectorProvider {
    FakeDirectorProvider::new().with_profile(
        "Ridley Scott",
        "Ridley Scott é um cineasta britânico.",
        Some("https://img.test/ridley.jpg"),
    )
}

/// Wraps the harness store; marked rows fail to decode on `get` until they
/// are overwritten or deleted, like a SQLite row whose body is not JSON.
pub struct CorruptRowStore {
    inner: Arc<InMemoryDocumentStore>,
    corrupt: Mutex<HashSet<String>>,
}

impl CorruptRowStore {
    pub fn new(inner: Arc<InMemoryDocumentStore>) -> Self {
        Self {
            inner,
            corrupt: Mutex::new(HashSet::new()),
        }
    }

    pub fn corrupt(&self, collection: Collection, key: &str) {
        if let Ok(mut corrupt) = self.corrupt.lock() {
            corrupt.insert(row_id(collection, key));
        }
    }

    fn heal(&self, collection: Collection, key: &str) {
        if let Ok(mut corrupt) = self.corrupt.lock() {
            corrupt.remove(&row_id(collection, key));
        }
    }

    fn is_corrupt(&self, collection: Collection, key: &str) -> bool {
        self.corrupt
            .lock()
            .is_ok_and(|corrupt| corrupt.contains(&row_id(collection, key)))
    }
}

fn row_id(collection: Collection, key: &str) -> String {
    format!("{collection}/{key}")
}

impl DocumentStorePort for CorruptRowStore {
    fn get(
        &self,
        ctx: &RequestContext,
        collection: Collection,
        key: Box<str>,
    ) -> BoxFuture<'_, Result<Option<StoredDocument>>> {
        if self.is_corrupt(collection, &key) {
            let error = ErrorEnvelope::unexpected(
                ErrorCode::store("corrupt_document"),
                "stored document is not valid JSON: expected value at line 1 column 1",
                ErrorClass::NonRetriable,
            )
            .with_metadata("key", &*key);
            return Box::pin(async move { Err(error) });
        }
        self.inner.get(ctx, collection, key)
    }

    fn put(
        &self,
        ctx: &RequestContext,
        collection: Collection,
        document: StoredDocument,
    ) -> BoxFuture<'_, Result<()>> {
        self.heal(collection, &document.key);
        self.inner.put(ctx, collection, document)
    }

    fn delete_one(
        &self,
        ctx: &RequestContext,
        collection: Collection,
        key: Box<str>,
    ) -> BoxFuture<'_, Result<bool>> {
        self.heal(collection, &key);
        self.inner.delete_one(ctx, collection, key)
    }

    fn delete_many(
        &self,
        ctx: &RequestContext,
        collection: Collection,
        filter: DocumentFilter,
    ) -> BoxFuture<'_, Result<u64>> {
        self.inner.delete_many(ctx, collection, filter)
    }

    fn count(
        &self,
        ctx: &RequestContext,
        collection: Collection,
        filter: DocumentFilter,
    ) -> BoxFuture<'_, Result<u64>> {
        self.inner.count(ctx, collection, filter)
    }

    fn count_by_language(
        &self,
        ctx: &RequestContext,
        collection: Collection,
        filter: DocumentFilter,
    ) -> BoxFuture<'_, Result<Vec<(Box<str>, u64)>>> {
        self.inner.count_by_language(ctx, collection, filter)
    }
}
