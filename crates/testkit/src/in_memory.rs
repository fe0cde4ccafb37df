//! In-memory implementations of the infrastructure ports.
//!
//! These implementations are intended for:
//! - Unit/integration tests of the use cases
//! - Deterministic contract tests for the ports layer

use cinedex_domain::{CatalogItem, EpochMillis, SubjectId};
use cinedex_ports::{
    BoxFuture, CatalogPort, ClockPort, Collection, DocumentFilter, DocumentStorePort, LogEvent,
    LogFields, LogLevel, LoggerPort, StoredDocument,
};
use cinedex_shared::{ErrorEnvelope, RequestContext, Result};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// A no-op logger implementation.
#[derive(Debug, Default)]
pub struct NoopLogger;

impl LoggerPort for NoopLogger {
    fn log(&self, _event: LogEvent) {}

    fn child(&self, _fields: LogFields) -> Box<dyn LoggerPort> {
        Box::new(Self)
    }
}

/// Logger that records every event, including those of its children.
#[derive(Debug, Clone, Default)]
pub struct CapturingLogger {
    events: Arc<Mutex<Vec<LogEvent>>>,
    base: LogFields,
}

impl CapturingLogger {
    /// Create an empty logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of captured events.
    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Names of captured events, in emission order.
    pub fn event_names(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .map(|event| event.event.into_string())
            .collect()
    }

    /// Returns true when an event with this name was captured.
    pub fn saw(&self, name: &str) -> bool {
        self.events().iter().any(|event| &*event.event == name)
    }
}

impl LoggerPort for CapturingLogger {
    fn log(&self, mut event: LogEvent) {
        if !self.base.is_empty() {
            let mut fields = self.base.clone();
            fields.extend(event.fields.take().unwrap_or_default());
            event.fields = Some(fields);
        }
        self.events.lock().unwrap().push(event);
    }

    fn child(&self, fields: LogFields) -> Box<dyn LoggerPort> {
        let mut base = self.base.clone();
        base.extend(fields);
        Box::new(Self {
            events: Arc::clone(&self.events),
            base,
        })
    }
}

/// Clock whose time only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    /// Start the clock at `now_ms`.
    pub fn at(now_ms: EpochMillis) -> Self {
        Self {
            now_ms: AtomicI64::new(now_ms),
        }
    }

    /// Jump to an absolute time.
    pub fn set(&self, now_ms: EpochMillis) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    /// Move forward by `delta_ms`.
    pub fn advance(&self, delta_ms: EpochMillis) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl ClockPort for ManualClock {
    fn now_ms(&self) -> EpochMillis {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// Catalog backed by a fixed list of items.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    items: Vec<CatalogItem>,
    lookups: AtomicU64,
}

impl InMemoryCatalog {
    /// Build a catalog over `items`, kept in the given order.
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self {
            items,
            lookups: AtomicU64::new(0),
        }
    }

    /// Number of single-item lookups served.
    pub fn lookups(&self) -> u64 {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl CatalogPort for InMemoryCatalog {
    fn get_item(
        &self,
        ctx: &RequestContext,
        subject_id: SubjectId,
    ) -> BoxFuture<'_, Result<Option<CatalogItem>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("catalog.get_item")?;
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(self.items.iter().find(|item| item.id == subject_id).cloned())
        })
    }

    fn list_items(&self, ctx: &RequestContext) -> BoxFuture<'_, Result<Vec<CatalogItem>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("catalog.list_items")?;
            Ok(self.items.clone())
        })
    }

    fn count_items(&self, ctx: &RequestContext) -> BoxFuture<'_, Result<u64>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("catalog.count_items")?;
            Ok(self.items.len() as u64)
        })
    }
}

/// Document store where every call fails with `store:unavailable`.
#[derive(Debug, Default)]
pub struct UnavailableDocumentStore;

fn store_down<T>() -> Result<T> {
    Err(ErrorEnvelope::store_unavailable("document store is unreachable"))
}

impl DocumentStorePort for UnavailableDocumentStore {
    fn get(
        &self,
        _ctx: &RequestContext,
        _collection: Collection,
        _key: Box<str>,
    ) -> BoxFuture<'_, Result<Option<StoredDocument>>> {
        Box::pin(async move { store_down() })
    }

    fn put(
        &self,
        _ctx: &RequestContext,
        _collection: Collection,
        _document: StoredDocument,
    ) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move { store_down() })
    }

    fn delete_one(
        &self,
        _ctx: &RequestContext,
        _collection: Collection,
        _key: Box<str>,
    ) -> BoxFuture<'_, Result<bool>> {
        Box::pin(async move { store_down() })
    }

    fn delete_many(
        &self,
        _ctx: &RequestContext,
        _collection: Collection,
        _filter: DocumentFilter,
    ) -> BoxFuture<'_, Result<u64>> {
        Box::pin(async move { store_down() })
    }

    fn count(
        &self,
        _ctx: &RequestContext,
        _collection: Collection,
        _filter: DocumentFilter,
    ) -> BoxFuture<'_, Result<u64>> {
        Box::pin(async move { store_down() })
    }

    fn count_by_language(
        &self,
        _ctx: &RequestContext,
        _collection: Collection,
        _filter: DocumentFilter,
    ) -> BoxFuture<'_, Result<Vec<(Box<str>, u64)>>> {
        Box::pin(async move { store_down() })
    }
}

/// Build a `LogEvent` helper for tests.
pub fn log_event(level: LogLevel, event: &str, message: &str) -> LogEvent {
    LogEvent {
        event: event.to_owned().into_boxed_str(),
        level,
        message: message.to_owned().into_boxed_str(),
        fields: None,
        error: None,
    }
}

/// Catalog item fixture.
pub fn catalog_item(id: &str, title: &str, year: Option<i32>, director: Option<&str>) -> CatalogItem {
    let id = SubjectId::parse(id).unwrap();
    CatalogItem::new(id, title, year, director)
}
