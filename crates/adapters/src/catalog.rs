//! JSON file catalog adapter.
//!
//! The file holds an array of catalog items. It is read once at startup; the
//! catalog is owned by another system and never written here.

use cinedex_domain::{CatalogItem, SubjectId};
use cinedex_ports::{BoxFuture, CatalogPort};
use cinedex_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Catalog loaded from a JSON array of items, kept in file order.
#[derive(Debug, Clone)]
pub struct JsonFileCatalog {
    items: Arc<[CatalogItem]>,
    index: Arc<HashMap<SubjectId, usize>>,
}

impl JsonFileCatalog {
    /// Load and validate the catalog at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::io(),
                format!("failed to read catalog file: {error}"),
            )
            .with_metadata("path", path.display().to_string())
        })?;
        Self::from_json(&raw).map_err(|error| error.with_metadata("path", path.display().to_string()))
    }

    /// Parse a catalog from JSON text.
    pub fn from_json(raw: &str) -> Result<Self> {
        let items: Vec<CatalogItem> = serde_json::from_str(raw).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("catalog", "invalid_json"),
                format!("catalog is not a JSON array of items: {error}"),
            )
        })?;
        Self::from_items(items)
    }

    /// Build a catalog from items; ids must be unique.
    pub fn from_items(items: Vec<CatalogItem>) -> Result<Self> {
        let mut validated = Vec::with_capacity(items.len());
        let mut index = HashMap::with_capacity(items.len());
        for (position, item) in items.into_iter().enumerate() {
            let item = item.validated().map_err(|error| {
                ErrorEnvelope::from(error).with_metadata("position", position.to_string())
            })?;
            if index.insert(item.id.clone(), position).is_some() {
                return Err(ErrorEnvelope::expected(
                    ErrorCode::new("catalog", "duplicate_id"),
                    format!("catalog id `{}` appears more than once", item.id),
                ));
            }
            validated.push(item);
        }
        Ok(Self {
            items: validated.into(),
            index: Arc::new(index),
        })
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true when the catalog has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl CatalogPort for JsonFileCatalog {
    fn get_item(
        &self,
        ctx: &RequestContext,
        subject_id: SubjectId,
    ) -> BoxFuture<'_, Result<Option<CatalogItem>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("catalog.get_item")?;
            Ok(self
                .index
                .get(&subject_id)
                .and_then(|position| self.items.get(*position))
                .cloned())
        })
    }

    fn list_items(&self, ctx: &RequestContext) -> BoxFuture<'_, Result<Vec<CatalogItem>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("catalog.list_items")?;
            Ok(self.items.to_vec())
        })
    }

    fn count_items(&self, ctx: &RequestContext) -> BoxFuture<'_, Result<u64>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("catalog.count_items")?;
            Ok(u64::try_from(self.items.len()).unwrap_or(u64::MAX))
        })
    }
}
