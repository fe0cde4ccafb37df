//! Catalog lookup boundary contract.
//!
//! The catalog is owned elsewhere; the core only reads it.

use crate::BoxFuture;
use cinedex_domain::{CatalogItem, SubjectId};
use cinedex_shared::{RequestContext, Result};

/// Read-only access to catalog items.
pub trait CatalogPort: Send + Sync {
    /// Fetch one item; `Ok(None)` when the catalog has no such subject.
    fn get_item(
        &self,
        ctx: &RequestContext,
        subject_id: SubjectId,
    ) -> BoxFuture<'_, Result<Option<CatalogItem>>>;

    /// Enumerate every item, in catalog order.
    fn list_items(&self, ctx: &RequestContext) -> BoxFuture<'_, Result<Vec<CatalogItem>>>;

    /// Number of items in the catalog.
    fn count_items(&self, ctx: &RequestContext) -> BoxFuture<'_, Result<u64>>;
}
