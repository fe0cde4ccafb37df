use cinedex_ports::{BoxFuture, Collection, DocumentFilter, DocumentStorePort, StoredDocument};
use cinedex_shared::{RequestContext, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

type Documents = BTreeMap<(Collection, Box<str>), StoredDocument>;

/// Process-local document store.
///
/// Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentStore {
    documents: Arc<RwLock<Documents>>,
}

impl InMemoryDocumentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents across every collection.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Returns true when no document is stored.
    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

impl DocumentStorePort for InMemoryDocumentStore {
    fn get(
        &self,
        ctx: &RequestContext,
        collection: Collection,
        key: Box<str>,
    ) -> BoxFuture<'_, Result<Option<StoredDocument>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("memory_store.get")?;
            let documents = self.documents.read().await;
            Ok(documents.get(&(collection, key)).cloned())
        })
    }

    fn put(
        &self,
        ctx: &RequestContext,
        collection: Collection,
        document: StoredDocument,
    ) -> BoxFuture<'_, Result<()>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("memory_store.put")?;
            let mut documents = self.documents.write().await;
            documents.insert((collection, document.key.clone()), document);
            Ok(())
        })
    }

    fn delete_one(
        &self,
        ctx: &RequestContext,
        collection: Collection,
        key: Box<str>,
    ) -> BoxFuture<'_, Result<bool>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("memory_store.delete_one")?;
            let mut documents = self.documents.write().await;
            Ok(documents.remove(&(collection, key)).is_some())
        })
    }

    fn delete_many(
        &self,
        ctx: &RequestContext,
        collection: Collection,
        filter: DocumentFilter,
    ) -> BoxFuture<'_, Result<u64>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("memory_store.delete_many")?;
            let mut documents = self.documents.write().await;
            let before = documents.len();
            documents.retain(|(stored_in, _), document| {
                *stored_in != collection || !filter.matches(document)
            });
            Ok(u64::try_from(before - documents.len()).unwrap_or(u64::MAX))
        })
    }

    fn count(
        &self,
        ctx: &RequestContext,
        collection: Collection,
        filter: DocumentFilter,
    ) -> BoxFuture<'_, Result<u64>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("memory_store.count")?;
            let documents = self.documents.read().await;
            let matched = matching(&documents, collection, &filter).count();
            Ok(u64::try_from(matched).unwrap_or(u64::MAX))
        })
    }

    fn count_by_language(
        &self,
        ctx: &RequestContext,
        collection: Collection,
        filter: DocumentFilter,
    ) -> BoxFuture<'_, Result<Vec<(Box<str>, u64)>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("memory_store.count_by_language")?;
            let documents = self.documents.read().await;
            let mut counts: BTreeMap<Box<str>, u64> = BTreeMap::new();
            for document in matching(&documents, collection, &filter) {
                if let Some(language) = document.language.as_ref() {
                    *counts.entry(language.clone()).or_default() += 1;
                }
            }
            Ok(counts.into_iter().collect())
        })
    }
}

fn matching<'a>(
    documents: &'a Documents,
    collection: Collection,
    filter: &'a DocumentFilter,
) -> impl Iterator<Item = &'a StoredDocument> + 'a {
    documents
        .iter()
        .filter(move |((stored_in, _), document)| {
            *stored_in == collection && filter.matches(document)
        })
        .map(|(_, document)| document)
}
