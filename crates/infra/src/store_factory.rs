//! Document store, catalog, and logger selection from config.

use crate::InfraResult;
use cinedex_adapters::catalog::JsonFileCatalog;
use cinedex_adapters::logger::JsonLogger;
use cinedex_adapters::store::{InMemoryDocumentStore, SqliteDocumentStore};
use cinedex_config::{StoreProvider, ValidatedBackendConfig};
use cinedex_ports::{CatalogPort, DocumentStorePort, LogLevel, LoggerPort};
use std::path::Path;
use std::sync::Arc;

/// Build the document store named by `store.provider`.
pub fn build_document_store(config: &ValidatedBackendConfig) -> InfraResult<Arc<dyn DocumentStorePort>> {
    match config.store.provider {
        StoreProvider::Memory => Ok(Arc::new(InMemoryDocumentStore::new())),
        StoreProvider::Sqlite => {
            let path = Path::new(&*config.store.sqlite_path);
            let store = SqliteDocumentStore::open(path)?;
            tracing::debug!(path = %store.path().display(), "sqlite store opened");
            Ok(Arc::new(store))
        },
    }
}

/// Load the catalog file named by `catalog.path`.
pub fn build_catalog(config: &ValidatedBackendConfig) -> InfraResult<Arc<dyn CatalogPort>> {
    let catalog = JsonFileCatalog::load(Path::new(&*config.catalog.path))?;
    tracing::debug!(items = catalog.len(), "catalog loaded");
    Ok(Arc::new(catalog))
}

/// Build the JSON-lines logger at the configured minimum level.
pub fn build_logger(config: &ValidatedBackendConfig) -> Arc<dyn LoggerPort> {
    let level = LogLevel::parse(&config.logging.level).unwrap_or(LogLevel::Info);
    Arc::new(JsonLogger::stderr().with_min_level(level))
}
