use super::{SCHEMA_VERSION, corrupt_document, legacy_suffix, store_error};
use cinedex_ports::{BoxFuture, Collection, DocumentFilter, DocumentStorePort, StoredDocument};
use cinedex_shared::{RequestContext, Result};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension, params_from_iter};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::spawn_blocking;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed document store (WAL mode, one shared connection).
///
/// Every call runs on the blocking pool.
#[derive(Debug, Clone)]
pub struct SqliteDocumentStore {
    path: PathBuf,
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDocumentStore {
    /// Open (or create) the database at `path`.
    ///
    /// A database written by another schema version is moved aside with a
    /// `.legacy.<version>_<stamp>` suffix and a fresh one is created.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let conn = open_connection(&path)?;
        Ok(Self {
            path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Database file location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn run<T, F>(&self, ctx: &RequestContext, operation: &'static str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        ctx.ensure_not_cancelled(operation)?;
        let conn = Arc::clone(&self.conn);
        spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| store_error(operation, "connection lock poisoned"))?;
            f(&guard)
        })
        .await
        .map_err(|error| store_error(operation, &format!("task failed: {error}")))?
    }
}

impl DocumentStorePort for SqliteDocumentStore {
    fn get(
        &self,
        ctx: &RequestContext,
        collection: Collection,
        key: Box<str>,
    ) -> BoxFuture<'_, Result<Option<StoredDocument>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            self.run(&ctx, "get", move |conn| {
                let row = conn
                    .query_row(
                        "SELECT doc_key, subject_id, language, created_at_ms, body FROM documents WHERE collection = ?1 AND doc_key = ?2",
                        (collection.as_str(), &*key),
                        read_row,
                    )
                    .optional()
                    .map_err(|error| store_error("get", &error.to_string()))?;
                row.map(RawRow::into_document).transpose()
            })
            .await
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
            let body = serde_json::to_string(&document.body)
                .map_err(|error| corrupt_document(&document.key, &error.to_string()))?;
            self.run(&ctx, "put", move |conn| {
                conn.execute(
                    "INSERT OR REPLACE INTO documents (collection, doc_key, subject_id, language, created_at_ms, body) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    (
                        collection.as_str(),
                        &*document.key,
                        document.subject_id.as_deref(),
                        document.language.as_deref(),
                        document.created_at_ms,
                        &body,
                    ),
                )
                .map_err(|error| store_error("put", &error.to_string()))?;
                Ok(())
            })
            .await
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
            self.run(&ctx, "delete_one", move |conn| {
                let removed = conn
                    .execute(
                        "DELETE FROM documents WHERE collection = ?1 AND doc_key = ?2",
                        (collection.as_str(), &*key),
                    )
                    .map_err(|error| store_error("delete_one", &error.to_string()))?;
                Ok(removed > 0)
            })
            .await
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
            self.run(&ctx, "delete_many", move |conn| {
                let (clause, params) = where_clause(collection, &filter);
                let removed = conn
                    .execute(
                        &format!("DELETE FROM documents WHERE {clause}"),
                        params_from_iter(params),
                    )
                    .map_err(|error| store_error("delete_many", &error.to_string()))?;
                Ok(u64::try_from(removed).unwrap_or(u64::MAX))
            })
            .await
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
            self.run(&ctx, "count", move |conn| {
                let (clause, params) = where_clause(collection, &filter);
                let count: i64 = conn
                    .query_row(
                        &format!("SELECT COUNT(*) FROM documents WHERE {clause}"),
                        params_from_iter(params),
                        |row| row.get(0),
                    )
                    .map_err(|error| store_error("count", &error.to_string()))?;
                Ok(u64::try_from(count).unwrap_or_default())
            })
            .await
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
            self.run(&ctx, "count_by_language", move |conn| {
                let (clause, params) = where_clause(collection, &filter);
                let sql = format!(
                    "SELECT language, COUNT(*) FROM documents WHERE {clause} AND language IS NOT NULL GROUP BY language ORDER BY language"
                );
                let mut statement = conn
                    .prepare(&sql)
                    .map_err(|error| store_error("count_by_language", &error.to_string()))?;
                let rows = statement
                    .query_map(params_from_iter(params), |row| {
                        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
                    })
                    .map_err(|error| store_error("count_by_language", &error.to_string()))?;

                let mut counts = Vec::new();
                for row in rows {
                    let (language, count) =
                        row.map_err(|error| store_error("count_by_language", &error.to_string()))?;
                    counts.push((
                        language.into_boxed_str(),
                        u64::try_from(count).unwrap_or_default(),
                    ));
                }
                Ok(counts)
            })
            .await
        })
    }
}

struct RawRow {
    key: String,
    subject_id: Option<String>,
    language: Option<String>,
    created_at_ms: i64,
    body: String,
}

impl RawRow {
    fn into_document(self) -> Result<StoredDocument> {
        let body = serde_json::from_str(&self.body)
            .map_err(|error| corrupt_document(&self.key, &error.to_string()))?;
        Ok(StoredDocument {
            key: self.key.into_boxed_str(),
            subject_id: self.subject_id.map(String::into_boxed_str),
            language: self.language.map(String::into_boxed_str),
            created_at_ms: self.created_at_ms,
            body,
        })
    }
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        key: row.get(0)?,
        subject_id: row.get(1)?,
        language: row.get(2)?,
        created_at_ms: row.get(3)?,
        body: row.get(4)?,
    })
}

fn where_clause(collection: Collection, filter: &DocumentFilter) -> (String, Vec<SqlValue>) {
    let mut clauses = vec!["collection = ?".to_owned()];
    let mut params = vec![SqlValue::Text(collection.as_str().to_owned())];

    if let Some(subject_id) = filter.subject_id.as_deref() {
        clauses.push("subject_id = ?".to_owned());
        params.push(SqlValue::Text(subject_id.to_owned()));
    }
    if let Some(language) = filter.language.as_deref() {
        clauses.push("language = ?".to_owned());
        params.push(SqlValue::Text(language.to_owned()));
    }
    if let Some(cutoff) = filter.created_at_or_before_ms {
        clauses.push("created_at_ms <= ?".to_owned());
        params.push(SqlValue::Integer(cutoff));
    }
    if let Some(cutoff) = filter.created_after_ms {
        clauses.push("created_at_ms > ?".to_owned());
        params.push(SqlValue::Integer(cutoff));
    }

    (clauses.join(" AND "), params)
}

fn open_connection(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|error| store_error("open", &format!("mkdir failed: {error}")))?;
        }
    }

    let conn = configure(Connection::open(path))?;
    let version: i64 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|error| store_error("open", &format!("version read failed: {error}")))?;

    if version == SCHEMA_VERSION {
        return Ok(conn);
    }
    if version == 0 {
        init_schema(&conn)?;
        return Ok(conn);
    }

    drop(conn);
    rotate_legacy(path, version)?;
    let conn = configure(Connection::open(path))?;
    init_schema(&conn)?;
    Ok(conn)
}

fn configure(opened: rusqlite::Result<Connection>) -> Result<Connection> {
    let conn = opened.map_err(|error| store_error("open", &error.to_string()))?;
    conn.busy_timeout(BUSY_TIMEOUT)
        .map_err(|error| store_error("open", &format!("busy timeout failed: {error}")))?;
    conn.execute_batch("PRAGMA journal_mode = WAL;")
        .map_err(|error| store_error("open", &format!("pragma failed: {error}")))?;
    Ok(conn)
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS documents (
            collection TEXT NOT NULL,
            doc_key TEXT NOT NULL,
            subject_id TEXT,
            language TEXT,
            created_at_ms INTEGER NOT NULL,
            body TEXT NOT NULL,
            PRIMARY KEY (collection, doc_key)
         );
         CREATE INDEX IF NOT EXISTS documents_subject ON documents (collection, subject_id);
         CREATE INDEX IF NOT EXISTS documents_language ON documents (collection, language);
         CREATE INDEX IF NOT EXISTS documents_created ON documents (collection, created_at_ms);",
    )
    .map_err(|error| store_error("open", &format!("schema failed: {error}")))?;
    conn.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))
        .map_err(|error| store_error("open", &format!("version set failed: {error}")))?;
    Ok(())
}

fn rotate_legacy(path: &Path, version: i64) -> Result<()> {
    let suffix = legacy_suffix(version);
    let file_name = path
        .file_name()
        .ok_or_else(|| store_error("open", "database path has no file name"))?
        .to_string_lossy()
        .into_owned();

    for companion in ["", "-wal", "-shm"] {
        let current = path.with_file_name(format!("{file_name}{companion}"));
        if current.exists() {
            let legacy = path.with_file_name(format!("{file_name}{companion}.legacy.{suffix}"));
            std::fs::rename(&current, &legacy).map_err(|error| {
                store_error("open", &format!("legacy rotation failed: {error}"))
            })?;
        }
    }
    Ok(())
}
