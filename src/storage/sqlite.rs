//! SQLite storage implementation
//!
//! This module provides a SQLite-backed implementation of the DocumentStore
//! trait. Documents are stored as JSON text and filtered with `json_extract`.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{
    Document, DocumentId, DocumentStore, Filter, StoreError, StoreResult, StoredDocument,
};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite document store backend
pub struct SqliteDocumentStore {
    conn: Connection,
}

impl SqliteDocumentStore {
    /// Opens (or creates) a store at the given path
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteDocumentStore)` - Successfully opened/created database
    /// * `Err(StoreError)` - Failed to open database
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        tracing::info!("Opened document store at {}", path.display());
        Ok(Self { conn })
    }

    /// Creates an in-memory store (tests and dry runs)
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Returns every document of a collection in insertion order
    pub fn documents(&self, collection: &str) -> StoreResult<Vec<StoredDocument>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, body FROM documents WHERE collection = ?1 ORDER BY id")
            .map_err(|e| read_error(collection, e))?;

        let rows = stmt
            .query_map(params![collection], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(|e| read_error(collection, e))?;

        let mut documents = Vec::new();
        for row in rows {
            let (id, body) = row.map_err(|e| read_error(collection, e))?;
            documents.push(to_stored(id, &body)?);
        }

        Ok(documents)
    }

    fn ensure_collection(conn: &Connection, name: &str) -> Result<(), rusqlite::Error> {
        conn.execute(
            "INSERT OR IGNORE INTO collections (name, created_at) VALUES (?1, ?2)",
            params![name, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<StoredDocument>> {
        // The path is inlined so the query matches the expression index on `name`
        if !filter
            .field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(StoreError::Read {
                collection: collection.to_string(),
                message: format!("unsupported filter field '{}'", filter.field),
            });
        }

        let sql = format!(
            "SELECT id, body FROM documents
             WHERE collection = ?1 AND json_extract(body, '$.{}') = ?2
             ORDER BY id LIMIT 1",
            filter.field
        );

        let row = self
            .conn
            .query_row(&sql, params![collection, filter.value], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })
            .optional()
            .map_err(|e| read_error(collection, e))?;

        match row {
            Some((id, body)) => Ok(Some(to_stored(id, &body)?)),
            None => Ok(None),
        }
    }

    fn insert_one(&mut self, collection: &str, doc: &Document) -> StoreResult<DocumentId> {
        let body = serde_json::to_string(doc)?;

        Self::ensure_collection(&self.conn, collection).map_err(|e| write_error(collection, e))?;
        self.conn
            .execute(
                "INSERT INTO documents (collection, body, inserted_at) VALUES (?1, ?2, ?3)",
                params![collection, body, Utc::now().to_rfc3339()],
            )
            .map_err(|e| write_error(collection, e))?;

        Ok(DocumentId::new(self.conn.last_insert_rowid().to_string()))
    }

    fn insert_many(&mut self, collection: &str, docs: &[Document]) -> StoreResult<usize> {
        if docs.is_empty() {
            return Ok(0);
        }

        let bodies = docs
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?;
        let now = Utc::now().to_rfc3339();

        let tx = self
            .conn
            .transaction()
            .map_err(|e| write_error(collection, e))?;
        Self::ensure_collection(&tx, collection).map_err(|e| write_error(collection, e))?;
        {
            let mut stmt = tx
                .prepare("INSERT INTO documents (collection, body, inserted_at) VALUES (?1, ?2, ?3)")
                .map_err(|e| write_error(collection, e))?;
            for body in &bodies {
                stmt.execute(params![collection, body, now])
                    .map_err(|e| write_error(collection, e))?;
            }
        }
        tx.commit().map_err(|e| write_error(collection, e))?;

        Ok(bodies.len())
    }

    fn list_collections(&self) -> StoreResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM collections ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    fn create_collection(&mut self, name: &str) -> StoreResult<()> {
        Self::ensure_collection(&self.conn, name).map_err(|e| write_error(name, e))
    }

    fn count(&self, collection: &str) -> StoreResult<u64> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM documents WHERE collection = ?1",
                params![collection],
                |row| row.get(0),
            )
            .map_err(|e| read_error(collection, e))?;
        Ok(count as u64)
    }
}

fn to_stored(id: i64, body: &str) -> StoreResult<StoredDocument> {
    Ok(StoredDocument {
        id: DocumentId::new(id.to_string()),
        body: serde_json::from_str(body)?,
    })
}

fn read_error(collection: &str, e: rusqlite::Error) -> StoreError {
    StoreError::Read {
        collection: collection.to_string(),
        message: e.to_string(),
    }
}

fn write_error(collection: &str, e: rusqlite::Error) -> StoreError {
    StoreError::Write {
        collection: collection.to_string(),
        message: e.to_string(),
    }
}
