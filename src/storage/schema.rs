//! Database schema definitions
//!
//! Documents of every collection live in one table as JSON text. Lookups
//! filter with `json_extract`; the expression index covers the `name` key
//! that company dedup and industry reference lookups use.

/// SQL schema for the document store
pub const SCHEMA_SQL: &str = r#"
-- Known collections
CREATE TABLE IF NOT EXISTS collections (
    name TEXT PRIMARY KEY,
    created_at TEXT NOT NULL
);

-- Documents of all collections
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    collection TEXT NOT NULL REFERENCES collections(name),
    body TEXT NOT NULL,
    inserted_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection);
CREATE INDEX IF NOT EXISTS idx_documents_name
    ON documents(collection, json_extract(body, '$.name'));
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
