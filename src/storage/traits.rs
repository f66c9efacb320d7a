//! Storage traits and error types
//!
//! This module defines the narrow document-store contract the harvester
//! writes through, and the error types its backends report.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A stored document: a JSON object
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// A lookup failed. Never to be read as "no match".
    #[error("Lookup in '{collection}' failed: {message}")]
    Read { collection: String, message: String },

    #[error("Write to '{collection}' failed: {message}")]
    Write { collection: String, message: String },

    #[error("Record for '{collection}' has no value for dedup key '{key}'")]
    MissingDedupKey { collection: String, key: String },

    #[error("Record is not a JSON object")]
    NotAnObject,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Store handle poisoned by a panicked writer")]
    Poisoned,
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Opaque identifier of a stored document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Equality filter on one top-level string field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub field: String,
    pub value: String,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// A document as returned by a lookup
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: DocumentId,
    pub body: Document,
}

/// Trait for document store backends
///
/// Collections are created on first insert if they do not exist yet.
pub trait DocumentStore {
    /// Finds the first document in `collection` matching `filter`
    ///
    /// # Returns
    ///
    /// * `Ok(Some(doc))` - A matching document
    /// * `Ok(None)` - No document matches
    /// * `Err(StoreError::Read)` - The lookup itself failed
    fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<StoredDocument>>;

    /// Inserts one document and returns its new identifier
    fn insert_one(&mut self, collection: &str, doc: &Document) -> StoreResult<DocumentId>;

    /// Inserts a batch of documents
    ///
    /// Either every document is stored or none is.
    ///
    /// # Returns
    ///
    /// The number of documents inserted
    fn insert_many(&mut self, collection: &str, docs: &[Document]) -> StoreResult<usize>;

    /// Lists existing collection names
    fn list_collections(&self) -> StoreResult<Vec<String>>;

    /// Creates an empty collection; creating an existing one is a no-op
    fn create_collection(&mut self, name: &str) -> StoreResult<()>;

    /// Counts the documents in a collection
    fn count(&self, collection: &str) -> StoreResult<u64>;
}
