//! Storage module for persisting harvested records
//!
//! This module handles everything written to the document store:
//! - The narrow `DocumentStore` contract and its SQLite backend
//! - Buffered, deduplicating company writes
//! - Immediate location and industry reference writes
//! - The shapes of the persisted documents

mod schema;
mod sqlite;
mod traits;
mod writer;

pub use sqlite::SqliteDocumentStore;
pub use traits::{
    Document, DocumentId, DocumentStore, Filter, StoreError, StoreResult, StoredDocument,
};
pub use writer::{BufferedDedupWriter, FlushOutcome, WriterConfig};

use serde::{Deserialize, Serialize};

/// A company's location, inserted once per company visited
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub country: String,
    pub city: String,
    pub state: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub created_at: String,
}

/// Industry reference row; at most one per category name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryRecord {
    pub name: String,
    pub created_at: String,
}

/// The document written to the company collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedCompanyRecord {
    pub name: String,
    pub size: Option<String>,

    /// Not published by the directories; kept for schema compatibility
    pub revenue: String,
    pub website: Option<String>,
    pub description: Option<String>,
    pub contact_numbers: Vec<String>,
    pub location_id: DocumentId,
    pub industry_id: DocumentId,
    pub created_at: String,
}
