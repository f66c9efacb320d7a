//! Buffered, deduplicating document writer
//!
//! One writer owns one collection and supports two modes:
//!
//! - **Buffered dedup** (`add`/`flush`): records gated by a dedup key are held
//!   in memory and batch-inserted once the buffer reaches `buffer_size` or
//!   `max_wait` has passed since the last flush. A failed batch is logged and
//!   dropped; writes are at-most-once.
//! - **Immediate** (`insert`/`find_or_create`): reference rows written straight
//!   through, returning their identifiers.
//!
//! `close` must be called at the end of a run; records still buffered when a
//! writer is dropped without it are lost.

use crate::storage::traits::{
    Document, DocumentId, DocumentStore, Filter, StoreError, StoreResult,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Per-writer settings
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Collection the writer targets
    pub collection: String,

    /// Field used to decide whether a record is already stored
    pub dedup_key: String,

    /// Buffer length that triggers a flush
    pub buffer_size: usize,

    /// Age since the last flush that triggers a flush
    pub max_wait: Duration,
}

impl WriterConfig {
    /// Settings for `collection` with the default key `name`, 100 records and 60s
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            dedup_key: "name".to_string(),
            buffer_size: 100,
            max_wait: Duration::from_secs(60),
        }
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }
}

/// What a flush did with the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing was buffered
    Empty,

    /// The whole buffer was stored
    Inserted(usize),

    /// The batch insert failed and the buffer was dropped
    Discarded(usize),
}

/// Writer over one collection of a shared document store
pub struct BufferedDedupWriter<S: DocumentStore> {
    store: Arc<Mutex<S>>,
    config: WriterConfig,
    buffer: Vec<Document>,
    last_flush: Instant,
}

impl<S: DocumentStore> BufferedDedupWriter<S> {
    /// Opens a writer, creating its collection if it does not exist
    pub fn open(store: Arc<Mutex<S>>, config: WriterConfig) -> StoreResult<Self> {
        {
            let mut guard = lock(&store)?;
            if !guard.list_collections()?.contains(&config.collection) {
                guard.create_collection(&config.collection)?;
                tracing::info!("Created collection {}", config.collection);
            }
        }

        tracing::debug!(
            collection = %config.collection,
            buffer_size = config.buffer_size,
            max_wait = ?config.max_wait,
            "Opened writer"
        );

        Ok(Self {
            store,
            config,
            buffer: Vec::new(),
            last_flush: Instant::now(),
        })
    }

    /// Buffers a record unless its dedup key is already stored or buffered
    ///
    /// May flush before returning when a size or age threshold is crossed.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The record was buffered
    /// * `Ok(false)` - A record with the same key exists; nothing changed
    /// * `Err(StoreError)` - The record has no key, or the lookup failed
    pub fn add<T: Serialize>(&mut self, record: &T) -> StoreResult<bool> {
        let doc = to_document(record)?;
        let key = self.dedup_value(&doc)?;

        if self.is_buffered(&key) {
            tracing::debug!(collection = %self.config.collection, key = %key, "Already buffered");
            return Ok(false);
        }

        if self.find_by_key(&key)?.is_some() {
            tracing::debug!(collection = %self.config.collection, key = %key, "Already stored");
            return Ok(false);
        }

        self.buffer.push(doc);

        if self.should_flush(Instant::now()) {
            self.flush();
        }

        Ok(true)
    }

    /// Batch-inserts the buffer and clears it
    ///
    /// A failed batch is logged and dropped, never retried.
    pub fn flush(&mut self) -> FlushOutcome {
        if self.buffer.is_empty() {
            return FlushOutcome::Empty;
        }

        let batch = std::mem::take(&mut self.buffer);
        let result = lock(&self.store)
            .and_then(|mut store| store.insert_many(&self.config.collection, &batch));
        self.last_flush = Instant::now();

        match result {
            Ok(count) => {
                tracing::info!(
                    collection = %self.config.collection,
                    count,
                    "Inserted buffered documents"
                );
                FlushOutcome::Inserted(count)
            }
            Err(e) => {
                tracing::error!(
                    collection = %self.config.collection,
                    count = batch.len(),
                    "Error inserting documents, batch discarded: {}",
                    e
                );
                FlushOutcome::Discarded(batch.len())
            }
        }
    }

    /// Inserts a record immediately, without dedup, and returns its identifier
    pub fn insert<T: Serialize>(&mut self, record: &T) -> StoreResult<DocumentId> {
        let doc = to_document(record)?;
        let id = lock(&self.store)?.insert_one(&self.config.collection, &doc)?;
        tracing::debug!(collection = %self.config.collection, id = %id, "Inserted document");
        Ok(id)
    }

    /// Returns the identifier of the record with this key, creating it if absent
    ///
    /// A created record holds only the key and a `created_at` timestamp. The
    /// store lock is held across lookup and insert, so callers sharing the
    /// store cannot interleave on the same key.
    pub fn find_or_create(&mut self, key: &str) -> StoreResult<DocumentId> {
        let mut store = lock(&self.store)?;
        let filter = Filter::eq(&self.config.dedup_key, key);

        if let Some(existing) = store.find_one(&self.config.collection, &filter)? {
            return Ok(existing.id);
        }

        let mut doc = Document::new();
        doc.insert(self.config.dedup_key.clone(), Value::String(key.to_string()));
        doc.insert(
            "created_at".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );

        let id = store.insert_one(&self.config.collection, &doc)?;
        tracing::info!(collection = %self.config.collection, key, id = %id, "Created reference record");
        Ok(id)
    }

    /// Checks whether a record with this key is stored or buffered
    pub fn contains(&self, key: &str) -> StoreResult<bool> {
        Ok(self.is_buffered(key) || self.find_by_key(key)?.is_some())
    }

    /// Number of records waiting for the next flush
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn collection(&self) -> &str {
        &self.config.collection
    }

    /// Flushes the remainder and releases the store handle
    pub fn close(mut self) -> FlushOutcome {
        let outcome = self.flush();
        tracing::info!(collection = %self.config.collection, "Closed writer");
        outcome
    }

    fn should_flush(&self, now: Instant) -> bool {
        self.buffer.len() >= self.config.buffer_size
            || now.duration_since(self.last_flush) >= self.config.max_wait
    }

    fn dedup_value(&self, doc: &Document) -> StoreResult<String> {
        match doc.get(&self.config.dedup_key).and_then(Value::as_str) {
            Some(key) if !key.is_empty() => Ok(key.to_string()),
            _ => Err(StoreError::MissingDedupKey {
                collection: self.config.collection.clone(),
                key: self.config.dedup_key.clone(),
            }),
        }
    }

    fn is_buffered(&self, key: &str) -> bool {
        self.buffer
            .iter()
            .any(|doc| doc.get(&self.config.dedup_key).and_then(Value::as_str) == Some(key))
    }

    fn find_by_key(&self, key: &str) -> StoreResult<Option<crate::storage::StoredDocument>> {
        let filter = Filter::eq(&self.config.dedup_key, key);
        lock(&self.store)?.find_one(&self.config.collection, &filter)
    }
}

impl<S: DocumentStore> Drop for BufferedDedupWriter<S> {
    fn drop(&mut self) {
        if !self.buffer.is_empty() {
            tracing::warn!(
                collection = %self.config.collection,
                count = self.buffer.len(),
                "Writer dropped without close, buffered documents lost"
            );
        }
    }
}

fn lock<S>(store: &Arc<Mutex<S>>) -> StoreResult<MutexGuard<'_, S>> {
    store.lock().map_err(|_| StoreError::Poisoned)
}

fn to_document<T: Serialize>(record: &T) -> StoreResult<Document> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::NotAnObject),
    }
}
