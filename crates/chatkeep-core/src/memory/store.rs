//! Persisted embedding store with brute-force nearest-neighbor search.

use super::VectorRepository;
use super::record::{
    DIMENSIONS_KEY, TIMESTAMP_KEY, VectorMatch, VectorRecord, VectorStoreDocument,
    VectorStoreStats,
};
use super::similarity::cosine_similarity;
use crate::config::MemoryConfig;
use crate::error::{ChatkeepError, Result};
use chrono::Utc;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::sync::Arc;

/// An id → embedding store ranked by cosine similarity.
///
/// Records are loaded lazily on first access. Every `flush_interval`-th
/// insert, and every `delete`/`clear`, rewrites the whole store through the
/// [`VectorRepository`]. A failed automatic flush is logged and retried on
/// the next one; the in-memory change stays applied.
///
/// All embeddings share one dimension, fixed by the first record stored and
/// released when the store becomes empty.
pub struct VectorMemoryStore {
    repository: Arc<dyn VectorRepository>,
    records: IndexMap<String, VectorRecord>,
    loaded: bool,
    flush_interval: usize,
    inserts_since_flush: usize,
    pending_flush: bool,
}

impl VectorMemoryStore {
    pub fn new(repository: Arc<dyn VectorRepository>, config: &MemoryConfig) -> Self {
        Self {
            repository,
            records: IndexMap::new(),
            loaded: false,
            flush_interval: config.flush_interval.max(1),
            inserts_since_flush: 0,
            pending_flush: false,
        }
    }

    /// Reads the persisted store, replacing anything held in memory.
    ///
    /// A missing or malformed file yields an empty store.
    ///
    /// # Errors
    ///
    /// Returns `Io` when the file exists but cannot be read.
    pub async fn load(&mut self) -> Result<()> {
        let records = match self.repository.load().await {
            Ok(Some(document)) => match document.into_records("vector store") {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!("Ignoring malformed vector store: {}", e);
                    IndexMap::new()
                }
            },
            Ok(None) => IndexMap::new(),
            Err(e) if e.is_invalid_format() || e.is_serialization() => {
                tracing::warn!("Ignoring unreadable vector store: {}", e);
                IndexMap::new()
            }
            Err(e) => return Err(e),
        };

        tracing::debug!("Loaded {} vectors", records.len());
        self.records = records;
        self.loaded = true;
        self.inserts_since_flush = 0;
        self.pending_flush = false;
        Ok(())
    }

    async fn ensure_loaded(&mut self) -> Result<()> {
        if !self.loaded {
            self.load().await?;
        }
        Ok(())
    }

    /// Writes the whole store, replacing the previous file.
    pub async fn save(&mut self) -> Result<()> {
        self.ensure_loaded().await?;
        let document = VectorStoreDocument::from_records(&self.records, Utc::now());
        self.repository.save(&document).await?;
        self.pending_flush = false;
        self.inserts_since_flush = 0;
        tracing::debug!("Saved {} vectors", self.records.len());
        Ok(())
    }

    async fn flush(&mut self) {
        self.pending_flush = true;
        if let Err(e) = self.save().await {
            tracing::warn!("Vector store flush failed, will retry on next flush: {}", e);
            self.inserts_since_flush = 0;
        }
    }

    /// Inserts or fully replaces the record stored under `id`.
    ///
    /// `timestamp` (unix millis) and `dimensions` are added to `metadata`.
    /// A replaced record keeps its original position in the store.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an empty id, an empty or non-finite vector,
    /// or a vector whose dimension differs from the stored ones.
    pub async fn store(
        &mut self,
        id: &str,
        vector: Vec<f32>,
        mut metadata: Map<String, Value>,
    ) -> Result<()> {
        self.ensure_loaded().await?;

        if id.trim().is_empty() {
            return Err(ChatkeepError::validation("vector id must not be empty"));
        }
        if vector.is_empty() {
            return Err(ChatkeepError::validation("vector must not be empty"));
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(ChatkeepError::validation(format!(
                "vector '{}' contains non-finite values",
                id
            )));
        }
        self.check_dimensions(vector.len())?;

        let inserted_at = Utc::now().timestamp_millis();
        metadata.insert(TIMESTAMP_KEY.to_string(), Value::from(inserted_at));
        metadata.insert(DIMENSIONS_KEY.to_string(), Value::from(vector.len()));

        let record = VectorRecord {
            id: id.to_string(),
            embedding: vector,
            metadata,
            inserted_at,
        };
        if self.records.insert(id.to_string(), record).is_some() {
            tracing::debug!("Replaced vector '{}'", id);
        }

        self.inserts_since_flush += 1;
        self.pending_flush = true;
        if self.inserts_since_flush >= self.flush_interval {
            self.flush().await;
        }
        Ok(())
    }

    pub async fn get(&mut self, id: &str) -> Result<Option<&VectorRecord>> {
        self.ensure_loaded().await?;
        Ok(self.records.get(id))
    }

    /// Removes `id` and flushes. Returns false when `id` was not stored.
    pub async fn delete(&mut self, id: &str) -> Result<bool> {
        self.ensure_loaded().await?;
        if self.records.shift_remove(id).is_none() {
            return Ok(false);
        }
        self.flush().await;
        Ok(true)
    }

    /// Removes every record and flushes.
    pub async fn clear(&mut self) -> Result<()> {
        self.ensure_loaded().await?;
        let removed = self.records.len();
        self.records.clear();
        self.flush().await;
        tracing::info!("Cleared {} vectors", removed);
        Ok(())
    }

    /// Returns up to `k` records most similar to `query`, best first.
    ///
    /// Equal similarities keep insertion order.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when `k` is zero or the query dimension differs
    /// from the stored embeddings.
    pub async fn search(&mut self, query: &[f32], k: usize) -> Result<Vec<VectorMatch>> {
        self.ensure_loaded().await?;
        if k == 0 {
            return Err(ChatkeepError::validation("k must be at least 1"));
        }
        if self.records.is_empty() {
            return Ok(Vec::new());
        }
        self.check_dimensions(query.len())?;

        let mut scored: Vec<(&VectorRecord, f64)> = self
            .records
            .values()
            .map(|record| (record, cosine_similarity(query, &record.embedding)))
            .collect();
        // Stable sort keeps insertion order among equal scores
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(record, similarity)| VectorMatch {
                id: record.id.clone(),
                similarity,
                metadata: record.metadata.clone(),
            })
            .collect())
    }

    pub async fn stats(&mut self) -> Result<VectorStoreStats> {
        self.ensure_loaded().await?;
        let document = VectorStoreDocument::from_records(&self.records, Utc::now());
        Ok(VectorStoreStats {
            count: self.records.len(),
            dimensions: self.dimensions().unwrap_or(0),
            approximate_size_bytes: serde_json::to_vec(&document)?.len(),
        })
    }

    /// Dimension shared by the stored embeddings, if any are stored.
    pub fn dimensions(&self) -> Option<usize> {
        self.records.values().next().map(|r| r.embedding.len())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True when in-memory changes have not reached disk yet.
    pub fn has_pending_changes(&self) -> bool {
        self.pending_flush
    }

    fn check_dimensions(&self, len: usize) -> Result<()> {
        match self.dimensions() {
            Some(expected) if expected != len => Err(ChatkeepError::validation(format!(
                "embedding has {} dimensions, store holds {}-dimensional vectors",
                len, expected
            ))),
            _ => Ok(()),
        }
    }
}
