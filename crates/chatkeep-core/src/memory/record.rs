//! Vector memory records and their persisted document form.

use crate::error::{ChatkeepError, Result};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata key holding the insertion time in unix milliseconds.
pub const TIMESTAMP_KEY: &str = "timestamp";

/// Metadata key holding the embedding dimension.
pub const DIMENSIONS_KEY: &str = "dimensions";

/// A stored embedding and its metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorRecord {
    pub id: String,
    pub embedding: Vec<f32>,
    /// Caller metadata plus `timestamp` and `dimensions`
    pub metadata: Map<String, Value>,
    /// Unix milliseconds of the last upsert
    pub inserted_at: i64,
}

/// A search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorMatch {
    pub id: String,
    pub similarity: f64,
    pub metadata: Map<String, Value>,
}

/// Size summary of a vector store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorStoreStats {
    pub count: usize,
    /// Embedding dimension, 0 when the store is empty
    pub dimensions: usize,
    /// Length of the serialized store in bytes
    pub approximate_size_bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEmbedding {
    pub embedding: Vec<f32>,
}

/// On-disk form of the whole vector store.
///
/// Both maps keep insertion order, which is also the tie-break order for
/// search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorStoreDocument {
    pub vectors: IndexMap<String, StoredEmbedding>,
    #[serde(default)]
    pub metadata: IndexMap<String, Map<String, Value>>,
    pub last_saved: DateTime<Utc>,
    pub count: usize,
}

impl VectorStoreDocument {
    /// Builds the document for `records`, stamped with `saved_at`.
    pub fn from_records(
        records: &IndexMap<String, VectorRecord>,
        saved_at: DateTime<Utc>,
    ) -> Self {
        let mut vectors = IndexMap::with_capacity(records.len());
        let mut metadata = IndexMap::with_capacity(records.len());
        for (id, record) in records {
            vectors.insert(
                id.clone(),
                StoredEmbedding {
                    embedding: record.embedding.clone(),
                },
            );
            metadata.insert(id.clone(), record.metadata.clone());
        }

        Self {
            vectors,
            metadata,
            last_saved: saved_at,
            count: records.len(),
        }
    }

    /// Rebuilds records in stored order.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` if the embeddings do not share one non-zero
    /// dimension.
    pub fn into_records(self, source_name: &str) -> Result<IndexMap<String, VectorRecord>> {
        let mut metadata = self.metadata;
        let mut records = IndexMap::with_capacity(self.vectors.len());
        let mut dimensions: Option<usize> = None;

        for (id, stored) in self.vectors {
            let len = stored.embedding.len();
            if len == 0 {
                return Err(ChatkeepError::invalid_format(
                    source_name,
                    format!("vector '{}' is empty", id),
                ));
            }
            match dimensions {
                Some(expected) if expected != len => {
                    return Err(ChatkeepError::invalid_format(
                        source_name,
                        format!(
                            "vector '{}' has {} dimensions, expected {}",
                            id, len, expected
                        ),
                    ));
                }
                _ => dimensions = Some(len),
            }

            let record_metadata = metadata.swap_remove(&id).unwrap_or_default();
            let inserted_at = record_metadata
                .get(TIMESTAMP_KEY)
                .and_then(Value::as_i64)
                .unwrap_or(0);

            records.insert(
                id.clone(),
                VectorRecord {
                    id,
                    embedding: stored.embedding,
                    metadata: record_metadata,
                    inserted_at,
                },
            );
        }

        Ok(records)
    }
}
