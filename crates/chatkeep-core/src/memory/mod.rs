//! Vector memory module.
//!
//! An id-keyed embedding store persisted as a single JSON document and
//! searched by cosine similarity.
//!
//! # Module Structure
//!
//! - `record`: Stored records, search hits and the on-disk document
//! - `similarity`: Cosine similarity
//! - `store`: The in-memory store (`VectorMemoryStore`)

mod record;
mod similarity;
mod store;

use crate::error::Result;
use async_trait::async_trait;

pub use record::{
    DIMENSIONS_KEY, StoredEmbedding, TIMESTAMP_KEY, VectorMatch, VectorRecord,
    VectorStoreDocument, VectorStoreStats,
};
pub use similarity::cosine_similarity;
pub use store::VectorMemoryStore;

/// Persistence for the whole vector store document.
#[async_trait]
pub trait VectorRepository: Send + Sync {
    /// Reads the stored document.
    ///
    /// Returns `Ok(None)` if nothing has been stored yet, and an
    /// `InvalidFormat` error if the stored data cannot be parsed.
    async fn load(&self) -> Result<Option<VectorStoreDocument>>;

    /// Replaces the stored document.
    async fn save(&self, document: &VectorStoreDocument) -> Result<()>;
}
