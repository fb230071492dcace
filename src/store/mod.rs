//! Persistent graph store contract and its adapters.

mod document_store;
mod sync;

use async_trait::async_trait;
use serde_json::Value;

pub use document_store::{OpendalGraphStore, StoreBackend};
pub use sync::{DocumentCounts, GraphStoreSync, SyncReport};

/// Minimal contract the sync step needs from a document-oriented graph
/// database.
#[async_trait]
pub trait GraphStore {
    /// Associated error type allowing infrastructure specific failures.
    type Error;

    /// Creates the vertex collection `name` when missing. Returns whether it
    /// was created.
    async fn ensure_vertex_collection(&self, name: &str) -> Result<bool, Self::Error>;

    /// Creates the edge collection `name` linking `from` to `to` vertex
    /// collections when missing. Returns whether it was created.
    async fn ensure_edge_collection(
        &self,
        name: &str,
        from: &str,
        to: &str,
    ) -> Result<bool, Self::Error>;

    /// Whether a document with `key` exists in `collection`.
    async fn has(&self, collection: &str, key: &str) -> Result<bool, Self::Error>;

    /// Stores a new document.
    ///
    /// Implementors must reject keys that already exist.
    async fn insert(&self, collection: &str, key: &str, document: &Value)
        -> Result<(), Self::Error>;

    /// Replaces an existing document.
    ///
    /// Implementors must reject keys that do not exist.
    async fn update(&self, collection: &str, key: &str, document: &Value)
        -> Result<(), Self::Error>;
}

/// Errors raised by store adapters.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Document already present on insert.
    #[error("document `{collection}/{key}` already exists")]
    Duplicate { collection: String, key: String },
    /// Document missing on update.
    #[error("document `{collection}/{key}` missing")]
    Missing { collection: String, key: String },
    /// Collection used before it was created.
    #[error("collection `{0}` missing")]
    MissingCollection(String),
    #[error(transparent)]
    Backend(#[from] opendal::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
