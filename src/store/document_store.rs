use std::path::PathBuf;

use async_trait::async_trait;
use opendal::{services, Operator};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{GraphStore, StoreError};

const COLLECTION_MARKER: &str = "_collection.json";
const DOCUMENT_SUFFIX: &str = ".json";

/// Where an [`OpendalGraphStore`] keeps its documents.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Memory,
    Fs,
}

/// Document store over an [`opendal::Operator`].
///
/// Every document lives at `{collection}/{key}.json` and every collection is
/// marked by `{collection}/_collection.json`.
#[derive(Clone, Debug)]
pub struct OpendalGraphStore {
    operator: Operator,
}

impl OpendalGraphStore {
    #[must_use]
    pub const fn new(operator: Operator) -> Self {
        Self { operator }
    }

    /// Creates a store held in memory.
    ///
    /// # Errors
    ///
    /// When the operator cannot be built.
    pub fn memory() -> Result<Self, StoreError> {
        Ok(Self::new(Operator::new(services::Memory::default())?.finish()))
    }

    /// Creates a store rooted at `root` on the local file system.
    ///
    /// # Errors
    ///
    /// When the operator cannot be built.
    pub fn fs(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        let builder = services::Fs::default().root(&root.to_string_lossy());
        Ok(Self::new(Operator::new(builder)?.finish()))
    }

    /// Reads a stored document.
    ///
    /// # Errors
    ///
    /// When the backend fails or the stored bytes are not JSON.
    pub async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError> {
        let path = document_path(collection, key);
        if !self.operator.exists(&path).await? {
            return Ok(None);
        }
        let bytes = self.operator.read(&path).await?.to_vec();
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Keys stored in `collection`, sorted.
    ///
    /// # Errors
    ///
    /// When the backend fails.
    pub async fn keys(&self, collection: &str) -> Result<Vec<String>, StoreError> {
        let mut keys = self
            .operator
            .list(&format!("{collection}/"))
            .await?
            .into_iter()
            .filter_map(|entry| {
                let name = entry.name();
                (name != COLLECTION_MARKER)
                    .then(|| name.strip_suffix(DOCUMENT_SUFFIX))
                    .flatten()
                    .map(str::to_owned)
            })
            .collect::<Vec<_>>();
        keys.sort();
        Ok(keys)
    }

    /// Whether `name` was created as a collection.
    ///
    /// # Errors
    ///
    /// When the backend fails.
    pub async fn has_collection(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.operator.exists(&marker_path(name)).await?)
    }

    async fn ensure_collection(&self, name: &str, marker: Value) -> Result<bool, StoreError> {
        if self.has_collection(name).await? {
            return Ok(false);
        }
        self.operator
            .write(&marker_path(name), serde_json::to_vec(&marker)?)
            .await?;
        tracing::debug!(collection = name, "store_collection_created");
        Ok(true)
    }

    async fn write(&self, collection: &str, key: &str, document: &Value) -> Result<(), StoreError> {
        if !self.has_collection(collection).await? {
            return Err(StoreError::MissingCollection(collection.to_owned()));
        }
        self.operator
            .write(&document_path(collection, key), serde_json::to_vec(document)?)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl GraphStore for OpendalGraphStore {
    type Error = StoreError;

    async fn ensure_vertex_collection(&self, name: &str) -> Result<bool, Self::Error> {
        self.ensure_collection(name, json!({ "name": name, "type": "vertex" }))
            .await
    }

    async fn ensure_edge_collection(
        &self,
        name: &str,
        from: &str,
        to: &str,
    ) -> Result<bool, Self::Error> {
        self.ensure_collection(
            name,
            json!({ "name": name, "type": "edge", "from": [from], "to": [to] }),
        )
        .await
    }

    async fn has(&self, collection: &str, key: &str) -> Result<bool, Self::Error> {
        Ok(self.operator.exists(&document_path(collection, key)).await?)
    }

    async fn insert(
        &self,
        collection: &str,
        key: &str,
        document: &Value,
    ) -> Result<(), Self::Error> {
        if self.has(collection, key).await? {
            return Err(StoreError::Duplicate {
                collection: collection.to_owned(),
                key: key.to_owned(),
            });
        }
        self.write(collection, key, document).await
    }

    async fn update(
        &self,
        collection: &str,
        key: &str,
        document: &Value,
    ) -> Result<(), Self::Error> {
        if !self.has(collection, key).await? {
            return Err(StoreError::Missing {
                collection: collection.to_owned(),
                key: key.to_owned(),
            });
        }
        self.write(collection, key, document).await
    }
}

fn document_path(collection: &str, key: &str) -> String {
    format!("{collection}/{key}{DOCUMENT_SUFFIX}")
}

fn marker_path(collection: &str) -> String {
    format!("{collection}/{COLLECTION_MARKER}")
}
