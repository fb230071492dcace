use serde::Serialize;
use serde_json::Value;

use super::GraphStore;
use crate::graph::PropertyGraph;

/// Outcome counters for one kind of document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DocumentCounts {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub collections_created: usize,
    pub vertices: DocumentCounts,
    pub edges: DocumentCounts,
}

/// Replays a [`PropertyGraph`] into a [`GraphStore`].
///
/// Documents missing from the store are inserted. Existing documents are
/// overwritten in update mode and left untouched otherwise.
pub struct GraphStoreSync<'a, S: ?Sized> {
    store: &'a S,
    update: bool,
}

impl<'a, S> GraphStoreSync<'a, S>
where
    S: GraphStore + Sync + ?Sized,
    crate::Error: From<S::Error>,
{
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self {
            store,
            update: false,
        }
    }

    #[must_use]
    pub const fn update(mut self, update: bool) -> Self {
        self.update = update;
        self
    }

    /// Writes every collection of `graph`, vertices first.
    ///
    /// # Errors
    ///
    /// When the store fails or a document cannot be serialized. Key
    /// conflicts are resolved by the update policy and never fail the sync.
    pub async fn sync(&self, graph: &PropertyGraph) -> crate::Result<SyncReport> {
        let mut report = SyncReport::default();

        for (name, vertices) in graph.vertex_collections() {
            if self.store.ensure_vertex_collection(name).await? {
                report.collections_created += 1;
            }
            for (key, vertex) in vertices {
                let document = vertex.to_document()?;
                self.write(name, key, &document, &mut report.vertices)
                    .await?;
            }
        }

        for (name, edges) in graph.edge_collections() {
            let (from, to) = name.split_once('-').unwrap_or((name, name));
            if self.store.ensure_edge_collection(name, from, to).await? {
                report.collections_created += 1;
            }
            for (key, edge) in edges {
                let document = edge.to_document()?;
                self.write(name, key, &document, &mut report.edges).await?;
            }
        }

        tracing::info!(
            collections_created = report.collections_created,
            vertices_inserted = report.vertices.inserted,
            vertices_updated = report.vertices.updated,
            vertices_skipped = report.vertices.skipped,
            edges_inserted = report.edges.inserted,
            edges_updated = report.edges.updated,
            edges_skipped = report.edges.skipped,
            "graph_store_synced"
        );
        Ok(report)
    }

    async fn write(
        &self,
        collection: &str,
        key: &str,
        document: &Value,
        counts: &mut DocumentCounts,
    ) -> crate::Result<()> {
        if !self.store.has(collection, key).await? {
            self.store.insert(collection, key, document).await?;
            counts.inserted += 1;
        } else if self.update {
            self.store.update(collection, key, document).await?;
            counts.updated += 1;
        } else {
            tracing::debug!(collection, key, "store_document_exists");
            counts.skipped += 1;
        }
        Ok(())
    }
}
