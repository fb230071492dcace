mod support;

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use owlgraph::{
    config::OntologySettings,
    graph::GraphBuilder,
    ontology::TermClassifier,
    pipeline::OntologyLoader,
    rdf::{FileTripleSource, RdfTerm, Statement, Triple},
    store::{DocumentCounts, GraphStore, GraphStoreSync, OpendalGraphStore, StoreError},
};
use rstest::rstest;
use serde_json::{json, Value};

type Documents = BTreeMap<(String, String), Value>;

/// Store stub recording every call.
#[derive(Clone, Default)]
struct RecordingStore {
    collections: Arc<Mutex<Vec<String>>>,
    documents: Arc<Mutex<Documents>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl RecordingStore {
    fn record(&self, call: String) {
        self.calls.lock().expect("calls").push(call);
    }
}

#[async_trait]
impl GraphStore for RecordingStore {
    type Error = StoreError;

    async fn ensure_vertex_collection(&self, name: &str) -> Result<bool, Self::Error> {
        let mut collections = self.collections.lock().expect("collections");
        if collections.iter().any(|existing| existing == name) {
            return Ok(false);
        }
        collections.push(name.to_string());
        Ok(true)
    }

    async fn ensure_edge_collection(
        &self,
        name: &str,
        _from: &str,
        _to: &str,
    ) -> Result<bool, Self::Error> {
        self.ensure_vertex_collection(name).await
    }

    async fn has(&self, collection: &str, key: &str) -> Result<bool, Self::Error> {
        Ok(self
            .documents
            .lock()
            .expect("documents")
            .contains_key(&(collection.to_string(), key.to_string())))
    }

    async fn insert(
        &self,
        collection: &str,
        key: &str,
        document: &Value,
    ) -> Result<(), Self::Error> {
        self.record(format!("insert {collection}/{key}"));
        self.documents
            .lock()
            .expect("documents")
            .insert((collection.to_string(), key.to_string()), document.clone());
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        key: &str,
        document: &Value,
    ) -> Result<(), Self::Error> {
        self.record(format!("update {collection}/{key}"));
        self.documents
            .lock()
            .expect("documents")
            .insert((collection.to_string(), key.to_string()), document.clone());
        Ok(())
    }
}

fn iri(text: &str) -> RdfTerm {
    RdfTerm::iri(text).expect("valid iri")
}

fn statements(label: &str) -> Vec<Statement> {
    vec![
        Statement::Triple(Triple::new(
            iri("http://purl.obolibrary.org/obo/CL_0000001"),
            iri("http://www.w3.org/2000/01/rdf-schema#subClassOf"),
            iri("http://purl.obolibrary.org/obo/CL_0000000"),
        )),
        Statement::Triple(Triple::new(
            iri("http://purl.obolibrary.org/obo/CL_0000001"),
            iri("http://www.w3.org/2000/01/rdf-schema#label"),
            RdfTerm::literal(label),
        )),
    ]
}

#[rstest]
#[case(false, DocumentCounts { inserted: 0, updated: 0, skipped: 2 }, json!("primary cell"))]
#[case(true, DocumentCounts { inserted: 0, updated: 2, skipped: 0 }, json!(["primary cell", "cell type"]))]
#[tokio::test]
async fn rerun_follows_update_policy(
    #[case] update: bool,
    #[case] expected_vertices: DocumentCounts,
    #[case] expected_label: Value,
) {
    let classifier = TermClassifier::new().expect("classifier");
    let store = RecordingStore::default();

    let first = GraphBuilder::new(&classifier).build(&statements("primary cell"));
    let report = GraphStoreSync::new(&store)
        .sync(&first.graph)
        .await
        .expect("first sync");
    assert_eq!(report.collections_created, 2);
    assert_eq!(report.vertices.inserted, 2);
    assert_eq!(report.edges.inserted, 1);

    let second = GraphBuilder::new(&classifier)
        .resume(first.graph)
        .build(&statements("cell type"));
    let report = GraphStoreSync::new(&store)
        .update(update)
        .sync(&second.graph)
        .await
        .expect("second sync");

    assert_eq!(report.collections_created, 0);
    assert_eq!(report.vertices, expected_vertices);
    let stored = store
        .documents
        .lock()
        .expect("documents")
        .get(&("CL".to_string(), "0000001".to_string()))
        .cloned()
        .expect("stored vertex");
    assert_eq!(stored["label"], expected_label);
}

#[tokio::test]
async fn empty_graph_writes_nothing() {
    let classifier = TermClassifier::new().expect("classifier");
    let store = RecordingStore::default();
    let built = GraphBuilder::new(&classifier).build(&[]);

    let report = GraphStoreSync::new(&store)
        .sync(&built.graph)
        .await
        .expect("sync");

    assert_eq!(report, Default::default());
    assert!(store.calls.lock().expect("calls").is_empty());
}

#[tokio::test]
async fn loads_ontology_into_file_store() {
    let path = support::write_ontology("store");
    let root = support::scratch_dir("store-root");
    let store = OpendalGraphStore::fs(&root).expect("fs store");
    let source = FileTripleSource::new(&path).expect("turtle source");
    let loader = OntologyLoader::new(OntologySettings::default());

    let (outcome, report) = loader
        .load_into(&store, &source, Some(support::relation_labels()), false)
        .await
        .expect("load into store");

    assert_eq!(report.vertices.inserted, outcome.graph.vertex_count());
    assert_eq!(report.edges.inserted, outcome.graph.edge_count());
    assert_eq!(
        store.keys("CL").await.expect("keys"),
        vec!["0000000".to_string(), "0000001".to_string()]
    );
    let edge = store
        .get("CL-UBERON", "0000001-0002048")
        .await
        .expect("get")
        .expect("edge document");
    assert_eq!(edge["_from"], json!("CL/0000001"));
    assert_eq!(edge["label"], json!("develops_from"));
    assert!(root.join("CL").join("0000001.json").exists());

    let (_, rerun) = loader
        .load_into(&store, &source, Some(support::relation_labels()), false)
        .await
        .expect("rerun");
    assert_eq!(rerun.vertices.inserted, 0);
    assert_eq!(rerun.vertices.skipped, outcome.graph.vertex_count());
}
