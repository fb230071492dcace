#![allow(dead_code)]

use std::{
    collections::BTreeMap,
    fs,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

use owlgraph::{
    graph::PropertyGraph,
    rdf::{RdfTerm, RelationLabels, Triple, VecTripleSource},
};
use serde_json::Value;

pub const CELL_ONTOLOGY: &str = r#"@prefix obo: <http://purl.obolibrary.org/obo/> .
@prefix owl: <http://www.w3.org/2002/07/owl#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix oboInOwl: <http://www.geneontology.org/formats/oboInOwl#> .

obo:CL_0000000 a owl:Class ;
    rdfs:label "cell" .

obo:CL_0000001 a owl:Class ;
    rdfs:label "primary cell" ;
    oboInOwl:hasDbXref "FMA:1" , "FMA:2" ;
    rdfs:subClassOf obo:CL_0000000 ;
    rdfs:subClassOf [
        a owl:Restriction ;
        owl:onProperty obo:RO_0002202 ;
        owl:someValuesFrom obo:UBERON_0002048
    ] .

obo:UBERON_0002048 a owl:Class ;
    rdfs:label "lung" .

obo:ZZZ_0000001 a owl:Class .

[] a owl:Axiom ;
    owl:annotatedSource obo:CL_0000001 ;
    owl:annotatedProperty rdfs:subClassOf ;
    owl:annotatedTarget obo:CL_0000000 ;
    oboInOwl:source "PMID:123" .
"#;

/// Unique scratch directory below the system temp dir.
pub fn scratch_dir(name: &str) -> PathBuf {
    let identifier = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("owlgraph-{name}-{identifier}"));
    fs::create_dir_all(&dir).expect("scratch dir");
    dir
}

pub fn write_ontology(name: &str) -> PathBuf {
    let path = scratch_dir(name).join("cell.ttl");
    fs::write(&path, CELL_ONTOLOGY).expect("ontology file");
    path
}

pub fn relation_labels() -> RelationLabels {
    let triples = vec![Triple::new(
        RdfTerm::iri("http://purl.obolibrary.org/obo/RO_0002202").expect("iri"),
        RdfTerm::iri("http://www.w3.org/2000/01/rdf-schema#label").expect("iri"),
        RdfTerm::literal("develops_from"),
    )];
    let source = VecTripleSource::new("ro", triples);
    let classifier = owlgraph::ontology::TermClassifier::new().expect("classifier");
    RelationLabels::from_source(&source, &classifier).expect("labels")
}

/// One line per document, `{collection}/{key} {json with sorted keys}`.
pub fn render(graph: &PropertyGraph) -> String {
    let mut lines = Vec::new();
    for (name, vertices) in graph.vertex_collections() {
        for (key, vertex) in vertices {
            let document = vertex.to_document().expect("vertex document");
            lines.push(format!("{name}/{key} {}", sorted(&document)));
        }
    }
    for (name, edges) in graph.edge_collections() {
        for (key, edge) in edges {
            let document = edge.to_document().expect("edge document");
            lines.push(format!("{name}/{key} {}", sorted(&document)));
        }
    }
    lines.join("\n")
}

pub fn sorted(document: &Value) -> String {
    let Value::Object(map) = document else {
        return document.to_string();
    };
    let entries = map.iter().collect::<BTreeMap<_, _>>();
    let fields = entries
        .into_iter()
        .map(|(key, value)| format!("{}:{}", Value::String(key.clone()), value))
        .collect::<Vec<_>>();
    format!("{{{}}}", fields.join(","))
}
