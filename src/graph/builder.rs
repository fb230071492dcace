//! Two-pass construction of the property graph.
//!
//! The structural pass creates vertices and edges from class-to-class
//! triples. Only the [`StructuredGraph`] it returns can run the annotation
//! pass, which merges literal values into documents that now exist.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display, Formatter};

use serde::Serialize;
use serde_json::{json, Value};

use super::document::{edge_collection, edge_key, literal_value, Edge, Vertex};
use crate::ontology::{ClassTerm, Term, TermClassifier};
use crate::rdf::{Quadruple, Statement, Triple};

/// Ontology prefixes that become vertex collections unless configured
/// otherwise.
pub const DEFAULT_ALLOWED_PREFIXES: &[&str] = &[
    "CHEBI",
    "CL",
    "CLM",
    "GO",
    "MONDO",
    "NCBITaxon",
    "PATO",
    "PR",
    "UBERON",
];

type Collections<T> = BTreeMap<String, BTreeMap<String, T>>;

/// In-memory vertex and edge collections.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyGraph {
    vertices: Collections<Vertex>,
    edges: Collections<Edge>,
}

impl PropertyGraph {
    #[must_use]
    pub fn vertex(&self, collection: &str, key: &str) -> Option<&Vertex> {
        self.vertices.get(collection)?.get(key)
    }

    #[must_use]
    pub fn edge(&self, collection: &str, key: &str) -> Option<&Edge> {
        self.edges.get(collection)?.get(key)
    }

    pub fn vertex_collections(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, Vertex>)> {
        self.vertices
            .iter()
            .map(|(name, documents)| (name.as_str(), documents))
    }

    pub fn edge_collections(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, Edge>)> {
        self.edges
            .iter()
            .map(|(name, documents)| (name.as_str(), documents))
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.values().map(BTreeMap::len).sum()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.edges.is_empty()
    }

    /// Every document grouped by collection, as written to a store.
    ///
    /// # Errors
    ///
    /// When a document cannot be represented as JSON.
    pub fn to_json(&self) -> serde_json::Result<Value> {
        let mut vertices = serde_json::Map::new();
        for (name, documents) in &self.vertices {
            let documents = documents
                .values()
                .map(Vertex::to_document)
                .collect::<serde_json::Result<Vec<_>>>()?;
            vertices.insert(name.clone(), Value::Array(documents));
        }
        let mut edges = serde_json::Map::new();
        for (name, documents) in &self.edges {
            let documents = documents
                .values()
                .map(Edge::to_document)
                .collect::<serde_json::Result<Vec<_>>>()?;
            edges.insert(name.clone(), Value::Array(documents));
        }
        Ok(json!({ "vertices": vertices, "edges": edges }))
    }
}

/// Why a statement did not change the graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    SubjectNotClass,
    PredicateNotRelation,
    ObjectNotClass,
    ObjectNotLiteral,
    UnresolvedEndpoint,
    PredicateUnnamed,
    DanglingEdgeAttribute,
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SubjectNotClass => "subject is not a class",
            Self::PredicateNotRelation => "predicate is not a named relation",
            Self::ObjectNotClass => "object is neither a class nor a literal",
            Self::ObjectNotLiteral => "attribute value is not a literal",
            Self::UnresolvedEndpoint => "endpoint vertex could not be resolved",
            Self::PredicateUnnamed => "predicate has no fragment",
            Self::DanglingEdgeAttribute => "edge does not exist",
        })
    }
}

/// Summary of one build, replacing any process-wide skip bookkeeping.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    /// Ontology prefixes outside the allow-list with the number of
    /// references to them.
    pub skipped_prefixes: BTreeMap<String, usize>,
    pub skipped: BTreeMap<SkipReason, usize>,
    pub vertices_created: usize,
    pub edges_created: usize,
    pub vertex_attributes_merged: usize,
    pub edge_attributes_merged: usize,
}

impl BuildReport {
    #[must_use]
    pub fn skipped(&self, reason: SkipReason) -> usize {
        self.skipped.get(&reason).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn total_skipped(&self) -> usize {
        self.skipped.values().sum()
    }
}

/// Result of both passes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BuiltGraph {
    pub graph: PropertyGraph,
    pub report: BuildReport,
}

/// Turns statements into a [`PropertyGraph`].
pub struct GraphBuilder<'a> {
    classifier: &'a TermClassifier,
    allowed_prefixes: BTreeSet<String>,
    graph: PropertyGraph,
    report: BuildReport,
}

impl<'a> GraphBuilder<'a> {
    /// Creates a builder gating vertices on [`DEFAULT_ALLOWED_PREFIXES`].
    #[must_use]
    pub fn new(classifier: &'a TermClassifier) -> Self {
        Self::with_allowed_prefixes(classifier, DEFAULT_ALLOWED_PREFIXES.iter().copied())
    }

    #[must_use]
    pub fn with_allowed_prefixes<I, S>(classifier: &'a TermClassifier, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            classifier,
            allowed_prefixes: prefixes.into_iter().map(Into::into).collect(),
            graph: PropertyGraph::default(),
            report: BuildReport::default(),
        }
    }

    /// Continues from a graph produced by an earlier build.
    #[must_use]
    pub fn resume(mut self, graph: PropertyGraph) -> Self {
        self.graph = graph;
        self
    }

    /// Runs both passes over the same statements.
    #[must_use]
    pub fn build(self, statements: &[Statement]) -> BuiltGraph {
        self.structural_pass(statements).annotation_pass(statements)
    }

    /// Creates vertices and edges from every class-to-class triple.
    #[must_use]
    pub fn structural_pass(mut self, statements: &[Statement]) -> StructuredGraph<'a> {
        for statement in statements {
            if let Statement::Triple(triple) = statement {
                self.add_structure(triple);
            }
        }
        tracing::info!(
            vertices = self.graph.vertex_count(),
            edges = self.graph.edge_count(),
            skipped = self.report.total_skipped(),
            skipped_prefixes = ?self.report.skipped_prefixes.keys().collect::<Vec<_>>(),
            "structural_pass_completed"
        );
        StructuredGraph { builder: self }
    }

    fn add_structure(&mut self, triple: &Triple) {
        let object = self.classifier.classify(&triple.object);
        if object.is_literal() {
            return;
        }
        let subject = self.classifier.classify(&triple.subject);

        let from = subject
            .as_class()
            .and_then(|class| self.resolve_vertex(class));
        let to = object.as_class().and_then(|class| self.resolve_vertex(class));

        if !subject.is_class() {
            self.skip(triple, SkipReason::SubjectNotClass);
            return;
        }
        let predicate = self.classifier.classify(&triple.predicate);
        let Some(label) = predicate.predicate_fragment() else {
            self.skip(triple, SkipReason::PredicateNotRelation);
            return;
        };
        if !object.is_class() {
            self.skip(triple, SkipReason::ObjectNotClass);
            return;
        }
        let (Some((from_collection, from_key)), Some((to_collection, to_key))) = (from, to) else {
            self.skip(triple, SkipReason::UnresolvedEndpoint);
            return;
        };
        self.resolve_edge(&from_collection, &from_key, &to_collection, &to_key, label);
    }

    /// Returns the (collection, key) of the vertex for `class`, creating it
    /// on first use. Prefixes outside the allow-list yield nothing.
    fn resolve_vertex(&mut self, class: &ClassTerm) -> Option<(String, String)> {
        if !self.is_allowed(class) {
            return None;
        }
        let collection = self
            .graph
            .vertices
            .entry(class.ontology_id.clone())
            .or_default();
        if !collection.contains_key(&class.local_number) {
            collection.insert(
                class.local_number.clone(),
                Vertex::new(&class.ontology_id, &class.local_number, &class.canonical_id),
            );
            self.report.vertices_created += 1;
        }
        Some((class.ontology_id.clone(), class.local_number.clone()))
    }

    fn is_allowed(&mut self, class: &ClassTerm) -> bool {
        if self.allowed_prefixes.contains(&class.ontology_id) {
            return true;
        }
        let count = self
            .report
            .skipped_prefixes
            .entry(class.ontology_id.clone())
            .or_insert(0);
        if *count == 0 {
            tracing::warn!(prefix = %class.ontology_id, "ontology_prefix_skipped");
        }
        *count += 1;
        false
    }

    fn resolve_edge(
        &mut self,
        from_collection: &str,
        from_key: &str,
        to_collection: &str,
        to_key: &str,
        label: &str,
    ) {
        let collection = edge_collection(from_collection, to_collection);
        let key = edge_key(from_key, to_key);
        if self.graph.edge(&collection, &key).is_some() {
            return;
        }
        let (Some(from), Some(to)) = (
            self.graph.vertex(from_collection, from_key),
            self.graph.vertex(to_collection, to_key),
        ) else {
            return;
        };
        let edge = Edge::new(from, to, label);
        self.graph
            .edges
            .entry(collection)
            .or_default()
            .insert(key, edge);
        self.report.edges_created += 1;
    }

    fn add_vertex_attribute(&mut self, triple: &Triple) {
        let Term::Literal(literal) = self.classifier.classify(&triple.object) else {
            return;
        };
        let subject = self.classifier.classify(&triple.subject);
        let Some(class) = subject.as_class() else {
            self.skip(triple, SkipReason::SubjectNotClass);
            return;
        };
        let Some((collection, key)) = self.resolve_vertex(class) else {
            return;
        };
        let predicate = self.classifier.classify(&triple.predicate);
        let Some(name) = predicate.predicate_fragment() else {
            self.skip(triple, SkipReason::PredicateUnnamed);
            return;
        };
        let merged = self
            .graph
            .vertices
            .get_mut(&collection)
            .and_then(|documents| documents.get_mut(&key))
            .is_some_and(|vertex| vertex.merge(name, literal_value(&literal)));
        if merged {
            self.report.vertex_attributes_merged += 1;
        }
    }

    fn add_edge_attribute(&mut self, quadruple: &Quadruple) {
        let from = self.classifier.classify(&quadruple.from);
        let to = self.classifier.classify(&quadruple.to);
        let (Some(from), Some(to)) = (from.as_class(), to.as_class()) else {
            self.skip(quadruple, SkipReason::UnresolvedEndpoint);
            return;
        };
        let from_vertex = self.resolve_vertex(from);
        let to_vertex = self.resolve_vertex(to);
        let (Some((from_collection, from_key)), Some((to_collection, to_key))) =
            (from_vertex, to_vertex)
        else {
            return;
        };
        let predicate = self.classifier.classify(&quadruple.predicate);
        let Some(name) = predicate.predicate_fragment() else {
            self.skip(quadruple, SkipReason::PredicateUnnamed);
            return;
        };
        let Term::Literal(literal) = self.classifier.classify(&quadruple.object) else {
            self.skip(quadruple, SkipReason::ObjectNotLiteral);
            return;
        };
        let collection = edge_collection(&from_collection, &to_collection);
        let key = edge_key(&from_key, &to_key);
        let Some(edge) = self
            .graph
            .edges
            .get_mut(&collection)
            .and_then(|documents| documents.get_mut(&key))
        else {
            self.skip(quadruple, SkipReason::DanglingEdgeAttribute);
            return;
        };
        if edge.merge(name, literal_value(&literal)) {
            self.report.edge_attributes_merged += 1;
        }
    }

    fn skip(&mut self, statement: &dyn Display, reason: SkipReason) {
        tracing::debug!(statement = %statement, reason = %reason, "statement_skipped");
        *self.report.skipped.entry(reason).or_insert(0) += 1;
    }
}

/// Graph after the structural pass. Edges and vertices exist; attributes
/// have not been merged yet.
pub struct StructuredGraph<'a> {
    builder: GraphBuilder<'a>,
}

impl StructuredGraph<'_> {
    #[must_use]
    pub const fn graph(&self) -> &PropertyGraph {
        &self.builder.graph
    }

    #[must_use]
    pub const fn report(&self) -> &BuildReport {
        &self.builder.report
    }

    /// Merges literal triples into vertices and quadruples into edges.
    #[must_use]
    pub fn annotation_pass(mut self, statements: &[Statement]) -> BuiltGraph {
        for statement in statements {
            match statement {
                Statement::Triple(triple) => self.builder.add_vertex_attribute(triple),
                Statement::Quadruple(quadruple) => self.builder.add_edge_attribute(quadruple),
            }
        }
        let GraphBuilder { graph, report, .. } = self.builder;
        tracing::info!(
            vertex_attributes = report.vertex_attributes_merged,
            edge_attributes = report.edge_attributes_merged,
            skipped = report.total_skipped(),
            "annotation_pass_completed"
        );
        BuiltGraph { graph, report }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::*;
    use crate::graph::AttributeValue;
    use crate::rdf::{RdfTerm, RelationLabels};

    const OBO: &str = "http://purl.obolibrary.org/obo/";
    const HAS_DB_XREF: &str = "http://www.geneontology.org/formats/oboInOwl#hasDbXref";
    const SUB_CLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";

    fn iri(text: &str) -> RdfTerm {
        RdfTerm::iri(text).expect("valid iri")
    }

    fn obo(id: &str) -> RdfTerm {
        iri(&format!("{OBO}{id}"))
    }

    fn triple(subject: RdfTerm, predicate: RdfTerm, object: RdfTerm) -> Statement {
        Statement::Triple(Triple::new(subject, predicate, object))
    }

    fn classifier() -> TermClassifier {
        TermClassifier::new().expect("classifier")
    }

    fn labelled_classifier() -> TermClassifier {
        classifier().with_labels(RelationLabels::from_map(BTreeMap::from([(
            "RO_0002202".to_string(),
            "develops_from".to_string(),
        )])))
    }

    #[test]
    fn creates_vertices_and_edges_for_class_triples() {
        let classifier = classifier();
        let statements = vec![triple(obo("CL_0000001"), iri(SUB_CLASS_OF), obo("CL_0000000"))];

        let built = GraphBuilder::new(&classifier).build(&statements);

        assert_eq!(built.graph.vertex_count(), 2);
        let edge = built
            .graph
            .edge("CL-CL", "0000001-0000000")
            .expect("subClassOf edge");
        assert_eq!(edge.label(), Some("subClassOf"));
        assert_eq!(edge.from_id(), "CL/0000001");
        assert_eq!(edge.to_id(), "CL/0000000");
        assert_eq!(built.report.vertices_created, 2);
        assert_eq!(built.report.edges_created, 1);
    }

    #[test]
    fn labelled_relations_become_edges() {
        let classifier = labelled_classifier();
        let statements = vec![triple(obo("CL_0000001"), obo("RO_0002202"), obo("UBERON_0002048"))];

        let built = GraphBuilder::new(&classifier).build(&statements);

        let edge = built
            .graph
            .edge("CL-UBERON", "0000001-0002048")
            .expect("relation edge");
        assert_eq!(edge.label(), Some("develops_from"));
    }

    #[test]
    fn relations_without_label_are_rejected() {
        let classifier = classifier();
        let statements = vec![triple(obo("CL_0000001"), obo("RO_0002202"), obo("UBERON_0002048"))];

        let built = GraphBuilder::new(&classifier).build(&statements);

        assert_eq!(built.graph.edge_count(), 0);
        assert_eq!(built.graph.vertex_count(), 2);
        assert_eq!(built.report.skipped(SkipReason::PredicateNotRelation), 1);
    }

    #[test]
    fn literal_objects_never_create_edges() {
        let classifier = classifier();
        let statements = vec![triple(
            obo("CL_0000001"),
            iri("http://www.w3.org/2000/01/rdf-schema#label"),
            RdfTerm::literal("primary cell"),
        )];

        let structured = GraphBuilder::new(&classifier).structural_pass(&statements);
        assert!(structured.graph().is_empty());

        let built = structured.annotation_pass(&statements);
        let vertex = built.graph.vertex("CL", "0000001").expect("vertex");
        assert_eq!(
            vertex.attributes().get("label"),
            Some(&AttributeValue::One(json!("primary cell")))
        );
        assert_eq!(built.graph.edge_count(), 0);
    }

    #[test]
    fn attribute_values_merge_in_order() {
        let classifier = classifier();
        let xref = |value: &str| triple(obo("CL_0000001"), iri(HAS_DB_XREF), RdfTerm::literal(value));

        let built = GraphBuilder::new(&classifier).build(&[xref("X:1"), xref("X:1")]);
        let attribute = |built: &BuiltGraph| {
            built
                .graph
                .vertex("CL", "0000001")
                .and_then(|vertex| vertex.attributes().get("hasDbXref"))
                .cloned()
        };
        assert_eq!(attribute(&built), Some(AttributeValue::One(json!("X:1"))));

        let built = GraphBuilder::new(&classifier)
            .resume(built.graph)
            .build(&[xref("X:2")]);
        assert_eq!(
            attribute(&built),
            Some(AttributeValue::Many(vec![json!("X:1"), json!("X:2")]))
        );

        let built = GraphBuilder::new(&classifier)
            .resume(built.graph)
            .build(&[xref("X:3")]);
        assert_eq!(
            attribute(&built),
            Some(AttributeValue::Many(vec![
                json!("X:1"),
                json!("X:2"),
                json!("X:3")
            ]))
        );
    }

    #[test]
    fn unknown_prefixes_are_reported_once() {
        let classifier = classifier();
        let statements = vec![
            triple(obo("ZZZ_0000001"), iri(SUB_CLASS_OF), obo("CL_0000000")),
            triple(obo("CL_0000001"), iri(SUB_CLASS_OF), obo("ZZZ_0000002")),
            triple(obo("ZZZ_0000003"), iri(HAS_DB_XREF), RdfTerm::literal("X:1")),
        ];

        let built = GraphBuilder::new(&classifier).build(&statements);

        assert!(built
            .graph
            .vertex_collections()
            .all(|(name, _)| name != "ZZZ"));
        assert_eq!(
            built.report.skipped_prefixes,
            BTreeMap::from([("ZZZ".to_string(), 3)])
        );
        assert_eq!(built.graph.edge_count(), 0);
        assert_eq!(built.report.skipped(SkipReason::UnresolvedEndpoint), 2);
    }

    #[test]
    fn unnamed_predicates_still_resolve_the_subject() {
        let classifier = classifier();
        let definition = |subject: &str| {
            triple(obo(subject), obo("IAO_0000115"), RdfTerm::literal("def"))
        };

        let built = GraphBuilder::new(&classifier)
            .build(&[definition("CL_0000009"), definition("ZZZ_0000009")]);

        let vertex = built.graph.vertex("CL", "0000009").expect("vertex");
        assert!(vertex.attributes().is_empty());
        assert_eq!(
            built.report.skipped_prefixes,
            BTreeMap::from([("ZZZ".to_string(), 1)])
        );
        assert_eq!(built.report.skipped(SkipReason::PredicateUnnamed), 1);
    }

    #[test]
    fn edge_attributes_need_an_existing_edge() {
        let classifier = classifier();
        let attribute = Statement::Quadruple(Quadruple {
            from: obo("CL_0000001"),
            to: obo("CL_0000000"),
            predicate: iri(HAS_DB_XREF),
            object: RdfTerm::literal("PMID:1"),
        });

        let built = GraphBuilder::new(&classifier).build(&[attribute.clone()]);
        assert_eq!(built.graph.edge_count(), 0);
        assert!(built.graph.vertex("CL", "0000001").is_some());
        assert!(built.graph.vertex("CL", "0000000").is_some());
        assert_eq!(built.report.vertices_created, 2);
        assert_eq!(built.report.skipped(SkipReason::DanglingEdgeAttribute), 1);
        assert_eq!(built.report.edge_attributes_merged, 0);

        let statements = vec![
            triple(obo("CL_0000001"), iri(SUB_CLASS_OF), obo("CL_0000000")),
            attribute,
        ];
        let built = GraphBuilder::new(&classifier).build(&statements);
        let edge = built
            .graph
            .edge("CL-CL", "0000001-0000000")
            .expect("edge");
        assert_eq!(
            edge.attributes().get("hasDbXref"),
            Some(&AttributeValue::One(json!("PMID:1")))
        );
    }

    #[test]
    fn rebuilding_the_same_statements_changes_nothing() {
        let classifier = labelled_classifier();
        let statements = vec![
            triple(obo("CL_0000001"), iri(SUB_CLASS_OF), obo("CL_0000000")),
            triple(obo("CL_0000001"), obo("RO_0002202"), obo("UBERON_0002048")),
            triple(obo("CL_0000001"), iri(HAS_DB_XREF), RdfTerm::literal("X:1")),
            triple(obo("CL_0000001"), iri(HAS_DB_XREF), RdfTerm::literal("X:2")),
            Statement::Quadruple(Quadruple {
                from: obo("CL_0000001"),
                to: obo("CL_0000000"),
                predicate: iri(HAS_DB_XREF),
                object: RdfTerm::literal("PMID:1"),
            }),
        ];

        let first = GraphBuilder::new(&classifier).build(&statements);
        let snapshot = first.graph.to_json().expect("graph json");

        let second = GraphBuilder::new(&classifier)
            .resume(first.graph)
            .build(&statements);

        assert_eq!(second.graph.to_json().expect("graph json"), snapshot);
        assert_eq!(second.report.vertices_created, 0);
        assert_eq!(second.report.edges_created, 0);
        assert_eq!(second.report.vertex_attributes_merged, 0);
        assert_eq!(second.report.edge_attributes_merged, 0);
    }
}
