use std::collections::{BTreeMap, BTreeSet};

use super::{RdfTerm, Triple, TripleSource};
use crate::ontology::{Term, TermClassifier};

const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";

/// Canonical relation id (`RO_0002202`) to human readable label, read from a
/// relation ontology.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RelationLabels {
    labels: BTreeMap<String, String>,
    ids: BTreeSet<String>,
}

impl RelationLabels {
    #[must_use]
    pub fn from_map(labels: BTreeMap<String, String>) -> Self {
        let ids = labels
            .keys()
            .filter_map(|id| id.split('_').next())
            .map(str::to_owned)
            .collect();
        Self { labels, ids }
    }

    /// Collects `rdfs:label` values of every class subject. The first label
    /// seen for a class wins.
    #[must_use]
    pub fn from_triples(triples: &[Triple], classifier: &TermClassifier) -> Self {
        let mut labels = BTreeMap::new();
        let mut ids = BTreeSet::new();
        for triple in triples {
            let Term::Class(class) = classifier.classify(&triple.subject) else {
                continue;
            };
            if class.is_blank_node() {
                continue;
            }
            ids.insert(class.ontology_id.clone());
            let is_label = matches!(&triple.predicate, RdfTerm::Iri(iri) if iri.as_str() == RDFS_LABEL);
            if let (true, RdfTerm::Literal(literal)) = (is_label, &triple.object) {
                labels
                    .entry(class.canonical_id)
                    .or_insert_with(|| literal.value().to_owned());
            }
        }
        Self { labels, ids }
    }

    /// Parses the relation ontology behind `source`.
    ///
    /// # Errors
    ///
    /// When the source cannot be read.
    pub fn from_source(
        source: &dyn TripleSource,
        classifier: &TermClassifier,
    ) -> crate::Result<Self> {
        let labels = Self::from_triples(&source.triples()?, classifier);
        tracing::info!(
            source = %source.name(),
            labels = labels.len(),
            ids = labels.ids.len(),
            "relation_labels_loaded"
        );
        Ok(labels)
    }

    #[must_use]
    pub fn get(&self, canonical_id: &str) -> Option<&str> {
        self.labels.get(canonical_id).map(String::as_str)
    }

    /// Ontology prefixes of every class seen in the relation ontology.
    #[must_use]
    pub const fn ids(&self) -> &BTreeSet<String> {
        &self.ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
