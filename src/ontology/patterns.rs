//! Reconstruction of OWL statements that are spread over blank nodes.
//!
//! OWL serializes an existential restriction as
//!
//! ```text
//! C1     rdfs:subClassOf    _:b
//! _:b    owl:onProperty     R
//! _:b    owl:someValuesFrom C2
//! ```
//!
//! and a reified annotation as `owl:annotatedSource`, `owl:annotatedProperty`
//! and `owl:annotatedTarget` hanging off a blank node, optionally with
//! `hasDbXref`/`source` literals on the same node. The matcher groups triples
//! by their blank endpoint and turns complete clusters back into plain
//! `(subject, predicate, object)` triples.

use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Display, Formatter};

use super::term::{Term, TermClassifier};
use crate::rdf::{Quadruple, RdfTerm, Triple};

/// The five disjoint buckets of a blank node's triples.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bucket {
    Relation,
    Annotation,
    Literal,
    Class,
    Other,
}

impl Display for Bucket {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Relation => "relation",
            Self::Annotation => "annotation",
            Self::Literal => "literal",
            Self::Class => "class",
            Self::Other => "other",
        })
    }
}

/// Slot of the reconstructed triple filled by one clustered triple.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    Subject,
    Predicate,
    Object,
}

/// The two blank node idioms that can be reconstructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatternKind {
    Relation,
    Annotation,
}

impl PatternKind {
    const RELATION_SLOTS: [(&'static str, Slot); 3] = [
        ("subClassOf", Slot::Subject),
        ("onProperty", Slot::Predicate),
        ("someValuesFrom", Slot::Object),
    ];
    const ANNOTATION_SLOTS: [(&'static str, Slot); 3] = [
        ("annotatedSource", Slot::Subject),
        ("annotatedProperty", Slot::Predicate),
        ("annotatedTarget", Slot::Object),
    ];

    /// Fragment to slot lookup table for this idiom.
    #[must_use]
    pub const fn slots(self) -> &'static [(&'static str, Slot); 3] {
        match self {
            Self::Relation => &Self::RELATION_SLOTS,
            Self::Annotation => &Self::ANNOTATION_SLOTS,
        }
    }

    #[must_use]
    pub fn slot(self, fragment: &str) -> Option<Slot> {
        self.slots()
            .iter()
            .find(|(name, _)| *name == fragment)
            .map(|(_, slot)| *slot)
    }

    #[must_use]
    pub const fn bucket(self) -> Bucket {
        match self {
            Self::Relation => Bucket::Relation,
            Self::Annotation => Bucket::Annotation,
        }
    }
}

const LITERAL_FRAGMENTS: [&str; 2] = ["hasDbXref", "source"];

/// Triples sharing one blank node, split into buckets.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlankNodeTripleSet {
    node: String,
    buckets: BTreeMap<Bucket, Vec<Triple>>,
}

impl BlankNodeTripleSet {
    fn new(node: &str) -> Self {
        Self {
            node: node.to_owned(),
            buckets: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn node(&self) -> &str {
        &self.node
    }

    #[must_use]
    pub fn bucket(&self, bucket: Bucket) -> &[Triple] {
        self.buckets.get(&bucket).map_or(&[], Vec::as_slice)
    }

    /// Number of triples over every bucket.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Why a bucket could not be turned into a triple.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconstructionFailure {
    WrongCount(usize),
    UnknownSlot(String),
    DuplicateSlot(String),
    UnresolvedEndpoint(String),
}

impl Display for ReconstructionFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongCount(count) => write!(f, "expected 3 triples, found {count}"),
            Self::UnknownSlot(fragment) => write!(f, "`{fragment}` fills no slot"),
            Self::DuplicateSlot(fragment) => write!(f, "`{fragment}` appears more than once"),
            Self::UnresolvedEndpoint(triple) => {
                write!(f, "no single blank endpoint in `{triple}`")
            }
        }
    }
}

/// A grouped triple that was not reconstructed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IgnoredTriple {
    pub node: String,
    pub bucket: Bucket,
    pub triple: Triple,
}

/// Everything the matcher produced for one document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    /// Reconstructed triples in blank node discovery order.
    pub reconstructed: Vec<Triple>,
    /// Edge attributes lifted from reified annotations.
    pub edge_attributes: Vec<Quadruple>,
    /// Audit trail of grouped triples that were not interpreted.
    pub ignored: Vec<IgnoredTriple>,
}

impl MatchOutcome {
    #[must_use]
    pub fn ignored_counts(&self) -> BTreeMap<Bucket, usize> {
        let mut counts = BTreeMap::new();
        for ignored in &self.ignored {
            *counts.entry(ignored.bucket).or_insert(0) += 1;
        }
        counts
    }
}

/// Groups triples by blank node and reconstructs the relation and
/// annotation idioms.
pub struct BlankNodePatternMatcher<'a> {
    classifier: &'a TermClassifier,
    annotate_edges: bool,
}

impl<'a> BlankNodePatternMatcher<'a> {
    #[must_use]
    pub const fn new(classifier: &'a TermClassifier) -> Self {
        Self {
            classifier,
            annotate_edges: false,
        }
    }

    /// Also emit reified annotation literals as edge attributes.
    #[must_use]
    pub const fn annotate_edges(mut self, enabled: bool) -> Self {
        self.annotate_edges = enabled;
        self
    }

    /// Groups every triple with exactly one blank endpoint under that blank
    /// node, first by subject then by object.
    #[must_use]
    pub fn group(&self, triples: &[Triple]) -> Vec<BlankNodeTripleSet> {
        let mut sets: Vec<BlankNodeTripleSet> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        let subject_pass = triples.iter().filter_map(|t| match (&t.subject, &t.object) {
            (RdfTerm::BlankNode(node), object) if !object.is_blank() => Some((node, t)),
            _ => None,
        });
        let object_pass = triples.iter().filter_map(|t| match (&t.subject, &t.object) {
            (subject, RdfTerm::BlankNode(node)) if !subject.is_blank() => Some((node, t)),
            _ => None,
        });

        for (node, triple) in subject_pass.chain(object_pass) {
            let position = *index.entry(node.clone()).or_insert_with(|| {
                sets.push(BlankNodeTripleSet::new(node));
                sets.len() - 1
            });
            let bucket = self.bucket_for(triple);
            sets[position]
                .buckets
                .entry(bucket)
                .or_default()
                .push(triple.clone());
        }
        sets
    }

    fn bucket_for(&self, triple: &Triple) -> Bucket {
        if let Term::Predicate { fragment } = self.classifier.classify(&triple.predicate) {
            if PatternKind::Relation.slot(&fragment).is_some() {
                return Bucket::Relation;
            }
            if PatternKind::Annotation.slot(&fragment).is_some() {
                return Bucket::Annotation;
            }
            if LITERAL_FRAGMENTS.contains(&fragment.as_str()) {
                return Bucket::Literal;
            }
        }
        if self.classifier.classify(&triple.subject).is_class()
            || self.classifier.classify(&triple.object).is_class()
        {
            Bucket::Class
        } else {
            Bucket::Other
        }
    }

    /// Groups `triples` and reconstructs every complete cluster.
    #[must_use]
    pub fn reconstruct(&self, triples: &[Triple]) -> MatchOutcome {
        let mut outcome = MatchOutcome::default();
        for set in self.group(triples) {
            self.reconstruct_set(&set, &mut outcome);
        }
        tracing::info!(
            reconstructed = outcome.reconstructed.len(),
            edge_attributes = outcome.edge_attributes.len(),
            ignored = outcome.ignored.len(),
            "blank_node_patterns_matched"
        );
        outcome
    }

    fn reconstruct_set(&self, set: &BlankNodeTripleSet, outcome: &mut MatchOutcome) {
        let relation = set.bucket(Bucket::Relation);
        if !relation.is_empty() {
            match self.try_reconstruct(PatternKind::Relation, relation) {
                Ok(triple) => outcome.reconstructed.push(triple),
                Err(failure) => ignore(set, Bucket::Relation, &failure, outcome),
            }
        }

        let annotation = set.bucket(Bucket::Annotation);
        let literals = set.bucket(Bucket::Literal);
        if annotation.is_empty() {
            if !literals.is_empty() {
                ignore_bucket(set, Bucket::Literal, outcome);
            }
        } else {
            match self.try_reconstruct(PatternKind::Annotation, annotation) {
                Ok(triple) => {
                    outcome.reconstructed.push(triple.clone());
                    for literal in literals {
                        if self.annotate_edges {
                            outcome.edge_attributes.push(Quadruple {
                                from: triple.subject.clone(),
                                to: triple.object.clone(),
                                predicate: literal.predicate.clone(),
                                object: literal.object.clone(),
                            });
                        }
                        outcome.reconstructed.push(Triple::new(
                            triple.subject.clone(),
                            literal.predicate.clone(),
                            literal.object.clone(),
                        ));
                    }
                }
                Err(failure) => {
                    ignore(set, Bucket::Annotation, &failure, outcome);
                    ignore_bucket(set, Bucket::Literal, outcome);
                }
            }
        }

        ignore_bucket(set, Bucket::Class, outcome);
        ignore_bucket(set, Bucket::Other, outcome);
    }

    /// Fills the three slots of `kind` from a bucket.
    ///
    /// # Errors
    ///
    /// When the bucket does not hold exactly one triple per slot, or a
    /// slot's value cannot be told apart from the blank node.
    pub fn try_reconstruct(
        &self,
        kind: PatternKind,
        bucket: &[Triple],
    ) -> Result<Triple, ReconstructionFailure> {
        if bucket.len() != 3 {
            return Err(ReconstructionFailure::WrongCount(bucket.len()));
        }
        let mut subject = None;
        let mut predicate = None;
        let mut object = None;
        for triple in bucket {
            let fragment = match self.classifier.classify(&triple.predicate) {
                Term::Predicate { fragment } => fragment,
                other => return Err(ReconstructionFailure::UnknownSlot(other.to_string())),
            };
            let Some(slot) = kind.slot(&fragment) else {
                return Err(ReconstructionFailure::UnknownSlot(fragment));
            };
            let target = match slot {
                Slot::Subject => &mut subject,
                Slot::Predicate => &mut predicate,
                Slot::Object => &mut object,
            };
            if target.is_some() {
                return Err(ReconstructionFailure::DuplicateSlot(fragment));
            }
            *target = Some(non_blank_endpoint(triple)?);
        }
        match (subject, predicate, object) {
            (Some(subject), Some(predicate), Some(object)) => {
                Ok(Triple::new(subject, predicate, object))
            }
            // three distinct slots out of three triples are always filled
            _ => Err(ReconstructionFailure::WrongCount(bucket.len())),
        }
    }
}

fn non_blank_endpoint(triple: &Triple) -> Result<RdfTerm, ReconstructionFailure> {
    match (triple.subject.is_blank(), triple.object.is_blank()) {
        (true, false) => Ok(triple.object.clone()),
        (false, true) => Ok(triple.subject.clone()),
        _ => Err(ReconstructionFailure::UnresolvedEndpoint(triple.to_string())),
    }
}

fn ignore(
    set: &BlankNodeTripleSet,
    bucket: Bucket,
    failure: &ReconstructionFailure,
    outcome: &mut MatchOutcome,
) {
    tracing::debug!(
        node = %set.node(),
        bucket = %bucket,
        reason = %failure,
        "blank_node_pattern_incomplete"
    );
    ignore_bucket(set, bucket, outcome);
}

fn ignore_bucket(set: &BlankNodeTripleSet, bucket: Bucket, outcome: &mut MatchOutcome) {
    outcome
        .ignored
        .extend(set.bucket(bucket).iter().map(|triple| IgnoredTriple {
            node: set.node().to_owned(),
            bucket,
            triple: triple.clone(),
        }));
}
