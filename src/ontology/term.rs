use std::fmt::{self, Display, Formatter};
use std::path::Path;

use regex::Regex;

use crate::rdf::{Literal, RdfTerm, RelationLabels};

/// Class IRIs look like `.../obo/{PREFIX}_{NUMBER}`.
const CLASS_PATH_PATTERN: &str = r"^/obo/([A-Za-z]*)_([A-Za-z0-9\-+]*)";

/// Relation ontology prefix that cannot be resolved against any lookup
/// service.
const UNRESOLVABLE_PREFIX: &str = "GOREL";

/// Ontology id given to classes synthesized from blank nodes.
pub const BLANK_NODE_PREFIX: &str = "BNode";

/// An ontology class identified by `{ontology_id}_{local_number}`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClassTerm {
    pub ontology_id: String,
    pub local_number: String,
    pub canonical_id: String,
    /// Human readable relation label, when the class is a known relation.
    pub label: Option<String>,
}

impl ClassTerm {
    #[must_use]
    pub fn new(ontology_id: impl Into<String>, local_number: impl Into<String>) -> Self {
        let ontology_id = ontology_id.into();
        let local_number = local_number.into();
        Self {
            canonical_id: format!("{ontology_id}_{local_number}"),
            ontology_id,
            local_number,
            label: None,
        }
    }

    #[must_use]
    pub fn is_blank_node(&self) -> bool {
        self.ontology_id == BLANK_NODE_PREFIX
    }
}

/// Semantic kind of an RDF term.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Term {
    Class(ClassTerm),
    Predicate { fragment: String },
    Literal(Literal),
    Invalid,
}

impl Term {
    #[must_use]
    pub const fn as_class(&self) -> Option<&ClassTerm> {
        match self {
            Self::Class(class) => Some(class),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_class(&self) -> bool {
        matches!(self, Self::Class(_))
    }

    #[must_use]
    pub const fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    /// Fragment naming this term when it is used as a predicate.
    ///
    /// Predicates expose their fragment; classes only qualify when they carry
    /// a relation label.
    #[must_use]
    pub fn predicate_fragment(&self) -> Option<&str> {
        match self {
            Self::Predicate { fragment } => Some(fragment.as_str()),
            Self::Class(ClassTerm {
                label: Some(label), ..
            }) if !label.is_empty() => Some(label.as_str()),
            _ => None,
        }
    }
}

impl Display for Term {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class(class) => f.write_str(&class.canonical_id),
            Self::Predicate { fragment } => write!(f, "#{fragment}"),
            Self::Literal(literal) => write!(f, "{:?}", literal.value()),
            Self::Invalid => f.write_str("<invalid>"),
        }
    }
}

/// Classifies RDF terms into [`Term`] kinds.
#[derive(Clone, Debug)]
pub struct TermClassifier {
    class_path: Regex,
    labels: Option<RelationLabels>,
}

impl TermClassifier {
    /// # Errors
    ///
    /// When the class path pattern fails to compile.
    pub fn new() -> crate::Result<Self> {
        Ok(Self {
            class_path: Regex::new(CLASS_PATH_PATTERN)?,
            labels: None,
        })
    }

    /// Attaches relation labels to classes found in `labels`.
    #[must_use]
    pub fn with_labels(mut self, labels: RelationLabels) -> Self {
        self.labels = Some(labels);
        self
    }

    /// Classifies a single term. Never fails: anything unrecognized becomes
    /// a literal or [`Term::Invalid`].
    #[must_use]
    pub fn classify(&self, term: &RdfTerm) -> Term {
        match term {
            RdfTerm::Iri(iri) => {
                let path = iri.path();
                if let Some(captures) = self.class_path.captures(&path) {
                    let ontology_id = captures.get(1).map_or("", |m| m.as_str());
                    let local_number = captures.get(2).map_or("", |m| m.as_str());
                    if ontology_id == UNRESOLVABLE_PREFIX
                        || ontology_id.is_empty()
                        || local_number.is_empty()
                    {
                        return Term::Invalid;
                    }
                    let mut class = ClassTerm::new(ontology_id, local_number);
                    class.label = self
                        .labels
                        .as_ref()
                        .and_then(|labels| labels.get(&class.canonical_id))
                        .map(str::to_owned);
                    return Term::Class(class);
                }
                if let Some(fragment) = iri.fragment() {
                    return Term::Predicate {
                        fragment: fragment.to_owned(),
                    };
                }
                Term::Literal(Literal::plain(path_stem(&path).unwrap_or(iri.as_str())))
            }
            RdfTerm::BlankNode(id) => Term::Class(ClassTerm::new(BLANK_NODE_PREFIX, id.as_str())),
            RdfTerm::Literal(literal) => Term::Literal(literal.clone()),
        }
    }
}

fn path_stem(path: &str) -> Option<&str> {
    Path::new(path)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
}
