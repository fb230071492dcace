//! RDF terms and statements as produced by a [`TripleSource`].
//!
//! The model is intentionally flat: the engine only needs to tell IRIs,
//! blank nodes and literals apart and to read paths, fragments, datatypes
//! and blank node identities from them.

mod labels;
mod source;
mod value_objects;

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

pub use labels::RelationLabels;
pub use source::{FileTripleSource, RdfFormat, TripleSource, VecTripleSource};
pub use value_objects::{Iri, IriError};

/// Well-known datatype IRIs.
pub mod xsd {
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
    pub const DATE: &str = "http://www.w3.org/2001/XMLSchema#date";
    pub const DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
    pub const DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
    pub const DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
    pub const FLOAT: &str = "http://www.w3.org/2001/XMLSchema#float";
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
    pub const LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";

    /// Integer-family datatypes rendered as JSON numbers.
    pub const INTEGERS: &[&str] = &[
        INTEGER,
        "http://www.w3.org/2001/XMLSchema#int",
        "http://www.w3.org/2001/XMLSchema#long",
        "http://www.w3.org/2001/XMLSchema#short",
        "http://www.w3.org/2001/XMLSchema#byte",
        "http://www.w3.org/2001/XMLSchema#nonNegativeInteger",
        "http://www.w3.org/2001/XMLSchema#positiveInteger",
        "http://www.w3.org/2001/XMLSchema#negativeInteger",
        "http://www.w3.org/2001/XMLSchema#nonPositiveInteger",
        "http://www.w3.org/2001/XMLSchema#unsignedInt",
        "http://www.w3.org/2001/XMLSchema#unsignedLong",
        "http://www.w3.org/2001/XMLSchema#unsignedShort",
        "http://www.w3.org/2001/XMLSchema#unsignedByte",
    ];
}

/// A literal value with its optional datatype and language tag.
///
/// Plain strings carry no datatype.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal {
    value: String,
    datatype: Option<String>,
    language: Option<String>,
}

impl Literal {
    #[must_use]
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: None,
            language: None,
        }
    }

    #[must_use]
    pub fn typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        let datatype = datatype.into();
        Self {
            value: value.into(),
            datatype: (datatype != xsd::STRING).then_some(datatype),
            language: None,
        }
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub fn datatype(&self) -> Option<&str> {
        self.datatype.as_deref()
    }

    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }
}

impl From<oxrdf::Literal> for Literal {
    fn from(literal: oxrdf::Literal) -> Self {
        let language = literal.language().map(str::to_owned);
        let datatype = literal.datatype().as_str();
        let datatype = if language.is_some() || datatype == xsd::STRING || datatype == xsd::LANG_STRING
        {
            None
        } else {
            Some(datatype.to_owned())
        };
        Self {
            value: literal.value().to_owned(),
            datatype,
            language,
        }
    }
}

/// An RDF term: IRI, blank node or literal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RdfTerm {
    Iri(Iri),
    /// Blank node with its document-local identity.
    BlankNode(String),
    Literal(Literal),
}

impl RdfTerm {
    /// Parses `value` as an IRI term.
    pub fn iri(value: impl Into<String>) -> Result<Self, IriError> {
        Iri::new(value).map(Self::Iri)
    }

    #[must_use]
    pub fn blank(id: impl Into<String>) -> Self {
        Self::BlankNode(id.into())
    }

    #[must_use]
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(Literal::plain(value))
    }

    #[must_use]
    pub const fn is_blank(&self) -> bool {
        matches!(self, Self::BlankNode(_))
    }

    #[must_use]
    pub const fn kind(&self) -> TermKind {
        match self {
            Self::Iri(_) => TermKind::Iri,
            Self::BlankNode(_) => TermKind::Blank,
            Self::Literal(_) => TermKind::Literal,
        }
    }
}

impl Display for RdfTerm {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iri(iri) => write!(f, "<{iri}>"),
            Self::BlankNode(id) => write!(f, "_:{id}"),
            Self::Literal(literal) => {
                write!(f, "{:?}", literal.value)?;
                if let Some(language) = &literal.language {
                    write!(f, "@{language}")
                } else if let Some(datatype) = &literal.datatype {
                    write!(f, "^^<{datatype}>")
                } else {
                    Ok(())
                }
            }
        }
    }
}

impl From<Iri> for RdfTerm {
    fn from(iri: Iri) -> Self {
        Self::Iri(iri)
    }
}

impl From<oxrdf::NamedNode> for RdfTerm {
    fn from(node: oxrdf::NamedNode) -> Self {
        Self::Iri(node.into())
    }
}

impl From<oxrdf::BlankNode> for RdfTerm {
    fn from(node: oxrdf::BlankNode) -> Self {
        Self::BlankNode(node.into_string())
    }
}

impl From<oxrdf::Literal> for RdfTerm {
    fn from(literal: oxrdf::Literal) -> Self {
        Self::Literal(literal.into())
    }
}

impl From<oxrdf::NamedOrBlankNode> for RdfTerm {
    fn from(node: oxrdf::NamedOrBlankNode) -> Self {
        match node {
            oxrdf::NamedOrBlankNode::NamedNode(node) => node.into(),
            oxrdf::NamedOrBlankNode::BlankNode(node) => node.into(),
        }
    }
}

impl TryFrom<oxrdf::Term> for RdfTerm {
    type Error = crate::Error;

    fn try_from(term: oxrdf::Term) -> crate::Result<Self> {
        match term {
            oxrdf::Term::NamedNode(node) => Ok(node.into()),
            oxrdf::Term::BlankNode(node) => Ok(node.into()),
            oxrdf::Term::Literal(literal) => Ok(literal.into()),
            #[allow(unreachable_patterns)]
            other => Err(crate::Error::Message(format!(
                "unsupported RDF term: {other}"
            ))),
        }
    }
}

/// Coarse kind of an [`RdfTerm`], used for counting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TermKind {
    Iri,
    Blank,
    Literal,
}

impl Display for TermKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Iri => "iri",
            Self::Blank => "blank",
            Self::Literal => "literal",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Triple {
    pub subject: RdfTerm,
    pub predicate: RdfTerm,
    pub object: RdfTerm,
}

impl Triple {
    #[must_use]
    pub const fn new(subject: RdfTerm, predicate: RdfTerm, object: RdfTerm) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    /// Neither endpoint is a blank node.
    #[must_use]
    pub const fn is_filled(&self) -> bool {
        !self.subject.is_blank() && !self.object.is_blank()
    }
}

impl Display for Triple {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)
    }
}

/// Edge-attribute assertion: `predicate` with `object` on the edge `from -> to`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Quadruple {
    pub from: RdfTerm,
    pub to: RdfTerm,
    pub predicate: RdfTerm,
    pub object: RdfTerm,
}

impl Display for Quadruple {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.from, self.to, self.predicate, self.object
        )
    }
}

/// Element of the combined statement list fed to the graph builder.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Statement {
    Triple(Triple),
    Quadruple(Quadruple),
}

impl From<Triple> for Statement {
    fn from(triple: Triple) -> Self {
        Self::Triple(triple)
    }
}

impl From<Quadruple> for Statement {
    fn from(quadruple: Quadruple) -> Self {
        Self::Quadruple(quadruple)
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Triple(triple) => triple.fmt(f),
            Self::Quadruple(quadruple) => quadruple.fmt(f),
        }
    }
}

/// Triples in stream order where neither endpoint is a blank node.
#[must_use]
pub fn filled_triples(triples: &[Triple]) -> Vec<Triple> {
    triples.iter().filter(|t| t.is_filled()).cloned().collect()
}

/// Number of triples per (subject, predicate, object) term-kind shape.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TripleTypeCounts {
    counts: BTreeMap<(TermKind, TermKind, TermKind), usize>,
}

impl TripleTypeCounts {
    #[must_use]
    pub fn from_triples(triples: &[Triple]) -> Self {
        let mut counts = BTreeMap::new();
        for triple in triples {
            *counts
                .entry((
                    triple.subject.kind(),
                    triple.predicate.kind(),
                    triple.object.kind(),
                ))
                .or_insert(0) += 1;
        }
        Self { counts }
    }

    #[must_use]
    pub fn get(&self, subject: TermKind, predicate: TermKind, object: TermKind) -> usize {
        self.counts
            .get(&(subject, predicate, object))
            .copied()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

impl Display for TripleTypeCounts {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for ((s, p, o), count) in &self.counts {
            writeln!(f, "({s}, {p}, {o}): {count}")?;
        }
        Ok(())
    }
}
