//! Semantic interpretation of RDF terms and of OWL blank node idioms.

mod patterns;
mod term;

pub use patterns::{
    BlankNodePatternMatcher, BlankNodeTripleSet, Bucket, IgnoredTriple, MatchOutcome,
    PatternKind, ReconstructionFailure, Slot,
};
pub use term::{ClassTerm, Term, TermClassifier, BLANK_NODE_PREFIX};
