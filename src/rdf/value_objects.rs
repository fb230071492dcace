use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use oxrdf::NamedNode;
use thiserror::Error;

/// Value object ensuring that supplied text represents a valid IRI.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Iri {
    value: String,
}

impl Iri {
    /// Validates and constructs a new [`Iri`] value object.
    pub fn new(value: impl Into<String>) -> Result<Self, IriError> {
        let value = value.into();
        NamedNode::new(value.as_str()).map_err(|_| IriError::Invalid {
            value: value.clone(),
        })?;
        Ok(Self { value })
    }

    /// Returns the underlying textual representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Returns the path component, or the whole text when the IRI cannot be
    /// split into components.
    #[must_use]
    pub fn path(&self) -> String {
        oxiri::Iri::parse(self.value.as_str())
            .map_or_else(|_| self.value.clone(), |iri| iri.path().to_owned())
    }

    /// Returns the fragment component, if any.
    #[must_use]
    pub fn fragment(&self) -> Option<&str> {
        self.value
            .split_once('#')
            .map(|(_, fragment)| fragment)
            .filter(|fragment| !fragment.is_empty())
    }
}

impl From<NamedNode> for Iri {
    fn from(node: NamedNode) -> Self {
        Self {
            value: node.into_string(),
        }
    }
}

impl Display for Iri {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl FromStr for Iri {
    type Err = IriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_owned())
    }
}

impl TryFrom<String> for Iri {
    type Error = IriError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Errors produced when validating an [`Iri`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IriError {
    /// The provided text could not be parsed as an IRI.
    #[error("invalid IRI: {value}")]
    Invalid { value: String },
}
