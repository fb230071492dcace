//! Crate-wide error type.
//!
//! Only failures that stop a whole document or run end up here: unreadable
//! files, unparsable RDF, bad configuration, and store outages. Problems with a
//! single triple are never errors; they are logged and counted in the
//! build report instead.

use std::path::PathBuf;

use crate::store::StoreError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Message(String),

    #[error("failed to read `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse RDF document `{}`: {message}", path.display())]
    Rdf { path: PathBuf, message: String },

    #[error("unsupported RDF document format `{}`", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error(transparent)]
    Regex(#[from] regex::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[cfg(feature = "downloads")]
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Any(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub fn wrap(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Any(Box::new(err))
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
