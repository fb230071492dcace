//! # Configuration
//!
//! Settings are read from a YAML file. Every section is optional and falls
//! back to its default:
//!
//! ```yaml
//! logger:
//!   enable: true
//!   level: info
//!   format: compact
//! ontology:
//!   allowed_prefixes: [CL, UBERON]
//!   relation_ontology: data/ro.owl
//!   annotate_edges: false
//! store:
//!   backend: fs
//!   root: graph
//!   update: false
//! downloads:
//!   directory: data
//!   sources:
//!     - http://purl.obolibrary.org/obo/cl.owl
//!   max_attempts: 3
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::graph::DEFAULT_ALLOWED_PREFIXES;
use crate::store::StoreBackend;
use crate::{Error, Result};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub logger: Logger,
    pub ontology: OntologySettings,
    pub store: StoreSettings,
    pub downloads: DownloadSettings,
}

impl Config {
    /// Reads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// When the file cannot be read or is not valid YAML for [`Config`].
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
        Self::from_yaml(&content)
    }

    /// # Errors
    ///
    /// When `content` is not valid YAML for [`Config`].
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }
}

/// Where and how `owlgraph` writes its tracing output.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Logger {
    /// Write events to stdout.
    pub enable: bool,
    pub level: LogLevel,
    pub format: Format,
    /// Raw `EnvFilter` directives used instead of `owlgraph={level}`.
    /// `RUST_LOG` still takes precedence.
    pub override_filter: Option<String>,
    pub file_appender: Option<LoggerFileAppender>,
}

impl Default for Logger {
    fn default() -> Self {
        Self {
            enable: true,
            level: LogLevel::default(),
            format: Format::default(),
            override_filter: None,
            file_appender: None,
        }
    }
}

/// Rolling log files, written next to the stdout output.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggerFileAppender {
    pub enable: bool,
    /// Hand writes to a background worker.
    pub non_blocking: bool,
    pub level: LogLevel,
    pub format: Format,
    pub rotation: Rotation,
    /// Log directory, `./logs` when unset.
    pub dir: Option<String>,
    pub filename_prefix: Option<String>,
    pub filename_suffix: Option<String>,
    /// Rotated files kept on disk.
    pub max_log_files: usize,
}

impl Default for LoggerFileAppender {
    fn default() -> Self {
        Self {
            enable: false,
            non_blocking: true,
            level: LogLevel::default(),
            format: Format::default(),
            rotation: Rotation::default(),
            dir: None,
            filename_prefix: None,
            filename_suffix: None,
            max_log_files: 1,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Off => "off",
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        })
    }
}

#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Compact,
    Pretty,
    Json,
}

#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Rotation {
    Minutely,
    #[default]
    Hourly,
    Daily,
    Never,
}

/// Ontology interpretation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OntologySettings {
    /// Ontology prefixes that become vertex collections.
    pub allowed_prefixes: Vec<String>,
    /// Relation ontology providing labels for relation ids.
    pub relation_ontology: Option<PathBuf>,
    /// Also attach reified annotation literals to the annotated edge.
    pub annotate_edges: bool,
}

impl Default for OntologySettings {
    fn default() -> Self {
        Self {
            allowed_prefixes: DEFAULT_ALLOWED_PREFIXES
                .iter()
                .map(ToString::to_string)
                .collect(),
            relation_ontology: None,
            annotate_edges: false,
        }
    }
}

/// Persistent graph store settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    /// Root directory of the `fs` backend.
    pub root: PathBuf,
    /// Overwrite documents that already exist in the store.
    pub update: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            root: PathBuf::from("graph"),
            update: false,
        }
    }
}

/// Ontology download settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DownloadSettings {
    /// Directory holding the current ontology files.
    pub directory: PathBuf,
    /// Source URLs fetched by `owlgraph download`.
    pub sources: Vec<String>,
    /// Fetch attempts per URL before giving up on it.
    pub max_attempts: usize,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("data"),
            sources: Vec::new(),
            max_attempts: 3,
        }
    }
}
