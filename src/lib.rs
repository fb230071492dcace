#![doc = include_str!("../README.md")]

pub use self::errors::{Error, Result};

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod downloads;
mod errors;
pub mod graph;
pub mod logger;
pub mod ontology;
pub mod pipeline;
pub mod rdf;
pub mod store;
