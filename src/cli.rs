//! Command line entry point.
//!
//! ```sh
//! owlgraph load data/cl.owl --config owlgraph.yaml --store-root graph
//! owlgraph inspect data/cl.owl
//! owlgraph download --config owlgraph.yaml
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::pipeline::OntologyLoader;
use crate::rdf::FileTripleSource;
use crate::store::{OpendalGraphStore, StoreBackend};
use crate::{logger, Result};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the property graph of an ontology and write it to the store
    Load {
        /// Ontology document (.owl, .rdf, .xml, .ttl or .nt)
        file: PathBuf,
        /// Overwrite documents that already exist in the store
        #[arg(long)]
        update: bool,
        /// Write documents below this directory
        #[arg(long)]
        store_root: Option<PathBuf>,
        /// Relation ontology providing relation labels
        #[arg(long)]
        relations: Option<PathBuf>,
    },
    /// Print triple and blank node statistics of an ontology
    Inspect {
        /// Ontology document (.owl, .rdf, .xml, .ttl or .nt)
        file: PathBuf,
    },
    /// Fetch the configured ontologies and keep the newest versions
    #[cfg(feature = "downloads")]
    Download,
}

/// Parses arguments and runs the selected command.
///
/// # Errors
///
/// When configuration, parsing, the store or a download fails.
pub async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = match cli.config.as_deref() {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    logger::init(&config.logger)?;

    match cli.command {
        Commands::Load {
            file,
            update,
            store_root,
            relations,
        } => {
            if relations.is_some() {
                config.ontology.relation_ontology = relations;
            }
            if let Some(root) = store_root {
                config.store.backend = StoreBackend::Fs;
                config.store.root = root;
            }
            config.store.update |= update;
            load(&config, &file).await
        }
        Commands::Inspect { file } => inspect(&config, &file),
        #[cfg(feature = "downloads")]
        Commands::Download => {
            let outcomes = crate::downloads::update_downloads(
                &config.downloads.sources,
                &config.downloads.directory,
                config.downloads.max_attempts,
            )
            .await?;
            for outcome in outcomes {
                println!("{outcome:?}");
            }
            Ok(())
        }
    }
}

async fn load(config: &Config, file: &Path) -> Result<()> {
    let loader = OntologyLoader::from_config(config);
    let labels = loader.relation_labels()?;
    let source = FileTripleSource::new(file)?;
    let store = match config.store.backend {
        StoreBackend::Memory => OpendalGraphStore::memory()?,
        StoreBackend::Fs => OpendalGraphStore::fs(&config.store.root)?,
    };

    let (outcome, sync) = loader
        .load_into(&store, &source, labels, config.store.update)
        .await?;

    println!(
        "vertices: {}, edges: {}",
        outcome.graph.vertex_count(),
        outcome.graph.edge_count()
    );
    for (prefix, count) in &outcome.report.skipped_prefixes {
        println!("skipped prefix {prefix}: {count}");
    }
    println!("{}", serde_json::to_string_pretty(&sync)?);
    Ok(())
}

fn inspect(config: &Config, file: &Path) -> Result<()> {
    let loader = OntologyLoader::from_config(config);
    let labels = loader.relation_labels()?;
    if let Some(labels) = &labels {
        let ids: Vec<&str> = labels.ids().iter().map(String::as_str).collect();
        println!("relation ontologies: {}", ids.join(", "));
    }
    let outcome = loader.load(&FileTripleSource::new(file)?, labels)?;

    println!("triple types:");
    print!("{}", outcome.triple_counts);
    println!(
        "reconstructed: {}, edge attributes: {}",
        outcome.matches.reconstructed.len(),
        outcome.matches.edge_attributes.len()
    );
    for (bucket, count) in outcome.matches.ignored_counts() {
        println!("ignored {bucket}: {count}");
    }
    println!("{}", serde_json::to_string_pretty(&outcome.report)?);
    Ok(())
}
