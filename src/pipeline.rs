//! End to end loading of one ontology document.

use crate::config::{Config, OntologySettings};
use crate::graph::{BuildReport, GraphBuilder, PropertyGraph};
use crate::ontology::{BlankNodePatternMatcher, MatchOutcome, TermClassifier};
use crate::rdf::{
    filled_triples, FileTripleSource, RelationLabels, Statement, TripleSource, TripleTypeCounts,
};
use crate::store::{GraphStore, GraphStoreSync, SyncReport};
use crate::Result;

/// Everything produced by [`OntologyLoader::load`].
#[derive(Clone, Debug)]
pub struct LoadOutcome {
    pub graph: PropertyGraph,
    pub report: BuildReport,
    pub matches: MatchOutcome,
    pub triple_counts: TripleTypeCounts,
}

/// Reads triples, reconstructs blank node patterns and builds the graph.
#[derive(Clone, Debug)]
pub struct OntologyLoader {
    settings: OntologySettings,
}

impl OntologyLoader {
    #[must_use]
    pub const fn new(settings: OntologySettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.ontology.clone())
    }

    /// Loads the configured relation ontology, if any.
    ///
    /// # Errors
    ///
    /// When the relation ontology is configured but cannot be read.
    pub fn relation_labels(&self) -> Result<Option<RelationLabels>> {
        let Some(path) = self.settings.relation_ontology.as_deref() else {
            return Ok(None);
        };
        let source = FileTripleSource::new(path)?;
        RelationLabels::from_source(&source, &TermClassifier::new()?).map(Some)
    }

    /// Builds the property graph of `source`.
    ///
    /// # Errors
    ///
    /// When the source cannot be read. Problems with single triples are
    /// reported in the outcome instead.
    pub fn load(
        &self,
        source: &dyn TripleSource,
        labels: Option<RelationLabels>,
    ) -> Result<LoadOutcome> {
        let triples = source.triples()?;
        let triple_counts = TripleTypeCounts::from_triples(&triples);
        tracing::info!(
            source = %source.name(),
            triples = triples.len(),
            "ontology_triples_read"
        );

        let classifier = match labels {
            Some(labels) => TermClassifier::new()?.with_labels(labels),
            None => TermClassifier::new()?,
        };

        let filled = filled_triples(&triples);
        let matches = BlankNodePatternMatcher::new(&classifier)
            .annotate_edges(self.settings.annotate_edges)
            .reconstruct(&triples);

        let statements: Vec<Statement> = filled
            .into_iter()
            .chain(matches.reconstructed.iter().cloned())
            .map(Statement::from)
            .chain(matches.edge_attributes.iter().cloned().map(Statement::from))
            .collect();

        let built = GraphBuilder::with_allowed_prefixes(
            &classifier,
            self.settings.allowed_prefixes.iter().cloned(),
        )
        .build(&statements);

        if !built.report.skipped_prefixes.is_empty() {
            tracing::info!(
                prefixes = ?built.report.skipped_prefixes,
                "ontology_prefixes_skipped"
            );
        }
        tracing::info!(
            source = %source.name(),
            vertices = built.graph.vertex_count(),
            edges = built.graph.edge_count(),
            ignored = matches.ignored.len(),
            "ontology_loaded"
        );

        Ok(LoadOutcome {
            graph: built.graph,
            report: built.report,
            matches,
            triple_counts,
        })
    }

    /// Loads `source` and replays the graph into `store`.
    ///
    /// # Errors
    ///
    /// When the source cannot be read or the store fails.
    pub async fn load_into<S>(
        &self,
        store: &S,
        source: &dyn TripleSource,
        labels: Option<RelationLabels>,
        update: bool,
    ) -> Result<(LoadOutcome, SyncReport)>
    where
        S: GraphStore + Sync + ?Sized,
        crate::Error: From<S::Error>,
    {
        let outcome = self.load(source, labels)?;
        let report = GraphStoreSync::new(store)
            .update(update)
            .sync(&outcome.graph)
            .await?;
        Ok((outcome, report))
    }
}
