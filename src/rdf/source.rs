use std::fmt::Display;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use oxttl::{NTriplesParser, TurtleParser};

use super::{RdfTerm, Triple};
use crate::{Error, Result};

/// Produces the triples of one RDF document.
pub trait TripleSource {
    /// Reads every triple of the document in document order.
    ///
    /// # Errors
    ///
    /// When the document cannot be read or parsed.
    fn triples(&self) -> Result<Vec<Triple>>;

    /// Human readable name used in log events.
    fn name(&self) -> String;
}

/// Serialization formats understood by [`FileTripleSource`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RdfFormat {
    RdfXml,
    Turtle,
    NTriples,
}

impl RdfFormat {
    /// Guesses the format from the file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "owl" | "rdf" | "xml" => Some(Self::RdfXml),
            "ttl" => Some(Self::Turtle),
            "nt" => Some(Self::NTriples),
            _ => None,
        }
    }
}

/// Reads triples from an ontology file on disk.
#[derive(Clone, Debug)]
pub struct FileTripleSource {
    path: PathBuf,
    format: RdfFormat,
}

impl FileTripleSource {
    /// Creates a source for `path`, choosing the parser by extension.
    ///
    /// # Errors
    ///
    /// When the extension is not a known RDF serialization.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let format =
            RdfFormat::from_path(&path).ok_or_else(|| Error::UnsupportedFormat(path.clone()))?;
        Ok(Self { path, format })
    }
}

impl TripleSource for FileTripleSource {
    fn triples(&self) -> Result<Vec<Triple>> {
        let file = File::open(&self.path).map_err(|err| Error::io(&self.path, err))?;
        let reader = BufReader::new(file);
        let triples = match self.format {
            RdfFormat::RdfXml => collect_triples(
                oxrdfxml::RdfXmlParser::new().for_reader(reader),
                &self.path,
            ),
            RdfFormat::Turtle => {
                collect_triples(TurtleParser::new().for_reader(reader), &self.path)
            }
            RdfFormat::NTriples => {
                collect_triples(NTriplesParser::new().for_reader(reader), &self.path)
            }
        }?;
        tracing::debug!(
            path = %self.path.display(),
            triples = triples.len(),
            "rdf_document_parsed"
        );
        Ok(triples)
    }

    fn name(&self) -> String {
        self.path.display().to_string()
    }
}

fn collect_triples<I, E>(parser: I, path: &Path) -> Result<Vec<Triple>>
where
    I: Iterator<Item = std::result::Result<oxrdf::Triple, E>>,
    E: Display,
{
    let mut triples = Vec::new();
    for result in parser {
        let triple = result.map_err(|err| Error::Rdf {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        triples.push(Triple::new(
            triple.subject.into(),
            triple.predicate.into(),
            RdfTerm::try_from(triple.object)?,
        ));
    }
    Ok(triples)
}

/// Serves triples that are already in memory.
#[derive(Clone, Debug, Default)]
pub struct VecTripleSource {
    name: String,
    triples: Vec<Triple>,
}

impl VecTripleSource {
    #[must_use]
    pub fn new(name: impl Into<String>, triples: Vec<Triple>) -> Self {
        Self {
            name: name.into(),
            triples,
        }
    }
}

impl TripleSource for VecTripleSource {
    fn triples(&self) -> Result<Vec<Triple>> {
        Ok(self.triples.clone())
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;

    fn scratch_file(name: &str, contents: &str) -> PathBuf {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("owlgraph-source-{unique}"));
        std::fs::create_dir_all(&dir).expect("create scratch dir");
        let path = dir.join(name);
        std::fs::write(&path, contents).expect("write scratch file");
        path
    }

    #[test]
    fn detects_format_from_extension() {
        assert_eq!(
            RdfFormat::from_path(Path::new("cl.owl")),
            Some(RdfFormat::RdfXml)
        );
        assert_eq!(
            RdfFormat::from_path(Path::new("cl.TTL")),
            Some(RdfFormat::Turtle)
        );
        assert_eq!(
            RdfFormat::from_path(Path::new("cl.nt")),
            Some(RdfFormat::NTriples)
        );
        assert_eq!(RdfFormat::from_path(Path::new("cl.json")), None);
        assert!(matches!(
            FileTripleSource::new("cl.json"),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn parses_turtle_with_blank_nodes() {
        let path = scratch_file(
            "cell.ttl",
            r#"@prefix obo: <http://purl.obolibrary.org/obo/> .
@prefix owl: <http://www.w3.org/2002/07/owl#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .

obo:CL_0000001 rdfs:label "primary cell" ;
    rdfs:subClassOf [ a owl:Restriction ;
        owl:onProperty obo:RO_0002202 ;
        owl:someValuesFrom obo:CL_0000000 ] .
"#,
        );

        let triples = FileTripleSource::new(&path)
            .expect("turtle source")
            .triples()
            .expect("parse turtle");

        assert_eq!(triples.len(), 5);
        assert!(matches!(&triples[0].object, RdfTerm::Literal(l) if l.value() == "primary cell"));
        assert_eq!(triples.iter().filter(|t| t.subject.is_blank()).count(), 3);
    }

    #[test]
    fn parses_rdf_xml() {
        let path = scratch_file(
            "cell.owl",
            r#"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns:rdfs="http://www.w3.org/2000/01/rdf-schema#"
         xmlns:owl="http://www.w3.org/2002/07/owl#">
  <owl:Class rdf:about="http://purl.obolibrary.org/obo/CL_0000001">
    <rdfs:label>primary cell</rdfs:label>
  </owl:Class>
</rdf:RDF>
"#,
        );

        let triples = FileTripleSource::new(&path)
            .expect("rdf/xml source")
            .triples()
            .expect("parse rdf/xml");
        assert_eq!(triples.len(), 2);
    }

    #[test]
    fn reports_syntax_errors_with_path() {
        let path = scratch_file("broken.nt", "<http://example.org/a> <http://example.org/b> .\n");
        let err = FileTripleSource::new(&path)
            .expect("ntriples source")
            .triples()
            .expect_err("syntax error");
        assert!(matches!(err, Error::Rdf { path: p, .. } if p == path));
    }
}
