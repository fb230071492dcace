//! Keeping local ontology files up to date.
//!
//! A fetched file is written next to the current one as
//! `{stem}-new{suffix}` and only renamed over the current file when its
//! version is newer, so the current file is never partially written.

use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::rdf::{FileTripleSource, RdfTerm, TripleSource};
use crate::{Error, Result};

const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
const OWL_ONTOLOGY: &str = "http://www.w3.org/2002/07/owl#Ontology";
const OWL_VERSION_INFO: &str = "http://www.w3.org/2002/07/owl#versionInfo";
const OWL_VERSION_IRI: &str = "http://www.w3.org/2002/07/owl#versionIRI";
const ARCHIVE_DIR: &str = ".archive";

/// Release version of an ontology document.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OntologyVersion {
    Date(NaiveDate),
    Number(f64),
}

impl OntologyVersion {
    fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            return Some(Self::Date(date));
        }
        text.parse::<f64>()
            .ok()
            .filter(|number| number.is_finite())
            .map(Self::Number)
    }
}

/// Versions only compare within the same kind.
impl PartialOrd for OntologyVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Date(a), Self::Date(b)) => a.partial_cmp(b),
            (Self::Number(a), Self::Number(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl Display for OntologyVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::Number(number) => write!(f, "{number}"),
        }
    }
}

/// Reads the version of an ontology document.
///
/// `owl:versionInfo` wins when it holds a `YYYY-MM-DD` date; otherwise the
/// sixth `/`-separated segment of `owl:versionIRI` is read as a number or
/// a date.
///
/// # Errors
///
/// When the document cannot be parsed.
pub fn find_version(path: &Path) -> Result<Option<OntologyVersion>> {
    let triples = FileTripleSource::new(path)?.triples()?;
    let ontologies = triples
        .iter()
        .filter(|t| is_iri(&t.predicate, RDF_TYPE) && is_iri(&t.object, OWL_ONTOLOGY))
        .map(|t| &t.subject)
        .collect::<Vec<_>>();
    let about_ontology = |t: &&crate::rdf::Triple| ontologies.contains(&&t.subject);

    let version_info = triples
        .iter()
        .filter(about_ontology)
        .filter(|t| is_iri(&t.predicate, OWL_VERSION_INFO))
        .find_map(|t| match &t.object {
            RdfTerm::Literal(literal) => {
                NaiveDate::parse_from_str(literal.value().trim(), "%Y-%m-%d").ok()
            }
            _ => None,
        });
    if let Some(date) = version_info {
        return Ok(Some(OntologyVersion::Date(date)));
    }

    let version = triples
        .iter()
        .filter(about_ontology)
        .filter(|t| is_iri(&t.predicate, OWL_VERSION_IRI))
        .find_map(|t| match &t.object {
            RdfTerm::Iri(iri) => iri.as_str().split('/').nth(5).and_then(OntologyVersion::parse),
            _ => None,
        });
    if version.is_none() {
        tracing::warn!(path = %path.display(), "ontology_version_missing");
    }
    Ok(version)
}

fn is_iri(term: &RdfTerm, value: &str) -> bool {
    matches!(term, RdfTerm::Iri(iri) if iri.as_str() == value)
}

/// What [`install_download`] did with a fetched file.
#[derive(Clone, Debug, PartialEq)]
pub enum InstallOutcome {
    /// No current file existed.
    Installed { current: PathBuf },
    /// The current file was archived and replaced.
    Replaced { current: PathBuf, archived: PathBuf },
    /// The fetched file was not newer and was removed.
    Kept { current: PathBuf },
}

/// Path of the current file for a fetched `{stem}-new{suffix}` file.
fn current_path(new_file: &Path, stem: &str, suffix: &str) -> PathBuf {
    new_file.with_file_name(format!("{stem}{suffix}"))
}

/// Splits a file name into stem and suffix (`cl.owl` -> `cl`, `.owl`).
fn stem_and_suffix(path: &Path) -> Result<(String, String)> {
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| Error::Message(format!("no file name in `{}`", path.display())))?;
    let suffix = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| format!(".{extension}"))
        .unwrap_or_default();
    Ok((stem.to_owned(), suffix))
}

/// Swaps a freshly fetched file in place of the current one when it is
/// newer.
///
/// `new_file` must be named `{stem}-new{suffix}`; the current file is
/// `{stem}{suffix}` in the same directory and older copies go to
/// `.archive/{stem}-{version}{suffix}`.
///
/// # Errors
///
/// When a file cannot be parsed, moved or removed.
pub async fn install_download(new_file: &Path) -> Result<InstallOutcome> {
    let (new_stem, suffix) = stem_and_suffix(new_file)?;
    let stem = new_stem
        .strip_suffix("-new")
        .ok_or_else(|| {
            Error::Message(format!("`{}` is not a fetched file", new_file.display()))
        })?
        .to_owned();
    let current = current_path(new_file, &stem, &suffix);

    if !tokio::fs::try_exists(&current)
        .await
        .map_err(|err| Error::io(&current, err))?
    {
        rename(new_file, &current).await?;
        tracing::info!(path = %current.display(), "ontology_download_installed");
        return Ok(InstallOutcome::Installed { current });
    }

    let versions = find_version(new_file)
        .and_then(|new_version| Ok((new_version, find_version(&current)?)));
    let (new_version, current_version) = match versions {
        Ok(versions) => versions,
        Err(err) => {
            if let Err(remove_err) = tokio::fs::remove_file(new_file).await {
                tracing::warn!(
                    path = %new_file.display(),
                    error = %remove_err,
                    "ontology_download_cleanup_failed"
                );
            }
            return Err(err);
        }
    };
    tracing::info!(
        path = %current.display(),
        new_version = ?new_version.map(|v| v.to_string()),
        current_version = ?current_version.map(|v| v.to_string()),
        "ontology_versions_compared"
    );

    let newer = match (new_version, current_version) {
        (Some(new_version), Some(current_version)) => new_version > current_version,
        (Some(_), None) => true,
        (None, _) => false,
    };
    if !newer {
        tokio::fs::remove_file(new_file)
            .await
            .map_err(|err| Error::io(new_file, err))?;
        tracing::info!(path = %current.display(), "ontology_download_not_newer");
        return Ok(InstallOutcome::Kept { current });
    }

    let archive_dir = current
        .parent()
        .map_or_else(|| PathBuf::from(ARCHIVE_DIR), |dir| dir.join(ARCHIVE_DIR));
    tokio::fs::create_dir_all(&archive_dir)
        .await
        .map_err(|err| Error::io(&archive_dir, err))?;
    let version = current_version.map_or_else(|| "unknown".to_string(), |v| v.to_string());
    let archived = archive_dir.join(format!("{stem}-{version}{suffix}"));
    rename(&current, &archived).await?;
    rename(new_file, &current).await?;
    tracing::info!(
        path = %current.display(),
        archived = %archived.display(),
        "ontology_download_replaced"
    );
    Ok(InstallOutcome::Replaced { current, archived })
}

async fn rename(from: &Path, to: &Path) -> Result<()> {
    tokio::fs::rename(from, to)
        .await
        .map_err(|err| Error::io(from, err))
}

/// Fetches every URL into `directory` and installs newer versions.
///
/// URLs are handled one after the other; a failing URL is logged and does
/// not stop the remaining ones.
///
/// # Errors
///
/// When `directory` cannot be created or the HTTP client cannot be built.
#[cfg(feature = "downloads")]
pub async fn update_downloads(
    urls: &[String],
    directory: &Path,
    max_attempts: usize,
) -> Result<Vec<InstallOutcome>> {
    tokio::fs::create_dir_all(directory)
        .await
        .map_err(|err| Error::io(directory, err))?;
    let client = reqwest::Client::builder().build()?;

    let mut outcomes = Vec::with_capacity(urls.len());
    for url in urls {
        match update_download(&client, url, directory, max_attempts.max(1)).await {
            Ok(outcome) => outcomes.push(outcome),
            Err(err) => {
                tracing::error!(url, err.msg = %err, err.detail = ?err, "ontology_download_error");
            }
        }
    }
    Ok(outcomes)
}

#[cfg(feature = "downloads")]
async fn update_download(
    client: &reqwest::Client,
    url: &str,
    directory: &Path,
    max_attempts: usize,
) -> Result<InstallOutcome> {
    let parsed = reqwest::Url::parse(url).map_err(Error::wrap)?;
    let (stem, suffix) = stem_and_suffix(Path::new(parsed.path()))?;
    let new_file = directory.join(format!("{stem}-new{suffix}"));

    let mut attempt = 1;
    let bytes = loop {
        let response = client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status);
        let result = match response {
            Ok(response) => response.bytes().await,
            Err(err) => Err(err),
        };
        match result {
            Ok(bytes) => break bytes,
            Err(err) if attempt < max_attempts => {
                tracing::warn!(url, attempt, err.msg = %err, "ontology_download_retry");
                attempt += 1;
            }
            Err(err) => return Err(err.into()),
        }
    };

    tokio::fs::write(&new_file, &bytes)
        .await
        .map_err(|err| Error::io(&new_file, err))?;
    tracing::info!(url, path = %new_file.display(), bytes = bytes.len(), "ontology_downloaded");
    install_download(&new_file).await
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;

    fn scratch_dir() -> PathBuf {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("owlgraph-downloads-{unique}"));
        std::fs::create_dir_all(&dir).expect("create scratch dir");
        dir
    }

    fn ontology(version_info: Option<&str>, version_iri: Option<&str>) -> String {
        let mut body = String::from(
            "<http://purl.obolibrary.org/obo/cl.owl> \
             <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> \
             <http://www.w3.org/2002/07/owl#Ontology> .\n",
        );
        if let Some(info) = version_info {
            body.push_str(&format!(
                "<http://purl.obolibrary.org/obo/cl.owl> <{OWL_VERSION_INFO}> \"{info}\" .\n"
            ));
        }
        if let Some(iri) = version_iri {
            body.push_str(&format!(
                "<http://purl.obolibrary.org/obo/cl.owl> <{OWL_VERSION_IRI}> <{iri}> .\n"
            ));
        }
        body
    }

    #[test]
    fn versions_compare_within_their_kind() {
        let older = OntologyVersion::parse("2023-01-01").expect("date");
        let newer = OntologyVersion::parse("2024-01-01").expect("date");
        assert!(newer > older);
        assert!(OntologyVersion::Number(2.0) > OntologyVersion::Number(1.5));
        assert_eq!(older.partial_cmp(&OntologyVersion::Number(1.0)), None);
        assert_eq!(OntologyVersion::parse("releases"), None);
    }

    #[test]
    fn reads_version_info_then_version_iri() {
        let dir = scratch_dir();
        let info = dir.join("info.nt");
        std::fs::write(&info, ontology(Some("2024-02-15"), None)).expect("write");
        assert_eq!(
            find_version(&info).expect("parse"),
            NaiveDate::from_ymd_opt(2024, 2, 15).map(OntologyVersion::Date)
        );

        let iri = dir.join("iri.nt");
        std::fs::write(
            &iri,
            ontology(
                Some("release 7"),
                Some("http://purl.obolibrary.org/obo/cl/2023-09-21/cl.owl"),
            ),
        )
        .expect("write");
        assert_eq!(
            find_version(&iri).expect("parse"),
            NaiveDate::from_ymd_opt(2023, 9, 21).map(OntologyVersion::Date)
        );

        let none = dir.join("none.nt");
        std::fs::write(&none, ontology(None, None)).expect("write");
        assert_eq!(find_version(&none).expect("parse"), None);
    }

    #[tokio::test]
    async fn installs_when_no_current_file() {
        let dir = scratch_dir();
        let new_file = dir.join("cl-new.nt");
        std::fs::write(&new_file, ontology(Some("2024-01-01"), None)).expect("write");

        let outcome = install_download(&new_file).await.expect("install");

        assert_eq!(
            outcome,
            InstallOutcome::Installed {
                current: dir.join("cl.nt")
            }
        );
        assert!(!new_file.exists());
    }

    #[tokio::test]
    async fn archives_older_current_file() {
        let dir = scratch_dir();
        std::fs::write(dir.join("cl.nt"), ontology(Some("2023-01-01"), None)).expect("write");
        let new_file = dir.join("cl-new.nt");
        std::fs::write(&new_file, ontology(Some("2024-01-01"), None)).expect("write");

        let outcome = install_download(&new_file).await.expect("install");

        let archived = dir.join(".archive").join("cl-2023-01-01.nt");
        assert_eq!(
            outcome,
            InstallOutcome::Replaced {
                current: dir.join("cl.nt"),
                archived: archived.clone(),
            }
        );
        assert!(archived.exists());
        assert_eq!(
            find_version(&dir.join("cl.nt")).expect("parse"),
            NaiveDate::from_ymd_opt(2024, 1, 1).map(OntologyVersion::Date)
        );
    }

    #[tokio::test]
    async fn discards_download_that_is_not_newer() {
        let dir = scratch_dir();
        std::fs::write(dir.join("cl.nt"), ontology(Some("2024-01-01"), None)).expect("write");
        let new_file = dir.join("cl-new.nt");
        std::fs::write(&new_file, ontology(Some("2024-01-01"), None)).expect("write");

        let outcome = install_download(&new_file).await.expect("install");

        assert_eq!(
            outcome,
            InstallOutcome::Kept {
                current: dir.join("cl.nt")
            }
        );
        assert!(!new_file.exists());
    }

    #[tokio::test]
    async fn unreadable_download_is_removed() {
        let dir = scratch_dir();
        std::fs::write(dir.join("cl.nt"), ontology(Some("2024-01-01"), None)).expect("write");
        let new_file = dir.join("cl-new.nt");
        std::fs::write(&new_file, "<http://purl.obolibrary.org/obo/cl.owl> broken").expect("write");

        let result = install_download(&new_file).await;

        assert!(matches!(result, Err(Error::Rdf { .. })));
        assert!(!new_file.exists());
        assert!(dir.join("cl.nt").exists());
    }
}
