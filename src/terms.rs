use crate::term::GlossaryTerm;
use crate::uri::GlossaryUris;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;

/// A term list handed over by whatever stores the glossary.
///
/// Accepts either a bare array of entries or an object carrying the site
/// settings used to derive target URIs:
///
/// ```json
/// { "site_url": "https://example.com", "terms": ["API", {"title": "REST", "target_uri": "https://example.com/rest"}] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermsFile {
    pub uris: GlossaryUris,
    pub entries: Vec<TermEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TermEntry {
    Title(String),
    Full {
        title: String,
        #[serde(default)]
        target_uri: Option<String>,
    },
}

impl TermEntry {
    pub fn title(&self) -> &str {
        match self {
            TermEntry::Title(title) | TermEntry::Full { title, .. } => title,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTermsFile {
    List(Vec<TermEntry>),
    Document {
        #[serde(default)]
        site_url: Option<String>,
        #[serde(default)]
        archive_slug: Option<String>,
        terms: Vec<TermEntry>,
    },
}

#[derive(Debug)]
pub enum TermsError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for TermsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TermsError::Io(err) => write!(f, "io error: {err}"),
            TermsError::Json(err) => write!(f, "invalid terms file: {err}"),
        }
    }
}

impl std::error::Error for TermsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TermsError::Io(err) => Some(err),
            TermsError::Json(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for TermsError {
    fn from(value: std::io::Error) -> Self {
        TermsError::Io(value)
    }
}

impl From<serde_json::Error> for TermsError {
    fn from(value: serde_json::Error) -> Self {
        TermsError::Json(value)
    }
}

impl TermsFile {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TermsError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, TermsError> {
        let raw: RawTermsFile = serde_json::from_str(text)?;
        Ok(match raw {
            RawTermsFile::List(entries) => Self {
                uris: GlossaryUris::default(),
                entries,
            },
            RawTermsFile::Document {
                site_url,
                archive_slug,
                terms,
            } => {
                let mut uris = GlossaryUris::default();
                if let Some(site_url) = site_url {
                    uris.site_url = site_url;
                }
                if let Some(slug) = archive_slug {
                    uris.archive_slug = slug;
                }
                Self {
                    uris,
                    entries: terms,
                }
            }
        })
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(TermEntry::title)
    }

    /// Resolves every entry to a term, in file order. Entries without an
    /// explicit target get the listing URI derived from their title.
    pub fn terms(&self) -> Vec<GlossaryTerm> {
        self.entries
            .iter()
            .map(|entry| match entry {
                TermEntry::Full {
                    title,
                    target_uri: Some(uri),
                } => GlossaryTerm::new(title, uri.clone()),
                other => self.uris.term(other.title()),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_title_list() {
        let file = TermsFile::from_json_str(r#"["beta", " alpha "]"#).expect("parse");
        let terms = file.terms();
        assert_eq!(terms[0].title, "beta");
        assert_eq!(terms[1].title, "alpha");
        assert_eq!(terms[1].target_uri, "http://localhost/glossary/letter/a/#alpha");
    }

    #[test]
    fn parses_document_with_overrides() {
        let file = TermsFile::from_json_str(
            r#"{
                "site_url": "https://example.com/",
                "archive_slug": "terms",
                "terms": ["API", {"title": "REST", "target_uri": "https://example.com/rest"}, {"title": "SOAP"}]
            }"#,
        )
        .expect("parse");
        let terms = file.terms();
        assert_eq!(terms[0].target_uri, "https://example.com/terms/letter/A/#API");
        assert_eq!(terms[1].target_uri, "https://example.com/rest");
        assert_eq!(terms[2].target_uri, "https://example.com/terms/letter/S/#SOAP");
        assert_eq!(file.titles().collect::<Vec<_>>(), vec!["API", "REST", "SOAP"]);
    }

    #[test]
    fn reports_malformed_json() {
        let err = TermsFile::from_json_str("{").expect_err("should fail");
        assert!(matches!(err, TermsError::Json(_)));
        assert!(err.to_string().starts_with("invalid terms file"));
    }

    #[test]
    fn reports_missing_file() {
        let err = TermsFile::from_path("/definitely/not/here.json").expect_err("should fail");
        assert!(matches!(err, TermsError::Io(_)));
    }
}
