//! Bibliographic record produced by a discovery source

use super::Author;
use serde::{Deserialize, Serialize};

/// A candidate paper as delivered by discovery. Immutable for the duration
/// of a pipeline pass; repair replaces the whole record rather than
/// patching fields in place.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PaperRecord {
    pub doi: Option<String>,
    pub title: String,
    pub authors: Vec<Author>,
    pub year: Option<i32>,
    pub url: Option<String>,
    pub citation_count: Option<i32>,
    pub snippet: Option<String>,
}

impl PaperRecord {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            doi: None,
            title: title.into(),
            authors: Vec::new(),
            year: None,
            url: None,
            citation_count: None,
            snippet: None,
        }
    }

    pub fn with_doi(mut self, doi: impl Into<String>) -> Self {
        self.doi = Some(doi.into());
        self
    }

    pub fn with_authors(mut self, authors: Vec<Author>) -> Self {
        self.authors = authors;
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }
}
