//! Author representation

use serde::{Deserialize, Serialize};

/// An author of a discovered paper. Either part may be unknown; discovery
/// sources frequently deliver surname-only or mangled names.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Author {
    pub given_name: Option<String>,
    pub family_name: String,
}

impl Author {
    /// Create a new author with just a family name
    pub fn new(family_name: impl Into<String>) -> Self {
        Self {
            given_name: None,
            family_name: family_name.into(),
        }
    }

    /// Builder method to add given name
    pub fn with_given_name(mut self, given: impl Into<String>) -> Self {
        self.given_name = Some(given.into());
        self
    }

    /// Format as "Given Family" for display
    pub fn display_name(&self) -> String {
        match &self.given_name {
            Some(given) => format!("{} {}", given, self.family_name),
            None => self.family_name.clone(),
        }
    }

    /// Concatenated name content, used by the metadata validator to spot
    /// non-name tokens regardless of which part they landed in.
    pub fn full_name(&self) -> String {
        let mut name = String::new();
        if let Some(given) = &self.given_name {
            name.push_str(given);
        }
        name.push_str(&self.family_name);
        name
    }
}

/// Parse a single author string into an Author struct
///
/// Accepts "Last, First" and "First Last"; a single token becomes a bare
/// family name. Corrupt tokens (years, ellipsis fragments) pass through
/// unchanged so the validator can flag them.
pub fn parse_single_author(input: &str) -> Author {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Author::new("");
    }

    // Check for "Last, First" format
    if let Some(comma_pos) = trimmed.find(',') {
        let family = trimmed[..comma_pos].trim();
        let given = trimmed[comma_pos + 1..].trim();
        let mut author = Author::new(family);
        if !given.is_empty() {
            author.given_name = Some(given.to_string());
        }
        return author;
    }

    // "First Last" format - take last word as family name
    let parts: Vec<&str> = trimmed.split_whitespace().collect();
    if parts.len() == 1 {
        return Author::new(parts[0]);
    }

    let family = (*parts.last().unwrap_or(&"")).to_string();
    let given = parts[..parts.len() - 1].join(" ");
    let mut author = Author::new(family);
    if !given.is_empty() {
        author.given_name = Some(given);
    }
    author
}

/// Parse a comma-separated author list as delivered by discovery sources
pub fn parse_author_list(input: &str) -> Vec<Author> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_single_author)
        .collect()
}
