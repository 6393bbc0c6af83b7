//! Metadata validation for bibliographic records
//!
//! One codified definition of "bad metadata", applied both to fresh
//! discovery records and to previously-stored items being repaired.
//! Discovery scrapes routinely drop a bare year, an ellipsis-truncated
//! fragment, or a venue separator into the author field; those records
//! must be flagged rather than synchronized as-is.

use super::{Author, PaperRecord};
use serde::{Deserialize, Serialize};

/// Maximum plausible length for a single author name
const MAX_AUTHOR_LEN: usize = 100;

/// A specific offending field found during classification
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

/// Classification of a record's metadata
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum ValidationVerdict {
    Valid,
    Corrupt(Vec<FieldIssue>),
}

impl ValidationVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationVerdict::Valid)
    }

    pub fn issues(&self) -> &[FieldIssue] {
        match self {
            ValidationVerdict::Valid => &[],
            ValidationVerdict::Corrupt(issues) => issues,
        }
    }
}

/// Classify a record as well-formed or corrupt. Pure function; no side
/// effects.
pub fn classify(record: &PaperRecord) -> ValidationVerdict {
    let mut issues = Vec::new();

    if record.title.trim().is_empty() {
        issues.push(FieldIssue {
            field: "title".to_string(),
            message: "title is empty".to_string(),
        });
    }

    if record.authors.is_empty() {
        issues.push(FieldIssue {
            field: "authors".to_string(),
            message: "no authors".to_string(),
        });
    }

    for (index, author) in record.authors.iter().enumerate() {
        if let Some(message) = author_issue(author) {
            issues.push(FieldIssue {
                field: format!("author[{}]", index),
                message,
            });
        }
    }

    if issues.is_empty() {
        ValidationVerdict::Valid
    } else {
        ValidationVerdict::Corrupt(issues)
    }
}

/// Check a single author for known non-name content
fn author_issue(author: &Author) -> Option<String> {
    let name = author.full_name();
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Some("author name is empty".to_string());
    }
    if trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Some(format!("author name '{}' is numeric", trimmed));
    }
    if trimmed.contains('…') {
        return Some(format!("author name '{}' is a truncated fragment", trimmed));
    }
    if trimmed.contains(" - ") {
        return Some(format!(
            "author name '{}' contains a publication separator",
            trimmed
        ));
    }
    if trimmed.len() > MAX_AUTHOR_LEN {
        return Some("author name is implausibly long".to_string());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn record_with_author(name: &str) -> PaperRecord {
        PaperRecord::new("A Paper").with_authors(vec![Author::new(name)])
    }

    #[test]
    fn test_valid_record() {
        let record = PaperRecord::new("A Paper").with_authors(vec![
            Author::new("Smith").with_given_name("J"),
            Author::new("Jones").with_given_name("B"),
        ]);
        assert!(classify(&record).is_valid());
    }

    #[test_case("2024" ; "bare year")]
    #[test_case("123" ; "numeric token")]
    #[test_case("JB Smith…" ; "ellipsis truncation")]
    #[test_case("Smith - Nature" ; "publication separator")]
    #[test_case("   " ; "blank name")]
    fn test_corrupt_author(name: &str) {
        let verdict = classify(&record_with_author(name));
        assert!(!verdict.is_valid());
        assert!(verdict.issues().iter().any(|i| i.field == "author[0]"));
    }

    #[test]
    fn test_overlong_author_is_corrupt() {
        let verdict = classify(&record_with_author(&"x".repeat(120)));
        assert!(!verdict.is_valid());
    }

    #[test]
    fn test_corrupt_author_cited_by_position() {
        let record = PaperRecord::new("A Paper").with_authors(vec![
            Author::new("Smith"),
            Author::new("2024"),
        ]);
        let verdict = classify(&record);
        let issues = verdict.issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "author[1]");
    }

    #[test]
    fn test_empty_title_is_corrupt() {
        let record = PaperRecord::new("  ").with_authors(vec![Author::new("Smith")]);
        let verdict = classify(&record);
        assert!(verdict.issues().iter().any(|i| i.field == "title"));
    }

    #[test]
    fn test_missing_authors_is_corrupt() {
        let verdict = classify(&PaperRecord::new("A Paper"));
        assert!(verdict.issues().iter().any(|i| i.field == "authors"));
    }

    #[test]
    fn test_classification_is_pure() {
        let record = record_with_author("2024");
        let first = classify(&record);
        let second = classify(&record);
        assert_eq!(first, second);
    }
}
