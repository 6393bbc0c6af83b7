//! DOI validation and cleaning
//!
//! Discovery sources hand back DOIs embedded in URLs, suffixed with query
//! parameters, or with URL path fragments glued on. Everything here is
//! pure string hygiene; resolution decides what to do with a DOI that
//! cannot be salvaged.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Official format: 10.{registrant}/{suffix}, registrant 4-9 digits
    static ref DOI_PATTERN: Regex = Regex::new(r"^10\.\d{4,9}/\S+$").unwrap();
    static ref DOI_IN_TEXT: Regex = Regex::new(r"10\.\d{4,9}/[^\s]+").unwrap();
}

pub fn is_valid_doi(doi: &str) -> bool {
    DOI_PATTERN.is_match(doi.trim())
}

/// Extract the first DOI-like token from free text (a URL, a snippet)
pub fn extract_doi(text: &str) -> Option<String> {
    let matched = DOI_IN_TEXT.find(text)?;
    clean_doi(matched.as_str())
}

/// Clean a DOI string without validating it: strip URL prefixes, query
/// parameters, HTML entities, trailing punctuation, and short numeric URL
/// fragments mistakenly appended to the suffix.
pub fn clean_doi(doi: &str) -> Option<String> {
    let mut result = doi.trim().to_string();
    if result.is_empty() {
        return None;
    }

    let prefixes = [
        "https://doi.org/",
        "http://doi.org/",
        "https://dx.doi.org/",
        "http://dx.doi.org/",
        "doi:",
        "DOI:",
    ];
    for prefix in prefixes {
        if let Some(stripped) = result.strip_prefix(prefix) {
            result = stripped.to_string();
            break;
        }
    }

    // Drop query parameters (&type=pdf, ?download=true)
    if let Some(pos) = result.find(['&', '?']) {
        result.truncate(pos);
    }

    result = result.replace("&amp;", "&");

    while result.ends_with(['.', ',', ';', ':', ')']) {
        result.pop();
    }

    // A short all-digit tail after the last '/' is a URL path fragment,
    // not part of the suffix (e.g. 10.1108/REPS-12-2024-0104/1307371).
    // Long numeric suffixes are legitimate DOIs and must be kept.
    if let Some((head, tail)) = result.rsplit_once('/') {
        if head.contains('/')
            && (6..=8).contains(&tail.len())
            && tail.chars().all(|c| c.is_ascii_digit())
        {
            result.truncate(head.len());
        }
    }

    if result.is_empty() {
        None
    } else {
        Some(result)
    }
}

/// Full normalization: extract, clean, validate. Returns None when the
/// input cannot be turned into a well-formed DOI.
pub fn normalize_doi(doi: &str) -> Option<String> {
    let candidate = if doi.trim().starts_with("10.") {
        clean_doi(doi)
    } else {
        extract_doi(doi).or_else(|| clean_doi(doi))
    }?;

    is_valid_doi(&candidate).then_some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("10.1234/example", Some("10.1234/example"))]
    #[test_case("https://doi.org/10.1234/example", Some("10.1234/example"))]
    #[test_case("10.1234/example&type=pdf", Some("10.1234/example"))]
    #[test_case("10.1108/REPS-12-2024-0104/1307371", Some("10.1108/REPS-12-2024-0104"))]
    #[test_case("10.1177/2041905820911746", Some("10.1177/2041905820911746"))]
    #[test_case("10.1201/9781003594185-8&type=chapterpdf", Some("10.1201/9781003594185-8"))]
    #[test_case(
        "10.4324/9781032646930-13/world2vec-vec2politics",
        Some("10.4324/9781032646930-13/world2vec-vec2politics")
    )]
    #[test_case("not-a-doi", None)]
    #[test_case("", None)]
    #[test_case("10.1080/23738871.2020.1797136", Some("10.1080/23738871.2020.1797136"))]
    fn test_normalize_doi(input: &str, expected: Option<&str>) {
        assert_eq!(normalize_doi(input).as_deref(), expected);
    }

    #[test]
    fn test_is_valid_doi() {
        assert!(is_valid_doi("10.1234/example"));
        assert!(is_valid_doi("10.1177/2041905820911746"));
        assert!(!is_valid_doi("not-a-doi"));
        assert!(!is_valid_doi("10.12/too-short-registrant"));
        assert!(!is_valid_doi(""));
    }

    #[test]
    fn test_extract_doi_from_text() {
        assert_eq!(
            extract_doi("see https://doi.org/10.1234/example for details").as_deref(),
            Some("10.1234/example")
        );
        assert_eq!(
            extract_doi("DOI: 10.1234/example.").as_deref(),
            Some("10.1234/example")
        );
        assert!(extract_doi("no identifier here").is_none());
    }

    #[test]
    fn test_clean_doi_trailing_punctuation() {
        assert_eq!(clean_doi("10.1234/example.,;").as_deref(), Some("10.1234/example"));
    }
}
