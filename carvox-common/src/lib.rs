//! Common types and utilities shared across carvox crates.
//!
//! This crate defines the review data model, the shared error type, and the
//! observability helpers used throughout the carvox workspace. It stays
//! dependency-light so every other crate can depend on it.
//!
//! # Overview
//!
//! - [`CarQuery`]: the car model being researched and its match form
//! - [`ReviewCollection`]: ordered review fragments produced by one fetch
//! - [`Summary`]: non-empty lines returned by the summarizer
//! - [`ReviewSource`]: the seam every review fetcher implements
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`CarvoxError`] and [`Result`]: shared error handling
//!
//! # Examples
//!
//! ```rust
//! use carvox_common::CarQuery;
//!
//! let q = CarQuery::new("Honda Civic");
//! assert_eq!(q.normalized(), "hondacivic");
//! assert!(q.matches_title("2019 honda-civic Si long term review"));
//! ```
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod observability;

/// Lowercase `input` and drop everything that is not an ASCII letter or digit.
///
/// ```
/// assert_eq!(carvox_common::normalize("Honda Civic"), "hondacivic");
/// assert_eq!(carvox_common::normalize("honda-civic"), "hondacivic");
/// ```
pub fn normalize(input: &str) -> String {
    input
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}

/// A car model as typed by the user, plus its normalized match form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarQuery {
    raw: String,
    normalized: String,
}

impl CarQuery {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let normalized = normalize(&raw);
        Self { raw, normalized }
    }

    /// The query exactly as supplied; this is what gets sent to search APIs.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// True when the normalized `title` contains the normalized query.
    ///
    /// An empty normalized query matches every title.
    pub fn matches_title(&self, title: &str) -> bool {
        normalize(title).contains(&self.normalized)
    }
}

impl fmt::Display for CarQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// One unit of review text: a post body, a post title, a comment, or a
/// `"title: snippet"` search hit.
pub type ReviewFragment = String;

/// Ordered review fragments gathered by a single fetch.
///
/// Fragments are appended while a fetcher runs; once handed back to the caller
/// the collection is only read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewCollection {
    fragments: Vec<ReviewFragment>,
}

impl ReviewCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fragment: impl Into<ReviewFragment>) {
        self.fragments.push(fragment.into());
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fragments.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[ReviewFragment] {
        &self.fragments
    }

    /// Newline-join the fragments of every collection, in order.
    ///
    /// ```
    /// use carvox_common::ReviewCollection;
    ///
    /// let a = ReviewCollection::from(vec!["one".to_string()]);
    /// let b = ReviewCollection::from(vec!["two".to_string(), "three".to_string()]);
    /// assert_eq!(ReviewCollection::combine(&[&a, &b]), "one\ntwo\nthree");
    /// assert_eq!(ReviewCollection::combine(&[]), "");
    /// ```
    pub fn combine(collections: &[&ReviewCollection]) -> String {
        collections
            .iter()
            .flat_map(|c| c.fragments.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<Vec<ReviewFragment>> for ReviewCollection {
    fn from(fragments: Vec<ReviewFragment>) -> Self {
        Self { fragments }
    }
}

impl<'a> IntoIterator for &'a ReviewCollection {
    type Item = &'a ReviewFragment;
    type IntoIter = std::slice::Iter<'a, ReviewFragment>;

    fn into_iter(self) -> Self::IntoIter {
        self.fragments.iter()
    }
}

/// Summary lines produced by the language model, trimmed and never blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Summary {
    lines: Vec<String>,
}

impl Summary {
    /// Split raw model output on line breaks, keeping trimmed non-empty lines.
    ///
    /// ```
    /// use carvox_common::Summary;
    ///
    /// let s = Summary::from_text("Performance: strong\n\n   \r\n  Reliability: mixed  ");
    /// assert_eq!(s.lines(), ["Performance: strong", "Reliability: mixed"]);
    /// ```
    pub fn from_text(raw: &str) -> Self {
        let lines = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// A place reviews can be fetched from (a forum, a search engine, ...).
///
/// Implementations perform exactly one fetch per call, never retry, and hand
/// every failure back to the caller.
#[async_trait::async_trait]
pub trait ReviewSource: Send + Sync {
    /// Short human label used in progress output and logs.
    fn label(&self) -> &str;

    async fn fetch_reviews(&self, query: &CarQuery) -> Result<ReviewCollection>;
}

/// Preferred rendering for the final report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Error types used across the carvox pipeline.
#[derive(thiserror::Error, Debug)]
pub enum CarvoxError {
    /// Credentials were missing, or the provider rejected them.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// A remote API answered with a non-success status.
    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced a response (DNS, connect, TLS, body read).
    #[error("Network error: {0}")]
    Network(String),

    /// A response body could not be decoded into the expected envelope.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CarvoxError {
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Status code for [`CarvoxError::Http`], `None` for every other kind.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Convenient alias for results that use [`CarvoxError`].
pub type Result<T> = std::result::Result<T, CarvoxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_ignores_case_and_punctuation() {
        assert_eq!(normalize("Honda Civic"), normalize("honda-civic"));
        assert_eq!(normalize("Honda Civic"), "hondacivic");
        assert_eq!(normalize("  Model-3 (2024)!"), "model32024");
    }

    #[test]
    fn normalization_drops_non_ascii_letters() {
        assert_eq!(normalize("Škoda Octavia"), "kodaoctavia");
    }

    #[test]
    fn query_matches_titles_by_normalized_substring() {
        let q = CarQuery::new("Tesla Model 3");
        assert!(q.matches_title("My TESLA model-3 after 50k miles"));
        assert!(!q.matches_title("Tesla Model Y first impressions"));
        assert_eq!(q.as_str(), "Tesla Model 3");
        assert_eq!(q.to_string(), "Tesla Model 3");
    }

    #[test]
    fn summary_never_keeps_blank_lines() {
        let s = Summary::from_text("\n \n\t\n- Good range\n\n- Firm ride\n   ");
        assert_eq!(s.len(), 2);
        assert!(s.lines().iter().all(|l| !l.trim().is_empty()));
        assert!(Summary::from_text("").is_empty());
        assert!(Summary::from_text("   \n\n").is_empty());
    }

    #[test]
    fn collection_preserves_append_order() {
        let mut c = ReviewCollection::new();
        c.push("body");
        c.push(String::from("comment"));
        assert_eq!(c.iter().collect::<Vec<_>>(), ["body", "comment"]);
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn combine_of_empty_collections_is_empty_string() {
        let a = ReviewCollection::new();
        let b = ReviewCollection::new();
        assert_eq!(ReviewCollection::combine(&[&a, &b]), "");
    }

    #[test]
    fn error_kind_helpers() {
        let e = CarvoxError::Http {
            status: 401,
            body: "denied".into(),
        };
        assert_eq!(e.status(), Some(401));
        assert!(!e.is_auth());
        assert_eq!(e.to_string(), "HTTP error 401: denied");
        assert!(CarvoxError::Auth("x".into()).is_auth());
    }
}
