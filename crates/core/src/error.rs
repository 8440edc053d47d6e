//! Error types for reddit-epub operations.
//!
//! This module defines the main error type [`RedditEpubError`]. Every variant
//! is fatal to a run: the pipeline has no retry or skip-and-continue mode, so
//! callers either get a complete book or one of these.
//!
//! # Example
//!
//! ```rust
//! use reddit_epub_core::{RedditEpubError, Result};
//!
//! fn require_title(title: &str) -> Result<&str> {
//!     if title.trim().is_empty() {
//!         return Err(RedditEpubError::Config("must set title".to_string()));
//!     }
//!     Ok(title)
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for fetching, decoding, assembling and writing a book.
#[derive(Error, Debug)]
pub enum RedditEpubError {
    /// Invalid invocation, such as an empty book title or no starting URLs.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A page identifier or a discovered link could not be parsed as a URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTTP request errors from reqwest.
    ///
    /// Connection failures, DNS errors and truncated bodies all land here.
    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    ///
    /// Such responses are never written to the cache.
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// Reading or writing a cache entry failed.
    #[error("Cache entry {path}: {source}")]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The page data did not have the expected listing structure.
    #[error("Failed to decode thread: {0}")]
    Decode(String),

    /// The page data was not valid JSON or a required field had the wrong type.
    #[error("Invalid thread JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The opening post lacks a field every chapter needs.
    #[error("Opening post of {url} has no {field}")]
    MissingField { field: &'static str, url: String },

    /// A chain led back to a page it had already visited.
    #[error("Link cycle detected at {url}")]
    Cycle { url: String },

    /// The EPUB container could not be built.
    #[error("Failed to build EPUB: {0}")]
    Output(String),

    /// Writing the finished book failed.
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),

    /// Any of the above, tagged with the page that was being processed.
    #[error("{url}: {source}")]
    Page {
        url: String,
        #[source]
        source: Box<RedditEpubError>,
    },
}

impl RedditEpubError {
    /// Wraps `self` with the URL of the page being processed.
    ///
    /// Errors that already carry page context are returned unchanged.
    pub fn at_page(self, url: &str) -> Self {
        match self {
            err @ RedditEpubError::Page { .. } => err,
            err => RedditEpubError::Page { url: url.to_string(), source: Box::new(err) },
        }
    }

    /// Returns the innermost error, looking through [`RedditEpubError::Page`].
    pub fn root(&self) -> &RedditEpubError {
        match self {
            RedditEpubError::Page { source, .. } => source.root(),
            err => err,
        }
    }
}

/// Result type alias for RedditEpubError.
pub type Result<T> = std::result::Result<T, RedditEpubError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RedditEpubError::InvalidUrl("not a url".to_string());
        assert!(err.to_string().contains("Invalid URL"));
    }

    #[test]
    fn test_missing_field_error() {
        let err = RedditEpubError::MissingField { field: "title", url: "https://old.reddit.com/r/x".to_string() };
        assert!(err.to_string().contains("title"));
        assert!(err.to_string().contains("old.reddit.com"));
    }

    #[test]
    fn test_page_context_wraps_once() {
        let err = RedditEpubError::Decode("empty root listing".to_string())
            .at_page("https://a")
            .at_page("https://b");

        assert_eq!(err.to_string(), "https://a: Failed to decode thread: empty root listing");
        assert!(matches!(err.root(), RedditEpubError::Decode(_)));
    }

    #[test]
    fn test_http_status_error() {
        let err = RedditEpubError::HttpStatus { status: 429, url: "https://old.reddit.com/x.json".to_string() };
        assert!(err.to_string().contains("429"));
    }
}
