//! Page identifiers and their canonical request form.
//!
//! A [`PageId`] keeps the URL as the user (or a chapter link) spelled it, for
//! display and provenance, next to the normalized URL actually requested. The
//! normalized form is what the cache key and cycle detection are derived from.

use std::fmt;

use sha2::{Digest, Sha256};
use url::{Position, Url};

use crate::{PipelineConfig, RedditEpubError, Result};

/// A thread page, identified by its URL.
#[derive(Debug, Clone)]
pub struct PageId {
    display: String,
    request_url: Url,
}

impl PageId {
    /// Parses and normalizes a page URL.
    ///
    /// Rewrites `config.rewrite_from_host` to `config.rewrite_to_host`, drops
    /// the fragment, removes one trailing slash and appends
    /// `config.data_suffix` to the path. URLs that already end in the suffix
    /// are left alone, so normalizing twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`RedditEpubError::InvalidUrl`] for unparsable input or a
    /// scheme other than http/https.
    pub fn parse(raw: &str, config: &PipelineConfig) -> Result<Self> {
        let display = raw.trim().to_string();
        let mut url = Url::parse(&display).map_err(|e| RedditEpubError::InvalidUrl(format!("{}: {}", display, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(RedditEpubError::InvalidUrl(format!(
                "{}: scheme must be http or https",
                display
            )));
        }

        if url.host_str() == Some(config.rewrite_from_host.as_str()) {
            url.set_host(Some(&config.rewrite_to_host))
                .map_err(|e| RedditEpubError::InvalidUrl(format!("{}: {}", display, e)))?;
        }
        url.set_fragment(None);

        if !url.path().ends_with(&config.data_suffix) {
            let path = url.path();
            let path = path.strip_suffix('/').unwrap_or(path);
            let path = format!("{}{}", path, config.data_suffix);
            url.set_path(&path);
        }

        Ok(Self { display, request_url: url })
    }

    /// The URL as originally given.
    pub fn as_str(&self) -> &str {
        &self.display
    }

    /// The normalized URL that is requested and cached.
    pub fn request_url(&self) -> &str {
        self.request_url.as_str()
    }

    /// The request URL without its query string.
    ///
    /// Share links append tracking parameters (`?utm_source=share`) to the
    /// same thread, so pages are compared on this key when detecting cycles.
    pub fn visit_key(&self) -> &str {
        &self.request_url[..Position::AfterPath]
    }

    /// Lower-case hex SHA-256 of the request URL.
    pub fn cache_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.request_url.as_str().as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}
