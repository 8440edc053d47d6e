//! Pipeline configuration.
//!
//! [`PipelineConfig`] carries every knob the fetcher, resolver, driver and
//! book writer read. Defaults reproduce the classic behaviour: talk to
//! `old.reddit.com`, identify as `Reddit Epub/0.1`, follow links whose text
//! mentions "next" or "forward".
//!
//! # Example
//!
//! ```rust
//! use reddit_epub_core::{CyclePolicy, PipelineConfig};
//!
//! let config = PipelineConfig::builder()
//!     .language("de")
//!     .cycle_policy(CyclePolicy::Fail)
//!     .build();
//! assert_eq!(config.language, "de");
//! ```

use std::str::FromStr;
use std::time::Duration;

/// What the pagination driver does when a chain revisits a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CyclePolicy {
    /// End the current chain with a warning and move on.
    #[default]
    Stop,
    /// Abort the run with [`crate::RedditEpubError::Cycle`].
    Fail,
}

impl FromStr for CyclePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stop" => Ok(Self::Stop),
            "fail" => Ok(Self::Fail),
            _ => Err(format!("Invalid cycle policy: {}. Valid options: stop, fail", s)),
        }
    }
}

/// Configuration shared by every pipeline stage.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// User-Agent sent with every request (default: `Reddit Epub/0.1`).
    pub user_agent: String,

    /// Accept header sent with every request (default: `application/json`).
    pub accept: String,

    /// Optional transport timeout. `None` waits forever.
    pub timeout: Option<Duration>,

    /// Host rewritten before fetching (default: `www.reddit.com`).
    pub rewrite_from_host: String,

    /// Host substituted in (default: `old.reddit.com`).
    pub rewrite_to_host: String,

    /// Suffix appended to the path to request structured data (default: `.json`).
    pub data_suffix: String,

    /// File name prefix of disk cache entries (default: `redditepub-`).
    pub cache_prefix: String,

    /// Lower-case words that mark a continuation link.
    pub link_keywords: Vec<String>,

    /// Substring a continuation link's target must contain (default: `reddit.com`).
    pub link_host: String,

    /// Behaviour on revisiting a page within one chain.
    pub cycle_policy: CyclePolicy,

    /// EPUB language tag (default: `en`).
    pub language: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            user_agent: "Reddit Epub/0.1".to_string(),
            accept: "application/json".to_string(),
            timeout: None,
            rewrite_from_host: "www.reddit.com".to_string(),
            rewrite_to_host: "old.reddit.com".to_string(),
            data_suffix: ".json".to_string(),
            cache_prefix: "redditepub-".to_string(),
            link_keywords: vec!["next".to_string(), "forward".to_string()],
            link_host: "reddit.com".to_string(),
            cycle_policy: CyclePolicy::default(),
            language: "en".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Creates a new builder for PipelineConfig.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::new()
    }
}

/// Builder for PipelineConfig.
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: PipelineConfig::default() }
    }

    /// Sets the User-Agent header.
    pub fn user_agent(mut self, value: impl Into<String>) -> Self {
        self.config.user_agent = value.into();
        self
    }

    /// Sets the transport timeout.
    pub fn timeout(mut self, value: Option<Duration>) -> Self {
        self.config.timeout = value;
        self
    }

    /// Sets the host rewrite applied during normalization.
    pub fn rewrite_host(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.config.rewrite_from_host = from.into();
        self.config.rewrite_to_host = to.into();
        self
    }

    /// Sets the cache file name prefix.
    pub fn cache_prefix(mut self, value: impl Into<String>) -> Self {
        self.config.cache_prefix = value.into();
        self
    }

    /// Sets the continuation link keywords. They are lower-cased.
    pub fn link_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.link_keywords = keywords.into_iter().map(|k| k.as_ref().to_lowercase()).collect();
        self
    }

    /// Sets the host substring a continuation link must point at.
    pub fn link_host(mut self, value: impl Into<String>) -> Self {
        self.config.link_host = value.into();
        self
    }

    /// Sets the cycle policy.
    pub fn cycle_policy(mut self, value: CyclePolicy) -> Self {
        self.config.cycle_policy = value;
        self
    }

    /// Sets the EPUB language.
    pub fn language(mut self, value: impl Into<String>) -> Self {
        self.config.language = value.into();
        self
    }

    /// Builds the config.
    pub fn build(self) -> PipelineConfig {
        self.config
    }
}

impl Default for PipelineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
