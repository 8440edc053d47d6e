//! Finding the continuation link in a rendered chapter.
//!
//! Serial authors end each part with a link to the next one, usually worded
//! "Next" or "Forward". The resolver walks the chapter's links in document
//! order and hands each to a [`LinkMatcher`]; the first accepted link wins.

use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::{PageId, PipelineConfig, Result};

static LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").expect("valid selector"));

/// Decides whether a link is the continuation link.
pub trait LinkMatcher {
    /// `text` is the link's visible text, `href` its raw target.
    fn matches(&self, text: &str, href: &str) -> bool;
}

/// Accepts links whose text contains one of `keywords` (case-insensitive)
/// and whose target contains `host`.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    keywords: Vec<String>,
    host: String,
}

impl KeywordMatcher {
    pub fn new<I, S>(keywords: I, host: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self { keywords: keywords.into_iter().map(|k| k.as_ref().to_lowercase()).collect(), host: host.into() }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(&config.link_keywords, config.link_host.clone())
    }
}

impl Default for KeywordMatcher {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl LinkMatcher for KeywordMatcher {
    fn matches(&self, text: &str, href: &str) -> bool {
        let text = text.to_lowercase();
        self.keywords.iter().any(|k| text.contains(k.as_str())) && href.contains(&self.host)
    }
}

impl<F> LinkMatcher for F
where
    F: Fn(&str, &str) -> bool,
{
    fn matches(&self, text: &str, href: &str) -> bool {
        self(text, href)
    }
}

/// Returns the first link in `html` accepted by `matcher`, as a [`PageId`].
///
/// `None` means the chain ends here. Malformed markup is not an error: the
/// HTML5 parser recovers from it and only the links it yields are scanned.
///
/// # Errors
///
/// [`RedditEpubError::InvalidUrl`](crate::RedditEpubError::InvalidUrl) if the
/// accepted link is not a usable URL.
pub fn resolve_next(html: &str, matcher: &dyn LinkMatcher, config: &PipelineConfig) -> Result<Option<PageId>> {
    let document = Html::parse_fragment(html);

    let next = document.select(&LINK_SELECTOR).find_map(|link| {
        let text: String = link.text().collect();
        let href = link.value().attr("href").unwrap_or_default();
        matcher.matches(&text, href).then(|| href.to_string())
    });

    next.map(|href| PageId::parse(&href, config)).transpose()
}
