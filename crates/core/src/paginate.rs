//! The pagination driver.
//!
//! For each starting URL the driver runs a small state machine:
//!
//! ```text
//! Fetching -> Parsing -> Assembling -> Resolving -> Fetching | Done
//! ```
//!
//! Chapters are appended in the order pages are visited, chain after chain.
//! Any error aborts the whole run and no book is returned.

use std::collections::HashSet;

use tracing::{info, warn};

use crate::book::Book;
use crate::chapter::{Chapter, assemble};
use crate::fetch::{Fetcher, RawPage};
use crate::links::{KeywordMatcher, LinkMatcher, resolve_next};
use crate::thread::{ParsedPage, parse_thread};
use crate::{CyclePolicy, PageId, PipelineConfig, RedditEpubError, Result};

enum State {
    Fetching(PageId),
    Parsing(RawPage),
    Assembling { id: PageId, page: ParsedPage },
    Resolving { id: PageId, chapter: Chapter },
    Done,
}

/// Follows chains of linked thread pages and collects them into a [`Book`].
pub struct Paginator {
    fetcher: Fetcher,
    matcher: Box<dyn LinkMatcher>,
    config: PipelineConfig,
}

impl Paginator {
    /// Creates a driver using the keyword matcher described by `config`.
    pub fn new(fetcher: Fetcher, config: PipelineConfig) -> Self {
        let matcher = KeywordMatcher::from_config(&config);
        Self { fetcher, matcher: Box::new(matcher), config }
    }

    /// Replaces the continuation link policy.
    pub fn with_matcher(mut self, matcher: impl LinkMatcher + 'static) -> Self {
        self.matcher = Box::new(matcher);
        self
    }

    /// Builds a book titled `title` from every chain starting at `start_urls`.
    ///
    /// # Errors
    ///
    /// [`RedditEpubError::Config`] for an empty title or no starting URLs,
    /// checked before anything is fetched. Every other error is wrapped in
    /// [`RedditEpubError::Page`] naming the page being processed.
    pub fn run<S: AsRef<str>>(&self, title: &str, start_urls: &[S]) -> Result<Book> {
        if title.trim().is_empty() {
            return Err(RedditEpubError::Config("must set title".to_string()));
        }
        if start_urls.is_empty() {
            return Err(RedditEpubError::Config("at least one starting URL is required".to_string()));
        }

        let mut book = Book::new(title, self.config.language.as_str());
        for start in start_urls {
            let start = start.as_ref();
            let id = PageId::parse(start, &self.config).map_err(|e| e.at_page(start))?;
            self.follow_chain(id, &mut book)?;
        }

        Ok(book)
    }

    /// Visits one chain, appending a chapter per page.
    fn follow_chain(&self, start: PageId, book: &mut Book) -> Result<()> {
        let mut visited = HashSet::new();
        let mut state = State::Fetching(start);

        loop {
            state = match state {
                State::Fetching(id) => {
                    visited.insert(id.visit_key().to_string());
                    let raw = self.fetcher.fetch(&id).map_err(|e| e.at_page(id.as_str()))?;
                    State::Parsing(raw)
                }
                State::Parsing(raw) => {
                    let page = parse_thread(&raw.body).map_err(|e| e.at_page(raw.id.as_str()))?;
                    State::Assembling { id: raw.id, page }
                }
                State::Assembling { id, page } => {
                    let chapter = assemble(&page, id.as_str()).map_err(|e| e.at_page(id.as_str()))?;
                    info!("{} - {}: {}", chapter.title, page.author, id);
                    book.set_author(page.author);
                    State::Resolving { id, chapter }
                }
                State::Resolving { id, chapter } => {
                    let next = resolve_next(&chapter.html, self.matcher.as_ref(), &self.config)
                        .map_err(|e| e.at_page(id.as_str()))?;
                    book.push_chapter(chapter);

                    match next {
                        Some(next) if visited.contains(next.visit_key()) => match self.config.cycle_policy {
                            CyclePolicy::Stop => {
                                warn!(from = %id, to = %next, "link cycle, ending chain");
                                State::Done
                            }
                            CyclePolicy::Fail => {
                                return Err(RedditEpubError::Cycle { url: next.to_string() }.at_page(id.as_str()));
                            }
                        },
                        Some(next) => State::Fetching(next),
                        None => State::Done,
                    }
                }
                State::Done => return Ok(()),
            };
        }
    }
}
