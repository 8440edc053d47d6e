//! Turn a chain of linked Reddit threads into one EPUB book.
//!
//! Each thread page becomes a chapter: the opening post plus the original
//! poster's own top-level replies. The chapter's "next" link points at the
//! following page, and the chain ends at the first page without one.
//!
//! # Example
//!
//! ```rust,no_run
//! use reddit_epub_core::{DiskCache, Fetcher, HttpTransport, Paginator, PipelineConfig};
//!
//! # fn main() -> reddit_epub_core::Result<()> {
//! let config = PipelineConfig::default();
//! let fetcher = Fetcher::new(HttpTransport::new(&config)?, DiskCache::in_temp_dir(&config.cache_prefix));
//! let book = Paginator::new(fetcher, config).run("My Serial", &["https://www.reddit.com/r/HFY/comments/abc/part_1/"])?;
//! book.write_epub(std::io::stdout())?;
//! # Ok(())
//! # }
//! ```

pub mod book;
pub mod cache;
pub mod chapter;
pub mod config;
pub mod error;
pub mod fetch;
pub mod links;
pub mod page_id;
pub mod paginate;
pub mod thread;

pub use book::Book;
pub use cache::{CachePolicy, DiskCache, MemoryCache, PageCache};
pub use chapter::{Chapter, assemble, chapter_markdown, render_markdown};
pub use config::{CyclePolicy, PipelineConfig, PipelineConfigBuilder};
pub use error::{RedditEpubError, Result};
#[cfg(feature = "fetch")]
pub use fetch::HttpTransport;
pub use fetch::{Fetcher, RawPage, Response, StaticTransport, Transport};
pub use links::{KeywordMatcher, LinkMatcher, resolve_next};
pub use page_id::PageId;
pub use paginate::Paginator;
pub use thread::{Comment, ParsedPage, parse_thread};
