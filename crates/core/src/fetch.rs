//! Page fetching through a cache and a transport.
//!
//! [`Fetcher`] is the only place the pipeline touches the network. It looks
//! every page up in a [`PageCache`] first and only calls its [`Transport`] on
//! a miss. There is no retry or backoff; transport failures reach the caller
//! unchanged.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, info};

use crate::cache::PageCache;
use crate::{PageId, RedditEpubError, Result};

/// A response as seen by the fetcher.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self { status: 200, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues a single GET for a normalized request URL.
pub trait Transport {
    fn get(&self, url: &str) -> Result<Response>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn get(&self, url: &str) -> Result<Response> {
        (**self).get(url)
    }
}

/// Raw bytes fetched for one page. Consumed by the thread parser.
#[derive(Debug, Clone)]
pub struct RawPage {
    pub id: PageId,
    pub body: Vec<u8>,
}

/// Resolves page identifiers to bytes, cache first.
pub struct Fetcher {
    transport: Box<dyn Transport>,
    cache: Box<dyn PageCache>,
}

impl Fetcher {
    pub fn new(transport: impl Transport + 'static, cache: impl PageCache + 'static) -> Self {
        Self { transport: Box::new(transport), cache: Box::new(cache) }
    }

    /// Fetches `id`, serving from the cache when an entry exists.
    ///
    /// On a miss the body is stored under the same key before it is returned.
    /// Responses with a non-success status are returned as
    /// [`RedditEpubError::HttpStatus`] and not cached.
    pub fn fetch(&self, id: &PageId) -> Result<RawPage> {
        let key = id.cache_key();

        if let Some(body) = self.cache.get(&key)? {
            debug!(url = id.request_url(), key = %key, "cache hit");
            return Ok(RawPage { id: id.clone(), body });
        }

        info!("fetching {:?}", id.request_url());
        let response = self.transport.get(id.request_url())?;
        if !response.is_success() {
            return Err(RedditEpubError::HttpStatus { status: response.status, url: id.request_url().to_string() });
        }

        self.cache.put(&key, &response.body)?;
        Ok(RawPage { id: id.clone(), body: response.body })
    }
}

/// Blocking HTTP transport backed by reqwest.
#[cfg(feature = "fetch")]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    accept: String,
}

#[cfg(feature = "fetch")]
impl HttpTransport {
    /// Builds a client with the configured User-Agent and timeout.
    pub fn new(config: &crate::PipelineConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .build()
            .map_err(RedditEpubError::HttpError)?;

        Ok(Self { client, accept: config.accept.clone() })
    }
}

#[cfg(feature = "fetch")]
impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<Response> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, &self.accept)
            .send()?;

        let status = response.status().as_u16();
        let body = response.bytes()?.to_vec();

        Ok(Response { status, body })
    }
}

/// Serves canned responses keyed by request URL and counts calls.
///
/// Unknown URLs answer 404. Useful for offline replays and tests.
#[derive(Debug, Default)]
pub struct StaticTransport {
    responses: HashMap<String, Response>,
    calls: AtomicUsize,
}

impl StaticTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a 200 response for `url`.
    pub fn with_page(mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.responses.insert(url.into(), Response::ok(body));
        self
    }

    /// Registers an arbitrary response for `url`.
    pub fn with_response(mut self, url: impl Into<String>, response: Response) -> Self {
        self.responses.insert(url.into(), response);
        self
    }

    /// Number of `get` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transport for StaticTransport {
    fn get(&self, url: &str) -> Result<Response> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .responses
            .get(url)
            .cloned()
            .unwrap_or(Response { status: 404, body: Vec::new() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PipelineConfig;
    use crate::cache::MemoryCache;

    const URL: &str = "https://www.reddit.com/r/HFY/comments/abc/first/";
    const REQUEST_URL: &str = "https://old.reddit.com/r/HFY/comments/abc/first.json";

    fn page_id() -> PageId {
        PageId::parse(URL, &PipelineConfig::default()).unwrap()
    }

    #[test]
    fn test_fetch_twice_hits_network_once() {
        let transport = Arc::new(StaticTransport::new().with_page(REQUEST_URL, "[]"));
        let cache = Arc::new(MemoryCache::new());
        let fetcher = Fetcher::new(transport.clone(), cache.clone());

        let first = fetcher.fetch(&page_id()).unwrap();
        let second = fetcher.fetch(&page_id()).unwrap();

        assert_eq!(first.body, second.body);
        assert_eq!(transport.calls(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_fetch_prefers_cache() {
        let transport = Arc::new(StaticTransport::new());
        let cache = Arc::new(MemoryCache::new());
        cache.put(&page_id().cache_key(), b"cached").unwrap();

        let fetcher = Fetcher::new(transport.clone(), cache);
        let page = fetcher.fetch(&page_id()).unwrap();

        assert_eq!(page.body, b"cached");
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn test_error_status_is_not_cached() {
        let transport = Arc::new(
            StaticTransport::new().with_response(REQUEST_URL, Response { status: 429, body: b"{}".to_vec() }),
        );
        let cache = Arc::new(MemoryCache::new());
        let fetcher = Fetcher::new(transport.clone(), cache.clone());

        let result = fetcher.fetch(&page_id());

        assert!(matches!(result, Err(RedditEpubError::HttpStatus { status: 429, .. })));
        assert!(cache.is_empty());
    }

    #[cfg(feature = "fetch")]
    #[test]
    fn test_http_transport_sends_headers() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/r/HFY/comments/abc/first.json")
            .match_header("user-agent", "Reddit Epub/0.1")
            .match_header("accept", "application/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create();

        let transport = HttpTransport::new(&PipelineConfig::default()).unwrap();
        let response = transport
            .get(&format!("{}/r/HFY/comments/abc/first.json", server.url()))
            .unwrap();

        mock.assert();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"[]");
    }

    #[cfg(feature = "fetch")]
    #[test]
    fn test_http_error_status_over_network() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/r/HFY/comments/abc/first.json")
            .with_status(429)
            .with_body("Too Many Requests")
            .create();

        let config = PipelineConfig::default();
        let id = PageId::parse(&format!("{}/r/HFY/comments/abc/first/", server.url()), &config).unwrap();
        let cache = Arc::new(MemoryCache::new());
        let fetcher = Fetcher::new(HttpTransport::new(&config).unwrap(), cache.clone());

        let result = fetcher.fetch(&id);

        mock.assert();
        assert!(matches!(result, Err(RedditEpubError::HttpStatus { status: 429, .. })));
        assert!(cache.is_empty());
    }

    #[cfg(feature = "fetch")]
    #[test]
    fn test_http_fetch_is_cached() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/r/HFY/comments/abc/first.json")
            .with_status(200)
            .with_body("[]")
            .expect(1)
            .create();

        let config = PipelineConfig::default();
        let id = PageId::parse(&format!("{}/r/HFY/comments/abc/first", server.url()), &config).unwrap();
        let fetcher = Fetcher::new(HttpTransport::new(&config).unwrap(), MemoryCache::new());

        assert_eq!(fetcher.fetch(&id).unwrap().body, b"[]");
        assert_eq!(fetcher.fetch(&id).unwrap().body, b"[]");
        mock.assert();
    }
}
