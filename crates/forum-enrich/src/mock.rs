//! Mock fetcher for testing.
//!
//! Provides [`MockFetcher`] for exercising enrichment without network access.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::fetch::{FetchError, FetchedPage, PageFetcher};

#[derive(Debug, Clone)]
enum Canned {
    Page(String),
    Status(u16),
    Timeout,
    Charset(String),
}

/// Mock fetcher serving canned pages.
///
/// Every call is recorded, so tests can assert how many fetches a message
/// triggered. URLs without a canned response answer with status 404.
///
/// # Example
///
/// ```ignore
/// use forum_enrich::{MockFetcher, PageFetcher};
///
/// let fetcher = MockFetcher::new()
///     .with_page("https://a.example", "<title>A</title>");
///
/// let page = fetcher.fetch("https://a.example").unwrap();
/// assert_eq!(fetcher.requests(), vec!["https://a.example"]);
/// ```
#[derive(Debug, Default)]
pub struct MockFetcher {
    responses: HashMap<String, Canned>,
    requests: Mutex<Vec<String>>,
}

impl MockFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `html` for `url`.
    #[must_use]
    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.responses.insert(url.into(), Canned::Page(html.into()));
        self
    }

    /// Answer `url` with an HTTP error status.
    #[must_use]
    pub fn with_status(mut self, url: impl Into<String>, status: u16) -> Self {
        self.responses.insert(url.into(), Canned::Status(status));
        self
    }

    /// Make `url` time out.
    #[must_use]
    pub fn with_timeout(mut self, url: impl Into<String>) -> Self {
        self.responses.insert(url.into(), Canned::Timeout);
        self
    }

    /// Make `url` fail with an undecodable charset.
    #[must_use]
    pub fn with_bad_charset(mut self, url: impl Into<String>, charset: impl Into<String>) -> Self {
        self.responses
            .insert(url.into(), Canned::Charset(charset.into()));
        self
    }

    /// URLs requested so far, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of fetch attempts so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl PageFetcher for MockFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        self.requests.lock().unwrap().push(url.to_owned());

        match self.responses.get(url).cloned() {
            Some(Canned::Page(html)) => Ok(FetchedPage {
                url: url.to_owned(),
                html,
            }),
            Some(Canned::Status(status)) => Err(FetchError::Status(status)),
            Some(Canned::Timeout) => Err(FetchError::Timeout),
            Some(Canned::Charset(charset)) => Err(FetchError::Charset(charset)),
            None => Err(FetchError::Status(404)),
        }
    }
}
