//! Link and mention enrichment for rendered forum posts.
//!
//! Runs over the HTML produced by the markup renderer:
//!
//! - [`enrich_links`] replaces bare URLs with anchors titled from the remote
//!   page and collects preview cards and embedded players.
//! - [`scan_mentions`] resolves `@name` tokens against a [`UserDirectory`].
//!
//! Both scanners stop after a fixed number of matches so a single post cannot
//! trigger unbounded lookups or outbound requests.
//!
//! Remote pages are loaded through the [`PageFetcher`] trait. [`HttpFetcher`]
//! is the network implementation; `MockFetcher` (behind the `mock` feature)
//! serves canned pages in tests.

mod fetch;
mod links;
mod mentions;
mod metadata;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod spans;

pub use fetch::{
    DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_REDIRECTS, DEFAULT_USER_AGENT, FetchError, FetchSettings,
    FetchedPage, HttpFetcher, PageFetcher,
};
pub use links::{DEFAULT_MAX_MATCHES, LinkEnrichment, LinkKind, RemotePage, enrich_links};
pub use mentions::{DirectoryUser, MemoryUserDirectory, UserDirectory, scan_mentions};
pub use metadata::PageMetadata;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockFetcher;
