//! Remote page loading.

use std::io::Read;
use std::time::Duration;

use flate2::read::{DeflateDecoder, ZlibDecoder};
use ureq::Agent;

/// Default ceiling for a single page fetch (3 seconds).
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_millis(3000);

/// Default number of redirects followed before giving up.
pub const DEFAULT_MAX_REDIRECTS: u32 = 3;

/// User agent sent with every page fetch.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 6.3; WOW64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/41.0.2228.0 Safari/537.36";

/// Error loading a remote page.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Network or protocol failure.
    #[error("HTTP request failed: {0}")]
    Http(#[source] ureq::Error),
    /// Server answered with a non-success status.
    #[error("HTTP status {0}")]
    Status(u16),
    /// The fetch did not finish within the configured timeout.
    #[error("request timed out")]
    Timeout,
    /// `Content-Type` names a character set that cannot be decoded.
    #[error("unsupported charset: {0}")]
    Charset(String),
    /// Reading or decompressing the body failed.
    #[error("I/O error")]
    Io(#[from] std::io::Error),
}

impl From<ureq::Error> for FetchError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::Timeout(_) => Self::Timeout,
            ureq::Error::Io(io) if io.kind() == std::io::ErrorKind::TimedOut => Self::Timeout,
            other => Self::Http(other),
        }
    }
}

/// A loaded page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// URL that was requested (without fragment).
    pub url: String,
    /// Decoded page markup.
    pub html: String,
}

/// Capability to load a remote page.
///
/// Implementations must bound each call by a timeout; callers treat any
/// error as "no metadata" and carry on.
pub trait PageFetcher: Send + Sync {
    /// Load the page at `url`.
    fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

/// Network settings for [`HttpFetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    pub timeout: Duration,
    pub max_redirects: u32,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_FETCH_TIMEOUT,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

/// [`PageFetcher`] over HTTP.
///
/// Follows a bounded number of redirects and accepts gzip or deflate
/// encoded bodies. The agent is reused across calls for connection pooling.
pub struct HttpFetcher {
    agent: Agent,
    settings: FetchSettings,
}

impl HttpFetcher {
    #[must_use]
    pub fn new(settings: FetchSettings) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(settings.timeout))
            .max_redirects(settings.max_redirects)
            .http_status_as_error(false)
            .build()
            .into();
        Self { agent, settings }
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(FetchSettings::default())
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        tracing::debug!(url, "Fetching remote page");

        let response = self
            .agent
            .get(url)
            .header("User-Agent", &self.settings.user_agent)
            .header("Accept-Encoding", "gzip, deflate")
            .call()?;

        let status = response.status().as_u16();
        if status >= 400 {
            return Err(FetchError::Status(status));
        }

        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        let content_type = header("content-type");
        let content_encoding = header("content-encoding");

        let raw = response.into_body().read_to_vec()?;
        let bytes = decompress(raw, content_encoding.as_deref())?;
        let html = decode_charset(&bytes, content_type.as_deref())?;

        Ok(FetchedPage {
            url: url.to_owned(),
            html,
        })
    }
}

/// Inflate a deflate-encoded body. Gzip is already handled by the agent.
///
/// Servers disagree on whether `deflate` means zlib-wrapped or raw, so both
/// are tried.
fn decompress(raw: Vec<u8>, content_encoding: Option<&str>) -> Result<Vec<u8>, FetchError> {
    let is_deflate = content_encoding.is_some_and(|e| e.trim().eq_ignore_ascii_case("deflate"));
    if !is_deflate {
        return Ok(raw);
    }

    let mut out = Vec::new();
    if ZlibDecoder::new(raw.as_slice()).read_to_end(&mut out).is_ok() {
        return Ok(out);
    }
    out.clear();
    DeflateDecoder::new(raw.as_slice()).read_to_end(&mut out)?;
    Ok(out)
}

/// `charset` parameter of a `Content-Type` header, lowercased.
fn charset_of(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(['"', '\'']).to_ascii_lowercase())
    })
}

/// Decode a body using the charset from `Content-Type` (UTF-8 when absent).
fn decode_charset(bytes: &[u8], content_type: Option<&str>) -> Result<String, FetchError> {
    let charset = content_type.and_then(charset_of);
    match charset.as_deref() {
        None | Some("utf-8" | "utf8" | "us-ascii" | "ascii") => {
            Ok(String::from_utf8_lossy(bytes).into_owned())
        }
        Some("iso-8859-1" | "latin1" | "latin-1" | "l1") => {
            Ok(bytes.iter().map(|&b| char::from(b)).collect())
        }
        Some(other) => Err(FetchError::Charset(other.to_owned())),
    }
}

/// URL without its `#fragment`.
pub(crate) fn strip_fragment(url: &str) -> &str {
    url.split_once('#').map_or(url, |(base, _)| base)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::Compression;
    use flate2::write::{DeflateEncoder, ZlibEncoder};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = FetchSettings::default();
        assert_eq!(settings.timeout, Duration::from_secs(3));
        assert_eq!(settings.max_redirects, 3);
        assert!(settings.user_agent.starts_with("Mozilla/5.0"));
    }

    #[test]
    fn test_fetcher_keeps_settings() {
        let settings = FetchSettings {
            timeout: Duration::from_millis(250),
            ..FetchSettings::default()
        };
        let fetcher = HttpFetcher::new(settings.clone());
        assert_eq!(fetcher.settings(), &settings);
    }

    #[test]
    fn test_charset_of() {
        assert_eq!(charset_of("text/html; charset=UTF-8"), Some("utf-8".to_owned()));
        assert_eq!(
            charset_of("text/html;charset=\"ISO-8859-1\""),
            Some("iso-8859-1".to_owned())
        );
        assert_eq!(charset_of("text/html"), None);
    }

    #[test]
    fn test_decode_utf8_default() {
        let html = decode_charset("héllo".as_bytes(), None).unwrap();
        assert_eq!(html, "héllo");
    }

    #[test]
    fn test_decode_latin1() {
        let html = decode_charset(&[0x68, 0xE9], Some("text/html; charset=iso-8859-1")).unwrap();
        assert_eq!(html, "hé");
    }

    #[test]
    fn test_decode_unknown_charset_fails() {
        let err = decode_charset(b"x", Some("text/html; charset=x-bogus")).unwrap_err();
        assert!(matches!(err, FetchError::Charset(name) if name == "x-bogus"));
    }

    #[test]
    fn test_decompress_zlib_deflate() {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"<title>x</title>").unwrap();
        let raw = encoder.finish().unwrap();

        let out = decompress(raw, Some("deflate")).unwrap();
        assert_eq!(out, b"<title>x</title>");
    }

    #[test]
    fn test_decompress_raw_deflate() {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"<title>y</title>").unwrap();
        let raw = encoder.finish().unwrap();

        let out = decompress(raw, Some("Deflate")).unwrap();
        assert_eq!(out, b"<title>y</title>");
    }

    #[test]
    fn test_decompress_passthrough() {
        let out = decompress(b"plain".to_vec(), None).unwrap();
        assert_eq!(out, b"plain");
    }

    #[test]
    fn test_strip_fragment() {
        assert_eq!(strip_fragment("https://a.example/p#top"), "https://a.example/p");
        assert_eq!(strip_fragment("https://a.example/p"), "https://a.example/p");
    }
}
