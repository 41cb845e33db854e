//! URL enrichment.
//!
//! Bare URLs in rendered HTML become anchors titled from the remote page.
//! Depending on the link, a card is collected alongside:
//!
//! | Link                          | Fetched | Card                        |
//! |-------------------------------|---------|-----------------------------|
//! | YouTube watch / short link    | yes     | embedded player             |
//! | `.gifv` / `.webm` / `.mp4`    | no      | looping `<video>` player    |
//! | anything else                 | yes     | Open Graph preview, if any  |
//!
//! Only the first [`DEFAULT_MAX_MATCHES`] URLs (or the configured cap) are
//! touched. The rest stay as plain text and never reach the network. URLs
//! inside tags or existing anchors are not text and are skipped.

use std::borrow::Cow;
use std::fmt::Write as _;
use std::sync::LazyLock;

use html_escape::{decode_html_entities, encode_double_quoted_attribute, encode_text};
use regex::Regex;

use crate::fetch::{PageFetcher, strip_fragment};
use crate::metadata::PageMetadata;
use crate::spans::MarkupSpans;

/// Default number of URLs enriched per message.
pub const DEFAULT_MAX_MATCHES: usize = 10;

/// A URL preceded by whitespace or line start. Stops at `<` so a URL right
/// before a closing tag does not swallow it.
static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(?:^|\s)(https?://[^\s<]+)").unwrap());

static YOUTUBE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?://)?(?:www\.)?(?:youtube\.com/watch\?[^?]*v=|youtu\.be/)([\w-]+)")
        .unwrap()
});

static VIDEO_FILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(https?://[^?#]+)\.(?:gifv|webm|mp4)(?:[?#].*)?$").unwrap()
});

/// Classification of a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkKind {
    /// YouTube video with its id.
    YouTube { video_id: String },
    /// Direct video file; `stem` is the URL without its extension.
    VideoFile { stem: String },
    /// Any other page.
    Page,
}

impl LinkKind {
    #[must_use]
    pub fn classify(url: &str) -> Self {
        if let Some(caps) = YOUTUBE_RE.captures(url) {
            return Self::YouTube {
                video_id: caps[1].to_owned(),
            };
        }
        if let Some(caps) = VIDEO_FILE_RE.captures(url) {
            return Self::VideoFile {
                stem: caps[1].to_owned(),
            };
        }
        Self::Page
    }
}

/// What was learned about a linked page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePage {
    pub url: String,
    /// Page title, or the URL itself when the page could not be loaded.
    pub title: String,
    /// Open Graph preview card.
    pub card: Option<String>,
}

impl RemotePage {
    /// Load title and preview card for `url`.
    ///
    /// Never fails: fetch errors are logged and degrade to the URL as title
    /// with no card.
    pub fn load(url: &str, fetcher: &dyn PageFetcher) -> Self {
        match fetcher.fetch(strip_fragment(url)) {
            Ok(page) => Self::from_metadata(url, &PageMetadata::from_html(&page.html)),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Remote page fetch failed");
                Self::untitled(url)
            }
        }
    }

    fn untitled(url: &str) -> Self {
        Self {
            url: url.to_owned(),
            title: url.to_owned(),
            card: None,
        }
    }

    fn from_metadata(url: &str, meta: &PageMetadata) -> Self {
        let title = meta.best_title().unwrap_or(url).to_owned();
        let card = meta
            .og_description
            .as_deref()
            .map(|description| preview_card(url, &title, description, meta));
        Self {
            url: url.to_owned(),
            title,
            card,
        }
    }
}

/// Result of enriching one message body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkEnrichment {
    /// Body with enriched URLs replaced by anchors.
    pub html: String,
    /// Cards in discovery order.
    pub cards: Vec<String>,
    /// URLs enriched (at most the cap).
    pub enriched: usize,
}

/// Replace up to `max_matches` bare URLs in `html` with titled anchors.
pub fn enrich_links(html: &str, fetcher: &dyn PageFetcher, max_matches: usize) -> LinkEnrichment {
    let mut out = String::with_capacity(html.len());
    let mut cards = Vec::new();
    let mut last = 0;
    let mut enriched = 0;

    let markup = MarkupSpans::tags_and_anchors(html);
    let mut urls = URL_RE
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .filter(|m| !markup.contains(m.start()));

    for m in urls.by_ref().take(max_matches) {
        out.push_str(&html[last..m.start()]);
        last = m.end();
        enriched += 1;

        let url: Cow<'_, str> = decode_html_entities(m.as_str());
        let kind = LinkKind::classify(&url);
        tracing::debug!(url = %url, kind = ?kind, "Enriching link");

        let (title, card) = match kind {
            LinkKind::VideoFile { stem } => (url.to_string(), Some(video_card(&stem))),
            LinkKind::YouTube { video_id } => {
                let page = RemotePage::load(&url, fetcher);
                (page.title, Some(youtube_card(&video_id)))
            }
            LinkKind::Page => {
                let page = RemotePage::load(&url, fetcher);
                (page.title, page.card)
            }
        };

        push_anchor(&url, &title, &mut out);
        cards.extend(card);
    }

    out.push_str(&html[last..]);

    if urls.next().is_some() {
        tracing::info!(max_matches, "URL cap reached, remaining links left as text");
    }

    LinkEnrichment {
        html: out,
        cards,
        enriched,
    }
}

fn push_anchor(url: &str, title: &str, out: &mut String) {
    let _ = write!(
        out,
        r#"<a target="_blank" href="{}">{}</a>"#,
        encode_double_quoted_attribute(url),
        encode_text(title)
    );
}

fn youtube_card(video_id: &str) -> String {
    format!(
        r#"<div class="embedded-video"><iframe type="text/html" title="YouTube video player" class="youtubePlayer" src="https://www.youtube.com/embed/{}" frameborder="0" allowfullscreen="1"></iframe></div>"#,
        encode_double_quoted_attribute(video_id)
    )
}

fn video_card(stem: &str) -> String {
    let stem = encode_double_quoted_attribute(stem);
    format!(
        r#"<div class="embedded-video"><video autoplay loop><source src="{stem}.webm" type="video/webm" /><source src="{stem}.mp4" type="video/mp4" /></video></div>"#
    )
}

fn preview_card(url: &str, title: &str, description: &str, meta: &PageMetadata) -> String {
    let href = encode_double_quoted_attribute(url);
    let mut card =
        String::from(r#"<blockquote class="card pointer hover-highlight" clickable-link-parent>"#);

    if let Some(image) = &meta.og_image {
        let _ = write!(
            card,
            r#"<div class="card-image"><img src="{}" /></div>"#,
            encode_double_quoted_attribute(image)
        );
    }

    let site = meta.og_site_name.as_deref().unwrap_or("Direct Link");
    let _ = write!(
        card,
        r#"<div><p class="card-title"><a target="_blank" href="{href}">{}</a></p><p class="card-description">{}</p><p class="card-link"><a target="_blank" href="{href}">[{}]</a></p></div><br class="clear" /></blockquote>"#,
        encode_text(title),
        encode_text(description),
        encode_text(site)
    );
    card
}
