//! Pre- and post-processing passes over message text.
//!
//! Each pass is a pure function; the pipeline decides when they run.

use std::borrow::Cow;
use std::sync::LazyLock;

use html_escape::decode_html_entities;
use regex::{Captures, Regex};

use crate::error::PipelineError;
use crate::smiley::{PLACEHOLDER_CLOSE, PLACEHOLDER_OPEN};

/// Legacy smiley code rewritten to the code used by the smiley table.
const LEGACY_HEART: &str = "*heartsmiley*";

static QUOTE_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[quote\]\n+").unwrap());

static QUOTE_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n*\[/quote\]\n*").unwrap());

static CODE_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(/?)code(?:[=\s][^\]]*)?\]").unwrap());

static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<a(\s[^>]*)?>").unwrap());

static TARGET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\starget\s*=").unwrap());

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>\n]+>|\[[^\]\n]+\]").unwrap());

/// Normalize a raw body before tokenizing.
///
/// Removes placeholder delimiters, normalizes line endings, trims, drops
/// blank lines hugging quote tags and maps the legacy heart code. Text
/// inside `[code]` blocks is left as written.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyBody`] if nothing is left after trimming.
pub fn pre_clean(raw: &str) -> Result<String, PipelineError> {
    let body: String = raw
        .chars()
        .filter(|c| *c != PLACEHOLDER_OPEN && *c != PLACEHOLDER_CLOSE)
        .collect();
    let body = body.replace("\r\n", "\n");
    let body = body.trim();
    if body.is_empty() {
        return Err(PipelineError::EmptyBody);
    }

    Ok(outside_code(body, |text| {
        let text = QUOTE_OPEN_RE.replace_all(text, "[quote]");
        let text = QUOTE_CLOSE_RE.replace_all(&text, "[/quote]");
        text.replace(LEGACY_HEART, "<3")
    }))
}

/// Apply `rewrite` to the parts of `body` outside `[code]` blocks.
///
/// Blocks nest by name. An unclosed block runs to the end of the body.
fn outside_code(body: &str, rewrite: impl Fn(&str) -> String) -> String {
    let mut out = String::with_capacity(body.len());
    let mut depth = 0usize;
    let mut last = 0;

    for caps in CODE_TAG_RE.captures_iter(body) {
        let (Some(tag), Some(slash)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if slash.is_empty() {
            if depth == 0 {
                out.push_str(&rewrite(&body[last..tag.start()]));
                last = tag.start();
            }
            depth += 1;
        } else if depth > 0 {
            depth -= 1;
            if depth == 0 {
                out.push_str(&body[last..tag.end()]);
                last = tag.end();
            }
        }
    }

    if depth == 0 {
        out.push_str(&rewrite(&body[last..]));
    } else {
        out.push_str(&body[last..]);
    }
    out
}

/// Make every anchor open in a new window.
pub fn force_new_window(html: &str) -> Cow<'_, str> {
    ANCHOR_RE.replace_all(html, |caps: &Captures<'_>| {
        let attrs = caps.get(1).map_or("", |m| m.as_str());
        if TARGET_RE.is_match(attrs) {
            caps[0].to_owned()
        } else {
            format!(r#"<a target="_blank"{attrs}>"#)
        }
    })
}

/// Plain-text preview of display HTML.
///
/// Quote blocks and markup are removed and entities decoded. Single-line
/// previews keep only the first line. Text longer than `limit` characters
/// is cut to `limit` characters followed by `…`; an empty preview becomes
/// `empty_text`.
pub fn preview(html: &str, limit: usize, multiline: bool, empty_text: &str) -> String {
    let without_quotes = strip_quotes(html);
    let without_tags = TAG_RE.replace_all(&without_quotes, "");
    let decoded = decode_html_entities(&without_tags);

    let mut text = decoded.trim();
    if !multiline {
        text = text.lines().next().unwrap_or_default().trim_end();
    }

    if text.is_empty() {
        return empty_text.to_owned();
    }

    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_owned(),
    }
}

/// Remove `<blockquote>` elements, nested ones included, along with the
/// newlines that follow them.
fn strip_quotes(html: &str) -> String {
    const OPEN: &str = "<blockquote";
    const CLOSE: &str = "</blockquote>";

    let mut out = String::with_capacity(html.len());
    let mut depth = 0usize;
    let mut rest = html;

    loop {
        let open = rest.find(OPEN);
        let close = rest.find(CLOSE);
        match (open, close) {
            (Some(o), c) if c.is_none_or(|c| o < c) => {
                if depth == 0 {
                    out.push_str(&rest[..o]);
                }
                depth += 1;
                rest = &rest[o + OPEN.len()..];
            }
            (_, Some(c)) => {
                if depth == 0 {
                    out.push_str(&rest[..c]);
                } else {
                    depth -= 1;
                }
                rest = &rest[c + CLOSE.len()..];
                if depth == 0 {
                    rest = rest.trim_start_matches('\n');
                }
            }
            _ => {
                if depth == 0 {
                    out.push_str(rest);
                }
                break;
            }
        }
    }

    out
}
