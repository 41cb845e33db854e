//! Byte ranges of rendered HTML that text scanners must leave alone.
//!
//! URLs and mentions are matched with regexes over the whole body. A match
//! that starts inside a tag (an attribute value, say) or inside an existing
//! anchor is not text and must not be rewritten or looked up.

use std::ops::Range;

/// Sorted, non-overlapping byte ranges of an HTML string.
#[derive(Debug, Default)]
pub(crate) struct MarkupSpans {
    ranges: Vec<Range<usize>>,
}

impl MarkupSpans {
    /// Every tag, from `<` through its closing `>`.
    pub(crate) fn tags(html: &str) -> Self {
        Self {
            ranges: tag_ranges(html),
        }
    }

    /// Every tag, plus each `<a>` element as a whole. An anchor that is never
    /// closed runs to the end of the input.
    pub(crate) fn tags_and_anchors(html: &str) -> Self {
        let mut ranges = Vec::new();
        let mut anchor_start = 0;
        let mut depth = 0usize;

        for tag in tag_ranges(html) {
            match anchor_edge(&html[tag.clone()]) {
                Some(AnchorEdge::Open) => {
                    if depth == 0 {
                        anchor_start = tag.start;
                    }
                    depth += 1;
                }
                Some(AnchorEdge::Close) if depth > 0 => {
                    depth -= 1;
                    if depth == 0 {
                        ranges.push(anchor_start..tag.end);
                    }
                }
                _ if depth == 0 => ranges.push(tag),
                _ => {}
            }
        }
        if depth > 0 {
            ranges.push(anchor_start..html.len());
        }

        Self { ranges }
    }

    /// Whether byte offset `pos` falls inside one of the ranges.
    pub(crate) fn contains(&self, pos: usize) -> bool {
        let i = self.ranges.partition_point(|r| r.end <= pos);
        self.ranges.get(i).is_some_and(|r| r.start <= pos)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AnchorEdge {
    Open,
    Close,
}

/// Classify a whole tag such as `<a href="x">` or `</A>`.
fn anchor_edge(tag: &str) -> Option<AnchorEdge> {
    let inner = tag.strip_prefix('<')?;
    let (edge, rest) = match inner.strip_prefix('/') {
        Some(rest) => (AnchorEdge::Close, rest),
        None => (AnchorEdge::Open, inner),
    };

    let mut chars = rest.chars();
    let named_a = chars.next().is_some_and(|c| c.eq_ignore_ascii_case(&'a'));
    let name_ends = chars
        .next()
        .is_none_or(|c| c.is_ascii_whitespace() || c == '>');
    (named_a && name_ends).then_some(edge)
}

/// Byte range of every tag in `html`.
///
/// A `>` inside a quoted attribute value does not end the tag. A tag that is
/// never closed runs to the end of the input.
fn tag_ranges(html: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = None;
    let mut quote = None;
    let mut after_equals = false;

    for (i, &b) in html.as_bytes().iter().enumerate() {
        let Some(open) = start else {
            if b == b'<' {
                start = Some(i);
                after_equals = false;
            }
            continue;
        };

        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            continue;
        }

        match b {
            b'"' | b'\'' if after_equals => quote = Some(b),
            b'>' => {
                ranges.push(open..i + 1);
                start = None;
            }
            _ => {}
        }
        if !b.is_ascii_whitespace() {
            after_equals = b == b'=';
        }
    }

    if let Some(open) = start {
        ranges.push(open..html.len());
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tag_ranges() {
        let html = r#"a <b>x</b> <img src="p>q" />"#;
        assert_eq!(tag_ranges(html), vec![2..5, 6..10, 11..28]);
    }

    #[test]
    fn test_unterminated_tag_runs_to_end() {
        assert_eq!(tag_ranges("x <img src=\"a"), vec![2..13]);
    }

    #[test]
    fn test_apostrophe_in_text_is_not_a_quote() {
        let html = "<p class=x don't>t</p>";
        assert_eq!(tag_ranges(html), vec![0..17, 18..22]);
    }

    #[test]
    fn test_contains_tag_interiors_only() {
        let html = r#"see <img src="a https://b" /> now"#;
        let spans = MarkupSpans::tags(html);
        assert!(!spans.contains(0));
        assert!(spans.contains(html.find("https").unwrap()));
        assert!(!spans.contains(html.find("now").unwrap()));
    }

    #[test]
    fn test_anchor_contents_covered() {
        let html = r#"x <a href="h"><b>in</b> y</a> out <abbr>z</abbr>"#;
        let spans = MarkupSpans::tags_and_anchors(html);
        assert!(spans.contains(html.find("in").unwrap()));
        assert!(spans.contains(html.find(" y").unwrap()));
        assert!(!spans.contains(html.find("out").unwrap()));
        assert!(!spans.contains(html.find("z<").unwrap()));
        assert!(spans.contains(html.find("<abbr>").unwrap()));
    }

    #[test]
    fn test_unclosed_anchor_runs_to_end() {
        let html = "a <A HREF=h>b c";
        let spans = MarkupSpans::tags_and_anchors(html);
        assert!(!spans.contains(0));
        assert!(spans.contains(html.len() - 1));
    }

    #[test]
    fn test_anchor_edge() {
        assert_eq!(anchor_edge(r#"<a href="x">"#), Some(AnchorEdge::Open));
        assert_eq!(anchor_edge("<a>"), Some(AnchorEdge::Open));
        assert_eq!(anchor_edge("</a>"), Some(AnchorEdge::Close));
        assert_eq!(anchor_edge("<abbr>"), None);
        assert_eq!(anchor_edge("<b>"), None);
    }
}
