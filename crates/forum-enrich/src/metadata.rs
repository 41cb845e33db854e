//! Page title and Open Graph metadata extraction.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").unwrap());

static META_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<meta\b([^>]*)>").unwrap());

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)([a-z_:-]+)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#).unwrap()
});

/// Metadata found in a page's `<head>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    /// Text of the `<title>` element.
    pub title: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub og_image: Option<String>,
    pub og_site_name: Option<String>,
}

impl PageMetadata {
    /// Extract metadata from page markup. Values are entity-decoded and
    /// trimmed; empty values count as absent.
    #[must_use]
    pub fn from_html(html: &str) -> Self {
        let title = TITLE_RE
            .captures(html)
            .and_then(|c| c.get(1))
            .and_then(|m| clean(m.as_str()));

        let mut properties: HashMap<String, String> = HashMap::new();
        for meta in META_RE.captures_iter(html) {
            let attrs = parse_attributes(&meta[1]);
            let Some(property) = attrs.get("property").or_else(|| attrs.get("name")) else {
                continue;
            };
            let Some(content) = attrs.get("content").and_then(|c| clean(c)) else {
                continue;
            };
            properties
                .entry(property.to_ascii_lowercase())
                .or_insert(content);
        }

        Self {
            title,
            og_title: properties.remove("og:title"),
            og_description: properties.remove("og:description"),
            og_image: properties.remove("og:image"),
            og_site_name: properties.remove("og:site_name"),
        }
    }

    /// Best available title: Open Graph title, then `<title>`.
    pub fn best_title(&self) -> Option<&str> {
        self.og_title.as_deref().or(self.title.as_deref())
    }
}

fn parse_attributes(source: &str) -> HashMap<String, String> {
    ATTR_RE
        .captures_iter(source)
        .filter_map(|c| {
            let name = c.get(1)?.as_str().to_ascii_lowercase();
            let value = c.get(2).or_else(|| c.get(3)).or_else(|| c.get(4))?;
            Some((name, value.as_str().to_owned()))
        })
        .collect()
}

fn clean(raw: &str) -> Option<String> {
    let decoded = html_escape::decode_html_entities(raw);
    let trimmed = decoded.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_title() {
        let meta = PageMetadata::from_html("<html><head><title> Hello &amp; bye </title></head>");
        assert_eq!(meta.title.as_deref(), Some("Hello & bye"));
        assert_eq!(meta.best_title(), Some("Hello & bye"));
    }

    #[test]
    fn test_open_graph_preferred() {
        let html = r#"
            <title>Plain</title>
            <meta property="og:title" content="Rich">
            <meta content='A description' property='og:description' />
            <meta property="og:image" content=" https://a.example/i.png ">
            <meta property="og:site_name" content="Example">
        "#;
        let meta = PageMetadata::from_html(html);
        assert_eq!(
            meta,
            PageMetadata {
                title: Some("Plain".to_owned()),
                og_title: Some("Rich".to_owned()),
                og_description: Some("A description".to_owned()),
                og_image: Some("https://a.example/i.png".to_owned()),
                og_site_name: Some("Example".to_owned()),
            }
        );
        assert_eq!(meta.best_title(), Some("Rich"));
    }

    #[test]
    fn test_empty_values_absent() {
        let html = r#"<title>  </title><meta property="og:title" content="">"#;
        assert_eq!(PageMetadata::from_html(html), PageMetadata::default());
    }

    #[test]
    fn test_first_meta_wins() {
        let html = r#"<meta property="og:title" content="One"><meta property="og:title" content="Two">"#;
        assert_eq!(PageMetadata::from_html(html).og_title.as_deref(), Some("One"));
    }

    #[test]
    fn test_unrelated_meta_ignored() {
        let html = r#"<meta charset="utf-8"><meta name="viewport" content="width=device-width">"#;
        assert_eq!(PageMetadata::from_html(html), PageMetadata::default());
    }
}
