//! Plain text backend.

use crate::backend::{RenderBackend, render_node};
use crate::node::TagNode;

/// Plain text render backend: drops every tag wrapper and joins children.
pub struct TextBackend;

impl RenderBackend for TextBackend {
    fn text(text: &str, out: &mut String) {
        out.push_str(text);
    }

    fn error(literal: &str, out: &mut String) {
        out.push_str(literal);
    }

    fn tag(node: &TagNode, out: &mut String) {
        for child in node.children() {
            render_node::<Self>(child, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::backend::RenderTarget;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    fn text(input: &str) -> String {
        parse(input).render(RenderTarget::Text)
    }

    #[test]
    fn test_tags_dropped() {
        assert_eq!(text("[b]bold[/b] and [url=https://a.example]link[/url]"), "bold and link");
    }

    #[test]
    fn test_img_has_no_text() {
        assert_eq!(text("see [img]https://a.example/p.png[/img]"), "see ");
    }

    #[test]
    fn test_code_content_kept() {
        assert_eq!(text("[code][b]x[/b][/code]"), "[b]x[/b]");
    }

    #[test]
    fn test_matched_tag_brackets_never_appear() {
        let rendered = text("[quote][b]a[/b][i]b[/i][u]c[/u][s]d[/s][/quote][ol][li]e[/li][/ol]");
        assert_eq!(rendered, "abcde");
        assert!(!rendered.contains('['));
        assert!(!rendered.contains(']'));
    }
}
