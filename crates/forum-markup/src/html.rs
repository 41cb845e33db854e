//! HTML backend.
//!
//! Tags render through their definition's templates. Text is escaped so
//! user input can never open an element.

use std::borrow::Cow;

use crate::backend::{RenderBackend, render_node};
use crate::node::TagNode;
use crate::template::{CONTENT_PLACEHOLDER, expand};

/// Escape `&`, `<` and `>` for use in element content.
pub fn escape_html(text: &str) -> Cow<'_, str> {
    html_escape::encode_text(text)
}

/// Escape a value for use inside a double-quoted attribute.
pub fn escape_attribute(value: &str) -> Cow<'_, str> {
    html_escape::encode_double_quoted_attribute(value)
}

/// HTML render backend.
pub struct HtmlBackend;

impl RenderBackend for HtmlBackend {
    fn text(text: &str, out: &mut String) {
        out.push_str(&escape_html(text));
    }

    fn error(literal: &str, out: &mut String) {
        out.push_str(&escape_html(literal));
    }

    fn tag(node: &TagNode, out: &mut String) {
        let definition = node.definition();
        expand_template(node, definition.open_template(), out);

        if !definition.is_content_as_attribute() {
            if definition.allows_nested_tags() {
                for child in node.children() {
                    render_node::<Self>(child, out);
                }
            } else {
                out.push_str(&escape_html(&node.content_text()));
            }
        }

        expand_template(node, definition.close_template(), out);
    }
}

fn expand_template(node: &TagNode, template: &str, out: &mut String) {
    if template.is_empty() {
        return;
    }
    expand(
        template,
        |name| {
            let value = if name == CONTENT_PLACEHOLDER {
                Some(node.content_text())
            } else {
                node.attribute(name)
            };
            value.map(|v| Cow::Owned(escape_attribute(&v).into_owned()))
        },
        out,
    );
}

#[cfg(test)]
mod tests {
    use crate::backend::RenderTarget;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    fn html(input: &str) -> String {
        parse(input).render(RenderTarget::Html)
    }

    #[test]
    fn test_plain_text_is_escaped() {
        assert_eq!(html("a < b & c > d"), "a &lt; b &amp; c &gt; d");
    }

    #[test]
    fn test_bold() {
        assert_eq!(html("[b]x[/b]"), r#"<span class="bbc-bold">x</span>"#);
    }

    #[test]
    fn test_nested_tags() {
        assert_eq!(
            html("[b][i]x[/i][/b]"),
            r#"<span class="bbc-bold"><span class="bbc-italic">x</span></span>"#
        );
    }

    #[test]
    fn test_code_renders_content_verbatim() {
        assert_eq!(
            html("[code][b]<x>[/b][/code]"),
            r#"<div class="bbc-code">[b]&lt;x&gt;[/b]</div>"#
        );
    }

    #[test]
    fn test_img_uses_content_as_src() {
        assert_eq!(
            html("[img]https://a.example/p.png[/img]"),
            r#"<img class="bbc-image" src="https://a.example/p.png" />"#
        );
    }

    #[test]
    fn test_url_with_own_value() {
        assert_eq!(
            html("[url=https://a.example]site[/url]"),
            r#"<a class="bbc-anchor" href="https://a.example" target="_blank">site</a>"#
        );
    }

    #[test]
    fn test_url_without_value_links_content() {
        assert_eq!(
            html("[url]https://a.example[/url]"),
            r#"<a class="bbc-anchor" href="https://a.example" target="_blank">https://a.example</a>"#
        );
    }

    #[test]
    fn test_attribute_value_is_escaped() {
        assert_eq!(
            html(r#"[color='red" onclick="x']y[/color]"#),
            r#"<span style="color: red&quot; onclick=&quot;x;">y</span>"#
        );
    }

    #[test]
    fn test_color_named_attribute() {
        assert_eq!(
            html("[color color=blue]y[/color]"),
            r#"<span style="color: blue;">y</span>"#
        );
    }

    #[test]
    fn test_ordered_list_closes_with_ol() {
        assert_eq!(
            html("[ol][li]a[/li][/ol]"),
            r#"<ol class="bbc-list"><li class="bbc-list-item">a</li></ol>"#
        );
    }

    #[test]
    fn test_error_node_renders_escaped_literal() {
        assert_eq!(html("[b]<bold>"), "[b]&lt;bold&gt;");
    }
}
