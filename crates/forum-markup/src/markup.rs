//! Canonical markup backend.
//!
//! Reproduces `[name=value key=value]...[/name]` from the tree. Only
//! attributes bound in the source are written back; defaults are not.

use crate::backend::{RenderBackend, render_node};
use crate::node::{AttributeKey, TagNode};

/// Bracket markup render backend.
pub struct MarkupBackend;

impl RenderBackend for MarkupBackend {
    fn text(text: &str, out: &mut String) {
        out.push_str(text);
    }

    fn error(literal: &str, out: &mut String) {
        out.push_str(literal);
    }

    fn tag(node: &TagNode, out: &mut String) {
        out.push('[');
        out.push_str(node.name());

        if let Some(value) = node.binding(&AttributeKey::OwnValue) {
            out.push('=');
            push_value(value, out);
        }
        for (key, value) in node.bindings() {
            if let AttributeKey::Named(name) = key {
                out.push(' ');
                out.push_str(name);
                out.push('=');
                push_value(value, out);
            }
        }
        out.push(']');

        if let Some(content) = node.content_value() {
            out.push_str(content);
        } else {
            for child in node.children() {
                render_node::<Self>(child, out);
            }
        }

        out.push_str("[/");
        out.push_str(node.name());
        out.push(']');
    }
}

/// Write an attribute value, quoting it when it would not scan back as one.
fn push_value(value: &str, out: &mut String) {
    let needs_quotes = value.is_empty()
        || value.starts_with(['"', '\''])
        || value.contains(|c: char| c.is_whitespace() || c == ']');
    if !needs_quotes {
        out.push_str(value);
        return;
    }

    let quote = if value.contains('"') { '\'' } else { '"' };
    out.push(quote);
    out.push_str(value);
    out.push(quote);
}
