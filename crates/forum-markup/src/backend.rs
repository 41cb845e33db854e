//! Render backend abstraction.
//!
//! Sequences are rendered generically by concatenating children. Text,
//! tags and error nodes are format-specific and delegated to a backend.

use crate::node::{Node, TagNode};

/// Output format selector for [`Node::render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderTarget {
    /// Display HTML.
    Html,
    /// Canonical bracket markup.
    Markup,
    /// Plain text with all tag wrappers dropped.
    Text,
}

/// Format-specific rendering of the leaf and tag variants.
pub trait RenderBackend {
    /// Render literal text.
    fn text(text: &str, out: &mut String);

    /// Render a construct the parser could not validate.
    ///
    /// Error nodes render as their source text in every format.
    fn error(literal: &str, out: &mut String);

    /// Render a tag and its content. Use [`render_node`] for children.
    fn tag(node: &TagNode, out: &mut String);
}

/// Render a node and its descendants with backend `B`.
pub fn render_node<B: RenderBackend>(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => B::text(text.text(), out),
        Node::Error(error) => B::error(error.literal(), out),
        Node::Tag(tag) => B::tag(tag, out),
        Node::Sequence(seq) => {
            for child in seq.children() {
                render_node::<B>(child, out);
            }
        }
    }
}
