//! Tree-to-tree rewrites.
//!
//! A [`Visitor`] receives the concrete node variant and returns a
//! replacement node. The default methods copy leaves and rebuild containers
//! from their visited children, so an implementation overrides only the
//! variants it rewrites.
//!
//! # Example
//!
//! ```
//! use forum_markup::{Node, RenderTarget, TextNode, Visitor, parse};
//!
//! struct Shout;
//!
//! impl Visitor for Shout {
//!     fn visit_text(&mut self, node: &TextNode) -> Node {
//!         Node::text(node.text().to_uppercase())
//!     }
//! }
//!
//! let tree = parse("[b]hey[/b] you").accept(&mut Shout);
//! assert_eq!(tree.render(RenderTarget::Markup), "[b]HEY[/b] YOU");
//! ```

use crate::node::{ErrorNode, Node, SequenceNode, TagNode, TextNode};

/// Visitor over the closed set of node variants.
pub trait Visitor {
    fn visit_text(&mut self, node: &TextNode) -> Node {
        Node::Text(node.clone())
    }

    fn visit_error(&mut self, node: &ErrorNode) -> Node {
        Node::Error(node.clone())
    }

    fn visit_sequence(&mut self, node: &SequenceNode) -> Node {
        walk_sequence(self, node)
    }

    fn visit_tag(&mut self, node: &TagNode) -> Node {
        walk_tag(self, node)
    }
}

/// Rebuild a sequence from its visited children.
pub fn walk_sequence<V: Visitor + ?Sized>(visitor: &mut V, node: &SequenceNode) -> Node {
    Node::sequence(node.children().iter().map(|c| c.accept(visitor)).collect())
}

/// Rebuild a tag from its visited children, keeping definition and bindings.
pub fn walk_tag<V: Visitor + ?Sized>(visitor: &mut V, node: &TagNode) -> Node {
    if node.children().is_empty() {
        return Node::Tag(node.clone());
    }
    let children = node.children().iter().map(|c| c.accept(visitor)).collect();
    Node::Tag(node.rebuild(children))
}
