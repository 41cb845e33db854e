//! Tag grammar, syntax tree and renderers for forum post markup.
//!
//! This crate turns the bracket markup users type into posts
//! (`[b]bold[/b]`, `[url=https://example.com]link[/url]`) into an immutable
//! [`Node`] tree that can be rendered three ways.
//!
//! # Architecture
//!
//! - [`TagGrammar`]: the table of recognized tags and their attribute rules.
//!   [`TagGrammar::forum`] is the built-in table.
//! - [`Parser`]: scans raw text against a grammar. Malformed input never
//!   fails; unmatched constructs degrade to literal text.
//! - [`Node`]: the syntax tree. Rendering is delegated to a
//!   [`RenderBackend`]: [`HtmlBackend`], [`MarkupBackend`], [`TextBackend`].
//! - [`Visitor`]: tree-to-tree rewrites returning replacement nodes.
//!
//! # Example
//!
//! ```
//! use forum_markup::{RenderTarget, parse};
//!
//! let tree = parse("[b]Bold[/b] text");
//! assert_eq!(
//!     tree.render(RenderTarget::Html),
//!     r#"<span class="bbc-bold">Bold</span> text"#
//! );
//! assert_eq!(tree.render(RenderTarget::Text), "Bold text");
//! ```

mod backend;
mod grammar;
mod html;
mod markup;
mod node;
mod parser;
mod template;
mod text;
mod visitor;

pub use backend::{RenderBackend, RenderTarget, render_node};
pub use grammar::{
    AttributeBinding, AttributeDefault, AttributeDefinition, GrammarError, TagDefinition,
    TagGrammar,
};
pub use html::{HtmlBackend, escape_attribute, escape_html};
pub use markup::MarkupBackend;
pub use node::{AttributeKey, ErrorNode, Node, SequenceNode, TagNode, TextNode, TreeError};
pub use parser::{MAX_NESTING_DEPTH, Parser, parse};
pub use text::TextBackend;
pub use visitor::{Visitor, walk_sequence, walk_tag};
