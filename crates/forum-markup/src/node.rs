//! Syntax tree node variants.
//!
//! Nodes are immutable: edits go through [`Node::with_children`] or a
//! [`Visitor`](crate::Visitor) and produce new nodes. Structural equality is
//! the [`PartialEq`] implementation: variant, attached data and each child
//! are compared in order.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::backend::{RenderBackend, RenderTarget, render_node};
use crate::grammar::{AttributeBinding, AttributeDefault, TagDefinition};
use crate::html::HtmlBackend;
use crate::markup::MarkupBackend;
use crate::text::TextBackend;
use crate::visitor::Visitor;

/// Tree edit error.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TreeError {
    /// The node variant (or tag) cannot have children.
    #[error("{0} nodes cannot have children")]
    ChildrenNotAllowed(String),
}

/// Node of a parsed post body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Literal text.
    Text(TextNode),
    /// A recognized tag with its bound attributes.
    Tag(TagNode),
    /// Ordered concatenation of children. Used as the tree root.
    Sequence(SequenceNode),
    /// A construct the parser could not validate, kept as its source text.
    Error(ErrorNode),
}

impl Node {
    /// Create a text node.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(TextNode { text: text.into() })
    }

    /// Create a sequence node.
    #[must_use]
    pub fn sequence(children: Vec<Node>) -> Self {
        Self::Sequence(SequenceNode { children })
    }

    /// Create an error node holding the original source text.
    #[must_use]
    pub fn error(literal: impl Into<String>) -> Self {
        Self::Error(ErrorNode {
            literal: literal.into(),
        })
    }

    /// Child nodes. Empty for text and error nodes.
    pub fn children(&self) -> &[Node] {
        match self {
            Self::Tag(tag) => &tag.children,
            Self::Sequence(seq) => &seq.children,
            Self::Text(_) | Self::Error(_) => &[],
        }
    }

    /// Return a copy of this node with its children replaced.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::ChildrenNotAllowed`] when non-empty children are
    /// given to a text node, an error node or a content-as-attribute tag.
    pub fn with_children(&self, children: Vec<Node>) -> Result<Node, TreeError> {
        match self {
            Self::Sequence(_) => Ok(Self::sequence(children)),
            Self::Tag(tag) => TagNode::new(
                Arc::clone(&tag.definition),
                tag.bindings.clone(),
                children,
            )
            .map(Self::Tag),
            Self::Text(_) if children.is_empty() => Ok(self.clone()),
            Self::Error(_) if children.is_empty() => Ok(self.clone()),
            Self::Text(_) => Err(TreeError::ChildrenNotAllowed("text".to_owned())),
            Self::Error(_) => Err(TreeError::ChildrenNotAllowed("error".to_owned())),
        }
    }

    /// Dispatch to the visitor method for this variant and return its result.
    #[must_use]
    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) -> Node {
        match self {
            Self::Text(node) => visitor.visit_text(node),
            Self::Tag(node) => visitor.visit_tag(node),
            Self::Sequence(node) => visitor.visit_sequence(node),
            Self::Error(node) => visitor.visit_error(node),
        }
    }

    /// Render to one of the three output formats.
    #[must_use]
    pub fn render(&self, target: RenderTarget) -> String {
        match target {
            RenderTarget::Html => self.render_with::<HtmlBackend>(),
            RenderTarget::Markup => self.render_with::<MarkupBackend>(),
            RenderTarget::Text => self.render_with::<TextBackend>(),
        }
    }

    /// Render with an explicit backend.
    #[must_use]
    pub fn render_with<B: RenderBackend>(&self) -> String {
        let mut out = String::new();
        render_node::<B>(self, &mut out);
        out
    }
}

impl From<TagNode> for Node {
    fn from(tag: TagNode) -> Self {
        Self::Tag(tag)
    }
}

/// Literal text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextNode {
    text: String,
}

impl TextNode {
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Source text of a construct that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorNode {
    literal: String,
}

impl ErrorNode {
    pub fn literal(&self) -> &str {
        &self.literal
    }
}

/// Ordered list of sibling nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceNode {
    children: Vec<Node>,
}

impl SequenceNode {
    pub fn children(&self) -> &[Node] {
        &self.children
    }
}

/// Where an attribute value came from in the opening construct.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttributeKey {
    /// `[tag=value]`
    OwnValue,
    /// `[tag name=value]`
    Named(String),
    /// The content of a content-as-attribute tag.
    Content,
}

/// A recognized tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagNode {
    definition: Arc<TagDefinition>,
    bindings: Vec<(AttributeKey, String)>,
    children: Vec<Node>,
}

impl TagNode {
    /// Create a tag node from its definition, explicit attribute bindings
    /// (in source order) and children.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::ChildrenNotAllowed`] if the tag takes its content
    /// as an attribute and `children` is not empty.
    pub fn new(
        definition: Arc<TagDefinition>,
        bindings: Vec<(AttributeKey, String)>,
        children: Vec<Node>,
    ) -> Result<Self, TreeError> {
        if definition.is_content_as_attribute() && !children.is_empty() {
            return Err(TreeError::ChildrenNotAllowed(format!(
                "[{}]",
                definition.name()
            )));
        }
        Ok(Self {
            definition,
            bindings,
            children,
        })
    }

    /// Rebuild with new children, skipping validation.
    ///
    /// Callers guarantee `children` is empty for content-as-attribute tags.
    pub(crate) fn rebuild(&self, children: Vec<Node>) -> Self {
        Self {
            definition: Arc::clone(&self.definition),
            bindings: self.bindings.clone(),
            children,
        }
    }

    pub fn definition(&self) -> &Arc<TagDefinition> {
        &self.definition
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Attribute values as written in the source, in source order.
    pub fn bindings(&self) -> &[(AttributeKey, String)] {
        &self.bindings
    }

    /// Explicit value for one binding.
    pub fn binding(&self, key: &AttributeKey) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Content of a content-as-attribute tag.
    pub fn content_value(&self) -> Option<&str> {
        self.binding(&AttributeKey::Content)
    }

    /// Plain-text content: the content attribute, or the children rendered
    /// as text.
    pub fn content_text(&self) -> Cow<'_, str> {
        match self.content_value() {
            Some(value) => Cow::Borrowed(value),
            None => Cow::Owned(
                self.children
                    .iter()
                    .map(|c| c.render(RenderTarget::Text))
                    .collect(),
            ),
        }
    }

    /// Resolve an attribute by id, applying the declared default when the
    /// source did not bind it.
    ///
    /// Returns `None` if the tag declares no attribute with this id.
    pub fn attribute(&self, id: &str) -> Option<Cow<'_, str>> {
        let mut default = None;
        for attribute in self.definition.attributes().iter().filter(|a| a.id() == id) {
            let key = match attribute.binding() {
                AttributeBinding::OwnValue => AttributeKey::OwnValue,
                AttributeBinding::Named(name) => AttributeKey::Named(name.clone()),
            };
            if let Some(value) = self.binding(&key) {
                return Some(Cow::Borrowed(value));
            }
            if default.is_none() {
                default = Some(attribute.default());
            }
        }

        default.map(|d| match d {
            AttributeDefault::Value(value) => Cow::Borrowed(value.as_str()),
            AttributeDefault::Content => self.content_text(),
        })
    }

    /// All declared attributes, resolved.
    pub fn attributes(&self) -> BTreeMap<String, String> {
        self.definition
            .attributes()
            .iter()
            .filter_map(|a| {
                self.attribute(a.id())
                    .map(|value| (a.id().to_owned(), value.into_owned()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::TagGrammar;
    use pretty_assertions::assert_eq;

    fn tag(name: &str, bindings: Vec<(AttributeKey, String)>, children: Vec<Node>) -> Node {
        let definition = Arc::clone(TagGrammar::forum().get(name).unwrap());
        Node::Tag(TagNode::new(definition, bindings, children).unwrap())
    }

    #[test]
    fn test_structural_equality() {
        let a = tag("b", vec![], vec![Node::text("x")]);
        let b = tag("b", vec![], vec![Node::text("x")]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_child_order_is_significant() {
        let a = Node::sequence(vec![Node::text("a"), Node::text("b")]);
        let b = Node::sequence(vec![Node::text("b"), Node::text("a")]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_variant_is_significant() {
        assert_ne!(Node::text("[b]"), Node::error("[b]"));
    }

    #[test]
    fn test_different_tags_not_equal() {
        let a = tag("b", vec![], vec![Node::text("x")]);
        let b = tag("i", vec![], vec![Node::text("x")]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_with_children_returns_new_node() {
        let original = tag("b", vec![], vec![Node::text("x")]);
        let replaced = original.with_children(vec![Node::text("y")]).unwrap();
        assert_eq!(original.children(), &[Node::text("x")]);
        assert_eq!(replaced.children(), &[Node::text("y")]);
    }

    #[test]
    fn test_text_rejects_children() {
        let result = Node::text("x").with_children(vec![Node::text("y")]);
        assert_eq!(result, Err(TreeError::ChildrenNotAllowed("text".to_owned())));
    }

    #[test]
    fn test_text_accepts_empty_children() {
        assert_eq!(Node::text("x").with_children(vec![]), Ok(Node::text("x")));
    }

    #[test]
    fn test_content_as_attribute_rejects_children() {
        let img = Arc::clone(TagGrammar::forum().get("img").unwrap());
        let result = TagNode::new(img, vec![], vec![Node::text("a.png")]);
        assert_eq!(
            result.unwrap_err(),
            TreeError::ChildrenNotAllowed("[img]".to_owned())
        );
    }

    #[test]
    fn test_attribute_own_value() {
        let node = tag(
            "url",
            vec![(AttributeKey::OwnValue, "https://a.example".to_owned())],
            vec![Node::text("link")],
        );
        let Node::Tag(url) = node else { unreachable!() };
        assert_eq!(url.attribute("href").as_deref(), Some("https://a.example"));
    }

    #[test]
    fn test_attribute_named() {
        let node = tag(
            "url",
            vec![(AttributeKey::Named("href".to_owned()), "https://b.example".to_owned())],
            vec![Node::text("link")],
        );
        let Node::Tag(url) = node else { unreachable!() };
        assert_eq!(url.attribute("href").as_deref(), Some("https://b.example"));
    }

    #[test]
    fn test_attribute_defaults_to_content() {
        let node = tag("url", vec![], vec![Node::text("https://c.example")]);
        let Node::Tag(url) = node else { unreachable!() };
        assert_eq!(url.attribute("href").as_deref(), Some("https://c.example"));
    }

    #[test]
    fn test_attribute_default_value() {
        let node = tag("color", vec![], vec![Node::text("x")]);
        let Node::Tag(color) = node else { unreachable!() };
        assert_eq!(color.attribute("color").as_deref(), Some(""));
        assert_eq!(color.attribute("size"), None);
    }

    #[test]
    fn test_resolved_attributes_map() {
        let node = tag(
            "color",
            vec![(AttributeKey::OwnValue, "red".to_owned())],
            vec![Node::text("x")],
        );
        let Node::Tag(color) = node else { unreachable!() };
        let attributes = color.attributes();
        assert_eq!(attributes.get("color").map(String::as_str), Some("red"));
        assert_eq!(attributes.len(), 1);
    }
}
