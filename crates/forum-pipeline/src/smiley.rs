//! Smiley codes.
//!
//! Smiley codes such as `:)` or `[:` would be mangled by the markup parser,
//! so they are swapped for positional placeholders before parsing and
//! turned into images afterwards:
//!
//! 1. [`SmileyTable::tokenize`] replaces every whitespace-delimited code with
//!    `U+E000 <index> U+E001`.
//! 2. The parser treats placeholders as plain text.
//! 3. [`SmileyTable::resolve`] rewrites the parsed tree, splitting text runs
//!    into text and smiley image nodes. Inside literal tags (`code`) and
//!    attribute values the original code is restored instead.
//!
//! Placeholder delimiters are private-use code points that pre-cleaning
//! strips from user input, so only tokenization can produce them.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use forum_markup::{
    AttributeDefinition, AttributeKey, ErrorNode, Node, TagDefinition, TagNode, TextNode, Visitor,
    walk_tag,
};
use regex::{Captures, Regex};

/// Opens a smiley placeholder.
pub const PLACEHOLDER_OPEN: char = '\u{E000}';
/// Closes a smiley placeholder.
pub const PLACEHOLDER_CLOSE: char = '\u{E001}';

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+").unwrap());

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("\u{E000}([0-9]+)\u{E001}").unwrap());

/// A smiley code and the image it renders as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Smiley {
    pub code: String,
    pub path: String,
}

impl Smiley {
    pub fn new(code: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            path: path.into(),
        }
    }
}

/// Ordered smiley lookup shared by the tokenize and resolve stages.
#[derive(Debug, Clone)]
pub struct SmileyTable {
    smileys: Vec<Smiley>,
    by_code: HashMap<String, usize>,
    definition: Arc<TagDefinition>,
}

impl Default for SmileyTable {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl SmileyTable {
    /// Build a table. When a code appears twice the first entry wins.
    #[must_use]
    pub fn new(smileys: Vec<Smiley>) -> Self {
        let mut by_code = HashMap::new();
        for (index, smiley) in smileys.iter().enumerate() {
            by_code.entry(smiley.code.clone()).or_insert(index);
        }
        let definition = TagDefinition::new(
            "smiley",
            r#"<img class="smiley" src="${content}" alt="${alt}" />"#,
            "",
        )
        .with_attribute(AttributeDefinition::named("alt", "alt"))
        .content_as_attribute();

        Self {
            smileys,
            by_code,
            definition: Arc::new(definition),
        }
    }

    pub fn smileys(&self) -> &[Smiley] {
        &self.smileys
    }

    pub fn is_empty(&self) -> bool {
        self.smileys.is_empty()
    }

    /// Replace whitespace-delimited smiley codes with placeholders.
    pub fn tokenize<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if self.smileys.is_empty() {
            return Cow::Borrowed(text);
        }
        WORD_RE.replace_all(text, |caps: &Captures<'_>| {
            let word = &caps[0];
            match self.by_code.get(word) {
                Some(index) => format!("{PLACEHOLDER_OPEN}{index}{PLACEHOLDER_CLOSE}"),
                None => word.to_owned(),
            }
        })
    }

    /// Replace placeholders with the codes they stand for.
    pub fn detokenize<'a>(&self, text: &'a str) -> Cow<'a, str> {
        PLACEHOLDER_RE.replace_all(text, |caps: &Captures<'_>| match self.lookup(&caps[1]) {
            Some(smiley) => smiley.code.clone(),
            None => caps[0].to_owned(),
        })
    }

    /// Rewrite a parsed tree, turning placeholders into smiley image nodes.
    pub fn resolve(&self, tree: &Node) -> Node {
        tree.accept(&mut Resolver { table: self })
    }

    fn lookup(&self, index: &str) -> Option<&Smiley> {
        index.parse::<usize>().ok().and_then(|i| self.smileys.get(i))
    }

    fn image(&self, smiley: &Smiley) -> Option<Node> {
        let bindings = vec![
            (AttributeKey::Named("alt".to_owned()), smiley.code.clone()),
            (AttributeKey::Content, smiley.path.clone()),
        ];
        TagNode::new(Arc::clone(&self.definition), bindings, Vec::new())
            .ok()
            .map(Node::Tag)
    }

    /// Split text into text runs and smiley nodes.
    fn split(&self, text: &str) -> Node {
        let mut parts = Vec::new();
        let mut last = 0;

        for caps in PLACEHOLDER_RE.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            let Some(image) = self.lookup(&caps[1]).and_then(|s| self.image(s)) else {
                continue;
            };
            if whole.start() > last {
                parts.push(Node::text(&text[last..whole.start()]));
            }
            parts.push(image);
            last = whole.end();
        }

        if last == 0 {
            return Node::text(text);
        }
        if last < text.len() {
            parts.push(Node::text(&text[last..]));
        }
        if parts.len() == 1 {
            if let Some(only) = parts.pop() {
                return only;
            }
        }
        Node::sequence(parts)
    }
}

/// Resolves placeholders in nested content.
struct Resolver<'t> {
    table: &'t SmileyTable,
}

impl Visitor for Resolver<'_> {
    fn visit_text(&mut self, node: &TextNode) -> Node {
        self.table.split(node.text())
    }

    fn visit_error(&mut self, node: &ErrorNode) -> Node {
        Node::error(self.table.detokenize(node.literal()))
    }

    fn visit_tag(&mut self, node: &TagNode) -> Node {
        let has_placeholder = node
            .bindings()
            .iter()
            .any(|(_, v)| v.contains(PLACEHOLDER_OPEN));
        if node.definition().allows_nested_tags() && !has_placeholder {
            return walk_tag(self, node);
        }

        let bindings = node
            .bindings()
            .iter()
            .map(|(k, v)| (k.clone(), self.table.detokenize(v).into_owned()))
            .collect();
        let children = if node.definition().allows_nested_tags() {
            node.children().iter().map(|c| c.accept(self)).collect()
        } else {
            let mut restore = Restorer { table: self.table };
            node.children().iter().map(|c| c.accept(&mut restore)).collect()
        };

        match TagNode::new(Arc::clone(node.definition()), bindings, children) {
            Ok(tag) => Node::Tag(tag),
            Err(_) => Node::Tag(node.clone()),
        }
    }
}

/// Restores codes verbatim inside literal content.
struct Restorer<'t> {
    table: &'t SmileyTable,
}

impl Visitor for Restorer<'_> {
    fn visit_text(&mut self, node: &TextNode) -> Node {
        Node::text(self.table.detokenize(node.text()))
    }

    fn visit_error(&mut self, node: &ErrorNode) -> Node {
        Node::error(self.table.detokenize(node.literal()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forum_markup::{RenderTarget, parse};
    use pretty_assertions::assert_eq;

    fn table() -> SmileyTable {
        SmileyTable::new(vec![
            Smiley::new(":)", "/smileys/smile.png"),
            Smiley::new(":(", "/smileys/frown.png"),
            Smiley::new("<3", "/smileys/heart.png"),
        ])
    }

    #[test]
    fn test_tokenize_whole_words_only() {
        let tokenized = table().tokenize(":) a:) :)b\n:(");
        assert_eq!(tokenized, "\u{E000}0\u{E001} a:) :)b\n\u{E000}1\u{E001}");
    }

    #[test]
    fn test_round_trip_without_codes_is_identity() {
        let text = "nothing [b]to[/b] see here: ) (:";
        let table = table();
        let tokenized = table.tokenize(text);
        assert_eq!(table.detokenize(&tokenized), text);
    }

    #[test]
    fn test_round_trip_with_codes() {
        let text = "hi :) and <3";
        let table = table();
        assert_eq!(table.detokenize(&table.tokenize(text)), text);
    }

    #[test]
    fn test_empty_table_borrows() {
        let table = SmileyTable::default();
        assert!(matches!(table.tokenize("x :)"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_resolve_renders_images() {
        let table = table();
        let tree = parse(&table.tokenize("hi :) [b] <3 [/b]"));
        let html = table.resolve(&tree).render(RenderTarget::Html);
        assert_eq!(
            html,
            concat!(
                r#"hi <img class="smiley" src="/smileys/smile.png" alt=":)" /> "#,
                r#"<span class="bbc-bold"> <img class="smiley" src="/smileys/heart.png" alt="&lt;3" /> </span>"#
            )
        );
    }

    #[test]
    fn test_resolve_restores_code_in_literal_tags() {
        let table = table();
        let tree = parse(&table.tokenize("[code] :) [/code]"));
        let html = table.resolve(&tree).render(RenderTarget::Html);
        assert_eq!(html, r#"<div class="bbc-code"> :) </div>"#);
    }

    #[test]
    fn test_resolve_restores_code_in_image_content() {
        let table = table();
        let tree = parse(&table.tokenize("[img] :) [/img]"));
        let html = table.resolve(&tree).render(RenderTarget::Html);
        assert_eq!(html, r#"<img class="bbc-image" src=":)" />"#);
    }

    #[test]
    fn test_resolve_restores_code_in_error_literal() {
        let table = table();
        let tree = parse(&table.tokenize("[b] :)"));
        let html = table.resolve(&tree).render(RenderTarget::Html);
        assert_eq!(html, "[b] :)");
    }

    #[test]
    fn test_unknown_index_left_alone() {
        let table = table();
        let text = "\u{E000}9\u{E001}";
        assert_eq!(table.detokenize(text), text);
        assert_eq!(table.resolve(&Node::text(text)), Node::text(text));
    }
}
