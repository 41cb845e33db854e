//! Markup parser.
//!
//! Parsing runs in three passes over the input:
//!
//! 1. **Tokenize**: split into literal text, opening constructs
//!    `[name=value key=value]` and closing constructs `[/name]`.
//! 2. **Pair**: match each known opening construct with its closing
//!    construct. Pairing is per tag name, innermost first, so
//!    `[b][b][/b][/b]` balances. Content of literal tags (`code`, `img`) is
//!    skipped so tags inside it never pair with tags outside.
//! 3. **Build**: walk the tokens recursively, producing tag nodes for paired
//!    constructs and literal text for everything else.
//!
//! Malformed input never fails. Unknown tags stay in the text, a stray
//! closing construct becomes an error node, and an opening construct with no
//! closing partner turns itself and the rest of its enclosing content into
//! one error node.

use std::collections::HashMap;
use std::sync::Arc;

use crate::grammar::{TagDefinition, TagGrammar};
use crate::node::{AttributeKey, Node, TagNode};

/// Maximum tag nesting depth. Deeper tags are kept as literal text.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Parse with the built-in forum grammar.
#[must_use]
pub fn parse(input: &str) -> Node {
    Parser::new(TagGrammar::forum()).parse(input)
}

/// Markup parser bound to a grammar.
pub struct Parser<'g> {
    grammar: &'g TagGrammar,
}

impl<'g> Parser<'g> {
    #[must_use]
    pub fn new(grammar: &'g TagGrammar) -> Self {
        Self { grammar }
    }

    /// Parse raw text into a sequence node wrapping all top-level constructs.
    #[must_use]
    pub fn parse(&self, input: &str) -> Node {
        let tokens = tokenize(input);
        let partners = self.pair(&tokens);
        let builder = TreeBuilder {
            input,
            tokens: &tokens,
            partners: &partners,
            grammar: self.grammar,
        };
        Node::sequence(builder.build(0, tokens.len(), input.len(), 0))
    }

    /// Find the closing token index for each pairable opening token, and the
    /// opening index for each closing token.
    fn pair(&self, tokens: &[Token<'_>]) -> Vec<Option<usize>> {
        let literal = self.literal_closes(tokens);
        let mut partners = vec![None; tokens.len()];
        let mut open: HashMap<&str, Vec<usize>> = HashMap::new();

        let mut i = 0;
        while i < tokens.len() {
            match &tokens[i].kind {
                TokenKind::Open(tag) => {
                    if let Some(definition) = self.grammar.get(tag.name) {
                        if definition.allows_nested_tags() {
                            open.entry(tag.name).or_default().push(i);
                        } else if let Some(close) = literal[i] {
                            partners[i] = Some(close);
                            partners[close] = Some(i);
                            i = close;
                        }
                    }
                }
                TokenKind::Close(name) => {
                    if let Some(start) = open.get_mut(name).and_then(Vec::pop) {
                        partners[start] = Some(i);
                        partners[i] = Some(start);
                    }
                }
                TokenKind::Text => {}
            }
            i += 1;
        }

        partners
    }

    /// Closing token for every literal-tag opening, counting same-name
    /// nesting. Computed in one pass so unmatched openings stay linear.
    fn literal_closes(&self, tokens: &[Token<'_>]) -> Vec<Option<usize>> {
        let is_literal = |name: &str| {
            self.grammar
                .get(name)
                .is_some_and(|definition| !definition.allows_nested_tags())
        };

        let mut closes = vec![None; tokens.len()];
        let mut open: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, token) in tokens.iter().enumerate() {
            match &token.kind {
                TokenKind::Open(tag) if is_literal(tag.name) => {
                    open.entry(tag.name).or_default().push(i);
                }
                TokenKind::Close(name) if is_literal(name) => {
                    if let Some(start) = open.get_mut(name).and_then(Vec::pop) {
                        closes[start] = Some(i);
                    }
                }
                _ => {}
            }
        }
        closes
    }
}

struct TreeBuilder<'a> {
    input: &'a str,
    tokens: &'a [Token<'a>],
    partners: &'a [Option<usize>],
    grammar: &'a TagGrammar,
}

impl TreeBuilder<'_> {
    /// Build nodes for tokens `from..to`. `end` is the byte offset where this
    /// range's content ends.
    fn build(&self, from: usize, to: usize, end: usize, depth: usize) -> Vec<Node> {
        let mut nodes = Vec::new();
        let mut text = String::new();

        let mut i = from;
        while i < to {
            let token = &self.tokens[i];
            let source = &self.input[token.start..token.end];
            match &token.kind {
                TokenKind::Text => text.push_str(source),
                TokenKind::Close(name) => {
                    if self.grammar.contains(name) {
                        flush_text(&mut text, &mut nodes);
                        nodes.push(Node::error(source));
                    } else {
                        text.push_str(source);
                    }
                }
                TokenKind::Open(tag) => {
                    let Some(definition) = self.grammar.get(tag.name) else {
                        text.push_str(source);
                        i += 1;
                        continue;
                    };

                    flush_text(&mut text, &mut nodes);
                    match self.partners[i].filter(|&close| close < to) {
                        Some(close) => {
                            nodes.push(self.build_tag(definition, tag, i, close, depth));
                            i = close + 1;
                            continue;
                        }
                        None => {
                            nodes.push(Node::error(&self.input[token.start..end]));
                            return nodes;
                        }
                    }
                }
            }
            i += 1;
        }

        flush_text(&mut text, &mut nodes);
        nodes
    }

    fn build_tag(
        &self,
        definition: &Arc<TagDefinition>,
        tag: &OpenTag<'_>,
        open: usize,
        close: usize,
        depth: usize,
    ) -> Node {
        let open_token = &self.tokens[open];
        let close_token = &self.tokens[close];
        let whole = &self.input[open_token.start..close_token.end];

        if depth >= MAX_NESTING_DEPTH {
            return Node::error(whole);
        }

        let inner = &self.input[open_token.end..close_token.start];
        let mut bindings = bind_attributes(definition, tag);

        let children = if definition.is_content_as_attribute() {
            bindings.push((AttributeKey::Content, inner.trim().to_owned()));
            Vec::new()
        } else if !definition.allows_nested_tags() {
            if inner.is_empty() {
                Vec::new()
            } else {
                vec![Node::text(inner)]
            }
        } else {
            self.build(open + 1, close, close_token.start, depth + 1)
        };

        match TagNode::new(Arc::clone(definition), bindings, children) {
            Ok(node) => Node::Tag(node),
            Err(_) => Node::error(whole),
        }
    }
}

fn flush_text(text: &mut String, nodes: &mut Vec<Node>) {
    if !text.is_empty() {
        nodes.push(Node::text(std::mem::take(text)));
    }
}

/// Keep only the attributes the definition declares.
fn bind_attributes(definition: &TagDefinition, tag: &OpenTag<'_>) -> Vec<(AttributeKey, String)> {
    let mut bindings = Vec::new();
    if let Some(value) = &tag.own_value {
        if definition.own_value_attribute().is_some() {
            bindings.push((AttributeKey::OwnValue, value.clone()));
        }
    }
    for (name, value) in &tag.named {
        if definition.named_attribute(name).is_some() {
            bindings.push((AttributeKey::Named(name.clone()), value.clone()));
        }
    }
    bindings
}

#[derive(Debug, PartialEq, Eq)]
struct Token<'a> {
    kind: TokenKind<'a>,
    start: usize,
    end: usize,
}

#[derive(Debug, PartialEq, Eq)]
enum TokenKind<'a> {
    Text,
    Open(OpenTag<'a>),
    Close(&'a str),
}

#[derive(Debug, PartialEq, Eq)]
struct OpenTag<'a> {
    name: &'a str,
    own_value: Option<String>,
    named: Vec<(String, String)>,
}

fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut pos = 0;

    while let Some(offset) = input[pos..].find('[') {
        let at = pos + offset;
        match scan_construct(&input[at..]) {
            Some((kind, len)) => {
                if at > text_start {
                    tokens.push(Token {
                        kind: TokenKind::Text,
                        start: text_start,
                        end: at,
                    });
                }
                tokens.push(Token {
                    kind,
                    start: at,
                    end: at + len,
                });
                pos = at + len;
                text_start = pos;
            }
            None => pos = at + 1,
        }
    }

    if text_start < input.len() {
        tokens.push(Token {
            kind: TokenKind::Text,
            start: text_start,
            end: input.len(),
        });
    }

    tokens
}

/// Scan a construct at the start of `s` (which begins with `[`).
///
/// Returns the token kind and its length in bytes, or `None` if the text is
/// not a well-formed construct.
fn scan_construct(s: &str) -> Option<(TokenKind<'_>, usize)> {
    let rest = &s[1..];

    if let Some(after_slash) = rest.strip_prefix('/') {
        let len = name_len(after_slash);
        if len == 0 || !after_slash[len..].starts_with(']') {
            return None;
        }
        return Some((TokenKind::Close(&after_slash[..len]), len + 3));
    }

    let len = name_len(rest);
    if len == 0 {
        return None;
    }
    let name = &rest[..len];

    let mut cursor = Cursor { src: s, pos: 1 + len };
    let own_value = if cursor.eat('=') {
        Some(cursor.value()?)
    } else {
        None
    };

    let mut named: Vec<(String, String)> = Vec::new();
    loop {
        let spaced = cursor.skip_whitespace();
        if cursor.eat(']') {
            let tag = OpenTag {
                name,
                own_value,
                named,
            };
            return Some((TokenKind::Open(tag), cursor.pos));
        }
        if !spaced {
            return None;
        }

        let key_len = name_len(cursor.rest());
        if key_len == 0 {
            return None;
        }
        let key = cursor.rest()[..key_len].to_owned();
        cursor.pos += key_len;
        if !cursor.eat('=') {
            return None;
        }
        let value = cursor.value()?;

        match named.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = value,
            None => named.push((key, value)),
        }
    }
}

fn name_len(s: &str) -> usize {
    s.find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(s.len())
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn eat(&mut self, c: char) -> bool {
        if self.rest().starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) -> bool {
        let rest = self.rest();
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();
        rest.len() != trimmed.len()
    }

    /// Quoted (`"v"`, `'v'`) or bare value. Bare values end at whitespace
    /// or `]`.
    fn value(&mut self) -> Option<String> {
        let rest = self.rest();
        if let Some(quote) = rest.chars().next().filter(|c| *c == '"' || *c == '\'') {
            let body = &rest[1..];
            let end = body.find(quote)?;
            self.pos += end + 2;
            return Some(body[..end].to_owned());
        }

        let end = rest
            .find(|c: char| c.is_whitespace() || c == ']')
            .unwrap_or(rest.len());
        self.pos += end;
        Some(rest[..end].to_owned())
    }
}
