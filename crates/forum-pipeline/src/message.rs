//! Processed message state.

use std::collections::BTreeSet;

use forum_markup::Node;
use serde::Serialize;

use crate::stage::Stage;

/// A message as it moves through the pipeline, and the final result.
///
/// Created at pipeline start, mutated by each stage in turn and handed to
/// the caller when done. The pipeline never stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessedMessage {
    /// Body exactly as submitted.
    pub original: String,
    /// Display HTML. Rewritten by most stages.
    pub display: String,
    /// Canonical markup of the parsed body.
    pub markup: String,
    /// Plain text of the parsed body.
    pub text: String,
    /// Link cards and embedded players, in discovery order.
    pub cards: Vec<String>,
    /// Ids of users mentioned in the body, author excluded.
    pub mentioned_users: BTreeSet<String>,
    pub short_preview: String,
    pub long_preview: String,
    #[serde(skip)]
    pub(crate) tree: Option<Node>,
    #[serde(skip)]
    pub(crate) stages: Vec<Stage>,
}

impl ProcessedMessage {
    pub(crate) fn new(original: &str) -> Self {
        Self {
            original: original.to_owned(),
            display: original.to_owned(),
            markup: String::new(),
            text: String::new(),
            cards: Vec::new(),
            mentioned_users: BTreeSet::new(),
            short_preview: String::new(),
            long_preview: String::new(),
            tree: None,
            stages: vec![Stage::Raw],
        }
    }

    /// Syntax tree of the body with smileys resolved.
    pub fn tree(&self) -> Option<&Node> {
        self.tree.as_ref()
    }

    /// Stages this message went through, in order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// All cards as one HTML fragment, to render after the body.
    pub fn cards_html(&self) -> String {
        self.cards.concat()
    }
}
