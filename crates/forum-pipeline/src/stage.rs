//! Pipeline stages.

use serde::Serialize;

/// One step of message processing. Stages run strictly in [`Stage::ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Raw,
    PreClean,
    SmileyTokenize,
    Parsed,
    SmileyResolve,
    UrlEnrich,
    MentionScan,
    PostClean,
    Done,
}

impl Stage {
    pub const ORDER: [Stage; 9] = [
        Stage::Raw,
        Stage::PreClean,
        Stage::SmileyTokenize,
        Stage::Parsed,
        Stage::SmileyResolve,
        Stage::UrlEnrich,
        Stage::MentionScan,
        Stage::PostClean,
        Stage::Done,
    ];

    /// The stage after this one, or `None` once done.
    pub fn next(self) -> Option<Stage> {
        let index = Self::ORDER.iter().position(|s| *s == self)?;
        Self::ORDER.get(index + 1).copied()
    }
}
