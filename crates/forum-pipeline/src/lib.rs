//! Staged processing of forum posts.
//!
//! [`MessagePipeline::process`] takes the raw body a user submitted and runs
//! it through every [`Stage`] in a fixed order:
//!
//! ```text
//! Raw → PreClean → SmileyTokenize → Parsed → SmileyResolve
//!     → UrlEnrich → MentionScan → PostClean → Done
//! ```
//!
//! The result is a [`ProcessedMessage`] with display HTML, canonical markup,
//! plain text, previews, link cards and mentioned users. Storing it and
//! deriving notifications is up to the caller.
//!
//! Smiley codes are replaced with placeholders before parsing so the parser
//! never sees them, and URL and mention scanning run on rendered HTML so
//! inserted anchors are not scanned again.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use forum_enrich::MockFetcher;
//! use forum_pipeline::{MessagePipeline, Smiley, SmileyTable};
//!
//! let pipeline = MessagePipeline::new(Arc::new(MockFetcher::new()))
//!     .with_smileys(SmileyTable::new(vec![Smiley::new(":)", "/smile.png")]));
//!
//! let message = pipeline.process("[i]hello[/i] :)", None).unwrap();
//! assert_eq!(
//!     message.display,
//!     r#"<span class="bbc-italic">hello</span> <img class="smiley" src="/smile.png" alt=":)" />"#
//! );
//! assert_eq!(message.short_preview, "hello");
//! ```

mod clean;
mod error;
mod linkage;
mod message;
mod pipeline;
mod smiley;
mod stage;

pub use clean::{force_new_window, pre_clean, preview};
pub use error::PipelineError;
pub use forum_enrich::{DirectoryUser, MemoryUserDirectory, UserDirectory};
pub use linkage::{
    MessageLink, MessageLookup, MessageRef, deleted_reply_body, link_reply, page_number,
};
pub use message::ProcessedMessage;
pub use pipeline::{MessagePipeline, PipelineOptions};
pub use smiley::{PLACEHOLDER_CLOSE, PLACEHOLDER_OPEN, Smiley, SmileyTable};
pub use stage::Stage;
