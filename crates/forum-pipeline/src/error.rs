//! Pipeline errors.

/// Error that stops a message from being processed or linked.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PipelineError {
    /// Body is empty after trimming.
    #[error("message body cannot be empty")]
    EmptyBody,
    /// A reply's parent message could not be loaded.
    #[error("orphan message {message_id}: unable to load parent {parent_id}")]
    OrphanReference { message_id: u64, parent_id: u64 },
}
