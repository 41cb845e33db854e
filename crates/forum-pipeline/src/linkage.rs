//! Reply linkage and topic paging.
//!
//! Topics are flat: every message in a topic points at the topic start as
//! its parent, and a reply to a reply also records the message it answered.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::error::PipelineError;

/// The parts of a stored message that linkage needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef {
    pub id: u64,
    /// Topic start this message belongs to; `None` for a topic start.
    pub parent_id: Option<u64>,
}

impl MessageRef {
    pub fn topic_start(id: u64) -> Self {
        Self {
            id,
            parent_id: None,
        }
    }

    pub fn reply(id: u64, parent_id: u64) -> Self {
        Self {
            id,
            parent_id: Some(parent_id),
        }
    }
}

/// Parent and reply ids for a new message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageLink {
    pub parent_id: Option<u64>,
    pub reply_id: Option<u64>,
}

/// Read access to stored messages.
pub trait MessageLookup {
    fn find(&self, id: u64) -> Option<MessageRef>;
}

impl MessageLookup for HashMap<u64, MessageRef> {
    fn find(&self, id: u64) -> Option<MessageRef> {
        self.get(&id).copied()
    }
}

/// Work out where a new message hangs in its topic.
///
/// # Errors
///
/// Returns [`PipelineError::OrphanReference`] when `reply_to` is itself a
/// reply whose topic start cannot be found.
pub fn link_reply(
    reply_to: Option<&MessageRef>,
    lookup: &dyn MessageLookup,
) -> Result<MessageLink, PipelineError> {
    let Some(target) = reply_to else {
        return Ok(MessageLink::default());
    };

    let Some(parent_id) = target.parent_id else {
        return Ok(MessageLink {
            parent_id: Some(target.id),
            reply_id: None,
        });
    };

    if lookup.find(parent_id).is_none() {
        return Err(PipelineError::OrphanReference {
            message_id: target.id,
            parent_id,
        });
    }

    Ok(MessageLink {
        parent_id: Some(parent_id),
        reply_id: Some(target.id),
    })
}

/// 1-based page on which `message_id` appears, given the topic's message
/// ids in display order.
pub fn page_number(message_id: u64, topic_message_ids: &[u64], per_page: usize) -> Option<usize> {
    if per_page == 0 {
        return None;
    }
    let index = topic_message_ids.iter().position(|id| *id == message_id)?;
    Some(index / per_page + 1)
}

/// Body given to a direct reply when the message it answered is deleted:
/// the deleted text is kept as a quote in front of the reply.
pub fn deleted_reply_body(
    deleted_body: &str,
    deleted_by: &str,
    deleted_on: NaiveDate,
    reply_body: &str,
) -> String {
    format!(
        "[quote]{deleted_body}\nMessage deleted by {deleted_by} on {}[/quote]{reply_body}",
        deleted_on.format("%B %d, %Y")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn store() -> HashMap<u64, MessageRef> {
        [MessageRef::topic_start(1), MessageRef::reply(2, 1)]
            .into_iter()
            .map(|m| (m.id, m))
            .collect()
    }

    #[test]
    fn test_new_topic() {
        assert_eq!(link_reply(None, &store()).unwrap(), MessageLink::default());
    }

    #[test]
    fn test_reply_to_topic_start() {
        let link = link_reply(Some(&MessageRef::topic_start(1)), &store()).unwrap();
        assert_eq!(
            link,
            MessageLink {
                parent_id: Some(1),
                reply_id: None
            }
        );
    }

    #[test]
    fn test_reply_to_reply() {
        let link = link_reply(Some(&MessageRef::reply(2, 1)), &store()).unwrap();
        assert_eq!(
            link,
            MessageLink {
                parent_id: Some(1),
                reply_id: Some(2)
            }
        );
    }

    #[test]
    fn test_orphan_reply() {
        let err = link_reply(Some(&MessageRef::reply(7, 99)), &store()).unwrap_err();
        assert_eq!(
            err,
            PipelineError::OrphanReference {
                message_id: 7,
                parent_id: 99
            }
        );
    }

    #[test]
    fn test_page_number() {
        let ids: Vec<u64> = (1..=25).collect();
        assert_eq!(page_number(1, &ids, 10), Some(1));
        assert_eq!(page_number(10, &ids, 10), Some(1));
        assert_eq!(page_number(11, &ids, 10), Some(2));
        assert_eq!(page_number(25, &ids, 10), Some(3));
        assert_eq!(page_number(99, &ids, 10), None);
        assert_eq!(page_number(1, &ids, 0), None);
    }

    #[test]
    fn test_deleted_reply_body() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(
            deleted_reply_body("original", "Mod", date, "my reply"),
            "[quote]original\nMessage deleted by Mod on March 05, 2024[/quote]my reply"
        );
    }
}
