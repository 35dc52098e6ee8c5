//! MessageFeed: append-only, deduplicated message history.
//!
//! Messages reach the client three ways: embedded in snapshots, from the
//! message endpoint, and over the push channel.  The same id can arrive on
//! more than one of them, in any order, so membership is tracked by a set of
//! seen ids rather than by the high-water mark alone.  Entries keep arrival
//! order; nothing is re-sorted by id.

use std::collections::HashSet;

use airport_proto::message::{Message, MessageId, MessageQuery};
use chrono::{DateTime, Local};
use tracing::debug;

/// How a batch of messages was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedMode {
    /// Backfill of recent history on first activation.
    CatchUp,
    /// Incremental delivery.
    Live,
}

#[derive(Debug, Clone)]
pub struct FeedEntry {
    pub message: Message,
    pub mode: FeedMode,
    pub arrived_at: DateTime<Local>,
}

#[derive(Debug, Default)]
pub struct MessageFeed {
    seen: HashSet<MessageId>,
    entries: Vec<FeedEntry>,
    last_message_id: Option<MessageId>,
    catch_up_issued: bool,
}

impl MessageFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the messages whose id has not been seen yet and return them,
    /// in the order given.
    pub fn ingest(&mut self, messages: &[Message], mode: FeedMode) -> Vec<Message> {
        let now = Local::now();
        let mut fresh = Vec::new();
        for msg in messages {
            if !self.seen.insert(msg.id) {
                continue;
            }
            self.last_message_id = self.last_message_id.max(Some(msg.id));
            self.entries.push(FeedEntry {
                message: msg.clone(),
                mode,
                arrived_at: now,
            });
            fresh.push(msg.clone());
        }
        if fresh.len() < messages.len() {
            debug!(
                "feed: dropped {} already-seen message(s)",
                messages.len() - fresh.len()
            );
        }
        fresh
    }

    /// Parameters for the next fetch from the message endpoint.  The first
    /// call asks for a catch-up backfill; every later call is live.
    pub fn next_query(&mut self) -> (MessageQuery, FeedMode) {
        let mode = if self.catch_up_issued {
            FeedMode::Live
        } else {
            self.catch_up_issued = true;
            FeedMode::CatchUp
        };
        let query = MessageQuery {
            last: self.last_message_id.unwrap_or_default(),
            old: mode == FeedMode::CatchUp,
        };
        (query, mode)
    }

    pub fn last_message_id(&self) -> Option<MessageId> {
        self.last_message_id
    }

    pub fn entries(&self) -> &[FeedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
