//! # Change Feed Contract
//!
//! The boundary to the backend's publish/subscribe change feed.
//!
//! Opening a channel is asynchronous: `open_channel` only submits the
//! request, and the outcome comes back later as [`FeedMessage::Opened`]
//! from `poll`. Row changes arrive the same way, in feed order.

use std::fmt;

use super::errors::RealtimeResult;
use super::event::{ChangeEvent, EventKinds, TableName};
use crate::auth::UserId;

/// Feed-assigned handle of an open channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelHandle(u64);

impl ChannelHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChannelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch-{}", self.0)
    }
}

/// Caller-assigned ID correlating an open request with its completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpenRequestId(u64);

impl OpenRequestId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for OpenRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Request to open one channel scoped to a table and a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest {
    pub id: OpenRequestId,
    pub table: TableName,
    pub user_id: UserId,
    pub kinds: EventKinds,
}

impl OpenRequest {
    /// Channel name used on the backend
    pub fn topic(&self) -> String {
        format!("{}-changes", self.table)
    }
}

/// Asynchronous output of the feed
#[derive(Debug, Clone, PartialEq)]
pub enum FeedMessage {
    /// An open request finished
    Opened {
        request: OpenRequestId,
        result: RealtimeResult<ChannelHandle>,
    },
    /// A change arrived on an open channel
    Change {
        channel: ChannelHandle,
        event: ChangeEvent,
    },
}

/// Change-feed collaborator
pub trait ChangeFeed {
    /// Submit an open request. An `Err` means the request was not accepted
    /// at all and no completion will follow.
    fn open_channel(&mut self, request: OpenRequest) -> RealtimeResult<()>;

    /// Close a channel. Closing an unknown or already closed channel is a
    /// no-op.
    fn close_channel(&mut self, channel: ChannelHandle);

    /// Drain completions and changes, in the order the feed produced them
    fn poll(&mut self) -> Vec<FeedMessage>;
}
