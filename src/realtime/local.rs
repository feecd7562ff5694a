//! # Local Change Feed
//!
//! In-process implementation of [`ChangeFeed`]. Changes published through a
//! [`FeedPublisher`] are fanned out to every open channel of the same table
//! whose user may see the row, mirroring the backend's row-level security.
//!
//! Open completions and published changes share one queue, so `poll`
//! yields them in the order they happened.

use std::collections::HashMap;

use tokio::sync::mpsc;

use super::errors::{RealtimeError, RealtimeResult};
use super::event::{ChangeEvent, TableName};
use super::feed::{ChangeFeed, ChannelHandle, FeedMessage, OpenRequest, OpenRequestId};
use crate::auth::{RowPolicy, UserId};

/// Work queued for the next `poll`
#[derive(Debug)]
enum Inbound {
    /// Finish an open request
    Complete { request: OpenRequest, fail: bool },
    /// A row changed on the backend
    Publish(ChangeEvent),
    /// Deliver straight to a channel, bypassing fan-out
    Raw {
        channel: ChannelHandle,
        event: ChangeEvent,
    },
}

/// Call made against the feed, recorded for ordering checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedCall {
    Open {
        request: OpenRequestId,
        table: TableName,
        user_id: UserId,
    },
    Close {
        channel: ChannelHandle,
    },
}

/// Cloneable handle for publishing row changes into a [`LocalFeed`]
#[derive(Debug, Clone)]
pub struct FeedPublisher {
    tx: mpsc::UnboundedSender<Inbound>,
}

impl FeedPublisher {
    /// Publish a change. Returns false if the feed has been dropped.
    pub fn publish(&self, event: ChangeEvent) -> bool {
        self.tx.send(Inbound::Publish(event)).is_ok()
    }
}

#[derive(Debug)]
struct OpenChannel {
    request: OpenRequest,
    policy: RowPolicy,
}

/// In-process change feed
#[derive(Debug)]
pub struct LocalFeed {
    tx: mpsc::UnboundedSender<Inbound>,
    rx: mpsc::UnboundedReceiver<Inbound>,
    channels: HashMap<ChannelHandle, OpenChannel>,
    next_channel: u64,
    calls: Vec<FeedCall>,
    failing_opens: usize,
    unavailable: bool,
}

impl Default for LocalFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalFeed {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx,
            channels: HashMap::new(),
            next_channel: 1,
            calls: Vec::new(),
            failing_opens: 0,
            unavailable: false,
        }
    }

    /// Publisher feeding this feed
    pub fn publisher(&self) -> FeedPublisher {
        FeedPublisher {
            tx: self.tx.clone(),
        }
    }

    /// Publish a change directly. Returns false if it could not be queued.
    pub fn publish(&self, event: ChangeEvent) -> bool {
        self.tx.send(Inbound::Publish(event)).is_ok()
    }

    /// Queue `event` on `channel` whether or not it is still open, as a
    /// backend does when a message is already in flight during close.
    /// Returns false if it could not be queued.
    pub fn push_raw(&self, channel: ChannelHandle, event: ChangeEvent) -> bool {
        self.tx.send(Inbound::Raw { channel, event }).is_ok()
    }

    /// Make the next `count` accepted opens complete with an error
    pub fn fail_next_opens(&mut self, count: usize) {
        self.failing_opens = count;
    }

    /// Reject open requests outright while set
    pub fn set_unavailable(&mut self, unavailable: bool) {
        self.unavailable = unavailable;
    }

    /// Every open/close call so far, in order
    pub fn calls(&self) -> &[FeedCall] {
        &self.calls
    }

    /// Number of channels currently open
    pub fn open_channel_count(&self) -> usize {
        self.channels.len()
    }

    /// True if `channel` is open
    pub fn is_open(&self, channel: ChannelHandle) -> bool {
        self.channels.contains_key(&channel)
    }

    /// Users with an open channel on `table`
    pub fn subscribers(&self, table: TableName) -> Vec<UserId> {
        let mut users: Vec<UserId> = self
            .channels
            .values()
            .filter(|c| c.request.table == table)
            .map(|c| c.request.user_id)
            .collect();
        users.sort();
        users
    }

    fn fan_out(&self, event: &ChangeEvent, out: &mut Vec<FeedMessage>) {
        let mut targets: Vec<ChannelHandle> = self
            .channels
            .iter()
            .filter(|(_, c)| c.request.table == event.table)
            .filter(|(_, c)| c.request.kinds.contains(event.kind))
            .filter(|(_, c)| {
                event
                    .record()
                    .is_some_and(|r| c.policy.allows(c.request.user_id, r))
            })
            .map(|(handle, _)| *handle)
            .collect();
        targets.sort();

        for channel in targets {
            out.push(FeedMessage::Change {
                channel,
                event: event.clone(),
            });
        }
    }
}

impl ChangeFeed for LocalFeed {
    fn open_channel(&mut self, request: OpenRequest) -> RealtimeResult<()> {
        if self.unavailable {
            return Err(RealtimeError::FeedUnavailable(
                "local feed marked unavailable".to_string(),
            ));
        }

        self.calls.push(FeedCall::Open {
            request: request.id,
            table: request.table,
            user_id: request.user_id,
        });

        let fail = if self.failing_opens > 0 {
            self.failing_opens -= 1;
            true
        } else {
            false
        };

        // The receiver lives in `self`, so the send cannot fail here
        let _ = self.tx.send(Inbound::Complete { request, fail });
        Ok(())
    }

    fn close_channel(&mut self, channel: ChannelHandle) {
        self.calls.push(FeedCall::Close { channel });
        self.channels.remove(&channel);
    }

    fn poll(&mut self) -> Vec<FeedMessage> {
        let mut out = Vec::new();

        while let Ok(inbound) = self.rx.try_recv() {
            match inbound {
                Inbound::Complete { request, fail } => {
                    let id = request.id;
                    let result = if fail {
                        Err(RealtimeError::OpenFailed {
                            table: request.table,
                            reason: "subscription rejected".to_string(),
                        })
                    } else {
                        let handle = ChannelHandle::new(self.next_channel);
                        self.next_channel += 1;
                        let policy = RowPolicy::for_table(request.table);
                        self.channels.insert(handle, OpenChannel { request, policy });
                        Ok(handle)
                    };
                    out.push(FeedMessage::Opened {
                        request: id,
                        result,
                    });
                }
                Inbound::Publish(event) => self.fan_out(&event, &mut out),
                Inbound::Raw { channel, event } => {
                    out.push(FeedMessage::Change { channel, event });
                }
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::event::{EventKind, EventKinds};
    use serde_json::json;

    fn request(id: u64, table: TableName, user: UserId) -> OpenRequest {
        OpenRequest {
            id: OpenRequestId::new(id),
            table,
            user_id: user,
            kinds: EventKinds::all(),
        }
    }

    fn opened_handle(messages: &[FeedMessage]) -> ChannelHandle {
        match &messages[0] {
            FeedMessage::Opened {
                result: Ok(handle), ..
            } => *handle,
            other => panic!("expected open completion, got {:?}", other),
        }
    }

    #[test]
    fn test_open_completes_on_poll() {
        let mut feed = LocalFeed::new();
        let user = UserId::random();

        feed.open_channel(request(1, TableName::Expenses, user)).unwrap();
        assert_eq!(feed.open_channel_count(), 0);

        let messages = feed.poll();
        assert_eq!(messages.len(), 1);
        let handle = opened_handle(&messages);
        assert!(feed.is_open(handle));
        assert_eq!(feed.subscribers(TableName::Expenses), vec![user]);
    }

    #[test]
    fn test_fan_out_respects_ownership() {
        let mut feed = LocalFeed::new();
        let alice = UserId::random();
        let bob = UserId::random();

        feed.open_channel(request(1, TableName::Expenses, alice)).unwrap();
        let alice_channel = opened_handle(&feed.poll());
        feed.open_channel(request(2, TableName::Expenses, bob)).unwrap();
        feed.poll();

        feed.publisher().publish(ChangeEvent::created(
            TableName::Expenses,
            json!({"id": "e1", "user_id": alice.to_string(), "amount": 12.5}),
        ));

        let messages = feed.poll();
        assert_eq!(messages.len(), 1);
        match &messages[0] {
            FeedMessage::Change { channel, event } => {
                assert_eq!(*channel, alice_channel);
                assert_eq!(event.kind, EventKind::Created);
            }
            other => panic!("expected change, got {:?}", other),
        }
    }

    #[test]
    fn test_fan_out_skips_unsubscribed_kinds() {
        let mut feed = LocalFeed::new();
        let user = UserId::random();
        let mut req = request(1, TableName::Profiles, user);
        req.kinds = EventKinds::only([EventKind::Updated]).unwrap();
        feed.open_channel(req).unwrap();
        feed.poll();

        assert!(feed.publish(ChangeEvent::created(
            TableName::Profiles,
            json!({"id": user.to_string()}),
        )));
        assert!(feed.poll().is_empty());
    }

    #[test]
    fn test_failed_and_rejected_opens() {
        let mut feed = LocalFeed::new();
        let user = UserId::random();

        feed.fail_next_opens(1);
        feed.open_channel(request(1, TableName::Expenses, user)).unwrap();
        let messages = feed.poll();
        assert!(matches!(
            &messages[0],
            FeedMessage::Opened { result: Err(RealtimeError::OpenFailed { .. }), .. }
        ));
        assert_eq!(feed.open_channel_count(), 0);

        feed.set_unavailable(true);
        let err = feed
            .open_channel(request(2, TableName::Expenses, user))
            .unwrap_err();
        assert!(matches!(err, RealtimeError::FeedUnavailable(_)));
        assert_eq!(feed.calls().len(), 1);
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut feed = LocalFeed::new();
        let user = UserId::random();
        feed.open_channel(request(1, TableName::Expenses, user)).unwrap();
        let handle = opened_handle(&feed.poll());

        feed.close_channel(handle);
        feed.close_channel(handle);
        assert_eq!(feed.open_channel_count(), 0);
        assert_eq!(feed.calls().len(), 3);
    }

    #[test]
    fn test_raw_event_reaches_closed_channel() {
        let mut feed = LocalFeed::new();
        let user = UserId::random();
        feed.open_channel(request(1, TableName::Expenses, user)).unwrap();
        let handle = opened_handle(&feed.poll());
        feed.close_channel(handle);

        assert!(feed.push_raw(
            handle,
            ChangeEvent::created(TableName::Expenses, json!({"id": "late"})),
        ));
        let messages = feed.poll();
        assert_eq!(messages.len(), 1);
        assert!(matches!(
            &messages[0],
            FeedMessage::Change { channel, .. } if *channel == handle
        ));
    }
}
