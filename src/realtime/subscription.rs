//! # Subscription Manager
//!
//! Keeps at most one change-feed channel per (table, context) pair, always
//! scoped to the current user, and forwards change events to the handler
//! registered for that pair.
//!
//! ## Lifecycle
//!
//! `Unregistered -> Registering -> Active -> Unregistering -> Unregistered`
//!
//! - Events are delivered only while `Active`, and only from the channel
//!   that made the registration active. Anything else is stale and dropped.
//! - A deregistration during `Registering` takes effect when the open
//!   completes; the channel is closed right away.
//! - On identity change every channel that no longer matches is closed
//!   before any replacement is opened. While the identity is `loading`
//!   open channels of the same user stay open; no new ones are opened.
//! - Open failures are logged and leave the registration `Unregistered`
//!   until the next mount or identity change.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::errors::RealtimeResult;
use super::event::{ChangeEvent, EventKind, EventKinds, TableName};
use super::feed::{ChangeFeed, ChannelHandle, FeedMessage, OpenRequest, OpenRequestId};
use crate::auth::{Identity, UserId};
use crate::notify::{Notification, Notifier};
use crate::observability::{log_event_with_fields, Event, Logger};

/// Change handler supplied by the owning UI context
pub type ChangeHandler = Box<dyn FnMut(&ChangeEvent) + Send>;

/// Owning UI context (a mounted component or screen)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(String);

impl ContextId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ContextId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// (context, table) pair owning at most one channel
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistrationKey {
    pub context: ContextId,
    pub table: TableName,
}

/// Notification text per event kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToastMessages {
    created: Option<String>,
    updated: Option<String>,
    deleted: Option<String>,
}

impl ToastMessages {
    /// No notifications
    pub fn none() -> Self {
        Self::default()
    }

    /// Stock text for every kind
    pub fn defaults() -> Self {
        Self {
            created: Some(EventKind::Created.default_message().to_string()),
            updated: Some(EventKind::Updated.default_message().to_string()),
            deleted: Some(EventKind::Deleted.default_message().to_string()),
        }
    }

    /// Set the text for `kind`
    pub fn with(mut self, kind: EventKind, message: impl Into<String>) -> Self {
        let message = Some(message.into());
        match kind {
            EventKind::Created => self.created = message,
            EventKind::Updated => self.updated = message,
            EventKind::Deleted => self.deleted = message,
        }
        self
    }

    pub fn get(&self, kind: EventKind) -> Option<&str> {
        match kind {
            EventKind::Created => self.created.as_deref(),
            EventKind::Updated => self.updated.as_deref(),
            EventKind::Deleted => self.deleted.as_deref(),
        }
    }
}

/// What a context asks for when it mounts
pub struct RegistrationRequest {
    pub table: TableName,
    pub kinds: EventKinds,
    pub toasts: ToastMessages,
    handler: ChangeHandler,
}

impl RegistrationRequest {
    /// Observe every kind on `table` without notifications
    pub fn new<H>(table: TableName, handler: H) -> Self
    where
        H: FnMut(&ChangeEvent) + Send + 'static,
    {
        Self {
            table,
            kinds: EventKinds::all(),
            toasts: ToastMessages::none(),
            handler: Box::new(handler),
        }
    }

    /// Restrict to `kinds`
    pub fn events(mut self, kinds: EventKinds) -> Self {
        self.kinds = kinds;
        self
    }

    /// Raise notifications after the handler runs
    pub fn with_toasts(mut self, toasts: ToastMessages) -> Self {
        self.toasts = toasts;
        self
    }
}

impl fmt::Debug for RegistrationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationRequest")
            .field("table", &self.table)
            .field("kinds", &self.kinds)
            .field("toasts", &self.toasts)
            .finish_non_exhaustive()
    }
}

/// Externally visible registration state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    Unregistered,
    Registering,
    Active,
    /// Held only while the feed's close call runs
    Unregistering,
}

/// What happened to one incoming event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Handler invoked
    Delivered,
    /// Channel is current but the event kind or table is not subscribed
    Filtered,
    /// Channel is not the active one for any registration; dropped
    Stale,
}

/// Counts from one `pump`
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PumpReport {
    /// Open completions processed
    pub completions: usize,
    /// Events handed to handlers
    pub delivered: usize,
    /// Events on current channels that were not subscribed
    pub filtered: usize,
    /// Events from superseded channels
    pub stale: usize,
}

#[derive(Debug)]
enum Slot {
    Idle,
    Opening {
        request: OpenRequestId,
        user: UserId,
        kinds: EventKinds,
    },
    Open {
        channel: ChannelHandle,
        user: UserId,
        kinds: EventKinds,
    },
    Closing,
}

struct Registration {
    kinds: EventKinds,
    toasts: ToastMessages,
    handler: ChangeHandler,
    mounted: bool,
    slot: Slot,
}

impl Registration {
    fn state(&self) -> RegistrationState {
        match self.slot {
            Slot::Idle => RegistrationState::Unregistered,
            Slot::Opening { .. } => RegistrationState::Registering,
            Slot::Open { .. } => RegistrationState::Active,
            Slot::Closing => RegistrationState::Unregistering,
        }
    }

    /// (user, kinds) the channel should be scoped to under `identity`
    fn target(&self, identity: &Identity) -> Option<(UserId, EventKinds)> {
        if !self.mounted {
            return None;
        }
        identity.active_user().map(|u| (u, self.kinds.clone()))
    }

    fn channel_matches(&self, identity: &Identity) -> bool {
        match &self.slot {
            // Kept through a session refresh (`loading`) as long as the
            // user is unchanged; only new opens wait for it
            Slot::Open { user, kinds, .. } => {
                self.mounted && identity.user_id == Some(*user) && *kinds == self.kinds
            }
            _ => false,
        }
    }
}

/// Realtime subscription manager over a [`ChangeFeed`]
pub struct SubscriptionManager<F: ChangeFeed> {
    feed: F,
    notifier: Arc<dyn Notifier>,
    identity: Identity,
    registrations: HashMap<RegistrationKey, Registration>,
    by_request: HashMap<OpenRequestId, RegistrationKey>,
    by_channel: HashMap<ChannelHandle, RegistrationKey>,
    next_request: u64,
}

impl<F: ChangeFeed> SubscriptionManager<F> {
    /// Create a manager for the given identity
    pub fn new(feed: F, notifier: Arc<dyn Notifier>, identity: Identity) -> Self {
        Self {
            feed,
            notifier,
            identity,
            registrations: HashMap::new(),
            by_request: HashMap::new(),
            by_channel: HashMap::new(),
            next_request: 1,
        }
    }

    /// Register `request` for `context`.
    ///
    /// Re-registering the same (context, table) while `Registering` or
    /// `Active` for the same user and kinds only swaps the handler.
    pub fn register(
        &mut self,
        context: impl Into<ContextId>,
        request: RegistrationRequest,
    ) -> RegistrationState {
        let key = RegistrationKey {
            context: context.into(),
            table: request.table,
        };

        match self.registrations.get_mut(&key) {
            Some(existing) => {
                existing.kinds = request.kinds;
                existing.toasts = request.toasts;
                existing.handler = request.handler;
                existing.mounted = true;
            }
            None => {
                self.registrations.insert(
                    key.clone(),
                    Registration {
                        kinds: request.kinds,
                        toasts: request.toasts,
                        handler: request.handler,
                        mounted: true,
                        slot: Slot::Idle,
                    },
                );
            }
        }

        self.reconcile(&key);
        self.state(&key.context, key.table)
    }

    /// Drop the registration for (context, table). Idempotent.
    pub fn deregister(&mut self, context: &ContextId, table: TableName) {
        let key = RegistrationKey {
            context: context.clone(),
            table,
        };
        if let Some(registration) = self.registrations.get_mut(&key) {
            registration.mounted = false;
            self.reconcile(&key);
        }
    }

    /// Drop every registration owned by `context`
    pub fn unmount(&mut self, context: &ContextId) {
        let tables: Vec<TableName> = self
            .registrations
            .keys()
            .filter(|k| &k.context == context)
            .map(|k| k.table)
            .collect();
        for table in tables {
            self.deregister(context, table);
        }
    }

    /// Drop every registration
    pub fn shutdown(&mut self) {
        let contexts: Vec<ContextId> = self
            .registrations
            .keys()
            .map(|k| k.context.clone())
            .collect();
        for context in contexts {
            self.unmount(&context);
        }
    }

    /// Apply a new identity from the identity provider
    pub fn set_identity(&mut self, identity: Identity) {
        if identity == self.identity {
            return;
        }
        self.identity = identity;

        let user = identity
            .active_user()
            .map(|u| u.to_string())
            .unwrap_or_default();
        let loading = identity.loading.to_string();
        log_event_with_fields(
            Event::IdentityChanged,
            &[("user_id", &user), ("loading", &loading)],
        );

        let mut keys: Vec<RegistrationKey> = self.registrations.keys().cloned().collect();
        keys.sort_by(|a, b| (&a.context, a.table).cmp(&(&b.context, b.table)));

        // Close everything that no longer matches before opening anything
        for key in &keys {
            let stale = self
                .registrations
                .get(key)
                .is_some_and(|r| matches!(r.slot, Slot::Open { .. }) && !r.channel_matches(&identity));
            if stale {
                self.close_slot(key);
            }
        }
        for key in &keys {
            self.reconcile(key);
        }
    }

    /// Handle an open completion from the feed
    pub fn complete_open(
        &mut self,
        request: OpenRequestId,
        result: RealtimeResult<ChannelHandle>,
    ) {
        let Some(key) = self.by_request.remove(&request) else {
            if let Ok(channel) = result {
                // Nobody is waiting for it; never leave it open
                self.feed.close_channel(channel);
            }
            return;
        };

        let Some(registration) = self.registrations.get_mut(&key) else {
            if let Ok(channel) = result {
                self.feed.close_channel(channel);
            }
            return;
        };

        let (user, kinds) = match &registration.slot {
            Slot::Opening {
                request: pending,
                user,
                kinds,
            } if *pending == request => (*user, kinds.clone()),
            _ => {
                if let Ok(channel) = result {
                    self.feed.close_channel(channel);
                }
                return;
            }
        };

        match result {
            Ok(channel) => {
                registration.slot = Slot::Open {
                    channel,
                    user,
                    kinds,
                };
                self.by_channel.insert(channel, key.clone());
                log_event_with_fields(
                    Event::ChannelOpened,
                    &[
                        ("context", key.context.as_str()),
                        ("table", key.table.as_str()),
                        ("channel", &channel.to_string()),
                        ("user_id", &user.to_string()),
                    ],
                );
                // Teardown or identity change may have happened meanwhile
                self.reconcile(&key);
            }
            Err(err) => {
                registration.slot = Slot::Idle;
                log_event_with_fields(
                    Event::ChannelOpenFailed,
                    &[
                        ("context", key.context.as_str()),
                        ("table", key.table.as_str()),
                        ("error", &err.to_string()),
                    ],
                );
                // Retry only when the wanted scope moved on since the attempt
                let moved_on = registration.target(&self.identity) != Some((user, kinds));
                if moved_on {
                    self.reconcile(&key);
                }
            }
        }
    }

    /// Deliver one event that arrived on `channel`
    pub fn deliver(&mut self, channel: ChannelHandle, event: ChangeEvent) -> DeliveryOutcome {
        let current = self
            .by_channel
            .get(&channel)
            .and_then(|key| self.registrations.get_mut(key).map(|r| (key, r)));

        let Some((key, registration)) = current else {
            Logger::trace(
                Event::StaleEventDropped.as_str(),
                &[
                    ("channel", &channel.to_string()),
                    ("table", event.table.as_str()),
                    ("kind", event.kind.as_str()),
                ],
            );
            return DeliveryOutcome::Stale;
        };

        let kinds = match &registration.slot {
            Slot::Open {
                channel: active, kinds, ..
            } if *active == channel => kinds,
            _ => return DeliveryOutcome::Stale,
        };

        if event.table != key.table || !kinds.contains(event.kind) {
            return DeliveryOutcome::Filtered;
        }

        (registration.handler)(&event);

        if let Some(message) = registration.toasts.get(event.kind) {
            self.notifier.notify(Notification::new(
                format!("{} Updated", key.table.display_name()),
                message,
            ));
        }

        DeliveryOutcome::Delivered
    }

    /// Drain the feed and process everything it produced, in order
    pub fn pump(&mut self) -> PumpReport {
        let mut report = PumpReport::default();

        for message in self.feed.poll() {
            match message {
                FeedMessage::Opened { request, result } => {
                    self.complete_open(request, result);
                    report.completions += 1;
                }
                FeedMessage::Change { channel, event } => match self.deliver(channel, event) {
                    DeliveryOutcome::Delivered => report.delivered += 1,
                    DeliveryOutcome::Filtered => report.filtered += 1,
                    DeliveryOutcome::Stale => report.stale += 1,
                },
            }
        }

        report
    }

    /// State of the registration for (context, table)
    pub fn state(&self, context: &ContextId, table: TableName) -> RegistrationState {
        let key = RegistrationKey {
            context: context.clone(),
            table,
        };
        self.registrations
            .get(&key)
            .map(Registration::state)
            .unwrap_or(RegistrationState::Unregistered)
    }

    /// Active channel for (context, table), if any
    pub fn channel(&self, context: &ContextId, table: TableName) -> Option<ChannelHandle> {
        let key = RegistrationKey {
            context: context.clone(),
            table,
        };
        match self.registrations.get(&key).map(|r| &r.slot) {
            Some(Slot::Open { channel, .. }) => Some(*channel),
            _ => None,
        }
    }

    /// Number of registrations in `Active`
    pub fn active_count(&self) -> usize {
        self.registrations
            .values()
            .filter(|r| matches!(r.slot, Slot::Open { .. }))
            .count()
    }

    /// Number of tracked registrations, including ones awaiting teardown
    pub fn registration_count(&self) -> usize {
        self.registrations.len()
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub fn feed(&self) -> &F {
        &self.feed
    }

    pub fn feed_mut(&mut self) -> &mut F {
        &mut self.feed
    }

    /// Bring the registration at `key` in line with the identity and its
    /// mount state
    fn reconcile(&mut self, key: &RegistrationKey) {
        let Some(registration) = self.registrations.get(key) else {
            return;
        };
        let target = registration.target(&self.identity);

        match &registration.slot {
            Slot::Open { .. } => {
                if registration.channel_matches(&self.identity) {
                    return;
                }
                self.close_slot(key);
            }
            // Resolved when the open completes
            Slot::Opening { .. } | Slot::Closing => return,
            Slot::Idle => {}
        }

        match target {
            Some((user, kinds)) => self.open_slot(key, user, kinds),
            None => {
                let unmounted = self.registrations.get(key).is_some_and(|r| !r.mounted);
                if unmounted {
                    self.registrations.remove(key);
                }
            }
        }
    }

    fn open_slot(&mut self, key: &RegistrationKey, user: UserId, kinds: EventKinds) {
        let id = OpenRequestId::new(self.next_request);
        self.next_request += 1;

        let request = OpenRequest {
            id,
            table: key.table,
            user_id: user,
            kinds: kinds.clone(),
        };

        log_event_with_fields(
            Event::ChannelOpenRequested,
            &[
                ("context", key.context.as_str()),
                ("table", key.table.as_str()),
                ("topic", &request.topic()),
                ("user_id", &user.to_string()),
                ("events", &kinds.to_string()),
            ],
        );

        let submitted = self.feed.open_channel(request);
        let Some(registration) = self.registrations.get_mut(key) else {
            return;
        };

        match submitted {
            Ok(()) => {
                registration.slot = Slot::Opening {
                    request: id,
                    user,
                    kinds,
                };
                self.by_request.insert(id, key.clone());
            }
            Err(err) => {
                registration.slot = Slot::Idle;
                log_event_with_fields(
                    Event::ChannelOpenFailed,
                    &[
                        ("context", key.context.as_str()),
                        ("table", key.table.as_str()),
                        ("error", &err.to_string()),
                    ],
                );
            }
        }
    }

    fn close_slot(&mut self, key: &RegistrationKey) {
        let Some(registration) = self.registrations.get_mut(key) else {
            return;
        };
        let channel = match registration.slot {
            Slot::Open { channel, .. } => channel,
            _ => return,
        };
        registration.slot = Slot::Closing;

        self.by_channel.remove(&channel);
        self.feed.close_channel(channel);
        registration.slot = Slot::Idle;

        log_event_with_fields(
            Event::ChannelClosed,
            &[
                ("context", key.context.as_str()),
                ("table", key.table.as_str()),
                ("channel", &channel.to_string()),
            ],
        );
    }
}

impl<F: ChangeFeed> Drop for SubscriptionManager<F> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
