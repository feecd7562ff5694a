//! Observability events for finquest
//!
//! Every line the logger emits names one of these events. Events are
//! explicit and typed so call sites cannot drift apart.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration loaded
    ConfigLoaded,
    /// Profile store created
    StoreInitialized,

    // Progression
    /// XP gain persisted
    XpGained,
    /// A gain crossed a level boundary
    LevelUp,
    /// XP gain could not be persisted
    XpPersistFailed,
    /// Pending XP gain retried
    XpRetry,
    /// Snapshot replaced from a profile change event
    XpSynced,

    // Realtime
    /// Channel open requested from the feed
    ChannelOpenRequested,
    /// Channel open completed
    ChannelOpened,
    /// Channel could not be opened
    ChannelOpenFailed,
    /// Channel closed
    ChannelClosed,
    /// Event from a superseded channel dropped
    StaleEventDropped,
    /// Identity change applied to all registrations
    IdentityChanged,

    // Notifications
    /// User-visible notification raised
    Notification,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::StoreInitialized => "STORE_INITIALIZED",

            Event::XpGained => "XP_GAINED",
            Event::LevelUp => "LEVEL_UP",
            Event::XpPersistFailed => "XP_PERSIST_FAILED",
            Event::XpRetry => "XP_RETRY",
            Event::XpSynced => "XP_SYNCED",

            Event::ChannelOpenRequested => "CHANNEL_OPEN_REQUESTED",
            Event::ChannelOpened => "CHANNEL_OPENED",
            Event::ChannelOpenFailed => "CHANNEL_OPEN_FAILED",
            Event::ChannelClosed => "CHANNEL_CLOSED",
            Event::StaleEventDropped => "STALE_EVENT_DROPPED",
            Event::IdentityChanged => "IDENTITY_CHANGED",

            Event::Notification => "NOTIFICATION",
        }
    }

    /// Returns true if this event reports a failure
    pub fn is_failure(&self) -> bool {
        matches!(self, Event::XpPersistFailed | Event::ChannelOpenFailed)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
