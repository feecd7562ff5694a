//! # Realtime
//!
//! Change-feed subscriptions for mounted UI contexts.
//!
//! - **Feed**: the change-feed contract ([`ChangeFeed`]) and an in-process
//!   implementation ([`LocalFeed`])
//! - **Subscriptions**: the [`SubscriptionManager`] lifecycle
//! - **Cache**: rows per (table, user) kept fresh from change events

pub mod cache;
pub mod errors;
pub mod event;
pub mod feed;
pub mod local;
pub mod subscription;

pub use cache::TableCache;
pub use errors::{RealtimeError, RealtimeResult};
pub use event::{ChangeEvent, EventKind, EventKinds, TableName};
pub use feed::{ChangeFeed, ChannelHandle, FeedMessage, OpenRequest, OpenRequestId};
pub use local::{FeedCall, FeedPublisher, LocalFeed};
pub use subscription::{
    ChangeHandler, ContextId, DeliveryOutcome, PumpReport, RegistrationKey, RegistrationRequest,
    RegistrationState, SubscriptionManager, ToastMessages,
};
