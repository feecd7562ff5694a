//! # Notifications
//!
//! Fire-and-forget user-visible messages (toasts). The surface that
//! renders them lives outside this crate.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::observability::{log_event_with_fields, Event};

/// Visual variant of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Default,
    /// Error styling
    Destructive,
}

impl Variant {
    fn as_str(&self) -> &'static str {
        match self {
            Variant::Default => "default",
            Variant::Destructive => "destructive",
        }
    }
}

/// A user-visible notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub variant: Variant,
}

impl Notification {
    /// Default-styled notification
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: Variant::Default,
        }
    }

    /// Error-styled notification
    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            variant: Variant::Destructive,
            ..Self::new(title, description)
        }
    }
}

/// Notification surface collaborator
pub trait Notifier: Send + Sync {
    /// Show `notification`. Must not fail the caller.
    fn notify(&self, notification: Notification);
}

/// Notifier that records everything, for tests and headless callers
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications raised so far, oldest first
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Titles raised so far, oldest first
    pub fn titles(&self) -> Vec<String> {
        self.sent().into_iter().map(|n| n.title).collect()
    }

    /// Forget recorded notifications
    pub fn clear(&self) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.clear();
        }
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notification: Notification) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(notification);
        }
    }
}

/// Notifier that writes each notification as a log line
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        log_event_with_fields(
            Event::Notification,
            &[
                ("title", &notification.title),
                ("description", &notification.description),
                ("variant", notification.variant.as_str()),
            ],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_notifier_records_in_order() {
        let notifier = MemoryNotifier::new();
        notifier.notify(Notification::new("first", "a"));
        notifier.notify(Notification::destructive("second", "b"));

        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].variant, Variant::Default);
        assert_eq!(sent[1].variant, Variant::Destructive);
        assert_eq!(notifier.titles(), vec!["first", "second"]);

        notifier.clear();
        assert!(notifier.sent().is_empty());
    }

    #[test]
    fn test_variant_defaults_when_missing() {
        let n: Notification =
            serde_json::from_str(r#"{"title": "t", "description": "d"}"#).unwrap();
        assert_eq!(n.variant, Variant::Default);
    }

    #[test]
    fn test_log_notifier_does_not_panic() {
        LogNotifier.notify(Notification::new("Saved", "ok"));
    }
}
