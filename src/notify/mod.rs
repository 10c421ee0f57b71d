//! User-visible notifications.
//!
//! The runner only knows message keys; sinks decide how (and whether) the
//! localized text reaches the user. Delivery is fire-and-forget.

pub mod messages;

use std::sync::{Arc, Mutex, PoisonError};

pub const MIGRATION_STARTED: &str = "migration.started";
pub const MIGRATION_FINISHED: &str = "migration.finished";
pub const MIGRATION_FAILED: &str = "migration.failed";

/// Parameters attached to an error notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorParams {
    pub error: String,
}

pub trait NotificationSink: Send + Sync {
    fn info(&self, key: &str);
    fn error(&self, key: &str, params: &ErrorParams);
}

/// Writes notifications to the `tracing` log at debug level, keyed so log
/// output can be matched against what the user was shown.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn info(&self, key: &str) {
        tracing::debug!(key, "{}", messages::localize(key, None));
    }

    fn error(&self, key: &str, params: &ErrorParams) {
        tracing::debug!(key, error = %params.error, "{}", messages::localize(key, Some(params)));
    }
}

/// Prints notifications to stderr for CLI users.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleSink {
    color: bool,
}

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

impl ConsoleSink {
    /// Colour is on unless `NO_COLOR` is set or stderr is not a terminal.
    pub fn new() -> Self {
        let color = std::env::var_os("NO_COLOR").is_none() && atty::is(atty::Stream::Stderr);
        Self { color }
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.color {
            format!("{}{}{}", color, text, RESET)
        } else {
            text.to_string()
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSink for ConsoleSink {
    fn info(&self, key: &str) {
        eprintln!("{}", self.paint(GREEN, &messages::localize(key, None)));
    }

    fn error(&self, key: &str, params: &ErrorParams) {
        eprintln!("{}", self.paint(RED, &messages::localize(key, Some(params))));
    }
}

/// Forwards every notification to each inner sink in order.
#[derive(Default, Clone)]
pub struct Notifications {
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl NotificationSink + 'static) -> Self {
        self.sinks.push(Arc::new(sink));
        self
    }
}

impl NotificationSink for Notifications {
    fn info(&self, key: &str) {
        for sink in &self.sinks {
            sink.info(key);
        }
    }

    fn error(&self, key: &str, params: &ErrorParams) {
        for sink in &self.sinks {
            sink.error(key, params);
        }
    }
}

/// A notification as seen by [`CollectingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Info { key: String },
    Error { key: String, error: String },
}

/// Keeps every notification in memory, for embedders that surface them
/// elsewhere and for tests.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<Notification>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Notification> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, event: Notification) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl NotificationSink for CollectingSink {
    fn info(&self, key: &str) {
        self.push(Notification::Info {
            key: key.to_string(),
        });
    }

    fn error(&self, key: &str, params: &ErrorParams) {
        self.push(Notification::Error {
            key: key.to_string(),
            error: params.error.clone(),
        });
    }
}

impl<T: NotificationSink + ?Sized> NotificationSink for Arc<T> {
    fn info(&self, key: &str) {
        (**self).info(key)
    }

    fn error(&self, key: &str, params: &ErrorParams) {
        (**self).error(key, params)
    }
}
