// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User-facing notices emitted alongside tracker and auth operations.
//!
//! Delivery is fire-and-forget: notices sent while nobody is subscribed are
//! dropped, and slow subscribers lose the oldest notices.

use serde::Serialize;
use tokio::sync::broadcast;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// A human-readable message for the notification surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Notice {
    pub fn success(title: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, title)
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, title)
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, title)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn new(level: NoticeLevel, title: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            description: None,
        }
    }
}

/// Broadcast handle shared by the services that emit notices.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notice>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }

    /// Emit a notice. Never fails; an error only means nobody is listening.
    pub fn notify(&self, notice: Notice) {
        tracing::debug!(level = ?notice.level, title = %notice.title, "Notice");
        let _ = self.tx.send(notice);
    }
}
