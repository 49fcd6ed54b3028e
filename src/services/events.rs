// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::constants::{EVENT_BROADCAST_CAPACITY, EVENT_LOG_CAPACITY};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for EventLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EventLevel::Info => "info",
            EventLevel::Success => "success",
            EventLevel::Warning => "warning",
            EventLevel::Error => "error",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEvent {
    pub at: DateTime<Utc>,
    pub level: EventLevel,
    pub message: String,
}

/// Append-only, bounded operator log. Every event is mirrored to `tracing`
/// and fanned out to live subscribers.
pub struct EventLog {
    capacity: usize,
    events: Mutex<VecDeque<LogEvent>>,
    live: broadcast::Sender<LogEvent>,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(EVENT_LOG_CAPACITY)
    }
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        let (live, _) = broadcast::channel(EVENT_BROADCAST_CAPACITY);
        Self {
            capacity: capacity.max(1),
            events: Mutex::new(VecDeque::new()),
            live,
        }
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(EventLevel::Info, message.into());
    }

    pub fn success(&self, message: impl Into<String>) {
        self.emit(EventLevel::Success, message.into());
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.emit(EventLevel::Warning, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(EventLevel::Error, message.into());
    }

    pub fn emit(&self, level: EventLevel, message: String) {
        match level {
            EventLevel::Info | EventLevel::Success => {
                tracing::info!(target: "events", %level, "{}", message)
            }
            EventLevel::Warning => tracing::warn!(target: "events", "{}", message),
            EventLevel::Error => tracing::error!(target: "events", "{}", message),
        }

        let event = LogEvent {
            at: Utc::now(),
            level,
            message,
        };
        {
            let mut events = self.events.lock().unwrap_or_else(|e| e.into_inner());
            if events.len() >= self.capacity {
                events.pop_front();
            }
            events.push_back(event.clone());
        }
        // No receivers is fine.
        let _ = self.live.send(event);
    }

    /// Retained events, oldest first.
    pub fn snapshot(&self) -> Vec<LogEvent> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogEvent> {
        self.live.subscribe()
    }
}
