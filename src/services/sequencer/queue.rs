// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl EntryStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, EntryStatus::Completed | EntryStatus::Failed)
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntryStatus::Pending => "pending",
            EntryStatus::Processing => "processing",
            EntryStatus::Completed => "completed",
            EntryStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueEntry {
    pub id: u64,
    pub account: Address,
    pub description: String,
    pub status: EntryStatus,
    pub enqueued_at: DateTime<Utc>,
}

/// Visible listing of queued transaction tasks across all lanes.
#[derive(Default)]
pub struct QueueBoard {
    next_id: AtomicU64,
    entries: Mutex<BTreeMap<u64, QueueEntry>>,
}

impl QueueBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a Pending entry and return its id. Ids start at 1.
    pub fn enqueue(&self, account: Address, description: String) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let entry = QueueEntry {
            id,
            account,
            description,
            status: EntryStatus::Pending,
            enqueued_at: Utc::now(),
        };
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, entry);
        id
    }

    pub fn set_status(&self, id: u64, status: EntryStatus) {
        if let Some(entry) = self
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get_mut(&id)
        {
            entry.status = status;
        }
    }

    pub fn remove(&self, id: u64) -> Option<QueueEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id)
    }

    /// Non-terminal entries ordered by id.
    pub fn snapshot(&self) -> Vec<QueueEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .filter(|e| !e.status.is_terminal())
            .cloned()
            .collect()
    }
}
