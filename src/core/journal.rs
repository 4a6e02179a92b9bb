//! Task lifecycle journal.
//!
//! Optional pluggable sink recording every lifecycle transition for
//! diagnostics. The engine works without one; tests attach the in-memory
//! sink to assert on event sequences.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::core::TaskId;
use crate::util::clock::now_ms;

/// Lifecycle action recorded in the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalAction {
    /// Submission accepted.
    Submitted,
    /// Submission satisfied from the result cache.
    CacheHit,
    /// Task placed on the pending queue.
    Enqueued,
    /// Task admitted into execution.
    Started,
    /// Task finished successfully.
    Completed,
    /// Task failed (handler error or panic).
    Failed,
    /// Task failed its deadline.
    TimedOut,
}

/// A recorded lifecycle event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEvent {
    /// Related task.
    pub task_id: TaskId,
    /// What happened.
    pub action: JournalAction,
    /// Timestamp (ms since epoch).
    pub at_ms: u64,
    /// Additional context (failure reasons, queue depth).
    pub detail: Option<String>,
}

/// Journal sink abstraction.
pub trait JournalSink: Send {
    /// Record a lifecycle event.
    fn record(&mut self, event: JournalEvent);
}

/// Bounded in-memory journal for diagnostics and tests.
pub struct InMemoryJournal {
    events: VecDeque<JournalEvent>,
    max_events: usize,
}

impl InMemoryJournal {
    /// Create a journal with a bounded buffer; the oldest event is dropped
    /// once the bound is reached.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events),
            max_events,
        }
    }

    /// Snapshot of stored events, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<JournalEvent> {
        self.events.iter().cloned().collect()
    }
}

impl JournalSink for InMemoryJournal {
    fn record(&mut self, event: JournalEvent) {
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Build an event stamped with the current time.
#[must_use]
pub fn journal_event(
    task_id: TaskId,
    action: JournalAction,
    detail: Option<String>,
) -> JournalEvent {
    JournalEvent {
        task_id,
        action,
        at_ms: now_ms(),
        detail,
    }
}
