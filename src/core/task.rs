//! Task model: kinds, priorities, the status state machine, and records.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::util::clock::now_ms;

/// Unique task identifier, assigned at submission.
pub type TaskId = uuid::Uuid;

/// Closed set of work categories. Each kind maps to a registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Code generation and review work.
    Development,
    /// Test authoring and test-run work.
    Testing,
    /// Release and rollout work.
    Deployment,
    /// Health checks and probes.
    Monitoring,
}

impl TaskKind {
    /// All known kinds, in registry order.
    pub const ALL: [Self; 4] = [
        Self::Development,
        Self::Testing,
        Self::Deployment,
        Self::Monitoring,
    ];

    /// Stable lowercase name, used in fingerprints and log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Testing => "testing",
            Self::Deployment => "deployment",
            Self::Monitoring => "monitoring",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scheduling priority. Derived ordering: `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Background work; dequeued last.
    Low,
    /// Default tier.
    Medium,
    /// Urgent work; dequeued first.
    High,
}

/// Why a task reached the `Failed` state.
///
/// Timeouts are kept distinct from handler-reported errors so callers and
/// tests can tell a wedged handler from a broken one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The handler returned an error.
    Handler(String),
    /// The handler panicked; the message is best-effort.
    Panic(String),
    /// The handler did not finish within the configured deadline.
    Timeout,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handler(msg) => write!(f, "handler error: {msg}"),
            Self::Panic(msg) => write!(f, "handler panicked: {msg}"),
            Self::Timeout => write!(f, "timed out"),
        }
    }
}

/// Status of a task in the engine lifecycle.
///
/// Transitions are monotonic: `Pending -> Running -> {Completed, Failed}`.
/// The coordinator is the sole owner of transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Queued, waiting for admission.
    Pending,
    /// Admitted and executing.
    Running,
    /// Finished successfully.
    Completed,
    /// Finished with a failure.
    Failed(FailureReason),
}

impl TaskStatus {
    /// Whether the task has reached a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed(_))
    }
}

/// A task submission: everything the caller specifies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Work category; selects the handler.
    pub kind: TaskKind,
    /// Free-form description of the unit of work.
    pub description: String,
    /// Queue ordering tier.
    pub priority: Priority,
    /// Opaque structured input passed to the handler.
    pub payload: Value,
}

/// Full task record tracked by the engine across its lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Unique identifier.
    pub id: TaskId,
    /// Work category.
    pub kind: TaskKind,
    /// Free-form description.
    pub description: String,
    /// Queue ordering tier.
    pub priority: Priority,
    /// Handler input.
    pub payload: Value,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// Submission timestamp (ms since epoch).
    pub created_at_ms: u64,
    /// Admission timestamp; unset until running.
    pub started_at_ms: Option<u64>,
    /// Terminal timestamp; unset until completed or failed.
    pub completed_at_ms: Option<u64>,
    /// Handler output; set only on success.
    pub result: Option<Value>,
}

impl TaskRecord {
    /// Build a fresh `Pending` record from a submission.
    #[must_use]
    pub fn pending(spec: TaskSpec) -> Self {
        Self {
            id: TaskId::new_v4(),
            kind: spec.kind,
            description: spec.description,
            priority: spec.priority,
            payload: spec.payload,
            status: TaskStatus::Pending,
            created_at_ms: now_ms(),
            started_at_ms: None,
            completed_at_ms: None,
            result: None,
        }
    }

    /// Synthesize an already-completed record from a cached result.
    ///
    /// Cache hits never queue or execute; the record is terminal from birth.
    #[must_use]
    pub fn from_cache(spec: TaskSpec, result: Value) -> Self {
        let at = now_ms();
        Self {
            id: TaskId::new_v4(),
            kind: spec.kind,
            description: spec.description,
            priority: spec.priority,
            payload: spec.payload,
            status: TaskStatus::Completed,
            created_at_ms: at,
            started_at_ms: Some(at),
            completed_at_ms: Some(at),
            result: Some(result),
        }
    }

    /// Advance `Pending -> Running`.
    pub(crate) fn mark_running(&mut self, at_ms: u64) {
        debug_assert!(matches!(self.status, TaskStatus::Pending));
        self.status = TaskStatus::Running;
        self.started_at_ms = Some(at_ms);
    }

    /// Advance `Running -> Completed` with the handler output.
    pub(crate) fn mark_completed(&mut self, result: Value, at_ms: u64) {
        debug_assert!(matches!(self.status, TaskStatus::Running));
        self.status = TaskStatus::Completed;
        self.completed_at_ms = Some(at_ms);
        self.result = Some(result);
    }

    /// Advance `Running -> Failed` with a terminal reason.
    pub(crate) fn mark_failed(&mut self, reason: FailureReason, at_ms: u64) {
        debug_assert!(matches!(self.status, TaskStatus::Running));
        self.status = TaskStatus::Failed(reason);
        self.completed_at_ms = Some(at_ms);
    }
}
