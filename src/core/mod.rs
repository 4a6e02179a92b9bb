//! Core task model, coordination, and observation.

pub mod error;
pub mod task;
pub mod handler;
pub mod coordinator;
pub mod monitor;
pub mod journal;

pub use error::{AppResult, EngineError};
pub use task::{FailureReason, Priority, TaskId, TaskKind, TaskRecord, TaskSpec, TaskStatus};
pub use handler::{HandlerRegistry, SimulatedHandler, TaskHandler};
pub use coordinator::{ExecutionCoordinator, Spawn};
pub use monitor::{EngineMetrics, MetricsSnapshot, PerformanceMonitor, TuningPolicy};
pub use journal::{journal_event, InMemoryJournal, JournalAction, JournalEvent, JournalSink};
