//! Execution coordinator: admission, bounded parallelism, and timeouts.
//!
//! The coordinator owns every task lifecycle transition. Submissions either
//! short-circuit through the result cache or join the pending queue; the
//! admission pump moves queued tasks into execution whenever a slot is free,
//! and every completion re-triggers the pump so capacity is reclaimed
//! immediately.
//!
//! Concurrency control uses a lock-free `AtomicU32` slot counter reserved
//! with a CAS loop against the runtime-adjustable limit, with separate
//! `parking_lot` mutexes for the queue and the task table.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::core::journal::{journal_event, JournalAction, JournalSink};
use crate::core::monitor::EngineMetrics;
use crate::core::{
    EngineError, FailureReason, HandlerRegistry, TaskId, TaskKind, TaskRecord, TaskSpec,
};
use crate::infra::cache::{fingerprint, ResultCache};
use crate::infra::queue::{PendingQueue, QueuedTask};
use crate::util::clock::now_ms;

/// Abstraction for spawning task execution on a runtime.
pub trait Spawn {
    /// Spawn an async task that runs to completion in the background.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// Every record the engine still answers status queries for.
///
/// Pending and running records are never evicted; terminal records are
/// retained in completion order up to `history_limit`, oldest evicted first.
struct TaskTable {
    records: HashMap<TaskId, TaskRecord>,
    finished: VecDeque<TaskId>,
    history_limit: usize,
}

impl TaskTable {
    fn new(history_limit: usize) -> Self {
        Self {
            records: HashMap::new(),
            finished: VecDeque::new(),
            history_limit,
        }
    }

    fn insert(&mut self, record: TaskRecord) {
        self.records.insert(record.id, record);
    }

    /// Move a terminal record into bounded history.
    fn retire(&mut self, id: TaskId) {
        self.finished.push_back(id);
        while self.finished.len() > self.history_limit {
            if let Some(evicted) = self.finished.pop_front() {
                self.records.remove(&evicted);
            }
        }
    }
}

/// State shared between the coordinator handle and its spawned executions.
struct Shared {
    timeout: Duration,
    queue: Mutex<PendingQueue>,
    table: Mutex<TaskTable>,
    /// Lock-free count of in-flight executions.
    active: AtomicU32,
    /// Concurrency limit; written by the performance monitor at runtime.
    max_parallel: Arc<AtomicU32>,
    /// Submission sequence for FIFO tie-breaking.
    seq: AtomicU64,
    handlers: HandlerRegistry,
    cache: Arc<ResultCache>,
    metrics: Arc<EngineMetrics>,
    journal: Option<Mutex<Box<dyn JournalSink>>>,
}

impl Shared {
    fn journal(&self, id: TaskId, action: JournalAction, detail: Option<String>) {
        if let Some(sink) = &self.journal {
            sink.lock().record(journal_event(id, action, detail));
        }
    }
}

/// The scheduler's concurrency core.
///
/// Cheap to clone; all clones admit into the same queue and slot pool.
pub struct ExecutionCoordinator<S> {
    shared: Arc<Shared>,
    spawner: S,
}

impl<S: Clone> Clone for ExecutionCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            spawner: self.spawner.clone(),
        }
    }
}

impl<S> ExecutionCoordinator<S>
where
    S: Spawn + Clone + Send + Sync + 'static,
{
    /// Create a coordinator from configuration and shared components.
    ///
    /// `max_parallel` is shared with the performance monitor, which adjusts
    /// it between admissions.
    #[must_use]
    pub fn new(
        config: &EngineConfig,
        handlers: HandlerRegistry,
        cache: Arc<ResultCache>,
        metrics: Arc<EngineMetrics>,
        max_parallel: Arc<AtomicU32>,
        journal: Option<Box<dyn JournalSink>>,
        spawner: S,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                timeout: Duration::from_millis(config.task_timeout_ms),
                queue: Mutex::new(PendingQueue::new(config.max_queue_depth)),
                table: Mutex::new(TaskTable::new(config.history_limit)),
                active: AtomicU32::new(0),
                max_parallel,
                seq: AtomicU64::new(0),
                handlers,
                cache,
                metrics,
                journal: journal.map(Mutex::new),
            }),
            spawner,
        }
    }

    /// Submit a task for execution; returns its id immediately.
    ///
    /// A fresh fingerprint match in the result cache completes the task on
    /// the spot without queueing or executing. Otherwise the task is
    /// enqueued pending and admission is attempted at once.
    ///
    /// # Errors
    ///
    /// [`EngineError::Validation`] for malformed submissions and
    /// [`EngineError::QueueFull`] at the queue depth bound; in both cases
    /// nothing was enqueued.
    pub fn submit(&self, spec: TaskSpec) -> Result<TaskId, EngineError> {
        self.validate(&spec)?;

        let key = fingerprint(spec.kind, &spec.description, &spec.payload);
        let now = now_ms();
        if let Some(result) = self.shared.cache.lookup(&key, now) {
            self.shared.metrics.record_cache_hit();
            let record = TaskRecord::from_cache(spec, result);
            let id = record.id;
            {
                let mut table = self.shared.table.lock();
                table.insert(record);
                table.retire(id);
            }
            self.shared.journal(id, JournalAction::CacheHit, None);
            debug!(task = %id, "submission served from cache");
            return Ok(id);
        }

        let record = TaskRecord::pending(spec);
        let id = record.id;
        let ticket = QueuedTask {
            id,
            priority: record.priority,
            seq: self.shared.seq.fetch_add(1, Ordering::Relaxed),
        };
        let (kind, priority) = (record.kind, record.priority);

        // Record first so an immediate admission always finds it.
        self.shared.table.lock().insert(record);
        if let Err(err) = self.shared.queue.lock().push(ticket) {
            self.shared.table.lock().records.remove(&id);
            warn!(task = %id, error = %err, "submission rejected");
            return Err(err);
        }
        self.shared.journal(id, JournalAction::Submitted, None);
        self.shared.journal(id, JournalAction::Enqueued, None);
        info!(task = %id, kind = %kind, priority = ?priority, "task enqueued");

        Self::pump(&self.shared, &self.spawner);
        Ok(id)
    }

    /// Look up a task across pending, running, and retained history.
    #[must_use]
    pub fn task(&self, id: TaskId) -> Option<TaskRecord> {
        self.shared.table.lock().records.get(&id).cloned()
    }

    /// Number of in-flight executions.
    #[must_use]
    pub fn active_count(&self) -> u32 {
        self.shared.active.load(Ordering::Acquire)
    }

    /// Number of queued, not-yet-admitted tasks.
    #[must_use]
    pub fn queued_count(&self) -> usize {
        self.shared.queue.lock().len()
    }

    /// Concurrency limit currently in force.
    #[must_use]
    pub fn max_parallel(&self) -> u32 {
        self.shared.max_parallel.load(Ordering::Acquire)
    }

    fn validate(&self, spec: &TaskSpec) -> Result<(), EngineError> {
        if spec.description.trim().is_empty() {
            return Err(EngineError::Validation("description must not be empty".into()));
        }
        if spec.payload.is_null() {
            return Err(EngineError::Validation("payload must not be null".into()));
        }
        if !self.shared.handlers.contains(spec.kind) {
            return Err(EngineError::Validation(format!(
                "no handler registered for kind `{}`",
                spec.kind
            )));
        }
        Ok(())
    }

    /// Admission pump: move queued tasks into execution while slots remain.
    ///
    /// Runs on every submission and every completion. Pops before reserving;
    /// a failed reservation re-enqueues the ticket (same sequence, so its
    /// place in the tier is kept) and stops.
    fn pump(shared: &Arc<Shared>, spawner: &S) {
        loop {
            if shared.active.load(Ordering::Acquire) >= shared.max_parallel.load(Ordering::Acquire)
            {
                break;
            }

            let Some(ticket) = shared.queue.lock().pop() else {
                break;
            };

            if !Self::try_reserve_slot(shared) {
                // Raced another admission path; put the ticket back. Its
                // sequence is unchanged, so its place in the tier is kept.
                if let Err(err) = shared.queue.lock().push(ticket) {
                    error!(error = %err, "failed to re-enqueue after lost reservation");
                }
                // A slot may have been released while we held the ticket, in
                // which case that completion's pump saw an empty queue.
                if shared.active.load(Ordering::Acquire)
                    < shared.max_parallel.load(Ordering::Acquire)
                {
                    continue;
                }
                break;
            }

            let now = now_ms();
            let launch = {
                let mut table = shared.table.lock();
                table.records.get_mut(&ticket.id).map(|record| {
                    record.mark_running(now);
                    (record.kind, record.payload.clone())
                })
            };
            let Some((kind, payload)) = launch else {
                // Record evicted between enqueue and admission; give the
                // slot back and keep draining.
                error!(task = %ticket.id, "queued task missing from table");
                shared.active.fetch_sub(1, Ordering::Release);
                continue;
            };

            shared.journal(ticket.id, JournalAction::Started, None);
            info!(task = %ticket.id, kind = %kind, "task admitted");
            Self::launch(Arc::clone(shared), spawner.clone(), ticket.id, kind, payload);
        }
    }

    /// Reserve one execution slot with a CAS loop against the current limit.
    fn try_reserve_slot(shared: &Shared) -> bool {
        let mut current = shared.active.load(Ordering::Acquire);
        loop {
            if current >= shared.max_parallel.load(Ordering::Acquire) {
                return false;
            }
            match shared.active.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Spawn one execution: handler on its own task, raced against the
    /// deadline. A panic is isolated to a failure; a deadline aborts the
    /// handler so late results are discarded.
    fn launch(shared: Arc<Shared>, spawner: S, id: TaskId, kind: TaskKind, payload: Value) {
        let timeout = shared.timeout;
        let respawner = spawner.clone();
        spawner.spawn(async move {
            let verdict = match shared.handlers.get(kind) {
                Some(handler) => {
                    let started = Instant::now();
                    let join = tokio::spawn(async move { handler.run(payload).await });
                    let abort = join.abort_handle();
                    let outcome = tokio::time::timeout(timeout, join).await;
                    let elapsed_ms =
                        u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                    let verdict = match outcome {
                        Ok(Ok(Ok(result))) => Ok(result),
                        Ok(Ok(Err(err))) => Err(FailureReason::Handler(err.to_string())),
                        Ok(Err(join_err)) => Err(FailureReason::Panic(join_err.to_string())),
                        Err(_) => {
                            abort.abort();
                            Err(FailureReason::Timeout)
                        }
                    };
                    (verdict, elapsed_ms)
                }
                // Unreachable past validation; fail the record rather than
                // wedge it in `running`.
                None => (
                    Err(FailureReason::Handler(format!(
                        "no handler registered for kind `{kind}`"
                    ))),
                    0,
                ),
            };
            Self::finish(&shared, id, verdict.0, verdict.1);
            // Capacity was reclaimed; admit whatever is next.
            Self::pump(&shared, &respawner);
        });
    }

    /// Terminal bookkeeping for one execution.
    fn finish(
        shared: &Arc<Shared>,
        id: TaskId,
        verdict: Result<Value, FailureReason>,
        elapsed_ms: u64,
    ) {
        let now = now_ms();
        let succeeded = verdict.is_ok();
        // Metrics first: once the record flips terminal, observers expect the
        // counters to already include it.
        shared.metrics.record_attempt(elapsed_ms, succeeded);
        let mut journal_entry = None;
        {
            let mut table = shared.table.lock();
            if let Some(record) = table.records.get_mut(&id) {
                match verdict {
                    Ok(result) => {
                        let key = fingerprint(record.kind, &record.description, &record.payload);
                        shared.cache.store(key, result.clone(), now);
                        record.mark_completed(result, now);
                        info!(task = %id, elapsed_ms, "task completed");
                        journal_entry = Some((JournalAction::Completed, None));
                    }
                    Err(reason) => {
                        warn!(task = %id, elapsed_ms, reason = %reason, "task failed");
                        let action = if matches!(reason, FailureReason::Timeout) {
                            JournalAction::TimedOut
                        } else {
                            JournalAction::Failed
                        };
                        journal_entry = Some((action, Some(reason.to_string())));
                        record.mark_failed(reason, now);
                    }
                }
                table.retire(id);
            } else {
                error!(task = %id, "finished task missing from table");
            }
        }
        if let Some((action, detail)) = journal_entry {
            shared.journal(id, action, detail);
        }
        shared.active.fetch_sub(1, Ordering::Release);
    }
}
