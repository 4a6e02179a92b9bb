//! Scheduler facade: composes the queue, cache, coordinator, and monitor
//! behind a single entry point.
//!
//! The engine is an explicit value, constructed once and passed by handle to
//! callers. There is no hidden global; tests build as many isolated engines
//! as they need.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::core::{
    AppResult, EngineError, EngineMetrics, ExecutionCoordinator, HandlerRegistry, JournalSink,
    MetricsSnapshot, PerformanceMonitor, Spawn, TaskId, TaskRecord, TaskSpec, TuningPolicy,
};
use crate::infra::cache::ResultCache;
use crate::runtime::TokioSpawner;
use crate::util::clock::now_ms;

/// Read-only snapshot of engine state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    /// Whether the engine is accepting submissions.
    pub is_running: bool,
    /// In-flight executions.
    pub active_task_count: u32,
    /// Queued, not-yet-admitted tasks.
    pub queued_task_count: usize,
    /// Counter and tuning snapshot.
    pub metrics: MetricsSnapshot,
}

/// The task engine: the only entry point external callers use.
///
/// `start` and `stop` gate submission; execution itself is asynchronous and
/// callers poll [`TaskEngine::task`] for terminal status. Stopping lets
/// in-flight tasks finish and only blocks new submissions.
pub struct TaskEngine<S = TokioSpawner> {
    coordinator: ExecutionCoordinator<S>,
    monitor: Arc<PerformanceMonitor>,
    cache: Arc<ResultCache>,
    running: AtomicBool,
    shutdown: Mutex<Option<watch::Sender<bool>>>,
    interval: Duration,
    spawner: S,
}

impl TaskEngine<TokioSpawner> {
    /// Build an engine on the calling context's tokio runtime.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration.
    pub fn new(config: EngineConfig, handlers: HandlerRegistry) -> AppResult<Self> {
        Self::with_spawner(config, handlers, None, TokioSpawner::current())
    }
}

impl<S> TaskEngine<S>
where
    S: Spawn + Clone + Send + Sync + 'static,
{
    /// Build an engine from configuration, handlers, an optional journal
    /// sink, and a spawner.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration.
    pub fn with_spawner(
        config: EngineConfig,
        handlers: HandlerRegistry,
        journal: Option<Box<dyn JournalSink>>,
        spawner: S,
    ) -> AppResult<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("engine config invalid: {e}"))?;

        let metrics = Arc::new(EngineMetrics::new());
        let max_parallel = Arc::new(AtomicU32::new(config.max_parallel_tasks));
        let cache = Arc::new(ResultCache::new(Duration::from_millis(config.cache_ttl_ms)));
        let monitor = Arc::new(PerformanceMonitor::new(
            Arc::clone(&metrics),
            Arc::clone(&max_parallel),
            TuningPolicy {
                floor: config.min_parallel_tasks,
                ceiling: config.max_parallel_ceiling,
                high_water_ms: config.high_water_ms,
                low_water_ms: config.low_water_ms,
            },
        ));
        let coordinator = ExecutionCoordinator::new(
            &config,
            handlers,
            Arc::clone(&cache),
            metrics,
            max_parallel,
            journal,
            spawner.clone(),
        );

        Ok(Self {
            coordinator,
            monitor,
            cache,
            running: AtomicBool::new(false),
            shutdown: Mutex::new(None),
            interval: Duration::from_millis(config.optimization_interval_ms),
            spawner,
        })
    }

    /// Mark the engine running and launch the optimization cycle. Idempotent.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::AcqRel) {
            return;
        }
        let (tx, rx) = watch::channel(false);
        *self.shutdown.lock() = Some(tx);
        self.spawner.spawn(optimization_cycle(
            Arc::clone(&self.monitor),
            Arc::clone(&self.cache),
            self.interval,
            rx,
        ));
        info!("engine started");
    }

    /// Stop accepting submissions and cancel the optimization cycle.
    /// Idempotent. In-flight tasks run to completion and still record their
    /// outcomes.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(tx) = self.shutdown.lock().take() {
            let _ = tx.send(true);
        }
        info!("engine stopped");
    }

    /// Whether the engine is accepting submissions.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Submit a task; returns its id immediately, execution is asynchronous.
    ///
    /// # Errors
    ///
    /// [`EngineError::Stopped`] when the engine is not running, plus the
    /// coordinator's validation and queue-depth rejections.
    pub fn submit(&self, spec: TaskSpec) -> Result<TaskId, EngineError> {
        if !self.is_running() {
            return Err(EngineError::Stopped);
        }
        self.coordinator.submit(spec)
    }

    /// Look up a task across pending, running, and retained history.
    #[must_use]
    pub fn task(&self, id: TaskId) -> Option<TaskRecord> {
        self.coordinator.task(id)
    }

    /// Read-only snapshot of engine state.
    #[must_use]
    pub fn status(&self) -> EngineStatus {
        let active = self.coordinator.active_count();
        EngineStatus {
            is_running: self.is_running(),
            active_task_count: active,
            queued_task_count: self.coordinator.queued_count(),
            metrics: self
                .monitor
                .metrics()
                .snapshot(active, self.coordinator.max_parallel()),
        }
    }
}

/// Periodic tuning and cache-sweep loop; exits on shutdown signal or when
/// the engine is dropped.
async fn optimization_cycle(
    monitor: Arc<PerformanceMonitor>,
    cache: Arc<ResultCache>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick fires immediately; skip it so the cycle runs on cadence.
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let limit = monitor.optimize(now_ms());
                let swept = cache.sweep_expired(now_ms());
                debug!(limit, swept, "optimization cycle ran");
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("optimization cycle stopped");
                    break;
                }
            }
        }
    }
}
