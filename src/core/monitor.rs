//! Performance metrics and adaptive concurrency tuning.
//!
//! Counters are lock-free atomics updated from concurrent completion paths.
//! The monitor's optimization step is an additive-increase/additive-decrease
//! controller over the coordinator's shared concurrency limit: a slow
//! smoothed average shrinks the limit, a fast one grows it, always inside
//! configured bounds.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Process-wide engine counters. One instance lives as long as the engine.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Terminal outcomes observed, failures included.
    tasks_processed: AtomicU64,
    /// Successful completions.
    tasks_succeeded: AtomicU64,
    /// Handler errors, panics, and timeouts.
    tasks_failed: AtomicU64,
    /// Exponentially smoothed per-task duration: `avg' = (avg + d) / 2`.
    avg_processing_ms: AtomicU64,
    /// Submissions satisfied from the result cache.
    cache_hits: AtomicU64,
    /// Timestamp of the last tuning step (ms since epoch).
    last_optimization_ms: AtomicU64,
}

impl EngineMetrics {
    /// Create zeroed metrics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a terminal attempt.
    ///
    /// Failures count toward throughput and the latency signal, not toward
    /// successes.
    pub fn record_attempt(&self, duration_ms: u64, succeeded: bool) {
        self.tasks_processed.fetch_add(1, Ordering::Relaxed);
        if succeeded {
            self.tasks_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.tasks_failed.fetch_add(1, Ordering::Relaxed);
        }
        // Smooth under contention with a CAS update; the first sample seeds
        // the average directly instead of being halved against zero.
        let _ = self
            .avg_processing_ms
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |avg| {
                Some(if avg == 0 {
                    duration_ms
                } else {
                    avg.midpoint(duration_ms)
                })
            });
    }

    /// Record a submission served from the cache.
    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Current smoothed average duration in milliseconds.
    #[must_use]
    pub fn average_processing_ms(&self) -> u64 {
        self.avg_processing_ms.load(Ordering::Relaxed)
    }

    /// Point-in-time view, combined with coordinator-side gauges.
    #[must_use]
    pub fn snapshot(&self, parallel_executions: u32, max_parallel_tasks: u32) -> MetricsSnapshot {
        MetricsSnapshot {
            tasks_processed: self.tasks_processed.load(Ordering::Relaxed),
            tasks_succeeded: self.tasks_succeeded.load(Ordering::Relaxed),
            tasks_failed: self.tasks_failed.load(Ordering::Relaxed),
            average_processing_ms: self.avg_processing_ms.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            parallel_executions,
            max_parallel_tasks,
            last_optimization_ms: self.last_optimization_ms.load(Ordering::Relaxed),
        }
    }

    fn stamp_optimization(&self, now_ms: u64) {
        self.last_optimization_ms.store(now_ms, Ordering::Relaxed);
    }
}

/// Serializable snapshot of engine metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Terminal outcomes observed, failures included.
    pub tasks_processed: u64,
    /// Successful completions.
    pub tasks_succeeded: u64,
    /// Handler errors, panics, and timeouts.
    pub tasks_failed: u64,
    /// Smoothed per-task duration (ms).
    pub average_processing_ms: u64,
    /// Submissions satisfied from the result cache.
    pub cache_hits: u64,
    /// In-flight executions at snapshot time.
    pub parallel_executions: u32,
    /// Current concurrency limit.
    pub max_parallel_tasks: u32,
    /// Timestamp of the last tuning step (ms since epoch).
    pub last_optimization_ms: u64,
}

/// Bounds and watermarks driving the tuner.
#[derive(Debug, Clone)]
pub struct TuningPolicy {
    /// Lowest allowed concurrency limit.
    pub floor: u32,
    /// Highest allowed concurrency limit.
    pub ceiling: u32,
    /// Smoothed average above this shrinks the limit (ms).
    pub high_water_ms: u64,
    /// Smoothed average below this grows the limit (ms).
    pub low_water_ms: u64,
}

/// Observes the latency signal and adjusts the shared concurrency limit.
///
/// The limit is shared with the coordinator as an atomic; adjustments only
/// affect future admissions, never tasks already running.
pub struct PerformanceMonitor {
    metrics: Arc<EngineMetrics>,
    max_parallel: Arc<AtomicU32>,
    policy: TuningPolicy,
}

impl PerformanceMonitor {
    /// Create a monitor over shared metrics and the shared limit.
    #[must_use]
    pub fn new(
        metrics: Arc<EngineMetrics>,
        max_parallel: Arc<AtomicU32>,
        policy: TuningPolicy,
    ) -> Self {
        Self {
            metrics,
            max_parallel,
            policy,
        }
    }

    /// One additive step of the controller; returns the limit now in force.
    ///
    /// No samples yet (average of zero) leaves the limit untouched.
    pub fn optimize(&self, now_ms: u64) -> u32 {
        let avg = self.metrics.average_processing_ms();
        let current = self.max_parallel.load(Ordering::Acquire);

        let next = if avg > self.policy.high_water_ms && current > self.policy.floor {
            current - 1
        } else if avg > 0 && avg < self.policy.low_water_ms && current < self.policy.ceiling {
            current + 1
        } else {
            current
        };

        if next == current {
            debug!(avg_ms = avg, limit = current, "concurrency limit unchanged");
        } else {
            self.max_parallel.store(next, Ordering::Release);
            info!(avg_ms = avg, from = current, to = next, "adjusted concurrency limit");
        }
        self.metrics.stamp_optimization(now_ms);
        next
    }

    /// Shared metrics handle.
    #[must_use]
    pub fn metrics(&self) -> &Arc<EngineMetrics> {
        &self.metrics
    }
}
