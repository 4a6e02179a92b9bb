//! Engine configuration structures.

use serde::{Deserialize, Serialize};

/// Engine configuration.
///
/// Every knob has a production default, so `EngineConfig::default()` is a
/// valid configuration. The concurrency limit starts at
/// `max_parallel_tasks` and is tuned at runtime within
/// `[min_parallel_tasks, max_parallel_ceiling]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Initial upper bound on concurrent executions.
    pub max_parallel_tasks: u32,
    /// Floor the tuner may shrink the limit to.
    pub min_parallel_tasks: u32,
    /// Ceiling the tuner may grow the limit to.
    pub max_parallel_ceiling: u32,
    /// Freshness window for cached results (ms).
    pub cache_ttl_ms: u64,
    /// Per-task execution deadline (ms).
    pub task_timeout_ms: u64,
    /// Cadence of the tuning and cache-sweep cycle (ms).
    pub optimization_interval_ms: u64,
    /// Smoothed average duration above this shrinks the limit (ms).
    pub high_water_ms: u64,
    /// Smoothed average duration below this grows the limit (ms).
    pub low_water_ms: u64,
    /// Pending-queue depth bound.
    pub max_queue_depth: usize,
    /// Finished records retained for status queries.
    pub history_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_parallel_tasks: 10,
            min_parallel_tasks: 5,
            max_parallel_ceiling: 15,
            cache_ttl_ms: 300_000,
            task_timeout_ms: 30_000,
            optimization_interval_ms: 60_000,
            high_water_ms: 5_000,
            low_water_ms: 1_000,
            max_queue_depth: 10_000,
            history_limit: 1_024,
        }
    }
}

impl EngineConfig {
    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a human-readable message for the first violation found.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_parallel_tasks == 0 {
            return Err("min_parallel_tasks must be greater than 0".into());
        }
        if self.min_parallel_tasks > self.max_parallel_ceiling {
            return Err("min_parallel_tasks must not exceed max_parallel_ceiling".into());
        }
        if self.max_parallel_tasks < self.min_parallel_tasks
            || self.max_parallel_tasks > self.max_parallel_ceiling
        {
            return Err(
                "max_parallel_tasks must lie within [min_parallel_tasks, max_parallel_ceiling]"
                    .into(),
            );
        }
        if self.cache_ttl_ms == 0 {
            return Err("cache_ttl_ms must be greater than 0".into());
        }
        if self.task_timeout_ms == 0 {
            return Err("task_timeout_ms must be greater than 0".into());
        }
        if self.optimization_interval_ms == 0 {
            return Err("optimization_interval_ms must be greater than 0".into());
        }
        if self.low_water_ms >= self.high_water_ms {
            return Err("low_water_ms must be below high_water_ms".into());
        }
        if self.max_queue_depth == 0 {
            return Err("max_queue_depth must be greater than 0".into());
        }
        if self.history_limit == 0 {
            return Err("history_limit must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse engine configuration from a JSON string and validate.
    ///
    /// Absent fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns a message for parse failures or invalid values.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from the environment, starting at defaults.
    ///
    /// Loads `.env` via dotenvy if present, then applies
    /// `TASK_ENGINE_*` overrides (e.g. `TASK_ENGINE_MAX_PARALLEL_TASKS`,
    /// `TASK_ENGINE_CACHE_TTL_MS`, `TASK_ENGINE_TASK_TIMEOUT_MS`).
    ///
    /// # Errors
    ///
    /// Returns a message for unparseable overrides or invalid values.
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let mut cfg = Self::default();
        override_var("TASK_ENGINE_MAX_PARALLEL_TASKS", &mut cfg.max_parallel_tasks)?;
        override_var("TASK_ENGINE_MIN_PARALLEL_TASKS", &mut cfg.min_parallel_tasks)?;
        override_var("TASK_ENGINE_MAX_PARALLEL_CEILING", &mut cfg.max_parallel_ceiling)?;
        override_var("TASK_ENGINE_CACHE_TTL_MS", &mut cfg.cache_ttl_ms)?;
        override_var("TASK_ENGINE_TASK_TIMEOUT_MS", &mut cfg.task_timeout_ms)?;
        override_var(
            "TASK_ENGINE_OPTIMIZATION_INTERVAL_MS",
            &mut cfg.optimization_interval_ms,
        )?;
        override_var("TASK_ENGINE_HIGH_WATER_MS", &mut cfg.high_water_ms)?;
        override_var("TASK_ENGINE_LOW_WATER_MS", &mut cfg.low_water_ms)?;
        override_var("TASK_ENGINE_MAX_QUEUE_DEPTH", &mut cfg.max_queue_depth)?;
        override_var("TASK_ENGINE_HISTORY_LIMIT", &mut cfg.history_limit)?;
        cfg.validate()?;
        Ok(cfg)
    }
}

/// Apply one environment override when the variable is set.
fn override_var<T: std::str::FromStr>(name: &str, slot: &mut T) -> Result<(), String> {
    if let Ok(raw) = std::env::var(name) {
        *slot = raw
            .parse()
            .map_err(|_| format!("{name} has unparseable value `{raw}`"))?;
    }
    Ok(())
}
