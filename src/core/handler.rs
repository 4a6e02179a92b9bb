//! Handler strategy: the pluggable execution seam.
//!
//! The coordinator never knows what a task *does*; it dispatches the payload
//! to whatever [`TaskHandler`] is registered for the task's kind. Real
//! integrations register their own handlers; [`HandlerRegistry::simulated`]
//! ships sleep-and-report stand-ins for every kind.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::task::TaskKind;

/// Abstraction for executing a task payload and producing a result.
///
/// Handlers run concurrently under the engine's timeout; a handler that errors
/// or overruns its deadline fails the task but never the engine.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use agent_task_engine::core::TaskHandler;
/// use serde_json::{json, Value};
///
/// struct ReviewHandler;
///
/// #[async_trait]
/// impl TaskHandler for ReviewHandler {
///     async fn run(&self, payload: Value) -> anyhow::Result<Value> {
///         let diff = payload["diff"].as_str().unwrap_or_default();
///         Ok(json!({ "comments": review(diff) }))
///     }
/// }
/// ```
#[async_trait]
pub trait TaskHandler: Send + Sync + 'static {
    /// Execute the payload and return the handler output.
    async fn run(&self, payload: Value) -> anyhow::Result<Value>;
}

/// Registry mapping each task kind to its handler.
///
/// Submissions for a kind with no registered handler are rejected at the API
/// boundary, before anything is enqueued.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<TaskKind, Arc<dyn TaskHandler>>,
}

impl HandlerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with a simulated handler for every known kind.
    #[must_use]
    pub fn simulated() -> Self {
        let mut registry = Self::new();
        registry.register(
            TaskKind::Development,
            Arc::new(SimulatedHandler::new("development", Duration::from_millis(150))),
        );
        registry.register(
            TaskKind::Testing,
            Arc::new(SimulatedHandler::new("testing", Duration::from_millis(100))),
        );
        registry.register(
            TaskKind::Deployment,
            Arc::new(SimulatedHandler::new("deployment", Duration::from_millis(200))),
        );
        registry.register(
            TaskKind::Monitoring,
            Arc::new(SimulatedHandler::new("monitoring", Duration::from_millis(50))),
        );
        registry
    }

    /// Register (or replace) the handler for a kind.
    pub fn register(&mut self, kind: TaskKind, handler: Arc<dyn TaskHandler>) {
        self.handlers.insert(kind, handler);
    }

    /// Chainable form of [`register`](Self::register).
    #[must_use]
    pub fn with_handler(mut self, kind: TaskKind, handler: Arc<dyn TaskHandler>) -> Self {
        self.register(kind, handler);
        self
    }

    /// Look up the handler for a kind.
    #[must_use]
    pub fn get(&self, kind: TaskKind) -> Option<Arc<dyn TaskHandler>> {
        self.handlers.get(&kind).cloned()
    }

    /// Whether a handler is registered for the kind.
    #[must_use]
    pub fn contains(&self, kind: TaskKind) -> bool {
        self.handlers.contains_key(&kind)
    }
}

/// Stand-in handler: sleeps for a fixed latency, then reports success.
///
/// Echoes the payload back so tests can assert the round trip.
pub struct SimulatedHandler {
    label: String,
    latency: Duration,
}

impl SimulatedHandler {
    /// Create a simulated handler with the given label and latency.
    pub fn new(label: impl Into<String>, latency: Duration) -> Self {
        Self {
            label: label.into(),
            latency,
        }
    }
}

#[async_trait]
impl TaskHandler for SimulatedHandler {
    async fn run(&self, payload: Value) -> anyhow::Result<Value> {
        tokio::time::sleep(self.latency).await;
        Ok(json!({
            "handler": self.label,
            "input": payload,
            "outcome": "ok",
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_registry_covers_all_kinds() {
        let registry = HandlerRegistry::simulated();
        for kind in TaskKind::ALL {
            assert!(registry.contains(kind), "missing handler for {kind}");
        }
    }

    #[test]
    fn test_empty_registry() {
        let registry = HandlerRegistry::new();
        assert!(!registry.contains(TaskKind::Testing));
        assert!(registry.get(TaskKind::Testing).is_none());
    }

    #[tokio::test]
    async fn test_simulated_handler_echoes_payload() {
        let handler = SimulatedHandler::new("probe", Duration::from_millis(1));
        let out = handler.run(json!({ "target": "api" })).await.unwrap();
        assert_eq!(out["handler"], "probe");
        assert_eq!(out["input"]["target"], "api");
    }
}
