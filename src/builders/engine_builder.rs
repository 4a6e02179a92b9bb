//! Builder assembling a task engine from configuration and handlers.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::core::{
    AppResult, HandlerRegistry, JournalSink, Spawn, TaskHandler, TaskKind,
};
use crate::engine::TaskEngine;
use crate::runtime::TokioSpawner;

/// Builder for [`TaskEngine`].
///
/// Defaults to [`EngineConfig::default`], an empty handler registry, and no
/// journal. Configuration is validated at build time.
#[derive(Default)]
pub struct EngineBuilder {
    config: EngineConfig,
    handlers: HandlerRegistry,
    journal: Option<Box<dyn JournalSink>>,
}

impl EngineBuilder {
    /// Create a builder with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a handler for a task kind.
    #[must_use]
    pub fn with_handler(mut self, kind: TaskKind, handler: Arc<dyn TaskHandler>) -> Self {
        self.handlers.register(kind, handler);
        self
    }

    /// Register simulated handlers for every task kind, replacing any
    /// registered so far.
    #[must_use]
    pub fn with_simulated_handlers(mut self) -> Self {
        self.handlers = HandlerRegistry::simulated();
        self
    }

    /// Attach a journal sink.
    #[must_use]
    pub fn with_journal(mut self, journal: Box<dyn JournalSink>) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Build an engine on the calling context's tokio runtime.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration.
    pub fn build(self) -> AppResult<TaskEngine<TokioSpawner>> {
        self.build_with_spawner(TokioSpawner::current())
    }

    /// Build an engine on the given spawner.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration.
    pub fn build_with_spawner<S>(self, spawner: S) -> AppResult<TaskEngine<S>>
    where
        S: Spawn + Clone + Send + Sync + 'static,
    {
        TaskEngine::with_spawner(self.config, self.handlers, self.journal, spawner)
    }
}
