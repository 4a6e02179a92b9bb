//! # Agent Task Engine
//!
//! An in-process scheduling and execution engine for AI automation agent
//! workloads.
//!
//! Automation agents generate bursts of heterogeneous work: code-generation
//! runs, test sweeps, deployment steps, monitoring probes. This library
//! provides the layer that admits that work in priority order, runs it under
//! a bounded degree of parallelism, memoizes identical requests, and adapts
//! its own concurrency limit to observed latency.
//!
//! ## Core Problem Solved
//!
//! Agent workloads behave differently from typical request/response traffic:
//!
//! - **Bursty submission**: an agent may queue dozens of tasks in one turn
//! - **Duplicate work**: identical requests are common and worth memoizing
//! - **Unbounded handlers**: a wedged handler must not wedge the engine
//! - **Variable cost**: the right concurrency limit depends on observed latency
//!
//! ## Key Features
//!
//! - **Priority admission**: strict high > medium > low ordering, FIFO within
//!   a tier, enforced by a stable pending queue
//! - **Bounded parallelism**: a runtime-adjustable concurrency limit enforced
//!   with lock-free reservation
//! - **Result caching**: fingerprint-keyed memoization with TTL expiry
//! - **Timeout enforcement**: every execution races a deadline; late results
//!   are discarded
//! - **Adaptive tuning**: a background cycle grows or shrinks the concurrency
//!   limit from a smoothed latency signal
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use agent_task_engine::builders::EngineBuilder;
//! use agent_task_engine::core::{Priority, TaskKind, TaskSpec};
//! use serde_json::json;
//!
//! let engine = EngineBuilder::new()
//!     .with_simulated_handlers()
//!     .build()?;
//! engine.start();
//!
//! let id = engine.submit(TaskSpec {
//!     kind: TaskKind::Testing,
//!     description: "run integration suite".into(),
//!     priority: Priority::High,
//!     payload: json!({ "suite": "integration" }),
//! })?;
//!
//! // Execution is asynchronous; poll the record for a terminal status.
//! let record = engine.task(id);
//! ```
//!
//! For complete examples, see `tests/engine_scheduling_test.rs`.

#![deny(warnings)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core task model, coordinator, handlers, metrics, and journal.
pub mod core;
/// Configuration model for the engine.
pub mod config;
/// Builders to construct an engine from configuration.
pub mod builders;
/// Infrastructure: pending queue and result cache.
pub mod infra;
/// Runtime adapters for spawning task execution.
pub mod runtime;
/// Scheduler facade: the public entry point.
pub mod engine;
/// Shared utilities.
pub mod util;

pub use engine::{EngineStatus, TaskEngine};
