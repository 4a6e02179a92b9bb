//! Configuration models for the engine and its timers.

pub mod engine;

pub use engine::EngineConfig;
