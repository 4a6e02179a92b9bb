//! Runtime adapters for spawning task execution.

pub mod tokio_spawner;

pub use tokio_spawner::TokioSpawner;
