//! Tests for builder modules

use agent_task_engine::builders::EngineBuilder;
use agent_task_engine::config::EngineConfig;

#[tokio::test]
async fn test_builder_defaults_produce_engine() {
    let engine = EngineBuilder::new().with_simulated_handlers().build().unwrap();
    assert!(!engine.is_running());

    let status = engine.status();
    assert_eq!(status.active_task_count, 0);
    assert_eq!(status.queued_task_count, 0);
    assert_eq!(status.metrics.max_parallel_tasks, 10);
}

#[tokio::test]
async fn test_builder_rejects_invalid_config() {
    let result = EngineBuilder::new()
        .with_config(EngineConfig {
            max_parallel_tasks: 0,
            ..EngineConfig::default()
        })
        .build();
    assert!(result.is_err());
}
