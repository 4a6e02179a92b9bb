//! Tests for configuration validation

use agent_task_engine::config::EngineConfig;

#[test]
fn test_default_config_is_valid() {
    let cfg = EngineConfig::default();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.max_parallel_tasks, 10);
    assert_eq!(cfg.min_parallel_tasks, 5);
    assert_eq!(cfg.max_parallel_ceiling, 15);
    assert_eq!(cfg.cache_ttl_ms, 300_000);
    assert_eq!(cfg.task_timeout_ms, 30_000);
    assert_eq!(cfg.optimization_interval_ms, 60_000);
}

#[test]
fn test_invalid_limit_outside_bounds() {
    let cfg = EngineConfig {
        max_parallel_tasks: 20,
        ..EngineConfig::default()
    };
    assert!(cfg.validate().is_err());

    let cfg = EngineConfig {
        max_parallel_tasks: 2,
        ..EngineConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_invalid_zero_values() {
    for cfg in [
        EngineConfig {
            min_parallel_tasks: 0,
            ..EngineConfig::default()
        },
        EngineConfig {
            cache_ttl_ms: 0,
            ..EngineConfig::default()
        },
        EngineConfig {
            task_timeout_ms: 0,
            ..EngineConfig::default()
        },
        EngineConfig {
            optimization_interval_ms: 0,
            ..EngineConfig::default()
        },
        EngineConfig {
            max_queue_depth: 0,
            ..EngineConfig::default()
        },
        EngineConfig {
            history_limit: 0,
            ..EngineConfig::default()
        },
    ] {
        assert!(cfg.validate().is_err());
    }
}

#[test]
fn test_invalid_watermarks() {
    let cfg = EngineConfig {
        low_water_ms: 5_000,
        high_water_ms: 5_000,
        ..EngineConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_invalid_min_above_ceiling() {
    let cfg = EngineConfig {
        min_parallel_tasks: 16,
        max_parallel_tasks: 16,
        ..EngineConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_from_json_partial_fields_take_defaults() {
    let json = r#"{
        "max_parallel_tasks": 8,
        "task_timeout_ms": 5000
    }"#;

    let cfg = EngineConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.max_parallel_tasks, 8);
    assert_eq!(cfg.task_timeout_ms, 5_000);
    assert_eq!(cfg.cache_ttl_ms, 300_000);
}

#[test]
fn test_from_json_rejects_invalid_values() {
    let json = r#"{ "max_parallel_tasks": 0 }"#;
    assert!(EngineConfig::from_json_str(json).is_err());

    assert!(EngineConfig::from_json_str("not json").is_err());
}
