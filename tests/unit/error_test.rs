//! Tests for error types

use agent_task_engine::core::EngineError;

#[test]
fn test_validation_error() {
    let err = EngineError::Validation("description must not be empty".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid submission: description must not be empty"
    );
}

#[test]
fn test_queue_full_error() {
    let err = EngineError::QueueFull("max queue depth reached".to_string());
    assert_eq!(format!("{}", err), "queue full: max queue depth reached");
}

#[test]
fn test_stopped_error() {
    let err = EngineError::Stopped;
    assert_eq!(format!("{}", err), "engine stopped");
}
