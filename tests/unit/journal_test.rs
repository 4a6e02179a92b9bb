//! Tests for the task journal

use agent_task_engine::core::{
    journal_event, InMemoryJournal, JournalAction, JournalSink, TaskId,
};

#[test]
fn test_in_memory_journal_records() {
    let mut journal = InMemoryJournal::new(10);
    let id = TaskId::new_v4();

    journal.record(journal_event(id, JournalAction::Submitted, None));
    journal.record(journal_event(
        id,
        JournalAction::Failed,
        Some("handler error: boom".into()),
    ));

    let events = journal.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].task_id, id);
    assert_eq!(events[0].action, JournalAction::Submitted);
    assert_eq!(events[1].detail.as_deref(), Some("handler error: boom"));
    assert!(events[0].at_ms > 0);
}

#[test]
fn test_journal_overflow_drops_oldest() {
    let mut journal = InMemoryJournal::new(2);
    let first = TaskId::new_v4();
    let second = TaskId::new_v4();
    let third = TaskId::new_v4();

    journal.record(journal_event(first, JournalAction::Submitted, None));
    journal.record(journal_event(second, JournalAction::Submitted, None));
    journal.record(journal_event(third, JournalAction::Submitted, None));

    let events = journal.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].task_id, second);
    assert_eq!(events[1].task_id, third);
}
