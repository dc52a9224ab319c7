//! Tests for audit sink

use odds_sampler::core::{build_audit_event, AuditAction, AuditSink, EntryId, EventId, InMemoryAuditSink};
use odds_sampler::util::stamp::parse_minute_stamp;

fn event(action: AuditAction, entry: u64) -> odds_sampler::core::AuditEvent {
    let at = parse_minute_stamp("202203041000").unwrap();
    build_audit_event(
        Some(EntryId(entry)),
        EventId::new("kokura", "1"),
        action,
        Some(at),
        at,
        None,
    )
}

#[test]
fn test_in_memory_audit_sink() {
    let mut sink = InMemoryAuditSink::new(10);

    sink.record(event(AuditAction::Registered, 1));
    sink.record(event(AuditAction::Dispatched, 1));
    assert_eq!(sink.events().len(), 2);

    let dispatched = sink.with_action(AuditAction::Dispatched);
    assert_eq!(dispatched.len(), 1);
    assert_eq!(dispatched[0].entry, Some(EntryId(1)));
    assert_eq!(dispatched[0].event.to_string(), "kokura/1");
}

#[test]
fn test_audit_sink_overflow() {
    let mut sink = InMemoryAuditSink::new(2);

    sink.record(event(AuditAction::Registered, 1));
    sink.record(event(AuditAction::Registered, 2));
    sink.record(event(AuditAction::Registered, 3));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].entry, Some(EntryId(2))); // First one popped
    assert_eq!(events[1].entry, Some(EntryId(3)));
}

#[test]
fn test_audit_ids_are_unique() {
    let a = event(AuditAction::Completed, 1);
    let b = event(AuditAction::Completed, 1);
    assert_ne!(a.audit_id, b.audit_id);
}

#[test]
fn test_action_display() {
    assert_eq!(AuditAction::Missed.to_string(), "missed");
    assert_eq!(AuditAction::Cancelled.to_string(), "cancelled");
}
