/*!
 * Lifecycle Tests
 * Record state machines and context binding end to end
 */

use optrack::sink::{BufferSink, EventSink};
use optrack::store::MemoryRuleStore;
use optrack::tracker::context;
use optrack::{Activity, CompCode, Event, OpType, SelectorEngine, Severity, Tracker, UsageError};
use std::sync::Arc;

fn make_tracker(source: &str) -> (Tracker, Arc<BufferSink>) {
    let store = Arc::new(MemoryRuleStore::new("rules"));
    let selector = Arc::new(SelectorEngine::new(store, Severity::Info));
    selector.open().unwrap();
    let sink = Arc::new(BufferSink::new("buffer"));
    (
        Tracker::new(source, selector, sink.clone() as Arc<dyn EventSink>),
        sink,
    )
}

#[test]
fn test_event_full_lifecycle() {
    let (tracker, sink) = make_tracker("svc");
    let mut event = tracker.new_event(Severity::Info, OpType::Call, "db-query", "SELECT done");
    event.start_at(1_000_000).unwrap();
    event.add_wait(100).unwrap();
    event.stop_at(1_000_500).unwrap();

    assert_eq!(event.elapsed_usec(), 400);
    assert_eq!(event.wait_usec(), 100);

    tracker.report_event(event).unwrap();
    assert_eq!(sink.len(), 1);
}

#[test]
fn test_activity_aggregates_children() {
    let (tracker, sink) = make_tracker("svc");
    let mut activity = tracker.new_activity("checkout");
    activity.start_at(0).unwrap();

    for step in ["reserve", "charge", "confirm"] {
        let mut event = tracker.new_event(Severity::Info, OpType::Call, step, "step done");
        event.start_at(100).unwrap();
        event.add_wait(50).unwrap();
        event.stop_at(300).unwrap();
        activity.add_event(event).unwrap();
    }

    activity.stop_at(1_000).unwrap();
    assert_eq!(activity.child_count(), 3);
    assert_eq!(activity.wait_usec(), 150);
    assert_eq!(activity.wall_usec(), 1_000);
    assert_eq!(activity.elapsed_usec(), 850);

    tracker.report_activity(activity).unwrap();
    assert_eq!(sink.len(), 1);
}

#[test]
fn test_stopped_activity_refuses_children() {
    let (tracker, _sink) = make_tracker("svc");
    let mut activity = tracker.new_activity("batch");
    activity.start().unwrap();
    activity.stop().unwrap();

    let event = tracker.new_event(Severity::Info, OpType::Call, "late", "too late");
    assert!(matches!(
        activity.add_event(event),
        Err(UsageError::ActivitySealed(_))
    ));
}

#[test]
fn test_lifecycle_misuse_is_loud() {
    let mut event = Event::new(Severity::Info, OpType::Call, "op", "msg");
    assert_eq!(event.stop(), Err(UsageError::NotStarted));
    event.start().unwrap();
    assert_eq!(event.start(), Err(UsageError::AlreadyStarted));
    event.stop().unwrap();
    assert_eq!(event.stop(), Err(UsageError::AlreadyStopped));

    let mut activity = Activity::new("a");
    assert_eq!(activity.stop(), Err(UsageError::NotStarted));
}

#[test]
fn test_error_at_stop_sets_comp_code_only() {
    let (tracker, sink) = make_tracker("svc");
    let mut event = tracker.new_event(Severity::Info, OpType::Call, "save", "saving");
    event.start().unwrap();
    event.stop_failed(CompCode::Error, "disk full").unwrap();

    assert_eq!(event.severity(), Severity::Info);
    tracker.report_event(event).unwrap();

    let items = sink.drain();
    match &items[0] {
        optrack::sink::SinkItem::Event(event) => {
            assert_eq!(event.comp_code(), CompCode::Error);
            assert_eq!(event.error_message(), Some("disk full"));
        }
        other => panic!("unexpected item: {other:?}"),
    }
}

#[test]
fn test_context_rebind_closes_previous_once() {
    let (first, first_sink) = make_tracker("ctx.one");
    let (second, second_sink) = make_tracker("ctx.two");

    context::register(first);
    context::register(second);
    assert_eq!(first_sink.close_count(), 1);
    assert_eq!(second_sink.close_count(), 0);

    context::deregister();
    assert_eq!(second_sink.close_count(), 1);
    assert!(matches!(context::current(), Err(UsageError::NoTracker)));
}

#[test]
fn test_unbound_context_reports_usage_error() {
    context::deregister();
    let result = context::with_current(|t| t.log(Severity::Info, "never"));
    assert_eq!(result.err(), Some(UsageError::NoTracker));
}
