/*!
 * Report Pipeline Tests
 * Selector consult, filter chain, and delivery
 */

use optrack::sink::{BufferSink, EventSink, SinkItem, ThresholdFilter};
use optrack::store::MemoryRuleStore;
use optrack::{OpType, SelectorEngine, Severity, Tracker, Ttl};
use std::sync::Arc;

fn make_tracker(
    rules: &[(&str, &str)],
    source: &str,
    default_level: Severity,
) -> (Tracker, Arc<BufferSink>) {
    let store = Arc::new(MemoryRuleStore::with_rules(
        "rules",
        rules.iter().map(|(k, v)| (*k, *v)),
    ));
    let selector = Arc::new(SelectorEngine::new(store, default_level));
    selector.open().unwrap();
    let sink = Arc::new(BufferSink::new("buffer"));
    (
        Tracker::new(source, selector, sink.clone() as Arc<dyn EventSink>),
        sink,
    )
}

fn stopped_event(severity: Severity, elapsed: u64, message: &str) -> optrack::Event {
    let mut event = optrack::Event::new(severity, OpType::Call, "op", message);
    event.start_at(1_000_000).unwrap();
    event.stop_at(1_000_000 + elapsed).unwrap();
    event
}

#[test]
fn test_elapsed_floor_gates_events() {
    let (tracker, sink) = make_tracker(&[], "svc", Severity::Info);
    sink.add_filter(Arc::new(
        ThresholdFilter::new(Severity::Info).with_elapsed_floor(150),
    ));

    tracker
        .report_event(stopped_event(Severity::Info, 100, "fast"))
        .unwrap();
    assert!(sink.is_empty());

    tracker
        .report_event(stopped_event(Severity::Info, 200, "slow"))
        .unwrap();
    assert_eq!(sink.len(), 1);
}

#[test]
fn test_low_elapsed_floor_accepts() {
    let (tracker, sink) = make_tracker(&[], "svc", Severity::Info);
    sink.add_filter(Arc::new(
        ThresholdFilter::new(Severity::Info).with_elapsed_floor(50),
    ));

    tracker
        .report_event(stopped_event(Severity::Info, 100, "ok"))
        .unwrap();
    assert_eq!(sink.len(), 1);
}

#[test]
fn test_message_pattern_gates_events() {
    let (tracker, sink) = make_tracker(&[], "svc", Severity::Info);
    sink.add_filter(Arc::new(
        ThresholdFilter::new(Severity::Info)
            .with_message_pattern("ORDER-\\d+")
            .unwrap(),
    ));

    tracker
        .report_event(stopped_event(Severity::Info, 0, "ORDER-42"))
        .unwrap();
    tracker
        .report_event(stopped_event(Severity::Info, 0, "ORDER-abc"))
        .unwrap();

    let items = sink.drain();
    assert_eq!(items.len(), 1);
    match &items[0] {
        SinkItem::Event(event) => assert_eq!(event.message(), "ORDER-42"),
        other => panic!("unexpected item: {other:?}"),
    }
}

#[test]
fn test_chained_filters_are_anded() {
    let (tracker, sink) = make_tracker(&[], "svc", Severity::Info);
    sink.add_filter(Arc::new(
        ThresholdFilter::new(Severity::Info).with_elapsed_floor(100),
    ));
    sink.add_filter(Arc::new(
        ThresholdFilter::new(Severity::Info)
            .with_message_pattern("keep-.*")
            .unwrap(),
    ));

    // passes first, fails second
    tracker
        .report_event(stopped_event(Severity::Info, 500, "drop-me"))
        .unwrap();
    // fails first, would pass second
    tracker
        .report_event(stopped_event(Severity::Info, 10, "keep-me"))
        .unwrap();
    // passes both
    tracker
        .report_event(stopped_event(Severity::Info, 500, "keep-me"))
        .unwrap();

    assert_eq!(sink.len(), 1);
}

#[test]
fn test_ttl_override_stamped_on_delivered_event() {
    let (tracker, sink) = make_tracker(&[], "svc", Severity::Info);
    sink.add_filter(Arc::new(
        ThresholdFilter::new(Severity::Info).with_ttl(Ttl::Seconds(60)),
    ));

    tracker
        .report_event(stopped_event(Severity::Warning, 0, "m"))
        .unwrap();

    match &sink.drain()[0] {
        SinkItem::Event(event) => assert_eq!(event.ttl(), Ttl::Seconds(60)),
        other => panic!("unexpected item: {other:?}"),
    }
}

#[test]
fn test_selector_disabled_source_never_reaches_filters() {
    let (tracker, sink) = make_tracker(&[("svc", "FATAL")], "svc", Severity::Info);

    tracker
        .report_event(stopped_event(Severity::Error, 0, "m"))
        .unwrap();
    assert!(sink.is_empty());
    assert_eq!(tracker.stats().dropped, 1);

    tracker
        .report_event(stopped_event(Severity::Fatal, 0, "m"))
        .unwrap();
    assert_eq!(sink.len(), 1);
}

#[test]
fn test_activity_wall_floor() {
    let (tracker, sink) = make_tracker(&[], "svc", Severity::Info);
    sink.add_filter(Arc::new(
        ThresholdFilter::new(Severity::Info).with_wall_floor(1_000),
    ));

    let mut short = tracker.new_activity("short");
    short.start_at(0).unwrap();
    short.stop_at(500).unwrap();
    tracker.report_activity(short).unwrap();
    assert!(sink.is_empty());

    let mut long = tracker.new_activity("long");
    long.start_at(0).unwrap();
    long.stop_at(5_000).unwrap();
    tracker.report_activity(long).unwrap();
    assert_eq!(sink.len(), 1);
}

#[test]
fn test_sink_listeners_observe_delivery_and_failure() {
    use optrack::sink::{SinkErrorListener, SinkLogListener, SinkRecord};
    use optrack::SinkError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Logged(AtomicUsize);
    impl SinkLogListener for Logged {
        fn log_occurred(&self, _record: &SinkRecord<'_>) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    struct Failed(AtomicUsize);
    impl SinkErrorListener for Failed {
        fn log_failed(&self, _error: &SinkError) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    let store = Arc::new(MemoryRuleStore::new("rules"));
    let selector = Arc::new(SelectorEngine::new(store, Severity::Info));
    selector.open().unwrap();
    let sink = Arc::new(BufferSink::with_capacity("tiny", 1));
    let tracker = Tracker::new("svc", selector, sink.clone() as Arc<dyn EventSink>);

    let logged = Arc::new(Logged(AtomicUsize::new(0)));
    let failed = Arc::new(Failed(AtomicUsize::new(0)));
    sink.on_logged(logged.clone());
    sink.on_failed(failed.clone());

    tracker
        .report_event(stopped_event(Severity::Info, 0, "first"))
        .unwrap();
    // ring capacity is 1: the second accepted record is dropped
    tracker
        .report_event(stopped_event(Severity::Info, 0, "second"))
        .unwrap();

    assert_eq!(logged.0.load(Ordering::Relaxed), 2);
    assert_eq!(failed.0.load(Ordering::Relaxed), 1);
    assert_eq!(sink.stats().dropped, 1);
}

#[test]
fn test_message_path_through_chain() {
    let (tracker, sink) = make_tracker(&[], "svc", Severity::Debug);
    sink.add_filter(Arc::new(
        ThresholdFilter::new(Severity::Warning)
            .with_message_pattern("net-.*")
            .unwrap(),
    ));

    tracker.log(Severity::Error, "net-timeout").unwrap();
    tracker.log(Severity::Error, "disk-full").unwrap();
    tracker.log(Severity::Debug, "net-chatter").unwrap();

    let items = sink.drain();
    assert_eq!(items.len(), 1);
    match &items[0] {
        SinkItem::Message { message, .. } => assert_eq!(message, "net-timeout"),
        other => panic!("unexpected item: {other:?}"),
    }
}
