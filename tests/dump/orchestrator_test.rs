/*!
 * Dump Orchestration Tests
 * Batches against real file sinks, failure isolation, serialization
 */

use optrack::core::errors::{DumpError, DumpResult};
use optrack::dump::{
    DumpListener, DumpNotice, DumpOrchestrator, FileDumpSink, ProcessInfoProvider,
    RuntimePropsProvider,
};
use optrack::{DumpCollection, DumpProvider, DumpSink};
use parking_lot::Mutex;
use std::sync::Arc;

struct StaticProvider {
    name: String,
    fail: bool,
}

impl StaticProvider {
    fn ok(name: &str) -> Self {
        Self {
            name: name.into(),
            fail: false,
        }
    }

    fn failing(name: &str) -> Self {
        Self {
            name: name.into(),
            fail: true,
        }
    }
}

impl DumpProvider for StaticProvider {
    fn name(&self) -> &str {
        &self.name
    }
    fn category(&self) -> &str {
        "test"
    }
    fn collect(&self) -> DumpResult<DumpCollection> {
        if self.fail {
            return Err(DumpError::ProviderFailed("cannot snapshot".into()));
        }
        let mut dump = DumpCollection::new("snapshot", "test", &self.name, "test");
        dump.add_property("source", self.name.clone());
        dump.add_property("items", 3);
        Ok(dump)
    }
}

struct NoticeLog(Mutex<Vec<DumpNotice>>);

impl DumpListener for NoticeLog {
    fn on_dump(&self, notice: &DumpNotice) {
        self.0.lock().push(notice.clone());
    }
}

#[test]
fn test_batch_with_failing_provider_still_writes_and_closes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("batch.dump");
    let sink = Arc::new(FileDumpSink::new(&path));

    let orchestrator = DumpOrchestrator::new(sink.clone());
    orchestrator.add_provider(Arc::new(StaticProvider::ok("alpha")));
    orchestrator.add_provider(Arc::new(StaticProvider::failing("beta")));

    let log = Arc::new(NoticeLog(Mutex::new(Vec::new())));
    orchestrator.on_dump(log.clone());

    orchestrator.dump(Some("unit test"));

    // alpha's collection reached the file; the batch closed the sink
    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("\"dump.provider\": \"alpha\""));
    assert!(contents.contains("\"dump.reason\": \"unit test\""));
    assert!(contents.contains("\"dump.status\": \"END\""));
    assert!(!sink.is_open());

    // beta's error is visible on beta's after-notice and nowhere else
    let notices = log.0.lock();
    for notice in notices.iter() {
        if let DumpNotice::After {
            provider, error, ..
        } = notice
        {
            match provider.as_str() {
                "alpha" => assert!(error.is_none()),
                "beta" => assert!(error.is_some()),
                other => panic!("unexpected provider {other}"),
            }
        }
    }
    assert!(notices.iter().any(|n| matches!(n, DumpNotice::Complete)));
}

#[test]
fn test_before_notifications_precede_after() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(FileDumpSink::new(dir.path().join("order.dump")));
    let orchestrator = DumpOrchestrator::new(sink);
    orchestrator.add_provider(Arc::new(StaticProvider::ok("alpha")));
    orchestrator.add_provider(Arc::new(StaticProvider::ok("beta")));

    let log = Arc::new(NoticeLog(Mutex::new(Vec::new())));
    orchestrator.on_dump(log.clone());
    orchestrator.dump(None);

    let notices = log.0.lock();
    let sequence: Vec<String> = notices
        .iter()
        .map(|n| match n {
            DumpNotice::Before { provider, .. } => format!("before:{provider}"),
            DumpNotice::After { provider, .. } => format!("after:{provider}"),
            DumpNotice::SinkError { sink, .. } => format!("sink-error:{sink}"),
            DumpNotice::Complete => "complete".into(),
        })
        .collect();
    assert_eq!(
        sequence,
        vec![
            "before:alpha",
            "after:alpha",
            "before:beta",
            "after:beta",
            "complete"
        ]
    );
}

#[test]
fn test_concurrent_dumps_serialize() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("serial.dump");
    let sink = Arc::new(FileDumpSink::new(&path));
    let orchestrator = Arc::new(DumpOrchestrator::new(sink));
    orchestrator.add_provider(Arc::new(StaticProvider::ok("alpha")));

    let mut workers = Vec::new();
    for _ in 0..4 {
        let orchestrator = Arc::clone(&orchestrator);
        workers.push(std::thread::spawn(move || {
            orchestrator.dump(Some("concurrent"));
        }));
    }
    for worker in workers {
        worker.join().unwrap();
    }

    // four whole batches, never interleaved: START/END strictly alternate
    let contents = std::fs::read_to_string(&path).unwrap();
    let mut depth = 0i32;
    let mut batches = 0;
    for line in contents.lines() {
        if line.contains("\"dump.status\": \"START\"") {
            depth += 1;
            assert_eq!(depth, 1, "overlapping dump batches in output");
        }
        if line.contains("\"dump.status\": \"END\"") {
            depth -= 1;
            assert_eq!(depth, 0);
            batches += 1;
        }
    }
    assert_eq!(batches, 4);
}

#[test]
fn test_builtin_providers_produce_collections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("builtin.dump");
    let sink = Arc::new(FileDumpSink::new(&path));
    let orchestrator = DumpOrchestrator::new(sink);
    orchestrator.add_provider(Arc::new(ProcessInfoProvider::new()));
    orchestrator.add_provider(Arc::new(RuntimePropsProvider::new()));

    orchestrator.dump(None);

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("\"dump.provider\": \"process-info\""));
    assert!(contents.contains("\"dump.provider\": \"runtime-props\""));
    assert!(contents.contains("process.pid"));
    assert!(contents.contains("uptime.secs"));
}

#[test]
fn test_config_wiring() {
    use optrack::Config;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("configured.dump");
    let config = Config::default()
        .with_dump_path(&path)
        .with_default_dump_providers(true)
        .with_dump_on_exit(true);

    let orchestrator = Arc::new(DumpOrchestrator::from_config(&config));
    assert_eq!(orchestrator.provider_count(), 2);
    assert!(orchestrator.is_dump_on_shutdown());

    // guard drop triggers the shutdown dump
    drop(orchestrator.shutdown_guard());
    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("process shutdown"));
}
