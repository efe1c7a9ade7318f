/*!
 * Live Reload Tests
 * File-store reload cycles and reader consistency under concurrent updates
 */

use optrack::store::{FileRuleStore, MemoryRuleStore};
use optrack::{SelectorEngine, Severity};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[test]
fn test_file_change_is_picked_up_by_reload_thread() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "app.db=ERROR").unwrap();
    file.flush().unwrap();

    let store = Arc::new(FileRuleStore::new(file.path(), Duration::from_millis(50)));
    let engine = SelectorEngine::new(store, Severity::Info);
    engine.open().unwrap();
    assert!(engine.is_enabled(Severity::Error, "app.db", None));
    assert!(!engine.is_enabled(Severity::Debug, "app.db", None));

    // rewrite the file out from under the store
    std::fs::write(file.path(), "app.db=DEBUG\napp.cache=WARNING\n").unwrap();

    // wait for the reload thread to notice, bounded
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if engine.is_enabled(Severity::Debug, "app.db", None)
            && engine.is_enabled(Severity::Warning, "app.cache", None)
        {
            break;
        }
        std::thread::sleep(Duration::from_millis(25));
    }

    assert!(engine.is_enabled(Severity::Debug, "app.db", None));
    assert!(engine.is_enabled(Severity::Warning, "app.cache", None));
    engine.close().unwrap();
}

/// Concurrent readers must always observe a whole token: either the
/// old threshold+pattern pair or the new one, never a mix.
#[test]
fn test_readers_never_observe_mixed_tokens() {
    // token A: lowest threshold, pattern AAA
    // token B: highest threshold, pattern BBB
    // mixes would be (FATAL, AAA) or (TRACE, BBB); both are detectable
    let store = Arc::new(MemoryRuleStore::with_rules("rules", [("k", "TRACE:AAA")]));
    let engine = Arc::new(SelectorEngine::new(store, Severity::Info));
    engine.open().unwrap();

    let stop = Arc::new(AtomicBool::new(false));
    let mut readers = Vec::new();
    for _ in 0..4 {
        let engine = Arc::clone(&engine);
        let stop = Arc::clone(&stop);
        readers.push(std::thread::spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                let trace_aaa = engine.is_enabled(Severity::Trace, "k", Some("AAA"));
                let fatal_aaa = engine.is_enabled(Severity::Fatal, "k", Some("AAA"));
                let trace_bbb = engine.is_enabled(Severity::Trace, "k", Some("BBB"));

                // (FATAL, AAA) mix: AAA matches at FATAL but not at TRACE
                assert!(
                    !(fatal_aaa && !trace_aaa),
                    "observed mixed token: new threshold with old pattern"
                );
                // (TRACE, BBB) mix: BBB can never be enabled at TRACE
                assert!(
                    !trace_bbb,
                    "observed mixed token: old threshold with new pattern"
                );
            }
        }));
    }

    for i in 0..500 {
        if i % 2 == 0 {
            engine.set_rule(Severity::Fatal, "k", Some("BBB")).unwrap();
        } else {
            engine.set_rule(Severity::Trace, "k", Some("AAA")).unwrap();
        }
    }

    stop.store(true, Ordering::Relaxed);
    for reader in readers {
        reader.join().unwrap();
    }
}
