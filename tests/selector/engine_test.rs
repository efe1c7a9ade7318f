/*!
 * Selector Engine Tests
 * Rule round-trips through a real file store, and threshold monotonicity
 */

use optrack::store::{FileRuleStore, MemoryRuleStore, RuleStore};
use optrack::{SelectorEngine, Severity};
use proptest::prelude::*;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

const ALL_SEVERITIES: [Severity; 10] = [
    Severity::None,
    Severity::Trace,
    Severity::Debug,
    Severity::Info,
    Severity::Success,
    Severity::Warning,
    Severity::Error,
    Severity::Critical,
    Severity::Failure,
    Severity::Fatal,
];

#[test]
fn test_rule_round_trip_through_file_store() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "# seeded empty").unwrap();
    file.flush().unwrap();

    // write through one engine
    let store = Arc::new(FileRuleStore::new(file.path(), Duration::ZERO));
    let engine = SelectorEngine::new(store, Severity::Info);
    engine.open().unwrap();
    engine
        .set_rule(Severity::Debug, "orders.flow", Some("ORD-.*"))
        .unwrap();

    // the store echo already updated the table
    assert!(engine.is_enabled(Severity::Debug, "orders.flow", Some("ORD-1")));
    engine.close().unwrap();

    // a second engine over the same file sees the persisted rule
    let store = Arc::new(FileRuleStore::new(file.path(), Duration::ZERO));
    let engine = SelectorEngine::new(store, Severity::Info);
    engine.open().unwrap();
    assert!(engine.is_enabled(Severity::Debug, "orders.flow", Some("ORD-7")));
    assert!(engine.is_enabled(Severity::Fatal, "orders.flow", Some("ORD-7")));
    assert!(!engine.is_enabled(Severity::Trace, "orders.flow", Some("ORD-7")));
    assert!(!engine.is_enabled(Severity::Debug, "orders.flow", Some("nope")));
    engine.close().unwrap();
}

#[test]
fn test_remove_rule_twice_matches_once() {
    let store = Arc::new(MemoryRuleStore::with_rules("rules", [("k", "DEBUG")]));
    let engine = SelectorEngine::new(store, Severity::Info);
    engine.open().unwrap();

    engine.remove_rule("k").unwrap();
    let after_once: Vec<bool> = ALL_SEVERITIES
        .iter()
        .map(|s| engine.is_enabled(*s, "k", None))
        .collect();

    engine.remove_rule("k").unwrap();
    let after_twice: Vec<bool> = ALL_SEVERITIES
        .iter()
        .map(|s| engine.is_enabled(*s, "k", None))
        .collect();

    assert_eq!(after_once, after_twice);
    assert!(after_once.iter().all(|enabled| !enabled));
}

#[test]
fn test_closed_store_rejects_writes() {
    let store = Arc::new(MemoryRuleStore::new("rules"));
    let engine = SelectorEngine::new(store.clone(), Severity::Info);
    engine.open().unwrap();
    engine.close().unwrap();
    assert!(engine.set_rule(Severity::Info, "k", None).is_err());
    let _ = store;
}

proptest! {
    /// Whenever a severity is enabled for a key, every higher severity is
    /// enabled too.
    #[test]
    fn prop_enablement_is_monotonic(threshold_idx in 0usize..10, low_idx in 0usize..10, step in 0usize..10) {
        let threshold = ALL_SEVERITIES[threshold_idx];
        let low = ALL_SEVERITIES[low_idx];
        let high = ALL_SEVERITIES[(low_idx + step).min(9)];

        let store = Arc::new(MemoryRuleStore::new("rules"));
        store.open().unwrap();
        store.set("key", threshold.as_str()).unwrap();
        let engine = SelectorEngine::new(store, Severity::Info);
        engine.open().unwrap();

        if engine.is_enabled(low, "key", None) {
            prop_assert!(engine.is_enabled(high, "key", None));
        }
    }
}
