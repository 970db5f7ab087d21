use std::fs;
use std::sync::{Arc, Mutex};

use metascrub_engine::{
    filter_file, filter_records, run_filter, EngineEvent, EventSink, FilterCriteria, FilterError,
    FilterSettings,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;

fn criteria(remove: &[&str], keep: &[&str]) -> FilterCriteria {
    FilterCriteria::substring(
        remove.iter().map(|s| s.to_string()).collect(),
        keep.iter().map(|s| s.to_string()).collect(),
    )
}

struct CollectingSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl CollectingSink {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
        })
    }

    fn snapshot(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[test]
fn items_with_exception_characters_survive() {
    // "John Smith" has no remove-word; "People/John" matches a remove-word
    // but carries the "/" exception; only items matching both conditions are
    // dropped, so nothing changes here.
    let mut records = vec![json!({
        "Keywords": ["John Smith", "People/John", "Vacation"]
    })];
    let removed = filter_records(&mut records, &criteria(&["People"], &["/", "|"]));

    assert_eq!(removed, 0);
    assert_eq!(
        records[0]["Keywords"],
        json!(["John Smith", "People/John", "Vacation"])
    );
}

#[test]
fn bare_remove_word_is_dropped() {
    let mut records = vec![json!({"Keywords": ["People"]})];
    let removed = filter_records(&mut records, &criteria(&["People"], &["/"]));

    assert_eq!(removed, 1);
    assert_eq!(records[0]["Keywords"], json!([]));
}

#[test]
fn filtering_is_idempotent() {
    let mut records = vec![json!({
        "Keywords": ["People", "Vacation"],
        "Subject": ["Beach"]
    })];
    let c = criteria(&["People"], &[]);

    let first = filter_records(&mut records, &c);
    assert_eq!(first, 1);
    let after_first = records.clone();

    let second = filter_records(&mut records, &c);
    assert_eq!(second, 0);
    assert_eq!(records, after_first);
}

#[test]
fn filter_file_never_touches_the_original() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("output.json");
    let original = r#"[{"Keywords":["People","Vacation"]}]"#;
    fs::write(&input, original).unwrap();

    let outcome = filter_file(&input, &criteria(&["People"], &[]), "modified.json").unwrap();
    assert_eq!(outcome.removed_items, 1);

    // Both files exist; the original is byte-identical.
    assert_eq!(fs::read_to_string(&input).unwrap(), original);
    let modified: Value =
        serde_json::from_str(&fs::read_to_string(outcome.output_path).unwrap()).unwrap();
    assert_eq!(modified, json!([{"Keywords": ["Vacation"]}]));
}

#[test]
fn non_array_top_level_is_one_error() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("output.json");
    fs::write(&input, r#"{"Keywords":["People"]}"#).unwrap();

    let err = filter_file(&input, &criteria(&["People"], &[]), "modified.json").unwrap_err();
    assert!(matches!(err, FilterError::NotAnArray { .. }));
    assert!(!temp.path().join("modified.json").exists());
}

#[test]
fn malformed_file_fails_alone_and_siblings_proceed() {
    engine_logging::initialize_for_tests();
    let temp = TempDir::new().unwrap();
    let good_dir = temp.path().join("2019");
    let bad_dir = temp.path().join("2020");
    fs::create_dir(&good_dir).unwrap();
    fs::create_dir(&bad_dir).unwrap();
    fs::write(
        good_dir.join("output.json"),
        r#"[{"Keywords":["People","Vacation"]}]"#,
    )
    .unwrap();
    fs::write(bad_dir.join("output.json"), "{not json").unwrap();

    let sink = CollectingSink::new();
    let summary = run_filter(
        temp.path(),
        &criteria(&["People"], &[]),
        &FilterSettings::default(),
        sink.clone(),
    );

    assert_eq!(summary.submitted, 2);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.removed_items, 1);

    // The sibling was filtered despite the malformed file.
    assert!(good_dir.join("modified.json").exists());
    assert!(!bad_dir.join("modified.json").exists());

    let events = sink.snapshot();
    let failures: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            EngineEvent::JobCompleted {
                result: Err(failure),
                ..
            } => Some(failure),
            _ => None,
        })
        .collect();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].message.contains("2020"));

    // The failure is also persisted in the batch error summary.
    let log_path = summary.error_log.expect("error log persisted");
    assert!(fs::read_to_string(log_path).unwrap().contains("2020"));
}

#[test]
fn empty_run_still_completes_once() {
    let temp = TempDir::new().unwrap();
    let sink = CollectingSink::new();
    let summary = run_filter(
        temp.path(),
        &criteria(&["People"], &[]),
        &FilterSettings::default(),
        sink.clone(),
    );

    assert_eq!(summary.submitted, 0);
    let completions = sink
        .snapshot()
        .iter()
        .filter(|event| matches!(event, EngineEvent::BatchCompleted(_)))
        .count();
    assert_eq!(completions, 1);
}
