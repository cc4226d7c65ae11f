use cowbuf::script::{run_script, run_script_file, ScriptError};
use std::io::Write;
use tempfile::NamedTempFile;

const SCENARIO: &str = r#"[
    {"op": "construct", "handle": "a", "bytes": "61626364"},
    {"op": "clone", "from": "a", "to": "b"},
    {"op": "clone", "from": "a", "to": "c"},
    {"op": "update", "handle": "a", "index": 0, "value": 103},
    {"op": "read", "handle": "b"},
    {"op": "update", "handle": "a", "index": -1, "value": 103},
    {"op": "close", "handle": "b"},
    {"op": "read", "handle": "c"}
]"#;

#[test]
fn test_scenario_trace() {
    let report = run_script(SCENARIO).unwrap();
    assert_eq!(report.events.len(), 8);

    assert_eq!(report.events[0].share_count, 1);
    assert_eq!(report.events[1].share_count, 2);
    assert_eq!(report.events[2].share_count, 3);

    // Cloned handles report the same storage as the original.
    assert_eq!(report.events[0].storage_id, report.events[2].storage_id);

    // The shared update detaches "a" onto new storage.
    let update = &report.events[3];
    assert!(update.ok);
    assert_eq!(update.share_count, 1);
    assert_eq!(update.bytes, "67626364");
    assert_ne!(update.storage_id, report.events[0].storage_id);

    // Siblings keep the pre-mutation bytes on the old storage.
    let read_b = &report.events[4];
    assert_eq!(read_b.share_count, 2);
    assert_eq!(read_b.bytes, "61626364");
    assert_eq!(read_b.storage_id, report.events[0].storage_id);

    // Out-of-bounds update fails without aborting the script.
    let rejected = &report.events[5];
    assert!(!rejected.ok);
    assert!(rejected.error.is_some());
    assert_eq!(rejected.bytes, "67626364");

    // Closing "b" leaves "c" exclusive on the original storage.
    assert_eq!(report.events[6].share_count, 1);
    let read_c = &report.events[7];
    assert_eq!(read_c.share_count, 1);
    assert_eq!(read_c.bytes, "61626364");
    assert_eq!(read_c.storage_id, report.events[0].storage_id);
}

#[test]
fn test_run_script_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(SCENARIO.as_bytes()).unwrap();
    let report = run_script_file(file.path()).unwrap();
    assert_eq!(report.events.len(), 8);
    assert_eq!(report.events[3].bytes, "67626364");
}

#[test]
fn test_unknown_handle_is_an_error() {
    let script = r#"[{"op": "close", "handle": "ghost"}]"#;
    assert!(matches!(
        run_script(script),
        Err(ScriptError::UnknownHandle(name)) if name == "ghost"
    ));
}

#[test]
fn test_bad_hex_is_an_error() {
    let script = r#"[{"op": "construct", "handle": "a", "bytes": "zz"}]"#;
    assert!(matches!(run_script(script), Err(ScriptError::Hex(_))));
}

#[test]
fn test_report_round_trips_through_json() {
    let report = run_script(SCENARIO).unwrap();
    let json = serde_json::to_string(&report).unwrap();
    let back: cowbuf::script::Report = serde_json::from_str(&json).unwrap();
    assert_eq!(back.events.len(), report.events.len());
    assert_eq!(back.events[3].bytes, report.events[3].bytes);
}
