use std::fs;
use std::path::Path;
use std::sync::Arc;

use metascrub_engine::{
    EngineEvent, EngineHandle, ExtractSettings, FilterCriteria, FilterSettings, Operation,
    ToolError, ToolInvoker, ToolOutput, WriteBackSettings,
};
use tempfile::TempDir;

/// Pretends to be the metadata tool for a full extract/filter/write-back round.
struct StubTool;

impl ToolInvoker for StubTool {
    fn invoke(&self, _program: &str, _args: &[String], _cwd: &Path) -> Result<ToolOutput, ToolError> {
        Ok(ToolOutput {
            stdout: br#"[{"Keywords":["People","Vacation"]}]"#.to_vec(),
            stderr: String::new(),
            exit_code: Some(0),
        })
    }
}

fn wait_for_completion(engine: &EngineHandle) -> metascrub_engine::BatchSummary {
    loop {
        match engine.recv() {
            Some(EngineEvent::BatchCompleted(summary)) => return summary,
            Some(_) => continue,
            None => panic!("engine stopped before batch completion"),
        }
    }
}

#[test]
fn extract_filter_write_back_round_trip() {
    engine_logging::initialize_for_tests();
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("2019")).unwrap();

    let engine = EngineHandle::with_invoker(Arc::new(StubTool));

    engine.extract(
        temp.path().to_path_buf(),
        ExtractSettings::new("exiftool -json"),
    );
    let extract = wait_for_completion(&engine);
    assert_eq!(extract.operation, Operation::Extract);
    assert_eq!(extract.succeeded, 1);
    assert!(temp.path().join("2019").join("output.json").exists());

    engine.filter(
        temp.path().to_path_buf(),
        FilterCriteria::substring(vec!["People".into()], vec!["/".into()]),
        FilterSettings::default(),
    );
    let filter = wait_for_completion(&engine);
    assert_eq!(filter.operation, Operation::Filter);
    assert_eq!(filter.removed_items, 1);
    assert!(temp.path().join("2019").join("modified.json").exists());

    engine.write_back(temp.path().to_path_buf(), WriteBackSettings::default());
    let write_back = wait_for_completion(&engine);
    assert_eq!(write_back.operation, Operation::WriteBack);
    assert_eq!(write_back.succeeded, 1);
    assert!(temp.path().join("exiftool_output.txt").exists());
}

#[test]
fn unparsable_template_reports_batch_failure() {
    let temp = TempDir::new().unwrap();
    let engine = EngineHandle::with_invoker(Arc::new(StubTool));

    engine.extract(temp.path().to_path_buf(), ExtractSettings::new("   "));
    loop {
        match engine.recv() {
            Some(EngineEvent::BatchFailed { operation, message }) => {
                assert_eq!(operation, Operation::Extract);
                assert!(message.contains("empty"));
                break;
            }
            Some(_) => continue,
            None => panic!("engine stopped before reporting the failure"),
        }
    }
}
