use std::fs;

use metascrub_engine::{append_text, ensure_output_dir, AtomicFileWriter};
use tempfile::TempDir;

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("out");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing_and_is_atomic() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write("modified.json", "[]").unwrap();
    assert_eq!(first.file_name().unwrap(), "modified.json");
    assert_eq!(fs::read_to_string(&first).unwrap(), "[]");

    // Replace existing
    let second = writer.write("modified.json", "[{}]").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), "[{}]");
}

#[test]
fn no_partial_file_on_error() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    let result = writer.write("modified.json", "[]");
    assert!(result.is_err());
    assert!(!file_path.with_file_name("modified.json").exists());
}

#[test]
fn append_accumulates_across_calls() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("errors.txt");

    append_text(&path, "first\n").unwrap();
    append_text(&path, "second\n").unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
}
