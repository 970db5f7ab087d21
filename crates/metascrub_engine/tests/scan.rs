use std::fs;

use metascrub_engine::{dirs_containing, find_named_files, immediate_subdirs};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

#[test]
fn immediate_subdirs_skips_files_and_orders_numerically() {
    let temp = TempDir::new().unwrap();
    for name in ["10", "9", "2"] {
        fs::create_dir(temp.path().join(name)).unwrap();
    }
    fs::write(temp.path().join("notes.txt"), "x").unwrap();

    let dirs = immediate_subdirs(temp.path()).unwrap();
    let names: Vec<_> = dirs
        .iter()
        .map(|d| d.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["2", "9", "10"]);
}

#[test]
fn immediate_subdirs_does_not_recurse() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("2019").join("summer")).unwrap();

    let dirs = immediate_subdirs(temp.path()).unwrap();
    assert_eq!(dirs.len(), 1);
}

#[test]
fn named_files_are_found_recursively() {
    let temp = TempDir::new().unwrap();
    let nested = temp.path().join("2019").join("summer");
    fs::create_dir_all(&nested).unwrap();
    fs::write(temp.path().join("output.json"), "[]").unwrap();
    fs::write(nested.join("output.json"), "[]").unwrap();
    fs::write(nested.join("other.json"), "[]").unwrap();

    let files = find_named_files(temp.path(), "output.json");
    assert_eq!(files.len(), 2);
}

#[test]
fn dirs_containing_includes_the_root_itself() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("2019")).unwrap();
    fs::write(temp.path().join("modified.json"), "[]").unwrap();
    fs::write(temp.path().join("2019").join("modified.json"), "[]").unwrap();

    let dirs = dirs_containing(temp.path(), "modified.json");
    assert_eq!(dirs.len(), 2);
    assert!(dirs.contains(&temp.path().to_path_buf()));
}
