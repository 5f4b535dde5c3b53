use std::fs;

use scrape_engine::{ensure_output_dir, write_atomic, PersistError};
use tempfile::TempDir;

#[test]
fn missing_output_dir_is_created() {
    let temp = TempDir::new().unwrap();
    let nested = temp.path().join("exports").join("today");
    ensure_output_dir(&nested).unwrap();
    assert!(nested.is_dir());
}

#[test]
fn rewriting_a_name_replaces_its_content() {
    let temp = TempDir::new().unwrap();

    let first = write_atomic(temp.path(), "run.csv", b"asin\nB1").unwrap();
    let second = write_atomic(temp.path(), "run.csv", b"asin\nB2").unwrap();

    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), "asin\nB2");
    let entries = fs::read_dir(temp.path()).unwrap().count();
    assert_eq!(entries, 1);
}

#[test]
fn file_in_place_of_directory_is_rejected() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("exports");
    fs::write(&blocker, "x").unwrap();

    let err = write_atomic(&blocker, "run.csv", b"data").unwrap_err();
    assert!(matches!(err, PersistError::OutputDir { .. }));
    assert!(!temp.path().join("run.csv").exists());
}
