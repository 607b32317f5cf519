use std::io::Write;

use cask_fs::{Error, StagedFile, partial};
use tempfile::tempdir;

#[test]
fn test_racing_stages_only_first_commit_wins() {
    let dir = tempdir().unwrap();
    let dest = dir.path().join("blob");

    let mut first = StagedFile::new(&dest).unwrap();
    let mut second = StagedFile::new(&dest).unwrap();
    first.write_all(b"first").unwrap();
    second.write_all(b"second").unwrap();

    first.commit(false).unwrap();
    assert!(matches!(second.commit(false), Err(Error::AlreadyExists { .. })));
    assert_eq!(std::fs::read(&dest).unwrap(), b"first");
}

#[test]
fn test_partial_file_grows_by_append() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ingest");

    assert_eq!(partial::file_len(&path).unwrap(), None);
    partial::open_append(&path).unwrap().write_all(b"abc").unwrap();
    partial::open_append(&path).unwrap().write_all(b"def").unwrap();

    assert_eq!(partial::file_len(&path).unwrap(), Some(6));
    assert_eq!(std::fs::read(&path).unwrap(), b"abcdef");
}

#[test]
fn test_create_truncates_existing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ingest");
    std::fs::write(&path, b"stale bytes").unwrap();

    partial::create(&path).unwrap();
    assert_eq!(partial::file_len(&path).unwrap(), Some(0));
}
