//! Property-bag error-message, atomic-write-safety, and session-scope tests
//! for the local-directory backend.

use assert_fs::prelude::*;
use predicates::prelude::predicate;
use std::fs;

use tidemark_core::{
    log::NullLog, FsRepository, FsSessionProvider, Session, SessionError, SessionProvider,
};

// ---------------------------------------------------------------------------
// 1. Open and error messages
// ---------------------------------------------------------------------------

#[test]
fn open_missing_root_returns_not_found() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let missing = dir.path().join("nope");
    let err = FsRepository::open(&missing).unwrap_err();
    assert!(err.is_not_found(), "got: {err}");
    assert!(err.to_string().contains("nope"));
}

#[test]
fn corrupt_property_bag_reports_file_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let meta = dir.path().join(".tidemark");
    fs::create_dir_all(&meta).expect("mkdir");
    fs::write(meta.join("properties.json"), b"{ not json !!!").expect("write");

    let repo = FsRepository::open(dir.path()).expect("open");
    let err = repo.properties().unwrap_err();
    assert!(matches!(err, SessionError::Metadata { .. }), "got: {err}");
    assert!(
        err.to_string().contains("properties.json"),
        "must contain file path, got: {err}"
    );
}

// ---------------------------------------------------------------------------
// 2. Atomic write safety
// ---------------------------------------------------------------------------

#[test]
fn set_property_cleans_up_tmp_file() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let repo = FsRepository::open(dir.path()).expect("open");
    repo.set_property("k", "v").expect("set");

    dir.child(".tidemark/properties.json")
        .assert(predicate::path::exists());
    let tmp = dir.path().join(".tidemark/properties.json.tmp");
    assert!(!tmp.exists(), ".tmp must be removed after successful save");
}

#[test]
fn mid_write_crash_leaves_original_intact() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let repo = FsRepository::open(dir.path()).expect("open");
    repo.set_property("k", "v").expect("set");

    let bag = dir.path().join(".tidemark/properties.json");
    let original = fs::read(&bag).expect("read original");

    // Simulate crash: .tmp written but process died before rename
    let tmp = bag.with_file_name("properties.json.tmp");
    fs::write(&tmp, b"CRASH - INCOMPLETE WRITE").expect("write crash tmp");

    let current = fs::read(&bag).expect("read after crash");
    assert_eq!(original, current, "original must be unchanged after crash");
}

#[test]
fn set_property_preserves_other_keys() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let repo = FsRepository::open(dir.path()).expect("open");
    repo.set_property("first", "1").expect("set first");
    repo.set_property("second", "2").expect("set second");

    let properties = repo.properties().expect("read");
    assert_eq!(properties.get("first").map(String::as_str), Some("1"));
    assert_eq!(properties.get("second").map(String::as_str), Some("2"));
}

// ---------------------------------------------------------------------------
// 3. Session provider scope
// ---------------------------------------------------------------------------

#[test]
fn provider_opens_session_rooted_at_target() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let provider = FsSessionProvider::new(dir.path());
    let session = provider.open_session(&NullLog).expect("open");

    let canonical = fs::canonicalize(dir.path()).expect("canonicalize");
    assert_eq!(session.web_path(), canonical.to_string_lossy());
    assert_eq!(session.site_path(), session.web_path());
}

#[test]
fn provider_exposes_credentials_for_script_hosts() {
    let provider = FsSessionProvider::new("/tmp").with_credentials("svc-deploy", "hunter2");
    assert_eq!(provider.user_name(), Some("svc-deploy"));
    assert_eq!(provider.password(), Some("hunter2"));

    let plain = FsSessionProvider::new("/tmp");
    assert_eq!(plain.user_name(), None);
    assert_eq!(plain.password(), None);
}

#[test]
fn uploads_land_under_created_folders() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let repo = FsRepository::open(dir.path()).expect("open");
    let web = repo.web_path().to_string();

    let folder = repo.create_folder(&web, "style").expect("create folder");
    let dest = repo
        .upload_file(&folder.path, "app.css", b"body {}")
        .expect("upload");

    dir.child("style/app.css").assert(predicate::path::exists());
    assert!(dest.ends_with("style/app.css"));

    let status = repo.file_status(&dest).expect("status");
    assert!(!status.checked_out);
}
