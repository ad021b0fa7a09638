//! Calendar file import validation and parsing.

mod support;

use std::path::Path;

use chrono::Utc;
use daybrief_domain::{CalendarConfig, EventSourceKind};
use daybrief_infra::FileImportAdapter;
use tempfile::TempDir;

use support::{fixed_clock, local, write_file, TODAY_CALENDAR};

fn adapter_in(dir: &TempDir) -> FileImportAdapter {
    FileImportAdapter::new(fixed_clock(), &CalendarConfig::default())
        .unwrap()
        .with_base_dir(dir.path())
}

#[tokio::test]
async fn imports_only_todays_events() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "today.ics", TODAY_CALENDAR);

    let result = adapter_in(&dir).import_file(&path).await.unwrap();

    assert_eq!(result.source, EventSourceKind::File);
    assert_eq!(result.total_count, 2);

    let standup = result.events.iter().find(|e| e.title == "Standup").unwrap();
    assert_eq!(standup.start_date, local(9, 0).with_timezone(&Utc));
    assert_eq!(standup.location.as_deref(), Some("Room 4"));
    assert_eq!(standup.attendees, vec!["ana@example.com"]);
    assert!(!standup.is_all_day);

    let offsite = result.events.iter().find(|e| e.title == "Offsite").unwrap();
    assert!(offsite.is_all_day);
    assert!(result.events.iter().all(|e| e.title != "Planning"));
}

#[tokio::test]
async fn relative_paths_resolve_against_the_base_directory() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "today.ics", TODAY_CALENDAR);

    let result = adapter_in(&dir).import_file(Path::new("today.ics")).await.unwrap();
    assert_eq!(result.total_count, 2);
}

#[tokio::test]
async fn parent_components_are_rejected() {
    let dir = tempfile::tempdir().unwrap();

    let err = adapter_in(&dir).import_file(Path::new("../../../etc/passwd.ics")).await.unwrap_err();
    assert_eq!(err.code(), "INVALID_FILE");
    assert!(err.to_string().contains("path traversal"));
}

#[tokio::test]
async fn absolute_paths_outside_the_base_directory_are_rejected() {
    let base = tempfile::tempdir().unwrap();
    let elsewhere = tempfile::tempdir().unwrap();
    let path = write_file(elsewhere.path(), "today.ics", TODAY_CALENDAR);

    let err = adapter_in(&base).import_file(&path).await.unwrap_err();
    assert_eq!(err.code(), "INVALID_FILE");
    assert!(err.to_string().contains("path traversal"));
}

#[tokio::test]
async fn wrong_extension_is_rejected_before_reading() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "notes.txt", TODAY_CALENDAR);

    let err = adapter_in(&dir).import_file(&path).await.unwrap_err();
    assert_eq!(err.code(), "INVALID_FILE");
    assert!(err.to_string().contains(".ics"));
}

#[tokio::test]
async fn uppercase_extension_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "TODAY.ICS", TODAY_CALENDAR);

    assert!(adapter_in(&dir).import_file(&path).await.is_ok());
}

#[tokio::test]
async fn missing_file_and_directories_are_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = adapter_in(&dir);

    let err = adapter.import_file(&dir.path().join("missing.ics")).await.unwrap_err();
    assert_eq!(err.code(), "INVALID_FILE");
    assert!(err.to_string().contains("not found"));

    std::fs::create_dir(dir.path().join("folder.ics")).unwrap();
    let err = adapter.import_file(&dir.path().join("folder.ics")).await.unwrap_err();
    assert_eq!(err.code(), "INVALID_FILE");
}

#[tokio::test]
async fn oversized_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "today.ics", TODAY_CALENDAR);

    let config = CalendarConfig { max_import_file_bytes: 64, ..CalendarConfig::default() };
    let adapter = FileImportAdapter::new(fixed_clock(), &config).unwrap().with_base_dir(dir.path());

    let err = adapter.import_file(&path).await.unwrap_err();
    assert_eq!(err.code(), "INVALID_FILE");
    assert!(err.to_string().contains("limit"));
}

#[tokio::test]
async fn non_calendar_content_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "bogus.ics", "this is not a calendar");

    let err = adapter_in(&dir).import_file(&path).await.unwrap_err();
    assert_eq!(err.code(), "PARSE_ERROR");
}
