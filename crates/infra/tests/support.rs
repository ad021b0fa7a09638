//! Shared fixtures for infra integration tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone};
use daybrief_core::FixedClock;
use daybrief_infra::MemorySettingsStore;

/// 2026-01-06 at `hour:minute`, host local time.
pub fn local(hour: u32, minute: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(2026, 1, 6, hour, minute, 0).single().expect("unambiguous local time")
}

pub fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(local(8, 0)))
}

/// Settings store connected to Google with a stored refresh token.
pub fn connected_store() -> Arc<MemorySettingsStore> {
    let store = MemorySettingsStore::new();
    store.set_google_calendar_connected(true);
    store.set_google_calendar_refresh_token(Some("refresh-token".into()));
    Arc::new(store)
}

/// Write `contents` to `name` under `dir` and return the full path.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("fixture should be written");
    path
}

/// Calendar with one timed event today, one all-day event today, and one
/// event tomorrow. Times are floating, so they resolve in host local time.
pub const TODAY_CALENDAR: &str = "BEGIN:VCALENDAR\r
VERSION:2.0\r
PRODID:-//DayBrief//Tests//EN\r
BEGIN:VEVENT\r
UID:standup@test\r
SUMMARY:Standup\r
DTSTART:20260106T090000\r
DTEND:20260106T093000\r
LOCATION:Room 4\r
ATTENDEE:mailto:ana@example.com\r
END:VEVENT\r
BEGIN:VEVENT\r
UID:offsite@test\r
SUMMARY:Offsite\r
DTSTART;VALUE=DATE:20260106\r
DTEND;VALUE=DATE:20260107\r
END:VEVENT\r
BEGIN:VEVENT\r
UID:planning@test\r
SUMMARY:Planning\r
DTSTART:20260107T100000\r
DTEND:20260107T110000\r
END:VEVENT\r
END:VCALENDAR\r
";
