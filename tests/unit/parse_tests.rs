//! Unit tests for the conversation input parsers.

use chrono::{Duration as ChronoDuration, Local, Timelike};

use chime::conversation::alarm::{parse_interval_spec, parse_start_spec};
use chime::AppError;

// ─── State 0: offset-day hour minute ─────────────────────────────────

#[test]
fn start_spec_sets_local_time_of_day() {
    let now = Local::now();
    let start = parse_start_spec("0 6 30", now).unwrap();
    let local = start.with_timezone(&Local);

    assert_eq!(local.date_naive(), now.date_naive());
    assert_eq!(local.hour(), 6);
    assert_eq!(local.minute(), 30);
    assert_eq!(local.second(), 0);
}

#[test]
fn start_spec_applies_day_offset() {
    let now = Local::now();
    let start = parse_start_spec("3 12 0", now).unwrap();
    let local = start.with_timezone(&Local);
    assert_eq!(
        local.date_naive(),
        now.date_naive() + ChronoDuration::days(3)
    );
}

#[test]
fn start_spec_allows_negative_offset() {
    let now = Local::now();
    let start = parse_start_spec("-1 8 15", now).unwrap();
    let local = start.with_timezone(&Local);
    assert_eq!(
        local.date_naive(),
        now.date_naive() - ChronoDuration::days(1)
    );
}

#[test]
fn start_spec_rejects_non_integers() {
    let err = parse_start_spec("0 six 30", Local::now()).unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "got {err:?}");
}

#[test]
fn start_spec_rejects_wrong_token_count() {
    for text in ["", "1", "1 2", "1 2 3 4"] {
        let err = parse_start_spec(text, Local::now()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)), "{text:?} -> {err:?}");
    }
}

#[test]
fn start_spec_rejects_out_of_range_time() {
    for text in ["0 24 0", "0 12 60", "0 -1 0", "0 12 -5"] {
        let err = parse_start_spec(text, Local::now()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)), "{text:?} -> {err:?}");
    }
}

#[test]
fn start_spec_tolerates_extra_whitespace() {
    let now = Local::now();
    let start = parse_start_spec("  0   6  30 ", now).unwrap();
    assert_eq!(start.with_timezone(&Local).hour(), 6);
}

// ─── State 1: interval hour minute ───────────────────────────────────

#[test]
fn interval_spec_combines_hours_and_minutes() {
    assert_eq!(parse_interval_spec("1 30").unwrap(), 5_400_000);
    assert_eq!(parse_interval_spec("24 0").unwrap(), 86_400_000);
    assert_eq!(parse_interval_spec("1 0").unwrap(), 3_600_000);
}

#[test]
fn interval_spec_rejects_non_positive_hours() {
    for text in ["0 30", "-1 10"] {
        let err = parse_interval_spec(text).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)), "{text:?} -> {err:?}");
    }
}

#[test]
fn interval_spec_rejects_non_positive_total() {
    // 1h - 61m < 0.
    let err = parse_interval_spec("1 -61").unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "got {err:?}");
    // 1h - 60m == 0.
    let err = parse_interval_spec("1 -60").unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "got {err:?}");
}

#[test]
fn interval_spec_rejects_overflow() {
    let err = parse_interval_spec("9223372036854775807 0").unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "got {err:?}");
}

#[test]
fn interval_spec_rejects_wrong_token_count() {
    for text in ["", "1", "1 2 3"] {
        let err = parse_interval_spec(text).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)), "{text:?} -> {err:?}");
    }
}
