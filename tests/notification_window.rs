//! Notification Window Tests
//!
//! Covers time-of-day parsing, timestamp parsing, and delivery checks.

use eldercare::domain::notification::{
    parse_timestamp, NotificationWindow, TimeOfDay, DEFAULT_NOTIFICATION_END,
    DEFAULT_NOTIFICATION_START,
};
use time::macros::datetime;
use time::UtcOffset;

fn time(value: &str) -> TimeOfDay {
    TimeOfDay::parse(value).unwrap()
}

// ===========================================================================
// TimeOfDay
// ===========================================================================

#[test]
fn parse_accepts_boundaries() {
    assert_eq!(time("00:00").minutes_since_midnight(), 0);
    assert_eq!(time("23:59").minutes_since_midnight(), 23 * 60 + 59);
    assert_eq!(time("08:05").hour(), 8);
    assert_eq!(time("08:05").minute(), 5);
}

#[test]
fn parse_rejects_out_of_range_and_loose_forms() {
    for value in [
        "24:00", "23:60", "7:00", "07:0", "0700", "07-00", "07:00 ", "+7:00", "", "٠٧:٠٠",
    ] {
        assert!(TimeOfDay::parse(value).is_none(), "{:?} should be rejected", value);
    }
}

#[test]
fn display_is_zero_padded() {
    assert_eq!(TimeOfDay::new(6, 5).unwrap().to_string(), "06:05");
    assert!(TimeOfDay::new(24, 0).is_none());
}

#[test]
fn from_str_reports_offending_value() {
    let err = "25:00".parse::<TimeOfDay>().unwrap_err();
    assert!(err.to_string().contains("25:00"));
}

#[test]
fn serde_uses_hh_mm_strings() {
    let value = serde_json::to_value(time("21:15")).unwrap();
    assert_eq!(value, serde_json::json!("21:15"));

    let parsed: TimeOfDay = serde_json::from_value(serde_json::json!("06:45")).unwrap();
    assert_eq!(parsed, time("06:45"));
    assert!(serde_json::from_value::<TimeOfDay>(serde_json::json!("6:45")).is_err());
}

// ===========================================================================
// Timestamps
// ===========================================================================

#[test]
fn timestamps_with_offset_keep_the_instant() {
    assert_eq!(
        parse_timestamp("2030-01-01T09:00:00-03:00"),
        Some(datetime!(2030-01-01 12:00 UTC))
    );
    assert_eq!(
        parse_timestamp("2030-01-01T12:00:00.250Z"),
        Some(datetime!(2030-01-01 12:00:00.25 UTC))
    );
}

#[test]
fn naive_timestamps_are_utc() {
    assert_eq!(
        parse_timestamp("2030-01-01T12:00:00"),
        Some(datetime!(2030-01-01 12:00 UTC))
    );
}

#[test]
fn timestamps_are_normalized_to_utc() {
    let at = parse_timestamp("2030-03-15T08:00:00-03:00").unwrap();
    assert_eq!(at.offset(), UtcOffset::UTC);
    assert_eq!(at, datetime!(2030-03-15 11:00 UTC));
}

#[test]
fn timestamps_outside_four_digit_years_are_rejected() {
    for value in [
        "-000001-01-01T00:00:00Z",
        "+010000-01-01T00:00:00Z",
        "0000-01-01T00:00:00Z",
        "9999-12-31T23:00:00-05:00",
    ] {
        assert!(parse_timestamp(value).is_none(), "{:?} should be rejected", value);
    }
    assert!(parse_timestamp("0001-01-01T00:00:00Z").is_some());
}

#[test]
fn garbage_timestamps_are_rejected() {
    for value in ["", "tomorrow", "2030-13-01T00:00:00Z", "12:00"] {
        assert!(parse_timestamp(value).is_none(), "{:?} should be rejected", value);
    }
}

// ===========================================================================
// Window checks
// ===========================================================================

#[test]
fn default_window_is_eight_to_twenty_two() {
    let window = NotificationWindow::default();
    assert_eq!(window.start, DEFAULT_NOTIFICATION_START);
    assert_eq!(window.end, DEFAULT_NOTIFICATION_END);
    assert!(window.contains(time("08:00")));
    assert!(window.contains(time("22:00")));
    assert!(!window.contains(time("07:59")));
    assert!(!window.contains(time("22:01")));
}

#[test]
fn window_wraps_past_midnight() {
    let window = NotificationWindow {
        start: time("22:00"),
        end: time("06:00"),
        paused_until: None,
    };
    assert!(window.contains(time("23:00")));
    assert!(window.contains(time("03:00")));
    assert!(!window.contains(time("12:00")));
}

#[test]
fn pause_blocks_until_it_expires() {
    let window = NotificationWindow {
        paused_until: Some(datetime!(2030-01-01 12:00 UTC)),
        ..NotificationWindow::default()
    };

    assert!(window.is_paused_at(datetime!(2030-01-01 11:59 UTC)));
    assert!(!window.permits(datetime!(2030-01-01 11:59 UTC)));
    assert!(!window.is_paused_at(datetime!(2030-01-01 12:00 UTC)));
    assert!(window.permits(datetime!(2030-01-01 12:00 UTC)));
}

#[test]
fn permits_evaluates_in_utc() {
    let window = NotificationWindow::default();

    // 07:00 at -03:00 is 10:00 UTC
    assert!(window.permits(datetime!(2030-06-01 07:00 -3)));
    // 20:00 at -03:00 is 23:00 UTC
    assert!(!window.permits(datetime!(2030-06-01 20:00 -3)));
}
