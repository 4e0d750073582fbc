use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::well_known::{Iso8601, Rfc3339};
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// A wall-clock time of day with minute precision, written `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

pub const DEFAULT_NOTIFICATION_START: TimeOfDay = TimeOfDay { hour: 8, minute: 0 };
pub const DEFAULT_NOTIFICATION_END: TimeOfDay = TimeOfDay { hour: 22, minute: 0 };

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected a time in HH:MM format between 00:00 and 23:59, got {0:?}")]
pub struct InvalidTimeOfDay(pub String);

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        (hour <= 23 && minute <= 59).then_some(Self { hour, minute })
    }

    /// Strict `HH:MM`: exactly two digits on each side, no surrounding spaces.
    pub fn parse(value: &str) -> Option<Self> {
        let bytes = value.as_bytes();
        if bytes.len() != 5 || bytes[2] != b':' {
            return None;
        }
        let digits = [bytes[0], bytes[1], bytes[3], bytes[4]];
        if !digits.iter().all(u8::is_ascii_digit) {
            return None;
        }
        let hour = (digits[0] - b'0') * 10 + (digits[1] - b'0');
        let minute = (digits[2] - b'0') * 10 + (digits[3] - b'0');
        Self::new(hour, minute)
    }

    pub fn hour(self) -> u8 {
        self.hour
    }

    pub fn minute(self) -> u8 {
        self.minute
    }

    pub fn minutes_since_midnight(self) -> u16 {
        u16::from(self.hour) * 60 + u16::from(self.minute)
    }

    fn of_instant(at: OffsetDateTime) -> Self {
        let at = at.to_offset(UtcOffset::UTC);
        Self {
            hour: at.hour(),
            minute: at.minute(),
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = InvalidTimeOfDay;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| InvalidTimeOfDay(s.to_string()))
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse an ISO 8601 date-time into UTC. Values without an offset are taken
/// as UTC. Only years 0001-9998 are accepted so the UTC instant always
/// has the four-digit year RFC 3339 output needs.
pub fn parse_timestamp(value: &str) -> Option<OffsetDateTime> {
    let at = OffsetDateTime::parse(value, &Rfc3339)
        .or_else(|_| OffsetDateTime::parse(value, &Iso8601::PARSING))
        .ok()
        .or_else(|| {
            PrimitiveDateTime::parse(value, &Iso8601::PARSING)
                .ok()
                .map(PrimitiveDateTime::assume_utc)
        })?;

    TIMESTAMP_YEARS
        .contains(&at.year())
        .then(|| at.to_offset(UtcOffset::UTC))
}

const TIMESTAMP_YEARS: RangeInclusive<i32> = 1..=9998;

/// The daily delivery window of a user plus an optional pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationWindow {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    pub paused_until: Option<OffsetDateTime>,
}

impl Default for NotificationWindow {
    fn default() -> Self {
        Self {
            start: DEFAULT_NOTIFICATION_START,
            end: DEFAULT_NOTIFICATION_END,
            paused_until: None,
        }
    }
}

impl NotificationWindow {
    pub fn is_paused_at(&self, at: OffsetDateTime) -> bool {
        self.paused_until.is_some_and(|until| until > at)
    }

    /// Whether `time` falls inside `[start, end]`. A window whose end is
    /// earlier than its start runs past midnight.
    pub fn contains(&self, time: TimeOfDay) -> bool {
        if self.start <= self.end {
            self.start <= time && time <= self.end
        } else {
            time >= self.start || time <= self.end
        }
    }

    /// Whether a notification may be delivered at `at` (evaluated in UTC).
    pub fn permits(&self, at: OffsetDateTime) -> bool {
        !self.is_paused_at(at) && self.contains(TimeOfDay::of_instant(at))
    }
}
