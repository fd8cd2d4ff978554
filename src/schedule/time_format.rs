//! Rendering of appointment dates/times and the canonical time sort key.
//!
//! Everything here runs once per row per render, so none of it can fail:
//! bad input turns into [`DISPLAY_PLACEHOLDER`] or [`SortKey::Missing`].

use std::fmt;

use chrono::NaiveDate;

use crate::settings::{DateTimeSettings, TimeFormat};

/// Shown in place of a date or time that could not be read.
pub const DISPLAY_PLACEHOLDER: &str = "--";

/// Rendered form of [`SortKey::Missing`].
pub const SENTINEL_KEY: &str = "99:99";

/// Time-of-day ordering key.
///
/// Variant order is significant: every well-formed time sorts before any
/// clamped one, and missing/unparseable input sorts after everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SortKey {
    At { hour: u8, minute: u8 },
    /// Hour was >= 24 or minute >= 60; components clamped to 23 / 59.
    Clamped { hour: u8, minute: u8 },
    Missing,
}

impl SortKey {
    pub fn is_well_formed(&self) -> bool {
        matches!(self, SortKey::At { .. })
    }
}

/// Zero-padded 24h "HH:MM". Ordering must go through `Ord`, not this text.
impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::At { hour, minute } | SortKey::Clamped { hour, minute } => {
                write!(f, "{hour:02}:{minute:02}")
            }
            SortKey::Missing => f.write_str(SENTINEL_KEY),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

/// Strip a trailing AM/PM marker (any case, optional whitespace before it).
fn split_meridiem(raw: &str) -> (&str, Option<Meridiem>) {
    let lower = raw.to_ascii_lowercase();
    let meridiem = if lower.ends_with("am") {
        Meridiem::Am
    } else if lower.ends_with("pm") {
        Meridiem::Pm
    } else {
        return (raw, None);
    };
    // the marker is ASCII, so the byte offset is a char boundary
    (raw[..raw.len() - 2].trim_end(), Some(meridiem))
}

fn parse_number(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

/// Canonical sort key for a free-form time string.
///
/// Accepts "14:30", "14:30:00", "2:30 PM", "2:30pm". A marker switches to
/// 12h reading: PM adds 12 unless the hour is already 12, 12 AM is 0.
pub(crate) fn parse_sort_key(time: Option<&str>) -> SortKey {
    let Some(raw) = time.map(str::trim).filter(|t| !t.is_empty()) else {
        return SortKey::Missing;
    };

    let (clock, meridiem) = split_meridiem(raw);
    let Some((hour, rest)) = clock.split_once(':') else {
        return SortKey::Missing;
    };
    // drop seconds if present
    let minute = rest.split_once(':').map_or(rest, |(m, _)| m);

    let (Some(mut hour), Some(minute)) = (parse_number(hour), parse_number(minute)) else {
        return SortKey::Missing;
    };

    match meridiem {
        Some(Meridiem::Pm) if hour != 12 => hour = hour.saturating_add(12),
        Some(Meridiem::Am) if hour == 12 => hour = 0,
        _ => {}
    }

    if hour > 23 || minute > 59 {
        SortKey::Clamped {
            hour: hour.min(23) as u8,
            minute: minute.min(59) as u8,
        }
    } else {
        SortKey::At {
            hour: hour as u8,
            minute: minute as u8,
        }
    }
}

/// Calendar date from "YYYY-MM-DD" or an ISO date-time ("2024-03-05T09:00Z",
/// "2024-03-05 09:00"). The written date is used as-is; no zone shifting.
pub(crate) fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    match raw.as_bytes().get(10) {
        Some(b'T') | Some(b' ') => NaiveDate::parse_from_str(&raw[..10], "%Y-%m-%d").ok(),
        _ => None,
    }
}

pub fn format_date_for_display(date: Option<NaiveDate>, settings: &DateTimeSettings) -> String {
    match date {
        Some(d) => d.format(settings.date_format.pattern()).to_string(),
        None => DISPLAY_PLACEHOLDER.to_string(),
    }
}

/// "2:30 PM" or "14:30" depending on the configured clock.
pub fn format_time_for_display(time: Option<&str>, settings: &DateTimeSettings) -> String {
    let SortKey::At { hour, minute } = parse_sort_key(time) else {
        return DISPLAY_PLACEHOLDER.to_string();
    };
    match settings.time_format {
        TimeFormat::TwentyFourHour => format!("{hour:02}:{minute:02}"),
        TimeFormat::TwelveHour => {
            let (h, suffix) = match hour {
                0 => (12, "AM"),
                1..=11 => (hour, "AM"),
                12 => (12, "PM"),
                _ => (hour - 12, "PM"),
            };
            format!("{h}:{minute:02} {suffix}")
        }
    }
}
