use chrono::{Local, NaiveDateTime, TimeDelta};

/// Local time, microsecond precision. Lexicographic order matches time order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

#[cfg_attr(test, mockall::automock)]
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

/// Stamp to record as the new `updatedAt` after `previous`.
///
/// Never returns a value that sorts at or before a parseable `previous`.
pub fn next_stamp(previous: &str, now: NaiveDateTime) -> String {
    match parse_timestamp(previous) {
        Some(prev) if now <= prev => format_timestamp(prev + TimeDelta::microseconds(1)),
        _ => format_timestamp(now),
    }
}
