//! Time types for availability queries.
//!
//! This module provides [`TimeWindow`] for bounding busy-interval queries and
//! the two fixed-width UTC renderings the rest of the workspace relies on:
//!
//! - the compact CalDAV form `YYYYMMDDTHHMMSSZ` used in `time-range` and
//!   `expand` filters
//! - the ISO-8601 form `YYYY-MM-DDTHH:MM:SS.sssZ` used for busy intervals,
//!   which sorts lexicographically in chronological order

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned when a window would end before it starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("time window start {start} is after end {end}")]
pub struct InvalidTimeWindow {
    /// The requested start.
    pub start: DateTime<Utc>,
    /// The requested end.
    pub end: DateTime<Utc>,
}

/// A time window for availability queries.
///
/// Both bounds are inclusive: an occurrence starting exactly at `end` is
/// still reported as busy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (inclusive).
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a new time window.
    ///
    /// # Panics
    ///
    /// Panics if `start` is after `end`. Use [`TimeWindow::try_new`] for
    /// untrusted input.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        assert!(start <= end, "TimeWindow start must be <= end");
        Self { start, end }
    }

    /// Creates a new time window, rejecting inverted bounds.
    pub fn try_new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, InvalidTimeWindow> {
        if start > end {
            return Err(InvalidTimeWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Creates a time window from a start time and duration.
    pub fn from_duration(start: DateTime<Utc>, duration: Duration) -> Self {
        Self::new(start, start + duration)
    }

    /// Returns the duration of this time window.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Checks if an instant falls within this window, boundaries included.
    pub fn contains_instant(&self, dt: DateTime<Utc>) -> bool {
        self.start <= dt && dt <= self.end
    }

    /// Start bound in compact CalDAV form.
    pub fn caldav_start(&self) -> String {
        format_caldav_timestamp(self.start)
    }

    /// End bound in compact CalDAV form.
    pub fn caldav_end(&self) -> String {
        format_caldav_timestamp(self.end)
    }
}

/// Formats an instant as `YYYYMMDDTHHMMSSZ`, truncating fractional seconds.
pub fn format_caldav_timestamp(dt: DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Formats an instant as `YYYY-MM-DDTHH:MM:SS.sssZ`.
pub fn format_iso_millis(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}
