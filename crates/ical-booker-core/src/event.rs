//! Event types.
//!
//! - [`BusyEvent`]: one busy occurrence returned by availability queries
//! - [`NewEvent`]: input for creating a booking
//! - [`Booking`]: the resource created by a booking

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::time::format_iso_millis;

/// Title used for busy intervals whose source event has no summary.
pub const DEFAULT_TITLE: &str = "(no title)";

/// A single busy occurrence inside a query window.
///
/// Either a one-off event or one expanded instance of a recurring event.
/// There is no back-reference to the source event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyEvent {
    /// Start of the occurrence.
    #[serde(with = "iso_millis")]
    pub start: DateTime<Utc>,
    /// End of the occurrence (strictly after `start`).
    #[serde(with = "iso_millis")]
    pub end: DateTime<Utc>,
    /// Event summary, or [`DEFAULT_TITLE`].
    pub title: String,
}

impl BusyEvent {
    /// Creates a busy event, substituting [`DEFAULT_TITLE`] for a missing
    /// or blank summary.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, title: Option<&str>) -> Self {
        let title = title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(DEFAULT_TITLE)
            .to_string();
        Self { start, end, title }
    }

    /// Length of the occurrence.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Returns true if `end` is strictly after `start`.
    pub fn is_valid(&self) -> bool {
        self.end > self.start
    }

    /// Start in fixed-width ISO-8601 UTC form.
    pub fn start_iso(&self) -> String {
        format_iso_millis(self.start)
    }

    /// End in fixed-width ISO-8601 UTC form.
    pub fn end_iso(&self) -> String {
        format_iso_millis(self.end)
    }
}

/// Input for a new calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    /// Event start.
    pub start: DateTime<Utc>,
    /// Event end.
    pub end: DateTime<Utc>,
    /// Event summary.
    pub title: String,
    /// Attendee e-mail addresses.
    #[serde(default)]
    pub attendees: Vec<String>,
    /// Free-text description (used as the meeting reason in notifications).
    #[serde(default)]
    pub description: Option<String>,
    /// Event location.
    #[serde(default)]
    pub location: Option<String>,
}

impl NewEvent {
    /// Creates a new event with no attendees.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, title: impl Into<String>) -> Self {
        Self {
            start,
            end,
            title: title.into(),
            attendees: Vec::new(),
            description: None,
            location: None,
        }
    }

    /// Builder method to add an attendee.
    pub fn with_attendee(mut self, email: impl Into<String>) -> Self {
        self.attendees.push(email.into());
        self
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder method to set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// The first attendee, who receives the guest confirmation.
    pub fn primary_attendee(&self) -> Option<&str> {
        self.attendees.first().map(String::as_str)
    }
}

/// A calendar resource created by a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Event UID, also the resource name stem.
    pub uid: String,
    /// Absolute URL of the created `.ics` resource.
    pub url: Url,
}

mod iso_millis {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::time::format_iso_millis;

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_iso_millis(*dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
