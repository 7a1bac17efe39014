//! ICS/iCalendar parsing and generation.
//!
//! Parsing turns `calendar-data` payloads into [`IcsEvent`]s, keeping the
//! original form of DTSTART so recurrence rules expand on the right wall
//! clock. Generation renders a [`NewEvent`] as a single-VEVENT calendar for
//! booking.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use icalendar::{
    Calendar, CalendarComponent, CalendarDateTime, Component, DatePerhapsTime, Event, EventLike,
    EventStatus, Property,
};
use tracing::{debug, warn};

use ical_booker_core::{NewEvent, format_caldav_timestamp};

/// PRODID written into generated calendars.
pub const PRODID: &str = "-//ical-booker//CalDAV booking//EN";

/// A start or end value as it appeared in the ICS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IcsTime {
    /// `VALUE=DATE`, taken as midnight UTC.
    Date(NaiveDate),
    /// `...Z` form.
    Utc(DateTime<Utc>),
    /// No zone at all, taken as UTC.
    Floating(NaiveDateTime),
    /// Local time with a `TZID` parameter.
    Zoned {
        /// Wall-clock time.
        local: NaiveDateTime,
        /// Time zone identifier as written.
        tzid: String,
    },
}

impl IcsTime {
    /// Resolves this value to an instant.
    ///
    /// Unknown `TZID`s and local times that fall into a DST gap are read as
    /// UTC.
    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            Self::Date(date) => Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN)),
            Self::Utc(dt) => *dt,
            Self::Floating(naive) => Utc.from_utc_datetime(naive),
            Self::Zoned { local, tzid } => match resolve_tz(tzid) {
                Some(tz) => tz
                    .from_local_datetime(local)
                    .earliest()
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|| Utc.from_utc_datetime(local)),
                None => Utc.from_utc_datetime(local),
            },
        }
    }

    /// Renders a `DTSTART` line the `rrule` parser accepts.
    ///
    /// Zoned times keep their `TZID` so occurrences follow the zone's
    /// daylight-saving changes.
    pub fn to_dtstart_line(&self) -> String {
        match self {
            Self::Zoned { local, tzid } if resolve_tz(tzid).is_some() => {
                format!("DTSTART;TZID={}:{}", tzid, local.format("%Y%m%dT%H%M%S"))
            }
            other => format!("DTSTART:{}", format_caldav_timestamp(other.to_utc())),
        }
    }
}

impl From<DatePerhapsTime> for IcsTime {
    fn from(value: DatePerhapsTime) -> Self {
        match value {
            DatePerhapsTime::Date(date) => Self::Date(date),
            DatePerhapsTime::DateTime(CalendarDateTime::Utc(dt)) => Self::Utc(dt),
            DatePerhapsTime::DateTime(CalendarDateTime::Floating(naive)) => Self::Floating(naive),
            DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid }) => {
                Self::Zoned {
                    local: date_time,
                    tzid,
                }
            }
        }
    }
}

fn resolve_tz(tzid: &str) -> Option<Tz> {
    // Some clients quote the parameter or prefix it with a solidus.
    let name = tzid.trim_matches('"').trim_start_matches('/');
    match name.parse::<Tz>() {
        Ok(tz) => Some(tz),
        Err(_) => {
            debug!(tzid, "Unknown TZID, reading as UTC");
            None
        }
    }
}

/// One VEVENT with the fields busy resolution needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcsEvent {
    /// UID, if present.
    pub uid: Option<String>,
    /// DTSTART.
    pub start: IcsTime,
    /// DTEND.
    pub end: IcsTime,
    /// SUMMARY, if present.
    pub summary: Option<String>,
    /// Raw RRULE value (without the `RRULE:` prefix).
    pub rrule: Option<String>,
    /// `STATUS:CANCELLED`.
    pub cancelled: bool,
    /// `TRANSP:TRANSPARENT`.
    pub transparent: bool,
}

impl IcsEvent {
    /// Start as an instant.
    pub fn start_utc(&self) -> DateTime<Utc> {
        self.start.to_utc()
    }

    /// End as an instant.
    pub fn end_utc(&self) -> DateTime<Utc> {
        self.end.to_utc()
    }

    /// Length of the event; occurrences of a recurring event share it.
    pub fn duration(&self) -> Duration {
        self.end_utc() - self.start_utc()
    }
}

/// Parses ICS content and extracts its VEVENTs.
///
/// Content that is not a calendar yields no events. A VEVENT without DTEND
/// ends after its `DURATION`, or one day after a DATE-valued DTSTART; when
/// neither applies it is skipped.
pub fn parse_ics_content(ics: &str) -> Vec<IcsEvent> {
    let calendar = match ics.parse::<Calendar>() {
        Ok(cal) => cal,
        Err(e) => {
            warn!(error = %e, "Failed to parse ICS content");
            return Vec::new();
        }
    };

    calendar
        .iter()
        .filter_map(|component| match component {
            CalendarComponent::Event(event) => parse_event(event),
            _ => None,
        })
        .collect()
}

fn parse_event(event: &Event) -> Option<IcsEvent> {
    let Some(start) = event.get_start().map(IcsTime::from) else {
        debug!(uid = ?event.get_uid(), "Skipping VEVENT without DTSTART");
        return None;
    };
    let Some(end) = event.get_end().map(IcsTime::from).or_else(|| implied_end(event, &start))
    else {
        debug!(uid = ?event.get_uid(), "Skipping VEVENT without DTEND or DURATION");
        return None;
    };

    let parsed = IcsEvent {
        uid: event.get_uid().map(str::to_string),
        start,
        end,
        summary: event.get_summary().map(str::to_string),
        rrule: event
            .property_value("RRULE")
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string),
        cancelled: matches!(event.get_status(), Some(EventStatus::Cancelled)),
        transparent: event
            .property_value("TRANSP")
            .is_some_and(|t| t.trim().eq_ignore_ascii_case("TRANSPARENT")),
    };

    debug!(
        uid = ?parsed.uid,
        summary = ?parsed.summary,
        recurring = parsed.rrule.is_some(),
        "Parsed event from ICS"
    );

    Some(parsed)
}

/// End of a VEVENT that has no DTEND (RFC 5545 section 3.6.1).
fn implied_end(event: &Event, start: &IcsTime) -> Option<IcsTime> {
    if let Some(value) = event.property_value("DURATION") {
        let Some(duration) = parse_duration(value) else {
            warn!(uid = ?event.get_uid(), duration = value, "Unparseable DURATION");
            return None;
        };
        return Some(IcsTime::Utc(start.to_utc() + duration));
    }
    match start {
        IcsTime::Date(date) => date.succ_opt().map(IcsTime::Date),
        _ => None,
    }
}

/// Parses an iCalendar duration such as `PT1H30M`, `P1D` or `-P2W`.
pub fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    let (negative, value) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };
    let value = value.strip_prefix('P')?;
    let (date_part, time_part) = match value.split_once('T') {
        Some((date, time)) if !time.is_empty() => (date, Some(time)),
        Some(_) => return None,
        None => (value, None),
    };
    if date_part.is_empty() && time_part.is_none() {
        return None;
    }

    let mut seconds = sum_components(date_part, &[('W', 604_800), ('D', 86_400)])?;
    if let Some(time) = time_part {
        seconds = seconds.checked_add(sum_components(time, &[('H', 3_600), ('M', 60), ('S', 1)])?)?;
    }
    Some(Duration::seconds(if negative { -seconds } else { seconds }))
}

fn sum_components(part: &str, units: &[(char, i64)]) -> Option<i64> {
    let mut total: i64 = 0;
    let mut digits = String::new();
    for c in part.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let (_, factor) = units.iter().find(|(unit, _)| *unit == c.to_ascii_uppercase())?;
        let n: i64 = digits.parse().ok()?;
        total = total.checked_add(n.checked_mul(*factor)?)?;
        digits.clear();
    }
    digits.is_empty().then_some(total)
}

/// Renders a booking as a VCALENDAR with one VEVENT.
///
/// Times are written in UTC. Each attendee becomes an `ATTENDEE:mailto:`
/// line.
pub fn generate_ics(uid: &str, event: &NewEvent) -> String {
    let mut vevent = Event::new();
    vevent.uid(uid);
    vevent.summary(&event.title);
    vevent.add_property("DTSTAMP", format_caldav_timestamp(Utc::now()));
    vevent.add_property("DTSTART", format_caldav_timestamp(event.start));
    vevent.add_property("DTEND", format_caldav_timestamp(event.end));

    if let Some(ref description) = event.description {
        vevent.description(description);
    }
    if let Some(ref location) = event.location {
        vevent.location(location);
    }
    for attendee in &event.attendees {
        vevent.append_multi_property(Property::new("ATTENDEE", format!("mailto:{}", attendee)));
    }

    let mut calendar = Calendar::new();
    calendar.push(vevent.done());
    let calendar = calendar.done();

    replace_prodid(&calendar.to_string())
}

fn replace_prodid(ics: &str) -> String {
    let mut out = String::with_capacity(ics.len());
    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            out.push_str("PRODID:");
            out.push_str(PRODID);
        } else {
            out.push_str(line);
        }
        out.push_str("\r\n");
    }
    out
}
