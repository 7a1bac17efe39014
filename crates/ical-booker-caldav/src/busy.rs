//! Busy-interval resolution.
//!
//! One `calendar-query` REPORT per calendar, issued concurrently. Every
//! VEVENT found becomes one or more [`BusyEvent`]s: plain events as they
//! are, recurring events expanded inside the window. The merged list is
//! sorted by start.
//!
//! A calendar that answers with a non-2xx status contributes nothing. A
//! calendar that cannot be reached at all fails the whole call.

use std::cmp::Ordering;

use futures::future::join_all;
use tracing::{debug, info, warn};

use ical_booker_core::{BusyEvent, Calendar, Credentials, TimeWindow};

use crate::error::CalDavResult;
use crate::ics::{self, IcsEvent};
use crate::recurrence::expand_occurrences;
use crate::transport::{DavRequest, Transport};
use crate::xml;

/// Filters applied while resolving busy intervals.
///
/// The defaults keep every event the server returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusyOptions {
    /// Keep events with `STATUS:CANCELLED`.
    pub include_cancelled: bool,
    /// Keep events with `TRANSP:TRANSPARENT`.
    pub include_transparent: bool,
}

impl Default for BusyOptions {
    fn default() -> Self {
        Self {
            include_cancelled: true,
            include_transparent: true,
        }
    }
}

impl BusyOptions {
    /// Creates options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to keep or drop cancelled events.
    pub fn with_cancelled(mut self, include: bool) -> Self {
        self.include_cancelled = include;
        self
    }

    /// Builder method to keep or drop transparent (free) events.
    pub fn with_transparent(mut self, include: bool) -> Self {
        self.include_transparent = include;
        self
    }

    fn keeps(&self, event: &IcsEvent) -> bool {
        (self.include_cancelled || !event.cancelled)
            && (self.include_transparent || !event.transparent)
    }
}

/// Returns the busy intervals of `calendars` over `window`.
///
/// # Errors
///
/// Returns a `Transport` error if any calendar could not be reached.
pub async fn get_busy_events<T>(
    transport: &T,
    creds: &Credentials,
    calendars: &[Calendar],
    window: &TimeWindow,
) -> CalDavResult<Vec<BusyEvent>>
where
    T: Transport + ?Sized,
{
    get_busy_events_with(transport, creds, calendars, window, &BusyOptions::default()).await
}

/// Like [`get_busy_events`], with explicit filters.
pub async fn get_busy_events_with<T>(
    transport: &T,
    creds: &Credentials,
    calendars: &[Calendar],
    window: &TimeWindow,
    options: &BusyOptions,
) -> CalDavResult<Vec<BusyEvent>>
where
    T: Transport + ?Sized,
{
    let query = xml::calendar_query_body(&window.caldav_start(), &window.caldav_end())?;

    debug!(
        calendars = calendars.len(),
        start = %window.caldav_start(),
        end = %window.caldav_end(),
        "Querying busy intervals"
    );

    let bodies = join_all(
        calendars
            .iter()
            .map(|calendar| fetch_calendar_data(transport, creds, calendar, &query)),
    )
    .await;

    let mut events = Vec::new();
    for body in bodies {
        for payload in xml::extract_calendar_data(&body?) {
            for event in ics::parse_ics_content(&payload) {
                if options.keeps(&event) {
                    events.extend(busy_intervals(&event, window));
                }
            }
        }
    }

    events.retain(|event| {
        let valid = event.is_valid();
        if !valid {
            debug!(title = %event.title, start = %event.start, "Dropping empty or inverted interval");
        }
        valid
    });
    sort_busy_events(&mut events);

    info!(count = events.len(), "Resolved busy intervals");
    Ok(events)
}

/// Runs the REPORT for one calendar. Non-2xx answers yield an empty body.
async fn fetch_calendar_data<T>(
    transport: &T,
    creds: &Credentials,
    calendar: &Calendar,
    query: &str,
) -> CalDavResult<String>
where
    T: Transport + ?Sized,
{
    let request = DavRequest::report(calendar.url.as_str(), query).with_credentials(creds);
    let response = transport.send(request).await?;

    if !response.is_success() {
        warn!(
            calendar = %calendar.display_name,
            url = %calendar.url,
            status = response.status,
            "Calendar query failed, skipping calendar"
        );
        return Ok(String::new());
    }

    debug!(calendar = %calendar.display_name, body_len = response.body.len(), "Calendar query answered");
    Ok(response.body)
}

/// Turns one VEVENT into its busy intervals.
///
/// Plain events map to themselves. Recurring events map to one interval
/// per occurrence inside `window`, each as long as the original.
pub fn busy_intervals(event: &IcsEvent, window: &TimeWindow) -> Vec<BusyEvent> {
    let title = event.summary.as_deref();

    let Some(ref rrule) = event.rrule else {
        return vec![BusyEvent::new(event.start_utc(), event.end_utc(), title)];
    };

    let duration = event.duration();
    match expand_occurrences(&event.start, rrule, window) {
        Ok(starts) => starts
            .into_iter()
            .map(|start| BusyEvent::new(start, start + duration, title))
            .collect(),
        Err(e) => {
            warn!(uid = ?event.uid, error = %e, "Skipping event with malformed recurrence rule");
            Vec::new()
        }
    }
}

/// Sorts by start, then end, then title.
pub fn sort_busy_events(events: &mut [BusyEvent]) {
    events.sort_by(compare_busy_events);
}

fn compare_busy_events(a: &BusyEvent, b: &BusyEvent) -> Ordering {
    a.start
        .cmp(&b.start)
        .then_with(|| a.end.cmp(&b.end))
        .then_with(|| a.title.cmp(&b.title))
}
