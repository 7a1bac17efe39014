//! `book` command.

use std::io::Write;

use chrono::{DateTime, Duration, Utc};
use tracing::info;
use url::Url;

use ical_booker_caldav::{create_booking, discover_calendars, send_booking_emails};
use ical_booker_core::{Booking, NewEvent};

use crate::commands::{AccountOverrides, Session, select_calendars};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Arguments of the `book` command.
#[derive(Debug, Clone)]
pub struct BookArgs {
    pub calendar: String,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub duration_minutes: u32,
    pub title: String,
    pub attendees: Vec<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub notify: bool,
}

impl BookArgs {
    /// Builds the event, taking the end from `--end` or `--duration`.
    pub fn to_event(&self) -> ClientResult<NewEvent> {
        let end = self
            .end
            .unwrap_or_else(|| self.start + Duration::minutes(i64::from(self.duration_minutes)));
        if end <= self.start {
            return Err(ClientError::InvalidArgument(format!(
                "event must end after it starts ({} -> {})",
                self.start, end
            )));
        }

        let mut event = NewEvent::new(self.start, end, &self.title);
        for attendee in &self.attendees {
            event = event.with_attendee(attendee);
        }
        if let Some(ref description) = self.description {
            event = event.with_description(description);
        }
        if let Some(ref location) = self.location {
            event = event.with_location(location);
        }
        Ok(event)
    }
}

/// Creates the event and optionally sends the confirmation mails.
pub async fn run(
    config: &ClientConfig,
    overrides: &AccountOverrides,
    args: &BookArgs,
    json: bool,
) -> ClientResult<()> {
    let event = args.to_event()?;
    // Fail on a broken [email] section before anything is written.
    let email = if args.notify {
        let settings = config.email.as_ref().ok_or_else(|| {
            ClientError::Config("--notify needs an [email] section in the config".to_string())
        })?;
        Some(settings.to_email_config().map_err(ClientError::Config)?)
    } else {
        None
    };

    let session = Session::open(config, overrides)?;
    let calendar_url = resolve_calendar_url(&session, &args.calendar).await?;
    let booking = create_booking(&session.transport, &session.creds, &calendar_url, &event).await?;

    if let Some(ref email) = email {
        send_booking_emails(session.transport.client(), email, &event, &booking).await?;
        info!(uid = %booking.uid, "Confirmation mails sent");
    }

    let mut out = std::io::stdout().lock();
    render(&mut out, &booking, json)
}

async fn resolve_calendar_url(session: &Session, selector: &str) -> ClientResult<Url> {
    if let Ok(url) = Url::parse(selector) {
        return Ok(url);
    }

    let calendars = discover_calendars(&session.transport, &session.creds).await?;
    select_calendars(calendars, &[selector.to_string()])?
        .into_iter()
        .next()
        .map(|c| c.url)
        .ok_or_else(|| ClientError::InvalidArgument(format!("no calendar named '{}'", selector)))
}

/// Writes the created booking.
pub fn render(out: &mut impl Write, booking: &Booking, json: bool) -> ClientResult<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, booking)?;
        writeln!(out)?;
    } else {
        writeln!(out, "Booked {}", booking.uid)?;
        writeln!(out, "  {}", booking.url)?;
    }
    Ok(())
}
