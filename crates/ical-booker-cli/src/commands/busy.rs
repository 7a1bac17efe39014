//! `busy` command.

use std::io::Write;

use chrono::{DateTime, Utc};

use ical_booker_caldav::{BusyOptions, discover_calendars, get_busy_events_with};
use ical_booker_core::{BusyEvent, TimeWindow};

use crate::commands::{AccountOverrides, Session, select_calendars};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Arguments of the `busy` command.
#[derive(Debug, Clone)]
pub struct BusyArgs {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub calendars: Vec<String>,
    pub exclude_cancelled: bool,
    pub exclude_transparent: bool,
}

impl BusyArgs {
    fn window(&self) -> ClientResult<TimeWindow> {
        TimeWindow::try_new(self.from, self.to)
            .map_err(|e| ClientError::InvalidArgument(e.to_string()))
    }

    fn options(&self) -> BusyOptions {
        BusyOptions::new()
            .with_cancelled(!self.exclude_cancelled)
            .with_transparent(!self.exclude_transparent)
    }
}

/// Prints the busy intervals of the selected calendars.
pub async fn run(
    config: &ClientConfig,
    overrides: &AccountOverrides,
    args: &BusyArgs,
    json: bool,
) -> ClientResult<()> {
    let window = args.window()?;
    let session = Session::open(config, overrides)?;

    let calendars = discover_calendars(&session.transport, &session.creds).await?;
    let calendars = select_calendars(calendars, &args.calendars)?;

    let events = get_busy_events_with(
        &session.transport,
        &session.creds,
        &calendars,
        &window,
        &args.options(),
    )
    .await?;

    let mut out = std::io::stdout().lock();
    render(&mut out, &events, json)
}

/// Writes `events` one per line, or as a JSON array.
pub fn render(out: &mut impl Write, events: &[BusyEvent], json: bool) -> ClientResult<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, events)?;
        writeln!(out)?;
        return Ok(());
    }

    if events.is_empty() {
        writeln!(out, "No busy intervals.")?;
        return Ok(());
    }

    for event in events {
        writeln!(out, "{}  {}  {}", event.start_iso(), event.end_iso(), event.title)?;
    }
    Ok(())
}
