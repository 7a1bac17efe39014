//! `calendars` command.

use std::io::Write;

use ical_booker_caldav::discover_calendars;
use ical_booker_core::Calendar;

use crate::commands::{AccountOverrides, Session};
use crate::config::ClientConfig;
use crate::error::ClientResult;

/// Discovers and prints the account's calendars.
pub async fn run(config: &ClientConfig, overrides: &AccountOverrides, json: bool) -> ClientResult<()> {
    let session = Session::open(config, overrides)?;
    let calendars = discover_calendars(&session.transport, &session.creds).await?;

    let mut out = std::io::stdout().lock();
    render(&mut out, &calendars, json)
}

/// Writes `calendars` as a table or a JSON array.
pub fn render(out: &mut impl Write, calendars: &[Calendar], json: bool) -> ClientResult<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, calendars)?;
        writeln!(out)?;
        return Ok(());
    }

    if calendars.is_empty() {
        writeln!(out, "No calendars found.")?;
        return Ok(());
    }

    let width = calendars
        .iter()
        .map(|c| c.display_name.chars().count())
        .max()
        .unwrap_or(0);
    for calendar in calendars {
        writeln!(out, "{:<width$}  {}", calendar.display_name, calendar.url, width = width)?;
    }
    Ok(())
}
